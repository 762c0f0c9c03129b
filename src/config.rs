use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::ir::MazePolicy;
use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::modern(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Fold straight pass-through corridors before solving.
    pub collapse_hallways: bool,
    pub maze_policy: MazePolicy,
    /// Safety cap on relax/check/augment rounds per component.
    pub max_solve_rounds: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            collapse_hallways: true,
            maze_policy: MazePolicy::DuplicateTarget,
            max_solve_rounds: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Pixels per grid unit.
    pub cell_size: f32,
    /// Side of the square drawn for a room, centered in its cell.
    pub room_size: f32,
    pub component_gap: f32,
    pub level_gap: f32,
    pub margin: f32,
    pub show_vnums: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_size: 48.0,
            room_size: 22.0,
            component_gap: 64.0,
            level_gap: 56.0,
            margin: 24.0,
            show_vnums: true,
        }
    }
}

/// JSON overlay; every field optional, unknown fields rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    collapse_hallways: Option<bool>,
    maze_policy: Option<MazePolicy>,
    max_solve_rounds: Option<usize>,
    cell_size: Option<f32>,
    room_size: Option<f32>,
    component_gap: Option<f32>,
    level_gap: Option<f32>,
    margin: Option<f32>,
    show_vnums: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "classic" {
            config.theme = Theme::classic();
        } else if theme_name == "modern" || theme_name == "default" {
            config.theme = Theme::modern();
        }
    }
    if let Some(v) = parsed.collapse_hallways {
        config.layout.collapse_hallways = v;
    }
    if let Some(v) = parsed.maze_policy {
        config.layout.maze_policy = v;
    }
    if let Some(v) = parsed.max_solve_rounds {
        config.layout.max_solve_rounds = v.max(1);
    }
    if let Some(v) = parsed.cell_size {
        config.render.cell_size = v.max(1.0);
    }
    if let Some(v) = parsed.room_size {
        config.render.room_size = v.max(1.0);
    }
    if let Some(v) = parsed.component_gap {
        config.render.component_gap = v.max(0.0);
    }
    if let Some(v) = parsed.level_gap {
        config.render.level_gap = v.max(0.0);
    }
    if let Some(v) = parsed.margin {
        config.render.margin = v.max(0.0);
    }
    if let Some(v) = parsed.show_vnums {
        config.render.show_vnums = v;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert!(config.layout.collapse_hallways);
        assert_eq!(config.layout.max_solve_rounds, 64);
    }

    #[test]
    fn overlay_applies_known_fields() {
        let dir = std::env::temp_dir();
        let path = dir.join("areamap_config_test.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "{{\"theme\":\"classic\",\"mazePolicy\":\"never\",\"cellSize\":30.0}}"
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.theme.room_fill, Theme::classic().room_fill);
        assert_eq!(config.layout.maze_policy, MazePolicy::Never);
        assert_eq!(config.render.cell_size, 30.0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("areamap_config_bad.json");
        std::fs::write(&path, "{\"unknown\":1}").unwrap();
        assert!(load_config(Some(&path)).is_err());
        std::fs::remove_file(&path).ok();
    }
}
