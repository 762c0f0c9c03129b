use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub room_fill: String,
    pub room_border: String,
    pub dummy_fill: String,
    pub line_color: String,
    pub one_way_color: String,
    pub label_color: String,
    pub level_label_color: String,
}

impl Theme {
    /// Red rooms on black lines.
    pub fn classic() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 10.0,
            background: "#FFFFFF".to_string(),
            room_fill: "#D03030".to_string(),
            room_border: "#801818".to_string(),
            dummy_fill: "#C0C0C0".to_string(),
            line_color: "#000000".to_string(),
            one_way_color: "#606060".to_string(),
            label_color: "#1A1A1A".to_string(),
            level_label_color: "#606060".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 11.0,
            background: "#FFFFFF".to_string(),
            room_fill: "#F8FAFF".to_string(),
            room_border: "#C7D2E5".to_string(),
            dummy_fill: "#EEF2F8".to_string(),
            line_color: "#7A8AA6".to_string(),
            one_way_color: "#B4643C".to_string(),
            label_color: "#1C2430".to_string(),
            level_label_color: "#8A97AB".to_string(),
        }
    }
}
