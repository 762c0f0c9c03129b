use std::collections::HashMap;

use crate::config::RenderConfig;
use crate::layout::{MapLayout, PlacedRoom};
use crate::theme::Theme;

/// Draws the solved map as an SVG string: one horizontal band per z-level,
/// components laid out side by side, rooms as squares and connections as
/// lines. One-way connections get an arrowhead.
pub fn render_svg(layout: &MapLayout, theme: &Theme, config: &RenderConfig) -> String {
    let frames = build_frames(layout, config);

    let content_width: f32 = frames.iter().map(|f| f.width).sum::<f32>()
        + config.component_gap * frames.len().saturating_sub(1) as f32;
    let content_height = frames
        .iter()
        .map(|f| f.band_height * f.levels.len() as f32)
        .fold(0.0f32, f32::max);
    let width = (content_width + 2.0 * config.margin).max(200.0);
    let height = (content_height + 2.0 * config.margin).max(200.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"oneway\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.one_way_color
    ));
    svg.push_str("</defs>");

    // room centers first, so connection lines can join any two of them
    let mut centers: HashMap<u32, (f32, f32)> = HashMap::new();
    for room in layout.rooms.values() {
        if let Some(frame) = frames.iter().find(|f| f.index == room.component) {
            centers.insert(room.vnum, frame.center(room, config));
        }
    }

    for exit in &layout.connections {
        if exit.is_loop {
            continue;
        }
        let (Some(&(x1, y1)), Some(&(x2, y2))) =
            (centers.get(&exit.from), centers.get(&exit.to))
        else {
            continue;
        };
        let (stroke, marker) = if exit.one_way {
            (theme.one_way_color.as_str(), " marker-end=\"url(#oneway)\"")
        } else {
            (theme.line_color.as_str(), "")
        };
        let dash = if layout.rooms[&exit.from].z != layout.rooms[&exit.to].z {
            " stroke-dasharray=\"4 3\""
        } else {
            ""
        };
        svg.push_str(&format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{stroke}\" stroke-width=\"1.4\"{marker}{dash}/>",
        ));
    }

    for frame in &frames {
        if frame.levels.len() > 1 {
            for (band, z) in frame.levels.iter().enumerate() {
                let label_x = frame.origin_x + 2.0;
                let label_y =
                    config.margin + band as f32 * frame.band_height + config.level_gap * 0.6;
                svg.push_str(&format!(
                    "<text x=\"{label_x:.2}\" y=\"{label_y:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">Level {z}</text>",
                    theme.font_family, theme.font_size, theme.level_label_color
                ));
            }
        }
    }

    for room in layout.rooms.values() {
        let Some(&(cx, cy)) = centers.get(&room.vnum) else {
            continue;
        };
        let half = config.room_size / 2.0;
        let fill = if room.dummy {
            &theme.dummy_fill
        } else {
            &theme.room_fill
        };
        let dashed = if room.dummy {
            " stroke-dasharray=\"3 2\""
        } else {
            ""
        };
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\" stroke=\"{}\" stroke-width=\"1.2\"{dashed}><title>{}</title></rect>",
            cx - half,
            cy - half,
            config.room_size,
            config.room_size,
            theme.room_border,
            escape_xml(&room.name)
        ));
        if config.show_vnums {
            let text_y = cy + half + theme.font_size;
            svg.push_str(&format!(
                "<text x=\"{cx:.2}\" y=\"{text_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                theme.font_family, theme.font_size, theme.label_color, room.vnum
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Pixel geometry for one component: its horizontal slot and the stack of
/// z-level bands inside it, highest level on top.
struct Frame {
    index: usize,
    origin_x: f32,
    width: f32,
    levels: Vec<i64>,
    max_y: i64,
    band_height: f32,
}

impl Frame {
    fn center(&self, room: &PlacedRoom, config: &RenderConfig) -> (f32, f32) {
        let band = self
            .levels
            .iter()
            .position(|&z| z == room.z)
            .unwrap_or(0) as f32;
        let gap = if self.levels.len() > 1 {
            config.level_gap
        } else {
            0.0
        };
        let x = self.origin_x + (room.x as f32 + 0.5) * config.cell_size;
        // SVG y grows downward, grid y grows northward
        let y = config.margin
            + band * self.band_height
            + gap
            + ((self.max_y - room.y) as f32 + 0.5) * config.cell_size;
        (x, y)
    }
}

fn build_frames(layout: &MapLayout, config: &RenderConfig) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut origin_x = config.margin;
    for (index, _) in layout.components.iter().enumerate() {
        let rooms: Vec<&PlacedRoom> = layout
            .rooms
            .values()
            .filter(|r| r.component == index)
            .collect();
        if rooms.is_empty() {
            continue;
        }
        let max_x = rooms.iter().map(|r| r.x).max().unwrap_or(0);
        let max_y = rooms.iter().map(|r| r.y).max().unwrap_or(0);
        let mut levels: Vec<i64> = rooms.iter().map(|r| r.z).collect();
        levels.sort_unstable();
        levels.dedup();
        levels.reverse();
        let gap = if levels.len() > 1 {
            config.level_gap
        } else {
            0.0
        };
        let band_height = (max_y + 1) as f32 * config.cell_size + gap;
        let width = (max_x + 1) as f32 * config.cell_size;
        frames.push(Frame {
            index,
            origin_x,
            width,
            levels,
            max_y,
            band_height,
        });
        origin_x += width + config.component_gap;
    }
    frames
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{MazePolicy, RoomGraph, RoomRecord};
    use crate::layout::compute_layout;

    fn layout_of(records: &[(u32, &[(u8, u32)])]) -> MapLayout {
        let records: Vec<RoomRecord> = records
            .iter()
            .map(|&(vnum, exits)| RoomRecord {
                vnum,
                name: format!("room <{vnum}> & co"),
                description: None,
                exits: exits.to_vec(),
            })
            .collect();
        let graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        compute_layout(&graph, &LayoutConfig::default())
    }

    #[test]
    fn svg_has_a_rect_per_room_and_a_line_per_connection() {
        let layout = layout_of(&[(1, &[(0, 2)]), (2, &[(2, 1), (1, 3)]), (3, &[(3, 2)])]);
        let svg = render_svg(&layout, &Theme::modern(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        // background rect + 3 rooms
        assert_eq!(svg.matches("<rect ").count(), 4);
        assert_eq!(svg.matches("<line ").count(), 2);
        assert!(svg.contains("&lt;1&gt; &amp; co"));
    }

    #[test]
    fn one_way_connection_gets_arrowhead() {
        let layout = layout_of(&[(1, &[(0, 2)]), (2, &[])]);
        let svg = render_svg(&layout, &Theme::modern(), &RenderConfig::default());
        assert!(svg.contains("marker-end=\"url(#oneway)\""));
    }

    #[test]
    fn multi_level_map_labels_levels() {
        let layout = layout_of(&[(1, &[(4, 2)]), (2, &[(5, 1)])]);
        let svg = render_svg(&layout, &Theme::classic(), &RenderConfig::default());
        assert!(svg.contains("Level 0"));
        assert!(svg.contains("Level 1"));
    }

    #[test]
    fn canvas_width_spans_all_component_frames() {
        // two isolated rooms land in separate frames; the canvas must cover
        // both frame widths plus the gap between them
        let layout = layout_of(&[(1, &[]), (2, &[])]);
        assert_eq!(layout.components.len(), 2);
        let config = RenderConfig::default();
        let svg = render_svg(&layout, &Theme::modern(), &config);
        // 48 + 64 + 48 content plus 24 margin on each side
        let expected = 2.0 * config.cell_size + config.component_gap + 2.0 * config.margin;
        assert!(svg.contains(&format!("width=\"{expected:.0}\"")));
    }

    #[test]
    fn empty_layout_still_renders() {
        let layout = layout_of(&[]);
        let svg = render_svg(&layout, &Theme::modern(), &RenderConfig::default());
        assert!(svg.contains("width=\"200\""));
    }
}
