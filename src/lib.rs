#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{load_config, Config, LayoutConfig, RenderConfig};
pub use ir::{Direction, Exit, MazePolicy, Room, RoomGraph, RoomRecord};
pub use layout::{compute_layout, LayoutError, MapLayout, PlacedRoom};
pub use parser::parse_area;
pub use render::render_svg;
pub use theme::Theme;
