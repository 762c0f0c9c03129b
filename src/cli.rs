use crate::config::load_config;
use crate::ir::RoomGraph;
use crate::layout::compute_layout;
use crate::parser::parse_area;
use crate::render::render_svg;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "areamap", version, about = "Maps MUD #AREA files onto a 3-D grid and renders SVG")]
pub struct Args {
    /// Input area file (.are) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output SVG file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (theme, layout and render knobs)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Keep pass-through hallway rooms instead of collapsing them
    #[arg(long = "no-collapse")]
    pub no_collapse: bool,
}

pub fn run() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if args.no_collapse {
        config.layout.collapse_hallways = false;
    }

    let input = read_input(args.input.as_deref())?;
    let area = parse_area(&input)?;
    if area.rooms.is_empty() {
        return Err(anyhow::anyhow!("no rooms found in input"));
    }

    let graph = RoomGraph::from_records(&area.rooms, config.layout.maze_policy);
    let layout = compute_layout(&graph, &config.layout);
    for failure in &layout.failures {
        eprintln!(
            "warning: skipped {} rooms ({}): {}",
            failure.rooms.len(),
            summarize_vnums(&failure.rooms),
            failure.reason
        );
    }
    if layout.rooms.is_empty() {
        return Err(anyhow::anyhow!("no component could be laid out"));
    }

    let svg = render_svg(&layout, &config.theme, &config.render);
    write_output_svg(&svg, args.output.as_deref())?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output_svg(svg: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, svg)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(svg.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn summarize_vnums(vnums: &[u32]) -> String {
    const SHOWN: usize = 5;
    let mut shown: Vec<String> = vnums.iter().take(SHOWN).map(u32::to_string).collect();
    if vnums.len() > SHOWN {
        shown.push("...".to_string());
    }
    format!("#{}", shown.join(", #"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vnum_summary_truncates() {
        assert_eq!(summarize_vnums(&[1, 2]), "#1, #2");
        let long: Vec<u32> = (1..=8).collect();
        assert_eq!(summarize_vnums(&long), "#1, #2, #3, #4, #5, #...");
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["areamap"]);
        assert!(args.input.is_none());
        assert!(!args.no_collapse);
    }
}
