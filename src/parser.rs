use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::RoomRecord;

static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(AREA|MOBILES|OBJECTS|ROOMS|RESETS|SHOPS|SPECIALS|HELPS|SOCIALS|\$)").unwrap()
});
static VNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#(\d+)\s*$").unwrap());
static DOOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^D([0-5])\s*$").unwrap());
static DOOR_DATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d+)\s+(-?\d+)\s+(-?\d+)").unwrap());

#[derive(Debug, Clone)]
pub struct ParsedArea {
    pub name: Option<String>,
    pub rooms: Vec<RoomRecord>,
}

/// Extracts the `#ROOMS` section of a ROM/Merc `#AREA` file into room
/// records. Everything the layout does not need (mobiles, objects, resets,
/// shops, specials) is skipped wholesale.
pub fn parse_area(input: &str) -> Result<ParsedArea> {
    let mut scanner = Scanner::new(input);
    let mut name = None;
    let mut rooms = Vec::new();

    while let Some(line) = scanner.peek_line() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('#') {
            if header.starts_with("AREA") {
                scanner.next_line();
                let rest = header["AREA".len()..].trim();
                if let Some(i) = rest.find('~') {
                    // Merc style: "#AREA {5 35} Mort Midgaard~" on one line
                    name = Some(strip_level_range(&rest[..i]).to_string());
                } else {
                    // ROM style: filename~, then the display name~
                    let first = scanner.tilde_string().context("#AREA header")?;
                    name = Some(if first.ends_with(".are") {
                        scanner.tilde_string().context("#AREA header")?
                    } else {
                        first
                    });
                }
            } else if header.starts_with("ROOMS") {
                scanner.next_line();
                parse_rooms(&mut scanner, &mut rooms)?;
            } else if header.starts_with('$') {
                break;
            } else if SECTION_RE.is_match(trimmed) {
                scanner.next_line();
                skip_section(&mut scanner);
            } else {
                scanner.next_line();
            }
        } else {
            scanner.next_line();
        }
    }
    Ok(ParsedArea { name, rooms })
}

fn strip_level_range(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.strip_prefix('{') {
        Some(rest) => rest.split_once('}').map(|(_, n)| n.trim()).unwrap_or(raw),
        None => raw,
    }
}

/// Skips forward to the next section header. Tilde strings inside skipped
/// sections can in principle hold header-looking lines; good enough for
/// stock area files.
fn skip_section(scanner: &mut Scanner) {
    while let Some(line) = scanner.peek_line() {
        if SECTION_RE.is_match(line.trim()) {
            return;
        }
        scanner.next_line();
    }
}

fn parse_rooms(scanner: &mut Scanner, rooms: &mut Vec<RoomRecord>) -> Result<()> {
    while let Some(line) = scanner.peek_line() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            scanner.next_line();
            continue;
        }
        if let Some(caps) = VNUM_RE.captures(trimmed) {
            let vnum: u32 = caps[1]
                .parse()
                .with_context(|| format!("line {}: bad vnum", scanner.line))?;
            scanner.next_line();
            if vnum == 0 {
                return Ok(());
            }
            rooms.push(parse_room(scanner, vnum)?);
            continue;
        }
        if SECTION_RE.is_match(trimmed) {
            return Ok(());
        }
        bail!(
            "line {}: unexpected input in #ROOMS: {trimmed:?}",
            scanner.line
        );
    }
    Ok(())
}

fn parse_room(scanner: &mut Scanner, vnum: u32) -> Result<RoomRecord> {
    let name = scanner
        .tilde_string()
        .with_context(|| format!("room #{vnum}: name"))?;
    let description = scanner
        .tilde_string()
        .with_context(|| format!("room #{vnum}: description"))?;
    let description = (!description.is_empty()).then_some(description);
    scanner
        .next_line()
        .ok_or_else(|| anyhow!("room #{vnum}: missing flags line"))?;

    let mut exits = Vec::new();
    loop {
        let Some(line) = scanner.peek_line() else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            scanner.next_line();
            continue;
        }
        if let Some(caps) = DOOR_RE.captures(trimmed) {
            scanner.next_line();
            let door: u8 = caps[1]
                .parse()
                .with_context(|| format!("room #{vnum}: door number"))?;
            scanner
                .tilde_string()
                .with_context(|| format!("room #{vnum}: door description"))?;
            scanner
                .tilde_string()
                .with_context(|| format!("room #{vnum}: door keywords"))?;
            let data = scanner
                .next_line()
                .ok_or_else(|| anyhow!("room #{vnum}: missing door data line"))?;
            let caps = DOOR_DATA_RE
                .captures(data)
                .ok_or_else(|| anyhow!("room #{vnum}: bad door data line: {data:?}"))?;
            let to: i64 = caps[3]
                .parse()
                .with_context(|| format!("room #{vnum}: door target"))?;
            // negative target means a door to nowhere
            if to > 0 {
                exits.push((door, to as u32));
            }
            continue;
        }
        match trimmed.chars().next() {
            Some('E') => {
                scanner.next_line();
                scanner
                    .tilde_string()
                    .with_context(|| format!("room #{vnum}: extra keywords"))?;
                scanner
                    .tilde_string()
                    .with_context(|| format!("room #{vnum}: extra text"))?;
            }
            // ROM extensions: regen, mana, clan, owner; single line each
            Some('H') | Some('M') | Some('C') | Some('O') => {
                scanner.next_line();
            }
            Some('S') if trimmed == "S" => {
                scanner.next_line();
                break;
            }
            _ => break,
        }
    }
    Ok(RoomRecord {
        vnum,
        name,
        description,
        exits,
    })
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner { src, pos: 0, line: 1 }
    }

    fn peek_line(&self) -> Option<&'a str> {
        if self.pos >= self.src.len() {
            return None;
        }
        let rest = &self.src[self.pos..];
        let line = match rest.find('\n') {
            Some(i) => &rest[..i],
            None => rest,
        };
        Some(line.trim_end_matches('\r'))
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.pos >= self.src.len() {
            return None;
        }
        let rest = &self.src[self.pos..];
        let (line, advance) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.pos += advance;
        self.line += 1;
        Some(line.trim_end_matches('\r'))
    }

    /// Reads up to the next `~`, which may span lines, and eats the line
    /// break after it.
    fn tilde_string(&mut self) -> Result<String> {
        let rest = &self.src[self.pos..];
        let Some(i) = rest.find('~') else {
            bail!("line {}: unterminated ~ string", self.line);
        };
        let text = &rest[..i];
        self.line += text.matches('\n').count();
        self.pos += i + 1;

        let tail = &self.src[self.pos..];
        let trimmed = tail.trim_start_matches([' ', '\t', '\r']);
        self.pos += tail.len() - trimmed.len();
        if trimmed.starts_with('\n') {
            self.pos += 1;
            self.line += 1;
        }
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_AREA: &str = "\
#AREA {5 35} Mort Midgaard~

#MOBILES
#3000
wizard~
the wizard~
A wizard walks around behind the counter.
~
#0

#ROOMS
#3001
The Temple Square~
You are standing on the temple square.
~
0 0 1
D0
You see the temple.
~
~
0 -1 3054
D2
~
~
0 0 3005
D4
A ladder to nowhere.
~
ladder~
0 0 -1
S
#3005
South of the Temple~
~
0 0 1
D0
~
~
0 0 3001
E
fountain~
A marble fountain.
~
S
#0

#$
";

    #[test]
    fn parses_rooms_and_doors() {
        let area = parse_area(MINI_AREA).unwrap();
        assert_eq!(area.name.as_deref(), Some("Mort Midgaard"));
        assert_eq!(area.rooms.len(), 2);

        let square = &area.rooms[0];
        assert_eq!(square.vnum, 3001);
        assert_eq!(square.name, "The Temple Square");
        assert!(square
            .description
            .as_deref()
            .unwrap()
            .starts_with("You are standing"));
        // door to -1 is dropped
        assert_eq!(square.exits, vec![(0, 3054), (2, 3005)]);

        let south = &area.rooms[1];
        assert_eq!(south.vnum, 3005);
        assert_eq!(south.description, None);
        assert_eq!(south.exits, vec![(0, 3001)]);
    }

    #[test]
    fn mobiles_section_is_skipped() {
        let area = parse_area(MINI_AREA).unwrap();
        assert!(area.rooms.iter().all(|r| r.vnum >= 3001));
    }

    #[test]
    fn rom_style_area_header() {
        let input = "#AREA\nmidgaard.are~\nMidgaard~\nJohn~\n0 0\n\n#ROOMS\n#0\n\n#$\n";
        let area = parse_area(input).unwrap();
        assert_eq!(area.name.as_deref(), Some("Midgaard"));
        assert!(area.rooms.is_empty());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let input = "#ROOMS\n#10\nNo tilde here";
        assert!(parse_area(input).is_err());
    }

    #[test]
    fn garbage_in_rooms_section_is_an_error() {
        let input = "#ROOMS\nwhat is this\n#0\n#$\n";
        assert!(parse_area(input).is_err());
    }
}
