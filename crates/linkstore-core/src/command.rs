//! Wire commands.
//!
//! Every navigation and editing request travels as the `content` string of a
//! `message` envelope. The grammar is colon separated:
//!
//! - `get_max_index`
//! - `get:<index>:<format>` with an optional `:forward`, `:backward`,
//!   `:forward2:<slot>` or `:backward2:<slot>` suffix
//! - `modify:<index>:<text>`
//! - `link:<direction>:<source>:<target>` and `unlink:...`
//! - `getlinks:<index>:<direction>`
//! - `<text>|<index>` (append, recognized by the absence of a verb)
//! - `get_index_table_info` and `get_free_space_table_info`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the content of an entry is rendered once it arrives.
///
/// The format never changes what the store returns for a fetch; it only
/// selects how the `content` field is decoded for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Binary,
    Hex,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Binary => "binary",
            Format::Hex => "hex",
        }
    }

    /// Decode a content payload for display.
    ///
    /// `binary` payloads arrive as hex and are expanded to space separated
    /// 8-bit groups; `text` and `hex` pass through unchanged.
    pub fn render(&self, content: &str) -> String {
        match self {
            Format::Binary => hex_to_bits(content),
            Format::Text | Format::Hex => content.to_string(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "binary" => Ok(Format::Binary),
            "hex" => Ok(Format::Hex),
            other => Err(CommandParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Expand a hex string into space separated 8-bit groups.
///
/// Pairs that are not valid hex are kept verbatim. A trailing single digit is
/// treated as a low nibble.
pub fn hex_to_bits(hex: &str) -> String {
    let chars: Vec<char> = hex.trim().chars().collect();
    chars
        .chunks(2)
        .map(|pair| {
            let pair: String = pair.iter().collect();
            match u8::from_str_radix(&pair, 16) {
                Ok(byte) => format!("{byte:08b}"),
                Err(_) => pair,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Direction of a link between two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }

    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(CommandParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// A single wire command.
///
/// `Display` produces the exact content string sent to the store and
/// `FromStr` parses it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `get_max_index`
    GetMaxIndex,
    /// `get:<index>:<format>`
    Get { index: u32, format: Format },
    /// `get:<index>:<format>:<direction>`
    GetLinked {
        index: u32,
        format: Format,
        direction: Direction,
    },
    /// `get:<index>:<format>:<direction>2:<parent_slot>`
    GetSecondHop {
        index: u32,
        format: Format,
        direction: Direction,
        parent_slot: u32,
    },
    /// `modify:<index>:<text>`
    Modify { index: u32, text: String },
    /// `link:<direction>:<source>:<target>`
    Link {
        direction: Direction,
        source: u32,
        target: u32,
    },
    /// `unlink:<direction>:<source>:<target>`
    Unlink {
        direction: Direction,
        source: u32,
        target: u32,
    },
    /// `getlinks:<index>:<direction>`
    GetLinks { index: u32, direction: Direction },
    /// `<text>|<linked_to>`
    ///
    /// Text that itself starts with a recognized verb (`get:`, `modify:`...)
    /// is indistinguishable from that command on the wire.
    Append { text: String, linked_to: u32 },
    /// `get_index_table_info`
    GetIndexTableInfo,
    /// `get_free_space_table_info`
    GetFreeSpaceTableInfo,
}

impl Command {
    /// The three sends that fetch an entry and both of its first-hop link lists.
    pub fn fetch_entry(index: u32, format: Format) -> [Command; 3] {
        [
            Command::Get { index, format },
            Command::GetLinked {
                index,
                format,
                direction: Direction::Forward,
            },
            Command::GetLinked {
                index,
                format,
                direction: Direction::Backward,
            },
        ]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::GetMaxIndex => f.write_str("get_max_index"),
            Command::Get { index, format } => write!(f, "get:{index}:{format}"),
            Command::GetLinked {
                index,
                format,
                direction,
            } => write!(f, "get:{index}:{format}:{direction}"),
            Command::GetSecondHop {
                index,
                format,
                direction,
                parent_slot,
            } => write!(f, "get:{index}:{format}:{direction}2:{parent_slot}"),
            Command::Modify { index, text } => write!(f, "modify:{index}:{text}"),
            Command::Link {
                direction,
                source,
                target,
            } => write!(f, "link:{direction}:{source}:{target}"),
            Command::Unlink {
                direction,
                source,
                target,
            } => write!(f, "unlink:{direction}:{source}:{target}"),
            Command::GetLinks { index, direction } => write!(f, "getlinks:{index}:{direction}"),
            Command::Append { text, linked_to } => write!(f, "{text}|{linked_to}"),
            Command::GetIndexTableInfo => f.write_str("get_index_table_info"),
            Command::GetFreeSpaceTableInfo => f.write_str("get_free_space_table_info"),
        }
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_max_index" => return Ok(Command::GetMaxIndex),
            "get_index_table_info" => return Ok(Command::GetIndexTableInfo),
            "get_free_space_table_info" => return Ok(Command::GetFreeSpaceTableInfo),
            _ => {}
        }

        if let Some((verb, rest)) = s.split_once(':') {
            match verb {
                "get" => return parse_get(rest),
                "modify" => return parse_modify(rest),
                "link" => {
                    let (direction, source, target) = parse_link_args("link", rest)?;
                    return Ok(Command::Link {
                        direction,
                        source,
                        target,
                    });
                }
                "unlink" => {
                    let (direction, source, target) = parse_link_args("unlink", rest)?;
                    return Ok(Command::Unlink {
                        direction,
                        source,
                        target,
                    });
                }
                "getlinks" => return parse_getlinks(rest),
                _ => {}
            }
        }

        let (text, linked_to) = s
            .rsplit_once('|')
            .ok_or_else(|| CommandParseError::Unrecognized(s.to_string()))?;
        Ok(Command::Append {
            text: text.to_string(),
            linked_to: parse_index(linked_to)?,
        })
    }
}

fn parse_index(s: &str) -> Result<u32, CommandParseError> {
    match s.parse::<u32>() {
        Ok(index) if index >= 1 => Ok(index),
        _ => Err(CommandParseError::InvalidIndex(s.to_string())),
    }
}

fn parse_get(rest: &str) -> Result<Command, CommandParseError> {
    let parts: Vec<&str> = rest.split(':').collect();
    match parts.as_slice() {
        [index, format] => Ok(Command::Get {
            index: parse_index(index)?,
            format: format.parse()?,
        }),
        [index, format, direction] => Ok(Command::GetLinked {
            index: parse_index(index)?,
            format: format.parse()?,
            direction: direction.parse()?,
        }),
        [index, format, hop, slot] => {
            let direction = hop
                .strip_suffix('2')
                .ok_or_else(|| CommandParseError::UnknownDirection(hop.to_string()))?
                .parse()?;
            Ok(Command::GetSecondHop {
                index: parse_index(index)?,
                format: format.parse()?,
                direction,
                parent_slot: parse_index(slot)?,
            })
        }
        _ => Err(CommandParseError::Malformed {
            verb: "get",
            input: rest.to_string(),
        }),
    }
}

fn parse_modify(rest: &str) -> Result<Command, CommandParseError> {
    let (index, text) = rest.split_once(':').ok_or_else(|| CommandParseError::Malformed {
        verb: "modify",
        input: rest.to_string(),
    })?;
    Ok(Command::Modify {
        index: parse_index(index)?,
        text: text.to_string(),
    })
}

fn parse_link_args(
    verb: &'static str,
    rest: &str,
) -> Result<(Direction, u32, u32), CommandParseError> {
    let parts: Vec<&str> = rest.split(':').collect();
    match parts.as_slice() {
        [direction, source, target] => Ok((
            direction.parse()?,
            parse_index(source)?,
            parse_index(target)?,
        )),
        _ => Err(CommandParseError::Malformed {
            verb,
            input: rest.to_string(),
        }),
    }
}

fn parse_getlinks(rest: &str) -> Result<Command, CommandParseError> {
    let (index, direction) = rest.split_once(':').ok_or_else(|| CommandParseError::Malformed {
        verb: "getlinks",
        input: rest.to_string(),
    })?;
    Ok(Command::GetLinks {
        index: parse_index(index)?,
        direction: direction.parse()?,
    })
}

/// Error parsing a command string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    #[error("unrecognized command: {0}")]
    Unrecognized(String),
    #[error("malformed `{verb}` command arguments: {input}")]
    Malformed { verb: &'static str, input: String },
    #[error("index must be a positive integer, got: {0}")]
    InvalidIndex(String),
    #[error("unknown format: {0}")]
    UnknownFormat(String),
    #[error("unknown direction: {0}")]
    UnknownDirection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(command: Command) {
        let wire = command.to_string();
        let parsed: Command = wire.parse().unwrap();
        assert_eq!(parsed, command);
        assert_eq!(parsed.to_string(), wire);
    }

    #[test]
    fn every_command_roundtrips() {
        roundtrip(Command::GetMaxIndex);
        roundtrip(Command::Get {
            index: 4,
            format: Format::Hex,
        });
        roundtrip(Command::GetLinked {
            index: 4,
            format: Format::Text,
            direction: Direction::Backward,
        });
        roundtrip(Command::GetSecondHop {
            index: 9,
            format: Format::Binary,
            direction: Direction::Forward,
            parent_slot: 2,
        });
        roundtrip(Command::Modify {
            index: 3,
            text: "a: b: c".into(),
        });
        roundtrip(Command::Link {
            direction: Direction::Forward,
            source: 1,
            target: 2,
        });
        roundtrip(Command::Unlink {
            direction: Direction::Backward,
            source: 2,
            target: 1,
        });
        roundtrip(Command::GetLinks {
            index: 5,
            direction: Direction::Forward,
        });
        roundtrip(Command::Append {
            text: "see 3|4 for details".into(),
            linked_to: 7,
        });
        roundtrip(Command::GetIndexTableInfo);
        roundtrip(Command::GetFreeSpaceTableInfo);
    }

    #[test]
    fn wire_strings() {
        let [entry, forward, backward] = Command::fetch_entry(12, Format::Text);
        assert_eq!(entry.to_string(), "get:12:text");
        assert_eq!(forward.to_string(), "get:12:text:forward");
        assert_eq!(backward.to_string(), "get:12:text:backward");

        let hop = Command::GetSecondHop {
            index: 3,
            format: Format::Text,
            direction: Direction::Backward,
            parent_slot: 1,
        };
        assert_eq!(hop.to_string(), "get:3:text:backward2:1");

        let append = Command::Append {
            text: "hello".into(),
            linked_to: 2,
        };
        assert_eq!(append.to_string(), "hello|2");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            "hello".parse::<Command>(),
            Err(CommandParseError::Unrecognized("hello".into()))
        );
        assert!(matches!(
            "get:0:text".parse::<Command>(),
            Err(CommandParseError::InvalidIndex(_))
        ));
        assert!(matches!(
            "get:1:octal".parse::<Command>(),
            Err(CommandParseError::UnknownFormat(_))
        ));
        assert!(matches!(
            "get:1:text:sideways2:1".parse::<Command>(),
            Err(CommandParseError::UnknownDirection(_))
        ));
        assert!(matches!(
            "link:forward:1".parse::<Command>(),
            Err(CommandParseError::Malformed { verb: "link", .. })
        ));
    }

    #[test]
    fn binary_expands_hex_pairs() {
        assert_eq!(Format::Binary.render("0aff"), "00001010 11111111");
        assert_eq!(Format::Binary.render("f"), "00001111");
        assert_eq!(Format::Binary.render("zz01"), "zz 00000001");
        assert_eq!(Format::Binary.render(""), "");
        assert_eq!(Format::Hex.render("0aff"), "0aff");
        assert_eq!(Format::Text.render("plain"), "plain");
    }
}
