//! Line commands typed at the browser prompt.

use anyhow::{anyhow, bail, Context};
use linkstore_client::Intent;
use linkstore_core::{Direction, FreeSpaceColumn, Format, IndexColumn};

pub const HELP: &str = "\
commands:
  + | up                 next entry
  - | down               previous entry
  go <n>                 show entry n
  get <n> [text|binary|hex]
  mod <n> <text>         replace entry n
  link <fwd|back> <src> <dst>
  unlink <fwd|back> <src> <dst>
  links <n> <fwd|back>   fetch links of entry n
  add <text>             store a new entry linked to the current one
  index | free           diagnostic tables
  sort index <index|offset|length|links>
  sort free <offset|length>
  ls [path]              list files
  help | quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Intent(Intent),
    Help,
    Quit,
}

fn index(arg: Option<&str>) -> anyhow::Result<u32> {
    let arg = arg.ok_or_else(|| anyhow!("missing index"))?;
    let n: u32 = arg.parse().with_context(|| format!("bad index {arg:?}"))?;
    if n == 0 {
        bail!("indices start at 1");
    }
    Ok(n)
}

fn direction(arg: Option<&str>) -> anyhow::Result<Direction> {
    match arg {
        Some("fwd" | "f") => Ok(Direction::Forward),
        Some("back" | "b") => Ok(Direction::Backward),
        Some(other) => Ok(other.parse()?),
        None => bail!("missing direction"),
    }
}

/// Everything after the first `skip` words, verbatim.
fn tail(line: &str, skip: usize) -> Option<&str> {
    let mut rest = line.trim_start();
    for _ in 0..skip {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    (!rest.is_empty()).then_some(rest)
}

pub fn parse_line(line: &str) -> anyhow::Result<Input> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        bail!("empty command");
    };

    let intent = match verb {
        "+" | "up" => Intent::ChangeIndex(1),
        "-" | "down" => Intent::ChangeIndex(-1),
        "go" => Intent::JumpTo(index(words.next())?),
        "get" => {
            let index = index(words.next())?;
            let format = match words.next() {
                Some(f) => f.parse::<Format>()?,
                None => Format::Text,
            };
            Intent::Get { index, format }
        }
        "mod" => {
            let index = index(words.next())?;
            let text = tail(line, 2).ok_or_else(|| anyhow!("missing text"))?;
            Intent::Modify {
                index,
                text: text.to_string(),
            }
        }
        "link" | "unlink" => {
            let direction = direction(words.next())?;
            let source = index(words.next())?;
            let target = index(words.next())?;
            if verb == "link" {
                Intent::Link {
                    direction,
                    source,
                    target,
                }
            } else {
                Intent::Unlink {
                    direction,
                    source,
                    target,
                }
            }
        }
        "links" => {
            let index = index(words.next())?;
            let direction = direction(words.next())?;
            Intent::GetLinks { index, direction }
        }
        "add" => {
            let text = tail(line, 1).ok_or_else(|| anyhow!("missing text"))?;
            Intent::Append(text.to_string())
        }
        "index" => Intent::IndexTableInfo,
        "free" => Intent::FreeSpaceTableInfo,
        "sort" => match (words.next(), words.next()) {
            (Some("index"), Some(col)) => Intent::SortIndexTable(match col {
                "index" => IndexColumn::Index,
                "offset" => IndexColumn::Offset,
                "length" => IndexColumn::Length,
                "links" => IndexColumn::Links,
                other => bail!("unknown index column {other:?}"),
            }),
            (Some("free"), Some(col)) => Intent::SortFreeSpaceTable(match col {
                "offset" => FreeSpaceColumn::Offset,
                "length" => FreeSpaceColumn::Length,
                other => bail!("unknown free-space column {other:?}"),
            }),
            _ => bail!("usage: sort <index|free> <column>"),
        },
        "ls" => Intent::ListFiles(tail(line, 1).unwrap_or(".").to_string()),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => return Ok(Input::Quit),
        other => bail!("unknown command {other:?}, try help"),
    };
    Ok(Input::Intent(intent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(line: &str) -> Intent {
        match parse_line(line).unwrap() {
            Input::Intent(intent) => intent,
            other => panic!("expected an intent, got {other:?}"),
        }
    }

    #[test]
    fn navigation() {
        assert_eq!(intent("+"), Intent::ChangeIndex(1));
        assert_eq!(intent("down"), Intent::ChangeIndex(-1));
        assert_eq!(intent("go 7"), Intent::JumpTo(7));
        assert_eq!(
            intent("get 3 binary"),
            Intent::Get {
                index: 3,
                format: Format::Binary
            }
        );
    }

    #[test]
    fn free_text_keeps_spacing() {
        assert_eq!(
            intent("mod 2   hello  world"),
            Intent::Modify {
                index: 2,
                text: "hello  world".into()
            }
        );
        assert_eq!(intent("add a: b"), Intent::Append("a: b".into()));
        assert_eq!(intent("ls"), Intent::ListFiles(".".into()));
    }

    #[test]
    fn links_and_tables() {
        assert_eq!(
            intent("unlink back 4 1"),
            Intent::Unlink {
                direction: Direction::Backward,
                source: 4,
                target: 1
            }
        );
        assert_eq!(
            intent("links 2 forward"),
            Intent::GetLinks {
                index: 2,
                direction: Direction::Forward
            }
        );
        assert_eq!(intent("sort free length"), Intent::SortFreeSpaceTable(FreeSpaceColumn::Length));
        assert_eq!(intent("sort index links"), Intent::SortIndexTable(IndexColumn::Links));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_line("").is_err());
        assert!(parse_line("go 0").is_err());
        assert!(parse_line("go x").is_err());
        assert!(parse_line("mod 3").is_err());
        assert!(parse_line("link sideways 1 2").is_err());
        assert!(parse_line("sort index colour").is_err());
        assert!(parse_line("frobnicate").is_err());
        assert_eq!(parse_line("quit").unwrap(), Input::Quit);
    }
}
