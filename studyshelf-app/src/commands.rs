use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use studyshelf_core::{Rgb, Subject, Tool};

use crate::app_state::Tab;

pub(crate) const HELP: &str = "\
Browsing:
  home | roadmap | books | videos   switch section
  back                              return to home
  subjects                          list subjects
  subject <math|physics|cs>         load a subject and show its roadmap
  search [text]                     filter the current section (empty clears)
  list                              show the current section
  open <n>                          open the nth listed book
  watch <n>                         show the link of the nth listed video
Viewer:
  next | prev                       change page
  zoom in | zoom out                change scale
  tool <pointer|pen|highlighter|eraser>
  color <#rrggbb> | size <px>       pen settings
  down <x> <y> | move <x> <y> | up  draw with the current tool
  clear                             erase all annotations
  snapshot [path]                   save the annotated page as PNG
  close                             close the viewer
Other:
  status | help | quit";

#[derive(Debug, Error, PartialEq)]
pub(crate) enum CommandError {
    #[error("unknown command {0:?} (try \"help\")")]
    Unknown(String),

    #[error("{command}: missing {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("{command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Nothing,
    Tab(Tab),
    Back,
    Subjects,
    Subject(Subject),
    Search(String),
    List,
    Open(usize),
    Watch(usize),
    NextPage,
    PrevPage,
    ZoomIn,
    ZoomOut,
    Tool(Tool),
    PenColor(Rgb),
    PenSize(f32),
    PointerDown(f32, f32),
    PointerMove(f32, f32),
    PointerUp,
    ClearAnnotations,
    Snapshot(Option<PathBuf>),
    Close,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "" => Command::Nothing,
            "home" | "roadmap" | "books" | "videos" => {
                Command::Tab(head.parse().map_err(|reason| invalid("tab", reason))?)
            }
            "tab" => Command::Tab(
                required("tab", "section name", rest)?
                    .parse()
                    .map_err(|reason| invalid("tab", reason))?,
            ),
            "back" => Command::Back,
            "subjects" => Command::Subjects,
            "subject" => Command::Subject(
                required("subject", "subject name", rest)?
                    .parse()
                    .map_err(|e: studyshelf_core::CoreError| invalid("subject", e.to_string()))?,
            ),
            "search" => Command::Search(rest.to_string()),
            "list" | "ls" => Command::List,
            "open" => Command::Open(index("open", rest)?),
            "watch" => Command::Watch(index("watch", rest)?),
            "next" => Command::NextPage,
            "prev" => Command::PrevPage,
            "zoom" => match rest.to_ascii_lowercase().as_str() {
                "in" | "+" => Command::ZoomIn,
                "out" | "-" => Command::ZoomOut,
                "" => {
                    return Err(CommandError::MissingArgument {
                        command: "zoom",
                        what: "direction (in or out)",
                    })
                }
                other => return Err(invalid("zoom", format!("unknown direction {other:?}"))),
            },
            "tool" => Command::Tool(
                required("tool", "tool name", rest)?
                    .parse()
                    .map_err(|reason| invalid("tool", reason))?,
            ),
            "color" => Command::PenColor(
                required("color", "colour", rest)?
                    .parse()
                    .map_err(|e: studyshelf_core::CoreError| invalid("color", e.to_string()))?,
            ),
            "size" => {
                let size: f32 = required("size", "pen size", rest)?
                    .parse()
                    .map_err(|_| invalid("size", format!("{rest:?} is not a number")))?;
                if !size.is_finite() || size <= 0.0 {
                    return Err(invalid("size", "pen size must be positive".to_string()));
                }
                Command::PenSize(size)
            }
            "down" => {
                let (x, y) = coordinates("down", rest)?;
                Command::PointerDown(x, y)
            }
            "move" => {
                let (x, y) = coordinates("move", rest)?;
                Command::PointerMove(x, y)
            }
            "up" => Command::PointerUp,
            "clear" => Command::ClearAnnotations,
            "snapshot" => Command::Snapshot((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "close" => Command::Close,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(head.to_string())),
        };
        Ok(command)
    }
}

fn invalid(command: &'static str, reason: String) -> CommandError {
    CommandError::InvalidArgument { command, reason }
}

fn required<'a>(
    command: &'static str,
    what: &'static str,
    rest: &'a str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

/// 1-based list position.
fn index(command: &'static str, rest: &str) -> Result<usize, CommandError> {
    let n: usize = required(command, "item number", rest)?
        .parse()
        .map_err(|_| invalid(command, format!("{rest:?} is not an item number")))?;
    if n == 0 {
        return Err(invalid(command, "items are numbered from 1".to_string()));
    }
    Ok(n)
}

fn coordinates(command: &'static str, rest: &str) -> Result<(f32, f32), CommandError> {
    let mut parts = rest.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CommandError::MissingArgument {
            command,
            what: "x and y coordinates",
        });
    };
    let parse = |v: &str| {
        v.parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| invalid(command, format!("{v:?} is not a coordinate")))
    };
    Ok((parse(x)?, parse(y)?))
}
