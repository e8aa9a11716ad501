//! Command file loading and range selection
//!
//! A command file holds one shell command per line. Blank lines and lines
//! starting with `#` are ignored. A [`CommandRange`] narrows the list to a
//! 1-based inclusive window without renumbering the commands inside it.

use crate::core::error::{Error, Result};
use crate::core::types::Command;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The full, filtered contents of a command file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<String>,
}

impl CommandList {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// Parse command text, dropping blank lines and `#` comments
    pub fn parse(content: &str) -> Self {
        let commands = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { commands }
    }

    /// Load and parse a command file
    ///
    /// A file with no runnable lines is rejected so nothing downstream has
    /// to handle an empty run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::CommandFile {
            path: path.to_path_buf(),
            source,
        })?;

        let list = Self::parse(&content);
        if list.is_empty() {
            return Err(Error::empty_selection("No commands found in file"));
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    /// Apply an optional range, keeping each command's original index
    pub fn select(&self, range: Option<&CommandRange>) -> Result<Selection> {
        let total = self.len();
        if total == 0 {
            return Err(Error::empty_selection("No commands found in file"));
        }

        let (start, end) = match range {
            None => (1, total),
            Some(range) => {
                let start = range.start_or_first();
                if start > total {
                    return Err(Error::invalid_range(format!(
                        "Range start {} exceeds total commands {}",
                        start, total
                    )));
                }
                (start, range.end.map_or(total, |end| end.min(total)))
            }
        };

        let commands: Vec<Command> = self.commands[start - 1..end]
            .iter()
            .enumerate()
            .map(|(offset, text)| Command::new(start - 1 + offset, text.clone()))
            .collect();

        if commands.is_empty() {
            return Err(Error::empty_selection("No commands in specified range"));
        }

        Ok(Selection {
            commands,
            total_in_file: total,
            range: range.map(|requested| SelectedRange {
                requested: *requested,
                start,
                end,
            }),
        })
    }
}

/// A `START:END` window over the command file, 1-based and inclusive
///
/// Either side may be omitted: `:5` means "up to 5", `10:` means "from 10".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRange {
    start: Option<usize>,
    end: Option<usize>,
}

impl CommandRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Result<Self> {
        if start == Some(0) {
            return Err(Error::invalid_range("Range start must be at least 1"));
        }
        if end == Some(0) {
            return Err(Error::invalid_range("Range end must be at least 1"));
        }
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::invalid_range(
                    "Range start must be less than or equal to end",
                ));
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    fn start_or_first(&self) -> usize {
        self.start.unwrap_or(1)
    }
}

impl FromStr for CommandRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(':')
            .filter(|(_, end)| !end.contains(':'))
            .ok_or_else(|| Error::invalid_range("Range must be in format START:END"))?;

        Self::new(parse_bound(start, "start")?, parse_bound(end, "end")?)
    }
}

fn parse_bound(raw: &str, which: &str) -> Result<Option<usize>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<usize>()
        .map(Some)
        .map_err(|_| Error::invalid_range(format!("Range {} '{}' is not a positive number", which, raw)))
}

impl fmt::Display for CommandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{}", start)?;
        }
        f.write_str(":")?;
        if let Some(end) = self.end {
            write!(f, "{}", end)?;
        }
        Ok(())
    }
}

/// The range as requested plus the bounds it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRange {
    pub requested: CommandRange,
    pub start: usize,
    pub end: usize,
}

/// Commands chosen for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub commands: Vec<Command>,
    pub total_in_file: usize,
    pub range: Option<SelectedRange>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
