// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Normalization of whole programs: resolve every line, filter out codes the
//! downstream consumers cannot use, and expand canned cycles.

use std::io::{self, Write};
use tracing::{debug, info};

use crate::ast::Command;
use crate::cycles::expand_canned_cycles;
use crate::error::LineError;
use crate::registry::Registry;
use crate::resolve::{resolve_line, ParserState};
use crate::util::braced;

/// Knobs for `normalize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Precede each line's commands with a comment echoing the line.
    pub trace_lines: bool,
    /// Keep `N` line number words.
    pub keep_line_numbers: bool,
    /// Keep `G28`/`G28.1` instead of replacing them by a comment.
    pub keep_home_moves: bool,
    /// Keep `G91` instead of replacing it by a comment.
    pub keep_incremental: bool,
    /// Expand G81-G83 drilling cycles.
    pub expand_cycles: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            trace_lines: false,
            keep_line_numbers: false,
            keep_home_moves: false,
            keep_incremental: false,
            expand_cycles: true,
        }
    }
}

/// Errors reported for one source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Zero-based.
    pub lineno: usize,
    pub line: String,
    pub errors: Vec<LineError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub commands: Vec<Command>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve all lines of `content` in order, sharing one `ParserState`, and
/// post-process the result according to `options`.
pub fn normalize(registry: &Registry, content: &str, options: &Options) -> Normalized {
    let mut state = ParserState::new();
    let mut result = Normalized::default();

    for (lineno, line) in content.lines().enumerate() {
        let resolved = resolve_line(registry, &mut state, line);
        if options.trace_lines {
            result.commands.push(Command::new(format!("( Line[{}]: '{}' )", lineno, braced(line))));
        }
        if !resolved.is_ok() {
            for error in &resolved.errors {
                debug!(lineno, line, "{}", error);
            }
            if resolved.commands.is_empty() {
                result.commands.push(Command::new(format!("( '{}' did not parse )", braced(line))));
            }
            result.diagnostics.push(Diagnostic {
                lineno,
                line: line.into(),
                errors: resolved.errors,
            });
        }
        result.commands.extend(resolved.commands);
    }
    info!(commands = result.commands.len(), failed_lines = result.diagnostics.len(),
          "resolved program");

    let mut commands = std::mem::replace(&mut result.commands, vec![]);
    if !options.keep_line_numbers {
        commands = remove_line_numbers(commands);
    }
    if !options.keep_home_moves {
        commands = replace_home_moves(commands);
    }
    if !options.keep_incremental {
        commands = replace_incremental(commands);
    }
    if options.expand_cycles {
        commands = expand_canned_cycles(commands);
    }
    result.commands = commands;
    result
}

/// Drop all `N` line number commands.
pub fn remove_line_numbers(commands: Vec<Command>) -> Vec<Command> {
    commands.into_iter().filter(|c| !c.name.starts_with('N')).collect()
}

/// Replace `G28` and `G28.1` by a comment.
pub fn replace_home_moves(commands: Vec<Command>) -> Vec<Command> {
    commands.into_iter().map(|c| match c.name.as_str() {
        "G28" | "G28.1" => Command::new("( G28/G28.1 removed )"),
        _ => c,
    }).collect()
}

/// Replace `G91` by a comment.
pub fn replace_incremental(commands: Vec<Command>) -> Vec<Command> {
    commands.into_iter().map(|c| if c.name == "G91" {
        Command::new("( G91 removed )")
    } else {
        c
    }).collect()
}

/// Write one serialized command per line.
pub fn write_commands(mut out: impl Write, commands: &[Command]) -> io::Result<()> {
    for command in commands {
        writeln!(out, "{}", command)?;
    }
    Ok(())
}
