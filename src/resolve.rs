// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Resolution of one line of tokens into a list of commands.
//!
//! The pipeline is: categorize tokens into commands and unused tokens, build
//! a table of unused letter words, check modal group conflicts, and bind the
//! unused words as parameters to the single command that accepts them.
//!
//! If words are left over and the line has no motion command, the line is
//! tried again with the "sticky" motion command of previous lines added
//! (or `G0` if the line cancels a canned cycle with `G80`).

use std::collections::{BTreeMap, HashMap};
use itertools::Itertools;
use tracing::{debug, error, trace};

use crate::ast::{Command, CommandList};
use crate::error::LineError;
use crate::parse::{letter_word, tokenize};
use crate::registry::Registry;
use crate::token::{LetterToken, Number, Token};

/// State carried from one line to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserState {
    /// Name of the last motion command, e.g. `G1`.
    pub sticky_motion_command: Option<String>,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The result of resolving one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    pub commands: Vec<Command>,
    pub errors: Vec<LineError>,
}

impl Resolved {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The result of one run of the token-to-command pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Commands in token order.
    pub commands: Vec<Command>,
    pub errors: Vec<LineError>,
    /// Letter words that could not be bound to any command.
    pub unused: Vec<LetterToken>,
    /// The motion command found on the line, if any.
    pub motion_command: Option<String>,
}

impl Attempt {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty() && self.unused.is_empty()
    }
}

/// Split tokens into direct commands and tokens that still need a command.
pub fn categorize(tokens: &[Token]) -> (Vec<Command>, Vec<Token>) {
    let mut commands = vec![];
    let mut unused = vec![];
    for token in tokens {
        token.categorize(&mut commands, &mut unused);
    }
    (commands, unused)
}

/// Key the unused letter words by letter.
///
/// A repeated letter is an error, and only the first occurrence is kept.
/// Tokens that are not letter words cannot be parameters at all.
pub fn table_from_tokens(unused: &[Token]) -> (BTreeMap<char, LetterToken>, Vec<LineError>) {
    let mut table = BTreeMap::new();
    let mut errors = vec![];
    for token in unused {
        match token {
            Token::Letter(t) => {
                if table.contains_key(&t.letter) {
                    errors.push(LineError::DuplicateParameter { letter: t.letter });
                } else {
                    table.insert(t.letter, t.clone());
                }
            }
            _ => errors.push(LineError::NotAParameter { token: token.to_string() }),
        }
    }
    (table, errors)
}

/// Check that no two commands share a modal group, and find the motion
/// command of the line.
pub fn detect_conflicts(registry: &Registry, commands: &[Command])
                        -> (Vec<LineError>, Option<String>) {
    let mut seen: HashMap<&str, &Command> = HashMap::new();
    let mut errors = vec![];
    let mut motion_command = None;
    for command in commands {
        let group = match registry.resolve_group(&command.name) {
            Some(group) => group,
            None => {
                errors.push(LineError::UnresolvedGroup { name: command.name.clone() });
                continue;
            }
        };
        if let Some(first) = seen.get(group.short_name.as_str()) {
            errors.push(LineError::ModalGroupConflict {
                first: first.name.clone(),
                second: command.name.clone(),
                group: group.short_name.clone(),
            });
        } else {
            seen.insert(&group.short_name, command);
        }
        if registry.is_motion(group) {
            motion_command = Some(command.name.clone());
        }
    }
    (errors, motion_command)
}

/// Bind each unused letter word to the one command on the line that accepts
/// it.  Words that no command accepts stay unused; words that several
/// commands accept are an error and stay unused as well.
pub fn bind_tokens(registry: &Registry, commands: &mut [Command],
                   table: BTreeMap<char, LetterToken>) -> (Vec<LetterToken>, Vec<LineError>) {
    let mut unused = vec![];
    let mut errors = vec![];
    for (letter, token) in table {
        let takers = commands.iter().positions(|command| {
            registry.template(&command.name).map_or(false, |t| t.accepts(letter))
        }).collect_vec();
        match takers.as_slice() {
            [] => unused.push(token),
            &[index] => {
                commands[index].parameters.insert(letter, token.value);
            }
            _ => {
                errors.push(LineError::AmbiguousParameter {
                    letter,
                    commands: takers.iter().map(|&i| commands[i].name.clone()).collect(),
                });
                unused.push(token);
            }
        }
    }
    (unused, errors)
}

/// Run the whole categorize/detect/bind pipeline once.
pub fn commands_from_tokens(registry: &Registry, tokens: &[Token]) -> Attempt {
    let (mut commands, unused) = categorize(tokens);
    let (table, mut errors) = table_from_tokens(&unused);
    let (conflicts, motion_command) = detect_conflicts(registry, &commands);
    errors.extend(conflicts);
    let (unused, bind_errors) = bind_tokens(registry, &mut commands, table);
    errors.extend(bind_errors);

    debug!(commands = %CommandList(&commands), unused = %unused.iter().join(" "),
           errors = errors.len(), "pipeline finished");
    Attempt { commands, errors, unused, motion_command }
}

enum Stage {
    First,
    Retry {
        /// The retry was caused by `G80`, not by the sticky motion command.
        after_cancel: bool,
        first: Attempt,
    },
}

/// Resolve one line of G-code (without line terminator) into commands.
///
/// On success the commands are in execution order and `state` remembers the
/// motion command used.  On failure, the commands of the first attempt are
/// returned in token order together with all errors.
pub fn resolve_line(registry: &Registry, state: &mut ParserState, line: &str) -> Resolved {
    let mut tokens = match tokenize(line) {
        Ok(tokens) => tokens,
        Err(e) => return Resolved { commands: vec![], errors: vec![e] },
    };

    let mut stage = Stage::First;
    loop {
        let attempt = commands_from_tokens(registry, &tokens);
        if attempt.succeeded() {
            let after_cancel = matches!(stage, Stage::Retry { after_cancel: true, .. });
            return finish(registry, state, attempt, after_cancel);
        }
        stage = match stage {
            Stage::First => match sticky_word(state, &tokens, &attempt) {
                Some((word, after_cancel)) => {
                    trace!(line, word = %word, "retrying with motion word");
                    tokens.push(Token::Letter(word));
                    Stage::Retry { after_cancel, first: attempt }
                }
                None => return fail(state, attempt),
            },
            Stage::Retry { first, .. } => return fail(state, first),
        };
    }
}

/// Determine the motion word to add for a second attempt, if one is allowed.
fn sticky_word(state: &ParserState, tokens: &[Token], attempt: &Attempt)
               -> Option<(LetterToken, bool)> {
    if attempt.unused.is_empty() || attempt.motion_command.is_some() {
        return None;
    }
    let cancels_cycle = tokens.iter().filter_map(Token::as_letter)
        .any(|t| t.letter == 'G' && t.value == Number::Int(80));
    if cancels_cycle {
        return Some((LetterToken::new('G', 0i64, 0), true));
    }
    let name = state.sticky_motion_command.as_deref()?;
    match letter_word(name) {
        Some(word) if word.letter == 'G' => Some((word, false)),
        _ => {
            error!(name, "sticky motion command is not a G word");
            None
        }
    }
}

fn finish(registry: &Registry, state: &mut ParserState, attempt: Attempt,
          after_cancel: bool) -> Resolved {
    let mut commands = attempt.commands;
    commands.sort_by_key(|command| registry.execution_key(&command.name));

    // Cancel-then-rapid, whatever the execution order of the two groups.
    if after_cancel {
        let g0 = commands.iter().position(|c| c.name == "G0");
        let g80 = commands.iter().position(|c| c.name == "G80");
        if let (Some(g0), Some(g80)) = (g0, g80) {
            if g80 > g0 {
                let cancel = commands.remove(g80);
                commands.insert(g0, cancel);
            }
        }
    }

    if let Some(name) = attempt.motion_command {
        state.sticky_motion_command = Some(name);
    }
    Resolved { commands, errors: attempt.errors }
}

fn fail(state: &mut ParserState, attempt: Attempt) -> Resolved {
    let mut errors = attempt.errors;
    if !attempt.unused.is_empty() {
        errors.push(LineError::UnusedTokens { tokens: attempt.unused.iter().join(" ") });
    }
    if let Some(name) = attempt.motion_command {
        state.sticky_motion_command = Some(name);
    }
    Resolved { commands: attempt.commands, errors }
}
