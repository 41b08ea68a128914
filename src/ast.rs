// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use itertools::Itertools;

pub use crate::token::Number;

/// A single executable G/M code together with its parameters.
///
/// Comments are represented as commands too: the name is the comment text
/// including the parentheses, and there are no parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub parameters: BTreeMap<char, Number>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Command { name: name.into(), parameters: BTreeMap::new() }
    }

    /// Builder-style parameter setter, mostly for synthesized commands.
    pub fn with(mut self, letter: char, value: impl Into<Number>) -> Self {
        self.parameters.insert(letter, value.into());
        self
    }

    pub fn is_comment(&self) -> bool {
        self.name.starts_with('(')
    }

    pub fn parameter(&self, letter: char) -> Option<f64> {
        self.parameters.get(&letter).map(|n| n.to_f64())
    }
}

/// The serialized form: `G1 X1 Y2.5`, parameters sorted by letter.
impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.parameters.is_empty() {
            let params = self.parameters.iter()
                .map(|(letter, value)| format!("{}{}", letter, value))
                .join(" ");
            write!(f, " {}", params)?;
        }
        Ok(())
    }
}

/// Helper for displaying a list of commands, e.g. in log messages.
pub struct CommandList<'a>(pub &'a [Command]);

impl Display for CommandList<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join("; "))
    }
}
