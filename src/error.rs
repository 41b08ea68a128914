// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use thiserror::Error;

/// A problem found while resolving one line.
///
/// None of these are fatal: they are collected per line and returned next
/// to whatever commands could be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("cannot parse '{remainder}'")]
    Tokenize { offset: usize, remainder: String },
    #[error("'{token}' is not a parameter")]
    NotAParameter { token: String },
    #[error("parameter '{letter}' occurs more than once in the line")]
    DuplicateParameter { letter: char },
    #[error("'{name}' has no associated group")]
    UnresolvedGroup { name: String },
    #[error("'{first}' and '{second}' are both in group '{group}' and cannot be used together")]
    ModalGroupConflict { first: String, second: String, group: String },
    #[error("commands '{}' all accept the '{letter}' parameter", .commands.join(", "))]
    AmbiguousParameter { letter: char, commands: Vec<String> },
    #[error("'{tokens}' is/are unused")]
    UnusedTokens { tokens: String },
}

/// A problem in the construction of a `Registry`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("group '{0}' is defined twice")]
    DuplicateGroup(String),
    #[error("command '{name}' is registered in both '{first}' and '{second}'")]
    DuplicateCommand { name: String, first: String, second: String },
    #[error("there is no group '{0}'")]
    UnknownGroup(String),
    #[error("no motion group has been designated")]
    MissingMotionGroup,
}
