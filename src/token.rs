// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Tokens of a single RS274 line, as produced by `parse::tokenize`.

use std::fmt::{self, Formatter};
use strum_macros::{Display, EnumString};

use crate::ast::Command;

/// The letters whose words become commands of their own, instead of
/// parameters for another command on the line.
const COMMAND_LETTERS: &str = "FGMNST";

/// A numeric word value, which keeps track of whether it was written as an
/// integer or with a decimal point.
///
/// Equality compares the numeric value, so `Int(1)` equals `Real(1.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Real(x) => x,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self { Number::Int(n) }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self { Number::Int(n.into()) }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self { Number::Real(x) }
}

/// Whole reals are written without a trailing `.0`.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Real(x) => write!(f, "{}", x),
        }
    }
}

/// The keyword following an O-word routine number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Keyword {
    #[strum(serialize = "sub")]
    Sub,
    #[strum(serialize = "endsub")]
    EndSub,
    #[strum(serialize = "call")]
    Call,
}

/// A letter word such as `G1` or `X-0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterToken {
    /// Always upper case, never `O`.
    pub letter: char,
    pub value: Number,
    pub end_offset: usize,
}

impl LetterToken {
    pub fn new(letter: char, value: impl Into<Number>, end_offset: usize) -> Self {
        LetterToken { letter, value: value.into(), end_offset }
    }

    /// The name of the command this word stands for, e.g. `G17.1`.
    pub fn command_name(&self) -> String {
        format!("{}{}", self.letter, self.value)
    }
}

impl fmt::Display for LetterToken {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Letter(LetterToken),
    OLetter {
        routine: u32,
        keyword: Keyword,
        end_offset: usize,
    },
    Comment {
        /// Includes the parentheses.
        text: String,
        /// Set when the comment starts the line.
        is_first: bool,
        end_offset: usize,
    },
    Bracket {
        value: f64,
        end_offset: usize,
    },
}

impl Token {
    /// Exclusive end of the token in the source line.
    pub fn end_offset(&self) -> usize {
        match self {
            Token::Letter(t) => t.end_offset,
            Token::OLetter { end_offset, .. } |
            Token::Comment { end_offset, .. } |
            Token::Bracket { end_offset, .. } => *end_offset,
        }
    }

    pub fn as_letter(&self) -> Option<&LetterToken> {
        match self {
            Token::Letter(t) => Some(t),
            _ => None,
        }
    }

    /// Sort this token either into a direct command or into the unused
    /// tokens that still wait for a command to bind to.
    pub fn categorize(&self, commands: &mut Vec<Command>, unused: &mut Vec<Token>) {
        match self {
            Token::Letter(t) if COMMAND_LETTERS.contains(t.letter) => {
                commands.push(Command::new(t.command_name()));
            }
            Token::Comment { text, .. } => commands.push(Command::new(text.clone())),
            // O-words and brackets are never bound to anything (yet).
            _ => unused.push(self.clone()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Letter(t) => write!(f, "{}", t),
            Token::OLetter { routine, keyword, .. } => write!(f, "O{} {}", routine, keyword),
            Token::Comment { text, .. } => write!(f, "{}", text),
            Token::Bracket { value, .. } => write!(f, "[{}]", value),
        }
    }
}
