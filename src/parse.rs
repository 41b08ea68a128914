// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use itertools::Itertools;
use pest_derive::Parser;
use pest::{Parser, iterators::Pair};

use crate::error::LineError;
use crate::token::*;

#[derive(Parser)]
#[grammar = "gcode.pest"]
pub struct GcodeParser;

fn is_blank(ch: u8) -> bool {
    ch == b' ' || ch == b'\t'
}

/// Parse a numeric literal that the grammar has already validated.
///
/// Literals without a decimal point are integers, unless they are too large
/// to be represented as one.
pub(crate) fn parse_number(text: &str) -> Number {
    if !text.contains('.') {
        if let Ok(n) = text.parse() {
            return Number::Int(n);
        }
    }
    Number::Real(text.parse().expect("valid number"))
}

fn make_token(pair: Pair<Rule>, start: usize) -> Option<Token> {
    let end_offset = start + pair.as_str().len();
    Some(match pair.as_rule() {
        Rule::o_word => {
            let (routine, keyword) = pair.into_inner().collect_tuple().expect("children");
            Token::OLetter {
                // absurdly long routine numbers just don't match
                routine: routine.as_str().parse().ok()?,
                keyword: keyword.as_str().to_ascii_lowercase().parse().expect("valid keyword"),
                end_offset,
            }
        }
        Rule::word => {
            let (letter, number) = pair.into_inner().collect_tuple().expect("children");
            let letter = letter.as_str().chars().next().expect("one letter");
            Token::Letter(LetterToken::new(letter.to_ascii_uppercase(),
                                           parse_number(number.as_str()), end_offset))
        }
        Rule::comment => Token::Comment {
            text: pair.as_str().into(),
            is_first: start == 0,
            end_offset,
        },
        Rule::bracket => {
            let (real,) = pair.into_inner().collect_tuple().expect("one child");
            Token::Bracket { value: real.as_str().parse().expect("valid real"), end_offset }
        }
        _ => unreachable!()
    })
}

/// Try to match a single token starting exactly at byte offset `start`.
///
/// The O-word, letter word, comment and bracket matchers are tried in this
/// order.  Returns `None` if none of them matches.
pub fn match_token(line: &str, start: usize) -> Option<Token> {
    let rest = line.get(start..)?;
    let mut pairs = GcodeParser::parse(Rule::token, rest).ok()?;
    let token = pairs.next()?.into_inner().next()?;
    make_token(token, start)
}

/// Split a line (without line terminator) into tokens.
///
/// Spaces and tabs between tokens are skipped.  Tokenizing stops at the
/// first position where no token matches, and the whole line is rejected.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LineError> {
    let bytes = line.as_bytes();
    let mut tokens = vec![];
    let mut offset = 0;
    while offset < line.len() {
        if is_blank(bytes[offset]) {
            offset += 1;
            continue;
        }
        match match_token(line, offset) {
            Some(token) => {
                offset = token.end_offset();
                tokens.push(token);
            }
            None => return Err(LineError::Tokenize {
                offset,
                remainder: line[offset..].into(),
            }),
        }
    }
    Ok(tokens)
}

/// Turn a command name such as `G1` or `G38.2` back into a letter word.
///
/// Used to synthesize sticky motion words; the word gets an end offset of 0
/// since it does not occur in the line.
pub fn letter_word(name: &str) -> Option<LetterToken> {
    match GcodeParser::parse(Rule::word, name).ok()?.next() {
        Some(pair) if pair.as_str().len() == name.len() => match make_token(pair, 0)? {
            Token::Letter(mut t) => {
                t.end_offset = 0;
                Some(t)
            }
            _ => None,
        },
        _ => None,
    }
}
