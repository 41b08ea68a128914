// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! A library to normalize RS274 G-code, as written by arbitrary CAM
//! post-processors, into a small and unambiguous set of commands.
//!
//! Each line is split into tokens (using the Pest parser library), and the
//! tokens are resolved into commands: `G`, `M`, `F`, `S`, `T` and `N` words
//! become commands, and the remaining letter words are bound as parameters to
//! the one command on the line that accepts them.  Modal group conflicts are
//! detected, and lines that only contain parameters continue the last motion
//! command ("sticky" motion).
//!
//! A second pass can rewrite drilling cycles (G81, G82 and G83) into plain
//! rapid, feed and dwell moves.
//!
//! ## Basic usage
//!
//! ```rust
//! use rs274::registry::Registry;
//! use rs274::resolve::{resolve_line, ParserState};
//!
//! let registry = Registry::linuxcnc();
//! let mut state = ParserState::new();
//!
//! let first = resolve_line(&registry, &mut state, "G1 X1 Y2 F100");
//! assert!(first.is_ok());
//! assert_eq!(first.commands[0].to_string(), "F100");
//! assert_eq!(first.commands[1].to_string(), "G1 X1 Y2");
//!
//! // No motion command: G1 is still in effect.
//! let second = resolve_line(&registry, &mut state, "X3");
//! assert_eq!(second.commands[0].to_string(), "G1 X3");
//! ```
//!
//! For whole files, `program::normalize` runs every line, filters out `N`,
//! `G28` and `G91` codes, and expands canned cycles.
//!
//! ## Unsupported features
//!
//! Expressions, parameters and O-word control flow are not evaluated; O-words
//! and bracketed numbers are recognized, but reported as unusable.

pub mod ast;
pub mod cycles;
pub mod error;
pub mod parse;
pub mod program;
pub mod registry;
pub mod resolve;
pub mod token;

// internal helpers
pub(crate) mod util;
