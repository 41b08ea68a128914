// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

/// Helper for echoing source text inside a comment, which must not contain
/// parentheses itself.
pub fn braced(text: &str) -> String {
    text.chars().map(|ch| match ch {
        '(' => '{',
        ')' => '}',
        _ => ch,
    }).collect()
}
