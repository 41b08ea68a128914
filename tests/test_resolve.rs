// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use pretty_assertions::assert_eq;
use rs274::ast::Command;
use rs274::error::LineError;
use rs274::parse::tokenize;
use rs274::registry::{Registry, RegistryBuilder};
use rs274::resolve::{commands_from_tokens, detect_conflicts, resolve_line, ParserState};
use rs274::token::LetterToken;

fn state_with(sticky: &str) -> ParserState {
    ParserState { sticky_motion_command: Some(sticky.into()) }
}

fn serialized(commands: &[Command]) -> Vec<String> {
    commands.iter().map(ToString::to_string).collect()
}

#[test]
fn test_simple_motion() {
    let registry = Registry::linuxcnc();
    let mut state = ParserState::new();
    let result = resolve_line(&registry, &mut state, "G0 X1 Y2");
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.commands, vec![Command::new("G0").with('X', 1).with('Y', 2)]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G0"));
}

#[test]
fn test_sticky_motion() {
    let registry = Registry::linuxcnc();
    let mut state = state_with("G1");
    let result = resolve_line(&registry, &mut state, "X1 Y2");
    assert!(result.is_ok());
    assert_eq!(serialized(&result.commands), vec!["G1 X1 Y2"]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G1"));

    // fractional motion codes survive the round trip through a word
    let mut state = state_with("G38.2");
    let result = resolve_line(&registry, &mut state, "Z-1");
    assert_eq!(serialized(&result.commands), vec!["G38.2 Z-1"]);
}

#[test]
fn test_no_sticky_motion() {
    let registry = Registry::linuxcnc();
    let mut state = ParserState::new();
    let result = resolve_line(&registry, &mut state, "X1");
    assert_eq!(result.commands, vec![]);
    assert_eq!(result.errors, vec![LineError::UnusedTokens { tokens: "X1".into() }]);
    assert_eq!(state, ParserState::new());
}

#[test]
fn test_modal_conflict() {
    let registry = Registry::linuxcnc();
    let mut state = ParserState::new();
    let result = resolve_line(&registry, &mut state, "G0 G1");
    assert_eq!(result.errors, vec![LineError::ModalGroupConflict {
        first: "G0".into(), second: "G1".into(), group: "G0".into(),
    }]);
    assert_eq!(serialized(&result.commands), vec!["G0", "G1"]);
    assert_eq!(result.errors[0].to_string(),
               "'G0' and 'G1' are both in group 'G0' and cannot be used together");
}

#[test]
fn test_comment_only() {
    let registry = Registry::linuxcnc();
    let mut state = state_with("G1");
    let result = resolve_line(&registry, &mut state, "(hello)");
    assert!(result.is_ok());
    assert_eq!(result.commands, vec![Command::new("(hello)")]);
    assert!(result.commands[0].is_comment());
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G1"));
}

#[test]
fn test_execution_order() {
    let registry = Registry::linuxcnc();
    let mut state = ParserState::new();
    let result = resolve_line(&registry, &mut state, "G0 X1 M3 (go) S1000 N5");
    assert!(result.is_ok());
    // ungrouped names sort first and keep their token order
    assert_eq!(serialized(&result.commands), vec!["(go)", "S1000", "N5", "M3", "G0 X1"]);

    let result = resolve_line(&registry, &mut state, "M2 G91 G1 Z-1 F50 G21");
    assert_eq!(serialized(&result.commands), vec!["F50", "G21", "G91", "G1 Z-1", "M2"]);
}

#[test]
fn test_cancel_cycle_with_motion() {
    let registry = Registry::linuxcnc();
    let mut state = state_with("G81");
    let result = resolve_line(&registry, &mut state, "G80 X1 Y2");
    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(serialized(&result.commands), vec!["G80", "G0 X1 Y2"]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G0"));

    // a plain G80 needs no motion at all
    let result = resolve_line(&registry, &mut state, "G80");
    assert_eq!(serialized(&result.commands), vec!["G80"]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G0"));
}

#[test]
fn test_no_retry_with_motion_present() {
    let registry = Registry::linuxcnc();
    let mut state = state_with("G83");
    let result = resolve_line(&registry, &mut state, "G1 X1 Q5");
    assert_eq!(result.errors, vec![LineError::UnusedTokens { tokens: "Q5".into() }]);
    assert_eq!(serialized(&result.commands), vec!["G1 X1"]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G1"));
}

#[test]
fn test_failed_retry_reports_first_attempt() {
    let registry = Registry::linuxcnc();
    let mut state = state_with("G1");
    // G1 does not accept Q, so the retry does not help either
    let result = resolve_line(&registry, &mut state, "M3 X1 Q2");
    assert_eq!(serialized(&result.commands), vec!["M3"]);
    assert_eq!(result.errors, vec![LineError::UnusedTokens { tokens: "Q2 X1".into() }]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G1"));
}

#[test]
fn test_parameter_errors() {
    let registry = Registry::linuxcnc();
    let mut state = ParserState::new();

    let result = resolve_line(&registry, &mut state, "G1 X1 X2");
    assert_eq!(result.errors, vec![LineError::DuplicateParameter { letter: 'X' }]);
    assert_eq!(serialized(&result.commands), vec!["G1 X1"]);

    let result = resolve_line(&registry, &mut state, "G4 M50 P1");
    assert_eq!(result.errors, vec![
        LineError::AmbiguousParameter { letter: 'P', commands: vec!["G4".into(), "M50".into()] },
        LineError::UnusedTokens { tokens: "P1".into() },
    ]);
    assert_eq!(result.errors[0].to_string(), "commands 'G4, M50' all accept the 'P' parameter");

    let result = resolve_line(&registry, &mut state, "o100 call");
    assert_eq!(result.errors, vec![LineError::NotAParameter { token: "O100 call".into() }]);
    assert_eq!(result.commands, vec![]);

    let result = resolve_line(&registry, &mut state, "G1 X[2]");
    assert_eq!(result.errors[0], LineError::Tokenize { offset: 3, remainder: "X[2]".into() });
    let result = resolve_line(&registry, &mut state, "G1 [2]");
    assert_eq!(result.errors, vec![LineError::NotAParameter { token: "[2]".into() }]);
}

#[test]
fn test_tokenize_error_keeps_state() {
    let registry = Registry::linuxcnc();
    let mut state = state_with("G2");
    let result = resolve_line(&registry, &mut state, "G1 X1 $");
    assert_eq!(result.commands, vec![]);
    assert_eq!(result.errors, vec![LineError::Tokenize { offset: 6, remainder: "$".into() }]);
    assert_eq!(state.sticky_motion_command.as_deref(), Some("G2"));
}

#[test]
fn test_unresolved_group() {
    let mut rb = RegistryBuilder::new();
    rb.group("G0", "Motion").unwrap().code("G0", "XYZ", "Rapid");
    rb.motion_group("G0").unwrap();
    let registry = rb.build().unwrap();

    let mut state = ParserState::new();
    let result = resolve_line(&registry, &mut state, "G0 M3 X1");
    assert_eq!(result.errors, vec![LineError::UnresolvedGroup { name: "M3".into() }]);
}

#[test]
fn test_pipeline_pieces() {
    let registry = Registry::linuxcnc();
    let (errors, motion) = detect_conflicts(&registry, &[Command::new("M3"), Command::new("G2")]);
    assert_eq!(errors, vec![]);
    assert_eq!(motion.as_deref(), Some("G2"));

    let attempt = commands_from_tokens(&registry, &tokenize("F100 X1 Y2").unwrap());
    assert!(!attempt.succeeded());
    assert_eq!(attempt.motion_command, None);
    assert_eq!(attempt.commands, vec![Command::new("F100")]);
    assert_eq!(attempt.unused, vec![LetterToken::new('X', 1, 7), LetterToken::new('Y', 2, 10)]);
}

#[test]
fn test_reserialized_lines_resolve_identically() {
    let registry = Registry::linuxcnc();
    for line in &[
        "G1 X1.5 Y-2 Z0.25 F300",
        "G2 X1 Y1 I0.5 J0 (arc)",
        "G98 G83 X1 Y2 Z-3 R1 Q0.5",
        "T1 M6 G43 H1",
    ] {
        let mut state = ParserState::new();
        let first = resolve_line(&registry, &mut state, line);
        assert!(first.is_ok(), "{}: {:?}", line, first.errors);
        let text = serialized(&first.commands).join(" ");

        let mut state = ParserState::new();
        let second = resolve_line(&registry, &mut state, &text);
        assert_eq!(second.errors, vec![]);
        assert_eq!(second.commands, first.commands);
    }
}
