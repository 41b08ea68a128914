// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use pretty_assertions::assert_eq;
use rs274::error::RegistryError;
use rs274::registry::{Registry, RegistryBuilder, Template};

fn keys(registry: &Registry) -> Vec<(String, i32)> {
    registry.groups().iter().map(|g| (g.short_name.clone(), g.execution_key())).collect()
}

#[test]
fn test_execution_keys_follow_order() {
    let mut rb = RegistryBuilder::new();
    rb.group("A", "first").unwrap().code("A1", "", "");
    rb.group("B", "second").unwrap().code("B1", "", "");
    rb.motion_group("B").unwrap();
    rb.assign_execution_keys();
    // inserting a group must invalidate the keys assigned before
    rb.group_before("C", "inserted", "B").unwrap().code("C1", "", "");
    let registry = rb.build().unwrap();
    assert_eq!(keys(&registry), vec![
        ("A".into(), 0), ("C".into(), 1), ("B".into(), 2),
    ]);
    assert_eq!(registry.execution_key("C1"), 1);
    assert_eq!(registry.execution_key("B"), 2);
    assert_eq!(registry.execution_key("Z9"), -1);
    assert_eq!(registry.motion_group().short_name, "B");
}

#[test]
fn test_builder_errors() {
    let mut rb = RegistryBuilder::new();
    rb.group("G0", "Motion").unwrap();
    assert_eq!(rb.group("G0", "again").unwrap_err(), RegistryError::DuplicateGroup("G0".into()));
    assert_eq!(rb.group_before("X", "", "nope").unwrap_err(),
               RegistryError::UnknownGroup("nope".into()));
    assert_eq!(rb.group_mut("nope").unwrap_err(), RegistryError::UnknownGroup("nope".into()));
    assert_eq!(rb.motion_group("nope").unwrap_err(), RegistryError::UnknownGroup("nope".into()));

    let mut rb = RegistryBuilder::new();
    rb.group("G0", "Motion").unwrap();
    assert_eq!(rb.build().unwrap_err(), RegistryError::MissingMotionGroup);

    let mut rb = RegistryBuilder::new();
    rb.group("G0", "Motion").unwrap().code("G0", "XYZ", "Rapid");
    rb.group("G80", "Cancel").unwrap().code("G0", "", "Oops");
    rb.motion_group("G0").unwrap();
    assert_eq!(rb.build().unwrap_err(), RegistryError::DuplicateCommand {
        name: "G0".into(), first: "G0".into(), second: "G80".into(),
    });
}

#[test]
fn test_template_letters() {
    let template = Template::new("G2", "XYZIJKR", "CW Arc");
    assert!(template.accepts('I'));
    assert!(!template.accepts('P'));
    assert!(!template.accepts('x'));
    assert_eq!(template.letters().collect::<String>(), "IJKRXYZ");
    assert_eq!(format!("{:?}", template), "G2 'IJKRXYZ' 'CW Arc'");
}

#[test]
fn test_linuxcnc_table() {
    let registry = Registry::linuxcnc();
    let names: Vec<_> = registry.groups().iter().map(|g| g.short_name.as_str()).collect();
    assert_eq!(names, vec![
        "N", "(", "G93", "F", "S", "T", "M6", "M3", "M7", "M48", "G4", "G17", "G20", "G40",
        "G43", "G54", "G61", "G90", "G98", "G28", "G0", "G80", "M5", "M0",
    ]);
    for (index, group) in registry.groups().iter().enumerate() {
        assert_eq!(group.execution_key(), index as i32);
    }

    assert_eq!(registry.motion_group().short_name, "G0");
    assert!(registry.execution_key("G80") > registry.execution_key("G0"));
    assert!(registry.execution_key("G98") < registry.execution_key("G83"));

    let g83 = registry.template("G83").unwrap();
    assert_eq!(g83.letters().collect::<String>(), "ABCFLQRSUVWXYZ");
    assert!(registry.template("G38.2").unwrap().accepts('Z'));
    assert!(registry.template("M3").unwrap().accepts('S'));
    assert!(registry.template("G999").is_none());
}

#[test]
fn test_group_lookup() {
    let registry = Registry::linuxcnc();
    assert_eq!(registry.group_of("G1").unwrap().short_name, "G0");
    assert_eq!(registry.group_of("M9").unwrap().short_name, "M5");
    // letter codes are only found through their first character
    assert!(registry.group_of("F100").is_none());
    assert_eq!(registry.resolve_group("F100").unwrap().short_name, "F");
    assert_eq!(registry.resolve_group("N20").unwrap().short_name, "N");
    assert_eq!(registry.resolve_group("(hello)").unwrap().short_name, "(");
    assert!(registry.resolve_group("G999").is_none());
    assert!(registry.resolve_group("").is_none());

    assert_eq!(registry.execution_key("F100"), -1);
    assert_eq!(registry.execution_key("(hello)"), -1);
    assert!(registry.is_motion(registry.group_of("G83").unwrap()));
    assert!(!registry.is_motion(registry.group_of("G80").unwrap()));
    assert_eq!(registry.group_of("G80").unwrap().to_string(), "G80 (Cancel Canned Cycle)");
}
