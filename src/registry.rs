// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! The schema of known commands: which modal group each command belongs to,
//! which parameter letters it accepts, and in which order groups execute.

use std::collections::HashMap;
use std::fmt;
use fixedbitset::FixedBitSet;

use crate::error::RegistryError;

/// All axis words, plus F and S.
pub const AXES: &str = "XYZABCUVWFS";

fn letter_index(letter: char) -> Option<usize> {
    if letter.is_ascii_uppercase() {
        Some(letter as usize - 'A' as usize)
    } else {
        None
    }
}

/// The parameter schema of one command name.
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub title: String,
    letters: FixedBitSet,
}

impl Template {
    pub fn new(name: impl Into<String>, letters: &str, title: impl Into<String>) -> Self {
        let mut set = FixedBitSet::with_capacity(26);
        for index in letters.chars().filter_map(letter_index) {
            set.insert(index);
        }
        Template { name: name.into(), title: title.into(), letters: set }
    }

    /// Whether `letter` is a valid parameter for this command.
    pub fn accepts(&self, letter: char) -> bool {
        letter_index(letter).map_or(false, |i| self.letters.contains(i))
    }

    /// The accepted parameter letters in alphabetical order.
    pub fn letters(&self) -> impl Iterator<Item=char> + '_ {
        self.letters.ones().map(|i| (b'A' + i as u8) as char)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} '{}' '{}'", self.name, self.letters().collect::<String>(), self.title)
    }
}

/// A modal group: at most one of its commands may appear on a line.
#[derive(Debug, Clone)]
pub struct Group {
    pub short_name: String,
    pub title: String,
    templates: Vec<Template>,
    execution_key: i32,
}

impl Group {
    fn new(short_name: &str, title: &str) -> Self {
        Group {
            short_name: short_name.into(),
            title: title.into(),
            templates: vec![],
            execution_key: -1,
        }
    }

    /// Register a G or M code with its parameter letters.
    pub fn code(&mut self, name: &str, letters: &str, title: &str) -> &mut Self {
        self.templates.push(Template::new(name, letters, title));
        self
    }

    /// Register a letter code (like F or T) that takes no parameters.
    pub fn letter_code(&mut self, letter: char, title: &str) -> &mut Self {
        self.templates.push(Template::new(letter.to_string(), "", title));
        self
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Position of the group in the order of execution, -1 if unassigned.
    pub fn execution_key(&self) -> i32 {
        self.execution_key
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.short_name, self.title)
    }
}

/// Collects groups in execution order, then freezes them into a `Registry`.
#[derive(Default)]
pub struct RegistryBuilder {
    groups: Vec<Group>,
    motion_group: Option<String>,
    keyed: bool,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new group at the end of the execution order.
    pub fn group(&mut self, short_name: &str, title: &str) -> Result<&mut Group, RegistryError> {
        self.check_new(short_name)?;
        self.groups.push(Group::new(short_name, title));
        self.keyed = false;
        Ok(self.groups.last_mut().expect("just pushed"))
    }

    /// Insert a new group right before the existing group `before`.
    pub fn group_before(&mut self, short_name: &str, title: &str, before: &str)
                        -> Result<&mut Group, RegistryError> {
        self.check_new(short_name)?;
        let index = self.position(before)?;
        self.groups.insert(index, Group::new(short_name, title));
        self.keyed = false;
        Ok(&mut self.groups[index])
    }

    /// Look up an already created group to add more templates to it.
    pub fn group_mut(&mut self, short_name: &str) -> Result<&mut Group, RegistryError> {
        let index = self.position(short_name)?;
        Ok(&mut self.groups[index])
    }

    /// Designate the group whose commands are motion commands.
    pub fn motion_group(&mut self, short_name: &str) -> Result<(), RegistryError> {
        self.position(short_name)?;
        self.motion_group = Some(short_name.into());
        Ok(())
    }

    /// Make sure every group's execution key matches its list position.
    ///
    /// This is a no-op unless the group list changed since the last call.
    pub fn assign_execution_keys(&mut self) {
        if !self.keyed {
            for (index, group) in self.groups.iter_mut().enumerate() {
                group.execution_key = index as i32;
            }
            self.keyed = true;
        }
    }

    pub fn build(mut self) -> Result<Registry, RegistryError> {
        self.assign_execution_keys();
        let motion_name = self.motion_group.take().ok_or(RegistryError::MissingMotionGroup)?;
        let motion_group = self.position(&motion_name)?;

        let mut by_short_name = HashMap::new();
        let mut by_command = HashMap::new();
        for (gi, group) in self.groups.iter().enumerate() {
            by_short_name.insert(group.short_name.clone(), gi);
            for (ti, template) in group.templates.iter().enumerate() {
                if let Some((other, _)) = by_command.insert(template.name.clone(), (gi, ti)) {
                    return Err(RegistryError::DuplicateCommand {
                        name: template.name.clone(),
                        first: self.groups[other].short_name.clone(),
                        second: group.short_name.clone(),
                    });
                }
            }
        }
        Ok(Registry { groups: self.groups, by_short_name, by_command, motion_group })
    }

    fn position(&self, short_name: &str) -> Result<usize, RegistryError> {
        self.groups.iter().position(|g| g.short_name == short_name)
            .ok_or_else(|| RegistryError::UnknownGroup(short_name.into()))
    }

    fn check_new(&self, short_name: &str) -> Result<(), RegistryError> {
        if self.groups.iter().any(|g| g.short_name == short_name) {
            Err(RegistryError::DuplicateGroup(short_name.into()))
        } else {
            Ok(())
        }
    }
}

/// The immutable table of groups and templates used during line resolution.
#[derive(Debug, Clone)]
pub struct Registry {
    groups: Vec<Group>,
    by_short_name: HashMap<String, usize>,
    by_command: HashMap<String, (usize, usize)>,
    motion_group: usize,
}

impl Registry {
    /// The standard table, following the LinuxCNC order of execution.
    pub fn linuxcnc() -> Self {
        linuxcnc_table().expect("built-in registry table is consistent")
    }

    /// Groups in execution order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn motion_group(&self) -> &Group {
        &self.groups[self.motion_group]
    }

    pub fn is_motion(&self, group: &Group) -> bool {
        group.short_name == self.motion_group().short_name
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.by_command.get(name).map(|&(gi, ti)| &self.groups[gi].templates[ti])
    }

    /// The group of a command, looked up by exact command name or group
    /// short name.
    pub fn group_of(&self, name: &str) -> Option<&Group> {
        self.by_command.get(name).map(|&(gi, _)| gi)
            .or_else(|| self.by_short_name.get(name).copied())
            .map(|gi| &self.groups[gi])
    }

    /// Like `group_of`, but falls back to the group named by the first
    /// character (so `F100` finds the `F` group and comments the `(` group).
    pub fn resolve_group(&self, name: &str) -> Option<&Group> {
        self.group_of(name).or_else(|| {
            let first = name.chars().next()?;
            self.by_short_name.get(&first.to_string()).map(|&gi| &self.groups[gi])
        })
    }

    /// The sort key for a command name; -1 if it has no group of its own.
    pub fn execution_key(&self, name: &str) -> i32 {
        self.group_of(name).map_or(-1, Group::execution_key)
    }
}

// The table is derived from the "G Code Order of Execution" section of the
// LinuxCNC documentation, with M5/M9 moved behind motion.
fn linuxcnc_table() -> Result<Registry, RegistryError> {
    let mut rb = RegistryBuilder::new();

    rb.group("N", "Line Number")?.letter_code('N', "Line Number");
    rb.group("(", "Comment")?;

    rb.group("G93", "Feed Rate Mode")?
        .code("G93", "", "Inverse Time Mode")
        .code("G94", "", "Units Per Minute Mode")
        .code("G95", "", "Units Per Revolution Mode");
    rb.group("F", "Feed")?.letter_code('F', "Set Feed Rate");
    rb.group("S", "Spindle")?.letter_code('S', "Set Spindle Speed");
    rb.group("T", "Tool")?.letter_code('T', "Select Tool");

    rb.group("M6", "Tool Change")?.code("M6", "T", "Tool Change");
    rb.group("M3", "Spindle Control")?
        .code("M3", "S", "Start Spindle Clockwise")
        .code("M4", "S", "Start Spindle Counterclockwise")
        .code("M19", "RQP", "Orient Spindle")
        .code("M96", "DS", "Constant Surface Speed Mode")
        .code("M97", "", "RPM Mode");
    rb.group("M7", "Coolant")?
        .code("M7", "", "Enable Mist Coolant")
        .code("M8", "", "Enable Flood Coolant");
    rb.group("M48", "Overrides")?
        .code("M48", "", "Enable Speed/Feed Override")
        .code("M49", "", "Disable Speed/Feed Override")
        .code("M50", "P", "Feed Override Control")
        .code("M51", "P", "Spindle Override Control")
        .code("M52", "P", "Adaptive Feed Control")
        .code("M53", "P", "Feed Stop Control");

    rb.group("G4", "Dwell")?.code("G4", "P", "Dwell");
    rb.group("G17", "Plane Selection")?
        .code("G17", "", "Use XY Plane")
        .code("G18", "", "Use ZX Plane")
        .code("G19", "", "Use YZ Plane")
        .code("G17.1", "", "Use UV Plane")
        .code("G18.1", "", "Use WU Plane")
        .code("G19.1", "", "Use VW Plane");
    rb.group("G20", "Units")?
        .code("G20", "", "Use inches for length")
        .code("G21", "", "Use millimeters for length");
    rb.group("G40", "Cutter Radius Compensation")?
        .code("G40", "", "Compensation Off")
        .code("G41", "D", "Compensation Left")
        .code("G42", "D", "Compensation Right")
        .code("G41.1", "DL", "Dynamic Compensation Left")
        .code("G42.1", "DL", "Dynamic Compensation Right");
    rb.group("G43", "Tool Length Offset")?
        .code("G43", "H", "Tool Length Offset")
        .code("G43.1", AXES, "Dynamic Tool Length Offset")
        .code("G43.2", "H", "Apply Additional Tool Length Offset")
        .code("G49", "", "Cancel Tool Length Compensation");
    rb.group("G54", "Coordinate System")?
        .code("G54", "", "Select Coordinate System 1")
        .code("G55", "", "Select Coordinate System 2")
        .code("G56", "", "Select Coordinate System 3")
        .code("G57", "", "Select Coordinate System 4")
        .code("G58", "", "Select Coordinate System 5")
        .code("G59", "", "Select Coordinate System 6")
        .code("G59.1", "", "Select Coordinate System 7")
        .code("G59.2", "", "Select Coordinate System 8")
        .code("G59.3", "", "Select Coordinate System 9");
    rb.group("G61", "Path Control")?
        .code("G61", "", "Exact Path Mode Collinear Allowed")
        .code("G61.1", "", "Exact Path Mode No Collinear")
        .code("G64", "", "Path Blending");
    rb.group("G90", "Distance Mode")?
        .code("G90", "", "Absolute Distance Mode")
        .code("G91", "", "Incremental Distance Mode")
        .code("G90.1", "", "Absolute Arc Distance Mode")
        .code("G91.1", "", "Incremental Arc Distance Mode");
    rb.group("G98", "Retract Mode")?
        .code("G98", "", "Retract to Start")
        .code("G99", "", "Retract to R");
    rb.group("G28", "Reference Motion")?
        .code("G28", AXES, "Go/Set Position")
        .code("G28.1", AXES, "Go/Set Position")
        .code("G30", AXES, "Go/Set Position")
        .code("G30.1", AXES, "Go/Set Position")
        .code("G92", "", "Reset Offsets")
        .code("G92.1", "", "Reset Offsets")
        .code("G92.2", "", "Reset Offsets");

    let axes_arc = format!("{}IJKR", AXES);
    let axes_spline = format!("{}IJPQ", AXES);
    let axes_ij = format!("{}IJ", AXES);
    let axes_pl = format!("{}PL", AXES);
    let axes_k = format!("{}K", AXES);
    rb.group("G0", "Motion")?
        .code("G0", AXES, "Rapid Move")
        .code("G1", AXES, "Linear Move")
        .code("G2", &axes_arc, "CW Arc")
        .code("G3", &axes_arc, "CCW Arc")
        .code("G5", &axes_spline, "Cubic Spline")
        .code("G5.1", &axes_ij, "Quadratic Spline")
        .code("G5.2", &axes_pl, "NURBS")
        .code("G33", &axes_k, "Spindle Synchronized Motion")
        .code("G33.1", &axes_k, "Rigid Tapping")
        .code("G38.2", AXES, "Probe toward contact, signal failure")
        .code("G38.3", AXES, "Probe toward contact")
        .code("G38.4", AXES, "Probe away from contact, signal failure")
        .code("G38.5", &axes_k, "Probe away from contact");
    rb.motion_group("G0")?;

    // Canned cycles are motion commands as well.
    let axes_rlp = format!("{}RLP", AXES);
    let axes_rlq = format!("{}RLQ", AXES);
    rb.group_mut("G0")?
        .code("G81", &axes_rlp, "Drilling Cycle")
        .code("G82", &axes_rlp, "Drilling Cycle, Dwell")
        .code("G83", &axes_rlq, "Drilling Cycle, Peck")
        .code("G73", &axes_rlq, "Drilling Cycle, Chip Breaking")
        .code("G85", &axes_rlp, "Boring Cycle, Feed Out")
        .code("G89", &axes_rlp, "Boring Cycle, Dwell, Feed Out")
        .code("G76", &format!("{}PIJRKQHLE", AXES), "Threading Cycle");

    // Cancelling a canned cycle executes after motion.
    rb.group("G80", "Cancel Canned Cycle")?.code("G80", "", "Cancel Canned Cycle");

    rb.group("M5", "Spindle/Coolant Stopping")?
        .code("M5", "", "Stop Spindle")
        .code("M9", "", "Stop Coolant");
    rb.group("M0", "Stopping")?
        .code("M0", "", "Program Pause")
        .code("M1", "", "Optional Program Pause")
        .code("M2", "", "Program End")
        .code("M30", "", "Change Pallet and Program End")
        .code("M60", "", "Change Pallet Pause");

    rb.build()
}
