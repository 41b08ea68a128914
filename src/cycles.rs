// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Expansion of drilling cycles (G81-G83) into rapid, feed and dwell moves.
//!
//! The expander walks a resolved command stream once, keeping track of the
//! last known X, Y, Z, P, Q and R values, the drilling depth and the retract
//! mode.  Cycles that cannot be expanded safely are replaced by comments.

use std::collections::HashMap;
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::ast::Command;

/// Upper bound on the number of pecks a single G83 may expand to.
pub const MAX_PECKS: u64 = 10_000;

/// Retract height selection for canned cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum RetractMode {
    /// Retract to the Z height the cycle started at.
    G98,
    /// Retract to R.
    G99,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
enum Cycle {
    G81,
    G82,
    G83,
}

/// Geometry of one hole, all values known.
struct Hole {
    x: f64,
    y: f64,
    z: f64,
    depth: f64,
    r: f64,
    dwell: Option<f64>,
}

fn rapid_z(z: f64) -> Command {
    Command::new("G0").with('Z', z)
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "none".into(), |v| v.to_string())
}

/// The state of the canned cycle expansion pass.
#[derive(Debug, Default)]
pub struct CycleExpander {
    vars: HashMap<char, f64>,
    z_depth: Option<f64>,
    retract_mode: Option<RetractMode>,
}

impl CycleExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last known value of a parameter letter.
    pub fn var(&self, letter: char) -> Option<f64> {
        self.vars.get(&letter).copied().filter(|v| v.is_finite())
    }

    pub fn z_depth(&self) -> Option<f64> {
        self.z_depth.filter(|v| v.is_finite())
    }

    pub fn retract_mode(&self) -> Option<RetractMode> {
        self.retract_mode
    }

    /// Process one command, pushing its replacement onto `out`.
    pub fn expand(&mut self, command: Command, out: &mut Vec<Command>) {
        let cycle = command.name.parse::<Cycle>().ok();
        for (&letter, value) in &command.parameters {
            if letter == 'Z' && cycle.is_some() {
                self.z_depth = Some(value.to_f64());
            } else {
                self.vars.insert(letter, value.to_f64());
            }
        }

        if let Ok(mode) = command.name.parse::<RetractMode>() {
            self.retract_mode = Some(mode);
        }
        match cycle {
            Some(cycle) => self.drill(cycle, out),
            // G80 included: the drilling depth stays for later cycles.
            None => out.push(command),
        }
    }

    fn drill(&mut self, cycle: Cycle, out: &mut Vec<Command>) {
        let p = self.var('P');
        let q = self.var('Q');
        let r = self.var('R');
        let x = self.var('X');
        let y = self.var('Y');
        let z = self.var('Z');
        let depth = self.z_depth();
        out.push(Command::new(format!(
            "({} P:{} Q:{} R:{} X:{} Y:{} Z:{} Zdepth:{} retract_mode:{})",
            cycle, show(p), show(q), show(r), show(x), show(y), show(z), show(depth),
            self.retract_mode.map_or_else(|| "none".into(), |m| m.to_string()))));

        let hole = match (x, y, z, depth, r) {
            (Some(x), Some(y), Some(z), Some(depth), Some(r)) => Hole {
                x, y, z, depth, r,
                dwell: if cycle == Cycle::G81 { None } else { p.filter(|&p| p > 0.) },
            },
            _ => return self.fail(cycle, "missing parameter", out),
        };

        match cycle {
            Cycle::G81 => self.drill_simple(&hole, out),
            Cycle::G82 if q.is_none() => self.fail(cycle, "missing parameter", out),
            Cycle::G82 => self.drill_simple(&hole, out),
            Cycle::G83 => match q {
                None => self.fail(cycle, "missing parameter", out),
                Some(q) if q <= 0. => self.fail(cycle, "non-positive Q", out),
                Some(q) if (hole.r - hole.depth) / q > MAX_PECKS as f64 =>
                    self.fail(cycle, "too many pecks", out),
                Some(q) => self.drill_peck(&hole, q, out),
            },
        }
    }

    fn fail(&self, cycle: Cycle, reason: &str, out: &mut Vec<Command>) {
        debug!(%cycle, reason, "canned cycle not expanded");
        out.push(Command::new(format!("( {} failed due to {} )", cycle, reason)));
    }

    /// Make sure Z is at least at R, then go over the hole.
    fn approach(&self, hole: &Hole, out: &mut Vec<Command>) {
        if hole.z < hole.r {
            out.push(rapid_z(hole.r));
        }
        out.push(Command::new("G0").with('X', hole.x).with('Y', hole.y));
    }

    fn dwell(&self, hole: &Hole, out: &mut Vec<Command>) {
        if let Some(p) = hole.dwell {
            out.push(Command::new("G4").with('P', p));
        }
    }

    fn drill_simple(&mut self, hole: &Hole, out: &mut Vec<Command>) {
        self.approach(hole, out);
        if hole.r < hole.z {
            out.push(rapid_z(hole.r));
        }
        out.push(Command::new("G1").with('Z', hole.depth));
        self.dwell(hole, out);

        let retract = if self.retract_mode == Some(RetractMode::G99) { hole.r } else { hole.z };
        out.push(rapid_z(retract));
        self.vars.insert('Z', retract);
    }

    fn drill_peck(&mut self, hole: &Hole, q: f64, out: &mut Vec<Command>) {
        self.approach(hole, out);
        let mut height = hole.z.max(hole.r);

        // Each peck starts a little above the bottom of the previous one.
        let clearance = q / 10.;
        let mut drilled = hole.z;
        let mut peck: u64 = 0;
        while drilled > hole.depth {
            let lift = if peck == 0 { 0. } else { clearance };
            out.push(rapid_z(hole.r - (peck as f64 * q) + lift));
            drilled = (hole.r - (peck + 1) as f64 * q).max(hole.depth);
            out.push(Command::new("G1").with('Z', drilled));
            self.dwell(hole, out);
            out.push(rapid_z(hole.r));
            height = hole.r;
            peck += 1;
        }

        if self.retract_mode == Some(RetractMode::G98) {
            out.push(rapid_z(hole.z));
            height = hole.z;
        }
        self.vars.insert('Z', height);
    }
}

/// Replace all G81, G82 and G83 drilling cycles in `commands` by explicit
/// motion.  Needs the complete, ordered command stream of a program.
pub fn expand_canned_cycles(commands: Vec<Command>) -> Vec<Command> {
    let mut expander = CycleExpander::new();
    let mut out = Vec::with_capacity(commands.len());
    for command in commands {
        expander.expand(command, &mut out);
    }
    out
}
