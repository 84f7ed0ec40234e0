//! Scripted guest engine.
//!
//! A lightweight stand-in for a booted guest: it boots for a fixed number of
//! instructions, then walks the workload's post-boot shell command one statement
//! at a time. The interpreter understands:
//! 1. **`m5` operations:** `exit`, `fail <code>`, `workbegin`, `workend`,
//!    `checkpoint`, and `switchcpu` raise the matching exit event. Any other
//!    operation raises a custom event of that name.
//! 2. **`sleep <seconds>`:** Idles for the given simulated time.
//! 3. **Anything else:** Runs a fixed instruction budget on the active cores.
//!
//! Statements are separated by newlines or `;`, a trailing `\` continues a line,
//! and `#` starts a comment. Reaching the end of the script halts the workload
//! with exit code 0.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::TICKS_PER_SECOND;
use crate::config::SimulationConfig;
use crate::sim::engine::{Engine, Step};
use crate::sim::exit_event::ExitEvent;
use crate::soc::{Board, Workload};

/// One interpreted guest action.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GuestOp {
    /// Execute instructions on the active cores.
    Run(u64),
    /// Idle for a number of ticks.
    Sleep(u64),
    /// Execute a single pseudo-instruction that raises an event.
    Raise(ExitEvent, Option<i64>),
}

/// Engine that replays a workload's post-boot script.
#[derive(Debug, Clone)]
pub struct ScriptedGuest {
    ops: VecDeque<GuestOp>,
    fail_code: Option<i64>,
}

impl ScriptedGuest {
    /// Guest for `workload`, using its post-boot command if it has one.
    pub fn new(workload: &Workload, config: &SimulationConfig) -> Self {
        Self::from_script(
            workload.command().unwrap_or_default(),
            config.boot_instructions,
            config.command_instructions,
        )
    }

    /// Guest that boots for `boot_instructions` and then runs `script`.
    pub fn from_script(script: &str, boot_instructions: u64, command_instructions: u64) -> Self {
        let mut ops = VecDeque::new();
        if boot_instructions > 0 {
            ops.push_back(GuestOp::Run(boot_instructions));
        }
        for statement in statements(script) {
            ops.push_back(parse_statement(&statement, command_instructions));
        }
        debug!(ops = ops.len(), "guest script parsed");
        Self { ops, fail_code: None }
    }

    /// Actions not yet executed.
    pub fn remaining(&self) -> usize {
        self.ops.len()
    }

    /// Code passed to the most recent `m5 fail`.
    pub const fn fail_code(&self) -> Option<i64> {
        self.fail_code
    }
}

impl Engine for ScriptedGuest {
    fn step(&mut self, board: &mut Board) -> Result<Step, String> {
        let Some(op) = self.ops.pop_front() else {
            trace!("guest script finished");
            return Ok(Step::default().halt(0));
        };
        match op {
            GuestOp::Run(insts) => {
                let cycles = board.processor_mut().execute(insts)?;
                Ok(Step::advance(board.cycles_to_ticks(cycles), insts))
            }
            GuestOp::Sleep(ticks) => Ok(Step::advance(ticks, 0)),
            GuestOp::Raise(event, code) => {
                let cycles = board.processor_mut().execute(1)?;
                if event == ExitEvent::Fail {
                    self.fail_code = code;
                }
                trace!(event = %event, "guest raised exit event");
                Ok(Step::advance(board.cycles_to_ticks(cycles), 1).raise(event))
            }
        }
    }
}

/// Splits a script into trimmed, non-empty statements.
fn statements(script: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();
    for line in script.lines() {
        let line = strip_comment(line).trim_end();
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            pending.push(' ');
            continue;
        }
        pending.push_str(line);
        out.extend(
            pending
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
        pending.clear();
    }
    out.extend(
        pending
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    );
    out
}

/// Drops a `#` comment that starts a line or follows whitespace.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}

fn parse_statement(statement: &str, command_instructions: u64) -> GuestOp {
    let mut words = statement.split_whitespace();
    match words.next() {
        Some("m5") => match words.next() {
            Some(op) => {
                let event = ExitEvent::from_name(op);
                let code = if event == ExitEvent::Fail {
                    words.last().and_then(|w| w.parse().ok())
                } else {
                    None
                };
                GuestOp::Raise(event, code)
            }
            None => GuestOp::Run(command_instructions),
        },
        Some("sleep") => match words.next().and_then(|w| w.parse::<f64>().ok()) {
            Some(secs) if secs >= 0.0 => GuestOp::Sleep((secs * TICKS_PER_SECOND as f64) as u64),
            _ => GuestOp::Run(command_instructions),
        },
        _ => GuestOp::Run(command_instructions),
    }
}
