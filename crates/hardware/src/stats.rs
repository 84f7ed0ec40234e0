//! Simulation statistics collection and reporting.
//!
//! This module tracks what a run did. It provides:
//! 1. **Time:** Simulated ticks, simulated seconds, and host wall-clock time.
//! 2. **Work:** Instructions retired, overall and per core type.
//! 3. **Exit events:** How often each event kind was dispatched.
//! 4. **Region of interest:** Tick bounds set by `workbegin`/`workend`, core
//!    switches, and checkpoint requests.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::common::TICKS_PER_SECOND;
use crate::core::CoreType;
use crate::sim::ExitEvent;

/// Per-core-type share of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreTypeStats {
    /// Ticks simulated while this type was active.
    pub ticks: u64,
    /// Instructions retired while this type was active.
    pub instructions: u64,
}

/// Statistics of one simulation run.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Ticks simulated since the last reset.
    pub ticks: u64,
    /// Instructions retired since the last reset.
    pub instructions: u64,
    /// Breakdown by the core type that was active.
    pub per_core_type: BTreeMap<CoreType, CoreTypeStats>,
    /// Dispatch count per exit event name.
    pub exit_events: BTreeMap<String, u64>,
    /// Completed core switches.
    pub switches: u64,
    /// Checkpoint requests recorded.
    pub checkpoints: u64,
    /// Tick at which the region of interest began.
    pub roi_begin: Option<u64>,
    /// Tick at which the region of interest ended.
    pub roi_end: Option<u64>,
    /// Number of resets.
    pub resets: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: 0,
            instructions: 0,
            per_core_type: BTreeMap::new(),
            exit_events: BTreeMap::new(),
            switches: 0,
            checkpoints: 0,
            roi_begin: None,
            roi_end: None,
            resets: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "cores", "events", "roi"];

impl SimStats {
    /// Accounts one engine step to `core_type`.
    pub fn record_step(&mut self, core_type: CoreType, ticks: u64, instructions: u64) {
        self.ticks = self.ticks.saturating_add(ticks);
        self.instructions = self.instructions.saturating_add(instructions);
        let entry = self.per_core_type.entry(core_type).or_default();
        entry.ticks = entry.ticks.saturating_add(ticks);
        entry.instructions = entry.instructions.saturating_add(instructions);
    }

    /// Counts one dispatch of `event`.
    pub fn record_event(&mut self, event: &ExitEvent) {
        *self.exit_events.entry(event.name().to_string()).or_insert(0) += 1;
    }

    /// Dispatch count of `event`.
    pub fn event_count(&self, event: &ExitEvent) -> u64 {
        self.exit_events.get(event.name()).copied().unwrap_or(0)
    }

    /// Zeroes the work counters and marks `tick` as the start of the region
    /// of interest. Event, switch, and checkpoint counts are kept.
    pub fn reset(&mut self, tick: u64) {
        self.ticks = 0;
        self.instructions = 0;
        self.per_core_type.clear();
        self.roi_begin = Some(tick);
        self.roi_end = None;
        self.resets += 1;
    }

    /// Simulated seconds since the last reset.
    pub fn sim_seconds(&self) -> f64 {
        self.ticks as f64 / TICKS_PER_SECOND as f64
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`].
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();

        if want("summary") {
            let host_ips = if seconds > 0.0 {
                self.instructions as f64 / seconds
            } else {
                0.0
            };
            println!("\n==========================================================");
            println!("SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_ticks                {}", self.ticks);
            println!("sim_seconds              {:.6} s", self.sim_seconds());
            println!("sim_insts                {}", self.instructions);
            println!("host_inst_rate           {host_ips:.0} inst/s");
            println!("----------------------------------------------------------");
        }
        if want("cores") {
            let ticks = self.ticks.max(1) as f64;
            println!("CORE TYPES");
            for (core_type, s) in &self.per_core_type {
                println!(
                    "  {:<8} ticks: {:<14} ({:.2}%) | insts: {}",
                    core_type.to_string(),
                    s.ticks,
                    (s.ticks as f64 / ticks) * 100.0,
                    s.instructions
                );
            }
            println!("  switches               {}", self.switches);
            println!("----------------------------------------------------------");
        }
        if want("events") {
            println!("EXIT EVENTS");
            for (name, count) in &self.exit_events {
                println!("  {name:<22} {count}");
            }
            println!("----------------------------------------------------------");
        }
        if want("roi") {
            let show = |t: Option<u64>| t.map_or_else(|| "-".to_string(), |t| t.to_string());
            println!("REGION OF INTEREST");
            println!("  roi.begin              {}", show(self.roi_begin));
            println!("  roi.end                {}", show(self.roi_end));
            println!("  checkpoints            {}", self.checkpoints);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
