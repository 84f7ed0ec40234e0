//! # Scripted Guest Tests
//!
//! Boot, script interpretation, and timing of the built-in guest engine.

use phasesim_core::common::constants::TICKS_PER_SECOND;
use phasesim_core::config::SimulationConfig;
use phasesim_core::sim::{Engine, ExitEvent, ScriptedGuest, Step};
use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, script_workload};

fn drain_steps(guest: &mut ScriptedGuest) -> Vec<Step> {
    let mut board = TestContext::new().board();
    let mut steps = Vec::new();
    loop {
        let step = guest.step(&mut board).expect("built-in cores never fail");
        let done = step.halted.is_some();
        steps.push(step);
        if done {
            return steps;
        }
    }
}

#[test]
fn test_boot_then_halt_without_script() {
    let mut guest = ScriptedGuest::from_script("", 1_000, 10);
    let steps = drain_steps(&mut guest);
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].instructions, 1_000);
    assert!(steps[0].events.is_empty());
    assert_eq!(steps[1].halted, Some(0));
}

#[test]
fn test_boot_ticks_follow_clock_and_cpi() {
    // Default board: KVM cores (CPI 1) at 3GHz, 333 ticks per cycle.
    let mut guest = ScriptedGuest::from_script("", 1_000, 10);
    let steps = drain_steps(&mut guest);
    assert_eq!(steps[0].ticks, 333_000);
}

#[test]
fn test_m5_ops_raise_events_in_order() {
    let script = "m5 workbegin\n./run_bench --iters 3\nm5 workend; m5 checkpoint; m5 switchcpu\nm5 exit";
    let mut guest = ScriptedGuest::from_script(script, 0, 50);
    let events: Vec<ExitEvent> = drain_steps(&mut guest)
        .into_iter()
        .flat_map(|s| s.events)
        .collect();
    assert_eq!(
        events,
        vec![
            ExitEvent::WorkBegin,
            ExitEvent::WorkEnd,
            ExitEvent::Checkpoint,
            ExitEvent::SwitchCpu,
            ExitEvent::Exit,
        ]
    );
}

#[test]
fn test_ordinary_command_costs_fixed_budget() {
    let mut guest = ScriptedGuest::from_script("ls /", 0, 50);
    let steps = drain_steps(&mut guest);
    assert_eq!(steps[0].instructions, 50);
    assert!(steps[0].events.is_empty());
}

#[test]
fn test_sleep_costs_simulated_seconds() {
    let mut guest = ScriptedGuest::from_script("sleep 2", 0, 50);
    let steps = drain_steps(&mut guest);
    assert_eq!(steps[0].ticks, 2 * TICKS_PER_SECOND);
    assert_eq!(steps[0].instructions, 0);
}

#[test]
fn test_unknown_m5_op_is_custom_event() {
    let mut guest = ScriptedGuest::from_script("m5 dumpresetstats", 0, 50);
    let steps = drain_steps(&mut guest);
    assert_eq!(
        steps[0].events,
        vec![ExitEvent::Custom("dumpresetstats".to_string())]
    );
}

#[test]
fn test_fail_code_is_kept() {
    let mut guest = ScriptedGuest::from_script("m5 fail 0 3", 0, 50);
    let steps = drain_steps(&mut guest);
    assert_eq!(steps[0].events, vec![ExitEvent::Fail]);
    assert_eq!(guest.fail_code(), Some(3));
}

#[test]
fn test_guest_reads_workload_command() {
    let config = SimulationConfig {
        boot_instructions: 10,
        command_instructions: 1,
        ..SimulationConfig::default()
    };
    let guest = ScriptedGuest::new(&script_workload("echo 12345 | tee /dev/null\nm5 exit"), &config);
    assert_eq!(guest.remaining(), 3);
}

#[test]
fn test_halt_repeats_after_script_end() {
    let mut board = TestContext::new().board();
    let mut guest = ScriptedGuest::from_script("", 0, 1);
    assert_eq!(guest.step(&mut board).unwrap().halted, Some(0));
    assert_eq!(guest.step(&mut board).unwrap().halted, Some(0));
}
