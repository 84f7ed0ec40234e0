//! # Run Loop Tests
//!
//! Lifecycle, termination paths, dispatch order, tick limits, and model failures.

use std::cell::RefCell;
use std::rc::Rc;

use mockall::Sequence;
use phasesim_core::common::RunError;
use phasesim_core::common::constants::{REASON_GUEST_STOP, REASON_MAX_TICK};
use phasesim_core::core::{CoreType, SwitchState};
use phasesim_core::sim::{
    Engine, ExitContext, ExitEvent, ExitEventDispatcher, RunDirective, RunState, Simulator, Step,
    Termination,
};
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;
use crate::common::mocks::engine::{MockGuestEngine, StepScript};

fn simulator<E: Engine>(engine: E, dispatcher: ExitEventDispatcher) -> Simulator<E> {
    Simulator::new(TestContext::new().board(), dispatcher, engine)
}

#[test]
fn test_new_simulator_is_idle() {
    let sim = simulator(StepScript::new(), ExitEventDispatcher::new());
    assert_eq!(sim.state(), RunState::Idle);
    assert_eq!(sim.clock().now(), 0);
}

#[test]
fn test_exit_event_terminates_with_default_reason() {
    let engine = StepScript::new().then(100, &[]).then(50, &[ExitEvent::Exit]);
    let mut sim = simulator(engine, ExitEventDispatcher::new());

    let result = sim.run().unwrap();

    assert_eq!(result.final_tick, 150);
    assert_eq!(
        result.termination,
        Termination::Requested {
            event: ExitEvent::Exit,
            reason: REASON_GUEST_STOP.to_string(),
        }
    );
    assert_eq!(sim.state(), RunState::Halted);
}

#[test]
fn test_no_events_ends_on_workload_halt() {
    let engine = StepScript::new().then(10, &[]).then(10, &[]).then_halt(5, 3);
    let mut sim = simulator(engine, ExitEventDispatcher::new());

    let result = sim.run().unwrap();

    assert_eq!(result.termination, Termination::WorkloadHalted { exit_code: 3 });
    assert_eq!(result.final_tick, 25);
    assert!(result.stats.exit_events.is_empty());
}

#[test]
fn test_second_run_is_rejected() {
    let mut sim = simulator(StepScript::new(), ExitEventDispatcher::new());
    let _ = sim.run().unwrap();
    assert!(matches!(sim.run(), Err(RunError::NotIdle("halted"))));
}

#[test]
fn test_model_failure_reason_is_verbatim() {
    let engine = StepScript::new().then(40, &[]).then_fail("O3 LSQ invariant violated");
    let mut sim = simulator(engine, ExitEventDispatcher::new());

    let err = sim.run().unwrap_err();

    match err {
        RunError::ModelFailure { tick, reason } => {
            assert_eq!(tick, 40);
            assert_eq!(reason, "O3 LSQ invariant violated");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sim.state(), RunState::Halted);
}

#[test]
fn test_model_failure_is_not_retried() {
    let mut engine = MockGuestEngine::new();
    let _ = engine
        .expect_step()
        .times(1)
        .returning(|_| Err("disk image corrupt".to_string()));
    let mut sim = simulator(engine, ExitEventDispatcher::new());

    assert!(matches!(sim.run(), Err(RunError::ModelFailure { .. })));
}

#[test]
fn test_events_of_one_step_dispatch_in_raise_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut dispatcher = ExitEventDispatcher::new();
    for event in [ExitEvent::WorkBegin, ExitEvent::Checkpoint, ExitEvent::WorkEnd] {
        let order = Rc::clone(&order);
        let name = event.clone();
        dispatcher.register(event, move |_ctx: &mut ExitContext<'_>| {
            order.borrow_mut().push(name.clone());
        });
    }
    let engine = StepScript::new().then(
        10,
        &[ExitEvent::Checkpoint, ExitEvent::WorkBegin, ExitEvent::WorkEnd],
    );
    let mut sim = simulator(engine, dispatcher);

    let _ = sim.run().unwrap();

    assert_eq!(
        *order.borrow(),
        vec![ExitEvent::Checkpoint, ExitEvent::WorkBegin, ExitEvent::WorkEnd]
    );
}

#[test]
fn test_terminate_skips_remaining_events_of_step() {
    let engine = StepScript::new().then(
        10,
        &[ExitEvent::Exit, ExitEvent::Custom("never_dispatched".to_string())],
    );
    let mut sim = simulator(engine, ExitEventDispatcher::new());

    let result = sim.run().unwrap();

    assert!(matches!(result.termination, Termination::Requested { event: ExitEvent::Exit, .. }));
    assert_eq!(result.stats.event_count(&ExitEvent::Custom("never_dispatched".to_string())), 0);
}

#[test]
fn test_unhandled_custom_event_aborts_run() {
    let engine = StepScript::new().then(10, &[ExitEvent::Custom("gpu_done".to_string())]);
    let mut sim = simulator(engine, ExitEventDispatcher::new());
    assert!(matches!(
        sim.run(),
        Err(RunError::UnhandledExitEvent(ref name)) if name == "gpu_done"
    ));
    assert_eq!(sim.state(), RunState::Halted);
}

#[test]
fn test_engine_stops_being_called_after_terminate() {
    let mut engine = MockGuestEngine::new();
    let mut seq = Sequence::new();
    let _ = engine
        .expect_step()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Step::advance(7, 7)));
    let _ = engine
        .expect_step()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Step::advance(3, 3).raise(ExitEvent::Fail)));
    let mut sim = simulator(engine, ExitEventDispatcher::new());

    let result = sim.run().unwrap();

    assert_eq!(result.final_tick, 10);
    assert_eq!(result.stats.instructions, 10);
}

#[test]
fn test_max_tick_raises_event() {
    let engine = StepScript::new().then(600, &[]).then(600, &[]).then(600, &[]);
    let mut sim = simulator(engine, ExitEventDispatcher::new()).with_max_ticks(Some(1_000));

    let result = sim.run().unwrap();

    assert_eq!(result.final_tick, 1_200);
    assert_eq!(
        result.termination,
        Termination::Requested {
            event: ExitEvent::MaxTick,
            reason: REASON_MAX_TICK.to_string(),
        }
    );
}

#[test]
fn test_max_tick_handler_may_continue() {
    let mut dispatcher = ExitEventDispatcher::new();
    dispatcher.register(ExitEvent::MaxTick, |_ctx: &mut ExitContext<'_>| RunDirective::Continue);
    let engine = StepScript::new().then(600, &[]).then(600, &[]).then_halt(1, 0);
    let mut sim = simulator(engine, dispatcher).with_max_ticks(Some(500));

    let result = sim.run().unwrap();

    assert_eq!(result.termination, Termination::WorkloadHalted { exit_code: 0 });
    assert_eq!(result.stats.event_count(&ExitEvent::MaxTick), 1);
}

#[test]
fn test_pause_then_switch_then_continue() {
    let mut dispatcher = ExitEventDispatcher::new();
    dispatcher.register_once(ExitEvent::Exit, |ctx: &mut ExitContext<'_>| {
        ctx.switch_cores().map(|_| RunDirective::Continue)
    });
    let engine = StepScript::new()
        .then(100, &[ExitEvent::Exit])
        .then(100, &[])
        .then(100, &[ExitEvent::Exit]);
    let mut sim = simulator(engine, dispatcher);

    let result = sim.run().unwrap();

    assert_eq!(result.final_tick, 300);
    assert_eq!(result.termination.reason(), REASON_GUEST_STOP);
    assert_eq!(sim.board().processor().active_core_type(), CoreType::Timing);
    assert_eq!(result.stats.switches, 1);
    let timing = result.stats.per_core_type.get(&CoreType::Timing).copied().unwrap_or_default();
    assert_eq!(timing.ticks, 200);
}

#[test]
fn test_pending_switch_completed_before_next_step() {
    let mut dispatcher = ExitEventDispatcher::new();
    dispatcher.register(ExitEvent::SwitchCpu, |ctx: &mut ExitContext<'_>| ctx.request_switch());
    let mut engine = MockGuestEngine::new();
    let mut seq = Sequence::new();
    let _ = engine
        .expect_step()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Step::advance(1, 1).raise(ExitEvent::SwitchCpu)));
    let _ = engine
        .expect_step()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|board| {
            assert!(!board.processor().is_switching());
            assert_eq!(board.processor().active_core_type(), CoreType::Timing);
            Ok(Step::advance(1, 1).raise(ExitEvent::Exit))
        });
    let mut sim = simulator(engine, dispatcher);

    let result = sim.run().unwrap();

    assert_eq!(result.stats.switches, 1);
    assert_eq!(sim.board().processor().switch_count(), 1);
}

#[test]
fn test_handler_error_aborts_run() {
    let mut dispatcher = ExitEventDispatcher::new();
    dispatcher.register(ExitEvent::Checkpoint, |_ctx: &mut ExitContext<'_>| {
        Err::<(), _>("no space left for checkpoint".to_string())
    });
    let engine = StepScript::new().then(5, &[ExitEvent::Checkpoint]);
    let mut sim = simulator(engine, dispatcher);

    assert!(matches!(sim.run(), Err(RunError::Handler(_))));
    assert_eq!(sim.board().processor().state(), SwitchState::Active(CoreType::Kvm));
}

#[test]
fn test_failed_handler_rolls_back_requested_switch() {
    let mut dispatcher = ExitEventDispatcher::new();
    dispatcher.register(ExitEvent::SwitchCpu, |ctx: &mut ExitContext<'_>| {
        ctx.request_switch()?;
        Err::<RunDirective, _>(RunError::Handler("timing model unavailable".to_string()))
    });
    let engine = StepScript::new().then(5, &[ExitEvent::SwitchCpu]);
    let mut sim = simulator(engine, dispatcher);

    let err = sim.run().unwrap_err();

    assert!(matches!(err, RunError::Handler(ref reason) if reason == "timing model unavailable"));
    assert_eq!(sim.state(), RunState::Halted);
    let processor = sim.board().processor();
    assert!(!processor.is_switching());
    assert_eq!(processor.state(), SwitchState::Active(CoreType::Kvm));
    assert_eq!(processor.switch_count(), 0);
    assert_eq!(sim.stats().switches, 0);
}

#[test]
fn test_failed_custom_handler_leaves_no_pending_switch() {
    let mut dispatcher = ExitEventDispatcher::new();
    dispatcher.register(ExitEvent::Custom("swap_then_fail".to_string()), |ctx: &mut ExitContext<'_>| {
        ctx.request_switch()?;
        Err::<(), RunError>("handler gave up".into())
    });
    let engine = StepScript::new().then(5, &[ExitEvent::Custom("swap_then_fail".to_string())]);
    let mut sim = simulator(engine, dispatcher);

    assert!(matches!(sim.run(), Err(RunError::Handler(_))));
    let processor = sim.board().processor();
    assert!(!processor.is_switching());
    assert_eq!(processor.active_core_type(), CoreType::Kvm);
    assert_eq!(processor.alternate_core_type(), Some(CoreType::Timing));
}
