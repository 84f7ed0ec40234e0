//! Exit-event dispatch.
//!
//! The dispatcher maps each exit event kind to the action the run loop takes when
//! the guest raises it. It provides:
//! 1. **Defaults:** A built-in action for every known kind (stop on `exit`,
//!    `fail`, and `max_tick`; switch cores on `switchcpu`; statistics upkeep on
//!    `workbegin`/`workend`; bookkeeping on `checkpoint`).
//! 2. **Overrides:** At most one caller handler per kind, replacing the default.
//! 3. **One-shot and sequenced handlers:** Handlers that fire for the first N
//!    occurrences of a kind and then fall back to the default.
//!
//! Custom kinds have no default. Raising one without a handler is an error.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use tracing::{debug, info};

use crate::common::constants::{REASON_GUEST_FAIL, REASON_GUEST_STOP, REASON_MAX_TICK};
use crate::common::{RunError, SwitchError};
use crate::core::{CoreType, Processor};
use crate::sim::exit_event::{ExitEvent, IntoDirective, RunDirective};
use crate::soc::Board;
use crate::stats::SimStats;

/// State a handler may inspect or mutate while an event is dispatched.
#[derive(Debug)]
pub struct ExitContext<'a> {
    event: &'a ExitEvent,
    tick: u64,
    /// The board being simulated.
    pub board: &'a mut Board,
    /// Statistics of the current run.
    pub stats: &'a mut SimStats,
}

impl<'a> ExitContext<'a> {
    /// Context for one dispatch of `event` at `tick`.
    pub fn new(event: &'a ExitEvent, tick: u64, board: &'a mut Board, stats: &'a mut SimStats) -> Self {
        Self {
            event,
            tick,
            board,
            stats,
        }
    }

    /// The event being dispatched.
    pub const fn event(&self) -> &'a ExitEvent {
        self.event
    }

    /// Simulated time of the event.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The board's processor.
    pub fn processor(&mut self) -> &mut Processor {
        self.board.processor_mut()
    }

    /// Drains every core, then swaps to the alternate core type immediately.
    ///
    /// # Errors
    ///
    /// As for [`Processor::switch`].
    pub fn switch_cores(&mut self) -> Result<CoreType, SwitchError> {
        let processor = self.board.processor_mut();
        processor.drain();
        let now = processor.switch()?;
        self.stats.switches += 1;
        Ok(now)
    }

    /// Starts a switch to the alternate core type without completing it.
    ///
    /// The run loop drains the processor and completes the switch before the
    /// next event is dispatched.
    ///
    /// # Errors
    ///
    /// As for [`Processor::begin_switch`], or `IncompatibleState` when the
    /// processor has no alternate type.
    pub fn request_switch(&mut self) -> Result<(), SwitchError> {
        let processor = self.board.processor_mut();
        let target = processor
            .alternate_core_type()
            .ok_or_else(|| SwitchError::IncompatibleState("processor has a single core type".to_string()))?;
        processor.begin_switch(target)
    }
}

type Handler = Box<dyn FnMut(&mut ExitContext<'_>) -> Result<RunDirective, RunError>>;

/// Per-kind registry of exit event handlers.
#[derive(Default)]
pub struct ExitEventDispatcher {
    handlers: BTreeMap<ExitEvent, Handler>,
}

impl fmt::Debug for ExitEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitEventDispatcher")
            .field("overridden", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExitEventDispatcher {
    /// Dispatcher with only the default actions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the action for `event`. A later registration for the same kind
    /// replaces an earlier one.
    pub fn register<F, R>(&mut self, event: ExitEvent, mut handler: F)
    where
        F: FnMut(&mut ExitContext<'_>) -> R + 'static,
        R: IntoDirective,
    {
        debug!(event = %event, "exit handler registered");
        let boxed: Handler = Box::new(move |ctx: &mut ExitContext<'_>| handler(ctx).into_directive());
        let _ = self.handlers.insert(event, boxed);
    }

    /// Builder form of [`ExitEventDispatcher::register`].
    #[must_use]
    pub fn on<F, R>(mut self, event: ExitEvent, handler: F) -> Self
    where
        F: FnMut(&mut ExitContext<'_>) -> R + 'static,
        R: IntoDirective,
    {
        self.register(event, handler);
        self
    }

    /// Runs `handler` on the first occurrence of `event` only; later
    /// occurrences get the default action.
    pub fn register_once<F, R>(&mut self, event: ExitEvent, handler: F)
    where
        F: FnOnce(&mut ExitContext<'_>) -> R + 'static,
        R: IntoDirective,
    {
        let mut pending = Some(handler);
        self.register(event, move |ctx: &mut ExitContext<'_>| match pending.take() {
            Some(handler) => handler(ctx).into_directive(),
            None => default_action(ctx),
        });
    }

    /// Runs `handlers` in order, one per occurrence of `event`; once they are
    /// used up, later occurrences get the default action.
    pub fn register_sequence<I, F, R>(&mut self, event: ExitEvent, handlers: I)
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(&mut ExitContext<'_>) -> R + 'static,
        R: IntoDirective,
    {
        let mut queue: VecDeque<F> = handlers.into_iter().collect();
        self.register(event, move |ctx: &mut ExitContext<'_>| match queue.pop_front() {
            Some(handler) => handler(ctx).into_directive(),
            None => default_action(ctx),
        });
    }

    /// `true` if a caller handler replaces the default for `event`.
    pub fn is_overridden(&self, event: &ExitEvent) -> bool {
        self.handlers.contains_key(event)
    }

    /// Selects and runs the action for `ctx.event()`.
    ///
    /// # Errors
    ///
    /// Returns `UnhandledExitEvent` for a custom kind with no handler, or the
    /// handler's own failure.
    pub fn dispatch(&mut self, ctx: &mut ExitContext<'_>) -> Result<RunDirective, RunError> {
        match self.handlers.get_mut(ctx.event()) {
            Some(handler) => handler(ctx),
            None => default_action(ctx),
        }
    }
}

/// Built-in action for the kind of `ctx.event()`.
///
/// # Errors
///
/// Returns `UnhandledExitEvent` for custom kinds, or a switch failure for
/// `SwitchCpu`.
pub fn default_action(ctx: &mut ExitContext<'_>) -> Result<RunDirective, RunError> {
    let tick = ctx.tick();
    let event = ctx.event();
    match event {
        ExitEvent::Exit => Ok(RunDirective::terminate(REASON_GUEST_STOP)),
        ExitEvent::Fail => Ok(RunDirective::terminate(REASON_GUEST_FAIL)),
        ExitEvent::MaxTick => Ok(RunDirective::terminate(REASON_MAX_TICK)),
        ExitEvent::SwitchCpu => {
            let _ = ctx.switch_cores()?;
            Ok(RunDirective::Continue)
        }
        ExitEvent::WorkBegin => {
            ctx.stats.reset(tick);
            info!(tick, "region of interest begins, stats reset");
            Ok(RunDirective::Continue)
        }
        ExitEvent::WorkEnd => {
            ctx.stats.roi_end = Some(tick);
            info!(
                tick,
                ticks = ctx.stats.ticks,
                insts = ctx.stats.instructions,
                "region of interest ends, stats dumped"
            );
            Ok(RunDirective::Continue)
        }
        ExitEvent::Checkpoint => {
            ctx.stats.checkpoints += 1;
            info!(tick, "checkpoint requested");
            Ok(RunDirective::Continue)
        }
        ExitEvent::Custom(name) => Err(RunError::UnhandledExitEvent(name.clone())),
    }
}
