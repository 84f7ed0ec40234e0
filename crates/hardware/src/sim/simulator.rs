//! Simulator: owns the board, the exit-event dispatcher, and the engine side-by-side.
//!
//! The run loop performs, per iteration:
//! 1. **Tick limit:** Raises `MaxTick` once the configured limit is reached.
//! 2. **Step:** Asks the engine to advance the guest and moves the clock forward.
//! 3. **Dispatch:** Runs the action for each raised exit event, in raise order,
//!    and completes any core switch a handler left pending.
//! 4. **Halt:** Stops when an action terminates, the workload finishes, or the
//!    engine fails.
//!
//! A simulator runs at most once: `Idle -> Running -> Halted`.

use std::fmt;

use tracing::{debug, error, info};

use crate::common::{RunError, SimError};
use crate::config::Config;
use crate::sim::clock::SimulationClock;
use crate::sim::dispatcher::{ExitContext, ExitEventDispatcher};
use crate::sim::engine::Engine;
use crate::sim::exit_event::{ExitEvent, RunDirective};
use crate::sim::guest::ScriptedGuest;
use crate::sim::requires::{HostCapabilities, validate};
use crate::soc::{Board, Workload};
use crate::stats::SimStats;

/// Lifecycle of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built, not yet run.
    Idle,
    /// Inside `run`.
    Running,
    /// Finished, successfully or not.
    Halted,
}

impl RunState {
    const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Halted => "halted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// An exit event action returned `Terminate`.
    Requested {
        /// Event whose action stopped the run.
        event: ExitEvent,
        /// Reason given by the action.
        reason: String,
    },
    /// The workload finished on its own.
    WorkloadHalted {
        /// Workload exit code.
        exit_code: u64,
    },
}

impl Termination {
    /// Human-readable reason.
    pub fn reason(&self) -> String {
        match self {
            Self::Requested { reason, .. } => reason.clone(),
            Self::WorkloadHalted { exit_code } => format!("workload exited with code {exit_code}"),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Clock value when the run stopped.
    pub final_tick: u64,
    /// Why it stopped.
    pub termination: Termination,
    /// Statistics at the end of the run.
    pub stats: SimStats,
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator<E: Engine> {
    board: Board,
    dispatcher: ExitEventDispatcher,
    engine: E,
    clock: SimulationClock,
    stats: SimStats,
    state: RunState,
    max_ticks: Option<u64>,
}

impl<E: Engine> Simulator<E> {
    /// Creates an idle simulator. The dispatcher is moved in, so no handler
    /// can be registered once the simulator exists.
    pub fn new(board: Board, dispatcher: ExitEventDispatcher, engine: E) -> Self {
        Self {
            board,
            dispatcher,
            engine,
            clock: SimulationClock::new(),
            stats: SimStats::default(),
            state: RunState::Idle,
            max_ticks: None,
        }
    }

    /// Validates capabilities, builds the board, attaches the workload, and
    /// wraps everything with `engine`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Setup` if the host lacks a capability (nothing is
    /// built in that case), or `SimError::Config` if the board or workload is
    /// invalid.
    pub fn from_config(
        config: &Config,
        workload: Workload,
        dispatcher: ExitEventDispatcher,
        engine: E,
        host: &HostCapabilities,
    ) -> Result<Self, SimError> {
        validate(&config.requirement(), host)?;
        let mut board = Board::from_config(config)?;
        board.set_workload(workload)?;
        Ok(Self::new(board, dispatcher, engine).with_max_ticks(config.simulation.max_ticks))
    }

    /// Sets the tick limit.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Board being simulated.
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Engine driving the guest.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Simulated clock.
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Statistics so far.
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Lifecycle state.
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Runs until an exit event action terminates, the workload halts, or
    /// the engine fails.
    ///
    /// # Errors
    ///
    /// Returns `RunError::NotIdle` if the simulator has already run,
    /// `ModelFailure` if the engine fails, or any error raised while
    /// dispatching. The simulator is halted afterwards in every case.
    pub fn run(&mut self) -> Result<RunResult, RunError> {
        if self.state != RunState::Idle {
            return Err(RunError::NotIdle(self.state.name()));
        }
        self.state = RunState::Running;
        info!(
            core_type = %self.board.processor().active_core_type(),
            max_ticks = ?self.max_ticks,
            "simulation started"
        );

        let outcome = self.run_loop();
        self.state = RunState::Halted;

        match outcome {
            Ok(termination) => {
                info!(
                    tick = self.clock.now(),
                    reason = %termination.reason(),
                    "simulation stopped"
                );
                Ok(RunResult {
                    final_tick: self.clock.now(),
                    termination,
                    stats: self.stats.clone(),
                })
            }
            Err(e) => {
                error!(tick = self.clock.now(), error = %e, "simulation aborted");
                Err(e)
            }
        }
    }

    fn run_loop(&mut self) -> Result<Termination, RunError> {
        loop {
            if let Some(limit) = self.max_ticks {
                if self.clock.now() >= limit {
                    // One-shot: a handler that continues past the limit runs unbounded.
                    self.max_ticks = None;
                    if let RunDirective::Terminate(reason) = self.dispatch(ExitEvent::MaxTick)? {
                        return Ok(Termination::Requested {
                            event: ExitEvent::MaxTick,
                            reason,
                        });
                    }
                }
            }

            let step = self
                .engine
                .step(&mut self.board)
                .map_err(|reason| RunError::ModelFailure {
                    tick: self.clock.now(),
                    reason,
                })?;
            self.clock.advance(step.ticks);
            let active = self.board.processor().active_core_type();
            self.stats.record_step(active, step.ticks, step.instructions);

            for event in step.events {
                if let RunDirective::Terminate(reason) = self.dispatch(event.clone())? {
                    return Ok(Termination::Requested { event, reason });
                }
            }

            if let Some(exit_code) = step.halted {
                return Ok(Termination::WorkloadHalted { exit_code });
            }
        }
    }

    /// Runs the action for `event`, then settles any switch left pending.
    fn dispatch(&mut self, event: ExitEvent) -> Result<RunDirective, RunError> {
        let tick = self.clock.now();
        debug!(tick, event = %event, "dispatching exit event");
        self.stats.record_event(&event);

        let outcome = {
            let mut ctx = ExitContext::new(&event, tick, &mut self.board, &mut self.stats);
            self.dispatcher.dispatch(&mut ctx)
        };

        let processor = self.board.processor_mut();
        let directive = match outcome {
            Ok(directive) => directive,
            Err(e) => {
                // A failed handler never commits the switch it requested.
                if processor.abort_switch() {
                    debug!(tick, event = %event, "pending switch rolled back");
                }
                return Err(e);
            }
        };
        if processor.is_switching() {
            processor.drain();
            let now = processor.complete_switch()?;
            self.stats.switches += 1;
            debug!(tick, core_type = %now, "pending switch completed");
        }
        Ok(directive)
    }
}

impl Simulator<ScriptedGuest> {
    /// [`Simulator::from_config`] with the built-in scripted guest engine
    /// replaying the workload's post-boot command.
    ///
    /// # Errors
    ///
    /// As for [`Simulator::from_config`].
    pub fn scripted(
        config: &Config,
        workload: Workload,
        dispatcher: ExitEventDispatcher,
        host: &HostCapabilities,
    ) -> Result<Self, SimError> {
        let engine = ScriptedGuest::new(&workload, &config.simulation);
        Self::from_config(config, workload, dispatcher, engine, host)
    }
}
