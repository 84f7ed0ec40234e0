//! Engine seam between the run loop and whatever advances simulated time.
//!
//! The run loop owns the clock and the dispatcher; an [`Engine`] owns the guest.
//! Each call to [`Engine::step`] advances the guest by some amount of simulated
//! time and reports what happened during it.

use crate::sim::exit_event::ExitEvent;
use crate::soc::Board;

/// Outcome of one engine step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Simulated ticks consumed.
    pub ticks: u64,
    /// Instructions retired.
    pub instructions: u64,
    /// Exit events raised, in order.
    pub events: Vec<ExitEvent>,
    /// Exit code if the workload finished during this step.
    pub halted: Option<u64>,
}

impl Step {
    /// Plain progress with no events.
    pub const fn advance(ticks: u64, instructions: u64) -> Self {
        Self {
            ticks,
            instructions,
            events: Vec::new(),
            halted: None,
        }
    }

    /// Adds a raised event.
    #[must_use]
    pub fn raise(mut self, event: ExitEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Marks the workload as finished with `exit_code`.
    #[must_use]
    pub fn halt(mut self, exit_code: u64) -> Self {
        self.halted = Some(exit_code);
        self
    }
}

/// Something that advances the guest on a board.
///
/// Implementations report model failures as strings; the run loop attaches the
/// clock value and surfaces them as `RunError::ModelFailure`.
pub trait Engine {
    /// Advances the guest once.
    ///
    /// # Errors
    ///
    /// Returns the model's failure reason, verbatim.
    fn step(&mut self, board: &mut Board) -> Result<Step, String>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn step(&mut self, board: &mut Board) -> Result<Step, String> {
        (**self).step(board)
    }
}
