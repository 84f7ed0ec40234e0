//! Exit events and run directives.
//!
//! An exit event is a named checkpoint raised by the guest through the simulator's
//! pseudo-instruction interface. Handlers answer each event with a [`RunDirective`].

use std::fmt;

use crate::common::RunError;

/// Kind of signal raised by the guest (or by the run loop, for `MaxTick`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExitEvent {
    /// Guest asked the simulation to stop (`m5 exit`).
    Exit,
    /// Guest reported a failure (`m5 fail`).
    Fail,
    /// Guest asked for a checkpoint (`m5 checkpoint`).
    Checkpoint,
    /// Guest asked for a core switch (`m5 switchcpu`).
    SwitchCpu,
    /// Start of a region of interest (`m5 workbegin`).
    WorkBegin,
    /// End of a region of interest (`m5 workend`).
    WorkEnd,
    /// The configured tick limit was reached.
    MaxTick,
    /// Any other named signal. Has no default action.
    Custom(String),
}

impl ExitEvent {
    /// Every kind with a built-in default action.
    pub const KNOWN: [Self; 7] = [
        Self::Exit,
        Self::Fail,
        Self::Checkpoint,
        Self::SwitchCpu,
        Self::WorkBegin,
        Self::WorkEnd,
        Self::MaxTick,
    ];

    /// Canonical name.
    pub fn name(&self) -> &str {
        match self {
            Self::Exit => "exit",
            Self::Fail => "fail",
            Self::Checkpoint => "checkpoint",
            Self::SwitchCpu => "switchcpu",
            Self::WorkBegin => "workbegin",
            Self::WorkEnd => "workend",
            Self::MaxTick => "max_tick",
            Self::Custom(name) => name,
        }
    }

    /// Kind for a canonical name; unknown names become `Custom`.
    pub fn from_name(name: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|e| e.name() == name)
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }
}

impl fmt::Display for ExitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the run loop does after an exit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDirective {
    /// Keep simulating.
    Continue,
    /// Stop the run with the given reason.
    Terminate(String),
}

impl RunDirective {
    /// Termination with `reason`.
    pub fn terminate(reason: impl Into<String>) -> Self {
        Self::Terminate(reason.into())
    }

    /// `true` for `Terminate`.
    pub const fn is_terminate(&self) -> bool {
        matches!(self, Self::Terminate(_))
    }
}

/// Conversion of a handler's return value into a directive.
///
/// A handler that does not ask for termination continues: `()` maps to
/// `Continue`, `true` terminates, and `Result` errors become `RunError`s.
pub trait IntoDirective {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Propagates a handler failure.
    fn into_directive(self) -> Result<RunDirective, RunError>;
}

impl IntoDirective for RunDirective {
    fn into_directive(self) -> Result<RunDirective, RunError> {
        Ok(self)
    }
}

impl IntoDirective for () {
    fn into_directive(self) -> Result<RunDirective, RunError> {
        Ok(RunDirective::Continue)
    }
}

impl IntoDirective for bool {
    fn into_directive(self) -> Result<RunDirective, RunError> {
        Ok(if self {
            RunDirective::terminate("handler requested stop")
        } else {
            RunDirective::Continue
        })
    }
}

impl<T, E> IntoDirective for Result<T, E>
where
    T: IntoDirective,
    E: Into<RunError>,
{
    fn into_directive(self) -> Result<RunDirective, RunError> {
        self.map_err(Into::into)?.into_directive()
    }
}
