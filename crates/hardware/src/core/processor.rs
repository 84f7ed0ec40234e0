//! Switchable processor.
//!
//! A processor owns an ordered set of logical cores. Each logical core holds one model
//! per registered core type, and exactly one core type is active across the whole
//! processor at any instant. This module provides:
//! 1. **Construction:** One model set per configured core type, built through a `CoreFactory`.
//! 2. **Switching:** An all-or-nothing swap of the active model set, carrying architectural state.
//! 3. **Execution:** Bursts of instructions on the active set for the engine.
//!
//! The swap is a two-phase transaction. `begin_switch` validates the target and
//! enters the `Switching` state; `complete_switch` checks that every active
//! model has drained and then commits, or rolls back. No step of the commit
//! can fail once it has started, so a partially switched processor is never
//! observable.

use std::fmt;

use tracing::{debug, info};

use crate::common::{ConfigError, SwitchError};
use crate::config::{Isa, ProcessorConfig};
use crate::core::CoreType;
use crate::core::model::{CoreFactory, CoreModel};
use crate::core::state::ArchState;

/// One model instance of a logical core, tagged with its core type.
#[derive(Debug)]
pub struct Core {
    core_type: CoreType,
    isa: Isa,
    active: bool,
    model: Box<dyn CoreModel>,
}

impl Core {
    /// Core type of this model.
    pub const fn core_type(&self) -> CoreType {
        self.core_type
    }

    /// ISA of this model.
    pub const fn isa(&self) -> Isa {
        self.isa
    }

    /// `true` if this model is the one currently executing.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Architectural state held by this model.
    pub fn state(&self) -> &ArchState {
        self.model.state()
    }

    /// The underlying model.
    pub fn model(&self) -> &dyn CoreModel {
        self.model.as_ref()
    }
}

/// All model variants of one logical core.
#[derive(Debug)]
struct LogicalCore {
    variants: Vec<Core>,
}

impl LogicalCore {
    fn position(&self, core_type: CoreType) -> Option<usize> {
        self.variants.iter().position(|c| c.core_type == core_type)
    }

    fn variant(&self, core_type: CoreType) -> Option<&Core> {
        self.variants.iter().find(|c| c.core_type == core_type)
    }

    fn variant_mut(&mut self, core_type: CoreType) -> Option<&mut Core> {
        self.variants.iter_mut().find(|c| c.core_type == core_type)
    }
}

/// Switch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    /// The given model set executes.
    Active(CoreType),
    /// A swap from `from` to `to` has begun but not committed.
    Switching {
        /// Model set active before the swap.
        from: CoreType,
        /// Model set that becomes active on commit.
        to: CoreType,
    },
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(t) => write!(f, "{t} active"),
            Self::Switching { from, to } => write!(f, "switching {from} -> {to}"),
        }
    }
}

/// Processor holding one or more model sets per logical core.
#[derive(Debug)]
pub struct Processor {
    isa: Isa,
    cores: Vec<LogicalCore>,
    starting: CoreType,
    alternate: Option<CoreType>,
    state: SwitchState,
    switch_count: u64,
}

impl Processor {
    /// Builds a processor from configuration, instantiating every model through `factory`.
    ///
    /// The starting core type is active; the switch core type, if any, becomes the
    /// alternate that `switch` swaps to.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if there are no cores, if the two core types are identical,
    /// or if the factory cannot create a model.
    pub fn new(config: &ProcessorConfig, factory: &dyn CoreFactory) -> Result<Self, ConfigError> {
        if config.num_cores == 0 {
            return Err(ConfigError::NonPositive {
                field: "processor.num_cores",
            });
        }
        if config.switch_core_type == Some(config.starting_core_type) {
            return Err(ConfigError::DuplicateCoreType(config.starting_core_type));
        }

        let types = config.core_types();
        let mut cores = Vec::with_capacity(config.num_cores);
        for index in 0..config.num_cores {
            let mut variants = Vec::with_capacity(types.len());
            for &core_type in &types {
                let model = factory
                    .create(core_type, config.isa, index)
                    .map_err(|reason| ConfigError::CoreModel {
                        core_type,
                        index,
                        reason,
                    })?;
                variants.push(Core {
                    core_type,
                    isa: config.isa,
                    active: core_type == config.starting_core_type,
                    model,
                });
            }
            cores.push(LogicalCore { variants });
        }

        debug!(
            isa = %config.isa,
            cores = config.num_cores,
            start = %config.starting_core_type,
            "processor built"
        );

        Ok(Self {
            isa: config.isa,
            cores,
            starting: config.starting_core_type,
            alternate: config.switch_core_type,
            state: SwitchState::Active(config.starting_core_type),
            switch_count: 0,
        })
    }

    /// Adds another model set, one model per logical core in core order.
    ///
    /// Replaces an existing inactive set of the same type. The first extra set
    /// registered on a single-type processor becomes its alternate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the model count, type, or ISA does not match, or if
    /// `core_type` is the active set.
    pub fn register_core_set(
        &mut self,
        core_type: CoreType,
        models: Vec<Box<dyn CoreModel>>,
    ) -> Result<(), ConfigError> {
        if core_type == self.active_core_type() || self.is_switching() {
            return Err(ConfigError::BadGeometry {
                field: "processor.core_set",
                detail: format!("cannot replace the {core_type} set while it is in use"),
            });
        }
        if models.len() != self.cores.len() {
            return Err(ConfigError::BadGeometry {
                field: "processor.core_set",
                detail: format!("{} models for {} cores", models.len(), self.cores.len()),
            });
        }
        for (index, model) in models.iter().enumerate() {
            if model.core_type() != core_type || model.isa() != self.isa {
                return Err(ConfigError::CoreModel {
                    core_type,
                    index,
                    reason: format!("model is {} {}", model.isa(), model.core_type()),
                });
            }
        }

        for (core, model) in self.cores.iter_mut().zip(models) {
            core.variants.retain(|c| c.core_type != core_type);
            core.variants.push(Core {
                core_type,
                isa: self.isa,
                active: false,
                model,
            });
        }
        if self.alternate.is_none() {
            self.alternate = Some(core_type);
        }
        debug!(core_type = %core_type, "core set registered");
        Ok(())
    }

    /// Core type active when simulation started.
    pub const fn initial_core_type(&self) -> CoreType {
        self.starting
    }

    /// Core type currently executing. While a swap is pending this is still the
    /// pre-switch type.
    pub const fn active_core_type(&self) -> CoreType {
        match self.state {
            SwitchState::Active(t) | SwitchState::Switching { from: t, .. } => t,
        }
    }

    /// Core type `switch` will swap to, if any.
    pub const fn alternate_core_type(&self) -> Option<CoreType> {
        self.alternate
    }

    /// Current switch state.
    pub const fn state(&self) -> SwitchState {
        self.state
    }

    /// `true` between `begin_switch` and commit or rollback.
    pub const fn is_switching(&self) -> bool {
        matches!(self.state, SwitchState::Switching { .. })
    }

    /// ISA of every core.
    pub const fn isa(&self) -> Isa {
        self.isa
    }

    /// Number of logical cores.
    pub const fn num_cores(&self) -> usize {
        self.cores.len()
    }

    /// Completed switches since construction.
    pub const fn switch_count(&self) -> u64 {
        self.switch_count
    }

    /// Core types registered on every logical core, in registration order.
    pub fn registered_core_types(&self) -> Vec<CoreType> {
        self.cores.first().map_or_else(Vec::new, |core| {
            core.variants
                .iter()
                .map(|c| c.core_type)
                .filter(|t| self.cores.iter().all(|lc| lc.position(*t).is_some()))
                .collect()
        })
    }

    /// Active model of logical core `index`.
    pub fn core(&self, index: usize) -> Option<&Core> {
        self.cores
            .get(index)
            .and_then(|lc| lc.variant(self.active_core_type()))
    }

    /// Active models of every logical core, in core order.
    pub fn cores(&self) -> impl Iterator<Item = &Core> + '_ {
        let active = self.active_core_type();
        self.cores.iter().filter_map(move |lc| lc.variant(active))
    }

    /// Every model of logical core `index`, active or not.
    pub fn variants(&self, index: usize) -> &[Core] {
        self.cores
            .get(index)
            .map(|lc| lc.variants.as_slice())
            .unwrap_or_default()
    }

    /// Swaps to the alternate model set.
    ///
    /// The previously active set becomes the new alternate, so two consecutive
    /// switches restore the original type.
    ///
    /// # Errors
    ///
    /// `SwitchInProgress` if a swap is pending; `IncompatibleState` if there is no
    /// alternate or the swap cannot be performed for every core. The processor is
    /// unchanged on error.
    pub fn switch(&mut self) -> Result<CoreType, SwitchError> {
        if self.is_switching() {
            return Err(SwitchError::SwitchInProgress);
        }
        let target = self.alternate.ok_or_else(|| {
            SwitchError::IncompatibleState("no alternate core type registered".to_string())
        })?;
        self.switch_to(target)
    }

    /// Swaps to a specific registered model set.
    ///
    /// # Errors
    ///
    /// As for [`Processor::switch`].
    pub fn switch_to(&mut self, target: CoreType) -> Result<CoreType, SwitchError> {
        self.begin_switch(target)?;
        self.complete_switch()
    }

    /// Starts a swap to `target` without committing it.
    ///
    /// # Errors
    ///
    /// `SwitchInProgress` if a swap is already pending; `IncompatibleState` if
    /// `target` is already active or is missing (or has the wrong ISA) on any core.
    pub fn begin_switch(&mut self, target: CoreType) -> Result<(), SwitchError> {
        let from = match self.state {
            SwitchState::Switching { .. } => return Err(SwitchError::SwitchInProgress),
            SwitchState::Active(t) => t,
        };
        if from == target {
            return Err(SwitchError::IncompatibleState(format!(
                "{target} cores are already active"
            )));
        }
        for (index, core) in self.cores.iter().enumerate() {
            match core.variant(target) {
                None => {
                    return Err(SwitchError::IncompatibleState(format!(
                        "core {index} has no {target} model registered"
                    )));
                }
                Some(c) if c.model.isa() != self.isa => {
                    return Err(SwitchError::IncompatibleState(format!(
                        "core {index} {target} model executes {}, processor is {}",
                        c.model.isa(),
                        self.isa
                    )));
                }
                Some(_) => {}
            }
        }
        self.state = SwitchState::Switching { from, to: target };
        debug!(from = %from, to = %target, "switch started");
        Ok(())
    }

    /// Commits a pending swap.
    ///
    /// Every active model must be drained. On success the architectural state of
    /// each logical core has moved to the new model and the new type is returned.
    ///
    /// # Errors
    ///
    /// `IncompatibleState` if no swap is pending or a core still has memory
    /// operations in flight; a pending swap is rolled back in the latter case.
    pub fn complete_switch(&mut self) -> Result<CoreType, SwitchError> {
        let SwitchState::Switching { from, to } = self.state else {
            return Err(SwitchError::IncompatibleState(
                "no switch is pending".to_string(),
            ));
        };

        let mut plan = Vec::with_capacity(self.cores.len());
        for (index, core) in self.cores.iter().enumerate() {
            let (Some(old), Some(new)) = (core.position(from), core.position(to)) else {
                self.state = SwitchState::Active(from);
                return Err(SwitchError::IncompatibleState(format!(
                    "core {index} lost its {from} or {to} model"
                )));
            };
            let pending = core.variants[old].model.in_flight();
            if pending > 0 {
                self.state = SwitchState::Active(from);
                return Err(SwitchError::IncompatibleState(format!(
                    "core {index} has {pending} memory operations in flight"
                )));
            }
            plan.push((old, new));
        }

        for (core, (old, new)) in self.cores.iter_mut().zip(plan) {
            let state = core.variants[old].model.take_state();
            core.variants[old].active = false;
            core.variants[new].model.load_state(state);
            core.variants[new].active = true;
        }

        self.alternate = Some(from);
        self.state = SwitchState::Active(to);
        self.switch_count += 1;
        info!(from = %from, to = %to, count = self.switch_count, "switched core models");
        Ok(to)
    }

    /// Rolls back a pending swap. Returns `true` if one was pending.
    pub fn abort_switch(&mut self) -> bool {
        match self.state {
            SwitchState::Switching { from, to } => {
                self.state = SwitchState::Active(from);
                debug!(from = %from, to = %to, "switch aborted");
                true
            }
            SwitchState::Active(_) => false,
        }
    }

    /// Completes every in-flight memory operation of the active set.
    pub fn drain(&mut self) {
        let active = self.active_core_type();
        for core in &mut self.cores {
            if let Some(c) = core.variant_mut(active) {
                c.model.drain();
            }
        }
    }

    /// `true` if no active model has memory operations in flight.
    pub fn is_drained(&self) -> bool {
        self.cores().all(|c| c.model.is_drained())
    }

    /// Runs `insts` instructions on every active core and returns the slowest
    /// core's cycle count.
    ///
    /// # Errors
    ///
    /// Fails if a swap is pending or a model reports a failure; the model's
    /// reason is returned verbatim.
    pub fn execute(&mut self, insts: u64) -> Result<u64, String> {
        if let SwitchState::Switching { from, to } = self.state {
            return Err(format!("processor is switching from {from} to {to}"));
        }
        let active = self.active_core_type();
        let mut cycles = 0;
        for core in &mut self.cores {
            if let Some(c) = core.variant_mut(active) {
                cycles = cycles.max(c.model.execute(insts)?);
            }
        }
        Ok(cycles)
    }
}
