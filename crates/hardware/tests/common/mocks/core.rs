use phasesim_core::config::Isa;
use phasesim_core::core::{ArchState, CoreType, CoreModel};

/// Core model whose drain and execute behaviour can be rigged.
#[derive(Debug)]
pub struct RiggedCore {
    core_type: CoreType,
    isa: Isa,
    state: ArchState,
    in_flight: u32,
    /// Ignore `drain` requests.
    pub stuck: bool,
    /// Fail every `execute` with this reason.
    pub failure: Option<String>,
}

impl RiggedCore {
    pub fn new(core_type: CoreType, isa: Isa) -> Self {
        Self {
            core_type,
            isa,
            state: ArchState::new(0x8000_0000),
            in_flight: 0,
            stuck: false,
            failure: None,
        }
    }

    /// A core that reports `pending` in-flight operations and never drains.
    pub fn stuck(core_type: CoreType, isa: Isa, pending: u32) -> Self {
        Self {
            in_flight: pending,
            stuck: true,
            ..Self::new(core_type, isa)
        }
    }

    /// A core whose every burst fails with `reason`.
    pub fn failing(core_type: CoreType, isa: Isa, reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new(core_type, isa)
        }
    }
}

impl CoreModel for RiggedCore {
    fn core_type(&self) -> CoreType {
        self.core_type
    }

    fn isa(&self) -> Isa {
        self.isa
    }

    fn state(&self) -> &ArchState {
        &self.state
    }

    fn load_state(&mut self, state: ArchState) {
        self.state = state;
    }

    fn in_flight(&self) -> u32 {
        self.in_flight
    }

    fn drain(&mut self) {
        if !self.stuck {
            self.in_flight = 0;
        }
    }

    fn execute(&mut self, insts: u64) -> Result<u64, String> {
        if let Some(reason) = &self.failure {
            return Err(reason.clone());
        }
        self.state.retire(insts);
        Ok(insts)
    }
}
