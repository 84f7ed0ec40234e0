//! Capability validation.
//!
//! Checks that the instruction-set architecture, coherence protocol, and host
//! acceleration a configuration needs are all available, before any simulation
//! object is built. Validation is a pure function of an explicit requirement and
//! an explicit description of the host; nothing here keeps global state.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::common::SetupError;
use crate::config::{CoherenceProtocol, Config, Isa};

/// Path of the KVM device node probed by [`HostCapabilities::detect`].
pub const KVM_DEVICE: &str = "/dev/kvm";

/// Capabilities a configuration needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CapabilityRequirement {
    /// Required ISA.
    pub isa: Isa,
    /// Required coherence protocol, if the cache hierarchy uses one.
    #[serde(default)]
    pub coherence_protocol: Option<CoherenceProtocol>,
    /// Whether host-accelerated (KVM) execution is needed.
    #[serde(default)]
    pub kvm_required: bool,
}

impl CapabilityRequirement {
    /// Requirement for `isa` alone.
    pub const fn new(isa: Isa) -> Self {
        Self {
            isa,
            coherence_protocol: None,
            kvm_required: false,
        }
    }

    /// Adds a coherence protocol.
    #[must_use]
    pub const fn with_protocol(mut self, protocol: CoherenceProtocol) -> Self {
        self.coherence_protocol = Some(protocol);
        self
    }

    /// Adds the KVM requirement.
    #[must_use]
    pub const fn with_kvm(mut self) -> Self {
        self.kvm_required = true;
        self
    }

    /// Derives the requirement of a full configuration: the processor ISA, the
    /// protocol of the cache hierarchy kind, and KVM if any core type needs it.
    pub fn for_config(config: &Config) -> Self {
        Self {
            isa: config.processor.isa,
            coherence_protocol: config.cache_hierarchy.kind.protocol(),
            kvm_required: config
                .processor
                .core_types()
                .iter()
                .any(|t| t.requires_kvm()),
        }
    }
}

/// What this build and host can provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCapabilities {
    protocols: BTreeMap<Isa, Vec<CoherenceProtocol>>,
    kvm_available: bool,
    host_arch: String,
}

impl HostCapabilities {
    /// A host supporting nothing, running on `host_arch`.
    pub fn new(host_arch: impl Into<String>) -> Self {
        Self {
            protocols: BTreeMap::new(),
            kvm_available: false,
            host_arch: host_arch.into(),
        }
    }

    /// Adds an ISA together with the protocols built for it.
    #[must_use]
    pub fn with_isa(mut self, isa: Isa, protocols: &[CoherenceProtocol]) -> Self {
        let _ = self.protocols.insert(isa, protocols.to_vec());
        self
    }

    /// Sets whether the KVM device is usable.
    #[must_use]
    pub fn with_kvm(mut self, available: bool) -> Self {
        self.kvm_available = available;
        self
    }

    /// ISAs and protocols compiled into this crate, without probing the host.
    pub fn builtin() -> Self {
        use CoherenceProtocol::{Chi, MesiThreeLevel, MesiTwoLevel, MiExample, MoesiCmpDirectory, MoesiHammer};
        Self::new(std::env::consts::ARCH)
            .with_isa(
                Isa::X86,
                &[MesiTwoLevel, MesiThreeLevel, MoesiHammer, MoesiCmpDirectory, MiExample],
            )
            .with_isa(Isa::Arm, &[MesiTwoLevel, MesiThreeLevel, Chi, MiExample])
            .with_isa(Isa::Riscv, &[MesiTwoLevel, MiExample, Chi])
    }

    /// [`HostCapabilities::builtin`] plus a probe of the KVM device.
    pub fn detect() -> Self {
        let kvm = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(KVM_DEVICE)
            .is_ok();
        debug!(kvm, arch = std::env::consts::ARCH, "host capabilities probed");
        Self::builtin().with_kvm(kvm)
    }

    /// `true` if `isa` is compiled in.
    pub fn supports_isa(&self, isa: Isa) -> bool {
        self.protocols.contains_key(&isa)
    }

    /// `true` if `protocol` is available under `isa`.
    pub fn supports_protocol(&self, isa: Isa, protocol: CoherenceProtocol) -> bool {
        self.protocols
            .get(&isa)
            .is_some_and(|list| list.contains(&protocol))
    }

    /// `true` if the KVM device is usable.
    pub const fn kvm_available(&self) -> bool {
        self.kvm_available
    }

    /// Host architecture name.
    pub fn host_arch(&self) -> &str {
        &self.host_arch
    }
}

/// Checks `requirement` against `host`.
///
/// Checks run in order (ISA, protocol, acceleration) and the first missing
/// capability is reported.
///
/// # Errors
///
/// Returns the `SetupError` naming the first missing capability.
pub fn validate(requirement: &CapabilityRequirement, host: &HostCapabilities) -> Result<(), SetupError> {
    let isa = requirement.isa;
    if !host.supports_isa(isa) {
        warn!(isa = %isa, "required ISA missing");
        return Err(SetupError::UnsupportedIsa(isa));
    }

    if let Some(protocol) = requirement.coherence_protocol {
        if !host.supports_protocol(isa, protocol) {
            warn!(isa = %isa, protocol = %protocol, "required coherence protocol missing");
            return Err(SetupError::UnsupportedProtocol { isa, protocol });
        }
    }

    if requirement.kvm_required {
        if !host.kvm_available() {
            return Err(SetupError::KvmUnavailable(format!(
                "{KVM_DEVICE} is not accessible"
            )));
        }
        if isa.host_arch() != Some(host.host_arch()) {
            return Err(SetupError::KvmUnavailable(format!(
                "{isa} guests cannot be accelerated on a {} host",
                host.host_arch()
            )));
        }
    }

    debug!(
        isa = %isa,
        protocol = ?requirement.coherence_protocol,
        kvm = requirement.kvm_required,
        "capabilities satisfied"
    );
    Ok(())
}
