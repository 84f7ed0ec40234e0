//! # Core Model Tests
//!
//! The built-in core model, its factory, and closure factories.

use phasesim_core::config::Isa;
use phasesim_core::core::{ArchState, BasicCore, BasicCoreFactory, CoreFactory, CoreModel, CoreType};

#[test]
fn test_basic_core_retires_at_type_cpi() {
    let mut core = BasicCore::new(CoreType::Minor, Isa::X86, 0x1000);
    let cycles = core.execute(10).unwrap();
    assert_eq!(cycles, 30);
    assert_eq!(core.state().pc, 0x1000 + 40);
    assert_eq!(core.state().insts_retired, 10);
}

#[test]
fn test_timing_core_leaves_ops_in_flight_until_drained() {
    let mut core = BasicCore::new(CoreType::O3, Isa::X86, 0);
    let _ = core.execute(100).unwrap();
    assert_eq!(core.in_flight(), 16);
    assert!(!core.is_drained());

    core.drain();
    assert!(core.is_drained());
}

#[test]
fn test_small_burst_bounds_in_flight() {
    let mut core = BasicCore::new(CoreType::O3, Isa::X86, 0);
    let _ = core.execute(3).unwrap();
    assert_eq!(core.in_flight(), 3);
}

#[test]
fn test_kvm_core_is_always_drained() {
    let mut core = BasicCore::new(CoreType::Kvm, Isa::X86, 0);
    let _ = core.execute(1_000).unwrap();
    assert!(core.is_drained());
}

#[test]
fn test_take_and_load_state_moves_registers() {
    let mut from = BasicCore::new(CoreType::Kvm, Isa::X86, 0x8000_0000);
    let _ = from.execute(5).unwrap();
    let mut to = BasicCore::new(CoreType::Timing, Isa::X86, 0);

    to.load_state(from.take_state());
    assert_eq!(to.state().pc, 0x8000_0000 + 20);
    assert_eq!(to.state().insts_retired, 5);
}

#[test]
fn test_arch_state_default_is_reset() {
    let state = ArchState::default();
    assert_eq!(state.pc, 0);
    assert!(state.regs.iter().all(|&r| r == 0));
}

#[test]
fn test_basic_factory_uses_reset_pc() {
    let factory = BasicCoreFactory { reset_pc: 0x8000_0000 };
    let core = factory.create(CoreType::Atomic, Isa::Riscv, 0).unwrap();
    assert_eq!(core.core_type(), CoreType::Atomic);
    assert_eq!(core.isa(), Isa::Riscv);
    assert_eq!(core.state().pc, 0x8000_0000);
}

#[test]
fn test_closure_is_a_factory() {
    let factory = |core_type: CoreType, isa: Isa, index: usize| -> Result<Box<dyn CoreModel>, String> {
        if index > 0 {
            return Err(format!("only one {core_type} core"));
        }
        Ok(Box::new(BasicCore::new(core_type, isa, 0)))
    };
    assert!(factory.create(CoreType::Kvm, Isa::X86, 0).is_ok());
    assert_eq!(
        factory.create(CoreType::Kvm, Isa::X86, 1).unwrap_err(),
        "only one KVM core"
    );
}

#[test]
fn test_retired_count_saturates() {
    let mut state = ArchState::new(0);
    state.retire(u64::MAX - 1);
    state.retire(10);
    assert_eq!(state.insts_retired, u64::MAX);
}
