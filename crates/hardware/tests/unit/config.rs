//! # Configuration Tests
//!
//! Tests for configuration structures, deserialization, defaults, derived
//! capability requirements, and file loading.

use std::io::Write;

use phasesim_core::common::{ByteSize, ConfigError, Frequency};
use phasesim_core::config::*;
use phasesim_core::core::CoreType;
use phasesim_core::sim::CapabilityRequirement;
use pretty_assertions::assert_eq;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(config.capabilities.is_none());
    assert_eq!(config.board.clk_freq, Frequency::ghz(3));
    assert_eq!(config.memory.size, ByteSize::gib(3));
    assert_eq!(config.memory.kind, MemoryKind::Ddr4_2400);
    assert_eq!(config.simulation.max_ticks, None);
}

#[test]
fn test_cache_hierarchy_defaults() {
    let cache = CacheHierarchyConfig::default();
    assert_eq!(cache.kind, CacheHierarchyKind::MesiTwoLevel);
    assert_eq!(cache.l1i, CacheLevelConfig::new(ByteSize::kib(32), 8));
    assert_eq!(cache.l1d, CacheLevelConfig::new(ByteSize::kib(32), 8));
    assert_eq!(cache.l2, CacheLevelConfig::new(ByteSize::kib(512), 16));
    assert_eq!(cache.num_l2_banks, 1);
    assert_eq!(cache.line_size, ByteSize(64));
}

#[test]
fn test_processor_defaults_are_switchable_kvm_to_timing() {
    let processor = ProcessorConfig::default();
    assert_eq!(processor.isa, Isa::X86);
    assert_eq!(processor.num_cores, 2);
    assert_eq!(processor.starting_core_type, CoreType::Kvm);
    assert_eq!(processor.switch_core_type, Some(CoreType::Timing));
    assert_eq!(processor.core_types(), vec![CoreType::Kvm, CoreType::Timing]);
}

#[test]
fn test_simple_processor_has_one_core_type() {
    let processor = ProcessorConfig::simple(CoreType::O3, Isa::Arm, 4);
    assert_eq!(processor.core_types(), vec![CoreType::O3]);
}

#[test]
fn test_empty_json_yields_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.processor.num_cores, 2);
    assert_eq!(config.cache_hierarchy.l2.size, ByteSize::kib(512));
    assert_eq!(config.simulation.boot_instructions, 1_000_000);
}

#[test]
fn test_full_json_config() {
    let json = r#"{
        "board": { "clk_freq": "2GHz" },
        "cache_hierarchy": {
            "kind": "MesiTwoLevel",
            "l1i": { "size": "16kB", "assoc": 8 },
            "l1d": { "size": "16kB", "assoc": 8 },
            "l2": { "size": "256kB", "assoc": 16 },
            "num_l2_banks": 2
        },
        "memory": { "kind": "DDR4_2400", "size": "2GiB", "channels": 2 },
        "processor": {
            "isa": "ARM",
            "num_cores": 4,
            "starting_core_type": "ATOMIC",
            "switch_core_type": "O3"
        },
        "simulation": { "max_ticks": 1000000000 }
    }"#;
    let config = Config::from_json(json).unwrap();

    assert_eq!(config.board.clk_freq, Frequency::ghz(2));
    assert_eq!(config.cache_hierarchy.l1d.size, ByteSize::kib(16));
    assert_eq!(config.cache_hierarchy.num_l2_banks, 2);
    assert_eq!(config.memory.size, ByteSize::gib(2));
    assert_eq!(config.memory.channels, 2);
    assert_eq!(config.processor.isa, Isa::Arm);
    assert_eq!(config.processor.starting_core_type, CoreType::Atomic);
    assert_eq!(config.processor.switch_core_type, Some(CoreType::O3));
    assert_eq!(config.simulation.max_ticks, Some(1_000_000_000));
}

#[test]
fn test_null_switch_core_type_means_simple_processor() {
    let config = Config::from_json(r#"{ "processor": { "switch_core_type": null } }"#).unwrap();
    assert_eq!(config.processor.switch_core_type, None);
}

#[test]
fn test_unknown_isa_is_a_deserialize_error() {
    let err = Config::from_json(r#"{ "processor": { "isa": "VAX" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Deserialize(_)));
}

#[test]
fn test_bad_size_string_is_a_deserialize_error() {
    let err = Config::from_json(r#"{ "memory": { "size": "lots" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Deserialize(ref m) if m.contains("lots")));
}

#[test]
fn test_requirement_derived_from_hardware_sections() {
    let config = Config::default();
    assert_eq!(
        config.requirement(),
        CapabilityRequirement::new(Isa::X86)
            .with_protocol(CoherenceProtocol::MesiTwoLevel)
            .with_kvm()
    );
}

#[test]
fn test_requirement_without_kvm_or_protocol() {
    let mut config = Config::default();
    config.processor = ProcessorConfig::switchable(CoreType::Atomic, CoreType::Timing, Isa::Riscv, 1);
    config.cache_hierarchy.kind = CacheHierarchyKind::NoCache;
    assert_eq!(config.requirement(), CapabilityRequirement::new(Isa::Riscv));
}

#[test]
fn test_explicit_capabilities_section_wins() {
    let config = Config::from_json(
        r#"{ "capabilities": { "isa": "ARM", "coherence_protocol": "CHI" } }"#,
    )
    .unwrap();
    let req = config.requirement();
    assert_eq!(req.isa, Isa::Arm);
    assert_eq!(req.coherence_protocol, Some(CoherenceProtocol::Chi));
    assert!(!req.kvm_required);
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "processor": {{ "num_cores": 8 }}, "memory": {{ "size": 1073741824 }} }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.processor.num_cores, 8);
    assert_eq!(config.memory.size, ByteSize::gib(1));
}

#[test]
fn test_config_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("absent.json")));
}

#[test]
fn test_protocol_display_names() {
    assert_eq!(CoherenceProtocol::MesiTwoLevel.to_string(), "MESI_Two_Level");
    assert_eq!(CoherenceProtocol::Chi.to_string(), "CHI");
}

#[test]
fn test_host_arch_mapping() {
    assert_eq!(Isa::X86.host_arch(), Some("x86_64"));
    assert_eq!(Isa::Arm.host_arch(), Some("aarch64"));
    assert_eq!(Isa::Mips.host_arch(), None);
}
