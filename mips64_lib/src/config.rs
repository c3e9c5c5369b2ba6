//! Core configuration

use serde::{Deserialize, Serialize};

/// Reset value of the PC: beginning of the PIF boot ROM
pub const RESET_PC: u64 = 0xffff_ffff_bfc0_0000;

/// Default RAM size: 8MB (expansion pak installed)
pub const RAM_SIZE: usize = 8 * 1024 * 1024;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// Size in bytes of the physical RAM created by `Cpu::with_ram`
    pub ram_size: usize,
    /// PC after reset
    pub reset_pc: u64,
    /// Start with the KX/SX/UX bits set so that 64-bit operations are legal from the start.
    /// Kernel mode is 64-bit capable regardless.
    pub mode_64: bool,
    /// Identity-map every virtual address instead of going through the segment map
    pub mmu_bypass: bool,
    /// Start with Status.FR set (32 64-bit FPU registers)
    pub fpu_fr: bool,
    /// Log every executed instruction at trace level
    pub trace_instructions: bool,
}

impl Default for CoreConfig {
    fn default() -> CoreConfig {
        CoreConfig {
            ram_size: RAM_SIZE,
            reset_pc: RESET_PC,
            mode_64: false,
            mmu_bypass: false,
            fpu_fr: false,
            trace_instructions: cfg!(feature = "trace_instructions"),
        }
    }
}

#[test]
fn persisted_config() {
    let config = CoreConfig {
        reset_pc: 0xffff_ffff_8000_1000,
        mode_64: true,
        fpu_fr: true,
        ..CoreConfig::default()
    };

    let bytes = flexbuffers::to_vec(&config).unwrap();
    let loaded: CoreConfig = flexbuffers::from_slice(&bytes).unwrap();

    assert_eq!(loaded, config);
}
