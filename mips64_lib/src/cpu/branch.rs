//! Jumps, branches and the delay slot state carried between two steps

use super::Cpu;
use crate::error::{MipsError, MipsResult};
use crate::isa::{Arith, DecodedInstruction, ExecFlags};

/// Branch state set by a branch or jump and consumed by the following step (the delay slot)
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct BranchUnit {
    /// The next instruction executes in a delay slot
    pub delay_slot: bool,
    /// Jump to `target` once the delay slot has executed
    pub take: bool,
    /// Set by jumps, which are always taken
    pub unconditional: bool,
    pub target: u64,
    /// Likely branch not taken: the delay slot must not execute
    pub nullify_next: bool,
}

impl Cpu {
    /// Address of the delay slot of the current instruction
    fn delay_slot_pc(&self) -> u64 {
        self.current_pc.wrapping_add(4)
    }

    /// Return address written by linking branches and jumps
    fn link_address(&self) -> u64 {
        self.current_pc.wrapping_add(8)
    }

    fn schedule(&mut self, taken: bool, target: u64, likely: bool) {
        let target = self.mask_address(target);

        self.tracer.branch(target, taken);

        self.branch = BranchUnit {
            delay_slot: true,
            take: taken,
            unconditional: false,
            target,
            nullify_next: likely && !taken,
        };
    }
}

/// j, jal, jr, jalr
pub(super) fn jump(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let target = if i.has(ExecFlags::REGISTER) {
        cpu.reg(i.source())
    } else {
        (cpu.delay_slot_pc() & !0x0fff_ffff) | u64::from(i.inst.target())
    };

    if i.is_link() {
        let link = cpu.link_address();

        // jal always links to RA
        let rd = if i.has(ExecFlags::REGISTER) { i.dest() } else { 31 };

        cpu.set_reg(rd, link);
    }

    cpu.schedule(true, target, false);
    cpu.branch.unconditional = true;

    Ok(())
}

/// Conditional branches comparing GPRs, including the likely and linking variants
pub(super) fn branch(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source()) as i64;
    let b = cpu.reg(i.target()) as i64;

    let taken = match i.op.arith {
        Arith::Equal => a == b,
        Arith::NotEqual => a != b,
        Arith::LessOrEqual => a <= 0,
        Arith::GreaterThan => a > 0,
        Arith::LessThan => a < 0,
        Arith::GreaterOrEqual => a >= 0,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    let target = cpu.delay_slot_pc().wrapping_add(i.inst.imm_se() << 2);

    // The link register is written whether or not the branch is taken
    if i.is_link() {
        let link = cpu.link_address();

        cpu.set_reg(31, link);
    }

    cpu.schedule(taken, target, i.is_likely());

    Ok(())
}

/// bc1f, bc1t and their likely variants, testing the FPU condition bit
pub(super) fn branch_fpu(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let c = cpu.fpu.fcr31.condition();

    let taken = match i.op.arith {
        Arith::True => c,
        Arith::False => !c,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    let target = cpu.delay_slot_pc().wrapping_add(i.inst.imm_se() << 2);

    cpu.schedule(taken, target, i.is_likely());

    Ok(())
}
