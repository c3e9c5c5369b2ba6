//! Traps, system calls, coprocessor 0 transfers and TLB maintenance

use super::cp0::{reg, Exception, ExceptionCode};
use super::Cpu;
use crate::bitwise::se32;
use crate::error::{MipsError, MipsResult};
use crate::isa::catalog::OpId;
use crate::isa::{Arith, DecodedInstruction};

impl Cpu {
    /// CP0 instructions are always usable in kernel mode, otherwise they need CU0
    fn cop0_usable(&mut self) -> bool {
        if self.cp0.is_kernel() || self.cp0.status.cu0() {
            true
        } else {
            self.cp0.raise(Exception::unusable(0));
            false
        }
    }
}

/// Register and immediate traps
pub(super) fn trap(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = if i.is_immediate() {
        i.inst.imm_se()
    } else {
        cpu.reg(i.target())
    };

    let unsigned = i.is_unsigned();

    let less = if unsigned {
        a < b
    } else {
        (a as i64) < (b as i64)
    };

    let cond = match i.op.arith {
        Arith::Equal => a == b,
        Arith::NotEqual => a != b,
        Arith::LessThan => less,
        Arith::GreaterOrEqual => !less,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    if cond {
        cpu.cp0.raise(Exception::general(ExceptionCode::Trap));
    }

    Ok(())
}

pub(super) fn syscall(cpu: &mut Cpu, _: &DecodedInstruction) -> MipsResult<()> {
    cpu.cp0.raise(Exception::general(ExceptionCode::Syscall));

    Ok(())
}

pub(super) fn brk(cpu: &mut Cpu, _: &DecodedInstruction) -> MipsResult<()> {
    let pc = cpu.current_pc;

    cpu.tracer.trigger_break(pc);
    cpu.cp0.raise(Exception::general(ExceptionCode::Breakpoint));

    Ok(())
}

/// sync and cache: there is no cache or write buffer to maintain
pub(super) fn nop(_: &mut Cpu, _: &DecodedInstruction) -> MipsResult<()> {
    Ok(())
}

/// mfc0, dmfc0
pub(super) fn move_from(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop0_usable() {
        return Ok(());
    }

    let v = cpu.cp0.read(i.dest());

    let v = if i.data_size() == 8 { v } else { se32(v as u32) };

    cpu.set_reg(i.target(), v);

    Ok(())
}

/// mtc0, dmtc0
pub(super) fn move_to(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop0_usable() {
        return Ok(());
    }

    let v = cpu.reg(i.target());

    let v = if i.data_size() == 8 { v } else { se32(v as u32) };

    cpu.cp0.write(i.dest(), v);

    Ok(())
}

pub(super) fn eret(cpu: &mut Cpu, _: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop0_usable() {
        return Ok(());
    }

    let target = cpu.cp0.eret();

    debug!("ERET to 0x{:016x}", target);

    cpu.ll_bit = false;
    // ERET has no delay slot
    cpu.pc_override = Some(target);

    Ok(())
}

/// tlbr, tlbwi, tlbwr, tlbp
pub(super) fn tlb(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop0_usable() {
        return Ok(());
    }

    let cp0 = &mut cpu.cp0;

    match i.op.id {
        OpId::TLBR => {
            let index = (cp0.read(reg::INDEX) & 0x1f) as usize;
            let (page_mask, entry_hi, lo0, lo1) = cp0.tlb.read(index);

            cp0.force(reg::PAGE_MASK, page_mask);
            cp0.force(reg::ENTRY_HI, entry_hi);
            cp0.force(reg::ENTRY_LO0, lo0);
            cp0.force(reg::ENTRY_LO1, lo1);
        }
        OpId::TLBWI | OpId::TLBWR => {
            let index = if i.op.id == OpId::TLBWI {
                cp0.read(reg::INDEX) & 0x1f
            } else {
                cp0.read(reg::RANDOM)
            };

            let page_mask = cp0.read(reg::PAGE_MASK);
            let entry_hi = cp0.read(reg::ENTRY_HI);
            let lo0 = cp0.read(reg::ENTRY_LO0);
            let lo1 = cp0.read(reg::ENTRY_LO1);

            cp0.tlb.write(index as usize, page_mask, entry_hi, lo0, lo1);
        }
        OpId::TLBP => {
            let entry_hi = cp0.read(reg::ENTRY_HI);

            let index = match cp0.tlb.probe(entry_hi) {
                Some(i) => i as u64,
                None => 0x8000_0000,
            };

            cp0.force(reg::INDEX, index);
        }
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    }

    Ok(())
}
