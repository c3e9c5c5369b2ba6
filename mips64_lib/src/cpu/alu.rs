//! Integer arithmetic, logic, shifts and the multiply/divide unit

use super::cp0::{Exception, ExceptionCode};
use super::Cpu;
use crate::bitwise::se32;
use crate::error::{MipsError, MipsResult};
use crate::isa::{Arith, DecodedInstruction, ExecFlags, RegBound};

impl Cpu {
    /// Second operand: the sign-extended immediate or `rt`
    fn operand(&self, i: &DecodedInstruction) -> u64 {
        if i.is_immediate() {
            i.inst.imm_se()
        } else {
            self.reg(i.target())
        }
    }

    /// Destination register: `rt` for immediate forms, `rd` otherwise
    fn destination(i: &DecodedInstruction) -> usize {
        if i.is_immediate() {
            i.target()
        } else {
            i.dest()
        }
    }

    fn overflow(&mut self) {
        self.cp0.raise(Exception::general(ExceptionCode::Overflow));
    }
}

/// add, addu, addi, addiu
pub(super) fn add(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source()) as u32;
    let b = cpu.operand(i) as u32;

    let r = if i.is_unsigned() {
        a.wrapping_add(b)
    } else {
        match (a as i32).checked_add(b as i32) {
            Some(v) => v as u32,
            None => {
                cpu.overflow();
                return Ok(());
            }
        }
    };

    cpu.set_reg(Cpu::destination(i), se32(r));

    Ok(())
}

/// dadd, daddu, daddi, daddiu
pub(super) fn dadd(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = cpu.operand(i);

    let r = if i.is_unsigned() {
        a.wrapping_add(b)
    } else {
        match (a as i64).checked_add(b as i64) {
            Some(v) => v as u64,
            None => {
                cpu.overflow();
                return Ok(());
            }
        }
    };

    cpu.set_reg(Cpu::destination(i), r);

    Ok(())
}

/// sub, subu
pub(super) fn sub(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source()) as u32;
    let b = cpu.reg(i.target()) as u32;

    let r = if i.is_unsigned() {
        a.wrapping_sub(b)
    } else {
        match (a as i32).checked_sub(b as i32) {
            Some(v) => v as u32,
            None => {
                cpu.overflow();
                return Ok(());
            }
        }
    };

    cpu.set_reg(i.dest(), se32(r));

    Ok(())
}

/// dsub, dsubu
pub(super) fn dsub(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = cpu.reg(i.target());

    let r = if i.is_unsigned() {
        a.wrapping_sub(b)
    } else {
        match (a as i64).checked_sub(b as i64) {
            Some(v) => v as u64,
            None => {
                cpu.overflow();
                return Ok(());
            }
        }
    };

    cpu.set_reg(i.dest(), r);

    Ok(())
}

/// and, or, xor, nor and their immediate forms. Logical immediates are zero-extended.
pub(super) fn logic(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = if i.is_immediate() {
        u64::from(i.inst.imm())
    } else {
        cpu.reg(i.target())
    };

    let r = match i.op.arith {
        Arith::And => a & b,
        Arith::Or => a | b,
        Arith::Xor => a ^ b,
        Arith::Nor => !(a | b),
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    cpu.set_reg(Cpu::destination(i), r);

    Ok(())
}

/// slt, sltu, slti, sltiu. The immediate is sign-extended even for the unsigned compare
pub(super) fn set_less(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = cpu.operand(i);

    let r = if i.is_unsigned() {
        a < b
    } else {
        (a as i64) < (b as i64)
    };

    cpu.set_reg(Cpu::destination(i), r as u64);

    Ok(())
}

pub(super) fn lui(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let v = u32::from(i.inst.imm()) << 16;

    cpu.set_reg(i.target(), se32(v));

    Ok(())
}

/// 32-bit shifts, by immediate or by register
pub(super) fn shift(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let v = cpu.reg(i.target());

    let s = if i.has(ExecFlags::VAR_SHIFT) {
        (cpu.reg(i.source()) & 0x1f) as u32
    } else {
        i.shift_amount()
    };

    let r = match (i.op.arith, i.is_unsigned()) {
        (Arith::LeftShift, _) => (v as u32) << s,
        (Arith::RightShift, true) => (v as u32) >> s,
        // Arithmetic shifts work on the full register, only the low 32 bits are kept
        (Arith::RightShift, false) => ((v as i64) >> s) as u32,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    cpu.set_reg(i.dest(), se32(r));

    Ok(())
}

/// 64-bit shifts, including the `*32` variants
pub(super) fn dshift(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let v = cpu.reg(i.target());

    let s = if i.has(ExecFlags::VAR_SHIFT) {
        (cpu.reg(i.source()) & 0x3f) as u32
    } else {
        i.shift_amount()
    };

    let r = match (i.op.arith, i.is_unsigned()) {
        (Arith::LeftShift, _) => v << s,
        (Arith::RightShift, true) => v >> s,
        (Arith::RightShift, false) => ((v as i64) >> s) as u64,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    cpu.set_reg(i.dest(), r);

    Ok(())
}

/// mult, multu: 64-bit product split between LO and HI, both sign-extended
pub(super) fn mult(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source()) as u32;
    let b = cpu.reg(i.target()) as u32;

    let p = if i.is_unsigned() {
        u64::from(a) * u64::from(b)
    } else {
        (i64::from(a as i32) * i64::from(b as i32)) as u64
    };

    cpu.lo = se32(p as u32);
    cpu.hi = se32((p >> 32) as u32);

    Ok(())
}

pub(super) fn dmult(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = cpu.reg(i.target());

    let p = if i.is_unsigned() {
        u128::from(a) * u128::from(b)
    } else {
        (i128::from(a as i64) * i128::from(b as i64)) as u128
    };

    cpu.lo = p as u64;
    cpu.hi = (p >> 64) as u64;

    Ok(())
}

/// div, divu. Division by zero doesn't trap, the results match what the hardware leaves in
/// HI/LO.
pub(super) fn div(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source()) as u32;
    let b = cpu.reg(i.target()) as u32;

    let (q, r) = if i.is_unsigned() {
        if b == 0 {
            (!0, a)
        } else {
            (a / b, a % b)
        }
    } else {
        let (a, b) = (a as i32, b as i32);

        if b == 0 {
            (if a < 0 { 1 } else { !0 }, a as u32)
        } else if a == i32::MIN && b == -1 {
            (a as u32, 0)
        } else {
            ((a / b) as u32, (a % b) as u32)
        }
    };

    cpu.lo = se32(q);
    cpu.hi = se32(r);

    Ok(())
}

pub(super) fn ddiv(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let a = cpu.reg(i.source());
    let b = cpu.reg(i.target());

    let (q, r) = if i.is_unsigned() {
        if b == 0 {
            (!0, a)
        } else {
            (a / b, a % b)
        }
    } else {
        let (a, b) = (a as i64, b as i64);

        if b == 0 {
            (if a < 0 { 1 } else { !0 }, a as u64)
        } else if a == i64::MIN && b == -1 {
            (a as u64, 0)
        } else {
            ((a / b) as u64, (a % b) as u64)
        }
    };

    cpu.lo = q;
    cpu.hi = r;

    Ok(())
}

/// mfhi, mflo, mthi, mtlo
pub(super) fn move_hilo(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    match (i.op.source, i.op.target) {
        (RegBound::Hi, _) => cpu.set_reg(i.dest(), cpu.hi),
        (RegBound::Lo, _) => cpu.set_reg(i.dest(), cpu.lo),
        (_, RegBound::Hi) => cpu.hi = cpu.reg(i.source()),
        (_, RegBound::Lo) => cpu.lo = cpu.reg(i.source()),
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    }

    Ok(())
}
