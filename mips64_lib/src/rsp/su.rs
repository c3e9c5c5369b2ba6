//! Scalar unit: 32-bit integer arithmetic, branches, DMEM loads and stores, COP0 moves and
//! BREAK. None of these can trap.

use super::{Rsp, PC_MASK};
use crate::cpu::BranchUnit;
use crate::error::{MipsError, MipsResult};
use crate::isa::{Arith, DecodedInstruction, ExecFlags};

impl Rsp {
    fn schedule(&mut self, taken: bool, target: u32, unconditional: bool) {
        self.branch = BranchUnit {
            delay_slot: true,
            take: taken,
            unconditional,
            target: u64::from(target & PC_MASK),
            nullify_next: false,
        };
    }

    /// Second operand of an ALU operation: the sign extended immediate or `rt`
    fn operand(&self, i: &DecodedInstruction) -> u32 {
        if i.is_immediate() {
            i.inst.imm_se() as u32
        } else {
            self.reg(i.target())
        }
    }

    /// Immediate forms write `rt`, register forms `rd`
    fn set_result(&mut self, i: &DecodedInstruction, v: u32) {
        let r = if i.is_immediate() { i.target() } else { i.dest() };

        self.set_reg(r, v);
    }

    fn data_address(&self, i: &DecodedInstruction) -> u32 {
        self.reg(i.source()).wrapping_add(i.inst.imm_se() as u32)
    }
}

/// add, addu, addi, addiu
pub(super) fn add(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = rsp.reg(i.source()).wrapping_add(rsp.operand(i));

    rsp.set_result(i, v);

    Ok(())
}

/// sub, subu
pub(super) fn sub(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = rsp.reg(i.source()).wrapping_sub(rsp.reg(i.target()));

    rsp.set_reg(i.dest(), v);

    Ok(())
}

pub(super) fn logic(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let a = rsp.reg(i.source());
    // Logic immediates are zero extended
    let b = if i.is_immediate() {
        u32::from(i.inst.imm())
    } else {
        rsp.reg(i.target())
    };

    let v = match i.op.arith {
        Arith::And => a & b,
        Arith::Or => a | b,
        Arith::Xor => a ^ b,
        Arith::Nor => !(a | b),
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    rsp.set_result(i, v);

    Ok(())
}

/// slt, sltu, slti, sltiu
pub(super) fn set_less(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let a = rsp.reg(i.source());
    let b = rsp.operand(i);

    let less = if i.is_unsigned() {
        a < b
    } else {
        (a as i32) < (b as i32)
    };

    rsp.set_result(i, less as u32);

    Ok(())
}

pub(super) fn lui(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    rsp.set_reg(i.target(), u32::from(i.inst.imm()) << 16);

    Ok(())
}

pub(super) fn shift(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = rsp.reg(i.target());
    let amount = if i.has(ExecFlags::VAR_SHIFT) {
        rsp.reg(i.source()) & 0x1f
    } else {
        i.inst.sa()
    };

    let v = match i.op.arith {
        Arith::LeftShift => v << amount,
        Arith::RightShift if i.is_unsigned() => v >> amount,
        Arith::RightShift => ((v as i32) >> amount) as u32,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    rsp.set_reg(i.dest(), v);

    Ok(())
}

/// j, jal, jr, jalr
pub(super) fn jump(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let target = if i.has(ExecFlags::REGISTER) {
        rsp.reg(i.source())
    } else {
        i.inst.target()
    };

    if i.is_link() {
        let rd = if i.has(ExecFlags::REGISTER) { i.dest() } else { 31 };
        let link = rsp.current_pc.wrapping_add(8) & PC_MASK;

        rsp.set_reg(rd, link);
    }

    rsp.schedule(true, target, true);

    Ok(())
}

/// beq, bne, blez, bgtz, bltz, bgez, bltzal, bgezal
pub(super) fn branch(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let a = rsp.reg(i.source()) as i32;
    let b = rsp.reg(i.target()) as i32;

    let taken = match i.op.arith {
        Arith::Equal => a == b,
        Arith::NotEqual => a != b,
        Arith::LessOrEqual => a <= 0,
        Arith::GreaterThan => a > 0,
        Arith::LessThan => a < 0,
        Arith::GreaterOrEqual => a >= 0,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    let target = rsp
        .current_pc
        .wrapping_add(4)
        .wrapping_add((i.inst.imm_se() as u32) << 2);

    if i.is_link() {
        let link = rsp.current_pc.wrapping_add(8) & PC_MASK;

        rsp.set_reg(31, link);
    }

    rsp.schedule(taken, target, false);

    Ok(())
}

/// lb, lbu, lh, lhu, lw. Any alignment is fine, accesses wrap around DMEM.
pub(super) fn load(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = rsp.data_address(i);
    let unsigned = i.is_unsigned();

    rsp.tracer.memory_read(u64::from(addr));

    let v = match i.data_size() {
        1 => {
            let b = rsp.dmem.load::<u8>(addr);
            if unsigned { u32::from(b) } else { b as i8 as u32 }
        }
        2 => {
            let h = rsp.dmem.load::<u16>(addr);
            if unsigned { u32::from(h) } else { h as i16 as u32 }
        }
        4 => rsp.dmem.load::<u32>(addr),
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    rsp.set_reg(i.target(), v);

    Ok(())
}

/// sb, sh, sw
pub(super) fn store(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = rsp.data_address(i);
    let v = rsp.reg(i.target());

    rsp.tracer.memory_write(u64::from(addr));

    match i.data_size() {
        1 => rsp.dmem.store::<u8>(addr, v as u8),
        2 => rsp.dmem.store::<u16>(addr, v as u16),
        4 => rsp.dmem.store::<u32>(addr, v),
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    }

    Ok(())
}

/// BREAK halts the RSP and raises the SP interrupt if it's enabled
pub(super) fn brk(rsp: &mut Rsp, _: &DecodedInstruction) -> MipsResult<()> {
    let pc = rsp.current_pc;

    debug!("RSP break at 0x{:03x}", pc);

    rsp.tracer.trigger_break(u64::from(pc));

    let status = &mut rsp.sp.status;

    status.set_broke(true);
    status.set_halt(true);

    if status.interrupt_on_break() {
        rsp.sp.interrupt = true;
    }

    Ok(())
}

pub(super) fn move_from(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = rsp.sp.read(i.dest());

    rsp.set_reg(i.target(), v);

    Ok(())
}

pub(super) fn move_to(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = rsp.reg(i.target());

    rsp.sp.write(i.dest(), v);

    if rsp.is_halted() {
        debug!("RSP halted itself at 0x{:03x}", rsp.current_pc);
    }

    Ok(())
}
