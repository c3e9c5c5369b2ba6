//! RSP interpreter: the scalar unit (a 32-bit MIPS subset running from IMEM), the vector unit
//! with its accumulator and control registers, and the 4KB IMEM/DMEM scratch memories.
//!
//! The RSP has no exceptions: arithmetic never traps, every memory access wraps around its 4KB
//! memory and BREAK halts the processor.

mod accumulator;
pub mod cp0;
mod divide;
mod flags;
mod su;
mod vector;
mod vlsu;
mod vu;

#[cfg(test)]
mod test;

pub use self::accumulator::{clamp_i16, Accumulator};
pub use self::cp0::{SpRegisters, SpStatus};
pub use self::divide::{reciprocal, DivState};
pub use self::flags::{FlagPair, LaneFlags};
pub use self::vector::{element_lane, Vector};

use crate::cpu::BranchUnit;
use crate::error::{MipsError, MipsResult};
use crate::isa::catalog::*;
use crate::isa::disasm::GPR_NAMES;
use crate::isa::{self, disassemble, CallTable, DecodedInstruction, Family, RSP};
use crate::memory::Scratch;
use crate::tracer::Tracer;
use std::fmt;

/// IMEM and DMEM addresses are 12 bits wide
pub const PC_MASK: u32 = 0xffc;

pub struct Rsp {
    /// Address of the instruction being executed
    current_pc: u32,
    /// Address of the next instruction to fetch
    pc: u32,
    /// Scalar registers, R0 is always 0
    regs: [u32; 32],
    branch: BranchUnit,
    vregs: [Vector; 32],
    acc: Accumulator,
    /// Carry (lo) and not equal (hi) flags
    vco: FlagPair,
    /// Compare (lo) and clip (hi) flags
    vcc: FlagPair,
    /// Clip extension flags
    vce: LaneFlags,
    div: DivState,
    imem: Scratch,
    dmem: Scratch,
    sp: SpRegisters,
    tracer: Box<dyn Tracer + Send>,
    calls: CallTable<Rsp>,
    last: Option<DecodedInstruction>,
    cycles: u64,
    trace_instructions: bool,
}

impl Rsp {
    /// Build a halted RSP with zeroed memories
    pub fn new() -> MipsResult<Rsp> {
        Ok(Rsp {
            current_pc: 0,
            pc: 0,
            regs: [0; 32],
            branch: BranchUnit::default(),
            vregs: [Vector::default(); 32],
            acc: Accumulator::new(),
            vco: FlagPair::default(),
            vcc: FlagPair::default(),
            vce: LaneFlags::default(),
            div: DivState::default(),
            imem: Scratch::new(),
            dmem: Scratch::new(),
            sp: SpRegisters::new(),
            tracer: Box::new(()),
            calls: call_table()?,
            last: None,
            cycles: 0,
            trace_instructions: cfg!(feature = "trace_instructions"),
        })
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer + Send>) {
        self.tracer = tracer;
    }

    /// Log every executed instruction at trace level
    pub fn set_trace_instructions(&mut self, trace: bool) {
        self.trace_instructions = trace;
    }

    pub fn imem(&self) -> &Scratch {
        &self.imem
    }

    pub fn imem_mut(&mut self) -> &mut Scratch {
        &mut self.imem
    }

    pub fn dmem(&self) -> &Scratch {
        &self.dmem
    }

    pub fn dmem_mut(&mut self) -> &mut Scratch {
        &mut self.dmem
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn current_pc(&self) -> u32 {
        self.current_pc
    }

    /// Force the PC. Any pending branch is forgotten.
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc & PC_MASK;
        self.current_pc = self.pc;
        self.branch = BranchUnit::default();
    }

    pub fn branch_state(&self) -> BranchUnit {
        self.branch
    }

    pub fn reg(&self, index: usize) -> u32 {
        self.regs[index & 0x1f]
    }

    pub fn set_reg(&mut self, index: usize, v: u32) {
        self.regs[index & 0x1f] = v;

        // R0 always contains 0
        self.regs[0] = 0;
    }

    pub fn vreg(&self, index: usize) -> Vector {
        self.vregs[index & 0x1f]
    }

    pub fn set_vreg(&mut self, index: usize, v: Vector) {
        self.vregs[index & 0x1f] = v;
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.acc
    }

    pub fn set_accumulator(&mut self, acc: Accumulator) {
        self.acc = acc;
    }

    pub fn vco(&self) -> FlagPair {
        self.vco
    }

    pub fn set_vco(&mut self, v: u16) {
        self.vco.set_value(v);
    }

    pub fn vcc(&self) -> FlagPair {
        self.vcc
    }

    pub fn set_vcc(&mut self, v: u16) {
        self.vcc.set_value(v);
    }

    pub fn vce(&self) -> LaneFlags {
        self.vce
    }

    pub fn set_vce(&mut self, v: u8) {
        self.vce = LaneFlags(v);
    }

    pub fn div_state(&self) -> DivState {
        self.div
    }

    pub fn sp_registers(&self) -> &SpRegisters {
        &self.sp
    }

    pub fn sp_registers_mut(&mut self) -> &mut SpRegisters {
        &mut self.sp
    }

    pub fn is_halted(&self) -> bool {
        self.sp.status.halt()
    }

    /// Set by BREAK, cleared through the status register
    pub fn is_broke(&self) -> bool {
        self.sp.status.broke()
    }

    pub fn halt(&mut self) {
        self.sp.status.set_halt(true);
    }

    /// Clear the halt and broke flags and start executing at `pc`
    pub fn start(&mut self, pc: u32) {
        debug!("Starting RSP at 0x{:03x}", pc & PC_MASK);

        self.set_pc(pc);
        self.sp.status.set_halt(false);
        self.sp.status.set_broke(false);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_instruction(&self) -> Option<&DecodedInstruction> {
        self.last.as_ref()
    }

    pub fn disassemble_last(&self) -> Option<String> {
        self.last.as_ref().map(disassemble)
    }

    /// Run a single instruction. Stepping a halted RSP does nothing.
    pub fn step(&mut self) -> MipsResult<()> {
        if self.is_halted() {
            return Ok(());
        }

        self.cycles += 1;

        let branch = std::mem::take(&mut self.branch);
        let pc = self.pc;

        self.current_pc = pc;

        let word = self.imem.load::<u32>(pc);
        let inst = isa::decode(&RSP, word, u64::from(pc));

        self.tracer.pc_change(u64::from(pc));
        self.last = Some(inst);

        if self.trace_instructions {
            trace!("RSP {:03x}: {:08x} {}", pc, word, disassemble(&inst));
        }

        if inst.is_valid() {
            match self.calls.handler(inst.op) {
                Some(handler) => handler(self, &inst)?,
                None => {
                    error!("No RSP handler for {:?}", inst);
                    return Err(MipsError::UnboundOpcode(inst.op.mnemonic));
                }
            }
        } else {
            // No reserved instruction exception on the RSP
            warn!("Invalid RSP instruction 0x{:08x} at 0x{:03x}", word, pc);
        }

        self.pc = if branch.delay_slot && (branch.take || branch.unconditional) {
            branch.target as u32 & PC_MASK
        } else {
            pc.wrapping_add(4) & PC_MASK
        };

        Ok(())
    }

    /// Run up to `count` instructions, stopping early if the RSP halts
    pub fn run(&mut self, count: u64) -> MipsResult<u64> {
        let mut executed = 0;

        while executed < count && !self.is_halted() {
            self.step()?;
            executed += 1;
        }

        Ok(executed)
    }
}

/// Build the RSP call table
fn call_table() -> MipsResult<CallTable<Rsp>> {
    CallTable::new("rsp")
        .bind(su::add, &[&ADD, &ADDU, &ADDI, &ADDIU])
        .bind(su::sub, &[&SUB, &SUBU])
        .bind(su::logic, &[&AND, &OR, &XOR, &NOR, &ANDI, &ORI, &XORI])
        .bind(su::set_less, &[&SLT, &SLTU, &SLTI, &SLTIU])
        .bind(su::lui, &[&LUI])
        .bind(su::shift, &[&SLL, &SRL, &SRA, &SLLV, &SRLV, &SRAV])
        .bind(su::jump, &[&J, &JAL, &JR, &JALR])
        .bind_family(su::branch, &RSP, Family::Branch)
        .bind(su::brk, &[&BREAK])
        .bind(su::move_from, &[&MFC0])
        .bind(su::move_to, &[&MTC0])
        .bind(
            vlsu::load,
            &[&LBV, &LSV, &LLV, &LDV, &LQV, &LRV, &LPV, &LUV, &LHV, &LFV, &LWV, &LTV],
        )
        .bind(
            vlsu::store,
            &[&SBV, &SSV, &SLV, &SDV, &SQV, &SRV, &SPV, &SUV, &SHV, &SFV, &SWV, &STV],
        )
        .bind_family(su::load, &RSP, Family::Load)
        .bind_family(su::store, &RSP, Family::Store)
        .bind(vu::move_from, &[&MFC2])
        .bind(vu::move_to, &[&MTC2])
        .bind(vu::control_from, &[&CFC2])
        .bind(vu::control_to, &[&CTC2])
        .bind(
            vu::multiply,
            &[
                &VMULF, &VMULU, &VMUDL, &VMUDM, &VMUDN, &VMUDH, &VMACF, &VMACU, &VMADL, &VMADM,
                &VMADN, &VMADH,
            ],
        )
        .bind(vu::round, &[&VRNDP, &VRNDN])
        .bind(vu::quantize, &[&VMULQ, &VMACQ])
        .bind(vu::add, &[&VADD, &VSUB])
        .bind(vu::add_carry, &[&VADDC, &VSUBC])
        .bind(vu::absolute, &[&VABS])
        .bind(vu::read_accumulator, &[&VSAR])
        .bind(vu::compare, &[&VLT, &VEQ, &VNE, &VGE])
        .bind(vu::clip, &[&VCL, &VCH, &VCR])
        .bind(vu::merge, &[&VMRG])
        .bind(vu::logic, &[&VAND, &VNAND, &VOR, &VNOR, &VXOR, &VNXOR])
        .bind(vu::divide, &[&VRCP, &VRCPL, &VRSQ, &VRSQL])
        .bind(vu::divide_high, &[&VRCPH, &VRSQH])
        .bind(vu::move_element, &[&VMOV])
        .bind(vu::nop, &[&VNOP, &VNULL])
        .bind(vu::reserved, &VU_RESERVED)
        .finish(&RSP)
}

impl fmt::Debug for Rsp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "PC: 0x{:03x}    STATUS: 0x{:08x}",
            self.pc, self.sp.status.0
        )?;

        for i in 0..16 {
            writeln!(
                f,
                "{}: 0x{:08x}    {}: 0x{:08x}",
                GPR_NAMES[i],
                self.regs[i],
                GPR_NAMES[i + 16],
                self.regs[i + 16]
            )?;
        }

        for i in 0..32 {
            writeln!(f, "v{:<2}: {:?}", i, self.vregs[i])?;
        }

        writeln!(
            f,
            "VCO: 0x{:04x}    VCC: 0x{:04x}    VCE: 0x{:02x}",
            self.vco.value(),
            self.vcc.value(),
            self.vce.0
        )?;

        Ok(())
    }
}
