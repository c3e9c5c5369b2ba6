//! R4300i CPU interpreter: general purpose registers, HI/LO, branch delay slots, CP0 exceptions
//! and the FPU.

mod alu;
mod branch;
pub mod cp0;
pub mod fpu;
mod lsu;
mod system;
pub mod tlb;

#[cfg(test)]
mod test;

pub use self::branch::BranchUnit;
pub use self::cp0::{Cause, Exception, ExceptionCode, Status};
pub use self::fpu::Fcr31;

use self::cp0::Cp0;
use self::fpu::Fpu;
use crate::bitwise::se32;
use crate::config::CoreConfig;
use crate::error::{MipsError, MipsResult};
use crate::isa::catalog::*;
use crate::isa::disasm::GPR_NAMES;
use crate::isa::{self, disassemble, CallTable, DecodedInstruction, ExecFlags, Family, R4300I};
use crate::memory::{map, PhysicalMemory, Ram};
use crate::tracer::Tracer;
use std::fmt;

pub struct Cpu {
    config: CoreConfig,
    /// Address of the instruction currently being executed. Used for setting the EPC in
    /// exceptions.
    current_pc: u64,
    /// Address of the next instruction to fetch
    pc: u64,
    /// General Purpose Registers. The first entry (R0) must always contain 0
    regs: [u64; 32],
    /// HI register for division remainder and multiplication MSBs
    hi: u64,
    /// LO register for division quotient and multiplication LSBs
    lo: u64,
    /// Branch state left by the previous instruction
    branch: BranchUnit,
    cp0: Cp0,
    fpu: Fpu,
    /// Set by LL/LLD, cleared by ERET and exceptions. SC/SCD only store while it's set.
    ll_bit: bool,
    /// Physical memory used for both fetches and data accesses unless overridden
    memory: Option<Box<dyn PhysicalMemory>>,
    /// Instruction fetch override
    istream: Option<Box<dyn PhysicalMemory>>,
    /// Data access override
    dstream: Option<Box<dyn PhysicalMemory>>,
    tracer: Box<dyn Tracer + Send>,
    calls: CallTable<Cpu>,
    /// Last decoded instruction, kept for debugging
    last: Option<DecodedInstruction>,
    /// Number of steps run since reset
    cycles: u64,
    /// Set by instructions without a delay slot (ERET) to jump right away
    pc_override: Option<u64>,
}

impl Cpu {
    pub fn new(config: CoreConfig) -> MipsResult<Cpu> {
        let calls = call_table()?;

        let mut status = Status(0);
        status.set_bev(true);
        status.set_erl(true);
        status.set_fr(config.fpu_fr);

        if config.mode_64 {
            status.set_kx(true);
            status.set_sx(true);
            status.set_ux(true);
        }

        Ok(Cpu {
            current_pc: config.reset_pc,
            pc: config.reset_pc,
            regs: [0; 32],
            hi: 0,
            lo: 0,
            branch: BranchUnit::default(),
            cp0: Cp0::new(status),
            fpu: Fpu::new(),
            ll_bit: false,
            memory: None,
            istream: None,
            dstream: None,
            tracer: Box::new(()),
            calls,
            last: None,
            cycles: 0,
            pc_override: None,
            config,
        })
    }

    /// Build a CPU with `config.ram_size` bytes of RAM attached
    pub fn with_ram(config: CoreConfig) -> MipsResult<Cpu> {
        let ram = Ram::new(config.ram_size);
        let mut cpu = Cpu::new(config)?;

        cpu.attach_memory(Box::new(ram));

        Ok(cpu)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Attach the physical memory used for fetches and data accesses
    pub fn attach_memory(&mut self, memory: Box<dyn PhysicalMemory>) {
        self.memory = Some(memory);
    }

    /// Fetch instructions from `istream` instead of the main memory
    pub fn attach_istream(&mut self, istream: Box<dyn PhysicalMemory>) {
        self.istream = Some(istream);
    }

    /// Perform data accesses on `dstream` instead of the main memory
    pub fn attach_dstream(&mut self, dstream: Box<dyn PhysicalMemory>) {
        self.dstream = Some(dstream);
    }

    pub fn memory(&self) -> Option<&dyn PhysicalMemory> {
        self.memory.as_deref()
    }

    pub fn memory_mut(&mut self) -> Option<&mut (dyn PhysicalMemory + 'static)> {
        self.memory.as_deref_mut()
    }

    fn fetch_memory(&self) -> Option<&dyn PhysicalMemory> {
        self.istream.as_deref().or(self.memory.as_deref())
    }

    fn data_memory(&self) -> Option<&dyn PhysicalMemory> {
        self.dstream.as_deref().or(self.memory.as_deref())
    }

    fn data_memory_mut(&mut self) -> Option<&mut (dyn PhysicalMemory + 'static)> {
        match self.dstream {
            Some(ref mut d) => Some(d.as_mut()),
            None => self.memory.as_deref_mut(),
        }
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer + Send>) {
        self.tracer = tracer;
    }

    /// Return the current value of register `index`
    pub fn reg(&self, index: usize) -> u64 {
        self.regs[index & 0x1f]
    }

    /// Put `val` into register `index` and report it to the tracer. Writes to R0 are dropped.
    pub fn set_reg(&mut self, index: usize, val: u64) {
        let index = index & 0x1f;

        if index != 0 {
            self.regs[index] = val;
            self.tracer.gpr_write(index, val);
        }
    }

    pub fn hi(&self) -> u64 {
        self.hi
    }

    pub fn set_hi(&mut self, v: u64) {
        self.hi = v;
    }

    pub fn lo(&self) -> u64 {
        self.lo
    }

    pub fn set_lo(&mut self, v: u64) {
        self.lo = v;
    }

    /// Address of the next instruction to be fetched
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Address of the last instruction executed (or being executed)
    pub fn current_pc(&self) -> u64 {
        self.current_pc
    }

    /// Force PC address. Any pending branch is forgotten.
    pub fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
        self.current_pc = pc;
        self.branch = BranchUnit::default();
        self.pc_override = None;
    }

    pub fn branch_state(&self) -> BranchUnit {
        self.branch
    }

    /// Raw 64-bit FPU register `i`, as seen with FR set
    pub fn fpr(&self, i: usize) -> u64 {
        self.fpu.dword(i, true)
    }

    pub fn set_fpr(&mut self, i: usize, v: u64) {
        self.fpu.set_dword(i, v, true);
    }

    /// FPU register `i` as a single precision value, honoring the current FR mode
    pub fn fpr_single(&self, i: usize) -> f32 {
        f32::from_bits(self.fpu.word(i, self.cp0.status.fr()))
    }

    pub fn set_fpr_single(&mut self, i: usize, v: f32) {
        let fr = self.cp0.status.fr();

        self.fpu.set_word(i, v.to_bits(), fr);
    }

    /// FPU register `i` as a double precision value, honoring the current FR mode
    pub fn fpr_double(&self, i: usize) -> f64 {
        f64::from_bits(self.fpu.dword(i, self.cp0.status.fr()))
    }

    pub fn set_fpr_double(&mut self, i: usize, v: f64) {
        let fr = self.cp0.status.fr();

        self.fpu.set_dword(i, v.to_bits(), fr);
    }

    pub fn fcr31(&self) -> Fcr31 {
        self.fpu.fcr31
    }

    pub fn set_fcr31(&mut self, fcr31: Fcr31) {
        self.fpu.fcr31 = fcr31;
    }

    pub fn cp0_reg(&self, i: usize) -> u64 {
        self.cp0.read(i)
    }

    /// Unchecked write to CP0 register `i`. Unlike MTC0 it can change read-only registers.
    pub fn set_cp0_reg(&mut self, i: usize, v: u64) {
        self.cp0.force(i, v);
    }

    pub fn status(&self) -> Status {
        self.cp0.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.cp0.status = status;
    }

    pub fn cause(&self) -> Cause {
        self.cp0.cause
    }

    pub fn ll_bit(&self) -> bool {
        self.ll_bit
    }

    /// Last exception taken, if any
    pub fn exception(&self) -> Option<Exception> {
        self.cp0.latched()
    }

    /// ExcCode of the last exception taken. Reset-class exceptions have no code.
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        self.exception().and_then(|e| e.code())
    }

    pub fn clear_exception(&mut self) {
        self.cp0.clear_latched();
    }

    /// Drive external interrupt line `line` (0-7, lines 0 and 1 are normally software
    /// interrupts and line 7 the timer)
    pub fn set_interrupt_line(&mut self, line: u8, active: bool) {
        self.cp0.set_line(line, active);
    }

    pub fn signal_nmi(&mut self) {
        self.cp0.signal(Exception::Nmi);
    }

    pub fn signal_soft_reset(&mut self) {
        self.cp0.signal(Exception::SoftReset);
    }

    pub fn signal_reset(&mut self) {
        self.cp0.signal(Exception::ColdReset);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_instruction(&self) -> Option<&DecodedInstruction> {
        self.last.as_ref()
    }

    /// Disassembly of the last decoded instruction
    pub fn disassemble_last(&self) -> Option<String> {
        self.last.as_ref().map(disassemble)
    }

    /// 64-bit operations are legal in the current mode
    pub fn operation_64(&self) -> bool {
        self.cp0.operation_64()
    }

    /// Addresses are truncated to 32 bits (and sign extended) unless 64-bit addressing is
    /// enabled for the current mode
    fn mask_address(&self, addr: u64) -> u64 {
        if self.cp0.addressing_64() {
            addr
        } else {
            se32(addr as u32)
        }
    }

    fn is_reserved(&self, i: &DecodedInstruction) -> bool {
        let op64 = self.cp0.operation_64();

        (i.has(ExecFlags::RESERVED_32) && !op64) || (i.has(ExecFlags::RESERVED_64) && op64)
    }

    /// Fetch the instruction word at `pc`. Returns `None` if an exception was raised instead.
    fn fetch(&mut self, pc: u64) -> MipsResult<Option<u32>> {
        if pc & 3 != 0 {
            self.cp0
                .raise(Exception::address(ExceptionCode::AddressErrorLoad, pc));
            return Ok(None);
        }

        let paddr = map::translate(pc, self.config.mmu_bypass)?;

        let Some(mem) = self.fetch_memory() else {
            return Err(MipsError::Unattached);
        };

        match mem.load::<u32>(paddr) {
            Some(w) => Ok(Some(w)),
            None => {
                self.cp0
                    .raise(Exception::general(ExceptionCode::InstructionBusError));
                Ok(None)
            }
        }
    }

    /// Update CP0 for exception `e` and move the PC to the exception vector
    fn enter_exception(&mut self, e: Exception, in_delay_slot: bool) {
        self.ll_bit = false;

        let vector = self.cp0.service(e, self.current_pc, in_delay_slot);

        debug!(
            "Exception {:?} at 0x{:016x} (delay slot: {}), jumping to 0x{:016x}",
            e, self.current_pc, in_delay_slot, vector
        );

        self.pc = vector;
        self.branch = BranchUnit::default();
        self.pc_override = None;
    }

    /// Run a single instruction, including exception servicing. Errors are fatal: they
    /// report a host-level problem (no memory attached, unsupported address space), not a guest
    /// exception.
    pub fn step(&mut self) -> MipsResult<()> {
        if self.fetch_memory().is_none() || self.data_memory().is_none() {
            error!("Attempted to step the CPU without memory attached");
            return Err(MipsError::Unattached);
        }

        self.cycles += 1;
        self.cp0.tick();

        let branch = std::mem::take(&mut self.branch);
        let in_delay_slot = branch.delay_slot;
        let pc = self.pc;

        self.current_pc = pc;

        if let Some(e) = self.cp0.asynchronous(in_delay_slot) {
            self.enter_exception(e, in_delay_slot);
            return Ok(());
        }

        if let Some(word) = self.fetch(pc)? {
            let inst = isa::decode(&R4300I, word, pc);

            self.tracer.pc_change(pc);
            self.last = Some(inst);

            if self.config.trace_instructions {
                trace!("{:016x}: {:08x} {}", pc, word, disassemble(&inst));
            }

            if branch.nullify_next {
                // Delay slot of a likely branch not taken
            } else if !inst.is_valid() || self.is_reserved(&inst) {
                self.cp0
                    .raise(Exception::general(ExceptionCode::ReservedInstruction));
            } else {
                match self.calls.handler(inst.op) {
                    Some(handler) => handler(self, &inst)?,
                    None => {
                        error!("No handler for {:?}", inst);
                        return Err(MipsError::UnboundOpcode(inst.op.mnemonic));
                    }
                }
            }
        }

        if let Some(e) = self.cp0.take_pending() {
            self.enter_exception(e, in_delay_slot);
        } else if let Some(target) = self.pc_override.take() {
            self.pc = target;
        } else if in_delay_slot && (branch.take || branch.unconditional) {
            self.pc = branch.target;
        } else {
            self.pc = pc.wrapping_add(4);
        }

        Ok(())
    }

    /// Run `count` instructions
    pub fn run(&mut self, count: u64) -> MipsResult<()> {
        for _ in 0..count {
            self.step()?;
        }

        Ok(())
    }
}

/// Build the R4300i call table. Every opcode reachable through the decode table must end up
/// with a handler.
fn call_table() -> MipsResult<CallTable<Cpu>> {
    CallTable::new("r4300i")
        .bind(alu::add, &[&ADD, &ADDU, &ADDI, &ADDIU])
        .bind(alu::dadd, &[&DADD, &DADDU, &DADDI, &DADDIU])
        .bind(alu::sub, &[&SUB, &SUBU])
        .bind(alu::dsub, &[&DSUB, &DSUBU])
        .bind(alu::logic, &[&AND, &OR, &XOR, &NOR, &ANDI, &ORI, &XORI])
        .bind(alu::set_less, &[&SLT, &SLTU, &SLTI, &SLTIU])
        .bind(alu::lui, &[&LUI])
        .bind(alu::shift, &[&SLL, &SRL, &SRA, &SLLV, &SRLV, &SRAV])
        .bind(
            alu::dshift,
            &[&DSLL, &DSRL, &DSRA, &DSLL32, &DSRL32, &DSRA32, &DSLLV, &DSRLV, &DSRAV],
        )
        .bind(alu::mult, &[&MULT, &MULTU])
        .bind(alu::dmult, &[&DMULT, &DMULTU])
        .bind(alu::div, &[&DIV, &DIVU])
        .bind(alu::ddiv, &[&DDIV, &DDIVU])
        .bind(alu::move_hilo, &[&MFHI, &MTHI, &MFLO, &MTLO])
        .bind(branch::jump, &[&J, &JAL, &JR, &JALR])
        .bind(branch::branch_fpu, &[&BC1F, &BC1T, &BC1FL, &BC1TL])
        .bind_family(branch::branch, &R4300I, Family::Branch)
        .bind(lsu::load_partial, &[&LWL, &LWR, &LDL, &LDR])
        .bind(lsu::store_partial, &[&SWL, &SWR, &SDL, &SDR])
        .bind_family(lsu::load, &R4300I, Family::Load)
        .bind_family(lsu::store, &R4300I, Family::Store)
        .bind_family(lsu::load_fpu, &R4300I, Family::LoadFpu)
        .bind_family(lsu::store_fpu, &R4300I, Family::StoreFpu)
        .bind_family(system::trap, &R4300I, Family::Trap)
        .bind(system::syscall, &[&SYSCALL])
        .bind(system::brk, &[&BREAK])
        .bind(system::nop, &[&SYNC, &CACHE])
        .bind(system::move_from, &[&MFC0, &DMFC0])
        .bind(system::move_to, &[&MTC0, &DMTC0])
        .bind(system::eret, &[&ERET])
        .bind_family(system::tlb, &R4300I, Family::Tlb)
        .bind(fpu::move_from, &[&MFC1, &DMFC1])
        .bind(fpu::move_to, &[&MTC1, &DMTC1])
        .bind(fpu::control_from, &[&CFC1])
        .bind(fpu::control_to, &[&CTC1])
        .bind(
            fpu::arith,
            &[&ADD_FMT, &SUB_FMT, &MUL_FMT, &DIV_FMT, &SQRT_FMT, &ABS_FMT, &MOV_FMT, &NEG_FMT],
        )
        .bind(
            fpu::convert,
            &[
                &ROUND_L, &TRUNC_L, &CEIL_L, &FLOOR_L, &ROUND_W, &TRUNC_W, &CEIL_W, &FLOOR_W,
                &CVT_S, &CVT_D, &CVT_W, &CVT_L,
            ],
        )
        .bind_family(fpu::compare, &R4300I, Family::Fpu)
        .finish(&R4300I)
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "PC: 0x{:016x}", self.pc)?;
        writeln!(f, "HI: 0x{:016x}    LO: 0x{:016x}", self.hi, self.lo)?;

        for i in 0..16 {
            writeln!(
                f,
                "{}: 0x{:016x}    {}: 0x{:016x}",
                GPR_NAMES[i],
                self.regs[i],
                GPR_NAMES[i + 16],
                self.regs[i + 16]
            )?;
        }

        writeln!(
            f,
            "SR: 0x{:08x}    CAUSE: 0x{:08x}    EPC: 0x{:016x}",
            self.cp0.status.0,
            self.cp0.cause.0,
            self.cp0.read(cp0::reg::EPC)
        )?;

        Ok(())
    }
}
