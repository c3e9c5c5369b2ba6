use super::cp0::reg;
use super::*;
use crate::isa::Assembler;
use crate::memory::Ram;
use crate::tracer::Recorder;
use std::sync::{Arc, Mutex};

/// Programs are loaded at this address (physical address 0x1000)
const BASE: u64 = 0xffff_ffff_8000_1000;
/// Scratch data area (physical address 0x8000)
const DATA: u64 = 0xffff_ffff_8000_8000;
/// General exception vector with BEV clear
const VECTOR: u64 = 0xffff_ffff_8000_0180;

const NOP: &str = "sll r0, r0, 0";

const A0: usize = 4;
const A1: usize = 5;
const A2: usize = 6;
const A3: usize = 7;
const V0: usize = 2;
const V1: usize = 3;
const T0: usize = 8;
const T1: usize = 9;
const RA: usize = 31;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

fn assemble(program: &[&str], base: u64) -> Vec<u8> {
    let asm = Assembler::new(&R4300I);

    program
        .iter()
        .enumerate()
        .flat_map(|(n, line)| {
            let pc = base + 4 * n as u64;

            asm.assemble(line, pc).unwrap().to_be_bytes()
        })
        .collect()
}

/// Kernel mode CPU with BEV clear and the FPU enabled, `program` loaded at `BASE` and the
/// PC pointing at it
fn cpu_with(program: &[&str]) -> Cpu {
    cpu_with_handler(program, &[NOP])
}

/// Same as `cpu_with`, also loading `handler` at the general exception vector
fn cpu_with_handler(program: &[&str], handler: &[&str]) -> Cpu {
    init_logging();

    let config = CoreConfig {
        reset_pc: BASE,
        trace_instructions: true,
        ..CoreConfig::default()
    };

    let mut ram = Ram::new(0x10000);

    ram.load_image(0x1000, &assemble(program, BASE)).unwrap();
    ram.load_image(0x180, &assemble(handler, VECTOR)).unwrap();

    let mut cpu = Cpu::new(config).unwrap();

    cpu.attach_memory(Box::new(ram));

    let mut status = Status(0);
    status.set_cu1(true);
    cpu.set_status(status);

    cpu
}

fn poke(cpu: &mut Cpu, addr: u64, bytes: &[u8]) {
    let mem = cpu.memory_mut().unwrap();

    assert!(mem.write_bytes(addr as u32 & 0x1fff_ffff, bytes));
}

fn peek(cpu: &Cpu, addr: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0; len];

    assert!(cpu.memory().unwrap().read_bytes(addr as u32 & 0x1fff_ffff, &mut buf));

    buf
}

#[test]
fn call_table_is_complete() {
    assert!(Cpu::new(CoreConfig::default()).is_ok());
}

#[test]
fn unattached() {
    let mut cpu = Cpu::new(CoreConfig::default()).unwrap();

    assert!(matches!(cpu.step(), Err(MipsError::Unattached)));
}

#[test]
fn reset_state() {
    let cpu = Cpu::new(CoreConfig::default()).unwrap();

    assert_eq!(cpu.pc(), 0xffff_ffff_bfc0_0000);
    assert!(cpu.status().erl());
    assert!(cpu.status().bev());
    assert_eq!(cpu.cp0_reg(reg::PRID), 0x0b00);
    assert_eq!(cpu.cp0_reg(reg::RANDOM), 31);
}

#[test]
fn add() {
    let mut cpu = cpu_with(&["add v0, a0, a1", "add v1, a2, a3"]);

    cpu.set_reg(A0, 1);
    cpu.set_reg(A1, 4);
    cpu.set_reg(A2, 0x7fff_ffff);
    cpu.set_reg(A3, 2);

    cpu.step().unwrap();
    assert_eq!(cpu.reg(V0), 5);
    assert_eq!(cpu.exception(), None);

    cpu.step().unwrap();
    // No writeback on overflow
    assert_eq!(cpu.reg(V1), 0);
    assert_eq!(cpu.exception_code(), Some(ExceptionCode::Overflow));
    assert_eq!(cpu.pc(), VECTOR);
    assert_eq!(cpu.cp0_reg(reg::EPC), BASE + 4);
    assert!(cpu.status().exl());
    assert!(!cpu.cause().bd());
}

#[test]
fn unsigned_add_wraps() {
    let mut cpu = cpu_with(&["addu v0, a0, a1", "addiu v1, a0, 1", "daddiu t0, a0, 1"]);

    cpu.set_reg(A0, 0x7fff_ffff);
    cpu.set_reg(A1, 2);

    cpu.run(3).unwrap();

    assert_eq!(cpu.reg(V0), 0xffff_ffff_8000_0001);
    assert_eq!(cpu.reg(V1), 0xffff_ffff_8000_0000);
    assert_eq!(cpu.reg(T0), 0x8000_0000);
    assert_eq!(cpu.exception(), None);
}

#[test]
fn r0_is_hardwired() {
    let mut cpu = cpu_with(&["addiu r0, r0, 5", "or v0, r0, r0"]);

    cpu.run(2).unwrap();

    assert_eq!(cpu.reg(0), 0);
    assert_eq!(cpu.reg(V0), 0);
}

#[test]
fn logic_and_compare() {
    let mut cpu = cpu_with(&[
        "ori v0, r0, 0xff00",
        "andi v1, v0, 0x0ff0",
        "nor t0, r0, r0",
        "slti t1, t0, 0",
        "sltiu a2, t0, 0xffff",
        "lui a3, 0x8000",
    ]);

    cpu.run(6).unwrap();

    assert_eq!(cpu.reg(V0), 0xff00);
    assert_eq!(cpu.reg(V1), 0x0f00);
    assert_eq!(cpu.reg(T0), u64::MAX);
    assert_eq!(cpu.reg(T1), 1);
    // -1 is not below 0xffff_ffff_ffff_ffff
    assert_eq!(cpu.reg(A2), 0);
    assert_eq!(cpu.reg(A3), 0xffff_ffff_8000_0000);
}

#[test]
fn shifts() {
    let mut cpu = cpu_with(&[
        "sll v0, a0, 4",
        "srl v1, a0, 4",
        "sra t0, a0, 4",
        "srav t1, a0, a1",
        "dsll32 a2, a0, 4",
        "dsrav a3, a3, a1",
    ]);

    cpu.set_reg(A0, 0xffff_ffff_8765_4321);
    // Only the low 5 bits are used by srav, low 6 bits by dsrav
    cpu.set_reg(A1, 0x44);
    cpu.set_reg(A3, 0x8000_0000_0000_0000);

    cpu.run(6).unwrap();

    assert_eq!(cpu.reg(V0), 0x0000_0000_7654_3210);
    assert_eq!(cpu.reg(V1), 0x0000_0000_0876_5432);
    assert_eq!(cpu.reg(T0), 0xffff_ffff_f876_5432);
    assert_eq!(cpu.reg(T1), 0xffff_ffff_f876_5432);
    assert_eq!(cpu.reg(A2), 0x7654_3210_0000_0000);
    assert_eq!(cpu.reg(A3), 0xf800_0000_0000_0000);
}

#[test]
fn dmultu() {
    let mut cpu = cpu_with(&["dmultu a0, a1", "mflo v0", "mfhi v1"]);

    cpu.set_reg(A0, 1234567890123456789);
    cpu.set_reg(A1, 987654321098765432);

    cpu.run(3).unwrap();

    assert_eq!(cpu.lo(), 0x85fc_33f2_3d8f_45d8);
    assert_eq!(cpu.hi(), 0x00ea_d56d_b955_3d9a);
    assert_eq!(cpu.reg(V0), 0x85fc_33f2_3d8f_45d8);
    assert_eq!(cpu.reg(V1), 0x00ea_d56d_b955_3d9a);
}

#[test]
fn mult() {
    let mut cpu = cpu_with(&["mult a0, a1", "multu a0, a1"]);

    cpu.set_reg(A0, (-3i64) as u64);
    cpu.set_reg(A1, 0x4000_0000);

    cpu.step().unwrap();
    // -3 * 2^30 = 0xffff_ffff_4000_0000
    assert_eq!(cpu.hi(), 0xffff_ffff_ffff_ffff);
    assert_eq!(cpu.lo(), 0x0000_0000_4000_0000);

    cpu.step().unwrap();
    // 0xffff_fffd * 2^30 = 0x3fff_ffff_4000_0000
    assert_eq!(cpu.hi(), 0x0000_0000_3fff_ffff);
    assert_eq!(cpu.lo(), 0x0000_0000_4000_0000);
}

#[test]
fn divide_by_zero() {
    let mut cpu = cpu_with(&["div a0, r0", "div a1, r0", "divu a0, r0", "ddiv a2, a3"]);

    cpu.set_reg(A0, 7);
    cpu.set_reg(A1, (-7i64) as u64);
    cpu.set_reg(A2, i64::MIN as u64);
    cpu.set_reg(A3, u64::MAX);

    cpu.step().unwrap();
    assert_eq!(cpu.lo(), u64::MAX);
    assert_eq!(cpu.hi(), 7);

    cpu.step().unwrap();
    assert_eq!(cpu.lo(), 1);
    assert_eq!(cpu.hi(), (-7i64) as u64);

    cpu.step().unwrap();
    assert_eq!(cpu.lo(), u64::MAX);
    assert_eq!(cpu.hi(), 7);

    // i64::MIN / -1
    cpu.step().unwrap();
    assert_eq!(cpu.lo(), i64::MIN as u64);
    assert_eq!(cpu.hi(), 0);

    assert_eq!(cpu.exception(), None);
}

#[test]
fn branch_delay_slot() {
    let target = BASE + 0x100;
    let beq = format!("beq r0, r0, 0x{:x}", target);

    let mut cpu = cpu_with(&[&beq, "addiu v0, r0, 1", "addiu v1, r0, 2"]);

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), BASE + 4);
    assert!(cpu.branch_state().delay_slot);

    // The delay slot always executes
    cpu.step().unwrap();
    assert_eq!(cpu.reg(V0), 1);
    assert_eq!(cpu.pc(), target);
    assert_eq!(cpu.reg(V1), 0);
}

#[test]
fn likely_branch_nullifies_delay_slot() {
    let target = BASE + 0x100;

    for (branch, executed) in [("bnel", false), ("bne", true)] {
        let b = format!("{} a0, a0, 0x{:x}", branch, target);

        let mut cpu = cpu_with(&[&b, "addiu v0, r0, 1", "addiu v1, r0, 2"]);

        cpu.set_reg(A0, 0x1234);

        cpu.run(3).unwrap();

        assert_eq!(cpu.reg(V0) == 1, executed, "{}", branch);
        assert_eq!(cpu.reg(V1), 2, "{}", branch);
        assert_eq!(cpu.pc(), BASE + 12);
    }
}

#[test]
fn likely_branch_taken() {
    let target = BASE + 0x100;
    let b = format!("beql a0, a0, 0x{:x}", target);

    let mut cpu = cpu_with(&[&b, "addiu v0, r0, 1"]);

    cpu.run(2).unwrap();

    assert_eq!(cpu.reg(V0), 1);
    assert_eq!(cpu.pc(), target);
}

#[test]
fn link_branches() {
    let target = BASE + 0x40;
    let jal = format!("jal 0x{:x}", target);
    let bltzal = format!("bltzal a0, 0x{:x}", target);

    let mut cpu = cpu_with(&[&jal, NOP]);

    cpu.run(2).unwrap();
    assert_eq!(cpu.reg(RA), BASE + 8);
    assert_eq!(cpu.pc(), target);

    // Not taken, RA is still written
    let mut cpu = cpu_with(&[&bltzal, NOP]);

    cpu.set_reg(A0, 5);
    cpu.run(2).unwrap();
    assert_eq!(cpu.reg(RA), BASE + 8);
    assert_eq!(cpu.pc(), BASE + 8);

    let mut cpu = cpu_with(&["jalr t0, a0", NOP]);

    cpu.set_reg(A0, target);
    cpu.run(2).unwrap();
    assert_eq!(cpu.reg(T0), BASE + 8);
    assert_eq!(cpu.pc(), target);
}

#[test]
fn reserved_instruction_is_idempotent() {
    let mut cpu = cpu_with(&["dadd v0, a0, a1", NOP]);

    // User mode without UX: 64-bit operations are reserved
    let mut status = cpu.status();
    status.set_ksu(2);
    cpu.set_status(status);

    cpu.set_reg(A0, 1);
    cpu.set_reg(A1, 2);

    cpu.step().unwrap();
    assert_eq!(cpu.exception_code(), Some(ExceptionCode::ReservedInstruction));
    assert_eq!(cpu.reg(V0), 0);
    assert_eq!(cpu.pc(), VECTOR);
    assert_eq!(cpu.cp0_reg(reg::EPC), BASE);

    // Stepping again runs the handler, not the offending instruction
    cpu.step().unwrap();
    assert_eq!(cpu.reg(V0), 0);
    assert_eq!(cpu.pc(), VECTOR + 4);
    assert_eq!(cpu.exception_code(), Some(ExceptionCode::ReservedInstruction));

    cpu.clear_exception();
    assert_eq!(cpu.exception(), None);
}

#[test]
fn invalid_opcode() {
    let mut cpu = cpu_with(&[NOP]);

    // Primary opcode 0x13 (COP3) doesn't exist
    poke(&mut cpu, BASE, &0x4c00_0000u32.to_be_bytes());

    cpu.step().unwrap();
    assert_eq!(cpu.exception_code(), Some(ExceptionCode::ReservedInstruction));
}

#[test]
fn loads_and_stores() {
    let mut cpu = cpu_with(&[
        "lb v0, 0(a0)",
        "lbu v1, 0(a0)",
        "lh t0, 2(a0)",
        "lwu t1, 0(a0)",
        "ld a2, 0(a0)",
        "sh a1, 0x12(a0)",
        "sd a1, 0x18(a0)",
    ]);

    poke(&mut cpu, DATA, &[0x80, 0x11, 0xff, 0x33, 0x44, 0x55, 0x66, 0x77]);
    cpu.set_reg(A0, DATA);
    cpu.set_reg(A1, 0x0102_0304_0506_0708);

    cpu.run(7).unwrap();

    assert_eq!(cpu.reg(V0), 0xffff_ffff_ffff_ff80);
    assert_eq!(cpu.reg(V1), 0x80);
    assert_eq!(cpu.reg(T0), 0xffff_ffff_ffff_ff33);
    assert_eq!(cpu.reg(T1), 0x8011_ff33);
    assert_eq!(cpu.reg(A2), 0x8011_ff33_4455_6677);
    assert_eq!(peek(&cpu, DATA + 0x12, 2), [0x07, 0x08]);
    assert_eq!(peek(&cpu, DATA + 0x18, 8), [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn unaligned_word_access() {
    let mut cpu = cpu_with(&[
        "lwl t0, 1(a0)",
        "lwr t0, 4(a0)",
        "swl t1, 0x11(a0)",
        "swr t1, 0x14(a0)",
    ]);

    poke(&mut cpu, DATA, &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
    cpu.set_reg(A0, DATA);
    cpu.set_reg(T0, 0xaabb_ccdd);
    cpu.set_reg(T1, 0xdead_beef);

    cpu.step().unwrap();
    assert_eq!(cpu.reg(T0), 0x1122_33dd);

    cpu.step().unwrap();
    assert_eq!(cpu.reg(T0), 0x1122_3344);

    cpu.run(2).unwrap();
    assert_eq!(
        peek(&cpu, DATA + 0x10, 8),
        [0x00, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00]
    );
}

#[test]
fn unaligned_doubleword_access() {
    let mut cpu = cpu_with(&["ldl t0, 3(a0)", "ldr t0, 10(a0)", "sdl t0, 0x13(a0)", "sdr t0, 0x1a(a0)"]);

    poke(&mut cpu, DATA, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    cpu.set_reg(A0, DATA);

    cpu.run(2).unwrap();
    assert_eq!(cpu.reg(T0), 0x0304_0506_0708_090a);

    cpu.run(2).unwrap();
    assert_eq!(
        peek(&cpu, DATA + 0x10, 16),
        [0, 0, 0, 3, 4, 5, 6, 7, 8, 9, 10, 0, 0, 0, 0, 0]
    );
}

#[test]
fn address_error() {
    let mut cpu = cpu_with(&["lw t0, 2(a0)", NOP]);

    cpu.set_reg(A0, DATA);
    cpu.set_reg(T0, 0x55);

    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::AddressErrorLoad));
    assert_eq!(cpu.cp0_reg(reg::BAD_VADDR), DATA + 2);
    assert_eq!(cpu.reg(T0), 0x55);

    let mut cpu = cpu_with(&["sh t0, 1(a0)", NOP]);

    cpu.set_reg(A0, DATA);
    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::AddressErrorStore));
    assert_eq!(cpu.cp0_reg(reg::BAD_VADDR), DATA + 1);
}

#[test]
fn bus_error() {
    let mut cpu = cpu_with(&["lw t0, 0(a0)"]);

    // Past the end of the 64KB of RAM
    cpu.set_reg(A0, 0xffff_ffff_8010_0000);
    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::DataBusError));
}

#[test]
fn mapped_segment_is_unsupported() {
    let mut cpu = cpu_with(&["lw t0, 0(a0)"]);

    cpu.set_reg(A0, 0x1000);

    assert!(matches!(cpu.step(), Err(MipsError::Unsupported(_))));
}

#[test]
fn load_linked() {
    let mut cpu = cpu_with(&["ll t0, 0(a0)", "sc t1, 0(a0)", "sc t1, 4(a0)"]);

    cpu.set_reg(A0, DATA);
    cpu.set_reg(T1, 0x1234_5678);

    cpu.step().unwrap();
    assert!(cpu.ll_bit());
    assert_eq!(cpu.cp0_reg(reg::LL_ADDR), 0x800);

    cpu.step().unwrap();
    assert_eq!(cpu.reg(T1), 1);
    assert_eq!(peek(&cpu, DATA, 4), [0x12, 0x34, 0x56, 0x78]);

    // Still armed: stores 1
    cpu.step().unwrap();
    assert_eq!(peek(&cpu, DATA + 4, 4), [0, 0, 0, 1]);
}

#[test]
fn store_conditional_fails_without_link() {
    let mut cpu = cpu_with(&["sc t1, 0(a0)"]);

    cpu.set_reg(A0, DATA);
    cpu.set_reg(T1, 0x1234_5678);

    cpu.step().unwrap();

    assert_eq!(cpu.reg(T1), 0);
    assert_eq!(peek(&cpu, DATA, 4), [0, 0, 0, 0]);
}

#[test]
fn exception_in_delay_slot() {
    let target = BASE + 0x100;
    let beq = format!("beq r0, r0, 0x{:x}", target);

    let mut cpu = cpu_with_handler(&[&beq, "syscall"], &["eret"]);

    cpu.run(2).unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::Syscall));
    assert_eq!(cpu.pc(), VECTOR);
    // EPC points at the branch
    assert_eq!(cpu.cp0_reg(reg::EPC), BASE);
    assert!(cpu.cause().bd());
    assert!(cpu.status().exl());

    // ERET goes straight back to the branch, no delay slot
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), BASE);
    assert!(!cpu.status().exl());
}

#[test]
fn bootstrap_vectors() {
    let mut cpu = cpu_with(&["break"]);

    let mut status = cpu.status();
    status.set_bev(true);
    cpu.set_status(status);

    let recorder = Arc::new(Mutex::new(Recorder::default()));
    cpu.set_tracer(Box::new(recorder.clone()));

    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::Breakpoint));
    assert_eq!(cpu.pc(), 0xffff_ffff_bfc0_0380);
    assert_eq!(recorder.lock().unwrap().breaks, vec![BASE]);
}

#[test]
fn traps() {
    let mut cpu = cpu_with(&["teq a0, a1", "tgei a0, 4", "tltu a0, a1"]);

    cpu.set_reg(A0, 3);
    cpu.set_reg(A1, u64::MAX);

    // 3 != -1, 3 < 4: neither traps
    cpu.run(2).unwrap();
    assert_eq!(cpu.exception(), None);

    // 3 < 0xffff_ffff_ffff_ffff unsigned
    cpu.step().unwrap();
    assert_eq!(cpu.exception_code(), Some(ExceptionCode::Trap));
}

#[test]
fn timer_interrupt() {
    let mut cpu = cpu_with(&[NOP, NOP, NOP, NOP, NOP, NOP]);

    let mut status = cpu.status();
    status.set_ie(true);
    status.set_im(0x80);
    cpu.set_status(status);
    cpu.set_cp0_reg(reg::COMPARE, 5);

    cpu.run(4).unwrap();
    assert_eq!(cpu.pc(), BASE + 16);
    assert_eq!(cpu.exception(), None);

    cpu.step().unwrap();
    assert_eq!(cpu.exception(), Some(Exception::Interrupt));
    assert_eq!(cpu.pc(), VECTOR);
    assert_eq!(cpu.cp0_reg(reg::EPC), BASE + 16);
    assert_eq!(cpu.cause().ip(), 0x80);
}

#[test]
fn injected_count_wraps() {
    let mut cpu = cpu_with(&[NOP, NOP]);

    cpu.set_cp0_reg(reg::COUNT, u64::MAX);
    cpu.step().unwrap();
    assert_eq!(cpu.cp0_reg(reg::COUNT), 0);

    cpu.step().unwrap();
    assert_eq!(cpu.cp0_reg(reg::COUNT), 1);
}

#[test]
fn masked_interrupt() {
    let mut cpu = cpu_with(&[NOP, NOP]);

    let mut status = cpu.status();
    status.set_ie(true);
    status.set_im(0x04);
    cpu.set_status(status);

    cpu.set_interrupt_line(3, true);
    cpu.step().unwrap();
    assert_eq!(cpu.exception(), None);

    cpu.set_interrupt_line(2, true);
    cpu.step().unwrap();
    assert_eq!(cpu.exception(), Some(Exception::Interrupt));
}

#[test]
fn reset_signals() {
    let mut cpu = cpu_with(&[NOP]);

    cpu.signal_nmi();
    cpu.signal_reset();
    cpu.step().unwrap();

    assert_eq!(cpu.exception(), Some(Exception::ColdReset));
    assert_eq!(cpu.exception_code(), None);
    assert_eq!(cpu.pc(), 0xffff_ffff_bfc0_0000);
    assert_eq!(cpu.cp0_reg(reg::ERROR_EPC), BASE);
    assert!(cpu.status().erl());
    assert!(cpu.status().bev());
}

#[test]
fn cop0_moves() {
    let mut cpu = cpu_with(&["mtc0 a0, c11", "mfc0 v0, c11", "mtc0 a0, c13", "mfc0 v1, c13", "mfc0 t0, c15"]);

    cpu.set_reg(A0, 0x8000_0300);

    cpu.run(5).unwrap();

    assert_eq!(cpu.reg(V0), 0xffff_ffff_8000_0300);
    // Only IP0/IP1 are writable in Cause
    assert_eq!(cpu.reg(V1), 0x300);
    assert_eq!(cpu.reg(T0), 0x0b00);
}

#[test]
fn cop0_unusable_in_user_mode() {
    let mut cpu = cpu_with(&["mfc0 v0, c12"]);

    let mut status = cpu.status();
    status.set_ksu(2);
    cpu.set_status(status);

    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::CoprocessorUnusable));
    assert_eq!(cpu.cause().ce(), 0);
}

#[test]
fn tlb_maintenance() {
    let mut cpu = cpu_with(&["tlbwi", "tlbp", "tlbr"]);

    cpu.set_cp0_reg(reg::INDEX, 5);
    cpu.set_cp0_reg(reg::ENTRY_HI, 0x0040_2000 | 7);
    cpu.set_cp0_reg(reg::ENTRY_LO0, 0x41);
    cpu.set_cp0_reg(reg::ENTRY_LO1, 0x81);

    cpu.step().unwrap();

    cpu.set_cp0_reg(reg::INDEX, 0);
    cpu.step().unwrap();
    assert_eq!(cpu.cp0_reg(reg::INDEX), 5);

    cpu.set_cp0_reg(reg::ENTRY_HI, 0);
    cpu.step().unwrap();
    assert_eq!(cpu.cp0_reg(reg::ENTRY_HI), 0x0040_2007);
    assert_eq!(cpu.cp0_reg(reg::ENTRY_LO0), 0x41);
    assert_eq!(cpu.cp0_reg(reg::ENTRY_LO1), 0x81);
}

#[test]
fn fpu_arithmetic() {
    let mut cpu = cpu_with(&["add.d f0, f2, f4", "mul.s f6, f8, f10", "c.lt.d f2, f4", "cvt.w.d f12, f14"]);

    cpu.set_fpr_double(2, 1.5);
    cpu.set_fpr_double(4, 2.25);
    cpu.set_fpr_single(8, 3.0);
    cpu.set_fpr_single(10, -0.5);
    cpu.set_fpr_double(14, 2.5);

    cpu.run(4).unwrap();

    assert_eq!(cpu.fpr_double(0), 3.75);
    assert_eq!(cpu.fpr_single(6), -1.5);
    assert!(cpu.fcr31().condition());
    // Round to nearest even
    assert_eq!(cpu.fpr(12) as u32, 2);
    assert_eq!(cpu.fcr31().flags(), fpu::cause::INEXACT);
}

#[test]
fn fpu_divide_by_zero() {
    let mut cpu = cpu_with(&["div.s f0, f2, f4", "div.s f6, f2, f4"]);

    cpu.set_fpr_single(2, 1.0);
    cpu.set_fpr_single(4, 0.0);

    cpu.step().unwrap();
    assert_eq!(cpu.fpr_single(0), f32::INFINITY);
    assert_eq!(cpu.fcr31().flags(), fpu::cause::DIV_ZERO);

    // Same thing with the exception enabled: trap and no writeback
    let mut fcr = cpu.fcr31();
    fcr.set_enables(fpu::cause::DIV_ZERO);
    cpu.set_fcr31(fcr);
    cpu.set_fpr_single(6, 42.0);

    cpu.step().unwrap();
    assert_eq!(cpu.exception_code(), Some(ExceptionCode::FloatingPoint));
    assert_eq!(cpu.fpr_single(6), 42.0);
    assert_eq!(cpu.fcr31().cause(), fpu::cause::DIV_ZERO);
}

#[test]
fn fpu_unimplemented_format() {
    let mut cpu = cpu_with(&["add.w f0, f2, f4"]);

    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::FloatingPoint));
    assert_eq!(cpu.fcr31().cause(), fpu::cause::UNIMPLEMENTED);
}

#[test]
fn fpu_unusable() {
    let mut cpu = cpu_with(&["add.d f0, f2, f4"]);

    cpu.set_status(Status(0));
    cpu.step().unwrap();

    assert_eq!(cpu.exception_code(), Some(ExceptionCode::CoprocessorUnusable));
    assert_eq!(cpu.cause().ce(), 1);
}

#[test]
fn fpu_branch() {
    let target = BASE + 0x100;
    let bc1t = format!("bc1t 0x{:x}", target);

    let mut cpu = cpu_with(&["c.eq.s f0, f2", &bc1t, NOP]);

    cpu.set_fpr_single(0, 1.0);
    cpu.set_fpr_single(2, 1.0);

    cpu.run(3).unwrap();

    assert_eq!(cpu.pc(), target);
}

#[test]
fn fpu_transfers() {
    let mut cpu = cpu_with(&[
        "mtc1 a0, f1",
        "mfc1 v0, f1",
        "ctc1 a1, fcr31",
        "cfc1 v1, fcr31",
        "cfc1 t0, fcr0",
        "sdc1 f0, 0(a2)",
        "lwc1 f3, 4(a2)",
    ]);

    cpu.set_reg(A0, 0x8000_0001);
    cpu.set_reg(A1, 0x0080_0003);
    cpu.set_reg(A2, DATA);

    cpu.run(7).unwrap();

    assert_eq!(cpu.reg(V0), 0xffff_ffff_8000_0001);
    assert_eq!(cpu.reg(V1), 0x0080_0003);
    assert_eq!(cpu.reg(T0), 0x0a00);
    // FR = 0: f1 is the upper half of f0
    assert_eq!(peek(&cpu, DATA, 8), [0x80, 0, 0, 1, 0, 0, 0, 0]);
    assert_eq!(cpu.fpr(2), 0);
    assert_eq!(cpu.fcr31().rounding_mode(), 3);
}

#[test]
fn tracer_sees_fetches_and_accesses() {
    let mut cpu = cpu_with(&["lw t0, 0(a0)", "sw t0, 4(a0)"]);
    let recorder = Arc::new(Mutex::new(Recorder::default()));

    cpu.set_reg(A0, DATA);
    poke(&mut cpu, DATA, &[0, 0, 0, 7]);
    cpu.set_tracer(Box::new(recorder.clone()));
    cpu.run(2).unwrap();

    let r = recorder.lock().unwrap();

    assert_eq!(r.pcs, vec![BASE, BASE + 4]);
    assert_eq!(r.reads, vec![DATA]);
    assert_eq!(r.writes, vec![DATA + 4]);
    assert_eq!(r.gpr_writes, vec![(T0, 7)]);
    assert!(r.branches.is_empty());
    assert_eq!(cpu.disassemble_last().unwrap(), "sw t0, 4(a0)");
    assert_eq!(cpu.cycles(), 2);
}

#[test]
fn tracer_sees_register_writes_and_branches() {
    let skip = BASE + 0x20;
    let beq = format!("beq t0, r0, 0x{:x}", skip);
    let bne = format!("bne t0, r0, 0x{:x}", skip);
    let jal = format!("jal 0x{:x}", BASE);

    let mut cpu = cpu_with(&["addiu t0, r0, 3", &beq, NOP, &bne, NOP, NOP, NOP, NOP, &jal, NOP]);
    let recorder = Arc::new(Mutex::new(Recorder::default()));

    cpu.set_tracer(Box::new(recorder.clone()));
    cpu.run(7).unwrap();

    assert_eq!(cpu.pc(), BASE);

    let r = recorder.lock().unwrap();

    // Writes to R0 are discarded and not reported
    assert_eq!(r.gpr_writes, vec![(T0, 3), (RA, skip + 8)]);
    assert_eq!(r.branches, vec![(skip, false), (skip, true), (BASE, true)]);
}
