use super::cp0::reg;
use super::*;
use crate::isa::Assembler;
use crate::tracer::Recorder;
use std::sync::{Arc, Mutex};

const T0: usize = 8;
const T1: usize = 9;
const T2: usize = 10;
const RA: usize = 31;

const LANES: [u16; 8] = [
    0x0011, 0x2233, 0x4455, 0x6677, 0x8899, 0xaabb, 0xccdd, 0xeeff,
];

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

/// Running RSP with `program` loaded at the start of IMEM
fn rsp_with(program: &[&str]) -> Rsp {
    rsp_at(program, 0)
}

fn rsp_at(program: &[&str], pc: u32) -> Rsp {
    init_logging();

    let asm = Assembler::new(&RSP);
    let mut rsp = Rsp::new().unwrap();

    for (n, line) in program.iter().enumerate() {
        let addr = pc.wrapping_add(4 * n as u32);
        let word = asm.assemble(line, u64::from(addr & PC_MASK)).unwrap();

        rsp.imem_mut().store::<u32>(addr, word);
    }

    rsp.set_trace_instructions(true);
    rsp.start(pc);

    rsp
}

fn lanes(v: Vector) -> [u16; 8] {
    v.lanes()
}

/// Save `v` and load it back, the way a savestate would
fn reload<T: serde::Serialize + serde::de::DeserializeOwned>(v: &T) -> T {
    let bytes = flexbuffers::to_vec(v).unwrap();

    flexbuffers::from_slice(&bytes).unwrap()
}

#[test]
fn call_table_is_complete() {
    assert!(Rsp::new().is_ok());
}

#[test]
fn starts_halted() {
    let mut rsp = Rsp::new().unwrap();

    assert!(rsp.is_halted());
    rsp.step().unwrap();
    assert_eq!(rsp.cycles(), 0);
    assert_eq!(rsp.pc(), 0);
}

#[test]
fn scalar_arithmetic_never_traps() {
    let mut rsp = rsp_with(&[
        "add t2, t0, t1",
        "sub t2, t1, t0",
        "addiu t0, r0, 0xffff",
        "slti t1, t0, 0",
        "sltiu t2, t0, 1",
    ]);

    rsp.set_reg(T0, 0x7fff_ffff);
    rsp.set_reg(T1, 1);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(T2), 0x8000_0000);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(T2), 0x8000_0002);

    rsp.run(3).unwrap();
    assert_eq!(rsp.reg(T0), 0xffff_ffff);
    assert_eq!(rsp.reg(T1), 1);
    assert_eq!(rsp.reg(T2), 0);
    assert!(!rsp.is_halted());
}

#[test]
fn r0_is_hardwired() {
    let mut rsp = rsp_with(&["addiu r0, r0, 5"]);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(0), 0);
}

#[test]
fn logic_and_shifts() {
    let mut rsp = rsp_with(&[
        "lui t0, 0x8000",
        "ori t0, t0, 0xf0f0",
        "sra t1, t0, 4",
        "srl t2, t0, 4",
        "andi t1, t1, 0xff00",
    ]);

    rsp.run(4).unwrap();
    assert_eq!(rsp.reg(T0), 0x8000_f0f0);
    assert_eq!(rsp.reg(T1), 0xf800_0f0f);
    assert_eq!(rsp.reg(T2), 0x0800_0f0f);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(T1), 0x0f00);
}

#[test]
fn jump_delay_slot() {
    let mut rsp = rsp_with(&[
        "jal 0x10",
        "addiu t0, r0, 1",
        "addiu t0, r0, 7",
        "addiu t0, r0, 7",
        "addiu t1, r0, 2",
        "break",
    ]);

    rsp.step().unwrap();
    assert_eq!(rsp.pc(), 4);
    assert_eq!(rsp.reg(RA), 8);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(T0), 1);
    assert_eq!(rsp.pc(), 0x10);

    rsp.run(10).unwrap();
    assert_eq!(rsp.reg(T0), 1);
    assert_eq!(rsp.reg(T1), 2);
    assert!(rsp.is_broke());
}

#[test]
fn branches() {
    let mut rsp = rsp_with(&[
        "bne t0, r0, 0x10",
        "addiu t1, r0, 1",
        "beq t0, r0, 0x10",
        "addiu t1, r0, 2",
        "bgezal t0, 0x0",
        "sll r0, r0, 0",
    ]);

    rsp.set_reg(T0, 5);

    // Taken
    rsp.run(2).unwrap();
    assert_eq!(rsp.reg(T1), 1);
    assert_eq!(rsp.pc(), 0x10);

    // bgezal links r31 whether or not it's taken
    rsp.run(2).unwrap();
    assert_eq!(rsp.reg(RA), 0x18);
    assert_eq!(rsp.pc(), 0);
}

#[test]
fn pc_wraps_around_imem() {
    let mut rsp = rsp_at(&["addiu t0, r0, 1", "addiu t1, r0, 2"], 0xffc);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(T0), 1);
    assert_eq!(rsp.pc(), 0);

    rsp.step().unwrap();
    assert_eq!(rsp.reg(T1), 2);
    assert_eq!(rsp.pc(), 4);
}

#[test]
fn jump_target_is_masked() {
    let mut rsp = rsp_with(&["jr t0", "sll r0, r0, 0"]);

    rsp.set_reg(T0, 0x0400_1234);
    rsp.run(2).unwrap();

    assert_eq!(rsp.pc(), 0x234);
}

#[test]
fn break_halts() {
    let mut rsp = rsp_with(&["break", "addiu t0, r0, 1"]);
    let recorder = Arc::new(Mutex::new(Recorder::default()));

    rsp.set_tracer(Box::new(recorder.clone()));
    rsp.sp_registers_mut().status.set_interrupt_on_break(true);

    rsp.step().unwrap();
    assert!(rsp.is_halted());
    assert!(rsp.is_broke());
    assert!(rsp.sp_registers().interrupt);
    assert_eq!(recorder.lock().unwrap().breaks, vec![0]);

    // Halted: nothing executes
    let pc = rsp.pc();
    assert_eq!(rsp.run(5).unwrap(), 0);
    rsp.step().unwrap();
    assert_eq!(rsp.pc(), pc);
    assert_eq!(rsp.reg(T0), 0);
    assert_eq!(rsp.cycles(), 1);

    rsp.start(4);
    assert!(!rsp.is_broke());
    rsp.step().unwrap();
    assert_eq!(rsp.reg(T0), 1);
}

#[test]
fn halt_through_status() {
    let mut rsp = rsp_with(&["addiu t0, r0, 2", "mtc0 t0, c4", "addiu t1, r0, 1"]);

    rsp.run(10).unwrap();

    assert!(rsp.is_halted());
    assert!(!rsp.is_broke());
    assert_eq!(rsp.reg(T1), 0);
}

#[test]
fn semaphore_through_mfc0() {
    let mut rsp = rsp_with(&["mfc0 t0, c7", "mfc0 t1, c7", "mtc0 r0, c7", "mfc0 t2, c7"]);

    rsp.run(4).unwrap();

    assert_eq!(rsp.reg(T0), 0);
    assert_eq!(rsp.reg(T1), 1);
    assert_eq!(rsp.reg(T2), 0);
    assert_eq!(rsp.sp_registers().peek(reg::SEMAPHORE), 1);
}

#[test]
fn invalid_instruction_is_ignored() {
    let mut rsp = rsp_with(&["addiu t0, r0, 1"]);

    // LD does not exist on the RSP
    rsp.imem_mut().store::<u32>(4, 0xdc00_0000);
    rsp.run(2).unwrap();

    assert_eq!(rsp.pc(), 8);
    assert!(!rsp.is_halted());
}

#[test]
fn scalar_loads_and_stores_wrap() {
    let mut rsp = rsp_with(&[
        "lw t0, 0xffe(r0)",
        "lh t1, 0(r0)",
        "lbu t2, 1(r0)",
        "sw t0, 0x10(r0)",
    ]);

    rsp.dmem_mut().copy_from(0xffe, &[0x12, 0x34, 0x86, 0x78]);

    rsp.run(4).unwrap();

    assert_eq!(rsp.reg(T0), 0x1234_8678);
    assert_eq!(rsp.reg(T1), 0xffff_8678);
    assert_eq!(rsp.reg(T2), 0x78);
    assert_eq!(rsp.dmem().load::<u32>(0x10), 0x1234_8678);
}

#[test]
fn vaddc_sets_carry() {
    let mut rsp = rsp_with(&["vaddc v2, v0, v1[e0]", "vadd v3, v4, v4[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes(LANES));
    rsp.set_vreg(1, Vector::from_lanes(LANES));

    rsp.step().unwrap();

    assert_eq!(
        lanes(rsp.vreg(2)),
        [0x0022, 0x4466, 0x88aa, 0xccee, 0x1132, 0x5576, 0x99ba, 0xddfe]
    );
    assert_eq!(rsp.vco().value(), 0x00f0);

    // vadd consumes the carries and clears VCO
    rsp.step().unwrap();
    assert_eq!(lanes(rsp.vreg(3)), [0, 0, 0, 0, 1, 1, 1, 1]);
    assert_eq!(rsp.vco().value(), 0);
}

#[test]
fn vsubc_sets_borrow_and_not_equal() {
    let mut rsp = rsp_with(&["vsubc v2, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([5, 5, 5, 0, 0xffff, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([3, 5, 6, 0, 0, 0, 0, 1]));

    rsp.step().unwrap();

    assert_eq!(lanes(rsp.vreg(2)), [2, 0, 0xffff, 0, 0xffff, 0, 0, 0xffff]);
    // Borrow in lanes 2 and 7, not equal in lanes 0, 2, 4 and 7
    assert_eq!(rsp.vco().value(), 0x9584);
}

#[test]
fn vadd_saturates() {
    let mut rsp = rsp_with(&["vadd v2, v0, v1[e0]", "vsub v3, v1, v0[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([0x7fff, 0x8000, 1, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([1, 0xffff, 1, 0, 0, 0, 0, 0]));
    rsp.set_vco(0x0004);

    rsp.step().unwrap();

    assert_eq!(lanes(rsp.vreg(2)), [0x7fff, 0x8000, 3, 0, 0, 0, 0, 0]);
    assert_eq!(
        lanes(rsp.accumulator().lo_vector()),
        [0x8000, 0x7fff, 3, 0, 0, 0, 0, 0]
    );

    rsp.step().unwrap();

    assert_eq!(lanes(rsp.vreg(3)), [0x8002, 0x7fff, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn vadd_of_zero_copies_to_accumulator() {
    let mut rsp = rsp_with(&["vadd v2, v0, v1[e0]"]);

    rsp.set_vreg(1, Vector::from_lanes(LANES));
    rsp.step().unwrap();

    assert_eq!(lanes(rsp.accumulator().lo_vector()), LANES);
    assert_eq!(rsp.vco().value(), 0);
}

#[test]
fn vmulu() {
    let mut rsp = rsp_with(&["vmulu v2, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes(LANES));
    rsp.set_vreg(
        1,
        Vector::from_lanes([
            0xffee, 0xddcc, 0xbbaa, 0x9988, 0x7766, 0x5544, 0x3322, 0x1100,
        ]),
    );
    rsp.set_vreg(2, Vector::from_lanes([0xffff; 8]));

    rsp.step().unwrap();

    let acc = rsp.accumulator();

    assert_eq!(lanes(rsp.vreg(2)), [0; 8]);
    assert_eq!(
        lanes(acc.hi_vector()),
        [0x0000, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff]
    );
    assert_eq!(
        lanes(acc.mid_vector()),
        [0x0000, 0xf6dd, 0xdb85, 0xadf9, 0x909f, 0xc733, 0xeb92, 0xfdbe]
    );
    assert_eq!(
        lanes(acc.lo_vector()),
        [0x7d9c, 0x0f48, 0x6ee4, 0x9c70, 0x97ec, 0x6158, 0xf8b4, 0x5e00]
    );
}

#[test]
fn vmacu() {
    let mut rsp = rsp_with(&["vmacu v2, v0, v0[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes(LANES));
    rsp.set_accumulator(Accumulator::from_parts(
        &Vector::default(),
        &Vector::from_lanes([
            0x0000, 0x0923, 0x247b, 0x5206, 0x6f60, 0x38cd, 0x146d, 0x0242,
        ]),
        &Vector::from_lanes([
            0x0266, 0x70ba, 0x111e, 0xe392, 0xe816, 0x1eaa, 0x874e, 0x2202,
        ]),
    ));

    rsp.step().unwrap();

    let acc = rsp.accumulator();

    assert_eq!(
        lanes(rsp.vreg(2)),
        [0x0000, 0x1246, 0x48f5, 0xffff, 0xffff, 0x719a, 0x28db, 0x0484]
    );
    assert_eq!(lanes(acc.hi_vector()), [0; 8]);
    assert_eq!(
        lanes(acc.mid_vector()),
        [0x0000, 0x1246, 0x48f5, 0xa40c, 0xdec2, 0x719a, 0x28db, 0x0484]
    );
    assert_eq!(
        lanes(acc.lo_vector()),
        [0x04a8, 0x9d0c, 0x9990, 0xfa34, 0xbef8, 0xe7dc, 0x74e0, 0x6604]
    );
}

#[test]
fn vmulf_rounds() {
    let mut rsp = rsp_with(&["vmulf v2, v0, v1[e8]", "vmulf v3, v4, v4[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([0x4000, 0xc000, 0, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([0x4000, 0, 0, 0, 0, 0, 0, 0]));
    // -1 * -1 overflows a signed fraction
    rsp.set_vreg(4, Vector::from_lanes([0x8000; 8]));

    rsp.step().unwrap();

    assert_eq!(lanes(rsp.vreg(2))[..2], [0x2000, 0xe000]);
    assert_eq!(rsp.accumulator().lo(0), 0x8000);

    rsp.step().unwrap();
    assert_eq!(lanes(rsp.vreg(3)), [0x7fff; 8]);
}

#[test]
fn vmudh_and_vsar() {
    let mut rsp = rsp_with(&[
        "vmudh v2, v0, v1[e0]",
        "vmadh v2, v0, v1[e0]",
        "vsar v3, v0, v0[e8]",
        "vsar v4, v0, v0[e9]",
        "vsar v5, v0, v0[e10]",
        "vsar v6, v0, v0[e0]",
    ]);

    rsp.set_vreg(0, Vector::from_lanes([2, 0x7fff, 0, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([3, 0x7fff, 0, 0, 0, 0, 0, 0]));
    rsp.set_vreg(6, Vector::from_lanes([1; 8]));

    rsp.run(2).unwrap();
    assert_eq!(lanes(rsp.vreg(2))[..2], [12, 0x7fff]);

    // 0x7fff * 0x7fff twice leaves 0x7ffe_0002_0000 in lane 1
    rsp.run(4).unwrap();
    assert_eq!(lanes(rsp.vreg(3))[..2], [0, 0x7ffe]);
    assert_eq!(lanes(rsp.vreg(4))[..2], [12, 0x0002]);
    assert_eq!(lanes(rsp.vreg(5))[..2], [0, 0]);
    // Only elements 8-10 select a slice
    assert_eq!(lanes(rsp.vreg(6)), [0; 8]);
}

#[test]
fn vmudn_and_vmadn_clamp_low() {
    let mut rsp = rsp_with(&["vmudn v2, v0, v1[e0]", "vmadn v3, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([0x8000, 0xffff, 2, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([0x4000, 0x7fff, 0xffff, 0, 0, 0, 0, 0]));

    rsp.step().unwrap();

    // Unsigned vs times signed vt, low halfword
    assert_eq!(lanes(rsp.vreg(2))[..3], [0x0000, 0x8001, 0xfffe]);

    rsp.step().unwrap();

    // Lane 1 is 0xfffd_0002, out of range: clamps positive
    assert_eq!(lanes(rsp.vreg(3))[..3], [0x0000, 0xffff, 0xfffc]);
}

#[test]
fn element_broadcast() {
    let mut rsp = rsp_with(&["vor v2, v0, v1[e3]", "vor v3, v0, v1[e13]"]);

    rsp.set_vreg(1, Vector::from_lanes(LANES));
    rsp.run(2).unwrap();

    assert_eq!(
        lanes(rsp.vreg(2)),
        [0x2233, 0x2233, 0x6677, 0x6677, 0xaabb, 0xaabb, 0xeeff, 0xeeff]
    );
    assert_eq!(lanes(rsp.vreg(3)), [0xaabb; 8]);
}

#[test]
fn logic_ops() {
    let mut rsp = rsp_with(&[
        "vand v2, v0, v1[e0]",
        "vnand v3, v0, v1[e0]",
        "vxor v4, v0, v1[e0]",
        "vnxor v5, v0, v1[e0]",
        "vnor v6, v0, v1[e0]",
    ]);

    rsp.set_vreg(0, Vector::from_lanes([0xff00; 8]));
    rsp.set_vreg(1, Vector::from_lanes([0x0ff0; 8]));
    rsp.run(5).unwrap();

    assert_eq!(lanes(rsp.vreg(2)), [0x0f00; 8]);
    assert_eq!(lanes(rsp.vreg(3)), [0xf0ff; 8]);
    assert_eq!(lanes(rsp.vreg(4)), [0xf0f0; 8]);
    assert_eq!(lanes(rsp.vreg(5)), [0x0f0f; 8]);
    assert_eq!(lanes(rsp.vreg(6)), [0x000f; 8]);
    assert_eq!(lanes(rsp.accumulator().lo_vector()), [0x000f; 8]);
}

#[test]
fn compare_and_merge() {
    let mut rsp = rsp_with(&[
        "vlt v2, v0, v1[e0]",
        "vge v3, v0, v1[e0]",
        "vmrg v4, v0, v1[e0]",
        "veq v5, v0, v0[e0]",
        "vne v6, v0, v1[e0]",
    ]);

    rsp.set_vreg(0, Vector::from_lanes([1, 2, 3, 4, 5, 6, 7, 8]));
    rsp.set_vreg(1, Vector::from_lanes([8, 7, 6, 5, 4, 3, 2, 1]));
    rsp.set_vco(0xffff);

    rsp.step().unwrap();
    assert_eq!(lanes(rsp.vreg(2)), [1, 2, 3, 4, 4, 3, 2, 1]);
    assert_eq!(rsp.vcc().value(), 0x000f);
    assert_eq!(rsp.vco().value(), 0);

    rsp.step().unwrap();
    assert_eq!(lanes(rsp.vreg(3)), [8, 7, 6, 5, 5, 6, 7, 8]);
    assert_eq!(rsp.vcc().value(), 0x00f0);

    rsp.step().unwrap();
    assert_eq!(lanes(rsp.vreg(4)), [8, 7, 6, 5, 5, 6, 7, 8]);

    rsp.step().unwrap();
    assert_eq!(rsp.vcc().value(), 0x00ff);

    rsp.step().unwrap();
    assert_eq!(rsp.vcc().value(), 0x00ff);
    assert_eq!(lanes(rsp.vreg(6)), [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn vlt_uses_not_equal_and_carry_on_ties() {
    let mut rsp = rsp_with(&["vlt v2, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([3; 8]));
    rsp.set_vreg(1, Vector::from_lanes([3; 8]));
    rsp.set_vco(0x0303);

    rsp.step().unwrap();

    assert_eq!(rsp.vcc().value(), 0x0003);
}

#[test]
fn vch_sets_clip_flags() {
    let mut rsp = rsp_with(&["vch v2, v0, v1[e8]", "vcl v3, v0, v1[e8]"]);

    rsp.set_vreg(0, Vector::from_lanes([100, (-100i16) as u16, 50, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([60, 0, 0, 0, 0, 0, 0, 0]));

    rsp.step().unwrap();

    assert_eq!(
        lanes(rsp.vreg(2)),
        [60, (-60i16) as u16, 50, 0, 0, 0, 0, 0]
    );
    assert_eq!(rsp.vcc().value(), 0x0102);
    assert_eq!(rsp.vco().value(), 0xff02);
    assert_eq!(rsp.vce().0, 0);

    // vcl reuses the flags left by vch then clears VCO and VCE
    rsp.step().unwrap();
    assert_eq!(rsp.vco().value(), 0);
    assert_eq!(rsp.vce().0, 0);
}

#[test]
fn vcr_clips_with_ones_complement() {
    let mut rsp = rsp_with(&["vcr v2, v0, v1[e8]"]);

    rsp.set_vreg(0, Vector::from_lanes([100, (-100i16) as u16, 50, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([60, 0, 0, 0, 0, 0, 0, 0]));

    rsp.step().unwrap();

    assert_eq!(
        lanes(rsp.vreg(2)),
        [60, !60u16, 50, 0, 0, 0, 0, 0]
    );
    assert_eq!(rsp.vcc().value(), 0x0102);
}

#[test]
fn vabs() {
    let mut rsp = rsp_with(&["vabs v2, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([0xffff, 0, 1, 0x8000, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([5, 5, 5, 0x8000, 0, 0, 0, 0]));

    rsp.step().unwrap();

    assert_eq!(lanes(rsp.vreg(2))[..4], [0xfffb, 0, 5, 0x7fff]);
    assert_eq!(rsp.accumulator().lo(3), 0x8000);
}

#[test]
fn vmov_copies_one_lane() {
    let mut rsp = rsp_with(&["vmov v2[e5], v1[e10]"]);

    rsp.set_vreg(1, Vector::from_lanes(LANES));
    rsp.set_vreg(2, Vector::from_lanes([0xffff; 8]));

    rsp.step().unwrap();

    assert_eq!(
        lanes(rsp.vreg(2)),
        [0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0x4455, 0xffff, 0xffff]
    );
    assert_eq!(lanes(rsp.accumulator().lo_vector()), [0x4455; 8]);
}

#[test]
fn reciprocal_sequences() {
    let mut rsp = rsp_with(&[
        "vrcp v1[e0], v0[e8]",
        "vrcph v2[e3], v0[e8]",
        "vrcph v3[e0], v5[e8]",
        "vrcpl v4[e1], v0[e8]",
        "vrcph v6[e2], v5[e8]",
        "vrsq v7[e0], v0[e9]",
    ]);

    rsp.set_vreg(0, Vector::from_lanes([17, 4, 0, 0, 0, 0, 0, 0]));

    rsp.step().unwrap();
    assert_eq!(rsp.vreg(1).lane(0), 0x8400);
    assert_eq!(lanes(rsp.accumulator().lo_vector()), [17; 8]);

    rsp.step().unwrap();
    assert_eq!(rsp.vreg(2).lane(3), 0x0787);
    assert!(rsp.div_state().double);

    // Double precision: high half 0 then low half 17
    rsp.run(2).unwrap();
    assert_eq!(rsp.vreg(4).lane(1), 0x8400);
    assert!(!rsp.div_state().double);

    rsp.step().unwrap();
    assert_eq!(rsp.vreg(6).lane(2), 0x0787);

    rsp.step().unwrap();
    assert_eq!(rsp.vreg(7).lane(0), 0xe000);
    assert_eq!(rsp.div_state().output, 0x3fff);
}

#[test]
fn vrcp_of_zero_saturates() {
    let mut rsp = rsp_with(&["vrcp v1[e0], v0[e8]", "vrcph v2[e0], v0[e8]"]);

    rsp.run(2).unwrap();

    assert_eq!(rsp.vreg(1).lane(0), 0xffff);
    assert_eq!(rsp.vreg(2).lane(0), 0x7fff);
}

#[test]
fn quantize() {
    let mut rsp = rsp_with(&["vmulq v2, v0, v1[e0]", "vmacq v3, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([0x100, 0xff00, 0, 0, 0, 0, 0, 0]));
    rsp.set_vreg(1, Vector::from_lanes([0x100, 0x100, 0, 0, 0, 0, 0, 0]));

    rsp.step().unwrap();

    // 0x10000 and -0x10000 + 31
    assert_eq!(lanes(rsp.vreg(2))[..2], [0x7ff0, 0x8000]);
    assert_eq!(rsp.accumulator().mid(1), 0x001f);
    assert_eq!(rsp.accumulator().hi(1), 0xffff);
    assert_eq!(rsp.accumulator().lo(0), 0);

    rsp.step().unwrap();
    // Positive lanes above 32 with bit 5 clear move towards zero
    assert_eq!(rsp.accumulator().mid(0), 0xffe0);
    assert_eq!(rsp.accumulator().hi(0), 0x0000);
}

#[test]
fn vrndp() {
    let mut rsp = rsp_with(&["vrndp v2, v1, v3[e0]", "vrndn v4, v0, v3[e0]"]);

    rsp.set_vreg(3, Vector::from_lanes([2; 8]));

    let mut acc = Accumulator::new();
    acc.set(0, 0x1_0000);
    acc.set(1, -0x1_0000);
    rsp.set_accumulator(acc);

    // Odd vs register: vt is added to the middle halfword
    rsp.step().unwrap();
    assert_eq!(rsp.accumulator().get(0), 0x3_0000);
    assert_eq!(rsp.accumulator().get(1), -0x1_0000);
    assert_eq!(rsp.vreg(2).lane(0), 3);

    rsp.step().unwrap();
    assert_eq!(rsp.accumulator().get(1), -0x1_0000 + 2);
    assert_eq!(rsp.vreg(4).lane(1), 0xffff);
}

#[test]
fn reserved_slot_writes_zero() {
    let mut rsp = rsp_with(&["vaddb v2, v0, v1[e0]"]);

    rsp.set_vreg(0, Vector::from_lanes([0xffff; 8]));
    rsp.set_vreg(1, Vector::from_lanes([2; 8]));
    rsp.set_vreg(2, Vector::from_lanes(LANES));

    rsp.step().unwrap();

    assert_eq!(lanes(rsp.vreg(2)), [0; 8]);
    assert_eq!(lanes(rsp.accumulator().lo_vector()), [1; 8]);
}

#[test]
fn cop2_moves() {
    let mut rsp = rsp_with(&[
        "mtc2 t0, v3[e2]",
        "mfc2 t1, v3[e2]",
        "mtc2 t0, v3[e15]",
        "mfc2 t2, v3[e15]",
    ]);

    rsp.set_reg(T0, 0x8001);
    rsp.run(2).unwrap();

    assert_eq!(rsp.vreg(3).byte(2), 0x80);
    assert_eq!(rsp.vreg(3).byte(3), 0x01);
    assert_eq!(rsp.reg(T1), 0xffff_8001);

    // Element 15 only takes the high byte, reads wrap around to byte 0
    rsp.run(2).unwrap();
    assert_eq!(rsp.vreg(3).byte(15), 0x80);
    assert_eq!(rsp.vreg(3).byte(0), 0x00);
    assert_eq!(rsp.reg(T2), 0xffff_8000);
}

#[test]
fn control_moves() {
    let mut rsp = rsp_with(&[
        "ctc2 t0, vc0",
        "cfc2 t1, vc0",
        "ctc2 t0, vc1",
        "ctc2 t0, vc2",
        "cfc2 t2, vc2",
    ]);

    rsp.set_reg(T0, 0x81ff);
    rsp.run(5).unwrap();

    assert_eq!(rsp.vco().value(), 0x81ff);
    assert_eq!(rsp.reg(T1), 0xffff_81ff);
    assert_eq!(rsp.vcc().value(), 0x81ff);
    assert_eq!(rsp.vce().0, 0xff);
    assert_eq!(rsp.reg(T2), 0xff);
}

#[test]
fn quad_load_and_store() {
    let mut rsp = rsp_with(&["lqv v1[e0], 0(r0)", "sqv v1[e0], 1(r0)", "lqv v2[e0], 0(t0)"]);
    let bytes: Vec<u8> = (0..16).collect();

    rsp.dmem_mut().copy_from(0, &bytes);
    rsp.set_reg(T0, 8);
    rsp.run(3).unwrap();

    assert_eq!(rsp.vreg(1).bytes()[..], bytes[..]);
    assert_eq!(rsp.dmem().as_slice()[16..32], bytes[..]);

    // Unaligned: only up to the end of the line
    assert_eq!(rsp.vreg(2).bytes()[..8], bytes[8..]);
    assert_eq!(rsp.vreg(2).bytes()[8..], [0; 8]);
}

#[test]
fn rest_load_fills_the_tail() {
    let mut rsp = rsp_with(&["lrv v1[e0], 0(t0)"]);
    let bytes: Vec<u8> = (0..16).collect();

    rsp.dmem_mut().copy_from(0, &bytes);
    rsp.set_reg(T0, 4);
    rsp.step().unwrap();

    assert_eq!(rsp.vreg(1).bytes()[12..], [0, 1, 2, 3]);
    assert_eq!(rsp.vreg(1).bytes()[..12], [0; 12]);
}

#[test]
fn small_loads_and_stores() {
    let mut rsp = rsp_with(&[
        "lsv v1[e4], 1(r0)",
        "ldv v2[e8], 1(r0)",
        "sbv v1[e5], 0(t0)",
        "slv v2[e8], 1(t0)",
    ]);

    rsp.dmem_mut().copy_from(0, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    rsp.set_reg(T0, 0x20);
    rsp.run(4).unwrap();

    assert_eq!(rsp.vreg(1).lane(2), 0x0203);
    assert_eq!(rsp.vreg(2).dword(1), 0x0809_0a0b_0000_0000);
    assert_eq!(rsp.dmem().byte(0x20), 0x03);
    assert_eq!(rsp.dmem().load::<u32>(0x24), 0x0809_0a0b);
}

#[test]
fn packed_load_and_store() {
    let mut rsp = rsp_with(&[
        "lpv v1[e0], 0(r0)",
        "luv v2[e0], 0(r0)",
        "spv v1[e0], 1(r0)",
        "suv v2[e0], 2(r0)",
    ]);

    rsp.dmem_mut().copy_from(0, &[0x80, 0x7f, 1, 2, 3, 4, 5, 0xff]);
    rsp.run(4).unwrap();

    assert_eq!(lanes(rsp.vreg(1))[..2], [0x8000, 0x7f00]);
    assert_eq!(lanes(rsp.vreg(2))[..2], [0x4000, 0x3f80]);
    assert_eq!(rsp.dmem().as_slice()[8..16], [0x80, 0x7f, 1, 2, 3, 4, 5, 0xff]);
    assert_eq!(rsp.dmem().as_slice()[16..24], [0x80, 0x7f, 1, 2, 3, 4, 5, 0xff]);
}

#[test]
fn transposed_load_and_store() {
    let mut rsp = rsp_with(&["ltv v8[e0], 0(r0)", "stv v8[e0], 2(r0)"]);
    let bytes: Vec<u8> = (0x40..0x50).collect();

    rsp.dmem_mut().copy_from(0, &bytes);
    rsp.run(2).unwrap();

    // Halfword n lands in lane n of register 8 + n
    for n in 0..8 {
        let expected = u16::from_be_bytes([bytes[2 * n], bytes[2 * n + 1]]);

        assert_eq!(rsp.vreg(8 + n).lane(n), expected);
    }

    assert_eq!(rsp.dmem().as_slice()[32..48], bytes[..]);
}

#[test]
fn wrapped_store() {
    let mut rsp = rsp_with(&["swv v1[e0], 0(t0)"]);

    rsp.set_vreg(1, Vector::from_bytes(core::array::from_fn(|i| i as u8)));
    rsp.set_reg(T0, 4);
    rsp.step().unwrap();

    let line = &rsp.dmem().as_slice()[0..16];

    assert_eq!(line[4..], (0..12).collect::<Vec<u8>>()[..]);
    assert_eq!(line[..4], [12, 13, 14, 15]);
}

#[test]
fn tracer_sees_vector_accesses() {
    let mut rsp = rsp_with(&["lqv v1[e0], 1(r0)", "sdv v1[e0], 3(t0)"]);
    let recorder = Arc::new(Mutex::new(Recorder::default()));

    rsp.set_tracer(Box::new(recorder.clone()));
    rsp.set_reg(T0, 0x100);
    rsp.run(2).unwrap();

    let r = recorder.lock().unwrap();

    assert_eq!(r.pcs, vec![0, 4]);
    assert_eq!(r.reads, vec![0x10]);
    assert_eq!(r.writes, vec![0x118]);
    assert_eq!(rsp.disassemble_last().unwrap(), "sdv v1[e0], 3(t0)");
}

#[test]
fn state_survives_serialization() {
    let mut rsp = rsp_with(&[
        "vaddc v2, v0, v1[e0]",
        "vmacu v3, v0, v1[e0]",
        "sqv v2[e0], 0(t0)",
        "break",
    ]);

    rsp.set_vreg(0, Vector::from_lanes(LANES));
    rsp.set_vreg(1, Vector::from_lanes(LANES));
    rsp.set_reg(T0, 0xff8);
    rsp.run(4).unwrap();

    let dmem = reload(rsp.dmem());

    assert_eq!(dmem.as_slice(), rsp.dmem().as_slice());
    assert_eq!(dmem.load::<u16>(0xff8), 0x0022);

    assert_ne!(*rsp.accumulator(), Accumulator::default());
    assert_eq!(reload(rsp.accumulator()), *rsp.accumulator());
    assert_eq!(reload(&rsp.vreg(2)), rsp.vreg(2));
    assert_eq!(reload(&rsp.vreg(3)), rsp.vreg(3));
    assert_eq!(reload(&rsp.vco()), rsp.vco());

    let sp = reload(rsp.sp_registers());

    assert_eq!(sp.status, rsp.sp_registers().status);
    assert!(sp.status.broke());
    assert!(sp.status.halt());
}
