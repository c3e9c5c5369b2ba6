//! Floating point unit (coprocessor 1)

use super::cp0::{Exception, ExceptionCode};
use super::Cpu;
use crate::bitwise::se32;
use crate::error::{MipsError, MipsResult};
use crate::isa::catalog::OpId;
use crate::isa::{DecodedInstruction, ExecFlags};
use bitfield::bitfield;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// FCR0: implementation 0x0a, revision 0
const FCR0_VALUE: u32 = 0x0a00;

/// Writable bits of FCR31
const FCR31_WRITE_MASK: u32 = 0x0183_ffff;

/// Cause, flag and enable bits. Flags and enables only have the first five.
pub mod cause {
    pub const INEXACT: u8 = 0x01;
    pub const UNDERFLOW: u8 = 0x02;
    pub const OVERFLOW: u8 = 0x04;
    pub const DIV_ZERO: u8 = 0x08;
    pub const INVALID: u8 = 0x10;
    pub const UNIMPLEMENTED: u8 = 0x20;
}

bitfield! {
    /// FPU control/status register
    #[derive(Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct Fcr31(u32);
    impl Debug;
    pub u8, rounding_mode, set_rounding_mode: 1, 0;
    pub u8, flags, set_flags: 6, 2;
    pub u8, enables, set_enables: 11, 7;
    pub u8, cause, set_cause: 17, 12;
    /// Result of the last compare, tested by BC1F/BC1T
    pub condition, set_condition: 23;
    pub flush_subnormals, set_flush_subnormals: 24;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoundingMode {
    Nearest,
    Zero,
    PlusInfinity,
    MinusInfinity,
}

impl RoundingMode {
    fn from_field(rm: u8) -> RoundingMode {
        match rm & 3 {
            0 => RoundingMode::Nearest,
            1 => RoundingMode::Zero,
            2 => RoundingMode::PlusInfinity,
            _ => RoundingMode::MinusInfinity,
        }
    }

    fn round(self, v: f64) -> f64 {
        match self {
            RoundingMode::Nearest => v.round_ties_even(),
            RoundingMode::Zero => v.trunc(),
            RoundingMode::PlusInfinity => v.ceil(),
            RoundingMode::MinusInfinity => v.floor(),
        }
    }
}

/// Operand format encoded in the `fmt` field
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Fmt {
    Single,
    Double,
    Word,
    Long,
}

impl Fmt {
    fn from_field(fmt: usize) -> Option<Fmt> {
        match fmt {
            16 => Some(Fmt::Single),
            17 => Some(Fmt::Double),
            20 => Some(Fmt::Word),
            21 => Some(Fmt::Long),
            _ => None,
        }
    }
}

pub struct Fpu {
    /// Register storage. With FR clear the 32-bit registers are paired: odd registers live in
    /// the upper half of the even one below them.
    regs: [u64; 32],
    pub fcr31: Fcr31,
}

impl Fpu {
    pub fn new() -> Fpu {
        Fpu {
            regs: [0; 32],
            fcr31: Fcr31(0),
        }
    }

    pub fn word(&self, i: usize, fr: bool) -> u32 {
        let i = i & 0x1f;

        if fr || i & 1 == 0 {
            self.regs[i] as u32
        } else {
            (self.regs[i - 1] >> 32) as u32
        }
    }

    pub fn set_word(&mut self, i: usize, v: u32, fr: bool) {
        let i = i & 0x1f;

        if fr || i & 1 == 0 {
            self.regs[i] = (self.regs[i] & !0xffff_ffff) | u64::from(v);
        } else {
            self.regs[i - 1] = (self.regs[i - 1] & 0xffff_ffff) | (u64::from(v) << 32);
        }
    }

    pub fn dword(&self, i: usize, fr: bool) -> u64 {
        let i = i & 0x1f;

        if fr {
            self.regs[i]
        } else {
            self.regs[i & !1]
        }
    }

    pub fn set_dword(&mut self, i: usize, v: u64, fr: bool) {
        let i = i & 0x1f;

        if fr {
            self.regs[i] = v;
        } else {
            self.regs[i & !1] = v;
        }
    }

    /// Control register `i` as read by CFC1
    pub fn control(&self, i: usize) -> u32 {
        match i {
            0 => FCR0_VALUE,
            31 => self.fcr31.0,
            _ => 0,
        }
    }
}

impl Default for Fpu {
    fn default() -> Fpu {
        Fpu::new()
    }
}

/// Host float type backing an FPU format
trait Float:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;

    fn load(fpu: &Fpu, i: usize, fr: bool) -> Self;

    fn store(self, fpu: &mut Fpu, i: usize, fr: bool);

    fn is_nan(self) -> bool;

    fn is_finite(self) -> bool;

    fn is_normal(self) -> bool;

    fn sqrt(self) -> Self;

    fn abs(self) -> Self;
}

macro_rules! impl_float {
    ( $t:ty, $get:ident, $set:ident ) => {
        impl Float for $t {
            const ZERO: $t = 0.0;

            fn load(fpu: &Fpu, i: usize, fr: bool) -> $t {
                <$t>::from_bits(fpu.$get(i, fr))
            }

            fn store(self, fpu: &mut Fpu, i: usize, fr: bool) {
                fpu.$set(i, self.to_bits(), fr)
            }

            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            fn is_finite(self) -> bool {
                <$t>::is_finite(self)
            }

            fn is_normal(self) -> bool {
                <$t>::is_normal(self)
            }

            fn sqrt(self) -> $t {
                <$t>::sqrt(self)
            }

            fn abs(self) -> $t {
                <$t>::abs(self)
            }
        }
    };
}

impl_float!(f32, word, set_word);
impl_float!(f64, dword, set_dword);

impl Cpu {
    /// Returns false and raises Coprocessor Unusable if Status.CU1 is clear
    pub(super) fn cop1_usable(&mut self) -> bool {
        if self.cp0.status.cu1() {
            true
        } else {
            self.cp0.raise(Exception::unusable(1));
            false
        }
    }

    /// Record `cause` in FCR31. If the exception is enabled (unimplemented operations always
    /// are) a floating point exception is raised and false is returned, the result must then be
    /// discarded.
    fn fpu_signal(&mut self, cause: u8) -> bool {
        let fcr = &mut self.fpu.fcr31;

        fcr.set_cause(cause);

        if cause & (fcr.enables() | cause::UNIMPLEMENTED) != 0 {
            self.cp0.raise(Exception::general(ExceptionCode::FloatingPoint));
            false
        } else {
            fcr.set_flags(fcr.flags() | (cause & 0x1f));
            true
        }
    }

    fn fr(&self) -> bool {
        self.cp0.status.fr()
    }
}

/// MFC1 and DMFC1
pub(super) fn move_from(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let fr = cpu.fr();
    let fs = i.inst.fs();

    let v = if i.data_size() == 8 {
        cpu.fpu.dword(fs, fr)
    } else {
        se32(cpu.fpu.word(fs, fr))
    };

    cpu.set_reg(i.target(), v);

    Ok(())
}

/// MTC1 and DMTC1
pub(super) fn move_to(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let fr = cpu.fr();
    let v = cpu.reg(i.target());

    if i.data_size() == 8 {
        cpu.fpu.set_dword(i.inst.fs(), v, fr);
    } else {
        cpu.fpu.set_word(i.inst.fs(), v as u32, fr);
    }

    Ok(())
}

pub(super) fn control_from(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let v = cpu.fpu.control(i.inst.fs());

    cpu.set_reg(i.target(), se32(v));

    Ok(())
}

pub(super) fn control_to(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    // FCR0 is read-only and the other control registers don't exist
    if i.inst.fs() != 31 {
        return Ok(());
    }

    let v = cpu.reg(i.target()) as u32;
    let fcr = Fcr31(v & FCR31_WRITE_MASK);

    cpu.fpu.fcr31 = fcr;

    // Setting a cause bit along with its enable traps immediately
    if fcr.cause() & (fcr.enables() | cause::UNIMPLEMENTED) != 0 {
        cpu.cp0.raise(Exception::general(ExceptionCode::FloatingPoint));
    }

    Ok(())
}

/// add, sub, mul, div, sqrt, abs, mov and neg in single or double precision
pub(super) fn arith(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    match Fmt::from_field(i.inst.fmt()) {
        Some(Fmt::Single) => arith_as::<f32>(cpu, i),
        Some(Fmt::Double) => arith_as::<f64>(cpu, i),
        _ => {
            cpu.fpu_signal(cause::UNIMPLEMENTED);
            Ok(())
        }
    }
}

fn arith_as<F: Float>(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let fr = cpu.fr();
    let a = F::load(&cpu.fpu, i.inst.fs(), fr);
    let b = F::load(&cpu.fpu, i.inst.ft(), fr);

    let mut cause = 0;

    let (r, unary) = match i.op.id {
        OpId::ADD_FMT => (a + b, false),
        OpId::SUB_FMT => (a - b, false),
        OpId::MUL_FMT => (a * b, false),
        OpId::DIV_FMT => {
            if b == F::ZERO && a != F::ZERO && !a.is_nan() {
                cause |= cause::DIV_ZERO;
            }
            (a / b, false)
        }
        OpId::SQRT_FMT => (a.sqrt(), true),
        OpId::ABS_FMT => (a.abs(), true),
        OpId::MOV_FMT => (a, true),
        OpId::NEG_FMT => (-a, true),
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    let nan_in = a.is_nan() || (!unary && b.is_nan());
    let finite_in = a.is_finite() && (unary || b.is_finite());

    if r.is_nan() && !nan_in {
        cause |= cause::INVALID;
    }

    if !r.is_finite() && !r.is_nan() && finite_in && cause & cause::DIV_ZERO == 0 {
        cause |= cause::OVERFLOW | cause::INEXACT;
    }

    if r != F::ZERO && r.is_finite() && !r.is_normal() {
        cause |= cause::UNDERFLOW | cause::INEXACT;
    }

    if cpu.fpu_signal(cause) {
        r.store(&mut cpu.fpu, i.inst.fd(), fr);
    }

    Ok(())
}

/// c.cond.fmt
pub(super) fn compare(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    match Fmt::from_field(i.inst.fmt()) {
        Some(Fmt::Single) => compare_as::<f32>(cpu, i),
        Some(Fmt::Double) => compare_as::<f64>(cpu, i),
        _ => {
            cpu.fpu_signal(cause::UNIMPLEMENTED);
        }
    }

    Ok(())
}

fn compare_as<F: Float>(cpu: &mut Cpu, i: &DecodedInstruction) {
    let fr = cpu.fr();
    let a = F::load(&cpu.fpu, i.inst.fs(), fr);
    let b = F::load(&cpu.fpu, i.inst.ft(), fr);

    let unordered = a.is_nan() || b.is_nan();

    let cause = if unordered && i.has(ExecFlags::COND_SIGNAL) {
        cause::INVALID
    } else {
        0
    };

    if !cpu.fpu_signal(cause) {
        return;
    }

    let c = (i.has(ExecFlags::COND_UN) && unordered)
        || (i.has(ExecFlags::COND_EQ) && a == b)
        || (i.has(ExecFlags::COND_LT) && a < b);

    cpu.fpu.fcr31.set_condition(c);
}

/// Source operand of a conversion
#[derive(Clone, Copy)]
enum Value {
    Float(f64),
    Int(i64),
}

/// cvt.*, round.*, trunc.*, ceil.* and floor.*
pub(super) fn convert(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let fr = cpu.fr();
    let fs = i.inst.fs();
    let fd = i.inst.fd();
    let fmt = Fmt::from_field(i.inst.fmt());

    let src = match fmt {
        Some(Fmt::Single) => Value::Float(f64::from(f32::load(&cpu.fpu, fs, fr))),
        Some(Fmt::Double) => Value::Float(f64::load(&cpu.fpu, fs, fr)),
        Some(Fmt::Word) => Value::Int(i64::from(cpu.fpu.word(fs, fr) as i32)),
        Some(Fmt::Long) => Value::Int(cpu.fpu.dword(fs, fr) as i64),
        None => {
            cpu.fpu_signal(cause::UNIMPLEMENTED);
            return Ok(());
        }
    };

    match i.op.id {
        OpId::CVT_S => {
            let (r, cause) = match (fmt, src) {
                (Some(Fmt::Single), _) => (0.0, cause::UNIMPLEMENTED),
                (_, Value::Float(v)) => {
                    let r = v as f32;
                    (r, inexact(f64::from(r) != v && !v.is_nan()))
                }
                (_, Value::Int(n)) => {
                    let r = n as f32;
                    (r, inexact(r as i64 != n))
                }
            };

            if cpu.fpu_signal(cause) {
                r.store(&mut cpu.fpu, fd, fr);
            }
        }
        OpId::CVT_D => {
            let (r, cause) = match (fmt, src) {
                (Some(Fmt::Double), _) => (0.0, cause::UNIMPLEMENTED),
                (_, Value::Float(v)) => (v, 0),
                (_, Value::Int(n)) => {
                    let r = n as f64;
                    (r, inexact(r as i64 != n))
                }
            };

            if cpu.fpu_signal(cause) {
                r.store(&mut cpu.fpu, fd, fr);
            }
        }
        id => {
            let mode = match id {
                OpId::ROUND_L | OpId::ROUND_W => RoundingMode::Nearest,
                OpId::TRUNC_L | OpId::TRUNC_W => RoundingMode::Zero,
                OpId::CEIL_L | OpId::CEIL_W => RoundingMode::PlusInfinity,
                OpId::FLOOR_L | OpId::FLOOR_W => RoundingMode::MinusInfinity,
                OpId::CVT_W | OpId::CVT_L => {
                    RoundingMode::from_field(cpu.fpu.fcr31.rounding_mode())
                }
                _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
            };

            let bits = if i.data_size() == 8 { 64 } else { 32 };

            let (n, cause) = match src {
                Value::Float(v) => to_integer(v, mode, bits),
                Value::Int(_) => (0, cause::UNIMPLEMENTED),
            };

            if cpu.fpu_signal(cause) {
                if bits == 64 {
                    cpu.fpu.set_dword(fd, n as u64, fr);
                } else {
                    cpu.fpu.set_word(fd, n as u32, fr);
                }
            }
        }
    }

    Ok(())
}

fn inexact(cond: bool) -> u8 {
    if cond { cause::INEXACT } else { 0 }
}

/// Round `v` to an integer of `bits` bits. NaN and out of range values can't be converted and
/// report an unimplemented operation.
fn to_integer(v: f64, mode: RoundingMode, bits: u32) -> (i64, u8) {
    if v.is_nan() {
        return (0, cause::UNIMPLEMENTED);
    }

    let r = mode.round(v);
    let limit = (1u64 << (bits - 1)) as f64;

    if r < -limit || r >= limit {
        return (0, cause::UNIMPLEMENTED);
    }

    (r as i64, inexact(r != v))
}

#[test]
fn register_views() {
    let mut fpu = Fpu::new();

    // FR = 0: odd words alias the upper half of the even register
    fpu.set_word(2, 0x1111_1111, false);
    fpu.set_word(3, 0x2222_2222, false);
    assert_eq!(fpu.dword(2, false), 0x2222_2222_1111_1111);
    assert_eq!(fpu.dword(3, false), 0x2222_2222_1111_1111);
    assert_eq!(fpu.word(3, false), 0x2222_2222);

    // FR = 1: every register is independent
    fpu.set_dword(3, 0x0123_4567_89ab_cdef, true);
    assert_eq!(fpu.word(3, true), 0x89ab_cdef);
    assert_eq!(fpu.dword(2, true), 0x2222_2222_1111_1111);
}

#[test]
fn integer_rounding() {
    assert_eq!(to_integer(2.5, RoundingMode::Nearest, 32), (2, cause::INEXACT));
    assert_eq!(to_integer(3.5, RoundingMode::Nearest, 32), (4, cause::INEXACT));
    assert_eq!(to_integer(-2.5, RoundingMode::Zero, 32), (-2, cause::INEXACT));
    assert_eq!(to_integer(-2.5, RoundingMode::MinusInfinity, 32), (-3, cause::INEXACT));
    assert_eq!(to_integer(2.1, RoundingMode::PlusInfinity, 64), (3, cause::INEXACT));
    assert_eq!(to_integer(7.0, RoundingMode::Nearest, 32), (7, 0));
    assert_eq!(to_integer(f64::NAN, RoundingMode::Nearest, 32).1, cause::UNIMPLEMENTED);
    assert_eq!(to_integer(2147483648.0, RoundingMode::Zero, 32).1, cause::UNIMPLEMENTED);
    assert_eq!(to_integer(2147483648.0, RoundingMode::Zero, 64), (2147483648, 0));
}
