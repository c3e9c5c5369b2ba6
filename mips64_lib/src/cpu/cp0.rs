//! Coprocessor 0: system control registers, exception latch and servicing state

use super::tlb::Tlb;
use crate::bitwise::Bitwise;
use bitfield::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// CP0 register indices
pub mod reg {
    pub const INDEX: usize = 0;
    pub const RANDOM: usize = 1;
    pub const ENTRY_LO0: usize = 2;
    pub const ENTRY_LO1: usize = 3;
    pub const CONTEXT: usize = 4;
    pub const PAGE_MASK: usize = 5;
    pub const WIRED: usize = 6;
    pub const BAD_VADDR: usize = 8;
    pub const COUNT: usize = 9;
    pub const ENTRY_HI: usize = 10;
    pub const COMPARE: usize = 11;
    pub const STATUS: usize = 12;
    pub const CAUSE: usize = 13;
    pub const EPC: usize = 14;
    pub const PRID: usize = 15;
    pub const CONFIG: usize = 16;
    pub const LL_ADDR: usize = 17;
    pub const WATCH_LO: usize = 18;
    pub const WATCH_HI: usize = 19;
    pub const XCONTEXT: usize = 20;
    pub const PARITY_ERROR: usize = 26;
    pub const CACHE_ERROR: usize = 27;
    pub const TAG_LO: usize = 28;
    pub const TAG_HI: usize = 29;
    pub const ERROR_EPC: usize = 30;
}

/// Processor revision identifier: R4300i, revision 0
const PRID_VALUE: u64 = 0x0b00;

/// Reset value of the Config register (big-endian, 32-bit system interface)
const CONFIG_RESET: u64 = 0x7006_e463;

/// Config bits software can change: K0 (cache coherency) and CU, BE reads as 1
const CONFIG_WRITE_MASK: u64 = 0x0f00_800f;

/// Interrupt line raised by the Count/Compare timer
pub const TIMER_LINE: u8 = 7;

bitfield! {
    /// Status register (CP0 register 12)
    #[derive(Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct Status(u32);
    impl Debug;
    /// Global interrupt enable
    pub ie, set_ie: 0;
    /// Exception level
    pub exl, set_exl: 1;
    /// Error level
    pub erl, set_erl: 2;
    /// Operating mode: 0 kernel, 1 supervisor, 2 user
    pub u8, ksu, set_ksu: 4, 3;
    pub ux, set_ux: 5;
    pub sx, set_sx: 6;
    pub kx, set_kx: 7;
    /// Interrupt mask
    pub u8, im, set_im: 15, 8;
    pub de, set_de: 16;
    pub ce, set_ce: 17;
    pub ch, set_ch: 18;
    /// Soft reset or NMI occurred
    pub sr, set_sr: 20;
    pub ts, set_ts: 21;
    /// Bootstrap exception vectors
    pub bev, set_bev: 22;
    pub its, set_its: 24;
    pub re, set_re: 25;
    /// 32 64-bit FPU registers instead of 16 pairs
    pub fr, set_fr: 26;
    pub rp, set_rp: 27;
    pub cu0, set_cu0: 28;
    pub cu1, set_cu1: 29;
    pub cu2, set_cu2: 30;
    pub cu3, set_cu3: 31;
}

bitfield! {
    /// Cause register (CP0 register 13)
    #[derive(Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct Cause(u32);
    impl Debug;
    pub u8, exc_code, set_exc_code: 6, 2;
    /// Pending interrupt lines. IP0 and IP1 are the software interrupts
    pub u8, ip, set_ip: 15, 8;
    /// Coprocessor number for Coprocessor Unusable exceptions
    pub u8, ce, set_ce: 29, 28;
    /// Last exception was taken in a delay slot
    pub bd, set_bd: 31;
}

/// Only the software interrupt bits of Cause are writable
const CAUSE_WRITE_MASK: u32 = 0x0000_0300;

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum ExceptionCode {
    Interrupt = 0,
    TlbModification = 1,
    TlbLoad = 2,
    TlbStore = 3,
    AddressErrorLoad = 4,
    AddressErrorStore = 5,
    InstructionBusError = 6,
    DataBusError = 7,
    Syscall = 8,
    Breakpoint = 9,
    ReservedInstruction = 10,
    CoprocessorUnusable = 11,
    Overflow = 12,
    Trap = 13,
    VirtualCoherencyInstruction = 14,
    FloatingPoint = 15,
    Watch = 23,
    VirtualCoherencyData = 31,
}

/// An exception latched during a step
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Exception {
    ColdReset,
    SoftReset,
    Nmi,
    /// TLB miss. `extended` selects the 64-bit refill vector
    TlbRefill {
        store: bool,
        vaddr: u64,
        extended: bool,
    },
    CacheError,
    /// Synchronous exception going through the general vector
    General {
        code: ExceptionCode,
        coprocessor: u8,
        bad_vaddr: Option<u64>,
    },
    Interrupt,
}

impl Exception {
    pub fn general(code: ExceptionCode) -> Exception {
        Exception::General {
            code,
            coprocessor: 0,
            bad_vaddr: None,
        }
    }

    pub fn address(code: ExceptionCode, vaddr: u64) -> Exception {
        Exception::General {
            code,
            coprocessor: 0,
            bad_vaddr: Some(vaddr),
        }
    }

    pub fn unusable(coprocessor: u8) -> Exception {
        Exception::General {
            code: ExceptionCode::CoprocessorUnusable,
            coprocessor,
            bad_vaddr: None,
        }
    }

    /// ExcCode recorded in Cause, if any
    pub fn code(&self) -> Option<ExceptionCode> {
        match *self {
            Exception::TlbRefill { store: false, .. } => Some(ExceptionCode::TlbLoad),
            Exception::TlbRefill { store: true, .. } => Some(ExceptionCode::TlbStore),
            Exception::General { code, .. } => Some(code),
            Exception::Interrupt => Some(ExceptionCode::Interrupt),
            _ => None,
        }
    }

    /// Higher values win when several exceptions are raised during the same step
    fn priority(&self) -> u8 {
        match self {
            Exception::ColdReset => 7,
            Exception::SoftReset => 6,
            Exception::Nmi => 5,
            Exception::TlbRefill { .. } => 4,
            Exception::CacheError => 3,
            Exception::General { .. } => 2,
            Exception::Interrupt => 1,
        }
    }

    /// Reset-class exceptions and cache errors use ErrorEPC and ERL
    fn is_error_level(&self) -> bool {
        matches!(
            self,
            Exception::ColdReset | Exception::SoftReset | Exception::Nmi | Exception::CacheError
        )
    }
}

pub struct Cp0 {
    regs: [u64; 32],
    pub status: Status,
    pub cause: Cause,
    pub tlb: Tlb,
    /// Exception raised by the instruction being executed
    pending: Option<Exception>,
    /// Last serviced exception, readable until cleared
    latched: Option<Exception>,
    /// Reset-class signals raised by external agents
    signal: Option<Exception>,
}

impl Cp0 {
    pub fn new(status: Status) -> Cp0 {
        let mut regs = [0; 32];

        regs[reg::RANDOM] = 31;
        regs[reg::PRID] = PRID_VALUE;
        regs[reg::CONFIG] = CONFIG_RESET;

        Cp0 {
            regs,
            status,
            cause: Cause(0),
            tlb: Tlb::new(),
            pending: None,
            latched: None,
            signal: None,
        }
    }

    /// Raw register read
    pub fn read(&self, index: usize) -> u64 {
        match index & 0x1f {
            reg::STATUS => u64::from(self.status.0),
            reg::CAUSE => u64::from(self.cause.0),
            i => self.regs[i],
        }
    }

    /// Register write as performed by MTC0/DMTC0, honoring read-only bits
    pub fn write(&mut self, index: usize, val: u64) {
        let index = index & 0x1f;

        match index {
            reg::STATUS => self.status = Status(val as u32),
            reg::CAUSE => {
                let c = (self.cause.0 & !CAUSE_WRITE_MASK) | (val as u32 & CAUSE_WRITE_MASK);
                self.cause = Cause(c);
            }
            reg::COUNT => self.regs[reg::COUNT] = val & 0xffff_ffff,
            reg::COMPARE => {
                self.regs[reg::COMPARE] = val & 0xffff_ffff;
                // Writing Compare acknowledges the timer interrupt
                self.set_line(TIMER_LINE, false);
            }
            reg::WIRED => {
                self.regs[reg::WIRED] = val & 0x3f;
                self.regs[reg::RANDOM] = 31;
            }
            reg::INDEX => self.regs[reg::INDEX] = (self.regs[reg::INDEX] & 0x8000_0000) | (val & 0x3f),
            reg::CONFIG => {
                let c = (self.regs[reg::CONFIG] & !CONFIG_WRITE_MASK) | (val & CONFIG_WRITE_MASK);
                self.regs[reg::CONFIG] = c;
            }
            reg::RANDOM | reg::PRID | reg::BAD_VADDR | reg::CACHE_ERROR => {
                warn!("Write 0x{:x} to read-only CP0 register {}", val, index);
            }
            reg::PAGE_MASK => self.regs[index] = val & 0x01ff_e000,
            _ => self.regs[index] = val,
        }
    }

    /// Unchecked register write, used by test harnesses to inject state
    pub fn force(&mut self, index: usize, val: u64) {
        match index & 0x1f {
            reg::STATUS => self.status = Status(val as u32),
            reg::CAUSE => self.cause = Cause(val as u32),
            i => self.regs[i] = val,
        }
    }

    /// Advance Count and Random by one tick
    pub fn tick(&mut self) {
        let count = self.regs[reg::COUNT].wrapping_add(1) & 0xffff_ffff;
        self.regs[reg::COUNT] = count;

        if count == self.regs[reg::COMPARE] {
            self.set_line(TIMER_LINE, true);
        }

        let wired = self.regs[reg::WIRED];
        let random = self.regs[reg::RANDOM];

        self.regs[reg::RANDOM] = if random <= wired || random == 0 {
            31
        } else {
            random - 1
        };
    }

    pub fn set_line(&mut self, line: u8, active: bool) {
        let mut ip = self.cause.ip();
        ip.set_bit(line & 7, active);
        self.cause.set_ip(ip);
    }

    pub fn signal(&mut self, e: Exception) {
        let replace = self.signal.is_none_or(|s| e.priority() > s.priority());

        if replace {
            self.signal = Some(e);
        }
    }

    /// Kernel mode: KSU = 0 or any of EXL/ERL set
    pub fn is_kernel(&self) -> bool {
        self.status.ksu() == 0 || self.status.exl() || self.status.erl()
    }

    /// 64-bit operations are legal in kernel mode, and in supervisor/user mode when SX/UX is set
    pub fn operation_64(&self) -> bool {
        if self.is_kernel() {
            return true;
        }

        match self.status.ksu() {
            1 => self.status.sx(),
            _ => self.status.ux(),
        }
    }

    /// 64-bit addressing as selected by KX/SX/UX for the current mode
    pub fn addressing_64(&self) -> bool {
        if self.is_kernel() {
            return self.status.kx();
        }

        match self.status.ksu() {
            1 => self.status.sx(),
            _ => self.status.ux(),
        }
    }

    fn interrupt_pending(&self) -> bool {
        let s = self.status;

        s.ie() && !s.exl() && !s.erl() && (self.cause.ip() & s.im()) != 0
    }

    /// Exception to take before fetching, if any: external reset signals first, then
    /// interrupts. Interrupts are not taken in a delay slot.
    pub fn asynchronous(&mut self, in_delay_slot: bool) -> Option<Exception> {
        if let Some(e) = self.signal.take() {
            return Some(e);
        }

        if !in_delay_slot && self.interrupt_pending() {
            return Some(Exception::Interrupt);
        }

        None
    }

    /// Latch `e` unless an exception with a higher priority has already been raised during this
    /// step
    pub fn raise(&mut self, e: Exception) {
        let replace = self.pending.is_none_or(|p| e.priority() > p.priority());

        if replace {
            self.pending = Some(e);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take_pending(&mut self) -> Option<Exception> {
        self.pending.take()
    }

    pub fn latched(&self) -> Option<Exception> {
        self.latched
    }

    pub fn clear_latched(&mut self) {
        self.latched = None;
    }

    /// Update the registers for exception `e` raised by the instruction at `pc`. Returns the
    /// vector address.
    pub fn service(&mut self, e: Exception, pc: u64, in_delay_slot: bool) -> u64 {
        let epc = if in_delay_slot { pc.wrapping_sub(4) } else { pc };

        self.latched = Some(e);

        if e.is_error_level() {
            self.regs[reg::ERROR_EPC] = epc;
            self.status.set_erl(true);

            return match e {
                Exception::ColdReset => {
                    self.status.set_bev(true);
                    self.status.set_sr(false);
                    self.status.set_ts(false);
                    self.regs[reg::RANDOM] = 31;
                    self.regs[reg::CONFIG] = CONFIG_RESET;
                    0xffff_ffff_bfc0_0000
                }
                Exception::SoftReset | Exception::Nmi => {
                    self.status.set_bev(true);
                    self.status.set_sr(true);
                    self.status.set_ts(false);
                    0xffff_ffff_bfc0_0000
                }
                _ => {
                    if self.status.bev() {
                        0xffff_ffff_bfc0_0300
                    } else {
                        0xffff_ffff_a000_0100
                    }
                }
            };
        }

        let was_exl = self.status.exl();

        // Nested exceptions keep the original return address
        if !was_exl {
            self.regs[reg::EPC] = epc;
            self.cause.set_bd(in_delay_slot);
        }

        self.status.set_exl(true);

        if let Some(code) = e.code() {
            self.cause.set_exc_code(code as u8);
        }

        let mut offset = 0x180;

        match e {
            Exception::General {
                coprocessor,
                bad_vaddr,
                ..
            } => {
                self.cause.set_ce(coprocessor);

                if let Some(vaddr) = bad_vaddr {
                    self.set_bad_vaddr(vaddr);
                }
            }
            Exception::TlbRefill {
                vaddr, extended, ..
            } => {
                self.set_bad_vaddr(vaddr);

                if !was_exl {
                    offset = if extended { 0x080 } else { 0x000 };
                }
            }
            _ => (),
        }

        let base = if self.status.bev() {
            0xffff_ffff_bfc0_0200
        } else {
            0xffff_ffff_8000_0000
        };

        base + offset
    }

    fn set_bad_vaddr(&mut self, vaddr: u64) {
        self.regs[reg::BAD_VADDR] = vaddr;

        // Context and XContext hold the faulting VPN2
        let context = (self.regs[reg::CONTEXT] & !0x007f_fff0) | ((vaddr >> 9) & 0x007f_fff0);
        self.regs[reg::CONTEXT] = context;

        let region = (vaddr >> 62) & 3;
        let xcontext = (self.regs[reg::XCONTEXT] & !0x1_ffff_fff0)
            | (region << 31)
            | ((vaddr >> 9) & 0x7fff_fff0);
        self.regs[reg::XCONTEXT] = xcontext;
    }

    /// Return from exception: clears ERL (ErrorEPC) or EXL (EPC) and returns the address to
    /// resume at
    pub fn eret(&mut self) -> u64 {
        if self.status.erl() {
            self.status.set_erl(false);
            self.regs[reg::ERROR_EPC]
        } else {
            self.status.set_exl(false);
            self.regs[reg::EPC]
        }
    }

    pub fn exception_code(&self) -> Option<ExceptionCode> {
        ExceptionCode::from_u8(self.cause.exc_code())
    }
}

#[test]
fn status_fields() {
    let mut s = Status(0x3400_0000);

    assert!(s.cu0());
    assert!(s.cu1());
    assert!(s.fr());
    assert!(!s.ie());

    s.set_ksu(2);
    s.set_im(0x80);
    assert_eq!(s.0, 0x3400_8010);
}

#[test]
fn status_and_cause_serialize() {
    let mut status = Status(0x3400_0000);
    status.set_exl(true);
    status.set_im(0x84);

    let mut cause = Cause(0);
    cause.set_exc_code(ExceptionCode::Trap as u8);
    cause.set_bd(true);

    let bytes = flexbuffers::to_vec((status, cause)).unwrap();
    let (s, c): (Status, Cause) = flexbuffers::from_slice(&bytes).unwrap();

    assert_eq!(s, status);
    assert_eq!(c, cause);
    assert!(s.exl());
    assert_eq!(c.exc_code(), 13);
}

#[test]
fn count_compare_timer() {
    let mut cp0 = Cp0::new(Status(0));

    cp0.write(reg::COMPARE, 3);
    cp0.tick();
    cp0.tick();
    assert_eq!(cp0.cause.ip() & 0x80, 0);

    cp0.tick();
    assert_eq!(cp0.read(reg::COUNT), 3);
    assert_eq!(cp0.cause.ip() & 0x80, 0x80);

    // Acknowledge
    cp0.write(reg::COMPARE, 10);
    assert_eq!(cp0.cause.ip(), 0);
}

#[test]
fn count_wraps_after_forced_write() {
    let mut cp0 = Cp0::new(Status(0));

    cp0.force(reg::COUNT, u64::MAX);
    cp0.tick();
    assert_eq!(cp0.read(reg::COUNT), 0);

    cp0.force(reg::COUNT, 0xffff_ffff);
    cp0.tick();
    assert_eq!(cp0.read(reg::COUNT), 0);
}

#[test]
fn random_wraps_at_wired() {
    let mut cp0 = Cp0::new(Status(0));

    cp0.write(reg::WIRED, 29);
    assert_eq!(cp0.read(reg::RANDOM), 31);

    let mut seen = Vec::new();

    for _ in 0..4 {
        cp0.tick();
        seen.push(cp0.read(reg::RANDOM));
    }

    assert_eq!(seen, vec![30, 29, 31, 30]);
}

#[test]
fn tlb_refill_vectors() {
    let vaddr = 0x0000_0000_0040_2000;
    let pc = 0xffff_ffff_8000_1000;

    let mut cp0 = Cp0::new(Status(0));
    let refill = Exception::TlbRefill {
        store: false,
        vaddr,
        extended: false,
    };

    assert_eq!(cp0.service(refill, pc, false), 0xffff_ffff_8000_0000);
    assert_eq!(cp0.read(reg::BAD_VADDR), vaddr);
    assert_eq!(cp0.read(reg::EPC), pc);
    assert_eq!(cp0.exception_code(), Some(ExceptionCode::TlbLoad));
    assert!(cp0.status.exl());
    assert!(!cp0.status.erl());

    let mut cp0 = Cp0::new(Status(0));
    let refill = Exception::TlbRefill {
        store: true,
        vaddr,
        extended: true,
    };

    assert_eq!(cp0.service(refill, pc, true), 0xffff_ffff_8000_0080);
    assert_eq!(cp0.read(reg::EPC), pc - 4);
    assert!(cp0.cause.bd());
    assert_eq!(cp0.exception_code(), Some(ExceptionCode::TlbStore));

    // With EXL already set the refill goes through the general vector and EPC is kept
    let mut cp0 = Cp0::new(Status(0));
    cp0.status.set_exl(true);
    cp0.force(reg::EPC, 0x1234);

    assert_eq!(cp0.service(refill, pc, false), 0xffff_ffff_8000_0180);
    assert_eq!(cp0.read(reg::EPC), 0x1234);
    assert_eq!(cp0.read(reg::BAD_VADDR), vaddr);

    let mut cp0 = Cp0::new(Status(0));
    cp0.status.set_bev(true);

    assert_eq!(cp0.service(refill, pc, false), 0xffff_ffff_bfc0_0280);
}

#[test]
fn cache_error_uses_error_level() {
    let pc = 0xffff_ffff_8000_2000;

    let mut cp0 = Cp0::new(Status(0));

    assert_eq!(cp0.service(Exception::CacheError, pc, false), 0xffff_ffff_a000_0100);
    assert!(cp0.status.erl());
    assert!(!cp0.status.exl());
    assert_eq!(cp0.read(reg::ERROR_EPC), pc);
    assert_eq!(cp0.read(reg::EPC), 0);

    let mut status = Status(0);
    status.set_bev(true);

    let mut cp0 = Cp0::new(status);

    assert_eq!(cp0.service(Exception::CacheError, pc, true), 0xffff_ffff_bfc0_0300);
    assert_eq!(cp0.read(reg::ERROR_EPC), pc - 4);

    assert_eq!(cp0.eret(), pc - 4);
    assert!(!cp0.status.erl());
}

#[test]
fn nested_exception_keeps_epc() {
    let mut cp0 = Cp0::new(Status(0));

    let v = cp0.service(Exception::general(ExceptionCode::Syscall), 0xffff_ffff_8000_1000, false);
    assert_eq!(v, 0xffff_ffff_8000_0180);
    assert_eq!(cp0.read(reg::EPC), 0xffff_ffff_8000_1000);
    assert!(cp0.status.exl());

    let v = cp0.service(Exception::general(ExceptionCode::Overflow), 0xffff_ffff_8000_0180, true);
    assert_eq!(v, 0xffff_ffff_8000_0180);
    assert_eq!(cp0.read(reg::EPC), 0xffff_ffff_8000_1000);
    assert_eq!(cp0.exception_code(), Some(ExceptionCode::Overflow));
    assert!(!cp0.cause.bd());

    assert_eq!(cp0.eret(), 0xffff_ffff_8000_1000);
    assert!(!cp0.status.exl());
}

#[test]
fn raise_priority() {
    let mut cp0 = Cp0::new(Status(0));

    cp0.raise(Exception::Interrupt);
    cp0.raise(Exception::general(ExceptionCode::Trap));
    cp0.raise(Exception::Interrupt);

    assert_eq!(cp0.take_pending(), Some(Exception::general(ExceptionCode::Trap)));
    assert_eq!(cp0.take_pending(), None);
}
