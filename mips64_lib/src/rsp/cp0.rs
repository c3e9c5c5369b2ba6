//! RSP coprocessor 0: the signal processor interface registers (0-7) and the RDP command
//! registers (8-15) as seen by MFC0/MTC0. DMA and the RDP are not modelled: apart from the
//! status and semaphore registers these are plain storage.

use bitfield::bitfield;
use serde::{Deserialize, Serialize};

/// Register indices
pub mod reg {
    pub const DMA_CACHE: usize = 0;
    pub const DMA_DRAM: usize = 1;
    pub const DMA_READ_LENGTH: usize = 2;
    pub const DMA_WRITE_LENGTH: usize = 3;
    pub const STATUS: usize = 4;
    pub const DMA_FULL: usize = 5;
    pub const DMA_BUSY: usize = 6;
    pub const SEMAPHORE: usize = 7;
    pub const CMD_START: usize = 8;
    pub const CMD_END: usize = 9;
    pub const CMD_CURRENT: usize = 10;
    pub const CMD_STATUS: usize = 11;
    pub const CMD_CLOCK: usize = 12;
    pub const CMD_BUSY: usize = 13;
    pub const CMD_PIPE_BUSY: usize = 14;
    pub const CMD_TMEM_BUSY: usize = 15;
}

bitfield! {
    /// SP status register, as read
    #[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct SpStatus(u32);
    impl Debug;
    pub halt, set_halt: 0;
    pub broke, set_broke: 1;
    pub dma_busy, set_dma_busy: 2;
    pub dma_full, set_dma_full: 3;
    pub io_full, set_io_full: 4;
    pub single_step, set_single_step: 5;
    /// Raise the SP interrupt when BREAK executes
    pub interrupt_on_break, set_interrupt_on_break: 6;
    pub u8, signals, set_signals: 14, 7;
}

#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct SpRegisters {
    pub status: SpStatus,
    regs: [u32; 16],
    /// SP interrupt line towards the MIPS interface
    pub interrupt: bool,
}

impl SpRegisters {
    pub fn new() -> SpRegisters {
        let mut status = SpStatus(0);

        status.set_halt(true);

        SpRegisters {
            status,
            regs: [0; 16],
            interrupt: false,
        }
    }

    /// Read register `index`. Reading the semaphore acquires it.
    pub fn read(&mut self, index: usize) -> u32 {
        match index & 0xf {
            reg::STATUS => self.status.0,
            reg::DMA_FULL => self.status.dma_full() as u32,
            reg::DMA_BUSY => self.status.dma_busy() as u32,
            reg::SEMAPHORE => {
                let v = self.regs[reg::SEMAPHORE];

                self.regs[reg::SEMAPHORE] = 1;
                v
            }
            i => self.regs[i],
        }
    }

    /// Value of register `index` without side effects
    pub fn peek(&self, index: usize) -> u32 {
        match index & 0xf {
            reg::STATUS => self.status.0,
            i => self.regs[i],
        }
    }

    pub fn write(&mut self, index: usize, v: u32) {
        match index & 0xf {
            reg::STATUS => self.write_status(v),
            reg::DMA_FULL | reg::DMA_BUSY => {
                warn!("Write 0x{:08x} to read-only SP register {}", v, index);
            }
            reg::SEMAPHORE => self.regs[reg::SEMAPHORE] = 0,
            i => self.regs[i] = v,
        }
    }

    /// Status writes are commands: each flag has a clear bit and a set bit
    fn write_status(&mut self, v: u32) {
        let bit = |n: u32| v & (1 << n) != 0;
        let s = &mut self.status;

        if bit(0) {
            s.set_halt(false);
        }
        if bit(1) {
            s.set_halt(true);
        }
        if bit(2) {
            s.set_broke(false);
        }
        if bit(3) {
            self.interrupt = false;
        }
        if bit(4) {
            self.interrupt = true;
        }
        if bit(5) {
            s.set_single_step(false);
        }
        if bit(6) {
            s.set_single_step(true);
        }
        if bit(7) {
            s.set_interrupt_on_break(false);
        }
        if bit(8) {
            s.set_interrupt_on_break(true);
        }

        let mut signals = s.signals();

        for n in 0..8 {
            if bit(9 + 2 * n) {
                signals &= !(1 << n);
            }
            if bit(10 + 2 * n) {
                signals |= 1 << n;
            }
        }

        s.set_signals(signals);
    }
}

#[test]
fn status_commands() {
    let mut sp = SpRegisters::new();

    assert!(sp.status.halt());

    // Clear halt, set interrupt on break, set signal 2
    sp.write(reg::STATUS, (1 << 0) | (1 << 8) | (1 << 14));

    assert!(!sp.status.halt());
    assert!(sp.status.interrupt_on_break());
    assert_eq!(sp.status.signals(), 0b100);
    assert_eq!(sp.read(reg::STATUS), (1 << 6) | (0b100 << 7));

    // Clear signal 2, set halt
    sp.write(reg::STATUS, (1 << 13) | (1 << 1));
    assert_eq!(sp.status.signals(), 0);
    assert!(sp.status.halt());
}

#[test]
fn semaphore() {
    let mut sp = SpRegisters::new();

    assert_eq!(sp.read(reg::SEMAPHORE), 0);
    assert_eq!(sp.read(reg::SEMAPHORE), 1);

    sp.write(reg::SEMAPHORE, 0x1234);
    assert_eq!(sp.read(reg::SEMAPHORE), 0);
}
