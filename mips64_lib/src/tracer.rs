//! Tracer interface

use std::sync::{Arc, Mutex};

/// Observer notified by the cores as they execute. The hooks only receive addresses and values,
/// execution is the same with or without a tracer.
pub trait Tracer {
    /// BREAK executed at `pc`. The RSP reports its IMEM address.
    fn trigger_break(&mut self, pc: u64);

    /// Instruction fetched from `pc`, before it runs. Fires on every step of both cores, so
    /// keep it cheap.
    fn pc_change(&mut self, pc: u64);

    /// Data load from virtual address `addr`. On the RSP this is the scalar or vector effective
    /// address before it wraps around DMEM.
    fn memory_read(&mut self, addr: u64);

    /// Data store to virtual address `addr`, reported like `memory_read`
    fn memory_write(&mut self, addr: u64);

    /// R4300i general register `index` received `val`. R0 writes are not reported.
    fn gpr_write(&mut self, index: usize, val: u64);

    /// R4300i branch or jump resolved. `target` is reported even when the branch is not taken.
    fn branch(&mut self, target: u64, taken: bool);
}

impl Tracer for () {
    fn trigger_break(&mut self, _: u64) {}

    fn pc_change(&mut self, _: u64) {}

    fn memory_read(&mut self, _: u64) {}

    fn memory_write(&mut self, _: u64) {}

    fn gpr_write(&mut self, _: usize, _: u64) {}

    fn branch(&mut self, _: u64, _: bool) {}
}

/// Tracer recording every address it sees, handy in tests
#[derive(Default, Debug)]
pub struct Recorder {
    pub pcs: Vec<u64>,
    pub reads: Vec<u64>,
    pub writes: Vec<u64>,
    pub breaks: Vec<u64>,
    pub gpr_writes: Vec<(usize, u64)>,
    pub branches: Vec<(u64, bool)>,
}

impl Tracer for Recorder {
    fn trigger_break(&mut self, pc: u64) {
        self.breaks.push(pc);
    }

    fn pc_change(&mut self, pc: u64) {
        self.pcs.push(pc);
    }

    fn memory_read(&mut self, addr: u64) {
        self.reads.push(addr);
    }

    fn memory_write(&mut self, addr: u64) {
        self.writes.push(addr);
    }

    fn gpr_write(&mut self, index: usize, val: u64) {
        self.gpr_writes.push((index, val));
    }

    fn branch(&mut self, target: u64, taken: bool) {
        self.branches.push((target, taken));
    }
}

/// Shared tracer, lets the owner inspect it while a core holds a handle. A poisoned lock
/// drops the notification.
impl<T: Tracer> Tracer for Arc<Mutex<T>> {
    fn trigger_break(&mut self, pc: u64) {
        if let Ok(mut t) = self.lock() {
            t.trigger_break(pc);
        }
    }

    fn pc_change(&mut self, pc: u64) {
        if let Ok(mut t) = self.lock() {
            t.pc_change(pc);
        }
    }

    fn memory_read(&mut self, addr: u64) {
        if let Ok(mut t) = self.lock() {
            t.memory_read(addr);
        }
    }

    fn memory_write(&mut self, addr: u64) {
        if let Ok(mut t) = self.lock() {
            t.memory_write(addr);
        }
    }

    fn gpr_write(&mut self, index: usize, val: u64) {
        if let Ok(mut t) = self.lock() {
            t.gpr_write(index, val);
        }
    }

    fn branch(&mut self, target: u64, taken: bool) {
        if let Ok(mut t) = self.lock() {
            t.branch(target, taken);
        }
    }
}
