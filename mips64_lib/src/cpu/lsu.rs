//! Load/store unit: aligned accesses, left/right partial accesses, LL/SC and COP1 transfers.
//!
//! All memory is big-endian: for the partial accesses, byte 0 of a word is its most
//! significant byte.

use super::cp0::{reg, Exception, ExceptionCode};
use super::Cpu;
use crate::bitwise::{se16, se32, se8};
use crate::error::{MipsError, MipsResult};
use crate::isa::{DecodedInstruction, ExecFlags};
use crate::memory::map;
use crate::memory::Addressable;

impl Cpu {
    /// Effective address of a load or store: base + signed offset, masked to the current
    /// addressing width
    fn effective_address(&self, i: &DecodedInstruction) -> u64 {
        let base = self.reg(i.source());

        self.mask_address(base.wrapping_add(i.inst.imm_se()))
    }

    /// Load the value at `vaddr`. Returns `None` if an exception (address error or bus error)
    /// was raised instead.
    pub(super) fn load<T: Addressable>(&mut self, vaddr: u64) -> MipsResult<Option<T>> {
        if vaddr % T::size() as u64 != 0 {
            self.cp0
                .raise(Exception::address(ExceptionCode::AddressErrorLoad, vaddr));
            return Ok(None);
        }

        let paddr = map::translate(vaddr, self.config.mmu_bypass)?;

        self.tracer.memory_read(vaddr);

        let Some(mem) = self.data_memory() else {
            return Err(MipsError::Unattached);
        };

        match mem.load::<T>(paddr) {
            Some(v) => Ok(Some(v)),
            None => {
                self.cp0.raise(Exception::general(ExceptionCode::DataBusError));
                Ok(None)
            }
        }
    }

    /// Store `val` at `vaddr`. Returns false if an exception was raised instead.
    pub(super) fn store<T: Addressable>(&mut self, vaddr: u64, val: T) -> MipsResult<bool> {
        if vaddr % T::size() as u64 != 0 {
            self.cp0
                .raise(Exception::address(ExceptionCode::AddressErrorStore, vaddr));
            return Ok(false);
        }

        let paddr = map::translate(vaddr, self.config.mmu_bypass)?;

        self.tracer.memory_write(vaddr);

        let Some(mem) = self.data_memory_mut() else {
            return Err(MipsError::Unattached);
        };

        if mem.store::<T>(paddr, val) {
            Ok(true)
        } else {
            self.cp0.raise(Exception::general(ExceptionCode::DataBusError));
            Ok(false)
        }
    }

    /// Arm the LL bit for an access to `vaddr`
    fn link(&mut self, vaddr: u64) -> MipsResult<()> {
        let paddr = map::translate(vaddr, self.config.mmu_bypass)?;

        self.ll_bit = true;
        self.cp0.force(reg::LL_ADDR, u64::from(paddr >> 4));

        Ok(())
    }
}

/// lb, lbu, lh, lhu, lw, lwu, ld, ll, lld
pub(super) fn load(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = cpu.effective_address(i);
    let unsigned = i.is_unsigned();

    let v = match i.data_size() {
        1 => cpu
            .load::<u8>(addr)?
            .map(|v| if unsigned { u64::from(v) } else { se8(v) }),
        2 => cpu
            .load::<u16>(addr)?
            .map(|v| if unsigned { u64::from(v) } else { se16(v) }),
        4 => cpu
            .load::<u32>(addr)?
            .map(|v| if unsigned { u64::from(v) } else { se32(v) }),
        8 => cpu.load::<u64>(addr)?,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    let Some(v) = v else {
        return Ok(());
    };

    if i.is_link() {
        cpu.link(addr)?;
    }

    cpu.set_reg(i.target(), v);

    Ok(())
}

/// lwl, lwr, ldl, ldr
pub(super) fn load_partial(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = cpu.effective_address(i);
    let cur = cpu.reg(i.target());
    let left = i.has(ExecFlags::LEFT);

    let v = if i.data_size() == 8 {
        let s = (addr & 7) as u32;

        let Some(d) = cpu.load::<u64>(addr & !7)? else {
            return Ok(());
        };

        if left {
            let keep = (1u64 << (8 * s)).wrapping_sub(1);

            (cur & keep) | (d << (8 * s))
        } else {
            let shift = 8 * (7 - s);

            (cur & !(u64::MAX >> shift)) | (d >> shift)
        }
    } else {
        let s = (addr & 3) as u32;
        let cur = cur as u32;

        let Some(w) = cpu.load::<u32>(addr & !3)? else {
            return Ok(());
        };

        let merged = if left {
            let keep = (1u32 << (8 * s)).wrapping_sub(1);

            (cur & keep) | (w << (8 * s))
        } else {
            let shift = 8 * (3 - s);

            (cur & !(u32::MAX >> shift)) | (w >> shift)
        };

        se32(merged)
    };

    cpu.set_reg(i.target(), v);

    Ok(())
}

/// sb, sh, sw, sd, sc, scd
pub(super) fn store(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = cpu.effective_address(i);
    let v = cpu.reg(i.target());

    if i.is_link() {
        let linked = cpu.ll_bit;

        if linked {
            let done = match i.data_size() {
                8 => cpu.store::<u64>(addr, v)?,
                _ => cpu.store::<u32>(addr, v as u32)?,
            };

            if !done {
                return Ok(());
            }
        }

        cpu.set_reg(i.target(), linked as u64);

        return Ok(());
    }

    match i.data_size() {
        1 => cpu.store::<u8>(addr, v as u8)?,
        2 => cpu.store::<u16>(addr, v as u16)?,
        4 => cpu.store::<u32>(addr, v as u32)?,
        8 => cpu.store::<u64>(addr, v)?,
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    };

    Ok(())
}

/// swl, swr, sdl, sdr: read-modify-write of the aligned word containing the address
pub(super) fn store_partial(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = cpu.effective_address(i);
    let v = cpu.reg(i.target());
    let left = i.has(ExecFlags::LEFT);

    if i.data_size() == 8 {
        let s = (addr & 7) as u32;
        let aligned = addr & !7;

        let Some(d) = cpu.load::<u64>(aligned)? else {
            return Ok(());
        };

        let merged = if left {
            let shift = 8 * s;

            (d & !(u64::MAX >> shift)) | (v >> shift)
        } else {
            let shift = 8 * (7 - s);

            (d & !(u64::MAX << shift)) | (v << shift)
        };

        cpu.store::<u64>(aligned, merged)?;
    } else {
        let s = (addr & 3) as u32;
        let aligned = addr & !3;
        let v = v as u32;

        let Some(w) = cpu.load::<u32>(aligned)? else {
            return Ok(());
        };

        let merged = if left {
            let shift = 8 * s;

            (w & !(u32::MAX >> shift)) | (v >> shift)
        } else {
            let shift = 8 * (3 - s);

            (w & !(u32::MAX << shift)) | (v << shift)
        };

        cpu.store::<u32>(aligned, merged)?;
    }

    Ok(())
}

/// lwc1, ldc1
pub(super) fn load_fpu(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let addr = cpu.effective_address(i);
    let fr = cpu.cp0.status.fr();
    let ft = i.inst.ft();

    if i.data_size() == 8 {
        if let Some(v) = cpu.load::<u64>(addr)? {
            cpu.fpu.set_dword(ft, v, fr);
        }
    } else if let Some(v) = cpu.load::<u32>(addr)? {
        cpu.fpu.set_word(ft, v, fr);
    }

    Ok(())
}

/// swc1, sdc1
pub(super) fn store_fpu(cpu: &mut Cpu, i: &DecodedInstruction) -> MipsResult<()> {
    if !cpu.cop1_usable() {
        return Ok(());
    }

    let addr = cpu.effective_address(i);
    let fr = cpu.cp0.status.fr();
    let ft = i.inst.ft();

    if i.data_size() == 8 {
        let v = cpu.fpu.dword(ft, fr);

        cpu.store::<u64>(addr, v)?;
    } else {
        let v = cpu.fpu.word(ft, fr);

        cpu.store::<u32>(addr, v)?;
    }

    Ok(())
}
