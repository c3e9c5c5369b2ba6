//! Vector loads and stores (LWC2/SWC2) between DMEM and the vector registers.
//!
//! The address is `rs` plus the 7-bit offset scaled by the access size. The element field picks
//! the first byte of the register involved. Most forms only touch the bytes that fit before the
//! end of the register or of the 16-byte DMEM line. The packed forms (lpv, luv, lhv, lfv and their
//! stores) move one byte per lane, shifted into or out of bits [14:7] or [15:8] of the lane.

use super::vector::Vector;
use super::Rsp;
use crate::error::{MipsError, MipsResult};
use crate::isa::catalog::OpId;
use crate::isa::DecodedInstruction;
use std::cmp::min;

impl Rsp {
    fn vector_address(&self, i: &DecodedInstruction) -> u32 {
        self.reg(i.source()).wrapping_add(i.vector_offset() as u32)
    }
}

pub(super) fn load(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = rsp.vector_address(i);
    let e = i.inst.ls_element();
    let vt = i.target();

    rsp.tracer.memory_read(u64::from(addr));

    let dmem = &rsp.dmem;
    let v = &mut rsp.vregs[vt];

    match i.op.id {
        OpId::LBV | OpId::LSV | OpId::LLV | OpId::LDV => {
            let end = min(e + i.data_size(), 16);

            for (k, el) in (e..end).enumerate() {
                v.set_byte(el, dmem.byte(addr.wrapping_add(k as u32)));
            }
        }
        OpId::LQV => {
            // Up to the end of the 16-byte line
            let end = min(16 + e - (addr & 15) as usize, 16);

            for (k, el) in (e..end).enumerate() {
                v.set_byte(el, dmem.byte(addr.wrapping_add(k as u32)));
            }
        }
        OpId::LRV => {
            // The part of the line before `addr`, right aligned in the register
            let start = 16u8.wrapping_sub(((addr & 15) as u8).wrapping_sub(e as u8)) as usize;
            let line = addr & !15;

            for (k, el) in (start..16).enumerate() {
                v.set_byte(el, dmem.byte(line.wrapping_add(k as u32)));
            }
        }
        OpId::LPV | OpId::LUV | OpId::LHV => {
            let shift = if i.op.id == OpId::LPV { 8 } else { 7 };
            let stride = if i.op.id == OpId::LHV { 2 } else { 1 };
            let index = ((addr & 7) as u8).wrapping_sub(e as u8);
            let aligned = addr & !7;

            for lane in 0..8 {
                let off = index.wrapping_add((lane * stride) as u8) & 15;
                let b = dmem.byte(aligned.wrapping_add(u32::from(off)));

                v.set_lane(lane, u16::from(b) << shift);
            }
        }
        OpId::LFV => {
            let index = ((addr & 7) as u8).wrapping_sub(e as u8);
            let aligned = addr & !7;
            let mut tmp = Vector::default();

            for k in 0..4 {
                let first = index.wrapping_add(k as u8 * 4) & 15;
                let second = index.wrapping_add(k as u8 * 4 + 8) & 15;
                let byte = |off: u8| u16::from(dmem.byte(aligned.wrapping_add(u32::from(off))));

                tmp.set_lane(k, byte(first) << 7);
                tmp.set_lane(k + 4, byte(second) << 7);
            }

            for el in e..min(e + 8, 16) {
                v.set_byte(el, tmp.byte(el));
            }
        }
        // Has no effect on hardware
        OpId::LWV => (),
        OpId::LTV => {
            // Transposed: one halfword into each of the 8 registers of the group
            let begin = addr & !7;
            let end = begin.wrapping_add(16);
            let mut a = begin.wrapping_add((e as u32 + (addr & 8)) & 15);
            let base = vt & !7;
            let mut off = e >> 1;

            for lane in 0..8 {
                for half in 0..2 {
                    rsp.vregs[base + off].set_byte(lane * 2 + half, dmem.byte(a));

                    a = a.wrapping_add(1);
                    if a == end {
                        a = begin;
                    }
                }

                off = (off + 1) & 7;
            }
        }
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    }

    Ok(())
}

pub(super) fn store(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let addr = rsp.vector_address(i);
    let e = i.inst.ls_element();
    let vt = i.target();

    rsp.tracer.memory_write(u64::from(addr));

    let v = rsp.vregs[vt];
    let dmem = &mut rsp.dmem;

    match i.op.id {
        OpId::SBV | OpId::SSV | OpId::SLV | OpId::SDV => {
            for k in 0..i.data_size() {
                dmem.set_byte(addr.wrapping_add(k as u32), v.byte(e + k));
            }
        }
        OpId::SQV => {
            for k in 0..(16 - (addr & 15)) as usize {
                dmem.set_byte(addr.wrapping_add(k as u32), v.byte(e + k));
            }
        }
        OpId::SRV => {
            let count = (addr & 15) as usize;
            let base = 16 - count;
            let line = addr & !15;

            for k in 0..count {
                dmem.set_byte(line.wrapping_add(k as u32), v.byte(e + k + base));
            }
        }
        OpId::SPV | OpId::SUV => {
            let packed = i.op.id == OpId::SPV;

            for k in 0..8 {
                let el = e + k;
                let high = (el & 15) < 8;

                let b = if high == packed {
                    v.byte((el & 7) << 1)
                } else {
                    (v.lane(el) >> 7) as u8
                };

                dmem.set_byte(addr.wrapping_add(k as u32), b);
            }
        }
        OpId::SHV => {
            let index = addr & 7;
            let aligned = addr & !7;

            for k in 0..8 {
                let b = e + k * 2;
                let value = (v.byte(b) << 1) | (v.byte(b + 1) >> 7);

                dmem.set_byte(aligned.wrapping_add((index + k as u32 * 2) & 15), value);
            }
        }
        OpId::SFV => {
            let base = addr & 7;
            let aligned = addr & !7;

            let lanes: Option<[usize; 4]> = match e {
                0 | 15 => Some([0, 1, 2, 3]),
                1 => Some([6, 7, 4, 5]),
                4 => Some([1, 2, 3, 0]),
                5 => Some([7, 4, 5, 6]),
                8 => Some([4, 5, 6, 7]),
                11 => Some([3, 0, 1, 2]),
                12 => Some([5, 6, 7, 4]),
                _ => None,
            };

            for k in 0..4 {
                let b = lanes.map_or(0, |l| (v.lane(l[k]) >> 7) as u8);

                dmem.set_byte(aligned.wrapping_add((base + k as u32 * 4) & 15), b);
            }
        }
        OpId::SWV => {
            let base = addr & 7;
            let aligned = addr & !7;

            for k in 0..16 {
                dmem.set_byte(aligned.wrapping_add((base + k as u32) & 15), v.byte(e + k));
            }
        }
        OpId::STV => {
            // Transposed: one halfword from each of the 8 registers of the group
            let first = vt & !7;
            let mut el = 16 - (e & !1);
            let mut base = (addr & 7).wrapping_sub((e & !1) as u32);
            let aligned = addr & !7;

            for r in first..first + 8 {
                for _ in 0..2 {
                    dmem.set_byte(aligned.wrapping_add(base & 15), rsp.vregs[r].byte(el));

                    base = base.wrapping_add(1);
                    el += 1;
                }
            }
        }
        _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
    }

    Ok(())
}
