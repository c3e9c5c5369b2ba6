//! Vector unit: computational instructions over eight 16-bit lanes and the COP2 transfers.
//!
//! Every computational instruction reads `vs` and the element-resolved `vt`, updates the
//! accumulator (at least its low halfword) and writes a clamped view of it into `vd`. The flag
//! side effects follow the hardware, including the corner cases of the compare and clip
//! instructions that later instructions depend on.

use super::accumulator::clamp_i16;
use super::divide::reciprocal;
use super::flags::LaneFlags;
use super::vector::Vector;
use super::Rsp;
use crate::error::{MipsError, MipsResult};
use crate::isa::catalog::OpId;
use crate::isa::{Arith, DecodedInstruction, VectorFlags};

impl Rsp {
    /// `vs` and `vt` with its element selector applied
    fn operands(&self, i: &DecodedInstruction) -> (Vector, Vector) {
        let vs = self.vregs[i.inst.rd()];
        let vt = self.vregs[i.inst.rt()].resolve(i.inst.element());

        (vs, vt)
    }

    fn write_vd(&mut self, i: &DecodedInstruction, v: Vector) {
        self.vregs[i.inst.sa() as usize] = v;
    }

    /// Load the low halfwords of the accumulator from `v`
    fn set_acc_lo(&mut self, v: &Vector) {
        for n in 0..8 {
            self.acc.set_lo(n, v.lane(n));
        }
    }
}

/// vmulf, vmulu, vmudl, vmudm, vmudn, vmudh and the accumulating vmac*/vmad* forms
pub(super) fn multiply(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let op = i.op;
    let accumulate = op.has_vector(VectorFlags::ACCUMULATE);
    let low = op.has_vector(VectorFlags::PARTIAL_L) || op.has_vector(VectorFlags::PARTIAL_N);
    let mut out = Vector::default();

    for n in 0..8 {
        let (su, tu) = (i64::from(vs.lane(n)), i64::from(vt.lane(n)));
        let (ss, ts) = (i64::from(vs.lane_signed(n)), i64::from(vt.lane_signed(n)));

        let product = if op.has_vector(VectorFlags::PARTIAL_L) {
            (su * tu) >> 16
        } else if op.has_vector(VectorFlags::PARTIAL_M) {
            ss * tu
        } else if op.has_vector(VectorFlags::PARTIAL_N) {
            su * ts
        } else if op.has_vector(VectorFlags::PARTIAL_H) {
            (ss * ts) << 16
        } else if accumulate {
            (ss * ts) << 1
        } else {
            // Fractional multiply, rounded
            ((ss * ts) << 1) + 0x8000
        };

        if accumulate {
            rsp.acc.add(n, product);
        } else {
            rsp.acc.set(n, product);
        }

        let r = if low {
            if accumulate {
                rsp.acc.clamp_signed_low(n)
            } else {
                rsp.acc.lo(n)
            }
        } else if i.is_unsigned() {
            rsp.acc.clamp_unsigned(n)
        } else {
            rsp.acc.clamp_signed_mid(n)
        };

        out.set_lane(n, r);
    }

    rsp.write_vd(i, out);

    Ok(())
}

/// vrndp, vrndn: add `vt` (shifted into the middle halfword for odd `vs`) to accumulator
/// lanes of the selected sign
pub(super) fn round(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (_, vt) = rsp.operands(i);
    let positive = i.op.has_vector(VectorFlags::ROUND_POSITIVE);
    let high = i.inst.rd() & 1 != 0;
    let mut out = Vector::default();

    for n in 0..8 {
        let mut product = i64::from(vt.lane_signed(n));

        if high {
            product <<= 16;
        }

        let acc = rsp.acc.get(n);

        if (positive && acc >= 0) || (!positive && acc < 0) {
            rsp.acc.set(n, acc + product);
        }

        out.set_lane(n, rsp.acc.clamp_signed_mid(n));
    }

    rsp.write_vd(i, out);

    Ok(())
}

/// vmulq, vmacq: MPEG quantization helpers
pub(super) fn quantize(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let accumulate = i.op.has_vector(VectorFlags::ACCUMULATE);
    let mut out = Vector::default();

    for n in 0..8 {
        let mut product: i32;

        if accumulate {
            product = (i32::from(rsp.acc.hi(n)) << 16) | i32::from(rsp.acc.mid(n));

            if product & (1 << 5) == 0 {
                if product < 0 {
                    product += 32;
                } else if product >= 32 {
                    product -= 32;
                }
            }
        } else {
            product = i32::from(vs.lane_signed(n)) * i32::from(vt.lane_signed(n));

            if product < 0 {
                product += 31;
            }

            rsp.acc.set_lo(n, 0);
        }

        rsp.acc.set_hi(n, (product >> 16) as u16);
        rsp.acc.set_mid(n, product as u16);

        out.set_lane(n, clamp_i16(i64::from(product >> 1)) & !0xf);
    }

    rsp.write_vd(i, out);

    Ok(())
}

/// vadd, vsub: signed saturating arithmetic consuming the carry flags
pub(super) fn add(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let subtract = i.op.id == OpId::VSUB;
    let mut out = Vector::default();

    for n in 0..8 {
        let s = i32::from(vs.lane_signed(n));
        let t = i32::from(vt.lane_signed(n));
        let carry = rsp.vco.lo.get(n) as i32;

        let r = if subtract { s - t - carry } else { s + t + carry };

        rsp.acc.set_lo(n, r as u16);
        out.set_lane(n, clamp_i16(i64::from(r)));
    }

    rsp.vco.clear();
    rsp.write_vd(i, out);

    Ok(())
}

/// vaddc, vsubc: unsigned arithmetic producing the carry (and for vsubc the not equal) flags
pub(super) fn add_carry(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let subtract = i.op.id == OpId::VSUBC;
    let mut carry = LaneFlags::default();
    let mut not_equal = LaneFlags::default();
    let mut out = Vector::default();

    for n in 0..8 {
        let s = u32::from(vs.lane(n));
        let t = u32::from(vt.lane(n));

        let r = if subtract {
            carry.set(n, s < t);
            not_equal.set(n, s != t);
            s.wrapping_sub(t)
        } else {
            carry.set(n, s + t > 0xffff);
            s + t
        };

        rsp.acc.set_lo(n, r as u16);
        out.set_lane(n, r as u16);
    }

    rsp.vco.lo = carry;
    rsp.vco.hi = not_equal;
    rsp.write_vd(i, out);

    Ok(())
}

/// vabs: `vt` with the sign of `vs` applied
pub(super) fn absolute(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let mut out = Vector::default();

    for n in 0..8 {
        let s = vs.lane_signed(n);
        let t = vt.lane_signed(n);

        let (acc, r) = if s < 0 {
            if t == i16::MIN {
                (0x8000, 0x7fff)
            } else {
                let neg = t.wrapping_neg() as u16;
                (neg, neg)
            }
        } else if s == 0 {
            (0, 0)
        } else {
            (t as u16, t as u16)
        };

        rsp.acc.set_lo(n, acc);
        out.set_lane(n, r);
    }

    rsp.write_vd(i, out);

    Ok(())
}

/// vsar: read one slice of the accumulator, selected by the element field
pub(super) fn read_accumulator(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = match i.inst.element() {
        8 => rsp.acc.hi_vector(),
        9 => rsp.acc.mid_vector(),
        10 => rsp.acc.lo_vector(),
        e => {
            warn!("vsar with element {} at 0x{:03x}", e, rsp.current_pc);
            Vector::default()
        }
    };

    rsp.write_vd(i, v);

    Ok(())
}

/// vlt, veq, vne, vge
pub(super) fn compare(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let mut out = Vector::default();

    for n in 0..8 {
        let s = vs.lane_signed(n);
        let t = vt.lane_signed(n);
        let eq = s == t;
        let not_equal = rsp.vco.hi.get(n);
        let carry = rsp.vco.lo.get(n);

        let cc = match i.op.arith {
            Arith::LessThan => s < t || (eq && not_equal && carry),
            Arith::Equal => eq && !not_equal,
            Arith::NotEqual => !eq || not_equal,
            Arith::GreaterOrEqual => s > t || (eq && !(not_equal && carry)),
            _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
        };

        rsp.vcc.lo.set(n, cc);

        let r = if cc { vs.lane(n) } else { vt.lane(n) };

        rsp.acc.set_lo(n, r);
        out.set_lane(n, r);
    }

    rsp.vcc.hi.clear();
    rsp.vco.clear();
    rsp.write_vd(i, out);

    Ok(())
}

/// vcl, vch, vcr
pub(super) fn clip(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let mut out = Vector::default();

    for n in 0..8 {
        let r = if i.op.has_vector(VectorFlags::PARTIAL_L) {
            clip_low(rsp, n, vs.lane(n), vt.lane(n))
        } else if i.op.has_vector(VectorFlags::PARTIAL_H) {
            clip_high(rsp, n, vs.lane_signed(n), vt.lane_signed(n))
        } else if i.op.has_vector(VectorFlags::CRIMP) {
            clip_crimp(rsp, n, vs.lane_signed(n), vt.lane_signed(n))
        } else {
            return Err(MipsError::UnboundOpcode(i.op.mnemonic));
        };

        rsp.acc.set_lo(n, r);
        out.set_lane(n, r);
    }

    // vch sets the flags vcl consumes
    if !i.op.has_vector(VectorFlags::PARTIAL_H) {
        rsp.vco.clear();
        rsp.vce.clear();
    }

    rsp.write_vd(i, out);

    Ok(())
}

/// Second pass of a clip: uses the flags left by vch to pick between `vs` and `vt` (or -vt)
fn clip_low(rsp: &mut Rsp, n: usize, s: u16, t: u16) -> u16 {
    let sign = rsp.vco.lo.get(n);
    let not_equal = rsp.vco.hi.get(n);

    if sign {
        if not_equal {
            if rsp.vcc.lo.get(n) { t.wrapping_neg() } else { s }
        } else {
            let full = u32::from(s) + u32::from(t);
            let sum = full as u16;
            let carry = full > 0xffff;

            let le = if rsp.vce.get(n) {
                sum == 0 || !carry
            } else {
                sum == 0 && !carry
            };

            rsp.vcc.lo.set(n, le);

            if le { t.wrapping_neg() } else { s }
        }
    } else if not_equal {
        if rsp.vcc.hi.get(n) { t } else { s }
    } else {
        let ge = s >= t;

        rsp.vcc.hi.set(n, ge);

        if ge { t } else { s }
    }
}

/// First pass of a clip: signed comparison of `vs` against +/-`vt`
fn clip_high(rsp: &mut Rsp, n: usize, s: i16, t: i16) -> u16 {
    let r = if (s ^ t) < 0 {
        let sum = s.wrapping_add(t);

        rsp.vcc.lo.set(n, sum <= 0);
        rsp.vcc.hi.set(n, t < 0);
        rsp.vco.lo.set(n, true);
        rsp.vce.set(n, sum == -1);
        rsp.vco.hi.set(n, sum != 0 && sum != -1);

        if sum <= 0 { t.wrapping_neg() } else { s }
    } else {
        let diff = s.wrapping_sub(t);

        rsp.vcc.lo.set(n, t < 0);
        rsp.vcc.hi.set(n, diff >= 0);
        rsp.vco.lo.set(n, false);
        rsp.vce.set(n, false);
        rsp.vco.hi.set(n, diff != 0);

        if diff >= 0 { t } else { s }
    };

    r as u16
}

/// Single precision clip, using one's complement for the negated bound
fn clip_crimp(rsp: &mut Rsp, n: usize, s: i16, t: i16) -> u16 {
    let (s32, t32) = (i32::from(s), i32::from(t));

    let r = if (s ^ t) < 0 {
        let le = s32 + t32 + 1 <= 0;

        rsp.vcc.hi.set(n, t < 0);
        rsp.vcc.lo.set(n, le);

        if le { !t } else { s }
    } else {
        let ge = s32 - t32 >= 0;

        rsp.vcc.lo.set(n, t < 0);
        rsp.vcc.hi.set(n, ge);

        if ge { t } else { s }
    };

    r as u16
}

/// vmrg: select `vs` or `vt` with the compare flags
pub(super) fn merge(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let mut out = Vector::default();

    for n in 0..8 {
        let r = if rsp.vcc.lo.get(n) { vs.lane(n) } else { vt.lane(n) };

        rsp.acc.set_lo(n, r);
        out.set_lane(n, r);
    }

    rsp.vco.clear();
    rsp.write_vd(i, out);

    Ok(())
}

pub(super) fn logic(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);
    let mut out = Vector::default();

    for n in 0..8 {
        let (s, t) = (vs.lane(n), vt.lane(n));

        let r = match i.op.arith {
            Arith::And => s & t,
            Arith::Nand => !(s & t),
            Arith::Or => s | t,
            Arith::Nor => !(s | t),
            Arith::Xor => s ^ t,
            Arith::Nxor => !(s ^ t),
            _ => return Err(MipsError::UnboundOpcode(i.op.mnemonic)),
        };

        rsp.acc.set_lo(n, r);
        out.set_lane(n, r);
    }

    rsp.write_vd(i, out);

    Ok(())
}

/// Source lane and destination lane of the single lane instructions (vrcp*, vrsq*, vmov)
fn single_lane(i: &DecodedInstruction) -> (usize, usize) {
    (i.inst.element() & 7, i.inst.rd() & 7)
}

/// vrcp, vrcpl, vrsq, vrsql. The low forms take their upper half from a previous vrcph/vrsqh.
pub(super) fn divide(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (e, de) = single_lane(i);
    let vt = rsp.vregs[i.inst.rt()];
    let lane = vt.lane(e);

    let input = if i.op.has_vector(VectorFlags::PARTIAL_L) && rsp.div.double {
        ((u32::from(rsp.div.input) << 16) | u32::from(lane)) as i32
    } else {
        i32::from(lane as i16)
    };

    let result = reciprocal(input, i.op.has_vector(VectorFlags::SQUARE_ROOT));

    rsp.div.double = false;
    rsp.div.output = (result >> 16) as u16;

    rsp.set_acc_lo(&vt.resolve(i.inst.element()));

    let vd = i.inst.sa() as usize;
    rsp.vregs[vd].set_lane(de, result as u16);

    Ok(())
}

/// vrcph, vrsqh: latch the upper half of the next input, return the upper half of the last
/// result
pub(super) fn divide_high(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (e, de) = single_lane(i);
    let vt = rsp.vregs[i.inst.rt()];

    rsp.set_acc_lo(&vt.resolve(i.inst.element()));

    rsp.div.double = true;
    rsp.div.input = vt.lane(e);

    let vd = i.inst.sa() as usize;
    let output = rsp.div.output;
    rsp.vregs[vd].set_lane(de, output);

    Ok(())
}

/// vmov: copy one lane of the resolved `vt`
pub(super) fn move_element(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (_, de) = single_lane(i);
    let vte = rsp.vregs[i.inst.rt()].resolve(i.inst.element());

    rsp.set_acc_lo(&vte);

    let vd = i.inst.sa() as usize;
    rsp.vregs[vd].set_lane(de, vte.lane(de));

    Ok(())
}

/// vnop, vnull
pub(super) fn nop(_: &mut Rsp, _: &DecodedInstruction) -> MipsResult<()> {
    Ok(())
}

/// Slots without a defined operation: the accumulator gets vs + vt and vd is cleared
pub(super) fn reserved(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let (vs, vt) = rsp.operands(i);

    debug!("Reserved vector instruction {} at 0x{:03x}", i.op.mnemonic, rsp.current_pc);

    for n in 0..8 {
        rsp.acc.set_lo(n, vs.lane(n).wrapping_add(vt.lane(n)));
    }

    rsp.write_vd(i, Vector::default());

    Ok(())
}

/// mfc2: sign extended halfword starting at byte `e` of `vs`
pub(super) fn move_from(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let e = i.inst.ls_element();
    let v = rsp.vregs[i.inst.rd()];

    let h = u16::from_be_bytes([v.byte(e), v.byte(e + 1)]);

    rsp.set_reg(i.inst.rt(), h as i16 as u32);

    Ok(())
}

/// mtc2: store a halfword at byte `e` of `vs`. The low byte is dropped when `e` is 15.
pub(super) fn move_to(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let e = i.inst.ls_element();
    let [hi, lo] = (rsp.reg(i.inst.rt()) as u16).to_be_bytes();
    let v = &mut rsp.vregs[i.inst.rd()];

    v.set_byte(e, hi);

    if e != 15 {
        v.set_byte(e + 1, lo);
    }

    Ok(())
}

/// cfc2: 0 is VCO, 1 is VCC, 2 and 3 are VCE
pub(super) fn control_from(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = match i.inst.rd() & 3 {
        0 => rsp.vco.value(),
        1 => rsp.vcc.value(),
        _ => u16::from(rsp.vce.0),
    };

    rsp.set_reg(i.inst.rt(), v as i16 as u32);

    Ok(())
}

pub(super) fn control_to(rsp: &mut Rsp, i: &DecodedInstruction) -> MipsResult<()> {
    let v = rsp.reg(i.inst.rt());

    match i.inst.rd() & 3 {
        0 => rsp.vco.set_value(v as u16),
        1 => rsp.vcc.set_value(v as u16),
        _ => rsp.vce = LaneFlags(v as u8),
    }

    Ok(())
}
