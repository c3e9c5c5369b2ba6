//! Vector accumulator: eight 48-bit lanes split into hi/mid/lo halfwords, and the saturating
//! reductions producing a 16-bit result from them.

use super::vector::Vector;
use serde::{Deserialize, Serialize};

const MASK_48: u64 = (1 << 48) - 1;

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Accumulator {
    lanes: [u64; 8],
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    /// Build an accumulator from the three vectors of halfwords
    pub fn from_parts(hi: &Vector, mid: &Vector, lo: &Vector) -> Accumulator {
        let mut acc = Accumulator::new();

        for i in 0..8 {
            acc.set_hi(i, hi.lane(i));
            acc.set_mid(i, mid.lane(i));
            acc.set_lo(i, lo.lane(i));
        }

        acc
    }

    /// Sign extended value of lane `i`
    pub fn get(&self, i: usize) -> i64 {
        ((self.lanes[i & 7] << 16) as i64) >> 16
    }

    /// Set lane `i`, keeping the low 48 bits of `v`
    pub fn set(&mut self, i: usize, v: i64) {
        self.lanes[i & 7] = v as u64 & MASK_48;
    }

    pub fn add(&mut self, i: usize, v: i64) {
        let sum = self.get(i).wrapping_add(v);

        self.set(i, sum);
    }

    pub fn hi(&self, i: usize) -> u16 {
        (self.lanes[i & 7] >> 32) as u16
    }

    pub fn mid(&self, i: usize) -> u16 {
        (self.lanes[i & 7] >> 16) as u16
    }

    pub fn lo(&self, i: usize) -> u16 {
        self.lanes[i & 7] as u16
    }

    pub fn set_hi(&mut self, i: usize, v: u16) {
        self.set_part(i, 32, v);
    }

    pub fn set_mid(&mut self, i: usize, v: u16) {
        self.set_part(i, 16, v);
    }

    pub fn set_lo(&mut self, i: usize, v: u16) {
        self.set_part(i, 0, v);
    }

    fn set_part(&mut self, i: usize, shift: u32, v: u16) {
        let l = &mut self.lanes[i & 7];

        *l = (*l & !(0xffff << shift)) | (u64::from(v) << shift);
    }

    /// Bits [47:16] of lane `i`, as a signed value
    fn high_word(&self, i: usize) -> i32 {
        (self.get(i) >> 16) as i32
    }

    /// Signed saturation of bits [47:16]: the middle halfword when it represents the whole
    /// value, 0x7fff or 0x8000 otherwise
    pub fn clamp_signed_mid(&self, i: usize) -> u16 {
        clamp_i16(i64::from(self.high_word(i)))
    }

    /// Signed saturation seen from the low halfword: the low halfword when bits [47:16] fit in
    /// a signed halfword, 0x0000 or 0xffff depending on the sign otherwise
    pub fn clamp_signed_low(&self, i: usize) -> u16 {
        let v = self.high_word(i);

        if v == i32::from(v as i16) {
            self.lo(i)
        } else if v < 0 {
            0
        } else {
            0xffff
        }
    }

    /// Unsigned saturation: negative values clamp to 0, values that don't fit in the middle
    /// halfword clamp to 0xffff
    pub fn clamp_unsigned(&self, i: usize) -> u16 {
        let hi = self.hi(i) as i16;
        let mid = self.mid(i);

        if hi < 0 {
            0
        } else if hi > 0 || mid & 0x8000 != 0 {
            0xffff
        } else {
            mid
        }
    }

    pub fn hi_vector(&self) -> Vector {
        self.part_vector(Accumulator::hi)
    }

    pub fn mid_vector(&self) -> Vector {
        self.part_vector(Accumulator::mid)
    }

    pub fn lo_vector(&self) -> Vector {
        self.part_vector(Accumulator::lo)
    }

    fn part_vector(&self, part: fn(&Accumulator, usize) -> u16) -> Vector {
        let mut v = Vector::default();

        for i in 0..8 {
            v.set_lane(i, part(self, i));
        }

        v
    }
}

/// Saturate `v` to a signed halfword
pub fn clamp_i16(v: i64) -> u16 {
    v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16 as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(hi: [u16; 8], mid: [u16; 8], lo: [u16; 8]) -> Accumulator {
        Accumulator::from_parts(
            &Vector::from_lanes(hi),
            &Vector::from_lanes(mid),
            &Vector::from_lanes(lo),
        )
    }

    fn clamped(a: &Accumulator, clamp: fn(&Accumulator, usize) -> u16) -> [u16; 8] {
        let mut r = [0; 8];

        for (i, l) in r.iter_mut().enumerate() {
            *l = clamp(a, i);
        }

        r
    }

    #[test]
    fn parts() {
        let mut a = Accumulator::new();

        a.set_hi(0, 0xaabb);
        a.set_mid(0, 0xccdd);
        a.set_lo(0, 0xeeff);

        assert_eq!(a.get(0), 0xffff_aabb_ccdd_eeffu64 as i64);
        assert_eq!(a.hi(0), 0xaabb);

        a.set_hi(0, 0x0011);
        assert_eq!(a.get(0), 0x0011_ccdd_eeff);

        // Wraps at 48 bits
        a.set(1, 0x7fff_ffff_ffff);
        a.add(1, 1);
        assert_eq!(a.get(1), -0x8000_0000_0000);
    }

    #[test]
    fn unsigned_clamp() {
        let a = acc(
            [0; 8],
            [0x0000, 0x1246, 0x48f6, 0xa40d, 0xdec1, 0x719a, 0x28db, 0x0484],
            [0x04cc, 0xe174, 0x223c, 0xc724, 0xd02c, 0x3d54, 0x0e9c, 0x4404],
        );

        assert_eq!(
            clamped(&a, Accumulator::clamp_unsigned),
            [0x0000, 0x1246, 0x48f6, 0xffff, 0xffff, 0x719a, 0x28db, 0x0484]
        );

        let a = acc(
            [0x0000, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff],
            [0x0000, 0xf6dd, 0xdb85, 0xadf9, 0x909f, 0xc733, 0xeb92, 0xfdbe],
            [0x7d9c, 0x0f48, 0x6ee4, 0x9c70, 0x97ec, 0x6158, 0xf8b4, 0x5e00],
        );

        assert_eq!(clamped(&a, Accumulator::clamp_unsigned), [0; 8]);
    }

    #[test]
    fn signed_mid_clamp() {
        let a = acc(
            [0x0000, 0x0491, 0x123d, 0x2902, 0x37b1, 0x1c67, 0x0a37, 0x0121],
            [0x010f, 0x7886, 0x1220, 0xcddc, 0x2320, 0x00fe, 0x00fe, 0x2321],
            [0x0133, 0xb85d, 0x888f, 0x71c9, 0x740b, 0x8f55, 0xc3a7, 0x1101],
        );

        assert_eq!(
            clamped(&a, Accumulator::clamp_signed_mid),
            [0x010f, 0x7fff, 0x7fff, 0x7fff, 0x7fff, 0x7fff, 0x7fff, 0x7fff]
        );

        let a = acc([0xffff; 8], [0x7fff; 8], [0; 8]);
        assert_eq!(clamped(&a, Accumulator::clamp_signed_mid), [0x8000; 8]);
    }

    #[test]
    fn signed_low_clamp() {
        let lo = [0x0000, 0x0491, 0x123d, 0x2903, 0x48e2, 0x71dc, 0xa3f0, 0xdf1d];
        let a = acc([0; 8], [0; 8], lo);

        assert_eq!(clamped(&a, Accumulator::clamp_signed_low), lo);

        let a = acc(
            [0x0000, 0xffff, 0x0001, 0xffff, 0, 0, 0, 0],
            [0x7fff, 0x8000, 0x0000, 0x7fff, 0, 0, 0, 0],
            [0x1234; 8],
        );

        assert_eq!(
            clamped(&a, Accumulator::clamp_signed_low),
            [0x1234, 0x1234, 0xffff, 0x0000, 0x1234, 0x1234, 0x1234, 0x1234]
        );
    }
}
