//! 128-bit vector registers.
//!
//! A register is kept as 16 bytes in big-endian order whatever the host: lane 0 is the most
//! significant halfword, byte 0 the most significant byte. Every wider view (halfword lanes,
//! words, doublewords) computes its byte offset from that layout.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector([u8; 16]);

impl Vector {
    pub fn from_bytes(bytes: [u8; 16]) -> Vector {
        Vector(bytes)
    }

    pub fn from_lanes(lanes: [u16; 8]) -> Vector {
        let mut v = Vector::default();

        for (i, &l) in lanes.iter().enumerate() {
            v.set_lane(i, l);
        }

        v
    }

    pub fn bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Byte `i`, wrapping around the register
    pub fn byte(&self, i: usize) -> u8 {
        self.0[i & 15]
    }

    pub fn set_byte(&mut self, i: usize, v: u8) {
        self.0[i & 15] = v;
    }

    /// 16-bit lane `i`
    pub fn lane(&self, i: usize) -> u16 {
        u16::from_be_bytes(*array_ref![self.0, (i & 7) * 2, 2])
    }

    pub fn lane_signed(&self, i: usize) -> i16 {
        self.lane(i) as i16
    }

    pub fn set_lane(&mut self, i: usize, v: u16) {
        *array_mut_ref![self.0, (i & 7) * 2, 2] = v.to_be_bytes();
    }

    pub fn lanes(&self) -> [u16; 8] {
        let mut lanes = [0; 8];

        for (i, l) in lanes.iter_mut().enumerate() {
            *l = self.lane(i);
        }

        lanes
    }

    /// 32-bit word `i` (0-3)
    pub fn word(&self, i: usize) -> u32 {
        u32::from_be_bytes(*array_ref![self.0, (i & 3) * 4, 4])
    }

    pub fn set_word(&mut self, i: usize, v: u32) {
        *array_mut_ref![self.0, (i & 3) * 4, 4] = v.to_be_bytes();
    }

    /// 64-bit doubleword `i` (0-1)
    pub fn dword(&self, i: usize) -> u64 {
        u64::from_be_bytes(*array_ref![self.0, (i & 1) * 8, 8])
    }

    pub fn set_dword(&mut self, i: usize, v: u64) {
        *array_mut_ref![self.0, (i & 1) * 8, 8] = v.to_be_bytes();
    }

    /// Operand seen by a computational instruction with element selector `element`
    pub fn resolve(&self, element: usize) -> Vector {
        let mut v = Vector::default();

        for lane in 0..8 {
            v.set_lane(lane, self.lane(element_lane(element, lane)));
        }

        v
    }
}

/// Source lane read for destination lane `lane` with element selector `element`:
///
/// * 0-1: the whole register, lane for lane
/// * 2-3: one lane of each pair broadcast to the pair (`0q`, `1q`)
/// * 4-7: one lane of each half broadcast to the half (`0h`..`3h`)
/// * 8-15: a single lane broadcast to the whole register
pub fn element_lane(element: usize, lane: usize) -> usize {
    match element & 0xf {
        0 | 1 => lane & 7,
        e @ 2..=3 => (lane & 6) | (e & 1),
        e @ 4..=7 => (lane & 4) | (e & 3),
        e => e & 7,
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, l) in self.lanes().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:04x}", l)?;
        }

        Ok(())
    }
}

#[test]
fn lane_layout() {
    let v = Vector::from_lanes([0x0011, 0x2233, 0x4455, 0x6677, 0x8899, 0xaabb, 0xccdd, 0xeeff]);

    assert_eq!(v.byte(0), 0x00);
    assert_eq!(v.byte(3), 0x33);
    assert_eq!(v.byte(15), 0xff);
    assert_eq!(v.byte(16), 0x00);
    assert_eq!(v.lane_signed(4), 0x8899u16 as i16);
    assert_eq!(v.word(1), 0x4455_6677);
    assert_eq!(v.dword(1), 0x8899_aabb_ccdd_eeff);
    assert_eq!(format!("{:?}", v), "0011 2233 4455 6677 8899 aabb ccdd eeff");

    let mut w = v;
    w.set_word(0, 0xdead_beef);
    assert_eq!(w.lane(0), 0xdead);
    assert_eq!(w.lane(1), 0xbeef);
    assert_eq!(w.lane(2), 0x4455);
}

#[test]
fn element_broadcast() {
    let v = Vector::from_lanes([0x0011, 0x2233, 0x4455, 0x6677, 0x8899, 0xaabb, 0xccdd, 0xeeff]);

    assert_eq!(v.resolve(0), v);
    assert_eq!(v.resolve(1), v);
    assert_eq!(
        v.resolve(2).lanes(),
        [0x0011, 0x0011, 0x4455, 0x4455, 0x8899, 0x8899, 0xccdd, 0xccdd]
    );
    assert_eq!(
        v.resolve(3).lanes(),
        [0x2233, 0x2233, 0x6677, 0x6677, 0xaabb, 0xaabb, 0xeeff, 0xeeff]
    );
    assert_eq!(
        v.resolve(4).lanes(),
        [0x0011, 0x0011, 0x0011, 0x0011, 0x8899, 0x8899, 0x8899, 0x8899]
    );
    assert_eq!(
        v.resolve(7).lanes(),
        [0x6677, 0x6677, 0x6677, 0x6677, 0xeeff, 0xeeff, 0xeeff, 0xeeff]
    );
    assert_eq!(v.resolve(8).lanes(), [0x0011; 8]);
    assert_eq!(v.resolve(13).lanes(), [0xaabb; 8]);
}
