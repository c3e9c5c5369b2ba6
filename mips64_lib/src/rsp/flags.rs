//! Vector control registers: VCO (carry/not equal), VCC (compare/clip) and VCE (clip
//! extension)

use crate::bitwise::Bitwise;
use serde::{Deserialize, Serialize};

/// One flag per lane, bit `n` for lane `n`
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LaneFlags(pub u8);

impl LaneFlags {
    pub fn get(self, lane: usize) -> bool {
        self.0.bit((lane & 7) as u8)
    }

    pub fn set(&mut self, lane: usize, v: bool) {
        self.0.set_bit((lane & 7) as u8, v);
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Two sets of lane flags read and written as one 16-bit control register, `hi` in bits
/// [15:8]
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FlagPair {
    pub hi: LaneFlags,
    pub lo: LaneFlags,
}

impl FlagPair {
    pub fn value(&self) -> u16 {
        (u16::from(self.hi.0) << 8) | u16::from(self.lo.0)
    }

    pub fn set_value(&mut self, v: u16) {
        self.hi = LaneFlags((v >> 8) as u8);
        self.lo = LaneFlags(v as u8);
    }

    pub fn clear(&mut self) {
        self.hi.clear();
        self.lo.clear();
    }
}

#[test]
fn control_register_layout() {
    let mut vco = FlagPair::default();

    vco.lo.set(0, true);
    vco.hi.set(7, true);
    assert_eq!(vco.value(), 0x8001);

    vco.set_value(0x00f0);
    assert!(vco.lo.get(4));
    assert!(!vco.lo.get(3));
    assert!(!vco.hi.get(4));

    vco.clear();
    assert_eq!(vco.value(), 0);
}
