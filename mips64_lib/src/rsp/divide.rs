//! Reciprocal and inverse square root lookup, shared by VRCP/VRSQ and their low/high halves

use serde::{Deserialize, Serialize};

/// 512-entry reciprocal table: `rcp[i]` is the 16 fraction bits of 1 / (1 + i / 512)
static RCP: [u16; 512] = build_rcp();

/// 512-entry inverse square root table. Even entries cover [1, 2), odd entries [0.5, 1).
static RSQ: [u16; 512] = build_rsq();

const fn build_rcp() -> [u16; 512] {
    let mut table = [0u16; 512];
    let mut i = 1;

    table[0] = 0xffff;

    while i < 512 {
        table[i] = ((((1u64 << 34) / (i as u64 + 512)) + 1) >> 8) as u16;
        i += 1;
    }

    table
}

const fn build_rsq() -> [u16; 512] {
    let mut table = [0u16; 512];
    let mut i = 0;

    while i < 512 {
        let a = ((i + 512) >> (i & 1)) as u64;

        // Smallest c > 2^17 with a * c * c >= 2^44
        let mut low = (1u64 << 17) + 1;
        let mut high = 1u64 << 19;

        while low < high {
            let mid = (low + high) / 2;

            if a * mid * mid >= 1u64 << 44 {
                high = mid;
            } else {
                low = mid + 1;
            }
        }

        table[i] = ((low - 1) >> 1) as u16;
        i += 1;
    }

    table
}

/// State carried between the high and low halves of a double precision division
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DivState {
    /// Upper half of the input, loaded by VRCPH/VRSQH
    pub input: u16,
    /// Upper half of the last result, returned by VRCPH/VRSQH
    pub output: u16,
    /// Set by VRCPH/VRSQH: the next VRCPL/VRSQL uses `input` as its upper half
    pub double: bool,
}

/// Fixed point reciprocal (or inverse square root if `sqrt` is set) of `input`
pub fn reciprocal(input: i32, sqrt: bool) -> u32 {
    let mask = input >> 31;
    let mut data = input ^ mask;

    if input > -32768 {
        data = data.wrapping_sub(mask);
    }

    if data == 0 {
        // Division by zero saturates
        return 0x7fff_ffff;
    }

    if input == -32768 {
        return 0xffff_0000;
    }

    let shift = data.leading_zeros();
    let index = (((data as u32) << shift) & 0x7fc0_0000) >> 22;

    let result = if sqrt {
        let entry = RSQ[((index & 0x1fe) | (shift & 1)) as usize];

        ((0x10000 | u32::from(entry)) << 14) >> ((31 - shift) >> 1)
    } else {
        let entry = RCP[index as usize];

        ((0x10000 | u32::from(entry)) << 14) >> (31 - shift)
    };

    result ^ mask as u32
}

#[test]
fn tables() {
    assert_eq!(RCP[0], 0xffff);
    assert_eq!(RCP[1], 0xff00);
    assert_eq!(RCP[511], 0x0040);
    assert_eq!(RSQ[0], 0x6a09);
    assert_eq!(RSQ[1], 0xffff);
}

#[test]
fn golden_values() {
    assert_eq!(reciprocal(17, false), 0x0787_8400);
    assert_eq!(reciprocal(17, true), 0x1f0b_6000);
    assert_eq!(reciprocal(1, false), 0x7fff_c000);
    assert_eq!(reciprocal(-1, false), 0x8000_3fff);
    assert_eq!(reciprocal(4, true), 0x3fff_e000);
}

#[test]
fn corner_cases() {
    assert_eq!(reciprocal(0, false), 0x7fff_ffff);
    assert_eq!(reciprocal(0, true), 0x7fff_ffff);
    assert_eq!(reciprocal(-32768, false), 0xffff_0000);
    assert_eq!(reciprocal(-32768, true), 0xffff_0000);
}
