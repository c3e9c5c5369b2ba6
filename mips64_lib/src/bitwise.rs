/// Simple trait to simplify bit manipulation
pub trait Bitwise: Copy {
    /// Returns true if the given bit is set in `self`
    fn bit(self, bitpos: u8) -> bool;

    /// Sets the given bit in self to 1 if `v` is true, 0 if `v` is false
    fn set_bit(&mut self, bitpos: u8, v: bool);

    /// Sets the given bit in self to 1
    fn set_bit_h(&mut self, bitpos: u8) {
        self.set_bit(bitpos, true)
    }

    /// Sets the given bit in self to 0
    fn set_bit_l(&mut self, bitpos: u8) {
        self.set_bit(bitpos, false)
    }
}

macro_rules! impl_bitwise {
    ( $( $t:ty ),* ) => {
        $(
            impl Bitwise for $t {
                fn bit(self, bitpos: u8) -> bool {
                    self & ((1 as $t) << bitpos) != 0
                }

                fn set_bit(&mut self, bitpos: u8, v: bool) {
                    *self &= !((1 as $t) << bitpos);
                    *self |= (v as $t) << bitpos;
                }
            }
        )*
    };
}

impl_bitwise!(u8, u16, u32, u64);

/// Sign-extend the 32bit value `v` to 64 bits
pub fn se32(v: u32) -> u64 {
    v as i32 as i64 as u64
}

/// Sign-extend the 16bit value `v` to 64 bits
pub fn se16(v: u16) -> u64 {
    v as i16 as i64 as u64
}

/// Sign-extend the 8bit value `v` to 64 bits
pub fn se8(v: u8) -> u64 {
    v as i8 as i64 as u64
}

#[test]
fn bitwise() {
    let mut v = 0xaau8;

    assert!(v.bit(7));
    assert!(!v.bit(6));

    v.set_bit(6, true);

    assert!(v.bit(6));
    assert_eq!(v, 0xea);

    v.set_bit(7, false);

    assert!(!v.bit(7));
    assert_eq!(v, 0x6a);

    v.set_bit_h(0);
    v.set_bit_l(1);
    assert!(v.bit(0));
    assert!(!v.bit(1));
    assert_eq!(v, 0x69);

    let mut w = 0u64;
    w.set_bit(63, true);
    assert_eq!(w, 0x8000_0000_0000_0000);
}

#[test]
fn sign_extension() {
    assert_eq!(se32(0x8000_0000), 0xffff_ffff_8000_0000);
    assert_eq!(se32(0x7fff_ffff), 0x7fff_ffff);
    assert_eq!(se16(0xfffe), 0xffff_ffff_ffff_fffe);
    assert_eq!(se8(0x80), 0xffff_ffff_ffff_ff80);
}
