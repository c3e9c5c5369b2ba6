use super::Addressable;

/// RSP memory size: 4KB each for IMEM and DMEM
pub const SCRATCH_SIZE: usize = 0x1000;

const SCRATCH_MASK: u32 = (SCRATCH_SIZE - 1) as u32;

/// Fixed-size memory of the RSP. Every access wraps around at 4KB, including multi-byte values
/// straddling the end.
#[derive(serde::Serialize, serde::Deserialize, Clone)]
pub struct Scratch {
    #[serde(with = "serde_big_array::BigArray")]
    data: [u8; SCRATCH_SIZE],
}

impl Scratch {
    pub fn new() -> Scratch {
        Scratch {
            data: [0; SCRATCH_SIZE],
        }
    }

    pub fn byte(&self, addr: u32) -> u8 {
        self.data[(addr & SCRATCH_MASK) as usize]
    }

    pub fn set_byte(&mut self, addr: u32, v: u8) {
        self.data[(addr & SCRATCH_MASK) as usize] = v;
    }

    /// Fetch the big endian value at `addr`
    pub fn load<T: Addressable>(&self, addr: u32) -> T {
        let mut v = 0u64;

        for i in 0..T::size() as u32 {
            v = (v << 8) | u64::from(self.byte(addr.wrapping_add(i)));
        }

        T::from_u64(v)
    }

    /// Store the big endian value `val` at `addr`
    pub fn store<T: Addressable>(&mut self, addr: u32, val: T) {
        let n = T::size() as u32;
        let v = val.as_u64();

        for i in 0..n {
            let shift = (n - 1 - i) * 8;

            self.set_byte(addr.wrapping_add(i), (v >> shift) as u8);
        }
    }

    /// Copy `bytes` starting at `addr`, wrapping around
    pub fn copy_from(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.set_byte(addr.wrapping_add(i as u32), b);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Scratch {
    fn default() -> Scratch {
        Scratch::new()
    }
}

#[test]
fn wrapping() {
    let mut s = Scratch::new();

    s.store::<u32>(0xffe, 0xaabb_ccdd);

    assert_eq!(s.byte(0xffe), 0xaa);
    assert_eq!(s.byte(0xfff), 0xbb);
    assert_eq!(s.byte(0x000), 0xcc);
    assert_eq!(s.byte(0x001), 0xdd);
    assert_eq!(s.load::<u32>(0x1ffe), 0xaabb_ccdd);
    assert_eq!(s.load::<u16>(0), 0xccdd);
}
