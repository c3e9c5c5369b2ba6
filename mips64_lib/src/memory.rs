//! Memory sections seen by the cores. Values are stored big-endian whatever the host byte order.

pub mod map;
pub mod ram;
pub mod scratch;

pub use ram::Ram;
pub use scratch::Scratch;

/// Access sizes supported by the R4300i data path
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum AccessWidth {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
    DoubleWord = 8,
}

pub trait Addressable: Copy {
    fn width() -> AccessWidth;

    fn from_u64(v: u64) -> Self;

    fn as_u64(self) -> u64;

    fn size() -> usize {
        Self::width() as usize
    }
}

macro_rules! impl_addressable {
    ( $( $t:ty => $w:ident ),* ) => {
        $(
            impl Addressable for $t {
                fn width() -> AccessWidth {
                    AccessWidth::$w
                }

                fn from_u64(v: u64) -> $t {
                    v as $t
                }

                fn as_u64(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_addressable!(u8 => Byte, u16 => HalfWord, u32 => Word, u64 => DoubleWord);

/// Byte-addressed physical memory. Accesses outside of the section fail and return `false`,
/// the CPU turns that into a bus error.
pub trait PhysicalMemory: Send {
    fn size(&self) -> usize;

    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> bool;

    fn write_bytes(&mut self, addr: u32, buf: &[u8]) -> bool;
}

impl<'a> dyn PhysicalMemory + 'a {
    /// Load the big-endian value at `addr`
    pub fn load<T: Addressable>(&self, addr: u32) -> Option<T> {
        let mut buf = [0u8; 8];
        let n = T::size();

        if !self.read_bytes(addr, &mut buf[..n]) {
            return None;
        }

        let v = buf[..n].iter().fold(0u64, |v, &b| (v << 8) | u64::from(b));

        Some(T::from_u64(v))
    }

    /// Store `val` big-endian at `addr`
    pub fn store<T: Addressable>(&mut self, addr: u32, val: T) -> bool {
        let n = T::size();
        let bytes = val.as_u64().to_be_bytes();

        self.write_bytes(addr, &bytes[8 - n..])
    }
}

#[test]
fn big_endian_accessors() {
    let mut ram: Box<dyn PhysicalMemory> = Box::new(Ram::new(0x100));

    assert!(ram.store::<u32>(0x10, 0x1122_3344));
    assert_eq!(ram.load::<u8>(0x10), Some(0x11));
    assert_eq!(ram.load::<u16>(0x12), Some(0x3344));
    assert_eq!(ram.load::<u64>(0x10), Some(0x1122_3344_0000_0000));

    assert!(ram.store::<u64>(0x20, 0x0102_0304_0506_0708));
    assert_eq!(ram.load::<u32>(0x24), Some(0x0506_0708));

    // Out of range
    assert_eq!(ram.load::<u32>(0xfe), None);
    assert!(!ram.store::<u8>(0x100, 0));
}
