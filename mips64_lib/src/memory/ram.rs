use super::PhysicalMemory;
use crate::error::{MipsError, MipsResult};

/// Flat physical RAM starting at physical address 0
pub struct Ram {
    data: Box<[u8]>,
}

impl Ram {
    pub fn new(size: usize) -> Ram {
        Ram {
            data: vec![0; size].into_boxed_slice(),
        }
    }

    /// Copy `image` at physical address `offset`
    pub fn load_image(&mut self, offset: u32, image: &[u8]) -> MipsResult<()> {
        let start = offset as usize;
        let end = start + image.len();

        if end > self.data.len() {
            return Err(MipsError::InvalidState(format!(
                "image of {} bytes doesn't fit at 0x{:08x} in {} bytes of RAM",
                image.len(),
                offset,
                self.data.len()
            )));
        }

        self.data[start..end].copy_from_slice(image);

        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn range(&self, addr: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = addr as usize;
        let end = start.checked_add(len)?;

        if end <= self.data.len() {
            Some(start..end)
        } else {
            None
        }
    }
}

impl PhysicalMemory for Ram {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> bool {
        match self.range(addr, buf.len()) {
            Some(r) => {
                buf.copy_from_slice(&self.data[r]);
                true
            }
            None => false,
        }
    }

    fn write_bytes(&mut self, addr: u32, buf: &[u8]) -> bool {
        match self.range(addr, buf.len()) {
            Some(r) => {
                self.data[r].copy_from_slice(buf);
                true
            }
            None => false,
        }
    }
}

#[test]
fn image_bounds() {
    let mut ram = Ram::new(16);

    ram.load_image(12, &[1, 2, 3, 4]).unwrap();
    assert_eq!(&ram.as_slice()[12..], &[1, 2, 3, 4]);

    assert!(ram.load_image(13, &[1, 2, 3, 4]).is_err());
}
