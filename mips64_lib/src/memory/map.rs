//! R4300i virtual address map. Only the unmapped kernel segments are translated; everything
//! that would go through the TLB is reported as unsupported.

use crate::error::{MipsError, MipsResult};

/// Virtual address segments
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Segment {
    /// User segment, TLB mapped
    KUseg,
    /// Kernel, cached, unmapped
    Kseg0,
    /// Kernel, uncached, unmapped
    Kseg1,
    /// Supervisor segment, TLB mapped
    KSseg,
    /// Kernel, TLB mapped
    Kseg3,
    /// 64-bit kernel physical window
    Xkphys,
    /// Any other 64-bit region (all TLB mapped)
    XMapped,
}

/// Classify `vaddr`. Addresses that are the sign extension of a 32-bit address use the 32-bit
/// compatibility map.
pub fn segment(vaddr: u64) -> Segment {
    let compat = (vaddr as u32) as i32 as i64 as u64 == vaddr;

    if compat {
        match (vaddr as u32) >> 29 {
            0..=3 => Segment::KUseg,
            4 => Segment::Kseg0,
            5 => Segment::Kseg1,
            6 => Segment::KSseg,
            _ => Segment::Kseg3,
        }
    } else if vaddr >> 62 == 2 {
        Segment::Xkphys
    } else {
        Segment::XMapped
    }
}

/// Translate `vaddr` to a physical address. `bypass` identity-maps the low 32 bits of every
/// address, which lets test programs run from any address.
pub fn translate(vaddr: u64, bypass: bool) -> MipsResult<u32> {
    if bypass {
        return Ok(vaddr as u32);
    }

    match segment(vaddr) {
        Segment::Kseg0 => Ok((vaddr as u32) - 0x8000_0000),
        Segment::Kseg1 => Ok((vaddr as u32) & 0x1fff_ffff),
        Segment::Xkphys => Ok(vaddr as u32),
        seg => {
            error!("TLB translation of 0x{:016x} ({:?}) is not implemented", vaddr, seg);
            Err(MipsError::Unsupported(format!(
                "TLB mapped address 0x{:016x} ({:?})",
                vaddr, seg
            )))
        }
    }
}

#[test]
fn kernel_segments() {
    assert_eq!(translate(0xffff_ffff_8000_0400, false).unwrap(), 0x400);
    assert_eq!(translate(0xffff_ffff_9fc0_0000, false).unwrap(), 0x1fc0_0000);
    assert_eq!(translate(0xffff_ffff_a400_0040, false).unwrap(), 0x0400_0040);
    assert_eq!(translate(0xffff_ffff_bfc0_0000, false).unwrap(), 0x1fc0_0000);
    assert_eq!(translate(0x9000_0000_0000_1000, false).unwrap(), 0x1000);
}

#[test]
fn mapped_segments_fail() {
    assert!(translate(0x0000_1000, false).is_err());
    assert!(translate(0xffff_ffff_c000_0000, false).is_err());
    assert!(translate(0x4000_0000_0000_0000, false).is_err());
    // Not sign extended: not part of the 32-bit compatibility map
    assert_eq!(segment(0x8000_0000), Segment::XMapped);

    assert_eq!(translate(0x0000_1000, true).unwrap(), 0x1000);
}
