//! Joint TLB entry storage. Entries are maintained by TLBR/TLBWI/TLBWR/TLBP but address
//! translation does not consult them.

pub const TLB_ENTRIES: usize = 32;

/// Global bit in EntryLo0/EntryLo1
const ENTRY_LO_GLOBAL: u64 = 1;

/// Bits of EntryHi compared by TLBP once the page mask is applied: R (63..62) and VPN2
const ENTRY_HI_VPN_MASK: u64 = 0xc000_00ff_ffff_e000;

const ENTRY_HI_ASID_MASK: u64 = 0xff;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TlbEntry {
    pub page_mask: u64,
    pub entry_hi: u64,
    pub entry_lo0: u64,
    pub entry_lo1: u64,
    pub global: bool,
}

impl TlbEntry {
    fn matches(&self, entry_hi: u64) -> bool {
        let mask = !(self.page_mask | 0x1fff) & ENTRY_HI_VPN_MASK;

        if (self.entry_hi & mask) != (entry_hi & mask) {
            return false;
        }

        self.global || (self.entry_hi & ENTRY_HI_ASID_MASK) == (entry_hi & ENTRY_HI_ASID_MASK)
    }
}

pub struct Tlb {
    entries: [TlbEntry; TLB_ENTRIES],
}

impl Tlb {
    pub fn new() -> Tlb {
        Tlb {
            entries: [TlbEntry::default(); TLB_ENTRIES],
        }
    }

    pub fn entry(&self, index: usize) -> &TlbEntry {
        &self.entries[index % TLB_ENTRIES]
    }

    /// Store an entry built from the current PageMask, EntryHi, EntryLo0 and EntryLo1
    pub fn write(&mut self, index: usize, page_mask: u64, entry_hi: u64, lo0: u64, lo1: u64) {
        let global = (lo0 & lo1 & ENTRY_LO_GLOBAL) != 0;

        self.entries[index % TLB_ENTRIES] = TlbEntry {
            page_mask,
            entry_hi: entry_hi & !page_mask,
            entry_lo0: lo0 & !ENTRY_LO_GLOBAL,
            entry_lo1: lo1 & !ENTRY_LO_GLOBAL,
            global,
        };
    }

    /// Values of (PageMask, EntryHi, EntryLo0, EntryLo1) as read back by TLBR
    pub fn read(&self, index: usize) -> (u64, u64, u64, u64) {
        let e = self.entry(index);
        let g = if e.global { ENTRY_LO_GLOBAL } else { 0 };

        (
            e.page_mask,
            e.entry_hi & !e.page_mask,
            e.entry_lo0 | g,
            e.entry_lo1 | g,
        )
    }

    /// Index of the entry matching `entry_hi`
    pub fn probe(&self, entry_hi: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.matches(entry_hi))
    }
}

impl Default for Tlb {
    fn default() -> Tlb {
        Tlb::new()
    }
}

#[test]
fn probe() {
    let mut tlb = Tlb::new();

    // VPN2 0x4000, ASID 5, not global
    tlb.write(3, 0, 0x0000_4000 | 5, 0x10, 0x21);
    // 16KB pages, global
    tlb.write(7, 0x6000, 0x0010_0000 | 9, 0x13, 0x23);

    assert_eq!(tlb.probe(0x0000_4000 | 5), Some(3));
    assert_eq!(tlb.probe(0x0000_4000 | 6), None);
    // Global entries ignore the ASID and the masked VPN bits
    assert_eq!(tlb.probe(0x0010_6000 | 1), Some(7));
    assert_eq!(tlb.probe(0x0010_8000), None);

    assert_eq!(tlb.read(3), (0, 0x4005, 0x10, 0x20));
    assert_eq!(tlb.read(7), (0x6000, 0x0010_0009, 0x13, 0x23));
}
