//! Opcode descriptors. Every entry of the catalog is a static `Opcode` built in a const context

use super::catalog::OpId;
use super::flags::{ExecFlags, VectorFlags};
use std::fmt;

/// Broad class of an opcode, used by the call tables to group handlers
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Family {
    /// Unbound slot of a decode table
    Null,
    /// Placeholder that redirects decoding into a sub-table
    Table(TableId),
    Reg,
    Branch,
    Load,
    Store,
    LoadFpu,
    StoreFpu,
    Cop0,
    Fpu,
    Tlb,
    Cache,
    Sync,
    Trap,
    Vu,
}

/// Sub-tables reachable from the main decode table. Each one knows which instruction field
/// it is indexed with.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TableId {
    Special,
    RegImm,
    Cop0,
    Tlb,
    Cop1,
    Bc1,
    Fpu,
    Cop2,
    Vu,
    VuLoad,
    VuStore,
}

impl TableId {
    pub const COUNT: usize = 11;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit position and width of the field selecting an entry in this table
    pub fn field(self) -> (u32, u32) {
        match self {
            TableId::Special | TableId::Tlb | TableId::Fpu | TableId::Vu => (0, 6),
            TableId::RegImm => (16, 5),
            TableId::Bc1 => (16, 2),
            TableId::Cop0 | TableId::Cop1 | TableId::Cop2 => (21, 5),
            TableId::VuLoad | TableId::VuStore => (11, 5),
        }
    }

    /// Extract the table index from an instruction word
    pub fn select(self, word: u32) -> usize {
        let (shift, width) = self.field();

        ((word >> shift) & ((1 << width) - 1)) as usize
    }
}

/// Operand layout, drives both the disassembler and the assembler
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    Empty,
    Jump,
    /// `rs, rt, target`
    Branch2,
    /// `rs, target`
    Branch1,
    /// `target`
    Bc1,
    /// `rt, rs, imm`
    ITsi,
    /// `rt, imm`
    ITi,
    /// `rt, imm(rs)`
    ITis,
    /// `ft, imm(rs)`
    IFtis,
    /// `rs, imm`
    ISi,
    /// `op, imm(rs)`
    Cache,
    /// `rt, cN`
    Cop0,
    /// `rt, fN`
    Cop1,
    /// `rt, fcrN`
    Cop1Ctl,
    /// `fd, fs, ft`
    Cop1Dst,
    /// `fd, fs`
    Cop1Ds,
    /// `fs, ft`
    Cop1St,
    RDta,
    RDts,
    RS,
    RSd,
    RD,
    RSt,
    RDst,
    Code,
    TrapWithCode,
    /// `vd, vs, vt[e]`
    VuStd,
    /// `vd[de], vt[e]`
    VuSeDe,
    /// `vt[e], offset(rs)`
    VuLoadStore,
    /// `rt, vN[e]`
    VuMove,
    /// `rt, vcN`
    VuCtl,
}

/// Register file touched by a transfer operation
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum RegBound {
    None,
    Gpr,
    Hi,
    Lo,
    Cp0,
    Fpr,
    FpuCtl,
    Vpr,
    VuCtl,
}

/// Arithmetic or logical operation performed by a shared handler
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Arith {
    None,
    And,
    Nand,
    Or,
    Xor,
    Nxor,
    Nor,
    LeftShift,
    RightShift,
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    GreaterThan,
    LessThan,
    True,
    False,
    Signaling,
    Absolute,
    Move,
}

/// One catalog entry
pub struct Opcode {
    pub id: OpId,
    pub mnemonic: &'static str,
    pub family: Family,
    pub format: Format,
    pub arith: Arith,
    pub flags: ExecFlags,
    pub vector: VectorFlags,
    pub source: RegBound,
    pub target: RegBound,
}

impl Opcode {
    pub(super) const fn new(mnemonic: &'static str, family: Family, format: Format) -> Opcode {
        Opcode {
            id: OpId::NULL,
            mnemonic,
            family,
            format,
            arith: Arith::None,
            flags: ExecFlags::empty(),
            vector: VectorFlags::empty(),
            source: RegBound::None,
            target: RegBound::None,
        }
    }

    pub(super) const fn table(mnemonic: &'static str, table: TableId) -> Opcode {
        Opcode::new(mnemonic, Family::Table(table), Format::Empty)
    }

    pub(super) const fn with_id(mut self, id: OpId) -> Opcode {
        self.id = id;
        self
    }

    pub(super) const fn arith(mut self, arith: Arith) -> Opcode {
        self.arith = arith;
        self
    }

    pub(super) const fn flags(mut self, flags: ExecFlags) -> Opcode {
        self.flags = flags;
        self
    }

    pub(super) const fn vector(mut self, vector: VectorFlags) -> Opcode {
        self.vector = vector;
        self
    }

    pub(super) const fn xfer(mut self, source: RegBound, target: RegBound) -> Opcode {
        self.source = source;
        self.target = target;
        self
    }

    pub fn is_null(&self) -> bool {
        self.family == Family::Null
    }

    pub fn is_table(&self) -> bool {
        matches!(self.family, Family::Table(_))
    }

    pub fn has(&self, flags: ExecFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn has_vector(&self, flags: VectorFlags) -> bool {
        self.vector.contains(flags)
    }

    /// Access size in bytes, derived from the data flags
    pub fn data_size(&self) -> usize {
        if self.has(ExecFlags::DATA_8) {
            1
        } else if self.has(ExecFlags::DATA_16) {
            2
        } else if self.has(ExecFlags::DATA_32) {
            4
        } else if self.has(ExecFlags::DATA_64) {
            8
        } else if self.has(ExecFlags::DATA_128) {
            16
        } else {
            0
        }
    }
}

impl PartialEq for Opcode {
    fn eq(&self, other: &Opcode) -> bool {
        self.id == other.id && self.family == other.family
    }
}

impl Eq for Opcode {}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:?})", self.mnemonic, self.id)
    }
}
