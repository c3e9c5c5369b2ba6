//! Execution attributes attached to catalog entries

use bitflags::bitflags;

bitflags! {
    /// Flags describing how an opcode executes. Handlers shared by several opcodes branch on
    /// these instead of on the opcode identity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ExecFlags: u32 {
        const IMMEDIATE   = 1 << 0;
        const UNSIGNED    = 1 << 1;
        /// Only legal while the CPU runs in 64-bit mode
        const RESERVED_32 = 1 << 2;
        /// Only legal while the CPU runs in 32-bit mode
        const RESERVED_64 = 1 << 3;
        const VAR_SHIFT   = 1 << 4;
        /// Shift amount is the immediate plus 32
        const SHIFT_32    = 1 << 5;
        const DATA_8      = 1 << 6;
        const DATA_16     = 1 << 7;
        const DATA_32     = 1 << 8;
        const DATA_64     = 1 << 9;
        const DATA_128    = 1 << 10;
        /// Delay slot is nullified when the branch is not taken
        const LIKELY      = 1 << 11;
        /// Writes a return address (branches) or sets the LL bit (loads/stores)
        const LINK        = 1 << 12;
        /// Jump target comes from a register
        const REGISTER    = 1 << 13;
        const LEFT        = 1 << 14;
        const RIGHT       = 1 << 15;
        const DATA_S      = 1 << 16;
        const DATA_D      = 1 << 17;
        const COND_LT     = 1 << 18;
        const COND_EQ     = 1 << 19;
        const COND_UN     = 1 << 20;
        /// Unordered operands raise the invalid operation flag
        const COND_SIGNAL = 1 << 21;
        const CARRY       = 1 << 22;
    }
}

bitflags! {
    /// Vector unit specific attributes
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VectorFlags: u32 {
        const ACCUMULATE     = 1 << 0;
        const QUANTIZED      = 1 << 1;
        const PARTIAL_L      = 1 << 2;
        const PARTIAL_M      = 1 << 3;
        const PARTIAL_N      = 1 << 4;
        const PARTIAL_H      = 1 << 5;
        const ROUND_POSITIVE = 1 << 6;
        const ROUND_NEGATIVE = 1 << 7;
        const SQUARE_ROOT    = 1 << 8;
        const CRIMP          = 1 << 9;
        const MERGE          = 1 << 10;
        const HALF           = 1 << 11;
        const FORTH          = 1 << 12;
        const UPPER          = 1 << 13;
        const WRAP           = 1 << 14;
        const TRANSPOSE      = 1 << 15;
        const REST           = 1 << 16;
    }
}

/// Build an `ExecFlags` set in a const context
macro_rules! exec {
    () => { $crate::isa::flags::ExecFlags::empty() };
    ( $( $f:ident )|+ ) => {
        $crate::isa::flags::ExecFlags::empty() $( .union($crate::isa::flags::ExecFlags::$f) )+
    };
}

/// Build a `VectorFlags` set in a const context
macro_rules! vector {
    ( $( $f:ident )|+ ) => {
        $crate::isa::flags::VectorFlags::empty() $( .union($crate::isa::flags::VectorFlags::$f) )+
    };
}

pub(crate) use exec;
pub(crate) use vector;

#[test]
fn const_flag_sets() {
    const F: ExecFlags = exec!(IMMEDIATE | UNSIGNED | RESERVED_32);

    assert!(F.contains(ExecFlags::UNSIGNED));
    assert!(!F.contains(ExecFlags::LIKELY));
    assert_eq!(F.bits(), 0b111);

    const V: VectorFlags = vector!(ACCUMULATE | PARTIAL_H);
    assert!(V.contains(VectorFlags::PARTIAL_H));
    assert!(!V.contains(VectorFlags::PARTIAL_L));
}
