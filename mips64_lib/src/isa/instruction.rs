use super::flags::ExecFlags;
use super::opcode::Opcode;
use std::fmt;

/// Raw 32-bit instruction word
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Return bits [31:26] of the instruction
    pub fn opcode(self) -> usize {
        let Instruction(op) = self;

        (op >> 26) as usize
    }

    /// Return bits [5:0] of the instruction
    pub fn function(self) -> usize {
        let Instruction(op) = self;

        (op & 0x3f) as usize
    }

    /// Return register index in bits [25:21]
    pub fn rs(self) -> usize {
        let Instruction(op) = self;

        ((op >> 21) & 0x1f) as usize
    }

    /// Return register index in bits [20:16]
    pub fn rt(self) -> usize {
        let Instruction(op) = self;

        ((op >> 16) & 0x1f) as usize
    }

    /// Return register index in bits [15:11]
    pub fn rd(self) -> usize {
        let Instruction(op) = self;

        ((op >> 11) & 0x1f) as usize
    }

    /// Shift Immediate values are stored in bits [10:6]
    pub fn sa(self) -> u32 {
        let Instruction(op) = self;

        (op >> 6) & 0x1f
    }

    /// Return immediate value in bits [15:0]
    pub fn imm(self) -> u16 {
        let Instruction(op) = self;

        op as u16
    }

    /// Immediate value sign-extended to 64 bits
    pub fn imm_se(self) -> u64 {
        self.imm() as i16 as i64 as u64
    }

    /// Jump target stored in bits [25:0]
    pub fn target(self) -> u32 {
        let Instruction(op) = self;

        // The two LSBs aren't stored since (due to alignment constraints) they're assumed to be 0
        (op & 0x3ff_ffff) << 2
    }

    /// Exception code carried by SYSCALL and BREAK in bits [25:6]
    pub fn code(self) -> u32 {
        let Instruction(op) = self;

        (op >> 6) & 0xf_ffff
    }

    /// Exception code carried by register traps in bits [15:6]
    pub fn trap_code(self) -> u32 {
        let Instruction(op) = self;

        (op >> 6) & 0x3ff
    }

    /// FPU operand format, encoded in the rs field
    pub fn fmt(self) -> usize {
        self.rs()
    }

    /// FPU target register, bits [20:16]
    pub fn ft(self) -> usize {
        self.rt()
    }

    /// FPU source register, bits [15:11]
    pub fn fs(self) -> usize {
        self.rd()
    }

    /// FPU destination register, bits [10:6]
    pub fn fd(self) -> usize {
        self.sa() as usize
    }

    /// Vector element selector of computational instructions, bits [24:21]
    pub fn element(self) -> usize {
        let Instruction(op) = self;

        ((op >> 21) & 0xf) as usize
    }

    /// Vector element selector of load/store and transfer instructions, bits [10:7]
    pub fn ls_element(self) -> usize {
        let Instruction(op) = self;

        ((op >> 7) & 0xf) as usize
    }

    /// Signed 7-bit offset of vector loads and stores, not yet scaled by the access size
    pub fn ls_offset(self) -> i32 {
        let Instruction(op) = self;

        // Sign extend bits [6:0]
        ((op << 25) as i32) >> 25
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// An instruction word resolved against a decode table
#[derive(Clone, Copy)]
pub struct DecodedInstruction {
    /// Address the word was fetched from
    pub address: u64,
    pub inst: Instruction,
    pub op: &'static Opcode,
}

impl DecodedInstruction {
    pub fn is_valid(&self) -> bool {
        !self.op.is_null()
    }

    pub fn has(&self, flags: ExecFlags) -> bool {
        self.op.has(flags)
    }

    pub fn is_unsigned(&self) -> bool {
        self.has(ExecFlags::UNSIGNED)
    }

    pub fn is_likely(&self) -> bool {
        self.has(ExecFlags::LIKELY)
    }

    pub fn is_link(&self) -> bool {
        self.has(ExecFlags::LINK)
    }

    pub fn is_immediate(&self) -> bool {
        self.has(ExecFlags::IMMEDIATE)
    }

    pub fn source(&self) -> usize {
        self.inst.rs()
    }

    pub fn target(&self) -> usize {
        self.inst.rt()
    }

    pub fn dest(&self) -> usize {
        self.inst.rd()
    }

    /// Shift amount for immediate shifts, including the implicit +32 of the `*32` variants
    pub fn shift_amount(&self) -> u32 {
        if self.has(ExecFlags::SHIFT_32) {
            self.inst.sa() + 32
        } else {
            self.inst.sa()
        }
    }

    pub fn data_size(&self) -> usize {
        self.op.data_size()
    }

    /// Byte offset of a vector load or store
    pub fn vector_offset(&self) -> i32 {
        self.inst.ls_offset() * self.data_size() as i32
    }
}

impl fmt::Debug for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016x}: {} {}", self.address, self.inst, self.op.mnemonic)
    }
}

#[test]
fn field_extraction() {
    // addiu sp, sp, -32
    let i = Instruction(0x27bd_ffe0);

    assert_eq!(i.opcode(), 0x09);
    assert_eq!(i.rs(), 29);
    assert_eq!(i.rt(), 29);
    assert_eq!(i.imm(), 0xffe0);
    assert_eq!(i.imm_se(), 0xffff_ffff_ffff_ffe0);

    // lqv v1[e0], -1(r4)
    let i = Instruction(0xc881_207f);

    assert_eq!(i.rt(), 1);
    assert_eq!(i.rd(), 4);
    assert_eq!(i.ls_element(), 0);
    assert_eq!(i.ls_offset(), -1);

    let i = Instruction(0x0000_0008 | (0x3f << 6));
    assert_eq!(i.sa(), 0x1f);
}
