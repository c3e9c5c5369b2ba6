//! Instruction set description shared by the R4300i and the RSP: opcode catalog, decode tables,
//! handler call tables and the disassembler.

pub mod call_table;
pub mod catalog;
pub mod decode;
pub mod disasm;
pub mod flags;
pub mod instruction;
pub mod opcode;

#[cfg(test)]
mod test;

pub use call_table::{CallTable, Handler};
pub use catalog::OpId;
pub use decode::{DecodeTable, R4300I, RSP};
pub use disasm::{disassemble, Assembler};
pub use flags::{ExecFlags, VectorFlags};
pub use instruction::{DecodedInstruction, Instruction};
pub use opcode::{Arith, Family, Format, Opcode, RegBound, TableId};

/// Decode `word` fetched from `address` with `table`
pub fn decode(table: &DecodeTable, word: u32, address: u64) -> DecodedInstruction {
    DecodedInstruction {
        address,
        inst: Instruction(word),
        op: table.lookup(word),
    }
}
