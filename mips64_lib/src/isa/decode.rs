//! Decode tables mapping instruction words to catalog entries

use super::catalog::*;
use super::opcode::{Family, Opcode, TableId};

type Row = &'static Opcode;

/// Hierarchical decode table: the primary opcode field selects an entry of the main table,
/// table placeholders redirect into sub-tables selected by another field.
pub struct DecodeTable {
    pub name: &'static str,
    main: &'static [Row; 64],
    tables: [&'static [Row]; TableId::COUNT],
}

impl DecodeTable {
    /// Return the catalog entry matching `word`. Unbound slots resolve to `NULL`
    pub fn lookup(&self, word: u32) -> &'static Opcode {
        let mut op = self.main[(word >> 26) as usize];

        // Sub-tables nest at most twice (COP1 -> FPU, COP0 -> TLB, COP2 -> VU)
        for _ in 0..3 {
            match op.family {
                Family::Table(t) => {
                    op = self.tables[t.index()]
                        .get(t.select(word))
                        .copied()
                        .unwrap_or(&NULL);
                }
                _ => return op,
            }
        }

        &NULL
    }

    /// Minimal encoding of `op` in this table: every field not used to reach the entry is
    /// zero. Returns `None` if the opcode is not reachable.
    pub fn encoding(&self, op: &Opcode) -> Option<u32> {
        self.main
            .iter()
            .enumerate()
            .find_map(|(i, &row)| self.search(row, op, (i as u32) << 26, 0))
    }

    fn search(&self, row: Row, op: &Opcode, word: u32, depth: u32) -> Option<u32> {
        if row.id == op.id && !row.is_null() {
            return Some(word);
        }

        let Family::Table(t) = row.family else {
            return None;
        };

        if depth > 2 {
            return None;
        }

        let (shift, _) = t.field();

        self.tables[t.index()]
            .iter()
            .enumerate()
            .find_map(|(j, &sub)| {
                // Placeholder rows repeat across the upper half of the coprocessor tables; keep
                // the first one
                self.search(sub, op, word | ((j as u32) << shift), depth + 1)
            })
    }

    /// Every concrete opcode reachable through this table, without duplicates
    pub fn reachable(&self) -> Vec<&'static Opcode> {
        let mut out: Vec<&'static Opcode> = Vec::new();
        let mut pending: Vec<Row> = self.main.to_vec();

        while let Some(row) = pending.pop() {
            match row.family {
                Family::Null => (),
                Family::Table(t) => {
                    // Guard against sub-tables being queued more than once
                    if !out.iter().any(|o| o.id == row.id) {
                        out.push(row);
                        pending.extend_from_slice(self.tables[t.index()]);
                    }
                }
                _ => {
                    if !out.iter().any(|o| o.id == row.id) {
                        out.push(row);
                    }
                }
            }
        }

        out.retain(|o| !o.is_table());
        out.sort_by_key(|o| o.id);
        out
    }
}

const EMPTY: &[Row] = &[];

/// Decode table of the R4300i
pub static R4300I: DecodeTable = DecodeTable {
    name: "r4300i",
    main: &CPU_MAIN,
    tables: [
        &CPU_SPECIAL,
        &CPU_REGIMM,
        &CPU_COP0,
        &CPU_TLB,
        &CPU_COP1,
        &CPU_BC1,
        &CPU_FPU,
        EMPTY,
        EMPTY,
        EMPTY,
        EMPTY,
    ],
};

/// Decode table of the RSP
pub static RSP: DecodeTable = DecodeTable {
    name: "rsp",
    main: &RSP_MAIN,
    tables: [
        &RSP_SPECIAL,
        &RSP_REGIMM,
        &RSP_COP0,
        EMPTY,
        EMPTY,
        EMPTY,
        EMPTY,
        &RSP_COP2,
        &RSP_VU,
        &RSP_LWC2,
        &RSP_SWC2,
    ],
};

#[rustfmt::skip]
static CPU_MAIN: [Row; 64] = [
    // 0x00
    &SPECIAL, &REGIMM, &J, &JAL, &BEQ, &BNE, &BLEZ, &BGTZ,
    // 0x08
    &ADDI, &ADDIU, &SLTI, &SLTIU, &ANDI, &ORI, &XORI, &LUI,
    // 0x10
    &COP0, &COP1, &NULL, &NULL, &BEQL, &BNEL, &BLEZL, &BGTZL,
    // 0x18
    &DADDI, &DADDIU, &LDL, &LDR, &NULL, &NULL, &NULL, &NULL,
    // 0x20
    &LB, &LH, &LWL, &LW, &LBU, &LHU, &LWR, &LWU,
    // 0x28
    &SB, &SH, &SWL, &SW, &SDL, &SDR, &SWR, &CACHE,
    // 0x30
    &LL, &LWC1, &NULL, &NULL, &LLD, &LDC1, &NULL, &LD,
    // 0x38
    &SC, &SWC1, &NULL, &NULL, &SCD, &SDC1, &NULL, &SD,
];

#[rustfmt::skip]
static CPU_SPECIAL: [Row; 64] = [
    // 0x00
    &SLL, &NULL, &SRL, &SRA, &SLLV, &NULL, &SRLV, &SRAV,
    // 0x08
    &JR, &JALR, &NULL, &NULL, &SYSCALL, &BREAK, &NULL, &SYNC,
    // 0x10
    &MFHI, &MTHI, &MFLO, &MTLO, &DSLLV, &NULL, &DSRLV, &DSRAV,
    // 0x18
    &MULT, &MULTU, &DIV, &DIVU, &DMULT, &DMULTU, &DDIV, &DDIVU,
    // 0x20
    &ADD, &ADDU, &SUB, &SUBU, &AND, &OR, &XOR, &NOR,
    // 0x28
    &NULL, &NULL, &SLT, &SLTU, &DADD, &DADDU, &DSUB, &DSUBU,
    // 0x30
    &TGE, &TGEU, &TLT, &TLTU, &TEQ, &NULL, &TNE, &NULL,
    // 0x38
    &DSLL, &NULL, &DSRL, &DSRA, &DSLL32, &NULL, &DSRL32, &DSRA32,
];

#[rustfmt::skip]
static CPU_REGIMM: [Row; 32] = [
    // 0x00
    &BLTZ, &BGEZ, &BLTZL, &BGEZL, &NULL, &NULL, &NULL, &NULL,
    // 0x08
    &TGEI, &TGEIU, &TLTI, &TLTIU, &TEQI, &NULL, &TNEI, &NULL,
    // 0x10
    &BLTZAL, &BGEZAL, &BLTZALL, &BGEZALL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static CPU_COP0: [Row; 32] = [
    // 0x00
    &MFC0, &DMFC0, &NULL, &NULL, &MTC0, &DMTC0, &NULL, &NULL,
    // 0x08
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x10: CO bit set
    &TLB, &TLB, &TLB, &TLB, &TLB, &TLB, &TLB, &TLB,
    // 0x18
    &TLB, &TLB, &TLB, &TLB, &TLB, &TLB, &TLB, &TLB,
];

#[rustfmt::skip]
static CPU_TLB: [Row; 64] = [
    // 0x00
    &NULL, &TLBR, &TLBWI, &NULL, &NULL, &NULL, &TLBWR, &NULL,
    // 0x08
    &TLBP, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x10
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &ERET, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x20
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x28
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x30
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x38
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static CPU_COP1: [Row; 32] = [
    // 0x00
    &MFC1, &DMFC1, &CFC1, &NULL, &MTC1, &DMTC1, &CTC1, &NULL,
    // 0x08
    &BC1, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x10: S, D, W, L formats
    &FPU, &FPU, &NULL, &NULL, &FPU, &FPU, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

static CPU_BC1: [Row; 4] = [&BC1F, &BC1T, &BC1FL, &BC1TL];

#[rustfmt::skip]
static CPU_FPU: [Row; 64] = [
    // 0x00
    &ADD_FMT, &SUB_FMT, &MUL_FMT, &DIV_FMT, &SQRT_FMT, &ABS_FMT, &MOV_FMT, &NEG_FMT,
    // 0x08
    &ROUND_L, &TRUNC_L, &CEIL_L, &FLOOR_L, &ROUND_W, &TRUNC_W, &CEIL_W, &FLOOR_W,
    // 0x10
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x20
    &CVT_S, &CVT_D, &NULL, &NULL, &CVT_W, &CVT_L, &NULL, &NULL,
    // 0x28
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x30
    &C_F, &C_UN, &C_EQ, &C_UEQ, &C_OLT, &C_ULT, &C_OLE, &C_ULE,
    // 0x38
    &C_SF, &C_NGLE, &C_SEQ, &C_NGL, &C_LT, &C_NGE, &C_LE, &C_NGT,
];

#[rustfmt::skip]
static RSP_MAIN: [Row; 64] = [
    // 0x00
    &SPECIAL, &REGIMM, &J, &JAL, &BEQ, &BNE, &BLEZ, &BGTZ,
    // 0x08
    &ADDI, &ADDIU, &SLTI, &SLTIU, &ANDI, &ORI, &XORI, &LUI,
    // 0x10
    &COP0, &NULL, &COP2, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x20
    &LB, &LH, &NULL, &LW, &LBU, &LHU, &NULL, &NULL,
    // 0x28
    &SB, &SH, &NULL, &SW, &NULL, &NULL, &NULL, &NULL,
    // 0x30
    &NULL, &NULL, &LWC2, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x38
    &NULL, &NULL, &SWC2, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static RSP_SPECIAL: [Row; 64] = [
    // 0x00
    &SLL, &NULL, &SRL, &SRA, &SLLV, &NULL, &SRLV, &SRAV,
    // 0x08
    &JR, &JALR, &NULL, &NULL, &NULL, &BREAK, &NULL, &NULL,
    // 0x10
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x20
    &ADD, &ADDU, &SUB, &SUBU, &AND, &OR, &XOR, &NOR,
    // 0x28
    &NULL, &NULL, &SLT, &SLTU, &NULL, &NULL, &NULL, &NULL,
    // 0x30
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x38
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static RSP_REGIMM: [Row; 32] = [
    // 0x00
    &BLTZ, &BGEZ, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x08
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x10
    &BLTZAL, &BGEZAL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static RSP_COP0: [Row; 32] = [
    // 0x00
    &MFC0, &NULL, &NULL, &NULL, &MTC0, &NULL, &NULL, &NULL,
    // 0x08
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x10
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static RSP_COP2: [Row; 32] = [
    // 0x00
    &MFC2, &NULL, &CFC2, &NULL, &MTC2, &NULL, &CTC2, &NULL,
    // 0x08
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x10: element selector in the low four bits
    &VU, &VU, &VU, &VU, &VU, &VU, &VU, &VU,
    // 0x18
    &VU, &VU, &VU, &VU, &VU, &VU, &VU, &VU,
];

#[rustfmt::skip]
static RSP_VU: [Row; 64] = [
    // 0x00
    &VMULF, &VMULU, &VRNDP, &VMULQ, &VMUDL, &VMUDM, &VMUDN, &VMUDH,
    // 0x08
    &VMACF, &VMACU, &VRNDN, &VMACQ, &VMADL, &VMADM, &VMADN, &VMADH,
    // 0x10
    &VADD, &VSUB, &VSUT, &VABS, &VADDC, &VSUBC, &VADDB, &VSUBB,
    // 0x18
    &VACCB, &VSUCB, &VSAD, &VSAC, &VSUM, &VSAR, &VACC, &VSUC,
    // 0x20
    &VLT, &VEQ, &VNE, &VGE, &VCL, &VCH, &VCR, &VMRG,
    // 0x28
    &VAND, &VNAND, &VOR, &VNOR, &VXOR, &VNXOR, &V056, &V057,
    // 0x30
    &VRCP, &VRCPL, &VRCPH, &VMOV, &VRSQ, &VRSQL, &VRSQH, &VNOP,
    // 0x38
    &VEXTT, &VEXTQ, &VEXTN, &V073, &VINST, &VINSQ, &VINSN, &VNULL,
];

#[rustfmt::skip]
static RSP_LWC2: [Row; 32] = [
    // 0x00
    &LBV, &LSV, &LLV, &LDV, &LQV, &LRV, &LPV, &LUV,
    // 0x08
    &LHV, &LFV, &LWV, &LTV, &NULL, &NULL, &NULL, &NULL,
    // 0x10
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];

#[rustfmt::skip]
static RSP_SWC2: [Row; 32] = [
    // 0x00
    &SBV, &SSV, &SLV, &SDV, &SQV, &SRV, &SPV, &SUV,
    // 0x08
    &SHV, &SFV, &SWV, &STV, &NULL, &NULL, &NULL, &NULL,
    // 0x10
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
    // 0x18
    &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL, &NULL,
];
