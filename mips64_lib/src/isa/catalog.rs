//! The opcode catalog shared by the R4300i and RSP decode tables.
//!
//! Opcodes that behave the same way on both processors (e.g. `addiu` or `lw`) have a single
//! entry here; the decode tables decide which ones each processor can reach.

use super::flags::{exec, vector};
use super::opcode::{Arith as A, Family as F, Format as Fm, Opcode, RegBound as R, TableId as T};

// Generate the `OpId` enum, one static per entry and the `CATALOG` array indexed by `OpId`
macro_rules! catalog {
    ( $( $name:ident => $def:expr, )* ) => {
        /// Identity of every catalog entry. Call tables are indexed with it
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
        pub enum OpId {
            $( $name, )*
        }

        impl OpId {
            pub const COUNT: usize = [$( stringify!($name) ),*].len();

            pub fn index(self) -> usize {
                self as usize
            }
        }

        $(
            pub static $name: Opcode = $def.with_id(OpId::$name);
        )*

        /// Every catalog entry, ordered by `OpId`
        pub static CATALOG: [&Opcode; OpId::COUNT] = [ $( &$name, )* ];
    };
}

const fn reg(mnemonic: &'static str, format: Fm) -> Opcode {
    Opcode::new(mnemonic, F::Reg, format)
}

const fn branch(mnemonic: &'static str, format: Fm) -> Opcode {
    Opcode::new(mnemonic, F::Branch, format)
}

const fn load(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Load, Fm::ITis)
}

const fn store(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Store, Fm::ITis)
}

const fn trap(mnemonic: &'static str, format: Fm) -> Opcode {
    Opcode::new(mnemonic, F::Trap, format)
}

const fn fpu(mnemonic: &'static str, format: Fm) -> Opcode {
    Opcode::new(mnemonic, F::Fpu, format)
}

const fn compare(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Fpu, Fm::Cop1St)
}

const fn vu(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Vu, Fm::VuStd)
}

const fn vu_div(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Vu, Fm::VuSeDe)
}

const fn vload(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Load, Fm::VuLoadStore)
}

const fn vstore(mnemonic: &'static str) -> Opcode {
    Opcode::new(mnemonic, F::Store, Fm::VuLoadStore)
}

#[rustfmt::skip]
catalog! {
    NULL    => Opcode::new("null", F::Null, Fm::Empty),

    // Sub-table placeholders
    SPECIAL => Opcode::table("special", T::Special),
    REGIMM  => Opcode::table("regimm", T::RegImm),
    COP0    => Opcode::table("cop0", T::Cop0),
    TLB     => Opcode::table("tlb", T::Tlb),
    COP1    => Opcode::table("cop1", T::Cop1),
    BC1     => Opcode::table("bc1", T::Bc1),
    FPU     => Opcode::table("fpu", T::Fpu),
    COP2    => Opcode::table("cop2", T::Cop2),
    VU      => Opcode::table("vu", T::Vu),
    LWC2    => Opcode::table("lwc2", T::VuLoad),
    SWC2    => Opcode::table("swc2", T::VuStore),

    // Register arithmetic
    ADD     => reg("add", Fm::RDst),
    ADDU    => reg("addu", Fm::RDst).flags(exec!(UNSIGNED)),
    SUB     => reg("sub", Fm::RDst),
    SUBU    => reg("subu", Fm::RDst).flags(exec!(UNSIGNED)),
    AND     => reg("and", Fm::RDst).arith(A::And),
    OR      => reg("or", Fm::RDst).arith(A::Or),
    XOR     => reg("xor", Fm::RDst).arith(A::Xor),
    NOR     => reg("nor", Fm::RDst).arith(A::Nor),
    SLT     => reg("slt", Fm::RDst).arith(A::LessThan),
    SLTU    => reg("sltu", Fm::RDst).arith(A::LessThan).flags(exec!(UNSIGNED)),
    DADD    => reg("dadd", Fm::RDst).flags(exec!(RESERVED_32)),
    DADDU   => reg("daddu", Fm::RDst).flags(exec!(UNSIGNED | RESERVED_32)),
    DSUB    => reg("dsub", Fm::RDst).flags(exec!(RESERVED_32)),
    DSUBU   => reg("dsubu", Fm::RDst).flags(exec!(UNSIGNED | RESERVED_32)),

    // Immediate arithmetic
    ADDI    => reg("addi", Fm::ITsi).flags(exec!(IMMEDIATE)),
    ADDIU   => reg("addiu", Fm::ITsi).flags(exec!(IMMEDIATE | UNSIGNED)),
    SLTI    => reg("slti", Fm::ITsi).arith(A::LessThan).flags(exec!(IMMEDIATE)),
    SLTIU   => reg("sltiu", Fm::ITsi).arith(A::LessThan).flags(exec!(IMMEDIATE | UNSIGNED)),
    ANDI    => reg("andi", Fm::ITsi).arith(A::And).flags(exec!(IMMEDIATE)),
    ORI     => reg("ori", Fm::ITsi).arith(A::Or).flags(exec!(IMMEDIATE)),
    XORI    => reg("xori", Fm::ITsi).arith(A::Xor).flags(exec!(IMMEDIATE)),
    LUI     => reg("lui", Fm::ITi).flags(exec!(IMMEDIATE)),
    DADDI   => reg("daddi", Fm::ITsi).flags(exec!(IMMEDIATE | RESERVED_32)),
    DADDIU  => reg("daddiu", Fm::ITsi).flags(exec!(IMMEDIATE | UNSIGNED | RESERVED_32)),

    // Shifts
    SLL     => reg("sll", Fm::RDta).arith(A::LeftShift).flags(exec!(UNSIGNED)),
    SRL     => reg("srl", Fm::RDta).arith(A::RightShift).flags(exec!(UNSIGNED)),
    SRA     => reg("sra", Fm::RDta).arith(A::RightShift),
    SLLV    => reg("sllv", Fm::RDts).arith(A::LeftShift).flags(exec!(VAR_SHIFT | UNSIGNED)),
    SRLV    => reg("srlv", Fm::RDts).arith(A::RightShift).flags(exec!(VAR_SHIFT | UNSIGNED)),
    SRAV    => reg("srav", Fm::RDts).arith(A::RightShift).flags(exec!(VAR_SHIFT)),
    DSLL    => reg("dsll", Fm::RDta).arith(A::LeftShift).flags(exec!(UNSIGNED | RESERVED_32)),
    DSRL    => reg("dsrl", Fm::RDta).arith(A::RightShift).flags(exec!(UNSIGNED | RESERVED_32)),
    DSRA    => reg("dsra", Fm::RDta).arith(A::RightShift).flags(exec!(RESERVED_32)),
    DSLL32  => reg("dsll32", Fm::RDta).arith(A::LeftShift).flags(exec!(UNSIGNED | SHIFT_32 | RESERVED_32)),
    DSRL32  => reg("dsrl32", Fm::RDta).arith(A::RightShift).flags(exec!(UNSIGNED | SHIFT_32 | RESERVED_32)),
    DSRA32  => reg("dsra32", Fm::RDta).arith(A::RightShift).flags(exec!(SHIFT_32 | RESERVED_32)),
    DSLLV   => reg("dsllv", Fm::RDts).arith(A::LeftShift).flags(exec!(VAR_SHIFT | UNSIGNED | RESERVED_32)),
    DSRLV   => reg("dsrlv", Fm::RDts).arith(A::RightShift).flags(exec!(VAR_SHIFT | UNSIGNED | RESERVED_32)),
    DSRAV   => reg("dsrav", Fm::RDts).arith(A::RightShift).flags(exec!(VAR_SHIFT | RESERVED_32)),

    // Multiply and divide
    MULT    => reg("mult", Fm::RSt),
    MULTU   => reg("multu", Fm::RSt).flags(exec!(UNSIGNED)),
    DIV     => reg("div", Fm::RSt),
    DIVU    => reg("divu", Fm::RSt).flags(exec!(UNSIGNED)),
    DMULT   => reg("dmult", Fm::RSt).flags(exec!(RESERVED_32)),
    DMULTU  => reg("dmultu", Fm::RSt).flags(exec!(UNSIGNED | RESERVED_32)),
    DDIV    => reg("ddiv", Fm::RSt).flags(exec!(RESERVED_32)),
    DDIVU   => reg("ddivu", Fm::RSt).flags(exec!(UNSIGNED | RESERVED_32)),
    MFHI    => reg("mfhi", Fm::RD).arith(A::Move).xfer(R::Hi, R::Gpr),
    MTHI    => reg("mthi", Fm::RS).arith(A::Move).xfer(R::Gpr, R::Hi),
    MFLO    => reg("mflo", Fm::RD).arith(A::Move).xfer(R::Lo, R::Gpr),
    MTLO    => reg("mtlo", Fm::RS).arith(A::Move).xfer(R::Gpr, R::Lo),

    // Jumps and branches
    J       => branch("j", Fm::Jump).arith(A::True),
    JAL     => branch("jal", Fm::Jump).arith(A::True).flags(exec!(LINK)),
    JR      => branch("jr", Fm::RS).arith(A::True).flags(exec!(REGISTER)),
    JALR    => branch("jalr", Fm::RSd).arith(A::True).flags(exec!(REGISTER | LINK)),
    BEQ     => branch("beq", Fm::Branch2).arith(A::Equal),
    BNE     => branch("bne", Fm::Branch2).arith(A::NotEqual),
    BLEZ    => branch("blez", Fm::Branch1).arith(A::LessOrEqual),
    BGTZ    => branch("bgtz", Fm::Branch1).arith(A::GreaterThan),
    BEQL    => branch("beql", Fm::Branch2).arith(A::Equal).flags(exec!(LIKELY)),
    BNEL    => branch("bnel", Fm::Branch2).arith(A::NotEqual).flags(exec!(LIKELY)),
    BLEZL   => branch("blezl", Fm::Branch1).arith(A::LessOrEqual).flags(exec!(LIKELY)),
    BGTZL   => branch("bgtzl", Fm::Branch1).arith(A::GreaterThan).flags(exec!(LIKELY)),
    BLTZ    => branch("bltz", Fm::Branch1).arith(A::LessThan),
    BGEZ    => branch("bgez", Fm::Branch1).arith(A::GreaterOrEqual),
    BLTZL   => branch("bltzl", Fm::Branch1).arith(A::LessThan).flags(exec!(LIKELY)),
    BGEZL   => branch("bgezl", Fm::Branch1).arith(A::GreaterOrEqual).flags(exec!(LIKELY)),
    BLTZAL  => branch("bltzal", Fm::Branch1).arith(A::LessThan).flags(exec!(LINK)),
    BGEZAL  => branch("bgezal", Fm::Branch1).arith(A::GreaterOrEqual).flags(exec!(LINK)),
    BLTZALL => branch("bltzall", Fm::Branch1).arith(A::LessThan).flags(exec!(LINK | LIKELY)),
    BGEZALL => branch("bgezall", Fm::Branch1).arith(A::GreaterOrEqual).flags(exec!(LINK | LIKELY)),
    BC1F    => branch("bc1f", Fm::Bc1).arith(A::False),
    BC1T    => branch("bc1t", Fm::Bc1).arith(A::True),
    BC1FL   => branch("bc1fl", Fm::Bc1).arith(A::False).flags(exec!(LIKELY)),
    BC1TL   => branch("bc1tl", Fm::Bc1).arith(A::True).flags(exec!(LIKELY)),

    // Traps and system calls
    TGE     => trap("tge", Fm::TrapWithCode).arith(A::GreaterOrEqual),
    TGEU    => trap("tgeu", Fm::TrapWithCode).arith(A::GreaterOrEqual).flags(exec!(UNSIGNED)),
    TLT     => trap("tlt", Fm::TrapWithCode).arith(A::LessThan),
    TLTU    => trap("tltu", Fm::TrapWithCode).arith(A::LessThan).flags(exec!(UNSIGNED)),
    TEQ     => trap("teq", Fm::TrapWithCode).arith(A::Equal),
    TNE     => trap("tne", Fm::TrapWithCode).arith(A::NotEqual),
    TGEI    => trap("tgei", Fm::ISi).arith(A::GreaterOrEqual).flags(exec!(IMMEDIATE)),
    TGEIU   => trap("tgeiu", Fm::ISi).arith(A::GreaterOrEqual).flags(exec!(IMMEDIATE | UNSIGNED)),
    TLTI    => trap("tlti", Fm::ISi).arith(A::LessThan).flags(exec!(IMMEDIATE)),
    TLTIU   => trap("tltiu", Fm::ISi).arith(A::LessThan).flags(exec!(IMMEDIATE | UNSIGNED)),
    TEQI    => trap("teqi", Fm::ISi).arith(A::Equal).flags(exec!(IMMEDIATE)),
    TNEI    => trap("tnei", Fm::ISi).arith(A::NotEqual).flags(exec!(IMMEDIATE)),
    SYSCALL => trap("syscall", Fm::Code).arith(A::True),
    BREAK   => trap("break", Fm::Code).arith(A::True),
    SYNC    => Opcode::new("sync", F::Sync, Fm::Empty),
    CACHE   => Opcode::new("cache", F::Cache, Fm::Cache),

    // Loads
    LB      => load("lb").flags(exec!(DATA_8)),
    LBU     => load("lbu").flags(exec!(DATA_8 | UNSIGNED)),
    LH      => load("lh").flags(exec!(DATA_16)),
    LHU     => load("lhu").flags(exec!(DATA_16 | UNSIGNED)),
    LW      => load("lw").flags(exec!(DATA_32)),
    LWU     => load("lwu").flags(exec!(DATA_32 | UNSIGNED | RESERVED_32)),
    LD      => load("ld").flags(exec!(DATA_64 | RESERVED_32)),
    LWL     => load("lwl").flags(exec!(DATA_32 | LEFT)),
    LWR     => load("lwr").flags(exec!(DATA_32 | RIGHT)),
    LDL     => load("ldl").flags(exec!(DATA_64 | LEFT | RESERVED_32)),
    LDR     => load("ldr").flags(exec!(DATA_64 | RIGHT | RESERVED_32)),
    LL      => load("ll").flags(exec!(DATA_32 | LINK)),
    LLD     => load("lld").flags(exec!(DATA_64 | LINK | RESERVED_32)),

    // Stores
    SB      => store("sb").flags(exec!(DATA_8)),
    SH      => store("sh").flags(exec!(DATA_16)),
    SW      => store("sw").flags(exec!(DATA_32)),
    SD      => store("sd").flags(exec!(DATA_64 | RESERVED_32)),
    SWL     => store("swl").flags(exec!(DATA_32 | LEFT)),
    SWR     => store("swr").flags(exec!(DATA_32 | RIGHT)),
    SDL     => store("sdl").flags(exec!(DATA_64 | LEFT | RESERVED_32)),
    SDR     => store("sdr").flags(exec!(DATA_64 | RIGHT | RESERVED_32)),
    SC      => store("sc").flags(exec!(DATA_32 | LINK)),
    SCD     => store("scd").flags(exec!(DATA_64 | LINK | RESERVED_32)),

    // FPU memory access
    LWC1    => Opcode::new("lwc1", F::LoadFpu, Fm::IFtis).flags(exec!(DATA_32)),
    LDC1    => Opcode::new("ldc1", F::LoadFpu, Fm::IFtis).flags(exec!(DATA_64)),
    SWC1    => Opcode::new("swc1", F::StoreFpu, Fm::IFtis).flags(exec!(DATA_32)),
    SDC1    => Opcode::new("sdc1", F::StoreFpu, Fm::IFtis).flags(exec!(DATA_64)),

    // System control
    MFC0    => Opcode::new("mfc0", F::Cop0, Fm::Cop0).xfer(R::Cp0, R::Gpr).flags(exec!(DATA_32)),
    DMFC0   => Opcode::new("dmfc0", F::Cop0, Fm::Cop0).xfer(R::Cp0, R::Gpr).flags(exec!(DATA_64 | RESERVED_32)),
    MTC0    => Opcode::new("mtc0", F::Cop0, Fm::Cop0).xfer(R::Gpr, R::Cp0).flags(exec!(DATA_32)),
    DMTC0   => Opcode::new("dmtc0", F::Cop0, Fm::Cop0).xfer(R::Gpr, R::Cp0).flags(exec!(DATA_64 | RESERVED_32)),
    TLBR    => Opcode::new("tlbr", F::Tlb, Fm::Empty),
    TLBWI   => Opcode::new("tlbwi", F::Tlb, Fm::Empty),
    TLBWR   => Opcode::new("tlbwr", F::Tlb, Fm::Empty),
    TLBP    => Opcode::new("tlbp", F::Tlb, Fm::Empty),
    ERET    => Opcode::new("eret", F::Cop0, Fm::Empty),

    // FPU transfers
    MFC1    => fpu("mfc1", Fm::Cop1).xfer(R::Fpr, R::Gpr).flags(exec!(DATA_32)),
    DMFC1   => fpu("dmfc1", Fm::Cop1).xfer(R::Fpr, R::Gpr).flags(exec!(DATA_64 | RESERVED_32)),
    CFC1    => fpu("cfc1", Fm::Cop1Ctl).xfer(R::FpuCtl, R::Gpr).flags(exec!(DATA_32)),
    MTC1    => fpu("mtc1", Fm::Cop1).xfer(R::Gpr, R::Fpr).flags(exec!(DATA_32)),
    DMTC1   => fpu("dmtc1", Fm::Cop1).xfer(R::Gpr, R::Fpr).flags(exec!(DATA_64 | RESERVED_32)),
    CTC1    => fpu("ctc1", Fm::Cop1Ctl).xfer(R::Gpr, R::FpuCtl).flags(exec!(DATA_32)),

    // FPU arithmetic. `fmt` is replaced by the operand format suffix when printed
    ADD_FMT   => fpu("add.fmt", Fm::Cop1Dst),
    SUB_FMT   => fpu("sub.fmt", Fm::Cop1Dst),
    MUL_FMT   => fpu("mul.fmt", Fm::Cop1Dst),
    DIV_FMT   => fpu("div.fmt", Fm::Cop1Dst),
    SQRT_FMT  => fpu("sqrt.fmt", Fm::Cop1Ds),
    ABS_FMT   => fpu("abs.fmt", Fm::Cop1Ds).arith(A::Absolute),
    MOV_FMT   => fpu("mov.fmt", Fm::Cop1Ds).arith(A::Move),
    NEG_FMT   => fpu("neg.fmt", Fm::Cop1Ds),
    ROUND_L   => fpu("round.l.fmt", Fm::Cop1Ds).flags(exec!(DATA_64)),
    TRUNC_L   => fpu("trunc.l.fmt", Fm::Cop1Ds).flags(exec!(DATA_64)),
    CEIL_L    => fpu("ceil.l.fmt", Fm::Cop1Ds).flags(exec!(DATA_64)),
    FLOOR_L   => fpu("floor.l.fmt", Fm::Cop1Ds).flags(exec!(DATA_64)),
    ROUND_W   => fpu("round.w.fmt", Fm::Cop1Ds).flags(exec!(DATA_32)),
    TRUNC_W   => fpu("trunc.w.fmt", Fm::Cop1Ds).flags(exec!(DATA_32)),
    CEIL_W    => fpu("ceil.w.fmt", Fm::Cop1Ds).flags(exec!(DATA_32)),
    FLOOR_W   => fpu("floor.w.fmt", Fm::Cop1Ds).flags(exec!(DATA_32)),
    CVT_S     => fpu("cvt.s.fmt", Fm::Cop1Ds).flags(exec!(DATA_S)),
    CVT_D     => fpu("cvt.d.fmt", Fm::Cop1Ds).flags(exec!(DATA_D)),
    CVT_W     => fpu("cvt.w.fmt", Fm::Cop1Ds).flags(exec!(DATA_32)),
    CVT_L     => fpu("cvt.l.fmt", Fm::Cop1Ds).flags(exec!(DATA_64)),

    // FPU compares
    C_F     => compare("c.f.fmt"),
    C_UN    => compare("c.un.fmt").flags(exec!(COND_UN)),
    C_EQ    => compare("c.eq.fmt").flags(exec!(COND_EQ)),
    C_UEQ   => compare("c.ueq.fmt").flags(exec!(COND_UN | COND_EQ)),
    C_OLT   => compare("c.olt.fmt").flags(exec!(COND_LT)),
    C_ULT   => compare("c.ult.fmt").flags(exec!(COND_UN | COND_LT)),
    C_OLE   => compare("c.ole.fmt").flags(exec!(COND_LT | COND_EQ)),
    C_ULE   => compare("c.ule.fmt").flags(exec!(COND_UN | COND_LT | COND_EQ)),
    C_SF    => compare("c.sf.fmt").flags(exec!(COND_SIGNAL)),
    C_NGLE  => compare("c.ngle.fmt").flags(exec!(COND_SIGNAL | COND_UN)),
    C_SEQ   => compare("c.seq.fmt").flags(exec!(COND_SIGNAL | COND_EQ)),
    C_NGL   => compare("c.ngl.fmt").flags(exec!(COND_SIGNAL | COND_UN | COND_EQ)),
    C_LT    => compare("c.lt.fmt").flags(exec!(COND_SIGNAL | COND_LT)),
    C_NGE   => compare("c.nge.fmt").flags(exec!(COND_SIGNAL | COND_UN | COND_LT)),
    C_LE    => compare("c.le.fmt").flags(exec!(COND_SIGNAL | COND_LT | COND_EQ)),
    C_NGT   => compare("c.ngt.fmt").flags(exec!(COND_SIGNAL | COND_UN | COND_LT | COND_EQ)),

    // Vector transfers
    MFC2    => Opcode::new("mfc2", F::Vu, Fm::VuMove).xfer(R::Vpr, R::Gpr),
    MTC2    => Opcode::new("mtc2", F::Vu, Fm::VuMove).xfer(R::Gpr, R::Vpr),
    CFC2    => Opcode::new("cfc2", F::Vu, Fm::VuCtl).xfer(R::VuCtl, R::Gpr),
    CTC2    => Opcode::new("ctc2", F::Vu, Fm::VuCtl).xfer(R::Gpr, R::VuCtl),

    // Vector loads
    LBV     => vload("lbv").flags(exec!(DATA_8)),
    LSV     => vload("lsv").flags(exec!(DATA_16)),
    LLV     => vload("llv").flags(exec!(DATA_32)),
    LDV     => vload("ldv").flags(exec!(DATA_64)),
    LQV     => vload("lqv").flags(exec!(DATA_128)),
    LRV     => vload("lrv").flags(exec!(DATA_128 | RIGHT)),
    LPV     => vload("lpv").flags(exec!(DATA_64)),
    LUV     => vload("luv").flags(exec!(DATA_64 | UNSIGNED)),
    LHV     => vload("lhv").flags(exec!(DATA_128)).vector(vector!(HALF)),
    LFV     => vload("lfv").flags(exec!(DATA_128)).vector(vector!(FORTH)),
    LWV     => vload("lwv").flags(exec!(DATA_128)).vector(vector!(WRAP)),
    LTV     => vload("ltv").flags(exec!(DATA_128)).vector(vector!(TRANSPOSE)),

    // Vector stores
    SBV     => vstore("sbv").flags(exec!(DATA_8)),
    SSV     => vstore("ssv").flags(exec!(DATA_16)),
    SLV     => vstore("slv").flags(exec!(DATA_32)),
    SDV     => vstore("sdv").flags(exec!(DATA_64)),
    SQV     => vstore("sqv").flags(exec!(DATA_128)),
    SRV     => vstore("srv").flags(exec!(DATA_128 | RIGHT)),
    SPV     => vstore("spv").flags(exec!(DATA_64)),
    SUV     => vstore("suv").flags(exec!(DATA_64 | UNSIGNED)),
    SHV     => vstore("shv").flags(exec!(DATA_128)).vector(vector!(HALF)),
    SFV     => vstore("sfv").flags(exec!(DATA_128)).vector(vector!(FORTH)),
    SWV     => vstore("swv").flags(exec!(DATA_128)).vector(vector!(WRAP)),
    STV     => vstore("stv").flags(exec!(DATA_128)).vector(vector!(TRANSPOSE)),

    // Vector multiply
    VMULF   => vu("vmulf"),
    VMULU   => vu("vmulu").flags(exec!(UNSIGNED)),
    VRNDP   => vu("vrndp").vector(vector!(ROUND_POSITIVE)),
    VMULQ   => vu("vmulq").vector(vector!(QUANTIZED)),
    VMUDL   => vu("vmudl").flags(exec!(UNSIGNED)).vector(vector!(PARTIAL_L)),
    VMUDM   => vu("vmudm").vector(vector!(PARTIAL_M)),
    VMUDN   => vu("vmudn").vector(vector!(PARTIAL_N)),
    VMUDH   => vu("vmudh").vector(vector!(PARTIAL_H)),
    VMACF   => vu("vmacf").vector(vector!(ACCUMULATE)),
    VMACU   => vu("vmacu").flags(exec!(UNSIGNED)).vector(vector!(ACCUMULATE)),
    VRNDN   => vu("vrndn").vector(vector!(ROUND_NEGATIVE)),
    VMACQ   => vu("vmacq").vector(vector!(ACCUMULATE | QUANTIZED)),
    VMADL   => vu("vmadl").flags(exec!(UNSIGNED)).vector(vector!(ACCUMULATE | PARTIAL_L)),
    VMADM   => vu("vmadm").vector(vector!(ACCUMULATE | PARTIAL_M)),
    VMADN   => vu("vmadn").vector(vector!(ACCUMULATE | PARTIAL_N)),
    VMADH   => vu("vmadh").vector(vector!(ACCUMULATE | PARTIAL_H)),

    // Vector add and subtract
    VADD    => vu("vadd"),
    VSUB    => vu("vsub"),
    VSUT    => vu("vsut"),
    VABS    => vu("vabs").arith(A::Absolute),
    VADDC   => vu("vaddc").flags(exec!(CARRY)),
    VSUBC   => vu("vsubc").flags(exec!(CARRY)),
    VADDB   => vu("vaddb"),
    VSUBB   => vu("vsubb"),
    VACCB   => vu("vaccb"),
    VSUCB   => vu("vsucb"),
    VSAD    => vu("vsad"),
    VSAC    => vu("vsac"),
    VSUM    => vu("vsum"),
    VSAR    => vu("vsar").arith(A::Move),
    VACC    => vu("vacc"),
    VSUC    => vu("vsuc"),

    // Vector select
    VLT     => vu("vlt").arith(A::LessThan),
    VEQ     => vu("veq").arith(A::Equal),
    VNE     => vu("vne").arith(A::NotEqual),
    VGE     => vu("vge").arith(A::GreaterOrEqual),
    VCL     => vu("vcl").vector(vector!(PARTIAL_L)),
    VCH     => vu("vch").vector(vector!(PARTIAL_H)),
    VCR     => vu("vcr").vector(vector!(CRIMP)),
    VMRG    => vu("vmrg").vector(vector!(MERGE)),

    // Vector logical
    VAND    => vu("vand").arith(A::And),
    VNAND   => vu("vnand").arith(A::Nand),
    VOR     => vu("vor").arith(A::Or),
    VNOR    => vu("vnor").arith(A::Nor),
    VXOR    => vu("vxor").arith(A::Xor),
    VNXOR   => vu("vnxor").arith(A::Nxor),
    V056    => vu("v056"),
    V057    => vu("v057"),

    // Vector divide
    VRCP    => vu_div("vrcp"),
    VRCPL   => vu_div("vrcpl").vector(vector!(PARTIAL_L)),
    VRCPH   => vu_div("vrcph").vector(vector!(PARTIAL_H)),
    VMOV    => vu_div("vmov").arith(A::Move),
    VRSQ    => vu_div("vrsq").vector(vector!(SQUARE_ROOT)),
    VRSQL   => vu_div("vrsql").vector(vector!(SQUARE_ROOT | PARTIAL_L)),
    VRSQH   => vu_div("vrsqh").vector(vector!(SQUARE_ROOT | PARTIAL_H)),
    VNOP    => Opcode::new("vnop", F::Vu, Fm::Empty),

    // Unimplemented pack/unpack slots
    VEXTT   => vu("vextt"),
    VEXTQ   => vu("vextq"),
    VEXTN   => vu("vextn"),
    V073    => vu("v073"),
    VINST   => vu("vinst"),
    VINSQ   => vu("vinsq"),
    VINSN   => vu("vinsn"),
    VNULL   => vu("vnull"),
}

/// Vector computational slots that have no defined behaviour on the hardware
pub static VU_RESERVED: [&Opcode; 19] = [
    &VSUT, &VADDB, &VSUBB, &VACCB, &VSUCB, &VSAD, &VSAC, &VSUM, &VACC, &VSUC, &V056, &V057,
    &VEXTT, &VEXTQ, &VEXTN, &V073, &VINST, &VINSQ, &VINSN,
];
