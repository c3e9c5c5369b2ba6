use super::catalog::*;
use super::*;

fn round_trip(table: &'static DecodeTable, pc: u64) {
    let asm = Assembler::new(table);

    for op in table.reachable() {
        let base = table
            .encoding(op)
            .unwrap_or_else(|| panic!("{} has no encoding", op.mnemonic));

        let d = decode(table, base, pc);
        assert_eq!(d.op.id, op.id, "{} decodes as {}", op.mnemonic, d.op.mnemonic);

        let text = disassemble(&d);
        let word = asm
            .assemble(&text, pc)
            .unwrap_or_else(|e| panic!("{}: {}", text, e));

        assert_eq!(decode(table, word, pc).op.id, op.id, "`{}` reassembled to 0x{:08x}", text, word);
        assert_eq!(word, base, "`{}`", text);
    }
}

#[test]
fn r4300i_round_trip() {
    round_trip(&R4300I, 0xffff_ffff_8000_0400);
}

#[test]
fn rsp_round_trip() {
    round_trip(&RSP, 0x1c);
}

#[test]
fn catalog_ids() {
    assert_eq!(CATALOG.len(), OpId::COUNT);

    for (i, op) in CATALOG.iter().enumerate() {
        assert_eq!(op.id.index(), i, "{}", op.mnemonic);
    }
}

#[test]
fn decode_r4300i() {
    let cases: &[(u32, OpId)] = &[
        // lui at, 0x8000
        (0x3c01_8000, OpId::LUI),
        // addiu sp, sp, -32
        (0x27bd_ffe0, OpId::ADDIU),
        // jr ra
        (0x03e0_0008, OpId::JR),
        // daddu v0, a0, a1
        (0x0085_102d, OpId::DADDU),
        // dsra32 v0, v0, 0
        (0x0002_103f, OpId::DSRA32),
        // mtc0 t0, status
        (0x4088_6000, OpId::MTC0),
        // eret
        (0x4200_0018, OpId::ERET),
        // tlbwi
        (0x4200_0002, OpId::TLBWI),
        // add.d f0, f2, f4
        (0x4624_1000, OpId::ADD_FMT),
        // cvt.s.w f0, f2
        (0x4680_1020, OpId::CVT_S),
        // c.lt.s f2, f4
        (0x4604_103c, OpId::C_LT),
        // bc1tl
        (0x4503_0004, OpId::BC1TL),
        // ld t0, 8(sp)
        (0xdfa8_0008, OpId::LD),
        // sdc1 f0, 0(a0)
        (0xf480_0000, OpId::SDC1),
        // cache 0x10, 0(a0)
        (0xbc90_0000, OpId::CACHE),
        // teqi a0, 3
        (0x048c_0003, OpId::TEQI),
        // bgezall a0, +1
        (0x0493_0001, OpId::BGEZALL),
    ];

    for &(word, id) in cases {
        assert_eq!(R4300I.lookup(word).id, id, "0x{:08x}", word);
    }

    // Slots left empty resolve to NULL
    assert!(R4300I.lookup(0x4c00_0000).is_null());
    assert!(R4300I.lookup(0x0000_0001).is_null());
    assert!(R4300I.lookup(0x4600_0010).is_null());
}

#[test]
fn decode_rsp() {
    let cases: &[(u32, OpId)] = &[
        // vmulf v1, v2, v3[e0]
        (0x4a03_1040, OpId::VMULF),
        // vmadh v4, v5, v6[e7]
        (0x4be6_290f, OpId::VMADH),
        // vrcph v0[e1], v1[e0]
        (0x4a01_0832, OpId::VRCPH),
        // lqv v1[e0], -1(a0)
        (0xc881_207f, OpId::LQV),
        // stv v8[e2], 0(r0)
        (0xe808_5900, OpId::STV),
        // mfc2 t0, v1[e2]
        (0x4808_0900, OpId::MFC2),
        // ctc2 t0, vc0
        (0x48c8_0000, OpId::CTC2),
        // break
        (0x0000_000d, OpId::BREAK),
        // mtc0 t0, c4
        (0x4088_2000, OpId::MTC0),
    ];

    for &(word, id) in cases {
        assert_eq!(RSP.lookup(word).id, id, "0x{:08x}", word);
    }

    // No 64-bit arithmetic, FPU or traps on the RSP
    assert!(RSP.lookup(0x0085_102d).is_null());
    assert!(RSP.lookup(0x4624_1000).is_null());
    assert!(RSP.lookup(0x0000_000c).is_null());
    assert!(RSP.lookup(0xdfa8_0008).is_null());
}

#[test]
fn disassembly() {
    let cases: &[(u32, u64, &str)] = &[
        (0x27bd_ffe0, 0, "addiu sp, sp, 0xffe0"),
        (0x8fbf_0010, 0, "lw ra, 16(sp)"),
        (0x1000_ffff, 0x100, "beq r0, r0, 0x100"),
        (0x0c00_0040, 0xffff_ffff_8000_0000, "jal 0xffffffff80000100"),
        (0x4624_1000, 0, "add.d f0, f2, f4"),
        (0x0000_000d, 0, "break"),
        (0x4a03_1040, 0, "vmulf v1, v2, v3[e0]"),
        (0xc881_207f, 0, "lqv v1[e0], -1(a0)"),
    ];

    for &(word, pc, text) in cases {
        assert_eq!(disasm::disassemble_word(table_for(word), word, pc), text);
    }
}

/// COP2, LWC2 and SWC2 only exist on the RSP
fn table_for(word: u32) -> &'static DecodeTable {
    match word >> 26 {
        0x12 | 0x32 | 0x3a => &RSP,
        _ => &R4300I,
    }
}

#[test]
fn assembler_rejects_garbage() {
    let asm = Assembler::new(&R4300I);

    assert!(asm.assemble("addiu sp, sp", 0).is_err());
    assert!(asm.assemble("frobnicate r1", 0).is_err());
    assert!(asm.assemble("sll r1, r2, 40", 0).is_err());
    assert!(asm.assemble("vmulf v1, v2, v3[e0]", 0).is_err());
    assert_eq!(asm.assemble("addiu sp, sp, -32", 0).unwrap(), 0x27bd_ffe0);
    assert_eq!(asm.assemble("jr ra", 0).unwrap(), 0x03e0_0008);
}

#[test]
fn reserved_flags() {
    for op in R4300I.reachable() {
        let is_64 = op.family == Family::Reg
            && op.mnemonic.starts_with('d')
            && !op.mnemonic.starts_with("div");

        if is_64 {
            assert!(op.has(ExecFlags::RESERVED_32), "{}", op.mnemonic);
        }
    }

    assert!(!ADDU.has(ExecFlags::RESERVED_32));
    assert!(!DIV.has(ExecFlags::RESERVED_32));
}
