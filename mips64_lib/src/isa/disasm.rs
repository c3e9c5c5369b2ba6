//! Textual form of instructions. `disassemble` renders a decoded instruction, `Assembler` parses
//! that same syntax back into a word.

use super::decode::DecodeTable;
use super::instruction::DecodedInstruction;
use super::opcode::{Format, Opcode};
use crate::error::{MipsError, MipsResult};
use fnv::FnvHashMap;

pub const GPR_NAMES: [&str; 32] = [
    "r0", // Hardwired to be always 0
    "at", // Assembler Temporary (reserved for the assembler)
    "v0", "v1", // First and second return values
    "a0", "a1", "a2", "a3", // First four function arguments
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", // Temporary registers
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", // Saved registers
    "t8", "t9", // Temporary registers
    "k0", "k1", // Reserved for kernel use
    "gp", // Global pointer
    "sp", // Stack Pointer
    "fp", // Frame Pointer
    "ra", // Return address
];

/// FPU operand formats as encoded in the rs field, with their mnemonic suffix
const FPU_FORMATS: [(usize, &str); 4] = [(16, "s"), (17, "d"), (20, "w"), (21, "l")];

fn fmt_suffix(fmt: usize) -> &'static str {
    FPU_FORMATS
        .iter()
        .find(|&&(f, _)| f == fmt)
        .map(|&(_, s)| s)
        .unwrap_or("?")
}

fn mnemonic(d: &DecodedInstruction) -> String {
    match d.op.mnemonic.strip_suffix("fmt") {
        Some(stem) => format!("{}{}", stem, fmt_suffix(d.inst.fmt())),
        None => d.op.mnemonic.to_string(),
    }
}

fn gpr(i: usize) -> &'static str {
    GPR_NAMES[i & 0x1f]
}

/// Render `d` in assembler syntax. Branch and jump targets are absolute, computed from the
/// address the instruction was fetched from.
pub fn disassemble(d: &DecodedInstruction) -> String {
    let i = d.inst;
    let pc = d.address;
    let branch_target = pc.wrapping_add(4).wrapping_add(i.imm_se() << 2);
    let imm = i.imm();
    let offset = imm as i16;

    let operands = match d.op.format {
        Format::Empty => String::new(),
        Format::Jump => format!(
            "0x{:x}",
            (pc.wrapping_add(4) & !0x0fff_ffff) | i.target() as u64
        ),
        Format::Branch2 => format!("{}, {}, 0x{:x}", gpr(i.rs()), gpr(i.rt()), branch_target),
        Format::Branch1 => format!("{}, 0x{:x}", gpr(i.rs()), branch_target),
        Format::Bc1 => format!("0x{:x}", branch_target),
        Format::ITsi => format!("{}, {}, 0x{:x}", gpr(i.rt()), gpr(i.rs()), imm),
        Format::ITi => format!("{}, 0x{:x}", gpr(i.rt()), imm),
        Format::ITis => format!("{}, {}({})", gpr(i.rt()), offset, gpr(i.rs())),
        Format::IFtis => format!("f{}, {}({})", i.ft(), offset, gpr(i.rs())),
        Format::ISi => format!("{}, 0x{:x}", gpr(i.rs()), imm),
        Format::Cache => format!("0x{:x}, {}({})", i.rt(), offset, gpr(i.rs())),
        Format::Cop0 => format!("{}, c{}", gpr(i.rt()), i.rd()),
        Format::Cop1 => format!("{}, f{}", gpr(i.rt()), i.fs()),
        Format::Cop1Ctl => format!("{}, fcr{}", gpr(i.rt()), i.fs()),
        Format::Cop1Dst => format!("f{}, f{}, f{}", i.fd(), i.fs(), i.ft()),
        Format::Cop1Ds => format!("f{}, f{}", i.fd(), i.fs()),
        Format::Cop1St => format!("f{}, f{}", i.fs(), i.ft()),
        Format::RDta => format!("{}, {}, {}", gpr(i.rd()), gpr(i.rt()), i.sa()),
        Format::RDts => format!("{}, {}, {}", gpr(i.rd()), gpr(i.rt()), gpr(i.rs())),
        Format::RS => gpr(i.rs()).to_string(),
        Format::RSd => format!("{}, {}", gpr(i.rd()), gpr(i.rs())),
        Format::RD => gpr(i.rd()).to_string(),
        Format::RSt => format!("{}, {}", gpr(i.rs()), gpr(i.rt())),
        Format::RDst => format!("{}, {}, {}", gpr(i.rd()), gpr(i.rs()), gpr(i.rt())),
        Format::Code => match i.code() {
            0 => String::new(),
            c => format!("0x{:x}", c),
        },
        Format::TrapWithCode => match i.trap_code() {
            0 => format!("{}, {}", gpr(i.rs()), gpr(i.rt())),
            c => format!("{}, {}, 0x{:x}", gpr(i.rs()), gpr(i.rt()), c),
        },
        Format::VuStd => format!("v{}, v{}, v{}[e{}]", i.sa(), i.rd(), i.rt(), i.element()),
        Format::VuSeDe => format!("v{}[e{}], v{}[e{}]", i.sa(), i.rd() & 7, i.rt(), i.element()),
        Format::VuLoadStore => format!(
            "v{}[e{}], {}({})",
            i.rt(),
            i.ls_element(),
            i.ls_offset(),
            gpr(i.rs())
        ),
        Format::VuMove => format!("{}, v{}[e{}]", gpr(i.rt()), i.rd(), i.ls_element()),
        Format::VuCtl => format!("{}, vc{}", gpr(i.rt()), i.rd()),
    };

    if operands.is_empty() {
        mnemonic(d)
    } else {
        format!("{} {}", mnemonic(d), operands)
    }
}

/// Parses the syntax produced by `disassemble` for every opcode reachable through a decode
/// table
pub struct Assembler {
    table: &'static DecodeTable,
    /// Mnemonic to (opcode, FPU format) lookup
    mnemonics: FnvHashMap<String, (&'static Opcode, Option<usize>)>,
}

impl Assembler {
    pub fn new(table: &'static DecodeTable) -> Assembler {
        let mut mnemonics = FnvHashMap::default();

        for op in table.reachable() {
            match op.mnemonic.strip_suffix("fmt") {
                Some(stem) => {
                    for &(fmt, suffix) in FPU_FORMATS.iter() {
                        mnemonics.insert(format!("{}{}", stem, suffix), (op, Some(fmt)));
                    }
                }
                None => {
                    mnemonics.insert(op.mnemonic.to_string(), (op, None));
                }
            }
        }

        Assembler { table, mnemonics }
    }

    /// Assemble one instruction located at `pc`
    pub fn assemble(&self, text: &str, pc: u64) -> MipsResult<u32> {
        let bad = || MipsError::BadAssembly(text.to_string());

        let text = text.trim();
        let (name, rest) = match text.split_once(char::is_whitespace) {
            Some((n, r)) => (n, r.trim()),
            None => (text, ""),
        };

        let &(op, fmt) = self.mnemonics.get(name).ok_or_else(bad)?;
        let mut word = self.table.encoding(op).ok_or_else(bad)?;

        if let Some(fmt) = fmt {
            word = (word & !(0x1f << 21)) | ((fmt as u32) << 21);
        }

        let args: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        let fields = encode_operands(op.format, &args, pc).ok_or_else(bad)?;

        Ok(word | fields)
    }
}

fn rs(r: u32) -> u32 {
    r << 21
}

fn rt(r: u32) -> u32 {
    r << 16
}

fn rd(r: u32) -> u32 {
    r << 11
}

fn sa(r: u32) -> u32 {
    r << 6
}

fn encode_operands(format: Format, args: &[&str], pc: u64) -> Option<u32> {
    let arg = |n: usize| args.get(n).copied();
    let g = |n: usize| arg(n).and_then(parse_gpr);
    let branch = |n: usize| {
        let target = arg(n).and_then(parse_int)? as u64;
        let delta = target.wrapping_sub(pc.wrapping_add(4)) as i64;

        Some(((delta >> 2) as u32) & 0xffff)
    };

    let fields = match (format, args.len()) {
        (Format::Empty, 0) => 0,
        (Format::Jump, 1) => ((arg(0).and_then(parse_int)? as u32) >> 2) & 0x3ff_ffff,
        (Format::Branch2, 3) => rs(g(0)?) | rt(g(1)?) | branch(2)?,
        (Format::Branch1, 2) => rs(g(0)?) | branch(1)?,
        (Format::Bc1, 1) => branch(0)?,
        (Format::ITsi, 3) => rt(g(0)?) | rs(g(1)?) | imm16(arg(2)?)?,
        (Format::ITi, 2) => rt(g(0)?) | imm16(arg(1)?)?,
        (Format::ITis, 2) => {
            let (off, base) = parse_mem(arg(1)?)?;
            rt(g(0)?) | rs(base) | off
        }
        (Format::IFtis, 2) => {
            let (off, base) = parse_mem(arg(1)?)?;
            rt(parse_prefixed(arg(0)?, "f")?) | rs(base) | off
        }
        (Format::Cache, 2) => {
            let (off, base) = parse_mem(arg(1)?)?;
            let code = parse_int(arg(0)?)? as u32;
            if code > 0x1f {
                return None;
            }
            rt(code) | rs(base) | off
        }
        (Format::ISi, 2) => rs(g(0)?) | imm16(arg(1)?)?,
        (Format::Cop0, 2) => rt(g(0)?) | rd(parse_prefixed(arg(1)?, "c")?),
        (Format::Cop1, 2) => rt(g(0)?) | rd(parse_prefixed(arg(1)?, "f")?),
        (Format::Cop1Ctl, 2) => rt(g(0)?) | rd(parse_prefixed(arg(1)?, "fcr")?),
        (Format::Cop1Dst, 3) => {
            sa(parse_prefixed(arg(0)?, "f")?)
                | rd(parse_prefixed(arg(1)?, "f")?)
                | rt(parse_prefixed(arg(2)?, "f")?)
        }
        (Format::Cop1Ds, 2) => sa(parse_prefixed(arg(0)?, "f")?) | rd(parse_prefixed(arg(1)?, "f")?),
        (Format::Cop1St, 2) => rd(parse_prefixed(arg(0)?, "f")?) | rt(parse_prefixed(arg(1)?, "f")?),
        (Format::RDta, 3) => {
            let shift = parse_int(arg(2)?)? as u32;
            if shift > 0x1f {
                return None;
            }
            rd(g(0)?) | rt(g(1)?) | sa(shift)
        }
        (Format::RDts, 3) => rd(g(0)?) | rt(g(1)?) | rs(g(2)?),
        (Format::RS, 1) => rs(g(0)?),
        (Format::RSd, 2) => rd(g(0)?) | rs(g(1)?),
        (Format::RD, 1) => rd(g(0)?),
        (Format::RSt, 2) => rs(g(0)?) | rt(g(1)?),
        (Format::RDst, 3) => rd(g(0)?) | rs(g(1)?) | rt(g(2)?),
        (Format::Code, 0) => 0,
        (Format::Code, 1) => ((parse_int(arg(0)?)? as u32) & 0xf_ffff) << 6,
        (Format::TrapWithCode, 2) => rs(g(0)?) | rt(g(1)?),
        (Format::TrapWithCode, 3) => rs(g(0)?) | rt(g(1)?) | (((parse_int(arg(2)?)? as u32) & 0x3ff) << 6),
        (Format::VuStd, 3) => {
            let (vt, e) = parse_element(arg(2)?)?;
            sa(parse_prefixed(arg(0)?, "v")?) | rd(parse_prefixed(arg(1)?, "v")?) | rt(vt) | (e << 21)
        }
        (Format::VuSeDe, 2) => {
            let (vd, de) = parse_element(arg(0)?)?;
            let (vt, e) = parse_element(arg(1)?)?;
            sa(vd) | rd(de) | rt(vt) | (e << 21)
        }
        (Format::VuLoadStore, 2) => {
            let (vt, e) = parse_element(arg(0)?)?;
            let (off, base) = arg(1)?.strip_suffix(')')?.split_once('(')?;
            let off = parse_int(off)?;
            if !(-64..64).contains(&off) {
                return None;
            }
            rt(vt) | rs(parse_gpr(base)?) | (e << 7) | (off as u32 & 0x7f)
        }
        (Format::VuMove, 2) => {
            let (vs, e) = parse_element(arg(1)?)?;
            rt(g(0)?) | rd(vs) | (e << 7)
        }
        (Format::VuCtl, 2) => rt(g(0)?) | rd(parse_prefixed(arg(1)?, "vc")?),
        _ => return None,
    };

    Some(fields)
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (neg, s) = match s.strip_prefix('-') {
        Some(s) => (true, s),
        None => (false, s),
    };

    let v = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok()? as i64,
        None => s.parse::<i64>().ok()?,
    };

    Some(if neg { v.wrapping_neg() } else { v })
}

fn imm16(s: &str) -> Option<u32> {
    let v = parse_int(s)?;

    if (-0x8000..=0xffff).contains(&v) {
        Some(v as u32 & 0xffff)
    } else {
        None
    }
}

fn parse_gpr(s: &str) -> Option<u32> {
    let s = s.trim();

    if let Some(i) = GPR_NAMES.iter().position(|&n| n == s) {
        return Some(i as u32);
    }

    s.strip_prefix('$')
        .or_else(|| s.strip_prefix('r'))
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|&n| n < 32)
}

fn parse_prefixed(s: &str, prefix: &str) -> Option<u32> {
    s.trim()
        .strip_prefix(prefix)?
        .parse::<u32>()
        .ok()
        .filter(|&n| n < 32)
}

/// `v3[e5]` -> (3, 5)
fn parse_element(s: &str) -> Option<(u32, u32)> {
    let (reg, e) = s.trim().strip_suffix(']')?.split_once('[')?;
    let e = e.strip_prefix('e')?.parse::<u32>().ok().filter(|&e| e < 16)?;

    Some((parse_prefixed(reg, "v")?, e))
}

/// `-32(sp)` -> (0xffe0, 29)
fn parse_mem(s: &str) -> Option<(u32, u32)> {
    let (off, base) = s.trim().strip_suffix(')')?.split_once('(')?;

    Some((imm16(off)?, parse_gpr(base)?))
}

/// Decode and render a single word, convenient for tracing
pub fn disassemble_word(table: &DecodeTable, word: u32, address: u64) -> String {
    disassemble(&super::decode(table, word, address))
}
