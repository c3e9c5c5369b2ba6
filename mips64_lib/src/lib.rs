//! Cycle-level MIPS R4300i interpreter (integer core, FPU and coprocessor 0) together with the
//! N64 RSP and its vector unit. Both cores share the instruction catalog, decode tables and
//! call table dispatch found in `isa`.

// Register files are indexed by instruction fields all over the place, iterators over them
// would not read any better.
#![allow(clippy::needless_range_loop)]
// The types are constrained by the hardware, "as" casts truncate and sign extend exactly where
// we want them to.
#![allow(clippy::cast_lossless)]
// Wants to rewrite numeric comparison chains in the ALU and FPU as match, which doesn't make a
// lot of sense there.
#![allow(clippy::comparison_chain)]
// rs, rt, rd, vs, vt, vd...
#![allow(clippy::many_single_char_names)]

#[macro_use]
extern crate arrayref;
#[macro_use]
extern crate log;

pub mod bitwise;
pub mod config;
pub mod cpu;
pub mod error;
pub mod isa;
pub mod memory;
pub mod rsp;
pub mod tracer;

pub use config::CoreConfig;
pub use cpu::Cpu;
pub use error::{MipsError, MipsResult};
pub use memory::{PhysicalMemory, Ram, Scratch};
pub use rsp::Rsp;
pub use tracer::Tracer;
