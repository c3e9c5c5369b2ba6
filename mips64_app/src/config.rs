//! Runner configuration: an INI file with a `[Core]` section mapped onto `CoreConfig` and a
//! `[Program]` section describing what to load and how long to run it.
//!
//! ```ini
//! [Core]
//! reset_pc = 0xffffffffbfc00000
//! ram_size = 0x800000
//! mode_64 = false
//!
//! [Program]
//! image = boot.bin
//! load_address = 0x1000
//! target = cpu
//! steps = 1000
//! ```

use crate::error::{AppError, Result};
use ini::{Ini, Properties};
use mips64_lib::CoreConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Which core runs the image
#[derive(Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum Target {
    /// R4300i, the image is loaded in RAM
    Cpu,
    /// RSP, the image is loaded in IMEM
    Rsp,
}

impl FromStr for Target {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Target, ()> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Target::Cpu),
            "rsp" => Ok(Target::Rsp),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProgramConfig {
    pub image: Option<PathBuf>,
    /// Physical RAM address (CPU) or IMEM offset (RSP) of the first byte of the image
    pub load_address: u32,
    /// Start address. Defaults to the core's reset PC for the CPU and to `load_address` for
    /// the RSP
    pub entry: Option<u64>,
    pub target: Target,
    pub steps: u64,
}

impl Default for ProgramConfig {
    fn default() -> ProgramConfig {
        ProgramConfig {
            image: None,
            load_address: 0,
            entry: None,
            target: Target::Cpu,
            steps: 1000,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub core: CoreConfig,
    pub program: ProgramConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        info!("Loading configuration from {}", path.display());

        let ini = Ini::load_from_file(path)?;
        let mut config = Config::default();

        if let Some(core) = ini.section(Some("Core")) {
            config.core = parse_core(core)?;
        }

        if let Some(program) = ini.section(Some("Program")) {
            config.program = parse_program(program)?;
        }

        for (section, _) in ini.iter() {
            match section {
                None | Some("Core") | Some("Program") => (),
                Some(s) => warn!("Ignoring unknown section [{}] in {}", s, path.display()),
            }
        }

        Ok(config)
    }
}

fn parse_core(props: &Properties) -> Result<CoreConfig> {
    let mut core = CoreConfig::default();

    for (key, value) in props.iter() {
        match key {
            "ram_size" => core.ram_size = parse_int(key, value)? as usize,
            "reset_pc" => core.reset_pc = parse_int(key, value)?,
            "mode_64" => core.mode_64 = parse_bool(key, value)?,
            "mmu_bypass" => core.mmu_bypass = parse_bool(key, value)?,
            "fpu_fr" => core.fpu_fr = parse_bool(key, value)?,
            "trace_instructions" => core.trace_instructions = parse_bool(key, value)?,
            _ => warn!("Unknown [Core] key `{}`", key),
        }
    }

    Ok(core)
}

fn parse_program(props: &Properties) -> Result<ProgramConfig> {
    let mut program = ProgramConfig::default();

    for (key, value) in props.iter() {
        match key {
            "image" => program.image = Some(PathBuf::from(value)),
            "load_address" => program.load_address = parse_int(key, value)? as u32,
            "entry" => program.entry = Some(parse_int(key, value)?),
            "steps" => program.steps = parse_int(key, value)?,
            "target" => program.target = value.parse().map_err(|_| bad_value(key, value))?,
            _ => warn!("Unknown [Program] key `{}`", key),
        }
    }

    Ok(program)
}

fn bad_value(key: &str, value: &str) -> AppError {
    AppError::BadValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Decimal or `0x` prefixed hexadecimal
pub fn parse_u64(s: &str) -> Option<u64> {
    let s = s.trim().replace('_', "");

    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn parse_int(key: &str, value: &str) -> Result<u64> {
    parse_u64(value).ok_or_else(|| bad_value(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(bad_value(key, value)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_u64("0x1000"), Some(0x1000));
        assert_eq!(parse_u64("0xffff_ffff_bfc0_0000"), Some(0xffff_ffff_bfc0_0000));
        assert_eq!(parse_u64(" 42 "), Some(42));
        assert_eq!(parse_u64("nope"), None);
    }

    #[test]
    fn sections() {
        let ini = Ini::load_from_str(
            "[Core]\nmode_64 = true\nreset_pc = 0x80001000\n\
             [Program]\nimage = a.bin\ntarget = RSP\nsteps = 12\n",
        )
        .unwrap();

        let core = parse_core(ini.section(Some("Core")).unwrap()).unwrap();
        let program = parse_program(ini.section(Some("Program")).unwrap()).unwrap();

        assert!(core.mode_64);
        assert_eq!(core.reset_pc, 0x8000_1000);
        assert_eq!(core.ram_size, CoreConfig::default().ram_size);
        assert_eq!(program.target, Target::Rsp);
        assert_eq!(program.steps, 12);
        assert_eq!(program.image, Some(PathBuf::from("a.bin")));
    }

    #[test]
    fn bad_bool() {
        let ini = Ini::load_from_str("[Core]\nfpu_fr = maybe\n").unwrap();

        assert!(matches!(
            parse_core(ini.section(Some("Core")).unwrap()),
            Err(AppError::BadValue { .. })
        ));
    }
}
