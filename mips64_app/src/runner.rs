//! Load an image into one of the cores, run it for a bounded number of steps and dump the final
//! state.

use crate::config::{Config, Target};
use crate::error::{AppError, Result};
use mips64_lib::{Cpu, Ram, Rsp};
use std::fs;
use tracing::{debug, info};

pub fn run(config: &Config) -> Result<()> {
    let path = config.program.image.as_ref().ok_or(AppError::NoImage)?;
    let image = fs::read(path)?;

    info!(
        "Loaded {} ({} bytes) for the {:?}",
        path.display(),
        image.len(),
        config.program.target
    );

    match config.program.target {
        Target::Cpu => run_cpu(config, &image),
        Target::Rsp => run_rsp(config, &image),
    }
}

fn run_cpu(config: &Config, image: &[u8]) -> Result<()> {
    let program = &config.program;
    let mut ram = Ram::new(config.core.ram_size);

    ram.load_image(program.load_address, image)?;

    let mut cpu = Cpu::new(config.core.clone())?;

    cpu.attach_memory(Box::new(ram));

    if let Some(entry) = program.entry {
        cpu.set_pc(entry);
    }

    info!("Running {} steps from 0x{:016x}", program.steps, cpu.pc());

    cpu.run(program.steps)?;

    if let Some(e) = cpu.exception() {
        debug!("Pending exception: {:?}", e);
    }

    println!("{:?}", cpu);
    println!("Cycles: {}", cpu.cycles());

    Ok(())
}

fn run_rsp(config: &Config, image: &[u8]) -> Result<()> {
    let program = &config.program;
    let mut rsp = Rsp::new()?;

    rsp.set_trace_instructions(config.core.trace_instructions);
    rsp.imem_mut().copy_from(program.load_address, image);
    rsp.start(program.entry.map_or(program.load_address, |pc| pc as u32));

    info!("Running up to {} RSP steps from 0x{:03x}", program.steps, rsp.pc());

    let executed = rsp.run(program.steps)?;

    if rsp.is_broke() {
        info!("RSP hit BREAK after {} steps", executed);
    }

    println!("{:?}", rsp);
    println!("Cycles: {}", rsp.cycles());

    Ok(())
}
