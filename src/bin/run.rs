use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use risc8::{StopReason, Vm, VmConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a risc8 ROM image on the interpreter")]
struct Opts {
    /// Instruction ceiling before the run is cut off
    #[arg(long)]
    max_steps: Option<u64>,
    /// Print the final machine state as JSON
    #[arg(long)]
    json: bool,
    #[arg(value_name = "ROMFILE")]
    input: PathBuf,
}

#[derive(Debug, Serialize)]
struct FinalState {
    pc: u16,
    steps: u64,
    recovered: u64,
    stop: StopReason,
    regs: [u8; 16],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let image = std::fs::read(&opts.input)?;

    let mut cfg = VmConfig::default();
    if let Some(max) = opts.max_steps {
        cfg.max_steps = max;
    }
    let mut vm = Vm::new(cfg);
    vm.load_rom(&image)?;

    let summary = vm.run();

    if opts.json {
        let state = FinalState {
            pc: vm.pc,
            steps: summary.steps,
            recovered: summary.recovered,
            stop: summary.stop,
            regs: vm.regs,
        };
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("executed {} instructions ({:?})", summary.steps, summary.stop);
        println!("{}", vm.state_line());
    }
    Ok(())
}
