use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble risc8 source into a flat little-endian ROM image")]
struct Opts {
    /// Input assembly file (one instruction or directive per line)
    #[arg(short, long)]
    input: PathBuf,
    /// Output ROM file
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let text = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;

    let rom = match risc8::assembler::assemble(&text) {
        Ok(rom) => rom,
        Err(errs) => {
            for e in &errs.errors {
                eprintln!("{e}");
            }
            return Err(errs.into());
        }
    };

    fs::write(&opts.output, &rom)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    println!("wrote {} bytes to {}", rom.len(), opts.output.display());
    Ok(())
}
