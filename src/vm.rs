use crate::decoder;
use crate::disasm;
use crate::display::Display;
use crate::exec;
use crate::isa;
use crate::memory::{Memory, PROGRAM_ROM, PROGRAM_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VmConfig {
    /// Safety ceiling on executed instructions; hitting it stops the run
    /// with a warning, not a fault.
    pub max_steps: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { max_steps: 1_000_000 }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fault {
    #[error("unknown instruction at {pc:#06x} (opcode={opcode:#04x}, funct3={funct3:#x})")]
    UnknownInstruction { pc: u16, opcode: u8, funct3: u8 },
    #[error("program counter out of bounds ({pc:#06x})")]
    PcOutOfBounds { pc: u16 },
    #[error("ROM image too large ({len} bytes, max {max})")]
    RomTooLarge { len: usize, max: usize },
    #[error("return stack overflow")]
    StackOverflow,
    #[error("return stack underflow")]
    StackUnderflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Halted,
    Faulted(Fault),
    CeilingReached,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    /// Errors recovered in place (division by zero), never silently dropped.
    pub recovered: u64,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halt,
}

/// The whole machine: 16 8-bit registers, 64 KiB of memory, a 16-bit PC,
/// and the reserved pieces of the architecture (index register, return
/// stack, timers) that no current opcode touches.
pub struct Vm {
    pub regs: [u8; 16],
    pub mem: Memory,
    pub pc: u16,
    /// Reserved; unused by every current opcode.
    pub index: u16,
    /// Reserved; no clock decrements these.
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub display: Display,
    /// PC of the most recent step, kept inspectable across faults.
    pub last_pc: u16,
    /// Most recently fetched instruction word.
    pub fetched: u32,
    stack: [u16; 16],
    sp: u8,
    recovered: u64,
    cfg: VmConfig,
}

impl Vm {
    pub fn new(cfg: VmConfig) -> Self {
        Self {
            regs: [0; 16],
            mem: Memory::new(),
            pc: PROGRAM_ROM,
            index: 0,
            delay_timer: 0,
            sound_timer: 0,
            display: Display::new(),
            last_pc: PROGRAM_ROM,
            fetched: 0,
            stack: [0; 16],
            sp: 0,
            recovered: 0,
            cfg,
        }
    }

    /// Copy a ROM image into the program region at the fixed base address.
    pub fn load_rom(&mut self, image: &[u8]) -> Result<(), Fault> {
        if !self.mem.load_program(image) {
            return Err(Fault::RomTooLarge { len: image.len(), max: PROGRAM_SIZE });
        }
        debug!(len = image.len(), "loaded ROM");
        Ok(())
    }

    /// One fetch -> classify -> decode -> execute cycle.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        let pc = self.pc;
        if pc < PROGRAM_ROM || pc >= PROGRAM_ROM + PROGRAM_SIZE as u16 {
            return Err(Fault::PcOutOfBounds { pc });
        }
        self.last_pc = pc;

        // Classify: byte0 carries the selector; a handful of selectors also
        // need byte1's low nibble before the descriptor can be resolved.
        let byte0 = self.mem.read_u8(pc);
        let funct3 = byte0 & 0x7;
        let opcode = (byte0 >> 3) & 0x1F;
        let funct4 = if isa::selector_needs_funct4(byte0) {
            Some(self.mem.read_u8(pc + 1) & 0xF)
        } else {
            None
        };
        let desc = isa::lookup_by_selector(opcode, funct3, funct4)
            .ok_or(Fault::UnknownInstruction { pc, opcode, funct3 })?;

        // Fetch the full word little-endian, then decode it.
        let mut word = 0u32;
        for i in 0..desc.width.bytes() {
            word |= (self.mem.read_u8(pc + i as u16) as u32) << (i * 8);
        }
        self.fetched = word;
        let dec = decoder::decode(word, desc);
        debug!(pc = format_args!("{pc:#06x}"), instr = %disasm::fmt_decoded(&dec), "step");

        if dec.halt {
            return Ok(StepOutcome::Halt);
        }

        // Branches and jumps override the advanced PC inside execute.
        self.pc = pc.wrapping_add(desc.width.bytes() as u16);
        exec::execute(self, &dec)?;
        Ok(StepOutcome::Continue)
    }

    /// Run until HALT, a fault, or the instruction ceiling.
    pub fn run(&mut self) -> RunSummary {
        let mut steps = 0u64;
        while steps < self.cfg.max_steps {
            match self.step() {
                Ok(StepOutcome::Continue) => steps += 1,
                Ok(StepOutcome::Halt) => {
                    steps += 1;
                    debug!("HALT encountered");
                    return self.summary(steps, StopReason::Halted);
                }
                Err(fault) => {
                    warn!(
                        %fault,
                        pc = format_args!("{:#06x}", self.last_pc),
                        word = format_args!("{:#010x}", self.fetched),
                        "execution fault"
                    );
                    return self.summary(steps, StopReason::Faulted(fault));
                }
            }
        }
        warn!(limit = self.cfg.max_steps, "instruction ceiling reached");
        self.summary(steps, StopReason::CeilingReached)
    }

    fn summary(&self, steps: u64, stop: StopReason) -> RunSummary {
        RunSummary { steps, recovered: self.recovered, stop }
    }

    pub(crate) fn report_division_by_zero(&mut self) {
        self.recovered += 1;
        warn!(pc = format_args!("{:#06x}", self.last_pc), "division by zero");
    }

    pub fn recovered(&self) -> u64 {
        self.recovered
    }

    /// Reserved for future CALL/RET support; no opcode reaches this.
    pub fn push_return(&mut self, value: u16) -> Result<(), Fault> {
        if self.sp as usize >= self.stack.len() {
            return Err(Fault::StackOverflow);
        }
        self.stack[self.sp as usize] = value;
        self.sp += 1;
        Ok(())
    }

    /// Reserved for future CALL/RET support; no opcode reaches this.
    pub fn pop_return(&mut self) -> Result<u16, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp as usize])
    }

    /// One-line state dump for diagnostics.
    pub fn state_line(&self) -> String {
        let regs = self
            .regs
            .iter()
            .enumerate()
            .map(|(i, v)| format!("r{i}:{v:#04x}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "PC: {:#06x} | IR: {:#010x} | SP: {} | I: {:#06x}\n{}",
            self.pc, self.fetched, self.sp, self.index, regs
        )
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}
