use crate::isa::{self, Descriptor, Format, Width};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AsmErrorKind {
    #[error("operand count does not match the instruction format")]
    MalformedOperands,
    #[error("register operand must be r0-r15")]
    InvalidRegister,
    #[error("immediate does not fit its field")]
    ImmediateOutOfRange,
    #[error("unknown mnemonic")]
    UnknownMnemonic,
    #[error("bad directive operand")]
    BadDirective,
}

/// One failed source line, kept alongside its raw text so a toolchain
/// consumer can report every error in one pass.
#[derive(Debug, Clone, Error)]
#[error("line {line}: {kind}: {text}")]
pub struct LineError {
    pub line: usize,
    pub kind: AsmErrorKind,
    pub text: String,
}

#[derive(Debug, Error)]
#[error("{} line(s) failed to assemble", .errors.len())]
pub struct AssembleErrors {
    pub errors: Vec<LineError>,
}

/// Result of encoding one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutput {
    /// Blank line or comment: the reserved "no instruction" case.
    None,
    /// A packed instruction word and its encoded width.
    Word { word: u32, width: Width },
    /// Raw bytes from a `.byte`/`.word` directive.
    Data(Vec<u8>),
}

/// Assemble a whole source text into a flat little-endian ROM image.
///
/// Errors are collected per line rather than aborting at the first bad
/// line; the ROM bytes are only returned when every line assembled.
pub fn assemble(text: &str) -> Result<Vec<u8>, AssembleErrors> {
    let mut out = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        match encode_line(raw) {
            Ok(LineOutput::None) => {}
            Ok(LineOutput::Word { word, width }) => {
                out.extend_from_slice(&word.to_le_bytes()[..width.bytes()]);
            }
            Ok(LineOutput::Data(bytes)) => out.extend_from_slice(&bytes),
            Err(kind) => errors.push(LineError {
                line: idx + 1,
                kind,
                text: raw.trim().to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(AssembleErrors { errors })
    }
}

/// Encode a single source line. Comment and blank lines yield
/// `LineOutput::None` and no bytes.
pub fn encode_line(line: &str) -> Result<LineOutput, AsmErrorKind> {
    let mut s = line;
    if s.trim_start().starts_with('#') {
        return Ok(LineOutput::None);
    }
    if let Some(p) = s.find(';') {
        s = &s[..p];
    }
    let s = s.trim();
    if s.is_empty() {
        return Ok(LineOutput::None);
    }

    let mut parts = s.split_whitespace();
    let mnemonic = parts.next().expect("non-empty line");
    let rest = parts.collect::<Vec<_>>().join(" ");

    match mnemonic {
        ".byte" => {
            let v = parse_int(&rest).ok_or(AsmErrorKind::BadDirective)?;
            return Ok(LineOutput::Data(vec![(v & 0xFF) as u8]));
        }
        ".word" => {
            let v = parse_int(&rest).ok_or(AsmErrorKind::BadDirective)?;
            return Ok(LineOutput::Data((v as u32).to_le_bytes().to_vec()));
        }
        _ => {}
    }

    let desc = isa::lookup_by_name(mnemonic).ok_or(AsmErrorKind::UnknownMnemonic)?;
    let word = encode_operands(desc, &rest)?;
    trace!(name = desc.name, word = format_args!("{word:#010x}"), "assembled");
    Ok(LineOutput::Word { word, width: desc.width })
}

fn encode_operands(desc: &'static Descriptor, rest: &str) -> Result<u32, AsmErrorKind> {
    let ops: Vec<&str> = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };
    if ops.iter().any(|o| o.is_empty()) {
        return Err(AsmErrorKind::MalformedOperands);
    }

    let arity = match desc.format {
        Format::NoOperand => 0,
        Format::U | Format::J => 2,
        _ => 3,
    };
    if ops.len() != arity {
        return Err(AsmErrorKind::MalformedOperands);
    }

    let byte0 = desc.funct3 as u32 | (desc.opcode as u32) << 3;
    let funct4 = desc.funct4.unwrap_or(0) as u32;

    let word = match desc.format {
        Format::R => {
            let rd = parse_reg(ops[0])?;
            let rs1 = parse_reg(ops[1])?;
            let rs2 = parse_reg(ops[2])?;
            byte0 | (funct4 | rd << 4) << 8 | (rs1 | rs2 << 4) << 16
        }
        Format::I => {
            let rd = parse_reg(ops[0])?;
            let rs1 = parse_reg(ops[1])?;
            let imm = imm_unsigned(ops[2], 16)?;
            byte0 | (rd | rs1 << 4) << 8 | imm << 16
        }
        Format::U => {
            let rd = parse_reg(ops[0])?;
            let imm = imm_unsigned(ops[1], 16)?;
            byte0 | (funct4 | rd << 4) << 8 | imm << 16
        }
        Format::S => {
            let rs1 = parse_reg(ops[0])?;
            let rs2 = parse_reg(ops[1])?;
            let imm = imm_unsigned(ops[2], 16)?;
            byte0 | (rs1 | rs2 << 4) << 8 | imm << 16
        }
        Format::B => {
            let rs1 = parse_reg(ops[0])?;
            let rs2 = parse_reg(ops[1])?;
            let imm = imm_signed(ops[2], 16)?;
            byte0 | (rs1 | rs2 << 4) << 8 | imm << 16
        }
        Format::J => {
            let rd = parse_reg(ops[0])?;
            let imm = imm_signed(ops[1], 20)?;
            byte0 | rd << 8 | (imm & 0xFFF) << 12 | ((imm >> 12) & 0xFF) << 24
        }
        Format::Jr => {
            let rd = parse_reg(ops[0])?;
            let rs1 = parse_reg(ops[1])?;
            let imm = imm_signed(ops[2], 16)?;
            byte0 | (rd | rs1 << 4) << 8 | imm << 16
        }
        Format::ShiftImm => {
            let rd = parse_reg(ops[0])?;
            let rs1 = parse_reg(ops[1])?;
            let shamt = imm_unsigned(ops[2], 5)?;
            byte0 | (funct4 | rd << 4) << 8 | shamt << 16 | rs1 << 24
        }
        Format::Glyph => {
            let glyph = imm_unsigned(ops[0], 4)?;
            let x = imm_unsigned(ops[1], 4)?;
            let y = imm_unsigned(ops[2], 4)?;
            byte0 | (glyph | x << 4) << 8 | y << 16
        }
        Format::NoOperand => byte0,
    };

    Ok(word)
}

fn parse_reg(tok: &str) -> Result<u32, AsmErrorKind> {
    let digits = tok
        .strip_prefix('r')
        .or_else(|| tok.strip_prefix('R'))
        .ok_or(AsmErrorKind::InvalidRegister)?;
    let idx: u32 = digits.parse().map_err(|_| AsmErrorKind::InvalidRegister)?;
    if idx > 15 {
        return Err(AsmErrorKind::InvalidRegister);
    }
    Ok(idx)
}

/// Decimal or `0x`-prefixed hex, optional leading minus.
fn parse_int(tok: &str) -> Option<i64> {
    let t = tok.trim();
    let (neg, t) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t),
    };
    let v = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        t.parse::<i64>().ok()?
    };
    Some(if neg { -v } else { v })
}

/// Unsigned fields are truncated to the field width.
fn imm_unsigned(tok: &str, bits: u32) -> Result<u32, AsmErrorKind> {
    let v = parse_int(tok).ok_or(AsmErrorKind::ImmediateOutOfRange)?;
    Ok((v as u64 & ((1u64 << bits) - 1)) as u32)
}

/// Signed fields must fit the field's signed range.
fn imm_signed(tok: &str, bits: u32) -> Result<u32, AsmErrorKind> {
    let v = parse_int(tok).ok_or(AsmErrorKind::ImmediateOutOfRange)?;
    let bound = 1i64 << (bits - 1);
    if v < -bound || v >= bound {
        return Err(AsmErrorKind::ImmediateOutOfRange);
    }
    Ok((v as u64 & ((1u64 << bits) - 1)) as u32)
}
