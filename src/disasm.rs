use crate::decoder::DecodedInstruction;
use crate::isa::Format;

/// Render a decoded instruction for step traces and listings.
pub fn fmt_decoded(d: &DecodedInstruction) -> String {
    let name = d.desc.name;
    match d.desc.format {
        Format::R => format!("{name} r{}, r{}, r{}", d.rd, d.rs1, d.rs2),
        Format::I => format!("{name} r{}, r{}, {:#06x}", d.rd, d.rs1, d.imm),
        Format::U => format!("{name} r{}, {:#06x}", d.rd, d.imm),
        Format::S => format!("{name} r{}, {:#06x}(r{})", d.rs2, d.imm, d.rs1),
        Format::B => format!("{name} r{}, r{}, {:#06x}", d.rs1, d.rs2, d.imm),
        Format::J => format!("{name} r{}, {:#07x}", d.rd, d.imm),
        Format::Jr => format!("{name} r{}, r{}, {:#06x}", d.rd, d.rs1, d.imm),
        Format::ShiftImm => format!("{name} r{}, r{}, {}", d.rd, d.rs1, d.imm & 0x1F),
        Format::Glyph => format!("{name} {}, {}, {}", d.rd, d.rs1, d.rs2),
        Format::NoOperand => name.to_string(),
    }
}
