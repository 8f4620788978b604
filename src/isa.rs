use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Encoded size of one instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Width {
    W24,
    W32,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::W24 => 3,
            Width::W32 => 4,
        }
    }
}

/// Operand/bit-layout family. `S` (stores) and `B` (branches) share a packed
/// layout; they differ only in how the assembler validates the immediate
/// (masked-unsigned vs must-fit-signed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    U,
    S,
    B,
    J,
    Jr,
    ShiftImm,
    Glyph,
    NoOperand,
}

/// Static metadata for one mnemonic. Both the encoder and the VM's decoder
/// resolve against the same descriptor, which is what keeps the two paths
/// bit-exact mirrors of each other.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Descriptor {
    pub name: &'static str,
    pub opcode: u8,
    pub funct3: u8,
    pub funct4: Option<u8>,
    pub width: Width,
    pub format: Format,
}

impl Descriptor {
    /// First-level lookup key: byte0 of every encoding.
    pub fn selector(&self) -> u8 {
        (self.opcode << 3) | self.funct3
    }
}

const fn ins(
    name: &'static str,
    opcode: u8,
    funct3: u8,
    funct4: Option<u8>,
    width: Width,
    format: Format,
) -> Descriptor {
    Descriptor { name, opcode, funct3, funct4, width, format }
}

/// The instruction catalog. Byte0 value 0x00 is reserved for "no
/// instruction" and must never appear here (no descriptor may have
/// opcode 0 with funct3 0).
pub static TABLE: &[Descriptor] = &[
    // Register-register arithmetic, funct4-disambiguated
    ins("ADD", 0x01, 0x0, Some(0x0), Width::W24, Format::R),
    ins("SUB", 0x01, 0x0, Some(0x1), Width::W24, Format::R),
    ins("MUL", 0x01, 0x0, Some(0x2), Width::W24, Format::R),
    ins("DIV", 0x01, 0x0, Some(0x3), Width::W24, Format::R),
    // Arithmetic immediates
    ins("ADDI", 0x02, 0x0, None, Width::W32, Format::I),
    ins("SUBI", 0x02, 0x1, None, Width::W32, Format::I),
    ins("MULI", 0x02, 0x2, None, Width::W32, Format::I),
    ins("DIVI", 0x02, 0x3, None, Width::W32, Format::I),
    // Upper immediates, funct4-disambiguated
    ins("LUI", 0x03, 0x0, Some(0x0), Width::W32, Format::U),
    ins("AUIPC", 0x03, 0x0, Some(0x1), Width::W32, Format::U),
    // Stores
    ins("SB", 0x04, 0x0, None, Width::W32, Format::S),
    ins("SH", 0x04, 0x1, None, Width::W32, Format::S),
    ins("SW", 0x04, 0x2, None, Width::W32, Format::S),
    // Branches
    ins("BEQ", 0x05, 0x0, None, Width::W32, Format::B),
    ins("BNE", 0x05, 0x1, None, Width::W32, Format::B),
    ins("BLT", 0x05, 0x2, None, Width::W32, Format::B),
    ins("BGT", 0x05, 0x3, None, Width::W32, Format::B),
    ins("BLE", 0x05, 0x4, None, Width::W32, Format::B),
    ins("BGE", 0x05, 0x5, None, Width::W32, Format::B),
    // Jumps
    ins("JAL", 0x06, 0x1, None, Width::W32, Format::J),
    ins("JALR", 0x06, 0x2, None, Width::W32, Format::Jr),
    // Loads
    ins("LW", 0x07, 0x0, None, Width::W32, Format::I),
    ins("LH", 0x07, 0x1, None, Width::W32, Format::I),
    ins("LB", 0x07, 0x2, None, Width::W32, Format::I),
    // Register-register bitwise, funct4-disambiguated
    ins("AND", 0x08, 0x0, Some(0x0), Width::W24, Format::R),
    ins("OR", 0x08, 0x0, Some(0x1), Width::W24, Format::R),
    ins("XOR", 0x08, 0x0, Some(0x2), Width::W24, Format::R),
    // Bitwise immediates
    ins("ANDI", 0x09, 0x0, None, Width::W32, Format::I),
    ins("ORI", 0x09, 0x1, None, Width::W32, Format::I),
    ins("XORI", 0x09, 0x2, None, Width::W32, Format::I),
    // Shifts: register form is 24-bit, immediate form is 32-bit
    ins("SLL", 0x0A, 0x0, Some(0x0), Width::W24, Format::R),
    ins("SRL", 0x0A, 0x0, Some(0x1), Width::W24, Format::R),
    ins("SLLI", 0x0A, 0x1, Some(0x0), Width::W32, Format::ShiftImm),
    ins("SRLI", 0x0A, 0x1, Some(0x1), Width::W32, Format::ShiftImm),
    // Display
    ins("CLS", 0x0B, 0x0, None, Width::W24, Format::NoOperand),
    ins("CHAR", 0x0B, 0x1, None, Width::W24, Format::Glyph),
    // Halt
    ins("HALT", 0x0F, 0x0, None, Width::W32, Format::NoOperand),
];

static BY_NAME: LazyLock<HashMap<&'static str, &'static Descriptor>> = LazyLock::new(|| {
    TABLE.iter().map(|d| (d.name, d)).collect()
});

// Selectors whose byte0 alone resolves the descriptor.
static BY_SELECTOR: LazyLock<HashMap<u8, &'static Descriptor>> = LazyLock::new(|| {
    TABLE
        .iter()
        .filter(|d| d.funct4.is_none())
        .map(|d| (d.selector(), d))
        .collect()
});

// Selectors that need the low nibble of byte1 to disambiguate.
static BY_SELECTOR_FUNCT4: LazyLock<HashMap<(u8, u8), &'static Descriptor>> =
    LazyLock::new(|| {
        TABLE
            .iter()
            .filter_map(|d| d.funct4.map(|f4| ((d.selector(), f4), d)))
            .collect()
    });

static FUNCT4_SELECTORS: LazyLock<HashSet<u8>> = LazyLock::new(|| {
    TABLE
        .iter()
        .filter(|d| d.funct4.is_some())
        .map(|d| d.selector())
        .collect()
});

/// Case-insensitive mnemonic lookup.
pub fn lookup_by_name(name: &str) -> Option<&'static Descriptor> {
    BY_NAME.get(name.to_ascii_uppercase().as_str()).copied()
}

/// Resolve a descriptor from the wire selector. `funct4` is only consulted
/// for selectors that disambiguate on it.
pub fn lookup_by_selector(opcode: u8, funct3: u8, funct4: Option<u8>) -> Option<&'static Descriptor> {
    let sel = (opcode << 3) | funct3;
    if FUNCT4_SELECTORS.contains(&sel) {
        BY_SELECTOR_FUNCT4.get(&(sel, funct4?)).copied()
    } else {
        BY_SELECTOR.get(&sel).copied()
    }
}

/// Whether the fetch stage must read byte1's low nibble before it can
/// resolve the descriptor for this byte0.
pub fn selector_needs_funct4(selector: u8) -> bool {
    FUNCT4_SELECTORS.contains(&selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_is_case_insensitive() {
        let d = lookup_by_name("addi").expect("addi");
        assert_eq!(d.name, "ADDI");
        assert!(std::ptr::eq(d, lookup_by_name("AdDi").unwrap()));
    }

    #[test]
    fn selector_resolution_matches_table() {
        for d in TABLE {
            let found = lookup_by_selector(d.opcode, d.funct3, d.funct4)
                .unwrap_or_else(|| panic!("{} did not resolve", d.name));
            assert!(std::ptr::eq(d, found), "{} resolved to {}", d.name, found.name);
        }
    }

    #[test]
    fn reserved_selector_never_resolves() {
        assert!(lookup_by_selector(0x00, 0x0, None).is_none());
        assert!(lookup_by_selector(0x00, 0x0, Some(0x0)).is_none());
    }

    #[test]
    fn funct4_selectors_require_the_nibble() {
        let add = lookup_by_name("ADD").unwrap();
        assert!(selector_needs_funct4(add.selector()));
        assert!(lookup_by_selector(add.opcode, add.funct3, None).is_none());
    }
}
