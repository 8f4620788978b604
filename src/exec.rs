use crate::decoder::{sign_ext, DecodedInstruction};
use crate::memory::ADDR_MASK;
use crate::vm::{Fault, Vm};

/// Apply one decoded instruction to the machine state. The PC has already
/// been advanced past the instruction; branch and jump opcodes override it.
pub fn execute(vm: &mut Vm, dec: &DecodedInstruction) -> Result<(), Fault> {
    let rd = dec.rd as usize;
    let rs1 = dec.rs1 as usize;
    let rs2 = dec.rs2 as usize;

    match dec.opcode {
        // Arithmetic R-type (ADD, SUB, MUL, DIV)
        0x01 => {
            let a = vm.regs[rs1];
            let b = vm.regs[rs2];
            match dec.funct4 {
                0x0 => vm.regs[rd] = a.wrapping_add(b),
                0x1 => vm.regs[rd] = a.wrapping_sub(b),
                0x2 => vm.regs[rd] = a.wrapping_mul(b),
                0x3 => match a.checked_div(b) {
                    Some(q) => vm.regs[rd] = q,
                    None => vm.report_division_by_zero(),
                },
                _ => return Err(unknown(vm, dec)),
            }
        }

        // Arithmetic immediates (ADDI, SUBI, MULI, DIVI)
        0x02 => {
            let a = vm.regs[rs1];
            let imm = (dec.imm & 0xFF) as u8;
            match dec.funct3 {
                0x0 => vm.regs[rd] = a.wrapping_add(imm),
                0x1 => vm.regs[rd] = a.wrapping_sub(imm),
                0x2 => vm.regs[rd] = a.wrapping_mul(imm),
                0x3 => match a.checked_div(imm) {
                    Some(q) => vm.regs[rd] = q,
                    None => vm.report_division_by_zero(),
                },
                _ => return Err(unknown(vm, dec)),
            }
        }

        // Upper immediates (LUI, AUIPC)
        0x03 => match dec.funct4 {
            0x0 => vm.regs[rd] = (dec.imm >> 8) as u8,
            0x1 => vm.regs[rd] = ((vm.pc as u32 + (dec.imm << 8)) >> 8) as u8,
            _ => return Err(unknown(vm, dec)),
        },

        // Stores (SB, SH, SW)
        0x04 => {
            let addr = data_addr(vm.regs[rs1], dec.imm, 0);
            match dec.funct3 {
                0x0 => vm.mem.write_u8(addr, vm.regs[rs2]),
                0x1 => vm.mem.write_u16(addr, vm.regs[rs2] as u16),
                0x2 => {
                    // Register pair: each register supplies the low byte of
                    // one halfword.
                    vm.mem.write_u16(addr, vm.regs[rs2] as u16);
                    let hi = data_addr(vm.regs[rs1], dec.imm, 2);
                    vm.mem.write_u16(hi, vm.regs[(rs2 + 1) & 0xF] as u16);
                }
                _ => return Err(unknown(vm, dec)),
            }
        }

        // Branches (BEQ, BNE, BLT, BGT, BLE, BGE), signed 8-bit compares
        0x05 => {
            let a = vm.regs[rs1] as i8;
            let b = vm.regs[rs2] as i8;
            let taken = match dec.funct3 {
                0x0 => a == b,
                0x1 => a != b,
                0x2 => a < b,
                0x3 => a > b,
                0x4 => a <= b,
                0x5 => a >= b,
                _ => return Err(unknown(vm, dec)),
            };
            if taken {
                vm.pc = vm.pc.wrapping_add(sign_ext(dec.imm, 16) as u16);
            }
        }

        // Jumps (JAL, JALR); rd receives the high byte of the return address
        0x06 => match dec.funct3 {
            0x1 => {
                vm.regs[rd] = (vm.pc >> 8) as u8;
                vm.pc = vm.pc.wrapping_add(sign_ext(dec.imm, 20) as u16);
            }
            0x2 => {
                vm.regs[rd] = (vm.pc >> 8) as u8;
                vm.pc =
                    (vm.regs[rs1] as u16).wrapping_add(sign_ext(dec.imm, 16) as u16) & !1;
            }
            _ => return Err(unknown(vm, dec)),
        },

        // Loads (LW, LH, LB); inverse of the stores, so the register pair
        // reads back the low byte of each halfword
        0x07 => {
            let addr = data_addr(vm.regs[rs1], dec.imm, 0);
            match dec.funct3 {
                0x0 => {
                    vm.regs[rd] = vm.mem.read_u16(addr) as u8;
                    let hi = data_addr(vm.regs[rs1], dec.imm, 2);
                    vm.regs[(rd + 1) & 0xF] = vm.mem.read_u16(hi) as u8;
                }
                0x1 => vm.regs[rd] = vm.mem.read_u16(addr) as u8,
                0x2 => vm.regs[rd] = vm.mem.read_u8(addr),
                _ => return Err(unknown(vm, dec)),
            }
        }

        // Bitwise R-type (AND, OR, XOR)
        0x08 => {
            let a = vm.regs[rs1];
            let b = vm.regs[rs2];
            vm.regs[rd] = match dec.funct4 {
                0x0 => a & b,
                0x1 => a | b,
                0x2 => a ^ b,
                _ => return Err(unknown(vm, dec)),
            };
        }

        // Bitwise immediates (ANDI, ORI, XORI)
        0x09 => {
            let a = vm.regs[rs1];
            let imm = (dec.imm & 0xFF) as u8;
            vm.regs[rd] = match dec.funct3 {
                0x0 => a & imm,
                0x1 => a | imm,
                0x2 => a ^ imm,
                _ => return Err(unknown(vm, dec)),
            };
        }

        // Shifts: register amount (SLL, SRL) or immediate (SLLI, SRLI),
        // amount masked to 5 bits, result truncated to 8
        0x0A => {
            let a = vm.regs[rs1] as u32;
            let amount = match dec.funct3 {
                0x0 => vm.regs[rs2] as u32 & 0x1F,
                0x1 => dec.imm & 0x1F,
                _ => return Err(unknown(vm, dec)),
            };
            vm.regs[rd] = match dec.funct4 {
                0x0 => (a << amount) as u8,
                0x1 => (a >> amount) as u8,
                _ => return Err(unknown(vm, dec)),
            };
        }

        // Display (CLS, CHAR)
        0x0B => match dec.funct3 {
            0x0 => vm.display.clear(),
            0x1 => vm.display.draw_glyph(vm.mem.font(), dec.rd, dec.rs1, dec.rs2),
            _ => return Err(unknown(vm, dec)),
        },

        // HALT is terminal before execution reaches this point
        0x0F => {}

        _ => return Err(unknown(vm, dec)),
    }

    Ok(())
}

#[inline]
fn data_addr(base: u8, imm: u32, off: u32) -> u16 {
    ((base as u32 + imm + off) & ADDR_MASK) as u16
}

fn unknown(vm: &Vm, dec: &DecodedInstruction) -> Fault {
    Fault::UnknownInstruction {
        pc: vm.last_pc,
        opcode: dec.opcode,
        funct3: dec.funct3,
    }
}
