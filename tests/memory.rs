use risc8::assembler::assemble;
use risc8::{StopReason, Vm};

fn boot(src: &str) -> Vm {
    let rom = assemble(src).expect("assemble");
    let mut vm = Vm::default();
    vm.load_rom(&rom).expect("load");
    vm
}

fn run(vm: &mut Vm) {
    assert_eq!(vm.run().stop, StopReason::Halted, "program did not halt");
}

#[test]
fn byte_store_and_load() {
    let mut vm = boot(
        "ADDI r1, r1, 0x20\nADDI r2, r2, 0xAB\n\
         SB r1, r2, 0x2000\nLB r3, r1, 0x2000\nHALT\n",
    );
    run(&mut vm);
    assert_eq!(vm.mem.read_u8(0x2020), 0xAB);
    assert_eq!(vm.regs[3], 0xAB);
}

#[test]
fn halfword_store_zero_extends_the_register() {
    let mut vm = boot("ADDI r2, r2, 0x7F\nSH r1, r2, 0x2100\nLH r3, r1, 0x2100\nHALT\n");
    run(&mut vm);
    assert_eq!(vm.mem.read_u8(0x2100), 0x7F);
    assert_eq!(vm.mem.read_u8(0x2101), 0x00);
    assert_eq!(vm.regs[3], 0x7F);
}

#[test]
fn word_store_and_load_use_the_register_pair() {
    let mut vm = boot(
        "ADDI r2, r2, 0x11\nADDI r3, r3, 0x22\n\
         SW r1, r2, 0x2200\nLW r4, r1, 0x2200\nHALT\n",
    );
    run(&mut vm);
    // Each register of the pair supplies the low byte of one halfword.
    assert_eq!(vm.mem.read_u8(0x2200), 0x11);
    assert_eq!(vm.mem.read_u8(0x2202), 0x22);
    assert_eq!(vm.regs[4], 0x11);
    assert_eq!(vm.regs[5], 0x22);
}

#[test]
fn data_addresses_wrap_the_full_space() {
    // (0xFF + 0xFFFF) & 0xFFFF = 0x00FE
    let mut vm = boot(
        "ADDI r1, r1, 0xFF\nADDI r2, r2, 0x5A\n\
         SB r1, r2, 0xFFFF\nLB r3, r1, 0xFFFF\nHALT\n",
    );
    run(&mut vm);
    assert_eq!(vm.mem.read_u8(0x00FE), 0x5A);
    assert_eq!(vm.regs[3], 0x5A);
}

#[test]
fn sw_partner_register_wraps_to_r0() {
    let mut vm = boot("SW r1, r15, 0x2300\nHALT\n");
    vm.regs[15] = 5;
    vm.regs[0] = 9;
    run(&mut vm);
    assert_eq!(vm.mem.read_u8(0x2300), 5);
    assert_eq!(vm.mem.read_u8(0x2302), 9);
}

#[test]
fn lw_partner_register_wraps_to_r0() {
    let mut vm = boot("LW r15, r1, 0x2400\nHALT\n");
    vm.mem.write_u8(0x2400, 0x33);
    vm.mem.write_u8(0x2402, 0x44);
    run(&mut vm);
    assert_eq!(vm.regs[15], 0x33);
    assert_eq!(vm.regs[0], 0x44);
}
