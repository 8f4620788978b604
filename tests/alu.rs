use risc8::assembler::assemble;
use risc8::{RunSummary, StopReason, Vm};

fn run_src(src: &str) -> (Vm, RunSummary) {
    let rom = assemble(src).expect("assemble");
    let mut vm = Vm::default();
    vm.load_rom(&rom).expect("load");
    let summary = vm.run();
    assert_eq!(summary.stop, StopReason::Halted, "program did not halt");
    (vm, summary)
}

#[test]
fn add_wraps_at_eight_bits() {
    let (vm, _) = run_src("ADDI r1, r1, 255\nADDI r2, r2, 2\nADD r0, r1, r2\nHALT\n");
    assert_eq!(vm.regs[0], 1);
}

#[test]
fn sub_borrows_through_zero() {
    let (vm, _) = run_src("SUBI r1, r1, 1\nHALT\n");
    assert_eq!(vm.regs[1], 255);
}

#[test]
fn mul_truncates_to_eight_bits() {
    let (vm, _) = run_src("ADDI r1, r1, 16\nADDI r2, r2, 17\nMUL r3, r1, r2\nHALT\n");
    assert_eq!(vm.regs[3], (16u32 * 17 & 0xFF) as u8);
}

#[test]
fn div_quotient() {
    let (vm, summary) = run_src("ADDI r1, r1, 6\nADDI r2, r2, 2\nDIV r3, r1, r2\nHALT\n");
    assert_eq!(vm.regs[3], 3);
    assert_eq!(summary.recovered, 0);
}

#[test]
fn div_by_zero_skips_and_continues() {
    // r2 stays zero; the DIV is skipped and the following ADDI still runs.
    let (vm, summary) =
        run_src("ADDI r0, r0, 9\nDIV r0, r1, r2\nADDI r4, r4, 1\nHALT\n");
    assert_eq!(vm.regs[0], 9);
    assert_eq!(vm.regs[4], 1);
    assert_eq!(summary.recovered, 1);
}

#[test]
fn divi_by_zero_skips_and_continues() {
    let (vm, summary) = run_src("ADDI r1, r1, 5\nDIVI r2, r1, 0\nHALT\n");
    assert_eq!(vm.regs[2], 0);
    assert_eq!(summary.recovered, 1);
}

#[test]
fn bitwise_register_forms() {
    let (vm, _) = run_src(
        "ADDI r1, r1, 0xF0\nADDI r2, r2, 0x3C\n\
         AND r3, r1, r2\nOR r4, r1, r2\nXOR r5, r1, r2\nHALT\n",
    );
    assert_eq!(vm.regs[3], 0x30);
    assert_eq!(vm.regs[4], 0xFC);
    assert_eq!(vm.regs[5], 0xCC);
}

#[test]
fn bitwise_immediate_forms() {
    let (vm, _) = run_src(
        "ADDI r1, r1, 0xF0\n\
         ANDI r3, r1, 0x3C\nORI r4, r1, 0x3C\nXORI r5, r1, 0x3C\nHALT\n",
    );
    assert_eq!(vm.regs[3], 0x30);
    assert_eq!(vm.regs[4], 0xFC);
    assert_eq!(vm.regs[5], 0xCC);
}

#[test]
fn register_shifts_mask_amount_and_truncate() {
    let (vm, _) = run_src(
        "ADDI r1, r1, 129\nADDI r2, r2, 1\nADDI r5, r5, 9\n\
         SLL r3, r1, r2\nSRL r4, r1, r2\nSLL r6, r1, r5\nHALT\n",
    );
    assert_eq!(vm.regs[3], 2); // (129 << 1) & 0xFF
    assert_eq!(vm.regs[4], 64);
    assert_eq!(vm.regs[6], 0); // shifted past eight bits
}

#[test]
fn immediate_shifts() {
    let (vm, _) = run_src("ADDI r1, r1, 129\nSLLI r2, r1, 1\nSRLI r3, r1, 7\nHALT\n");
    assert_eq!(vm.regs[2], 2);
    assert_eq!(vm.regs[3], 1);
}

#[test]
fn lui_loads_the_upper_byte() {
    let (vm, _) = run_src("LUI r1, 0xAB12\nHALT\n");
    assert_eq!(vm.regs[1], 0xAB);
}

#[test]
fn auipc_adds_the_shifted_immediate_to_next_pc() {
    // next_pc = 0x1004; ((0x1004 + (2 << 8)) >> 8) & 0xFF = 0x12
    let (vm, _) = run_src("AUIPC r1, 2\nHALT\n");
    assert_eq!(vm.regs[1], 0x12);
}
