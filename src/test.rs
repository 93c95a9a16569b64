use super::isa::{decode, encode, AddressingMode, Opcode};
use super::{ExitCode, Memory, Processor, RunReport};

fn run(program: &[u32], input: &[u8]) -> RunReport {
    let mut cells = program.to_vec();
    cells.resize(2048, encode(Opcode::Hlt, AddressingMode::Direct, 0));
    let memory = Memory::from(cells);
    let mut processor = Processor::new(memory, input);
    processor.run()
}

#[test]
fn encode_decode_round_trip() {
    let word = encode(Opcode::Cmp, AddressingMode::SpIndirect, 17);
    let decoded = decode(word).unwrap();
    assert_eq!(decoded.opcode, Opcode::Cmp);
    assert_eq!(decoded.mode, AddressingMode::SpIndirect);
    assert_eq!(decoded.operand, 17);
}

#[test]
fn program_halt() {
    let program = [encode(Opcode::Hlt, AddressingMode::Direct, 0)];
    let report = run(&program, &[]);
    assert_eq!(report.exit_code, ExitCode::Halted);
    assert_eq!(report.instruction_count, 1);
}

#[test]
fn program_print_operand_load() {
    let program = [
        encode(Opcode::Load, AddressingMode::OperandLoad, b'A' as u32),
        encode(Opcode::Print, AddressingMode::Direct, 0),
        encode(Opcode::Hlt, AddressingMode::Direct, 0),
    ];
    let report = run(&program, &[]);
    assert_eq!(report.exit_code, ExitCode::Halted);
    assert_eq!(report.output, "A");
}

#[test]
fn program_add_direct() {
    let program = [
        encode(Opcode::Save, AddressingMode::Direct, 10),
        encode(Opcode::Load, AddressingMode::OperandLoad, 42),
        encode(Opcode::Save, AddressingMode::Direct, 11),
        encode(Opcode::Load, AddressingMode::OperandLoad, 64),
        encode(Opcode::Add, AddressingMode::Direct, 11),
        encode(Opcode::Hlt, AddressingMode::Direct, 0),
    ];
    let mut cells = program.to_vec();
    cells.resize(2048, encode(Opcode::Hlt, AddressingMode::Direct, 0));
    let memory = Memory::from(cells);
    let mut processor = Processor::new(memory, &[]);
    let report = processor.run();
    assert_eq!(report.exit_code, ExitCode::Halted);
    assert_eq!(processor.acc(), 106);
}

#[test]
fn input_exhausted_stops_cleanly_and_keeps_partial_output() {
    let program = [
        encode(Opcode::Load, AddressingMode::OperandLoad, b'X' as u32),
        encode(Opcode::Print, AddressingMode::Direct, 0),
        encode(Opcode::Input, AddressingMode::Direct, 0),
        encode(Opcode::Hlt, AddressingMode::Direct, 0),
    ];
    let report = run(&program, &[]);
    assert_eq!(report.exit_code, ExitCode::InputExhausted);
    assert_eq!(report.output, "X");
}

#[test]
fn limit_exceeded_on_infinite_loop() {
    let program = [encode(Opcode::Jmp, AddressingMode::Direct, 0)];
    let report = run(&program, &[]);
    assert_eq!(report.exit_code, ExitCode::LimitExceeded);
    assert_eq!(report.instruction_count, 1000);
}
