use crate::lexer::{text_to_terms, Term};
use crate::{translate, Error};
use accvm::isa::{decode, AddressingMode, Opcode};
use accvm::{Processor, Storage};

fn run(source: &str, input: &[u8]) -> accvm::RunReport {
    let memory = translate(source).expect("translation should succeed");
    let mut processor = Processor::new(memory, input);
    processor.run()
}

// --- lexer -----------------------------------------------------------

#[test]
fn lexes_flat_term() {
    let terms = text_to_terms("(print_int 5)").unwrap();
    assert_eq!(terms.len(), 1);
    let items = terms[0].as_list().unwrap();
    assert_eq!(items[0], Term::Atom("print_int".to_owned()));
    assert_eq!(items[1], Term::Atom("5".to_owned()));
}

#[test]
fn lexes_nested_terms_and_multiple_top_level_forms() {
    let terms = text_to_terms("(set i 3) (while i (print_int i) (set i (- i 1)))").unwrap();
    assert_eq!(terms.len(), 2);
    let while_items = terms[1].as_list().unwrap();
    assert_eq!(while_items[0], Term::Atom("while".to_owned()));
    assert!(matches!(while_items[2], Term::List(_)));
}

#[test]
fn lexes_string_literal_including_quotes() {
    let terms = text_to_terms("(print_string 'hello')").unwrap();
    let items = terms[0].as_list().unwrap();
    assert_eq!(items[1], Term::Atom("'hello'".to_owned()));
}

#[test]
fn lexes_operator_atoms() {
    let terms = text_to_terms("(!= c 0)").unwrap();
    let items = terms[0].as_list().unwrap();
    assert_eq!(items[0], Term::Atom("!=".to_owned()));
}

#[test]
fn rejects_invalid_symbol() {
    let err = text_to_terms("(print_int @)").unwrap_err();
    assert_eq!(err.char, '@');
    assert_eq!(err.line, 1);
}

// --- translator invariants (§8) --------------------------------------

#[test]
fn image_is_always_2048_words() {
    let memory = translate("(print_int 1)").unwrap();
    assert_eq!(memory.cells().len(), 2048);
}

#[test]
fn startup_cell_jumps_past_data_segment() {
    let memory = translate("(set x 1) (print_int x)").unwrap();
    let startup = decode(memory.cells()[0]).unwrap();
    assert_eq!(startup.opcode, Opcode::Jmp);
    assert_eq!(startup.mode, AddressingMode::Direct);

    // Every cell from the startup jump's target onward must decode
    // cleanly as code.
    let data_len = startup.operand;
    assert!(data_len >= 1);
    for addr in data_len..2048 {
        decode(memory.cells()[addr as usize]).unwrap();
    }
}

#[test]
fn control_flow_operands_land_inside_code_segment() {
    let memory = translate("(set i 3) (while i (print_int i) (set i (- i 1)))").unwrap();
    let startup = decode(memory.cells()[0]).unwrap();
    let data_len = startup.operand;

    for addr in data_len..(memory.cells().len() as u32) {
        if let Ok(decoded) = decode(memory.cells()[addr as usize]) {
            if decoded.opcode.is_control_flow() {
                assert!(
                    decoded.operand >= data_len && decoded.operand < memory.cells().len() as u32,
                    "control-flow target {} out of code segment",
                    decoded.operand
                );
            }
        }
    }
}

#[test]
fn no_io_program_has_empty_output_and_more_ticks_than_instructions() {
    let report = run("(set x (+ 1 2))", &[]);
    assert_eq!(report.output, "");
    assert!(report.tick_count >= report.instruction_count as u64);
}

// --- end-to-end scenarios (§8) ----------------------------------------

#[test]
fn hello_world() {
    let report = run("(print_string 'hello')", &[]);
    assert_eq!(report.output, "hello");
    assert_eq!(report.exit_code, accvm::ExitCode::Halted);
}

#[test]
fn echo_until_nul() {
    let source = "(set c (read_char)) (while (!= c 0) (print_char c) (set c (read_char)))";
    let mut input = b"hi\n".to_vec();
    input.push(0);
    let report = run(source, &input);
    assert_eq!(report.output, "hi\n");
    assert_eq!(report.exit_code, accvm::ExitCode::Halted);
}

#[test]
fn arithmetic_and_print_int() {
    let report = run("(print_int (+ 2 3))", &[]);
    assert_eq!(report.output, "5");
}

#[test]
fn if_else_true_branch() {
    let report = run("(if (= 1 1) (print_string 'y') (print_string 'n'))", &[]);
    assert_eq!(report.output, "y");
}

#[test]
fn if_else_false_branch() {
    let report = run("(if (= 1 2) (print_string 'y') (print_string 'n'))", &[]);
    assert_eq!(report.output, "n");
}

#[test]
fn if_with_no_else_and_false_condition_prints_nothing() {
    let report = run("(if (= 1 2) (print_string 'y'))", &[]);
    assert_eq!(report.output, "");
}

#[test]
fn while_countdown() {
    let report = run("(set i 3) (while i (print_int i) (set i (- i 1)))", &[]);
    assert_eq!(report.output, "321");
}

#[test]
fn function_call() {
    let source = "(fun dbl (x) (+ x x)) (print_int (dbl 5))";
    let report = run(source, &[]);
    assert_eq!(report.output, "10");
}

#[test]
fn function_with_local_shadowing_global() {
    let source = "(set x 99) (fun id (x) x) (print_int (id 1)) (print_int x)";
    let report = run(source, &[]);
    assert_eq!(report.output, "199");
}

#[test]
fn nested_function_definition_is_rejected() {
    let source = "(fun outer (x) (fun inner (y) y))";
    let err = translate(source).unwrap_err();
    assert!(matches!(err, Error::Term(_)));
}

#[test]
fn unknown_head_is_rejected() {
    let err = translate("(frobnicate 1 2)").unwrap_err();
    assert!(matches!(err, Error::Term(_)));
}

#[test]
fn undefined_variable_is_rejected() {
    let err = translate("(print_int nope)").unwrap_err();
    assert!(matches!(err, Error::Term(_)));
}

#[test]
fn slash_is_not_a_recognised_arithmetic_head() {
    let err = translate("(print_int (/ 4 2))").unwrap_err();
    assert!(matches!(err, Error::Term(_)));
}

#[test]
fn literal_at_2_24_is_spilled_to_data_memory() {
    let report = run("(print_int 16777216)", &[]);
    assert_eq!(report.output, "16777216");
}

#[test]
fn literal_above_2_32_is_rejected() {
    let err = translate("(print_int 4294967296)").unwrap_err();
    assert!(matches!(err, Error::Term(_)));
}

#[test]
fn alloc_and_set_char_and_print_string() {
    // set_char's character argument follows the general expression-lowering
    // rule (digit literal or variable), not the quoted-string special case.
    let source = "(alloc buf 3) (set_char buf 0 65) (set_char buf 1 66) (print_string buf)";
    let report = run(source, &[]);
    assert_eq!(report.output, "AB");
}

#[test]
fn logical_and_operator() {
    let report = run("(if (& (= 1 1) (= 2 2)) (print_string 'y') (print_string 'n'))", &[]);
    assert_eq!(report.output, "y");

    let report = run("(if (& (= 1 1) (= 2 3)) (print_string 'y') (print_string 'n'))", &[]);
    assert_eq!(report.output, "n");
}

#[test]
fn modulo_operator() {
    let report = run("(print_int (% 10 3))", &[]);
    assert_eq!(report.output, "1");
}

#[test]
fn input_exhausted_stops_but_keeps_output() {
    let source = "(print_char 88) (read_char)";
    let report = run(source, &[]);
    assert_eq!(report.output, "X");
    assert_eq!(report.exit_code, accvm::ExitCode::InputExhausted);
}
