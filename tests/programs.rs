//! End-to-end programs: assemble, run, disassemble, console sessions.

use tinyac::asm::{assemble, Cell};
use tinyac::cpu::decode::decode;
use tinyac::{assemble_source, disassemble, Console, Machine, Model, Opcode};

const SUM_DOUBLE: &str = "
; [5] := 2 * ([6] + [7])
ADD  6 7 5
ADD  5 5 5
PRST 6 7 5
DEFD 0
DEFD 0
DEFD 0
DEFD 2
DEFD 1
";

#[test]
fn test_demo_program_prints_and_stops() {
    let mut m = Machine::new(Model::Krokha);
    let assembly = assemble_source(&mut m, SUM_DOUBLE).unwrap();
    assert!(assembly.is_clean());
    assert_eq!(assembly.written, 8);
    assert_eq!(m.mem.cells(), Model::Krokha.demo_program().as_slice());

    let run = m.run_limited(100);
    assert!(run.stopped);
    assert_eq!(run.steps, 3);
    assert_eq!(run.printed, vec![2, 1, 6]);
    assert_eq!(m.regs.sm, 6);
    assert!(!m.regs.ov);
}

#[test]
fn test_assembled_code_disassembles_to_same_instructions() {
    let lines = ["ADD 9 10 8", "SUB 8 9 11", "TRLT 11 8 5", "MPY 8 8 8", "PRNT 0 0 8", "STOP 0 0 0"];
    let mut m = Machine::new(Model::Tiniac);
    let assembly = assemble(&mut m, 0, lines).unwrap();
    assert!(assembly.is_clean());

    let listing = disassemble(Model::Tiniac, &m.mem);
    for (addr, line) in lines.iter().enumerate() {
        let Cell::Code(instr) = listing[addr].cell else {
            panic!("cell {} classified as data", addr);
        };
        let mut fresh = Machine::new(Model::Tiniac);
        assemble(&mut fresh, 0, [line]).unwrap();
        assert_eq!(Ok(instr), decode(Model::Tiniac, fresh.peek(0)));
    }
    // Everything past STOP is data.
    assert!(listing[6..].iter().all(|l| !l.is_code()));
}

#[test]
fn test_data_literals_survive_disassembly() {
    let mut m = Machine::new(Model::Krokha);
    assemble_source(&mut m, SUM_DOUBLE).unwrap();
    let listing = disassemble(Model::Krokha, &m.mem);

    let sources: Vec<String> = listing.iter().map(|l| l.source()).collect();
    let mut back = Machine::new(Model::Krokha);
    let assembly = assemble(&mut back, 0, &sources).unwrap();
    assert!(assembly.is_clean());
    assert_eq!(back.mem, m.mem);
}

#[test]
fn test_overflow_is_sticky_across_program() {
    let source = "
        MPY  6 6 5   ; 30000 * 30000 overflows, [5] untouched
        ADD  7 7 4   ; 1 + 1 still computes
        PRST 5 4 7
        DEFD 0
        DEFD 0
        DEFD 9
        DEFD 30000
        DEFD 1
    ";
    let mut m = Machine::new(Model::Krokha);
    assemble_source(&mut m, source).unwrap();
    let run = m.run_limited(10);
    assert!(run.stopped);
    assert!(m.regs.ov);
    assert_eq!(run.printed, vec![9, 2, 1]);
}

#[test]
fn test_tiniac_division_by_zero() {
    let source = "
        DIV  5 6 7
        STOP 0 0 0
        DEFD 0
        DEFD 0
        DEFD 0
        DEFD 12
        DEFD 0
        DEFD -5
    ";
    let mut m = Machine::new(Model::Tiniac);
    assemble_source(&mut m, source).unwrap();
    m.run_limited(10);
    assert!(m.regs.d0);
    assert_eq!(m.peek(7), -5);
    assert_eq!(m.model().halt(), Opcode::Stop);
}

#[test]
fn test_console_session() {
    let script = "A\nADD 6 7 5\nADD 5 5 5\nPRST 6 7 5\n\nS 6\n2\n1\n\nG\nU\nQ\n";
    let mut console = Console::new(Machine::new(Model::Krokha), script.as_bytes(), Vec::new());
    console.run().unwrap();
    assert_eq!(console.printed(), &[2, 1, 6]);

    let out = String::from_utf8(console.into_output()).unwrap();
    assert!(out.contains("2 1 6"));
    assert!(out.contains("02: 7675    PRST 06 07 05"));
    assert!(out.contains("05: 0006    DEFH 0006"));
}
