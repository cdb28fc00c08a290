//! CPU execution engine for TINYAC.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! Arithmetic faults are simulated hardware flags (OV, D0), never Rust
//! errors: the faulting instruction skips its write and execution goes on.

use crate::cpu::{Memory, Registers, Word};
use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::model::{Model, Opcode};
use log::{debug, trace};
use serde::{Serialize, Deserialize};

/// Whether the caller should keep stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Continue,
    Stop,
}

/// The outcome of one fetch-decode-execute cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Address the instruction was fetched from.
    pub address: usize,
    /// The fetched word.
    pub word: Word,
    /// The decoded instruction, or the decode error for an unknown opcode.
    pub instruction: Result<Instruction, DecodeError>,
    /// Values printed by PRST or PRNT, in print order.
    pub printed: Vec<Word>,
    pub signal: Signal,
    /// IP landed on BR1 or BR2 after the fetch.
    pub breakpoint: bool,
}

impl Step {
    pub fn is_stop(&self) -> bool {
        self.signal == Signal::Stop
    }

    /// The executed operation, if the word decoded.
    pub fn opcode(&self) -> Option<Opcode> {
        self.instruction.as_ref().ok().map(|i| i.opcode)
    }
}

/// A single step together with the register state it left behind.
#[derive(Debug, Clone)]
pub struct Trace {
    pub step: Step,
    pub registers: Registers,
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.registers)
    }
}

/// Summary of a run of several steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    /// Instructions executed.
    pub steps: u64,
    /// Everything printed, in order.
    pub printed: Vec<Word>,
    /// True if the run ended on a stop signal rather than a limit.
    pub stopped: bool,
}

/// The TINYAC machine: memory, registers and the model they follow.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    model: Model,
    /// Processor registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Instruction count since the last reset.
    pub cycles: u64,
}

impl Machine {
    /// Create a machine with zeroed memory and registers.
    pub fn new(model: Model) -> Self {
        Self {
            model,
            regs: Registers::new(),
            mem: Memory::new(model),
            cycles: 0,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Zero all memory and registers, clearing the sticky flags.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.cycles = 0;
    }

    /// Read a cell; the address wraps.
    pub fn peek(&self, addr: usize) -> Word {
        self.mem.read(addr)
    }

    /// Write a cell; the address wraps.
    pub fn poke(&mut self, addr: usize, value: Word) {
        self.mem.write(addr, value);
    }

    /// Load CR from the cell at IP and advance IP.
    ///
    /// Returns the address fetched from.
    pub fn fetch(&mut self) -> usize {
        self.regs.cr = self.mem.read(self.regs.ip);
        self.regs.advance_ip(self.mem.len())
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Step {
        let address = self.fetch();
        let word = self.regs.cr;
        let breakpoint = self.regs.at_breakpoint();
        let instruction = decode::decode(self.model, word);

        let mut printed = Vec::new();
        let signal = match instruction {
            Ok(instr) => self.execute(instr, &mut printed),
            Err(DecodeError::InvalidOpcode(code)) => {
                debug!("unrecognized opcode {:X} at {:02X}, stopping", code, address);
                Signal::Stop
            }
            Err(DecodeError::Unsupported(..)) => Signal::Stop,
        };

        self.cycles += 1;
        trace!("{:02X}: {:04X}  {}", address, word as u16, self.regs);

        Step {
            address,
            word,
            instruction,
            printed,
            signal,
            breakpoint,
        }
    }

    /// Step once and report the registers afterwards.
    pub fn trace(&mut self) -> Trace {
        let step = self.step();
        Trace {
            step,
            registers: self.regs.clone(),
        }
    }

    /// Run until a stop signal.
    ///
    /// Never returns if the program loops forever; interactive callers
    /// should use [`Machine::run_limited`].
    pub fn run(&mut self) -> Run {
        self.run_with(|_, _| true)
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited(&mut self, max_steps: u64) -> Run {
        self.run_with(|_, run| run.steps < max_steps)
    }

    /// Run while `proceed` allows it, checked before every instruction.
    ///
    /// The callback sees the machine and the run so far, which makes it the
    /// place for pacing delays and cycle limits.
    pub fn run_with<F>(&mut self, mut proceed: F) -> Run
    where
        F: FnMut(&Machine, &Run) -> bool,
    {
        let mut run = Run::default();

        while proceed(self, &run) {
            let step = self.step();
            run.steps += 1;
            run.printed.extend_from_slice(&step.printed);
            if step.is_stop() {
                run.stopped = true;
                break;
            }
        }

        run
    }

    fn execute(&mut self, instr: Instruction, printed: &mut Vec<Word>) -> Signal {
        let Instruction { opcode, a1, a2, a3 } = instr;
        let (a1, a2, a3) = (a1 as usize, a2 as usize, a3 as usize);

        match opcode {
            Opcode::Copy => {
                self.regs.op1 = self.mem.read(a1);
                self.regs.sm = self.regs.op1;
                self.mem.write(a3, self.regs.sm);
            }

            Opcode::Add => self.arithmetic(a1, a2, a3, Word::checked_add),
            Opcode::Sub => self.arithmetic(a1, a2, a3, Word::checked_sub),
            Opcode::Mpy => self.arithmetic(a1, a2, a3, Word::checked_mul),

            Opcode::Div => {
                self.load_operands(a1, a2);
                if self.regs.op2 == 0 {
                    debug!("division by zero, {:02X} left unchanged", a3);
                    self.regs.d0 = true;
                } else {
                    self.commit(a3, self.regs.op1.checked_div(self.regs.op2));
                }
            }

            Opcode::TrEq => self.branch_if(a1, a2, a3, |x, y| x == y),
            Opcode::TrGt => self.branch_if(a1, a2, a3, |x, y| x > y),
            Opcode::TrLt => self.branch_if(a1, a2, a3, |x, y| x < y),

            Opcode::TrOv => {
                if self.regs.ov {
                    self.regs.ip = a3;
                }
            }

            Opcode::Prst => {
                printed.extend([self.mem.read(a1), self.mem.read(a2), self.mem.read(a3)]);
                return Signal::Stop;
            }

            Opcode::Stop => return Signal::Stop,

            Opcode::Prnt => printed.push(self.mem.read(a3)),

            // Tape devices are not attached.
            Opcode::Read | Opcode::Write | Opcode::Rewind => {}

            Opcode::Noop => {}
        }

        Signal::Continue
    }

    fn load_operands(&mut self, a1: usize, a2: usize) {
        self.regs.op1 = self.mem.read(a1);
        self.regs.op2 = self.mem.read(a2);
    }

    fn arithmetic(&mut self, a1: usize, a2: usize, a3: usize, op: fn(Word, Word) -> Option<Word>) {
        self.load_operands(a1, a2);
        self.commit(a3, op(self.regs.op1, self.regs.op2));
    }

    /// Store a checked result, or raise OV and leave the cell alone.
    fn commit(&mut self, dest: usize, result: Option<Word>) {
        match result {
            Some(value) => {
                self.regs.set_result(value);
                self.mem.write(dest, value);
            }
            None => {
                debug!(
                    "overflow on {} and {}, {:02X} left unchanged",
                    self.regs.op1, self.regs.op2, dest
                );
                self.regs.ov = true;
            }
        }
    }

    fn branch_if(&mut self, a1: usize, a2: usize, target: usize, cond: fn(Word, Word) -> bool) {
        self.load_operands(a1, a2);
        let (x, y) = (self.regs.op1, self.regs.op2);
        // SM holds the difference modulo 2^16; W reflects the true ordering.
        self.regs.sm = x.wrapping_sub(y);
        self.regs.w = x < y;
        if cond(x, y) {
            self.regs.ip = target;
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(Model::default())
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("model", &self.model)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}
