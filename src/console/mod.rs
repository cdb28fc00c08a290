//! Line-oriented operator console.
//!
//! Each input line is one command: a letter followed by optional numbers.
//! Numbers starting with `0` are hexadecimal, everything else is decimal.
//!
//! ```text
//! Q                 leave
//! G                 run from address 0
//! T                 trace one instruction
//! D [from [to]]     dump memory
//! A [org]           assemble until an empty line
//! U                 disassemble
//! N [name]          set the image file name
//! L / W             load / write the image file
//! F v [from [to]]   fill memory
//! M from to target  move a block
//! X                 edit registers
//! R                 show registers
//! S [org]           store words until an empty line
//! H a b             hex sum and difference
//! !                 load the demo program
//! B [b1 [b2]]       set breakpoints (0 disables)
//! ```
//!
//! The console works on any `BufRead`/`Write` pair, so sessions can be
//! scripted from a byte slice in tests.

pub mod number;

pub use number::{parse_address, parse_number, parse_word};

use crate::asm::{self, AssembleError, Assembler, Feed, ImageError};
use crate::control::{sleep_pace, Control, RunMode};
use crate::cpu::{Machine, Word};
use log::info;
use std::io::{BufRead, Write};
use std::time::Duration;
use thiserror::Error;

/// Image file used until the operator picks another with `N`.
pub const DEFAULT_FILE_NAME: &str = "program.bin";

/// Default instruction budget for `G`.
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;

/// An interactive console session.
pub struct Console<R, W> {
    control: Control,
    input: R,
    output: W,
    file_name: String,
    max_cycles: u64,
    pace: Option<Duration>,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(machine: Machine, input: R, output: W) -> Self {
        Self {
            control: Control::new(machine),
            input,
            output,
            file_name: DEFAULT_FILE_NAME.to_string(),
            max_cycles: DEFAULT_MAX_CYCLES,
            pace: None,
        }
    }

    /// Limit the number of instructions a single `G` may execute.
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Sleep for `pace` after each instruction executed by `G`.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = image_name(name);
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn machine(&self) -> &Machine {
        &self.control.machine
    }

    /// Everything the program printed during this session.
    pub fn printed(&self) -> &[Word] {
        &self.control.printed
    }

    /// Give back the output sink, e.g. to inspect a scripted session.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Read and execute commands until `Q` or end of input.
    pub fn run(&mut self) -> Result<(), ConsoleError> {
        writeln!(
            self.output,
            "TINYAC console, {} model, {} words",
            self.control.machine.model().name(),
            self.control.machine.mem.len()
        )?;

        loop {
            write!(self.output, "- ")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else { break };

            match self.execute(&line) {
                Ok(true) => {}
                Ok(false) => break,
                Err(ConsoleError::Io(e)) => return Err(ConsoleError::Io(e)),
                Err(e) => writeln!(self.output, "error: {}", e)?,
            }
        }

        self.control.set_mode(RunMode::Quit);
        Ok(())
    }

    /// Execute one command line. Returns `false` when the session should end.
    pub fn execute(&mut self, line: &str) -> Result<bool, ConsoleError> {
        let line = line.trim();
        let Some(cmd) = line.chars().next() else {
            return Ok(true);
        };
        let args: Vec<&str> = line[cmd.len_utf8()..]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        let last = self.control.machine.mem.last_address();

        match cmd.to_ascii_uppercase() {
            'Q' => return Ok(false),
            'G' => self.go()?,
            'T' => self.trace()?,
            'D' => {
                let from = optional_address(&args, 0, 0)?;
                let to = optional_address(&args, 1, last)?;
                self.dump(from, to)?;
            }
            'A' => {
                let origin = args.first().map(|a| parse_number(a)).transpose()?.unwrap_or(0);
                self.assemble(origin)?;
            }
            'U' => {
                let listing = asm::disassemble(self.control.machine.model(), &self.control.machine.mem);
                write!(self.output, "{}", asm::disasm::render(&listing))?;
            }
            'N' => {
                if let Some(name) = args.first() {
                    self.file_name = image_name(name);
                }
                writeln!(self.output, "file {}", self.file_name)?;
            }
            'L' => self.load()?,
            'W' => {
                let words = asm::save_image(&self.file_name, &self.control.machine.mem)?;
                writeln!(self.output, "{} words written to {}", words, self.file_name)?;
            }
            'F' => {
                let value = parse_word(args.first().ok_or(ConsoleError::MissingArgument('F'))?)?;
                let from = optional_address(&args, 1, 0)?;
                let to = optional_address(&args, 2, last)?;
                let count = self.control.machine.mem.fill(from, to, value);
                writeln!(self.output, "{} cells filled", count)?;
            }
            'M' => {
                if args.len() < 3 {
                    return Err(ConsoleError::MissingArgument('M'));
                }
                let from = parse_address(args[0])?;
                let to = parse_address(args[1])?;
                let target = parse_address(args[2])?;
                let count = self.control.machine.mem.move_block(from, to, target);
                writeln!(self.output, "{} cells moved", count)?;
            }
            'X' => self.edit_registers()?,
            'R' => writeln!(self.output, "{}", self.control.machine.regs)?,
            'S' => {
                let origin = optional_address(&args, 0, 0)?;
                self.store(origin)?;
            }
            'H' => {
                if args.len() < 2 {
                    return Err(ConsoleError::MissingArgument('H'));
                }
                let a = parse_number(args[0])?;
                let b = parse_number(args[1])?;
                let (sum, diff) = (a.wrapping_add(b) as u16, a.wrapping_sub(b) as u16);
                writeln!(
                    self.output,
                    "{:04X} {:04X}  {} {}",
                    sum, diff, sum as Word, diff as Word
                )?;
            }
            '!' => {
                let machine = &mut self.control.machine;
                let demo = machine.model().demo_program();
                machine.reset();
                machine.mem.load(0, &demo);
                writeln!(self.output, "demo program loaded")?;
            }
            'B' => {
                let regs = &mut self.control.machine.regs;
                let mem = &self.control.machine.mem;
                if let Some(b1) = args.first() {
                    regs.br1 = mem.wrap(parse_address(b1)?);
                }
                if let Some(b2) = args.get(1) {
                    regs.br2 = mem.wrap(parse_address(b2)?);
                }
                writeln!(self.output, "BR1:{:02X} BR2:{:02X}", regs.br1, regs.br2)?;
            }
            other => writeln!(self.output, "{}?", other)?,
        }

        Ok(true)
    }

    fn go(&mut self) -> Result<(), ConsoleError> {
        self.control.go();
        let run = match self.pace {
            Some(delay) => self.control.run_paced(self.max_cycles, sleep_pace(delay)),
            None => self.control.run_paced(self.max_cycles, |_| {}),
        };
        info!("G executed {} instructions", run.steps);

        if !run.printed.is_empty() {
            writeln!(self.output, "{}", join_words(&run.printed))?;
        }
        match self.control.mode() {
            RunMode::Step => {
                writeln!(self.output, "break at {:02X}", self.control.machine.regs.ip)?;
            }
            RunMode::Auto => {
                self.control.set_mode(RunMode::Stop);
                writeln!(self.output, "stopped after {} instructions", run.steps)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn trace(&mut self) -> Result<(), ConsoleError> {
        let step = self.control.step();
        let text = asm::disasm::disassemble_word(self.control.machine.model(), step.word);
        writeln!(self.output, "{:02X}: {:04X}    {}", step.address, step.word as u16, text)?;
        if !step.printed.is_empty() {
            writeln!(self.output, "{}", join_words(&step.printed))?;
        }
        writeln!(self.output, "{}", self.control.machine.regs)?;
        Ok(())
    }

    fn dump(&mut self, from: usize, to: usize) -> Result<(), ConsoleError> {
        for (addr, word) in self.control.machine.mem.dump(from, to) {
            writeln!(self.output, "{:02X}: {:04X}  {:6}", addr, word as u16, word)?;
        }
        Ok(())
    }

    fn assemble(&mut self, origin: i32) -> Result<(), ConsoleError> {
        let mut assembler = Assembler::new(self.control.machine.model(), origin)?;

        loop {
            write!(self.output, "{:02X}> ", assembler.cursor())?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else { break };

            match assembler.feed(&mut self.control.machine.mem, &line) {
                Feed::Done => break,
                Feed::Skipped | Feed::Wrote { .. } => {}
                Feed::Illegal(err) => writeln!(self.output, "{}", err)?,
            }
        }
        Ok(())
    }

    fn store(&mut self, origin: usize) -> Result<(), ConsoleError> {
        let mem_len = self.control.machine.mem.len();
        let mut addr = origin % mem_len;

        loop {
            let word = self.control.machine.peek(addr);
            write!(self.output, "{:02X}: {:04X} > ", addr, word as u16)?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else { break };
            if line.trim().is_empty() {
                break;
            }

            match parse_word(&line) {
                Ok(value) => {
                    self.control.machine.poke(addr, value);
                    addr = (addr + 1) % mem_len;
                }
                Err(e) => writeln!(self.output, "error: {}", e)?,
            }
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), ConsoleError> {
        // A short file leaves its words in memory and still reports the error.
        let words = asm::load_image(&self.file_name, &mut self.control.machine.mem)?;
        writeln!(self.output, "{} words loaded from {}", words, self.file_name)?;
        Ok(())
    }

    fn edit_registers(&mut self) -> Result<(), ConsoleError> {
        let regs = self.control.machine.regs.clone();
        let fields: [(&str, i32); 6] = [
            ("IR", i32::from(regs.cr as u16)),
            ("IP", regs.ip as i32),
            ("OV", i32::from(regs.ov)),
            ("D0", i32::from(regs.d0)),
            ("BR1", regs.br1 as i32),
            ("BR2", regs.br2 as i32),
        ];

        for (name, current) in fields {
            write!(self.output, "{} {:X} > ", name, current)?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else { break };
            if line.trim().is_empty() {
                continue;
            }

            let machine = &mut self.control.machine;
            let size = machine.mem.len();
            match name {
                "IR" => machine.regs.cr = parse_word(&line)?,
                "IP" => machine.regs.ip = parse_address(&line)? % size,
                "OV" => machine.regs.ov = parse_number(&line)? != 0,
                "D0" => machine.regs.d0 = parse_number(&line)? != 0,
                "BR1" => machine.regs.br1 = parse_address(&line)? % size,
                _ => machine.regs.br2 = parse_address(&line)? % size,
            }
        }

        writeln!(self.output, "{}", self.control.machine.regs)?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, ConsoleError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn optional_address(args: &[&str], index: usize, default: usize) -> Result<usize, ConsoleError> {
    args.get(index).map_or(Ok(default), |a| parse_address(a))
}

fn image_name(name: &str) -> String {
    if name.ends_with(".bin") {
        name.to_string()
    } else {
        format!("{}.bin", name)
    }
}

fn join_words(words: &[Word]) -> String {
    words.iter().map(|w| w.to_string()).collect::<Vec<_>>().join(" ")
}

/// Errors that can occur while executing console commands.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad number: {0}")]
    BadNumber(String),

    #[error("{0}: missing argument")]
    MissingArgument(char),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}
