//! Debugger application state and logic.

use crate::asm::disasm::{disassemble, Listing};
use crate::control::{Command, Control, RunMode, DEFAULT_PACE};
use crate::cpu::{Machine, Word};

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine and its run mode.
    pub control: Control,
    /// Memory contents at load time, restored by reset.
    pub program: Vec<Word>,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Selected memory address.
    pub selected_addr: usize,
}

impl DebuggerApp {
    /// Create a debugger for a machine whose memory already holds the program.
    pub fn new(machine: Machine) -> Self {
        let program = machine.mem.cells().to_vec();

        Self {
            control: Control::new(machine),
            program,
            should_quit: false,
            status: "Ready. 'a' auto, 't' step mode, space to step, 'q' to quit.".into(),
            selected_addr: 0,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.control.machine
    }

    pub fn mode(&self) -> RunMode {
        self.control.mode()
    }

    /// Handle a character key.
    pub fn press(&mut self, key: char) {
        match key {
            'b' => self.toggle_breakpoint(),
            'x' => self.reset(),
            _ => {
                let Some(cmd) = Command::from_key(key) else { return };
                if cmd == Command::Execute && self.mode() != RunMode::Step {
                    self.status = "Not in step mode. Press 't' first.".into();
                    return;
                }
                match self.control.command(cmd) {
                    Some(step) => self.report(&step),
                    None => self.status = format!("Mode {}", self.mode().label()),
                }
                if cmd == Command::Quit {
                    self.should_quit = true;
                }
            }
        }
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if let Some(step) = self.control.tick() {
            self.report(&step);
        }
    }

    /// How long the event loop may wait for a key.
    pub fn poll_timeout(&self) -> std::time::Duration {
        if self.mode() == RunMode::Auto {
            DEFAULT_PACE
        } else {
            std::time::Duration::from_millis(50)
        }
    }

    /// Toggle BR1 at the selected address.
    pub fn toggle_breakpoint(&mut self) {
        let regs = &mut self.control.machine.regs;
        if self.selected_addr == 0 {
            self.status = "Address 0 cannot hold a breakpoint".into();
        } else if regs.br1 == self.selected_addr {
            regs.br1 = 0;
            self.status = format!("Removed breakpoint at {:02X}", self.selected_addr);
        } else {
            regs.br1 = self.selected_addr;
            self.status = format!("Set breakpoint at {:02X}", self.selected_addr);
        }
    }

    /// Reload the program and clear all registers.
    pub fn reset(&mut self) {
        let machine = &mut self.control.machine;
        machine.reset();
        machine.mem.load(0, &self.program);
        self.control.printed.clear();
        self.control.set_mode(RunMode::Stop);
        self.status = "Reset. Ready.".into();
    }

    pub fn select_up(&mut self) {
        self.selected_addr = self.selected_addr.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        self.selected_addr = (self.selected_addr + 1).min(self.machine().mem.last_address());
    }

    /// The classified listing of the whole memory.
    pub fn listing(&self) -> Vec<Listing> {
        let machine = self.machine();
        disassemble(machine.model(), &machine.mem)
    }

    fn report(&mut self, step: &crate::cpu::Step) {
        let mut status = format!("{:02X}: {:04X}", step.address, step.word as u16);
        if let Some(op) = step.opcode() {
            status.push_str(&format!("  {}", op));
        }
        if !step.printed.is_empty() {
            let values: Vec<String> = step.printed.iter().map(|v| v.to_string()).collect();
            status.push_str(&format!("  printed {}", values.join(" ")));
        }
        if step.is_stop() {
            status.push_str(&format!("  stopped after {} cycles", self.machine().cycles));
        } else if self.mode() == RunMode::Step && step.breakpoint {
            status.push_str(&format!("  breakpoint at {:02X}", self.machine().regs.ip));
        }
        self.status = status;
    }
}

/// Run the debugger on a loaded machine.
pub fn run_debugger(machine: Machine) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(machine);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(app.poll_timeout())? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char(c) => app.press(c),
                        KeyCode::Up => app.select_up(),
                        KeyCode::Down => app.select_down(),
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
