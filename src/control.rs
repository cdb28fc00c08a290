//! Run-mode control.
//!
//! The machine itself only executes single steps. This module decides when
//! to step: a small state machine of stopped, automatic, single-step and
//! quit modes, driven by operator commands and by the signals a step
//! reports (stop, breakpoint).

use crate::cpu::{Machine, Run, Step, Word};
use log::debug;
use std::time::Duration;

/// Pace of the historical machine: 100 instructions per second.
pub const DEFAULT_PACE: Duration = Duration::from_millis(10);

/// Operating mode of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Halted; waiting for the operator.
    #[default]
    Stop,
    /// Executing continuously.
    Auto,
    /// Executing one instruction per operator request.
    Step,
    /// Leaving.
    Quit,
}

impl RunMode {
    pub fn label(self) -> &'static str {
        match self {
            RunMode::Stop => "STOP",
            RunMode::Auto => "AUTO",
            RunMode::Step => "STEP",
            RunMode::Quit => "QUIT",
        }
    }
}

/// Operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Auto,
    Stop,
    StepMode,
    /// Execute one instruction; only honored in step mode.
    Execute,
    Quit,
}

impl Command {
    /// Map a control-panel key to a command.
    pub fn from_key(key: char) -> Option<Self> {
        let cmd = match key.to_ascii_uppercase() {
            'A' => Command::Auto,
            'S' => Command::Stop,
            'T' => Command::StepMode,
            ' ' => Command::Execute,
            'Q' => Command::Quit,
            _ => return None,
        };
        Some(cmd)
    }
}

/// A machine together with its run mode.
#[derive(Debug, Clone)]
pub struct Control {
    pub machine: Machine,
    mode: RunMode,
    /// Everything printed since the control was created.
    pub printed: Vec<Word>,
}

impl Control {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            mode: RunMode::Stop,
            printed: Vec::new(),
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RunMode) {
        if mode != self.mode {
            debug!("run mode {} -> {}", self.mode.label(), mode.label());
            self.mode = mode;
        }
    }

    /// Apply an operator command. Returns the step executed, if any.
    pub fn command(&mut self, cmd: Command) -> Option<Step> {
        match cmd {
            Command::Auto => self.set_mode(RunMode::Auto),
            Command::Stop => self.set_mode(RunMode::Stop),
            Command::StepMode => self.set_mode(RunMode::Step),
            Command::Quit => self.set_mode(RunMode::Quit),
            Command::Execute if self.mode == RunMode::Step => return Some(self.step()),
            Command::Execute => {}
        }
        None
    }

    /// One iteration of the main loop: steps only in automatic mode.
    pub fn tick(&mut self) -> Option<Step> {
        (self.mode == RunMode::Auto).then(|| self.step())
    }

    /// Execute one instruction and apply its signals to the mode.
    pub fn step(&mut self) -> Step {
        let step = self.machine.step();
        self.printed.extend_from_slice(&step.printed);

        if step.is_stop() {
            self.set_mode(RunMode::Stop);
        } else if step.breakpoint && self.mode == RunMode::Auto {
            debug!("breakpoint at {:02X}", self.machine.regs.ip);
            self.set_mode(RunMode::Step);
        }
        step
    }

    /// Start the program from address 0 in automatic mode (console `G`).
    pub fn go(&mut self) {
        self.machine.regs.ip = 0;
        self.set_mode(RunMode::Auto);
    }

    /// Tick until the machine leaves automatic mode or `max_steps` pass.
    ///
    /// `pace` runs after every executed step; pass a sleep to reproduce the
    /// historical speed or a no-op to run flat out.
    pub fn run_paced<F: FnMut(&Step)>(&mut self, max_steps: u64, mut pace: F) -> Run {
        let mut run = Run::default();

        while run.steps < max_steps {
            let Some(step) = self.tick() else { break };
            run.steps += 1;
            run.printed.extend_from_slice(&step.printed);
            run.stopped = step.is_stop();
            pace(&step);
        }

        run
    }
}

/// A pacing hook that sleeps for `delay` after each step.
pub fn sleep_pace(delay: Duration) -> impl FnMut(&Step) {
    move |_| std::thread::sleep(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Model;

    fn demo() -> Control {
        let mut m = Machine::new(Model::Krokha);
        m.mem.load(0, &[0x1675, 0x1555, 0x7675, 0, 0, 0, 2, 1]);
        Control::new(m)
    }

    #[test]
    fn test_keys() {
        assert_eq!(Command::from_key('a'), Some(Command::Auto));
        assert_eq!(Command::from_key(' '), Some(Command::Execute));
        assert_eq!(Command::from_key('z'), None);
    }

    #[test]
    fn test_auto_runs_to_stop() {
        let mut c = demo();
        c.go();
        let run = c.run_paced(100, |_| {});
        assert_eq!(run.steps, 3);
        assert!(run.stopped);
        assert_eq!(c.mode(), RunMode::Stop);
        assert_eq!(c.printed, vec![2, 1, 6]);
    }

    #[test]
    fn test_stopped_machine_does_not_tick() {
        let mut c = demo();
        assert!(c.tick().is_none());
        assert_eq!(c.machine.cycles, 0);
    }

    #[test]
    fn test_execute_only_in_step_mode() {
        let mut c = demo();
        assert!(c.command(Command::Execute).is_none());
        c.command(Command::StepMode);
        let step = c.command(Command::Execute).unwrap();
        assert_eq!(step.address, 0);
        assert_eq!(c.mode(), RunMode::Step);
    }

    #[test]
    fn test_breakpoint_switches_to_step_mode() {
        let mut c = demo();
        c.machine.regs.br1 = 2;
        c.go();
        let run = c.run_paced(100, |_| {});
        assert_eq!(run.steps, 2);
        assert!(!run.stopped);
        assert_eq!(c.mode(), RunMode::Step);
        assert_eq!(c.machine.regs.ip, 2);
    }

    #[test]
    fn test_pace_called_per_step() {
        let mut c = demo();
        c.go();
        let mut calls = 0;
        c.run_paced(100, |_| calls += 1);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_quit() {
        let mut c = demo();
        c.command(Command::Quit);
        assert_eq!(c.mode(), RunMode::Quit);
        assert!(c.tick().is_none());
    }
}
