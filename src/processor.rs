//! Ties the data path and control unit together into a bounded simulator
//! run: load a program, execute it instruction by instruction, and stop
//! cleanly on `HLT`, input exhaustion, or the instruction-count limit.

use super::constants::INSTRUCTION_LIMIT;
use super::control::{ControlUnit, Fault, TickResult};
use super::datapath::DataPath;
use super::memory::Storage;
use std::fmt;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Reached `HLT`.
    Halted,
    /// The instruction stream asked for input but the buffer was empty.
    InputExhausted,
    /// Executed [`INSTRUCTION_LIMIT`] instructions without halting.
    LimitExceeded,
    /// Execution faulted (division by zero, or a malformed instruction
    /// word).
    Fault(Fault),
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitCode::Halted => write!(f, "halted"),
            ExitCode::InputExhausted => write!(f, "input buffer is empty"),
            ExitCode::LimitExceeded => write!(f, "limit exceeded"),
            ExitCode::Fault(fault) => write!(f, "fault: {:?}", fault),
        }
    }
}

/// The result of a completed run: the collected output, how many
/// instructions were retired, how many ticks were spent, and why the run
/// stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output: String,
    pub instruction_count: u32,
    pub tick_count: u64,
    pub exit_code: ExitCode,
}

/// A complete simulator: data path, control unit, and the driver loop that
/// bounds how long a program is allowed to run.
pub struct Processor<S: Storage> {
    control_unit: ControlUnit<S>,
}

impl<S: Storage> Processor<S> {
    pub fn new(memory: S, input: &[u8]) -> Processor<S> {
        Processor {
            control_unit: ControlUnit::new(DataPath::new(memory, input)),
        }
    }

    /// Runs until `HLT`, the input buffer runs dry, a fault occurs, or
    /// [`INSTRUCTION_LIMIT`] instructions have been executed.
    pub fn run(&mut self) -> RunReport {
        self.run_with_limit(INSTRUCTION_LIMIT)
    }

    pub fn run_with_limit(&mut self, limit: u32) -> RunReport {
        let mut instruction_count = 0;

        let exit_code = loop {
            if instruction_count >= limit {
                warn!("Limit exceeded!");
                break ExitCode::LimitExceeded;
            }

            match self.control_unit.decode_and_execute_instruction() {
                Ok(TickResult::Halted) => break ExitCode::Halted,
                Ok(TickResult::Next) | Ok(TickResult::Jump(_)) => {
                    instruction_count += 1;
                    trace!(
                        "tick {:4} ip {:4} ar {:4} sp {:4} alu {:4} acc {:4}",
                        self.control_unit.tick_count(),
                        self.control_unit.data_path.ip,
                        self.control_unit.data_path.ar,
                        self.control_unit.data_path.sp,
                        self.control_unit.data_path.alu,
                        self.control_unit.data_path.acc,
                    );
                }
                Err(Fault::InputExhausted) => {
                    warn!("Input buffer is empty!");
                    break ExitCode::InputExhausted;
                }
                Err(fault) => break ExitCode::Fault(fault),
            }
        };

        RunReport {
            output: self.control_unit.data_path.output().to_owned(),
            instruction_count,
            tick_count: self.control_unit.tick_count(),
            exit_code,
        }
    }

    #[cfg(test)]
    pub(crate) fn acc(&self) -> super::Word {
        self.control_unit.data_path.acc
    }
}
