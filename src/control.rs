//! The control unit: decodes one instruction per call and drives the data
//! path through however many ticks that instruction costs.

use super::datapath::{DataPath, InputExhausted};
use super::isa::{decode, AddressingMode, DecodeError, Opcode};
use super::memory::Storage;
use super::Address;

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// Continue at the next sequential instruction.
    Next,
    /// Continue at the given address.
    Jump(Address),
    /// Halt execution cleanly (`HLT`).
    Halted,
}

/// Everything that can go wrong while decoding or executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Decode(DecodeError),
    DivisionByZero,
    InputExhausted,
}

impl From<DecodeError> for Fault {
    fn from(e: DecodeError) -> Fault {
        Fault::Decode(e)
    }
}

impl From<InputExhausted> for Fault {
    fn from(_: InputExhausted) -> Fault {
        Fault::InputExhausted
    }
}

/// A control unit bound to one data path. Owns only the tick counter; all
/// architectural state lives in the data path.
pub struct ControlUnit<S: Storage> {
    pub data_path: DataPath<S>,
    tick_count: u64,
}

impl<S: Storage> ControlUnit<S> {
    pub fn new(data_path: DataPath<S>) -> ControlUnit<S> {
        ControlUnit {
            data_path,
            tick_count: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    fn tick(&mut self) {
        self.tick_count += 1;
    }

    fn tick_n(&mut self, n: u32) {
        self.tick_count += n as u64;
    }

    /// Decodes and executes the instruction at `self.data_path.ip`.
    pub fn decode_and_execute_instruction(&mut self) -> Result<TickResult, Fault> {
        let word = self
            .data_path
            .memory
            .read(self.data_path.ip as u32)
            .unwrap_or(0);
        let instruction = decode(word)?;

        let result = match instruction.opcode {
            Opcode::Hlt => return Ok(TickResult::Halted),

            Opcode::Jmp => {
                self.data_path.latch_instr_ptr(instruction.operand as Address);
                self.tick();
                return Ok(TickResult::Jump(self.data_path.ip));
            }

            Opcode::Jz => {
                let target = if self.data_path.alu == 0 {
                    instruction.operand as Address
                } else {
                    self.data_path.ip + 1
                };
                self.data_path.latch_instr_ptr(target);
                self.tick();
                return Ok(TickResult::Jump(self.data_path.ip));
            }

            Opcode::Call => {
                let return_addr = self.data_path.ip + 1;
                self.data_path.latch_instr_ptr(return_addr);
                self.data_path.sp -= 1;
                self.tick();

                let sp = self.data_path.sp as u32;
                let ip = self.data_path.ip;
                let _ = self.data_path.memory.write(sp, ip as u32);
                self.data_path
                    .latch_instr_ptr(instruction.operand as Address);
                self.tick();
                return Ok(TickResult::Jump(self.data_path.ip));
            }

            Opcode::Return => {
                let sp = self.data_path.sp as u32;
                self.data_path.alu = self.data_path.memory.read(sp).unwrap_or(0);
                self.tick();

                self.data_path.latch_instr_ptr(self.data_path.alu as Address);
                self.data_path.sp += 1;
                self.tick();
                return Ok(TickResult::Jump(self.data_path.ip));
            }

            Opcode::Add | Opcode::Sub | Opcode::Div | Opcode::Mod | Opcode::Cmp => {
                let ticks = self
                    .data_path
                    .select_address(instruction.mode, instruction.operand);
                self.tick_n(ticks);

                let right = match instruction.mode {
                    AddressingMode::OperandLoad => instruction.operand,
                    _ => self.data_path.memory.read(self.data_path.ar as u32).unwrap_or(0),
                };
                let left = self.data_path.acc as i64;
                let right = right as i64;

                self.data_path.alu = match instruction.opcode {
                    Opcode::Add => (left + right) as u32,
                    Opcode::Sub | Opcode::Cmp => (left - right) as u32,
                    Opcode::Div => {
                        if right == 0 {
                            return Err(Fault::DivisionByZero);
                        }
                        left.div_euclid(right) as u32
                    }
                    Opcode::Mod => {
                        if right == 0 {
                            return Err(Fault::DivisionByZero);
                        }
                        left.rem_euclid(right) as u32
                    }
                    _ => unreachable!(),
                };
                self.tick();

                if instruction.opcode != Opcode::Cmp {
                    self.data_path.latch_acc(self.data_path.alu);
                }
                TickResult::Next
            }

            Opcode::Load => {
                let ticks = self
                    .data_path
                    .select_address(instruction.mode, instruction.operand);
                self.tick_n(ticks);

                self.data_path.alu = match instruction.mode {
                    AddressingMode::OperandLoad => instruction.operand,
                    _ => self.data_path.memory.read(self.data_path.ar as u32).unwrap_or(0),
                };
                self.tick();
                self.data_path.latch_acc(self.data_path.alu);
                TickResult::Next
            }

            Opcode::Save => {
                let ticks = self
                    .data_path
                    .select_address(instruction.mode, instruction.operand);
                self.tick_n(ticks);
                // The write itself doesn't burn a tick; only the final IP
                // increment below does.
                self.data_path.signal_wr();
                TickResult::Next
            }

            Opcode::Print => {
                self.data_path.signal_output();
                TickResult::Next
            }

            Opcode::Input => {
                self.data_path.signal_input()?;
                TickResult::Next
            }

            Opcode::Push => {
                self.data_path.sp -= 1;
                self.data_path.ar = self.data_path.sp;
                self.data_path.signal_wr();
                self.tick();
                TickResult::Next
            }

            Opcode::Pop => {
                self.data_path.sp += 1;
                TickResult::Next
            }
        };

        self.data_path.latch_instr_ptr(self.data_path.ip + 1);
        self.tick();

        Ok(result)
    }
}
