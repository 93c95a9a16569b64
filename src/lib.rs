extern crate num;
#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate log;

pub mod constants;
pub mod isa;
pub mod memory;

mod control;
mod datapath;
mod processor;

#[cfg(test)]
mod test;

pub use isa::{decode, disassemble, encode, AddressingMode, DecodedInstruction, Opcode};
pub use memory::{Memory, Storage};
pub use processor::{ExitCode, Processor, RunReport};

/// A single memory cell / instruction word.
pub type Word = u32;

/// A memory address, i.e. an index into the flat [`Memory`](memory/struct.Memory.html) array.
pub type Address = u32;
