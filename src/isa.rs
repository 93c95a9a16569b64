//! Instruction encoding: opcodes, addressing modes, and the bit layout that
//! packs them together with an operand into a single 32-bit word.
//!
//! ```text
//! 31        28 27        24 23                             0
//! +-----------+-----------+-------------------------------+
//! |   opcode  |    mode   |            operand             |
//! +-----------+-----------+-------------------------------+
//! ```

use super::constants::{MODE_MASK, MODE_OFFSET, OPCODE_MASK, OPCODE_OFFSET, OPERAND_MASK};
use super::Word;
use std::fmt;

use num::FromPrimitive;

/// The operation a single instruction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    Add = 0x0,
    Sub = 0x1,
    Div = 0x2,
    Mod = 0x3,
    Load = 0x4,
    Save = 0x5,
    Input = 0x6,
    Print = 0x7,
    Call = 0x8,
    Return = 0x9,
    Push = 0xA,
    Pop = 0xB,
    Cmp = 0xC,
    Jmp = 0xD,
    Jz = 0xE,
    Hlt = 0xF,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Load => "LOAD",
            Opcode::Save => "SAVE",
            Opcode::Input => "INPUT",
            Opcode::Print => "PRINT",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Hlt => "HLT",
        }
    }

    /// Opcodes whose operand is a control-flow target and must be relocated
    /// once the data segment length is known.
    pub fn is_control_flow(self) -> bool {
        matches!(self, Opcode::Call | Opcode::Jmp | Opcode::Jz)
    }

    /// Opcodes that take no operand at the source level (the lower bytes of
    /// their encoded word are always zero).
    pub fn has_operand(self) -> bool {
        !matches!(
            self,
            Opcode::Input | Opcode::Print | Opcode::Return | Opcode::Push | Opcode::Pop | Opcode::Hlt
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// How the operand of an instruction is turned into an effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum AddressingMode {
    Direct = 0x0,
    Indirect = 0x1,
    OperandLoad = 0x2,
    SpIndirect = 0x3,
}

impl AddressingMode {
    /// The prefix character(s) the disassembly listing places in front of
    /// the operand for this mode.
    pub fn prefix(self) -> &'static str {
        match self {
            AddressingMode::Direct => "",
            AddressingMode::Indirect => "$",
            AddressingMode::OperandLoad => "#",
            AddressingMode::SpIndirect => "&",
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// An instruction word split back out into its three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub mode: AddressingMode,
    pub operand: u32,
}

/// Error produced when a raw word does not correspond to a known opcode or
/// addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    InvalidOpcode(u32),
    InvalidMode(u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::InvalidOpcode(v) => write!(f, "invalid opcode field: {:#X}", v),
            DecodeError::InvalidMode(v) => write!(f, "invalid addressing mode field: {:#X}", v),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Packs an opcode, addressing mode and operand into a single instruction
/// word.
///
/// # Examples
/// ```
/// use accvm::isa::{encode, Opcode, AddressingMode};
///
/// let word = encode(Opcode::Load, AddressingMode::Direct, 5);
/// assert_eq!(word, 0x4000_0005);
/// ```
pub fn encode(opcode: Opcode, mode: AddressingMode, operand: u32) -> Word {
    debug_assert!(operand & !OPERAND_MASK == 0, "operand does not fit in 24 bits");
    let opcode_bits = (opcode as u32) << OPCODE_OFFSET;
    let mode_bits = (mode as u32) << MODE_OFFSET;
    opcode_bits | mode_bits | (operand & OPERAND_MASK)
}

/// Splits an instruction word back into its opcode, addressing mode and
/// operand.
///
/// # Examples
/// ```
/// use accvm::isa::{decode, Opcode, AddressingMode};
///
/// let decoded = decode(0x4000_0005).unwrap();
/// assert_eq!(decoded.opcode, Opcode::Load);
/// assert_eq!(decoded.mode, AddressingMode::Direct);
/// assert_eq!(decoded.operand, 5);
/// ```
pub fn decode(word: Word) -> Result<DecodedInstruction, DecodeError> {
    let opcode_field = (word & OPCODE_MASK) >> OPCODE_OFFSET;
    let mode_field = (word & MODE_MASK) >> MODE_OFFSET;
    let operand = word & OPERAND_MASK;

    let opcode = Opcode::from_u32(opcode_field).ok_or(DecodeError::InvalidOpcode(opcode_field))?;
    let mode =
        AddressingMode::from_u32(mode_field).ok_or(DecodeError::InvalidMode(mode_field))?;

    Ok(DecodedInstruction { opcode, mode, operand })
}

/// Renders an instruction word the way the debug listing does: an 8-digit
/// uppercase hex literal followed by the mnemonic form. The operand (and its
/// mode prefix) is omitted for opcodes that take none.
///
/// # Examples
/// ```
/// use accvm::isa::{disassemble, encode, Opcode, AddressingMode};
///
/// let word = encode(Opcode::Load, AddressingMode::Indirect, 5);
/// assert_eq!(disassemble(word).unwrap(), "40100005  (LOAD $5)");
///
/// let word = encode(Opcode::Hlt, AddressingMode::Direct, 0);
/// assert_eq!(disassemble(word).unwrap(), "F0000000  (HLT)");
/// ```
pub fn disassemble(word: Word) -> Result<String, DecodeError> {
    let decoded = decode(word)?;
    if decoded.opcode.has_operand() {
        Ok(format!(
            "{:08X}  ({} {}{})",
            word, decoded.opcode, decoded.mode, decoded.operand
        ))
    } else {
        Ok(format!("{:08X}  ({})", word, decoded.opcode))
    }
}
