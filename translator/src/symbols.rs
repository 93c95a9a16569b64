//! The tables a translation pass consults and mutates while it walks a
//! program: where each global, literal, string buffer and function lives.

use accvm::Address;
use std::collections::HashMap;

/// A literal value that has been spilled to data memory, keyed so repeated
/// occurrences of the same literal share one cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralKey {
    Int(u64),
    Str(String),
}

/// All translator-owned bookkeeping. Discarded once a memory image has been
/// emitted; nothing here outlives a single [`crate::codegen::Translator`].
#[derive(Default)]
pub struct SymbolTable {
    /// Global variable name -> data-memory address holding its value.
    pub variables: HashMap<String, Address>,
    /// Literal value -> data-memory address it was spilled to.
    pub literals: HashMap<LiteralKey, Address>,
    /// Allocated buffer name -> (base address, size including terminator).
    pub string_arrays: HashMap<String, (Address, u32)>,
    /// Function name -> entry address in code memory (pre-relocation).
    pub functions: HashMap<String, Address>,
    /// Function name -> ordered frame layout, nearest `SP` first.
    pub fun_variables: HashMap<String, Vec<String>>,
}
