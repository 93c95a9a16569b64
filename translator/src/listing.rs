//! Renders a translated memory image as a human-readable debug listing:
//! the startup jump, the data segment and the code segment, each cell
//! annotated with its address.

use accvm::isa::disassemble;
use accvm::{Memory, Storage};
use std::fmt::Write;

/// Builds the debug listing text for `memory`, whose data segment spans
/// `[0, data_len)` and whose code segment spans `[data_len, length)`.
pub fn render(memory: &Memory, data_len: u32) -> String {
    let mut out = String::new();

    let startup = memory.read(0).unwrap_or(0);
    writeln!(out, "Line 0: {}", disassemble(startup).unwrap_or_else(|e| e.to_string())).ok();

    writeln!(out, "\nDATA MEMORY").ok();
    for addr in 1..data_len {
        let word = memory.read(addr).unwrap_or(0);
        if word == 0 {
            continue;
        }
        if word > 32 {
            let c = std::char::from_u32(word).unwrap_or('\u{FFFD}');
            writeln!(out, "{:04} - {:08X} - {} - {:?}", addr, word, word, c).ok();
        } else {
            writeln!(out, "{:04} - {:08X} - {}", addr, word, word).ok();
        }
    }

    writeln!(out, "\nCODE MEMORY").ok();
    for addr in data_len..memory.length() {
        let word = memory.read(addr).unwrap_or(0);
        match disassemble(word) {
            Ok(text) => writeln!(out, "{:04} - {}", addr, text).ok(),
            Err(e) => writeln!(out, "{:04} - {:08X} - {}", addr, word, e).ok(),
        };
    }

    out
}
