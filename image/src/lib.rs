//! Container format for a translated memory image: the fixed-size array of
//! 2048 cells a translator emits and a simulator loads.
//!
//! The external artifact is exactly what §6 of the interface calls for — one
//! 8-digit uppercase hex word per line, newline-separated, with no header.
//! There is nothing to frame: the cell count is fixed by the architecture.

use accvm::Memory;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Error produced when a line of an image file is not an 8-digit hex word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedWord {
    pub line: usize,
    pub text: String,
}

impl std::fmt::Display for MalformedWord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "line {}: not an 8-digit hex word: {:?}", self.line, self.text)
    }
}

impl std::error::Error for MalformedWord {}

/// Reads a memory image as one hex word per line.
pub fn read<R: Read>(reader: R) -> std::io::Result<Memory> {
    let mut cells = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let word = u32::from_str_radix(line.trim(), 16).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                MalformedWord { line: index, text: line },
            )
        })?;
        cells.push(word);
    }
    Ok(Memory::from(cells))
}

/// Writes `memory` as one uppercase 8-digit hex word per line.
pub fn write<W: Write>(mut writer: W, memory: &Memory) -> std::io::Result<()> {
    for &word in memory.cells() {
        writeln!(writer, "{:08X}", word)?;
    }
    Ok(())
}

pub trait ReadImageExt: Read + Sized {
    fn read_image(self) -> std::io::Result<Memory> {
        read(self)
    }
}

impl<R: Read + Sized> ReadImageExt for R {}

pub trait WriteImageExt: Write + Sized {
    fn write_image(self, memory: &Memory) -> std::io::Result<()> {
        write(self, memory)
    }
}

impl<W: Write + Sized> WriteImageExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<Memory> {
    File::open(path)?.read_image()
}

pub fn write_file<P: AsRef<Path>>(path: P, memory: &Memory) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_image(memory)
}

#[cfg(test)]
mod test;
