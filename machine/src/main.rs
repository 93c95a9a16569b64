#[macro_use]
extern crate clap;

use accvm::Processor;
use clap::Arg;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum IOErrorContext {
    ReadImage,
    ReadInput,
}

#[derive(Debug)]
enum Error {
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadImage => "Reading binary image",
                    IOErrorContext::ReadInput => "Reading input",
                },
                path.display(),
                err
            ),
        }
    }
}

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("PROGRAM")
                .help("Sets the binary memory image to run")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the UTF-8 input text file")
                .required(true)
                .index(2),
        )
        .get_matches();

    let program = matches.value_of("PROGRAM").unwrap();
    let input = matches.value_of("INPUT").unwrap();

    if let Err(err) = run(program, input) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(program: &str, input: &str) -> Result<(), Error> {
    let program_path = Path::new(program);
    let memory = image::read_file(program_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadImage, program_path.to_owned()))?;

    let input_path = Path::new(input);
    let input_file = File::open(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;
    let mut input_text = String::new();
    BufReader::new(input_file)
        .read_to_string(&mut input_text)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    let mut input_bytes: Vec<u8> = input_text.into_bytes();
    input_bytes.push(0);

    let mut processor = Processor::new(memory, &input_bytes);
    let report = processor.run();

    print!("{}", report.output);
    println!(
        "instr_counter: {}, ticks: {}",
        report.instruction_count, report.tick_count
    );

    Ok(())
}
