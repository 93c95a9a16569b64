#[macro_use]
extern crate clap;

use clap::Arg;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteDebug,
    WriteBinary,
}

#[derive(Debug)]
enum Error {
    Translator(translator::Error),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteDebug => "Writing debug listing",
                    IOErrorContext::WriteBinary => "Writing binary image",
                },
                path.display(),
                err
            ),
            Error::Translator(err) => write!(f, "Translating source failed: {}", err),
        }
    }
}

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the source file to translate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the binary image output path"),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .takes_value(true)
                .value_name("DEBUG")
                .help("Sets the debug listing output path"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");
    let debug = matches.value_of("debug");

    if let Err(err) = translate(input, output, debug) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn translate(input: &str, output: Option<&str>, debug: Option<&str>) -> Result<(), Error> {
    let input_path = Path::new(input);

    let input_file = File::open(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;
    let mut source = String::new();
    BufReader::new(input_file)
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    let memory = translator::translate(&source).map_err(Error::Translator)?;

    // memory[0] is always `JMP DIRECT data_len` (see §3's startup-jump
    // invariant), which doubles as the data/code segment boundary the
    // listing needs.
    let startup = accvm::isa::decode(memory.cells()[0]).expect("startup cell is always a valid JMP");
    let data_len = startup.operand;

    let debug_path: PathBuf = debug
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("debug"));
    let listing = translator::listing::render(&memory, data_len);
    std::fs::write(&debug_path, listing)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteDebug, debug_path))?;

    let output_path: PathBuf = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("bin"));
    image::write_file(&output_path, &memory)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteBinary, output_path))?;

    println!(
        "source LoC: {}, machine code words: {}",
        source.lines().count(),
        memory.cells().len()
    );

    Ok(())
}
