//! Command-line front-end for the ECM decoder.
//!
//! This intentionally stays thin: reading the whole input file into memory,
//! invoking the library's `Decoder`, and writing the result back out. The
//! graphical front-end (drag-and-drop, progress bars, the `.cue` sheet
//! generator) is a separate concern this binary doesn't attempt.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ecmimage::Decoder;

/// Decode an ECM stream back into its original CD-ROM image.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the `.ecm` input file
    input: PathBuf,
    /// Path to write the reconstructed image to
    output: PathBuf,
    /// Suppress the per-record progress line
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ecmdecode: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input = std::fs::read(&args.input)?;
    let file = File::create(&args.output)?;
    let mut output = BufWriter::new(file);

    let decoder = Decoder::new();
    let quiet = args.quiet;

    decoder.decode(
        &input,
        &mut output,
        |bytes_in, total_in| {
            if !quiet {
                println!("{bytes_in}/{total_in} bytes");
            }
        },
        || false,
    )?;

    output.flush()?;

    Ok(())
}
