//! bin2c - Convert binary files into C header and source files
//!
//! The input file's bytes become an `unsigned char const` array named after
//! the file. Without `-g` a single header with a `static` definition is
//! written; with `-g` a source file holds the definition and a header holds
//! the `extern` declaration plus a macro giving the element count.

use anyhow::{bail, Context, Result};
use bin2c_core::{
    symbol_name_lossy, ArrayName, DeclarationEmitter, DeclarationShape, EmitReport, OutputStem,
};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Convert a binary file into a C array definition
#[derive(Parser, Debug)]
#[command(name = "bin2c")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file to use as the source of binary data.
    ///
    /// Output files keep the input's path and name with the ".h" extension
    /// (and ".c" when -g is present). The file name also forms the core of
    /// the array name.
    input: PathBuf,

    /// Prepends ARRAY_PREFIX to the name of the array
    #[arg(short = 'p', short_alias = 'P', value_name = "ARRAY_PREFIX")]
    prefix: Option<String>,

    /// Appends ARRAY_SUFFIX to the name of the array
    #[arg(short = 's', short_alias = 'S', value_name = "ARRAY_SUFFIX")]
    suffix: Option<String>,

    /// Gives the array global scope and writes both a source and a header file.
    ///
    /// The header defines a macro for the number of elements, named after the
    /// prefix, the input file's name and LENGTH_SUFFIX, capitalized. Without
    /// this option the array has static scope and only a header is written.
    #[arg(short = 'g', short_alias = 'G', value_name = "LENGTH_SUFFIX")]
    global: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Failures up to here are argument problems and get the usage summary
    let (mut source, stem) = match open_input(&cli) {
        Ok(opened) => opened,
        Err(e) => Cli::command()
            .error(ErrorKind::ValueValidation, format!("{:#}", e))
            .exit(),
    };

    let report = convert(&cli, &mut source, &stem)?;
    for path in &report.files {
        info!("Wrote {}", path.display());
    }
    info!("Embedded {} bytes", report.count);

    Ok(())
}

/// Open the input file and derive where the output goes
///
/// Pipes and devices are accepted; the input is only ever read front to back.
fn open_input(cli: &Cli) -> Result<(File, OutputStem)> {
    let input = cli.input.as_path();
    if input.is_dir() {
        bail!("Input path is a directory: {}", input.display());
    }

    let source = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;

    let stem = OutputStem::from_os_input(input.as_os_str())
        .with_context(|| format!("Failed to derive output path from: {}", input.display()))?;

    debug!("Output stem: {}", stem.as_os_str().to_string_lossy());
    Ok((source, stem))
}

/// Run the conversion for an opened input
fn convert(cli: &Cli, source: &mut File, stem: &OutputStem) -> Result<EmitReport> {
    let name = ArrayName::new(symbol_name_lossy(cli.input.as_os_str()))
        .prefix(cli.prefix.as_deref())
        .suffix(cli.suffix.as_deref());
    let shape = DeclarationShape::from_length_suffix(cli.global.clone());

    debug!(
        "Emitting {} array '{}'",
        if shape.is_global() { "global" } else { "static" },
        name
    );

    DeclarationEmitter::new()
        .emit_to_files(source, &name, &shape, stem)
        .context("failed to create output C file(s) from the input binary file")
}
