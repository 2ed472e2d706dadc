use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use telemframe_codec::{ChannelKey, Schema};
use telemframe_schema::{LoaderConfig, SchemaLoader};

use crate::exit::{io_error, schema_error, CliResult};
use crate::output::OutputFormat;

pub mod compare;
pub mod decode;
pub mod encode;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Describe a schema definition file or a directory of them.
    Schema(SchemaArgs),
    /// Encode JSON frames into a length-prefixed binary stream.
    Encode(EncodeArgs),
    /// Decode a length-prefixed binary stream and print each frame.
    Decode(DecodeArgs),
    /// Compare binary and JSON encodings of a synthetic frame.
    Compare(CompareArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Schema(args) => schema::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Compare(args) => compare::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SchemaSource {
    /// Schema definition file.
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,
    /// Reject definition fields the loader does not recognize.
    #[arg(long)]
    pub strict: bool,
}

impl SchemaSource {
    pub fn load(&self) -> CliResult<Schema> {
        load_schema(&self.schema, self.strict)
    }
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Definition file, or a directory of `<name>.schema.json` files.
    pub path: PathBuf,
    /// Reject definition fields the loader does not recognize.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// JSON frames, one per line or a single array. Default: stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Binary output file. Default: stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// Binary input file. Default: stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Ignore trailing bytes and unused presence bits.
    #[arg(long)]
    pub lenient: bool,
    /// Only print these channel keys (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub keys: Option<Vec<ChannelKey>>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// Samples per channel in the synthetic frame.
    #[arg(long, default_value = "100")]
    pub samples: usize,
    /// Timed encode/decode iterations per codec.
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..))]
    pub iterations: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn load_schema(path: &Path, strict: bool) -> CliResult<Schema> {
    let loader = SchemaLoader::with_config(LoaderConfig {
        strict_mode: strict,
        ..LoaderConfig::default()
    });
    loader
        .load_file(path)
        .map_err(|err| schema_error(&format!("schema {}", path.display()), err))
}

pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

pub fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
