use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use hex2clib::{
    DEFAULT_ARRAY_NAME, DEFAULT_FILLER, DecodeMode, Decoder, DecoderOptions, Encoder,
    EncoderOptions, Image, OutputFormat,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "hex2c")]
#[command(version, disable_help_flag = true)]
#[command(
    about = "Convert between Intel HEX, Binary and C Include format.",
    after_help = "If no --output is given then writes to stdout.\nIntel HEX format is 8-bit only (64KB max).\n\nExamples:\n  hex2c firmware.hex > firmware.h\n  hex2c -b -f 0xFF -o firmware.bin firmware.hex\n  hex2c -B -h -w 32 firmware.bin"
)]
struct Cli {
    /// FILE has no specific format
    #[arg(short = 'B', long, overrides_with = "from_hex")]
    from_binary: bool,

    /// FILE has Intel HEX format [default]
    #[arg(short = 'H', long, overrides_with = "from_binary")]
    from_hex: bool,

    /// Binary dump output
    #[arg(short = 'b', long, overrides_with_all = ["c", "hex", "info"])]
    binary: bool,

    /// C Include output [default]
    #[arg(short = 'c', long = "c", overrides_with_all = ["binary", "hex", "info"])]
    c: bool,

    /// Intel HEX format output
    #[arg(short = 'h', long, overrides_with_all = ["binary", "c", "info"])]
    hex: bool,

    /// Print information about FILE
    #[arg(short = 'i', long, overrides_with_all = ["binary", "c", "hex"])]
    info: bool,

    /// Set output file name ("-" for stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Extra space on line
    #[arg(short = 'p', long, value_name = "NUM", value_parser = parse_number, default_value = "0")]
    padding: u8,

    /// Maximum output bytes per line
    #[arg(short = 'w', long, value_name = "NUM", value_parser = parse_number, default_value = "0")]
    wrap: u8,

    /// Byte for unwritten memory; binary output is padded with it from address 0
    #[arg(short = 'f', long, value_name = "NUM", value_parser = parse_number)]
    filler: Option<u8>,

    /// Array name for C Include output
    #[arg(short = 'n', long, value_name = "IDENT", default_value = DEFAULT_ARRAY_NAME)]
    name: String,

    /// Skip unknown record types instead of rejecting them
    #[arg(long)]
    lenient: bool,

    /// Suppress messages
    #[arg(short = 's', long)]
    silent: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Input file ("-" for stdin)
    file: PathBuf,
}

impl Cli {
    const fn output_format(&self) -> OutputFormat {
        if self.binary {
            OutputFormat::Binary
        } else if self.hex {
            OutputFormat::Hex
        } else if self.info {
            OutputFormat::Info
        } else {
            OutputFormat::CListing
        }
    }

    fn warn(&self, msg: impl std::fmt::Display) {
        if !self.silent {
            eprintln!("{msg}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cli.warn(format_args!("Error: {err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let image = if cli.from_binary {
        read_binary(&cli.file)?
    } else {
        read_hex(cli)?
    };

    let encoder = Encoder::new(EncoderOptions {
        format: cli.output_format(),
        wrap: cli.wrap,
        padding: cli.padding,
        filler: cli.filler,
        array_name: cli.name.clone(),
    });

    let mut sink = open_output(cli.output.as_deref())?;

    // An empty image is not written out, info still reports it
    if image.is_empty() && encoder.options().format != OutputFormat::Info {
        cli.warn("Warning: nothing decoded, no output written");
        return Ok(());
    }

    encoder
        .encode(&image, &mut sink)
        .context("Failed to write output")?;
    Ok(())
}

fn read_hex(cli: &Cli) -> Result<Image> {
    let decoder = Decoder::new(DecoderOptions {
        mode: if cli.lenient {
            DecodeMode::Lenient
        } else {
            DecodeMode::Strict
        },
        filler: cli.filler.unwrap_or(DEFAULT_FILLER),
    });

    let decoded = if is_std_stream(&cli.file) {
        decoder.decode(io::stdin().lock())
    } else {
        let file = File::open(&cli.file)
            .with_context(|| format!("Failed to open input file: {}", cli.file.display()))?;
        decoder.decode(BufReader::new(file))
    }
    .with_context(|| format!("Failed to read input file: {}", cli.file.display()))?;

    for diagnostic in &decoded.diagnostics {
        cli.warn(diagnostic);
    }

    Ok(decoded.image)
}

fn read_binary(path: &Path) -> Result<Image> {
    let image = if is_std_stream(path) {
        Image::from_reader(io::stdin().lock(), 0)
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        let size_hint = file
            .metadata()
            .ok()
            .and_then(|meta| usize::try_from(meta.len()).ok())
            .unwrap_or(0);
        Image::from_reader(BufReader::new(file), size_hint)
    };

    image.with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) if !is_std_stream(path) => {
            // Ensure the parent directory exists
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn is_std_stream(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Parse a byte-sized number: decimal, `0x` hex or `0`-prefixed octal.
fn parse_number(s: &str) -> Result<u8, String> {
    let s = s.trim();

    let parsed = if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex_str, 16)
    } else if let Some(oct_str) = s.strip_prefix('0')
        && !oct_str.is_empty()
    {
        u8::from_str_radix(oct_str, 8)
    } else {
        s.parse::<u8>()
    };

    parsed.map_err(|_| format!("'{s}' is not a number between 0 and 255"))
}
