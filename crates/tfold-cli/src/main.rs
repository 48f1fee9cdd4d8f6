mod columns;
mod input_output;
mod logging;
mod progress;
mod render;

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tfold::{InputSource, SourceSet, SymbolMode, TTransform, TfResult, TfoldError, Unit};

use columns::{Columns, Format, Layout};
use logging::LogArgs;
use progress::ProgressHandler;
use render::StepRenderer;

/// T-transform analysis of byte and bit sequences: T-complexity,
/// T-information, T-entropy rates, and normalised T-distances.
#[derive(clap::Parser, Debug)]
#[command(name = "tfold", version)]
pub struct Args {
    /// Add a file input source.
    #[arg(short = 'I', long = "input", value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Add an inline string input source.
    #[arg(short = 'S', long = "string", value_name = "STRING")]
    strings: Vec<String>,

    /// Buffer file inputs into memory.
    #[clap(short = 'm', long)]
    buffer: bool,

    /// Symbol mode: 0 = byte, 1 = bit.
    #[arg(
        short = 'b',
        long = "symbols",
        value_name = "MODE",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=1)
    )]
    symbol_mode: u8,

    /// Concatenate all inputs into one sequence.
    #[clap(short = 'j', long)]
    join: bool,

    /// Append a sentinel terminator to each source.
    #[clap(short = 'z', long)]
    terminate: bool,

    /// Output the normalised T-information distance only.
    #[clap(short = 'd', long)]
    ntid: bool,

    /// Output the normalised T-complexity distance only (implies -z).
    #[clap(short = 'D', long)]
    ntcd: bool,

    /// Include the T-complexity column.
    #[clap(short = 'c', long)]
    complexity: bool,

    /// Include the T-information column.
    #[clap(short = 'i', long)]
    information: bool,

    /// Include the average T-entropy rate column.
    #[clap(short = 'e', long)]
    entropy: bool,

    /// Include the instantaneous T-entropy rate column.
    #[clap(short = 'r', long)]
    inst_entropy: bool,

    /// Include the input offset column.
    #[clap(short = 'x', long)]
    offset: bool,

    /// Include the level column.
    #[clap(short = 'n', long)]
    level: bool,

    /// Include the copy factor column.
    #[clap(short = 'k', long)]
    copy_factor: bool,

    /// Include the copy pattern offset column.
    #[clap(short = 'o', long)]
    cp_offset: bool,

    /// Include the copy pattern length column.
    #[clap(short = 'l', long)]
    cp_length: bool,

    /// Include the copy pattern string column (byte mode only).
    #[clap(short = 'p', long)]
    cp_string: bool,

    /// Column format.
    #[arg(short = 'F', long = "format", value_enum, default_value = "pretty")]
    format: Format,

    /// Information unit.
    #[arg(short = 'u', long = "unit", value_enum, default_value = "bits")]
    unit: UnitArg,

    /// Decimal precision of numeric columns.
    #[arg(
        short = 'g',
        long = "precision",
        value_name = "N",
        default_value_t = 2,
        value_parser = clap::value_parser!(u16).range(0..=300)
    )]
    precision: u16,

    /// Emit a column header line.
    #[clap(short = 'L', long)]
    headers: bool,

    /// Write output to a file instead of stdout.
    #[arg(short = 'O', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

/// Information unit of the output.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum UnitArg {
    /// Binary digits.
    #[default]
    Bits,
    /// Natural units.
    Nats,
}

impl From<UnitArg> for Unit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Bits => Unit::Bits,
            UnitArg::Nats => Unit::Nats,
        }
    }
}

fn main() {
    let matches = Args::command().get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(error) => error.exit(),
    };

    if let Err(error) = args.log.setup_logging() {
        eprintln!("tfold: {error}");
        std::process::exit(2);
    }

    if let Err(error) = run(&args, &matches) {
        eprintln!("tfold: {error}");
        std::process::exit(exit_code(&error));
    }
}

/// Maps an error to the process exit code naming its kind.
fn exit_code(error: &TfoldError) -> i32 {
    match error {
        TfoldError::InputNotReadable { .. } => 3,
        TfoldError::Io(_) => 4,
        TfoldError::Allocation(_) | TfoldError::InputTooLarge { .. } => 5,
        TfoldError::SourceCount { .. } => 6,
        TfoldError::Consistency(_) => 70,
    }
}

fn run(args: &Args, matches: &ArgMatches) -> TfResult<()> {
    let mode = if args.symbol_mode == 1 {
        SymbolMode::Bit
    } else {
        SymbolMode::Byte
    };
    let sources = collect_sources(args, matches);
    if args.buffer {
        log::debug!("file inputs are buffered in memory");
    }

    let mut writer = input_output::open_writer(&args.output)?;

    if args.ntid || args.ntcd {
        run_distance(args, &sources, mode, writer.as_mut())
    } else {
        run_transform(args, sources, mode, writer.as_mut())
    }
}

/// Rebuilds the command-line order of the file and string sources.
fn collect_sources(args: &Args, matches: &ArgMatches) -> Vec<InputSource> {
    let mut ordered: Vec<(usize, InputSource)> = Vec::new();
    if let Some(indices) = matches.indices_of("inputs") {
        for (index, path) in indices.zip(&args.inputs) {
            ordered.push((index, InputSource::File(path.clone())));
        }
    }
    if let Some(indices) = matches.indices_of("strings") {
        for (index, text) in indices.zip(&args.strings) {
            ordered.push((index, InputSource::Bytes(text.clone().into_bytes())));
        }
    }
    ordered.sort_by_key(|&(index, _)| index);
    ordered.into_iter().map(|(_, source)| source).collect()
}

fn selected_columns(args: &Args) -> Columns {
    Columns {
        offset: args.offset,
        level: args.level,
        copy_factor: args.copy_factor,
        cp_offset: args.cp_offset,
        cp_length: args.cp_length,
        complexity: args.complexity,
        information: args.information,
        entropy: args.entropy,
        inst_entropy: args.inst_entropy,
        cp_string: args.cp_string,
    }
}

fn run_distance(
    args: &Args,
    sources: &[InputSource],
    mode: SymbolMode,
    writer: &mut dyn Write,
) -> TfResult<()> {
    if sources.len() != 2 {
        return Err(TfoldError::SourceCount {
            expected: 2,
            got: sources.len(),
        });
    }
    let a = sources[0].read_bytes()?;
    let b = sources[1].read_bytes()?;

    let value = if args.ntid {
        tfold::ntid(&a, &b, mode)?
    } else {
        tfold::ntcd(&a, &b, mode)?
    };

    let layout = Layout::new(args.format, usize::from(args.precision), 0);
    if args.headers {
        columns::write_distance_header(writer, &layout)?;
    }
    render::write_distance(writer, &layout, value)?;
    writer.flush()?;
    Ok(())
}

fn run_transform(
    args: &Args,
    sources: Vec<InputSource>,
    mode: SymbolMode,
    writer: &mut dyn Write,
) -> TfResult<()> {
    let mut columns = selected_columns(args);
    if !columns.any() {
        columns = Columns::aggregate_default();
    }
    if mode == SymbolMode::Bit {
        // Bit symbols have no byte rendition.
        columns.cp_string = false;
    }

    let join = args.join || sources.len() <= 1;
    let set = SourceSet {
        sources,
        mode,
        sentinel: args.terminate,
    };
    let sequences = if join {
        vec![set.materialise()?]
    } else {
        set.materialise_each()?
    };

    let unit: Unit = args.unit.into();
    let precision = usize::from(args.precision);
    let count = sequences.len();

    for (index, sequence) in sequences.into_iter().enumerate() {
        let layout = Layout::new(args.format, precision, sequence.len());
        if count > 1 && args.format.is_pretty() && args.headers {
            writeln!(writer, "input #{}:", index + 1)?;
        }
        if args.headers {
            columns::write_header(writer, &columns, &layout)?;
        }

        let engine = TTransform::from_sequence(sequence);
        if columns.step_mode() {
            let input_len = engine.sequence().len();
            let mut renderer = StepRenderer::new(&mut *writer, columns, layout, unit, input_len);
            engine.run(&mut renderer)?;
            if let Some(error) = renderer.into_error() {
                return Err(error.into());
            }
        } else {
            let result = if args.log.effective_verbosity() == 0 {
                engine.compute()?
            } else {
                engine.run(&mut ProgressHandler::new())?
            };
            render::write_aggregate(writer, &columns, &layout, unit, &result)?;
        }

        if count > 1 {
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> (Args, ArgMatches) {
        let matches = Args::command().get_matches_from(argv);
        let args = Args::from_arg_matches(&matches).unwrap();
        (args, matches)
    }

    #[test]
    fn test_sources_keep_command_line_order() {
        let (args, matches) = parse(&["tfold", "-S", "alpha", "-I", "beta.bin", "-S", "gamma"]);
        let sources = collect_sources(&args, &matches);

        assert_eq!(sources.len(), 3);
        assert!(matches!(&sources[0], InputSource::Bytes(b) if b == b"alpha"));
        assert!(matches!(&sources[1], InputSource::File(p) if p == &PathBuf::from("beta.bin")));
        assert!(matches!(&sources[2], InputSource::Bytes(b) if b == b"gamma"));
    }

    #[test]
    fn test_default_selection_is_aggregate() {
        let (args, _) = parse(&["tfold", "-S", "x"]);
        let columns = selected_columns(&args);
        assert!(!columns.any());
        assert!(!Columns::aggregate_default().step_mode());
    }

    #[test]
    fn test_step_columns_parse() {
        let (args, _) = parse(&["tfold", "-S", "x", "-x", "-n", "-k", "-o", "-l", "-p"]);
        let columns = selected_columns(&args);
        assert!(columns.step_mode());
        assert!(columns.offset && columns.level && columns.copy_factor);
        assert!(columns.cp_offset && columns.cp_length && columns.cp_string);
    }

    #[test]
    fn test_format_and_unit_values() {
        let (args, _) = parse(&["tfold", "-S", "x", "-F", "csv", "-u", "nats", "-g", "7"]);
        assert_eq!(args.format, Format::Csv);
        assert_eq!(args.unit, UnitArg::Nats);
        assert_eq!(args.precision, 7);
    }

    #[test]
    fn test_quiet_silences_verbosity() {
        let (args, _) = parse(&["tfold", "-S", "x", "-q", "-v", "4"]);
        assert_eq!(args.log.effective_verbosity(), 0);
    }

    #[test]
    fn test_aggregate_end_to_end() {
        let (args, matches) = parse(&["tfold", "-S", "AAAA", "-n", "-c", "-F", "csv", "-q"]);
        let sources = collect_sources(&args, &matches);

        let mut out = Vec::new();
        run_transform(&args, sources, SymbolMode::Byte, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,2.00\n");
    }

    #[test]
    fn test_bit_mode_drops_pattern_column() {
        let (args, matches) = parse(&["tfold", "-S", "A", "-b", "1", "-n", "-p", "-F", "csv", "-q"]);
        let sources = collect_sources(&args, &matches);

        let mut out = Vec::new();
        run_transform(&args, sources, SymbolMode::Bit, &mut out).unwrap();
        // 0x41 = 01000001 decomposes in two levels; with the pattern
        // column dropped only the level count remains selected.
        assert_eq!(String::from_utf8(out).unwrap(), "2\n");
    }

    #[test]
    fn test_distance_requires_two_sources() {
        let (args, matches) = parse(&["tfold", "-S", "abc", "-d"]);
        let sources = collect_sources(&args, &matches);

        let mut out = Vec::new();
        let error = run_distance(&args, &sources, SymbolMode::Byte, &mut out).unwrap_err();
        assert_eq!(exit_code(&error), 6);
    }

    #[test]
    fn test_ntid_end_to_end() {
        let (args, matches) = parse(&["tfold", "-S", "abcabc", "-S", "xyzxyz", "-d", "-F", "tab", "-g", "6"]);
        let sources = collect_sources(&args, &matches);

        let mut out = Vec::new();
        run_distance(&args, &sources, SymbolMode::Byte, &mut out).unwrap();
        let value: f64 = String::from_utf8(out).unwrap().trim().parse().unwrap();
        assert!((0.0..=1.0).contains(&value));
    }
}
