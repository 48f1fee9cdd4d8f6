//! Column selection, formats, and pretty-mode layout.
//!
//! Columns render in a fixed order regardless of the flag order:
//! input offset, level, copy factor, pattern offset, pattern length,
//! T-complexity, T-information, average T-entropy, instantaneous
//! T-entropy, pattern string. Distances use their own single column.

use std::io::{self, Write};

/// Header labels, in render order.
pub const LABELS: [&str; 10] = [
    "x",     // input offset
    "n",     // level
    "k",     // copy factor
    "p-{o}", // copy pattern offset
    "p-{l}", // copy pattern length
    "t-{c}", // t-complexity
    "t-{i}", // t-information
    "t-{e}", // average t-entropy rate
    "t-{r}", // instantaneous t-entropy rate
    "p",     // copy pattern string
];

/// Header label of the distance column.
pub const DISTANCE_LABEL: &str = "t-{nid}";

/// The selected output columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Columns {
    pub offset: bool,
    pub level: bool,
    pub copy_factor: bool,
    pub cp_offset: bool,
    pub cp_length: bool,
    pub complexity: bool,
    pub information: bool,
    pub entropy: bool,
    pub inst_entropy: bool,
    pub cp_string: bool,
}

impl Columns {
    /// Whether any column is selected at all.
    pub fn any(&self) -> bool {
        self.enabled().iter().any(|&on| on)
    }

    /// Whether any per-level column is selected, which switches the run
    /// from one aggregate record to one record per level.
    pub fn step_mode(&self) -> bool {
        self.offset
            || self.copy_factor
            || self.cp_offset
            || self.cp_length
            || self.inst_entropy
            || self.cp_string
    }

    /// Whether T-information has to be derived for a record.
    pub fn needs_information(&self) -> bool {
        self.information || self.entropy || self.inst_entropy
    }

    /// The default aggregate selection when no column flag is given.
    pub fn aggregate_default() -> Self {
        Self {
            level: true,
            complexity: true,
            information: true,
            entropy: true,
            ..Self::default()
        }
    }

    /// Selection flags in render order, parallel to [`LABELS`].
    pub fn enabled(&self) -> [bool; 10] {
        [
            self.offset,
            self.level,
            self.copy_factor,
            self.cp_offset,
            self.cp_length,
            self.complexity,
            self.information,
            self.entropy,
            self.inst_entropy,
            self.cp_string,
        ]
    }
}

/// Column format of the renderer.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Right-aligned columns, single-space separated.
    #[default]
    Pretty,
    /// Comma separated.
    Csv,
    /// Tab separated.
    Tab,
}

impl Format {
    /// The column separator character.
    pub fn separator(self) -> char {
        match self {
            Format::Pretty => ' ',
            Format::Csv => ',',
            Format::Tab => '\t',
        }
    }

    /// Whether this is the padded pretty format.
    pub fn is_pretty(self) -> bool {
        self == Format::Pretty
    }
}

const MIN_COLUMN_WIDTH: usize = 6;

/// Numeric column widths; zero outside pretty mode.
///
/// Pretty widths derive from the input length so that every integer
/// column can hold any offset, plus one pad column.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub format: Format,
    pub precision: usize,
    pub int_width: usize,
    pub double_width: usize,
    pub short_width: usize,
    pub distance_width: usize,
}

impl Layout {
    pub fn new(format: Format, precision: usize, input_len: usize) -> Self {
        let (int_width, double_width, short_width, distance_width) = if format.is_pretty() {
            let int_raw = digit_count(input_len) + 1;
            (
                int_raw.max(MIN_COLUMN_WIDTH),
                (int_raw + precision + 1).max(MIN_COLUMN_WIDTH),
                (precision + 4).max(MIN_COLUMN_WIDTH),
                (precision + 2).max(MIN_COLUMN_WIDTH + 2),
            )
        } else {
            (0, 0, 0, 0)
        };

        Self {
            format,
            precision,
            int_width,
            double_width,
            short_width,
            distance_width,
        }
    }

    pub fn write_int(
        &self,
        writer: &mut dyn Write,
        sep: &mut SeparatorState,
        value: u64,
    ) -> io::Result<()> {
        sep.lead(writer)?;
        write!(writer, "{value:>width$}", width = self.int_width)
    }

    pub fn write_double(
        &self,
        writer: &mut dyn Write,
        sep: &mut SeparatorState,
        value: f64,
    ) -> io::Result<()> {
        sep.lead(writer)?;
        write!(
            writer,
            "{value:>width$.precision$}",
            width = self.double_width,
            precision = self.precision
        )
    }

    pub fn write_short(
        &self,
        writer: &mut dyn Write,
        sep: &mut SeparatorState,
        value: f64,
    ) -> io::Result<()> {
        sep.lead(writer)?;
        write!(
            writer,
            "{value:>width$.precision$}",
            width = self.short_width,
            precision = self.precision
        )
    }

    /// Width of the numeric column at a render ordinal.
    fn width_for(&self, ordinal: usize) -> usize {
        match ordinal {
            0..=4 => self.int_width,
            5..=6 => self.double_width,
            _ => self.short_width,
        }
    }
}

/// Tracks whether a row still awaits its first column.
#[derive(Debug)]
pub struct SeparatorState {
    separator: char,
    first: bool,
}

impl SeparatorState {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            first: true,
        }
    }

    /// Writes the separator unless this is the row's first column.
    pub fn lead(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        if self.first {
            self.first = false;
            Ok(())
        } else {
            write!(writer, "{}", self.separator)
        }
    }

    /// Whether no column has been written yet.
    pub fn is_first(&self) -> bool {
        self.first
    }
}

/// Writes the header line for the selected columns.
pub fn write_header(
    writer: &mut dyn Write,
    columns: &Columns,
    layout: &Layout,
) -> io::Result<()> {
    let mut sep = SeparatorState::new(layout.format.separator());
    for (ordinal, &on) in columns.enabled().iter().enumerate() {
        if !on {
            continue;
        }
        sep.lead(writer)?;
        if ordinal == 9 {
            // The pattern column is unpadded; pretty gets the two-space pad.
            if layout.format.is_pretty() {
                write!(writer, "{:>2}", LABELS[ordinal])?;
            } else {
                write!(writer, "{}", LABELS[ordinal])?;
            }
        } else {
            write!(
                writer,
                "{:>width$}",
                LABELS[ordinal],
                width = layout.width_for(ordinal)
            )?;
        }
    }
    writeln!(writer)
}

/// Writes the single-column header of the distance modes.
pub fn write_distance_header(writer: &mut dyn Write, layout: &Layout) -> io::Result<()> {
    writeln!(
        writer,
        "{:>width$}",
        DISTANCE_LABEL,
        width = layout.distance_width
    )
}

fn digit_count(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_mode_triggers() {
        let aggregate = Columns {
            level: true,
            complexity: true,
            ..Columns::default()
        };
        assert!(!aggregate.step_mode());

        let step = Columns {
            offset: true,
            ..Columns::default()
        };
        assert!(step.step_mode());

        assert!(!Columns::aggregate_default().step_mode());
    }

    #[test]
    fn test_pretty_widths_track_input_length() {
        let layout = Layout::new(Format::Pretty, 2, 12345);
        assert_eq!(layout.int_width, 6);
        assert_eq!(layout.double_width, 9);
        assert_eq!(layout.short_width, 6);

        let small = Layout::new(Format::Pretty, 2, 9);
        assert_eq!(small.int_width, MIN_COLUMN_WIDTH);
    }

    #[test]
    fn test_flat_formats_have_no_widths() {
        let layout = Layout::new(Format::Csv, 4, 1_000_000);
        assert_eq!(layout.int_width, 0);
        assert_eq!(layout.double_width, 0);
    }

    #[test]
    fn test_header_line_pretty() {
        let columns = Columns {
            level: true,
            copy_factor: true,
            complexity: true,
            ..Columns::default()
        };
        let layout = Layout::new(Format::Pretty, 2, 100);

        let mut out = Vec::new();
        write_header(&mut out, &columns, &layout).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "     n      k     t-{c}\n");
    }

    #[test]
    fn test_header_line_csv() {
        let columns = Columns {
            level: true,
            complexity: true,
            cp_string: true,
            ..Columns::default()
        };
        let layout = Layout::new(Format::Csv, 2, 100);

        let mut out = Vec::new();
        write_header(&mut out, &columns, &layout).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "n,t-{c},p\n");
    }

    #[test]
    fn test_separator_leads_after_first() {
        let mut out = Vec::new();
        let mut sep = SeparatorState::new(',');
        sep.lead(&mut out).unwrap();
        out.push(b'a');
        sep.lead(&mut out).unwrap();
        out.push(b'b');
        assert_eq!(out, b"a,b");
    }
}
