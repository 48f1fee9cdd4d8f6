//! Record rendering.
//!
//! One renderer per sequence: it implements the engine's handler trait,
//! writing one row per level in step mode, and offers the aggregate and
//! distance writers for the other run shapes.
//!
//! The pattern-string column emits the pattern bytes verbatim. In CSV and
//! TAB formats they are not escaped, so patterns containing the separator
//! character can misparse downstream; this is a known limitation of the
//! format. Symbols with no byte value (sentinels) render as `.`.

use std::io::{self, Write};
use std::ops::ControlFlow;

use tfold::metrics::{self, Unit};
use tfold::{Sequence, StepRecord, TransformHandler, TransformResult};

use crate::columns::{Columns, Layout, SeparatorState};

/// Whether a row is a real step record or an interpolated gap row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Step,
    Gap,
}

/// Streams per-level records to a writer.
pub struct StepRenderer<'a> {
    writer: &'a mut dyn Write,
    columns: Columns,
    layout: Layout,
    unit: Unit,
    input_len: usize,
    previous_information: f64,
    previous_offset: usize,
    error: Option<io::Error>,
}

impl<'a> StepRenderer<'a> {
    pub fn new(
        writer: &'a mut dyn Write,
        columns: Columns,
        layout: Layout,
        unit: Unit,
        input_len: usize,
    ) -> Self {
        Self {
            writer,
            columns,
            layout,
            unit,
            input_len,
            previous_information: 0.0,
            previous_offset: input_len.saturating_sub(1),
            error: None,
        }
    }

    /// The first write error, if rendering stopped the run.
    pub fn into_error(self) -> Option<io::Error> {
        self.error
    }

    fn render_step(&mut self, sequence: &Sequence, record: &StepRecord) -> io::Result<()> {
        let (information, entropy, inst_entropy) = if self.columns.needs_information() {
            let information = self.unit.apply(metrics::t_information(record.complexity));
            let entropy = metrics::average_entropy(
                information,
                self.input_len,
                record.cp_start,
                record.cp_length,
                record.joined_length,
            );
            let inst_entropy = metrics::instantaneous_entropy(
                information,
                self.previous_information,
                record.joined_length,
            );
            self.previous_information = information;
            (information, entropy, inst_entropy)
        } else {
            (0.0, 0.0, 0.0)
        };

        let input_offset = record.cp_start + record.cp_length - record.joined_length;

        if self.columns.offset {
            // Fill the offsets this level jumped over with copies of the
            // row. The gap starts one below the previous offset, so the
            // very first offset of the input never renders.
            let mut gap = self.previous_offset;
            while gap > input_offset + 1 {
                gap -= 1;
                self.render_row(
                    sequence,
                    record,
                    gap,
                    information,
                    entropy,
                    inst_entropy,
                    RowKind::Gap,
                )?;
            }
            self.previous_offset = input_offset;
        }

        self.render_row(
            sequence,
            record,
            input_offset,
            information,
            entropy,
            inst_entropy,
            RowKind::Step,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn render_row(
        &mut self,
        sequence: &Sequence,
        record: &StepRecord,
        input_offset: usize,
        information: f64,
        entropy: f64,
        inst_entropy: f64,
        kind: RowKind,
    ) -> io::Result<()> {
        let writer = &mut *self.writer;
        let layout = &self.layout;
        let mut sep = SeparatorState::new(layout.format.separator());

        if self.columns.offset {
            layout.write_int(writer, &mut sep, input_offset as u64)?;
        }
        if self.columns.level {
            layout.write_int(writer, &mut sep, u64::from(record.level))?;
        }
        if self.columns.copy_factor {
            layout.write_int(writer, &mut sep, record.copy_factor)?;
        }
        if self.columns.cp_offset {
            layout.write_int(writer, &mut sep, record.cp_start as u64)?;
        }
        if self.columns.cp_length {
            layout.write_int(writer, &mut sep, record.cp_length as u64)?;
        }
        if self.columns.complexity {
            layout.write_double(writer, &mut sep, record.complexity)?;
        }
        if self.columns.information {
            layout.write_double(writer, &mut sep, information)?;
        }
        if self.columns.entropy {
            layout.write_short(writer, &mut sep, entropy)?;
        }
        if self.columns.inst_entropy {
            layout.write_short(writer, &mut sep, inst_entropy)?;
        }
        if self.columns.cp_string {
            let lead = if sep.is_first() {
                String::new()
            } else {
                layout.format.separator().to_string()
            };
            if layout.format.is_pretty() {
                write!(writer, "{lead:>2}")?;
            } else {
                write!(writer, "{lead}")?;
            }
            match kind {
                RowKind::Gap => {
                    if layout.format.is_pretty() {
                        write!(writer, ".")?;
                    }
                }
                RowKind::Step => {
                    for index in 0..record.cp_length {
                        let byte = sequence.byte_at(record.cp_start + index).unwrap_or(b'.');
                        writer.write_all(&[byte])?;
                    }
                }
            }
        }
        writeln!(writer)
    }
}

impl TransformHandler for StepRenderer<'_> {
    fn init(&mut self, sequence: &Sequence) {
        self.previous_information = 0.0;
        self.previous_offset = sequence.len().saturating_sub(1);
    }

    fn step(&mut self, sequence: &Sequence, record: &StepRecord) -> ControlFlow<()> {
        match self.render_step(sequence, record) {
            Ok(()) => ControlFlow::Continue(()),
            Err(error) => {
                log::error!("output write failed: {error}");
                self.error = Some(error);
                ControlFlow::Break(())
            }
        }
    }

    fn finish(&mut self, _: &Sequence, _: &TransformResult) {
        if let Err(error) = self.writer.flush() {
            log::error!("output flush failed: {error}");
        }
    }
}

/// Writes the single aggregate record of a non-step run.
pub fn write_aggregate(
    writer: &mut dyn Write,
    columns: &Columns,
    layout: &Layout,
    unit: Unit,
    result: &TransformResult,
) -> io::Result<()> {
    let mut sep = SeparatorState::new(layout.format.separator());
    if columns.level {
        layout.write_int(writer, &mut sep, u64::from(result.levels))?;
    }
    if columns.complexity {
        layout.write_double(writer, &mut sep, result.complexity)?;
    }
    if columns.information {
        layout.write_double(writer, &mut sep, unit.apply(result.information))?;
    }
    if columns.entropy {
        layout.write_short(writer, &mut sep, unit.apply(result.entropy))?;
    }
    writeln!(writer)
}

/// Writes a distance value in the distance column format.
pub fn write_distance(writer: &mut dyn Write, layout: &Layout, value: f64) -> io::Result<()> {
    writeln!(
        writer,
        "{value:>width$.precision$}",
        width = layout.distance_width,
        precision = layout.precision
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Format;
    use tfold::{SymbolMode, TTransform};

    fn render(
        text: &[u8],
        columns: Columns,
        format: Format,
        precision: usize,
    ) -> String {
        let sequence = Sequence::from_bytes(text, SymbolMode::Byte).unwrap();
        let engine = TTransform::from_sequence(sequence);
        let layout = Layout::new(format, precision, engine.sequence().len());

        let mut out = Vec::new();
        let mut renderer =
            StepRenderer::new(&mut out, columns, layout, Unit::Bits, engine.sequence().len());
        engine.run(&mut renderer).unwrap();
        assert!(renderer.into_error().is_none());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_step_rows() {
        let columns = Columns {
            level: true,
            copy_factor: true,
            cp_offset: true,
            cp_length: true,
            complexity: true,
            ..Columns::default()
        };
        let out = render(b"AAAA", columns, Format::Csv, 2);
        assert_eq!(out, "1,3,2,1,2.00\n");
    }

    #[test]
    fn test_csv_pattern_column() {
        let columns = Columns {
            level: true,
            cp_string: true,
            ..Columns::default()
        };
        let out = render(b"ABAB", columns, Format::Csv, 2);
        // Level 1 collapses pattern "A"; level 2 the pattern "AB".
        assert_eq!(out, "1,A\n2,AB\n");
    }

    #[test]
    fn test_offset_interpolation_fills_gaps() {
        let columns = Columns {
            offset: true,
            level: true,
            ..Columns::default()
        };
        let out = render(b"AAAA", columns, Format::Csv, 2);
        // One level at offset 0; gap rows cover offsets 2 and 1. The last
        // input offset (3) is never rendered.
        assert_eq!(out, "2,1\n1,1\n0,1\n");
    }

    #[test]
    fn test_offset_rows_without_gaps() {
        let columns = Columns {
            offset: true,
            ..Columns::default()
        };
        let out = render(b"ABCD", columns, Format::Csv, 2);
        assert_eq!(out, "2\n1\n0\n");
    }

    #[test]
    fn test_pretty_alignment_and_gap_pattern() {
        let columns = Columns {
            offset: true,
            cp_string: true,
            ..Columns::default()
        };
        let out = render(b"AAAA", columns, Format::Pretty, 2);
        let expected = "     2  .\n     1  .\n     0  A\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_aggregate_record_pretty() {
        let sequence = Sequence::from_bytes(b"AAAA", SymbolMode::Byte).unwrap();
        let result = TTransform::from_sequence(sequence).compute().unwrap();
        let layout = Layout::new(Format::Pretty, 2, 4);

        let mut out = Vec::new();
        write_aggregate(
            &mut out,
            &Columns::aggregate_default(),
            &layout,
            Unit::Nats,
            &result,
        )
        .unwrap();
        // Levels 1, C = 2.00, raw I = 3.00, entropy = 3 / 5 = 0.60.
        assert_eq!(String::from_utf8(out).unwrap(), "     1   2.00   3.00   0.60\n");
    }

    #[test]
    fn test_distance_value_pretty() {
        let layout = Layout::new(Format::Pretty, 2, 0);
        let mut out = Vec::new();
        write_distance(&mut out, &layout, 0.5).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "    0.50\n");
    }

    #[test]
    fn test_distance_value_flat() {
        let layout = Layout::new(Format::Tab, 3, 0);
        let mut out = Vec::new();
        write_distance(&mut out, &layout, 1.0).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1.000\n");
    }

    #[test]
    fn test_instantaneous_entropy_uses_previous_level() {
        let columns = Columns {
            level: true,
            inst_entropy: true,
            ..Columns::default()
        };
        let out = render(b"ABCD", columns, Format::Csv, 4);

        // Scaled information per level: (2^C - 1) / ln 2 for C = 1, 2, 3;
        // each level collapses one symbol.
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: f64 = lines[0].split(',').nth(1).unwrap().parse().unwrap();
        assert!((first - 1.0 / std::f64::consts::LN_2).abs() < 1e-3);
    }
}
