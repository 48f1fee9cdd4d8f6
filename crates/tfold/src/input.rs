//! # Input Sources and Materialisation
//!
//! The engine consumes a single linear symbol sequence. This module turns a
//! configured set of byte buffers and file paths into that sequence: bytes
//! pass through unchanged in byte mode, unpack to eight MSB-first symbols
//! per byte in bit mode, and each source may be terminated by a sentinel
//! symbol outside the alphabet so that copy patterns cannot propagate
//! across source boundaries.

use std::path::PathBuf;

use crate::errors::{TfResult, TfoldError};

/// How input bytes map to symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolMode {
    /// One symbol per byte, alphabet size 256.
    #[default]
    Byte,
    /// Eight symbols per byte, MSB first, alphabet size 2.
    Bit,
}

impl SymbolMode {
    /// The alphabet size of this mode.
    pub fn alphabet(self) -> u32 {
        match self {
            SymbolMode::Byte => 256,
            SymbolMode::Bit => 2,
        }
    }

    /// Symbols produced per input byte.
    pub fn symbols_per_byte(self) -> usize {
        match self {
            SymbolMode::Byte => 1,
            SymbolMode::Bit => 8,
        }
    }
}

/// One input source of a [`SourceSet`].
#[derive(Debug, Clone)]
pub enum InputSource {
    /// An in-memory byte buffer.
    Bytes(Vec<u8>),
    /// A filesystem path, read in full at materialisation.
    File(PathBuf),
}

impl InputSource {
    /// The raw bytes of this source, reading files in full.
    pub fn read_bytes(&self) -> TfResult<Vec<u8>> {
        match self {
            InputSource::Bytes(data) => Ok(data.clone()),
            InputSource::File(path) => {
                std::fs::read(path).map_err(|source| TfoldError::InputNotReadable {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// A configured collection of input sources.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    /// The sources, in input order.
    pub sources: Vec<InputSource>,
    /// Byte or bit symbols.
    pub mode: SymbolMode,
    /// Append a sentinel terminator to each source.
    pub sentinel: bool,
}

impl SourceSet {
    /// An empty source set in the given mode.
    pub fn new(mode: SymbolMode) -> Self {
        Self {
            sources: Vec::new(),
            mode,
            sentinel: false,
        }
    }

    /// Enables or disables sentinel terminators.
    pub fn with_sentinel(mut self, sentinel: bool) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Appends a source.
    pub fn push(&mut self, source: InputSource) {
        self.sources.push(source);
    }

    /// Materialises all sources, concatenated, into one sequence.
    pub fn materialise(&self) -> TfResult<Sequence> {
        Sequence::from_sources(&self.sources, self.mode, self.sentinel)
    }

    /// Materialises each source as its own sequence.
    pub fn materialise_each(&self) -> TfResult<Vec<Sequence>> {
        self.sources
            .iter()
            .map(|source| {
                Sequence::from_sources(std::slice::from_ref(source), self.mode, self.sentinel)
            })
            .collect()
    }
}

/// A materialised symbol sequence.
///
/// Owned by the engine instance that analyses it; event handlers receive it
/// as a borrow only.
#[derive(Debug, Clone)]
pub struct Sequence {
    symbols: Vec<u32>,
    alphabet: u32,
}

impl Sequence {
    /// Materialises `sources` into one concatenated sequence.
    ///
    /// Every appended sentinel takes a distinct symbol value at or above
    /// the alphabet size, so sentinels match neither input symbols nor
    /// each other.
    pub fn from_sources(
        sources: &[InputSource],
        mode: SymbolMode,
        sentinel: bool,
    ) -> TfResult<Self> {
        let alphabet = mode.alphabet();
        let mut symbols = Vec::new();
        let mut next_sentinel = alphabet;

        for (index, source) in sources.iter().enumerate() {
            let bytes = source.read_bytes()?;
            log::debug!(
                "materialising source #{index}: {} bytes, {:?} mode",
                bytes.len(),
                mode
            );

            let extra = bytes.len() * mode.symbols_per_byte() + usize::from(sentinel);
            symbols.try_reserve(extra)?;
            match mode {
                SymbolMode::Byte => symbols.extend(bytes.iter().map(|&b| u32::from(b))),
                SymbolMode::Bit => {
                    for byte in &bytes {
                        for shift in (0..8).rev() {
                            symbols.push(u32::from((byte >> shift) & 1));
                        }
                    }
                }
            }
            if sentinel {
                symbols.push(next_sentinel);
                next_sentinel += 1;
            }
        }

        Ok(Self { symbols, alphabet })
    }

    /// Materialises a single byte buffer without sentinels.
    pub fn from_bytes(data: &[u8], mode: SymbolMode) -> TfResult<Self> {
        Self::from_sources(&[InputSource::Bytes(data.to_vec())], mode, false)
    }

    /// The sentinel-separated concatenation used by the distance
    /// evaluator: `first`, a sentinel, `second`, and optionally a trailing
    /// sentinel after `second`.
    pub fn concatenated(
        first: &[u8],
        second: &[u8],
        mode: SymbolMode,
        trailing_sentinel: bool,
    ) -> TfResult<Self> {
        let sources = [
            InputSource::Bytes(first.to_vec()),
            InputSource::Bytes(second.to_vec()),
        ];
        let mut sequence = Self::from_sources(&sources, mode, true)?;
        if !trailing_sentinel {
            sequence.symbols.pop();
        }
        Ok(sequence)
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbol values.
    pub fn symbols(&self) -> &[u32] {
        &self.symbols
    }

    /// The alphabet size (sentinels sit above it).
    pub fn alphabet(&self) -> u32 {
        self.alphabet
    }

    /// The byte value at a symbol offset, if it has one.
    ///
    /// Sentinels and bit symbols carry no byte value.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        if self.alphabet != 256 {
            return None;
        }
        self.symbols
            .get(offset)
            .and_then(|&symbol| u8::try_from(symbol).ok())
    }
}
