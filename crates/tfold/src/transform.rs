//! # T-Transform Core
//!
//! The level loop. Each level takes the token immediately preceding the
//! tail as its copy pattern and discovers the copy factor with the graph's
//! matcher: [`TokenGraph::find_match`] is chained backward from that
//! occurrence, and every hop that reports the previous occurrence
//! immediately adjacent extends the copy run by one. The level accumulates
//! `log2(copy_factor + 1)` into the complexity and rewrites the whole
//! token list in place: every maximal run of the pattern collapses into the
//! token that follows it, and every full run of `copy_factor + 1` pattern
//! tokens collapses into a single repetition token.
//!
//! Patterns longer than one input symbol are not a separate case: a
//! collapse produces a single token spanning the whole collapsed region,
//! and the next level's matcher chains those augmented tokens exactly as
//! it chains raw symbols. The two-symbol alternation `ABAB` is the
//! smallest example: level 1 collapses each `AB` pair, and level 2's
//! pattern is the two-symbol `AB` token, matched and collapsed as one
//! unit.
//!
//! Tokens produced from equal content must share a symbol class, or later
//! levels would miss their matches. Identity is resolved through the
//! same-class back-link chains: a collapsed token reuses the class of the
//! nearest earlier token that collapsed from the same run length and the
//! same follower class, and receives a fresh class when there is none. The
//! rewrite runs in two passes over the list (one to measure runs and
//! resolve identities against the still-unmodified chains, one to splice),
//! so resolution never observes its own edits.

use std::collections::HashMap;

use crate::errors::{TfResult, TfoldError};
use crate::events::{NoHandler, StepRecord, TransformHandler};
use crate::graph::{NIL, NodeId, TokenGraph};
use crate::input::{Sequence, SourceSet};
use crate::metrics;
use crate::numeric::{CompensatedSum, log2_fast};

/// Final quantities of a transform run.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Number of completed levels.
    pub levels: u32,
    /// Token list length when the run stopped.
    pub final_length: usize,
    /// T-complexity, in log2 units.
    pub complexity: f64,
    /// Raw T-information (`2^C - 1`); scale with [`crate::metrics::Unit`].
    pub information: f64,
    /// Raw average T-entropy rate of the last completed level.
    pub entropy: f64,
    /// Whether a handler stopped the run early. Partial results up to the
    /// last completed level are valid.
    pub cancelled: bool,
}

/// A T-transform engine instance over one materialised sequence.
///
/// The instance owns the sequence and all working memory; a run builds the
/// token graph, drives the level loop to exhaustion (or cancellation), and
/// releases the graph before returning. Runs on the same instance are
/// bit-exact repeatable. Independent instances are themselves independent:
/// they share only the read-only `log2` table.
#[derive(Debug, Clone)]
pub struct TTransform {
    sequence: Sequence,
}

impl TTransform {
    /// An engine over an already materialised sequence.
    pub fn from_sequence(sequence: Sequence) -> Self {
        Self { sequence }
    }

    /// Materialises a source set and wraps it in an engine.
    pub fn from_sources(sources: &SourceSet) -> TfResult<Self> {
        Ok(Self::from_sequence(sources.materialise()?))
    }

    /// The sequence this engine analyses.
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Runs the transform without observers.
    pub fn compute(&self) -> TfResult<TransformResult> {
        self.run(&mut NoHandler)
    }

    /// Runs the transform, reporting to `handler`.
    pub fn run<H: TransformHandler>(&self, handler: &mut H) -> TfResult<TransformResult> {
        let sequence = &self.sequence;
        let input_len = sequence.len();

        handler.init(sequence);

        let mut graph = TokenGraph::build(sequence.symbols())?;
        let mut complexity = CompensatedSum::new();
        let mut levels: u32 = 0;
        let mut cancelled = false;
        let mut entropy = 0.0;

        // Input offset where the tail token begins; each level moves it
        // down by the length of the region collapsed into the tail.
        let mut tail_start = input_len.saturating_sub(1);

        while graph.len() > 1 {
            levels += 1;

            let tail = graph.tail();
            let pattern_token = graph.prev(tail);
            let pattern = graph.class(pattern_token);

            // Copy factor: chain the matcher backward from the pattern
            // occurrence adjacent to the tail. Each hop that reports the
            // previous occurrence immediately adjacent extends the copy
            // run by one; a non-adjacent (or absent) earlier occurrence
            // ends it.
            let mut copy_factor: u64 = 1;
            let mut cursor = pattern_token;
            while let Some((previous, _)) = graph.find_match(cursor) {
                if previous != graph.prev(cursor) {
                    break;
                }
                copy_factor += 1;
                cursor = previous;
            }

            let cp_length = graph.span(pattern_token) as usize;
            let cp_start = tail_start - cp_length;
            let joined_length = copy_factor as usize * cp_length;

            complexity.add(log2_fast(copy_factor + 1));

            let before = graph.len();
            rewrite_level(&mut graph, pattern, copy_factor)?;
            debug_assert!(graph.len() < before);
            #[cfg(debug_assertions)]
            if let Err(violation) = graph.check_invariants() {
                log::debug!("token graph inconsistent after level {levels}: {violation}");
                return Err(TfoldError::Consistency(violation));
            }

            tail_start -= joined_length;

            let record = StepRecord {
                level: levels,
                copy_factor,
                cp_start,
                cp_length,
                joined_length,
                complexity: complexity.value(),
            };
            log::trace!(
                "level {levels}: cf={copy_factor} cp=({cp_start}, {cp_length}) joined={joined_length}"
            );

            entropy = metrics::average_entropy(
                metrics::t_information(complexity.value()),
                input_len,
                cp_start,
                cp_length,
                joined_length,
            );

            if handler.step(sequence, &record).is_break() {
                cancelled = true;
                break;
            }
            if input_len > 1 {
                handler.progress((input_len - 1 - tail_start) as f64 / (input_len - 1) as f64);
            }
        }

        let result = TransformResult {
            levels,
            final_length: graph.len(),
            complexity: complexity.value(),
            information: metrics::t_information(complexity.value()),
            entropy,
            cancelled,
        };
        log::debug!(
            "transform finished: {} symbols, {} levels, c={}",
            input_len,
            result.levels,
            result.complexity
        );

        handler.finish(sequence, &result);
        Ok(result)
    }
}

/// Run measurement for one collapse boundary.
struct RunNote {
    /// Pattern tokens immediately preceding (and for a full repetition,
    /// including) the boundary token.
    len: u64,
    /// First token of the region to collapse.
    start: NodeId,
    /// Class of the collapsed token.
    class: u32,
    /// Nearest earlier token of that class, or [`NIL`].
    link: NodeId,
}

/// Collapses every run of `pattern` tokens in one level.
///
/// Greedy left-to-right: runs of `copy_factor + 1` pattern tokens become
/// repetition tokens; any shorter run collapses with the token that follows
/// it. The defining run before the tail is consumed by the same walk.
fn rewrite_level(graph: &mut TokenGraph, pattern: u32, copy_factor: u64) -> TfResult<()> {
    let full = copy_factor + 1;
    let mut notes: HashMap<NodeId, RunNote> = HashMap::new();

    // Measurement pass: find run boundaries and resolve the class of every
    // collapsed token against the untouched back-link chains.
    let mut run_len: u64 = 0;
    let mut run_start: NodeId = NIL;
    let mut repetition_class: u32 = 0;
    let mut last_repetition: NodeId = NIL;

    let mut cur = graph.head();
    while cur != NIL {
        if graph.class(cur) == pattern {
            if run_len == 0 {
                run_start = cur;
            }
            run_len += 1;
            if run_len == full {
                let (class, link) = if last_repetition == NIL {
                    repetition_class = graph.fresh_class();
                    (repetition_class, NIL)
                } else {
                    (repetition_class, last_repetition)
                };
                notes.insert(
                    cur,
                    RunNote {
                        len: run_len,
                        start: run_start,
                        class,
                        link,
                    },
                );
                last_repetition = cur;
                run_len = 0;
            }
        } else {
            if run_len > 0 {
                let (class, link) = resolve_collapse(graph, &notes, cur, run_len);
                notes.insert(
                    cur,
                    RunNote {
                        len: run_len,
                        start: run_start,
                        class,
                        link,
                    },
                );
                run_len = 0;
            }
        }
        cur = graph.next(cur);
    }
    if run_len != 0 {
        log::debug!("unterminated pattern run of {run_len} at end of list");
        return Err(TfoldError::Consistency("pattern run at end of list"));
    }

    // Splice pass. Regions never overlap and each ends at its boundary
    // token, so walking forward over the survivors visits every note once.
    let mut cur = graph.head();
    while cur != NIL {
        let next = graph.next(cur);
        if let Some(note) = notes.get(&cur) {
            graph.splice_linked(note.start, cur, note.class, note.link, NIL);
        }
        cur = next;
    }

    Ok(())
}

/// Class and back-link for a run collapsing into the token at `boundary`.
///
/// Walks the boundary token's back-link chain for the nearest earlier token
/// of the same class that collapses from the same run length this level;
/// such a token carries identical content, so the new token joins its
/// class. A chain miss means the content is new and gets a fresh class.
fn resolve_collapse(
    graph: &mut TokenGraph,
    notes: &HashMap<NodeId, RunNote>,
    boundary: NodeId,
    run_len: u64,
) -> (u32, NodeId) {
    let mut cur = graph.prev_same(boundary);
    while cur != NIL {
        if let Some(note) = notes.get(&cur) {
            if note.len == run_len {
                return (note.class, cur);
            }
        }
        cur = graph.prev_same(cur);
    }
    (graph.fresh_class(), NIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SymbolMode;
    use std::ops::ControlFlow;

    fn engine(text: &[u8]) -> TTransform {
        TTransform::from_sequence(Sequence::from_bytes(text, SymbolMode::Byte).unwrap())
    }

    /// Collects step records and optionally stops after a given level.
    #[derive(Default)]
    struct Recorder {
        steps: Vec<StepRecord>,
        ratios: Vec<f64>,
        stop_after: Option<u32>,
    }

    impl TransformHandler for Recorder {
        fn step(&mut self, _: &Sequence, record: &StepRecord) -> ControlFlow<()> {
            self.steps.push(record.clone());
            match self.stop_after {
                Some(level) if record.level >= level => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        }

        fn progress(&mut self, ratio: f64) {
            self.ratios.push(ratio);
        }
    }

    #[test]
    fn test_empty_input() {
        let result = engine(b"").compute().unwrap();
        assert_eq!(result.levels, 0);
        assert_eq!(result.final_length, 0);
        assert_eq!(result.complexity, 0.0);
        assert_eq!(result.information, 0.0);
    }

    #[test]
    fn test_single_symbol() {
        let result = engine(b"A").compute().unwrap();
        assert_eq!(result.levels, 0);
        assert_eq!(result.final_length, 1);
        assert_eq!(result.complexity, 0.0);
    }

    #[test]
    fn test_constant_input_single_level() {
        let mut recorder = Recorder::default();
        let result = engine(b"AAAA").run(&mut recorder).unwrap();

        assert_eq!(result.levels, 1);
        assert_eq!(result.final_length, 1);
        assert_eq!(result.complexity, 2.0);
        assert_eq!(result.information, 3.0);

        assert_eq!(
            recorder.steps,
            vec![StepRecord {
                level: 1,
                copy_factor: 3,
                cp_start: 2,
                cp_length: 1,
                joined_length: 3,
                complexity: 2.0,
            }]
        );
    }

    #[test]
    fn test_constant_input_copy_factor_law() {
        for n in 2..40usize {
            let result = engine(&vec![b'x'; n]).compute().unwrap();
            assert_eq!(result.levels, 1, "n = {n}");
            assert_eq!(result.complexity, (n as f64).log2(), "n = {n}");
            assert_eq!(result.final_length, 1);
        }
    }

    #[test]
    fn test_all_distinct_symbols() {
        let mut recorder = Recorder::default();
        let result = engine(b"ABCDEFGH").run(&mut recorder).unwrap();

        assert_eq!(result.levels, 7);
        assert_eq!(result.complexity, 7.0);
        assert_eq!(result.final_length, 1);
        assert!(recorder.steps.iter().all(|s| s.copy_factor == 1));

        // The pattern offset walks down the input one symbol per level.
        let offsets: Vec<usize> = recorder.steps.iter().map(|s| s.cp_start).collect();
        assert_eq!(offsets, vec![6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_alternating_pair() {
        let mut recorder = Recorder::default();
        let result = engine(b"ABAB").run(&mut recorder).unwrap();

        // Level 1 collapses each "AB"; level 2 collapses the repetition.
        assert_eq!(result.levels, 2);
        assert_eq!(result.complexity, 2.0);
        assert_eq!(result.final_length, 1);
        assert_eq!(recorder.steps[0].copy_factor, 1);
        assert_eq!(recorder.steps[1].copy_factor, 1);
        assert_eq!(recorder.steps[1].cp_length, 2);
    }

    #[test]
    fn test_longer_alternation() {
        let result = engine(b"ABABABAB").compute().unwrap();
        assert_eq!(result.levels, 2);
        assert_eq!(result.complexity, 3.0);
    }

    #[test]
    fn test_mixed_runs_and_repetitions() {
        let mut recorder = Recorder::default();
        let result = engine(b"AAABAAB").run(&mut recorder).unwrap();

        // Level 1: pattern "A" with copy factor 2; the leading "AAA"
        // collapses as a full repetition, "AAB" as run-plus-follower.
        // Levels 2 and 3 consume the remaining three tokens pairwise.
        assert_eq!(result.levels, 3);
        assert!((result.complexity - 12.0f64.log2()).abs() < 1e-12);
        assert_eq!(recorder.steps[0].copy_factor, 2);
        assert_eq!(recorder.steps[0].cp_start, 5);
        assert_eq!(recorder.steps[1].cp_start, 3);
        assert_eq!(recorder.steps[2].cp_start, 0);
        assert_eq!(recorder.steps[2].cp_length, 3);
    }

    #[test]
    fn test_bit_mode_matches_byte_topology() {
        // 0xAA unpacks to 10101010, the two-class alternation.
        let bits = TTransform::from_sequence(
            Sequence::from_bytes(&[0xAA], SymbolMode::Bit).unwrap(),
        );
        let bytes = engine(b"ABABABAB");

        let bit_result = bits.compute().unwrap();
        let byte_result = bytes.compute().unwrap();
        assert_eq!(bit_result.levels, byte_result.levels);
        assert_eq!(bit_result.complexity, byte_result.complexity);
    }

    #[test]
    fn test_repeat_runs_are_bit_exact() {
        let engine = engine(b"the quick brown fox jumps over the lazy dog");
        let first = engine.compute().unwrap();
        let second = engine.compute().unwrap();
        assert_eq!(first.complexity.to_bits(), second.complexity.to_bits());
        assert_eq!(first.information.to_bits(), second.information.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_complexity_monotone_over_steps() {
        let mut recorder = Recorder::default();
        engine(b"abracadabra abracadabra").run(&mut recorder).unwrap();

        let mut previous = 0.0;
        for step in &recorder.steps {
            assert!(step.complexity >= previous);
            previous = step.complexity;
        }
    }

    #[test]
    fn test_progress_is_monotone_and_complete() {
        let mut recorder = Recorder::default();
        engine(b"mississippi").run(&mut recorder).unwrap();

        let mut previous = 0.0;
        for &ratio in &recorder.ratios {
            assert!((0.0..=1.0).contains(&ratio));
            assert!(ratio >= previous);
            previous = ratio;
        }
        assert_eq!(recorder.ratios.last().copied(), Some(1.0));
    }

    #[test]
    fn test_cancellation_keeps_partial_result() {
        let mut recorder = Recorder {
            stop_after: Some(1),
            ..Default::default()
        };
        let result = engine(b"ABCDEFGH").run(&mut recorder).unwrap();

        assert!(result.cancelled);
        assert_eq!(result.levels, 1);
        assert_eq!(result.complexity, 1.0);
        assert!(result.final_length > 1);
        assert_eq!(recorder.steps.len(), 1);
    }

    #[test]
    fn test_level_count_bounded_by_length() {
        for text in [&b"aababcabcd"[..], b"zzzzyzzzzy", b"0123456789"] {
            let result = engine(text).compute().unwrap();
            assert!((result.levels as usize) < text.len());
        }
    }

    #[test]
    fn test_sentinel_blocks_cross_source_matching() {
        let plain = Sequence::from_sources(
            &[crate::input::InputSource::Bytes(b"ABAB".to_vec())],
            SymbolMode::Byte,
            false,
        )
        .unwrap();
        let split = Sequence::from_sources(
            &[
                crate::input::InputSource::Bytes(b"AB".to_vec()),
                crate::input::InputSource::Bytes(b"AB".to_vec()),
            ],
            SymbolMode::Byte,
            true,
        )
        .unwrap();

        let joined = TTransform::from_sequence(plain).compute().unwrap();
        let separated = TTransform::from_sequence(split).compute().unwrap();

        // The sentinels keep the halves from collapsing into one another.
        assert!(separated.complexity > joined.complexity);
    }
}
