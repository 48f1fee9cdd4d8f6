//! # Normalised T-Distances
//!
//! Inter-sequence distances built on the transform: each compares a
//! quantity of the first input against the same quantity of the
//! sentinel-separated concatenation of both inputs. The sentinel keeps
//! copy patterns from propagating across the join, so the concatenated
//! run measures what the second input adds on top of the first.
//!
//! The raw ratios are not symmetric in their arguments; callers that need
//! a true metric should use the symmetrised variants, which average both
//! orders.

use crate::errors::TfResult;
use crate::input::{InputSource, Sequence, SymbolMode};
use crate::transform::TTransform;

/// Normalised T-information distance.
///
/// `1 - I(a) / I(a·b)`, clamped to `[0, 1]`, where `a·b` is the
/// concatenation with a sentinel terminator appended to `a`. Defined as
/// 1.0 when either input is empty.
pub fn ntid(a: &[u8], b: &[u8], mode: SymbolMode) -> TfResult<f64> {
    if a.is_empty() || b.is_empty() {
        return Ok(1.0);
    }
    let solo = TTransform::from_sequence(Sequence::from_bytes(a, mode)?).compute()?;
    let joined =
        TTransform::from_sequence(Sequence::concatenated(a, b, mode, false)?).compute()?;
    Ok(normalise(solo.information, joined.information))
}

/// Normalised T-complexity distance.
///
/// The analogous ratio on T-complexity. Every source carries a sentinel
/// terminator in this mode, including `a` on its own. Defined as 1.0 when
/// either input is empty.
pub fn ntcd(a: &[u8], b: &[u8], mode: SymbolMode) -> TfResult<f64> {
    if a.is_empty() || b.is_empty() {
        return Ok(1.0);
    }
    let solo_seq = Sequence::from_sources(&[InputSource::Bytes(a.to_vec())], mode, true)?;
    let solo = TTransform::from_sequence(solo_seq).compute()?;
    let joined = TTransform::from_sequence(Sequence::concatenated(a, b, mode, true)?).compute()?;
    Ok(normalise(solo.complexity, joined.complexity))
}

/// [`ntid`] averaged over both argument orders.
pub fn ntid_symmetric(a: &[u8], b: &[u8], mode: SymbolMode) -> TfResult<f64> {
    Ok((ntid(a, b, mode)? + ntid(b, a, mode)?) / 2.0)
}

/// [`ntcd`] averaged over both argument orders.
pub fn ntcd_symmetric(a: &[u8], b: &[u8], mode: SymbolMode) -> TfResult<f64> {
    Ok((ntcd(a, b, mode)? + ntcd(b, a, mode)?) / 2.0)
}

fn normalise(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 1.0;
    }
    (1.0 - part / whole).clamp(0.0, 1.0)
}
