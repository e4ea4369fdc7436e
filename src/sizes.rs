//! Output size negotiation.
//!
//! Picks the supported resolution that best fits a requested aspect ratio,
//! bounded below by the preview view and above by the caller's max size.

use crate::errors::PreviewError;
use crate::types::{AspectRatio, Resolution, SizeConstraints};

/// Choose the optimal output size from `candidates`.
///
/// 1. Keep candidates within the max bounds whose ratio matches `ratio` exactly.
/// 2. Among those, prefer the ones covering the preview dimensions.
/// 3. Return the largest by area from the preferred group, else from the rest.
/// 4. If nothing matched the ratio, return `candidates[0]` unchanged, even
///    though it may not have the requested ratio.
///
/// Equal areas resolve to the candidate seen first.
///
/// # Errors
/// [`PreviewError::InvalidInput`] when `candidates` is empty or holds a
/// zero-sized entry, when a max bound is zero, or when `ratio` has a zero
/// component.
pub fn select_optimal(
    candidates: &[Resolution],
    constraints: &SizeConstraints,
    ratio: &AspectRatio,
) -> Result<Resolution, PreviewError> {
    let first = candidates.first().copied().ok_or_else(|| {
        PreviewError::InvalidInput("no candidate output sizes to choose from".to_string())
    })?;
    for size in candidates {
        size.validate()?;
    }
    constraints.validate()?;
    ratio.validate()?;

    let mut big_enough: Option<Resolution> = None;
    let mut not_big_enough: Option<Resolution> = None;

    for size in candidates
        .iter()
        .filter(|size| constraints.fits_max(size) && ratio.matches(size))
    {
        let slot = if constraints.covers_preview(size) {
            &mut big_enough
        } else {
            &mut not_big_enough
        };
        keep_larger(slot, *size);
    }

    let chosen = match (big_enough, not_big_enough) {
        (Some(size), _) => size,
        (None, Some(size)) => size,
        (None, None) => {
            log::warn!(
                "No output size matches {} within {}x{}, falling back to {}",
                ratio,
                constraints.max_width,
                constraints.max_height,
                first
            );
            first
        }
    };

    crate::assert_invariant!(
        candidates.contains(&chosen),
        "selected size is one of the candidates",
        "sizes::select_optimal"
    );
    log::debug!("Selected output size {} for ratio {}", chosen, ratio);
    Ok(chosen)
}

// Strictly larger only, so the earliest candidate wins ties.
fn keep_larger(slot: &mut Option<Resolution>, size: Resolution) {
    match slot {
        Some(best) if best.area() >= size.area() => {}
        _ => *slot = Some(size),
    }
}
