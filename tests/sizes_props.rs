//! Property tests for output size selection.

use camera_preview::errors::PreviewError;
use camera_preview::sizes::select_optimal;
use camera_preview::types::{AspectRatio, Resolution, SizeConstraints};
use proptest::prelude::*;

fn resolution() -> impl Strategy<Value = Resolution> {
    prop_oneof![
        // Sizes built from common ratios so matches actually occur
        (1u32..=240, prop::sample::select(vec![(16u32, 9u32), (4, 3), (1, 1), (3, 2)]))
            .prop_map(|(scale, (w, h))| Resolution::new(w * scale, h * scale)),
        (1u32..=4096, 1u32..=4096).prop_map(|(w, h)| Resolution::new(w, h)),
    ]
}

fn ratio() -> impl Strategy<Value = AspectRatio> {
    prop::sample::select(vec![
        AspectRatio::WIDESCREEN,
        AspectRatio::STANDARD,
        AspectRatio::SQUARE,
        AspectRatio::new(3, 2),
    ])
}

fn constraints() -> impl Strategy<Value = SizeConstraints> {
    (1u32..=4096, 1u32..=4096, 1u32..=4096, 1u32..=4096).prop_map(|(pw, ph, mw, mh)| {
        SizeConstraints::new(Resolution::new(pw, ph), Resolution::new(mw, mh))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn selected_size_is_always_a_candidate(
        candidates in prop::collection::vec(resolution(), 1..20),
        constraints in constraints(),
        ratio in ratio(),
    ) {
        let chosen = select_optimal(&candidates, &constraints, &ratio).unwrap();
        prop_assert!(candidates.contains(&chosen));
    }

    #[test]
    fn selected_size_is_largest_preferred_match(
        candidates in prop::collection::vec(resolution(), 1..20),
        constraints in constraints(),
        ratio in ratio(),
    ) {
        let chosen = select_optimal(&candidates, &constraints, &ratio).unwrap();

        let matching: Vec<Resolution> = candidates
            .iter()
            .copied()
            .filter(|s| constraints.fits_max(s) && ratio.matches(s))
            .collect();
        let big_enough: Vec<Resolution> = matching
            .iter()
            .copied()
            .filter(|s| constraints.covers_preview(s))
            .collect();

        if matching.is_empty() {
            prop_assert_eq!(chosen, candidates[0]);
        } else {
            let pool = if big_enough.is_empty() { &matching } else { &big_enough };
            prop_assert!(pool.contains(&chosen));
            prop_assert!(pool.iter().all(|s| s.area() <= chosen.area()));
            // Ties resolve to the first candidate with the winning area
            let first_with_area = pool.iter().find(|s| s.area() == chosen.area()).copied();
            prop_assert_eq!(Some(chosen), first_with_area);
        }
    }

    #[test]
    fn selection_does_not_depend_on_unrelated_candidates(
        candidates in prop::collection::vec(resolution(), 1..10),
        constraints in constraints(),
    ) {
        // A candidate over the max bounds never changes the outcome unless it is first.
        let ratio = AspectRatio::WIDESCREEN;
        let baseline = select_optimal(&candidates, &constraints, &ratio).unwrap();
        let oversized = Resolution::new(
            (constraints.max_width + 1) * 16,
            (constraints.max_width + 1) * 9,
        );
        let mut extended = candidates.clone();
        extended.push(oversized);
        prop_assert_eq!(select_optimal(&extended, &constraints, &ratio).unwrap(), baseline);
    }
}

#[test]
fn test_widescreen_preview_scenario() {
    let candidates = [
        Resolution::new(4032, 3024),
        Resolution::new(1920, 1080),
        Resolution::new(1280, 720),
        Resolution::new(640, 480),
    ];
    let constraints = SizeConstraints::new(Resolution::new(1080, 1080), Resolution::new(3840, 3840));
    let chosen = select_optimal(&candidates, &constraints, &AspectRatio::WIDESCREEN).unwrap();
    assert_eq!(chosen, Resolution::new(1920, 1080));
}

#[test]
fn test_no_ratio_match_falls_back_to_first() {
    let candidates = [Resolution::new(800, 600), Resolution::new(640, 480)];
    let constraints = SizeConstraints::new(Resolution::new(100, 100), Resolution::new(3840, 3840));
    let chosen = select_optimal(&candidates, &constraints, &AspectRatio::WIDESCREEN).unwrap();
    assert_eq!(chosen, Resolution::new(800, 600));
}

#[test]
fn test_empty_candidates_is_invalid_input() {
    let constraints = SizeConstraints::new(Resolution::new(1, 1), Resolution::new(3840, 3840));
    let result = select_optimal(&[], &constraints, &AspectRatio::WIDESCREEN);
    assert!(matches!(result, Err(PreviewError::InvalidInput(_))));
}
