//! The fixed directed graph of production stages.
//!
//! The graph is not a pluggable rule language: the stage families and their
//! order (PRINT → CUTTING → DTF → SEWING) are the fixed production sequence
//! of this business. An order's applicable sequence is derived purely from
//! its [`StageFlagSet`]; `next_stage` walks that sequence one step forward.

use crate::error::{Result, WorkflowError};
use crate::models::flags::StageFlagSet;
use crate::models::stage::Stage;

const PRINT_FAMILY: &[Stage] = &[Stage::PrintReady, Stage::Printing, Stage::PrintDone];
const CUTTING_FAMILY: &[Stage] = &[Stage::CuttingReady, Stage::Cutting, Stage::CuttingDone];
const DTF_FAMILY: &[Stage] = &[Stage::DtfReady, Stage::Dtf, Stage::DtfDone];
const SEWING_FAMILY: &[Stage] = &[Stage::SewingReady, Stage::Sewing, Stage::SewingDone];

/// Compute the ordered sequence of stages an order must visit.
///
/// Pure and deterministic. The sequence always starts with `DESIGN` and ends
/// with `PRODUCTION_DONE`. Single-flag orders short-circuit through their one
/// family; otherwise the sequence is the union of the families for every true
/// flag in the fixed production order. PRESS work runs on the print line, so
/// the PRESS flag routes through the print family.
pub fn applicable_stages(flags: StageFlagSet) -> Vec<Stage> {
    let mut stages = vec![Stage::Design];

    if flags.is_print_only() || flags.is_press_only() {
        stages.extend_from_slice(PRINT_FAMILY);
    } else if flags.is_cutting_only() {
        stages.extend_from_slice(CUTTING_FAMILY);
    } else {
        if flags.uses_print_line() {
            stages.extend_from_slice(PRINT_FAMILY);
        }
        if flags.cutting {
            stages.extend_from_slice(CUTTING_FAMILY);
        }
        if flags.dtf {
            stages.extend_from_slice(DTF_FAMILY);
        }
        if flags.sewing {
            stages.extend_from_slice(SEWING_FAMILY);
        }
    }

    stages.push(Stage::ProductionDone);
    stages
}

/// Return the stage immediately following `current` in the order's
/// applicable sequence, or `None` when `current` is the last stage.
///
/// A `current` outside the applicable sequence means the order's flags
/// changed after creation or the row is corrupted; that surfaces as
/// `IllegalState` and must never be silently coerced.
pub fn next_stage(order_id: &str, current: Stage, flags: StageFlagSet) -> Result<Option<Stage>> {
    let sequence = applicable_stages(flags);
    let index = sequence
        .iter()
        .position(|&s| s == current)
        .ok_or(WorkflowError::IllegalState {
            order_id: order_id.to_string(),
            stage: current,
        })?;

    Ok(sequence.get(index + 1).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(print: bool, press: bool, cutting: bool, dtf: bool, sewing: bool) -> StageFlagSet {
        StageFlagSet::new(print, press, cutting, dtf, sewing).unwrap()
    }

    // =========================================================================
    // applicable_stages tests
    // =========================================================================

    #[test]
    fn test_print_only_short_circuit() {
        assert_eq!(
            applicable_stages(flags(true, false, false, false, false)),
            vec![
                Stage::Design,
                Stage::PrintReady,
                Stage::Printing,
                Stage::PrintDone,
                Stage::ProductionDone,
            ]
        );
    }

    #[test]
    fn test_press_only_runs_on_print_line() {
        assert_eq!(
            applicable_stages(flags(false, true, false, false, false)),
            vec![
                Stage::Design,
                Stage::PrintReady,
                Stage::Printing,
                Stage::PrintDone,
                Stage::ProductionDone,
            ]
        );
    }

    #[test]
    fn test_cutting_only_short_circuit() {
        assert_eq!(
            applicable_stages(flags(false, false, true, false, false)),
            vec![
                Stage::Design,
                Stage::CuttingReady,
                Stage::Cutting,
                Stage::CuttingDone,
                Stage::ProductionDone,
            ]
        );
    }

    #[test]
    fn test_full_flag_set_visits_every_family_in_order() {
        let sequence = applicable_stages(flags(true, false, true, true, true));
        assert_eq!(
            sequence,
            vec![
                Stage::Design,
                Stage::PrintReady,
                Stage::Printing,
                Stage::PrintDone,
                Stage::CuttingReady,
                Stage::Cutting,
                Stage::CuttingDone,
                Stage::DtfReady,
                Stage::Dtf,
                Stage::DtfDone,
                Stage::SewingReady,
                Stage::Sewing,
                Stage::SewingDone,
                Stage::ProductionDone,
            ]
        );
    }

    #[test]
    fn test_print_and_press_together_visit_print_family_once() {
        let sequence = applicable_stages(flags(true, true, false, false, false));
        assert_eq!(
            sequence,
            vec![
                Stage::Design,
                Stage::PrintReady,
                Stage::Printing,
                Stage::PrintDone,
                Stage::ProductionDone,
            ]
        );
    }

    #[test]
    fn test_sewing_only_skips_print_and_cutting() {
        let sequence = applicable_stages(flags(false, false, false, false, true));
        assert_eq!(
            sequence,
            vec![
                Stage::Design,
                Stage::SewingReady,
                Stage::Sewing,
                Stage::SewingDone,
                Stage::ProductionDone,
            ]
        );
    }

    #[test]
    fn test_every_flag_combination_starts_design_ends_done_no_duplicates() {
        // All 31 flag sets with at least one true flag.
        for bits in 1u8..32 {
            let f = flags(
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
                bits & 16 != 0,
            );
            let sequence = applicable_stages(f);
            assert_eq!(sequence.first(), Some(&Stage::Design), "flags {f:?}");
            assert_eq!(sequence.last(), Some(&Stage::ProductionDone), "flags {f:?}");

            let mut seen = std::collections::HashSet::new();
            for stage in &sequence {
                assert!(seen.insert(stage), "duplicate {stage} for flags {f:?}");
            }
        }
    }

    // =========================================================================
    // next_stage tests
    // =========================================================================

    #[test]
    fn test_next_stage_walks_sequence() {
        let f = flags(true, false, false, false, false);
        assert_eq!(
            next_stage("SPK-1", Stage::Design, f).unwrap(),
            Some(Stage::PrintReady)
        );
        assert_eq!(
            next_stage("SPK-1", Stage::PrintDone, f).unwrap(),
            Some(Stage::ProductionDone)
        );
    }

    #[test]
    fn test_next_stage_at_terminal_returns_none() {
        let f = flags(true, false, false, false, false);
        assert_eq!(next_stage("SPK-1", Stage::ProductionDone, f).unwrap(), None);
    }

    #[test]
    fn test_next_stage_is_pure() {
        let f = flags(true, false, true, false, false);
        let first = next_stage("SPK-1", Stage::PrintDone, f).unwrap();
        let second = next_stage("SPK-1", Stage::PrintDone, f).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Some(Stage::CuttingReady));
    }

    #[test]
    fn test_next_stage_rejects_inapplicable_current() {
        let f = flags(true, false, false, false, false);
        let result = next_stage("SPK-1", Stage::SewingReady, f);
        assert!(matches!(
            result,
            Err(WorkflowError::IllegalState { stage: Stage::SewingReady, .. })
        ));
    }

    #[test]
    fn test_print_press_order_never_visits_cutting_or_dtf() {
        let f = flags(true, true, false, false, false);
        let mut current = Stage::Design;
        while let Some(next) = next_stage("SPK-1", current, f).unwrap() {
            assert!(!matches!(
                next.family(),
                crate::models::stage::StageFamily::Cutting
                    | crate::models::stage::StageFamily::Dtf
            ));
            current = next;
        }
        assert_eq!(current, Stage::ProductionDone);
    }
}
