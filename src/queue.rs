//! Work-queue visibility predicates.
//!
//! Each stage's work queue applies two independent filters before showing an
//! order as actionable: a flag-based applicability check and a product-name
//! check. They are exposed separately so the list-view layer can compose
//! them; [`visible_in_queue`] is the composition the current screens use.
//!
//! The name rules compensate for legacy rows with incomplete flags (an order
//! whose product name contains "CUTTING" is cutting-eligible even without
//! the flag). Precedence between flags and names is deliberately not
//! resolved here; changing it is a stakeholder call.

use crate::models::flags::StageFlagSet;
use crate::models::order::OrderWorkflowState;

/// Literal product names excluded from the print work queue.
const PRINT_QUEUE_EXCLUSIONS: &[&str] = &["PRESS ONLY", "CUTTING ONLY"];

/// Literal product name excluded from the cutting pending list.
const CUTTING_QUEUE_EXCLUSION: &str = "CUTTING ONLY";

/// The work queues the list-view layer renders, one per stage family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkQueue {
    Design,
    Print,
    Cutting,
    Dtf,
    Sewing,
}

/// Flag-based applicability: does this order's flag set route it through the
/// queue's stage family at all?
///
/// PRESS-only orders run on the print line but never appear in the print
/// queue; they are dispatched from their own list.
pub fn applicable_by_flags(queue: WorkQueue, flags: StageFlagSet) -> bool {
    match queue {
        WorkQueue::Design => true,
        WorkQueue::Print => flags.uses_print_line() && !flags.is_press_only(),
        WorkQueue::Cutting => flags.cutting,
        WorkQueue::Dtf => flags.dtf,
        WorkQueue::Sewing => flags.sewing,
    }
}

/// Name-based admission: literal exclusions observed per queue.
///
/// Comparison is case-insensitive on the trimmed product name.
pub fn admitted_by_name(queue: WorkQueue, product_name: &str) -> bool {
    let name = product_name.trim().to_uppercase();
    match queue {
        WorkQueue::Print => !PRINT_QUEUE_EXCLUSIONS.contains(&name.as_str()),
        WorkQueue::Cutting => name != CUTTING_QUEUE_EXCLUSION,
        WorkQueue::Design | WorkQueue::Dtf | WorkQueue::Sewing => true,
    }
}

/// Legacy fallback: a product name containing "CUTTING" marks the order
/// cutting-eligible even when its cutting flag is unset.
pub fn name_marks_cutting(product_name: &str) -> bool {
    product_name.to_uppercase().contains("CUTTING")
}

/// The composition the list views apply before showing an order as
/// actionable in a queue.
///
/// For the cutting queue the flag check and the name heuristic are OR-ed
/// (legacy rows lack flags), then the literal exclusion is applied on top.
/// Queue visibility never feeds `next_stage`: hiding an order from a queue
/// does not change its applicable sequence.
pub fn visible_in_queue(queue: WorkQueue, order: &OrderWorkflowState) -> bool {
    match queue {
        WorkQueue::Cutting => {
            (applicable_by_flags(queue, order.flags) || name_marks_cutting(&order.product_name))
                && admitted_by_name(queue, &order.product_name)
        }
        _ => {
            applicable_by_flags(queue, order.flags) && admitted_by_name(queue, &order.product_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(product_name: &str, flags: StageFlagSet) -> OrderWorkflowState {
        OrderWorkflowState::new("SPK-9", product_name, flags, "designer-1", Utc::now())
    }

    fn flags(print: bool, press: bool, cutting: bool, dtf: bool, sewing: bool) -> StageFlagSet {
        StageFlagSet::new(print, press, cutting, dtf, sewing).unwrap()
    }

    #[test]
    fn test_print_queue_includes_print_orders() {
        let o = order("Jersey front", flags(true, false, false, false, false));
        assert!(visible_in_queue(WorkQueue::Print, &o));
    }

    #[test]
    fn test_press_only_flags_hidden_from_print_queue() {
        let f = flags(false, true, false, false, false);
        assert!(!applicable_by_flags(WorkQueue::Print, f));
    }

    #[test]
    fn test_press_only_name_overrides_print_flag_for_queue_visibility() {
        // Name-based exclusion wins for visibility even though PRINT is set;
        // next_stage computation is unaffected.
        let o = order("PRESS ONLY", flags(true, true, false, false, false));
        assert!(applicable_by_flags(WorkQueue::Print, o.flags));
        assert!(!admitted_by_name(WorkQueue::Print, &o.product_name));
        assert!(!visible_in_queue(WorkQueue::Print, &o));

        let next =
            crate::graph::next_stage(&o.order_id, o.current_stage, o.flags).unwrap();
        assert_eq!(next, Some(crate::models::Stage::PrintReady));
    }

    #[test]
    fn test_print_queue_name_exclusion_is_case_insensitive() {
        assert!(!admitted_by_name(WorkQueue::Print, "press only"));
        assert!(!admitted_by_name(WorkQueue::Print, " Cutting Only "));
        assert!(admitted_by_name(WorkQueue::Print, "Jersey PRESS edition"));
    }

    #[test]
    fn test_cutting_only_name_hidden_from_cutting_pending_list() {
        let o = order("CUTTING ONLY", flags(false, false, true, false, false));
        assert!(!visible_in_queue(WorkQueue::Cutting, &o));
    }

    #[test]
    fn test_cutting_name_fallback_admits_unflagged_order() {
        // Legacy row: no cutting flag, but the product name marks it.
        let o = order("Jersey CUTTING set", flags(true, false, false, false, false));
        assert!(!applicable_by_flags(WorkQueue::Cutting, o.flags));
        assert!(name_marks_cutting(&o.product_name));
        assert!(visible_in_queue(WorkQueue::Cutting, &o));
    }

    #[test]
    fn test_cutting_flag_admits_without_name_marker() {
        let o = order("Jersey set", flags(false, false, true, false, false));
        assert!(visible_in_queue(WorkQueue::Cutting, &o));
    }

    #[test]
    fn test_dtf_and_sewing_queues_are_flag_driven() {
        let o = order("Jersey set", flags(false, false, false, true, false));
        assert!(visible_in_queue(WorkQueue::Dtf, &o));
        assert!(!visible_in_queue(WorkQueue::Sewing, &o));
    }

    #[test]
    fn test_design_queue_shows_every_order() {
        let o = order("PRESS ONLY", flags(false, true, false, false, false));
        assert!(visible_in_queue(WorkQueue::Design, &o));
    }
}
