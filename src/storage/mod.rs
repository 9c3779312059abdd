//! Storage collaborator seams.
//!
//! The core never owns persistence; it talks to order, stock, and request
//! storage through these traits. All calls are synchronous and atomic from
//! the core's perspective. Two reference implementations ship with the
//! crate: [`memory::MemoryStore`] and [`json::JsonStore`].

use uuid::Uuid;

use crate::error::Result;
use crate::models::ink::{InkRequest, InkStockItem};
use crate::models::inputs::StageInputs;
use crate::models::order::OrderWorkflowState;
use crate::models::stage::Stage;

pub mod json;
pub mod memory;

/// Order workflow-state storage.
pub trait OrderStore {
    fn load_order(&self, order_id: &str) -> Result<OrderWorkflowState>;

    /// Insert a freshly created order. Fails with `Conflict` if the id is
    /// already taken.
    fn insert_order(&self, state: &OrderWorkflowState) -> Result<()>;

    /// Persist one transition: the updated state plus its stage-specific
    /// input values, as one unit.
    ///
    /// `expected_stage` is the optimistic check: the write must fail with
    /// `Conflict` if the stored order is no longer at that stage, so that of
    /// two concurrent advances exactly one succeeds.
    fn save_transition(
        &self,
        state: &OrderWorkflowState,
        expected_stage: Stage,
        inputs: &StageInputs,
    ) -> Result<()>;
}

/// Physical ink stock storage, keyed by barcode.
pub trait StockStore {
    /// Fails with `NotFound` for an unknown barcode.
    fn lookup_by_barcode(&self, barcode_id: &str) -> Result<InkStockItem>;

    /// Flip the item available → consumed. Compare-and-set: fails with
    /// `AlreadyConsumed` if the flip already happened, so two concurrent
    /// approvals of one barcode produce exactly one winner.
    fn mark_consumed(&self, barcode_id: &str) -> Result<()>;

    /// Flip the item back consumed → available. Used only to undo a
    /// `mark_consumed` whose enclosing approval could not be persisted;
    /// a no-op on an item that is already available.
    fn release(&self, barcode_id: &str) -> Result<()>;
}

/// Ink request storage. Requests are never deleted (audit trail).
pub trait RequestStore {
    fn load_request(&self, request_id: Uuid) -> Result<InkRequest>;

    fn insert_request(&self, request: &InkRequest) -> Result<()>;

    /// Persist a decided request. Compare-and-set on the stored decision:
    /// fails with `AlreadyDecided` if the stored request is no longer
    /// pending, so of two approvers racing one request exactly one decision
    /// lands.
    fn save_decision(&self, request: &InkRequest) -> Result<()>;
}
