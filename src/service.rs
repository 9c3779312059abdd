//! Stage-transition orchestration.
//!
//! The single entry point for moving an order through production: validate
//! the stage inputs, compute the successor stage, advance the state machine,
//! and persist the inputs and the new state as one unit. There is exactly
//! one success/failure result per call -- a failed transition is never
//! reported as success.

use chrono::Utc;
use tracing::{error, info};

use crate::error::{Result, WorkflowError};
use crate::graph;
use crate::models::flags::StageFlagSet;
use crate::models::ink::Decision;
use crate::models::inputs::StageInputs;
use crate::models::order::OrderWorkflowState;
use crate::storage::{OrderStore, RequestStore};

pub struct StageTransitionService<'a, O: OrderStore, R: RequestStore> {
    orders: &'a O,
    requests: &'a R,
}

impl<'a, O: OrderStore, R: RequestStore> StageTransitionService<'a, O, R> {
    pub fn new(orders: &'a O, requests: &'a R) -> Self {
        Self { orders, requests }
    }

    /// Register a new order at the `DESIGN` stage.
    ///
    /// The flag-set invariant (at least one true flag) is enforced by
    /// [`StageFlagSet::new`] before this is ever reachable.
    pub fn create_order(
        &self,
        order_id: &str,
        product_name: &str,
        flags: StageFlagSet,
        actor_id: &str,
    ) -> Result<OrderWorkflowState> {
        let state = OrderWorkflowState::new(order_id, product_name, flags, actor_id, Utc::now());
        self.orders.insert_order(&state)?;
        info!(order_id, "order registered at DESIGN");
        Ok(state)
    }

    /// Start the order's next stage.
    ///
    /// Validates `inputs` against the target stage's required-field set and,
    /// on the ink-consuming path, requires the referenced ink request to
    /// already be Approved -- all before any state mutation, so a failed
    /// call leaves no partial writes. Concurrent callers race on the
    /// optimistic expected-stage check in storage; the loser gets
    /// `Conflict` and should reload and retry once.
    pub fn start_stage(
        &self,
        order_id: &str,
        actor_id: &str,
        inputs: StageInputs,
    ) -> Result<OrderWorkflowState> {
        let mut state = self.orders.load_order(order_id)?;
        let expected = state.current_stage;

        let target = match graph::next_stage(order_id, expected, state.flags) {
            Ok(Some(stage)) => stage,
            Ok(None) => {
                return Err(WorkflowError::TerminalState {
                    order_id: order_id.to_string(),
                })
            }
            Err(err) => {
                // Integrity defect, not a user mistake. Log and halt.
                error!(order_id, stage = %expected, "current stage outside applicable sequence");
                return Err(err);
            }
        };

        inputs.validate_for(target)?;
        self.require_approved_ink(&inputs)?;

        state.advance(actor_id, Utc::now())?;
        self.orders.save_transition(&state, expected, &inputs)?;

        info!(order_id, actor = actor_id, from = %expected, to = %target, "stage started");
        Ok(state)
    }

    /// Cancel the in-flight design work and return the order to the design
    /// queue. The one allowed backward transition; the reversal is recorded
    /// in history with the given reason.
    pub fn return_to_design(
        &self,
        order_id: &str,
        actor_id: &str,
        reason: &str,
    ) -> Result<OrderWorkflowState> {
        let mut state = self.orders.load_order(order_id)?;
        let expected = state.current_stage;

        state.return_to_design(actor_id, Utc::now(), reason)?;
        self.orders.save_transition(&state, expected, &StageInputs::None)?;

        info!(order_id, actor = actor_id, from = %expected, reason, "order returned to design");
        Ok(state)
    }

    /// The gate itself decides requests; this service only checks that the
    /// decision already happened.
    fn require_approved_ink(&self, inputs: &StageInputs) -> Result<()> {
        let Some(request_id) = inputs.ink_request_id() else {
            return Ok(());
        };

        let request = self.requests.load_request(request_id)?;
        match request.decision {
            Decision::Approved { .. } => Ok(()),
            Decision::Pending => Err(WorkflowError::Validation(format!(
                "ink request {request_id} has not been approved yet"
            ))),
            Decision::Rejected { .. } => Err(WorkflowError::Validation(format!(
                "ink request {request_id} was rejected"
            ))),
        }
    }
}
