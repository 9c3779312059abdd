use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};
use crate::graph;
use crate::models::flags::StageFlagSet;
use crate::models::stage::Stage;

/// One visit to a stage in an order's history.
///
/// The history is append-only: entries are closed by setting `exited_at`,
/// never removed. The last entry has `exited_at == None` iff its stage is
/// the order's current stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub stage: Stage,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub actor_id: String,
    /// Set only on the explicit return-to-design reversal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The workflow state machine instance bound to one order.
///
/// Owned by, and only mutated through, the
/// [`StageTransitionService`](crate::service::StageTransitionService).
/// Initial stage is `DESIGN`; terminal is `PRODUCTION_DONE`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderWorkflowState {
    /// The order's work-order reference (SPK). Opaque to the core.
    pub order_id: String,
    /// Product/category name; feeds the work-queue name predicates only.
    pub product_name: String,
    pub flags: StageFlagSet,
    pub current_stage: Stage,
    pub entered_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

impl OrderWorkflowState {
    /// Create a fresh order at the `DESIGN` stage with one open history entry.
    pub fn new(
        order_id: impl Into<String>,
        product_name: impl Into<String>,
        flags: StageFlagSet,
        actor_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let actor_id = actor_id.into();
        Self {
            order_id: order_id.into(),
            product_name: product_name.into(),
            flags,
            current_stage: Stage::Design,
            entered_at: now,
            history: vec![HistoryEntry {
                stage: Stage::Design,
                entered_at: now,
                exited_at: None,
                actor_id,
                reason: None,
            }],
        }
    }

    /// Advance to the next applicable stage.
    ///
    /// Closes the open history entry and appends one for the successor
    /// computed by [`graph::next_stage`]. Fails with `TerminalState` on a
    /// completed order and propagates `IllegalState` untouched -- a current
    /// stage outside the applicable sequence is data corruption, not
    /// something to coerce.
    pub fn advance(&mut self, actor_id: &str, now: DateTime<Utc>) -> Result<Stage> {
        if self.current_stage.is_terminal() {
            return Err(WorkflowError::TerminalState {
                order_id: self.order_id.clone(),
            });
        }

        let next = graph::next_stage(&self.order_id, self.current_stage, self.flags)?
            .ok_or_else(|| WorkflowError::TerminalState {
                order_id: self.order_id.clone(),
            })?;

        self.enter(next, actor_id, now, None);
        Ok(next)
    }

    /// The one allowed backward edge: cancel the in-flight work and return
    /// the order to the design queue, regardless of graph adjacency.
    ///
    /// Records the reversal in history with a reason tag. Any other backward
    /// move is rejected by the graph as it only ever walks forward.
    pub fn return_to_design(
        &mut self,
        actor_id: &str,
        now: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<()> {
        if self.current_stage.is_terminal() {
            return Err(WorkflowError::TerminalState {
                order_id: self.order_id.clone(),
            });
        }

        self.enter(Stage::Design, actor_id, now, Some(reason.into()));
        Ok(())
    }

    /// Attempt a transition to an explicit target stage.
    ///
    /// Only two moves are legal: forward by exactly one applicable stage,
    /// or the Design return edge. Backward moves and stage skips fail with
    /// `DisallowedTransition` -- reported to the caller, never silently
    /// ignored.
    pub fn transition_to(
        &mut self,
        target: Stage,
        actor_id: &str,
        now: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<()> {
        if target == Stage::Design {
            let reason = reason.unwrap_or_else(|| "returned to design queue".to_string());
            return self.return_to_design(actor_id, now, reason);
        }

        if self.current_stage.is_terminal() {
            return Err(WorkflowError::TerminalState {
                order_id: self.order_id.clone(),
            });
        }

        match graph::next_stage(&self.order_id, self.current_stage, self.flags)? {
            Some(next) if next == target => {
                self.enter(target, actor_id, now, None);
                Ok(())
            }
            _ => Err(WorkflowError::DisallowedTransition {
                from: self.current_stage,
                to: target,
            }),
        }
    }

    fn enter(
        &mut self,
        stage: Stage,
        actor_id: &str,
        now: DateTime<Utc>,
        reason: Option<String>,
    ) {
        if let Some(open) = self.history.last_mut() {
            if open.exited_at.is_none() {
                open.exited_at = Some(now);
            }
        }
        self.history.push(HistoryEntry {
            stage,
            entered_at: now,
            exited_at: None,
            actor_id: actor_id.to_string(),
            reason,
        });
        self.current_stage = stage;
        self.entered_at = now;
    }
}
