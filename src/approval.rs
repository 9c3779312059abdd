//! The inventory-request approval protocol.
//!
//! A requester submits an ink request; an approver scans a physical barcode
//! that must match the request's specification exactly before the request
//! flips to Approved and the scanned stock unit is consumed. A spec mismatch
//! leaves the request Pending so the operator can scan a different unit.
//!
//! The stock flip is the linearization point: of two concurrent approvals of
//! one barcode, exactly one passes `mark_consumed`.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::models::ink::{Decision, InkRequest, InkSpec};
use crate::storage::{RequestStore, StockStore};

/// Bounded-retry policy for transient backend failures.
///
/// Backoff doubles per attempt from `base` up to `cap`. Validation failures
/// and conflicts are definitive and are never retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_millis(500),
            cap: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry (1-based): base * 2^(retry-1), capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let multiplier = 2u32.saturating_pow(retry - 1);
        self.base.saturating_mul(multiplier).min(self.cap)
    }
}

pub struct ApprovalGate<'a, S: StockStore, R: RequestStore> {
    stock: &'a S,
    requests: &'a R,
}

impl<'a, S: StockStore, R: RequestStore> ApprovalGate<'a, S, R> {
    pub fn new(stock: &'a S, requests: &'a R) -> Self {
        Self { stock, requests }
    }

    /// Create a `Pending` request. No side effects on stock.
    pub fn submit(
        &self,
        requester_id: &str,
        spec: InkSpec,
        notes: Option<String>,
    ) -> Result<InkRequest> {
        let request = InkRequest::new(requester_id, spec, notes, Utc::now());
        self.requests.insert_request(&request)?;
        info!(request_id = %request.id, requester = requester_id, "ink request submitted");
        Ok(request)
    }

    /// Approve a request against a scanned barcode.
    ///
    /// The stock item's {ink type, color, quantity, unit} must match the
    /// request exactly (case-insensitive). On mismatch the request stays
    /// Pending and the error carries a field-by-field diff for the operator.
    pub fn approve(
        &self,
        request_id: Uuid,
        approver_id: &str,
        barcode_id: &str,
    ) -> Result<InkRequest> {
        let mut request = self.requests.load_request(request_id)?;
        if !request.decision.is_pending() {
            return Err(WorkflowError::AlreadyDecided {
                request_id: request_id.to_string(),
            });
        }

        let stock_item = self.stock.lookup_by_barcode(barcode_id)?;
        if !request.spec.matches(&stock_item.spec) {
            let diff = request.spec.diff(&stock_item.spec).join("; ");
            warn!(request_id = %request_id, barcode = barcode_id, %diff, "barcode spec mismatch");
            return Err(WorkflowError::Validation(format!(
                "barcode {barcode_id} does not match the request: {diff}"
            )));
        }

        // Consume the physical unit first; this is the compare-and-set that
        // decides the winner between concurrent approvals of one barcode.
        self.stock.mark_consumed(barcode_id)?;

        request.decision = Decision::Approved {
            barcode_id: barcode_id.to_string(),
        };
        request.decided_by = Some(approver_id.to_string());
        request.decided_at = Some(Utc::now());

        // Hand the unit back if the decision cannot be persisted, whether a
        // backend failure or a lost decided-once race. The request stays
        // pending and the same barcode remains scannable on retry.
        if let Err(err) = self.requests.save_decision(&request) {
            if let Err(release_err) = self.stock.release(barcode_id) {
                warn!(
                    request_id = %request_id,
                    barcode = barcode_id,
                    error = %release_err,
                    "failed to release stock unit after decision save failure"
                );
            }
            return Err(err);
        }

        info!(
            request_id = %request_id,
            approver = approver_id,
            barcode = barcode_id,
            "ink request approved"
        );
        Ok(request)
    }

    /// Reject a pending request, with an optional free-text reason.
    pub fn reject(
        &self,
        request_id: Uuid,
        approver_id: &str,
        reason: Option<String>,
    ) -> Result<InkRequest> {
        let mut request = self.requests.load_request(request_id)?;
        if !request.decision.is_pending() {
            return Err(WorkflowError::AlreadyDecided {
                request_id: request_id.to_string(),
            });
        }

        request.decision = Decision::Rejected { reason };
        request.decided_by = Some(approver_id.to_string());
        request.decided_at = Some(Utc::now());
        self.requests.save_decision(&request)?;

        info!(request_id = %request_id, approver = approver_id, "ink request rejected");
        Ok(request)
    }

    /// `approve` with bounded retries on transient backend failures only.
    /// A `Validation` mismatch or any other definitive error returns
    /// immediately.
    pub fn approve_with_retry(
        &self,
        request_id: Uuid,
        approver_id: &str,
        barcode_id: &str,
        policy: RetryPolicy,
    ) -> Result<InkRequest> {
        let mut attempt = 0;
        loop {
            match self.approve(request_id, approver_id, barcode_id) {
                Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                    attempt += 1;
                    warn!(
                        request_id = %request_id,
                        attempt,
                        error = %err,
                        "transient failure approving ink request, backing off"
                    );
                    std::thread::sleep(policy.backoff(attempt));
                }
                other => return other,
            }
        }
    }
}
