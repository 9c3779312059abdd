//! Thread-safe in-memory storage.
//!
//! The reference collaborator for tests and the concurrency vehicle: the
//! compare-and-set semantics the traits require are enforced under one
//! mutex per record family, so racing callers observe real conflicts.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::models::ink::{Availability, InkRequest, InkStockItem};
use crate::models::inputs::StageInputs;
use crate::models::order::OrderWorkflowState;
use crate::models::stage::Stage;
use crate::storage::{OrderStore, RequestStore, StockStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: Mutex<HashMap<String, OrderWorkflowState>>,
    /// Input records persisted alongside each transition, per order.
    inputs: Mutex<HashMap<String, Vec<(Stage, StageInputs)>>>,
    stock: Mutex<HashMap<String, InkStockItem>>,
    requests: Mutex<HashMap<Uuid, InkRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stock item, replacing any previous item with the barcode.
    pub fn put_stock(&self, item: InkStockItem) -> Result<()> {
        let mut stock = lock(&self.stock)?;
        stock.insert(item.barcode_id.clone(), item);
        Ok(())
    }

    /// The stage inputs recorded for an order's transitions, oldest first.
    pub fn recorded_inputs(&self, order_id: &str) -> Result<Vec<(Stage, StageInputs)>> {
        let inputs = lock(&self.inputs)?;
        Ok(inputs.get(order_id).cloned().unwrap_or_default())
    }
}

// A poisoned lock means a writer panicked mid-update; surface it as a
// backend failure instead of propagating the panic.
fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| WorkflowError::Backend("storage lock poisoned".to_string()))
}

impl OrderStore for MemoryStore {
    fn load_order(&self, order_id: &str) -> Result<OrderWorkflowState> {
        let orders = lock(&self.orders)?;
        orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "order",
                id: order_id.to_string(),
            })
    }

    fn insert_order(&self, state: &OrderWorkflowState) -> Result<()> {
        let mut orders = lock(&self.orders)?;
        if orders.contains_key(&state.order_id) {
            return Err(WorkflowError::Conflict(format!(
                "order {} already exists",
                state.order_id
            )));
        }
        orders.insert(state.order_id.clone(), state.clone());
        Ok(())
    }

    fn save_transition(
        &self,
        state: &OrderWorkflowState,
        expected_stage: Stage,
        inputs: &StageInputs,
    ) -> Result<()> {
        let mut orders = lock(&self.orders)?;
        let stored = orders
            .get_mut(&state.order_id)
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "order",
                id: state.order_id.clone(),
            })?;

        if stored.current_stage != expected_stage {
            return Err(WorkflowError::Conflict(format!(
                "order {} is at {}, expected {}",
                state.order_id, stored.current_stage, expected_stage
            )));
        }

        *stored = state.clone();
        drop(orders);

        let mut input_log = lock(&self.inputs)?;
        input_log
            .entry(state.order_id.clone())
            .or_default()
            .push((state.current_stage, inputs.clone()));
        Ok(())
    }
}

impl StockStore for MemoryStore {
    fn lookup_by_barcode(&self, barcode_id: &str) -> Result<InkStockItem> {
        let stock = lock(&self.stock)?;
        stock
            .get(barcode_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "stock item",
                id: barcode_id.to_string(),
            })
    }

    fn mark_consumed(&self, barcode_id: &str) -> Result<()> {
        let mut stock = lock(&self.stock)?;
        let item = stock
            .get_mut(barcode_id)
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "stock item",
                id: barcode_id.to_string(),
            })?;

        if item.availability == Availability::Consumed {
            return Err(WorkflowError::AlreadyConsumed {
                barcode_id: barcode_id.to_string(),
            });
        }
        item.availability = Availability::Consumed;
        Ok(())
    }

    fn release(&self, barcode_id: &str) -> Result<()> {
        let mut stock = lock(&self.stock)?;
        let item = stock
            .get_mut(barcode_id)
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "stock item",
                id: barcode_id.to_string(),
            })?;
        item.availability = Availability::Available;
        Ok(())
    }
}

impl RequestStore for MemoryStore {
    fn load_request(&self, request_id: Uuid) -> Result<InkRequest> {
        let requests = lock(&self.requests)?;
        requests
            .get(&request_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "ink request",
                id: request_id.to_string(),
            })
    }

    fn insert_request(&self, request: &InkRequest) -> Result<()> {
        let mut requests = lock(&self.requests)?;
        requests.insert(request.id, request.clone());
        Ok(())
    }

    fn save_decision(&self, request: &InkRequest) -> Result<()> {
        let mut requests = lock(&self.requests)?;
        let stored = requests
            .get_mut(&request.id)
            .ok_or_else(|| WorkflowError::NotFound {
                kind: "ink request",
                id: request.id.to_string(),
            })?;

        // The decided-once check must run against the stored record, under
        // the lock. An approver holding a stale pending snapshot loses here.
        if !stored.decision.is_pending() {
            return Err(WorkflowError::AlreadyDecided {
                request_id: request.id.to_string(),
            });
        }
        *stored = request.clone();
        Ok(())
    }
}
