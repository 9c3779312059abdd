//! File-per-record JSON storage adapter.
//!
//! Each order, ink request, and stock item lives in one JSON document under
//! the data directory (`orders/`, `requests/`, `stock/`). Writes go through
//! a temp file and rename, so a crashed write never leaves a half-written
//! record behind.
//!
//! This adapter is also the status-string normalization boundary:
//! order documents store stage values as the legacy display strings
//! ("PRINT READY", and older rows "CUTTINGREADY"), and loading maps them
//! through [`Stage::from_raw`]. Unrecognized values are surfaced as backend
//! errors, never coerced.
//!
//! Read-check-write sequences (the stage check in `save_transition`, the
//! consumed check in `mark_consumed`, the pending check in `save_decision`)
//! hold an exclusive `fs2` advisory lock on a per-store lock file. The lock
//! is cooperative: all writers to one data directory must go through this
//! adapter for the checks to hold across processes.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use fs2::FileExt;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::models::flags::StageFlagSet;
use crate::models::ink::{Availability, InkRequest, InkStockItem};
use crate::models::inputs::StageInputs;
use crate::models::order::{HistoryEntry, OrderWorkflowState};
use crate::models::stage::Stage;
use crate::storage::{OrderStore, RequestStore, StockStore};

/// Maximum allowed length for record ids used in file names.
const MAX_ID_LENGTH: usize = 128;

pub struct JsonStore {
    root: PathBuf,
}

/// On-disk order document. Stage values are raw strings in the legacy
/// spelling; the adapter normalizes them on load.
#[derive(Debug, Serialize, Deserialize)]
struct OrderDoc {
    order_id: String,
    product_name: String,
    flags: StageFlagSet,
    status: String,
    entered_at: DateTime<Utc>,
    history: Vec<HistoryDoc>,
    #[serde(default)]
    transitions: Vec<TransitionDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDoc {
    status: String,
    entered_at: DateTime<Utc>,
    exited_at: Option<DateTime<Utc>>,
    actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Stage-input values persisted with each transition.
#[derive(Debug, Serialize, Deserialize)]
struct TransitionDoc {
    status: String,
    inputs: StageInputs,
}

impl JsonStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in ["orders", "requests", "stock"] {
            fs::create_dir_all(root.join(dir))
                .with_context(|| format!("failed to create {dir} directory"))
                .map_err(backend)?;
        }
        Ok(Self { root })
    }

    fn order_path(&self, order_id: &str) -> Result<PathBuf> {
        validate_record_id(order_id)?;
        Ok(self.root.join("orders").join(format!("{order_id}.json")))
    }

    fn request_path(&self, request_id: Uuid) -> PathBuf {
        self.root.join("requests").join(format!("{request_id}.json"))
    }

    fn stock_path(&self, barcode_id: &str) -> Result<PathBuf> {
        validate_record_id(barcode_id)?;
        Ok(self.root.join("stock").join(format!("{barcode_id}.json")))
    }

    /// Take the store-wide exclusive lock. Held for the lifetime of the
    /// returned handle; blocks until any other holder (thread or process)
    /// drops theirs.
    fn exclusive_lock(&self) -> Result<File> {
        let path = self.root.join(".lock");
        // Never truncated; the file exists only to carry the lock.
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))
            .map_err(backend)?;
        file.lock_exclusive()
            .with_context(|| format!("failed to acquire lock on {}", path.display()))
            .map_err(backend)?;
        Ok(file)
    }

    fn load_order_doc(&self, order_id: &str) -> Result<OrderDoc> {
        let path = self.order_path(order_id)?;
        if !path.exists() {
            return Err(WorkflowError::NotFound {
                kind: "order",
                id: order_id.to_string(),
            });
        }
        read_doc(&path).map_err(backend)
    }
}

/// IDs become file names; reject anything that could escape the data
/// directory or collide with reserved names.
fn validate_record_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(WorkflowError::Validation("record id cannot be empty".to_string()));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(WorkflowError::Validation(format!(
            "record id too long: {} characters (max {MAX_ID_LENGTH})",
            id.len()
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(WorkflowError::Validation(format!(
            "record id '{id}' contains characters not allowed in ids"
        )));
    }
    Ok(())
}

fn backend(err: anyhow::Error) -> WorkflowError {
    WorkflowError::Backend(format!("{err:#}"))
}

fn read_doc<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write via temp file + rename so readers never see a partial document.
fn write_doc<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(value).context("failed to serialize record")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

fn parse_stage(order_id: &str, raw: &str) -> Result<Stage> {
    Stage::from_raw(raw).ok_or_else(|| {
        WorkflowError::Backend(format!(
            "order {order_id}: unrecognized stage value '{raw}'"
        ))
    })
}

fn doc_to_state(doc: &OrderDoc) -> Result<OrderWorkflowState> {
    let mut history = Vec::with_capacity(doc.history.len());
    for entry in &doc.history {
        history.push(HistoryEntry {
            stage: parse_stage(&doc.order_id, &entry.status)?,
            entered_at: entry.entered_at,
            exited_at: entry.exited_at,
            actor_id: entry.actor_id.clone(),
            reason: entry.reason.clone(),
        });
    }
    Ok(OrderWorkflowState {
        order_id: doc.order_id.clone(),
        product_name: doc.product_name.clone(),
        flags: doc.flags,
        current_stage: parse_stage(&doc.order_id, &doc.status)?,
        entered_at: doc.entered_at,
        history,
    })
}

fn state_to_doc(state: &OrderWorkflowState, transitions: Vec<TransitionDoc>) -> OrderDoc {
    OrderDoc {
        order_id: state.order_id.clone(),
        product_name: state.product_name.clone(),
        flags: state.flags,
        status: state.current_stage.to_string(),
        entered_at: state.entered_at,
        history: state
            .history
            .iter()
            .map(|entry| HistoryDoc {
                status: entry.stage.to_string(),
                entered_at: entry.entered_at,
                exited_at: entry.exited_at,
                actor_id: entry.actor_id.clone(),
                reason: entry.reason.clone(),
            })
            .collect(),
        transitions,
    }
}

impl OrderStore for JsonStore {
    fn load_order(&self, order_id: &str) -> Result<OrderWorkflowState> {
        let doc = self.load_order_doc(order_id)?;
        doc_to_state(&doc)
    }

    fn insert_order(&self, state: &OrderWorkflowState) -> Result<()> {
        let path = self.order_path(&state.order_id)?;
        if path.exists() {
            return Err(WorkflowError::Conflict(format!(
                "order {} already exists",
                state.order_id
            )));
        }
        write_doc(&path, &state_to_doc(state, Vec::new())).map_err(backend)
    }

    fn save_transition(
        &self,
        state: &OrderWorkflowState,
        expected_stage: Stage,
        inputs: &StageInputs,
    ) -> Result<()> {
        let _guard = self.exclusive_lock()?;
        let stored = self.load_order_doc(&state.order_id)?;
        let stored_stage = parse_stage(&state.order_id, &stored.status)?;
        if stored_stage != expected_stage {
            return Err(WorkflowError::Conflict(format!(
                "order {} is at {stored_stage}, expected {expected_stage}",
                state.order_id
            )));
        }

        let mut transitions = stored.transitions;
        transitions.push(TransitionDoc {
            status: state.current_stage.to_string(),
            inputs: inputs.clone(),
        });

        let path = self.order_path(&state.order_id)?;
        write_doc(&path, &state_to_doc(state, transitions)).map_err(backend)
    }
}

impl StockStore for JsonStore {
    fn lookup_by_barcode(&self, barcode_id: &str) -> Result<InkStockItem> {
        let path = self.stock_path(barcode_id)?;
        if !path.exists() {
            return Err(WorkflowError::NotFound {
                kind: "stock item",
                id: barcode_id.to_string(),
            });
        }
        read_doc(&path).map_err(backend)
    }

    fn mark_consumed(&self, barcode_id: &str) -> Result<()> {
        let _guard = self.exclusive_lock()?;
        let mut item = self.lookup_by_barcode(barcode_id)?;
        if item.availability == Availability::Consumed {
            return Err(WorkflowError::AlreadyConsumed {
                barcode_id: barcode_id.to_string(),
            });
        }
        item.availability = Availability::Consumed;
        let path = self.stock_path(barcode_id)?;
        write_doc(&path, &item).map_err(backend)
    }

    fn release(&self, barcode_id: &str) -> Result<()> {
        let _guard = self.exclusive_lock()?;
        let mut item = self.lookup_by_barcode(barcode_id)?;
        item.availability = Availability::Available;
        let path = self.stock_path(barcode_id)?;
        write_doc(&path, &item).map_err(backend)
    }
}

impl JsonStore {
    /// Seed a stock item, replacing any previous item with the barcode.
    pub fn put_stock(&self, item: &InkStockItem) -> Result<()> {
        let path = self.stock_path(&item.barcode_id)?;
        write_doc(&path, item).map_err(backend)
    }
}

impl RequestStore for JsonStore {
    fn load_request(&self, request_id: Uuid) -> Result<InkRequest> {
        let path = self.request_path(request_id);
        if !path.exists() {
            return Err(WorkflowError::NotFound {
                kind: "ink request",
                id: request_id.to_string(),
            });
        }
        read_doc(&path).map_err(backend)
    }

    fn insert_request(&self, request: &InkRequest) -> Result<()> {
        write_doc(&self.request_path(request.id), request).map_err(backend)
    }

    fn save_decision(&self, request: &InkRequest) -> Result<()> {
        let _guard = self.exclusive_lock()?;
        let stored = self.load_request(request.id)?;
        if !stored.decision.is_pending() {
            return Err(WorkflowError::AlreadyDecided {
                request_id: request.id.to_string(),
            });
        }
        write_doc(&self.request_path(request.id), request).map_err(backend)
    }
}
