//! Production workflow engine for manufacturing orders.
//!
//! This crate owns the rules that move an order through the production line
//! (Design → Print → Cutting → DTF → Sewing → done), derived from the
//! per-order product-type flags, plus the barcode-validated approval gate
//! that authorizes consuming ink stock against a logical request.
//!
//! Persistence, HTTP routing, authentication, and rendering live outside this
//! crate; the core talks to them through the traits in [`storage`].

pub mod approval;
pub mod error;
pub mod graph;
pub mod models;
pub mod queue;
pub mod service;
pub mod storage;

pub use error::{Result, WorkflowError};
