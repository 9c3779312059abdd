use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::models::stage::Stage;

/// Stage-specific input values captured when a stage is started.
///
/// The API layer used to accept loosely-shaped payloads with optional
/// fields; here each stage family has a tagged variant with its required
/// fields, validated at the service boundary before any state mutation.
///
/// Transitions into ready/done stages carry no stage-specific fields and
/// use [`StageInputs::None`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum StageInputs {
    None,

    /// Required when entering `PRINTING`.
    Print {
        paper_gsm: u32,
        paper_width_mm: u32,
        file_width_mm: u32,
        rip_operator: String,
        /// Set on the ink-consuming path; must reference an approved request.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ink_request_id: Option<Uuid>,
    },

    /// Required when entering `CUTTING`.
    Cutting {
        machine: String,
        speed: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ink_request_id: Option<Uuid>,
    },

    /// Required when entering `DTF`.
    Dtf { operator: String },

    /// Required when entering `SEWING`.
    Sewing { operator: String },
}

impl StageInputs {
    /// The ink request this transition consumes, if any.
    pub fn ink_request_id(&self) -> Option<Uuid> {
        match self {
            StageInputs::Print { ink_request_id, .. }
            | StageInputs::Cutting { ink_request_id, .. } => *ink_request_id,
            _ => None,
        }
    }

    /// Validate this record against the required-field set of the target
    /// stage. Fails with `Validation` on a variant/stage mismatch or a
    /// missing field, before any state is touched.
    pub fn validate_for(&self, target: Stage) -> Result<()> {
        match (target, self) {
            (
                Stage::Printing,
                StageInputs::Print {
                    paper_gsm,
                    paper_width_mm,
                    file_width_mm,
                    rip_operator,
                    ..
                },
            ) => {
                require_positive("paper GSM", *paper_gsm)?;
                require_positive("paper width", *paper_width_mm)?;
                require_positive("file width", *file_width_mm)?;
                require_text("RIP operator", rip_operator)?;
                Ok(())
            }
            (Stage::Cutting, StageInputs::Cutting { machine, speed, .. }) => {
                require_text("machine", machine)?;
                require_positive("speed", *speed)?;
                Ok(())
            }
            (Stage::Dtf, StageInputs::Dtf { operator })
            | (Stage::Sewing, StageInputs::Sewing { operator }) => {
                require_text("operator", operator)
            }
            (
                Stage::Design
                | Stage::PrintReady
                | Stage::PrintDone
                | Stage::CuttingReady
                | Stage::CuttingDone
                | Stage::DtfReady
                | Stage::DtfDone
                | Stage::SewingReady
                | Stage::SewingDone
                | Stage::ProductionDone,
                StageInputs::None,
            ) => Ok(()),
            (target, inputs) => Err(WorkflowError::Validation(format!(
                "inputs {} do not apply to stage {target}",
                inputs.variant_name()
            ))),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            StageInputs::None => "none",
            StageInputs::Print { .. } => "print",
            StageInputs::Cutting { .. } => "cutting",
            StageInputs::Dtf { .. } => "dtf",
            StageInputs::Sewing { .. } => "sewing",
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_positive(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(WorkflowError::Validation(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}
