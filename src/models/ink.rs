use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The consumable specification shared by ink requests and stock items.
///
/// Quantity and unit stay strings on purpose: the matching rule is exact
/// equality as entered ("1000" vs "500"), not numeric comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InkSpec {
    pub ink_type: String,
    pub color: String,
    pub quantity: String,
    pub unit: String,
}

impl InkSpec {
    /// Exact match, case-insensitive on every field.
    pub fn matches(&self, other: &InkSpec) -> bool {
        fn eq(a: &str, b: &str) -> bool {
            a.trim().eq_ignore_ascii_case(b.trim())
        }
        eq(&self.ink_type, &other.ink_type)
            && eq(&self.color, &other.color)
            && eq(&self.quantity, &other.quantity)
            && eq(&self.unit, &other.unit)
    }

    /// Human-readable field-by-field diff for the operator when a scanned
    /// barcode does not match the request. Empty when the specs match.
    pub fn diff(&self, other: &InkSpec) -> Vec<String> {
        fn check(field: &str, requested: &str, scanned: &str, out: &mut Vec<String>) {
            if !requested.trim().eq_ignore_ascii_case(scanned.trim()) {
                out.push(format!(
                    "{field}: requested '{requested}', scanned '{scanned}'"
                ));
            }
        }
        let mut out = Vec::new();
        check("ink type", &self.ink_type, &other.ink_type, &mut out);
        check("color", &self.color, &other.color, &mut out);
        check("quantity", &self.quantity, &other.quantity, &mut out);
        check("unit", &self.unit, &other.unit, &mut out);
        out
    }
}

/// Decision state of an ink request.
///
/// A request is decided exactly once; both decided states are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Decision {
    Pending,
    /// Approved against a specific physical stock unit.
    Approved { barcode_id: String },
    Rejected { reason: Option<String> },
}

impl Decision {
    pub fn is_pending(&self) -> bool {
        matches!(self, Decision::Pending)
    }
}

/// A requester's ask for consumable ink stock, decided by an approver
/// scanning a physical barcode. Never deleted -- the audit trail keeps
/// every request, decided or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InkRequest {
    pub id: Uuid,
    pub requested_by: String,
    pub spec: InkSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl InkRequest {
    pub fn new(
        requested_by: impl Into<String>,
        spec: InkSpec,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requested_by: requested_by.into(),
            spec,
            notes,
            created_at: now,
            decision: Decision::Pending,
            decided_by: None,
            decided_at: None,
        }
    }
}

/// Availability of a physical stock unit. Flips available → consumed exactly
/// once; the storage layer enforces the compare-and-set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    Available,
    Consumed,
}

/// A physical ink unit identified by its barcode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InkStockItem {
    pub barcode_id: String,
    pub spec: InkSpec,
    pub availability: Availability,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cyan_liter() -> InkSpec {
        InkSpec {
            ink_type: "Sublimation Ink".to_string(),
            color: "CYAN".to_string(),
            quantity: "1000".to_string(),
            unit: "ml".to_string(),
        }
    }

    #[test]
    fn test_spec_matches_identical_fields() {
        assert!(cyan_liter().matches(&cyan_liter()));
    }

    #[test]
    fn test_spec_match_is_case_insensitive() {
        let scanned = InkSpec {
            ink_type: "sublimation ink".to_string(),
            color: "Cyan".to_string(),
            quantity: "1000".to_string(),
            unit: "ML".to_string(),
        };
        assert!(cyan_liter().matches(&scanned));
    }

    #[test]
    fn test_spec_mismatch_on_quantity() {
        let scanned = InkSpec {
            quantity: "500".to_string(),
            ..cyan_liter()
        };
        assert!(!cyan_liter().matches(&scanned));

        let diff = cyan_liter().diff(&scanned);
        assert_eq!(diff.len(), 1);
        assert!(diff[0].contains("quantity"));
        assert!(diff[0].contains("1000"));
        assert!(diff[0].contains("500"));
    }

    #[test]
    fn test_diff_lists_every_mismatched_field() {
        let scanned = InkSpec {
            ink_type: "Pigment Ink".to_string(),
            color: "MAGENTA".to_string(),
            ..cyan_liter()
        };
        let diff = cyan_liter().diff(&scanned);
        assert_eq!(diff.len(), 2);
    }

    #[test]
    fn test_new_request_is_pending_and_undecided() {
        let request = InkRequest::new("operator-7", cyan_liter(), None, Utc::now());
        assert!(request.decision.is_pending());
        assert!(request.decided_by.is_none());
        assert!(request.decided_at.is_none());
    }
}
