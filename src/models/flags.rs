use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// Per-order product-type flags.
///
/// Immutable once the order is created; the flags decide which production
/// stages the order must visit. An order with no true flag is invalid and is
/// rejected here, at construction, so it never reaches stage computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageFlagSet {
    pub print: bool,
    pub press: bool,
    pub cutting: bool,
    pub dtf: bool,
    pub sewing: bool,
}

impl StageFlagSet {
    pub fn new(print: bool, press: bool, cutting: bool, dtf: bool, sewing: bool) -> Result<Self> {
        if !(print || press || cutting || dtf || sewing) {
            return Err(WorkflowError::InvalidFlagSet);
        }
        Ok(Self {
            print,
            press,
            cutting,
            dtf,
            sewing,
        })
    }

    /// "PRINT ONLY" orders short-circuit straight through the print family.
    pub fn is_print_only(&self) -> bool {
        self.print && !self.press && !self.cutting && !self.dtf && !self.sewing
    }

    /// "PRESS ONLY" orders run on the print line but are hidden from the
    /// print work queue by the name predicate.
    pub fn is_press_only(&self) -> bool {
        self.press && !self.print && !self.cutting && !self.dtf && !self.sewing
    }

    pub fn is_cutting_only(&self) -> bool {
        self.cutting && !self.print && !self.press && !self.dtf && !self.sewing
    }

    /// Whether the order visits the print stage family at all.
    /// PRESS work runs on the print line, so either flag routes through it.
    pub fn uses_print_line(&self) -> bool {
        self.print || self.press
    }
}
