use serde::{Deserialize, Serialize};

/// One discrete phase of production an order may pass through.
///
/// Not every stage applies to every order: applicability is derived from the
/// order's [`StageFlagSet`](crate::models::flags::StageFlagSet) by
/// [`graph::applicable_stages`](crate::graph::applicable_stages).
///
/// Serde aliases cover the spellings found in legacy storage rows
/// ("PRINT READY", "CUTTINGREADY", ...). Raw status strings from storage go
/// through [`Stage::from_raw`]; the core never compares raw strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    #[serde(rename = "design", alias = "DESIGN")]
    Design,

    #[serde(rename = "print-ready", alias = "PRINT READY", alias = "PRINTREADY")]
    PrintReady,

    #[serde(rename = "printing", alias = "PRINTING")]
    Printing,

    #[serde(rename = "print-done", alias = "PRINT DONE", alias = "PRINTDONE")]
    PrintDone,

    #[serde(
        rename = "cutting-ready",
        alias = "CUTTING READY",
        alias = "CUTTINGREADY"
    )]
    CuttingReady,

    #[serde(rename = "cutting", alias = "CUTTING")]
    Cutting,

    #[serde(rename = "cutting-done", alias = "CUTTING DONE", alias = "CUTTINGDONE")]
    CuttingDone,

    #[serde(rename = "dtf-ready", alias = "DTF READY", alias = "DTFREADY")]
    DtfReady,

    #[serde(rename = "dtf", alias = "DTF")]
    Dtf,

    #[serde(rename = "dtf-done", alias = "DTF DONE", alias = "DTFDONE")]
    DtfDone,

    #[serde(rename = "sewing-ready", alias = "SEWING READY", alias = "SEWINGREADY")]
    SewingReady,

    #[serde(rename = "sewing", alias = "SEWING")]
    Sewing,

    #[serde(rename = "sewing-done", alias = "SEWING DONE", alias = "SEWINGDONE")]
    SewingDone,

    #[serde(
        rename = "production-done",
        alias = "PRODUCTION DONE",
        alias = "PRODUCTIONDONE"
    )]
    ProductionDone,
}

/// The stage family a stage belongs to, used for queue routing and for
/// matching stage-specific input records to their target stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFamily {
    Design,
    Print,
    Cutting,
    Dtf,
    Sewing,
    Done,
}

impl Stage {
    /// Terminal stage: no further transitions are legal.
    pub fn is_terminal(&self) -> bool {
        *self == Stage::ProductionDone
    }

    pub fn family(&self) -> StageFamily {
        match self {
            Stage::Design => StageFamily::Design,
            Stage::PrintReady | Stage::Printing | Stage::PrintDone => StageFamily::Print,
            Stage::CuttingReady | Stage::Cutting | Stage::CuttingDone => StageFamily::Cutting,
            Stage::DtfReady | Stage::Dtf | Stage::DtfDone => StageFamily::Dtf,
            Stage::SewingReady | Stage::Sewing | Stage::SewingDone => StageFamily::Sewing,
            Stage::ProductionDone => StageFamily::Done,
        }
    }

    /// Normalize a raw status string from storage into the canonical enum.
    ///
    /// Legacy rows carry inconsistent casing and spacing ("PRINT READY",
    /// "CuttingReady", "CUTTINGREADY"). Matching ignores case, spaces,
    /// hyphens, and underscores. Returns `None` for unrecognized values so
    /// the storage adapter can surface them as data errors.
    pub fn from_raw(raw: &str) -> Option<Stage> {
        let key: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_uppercase();

        match key.as_str() {
            "DESIGN" => Some(Stage::Design),
            "PRINTREADY" => Some(Stage::PrintReady),
            "PRINTING" => Some(Stage::Printing),
            "PRINTDONE" => Some(Stage::PrintDone),
            "CUTTINGREADY" => Some(Stage::CuttingReady),
            "CUTTING" => Some(Stage::Cutting),
            "CUTTINGDONE" => Some(Stage::CuttingDone),
            "DTFREADY" => Some(Stage::DtfReady),
            "DTF" => Some(Stage::Dtf),
            "DTFDONE" => Some(Stage::DtfDone),
            "SEWINGREADY" => Some(Stage::SewingReady),
            "SEWING" => Some(Stage::Sewing),
            "SEWINGDONE" => Some(Stage::SewingDone),
            "PRODUCTIONDONE" => Some(Stage::ProductionDone),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Design => "DESIGN",
            Stage::PrintReady => "PRINT READY",
            Stage::Printing => "PRINTING",
            Stage::PrintDone => "PRINT DONE",
            Stage::CuttingReady => "CUTTING READY",
            Stage::Cutting => "CUTTING",
            Stage::CuttingDone => "CUTTING DONE",
            Stage::DtfReady => "DTF READY",
            Stage::Dtf => "DTF",
            Stage::DtfDone => "DTF DONE",
            Stage::SewingReady => "SEWING READY",
            Stage::Sewing => "SEWING",
            Stage::SewingDone => "SEWING DONE",
            Stage::ProductionDone => "PRODUCTION DONE",
        };
        write!(f, "{name}")
    }
}
