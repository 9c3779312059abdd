pub mod flags;
pub mod ink;
pub mod inputs;
pub mod order;
pub mod stage;

pub use flags::StageFlagSet;
pub use inputs::StageInputs;
pub use ink::{Availability, Decision, InkRequest, InkSpec, InkStockItem};
pub use order::{HistoryEntry, OrderWorkflowState};
pub use stage::{Stage, StageFamily};
