//! Extract browser actions from free-form advisory text, match them against a
//! structural page snapshot, and verify them through an automation server.

pub mod advisor;
pub mod cli;
pub mod extract;
pub mod report;
pub mod safety;
pub mod session;
pub mod snapshot;
pub mod trace;
pub mod validate;

pub use extract::candidate::{ActionCandidate, ActionKind};
pub use extract::extractor::extract;
pub use safety::filter::{FilterOutcome, SafetyFilter};
pub use session::error::SessionError;
pub use session::session::AutomationSession;
pub use snapshot::matcher::{MatchStrategy, MatchedAction, match_all, match_candidate};
pub use snapshot::snapshot_model::{StructuralElement, StructuralSnapshot};
pub use validate::orchestrator::{ActionSession, SnapshotSource, Validator, validate};
pub use validate::report::{ConfidenceTier, ValidationOutcome, ValidationReport};
