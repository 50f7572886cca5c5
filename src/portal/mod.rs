//! Page-level portal interactions.

pub mod capture;
pub mod issuance;
pub mod query;
pub mod selectors;
pub mod session;
pub mod wait;

pub use capture::ArtifactCapture;
pub use issuance::DocumentIssuanceFlow;
pub use query::{QueryExecutor, ResultPanel};
pub use session::{AuthOutcome, SessionController};
