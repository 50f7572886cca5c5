//! Automação do portal do contribuinte SEFAZ-AL.
//!
//! The portal offers no API, so every operation is driven through the
//! rendered page: sign in, run the antecipado query for one or two target
//! months, screenshot the result card, and — when assessed documents exist —
//! walk the select-all → print → issue → confirm flow to download the
//! computed assessment and the collection document (DAR) as PDFs.
//!
//! # Example
//!
//! ```rust,ignore
//! use antecipado_robot::{read_accounts, BatchRunner, Robot, RunConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let accounts = read_accounts("input.csv").unwrap();
//!     let config = RunConfig::new("input.csv", "./output");
//!
//!     let mut robot = BatchRunner::new(config);
//!     let summary = robot.execute(&accounts).await.unwrap();
//!     println!("processed: {}", summary.processed);
//! }
//! ```

pub mod account;
pub mod batch;
pub mod config;
pub mod error;
pub mod period;
pub mod portal;
pub mod progress;
pub mod service;
pub mod traits;

pub use account::{read_accounts, Account};
pub use batch::{BatchRunner, BatchSummary};
pub use config::{RunConfig, StatusFilter};
pub use error::PortalError;
pub use period::{periods_for, QueryPeriod};
pub use progress::{Phase, ProgressSink};
pub use service::{BatchRequest, BatchService};
pub use traits::Robot;
