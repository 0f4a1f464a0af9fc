//! Single-account balance engine with a two-phase reservation protocol.
//!
//! An [`Account`] tracks `available` and `blocked` funds. Funds are blocked
//! under a key and later either returned (`unblock`) or committed (`credit`).
//! The [`Accounts`] registry hands out per-account locked handles, and the
//! [`Engine`] replays a stream of operations against it.

pub mod config;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod registry;

pub use config::Config;
pub use dlq::TracingDlq;
pub use domain::{Account, AccountError, Balance, Error, Operation, OperationKind};
pub use engine::{Engine, ProcessReport};
pub use ingestion::CsvReader;
pub use registry::Accounts;
