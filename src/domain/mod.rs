pub mod account;
pub mod error;
pub mod operation;
pub mod traits;

pub use account::{Account, Balance};
pub use error::{AccountError, Error};
pub use operation::{Operation, OperationKind};
pub use traits::{AccountRepository, DeadLetterQueue, OperationStream, SharedAccount};
