use std::io::Write;
use std::sync::Arc;

use futures::Stream;
use parking_lot::Mutex;

use crate::domain::{Account, Error, Operation};

pub type SharedAccount = Arc<Mutex<Account>>;

pub trait OperationStream {
    type OpStream: Stream<Item = Result<Operation, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::OpStream;
}

pub trait DeadLetterQueue {
    fn report(&self, error: &Error);
}

pub trait AccountRepository {
    /// Returns the account registered under `account_id`, registering a
    /// zero-valued one first on a miss.
    fn get_or_create_account(&self, account_id: &str) -> SharedAccount;

    fn flush<W: Write>(&self, writer: W) -> Result<(), Error>;
}
