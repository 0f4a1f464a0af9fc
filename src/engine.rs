use std::io::Write;

use futures::StreamExt;
use tracing::{debug, info};

use crate::domain::{
    Balance, Error, Operation, OperationKind,
    traits::{AccountRepository, DeadLetterQueue, OperationStream},
};

/// Counts of a finished replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    pub applied: usize,
    pub rejected: usize,
}

#[derive(Debug)]
pub struct Engine<I, R, D>
where
    I: OperationStream,
    R: AccountRepository,
    D: DeadLetterQueue,
{
    ingestion: I,
    repository: R,
    dlq: D,
}

impl<I, R, D> Engine<I, R, D>
where
    I: OperationStream,
    R: AccountRepository,
    D: DeadLetterQueue,
{
    pub fn new(ingestion: I, repository: R, dlq: D) -> Self {
        Self {
            ingestion,
            repository,
            dlq,
        }
    }

    pub async fn process(&mut self) -> Result<ProcessReport, Error> {
        let mut report = ProcessReport::default();
        let mut ops = self.ingestion.stream();

        while let Some(op) = ops.next().await {
            match op.and_then(|op| self.apply_operation(&op)) {
                Ok(_) => report.applied += 1,
                Err(e) => {
                    report.rejected += 1;
                    self.dlq.report(&e);
                }
            }
        }

        info!(
            applied = report.applied,
            rejected = report.rejected,
            "Replay finished"
        );
        Ok(report)
    }

    /// Applies one operation while holding the lock of its account only.
    pub fn apply_operation(&self, op: &Operation) -> Result<Balance, Error> {
        let account = self.repository.get_or_create_account(&op.account_id);
        let mut account = account.lock();

        let result = match &op.kind {
            OperationKind::Debit { amount } => account.debit(*amount),
            OperationKind::Block { key, amount } => account.block(key, *amount),
            OperationKind::BlockNoFix { amount } => account.block_no_fix(*amount),
            OperationKind::Unblock { key, amount } => account.unblock(key, *amount),
            OperationKind::UnblockNoFix { amount } => account.unblock_no_fix(*amount),
            OperationKind::Credit { key, amount } => account.credit(key, *amount),
            OperationKind::WriteOff { amount } => account.write_off(*amount),
        };

        match result {
            Ok(balance) => {
                debug!(
                    available = balance.available,
                    blocked = balance.blocked,
                    "Applied {}",
                    op
                );
                Ok(balance)
            }
            Err(source) => Err(Error::Account {
                account_id: op.account_id.clone(),
                source,
            }),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn dlq(&self) -> &D {
        &self.dlq
    }

    pub fn flush<W: Write>(&self, writer: W) -> Result<(), Error> {
        self.repository.flush(writer)
    }
}
