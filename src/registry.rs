use std::io::Write;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::{Account, AccountRepository, Balance, Error, SharedAccount};

/// In-memory registry of accounts keyed by identifier.
///
/// Each account sits behind its own lock, so callers working on different
/// accounts never wait on each other.
#[derive(Default, Debug)]
pub struct Accounts {
    accounts: DashMap<String, SharedAccount>,
}

#[derive(Debug, Serialize)]
struct AccountRow<'a> {
    account: &'a str,
    available: u64,
    blocked: u64,
    total: u128,
}

impl Accounts {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Looks up `account_id`, creating and storing a zero-valued account on
    /// a miss. Later lookups see the same account.
    pub fn get_or_create(&self, account_id: &str) -> SharedAccount {
        if let Some(account) = self.accounts.get(account_id) {
            return Arc::clone(account.value());
        }
        let entry = self
            .accounts
            .entry(account_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(Account::new())));
        Arc::clone(entry.value())
    }

    pub fn lookup(&self, account_id: &str) -> Option<SharedAccount> {
        self.accounts
            .get(account_id)
            .map(|account| Arc::clone(account.value()))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Balances of every account, sorted by identifier.
    pub fn snapshot(&self) -> Vec<(String, Balance)> {
        // collect handles first so no shard guard is held while locking accounts
        let handles: Vec<(String, SharedAccount)> = self
            .accounts
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut balances: Vec<(String, Balance)> = handles
            .into_iter()
            .map(|(id, account)| {
                let balance = account.lock().balance();
                (id, balance)
            })
            .collect();
        balances.sort_by(|a, b| a.0.cmp(&b.0));
        balances
    }

    /// Writes `account,available,blocked,total` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        let snapshot = self.snapshot();

        if snapshot.is_empty() {
            wtr.write_record(["account", "available", "blocked", "total"])?;
        }
        for (id, balance) in &snapshot {
            wtr.serialize(AccountRow {
                account: id,
                available: balance.available,
                blocked: balance.blocked,
                total: balance.total(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl AccountRepository for Accounts {
    fn get_or_create_account(&self, account_id: &str) -> SharedAccount {
        self.get_or_create(account_id)
    }

    fn flush<W: Write>(&self, writer: W) -> Result<(), Error> {
        self.write_csv(writer)
    }
}
