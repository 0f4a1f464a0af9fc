use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::domain::error::AccountError;

/// `(available, blocked)` pair returned by every balance operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub available: u64,
    pub blocked: u64,
}

impl Balance {
    pub fn new(available: u64, blocked: u64) -> Self {
        Self { available, blocked }
    }

    pub fn total(&self) -> u128 {
        u128::from(self.available) + u128::from(self.blocked)
    }
}

impl core::fmt::Display for Balance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "available={}, blocked={}", self.available, self.blocked)
    }
}

/// Funds of a single account.
///
/// Two reservation styles share the same balances. The keyed group
/// (`block`, `unblock`, `credit`) records every reservation under a
/// caller-chosen key and only releases it for the exact amount. The
/// key-less group (`block_no_fix`, `unblock_no_fix`) only moves funds
/// between `available` and `blocked`; the caller tracks identity itself.
/// `blocked` equals the sum of open reservations as long as an account
/// sticks to the keyed group.
#[derive(Debug, Default)]
pub struct Account {
    available: u64,
    blocked: u64,
    reservations: HashMap<String, u64>,
}

impl Account {
    pub fn new() -> Self {
        Self {
            available: 0,
            blocked: 0,
            reservations: HashMap::new(),
        }
    }

    pub fn available(&self) -> u64 {
        self.available
    }

    pub fn blocked(&self) -> u64 {
        self.blocked
    }

    pub fn balance(&self) -> Balance {
        Balance::new(self.available, self.blocked)
    }

    pub fn total(&self) -> u128 {
        self.balance().total()
    }

    /// Amount currently blocked under `key`, if the reservation is open.
    pub fn reservation(&self, key: &str) -> Option<u64> {
        self.reservations.get(key).copied()
    }

    pub fn reservations(&self) -> impl Iterator<Item = (&str, u64)> {
        self.reservations.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn reserved_total(&self) -> u128 {
        self.reservations.values().map(|v| u128::from(*v)).sum()
    }

    /// Adds `amount` to the available funds (deposit).
    pub fn debit(&mut self, amount: u64) -> Result<Balance, AccountError> {
        let available = self
            .available
            .checked_add(amount)
            .ok_or_else(|| self.overflow("debit", amount))?;

        self.available = available;
        Ok(self.balance())
    }

    /// Reserves `amount` of the available funds under `key`.
    pub fn block(&mut self, key: &str, amount: u64) -> Result<Balance, AccountError> {
        let balance = self.balance();

        let slot = match self.reservations.entry(key.to_owned()) {
            Entry::Occupied(_) => {
                return Err(AccountError::DuplicateKey {
                    key: key.to_owned(),
                    balance,
                });
            }
            Entry::Vacant(slot) => slot,
        };

        let (available, blocked) = Self::reserve(balance, "block", amount)?;

        slot.insert(amount);
        self.available = available;
        self.blocked = blocked;
        Ok(self.balance())
    }

    /// Same as [`Account::block`] without recording a key.
    pub fn block_no_fix(&mut self, amount: u64) -> Result<Balance, AccountError> {
        let (available, blocked) = Self::reserve(self.balance(), "block_no_fix", amount)?;

        self.available = available;
        self.blocked = blocked;
        Ok(self.balance())
    }

    /// Returns the reservation under `key` to the available funds.
    pub fn unblock(&mut self, key: &str, amount: u64) -> Result<Balance, AccountError> {
        self.check_reservation(key, amount)?;
        let (available, blocked) = self.release("unblock", amount)?;

        self.reservations.remove(key);
        self.available = available;
        self.blocked = blocked;
        Ok(self.balance())
    }

    /// Returns `amount` of blocked funds to the available funds without a
    /// key check. Pairs with an earlier [`Account::block_no_fix`].
    pub fn unblock_no_fix(&mut self, amount: u64) -> Result<Balance, AccountError> {
        let (available, blocked) = self.release("unblock_no_fix", amount)?;

        self.available = available;
        self.blocked = blocked;
        Ok(self.balance())
    }

    /// Commits the reservation under `key`: the funds leave the account.
    pub fn credit(&mut self, key: &str, amount: u64) -> Result<Balance, AccountError> {
        self.check_reservation(key, amount)?;
        let blocked = self
            .blocked
            .checked_sub(amount)
            .ok_or_else(|| self.overflow("credit", amount))?;

        self.reservations.remove(key);
        self.blocked = blocked;
        Ok(self.balance())
    }

    /// Takes `amount` straight out of the available funds, without a prior
    /// reservation.
    pub fn write_off(&mut self, amount: u64) -> Result<Balance, AccountError> {
        if self.available < amount {
            return Err(AccountError::InsufficientFunds {
                required: amount,
                balance: self.balance(),
            });
        }
        // unreachable after the sufficiency check, kept as a safety net
        let available = self
            .available
            .checked_sub(amount)
            .ok_or_else(|| self.overflow("write_off", amount))?;

        self.available = available;
        Ok(self.balance())
    }

    fn reserve(
        balance: Balance,
        operation: &'static str,
        amount: u64,
    ) -> Result<(u64, u64), AccountError> {
        if balance.available < amount {
            return Err(AccountError::InsufficientFunds {
                required: amount,
                balance,
            });
        }
        let blocked = balance
            .blocked
            .checked_add(amount)
            .ok_or(AccountError::Overflow {
                operation,
                amount,
                balance,
            })?;

        Ok((balance.available - amount, blocked))
    }

    fn release(&self, operation: &'static str, amount: u64) -> Result<(u64, u64), AccountError> {
        let available = self.available.checked_add(amount);
        let blocked = self.blocked.checked_sub(amount);

        match (available, blocked) {
            (Some(available), Some(blocked)) => Ok((available, blocked)),
            _ => Err(self.overflow(operation, amount)),
        }
    }

    fn check_reservation(&self, key: &str, amount: u64) -> Result<(), AccountError> {
        match self.reservations.get(key) {
            None => Err(AccountError::UnknownKey {
                key: key.to_owned(),
                balance: self.balance(),
            }),
            Some(&reserved) if reserved != amount => Err(AccountError::AmountMismatch {
                key: key.to_owned(),
                reserved,
                requested: amount,
                balance: self.balance(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn overflow(&self, operation: &'static str, amount: u64) -> AccountError {
        AccountError::Overflow {
            operation,
            amount,
            balance: self.balance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn funded(amount: u64) -> Account {
        let mut account = Account::new();
        account.debit(amount).unwrap();
        account
    }

    #[test]
    fn new_account_is_empty() {
        let account = Account::new();
        assert_eq!(account.balance(), Balance::new(0, 0));
        assert_eq!(account.reservations().count(), 0);
    }

    #[test]
    fn debit_at_max_overflows_and_keeps_state() {
        let mut account = funded(u64::MAX);

        let err = account.debit(1).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "debit", .. }));
        assert_eq!(err.balance(), Balance::new(u64::MAX, 0));
        assert_eq!(account.available(), u64::MAX);
    }

    #[test]
    fn debit_up_to_exact_max_is_accepted() {
        let mut account = funded(u64::MAX - 1);
        assert_eq!(account.debit(1).unwrap(), Balance::new(u64::MAX, 0));
    }

    #[test]
    fn block_moves_funds_under_key() {
        let mut account = funded(100);

        assert_eq!(account.block("k", 40).unwrap(), Balance::new(60, 40));
        assert_eq!(account.reservation("k"), Some(40));
    }

    #[test]
    fn block_more_than_available_fails() {
        let mut account = funded(50);

        let err = account.block("k", 100).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { required: 100, .. }));
        assert_eq!(account.balance(), Balance::new(50, 0));
        assert_eq!(account.reservation("k"), None);
    }

    #[test]
    fn block_reusing_open_key_fails() {
        let mut account = funded(100);
        account.block("k", 50).unwrap();

        let err = account.block("k", 20).unwrap_err();
        assert!(matches!(err, AccountError::DuplicateKey { .. }));
        assert_eq!(account.balance(), Balance::new(50, 50));
        assert_eq!(account.reservation("k"), Some(50));
    }

    #[test]
    fn duplicate_key_wins_over_insufficient_funds() {
        let mut account = funded(10);
        account.block("k", 10).unwrap();

        let err = account.block("k", 1_000).unwrap_err();
        assert!(matches!(err, AccountError::DuplicateKey { .. }));
    }

    #[test]
    fn block_overflowing_blocked_fails() {
        let mut account = funded(u64::MAX);
        account.block_no_fix(u64::MAX).unwrap();
        // refill available while blocked sits at MAX
        account.debit(5).unwrap();

        let err = account.block("b", 5).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "block", .. }));
        assert_eq!(account.balance(), Balance::new(5, u64::MAX));
        assert_eq!(account.reservation("b"), None);
    }

    #[test]
    fn key_can_be_reused_after_release() {
        let mut account = funded(100);
        account.block("k", 30).unwrap();
        account.unblock("k", 30).unwrap();

        assert_eq!(account.block("k", 70).unwrap(), Balance::new(30, 70));
    }

    #[test]
    fn block_then_unblock_restores_balances() {
        let mut account = funded(100);
        account.block_no_fix(10).unwrap();
        let before = account.balance();

        account.block("k", 25).unwrap();
        assert_eq!(account.unblock("k", 25).unwrap(), before);
        assert_eq!(account.reservation("k"), None);
    }

    #[test]
    fn unblock_with_wrong_amount_keeps_reservation() {
        let mut account = funded(100);
        account.block("k", 50).unwrap();

        let err = account.unblock("k", 30).unwrap_err();
        assert_eq!(
            err,
            AccountError::AmountMismatch {
                key: "k".to_owned(),
                reserved: 50,
                requested: 30,
                balance: Balance::new(50, 50),
            }
        );
        assert_eq!(account.reservation("k"), Some(50));
    }

    #[test]
    fn unblock_unknown_key_fails() {
        let mut account = funded(100);

        let err = account.unblock("missing", 1).unwrap_err();
        assert!(matches!(err, AccountError::UnknownKey { .. }));
        assert_eq!(account.balance(), Balance::new(100, 0));
    }

    #[test]
    fn unblock_overflowing_available_fails() {
        let mut account = funded(10);
        account.block("k", 10).unwrap();
        account.debit(u64::MAX).unwrap();

        let err = account.unblock("k", 10).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "unblock", .. }));
        assert_eq!(account.balance(), Balance::new(u64::MAX, 10));
        assert_eq!(account.reservation("k"), Some(10));
    }

    #[test]
    fn block_then_credit_removes_funds() {
        let mut account = funded(100);
        account.block("k", 40).unwrap();

        assert_eq!(account.credit("k", 40).unwrap(), Balance::new(60, 0));
        assert_eq!(account.reservation("k"), None);

        let err = account.credit("k", 40).unwrap_err();
        assert!(matches!(err, AccountError::UnknownKey { .. }));
    }

    #[test]
    fn credit_with_wrong_amount_fails() {
        let mut account = funded(100);
        account.block("k", 40).unwrap();

        let err = account.credit("k", 41).unwrap_err();
        assert!(matches!(err, AccountError::AmountMismatch { .. }));
        assert_eq!(account.balance(), Balance::new(60, 40));
    }

    #[test]
    fn no_fix_round_trip() {
        let mut account = funded(100);

        assert_eq!(account.block_no_fix(60).unwrap(), Balance::new(40, 60));
        assert_eq!(account.unblock_no_fix(60).unwrap(), Balance::new(100, 0));
        assert_eq!(account.reservations().count(), 0);
    }

    #[test]
    fn block_no_fix_checks_funds() {
        let mut account = funded(5);

        let err = account.block_no_fix(6).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
        assert_eq!(account.balance(), Balance::new(5, 0));
    }

    #[test]
    fn unblock_no_fix_never_drives_blocked_negative() {
        let mut account = funded(100);
        account.block_no_fix(10).unwrap();

        let err = account.unblock_no_fix(11).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "unblock_no_fix", .. }));
        assert_eq!(account.balance(), Balance::new(90, 10));
    }

    #[test]
    fn keyed_release_after_no_fix_release_overflows() {
        let mut account = funded(100);
        account.block("k", 10).unwrap();
        // key-less release empties blocked while the keyed reservation stays open
        account.unblock_no_fix(10).unwrap();
        assert_eq!(account.balance(), Balance::new(100, 0));

        let err = account.unblock("k", 10).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "unblock", .. }));
        assert_eq!(err.balance(), Balance::new(100, 0));

        let err = account.credit("k", 10).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "credit", .. }));

        assert_eq!(account.balance(), Balance::new(100, 0));
        assert_eq!(account.reservation("k"), Some(10));
    }

    #[test]
    fn block_no_fix_overflowing_blocked_fails() {
        let mut account = funded(u64::MAX);
        account.block_no_fix(u64::MAX).unwrap();
        account.debit(1).unwrap();

        let err = account.block_no_fix(1).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "block_no_fix", .. }));
        assert_eq!(account.balance(), Balance::new(1, u64::MAX));
    }

    #[test]
    fn unblock_no_fix_overflowing_available_fails() {
        let mut account = funded(10);
        account.block_no_fix(10).unwrap();
        account.debit(u64::MAX).unwrap();

        let err = account.unblock_no_fix(10).unwrap_err();
        assert!(matches!(err, AccountError::Overflow { operation: "unblock_no_fix", .. }));
        assert_eq!(account.balance(), Balance::new(u64::MAX, 10));
    }

    #[test]
    fn write_off_drains_then_fails() {
        let mut account = funded(75);

        assert_eq!(account.write_off(75).unwrap(), Balance::new(0, 0));
        let err = account.write_off(75).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { required: 75, .. }));
        assert_eq!(account.balance(), Balance::new(0, 0));
    }

    #[test]
    fn write_off_leaves_blocked_alone() {
        let mut account = funded(100);
        account.block("k", 30).unwrap();

        assert_eq!(account.write_off(70).unwrap(), Balance::new(0, 30));
        assert!(account.write_off(1).is_err());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Debit(u64),
        Block(u8, u64),
        Unblock(u8),
        Credit(u8),
        WriteOff(u64),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..1_000u64).prop_map(Step::Debit),
            (0..8u8, 0..500u64).prop_map(|(k, a)| Step::Block(k, a)),
            (0..8u8).prop_map(Step::Unblock),
            (0..8u8).prop_map(Step::Credit),
            (0..500u64).prop_map(Step::WriteOff),
        ]
    }

    proptest! {
        #[test]
        fn blocked_matches_open_reservations(steps in prop::collection::vec(step(), 0..64)) {
            let mut account = Account::new();
            let mut funds_in = 0u128;
            let mut funds_out = 0u128;

            for step in steps {
                let before = account.balance();
                let result = match step {
                    Step::Debit(amount) => account.debit(amount).map(|b| {
                        funds_in += u128::from(amount);
                        b
                    }),
                    Step::Block(key, amount) => account.block(&key.to_string(), amount),
                    Step::Unblock(key) => {
                        let key = key.to_string();
                        let amount = account.reservation(&key).unwrap_or(1);
                        account.unblock(&key, amount)
                    }
                    Step::Credit(key) => {
                        let key = key.to_string();
                        let amount = account.reservation(&key).unwrap_or(1);
                        account.credit(&key, amount).map(|b| {
                            funds_out += u128::from(amount);
                            b
                        })
                    }
                    Step::WriteOff(amount) => account.write_off(amount).map(|b| {
                        funds_out += u128::from(amount);
                        b
                    }),
                };

                match result {
                    Ok(balance) => prop_assert_eq!(balance, account.balance()),
                    Err(err) => {
                        prop_assert_eq!(err.balance(), before);
                        prop_assert_eq!(account.balance(), before);
                    }
                }
                prop_assert_eq!(u128::from(account.blocked()), account.reserved_total());
                prop_assert_eq!(account.total(), funds_in - funds_out);
            }
        }

        #[test]
        fn block_unblock_round_trip(start in any::<u64>(), amount in any::<u64>()) {
            let mut account = funded(start);
            let before = account.balance();

            if account.block("k", amount).is_ok() {
                prop_assert_eq!(account.unblock("k", amount).unwrap(), before);
            } else {
                prop_assert!(amount > start);
                prop_assert_eq!(account.balance(), before);
            }
        }
    }
}
