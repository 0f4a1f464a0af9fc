#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Debit { amount: u64 },
    Block { key: String, amount: u64 },
    BlockNoFix { amount: u64 },
    Unblock { key: String, amount: u64 },
    UnblockNoFix { amount: u64 },
    Credit { key: String, amount: u64 },
    WriteOff { amount: u64 },
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Debit { .. } => "debit",
            OperationKind::Block { .. } => "block",
            OperationKind::BlockNoFix { .. } => "block_no_fix",
            OperationKind::Unblock { .. } => "unblock",
            OperationKind::UnblockNoFix { .. } => "unblock_no_fix",
            OperationKind::Credit { .. } => "credit",
            OperationKind::WriteOff { .. } => "write_off",
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            OperationKind::Debit { amount }
            | OperationKind::Block { amount, .. }
            | OperationKind::BlockNoFix { amount }
            | OperationKind::Unblock { amount, .. }
            | OperationKind::UnblockNoFix { amount }
            | OperationKind::Credit { amount, .. }
            | OperationKind::WriteOff { amount } => *amount,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            OperationKind::Block { key, .. }
            | OperationKind::Unblock { key, .. }
            | OperationKind::Credit { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// One balance operation addressed to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub account_id: String,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind.key() {
            Some(key) => write!(
                f,
                "{},account={},key={},amount={}",
                self.kind.name(),
                self.account_id,
                key,
                self.kind.amount()
            ),
            None => write!(
                f,
                "{},account={},amount={}",
                self.kind.name(),
                self.account_id,
                self.kind.amount()
            ),
        }
    }
}
