use crate::types::TransactionId;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum HierarchyError {
    #[error("Transaction [{transaction_id}] was not found")]
    NotFound {
        transaction_id: TransactionId
    },
    #[error("Invalid parent: {message}")]
    InvalidParent {
        message: String
    },
    #[error("Numeric overflow occurred while summing the subtree of transaction [{transaction_id}]")]
    Overflow {
        transaction_id: TransactionId
    },
    #[error("Summing the subtree of transaction [{transaction_id}] needs more digits than an exact decimal can hold")]
    PrecisionLoss {
        transaction_id: TransactionId
    }
}

impl HierarchyError {
    //NOTE: The three invalid parent cases share a variant on purpose, callers that need to tell them
    //      apart have to look at the message.

    pub fn not_found(transaction_id: TransactionId) -> Self {
        Self::NotFound { transaction_id }
    }

    pub fn self_parent(transaction_id: TransactionId) -> Self {
        Self::InvalidParent {
            message: format!("Transaction [{transaction_id}] cannot be its own parent")
        }
    }

    pub fn missing_parent(transaction_id: TransactionId, parent_id: TransactionId) -> Self {
        Self::InvalidParent {
            message: format!("Parent [{parent_id}] of transaction [{transaction_id}] does not exist")
        }
    }

    pub fn cycle(transaction_id: TransactionId, parent_id: TransactionId) -> Self {
        Self::InvalidParent {
            message: format!("Assigning parent [{parent_id}] to transaction [{transaction_id}] would create a cycle")
        }
    }

    pub fn overflow(transaction_id: TransactionId) -> Self {
        Self::Overflow { transaction_id }
    }

    pub fn precision_loss(transaction_id: TransactionId) -> Self {
        Self::PrecisionLoss { transaction_id }
    }
}
