use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::request::{Operation, RequestError};
use crate::models::{HierarchyError, Transaction};
use crate::types::TransactionId;

/// Result classes a transport layer would report, with their HTTP-style codes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Status {
    Ok,
    ClientError,
    NotFound,
    ServerError
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::ClientError => 400,
            Status::NotFound => 404,
            Status::ServerError => 500
        }
    }
}

impl From<&HierarchyError> for Status {
    fn from(error: &HierarchyError) -> Self {
        match error {
            HierarchyError::InvalidParent { .. } => Status::ClientError,
            HierarchyError::NotFound { .. } => Status::NotFound,
            HierarchyError::Overflow { .. } | HierarchyError::PrecisionLoss { .. } => Status::ServerError
        }
    }
}

impl From<&RequestError> for Status {
    fn from(_: &RequestError) -> Self {
        Status::ClientError
    }
}

/// One output row per processed command.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Outcome {
    /// `None` when the row could not be decoded far enough to know its operation.
    pub op: Option<Operation>,
    pub status: u16,
    pub id: Option<TransactionId>,
    pub amount: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub parent_id: Option<TransactionId>,
    pub ids: Option<String>,
    pub sum: Option<String>,
    pub error: Option<String>
}

impl Outcome {
    fn empty(op: Operation, status: Status) -> Self {
        Self {
            op: Some(op),
            status: status.code(),
            id: None,
            amount: None,
            category: None,
            parent_id: None,
            ids: None,
            sum: None,
            error: None
        }
    }

    pub fn acknowledged(op: Operation, id: TransactionId) -> Self {
        Self { id: Some(id), ..Self::empty(op, Status::Ok) }
    }

    pub fn transaction(op: Operation, transaction: &Transaction) -> Self {
        Self {
            id: Some(transaction.id),
            amount: Some(transaction.amount.to_string()),
            category: Some(transaction.category.clone()),
            parent_id: transaction.parent_id,
            ..Self::empty(op, Status::Ok)
        }
    }

    pub fn ids(op: Operation, category: &str, ids: &[TransactionId]) -> Self {
        let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(";");

        Self {
            category: Some(category.to_string()),
            ids: Some(joined),
            ..Self::empty(op, Status::Ok)
        }
    }

    pub fn sum(op: Operation, id: TransactionId, total: Decimal) -> Self {
        Self {
            id: Some(id),
            sum: Some(total.to_string()),
            ..Self::empty(op, Status::Ok)
        }
    }

    pub fn undecodable(error: &csv::Error) -> Self {
        Self {
            op: None,
            error: Some(error.to_string()),
            ..Self::empty(Operation::Put, Status::ClientError)
        }
    }

    pub fn failed(op: Operation, id: Option<TransactionId>, status: Status, error: &dyn std::error::Error) -> Self {
        Self {
            id,
            error: Some(error.to_string()),
            ..Self::empty(op, status)
        }
    }
}
