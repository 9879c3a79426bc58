use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Amount, AmountError, TransactionId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Put,
    Get,
    Type,
    Sum
}

/// A single row from the input CSV, before validation.
///
/// Every column is optional because each operation only uses some of them.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    pub op: Operation,
    pub id: Option<TransactionId>,
    //NOTE: Kept as text so the decimal is parsed exactly rather than through a float
    pub amount: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub parent_id: Option<TransactionId>
}

/// A validated command, ready to hand to the service.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Request {
    Upsert {
        id: TransactionId,
        amount: Amount,
        category: String,
        parent_id: Option<TransactionId>
    },
    Get {
        id: TransactionId
    },
    IdsByType {
        category: String
    },
    Sum {
        id: TransactionId
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    #[error("Operation [{0:?}] requires an id")]
    MissingId(Operation),
    #[error("Operation [{0:?}] requires an amount")]
    MissingAmount(Operation),
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
    #[error("Operation [{0:?}] requires a non-empty type")]
    EmptyType(Operation)
}

impl Command {
    pub fn into_request(self) -> Result<Request, RequestError> {
        let op = self.op;

        match op {
            Operation::Put => {
                let id = self.id.ok_or(RequestError::MissingId(op))?;
                let amount = self.amount.ok_or(RequestError::MissingAmount(op))?.parse::<Amount>()?;
                let category = non_empty(self.category).ok_or(RequestError::EmptyType(op))?;

                Ok(Request::Upsert { id, amount, category, parent_id: self.parent_id })
            },
            Operation::Get => Ok(Request::Get { id: self.id.ok_or(RequestError::MissingId(op))? }),
            Operation::Type => Ok(Request::IdsByType {
                category: non_empty(self.category).ok_or(RequestError::EmptyType(op))?
            }),
            Operation::Sum => Ok(Request::Sum { id: self.id.ok_or(RequestError::MissingId(op))? })
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
