mod errors;
mod transaction;

pub use errors::HierarchyError;
pub use transaction::Transaction;
