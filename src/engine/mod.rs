mod command_engine;
mod outcome;
mod request;

pub use command_engine::CommandEngine;
pub use outcome::{Outcome, Status};
pub use request::{Command, Operation, Request, RequestError};
