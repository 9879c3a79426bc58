use crate::engine::outcome::{Outcome, Status};
use crate::engine::request::{Command, Operation, Request};
use crate::service::HierarchyService;
use crate::storage::Storage;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, error, info};

/// Streams a CSV of commands through a [`HierarchyService`].
///
/// Reading happens on a blocking task while commands are applied in file order, since a
/// child row may only be accepted once its parent row has been stored.
pub struct CommandEngine<S: Storage> {
    service: Arc<HierarchyService<S>>,
    backpressure: usize
}

impl<S: Storage> CommandEngine<S> {
    /// Creates a new engine instance on top of the provided service.
    pub fn new(service: Arc<HierarchyService<S>>) -> Self {
        Self {
            service,
            backpressure: 256
        }
    }

    /// Sets how many decoded commands may wait in the channel before the reader blocks.
    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.backpressure = backpressure.max(1);
        self
    }

    /// Runs every command in the file and returns one outcome per data row, in file order.
    pub async fn run(&self, path: &str) -> anyhow::Result<Vec<Outcome>> {
        let (sender, receiver) = mpsc::channel::<Result<Command, csv::Error>>(self.backpressure);
        let csv_handle = self.spawn_csv_reader(path.to_string(), sender);
        let outcomes = self.process_commands(receiver).await;

        if let Err(error) = csv_handle.await {
            error!("CSV ingestion failed: {error}");
        }

        info!("Processed {} commands", outcomes.len());

        Ok(outcomes)
    }

    /// Applies a single validated request.
    pub fn execute(&self, op: Operation, request: Request) -> Outcome {
        match request {
            Request::Upsert { id, amount, category, parent_id } => {
                match self.service.create_or_update(id, amount, category, parent_id) {
                    Ok(transaction) => Outcome::acknowledged(op, transaction.id),
                    Err(error) => Outcome::failed(op, Some(id), Status::from(&error), &error)
                }
            },
            Request::Get { id } => match self.service.get_by_id(id) {
                Ok(transaction) => Outcome::transaction(op, &transaction),
                Err(error) => Outcome::failed(op, Some(id), Status::from(&error), &error)
            },
            Request::IdsByType { category } => {
                let ids = self.service.ids_by_type(&category);
                Outcome::ids(op, &category, &ids)
            },
            Request::Sum { id } => match self.service.calculate_sum(id) {
                Ok(total) => Outcome::sum(op, id, total),
                Err(error) => Outcome::failed(op, Some(id), Status::from(&error), &error)
            }
        }
    }

    fn spawn_csv_reader(&self, path: String, sender: mpsc::Sender<Result<Command, csv::Error>>) -> JoinHandle<()> {
        spawn_blocking(move || {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(error) => {
                    error!("Error opening CSV at path: {path} | {error}");
                    return;
                }
            };

            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .flexible(true)
                .from_reader(BufReader::new(file));

            for result in reader.deserialize::<Command>() {
                if sender.blocking_send(result).is_err() {
                    break;
                }
            }
        })
    }

    async fn process_commands(&self, mut receiver: mpsc::Receiver<Result<Command, csv::Error>>) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        while let Some(result) = receiver.recv().await {
            let command = match result {
                Ok(command) => command,
                Err(error) => {
                    error!("CSV deserialization error: {error}");
                    outcomes.push(Outcome::undecodable(&error));
                    continue;
                }
            };

            let op = command.op;
            let id = command.id;

            let outcome = match command.into_request() {
                Ok(request) => self.execute(op, request),
                Err(error) => {
                    error!("Rejected [{op:?}] command for [{id:?}]: {error}");
                    Outcome::failed(op, id, Status::from(&error), &error)
                }
            };

            debug!("[{op:?}] for [{id:?}] finished with status [{}]", outcome.status);
            outcomes.push(outcome);
        }

        outcomes
    }
}
