//! Process-level task supervision and shutdown signalling.

use std::collections::HashMap;
use std::future::Future;

use tokio::signal;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a supervised task.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Task {task} failed: {source}")]
    TaskFailed { task: String, source: BoxError },

    #[error("Task {task} panicked")]
    TaskPanicked { task: String },
}

/// Runs named long-lived tasks under one shutdown token.
///
/// The first task to fail cancels the token, so its siblings stop as well.
pub struct Supervisor {
    shutdown: CancellationToken,
    tasks: JoinSet<Result<(), BoxError>>,
    names: HashMap<Id, String>,
}

impl Supervisor {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            tasks: JoinSet::new(),
            names: HashMap::new(),
        }
    }

    /// Returns the token shared by all supervised tasks.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn spawn<F, E>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let name = name.into();
        tracing::info!(task = %name, "starting task");
        let handle = self
            .tasks
            .spawn(async move { task.await.map_err(Into::into) });
        self.names.insert(handle.id(), name);
    }

    /// Waits for every task to finish and returns the first failure.
    pub async fn wait(mut self) -> Result<(), SupervisorError> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next_with_id().await {
            let failure = match joined {
                Ok((id, Ok(()))) => {
                    tracing::info!(task = %self.task_name(id), "task finished");
                    None
                }
                Ok((id, Err(source))) => {
                    let task = self.task_name(id);
                    tracing::error!(task = %task, error = %source, "task failed");
                    Some(SupervisorError::TaskFailed { task, source })
                }
                Err(e) => {
                    let task = self.task_name(e.id());
                    tracing::error!(task = %task, error = %e, "task panicked");
                    Some(SupervisorError::TaskPanicked { task })
                }
            };

            if let Some(failure) = failure {
                self.shutdown.cancel();
                first_error.get_or_insert(failure);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn task_name(&self, id: Id) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Waits for SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
