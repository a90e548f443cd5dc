use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

use super::StatsReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsCommand {
    /// Start reporting now and every `period` after, replacing any running task
    Arm(Duration),
    /// Stop reporting
    Disarm,
}

/// Owns the single periodic stats task. Driven only through [`StatsHandle`].
pub struct StatsScheduler {
    reporter: Arc<StatsReporter>,
    commands: mpsc::Receiver<StatsCommand>,
    task: Option<JoinHandle<()>>,
}

/// Command side of the stats scheduler
#[derive(Clone, Debug)]
pub struct StatsHandle {
    commands: mpsc::Sender<StatsCommand>,
}

impl StatsScheduler {
    /// Spawn the scheduler. It stops once every [`StatsHandle`] is dropped.
    pub fn spawn(reporter: StatsReporter) -> (StatsHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(16);
        let scheduler = Self {
            reporter: Arc::new(reporter),
            commands: rx,
            task: None,
        };
        let join = tokio::spawn(scheduler.run());
        (StatsHandle { commands: tx }, join)
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            debug!(?command, "Stats command");
            match command {
                StatsCommand::Arm(period) => self.arm(period),
                StatsCommand::Disarm => self.disarm(),
            }
        }

        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        debug!("Stats scheduler stopped");
    }

    fn arm(&mut self, period: Duration) {
        self.disarm();

        let reporter = self.reporter.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                reporter.report().await;
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl StatsHandle {
    pub async fn arm(&self, period: Duration) {
        self.send(StatsCommand::Arm(period)).await;
    }

    pub async fn disarm(&self) {
        self.send(StatsCommand::Disarm).await;
    }

    async fn send(&self, command: StatsCommand) {
        if self.commands.send(command).await.is_err() {
            warn!(?command, "Stats scheduler is not running");
        }
    }
}
