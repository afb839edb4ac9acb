//! Background synchronization, one run at a time.
//!
//! The worker owns a clone of the snapshot and reports a new snapshot over a
//! channel; the UI thread calls [`SyncTask::poll`] once per frame.

use crate::config::Config;
use crate::grouping::GroupedFootprints;
use crate::reconcile::{ReconcileSummary, reconcile};
use anyhow::Context;
use partdb_api::{PartDb, PartSource};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Please enter a PartDB API URL")]
    MissingUrl,

    #[error("Please enter a PartDB API Token")]
    MissingToken,

    #[error("a synchronization is already running")]
    Busy,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Completed {
        snapshot: GroupedFootprints,
        summary: ReconcileSummary,
    },
    Failed(String),
}

/// Check the connection settings before a run.
pub fn validate(config: &Config) -> Result<(), SyncError> {
    if config.api_url.trim().is_empty() {
        return Err(SyncError::MissingUrl);
    }
    if config.token.trim().is_empty() {
        return Err(SyncError::MissingToken);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct SyncTask {
    inflight: Option<Receiver<SyncOutcome>>,
}

impl SyncTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.inflight.is_some()
    }

    /// Validate `config` and reconcile `snapshot` against PartDB in the
    /// background.
    pub fn start(&mut self, snapshot: GroupedFootprints, config: Config) -> Result<(), SyncError> {
        validate(&config)?;
        self.start_with(snapshot, move || {
            PartDb::new(&config.api_url, &config.token).context("Failed to create PartDB client")
        })
    }

    /// Like [`start`](Self::start), with the part source built by `connect`
    /// on the worker thread.
    pub fn start_with<C, S>(&mut self, snapshot: GroupedFootprints, connect: C) -> Result<(), SyncError>
    where
        C: FnOnce() -> anyhow::Result<S> + Send + 'static,
        S: PartSource,
    {
        if self.is_running() {
            return Err(SyncError::Busy);
        }
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = match connect() {
                Ok(source) => {
                    let (snapshot, summary) = reconcile(&snapshot, &source);
                    SyncOutcome::Completed { snapshot, summary }
                }
                Err(e) => {
                    log::error!("Synchronization failed: {e:#}");
                    SyncOutcome::Failed(format!("{e:#}"))
                }
            };
            let _ = tx.send(outcome);
        });
        log::info!("Synchronization started");
        self.inflight = Some(rx);
        Ok(())
    }

    /// Outcome of the current run, once it has finished.
    pub fn poll(&mut self) -> Option<SyncOutcome> {
        let rx = self.inflight.as_ref()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.inflight = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.inflight = None;
                log::error!("Synchronization worker exited without a result");
                Some(SyncOutcome::Failed(
                    "synchronization worker exited unexpectedly".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{MemoryFootprint, scan};
    use crate::grouping::group;
    use partdb_api::InventoryPart;
    use std::time::{Duration, Instant};

    struct Fixed(Option<InventoryPart>);

    impl PartSource for Fixed {
        fn fetch_part(&self, _id: &str) -> Option<InventoryPart> {
            self.0.clone()
        }
    }

    fn snapshot() -> GroupedFootprints {
        group(scan(&[
            MemoryFootprint::part("C1", "GRM123", "312"),
            MemoryFootprint::part("C38", "GRM123", "312"),
        ]))
    }

    fn wait(task: &mut SyncTask) -> SyncOutcome {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(outcome) = task.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "sync did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn validation_messages() {
        assert_eq!(
            validate(&Config::new("", "tok")).unwrap_err().to_string(),
            "Please enter a PartDB API URL"
        );
        assert_eq!(
            validate(&Config::new("https://x/api", "  ")).unwrap_err().to_string(),
            "Please enter a PartDB API Token"
        );
        assert!(validate(&Config::new("https://x/api", "tok")).is_ok());
    }

    #[test]
    fn invalid_config_does_not_start() {
        let mut task = SyncTask::new();
        assert_eq!(
            task.start(snapshot(), Config::new("", "")),
            Err(SyncError::MissingUrl)
        );
        assert!(!task.is_running());
        assert!(task.poll().is_none());
    }

    #[test]
    fn completed_run_returns_new_snapshot() {
        let part = InventoryPart {
            id: 312,
            name: "100nF".into(),
            manufacturer_product_number: None,
            category: None,
            description: None,
            lots: Vec::new(),
        };
        let mut task = SyncTask::new();
        task.start_with(snapshot(), move || Ok(Fixed(Some(part))))
            .unwrap();
        match wait(&mut task) {
            SyncOutcome::Completed { snapshot, summary } => {
                assert_eq!(summary.resolved, 1);
                assert!(snapshot.records().all(|r| r.part.is_some()));
            }
            SyncOutcome::Failed(e) => panic!("unexpected failure: {e}"),
        }
        assert!(!task.is_running());
    }

    #[test]
    fn second_start_while_running_is_busy() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut task = SyncTask::new();
        task.start_with(snapshot(), move || {
            let _ = release_rx.recv();
            Ok(Fixed(None))
        })
        .unwrap();
        assert!(task.is_running());
        assert_eq!(
            task.start_with(snapshot(), || Ok(Fixed(None))),
            Err(SyncError::Busy)
        );

        release_tx.send(()).unwrap();
        assert!(matches!(wait(&mut task), SyncOutcome::Completed { .. }));
        assert!(task.start_with(snapshot(), || Ok(Fixed(None))).is_ok());
    }

    #[test]
    fn connect_failure_is_reported() {
        let mut task = SyncTask::new();
        task.start_with(snapshot(), || -> anyhow::Result<Fixed> {
            anyhow::bail!("connection refused")
        })
        .unwrap();
        match wait(&mut task) {
            SyncOutcome::Failed(e) => assert!(e.contains("connection refused")),
            SyncOutcome::Completed { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn worker_panic_is_a_failed_outcome() {
        let mut task = SyncTask::new();
        task.start_with(snapshot(), || -> anyhow::Result<Fixed> {
            panic!("worker died")
        })
        .unwrap();
        assert!(matches!(wait(&mut task), SyncOutcome::Failed(_)));
    }
}
