//! Live validation
//!
//! Debounced revalidation of a configuration while it is being edited.
//!
//! ```text
//!            mutation                quiet for `debounce`
//!   Idle ───────────────▶ Pending ─────────────────────▶ Validating
//!    ▲                     ▲   │ mutation: restart timer      │
//!    │                     │   └──────────────┘               │
//!    │                     └──── mutation arrived meanwhile ──┤ (result discarded)
//!    └────────────────────── publish result ──────────────────┘
//! ```
//!
//! Mutations go through an unbounded channel owned by a single loop task.
//! Results are published through a `watch` channel, so readers only ever see
//! a whole result for the newest snapshot.

use crate::cancel::CancellationToken;
use crate::model::PatternConfiguration;
use crate::validate::{ValidationResult, Validator};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default quiet period before revalidating
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiveState {
    Idle,
    PendingRevalidate,
    Validating,
}

enum Mutation {
    Configuration(Box<PatternConfiguration>),
    Samples(Vec<String>),
}

/// Latest-value publisher for validation results
pub type ResultReceiver = watch::Receiver<Option<Arc<ValidationResult>>>;

type ValidateFn = Box<
    dyn FnMut(&PatternConfiguration, &[String], &CancellationToken) -> Option<ValidationResult>
        + Send,
>;

pub struct LiveValidationModel {
    tx: mpsc::UnboundedSender<Mutation>,
    results: ResultReceiver,
    state: watch::Receiver<LiveState>,
    passes: Arc<AtomicU64>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl LiveValidationModel {
    /// Start the revalidation loop on the current tokio runtime
    pub fn new(debounce: Duration) -> Self {
        let validator = Validator::new();
        Self::spawn(debounce, move |config, samples, cancel| {
            validator.validate_against_samples(config, samples, cancel)
        })
    }

    fn spawn<F>(debounce: Duration, validate: F) -> Self
    where
        F: FnMut(&PatternConfiguration, &[String], &CancellationToken) -> Option<ValidationResult>
            + Send
            + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (result_tx, results) = watch::channel(None);
        let (state_tx, state) = watch::channel(LiveState::Idle);
        let passes = Arc::new(AtomicU64::new(0));
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(revalidate_loop(RevalidateLoop {
            rx,
            debounce,
            validate: Box::new(validate),
            result_tx,
            state_tx,
            passes: passes.clone(),
            shutdown: shutdown.clone(),
        }));

        Self {
            tx,
            results,
            state,
            passes,
            shutdown,
            task,
        }
    }

    pub fn update_configuration(&self, config: PatternConfiguration) {
        self.send(Mutation::Configuration(Box::new(config)));
    }

    pub fn update_sample_filenames(&self, samples: Vec<String>) {
        self.send(Mutation::Samples(samples));
    }

    fn send(&self, mutation: Mutation) {
        if self.tx.send(mutation).is_err() {
            warn!("Live validation loop has stopped; mutation dropped");
        }
    }

    /// Most recently published result
    pub fn latest(&self) -> Option<Arc<ValidationResult>> {
        self.results.borrow().clone()
    }

    pub fn subscribe(&self) -> ResultReceiver {
        self.results.clone()
    }

    pub fn state(&self) -> LiveState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LiveState> {
        self.state.clone()
    }

    /// Validator runs so far, including discarded stale ones
    pub fn validation_passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// True iff the latest result is valid
    pub fn can_generate_patterns(&self) -> bool {
        self.latest().map(|r| r.valid).unwrap_or(false)
    }

    pub fn is_blocked(&self) -> bool {
        !self.can_generate_patterns()
    }

    pub fn should_show_success_banner(&self) -> bool {
        self.can_generate_patterns()
    }

    /// Nothing to show: the latest result has neither errors nor warnings
    pub fn should_hide_validation_display(&self) -> bool {
        self.latest().map(|r| r.is_clean()).unwrap_or(true)
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        drop(self.tx);
        if let Err(err) = self.task.await {
            warn!(error = %err, "Live validation loop ended abnormally");
        }
    }
}

struct RevalidateLoop {
    rx: mpsc::UnboundedReceiver<Mutation>,
    debounce: Duration,
    validate: ValidateFn,
    result_tx: watch::Sender<Option<Arc<ValidationResult>>>,
    state_tx: watch::Sender<LiveState>,
    passes: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

#[derive(Default)]
struct Snapshot {
    config: PatternConfiguration,
    samples: Vec<String>,
}

impl Snapshot {
    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Configuration(config) => self.config = *config,
            Mutation::Samples(samples) => self.samples = samples,
        }
    }
}

async fn revalidate_loop(mut ctx: RevalidateLoop) {
    let mut snapshot = Snapshot::default();

    // Idle: wait for the first mutation of a burst
    while let Some(mutation) = ctx.rx.recv().await {
        snapshot.apply(mutation);
        ctx.state_tx.send_replace(LiveState::PendingRevalidate);

        loop {
            match tokio::time::timeout(ctx.debounce, ctx.rx.recv()).await {
                Ok(Some(mutation)) => {
                    snapshot.apply(mutation);
                    continue;
                }
                Ok(None) => {
                    debug!("Live validation loop closed while pending");
                    return;
                }
                Err(_elapsed) => {}
            }

            ctx.state_tx.send_replace(LiveState::Validating);
            let result = (ctx.validate)(&snapshot.config, &snapshot.samples, &ctx.shutdown);
            ctx.passes.fetch_add(1, Ordering::SeqCst);

            match ctx.rx.try_recv() {
                Ok(mutation) => {
                    debug!("Discarding validation result for stale snapshot");
                    snapshot.apply(mutation);
                    ctx.state_tx.send_replace(LiveState::PendingRevalidate);
                    continue;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }

            match result {
                Some(result) => {
                    debug!(
                        valid = result.valid,
                        errors = result.errors.len(),
                        warnings = result.warnings.len(),
                        "Publishing validation result"
                    );
                    ctx.result_tx.send_replace(Some(Arc::new(result)));
                }
                None => debug!("Validation cancelled by shutdown"),
            }
            ctx.state_tx.send_replace(LiveState::Idle);
            break;
        }
    }
    debug!("Live validation loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ValidationErrorKind, ValidationWarningKind};
    use std::sync::Mutex;

    fn config(group: &str) -> PatternConfiguration {
        let mut config = PatternConfiguration::new();
        config.group_pattern = group.to_string();
        config.front_pattern = ".*front.*".to_string();
        config.overview_pattern = ".*ov.*".to_string();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_window_validates_once() {
        let model = LiveValidationModel::new(Duration::from_millis(300));
        let mut results = model.subscribe();

        model.update_configuration(config("(.+)(.+)"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        model.update_configuration(config(r"^v_(\d+)"));

        results.changed().await.unwrap();
        assert_eq!(model.validation_passes(), 1);
        let latest = model.latest().unwrap();
        assert!(latest.valid, "{:?}", latest.errors);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(model.validation_passes(), 1);
        assert_eq!(model.state(), LiveState::Idle);
        model.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_published_before_window_closes() {
        let model = LiveValidationModel::new(Duration::from_millis(300));
        model.update_configuration(config("(.+)(.+)"));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(model.latest().is_none());
        assert_eq!(model.state(), LiveState::PendingRevalidate);
        assert!(model.is_blocked());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let latest = model.latest().unwrap();
        assert_eq!(latest.error_kinds(), vec![ValidationErrorKind::MultipleCapturingGroups]);
        assert!(!model.can_generate_patterns());
        assert!(!model.should_hide_validation_display());
        model.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_for_stale_snapshot_discarded() {
        let edit_in_flight: Arc<Mutex<Option<mpsc::UnboundedSender<Mutation>>>> = Arc::default();
        let hook = edit_in_flight.clone();
        let validator = Validator::new();
        let debounce = Duration::from_millis(300);
        let model = LiveValidationModel::spawn(debounce, move |cfg, samples, cancel| {
            // A newer edit lands while the first pass is running
            if let Some(tx) = hook.lock().unwrap().take() {
                let newer = config(r"^v_(\d+)");
                tx.send(Mutation::Configuration(Box::new(newer))).unwrap();
            }
            validator.validate_against_samples(cfg, samples, cancel)
        });
        *edit_in_flight.lock().unwrap() = Some(model.tx.clone());
        let mut results = model.subscribe();

        model.update_configuration(config("(.+)(.+)"));

        // The first wake-up already carries the second pass
        results.changed().await.unwrap();
        assert_eq!(model.validation_passes(), 2);
        let latest = model.latest().unwrap();
        assert!(latest.valid, "{:?}", latest.errors);
        assert_eq!(model.state(), LiveState::Idle);
        model.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_update_revalidates() {
        let model = LiveValidationModel::new(DEFAULT_DEBOUNCE);
        let mut results = model.subscribe();

        model.update_configuration(config(r"^v_(\d+)\.jpg$"));
        results.changed().await.unwrap();
        assert!(model.should_hide_validation_display());
        assert!(model.should_show_success_banner());

        model.update_sample_filenames(vec!["v_1.jpg".to_string(), "other.jpg".to_string()]);
        results.changed().await.unwrap();
        let latest = model.latest().unwrap();
        assert!(latest.valid);
        assert!(latest.has_warning(ValidationWarningKind::PartialSampleMatches));
        assert!(!model.should_hide_validation_display());
        assert_eq!(model.validation_passes(), 2);
        model.shutdown().await;
    }
}
