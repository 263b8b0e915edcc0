//! Runs feature-classifier predictions off the game thread.
//!
//! The engine is synchronous and never waits for the classifier. Instead the
//! UI submits a [`PredictionRequest`] to a [`ClassifierAssist`], keeps
//! playing, and merges each finished [`AssistOutcome`] back into the
//! [`GameController`] through [`AssistOutcome::apply_to`]. The controller
//! already shows a simulated prediction, so a slow, failing or cancelled
//! classifier only means that prediction stays.
//!
//! # Example
//!
//! ```
//! use std::{sync::Arc, time::Duration};
//!
//! use wallyfit_assist::ClassifierAssist;
//! use wallyfit_engine::{Annotation, GameController, GameSeed, ScoringRules, SimulatedClassifier};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let seed = GameSeed::from_bytes([1; 16]);
//! let classifier = Arc::new(SimulatedClassifier::new(ScoringRules::default(), seed));
//! let mut game = GameController::builder()
//!     .seed(seed)
//!     .classifier(classifier)
//!     .build()
//!     .unwrap();
//!
//! let id = game.state().images()[0].image_id().clone();
//! game.annotate(&id, Annotation::Rejected).unwrap();
//! game.train().unwrap();
//!
//! let mut assist = ClassifierAssist::new(tokio::runtime::Handle::current(), Duration::from_secs(5));
//! assist.submit(game.prediction_request().unwrap());
//!
//! let outcome = assist.next().await.unwrap();
//! assert!(outcome.apply_to(&mut game));
//! # }
//! ```

use std::time::Duration;

use tokio::{runtime::Handle, sync::mpsc, task};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wallyfit_engine::{GameController, Prediction, PredictionRequest, PredictionTicket};

/// A finished classifier prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssistOutcome {
    pub ticket: PredictionTicket,
    /// `None` when the classifier timed out, failed or had nothing to say.
    pub prediction: Option<Prediction>,
}

impl AssistOutcome {
    /// Merges the outcome into the game. Returns whether the shown
    /// prediction changed.
    pub fn apply_to(self, controller: &mut GameController) -> bool {
        controller.merge_prediction(self.ticket, self.prediction)
    }
}

/// Background runner for classifier predictions.
///
/// At most one prediction is in flight: submitting a new request cancels the
/// previous one, and a cancelled job never reports back.
#[derive(Debug)]
pub struct ClassifierAssist {
    handle: Handle,
    timeout: Duration,
    shutdown: CancellationToken,
    current: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<AssistOutcome>,
    rx: mpsc::UnboundedReceiver<AssistOutcome>,
}

impl ClassifierAssist {
    /// Creates a runner spawning its jobs on `handle`. Predictions taking
    /// longer than `timeout` are reported as `None`.
    #[must_use]
    pub fn new(handle: Handle, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle,
            timeout,
            shutdown: CancellationToken::new(),
            current: None,
            tx,
            rx,
        }
    }

    /// Starts a prediction, cancelling the one in flight.
    pub fn submit(&mut self, request: PredictionRequest) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        if self.shutdown.is_cancelled() {
            debug!("prediction submitted after shutdown");
            return;
        }
        let token = self.shutdown.child_token();
        self.current = Some(token.clone());
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let ticket = request.ticket();
        debug!(?ticket, "prediction submitted");

        self.handle.spawn(async move {
            let job = task::spawn_blocking(move || request.run());
            let prediction = tokio::select! {
                () = token.cancelled() => {
                    debug!(?ticket, "prediction cancelled");
                    return;
                }
                result = tokio::time::timeout(timeout, job) => match result {
                    Ok(Ok(Ok(prediction))) => prediction,
                    Ok(Ok(Err(e))) => {
                        warn!(?ticket, error = %e, "classifier prediction failed");
                        None
                    }
                    Ok(Err(e)) => {
                        warn!(?ticket, error = %e, "classifier prediction task failed");
                        None
                    }
                    Err(_) => {
                        warn!(?ticket, ?timeout, "classifier prediction timed out");
                        None
                    }
                }
            };
            if tx.send(AssistOutcome { ticket, prediction }).is_err() {
                debug!(?ticket, "prediction finished after the receiver was dropped");
            }
        });
    }

    /// Returns a finished outcome without waiting, if there is one.
    pub fn try_next(&mut self) -> Option<AssistOutcome> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next finished outcome.
    ///
    /// The runner keeps a sender of its own, so this only returns `None` if
    /// the channel is closed underneath it.
    pub async fn next(&mut self) -> Option<AssistOutcome> {
        self.rx.recv().await
    }

    /// Cancels the job in flight and refuses further submissions.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.current = None;
    }
}

impl Drop for ClassifierAssist {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
