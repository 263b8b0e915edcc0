use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use tracing::info;
use wallyfit_assist::ClassifierAssist;
use wallyfit_engine::{GameController, SimulatedClassifier};

use crate::{command::GameArg, store::JsonLinesStore, tui::Tui};

use self::app::PlayApp;

mod app;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    #[clap(flatten)]
    game: GameArg,
    /// Directory to append annotation records to
    #[clap(long, default_value = "./data/records/")]
    record_dir: PathBuf,
    /// File receiving the log output while the terminal UI is running
    #[clap(long, default_value = "wallyfit.log")]
    log_file: PathBuf,
    /// Give up on a classifier prediction after this many milliseconds
    #[clap(long, default_value_t = 3000)]
    classifier_timeout_ms: u64,
    /// Artificial delay of the built-in classifier, in milliseconds
    #[clap(long, default_value_t = 400)]
    classifier_latency_ms: u64,
    /// Play with simulated predictions only
    #[clap(long, default_value_t = false)]
    no_classifier: bool,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            game: GameArg::default(),
            record_dir: PathBuf::from("./data/records/"),
            log_file: PathBuf::from("wallyfit.log"),
            classifier_timeout_ms: 3000,
            classifier_latency_ms: 400,
            no_classifier: false,
        }
    }
}

impl PlayArg {
    pub(crate) fn log_file(&self) -> &Path {
        &self.log_file
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        game,
        record_dir,
        log_file: _,
        classifier_timeout_ms,
        classifier_latency_ms,
        no_classifier,
    } = arg;

    let config = game.load_config()?;
    let seed = game.seed();
    let store = JsonLinesStore::create(record_dir, seed)?;
    info!(%seed, records = %store.path().display(), "starting game");

    let mut builder = GameController::builder()
        .config(config.clone())
        .seed(seed)
        .store(store);
    if !no_classifier {
        let classifier = SimulatedClassifier::new(config.scoring, seed)
            .with_latency(Duration::from_millis(*classifier_latency_ms));
        builder = builder.classifier(Arc::new(classifier));
    }
    let controller = builder.build().context("Failed to start the game")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .context("Failed to start the classifier runtime")?;
    let assist = ClassifierAssist::new(
        runtime.handle().clone(),
        Duration::from_millis(*classifier_timeout_ms),
    );

    let mut app = PlayApp::new(controller, assist);
    Tui::new().run(&mut app)?;

    let controller = app.into_controller();
    runtime.shutdown_timeout(Duration::from_millis(100));
    info!(
        level = controller.state().level(),
        score = controller.score(),
        "game finished"
    );
    eprintln!(
        "Reached level {} with a score of {} (seed {seed})",
        controller.state().level(),
        controller.score()
    );
    Ok(())
}
