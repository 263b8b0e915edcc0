use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, ensure};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;
use tracing::{info, warn};
use wallyfit_engine::{
    AdvanceOutcome, Annotation, BoundingBox, Feedback, FitState, GameConfig, GameController,
    GameSeed, ModelPrediction, SimulatedClassifier,
};

use crate::{command::GameArg, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    game: GameArg,
    /// Number of levels to play
    #[clap(long, default_value_t = 3)]
    levels: u32,
    /// Images annotated per level before training
    #[clap(long, default_value_t = 14)]
    annotations: usize,
    /// Probability (0.0 to 1.0) of answering an image wrongly
    #[clap(long, default_value_t = 0.0)]
    error_rate: f64,
    /// Also ask the built-in feature classifier for each test image
    #[clap(long, default_value_t = false)]
    with_classifier: bool,
    /// Output file path for the report (JSON format); stdout when omitted
    #[clap(long)]
    output: Option<PathBuf>,
}

/// How the scripted player behaves.
#[derive(Debug, Clone, Copy)]
struct Script {
    levels: u32,
    annotations: usize,
    error_rate: f64,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    seed: GameSeed,
    final_level: u32,
    final_score: usize,
    levels: Vec<LevelReport>,
}

#[derive(Debug, Serialize)]
struct LevelReport {
    level: u32,
    category: String,
    annotated: usize,
    wrong: usize,
    accuracy: u8,
    fit_state: FitState,
    feedback: Feedback,
    prediction: Option<ModelPrediction>,
    outcome: AdvanceOutcome,
    confirmed_overfit: bool,
    score: usize,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        game,
        levels,
        annotations,
        error_rate,
        with_classifier,
        output,
    } = arg;
    ensure!(
        (0.0..=1.0).contains(error_rate),
        "--error-rate must be between 0.0 and 1.0, got {error_rate}"
    );

    let config = game.load_config()?;
    let seed = game.seed();
    let script = Script {
        levels: *levels,
        annotations: *annotations,
        error_rate: *error_rate,
    };
    let report = simulate(config, seed, script, *with_classifier)?;
    info!(
        final_level = report.final_level,
        final_score = report.final_score,
        "simulation finished"
    );
    util::write_json(&report, output.as_deref())
}

fn simulate(
    config: GameConfig,
    seed: GameSeed,
    script: Script,
    with_classifier: bool,
) -> anyhow::Result<SimulationReport> {
    let mut builder = GameController::builder().config(config.clone()).seed(seed);
    if with_classifier {
        builder = builder.classifier(Arc::new(SimulatedClassifier::new(config.scoring, seed)));
    }
    let mut game = builder.build().context("Invalid game configuration")?;
    let mut rng = Pcg32::from_seed(seed.to_bytes());
    let box_for_object = BoundingBox::new(25.0, 25.0, 40.0, 40.0)?;

    let mut levels = vec![];
    for _ in 0..script.levels {
        let level = game.state().level();
        let answers: Vec<_> = game
            .state()
            .images()
            .iter()
            .take(script.annotations)
            .map(|record| {
                let wrong = rng.random_bool(script.error_rate);
                let annotation = if record.has_object() != wrong {
                    Annotation::Boxed(box_for_object)
                } else {
                    Annotation::Rejected
                };
                (record.image_id().clone(), annotation, wrong)
            })
            .collect();
        let wrong = answers.iter().filter(|(_, _, wrong)| *wrong).count();
        for (id, annotation, _) in &answers {
            game.annotate(id, *annotation)?;
        }

        if game.train().is_some()
            && let Some(request) = game.prediction_request()
        {
            match request.run() {
                Ok(prediction) => {
                    game.merge_prediction(request.ticket(), prediction);
                }
                Err(e) => warn!(level, error = %e, "classifier prediction failed"),
            }
        }

        let view = game.view();
        let mut outcome = game.request_next_level();
        let confirmed_overfit = outcome.is_needs_confirmation() && game.confirm();
        if confirmed_overfit {
            outcome = AdvanceOutcome::Advanced {
                level: game.state().level(),
            };
        }
        info!(level, accuracy = view.accuracy, fit_state = %view.fit_state, "level played");
        levels.push(LevelReport {
            level,
            category: view.category,
            annotated: view.annotated_count,
            wrong,
            accuracy: view.accuracy,
            fit_state: view.fit_state,
            feedback: view.feedback,
            prediction: view.prediction,
            outcome,
            confirmed_overfit,
            score: game.score(),
        });
        if !outcome.is_advanced() {
            break;
        }
    }

    Ok(SimulationReport {
        seed,
        final_level: game.state().level(),
        final_score: game.score(),
        levels,
    })
}
