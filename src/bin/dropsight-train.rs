//! Trains, tunes and exports a dropout risk model from a labeled CSV.

use std::path::PathBuf;

use dropsight::artifact::{self, ModelArtifact, ValidationMetrics};
use dropsight::config::TrainConfig;
use dropsight::dataset::load as load_dataset;
use dropsight::forest::{SearchOptions, SearchSpace, random_search};
use dropsight::metrics::{ConfusionMatrix, evaluation_report};
use dropsight::schema;
use dropsight::split::stratified_holdout;

fn main() {
    if let Err(err) = dropsight::logging::init() {
        eprintln!("Logging unavailable: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut config = TrainConfig::load_or_default(&options.config).map_err(|err| err.to_string())?;
    if let Some(candidates) = options.candidates {
        config.candidates = candidates;
    }
    if let Some(cv_folds) = options.cv_folds {
        config.cv_folds = cv_folds;
    }
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    if let Some(fraction) = options.holdout_fraction {
        config.holdout_fraction = fraction;
    }
    config.validate().map_err(|err| err.to_string())?;

    let dataset = load_dataset(&options.data).map_err(|err| err.to_string())?;
    tracing::info!(
        rows = dataset.len(),
        classes = ?dataset.class_counts(),
        "Dataset loaded"
    );

    let (train_idx, holdout_idx) = stratified_holdout(
        &dataset.y,
        &format!("holdout-{}", config.seed),
        config.holdout_fraction,
    )?;
    let (train_x, train_y) = select_rows(&dataset.x, &dataset.y, &train_idx);
    let (holdout_x, holdout_y) = select_rows(&dataset.x, &dataset.y, &holdout_idx);
    tracing::info!(
        train = train_x.len(),
        holdout = holdout_x.len(),
        "Stratified holdout split"
    );

    let search_options = SearchOptions {
        candidates: config.candidates,
        cv_folds: config.cv_folds,
        seed: config.seed,
    };
    let outcome = random_search(
        &train_x,
        &train_y,
        &dataset.classes,
        &SearchSpace::default(),
        &search_options,
    )?;
    println!(
        "best candidate: cv roc_auc={:.4}  {:?}",
        outcome.cv_score, outcome.best_params
    );

    let mut cm = ConfusionMatrix::new(dataset.classes.len());
    for (row, &truth) in holdout_x.iter().zip(holdout_y.iter()) {
        cm.add(truth, outcome.model.predict_class_index(row));
    }
    let report = evaluation_report(&cm, &dataset.classes);
    println!("holdout accuracy: {:.4}", report.accuracy);
    for stats in &report.per_class {
        println!(
            "class {:<10}  precision={:.3}  recall={:.3}  f1={:.3}  support={}",
            stats.class, stats.precision, stats.recall, stats.f1, stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for truth in 0..cm.n_classes {
        let mut row = String::new();
        for pred in 0..cm.n_classes {
            row.push_str(&format!("{:6}", cm.get(truth, pred)));
        }
        println!("{row}");
    }

    let bundle = ModelArtifact::new(
        outcome.model,
        schema::order(),
        ValidationMetrics {
            cv_roc_auc: outcome.cv_score,
            holdout: Some(report),
        },
    );
    artifact::save(&bundle, &options.out).map_err(|err| err.to_string())?;
    tracing::info!(path = %options.out.display(), "Model artifact saved");
    println!("artifact written to {}", options.out.display());

    Ok(())
}

fn select_rows(x: &[Vec<f64>], y: &[usize], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<usize>) {
    let rows = indices.iter().map(|&idx| x[idx].clone()).collect();
    let labels = indices.iter().map(|&idx| y[idx]).collect();
    (rows, labels)
}

#[derive(Debug, Clone)]
struct CliOptions {
    data: PathBuf,
    out: PathBuf,
    config: PathBuf,
    candidates: Option<usize>,
    cv_folds: Option<usize>,
    seed: Option<u64>,
    holdout_fraction: Option<f64>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut data: Option<PathBuf> = None;
    let mut out = PathBuf::from("dropout_model.json");
    let mut config = PathBuf::from("dropsight.toml");
    let mut candidates: Option<usize> = None;
    let mut cv_folds: Option<usize> = None;
    let mut seed: Option<u64> = None;
    let mut holdout_fraction: Option<f64> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--data requires a value".to_string())?;
                data = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out = PathBuf::from(value);
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config = PathBuf::from(value);
            }
            "--candidates" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--candidates requires a value".to_string())?;
                candidates = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --candidates value: {value}"))?,
                );
            }
            "--folds" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--folds requires a value".to_string())?;
                cv_folds = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --folds value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--holdout" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--holdout requires a value".to_string())?;
                holdout_fraction = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --holdout value: {value}"))?,
                );
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let data = data.ok_or_else(help_text)?;
    Ok(CliOptions {
        data,
        out,
        config,
        candidates,
        cv_folds,
        seed,
        holdout_fraction,
    })
}

fn help_text() -> String {
    [
        "dropsight-train",
        "",
        "Trains a random forest dropout classifier with randomized hyperparameter",
        "search and exports the model artifact.",
        "",
        "Usage:",
        "  dropsight-train --data <file.csv> [--out dropout_model.json] [options]",
        "",
        "Options:",
        "  --data <file>      Labeled training CSV with a 'target' column (required).",
        "  --out <file>       Output artifact path (default: dropout_model.json).",
        "  --config <file>    TOML config path (default: dropsight.toml).",
        "  --candidates <n>   Hyperparameter candidates to evaluate (default: 50).",
        "  --folds <n>        Cross-validation folds (default: 5).",
        "  --seed <n>         Master seed (default: 42).",
        "  --holdout <f>      Holdout fraction in (0, 1) (default: 0.2).",
    ]
    .join("\n")
}
