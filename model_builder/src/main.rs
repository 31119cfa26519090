//! Fits the rental regression served by the dashboard.
//!
//! Reads the cleaned hourly dataset, encodes every row with the dashboard's
//! encoder, compares a mean baseline with ridge fits on a chronological
//! holdout, and writes the model plus the score and importance reports.

use anyhow::{anyhow, bail, Context};
use bikeshare::data::{reports, Dataset, FeatureImportance, ModelScore};
use bikeshare::encoder::{encode, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
use bikeshare::model::{LinearModel, Target};
use bikeshare::Config;
use clap::Parser;
use nalgebra::{DMatrix, DVector};

#[derive(Parser)]
#[command(name = "model_builder")]
#[command(about = "Train the bike sharing rental model", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// L2 penalty on the feature weights
    #[arg(long, default_value = "1.0")]
    ridge: f64,

    /// Share of the latest rows held out for scoring
    #[arg(long, default_value = "0.2")]
    holdout: f64,
}

struct Sample {
    features: FeatureVector,
    count: f64,
}

/// Encode every row, oldest first. Rows outside the encoder's domain are skipped.
fn build_samples(dataset: &Dataset) -> Vec<Sample> {
    let mut records: Vec<_> = dataset.records().iter().collect();
    records.sort_by_key(|r| (r.dteday, r.hr));

    let mut skipped = 0;
    let samples: Vec<Sample> = records
        .into_iter()
        .filter_map(|r| match r.selection().and_then(|s| encode(&s)) {
            Ok(features) => Some(Sample {
                features,
                count: r.cnt,
            }),
            Err(e) => {
                log::debug!("Skipping row {}: {}", r.dteday, e);
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        log::warn!("Skipped {} rows that could not be encoded", skipped);
    }
    samples
}

fn transform(target: Target, count: f64) -> f64 {
    match target {
        Target::Count => count,
        Target::Log1p => count.max(0.0).ln_1p(),
    }
}

/// Ridge regression via the normal equations. The intercept is not penalised.
fn fit_ridge(samples: &[Sample], target: Target, lambda: f64) -> anyhow::Result<LinearModel> {
    if samples.is_empty() {
        bail!("no training rows");
    }
    let cols = FEATURE_COUNT + 1;
    let design = DMatrix::from_fn(samples.len(), cols, |i, j| {
        if j == 0 {
            1.0
        } else {
            samples[i].features.as_slice()[j - 1]
        }
    });
    let y = DVector::from_iterator(
        samples.len(),
        samples.iter().map(|s| transform(target, s.count)),
    );

    let mut gram = design.transpose() * &design;
    for j in 1..cols {
        gram[(j, j)] += lambda;
    }
    let rhs = design.transpose() * y;
    let solution = gram
        .cholesky()
        .ok_or_else(|| anyhow!("normal equations are not positive definite; raise --ridge"))?
        .solve(&rhs);

    Ok(LinearModel::new(
        target,
        solution[0],
        solution.iter().skip(1).copied().collect(),
    ))
}

/// Root mean squared logarithmic error; negative predictions count as zero
fn rmsle(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return f64::NAN;
    }
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p.max(0.0).ln_1p() - a.max(0.0).ln_1p()).powi(2))
        .sum();
    (sum / n as f64).sqrt()
}

/// |weight| times the feature's spread, normalised to sum to one
fn importances(model: &LinearModel, samples: &[Sample]) -> Vec<FeatureImportance> {
    let n = samples.len().max(1) as f64;
    let raw: Vec<f64> = (0..FEATURE_COUNT)
        .map(|j| {
            let mean = samples.iter().map(|s| s.features.as_slice()[j]).sum::<f64>() / n;
            let var = samples
                .iter()
                .map(|s| (s.features.as_slice()[j] - mean).powi(2))
                .sum::<f64>()
                / n;
            model.weights[j].abs() * var.sqrt()
        })
        .collect();
    let total: f64 = raw.iter().sum();

    FEATURE_COLUMNS
        .iter()
        .zip(raw)
        .map(|(name, value)| FeatureImportance {
            feature: name.to_string(),
            importance: if total > 0.0 { value / total } else { 0.0 },
        })
        .collect()
}

fn split(samples: &[Sample], holdout: f64) -> (&[Sample], &[Sample]) {
    let test_len = ((samples.len() as f64) * holdout).round() as usize;
    let train_len = samples.len().saturating_sub(test_len.max(1));
    samples.split_at(train_len)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if !(0.0..1.0).contains(&cli.holdout) {
        bail!("--holdout must be in [0, 1), got {}", cli.holdout);
    }
    let config = Config::load_or_default(&cli.config)?;

    let dataset = Dataset::load(&config.data.cleaned_path)
        .with_context(|| format!("cannot read {}", config.data.cleaned_path.display()))?;
    let samples = build_samples(&dataset);
    let (train, test) = split(&samples, cli.holdout);
    log::info!("Training on {} rows, scoring on {}", train.len(), test.len());

    let actual: Vec<f64> = test.iter().map(|s| s.count).collect();
    let baseline = train.iter().map(|s| s.count).sum::<f64>() / train.len().max(1) as f64;
    let mut scores = vec![ModelScore {
        model: "Mean baseline".to_string(),
        rmsle: rmsle(&vec![baseline; test.len()], &actual),
    }];

    let mut best: Option<(Target, f64)> = None;
    for (name, target) in [("Ridge (count)", Target::Count), ("Ridge (log1p)", Target::Log1p)] {
        let model = fit_ridge(train, target, cli.ridge)?;
        let predicted: Vec<f64> = test.iter().map(|s| model.predict(&s.features)).collect();
        let score = rmsle(&predicted, &actual);
        log::info!("{}: RMSLE {:.4}", name, score);
        scores.push(ModelScore {
            model: name.to_string(),
            rmsle: score,
        });
        if best.map_or(true, |(_, b)| score < b) {
            best = Some((target, score));
        }
    }
    scores.sort_by(|a, b| a.rmsle.total_cmp(&b.rmsle));

    let (target, _) = best.ok_or_else(|| anyhow!("no model was scored"))?;
    let model = fit_ridge(&samples, target, cli.ridge)?;
    model.save(&config.model.path)?;
    println!("Model saved to {}", config.model.path.display());

    reports::write_scores(&config.data.scores_path, &scores)?;
    reports::write_importances(&config.data.importances_path, &importances(&model, &samples))?;
    println!(
        "Reports written to {} and {}",
        config.data.scores_path.display(),
        config.data.importances_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare::encoder::{RawSelection, Year};

    fn synthetic() -> Vec<Sample> {
        let mut samples = Vec::new();
        for hour in 0..24u8 {
            for step in 0..5u8 {
                let temperature = f64::from(step) / 4.0;
                let selection = RawSelection {
                    year: Year::Y2011,
                    hour,
                    temperature,
                    ..RawSelection::default()
                };
                samples.push(Sample {
                    features: encode(&selection).unwrap(),
                    count: 5.0 + 2.0 * f64::from(hour) + 10.0 * temperature,
                });
            }
        }
        samples
    }

    #[test]
    fn test_ridge_recovers_linear_relation() {
        let samples = synthetic();
        let model = fit_ridge(&samples, Target::Count, 1e-3).unwrap();
        for s in &samples {
            assert!((model.predict(&s.features) - s.count).abs() < 0.1);
        }
        assert!((model.weights[1] - 2.0).abs() < 0.01);
        assert!(model.check_schema().is_ok());
    }

    #[test]
    fn test_log_target_predicts_counts() {
        let samples = synthetic();
        let model = fit_ridge(&samples, Target::Log1p, 1e-3).unwrap();
        let predicted: Vec<f64> = samples.iter().map(|s| model.predict(&s.features)).collect();
        let actual: Vec<f64> = samples.iter().map(|s| s.count).collect();
        assert!(rmsle(&predicted, &actual) < 0.5);
    }

    #[test]
    fn test_rmsle() {
        assert_eq!(rmsle(&[10.0, 20.0], &[10.0, 20.0]), 0.0);
        let e = rmsle(&[0.0], &[(1f64).exp() - 1.0]);
        assert!((e - 1.0).abs() < 1e-12);
        // Negative predictions are floored at zero
        assert_eq!(rmsle(&[-5.0], &[0.0]), 0.0);
        assert!(rmsle(&[], &[]).is_nan());
    }

    #[test]
    fn test_importances_sum_to_one() {
        let samples = synthetic();
        let model = fit_ridge(&samples, Target::Count, 1e-3).unwrap();
        let imp = importances(&model, &samples);
        assert_eq!(imp.len(), FEATURE_COUNT);
        let total: f64 = imp.iter().map(|i| i.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let top = imp
            .iter()
            .max_by(|a, b| a.importance.total_cmp(&b.importance))
            .unwrap();
        assert_eq!(top.feature, "hr");
    }

    #[test]
    fn test_chronological_split() {
        let samples = synthetic();
        let (train, test) = split(&samples, 0.2);
        assert_eq!(test.len(), 24);
        assert_eq!(train.len() + test.len(), samples.len());

        let (train, test) = split(&samples, 0.0);
        assert_eq!(test.len(), 1);
        assert_eq!(train.len(), samples.len() - 1);
    }

    #[test]
    fn test_empty_training_set() {
        assert!(fit_ridge(&[], Target::Count, 1.0).is_err());
    }
}
