//! Shared fixtures: a small synthetic HMEQ-style dataset, a transform fitted
//! on it and a logistic classifier over the 18 transformed features.

#![allow(dead_code)]

use loan_risk_explainer::artifacts::{load_artifacts, ArtifactPaths};
use loan_risk_explainer::background::{
    BackgroundSample, BackgroundSampler, HistoricalDataset, SamplerConfig,
};
use loan_risk_explainer::explainability::ExplainerConfig;
use loan_risk_explainer::model::{ClassifierArtifact, LogisticModel};
use loan_risk_explainer::pipeline::{DecisionPolicy, ExplainContext};
use loan_risk_explainer::preprocessing::{FeatureTransform, RawRow, TransformConfig};
use std::path::Path;

pub const N_ROWS: usize = 60;
pub const N_FEATURES: usize = 18;

const REASONS: [&str; 2] = ["DebtCon", "HomeImp"];
const JOBS: [&str; 6] = ["Mgr", "Office", "Other", "ProfExe", "Sales", "Self"];

/// Risk rises with derogatory reports, delinquencies and debt-to-income
pub const COEFFICIENTS: [f64; N_FEATURES] = [
    -0.2, 0.1, -0.3, -0.2, 0.9, 1.1, -0.6, 0.4, 0.05, 0.8, // numeric
    0.1, -0.1, // REASON
    -0.2, -0.1, 0.3, -0.3, 0.2, 0.1, // JOB
];
pub const INTERCEPT: f64 = -1.2;

pub fn historical_rows() -> Vec<RawRow> {
    (0..N_ROWS)
        .map(|i| {
            let x = i as f64;
            RawRow {
                numeric: vec![
                    Some(5000.0 + 500.0 * x),
                    if i % 7 == 0 { None } else { Some(60000.0 + 1000.0 * x) },
                    Some(90000.0 + 1500.0 * x),
                    Some((i % 12) as f64),
                    Some((i % 3) as f64),
                    Some((i % 4) as f64),
                    Some(100.0 + 5.0 * x),
                    Some((i % 5) as f64),
                    Some(10.0 + (i % 20) as f64),
                    if i % 9 == 0 { None } else { Some(20.0 + (i % 25) as f64) },
                ],
                categorical: vec![
                    Some(REASONS[i % 2].to_string()),
                    if i % 11 == 5 { None } else { Some(JOBS[i % 6].to_string()) },
                ],
            }
        })
        .collect()
}

pub fn historical_labels() -> Vec<Option<i64>> {
    (0..N_ROWS).map(|i| Some(if i % 3 == 0 { 1 } else { 0 })).collect()
}

pub fn historical_dataset() -> HistoricalDataset {
    HistoricalDataset::new(historical_rows(), historical_labels()).unwrap()
}

/// The same dataset as CSV, columns in the HMEQ file order
pub fn historical_csv() -> String {
    let mut out = String::from("BAD,LOAN,MORTDUE,VALUE,REASON,JOB,YOJ,DEROG,DELINQ,CLAGE,NINQ,CLNO,DEBTINC\n");
    let num = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for (row, label) in historical_rows().iter().zip(historical_labels()) {
        let n = &row.numeric;
        let c = |i: usize| row.categorical[i].clone().unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            label.map(|l| l.to_string()).unwrap_or_default(),
            num(n[0]),
            num(n[1]),
            num(n[2]),
            c(0),
            c(1),
            num(n[3]),
            num(n[4]),
            num(n[5]),
            num(n[6]),
            num(n[7]),
            num(n[8]),
            num(n[9]),
        ));
    }
    out
}

pub fn fitted_transform() -> FeatureTransform {
    FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap()
}

pub fn logistic_model() -> ClassifierArtifact {
    ClassifierArtifact::Logistic(LogisticModel::new(COEFFICIENTS.to_vec(), INTERCEPT))
}

pub fn sampler_config() -> SamplerConfig {
    SamplerConfig {
        background_size: 20,
        ..SamplerConfig::default()
    }
}

/// Small budget so each explanation stays fast
pub fn explainer_config() -> ExplainerConfig {
    ExplainerConfig {
        max_evaluations: 2_000,
        seed: 42,
    }
}

pub fn background_sample(transform: &FeatureTransform) -> BackgroundSample {
    BackgroundSampler::new(sampler_config())
        .sample(&historical_dataset(), transform)
        .unwrap()
}

/// Write all four artifacts into `dir` and return their paths
pub fn write_artifacts(dir: &Path) -> ArtifactPaths {
    let paths = ArtifactPaths::in_dir(dir);
    let transform = fitted_transform();

    logistic_model().save(&paths.model).unwrap();
    transform.save(&paths.transform).unwrap();
    std::fs::write(
        &paths.feature_names,
        serde_json::to_string(&transform.feature_names()).unwrap(),
    )
    .unwrap();
    background_sample(&transform)
        .save(paths.background.as_ref().unwrap())
        .unwrap();
    paths
}

pub fn test_context() -> ExplainContext {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_artifacts(dir.path());
    let artifacts = load_artifacts(&paths, &sampler_config()).unwrap();
    ExplainContext::new(artifacts, explainer_config(), DecisionPolicy::default()).unwrap()
}
