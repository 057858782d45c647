//! Plain-text report offered as a download

use crate::pipeline::{Assessment, RankedFactors};
use crate::report::format_percent;

/// File name offered for the downloaded report
pub const REPORT_FILENAME: &str = "loan_prediction_report.txt";

/// One bullet per ranked factor: increasing factors, then reducing ones
pub fn factor_lines(factors: &RankedFactors) -> (Vec<String>, Vec<String>) {
    let increasing = factors
        .increasing
        .iter()
        .map(|c| format!("- 🔴 **{}** increased the risk", c.feature_name))
        .collect();
    let reducing = factors
        .reducing
        .iter()
        .map(|c| format!("- 🔵 **{}** reduced the risk", c.feature_name))
        .collect();
    (increasing, reducing)
}

pub fn render_report_text(assessment: &Assessment) -> String {
    let mut out = String::new();

    out.push_str("Loan Default Prediction Report\n");
    out.push_str("==============================\n\n");

    out.push_str(&format!(
        "Prediction: {} {}\n",
        assessment.decision.symbol(),
        assessment.decision.verdict()
    ));
    out.push_str(&format!(
        "Probability of Default: {}\n",
        format_percent(assessment.probability)
    ));
    out.push_str(&format!(
        "Model Confidence: {}\n",
        format_percent(assessment.confidence)
    ));
    out.push_str(&format!("Confidence Band: {}\n\n", assessment.band));

    let (increasing, reducing) = factor_lines(&assessment.factors);
    out.push_str("Top Risk Increasing Factors:\n");
    for line in &increasing {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    out.push_str("Top Risk Reducing Factors:\n");
    for line in &reducing {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    out.push_str("Input Data:\n");
    out.push_str(&assessment.record.to_row_string());
    out.push('\n');

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainability::{Attribution, FeatureContribution};
    use crate::pipeline::{rank_factors, ConfidenceBand, Decision, TOP_FACTORS};
    use crate::record::ApplicantRecord;

    fn assessment(probability: f64, contributions: &[(&str, f64)]) -> Assessment {
        let attribution = Attribution {
            base_value: 0.4,
            prediction: probability,
            contributions: contributions
                .iter()
                .enumerate()
                .map(|(i, (name, c))| FeatureContribution {
                    feature_index: i,
                    feature_name: name.to_string(),
                    feature_value: 0.0,
                    contribution: *c,
                })
                .collect(),
            n_evaluations: 0,
        };
        let decision = if probability > 0.5 { Decision::HighRisk } else { Decision::Grant };
        Assessment {
            record: ApplicantRecord::default(),
            probability,
            predicted_class: decision.class(),
            decision,
            confidence: (probability - 0.5).abs() * 2.0,
            band: ConfidenceBand::Low,
            factors: rank_factors(&attribution, TOP_FACTORS),
            attribution,
            elapsed_ms: 1.0,
        }
    }

    #[test]
    fn test_report_layout() {
        let a = assessment(0.6321, &[("DEBTINC", 0.2), ("CLAGE", -0.05), ("LOAN", 0.0)]);
        let report = render_report_text(&a);

        assert!(report.starts_with("Loan Default Prediction Report\n====="));
        assert!(report.contains("Prediction: ❌ High Risk of Default\n"));
        assert!(report.contains("Probability of Default: 63.21%\n"));
        assert!(report.contains("Model Confidence: 26.42%\n"));
        assert!(report.contains("Top Risk Increasing Factors:\n- 🔴 **DEBTINC** increased the risk\n"));
        assert!(report.contains("Top Risk Reducing Factors:\n- 🔵 **CLAGE** reduced the risk\n"));
        assert!(!report.contains("**LOAN**"));
        assert!(report.contains(&ApplicantRecord::default().to_row_string()));
    }

    #[test]
    fn test_exactly_one_prediction_line() {
        for p in [0.2, 0.5, 0.9] {
            let report = render_report_text(&assessment(p, &[("LOAN", 0.1)]));
            let lines: Vec<&str> = report.lines().filter(|l| l.starts_with("Prediction:")).collect();
            assert_eq!(lines.len(), 1);
            let expected = if p > 0.5 { "High Risk of Default" } else { "Loan Can Be Granted" };
            assert!(lines[0].ends_with(expected));
        }
    }

    #[test]
    fn test_empty_factor_lists() {
        let report = render_report_text(&assessment(0.3, &[]));
        assert!(report.contains("Top Risk Increasing Factors:\n\nTop Risk Reducing Factors:\n\nInput Data:"));
    }
}
