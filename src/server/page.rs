//! Server-rendered HTML: the applicant form and the result page

use crate::pipeline::{Assessment, ConfidenceBand};
use crate::record::{ApplicantForm, FieldSpec, Job, Reason, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::report::{chart::DEFAULT_MAX_DISPLAY, factor_lines, format_percent, WaterfallChart};

const CHART_WIDTH: u32 = 860;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
header { background: #1f2937; color: #fff; padding: 1em 2em; }
header h1 { margin: 0; font-size: 1.5em; }
main { display: grid; grid-template-columns: 320px 1fr; gap: 1.5em; padding: 1.5em 2em; }
aside, section { background: #fff; border-radius: 8px; padding: 1.2em 1.5em; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
label { display: block; font-size: 0.85em; color: #555; margin-top: 0.6em; }
input, select { width: 100%; padding: 0.35em; box-sizing: border-box; }
button { margin-top: 1em; padding: 0.6em 1.4em; background: #2563eb; color: #fff; border: none; border-radius: 6px; cursor: pointer; }
.banner { background: #fee2e2; color: #991b1b; border: 1px solid #fca5a5; padding: 0.8em 1em; border-radius: 6px; margin-bottom: 1em; }
.progress { background: #e5e7eb; border-radius: 4px; height: 14px; }
.progress > div { background: #2563eb; height: 14px; border-radius: 4px; }
.ok { color: #166534; } .bad { color: #991b1b; } .info { color: #1e40af; } .warn { color: #92400e; }
table { border-collapse: collapse; } td, th { border: 1px solid #ddd; padding: 0.3em 0.8em; text-align: left; }
code { background: #f3f4f6; padding: 0.1em 0.3em; border-radius: 3px; }
"#;

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Loan Default Prediction App</title>
<style>{STYLE}</style>
</head>
<body>
<header><h1>Loan Default Prediction App</h1></header>
{body}
</body>
</html>"#
    )
}

fn about_dataset() -> String {
    let mut rows = String::new();
    for spec in NUMERIC_FIELDS.iter().chain(CATEGORICAL_FIELDS.iter()) {
        rows.push_str(&format!(
            "<tr><td><b>{}</b></td><td>{}</td></tr>",
            spec.name,
            escape_html(spec.description)
        ));
    }
    rows.push_str("<tr><td><b>BAD</b></td><td>1 = Defaulted, 0 = No Default</td></tr>");
    format!(
        "<details><summary>📘 About the Dataset</summary>\
         <table><tr><th>Column</th><th>Meaning</th></tr>{rows}</table></details>"
    )
}

fn numeric_input(spec: &FieldSpec, value: &str) -> String {
    format!(
        r#"<label for="{name}">{label}</label><input type="text" inputmode="decimal" id="{name}" name="{name}" value="{value}">"#,
        name = spec.name,
        label = escape_html(spec.label),
        value = escape_html(value),
    )
}

fn select_input(spec: &FieldSpec, choices: &[&str], value: &str) -> String {
    let options: String = choices
        .iter()
        .map(|c| {
            let selected = if *c == value { " selected" } else { "" };
            format!(r#"<option value="{c}"{selected}>{c}</option>"#)
        })
        .collect();
    format!(
        r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">{options}</select>"#,
        name = spec.name,
        label = escape_html(spec.label),
    )
}

fn applicant_form(form: &ApplicantForm) -> String {
    let mut fields = String::new();
    for spec in NUMERIC_FIELDS.iter() {
        fields.push_str(&numeric_input(spec, form.get(spec.name)));
    }
    let reasons: Vec<&str> = Reason::ALL.iter().map(|r| r.as_str()).collect();
    let jobs: Vec<&str> = Job::ALL.iter().map(|j| j.as_str()).collect();
    fields.push_str(&select_input(&CATEGORICAL_FIELDS[0], &reasons, form.get("REASON")));
    fields.push_str(&select_input(&CATEGORICAL_FIELDS[1], &jobs, form.get("JOB")));

    format!(
        r#"<aside><h2>Applicant Information</h2><form method="post" action="/predict">{fields}<button type="submit">Predict</button></form></aside>"#
    )
}

fn hidden_fields(form: &ApplicantForm) -> String {
    NUMERIC_FIELDS
        .iter()
        .chain(CATEGORICAL_FIELDS.iter())
        .map(|spec| {
            format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                spec.name,
                escape_html(form.get(spec.name))
            )
        })
        .collect()
}

/// Form page, optionally with an error banner; submitted values are kept
pub fn render_form(form: &ApplicantForm, error: Option<&str>) -> String {
    let banner = error
        .map(|e| format!(r#"<div class="banner" role="alert">{}</div>"#, escape_html(e)))
        .unwrap_or_default();
    let body = format!(
        "<main>{}<section>{banner}{}<p>Enter the applicant's details and press <b>Predict</b>.</p></section></main>",
        applicant_form(form),
        about_dataset(),
    );
    layout(&body)
}

/// Result page for a completed assessment
pub fn render_result(form: &ApplicantForm, assessment: &Assessment) -> String {
    let band_class = match assessment.band {
        ConfidenceBand::High => "ok",
        ConfidenceBand::Moderate => "info",
        ConfidenceBand::Low => "warn",
    };
    let decision_class = if assessment.predicted_class == 1 { "bad" } else { "ok" };
    let progress = (assessment.probability * 100.0).clamp(0.0, 100.0);

    let chart = WaterfallChart::from_attribution(&assessment.attribution, DEFAULT_MAX_DISPLAY)
        .to_svg(CHART_WIDTH);

    let callout = |label: &str, name: Option<&String>| -> String {
        name.map(|n| format!("<p><b>{label}:</b> <code>{}</code></p>", escape_html(n)))
            .unwrap_or_default()
    };
    let most_positive = callout(
        "Most positive factor",
        assessment.factors.most_positive.as_ref().map(|c| &c.feature_name),
    );
    let most_negative = callout(
        "Most negative factor",
        assessment.factors.most_negative.as_ref().map(|c| &c.feature_name),
    );

    let (increasing, reducing) = factor_lines(&assessment.factors);
    let reasons: String = increasing
        .iter()
        .zip(std::iter::repeat("bad"))
        .chain(reducing.iter().zip(std::iter::repeat("info")))
        .map(|(line, class)| {
            let text = line.trim_start_matches("- ");
            format!(r#"<li class="{class}">{}</li>"#, markdown_bold(&escape_html(text)))
        })
        .collect();

    let result = format!(
        r#"<section>
<h2>Prediction Result</h2>
<p><b>Predicted probability of default:</b> {probability}</p>
<div class="progress"><div style="width: {progress:.0}%"></div></div>
<p><b>Model Confidence:</b> {confidence}</p>
<p class="{band_class}">{band_symbol} {band_message}</p>
<p class="{decision_class}">{decision_symbol} <b>Result:</b> {decision_summary}</p>
<h3>Why did the model predict this?</h3>
<p>This waterfall chart breaks down the impact of each feature:<br>🔵 <i>Blue bars</i>: Reduced the risk<br>🔴 <i>Red bars</i>: Increased the risk</p>
<div class="chart">{chart}</div>
{most_positive}{most_negative}
<p>The model predicted <b>{risk_level}</b> due to:</p>
<ul>{reasons}</ul>
<form method="post" action="/report">{hidden}<button type="submit">Download Report</button></form>
</section>"#,
        probability = format_percent(assessment.probability),
        confidence = format_percent(assessment.confidence),
        band_symbol = assessment.band.symbol(),
        band_message = assessment.band.message(),
        decision_symbol = assessment.decision.symbol(),
        decision_summary = assessment.decision.summary(),
        risk_level = assessment.decision.risk_level(),
        hidden = hidden_fields(form),
    );

    let body = format!("<main>{}{}</main>", applicant_form(form), result);
    layout(&body)
}

/// `**x**` to `<b>x</b>` for the factor bullets
fn markdown_bold(s: &str) -> String {
    let mut out = String::new();
    for (i, part) in s.split("**").enumerate() {
        if i % 2 == 1 {
            out.push_str("<b>");
            out.push_str(part);
            out.push_str("</b>");
        } else {
            out.push_str(part);
        }
    }
    out
}
