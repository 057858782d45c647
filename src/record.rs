//! Applicant record: the single row of raw attributes collected by the form
//!
//! The numeric columns follow the HMEQ home-equity dataset layout. Values are
//! taken as entered; no range validation is applied, only that each numeric
//! field parses to a finite number and each categorical field is one of its
//! fixed choices.

use crate::error::{ExplainerError, Result};
use crate::preprocessing::RawRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Loan purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    DebtCon,
    HomeImp,
}

impl Reason {
    pub const ALL: [Reason; 2] = [Reason::DebtCon, Reason::HomeImp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::DebtCon => "DebtCon",
            Reason::HomeImp => "HomeImp",
        }
    }
}

/// Applicant occupation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Job {
    Mgr,
    Office,
    Other,
    ProfExe,
    Sales,
    #[serde(rename = "Self")]
    SelfEmployed,
}

impl Job {
    pub const ALL: [Job; 6] = [
        Job::Mgr,
        Job::Office,
        Job::Other,
        Job::ProfExe,
        Job::Sales,
        Job::SelfEmployed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Job::Mgr => "Mgr",
            Job::Office => "Office",
            Job::Other => "Other",
            Job::ProfExe => "ProfExe",
            Job::Sales => "Sales",
            Job::SelfEmployed => "Self",
        }
    }
}

impl FromStr for Reason {
    type Err = ExplainerError;

    fn from_str(s: &str) -> Result<Self> {
        Reason::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| {
                ExplainerError::invalid_input("REASON", format!("unknown choice '{}'", s))
            })
    }
}

impl FromStr for Job {
    type Err = ExplainerError;

    fn from_str(s: &str) -> Result<Self> {
        Job::ALL
            .into_iter()
            .find(|j| j.as_str() == s.trim())
            .ok_or_else(|| ExplainerError::invalid_input("JOB", format!("unknown choice '{}'", s)))
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one form field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Whole-number field (counts and currency amounts)
    pub integer: bool,
}

/// Numeric columns, in the order the transform consumes them
pub const NUMERIC_FIELDS: [FieldSpec; 10] = [
    FieldSpec { name: "LOAN", label: "Loan Amount", description: "Requested loan amount", integer: true },
    FieldSpec { name: "MORTDUE", label: "Mortgage Due", description: "Current mortgage due", integer: true },
    FieldSpec { name: "VALUE", label: "Property Value", description: "Property value", integer: true },
    FieldSpec { name: "YOJ", label: "Years at Job", description: "Years at current job", integer: true },
    FieldSpec { name: "DEROG", label: "Derogatory Reports", description: "Major negative credit reports", integer: true },
    FieldSpec { name: "DELINQ", label: "Delinquencies", description: "Delinquent credit lines", integer: true },
    FieldSpec { name: "CLAGE", label: "Credit Age", description: "Oldest credit line (months)", integer: true },
    FieldSpec { name: "NINQ", label: "Recent Credit Inquiries", description: "Recent credit inquiries", integer: true },
    FieldSpec { name: "CLNO", label: "Number of Credit Lines", description: "Total number of credit lines", integer: true },
    FieldSpec { name: "DEBTINC", label: "Debt to Income Ratio", description: "Debt-to-income ratio", integer: false },
];

/// Categorical columns, in the order the transform consumes them
pub const CATEGORICAL_FIELDS: [FieldSpec; 2] = [
    FieldSpec { name: "REASON", label: "Reason", description: "Loan reason: DebtCon or HomeImp", integer: false },
    FieldSpec { name: "JOB", label: "Job Type", description: "Job type: Mgr, ProfExe, etc.", integer: false },
];

/// Outcome column of the historical dataset (1 = defaulted)
pub const TARGET_COLUMN: &str = "BAD";

/// One loan applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ApplicantRecord {
    pub loan: f64,
    pub mortdue: f64,
    pub value: f64,
    pub yoj: f64,
    pub derog: f64,
    pub delinq: f64,
    pub clage: f64,
    pub ninq: f64,
    pub clno: f64,
    pub debtinc: f64,
    pub reason: Reason,
    pub job: Job,
}

impl Default for ApplicantRecord {
    fn default() -> Self {
        Self {
            loan: 10000.0,
            mortdue: 80000.0,
            value: 110000.0,
            yoj: 10.0,
            derog: 0.0,
            delinq: 1.0,
            clage: 150.0,
            ninq: 1.0,
            clno: 20.0,
            debtinc: 30.0,
            reason: Reason::DebtCon,
            job: Job::Mgr,
        }
    }
}

impl ApplicantRecord {
    /// Numeric values in `NUMERIC_FIELDS` order
    pub fn numeric_values(&self) -> [f64; 10] {
        [
            self.loan,
            self.mortdue,
            self.value,
            self.yoj,
            self.derog,
            self.delinq,
            self.clage,
            self.ninq,
            self.clno,
            self.debtinc,
        ]
    }

    fn set_numeric(&mut self, name: &str, v: f64) {
        match name {
            "LOAN" => self.loan = v,
            "MORTDUE" => self.mortdue = v,
            "VALUE" => self.value = v,
            "YOJ" => self.yoj = v,
            "DEROG" => self.derog = v,
            "DELINQ" => self.delinq = v,
            "CLAGE" => self.clage = v,
            "NINQ" => self.ninq = v,
            "CLNO" => self.clno = v,
            "DEBTINC" => self.debtinc = v,
            _ => {}
        }
    }

    /// Every field as `(column name, display value)`, numeric columns first
    pub fn field_values(&self) -> Vec<(&'static str, String)> {
        let mut out: Vec<(&'static str, String)> = NUMERIC_FIELDS
            .iter()
            .zip(self.numeric_values())
            .map(|(spec, v)| (spec.name, format_field_value(spec, v)))
            .collect();
        out.push(("REASON", self.reason.to_string()));
        out.push(("JOB", self.job.to_string()));
        out
    }

    /// Two-column listing of the record: names left-aligned, values right-aligned
    pub fn to_row_string(&self) -> String {
        let fields = self.field_values();
        let name_width = fields.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        let value_width = fields.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        fields
            .iter()
            .map(|(name, value)| format!("{:<name_width$}    {:>value_width$}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Column-oriented view consumed by the preprocessing transform
    pub fn to_raw_row(&self) -> RawRow {
        RawRow {
            numeric: self.numeric_values().iter().map(|&v| Some(v)).collect(),
            categorical: vec![
                Some(self.reason.as_str().to_string()),
                Some(self.job.as_str().to_string()),
            ],
        }
    }
}

/// Whole values of integer fields print without a fractional part; everything
/// else keeps at least one decimal (`30.0`).
pub fn format_field_value(spec: &FieldSpec, v: f64) -> String {
    if spec.integer && v.fract() == 0.0 {
        format!("{}", v)
    } else {
        format!("{:?}", v)
    }
}

/// Raw form submission; every field is kept as text so a bad entry can be
/// echoed back to the user unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantForm {
    #[serde(rename = "LOAN", default)]
    pub loan: String,
    #[serde(rename = "MORTDUE", default)]
    pub mortdue: String,
    #[serde(rename = "VALUE", default)]
    pub value: String,
    #[serde(rename = "YOJ", default)]
    pub yoj: String,
    #[serde(rename = "DEROG", default)]
    pub derog: String,
    #[serde(rename = "DELINQ", default)]
    pub delinq: String,
    #[serde(rename = "CLAGE", default)]
    pub clage: String,
    #[serde(rename = "NINQ", default)]
    pub ninq: String,
    #[serde(rename = "CLNO", default)]
    pub clno: String,
    #[serde(rename = "DEBTINC", default)]
    pub debtinc: String,
    #[serde(rename = "REASON", default)]
    pub reason: String,
    #[serde(rename = "JOB", default)]
    pub job: String,
}

impl ApplicantForm {
    /// Text of a field by column name
    pub fn get(&self, name: &str) -> &str {
        match name {
            "LOAN" => &self.loan,
            "MORTDUE" => &self.mortdue,
            "VALUE" => &self.value,
            "YOJ" => &self.yoj,
            "DEROG" => &self.derog,
            "DELINQ" => &self.delinq,
            "CLAGE" => &self.clage,
            "NINQ" => &self.ninq,
            "CLNO" => &self.clno,
            "DEBTINC" => &self.debtinc,
            "REASON" => &self.reason,
            "JOB" => &self.job,
            _ => "",
        }
    }

    /// Parse into a typed record, naming the first offending field on failure
    pub fn parse(&self) -> Result<ApplicantRecord> {
        let mut record = ApplicantRecord::default();
        for spec in NUMERIC_FIELDS.iter() {
            let raw = self.get(spec.name).trim();
            if raw.is_empty() {
                return Err(ExplainerError::invalid_input(spec.name, "a value is required"));
            }
            let v: f64 = raw.parse().map_err(|_| {
                ExplainerError::invalid_input(spec.name, format!("'{}' is not a number", raw))
            })?;
            if !v.is_finite() {
                return Err(ExplainerError::invalid_input(spec.name, "must be a finite number"));
            }
            record.set_numeric(spec.name, v);
        }
        record.reason = self.reason.parse()?;
        record.job = self.job.parse()?;
        Ok(record)
    }
}

impl From<&ApplicantRecord> for ApplicantForm {
    fn from(record: &ApplicantRecord) -> Self {
        let values = record.field_values();
        let get = |name: &str| {
            values
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        Self {
            loan: get("LOAN"),
            mortdue: get("MORTDUE"),
            value: get("VALUE"),
            yoj: get("YOJ"),
            derog: get("DEROG"),
            delinq: get("DELINQ"),
            clage: get("CLAGE"),
            ninq: get("NINQ"),
            clno: get("CLNO"),
            debtinc: get("DEBTINC"),
            reason: get("REASON"),
            job: get("JOB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_matches_form_defaults() {
        let record = ApplicantRecord::default();
        assert_eq!(record.loan, 10000.0);
        assert_eq!(record.debtinc, 30.0);
        assert_eq!(record.reason, Reason::DebtCon);
        assert_eq!(record.job, Job::Mgr);
    }

    #[test]
    fn test_json_uses_column_names() {
        let json = serde_json::to_value(ApplicantRecord::default()).unwrap();
        assert_eq!(json["LOAN"], 10000.0);
        assert_eq!(json["REASON"], "DebtCon");
        assert_eq!(json["JOB"], "Mgr");

        let mut record = ApplicantRecord::default();
        record.job = Job::SelfEmployed;
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["JOB"], "Self");
    }

    #[test]
    fn test_form_round_trip_through_text() {
        let record = ApplicantRecord::default();
        let form = ApplicantForm::from(&record);
        assert_eq!(form.loan, "10000");
        assert_eq!(form.debtinc, "30.0");
        assert_eq!(form.parse().unwrap(), record);
    }

    #[test]
    fn test_form_rejects_non_numeric() {
        let mut form = ApplicantForm::from(&ApplicantRecord::default());
        form.clage = "old".to_string();
        let err = form.parse().unwrap_err();
        match err {
            ExplainerError::InvalidInput { field, .. } => assert_eq!(field, "CLAGE"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_form_accepts_out_of_range_values() {
        let mut form = ApplicantForm::from(&ApplicantRecord::default());
        form.yoj = "-4".to_string();
        form.debtinc = "950.5".to_string();
        let record = form.parse().unwrap();
        assert_eq!(record.yoj, -4.0);
        assert_eq!(record.debtinc, 950.5);
    }

    #[test]
    fn test_form_rejects_unknown_job() {
        let mut form = ApplicantForm::from(&ApplicantRecord::default());
        form.job = "Astronaut".to_string();
        assert!(form.parse().is_err());
    }

    #[test]
    fn test_row_string_lists_every_field() {
        let text = ApplicantRecord::default().to_row_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with("LOAN"));
        assert!(lines[0].ends_with("10000"));
        assert!(lines[9].ends_with("30.0"));
        assert!(lines[10].ends_with("DebtCon"));
        assert!(lines[11].ends_with("Mgr"));
        // right-aligned values share a common width
        let widths: Vec<usize> = lines.iter().map(|l| l.len()).collect();
        assert!(widths.iter().all(|&w| w == widths[0]));
    }
}
