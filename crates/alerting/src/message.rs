//! Alert Title and Message Text

use risk_classifier::{Evaluation, ParameterReading, RiskLevel};

/// Human-readable alert text
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    /// Build the title and message naming the offending parameters
    pub fn from_evaluation(evaluation: &Evaluation, location_name: &str) -> Self {
        if evaluation.is_normal() {
            return Self {
                title: format!("Water Quality Normal - {}", location_name),
                body: "All water quality parameters are within acceptable limits.".to_string(),
            };
        }

        let exceedances = evaluation.exceedances();
        let label = evaluation.overall.label();
        let mut body = format!(
            "Water quality monitoring detected {} parameter(s) outside normal ranges.",
            exceedances.len()
        );

        let groups: [(&str, fn(RiskLevel) -> bool); 3] = [
            ("Critical issues", |l| l >= RiskLevel::Critical),
            ("Warning levels", |l| l == RiskLevel::Warning),
            ("Advisory levels", |l| l == RiskLevel::Advisory),
        ];
        for (heading, in_group) in groups {
            let names = names_where(&exceedances, in_group);
            if !names.is_empty() {
                body.push_str(&format!(" {}: {}.", heading, names));
            }
        }

        body.push_str(&format!(
            " Immediate attention required for {} level conditions.",
            label.to_lowercase()
        ));

        Self {
            title: format!("{} Alert - {}", label, location_name),
            body,
        }
    }
}

fn names_where(readings: &[&ParameterReading], in_group: fn(RiskLevel) -> bool) -> String {
    readings
        .iter()
        .filter(|r| in_group(r.level))
        .map(|r| r.parameter.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}
