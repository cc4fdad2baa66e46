//! Quality Index and Forecast Alert Scoring

use crate::model::{ForecastAlert, ForecastSeverity, StatusClass};
use std::collections::BTreeMap;
use water_quality::Parameter;

/// Parameters the forecaster projects, with their quality-index weights
pub const INDEX_WEIGHTS: [(Parameter, f64); 6] = [
    (Parameter::DissolvedOxygen, 0.20),
    (Parameter::BiochemicalOxygenDemand, 0.20),
    (Parameter::Nitrate, 0.15),
    (Parameter::FecalColiform, 0.20),
    (Parameter::Ph, 0.15),
    (Parameter::Turbidity, 0.10),
];

/// Weighted mean class score over the forecast parameters present
///
/// Rounded to a whole number; zero when none are present.
pub fn quality_index(classes: &BTreeMap<Parameter, StatusClass>) -> f64 {
    let (score, weight) = INDEX_WEIGHTS
        .iter()
        .filter_map(|(p, w)| classes.get(p).map(|c| (c.score() * w, *w)))
        .fold((0.0, 0.0), |(s, tw), (cs, w)| (s + cs, tw + w));

    if weight > 0.0 {
        (score / weight).round()
    } else {
        0.0
    }
}

/// Severity of a predicted status, if it warrants an alert
///
/// `strength` is the projected per-day change relative to the latest value.
pub fn alert_severity(status: StatusClass, strength: f64, day: u32) -> Option<ForecastSeverity> {
    match status {
        StatusClass::Poor if strength > 0.2 || day <= 2 => Some(ForecastSeverity::High),
        StatusClass::Poor if strength > 0.1 || day <= 4 => Some(ForecastSeverity::Medium),
        StatusClass::Poor => Some(ForecastSeverity::Low),
        StatusClass::Moderate if strength > 0.15 => Some(ForecastSeverity::Medium),
        _ => None,
    }
}

/// Suggested response to a predicted status
pub fn recommended_action(parameter: Parameter, status: StatusClass) -> &'static str {
    use Parameter::*;
    use StatusClass::*;

    match (parameter, status) {
        (DissolvedOxygen, Poor) => "Deploy aeration and restrict organic discharges upstream",
        (DissolvedOxygen, Moderate) => "Monitor dissolved oxygen at dawn and prepare aeration",
        (BiochemicalOxygenDemand, Poor) => "Inspect sewage outfalls and enforce effluent limits",
        (BiochemicalOxygenDemand, Moderate) => "Increase BOD sampling near outfalls",
        (Nitrate, Poor) => "Trace agricultural runoff and advise against drinking use",
        (Nitrate, Moderate) => "Review fertilizer application in the catchment",
        (FecalColiform, Poor) => "Issue bathing and drinking advisories and inspect sewage treatment",
        (FecalColiform, Moderate) => "Increase coliform testing at bathing ghats",
        (Ph, Poor) => "Investigate industrial outfalls for acid or alkali releases",
        (Ph, Moderate) => "Verify pH sensors and watch industrial discharges",
        (Turbidity, Poor) => "Check for erosion or dredging and warn treatment plants",
        (Turbidity, Moderate) => "Monitor sediment load after rainfall",
        _ => "Continue routine monitoring",
    }
}

pub(crate) fn forecast_alert(
    parameter: Parameter,
    status: StatusClass,
    severity: ForecastSeverity,
    predicted: f64,
    day: u32,
) -> ForecastAlert {
    let status_name = match status {
        StatusClass::Good => "good",
        StatusClass::Moderate => "moderate",
        StatusClass::Poor => "poor",
    };
    let reading = match parameter.unit() {
        "" => format!("{:.2}", predicted),
        unit => format!("{:.2} {}", predicted, unit),
    };
    ForecastAlert {
        day,
        parameter,
        severity,
        message: format!(
            "{} predicted {} on day {} ({})",
            parameter.display_name(),
            status_name,
            day,
            reading
        ),
        recommended_action: recommended_action(parameter, status).to_string(),
    }
}
