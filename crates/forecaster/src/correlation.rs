//! Cross-Parameter Correlation

use water_quality::Parameter;

/// Known correlations between river parameters
pub static CORRELATIONS: [(Parameter, Parameter, f64); 5] = [
    (Parameter::DissolvedOxygen, Parameter::BiochemicalOxygenDemand, -0.7),
    (Parameter::DissolvedOxygen, Parameter::Temperature, -0.6),
    (Parameter::BiochemicalOxygenDemand, Parameter::Nitrate, 0.5),
    (Parameter::BiochemicalOxygenDemand, Parameter::FecalColiform, 0.4),
    (Parameter::Turbidity, Parameter::FecalColiform, 0.5),
];

/// Parameters correlated with `parameter` and their coefficients
pub fn predictors(parameter: Parameter) -> impl Iterator<Item = (Parameter, f64)> {
    CORRELATIONS.iter().filter_map(move |&(a, b, r)| {
        if a == parameter {
            Some((b, r))
        } else if b == parameter {
            Some((a, r))
        } else {
            None
        }
    })
}

/// Correlation-weighted mean of the predictors' relative departures
///
/// `departure` yields a predictor's relative change from its baseline, or
/// `None` when the predictor is not forecast. Zero without predictors.
pub fn correlated_departure<F>(parameter: Parameter, departure: F) -> f64
where
    F: Fn(Parameter) -> Option<f64>,
{
    let mut weighted = 0.0;
    let mut weight = 0.0;
    for (predictor, r) in predictors(parameter) {
        if let Some(rel) = departure(predictor) {
            weighted += r * rel;
            weight += r.abs();
        }
    }

    if weight > 0.0 {
        weighted / weight
    } else {
        0.0
    }
}
