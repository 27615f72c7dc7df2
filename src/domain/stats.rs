// Summary statistics over a numeric sequence
use serde::Serialize;

/// Derived summary of a value sequence. Never stored; recomputed on demand.
///
/// `stability` is a [0, 100] score, higher meaning less relative variance:
/// `(1 - std/|mean|) * 100`, clamped, with a hard 0 for a zero mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub stability: f64,
}

/// Mean, min, max, population standard deviation and stability for `values`.
/// An empty sequence has no statistics at all, not zeroes.
pub fn summarize(values: &[f64]) -> Option<Stats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(*v);
        max = max.max(*v);
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let stability = if mean == 0.0 {
        0.0
    } else {
        ((1.0 - std_dev / mean.abs()) * 100.0).clamp(0.0, 100.0)
    };

    Some(Stats {
        mean,
        min,
        max,
        std_dev,
        stability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_stats() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = summarize(&[5.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.stability, 100.0);
    }

    #[test]
    fn test_zero_mean_pins_stability_to_zero() {
        let stats = summarize(&[-1.0, 1.0]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 1.0);
        assert_eq!(stats.stability, 0.0);
    }

    #[test]
    fn test_population_std_dev() {
        // Population (not sample) standard deviation over the full sequence.
        let stats = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert!((stats.stability - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability_clamped_at_zero_for_wild_series() {
        // std greatly exceeds |mean|; the raw formula would go negative.
        let stats = summarize(&[-100.0, 101.0]).unwrap();
        assert_eq!(stats.stability, 0.0);
    }
}
