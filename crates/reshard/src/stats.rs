//! Summary statistics over churn samples.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChurnStats {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl ChurnStats {
    /// `None` when there are no samples.
    pub fn from_samples(samples: &[usize]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;
        let count = samples.len();
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / count as f64;
        let variance = samples
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Some(Self {
            count,
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        let stats = ChurnStats::from_samples(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.min, 2);
        assert_eq!(stats.max, 9);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);
    }

    #[test]
    fn test_single_sample() {
        let stats = ChurnStats::from_samples(&[17]).unwrap();
        assert_eq!((stats.min, stats.max), (17, 17));
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(ChurnStats::from_samples(&[]), None);
    }

    proptest! {
        #[test]
        fn prop_ordering_holds(samples in prop::collection::vec(0usize..100_000, 1..300)) {
            let stats = ChurnStats::from_samples(&samples).unwrap();
            prop_assert!(stats.min as f64 <= stats.mean + 1e-9);
            prop_assert!(stats.mean <= stats.max as f64 + 1e-9);
            prop_assert!(stats.std_dev >= 0.0);
            prop_assert_eq!(stats.count, samples.len());
        }
    }
}
