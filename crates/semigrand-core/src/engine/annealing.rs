use super::boundary::BoundaryRange;
use super::config::AnnealingConfig;
use super::error::EngineError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Visit counts per occupancy since the last flatness reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitHistogram {
    counts: Vec<u64>,
}

impl VisitHistogram {
    pub fn zeros(capacity: usize) -> Self {
        Self {
            counts: vec![0; capacity],
        }
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    pub fn capacity(&self) -> usize {
        self.counts.len()
    }

    pub fn record(&mut self, occupancy: usize) -> Result<(), EngineError> {
        let capacity = self.counts.len();
        let slot = self
            .counts
            .get_mut(occupancy)
            .ok_or(EngineError::OccupancyOutOfRange {
                occupancy,
                capacity,
            })?;
        *slot += 1;
        Ok(())
    }

    pub fn count(&self, occupancy: usize) -> u64 {
        self.counts.get(occupancy).copied().unwrap_or(0)
    }

    /// Zeroes every bin over the full allocated range.
    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Mean count over the bins of `range`.
    pub fn mean_over(&self, range: &BoundaryRange) -> f64 {
        let total: u64 = (range.lower()..=range.upper()).map(|z| self.count(z)).sum();
        total as f64 / range.bins() as f64
    }

    /// True iff every bin in `range` deviates from the in-range mean by at most
    /// `tolerance` relative to that mean. An empty range histogram is never flat.
    pub fn is_flat(&self, range: &BoundaryRange, tolerance: f64) -> bool {
        let mean = self.mean_over(range);
        if mean <= 0.0 {
            return false;
        }
        (range.lower()..=range.upper())
            .all(|z| (self.count(z) as f64 - mean).abs() / mean <= tolerance)
    }
}

/// Outcome of one flatness check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlatnessVerdict {
    Accumulating,
    Annealed {
        weight_step: f64,
        flatness_criteria: f64,
    },
}

/// Wang-Landau step-size schedule driven by histogram flatness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatnessAnnealer {
    weight_step: f64,
    flatness_criteria: f64,
}

impl FlatnessAnnealer {
    pub fn new(config: AnnealingConfig) -> Self {
        Self {
            weight_step: config.weight_step,
            flatness_criteria: config.flatness_criteria,
        }
    }

    pub fn weight_step(&self) -> f64 {
        self.weight_step
    }

    pub fn flatness_criteria(&self) -> f64 {
        self.flatness_criteria
    }

    /// The additive bias increment for one visit, `ln(weight_step)`.
    pub fn log_increment(&self) -> f64 {
        self.weight_step.ln()
    }

    /// Checks `histogram` and, if flat over `range`, halves the tolerance,
    /// takes the square root of the weight step and clears the histogram.
    pub fn observe(
        &mut self,
        histogram: &mut VisitHistogram,
        range: &BoundaryRange,
    ) -> FlatnessVerdict {
        if !histogram.is_flat(range, self.flatness_criteria) {
            return FlatnessVerdict::Accumulating;
        }

        self.flatness_criteria /= 2.0;
        self.weight_step = self.weight_step.sqrt();
        histogram.clear();
        info!(
            weight_step = self.weight_step,
            flatness_criteria = self.flatness_criteria,
            "Histogram flat; annealed weight step."
        );
        FlatnessVerdict::Annealed {
            weight_step: self.weight_step,
            flatness_criteria: self.flatness_criteria,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annealer(weight_step: f64, tolerance: f64) -> FlatnessAnnealer {
        FlatnessAnnealer::new(AnnealingConfig::new(weight_step, tolerance).unwrap())
    }

    #[test]
    fn uniform_histogram_triggers_annealing() {
        let range = BoundaryRange::new(0, 3).unwrap();
        let mut histogram = VisitHistogram::from_counts(vec![10, 10, 10, 10]);
        let mut annealer = annealer(4.0, 0.05);

        let verdict = annealer.observe(&mut histogram, &range);

        assert_eq!(
            verdict,
            FlatnessVerdict::Annealed {
                weight_step: 2.0,
                flatness_criteria: 0.025
            }
        );
        assert_eq!(annealer.weight_step(), 2.0);
        assert_eq!(annealer.flatness_criteria(), 0.025);
        assert!(histogram.as_slice().iter().all(|&c| c == 0));
    }

    #[test]
    fn uneven_histogram_leaves_state_untouched() {
        let range = BoundaryRange::new(0, 3).unwrap();
        let mut histogram = VisitHistogram::from_counts(vec![5, 10, 15, 10]);
        let mut annealer = annealer(4.0, 0.05);

        assert_eq!(histogram.mean_over(&range), 10.0);
        let verdict = annealer.observe(&mut histogram, &range);

        assert_eq!(verdict, FlatnessVerdict::Accumulating);
        assert_eq!(annealer.weight_step(), 4.0);
        assert_eq!(annealer.flatness_criteria(), 0.05);
        assert_eq!(histogram.as_slice(), &[5, 10, 15, 10]);
    }

    #[test]
    fn flatness_only_considers_bins_inside_the_range() {
        let range = BoundaryRange::new(1, 2).unwrap();
        let mut histogram = VisitHistogram::from_counts(vec![100, 7, 7, 0]);
        let mut annealer = annealer(2.0, 0.01);

        assert!(matches!(
            annealer.observe(&mut histogram, &range),
            FlatnessVerdict::Annealed { .. }
        ));
        // Clearing spans the whole allocation, including out-of-range bins.
        assert_eq!(histogram.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn empty_histogram_is_not_flat() {
        let range = BoundaryRange::new(0, 2).unwrap();
        let mut histogram = VisitHistogram::zeros(3);
        let mut annealer = annealer(2.0, 0.5);
        assert_eq!(
            annealer.observe(&mut histogram, &range),
            FlatnessVerdict::Accumulating
        );
    }

    #[test]
    fn successive_anneals_shrink_both_parameters() {
        let range = BoundaryRange::new(0, 1).unwrap();
        let mut annealer = annealer(std::f64::consts::E, 0.2);
        let mut previous = (annealer.weight_step(), annealer.flatness_criteria());
        for _ in 0..4 {
            let mut histogram = VisitHistogram::from_counts(vec![3, 3]);
            annealer.observe(&mut histogram, &range);
            assert!(annealer.weight_step() < previous.0);
            assert!(annealer.flatness_criteria() < previous.1);
            previous = (annealer.weight_step(), annealer.flatness_criteria());
        }
        assert!((annealer.log_increment() - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn record_rejects_occupancy_outside_allocation() {
        let mut histogram = VisitHistogram::zeros(2);
        histogram.record(1).unwrap();
        assert_eq!(histogram.count(1), 1);
        assert!(histogram.record(2).is_err());
    }
}
