//! Frequency-weighted sampling of dataset records.
//!
//! A uniform integer `r` in `[1, total_frequency]` is drawn and mapped back
//! to the record whose cumulative frequency range contains it. Records with
//! higher frequency are proportionally more likely to be corrected.

use rand::Rng;

use crate::error::{HgError, Result};
use crate::types::{Dataset, Datum};

/// Draws records from one dataset.
#[derive(Debug, Clone)]
pub struct SampleSelector<'a> {
    data: &'a [Datum],
    /// cumulative[i] = sum of frequencies of records 0..=i
    cumulative: Vec<u64>,
}

impl<'a> SampleSelector<'a> {
    /// Fails on an empty dataset or one whose frequencies sum to zero.
    pub fn new(dataset: &'a Dataset) -> Result<Self> {
        let mut running = 0u64;
        let cumulative: Vec<u64> = dataset
            .iter()
            .map(|d| {
                running += d.frequency;
                running
            })
            .collect();

        if running == 0 {
            return Err(HgError::malformed(
                "dataset",
                "no records with a positive frequency",
            ));
        }

        Ok(Self {
            data: dataset.as_slice(),
            cumulative,
        })
    }

    pub fn total_frequency(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Record whose cumulative range contains `r` (1-based).
    fn locate(&self, r: u64) -> &'a Datum {
        let idx = self.cumulative.partition_point(|&c| c < r);
        &self.data[idx.min(self.data.len() - 1)]
    }

    /// Draw the next record to learn from.
    pub fn next_datum<R: Rng>(&self, rng: &mut R) -> &'a Datum {
        let r = rng.gen_range(1..=self.total_frequency());
        self.locate(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Datum::new("A", vec![CandidateId::from("1")]).with_frequency(1),
            Datum::new("B", vec![CandidateId::from("1")]).with_frequency(3),
            Datum::new("C", vec![CandidateId::from("1")]).with_frequency(6),
        ])
    }

    #[test]
    fn test_locate_boundaries() {
        let data = dataset();
        let selector = SampleSelector::new(&data).unwrap();
        assert_eq!(selector.total_frequency(), 10);
        assert_eq!(selector.locate(1).input, "A");
        assert_eq!(selector.locate(2).input, "B");
        assert_eq!(selector.locate(4).input, "B");
        assert_eq!(selector.locate(5).input, "C");
        assert_eq!(selector.locate(10).input, "C");
    }

    #[test]
    fn test_draws_are_deterministic_for_seed() {
        let data = dataset();
        let selector = SampleSelector::new(&data).unwrap();

        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let first: Vec<_> = (0..50).map(|_| selector.next_datum(&mut a).input.clone()).collect();
        let second: Vec<_> = (0..50).map(|_| selector.next_datum(&mut b).input.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_draws_follow_frequencies() {
        let data = dataset();
        let selector = SampleSelector::new(&data).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            match selector.next_datum(&mut rng).input.as_str() {
                "A" => counts[0] += 1,
                "B" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        // Expected 1000 / 3000 / 6000
        assert!(counts[0] > 700 && counts[0] < 1300);
        assert!(counts[1] > 2600 && counts[1] < 3400);
        assert!(counts[2] > 5500 && counts[2] < 6500);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let data = Dataset::default();
        assert!(SampleSelector::new(&data).is_err());
    }
}
