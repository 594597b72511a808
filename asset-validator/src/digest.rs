//! Ranged quantile digest (C4): one approximate-quantile sketch per
//! block-number band, used to estimate the observed gas-usage ceiling
//! of token transfers on either side of a hard fork.
//!
//! Backed by [`hdrhistogram::Histogram`] rather than a literal t-digest
//! (see DESIGN.md for why); the `update`/`percentile`/`all`/`max_percentile`
//! operations are preserved exactly regardless of backend.

use hdrhistogram::{CreationError, Histogram};

/// Upper bound (exclusive) of recordable gas values. Comfortably above
/// any real Ethereum transaction's gas usage; samples above this are
/// clamped rather than dropped.
const HISTOGRAM_HIGH: u64 = 1_000_000_000;

/// `hdrhistogram` caps significant-figure precision at 5; below 1 the
/// histogram couldn't distinguish adjacent values at all.
const MIN_SIGNIFICANT_FIGURES: u8 = 1;
const MAX_SIGNIFICANT_FIGURES: u8 = 5;

/// Converts a target relative accuracy (`digest.delta` in settings, the
/// t-digest-style tuning knob §4.4/§9 describe) into the significant-figures
/// precision `hdrhistogram` actually takes. A `delta` of `0.01` (1% relative
/// accuracy) maps to 3 significant figures, matching this crate's original
/// hardcoded default.
fn significant_figures_for_delta(delta: f64) -> u8 {
    let raw = (-delta.log10()).ceil() + 1.0;
    if raw < f64::from(MIN_SIGNIFICANT_FIGURES) {
        MIN_SIGNIFICANT_FIGURES
    } else if raw > f64::from(MAX_SIGNIFICANT_FIGURES) {
        MAX_SIGNIFICANT_FIGURES
    } else {
        raw as u8
    }
}

/// One sketch per block-number band, keyed by an ascending list of
/// upper-bound block numbers. The last key acts as the sentinel for
/// "current chain tip" and absorbs every sample at or above it.
#[derive(Debug)]
pub struct RangedQuantileDigest {
    keys: Vec<u64>,
    bands: Vec<Histogram<u64>>,
}

impl RangedQuantileDigest {
    /// Build a digest with one band per entry in `keys`, which must be
    /// non-empty and strictly ascending. `delta` is the target relative
    /// accuracy (`digest.delta` in settings); it is converted into the
    /// significant-figures precision each band's histogram is built with.
    ///
    /// # Errors
    /// Returns an error if a band's histogram cannot be constructed.
    pub fn new(keys: Vec<u64>, delta: f64) -> Result<Self, CreationError> {
        debug_assert!(!keys.is_empty(), "a digest needs at least one band");
        debug_assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys must be strictly ascending");

        let sigfig = significant_figures_for_delta(delta);
        let mut bands = Vec::with_capacity(keys.len());
        for _ in &keys {
            bands.push(Histogram::new_with_bounds(1, HISTOGRAM_HIGH, sigfig)?);
        }

        Ok(Self { keys, bands })
    }

    fn band_index(&self, block_number: u64) -> usize {
        self.keys
            .iter()
            .position(|&key| key > block_number)
            .unwrap_or(self.keys.len() - 1)
    }

    /// Route `sample` (e.g. a `gasUsed` value) into the band whose key
    /// is the smallest strictly greater than `block_number`; samples at
    /// or above the last key land in the last band.
    pub fn update(&mut self, block_number: u64, sample: u64) {
        let index = self.band_index(block_number);
        let clamped = sample.min(HISTOGRAM_HIGH - 1);
        // `record` only fails when the value falls outside the
        // histogram's configured bounds, which `clamped` guarantees
        // against.
        let _ = self.bands[index].record(clamped);
    }

    /// Approximate `p`-th percentile of the band at `band_index`, or
    /// `0.0` if that band has no samples.
    #[must_use]
    pub fn percentile(&self, band_index: usize, p: f64) -> f64 {
        self.bands.get(band_index).map_or(0.0, |h| {
            if h.len() == 0 {
                0.0
            } else {
                h.value_at_percentile(p) as f64
            }
        })
    }

    /// Percentile `p` for every band, keyed by the band's upper bound.
    #[must_use]
    pub fn all(&self, p: f64) -> Vec<(u64, f64)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(index, &key)| (key, self.percentile(index, p)))
            .collect()
    }

    /// Maximum percentile `p` across all bands.
    #[must_use]
    pub fn max_percentile(&self, p: f64) -> f64 {
        self.all(p).into_iter().map(|(_, value)| value).fold(0.0, f64::max)
    }

    /// Total number of samples recorded across all bands.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.bands.iter().map(Histogram::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_below_first_key_goes_to_first_band() {
        let mut digest = RangedQuantileDigest::new(vec![100, 1000], 0.01).expect("valid bounds");
        digest.update(50, 21_000);
        assert_eq!(digest.all(50.0)[0].1, 21_000.0);
        assert_eq!(digest.percentile(1, 50.0), 0.0);
    }

    #[test]
    fn sample_exactly_at_a_key_goes_to_the_next_higher_band() {
        let mut digest = RangedQuantileDigest::new(vec![100, 1000], 0.01).expect("valid bounds");
        digest.update(100, 21_000);
        assert_eq!(digest.percentile(0, 50.0), 0.0);
        assert_eq!(digest.percentile(1, 50.0), 21_000.0);
    }

    #[test]
    fn sample_at_or_above_last_key_goes_to_last_band() {
        let mut digest = RangedQuantileDigest::new(vec![100, 1000], 0.01).expect("valid bounds");
        digest.update(5_000_000, 50_000);
        assert_eq!(digest.percentile(1, 50.0), 50_000.0);
    }

    #[test]
    fn count_is_the_sum_of_band_counts() {
        let mut digest = RangedQuantileDigest::new(vec![100, 1000], 0.01).expect("valid bounds");
        digest.update(10, 1);
        digest.update(500, 2);
        digest.update(2000, 3);
        assert_eq!(digest.count(), 3);
    }

    #[test]
    fn max_percentile_is_the_maximum_over_all_bands() {
        let mut digest = RangedQuantileDigest::new(vec![100, 1000], 0.01).expect("valid bounds");
        digest.update(10, 21_000);
        digest.update(2000, 60_000);
        assert_eq!(digest.max_percentile(100.0), 60_000.0);
    }

    #[test]
    fn empty_band_percentile_is_zero() {
        let digest = RangedQuantileDigest::new(vec![100], 0.01).expect("valid bounds");
        assert_eq!(digest.percentile(0, 50.0), 0.0);
        assert_eq!(digest.max_percentile(100.0), 0.0);
        assert_eq!(digest.count(), 0);
    }

    #[test]
    fn delta_of_one_percent_matches_the_historical_hardcoded_precision() {
        assert_eq!(significant_figures_for_delta(0.01), 3);
    }

    #[test]
    fn extreme_deltas_clamp_to_hdrhistograms_supported_range() {
        assert_eq!(significant_figures_for_delta(20.0), MIN_SIGNIFICANT_FIGURES);
        assert_eq!(significant_figures_for_delta(0.000_001), MAX_SIGNIFICANT_FIGURES);
    }
}
