use serde::{Deserialize, Serialize};

/// An ordered sequence of per-period fractional returns.
///
/// Insertion order is chronological order. The ingestion layer produces one
/// of these per strategy (per-trade P/L divided by margin requirement); the
/// analytics crates only ever read it.
///
/// An empty series is a legal value. Consumers that would divide by a sample
/// statistic must check [`ReturnSeries::is_empty`] first and fall back to
/// their documented sentinel instead of raising.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    /// The trailing `n` observations (the whole series if it is shorter).
    ///
    /// Right-aligned truncation: the most recent observations are kept, which
    /// is what the return-matrix alignment relies on.
    pub fn tail(&self, n: usize) -> &[f64] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }
}

impl From<Vec<f64>> for ReturnSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl<'a> IntoIterator for &'a ReturnSeries {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_is_right_aligned() {
        let series = ReturnSeries::new(vec![0.01, -0.02, 0.03, 0.04]);
        assert_eq!(series.tail(2), &[0.03, 0.04]);
        assert_eq!(series.tail(10), series.as_slice());
    }

    #[test]
    fn empty_series_is_legal() {
        let series = ReturnSeries::default();
        assert!(series.is_empty());
        assert_eq!(series.tail(5), &[] as &[f64]);
    }
}
