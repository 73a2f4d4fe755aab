//! Dense price × time probability grid.

/// Probability grid indexed `[price][time]`.
///
/// Column `t` holds the resampled distribution of the `t`-th expiry, so a
/// column sums to the mass the price axis retained for that expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
    time_axis: Vec<f64>,
    price_axis: Vec<f64>,
    probabilities: Vec<Vec<f64>>,
}

impl SurfaceGrid {
    /// Transpose per-expiry columns into a `[price][time]` grid.
    ///
    /// Every column must have one value per price.
    pub(crate) fn from_columns(time_axis: Vec<f64>, price_axis: Vec<f64>, columns: &[Vec<f64>]) -> Self {
        debug_assert_eq!(time_axis.len(), columns.len());
        let probabilities = (0..price_axis.len())
            .map(|i| columns.iter().map(|column| column[i]).collect())
            .collect();
        Self {
            time_axis,
            price_axis,
            probabilities,
        }
    }

    /// Days to expiry of each column, strictly increasing.
    #[inline]
    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    /// Evenly spaced prices of each row.
    #[inline]
    pub fn price_axis(&self) -> &[f64] {
        &self.price_axis
    }

    /// Rows of the grid, one per price.
    #[inline]
    pub fn probabilities(&self) -> &[Vec<f64>] {
        &self.probabilities
    }

    /// `(price points, time points)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.price_axis.len(), self.time_axis.len())
    }

    /// Probability at price index `i` and time index `t`.
    pub fn value(&self, i: usize, t: usize) -> Option<f64> {
        self.probabilities.get(i).and_then(|row| row.get(t)).copied()
    }

    /// Column `t` as a vector over prices.
    pub fn column(&self, t: usize) -> Option<Vec<f64>> {
        if t >= self.time_axis.len() {
            return None;
        }
        Some(self.probabilities.iter().map(|row| row[t]).collect())
    }

    /// Sum of column `t`.
    pub fn column_sum(&self, t: usize) -> Option<f64> {
        self.column(t).map(|c| c.iter().sum())
    }
}
