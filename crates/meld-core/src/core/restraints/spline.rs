use super::error::RestraintError;

/// Per-bin spline coefficients for a profile restraint, stored column by column.
///
/// `C` is the number of coefficient types (4 for a one-dimensional distance profile,
/// 16 for a bicubic torsion profile). Every column holds exactly one entry per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineCoefficients<const C: usize> {
    n_bins: usize,
    columns: [Vec<f64>; C],
}

pub type DistProfileCoefficients = SplineCoefficients<4>;
pub type TorsProfileCoefficients = SplineCoefficients<16>;

impl<const C: usize> SplineCoefficients<C> {
    pub fn new(n_bins: usize, columns: [Vec<f64>; C]) -> Result<Self, RestraintError> {
        if n_bins == 0 {
            return Err(RestraintError::InvalidParameter {
                field: "n_bins",
                reason: "a profile needs at least one bin".to_string(),
            });
        }
        for (column, values) in columns.iter().enumerate() {
            if values.len() != n_bins {
                return Err(RestraintError::SplineLength {
                    column,
                    expected: n_bins,
                    found: values.len(),
                });
            }
        }
        Ok(Self { n_bins, columns })
    }

    /// Builds the columns from a bin-major table, one row of `C` coefficients per bin.
    pub fn from_rows(rows: &[[f64; C]]) -> Result<Self, RestraintError> {
        let columns = std::array::from_fn(|c| rows.iter().map(|row| row[c]).collect());
        Self::new(rows.len(), columns)
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &[Vec<f64>; C] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_transposes_into_columns() {
        let coeffs = DistProfileCoefficients::from_rows(&[
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
        ])
        .unwrap();

        assert_eq!(coeffs.n_bins(), 3);
        assert_eq!(coeffs.column(0), Some(&[1.0, 5.0, 9.0][..]));
        assert_eq!(coeffs.column(3), Some(&[4.0, 8.0, 12.0][..]));
        assert_eq!(coeffs.column(4), None);
    }

    #[test]
    fn new_rejects_column_with_wrong_length() {
        let result = DistProfileCoefficients::new(
            2,
            [vec![0.0; 2], vec![0.0; 2], vec![0.0; 1], vec![0.0; 2]],
        );
        assert_eq!(
            result,
            Err(RestraintError::SplineLength {
                column: 2,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn new_rejects_zero_bins() {
        let result = TorsProfileCoefficients::from_rows(&[]);
        assert!(matches!(
            result,
            Err(RestraintError::InvalidParameter { field: "n_bins", .. })
        ));
    }

    #[test]
    fn torsion_profile_keeps_all_sixteen_columns() {
        let row: [f64; 16] = std::array::from_fn(|i| i as f64);
        let coeffs = TorsProfileCoefficients::from_rows(&[row, row]).unwrap();
        assert_eq!(coeffs.columns().len(), 16);
        assert_eq!(coeffs.column(15), Some(&[15.0, 15.0][..]));
    }
}
