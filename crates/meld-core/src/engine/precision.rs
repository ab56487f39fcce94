use nalgebra::DMatrix;

/// Diagonal and strictly-upper-triangular entries of a precision-matrix stack.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrecisionTerms {
    /// `precisions[c][(d, d)]`, component-major.
    pub diagonals: Vec<f64>,
    /// `precisions[c][(j, k)]` for `j < k`, components outer, then `j`, then `k`.
    pub off_diagonals: Vec<f64>,
}

/// Splits symmetric precision matrices into the two flat vectors a GMM force expects.
///
/// No clamping or conditioning checks happen here.
pub fn decompose_precisions(precisions: &[DMatrix<f64>]) -> PrecisionTerms {
    let mut terms = PrecisionTerms::default();
    for precision in precisions {
        let n = precision.nrows();
        terms
            .diagonals
            .extend((0..n).map(|d| precision[(d, d)]));
        for j in 0..n {
            terms
                .off_diagonals
                .extend((j + 1..n).map(|k| precision[(j, k)]));
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> Vec<DMatrix<f64>> {
        vec![
            DMatrix::from_row_slice(3, 3, &[1.0, 0.1, 0.2, 0.1, 2.0, 0.3, 0.2, 0.3, 3.0]),
            DMatrix::from_row_slice(3, 3, &[4.0, 0.4, 0.5, 0.4, 5.0, 0.6, 0.5, 0.6, 6.0]),
        ]
    }

    #[test]
    fn diagonals_are_component_major() {
        let terms = decompose_precisions(&stack());
        assert_eq!(terms.diagonals, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn off_diagonals_follow_upper_triangle_order() {
        let terms = decompose_precisions(&stack());
        assert_eq!(terms.off_diagonals, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn single_distance_has_no_off_diagonals() {
        let terms = decompose_precisions(&[DMatrix::from_element(1, 1, 9.0)]);
        assert_eq!(terms.diagonals, vec![9.0]);
        assert!(terms.off_diagonals.is_empty());
    }

    #[test]
    fn empty_stack_yields_empty_terms() {
        assert_eq!(decompose_precisions(&[]), PrecisionTerms::default());
    }
}
