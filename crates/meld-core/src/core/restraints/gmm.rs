use super::error::RestraintError;
use super::schedule::{Ramp, Scaler};
use nalgebra::DMatrix;

const SYMMETRY_TOLERANCE: f64 = 1e-6;
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A restraint whose energy is the negative log of a Gaussian mixture over several
/// atom-pair distances.
///
/// Shapes are checked on construction: `atoms` holds one pair per distance, `means` is
/// `n_components x n_distances`, and each of the `n_components` precision matrices is a
/// symmetric `n_distances x n_distances` matrix. The matrices are not checked for
/// conditioning; callers that build them from sparse data should clamp them first.
#[derive(Debug, Clone, PartialEq)]
pub struct GmmDistanceRestraint {
    n_distances: usize,
    n_components: usize,
    atoms: Vec<usize>,
    weights: Vec<f64>,
    means: DMatrix<f64>,
    precisions: Vec<DMatrix<f64>>,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl GmmDistanceRestraint {
    pub fn new(
        atom_pairs: Vec<(usize, usize)>,
        weights: Vec<f64>,
        means: DMatrix<f64>,
        precisions: Vec<DMatrix<f64>>,
    ) -> Result<Self, RestraintError> {
        let n_distances = atom_pairs.len();
        let n_components = weights.len();

        if n_distances == 0 {
            return Err(RestraintError::Empty("GMM distance set"));
        }
        if n_components == 0 {
            return Err(RestraintError::Empty("GMM component set"));
        }
        if let Some(&(a, b)) = atom_pairs.iter().find(|(a, b)| a == b) {
            return Err(RestraintError::DuplicateAtoms(vec![a, b]));
        }
        if means.shape() != (n_components, n_distances) {
            return Err(shape_error(
                "means",
                (n_components, n_distances),
                means.shape(),
            ));
        }
        if precisions.len() != n_components {
            return Err(RestraintError::GmmShape {
                field: "precisions",
                expected: format!("{n_components} matrices"),
                found: format!("{} matrices", precisions.len()),
            });
        }
        for (component, precision) in precisions.iter().enumerate() {
            if precision.shape() != (n_distances, n_distances) {
                return Err(shape_error(
                    "precisions",
                    (n_distances, n_distances),
                    precision.shape(),
                ));
            }
            if !is_symmetric(precision) {
                return Err(RestraintError::AsymmetricPrecision { component });
            }
        }
        if weights.iter().any(|&w| w < 0.0) {
            return Err(RestraintError::InvalidParameter {
                field: "weights",
                reason: "weights must be non-negative".to_string(),
            });
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RestraintError::InvalidParameter {
                field: "weights",
                reason: format!("weights must sum to 1, got {total}"),
            });
        }

        let atoms = atom_pairs.into_iter().flat_map(|(a, b)| [a, b]).collect();

        Ok(Self {
            n_distances,
            n_components,
            atoms,
            weights,
            means,
            precisions,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        })
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    /// Shape invariants hold by construction, so only the schedules need checking.
    pub fn validate(&self) -> Result<(), RestraintError> {
        self.scaler.validate()?;
        self.ramp.validate()
    }

    pub fn n_distances(&self) -> usize {
        self.n_distances
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Flat atom list, two indices per distance.
    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn means(&self) -> &DMatrix<f64> {
        &self.means
    }

    /// Means flattened in component-major order.
    pub fn flat_means(&self) -> Vec<f64> {
        // DMatrix storage is column-major; the transpose's storage is the row-major walk.
        self.means.transpose().iter().copied().collect()
    }

    pub fn precisions(&self) -> &[DMatrix<f64>] {
        &self.precisions
    }
}

fn is_symmetric(matrix: &DMatrix<f64>) -> bool {
    let n = matrix.nrows();
    (0..n).all(|j| (j + 1..n).all(|k| (matrix[(j, k)] - matrix[(k, j)]).abs() <= SYMMETRY_TOLERANCE))
}

fn shape_error(field: &'static str, expected: (usize, usize), found: (usize, usize)) -> RestraintError {
    RestraintError::GmmShape {
        field,
        expected: format!("{}x{}", expected.0, expected.1),
        found: format!("{}x{}", found.0, found.1),
    }
}
