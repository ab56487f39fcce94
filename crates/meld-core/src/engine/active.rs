use super::error::TransformError;
use crate::core::restraints::groups::NumActive;
use crate::core::sampling::parameters::{ParameterSampler, ProvidesParameters};

/// Resolves how many members of a group or collection are currently enforced.
///
/// Sampled values are truncated toward zero.
pub fn resolve_num_active(
    num_active: &NumActive,
    sampler: &dyn ParameterSampler,
    state: &dyn ProvidesParameters,
) -> Result<usize, TransformError> {
    match num_active {
        NumActive::Literal(n) => Ok(*n),
        NumActive::Sampled(parameter) => {
            let value = sampler.extract_value(parameter, state.parameters())?;
            let truncated = value.trunc();
            if !truncated.is_finite() || truncated < 0.0 {
                return Err(TransformError::InvalidNumActive {
                    parameter: parameter.name().to_string(),
                    value,
                });
            }
            // `-0.0` passes the sign check and casts to 0.
            Ok(truncated as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampling::parameters::{
        Parameter, ParameterManager, ParameterState, SamplingError,
    };

    struct FixedSampler(f64);

    impl ParameterSampler for FixedSampler {
        fn extract_value(
            &self,
            _parameter: &Parameter,
            _state: &ParameterState,
        ) -> Result<f64, SamplingError> {
            Ok(self.0)
        }
    }

    fn sampled() -> NumActive {
        let mut manager = ParameterManager::new();
        NumActive::Sampled(manager.add_continuous_parameter("n", 1.0, 0.0, 10.0).unwrap())
    }

    #[test]
    fn literal_count_ignores_state() {
        let state = ParameterState::new(vec![9], vec![9.0]);
        let n = resolve_num_active(&NumActive::Literal(3), &FixedSampler(7.0), &state).unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn sampled_count_is_truncated() {
        let n = resolve_num_active(&sampled(), &FixedSampler(2.7), &ParameterState::default())
            .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn sampled_count_reads_the_parameter_state() {
        let mut manager = ParameterManager::new();
        let p = manager.add_discrete_parameter("n", 1, 0, 5).unwrap();
        let state = ParameterState::new(vec![4], vec![]);
        let n = resolve_num_active(&NumActive::Sampled(p), &manager, &state).unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn small_negative_value_truncates_to_zero() {
        let n = resolve_num_active(&sampled(), &FixedSampler(-0.5), &ParameterState::default())
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn negative_or_non_finite_counts_are_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let result = resolve_num_active(&sampled(), &FixedSampler(bad), &ParameterState::default());
            assert!(matches!(result, Err(TransformError::InvalidNumActive { .. })));
        }
    }

    #[test]
    fn sampling_errors_are_propagated() {
        let mut manager = ParameterManager::new();
        let p = manager.add_discrete_parameter("n", 1, 0, 5).unwrap();
        let result = resolve_num_active(&NumActive::Sampled(p), &manager, &ParameterState::default());
        assert!(matches!(result, Err(TransformError::Sampling { .. })));
    }
}
