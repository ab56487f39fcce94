use crate::core::sampling::parameters::{ParameterState, ProvidesParameters};

/// The slice of a replica's simulation state that restraint transformers read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemState {
    pub alpha: f64,
    pub parameters: ParameterState,
}

impl SystemState {
    pub fn new(alpha: f64, parameters: ParameterState) -> Self {
        Self { alpha, parameters }
    }
}

impl ProvidesParameters for SystemState {
    fn parameters(&self) -> &ParameterState {
        &self.parameters
    }
}
