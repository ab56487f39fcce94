use super::error::TransformError;
use super::force::Backend;
use super::transformer::Transformer;
use crate::core::sampling::parameters::ProvidesParameters;

/// Runs a sequence of transformers against the same system, in insertion order.
pub struct TransformerPipeline<B: Backend> {
    transformers: Vec<Box<dyn Transformer<B>>>,
}

impl<B: Backend> Default for TransformerPipeline<B> {
    fn default() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }
}

impl<B: Backend> TransformerPipeline<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transformer: Box<dyn Transformer<B>>) {
        self.transformers.push(transformer);
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Threads the system through every transformer's `add_interactions`, then
    /// finalizes each against the completed system.
    pub fn build_system(
        &mut self,
        state: &dyn ProvidesParameters,
        mut system: B::System,
        topology: &B::Topology,
    ) -> Result<B::System, TransformError> {
        for transformer in &mut self.transformers {
            system = transformer.add_interactions(state, system, topology)?;
        }
        for transformer in &mut self.transformers {
            transformer.finalize(state, &system, topology)?;
        }
        Ok(system)
    }

    /// Updates every transformer for one step. The first failure aborts the step.
    pub fn update(
        &mut self,
        state: &dyn ProvidesParameters,
        context: &mut B::Context,
        alpha: f64,
        timestep: u64,
    ) -> Result<(), TransformError> {
        for transformer in &mut self.transformers {
            transformer.update(state, context, alpha, timestep)?;
        }
        Ok(())
    }
}
