use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplingError {
    #[error("A sampled parameter named '{0}' already exists")]
    DuplicateName(String),
    #[error("No sampled parameter named '{0}'")]
    UnknownName(String),
    #[error("Initial value {initial} of parameter '{name}' lies outside [{min}, {max}]")]
    InitialOutOfRange {
        name: String,
        initial: f64,
        min: f64,
        max: f64,
    },
    #[error("Parameter '{name}' addresses {kind:?} slot {index}, but the state only has {len}")]
    IndexOutOfRange {
        name: String,
        kind: ParameterKind,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Discrete,
    Continuous,
}

/// A reference into the sampled-parameter vector of a replica.
///
/// Parameters are created by [`ParameterManager`]; the `index` addresses the typed
/// value vector matching `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    index: usize,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Current values of every sampled parameter for one replica.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterState {
    pub discrete: Vec<i64>,
    pub continuous: Vec<f64>,
}

impl ParameterState {
    pub fn new(discrete: Vec<i64>, continuous: Vec<f64>) -> Self {
        Self {
            discrete,
            continuous,
        }
    }
}

/// Anything that carries the sampled parameters of the current simulation state.
pub trait ProvidesParameters {
    fn parameters(&self) -> &ParameterState;
}

impl ProvidesParameters for ParameterState {
    fn parameters(&self) -> &ParameterState {
        self
    }
}

/// Resolves a sampled parameter against a parameter state.
pub trait ParameterSampler {
    fn extract_value(
        &self,
        parameter: &Parameter,
        state: &ParameterState,
    ) -> Result<f64, SamplingError>;
}

impl<T: ParameterSampler + ?Sized> ParameterSampler for &T {
    fn extract_value(
        &self,
        parameter: &Parameter,
        state: &ParameterState,
    ) -> Result<f64, SamplingError> {
        (**self).extract_value(parameter, state)
    }
}

impl<T: ParameterSampler + ?Sized> ParameterSampler for std::sync::Arc<T> {
    fn extract_value(
        &self,
        parameter: &Parameter,
        state: &ParameterState,
    ) -> Result<f64, SamplingError> {
        (**self).extract_value(parameter, state)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DiscreteSpec {
    min: i64,
    max: i64,
    initial: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct ContinuousSpec {
    min: f64,
    max: f64,
    initial: f64,
}

/// Registry of the discrete and continuous parameters a run samples over.
#[derive(Debug, Clone, Default)]
pub struct ParameterManager {
    discrete: Vec<DiscreteSpec>,
    continuous: Vec<ContinuousSpec>,
    by_name: HashMap<String, Parameter>,
}

impl ParameterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_discrete_parameter(
        &mut self,
        name: &str,
        initial: i64,
        min: i64,
        max: i64,
    ) -> Result<Parameter, SamplingError> {
        if !(min..=max).contains(&initial) {
            return Err(SamplingError::InitialOutOfRange {
                name: name.to_string(),
                initial: initial as f64,
                min: min as f64,
                max: max as f64,
            });
        }
        let parameter = self.register(name, ParameterKind::Discrete, self.discrete.len())?;
        self.discrete.push(DiscreteSpec { min, max, initial });
        Ok(parameter)
    }

    pub fn add_continuous_parameter(
        &mut self,
        name: &str,
        initial: f64,
        min: f64,
        max: f64,
    ) -> Result<Parameter, SamplingError> {
        if !(min..=max).contains(&initial) {
            return Err(SamplingError::InitialOutOfRange {
                name: name.to_string(),
                initial,
                min,
                max,
            });
        }
        let parameter = self.register(name, ParameterKind::Continuous, self.continuous.len())?;
        self.continuous.push(ContinuousSpec { min, max, initial });
        Ok(parameter)
    }

    fn register(
        &mut self,
        name: &str,
        kind: ParameterKind,
        index: usize,
    ) -> Result<Parameter, SamplingError> {
        if self.by_name.contains_key(name) {
            return Err(SamplingError::DuplicateName(name.to_string()));
        }
        let parameter = Parameter {
            name: name.to_string(),
            kind,
            index,
        };
        self.by_name.insert(name.to_string(), parameter.clone());
        Ok(parameter)
    }

    pub fn get(&self, name: &str) -> Result<&Parameter, SamplingError> {
        self.by_name
            .get(name)
            .ok_or_else(|| SamplingError::UnknownName(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Bounds of a parameter as `(min, max)`.
    pub fn bounds(&self, parameter: &Parameter) -> Option<(f64, f64)> {
        match parameter.kind {
            ParameterKind::Discrete => self
                .discrete
                .get(parameter.index)
                .map(|s| (s.min as f64, s.max as f64)),
            ParameterKind::Continuous => self
                .continuous
                .get(parameter.index)
                .map(|s| (s.min, s.max)),
        }
    }

    /// The state every replica starts from.
    pub fn initial_state(&self) -> ParameterState {
        ParameterState {
            discrete: self.discrete.iter().map(|s| s.initial).collect(),
            continuous: self.continuous.iter().map(|s| s.initial).collect(),
        }
    }
}

impl ParameterSampler for ParameterManager {
    fn extract_value(
        &self,
        parameter: &Parameter,
        state: &ParameterState,
    ) -> Result<f64, SamplingError> {
        let out_of_range = |len| SamplingError::IndexOutOfRange {
            name: parameter.name.clone(),
            kind: parameter.kind,
            index: parameter.index,
            len,
        };
        match parameter.kind {
            ParameterKind::Discrete => state
                .discrete
                .get(parameter.index)
                .map(|&v| v as f64)
                .ok_or_else(|| out_of_range(state.discrete.len())),
            ParameterKind::Continuous => state
                .continuous
                .get(parameter.index)
                .copied()
                .ok_or_else(|| out_of_range(state.continuous.len())),
        }
    }
}
