use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// A schedule of transformer updates to replay without a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunConfig {
    pub steps: u64,
    pub alpha_start: f64,
    pub alpha_end: f64,
    pub timestep_stride: u64,
}

impl DryRunConfig {
    /// Alpha at `step`, moving linearly from `alpha_start` to `alpha_end`.
    pub fn alpha_at(&self, step: u64) -> f64 {
        if self.steps <= 1 {
            return self.alpha_start;
        }
        let frac = step as f64 / (self.steps - 1) as f64;
        self.alpha_start + (self.alpha_end - self.alpha_start) * frac
    }

    /// Timestep at `step`, saturating at `u64::MAX`.
    pub fn timestep_at(&self, step: u64) -> u64 {
        step.saturating_mul(self.timestep_stride)
    }

    /// `(alpha, timestep)` for every step in order.
    pub fn schedule(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        (0..self.steps).map(|step| (self.alpha_at(step), self.timestep_at(step)))
    }
}

#[derive(Default)]
pub struct DryRunConfigBuilder {
    steps: Option<u64>,
    alpha_start: Option<f64>,
    alpha_end: Option<f64>,
    timestep_stride: Option<u64>,
}

impl DryRunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn alpha_start(mut self, alpha: f64) -> Self {
        self.alpha_start = Some(alpha);
        self
    }
    pub fn alpha_end(mut self, alpha: f64) -> Self {
        self.alpha_end = Some(alpha);
        self
    }
    pub fn timestep_stride(mut self, stride: u64) -> Self {
        self.timestep_stride = Some(stride);
        self
    }

    pub fn build(self) -> Result<DryRunConfig, ConfigError> {
        let config = DryRunConfig {
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            alpha_start: self
                .alpha_start
                .ok_or(ConfigError::MissingParameter("alpha_start"))?,
            alpha_end: self
                .alpha_end
                .ok_or(ConfigError::MissingParameter("alpha_end"))?,
            timestep_stride: self
                .timestep_stride
                .ok_or(ConfigError::MissingParameter("timestep_stride"))?,
        };
        for (name, alpha) in [
            ("alpha_start", config.alpha_start),
            ("alpha_end", config.alpha_end),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("{alpha} is outside [0, 1]"),
                });
            }
        }
        if config
            .steps
            .saturating_sub(1)
            .checked_mul(config.timestep_stride)
            .is_none()
        {
            return Err(ConfigError::InvalidParameter {
                name: "timestep_stride",
                reason: format!(
                    "{} steps of stride {} overflow the timestep counter",
                    config.steps, config.timestep_stride
                ),
            });
        }
        Ok(config)
    }
}
