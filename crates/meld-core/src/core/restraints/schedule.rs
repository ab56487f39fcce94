use super::error::RestraintError;
use serde::Deserialize;

fn one() -> f64 {
    1.0
}

fn zero() -> f64 {
    0.0
}

/// Maps the annealing coefficient `alpha` onto a force-constant multiplier.
///
/// Every variant except [`Scaler::Constant`] is defined over an alpha window: below the
/// window the scaler returns its "at alpha_min" strength, above it the "at alpha_max"
/// strength, and in between it blends the two.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(tag = "type", deny_unknown_fields, rename_all = "kebab-case")]
pub enum Scaler {
    /// Always returns 1.0.
    #[default]
    Constant,
    #[serde(rename_all = "kebab-case")]
    Linear {
        alpha_min: f64,
        alpha_max: f64,
        #[serde(default = "one")]
        strength_at_alpha_min: f64,
        #[serde(default = "zero")]
        strength_at_alpha_max: f64,
    },
    /// Exponential blend; larger `factor` values drop off faster near `alpha_min`.
    #[serde(rename_all = "kebab-case")]
    NonLinear {
        alpha_min: f64,
        alpha_max: f64,
        factor: f64,
        #[serde(default = "one")]
        strength_at_alpha_min: f64,
        #[serde(default = "zero")]
        strength_at_alpha_max: f64,
    },
    /// Rises linearly from `alpha_min` to `alpha_one`, holds between `alpha_one` and
    /// `alpha_two`, then falls linearly to `alpha_max`.
    #[serde(rename_all = "kebab-case")]
    PlateauLinear {
        alpha_min: f64,
        alpha_one: f64,
        alpha_two: f64,
        alpha_max: f64,
        #[serde(default = "one")]
        strength_at_plateau: f64,
        #[serde(default = "zero")]
        strength_outside: f64,
    },
}

impl Scaler {
    pub fn linear(alpha_min: f64, alpha_max: f64) -> Result<Self, RestraintError> {
        let scaler = Self::Linear {
            alpha_min,
            alpha_max,
            strength_at_alpha_min: 1.0,
            strength_at_alpha_max: 0.0,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn non_linear(alpha_min: f64, alpha_max: f64, factor: f64) -> Result<Self, RestraintError> {
        let scaler = Self::NonLinear {
            alpha_min,
            alpha_max,
            factor,
            strength_at_alpha_min: 1.0,
            strength_at_alpha_max: 0.0,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        match *self {
            Self::Constant => Ok(()),
            Self::Linear {
                alpha_min,
                alpha_max,
                ..
            } => check_alpha_window(alpha_min, alpha_max),
            Self::NonLinear {
                alpha_min,
                alpha_max,
                factor,
                ..
            } => {
                check_alpha_window(alpha_min, alpha_max)?;
                check_factor(factor)
            }
            Self::PlateauLinear {
                alpha_min,
                alpha_one,
                alpha_two,
                alpha_max,
                ..
            } => {
                check_alpha_window(alpha_min, alpha_one)?;
                check_alpha_window(alpha_one, alpha_two)?;
                check_alpha_window(alpha_two, alpha_max)
            }
        }
    }

    /// Evaluates the multiplier at `alpha`.
    pub fn scale(&self, alpha: f64) -> f64 {
        match *self {
            Self::Constant => 1.0,
            Self::Linear {
                alpha_min,
                alpha_max,
                strength_at_alpha_min,
                strength_at_alpha_max,
            } => match window_fraction(alpha, alpha_min, alpha_max) {
                Window::Below => strength_at_alpha_min,
                Window::Above => strength_at_alpha_max,
                Window::Inside(frac) => {
                    (1.0 - frac) * (strength_at_alpha_min - strength_at_alpha_max)
                        + strength_at_alpha_max
                }
            },
            Self::NonLinear {
                alpha_min,
                alpha_max,
                factor,
                strength_at_alpha_min,
                strength_at_alpha_max,
            } => match window_fraction(alpha, alpha_min, alpha_max) {
                Window::Below => strength_at_alpha_min,
                Window::Above => strength_at_alpha_max,
                Window::Inside(frac) => {
                    let blend = exp_blend(1.0 - frac, factor);
                    blend * (strength_at_alpha_min - strength_at_alpha_max) + strength_at_alpha_max
                }
            },
            Self::PlateauLinear {
                alpha_min,
                alpha_one,
                alpha_two,
                alpha_max,
                strength_at_plateau,
                strength_outside,
            } => {
                let delta = strength_at_plateau - strength_outside;
                if alpha <= alpha_min || alpha >= alpha_max {
                    strength_outside
                } else if alpha < alpha_one {
                    strength_outside + delta * (alpha - alpha_min) / (alpha_one - alpha_min)
                } else if alpha <= alpha_two {
                    strength_at_plateau
                } else {
                    strength_outside + delta * (alpha_max - alpha) / (alpha_max - alpha_two)
                }
            }
        }
    }
}

/// Maps the integer timestep onto a force-constant multiplier.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(tag = "type", deny_unknown_fields, rename_all = "kebab-case")]
pub enum Ramp {
    #[default]
    Constant,
    #[serde(rename_all = "kebab-case")]
    Linear {
        start_time: u64,
        end_time: u64,
        #[serde(default = "zero")]
        start_weight: f64,
        #[serde(default = "one")]
        end_weight: f64,
    },
    #[serde(rename_all = "kebab-case")]
    NonLinear {
        start_time: u64,
        end_time: u64,
        factor: f64,
        #[serde(default = "zero")]
        start_weight: f64,
        #[serde(default = "one")]
        end_weight: f64,
    },
}

impl Ramp {
    pub fn linear(start_time: u64, end_time: u64) -> Result<Self, RestraintError> {
        let ramp = Self::Linear {
            start_time,
            end_time,
            start_weight: 0.0,
            end_weight: 1.0,
        };
        ramp.validate()?;
        Ok(ramp)
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        match *self {
            Self::Constant => Ok(()),
            Self::Linear {
                start_time,
                end_time,
                ..
            } => check_time_window(start_time, end_time),
            Self::NonLinear {
                start_time,
                end_time,
                factor,
                ..
            } => {
                check_time_window(start_time, end_time)?;
                check_factor(factor)
            }
        }
    }

    /// Evaluates the multiplier at `timestep`.
    pub fn weight(&self, timestep: u64) -> f64 {
        match *self {
            Self::Constant => 1.0,
            Self::Linear {
                start_time,
                end_time,
                start_weight,
                end_weight,
            } => {
                if timestep < start_time {
                    start_weight
                } else if timestep >= end_time {
                    end_weight
                } else {
                    let frac = (timestep - start_time) as f64 / (end_time - start_time) as f64;
                    start_weight + frac * (end_weight - start_weight)
                }
            }
            Self::NonLinear {
                start_time,
                end_time,
                factor,
                start_weight,
                end_weight,
            } => {
                if timestep < start_time {
                    start_weight
                } else if timestep >= end_time {
                    end_weight
                } else {
                    let frac = (timestep - start_time) as f64 / (end_time - start_time) as f64;
                    start_weight + exp_blend(frac, factor) * (end_weight - start_weight)
                }
            }
        }
    }
}

/// An alpha-dependent geometric parameter, such as a flat-bottom distance bound.
///
/// A bare number in a restraint file deserializes to [`Positioner::Constant`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum Positioner {
    Constant(f64),
    #[serde(rename_all = "kebab-case")]
    Linear {
        alpha_min: f64,
        alpha_max: f64,
        pos_min: f64,
        pos_max: f64,
    },
}

impl Positioner {
    pub fn validate(&self) -> Result<(), RestraintError> {
        match *self {
            Self::Constant(_) => Ok(()),
            Self::Linear {
                alpha_min,
                alpha_max,
                ..
            } => check_alpha_window(alpha_min, alpha_max),
        }
    }

    pub fn position(&self, alpha: f64) -> f64 {
        match *self {
            Self::Constant(value) => value,
            Self::Linear {
                alpha_min,
                alpha_max,
                pos_min,
                pos_max,
            } => match window_fraction(alpha, alpha_min, alpha_max) {
                Window::Below => pos_min,
                Window::Above => pos_max,
                Window::Inside(frac) => pos_min + frac * (pos_max - pos_min),
            },
        }
    }
}

impl From<f64> for Positioner {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

enum Window {
    Below,
    Inside(f64),
    Above,
}

fn window_fraction(alpha: f64, alpha_min: f64, alpha_max: f64) -> Window {
    if alpha <= alpha_min {
        Window::Below
    } else if alpha >= alpha_max {
        Window::Above
    } else {
        Window::Inside((alpha - alpha_min) / (alpha_max - alpha_min))
    }
}

// Maps 0 -> 0 and 1 -> 1 along an exponential curve.
fn exp_blend(frac: f64, factor: f64) -> f64 {
    ((factor * frac).exp() - 1.0) / (factor.exp() - 1.0)
}

fn check_alpha_window(alpha_min: f64, alpha_max: f64) -> Result<(), RestraintError> {
    let in_unit = |a: f64| (0.0..=1.0).contains(&a);
    if in_unit(alpha_min) && in_unit(alpha_max) && alpha_min <= alpha_max {
        Ok(())
    } else {
        Err(RestraintError::InvalidAlphaWindow {
            alpha_min,
            alpha_max,
        })
    }
}

fn check_time_window(start_time: u64, end_time: u64) -> Result<(), RestraintError> {
    if end_time > start_time {
        Ok(())
    } else {
        Err(RestraintError::InvalidTimeWindow {
            start_time,
            end_time,
        })
    }
}

fn check_factor(factor: f64) -> Result<(), RestraintError> {
    if factor >= 1.0 {
        Ok(())
    } else {
        Err(RestraintError::InvalidFactor(factor))
    }
}
