use crate::core::restraints::error::RestraintError;
use crate::core::restraints::gmm::GmmDistanceRestraint;
use crate::core::restraints::groups::{NumActive, RestraintGroup, SelectivelyActiveCollection};
use crate::core::restraints::kinds::{
    CartesianRestraint, ConfinementRestraint, DistProfileRestraint, DistanceRestraint,
    HyperbolicDistanceRestraint, Restraint, TorsProfileRestraint, TorsionRestraint,
};
use crate::core::restraints::schedule::{Positioner, Ramp, Scaler};
use crate::core::restraints::spline::{DistProfileCoefficients, TorsProfileCoefficients};
use crate::core::sampling::parameters::{ParameterManager, SamplingError};
use nalgebra::DMatrix;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestraintFileError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid restraint at {location} in '{path}': {source}")]
    Restraint {
        path: String,
        location: String,
        source: RestraintError,
    },
    #[error("Invalid sampled parameter at {location} in '{path}': {source}")]
    Sampling {
        path: String,
        location: String,
        source: SamplingError,
    },
}

/// Everything a restraint file declares, validated and ready to hand to a transformer.
#[derive(Debug, Clone, Default)]
pub struct RestraintSet {
    pub parameters: ParameterManager,
    pub always_active: Vec<Restraint>,
    pub collections: Vec<SelectivelyActiveCollection>,
}

impl RestraintSet {
    pub fn load(path: &Path) -> Result<Self, RestraintFileError> {
        let display = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| RestraintFileError::Io {
            path: display.clone(),
            source: e,
        })?;
        let raw: RawRestraintFile =
            toml::from_str(&content).map_err(|e| RestraintFileError::Toml {
                path: display.clone(),
                source: e,
            })?;
        raw.build(&display)
    }

    pub fn restraint_count(&self) -> usize {
        self.always_active.len()
            + self
                .collections
                .iter()
                .map(SelectivelyActiveCollection::restraint_count)
                .sum::<usize>()
    }

    pub fn group_count(&self) -> usize {
        self.collections.iter().map(|c| c.groups().len()).sum()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawRestraintFile {
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    always_active: Vec<RawRestraint>,
    #[serde(default)]
    collections: Vec<RawCollection>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", deny_unknown_fields, rename_all = "kebab-case")]
enum RawParameter {
    Discrete {
        name: String,
        initial: i64,
        min: i64,
        max: i64,
    },
    Continuous {
        name: String,
        initial: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
enum RawNumActive {
    Literal(usize),
    Sampled { parameter: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawCollection {
    num_active: RawNumActive,
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawGroup {
    num_active: RawNumActive,
    restraints: Vec<RawRestraint>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", deny_unknown_fields, rename_all = "kebab-case")]
enum RawRestraint {
    #[serde(rename_all = "kebab-case")]
    Distance {
        atoms: [usize; 2],
        r1: Positioner,
        r2: Positioner,
        r3: Positioner,
        r4: Positioner,
        k: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    HyperbolicDistance {
        atoms: [usize; 2],
        r1: f64,
        r2: f64,
        r3: f64,
        r4: f64,
        k: f64,
        asymptote: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    Torsion {
        atoms: [usize; 4],
        phi: f64,
        delta_phi: f64,
        k: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    DistProfile {
        atoms: [usize; 2],
        r_min: f64,
        r_max: f64,
        /// One row per bin, one entry per spline coefficient.
        coefficients: Vec<[f64; 4]>,
        scale_factor: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    TorsProfile {
        atoms: [usize; 8],
        coefficients: Vec<[f64; 16]>,
        scale_factor: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    GmmDistance {
        atom_pairs: Vec<[usize; 2]>,
        weights: Vec<f64>,
        /// `n_components` rows of `n_distances` means.
        means: Vec<Vec<f64>>,
        precisions: Vec<Vec<Vec<f64>>>,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    Confinement {
        atom: usize,
        radius: f64,
        force_const: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
    #[serde(rename_all = "kebab-case")]
    Cartesian {
        atom: usize,
        position: [f64; 3],
        delta: f64,
        force_const: f64,
        #[serde(default)]
        scaler: Scaler,
        #[serde(default)]
        ramp: Ramp,
    },
}

impl RawRestraintFile {
    fn build(self, path: &str) -> Result<RestraintSet, RestraintFileError> {
        let restraint_error = |location: String, source| RestraintFileError::Restraint {
            path: path.to_string(),
            location,
            source,
        };
        let sampling_error = |location: String, source| RestraintFileError::Sampling {
            path: path.to_string(),
            location,
            source,
        };

        let mut parameters = ParameterManager::new();
        for (i, raw) in self.parameters.into_iter().enumerate() {
            let added = match raw {
                RawParameter::Discrete {
                    name,
                    initial,
                    min,
                    max,
                } => parameters.add_discrete_parameter(&name, initial, min, max),
                RawParameter::Continuous {
                    name,
                    initial,
                    min,
                    max,
                } => parameters.add_continuous_parameter(&name, initial, min, max),
            };
            added.map_err(|e| sampling_error(format!("parameters[{i}]"), e))?;
        }

        let always_active = self
            .always_active
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                raw.into_restraint()
                    .map_err(|e| restraint_error(format!("always-active[{i}]"), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut collections = Vec::with_capacity(self.collections.len());
        for (c, raw_collection) in self.collections.into_iter().enumerate() {
            let mut groups = Vec::with_capacity(raw_collection.groups.len());
            for (g, raw_group) in raw_collection.groups.into_iter().enumerate() {
                let location = format!("collections[{c}].groups[{g}]");
                let restraints = raw_group
                    .restraints
                    .into_iter()
                    .enumerate()
                    .map(|(r, raw)| {
                        raw.into_restraint()
                            .map_err(|e| restraint_error(format!("{location}.restraints[{r}]"), e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let num_active = raw_group
                    .num_active
                    .resolve(&parameters)
                    .map_err(|e| sampling_error(location.clone(), e))?;
                let group = RestraintGroup::new(restraints, num_active)
                    .map_err(|e| restraint_error(location, e))?;
                groups.push(group);
            }
            let location = format!("collections[{c}]");
            let num_active = raw_collection
                .num_active
                .resolve(&parameters)
                .map_err(|e| sampling_error(location.clone(), e))?;
            let collection = SelectivelyActiveCollection::new(groups, num_active)
                .map_err(|e| restraint_error(location, e))?;
            collections.push(collection);
        }

        Ok(RestraintSet {
            parameters,
            always_active,
            collections,
        })
    }
}

impl RawNumActive {
    fn resolve(self, parameters: &ParameterManager) -> Result<NumActive, SamplingError> {
        match self {
            Self::Literal(n) => Ok(NumActive::Literal(n)),
            Self::Sampled { parameter } => Ok(NumActive::Sampled(parameters.get(&parameter)?.clone())),
        }
    }
}

impl RawRestraint {
    fn into_restraint(self) -> Result<Restraint, RestraintError> {
        let restraint: Restraint = match self {
            Self::Distance {
                atoms: [a, b],
                r1,
                r2,
                r3,
                r4,
                k,
                scaler,
                ramp,
            } => DistanceRestraint::new(a, b, [r1, r2, r3, r4], k)?
                .with_scaler(scaler)
                .with_ramp(ramp)
                .into(),
            Self::HyperbolicDistance {
                atoms: [a, b],
                r1,
                r2,
                r3,
                r4,
                k,
                asymptote,
                scaler,
                ramp,
            } => HyperbolicDistanceRestraint::new(a, b, [r1, r2, r3, r4], k, asymptote)?
                .with_scaler(scaler)
                .with_ramp(ramp)
                .into(),
            Self::Torsion {
                atoms,
                phi,
                delta_phi,
                k,
                scaler,
                ramp,
            } => TorsionRestraint::new(atoms, phi, delta_phi, k)?
                .with_scaler(scaler)
                .with_ramp(ramp)
                .into(),
            Self::DistProfile {
                atoms: [a, b],
                r_min,
                r_max,
                coefficients,
                scale_factor,
                scaler,
                ramp,
            } => {
                let coefficients = DistProfileCoefficients::from_rows(&coefficients)?;
                DistProfileRestraint::new(a, b, r_min, r_max, coefficients, scale_factor)?
                    .with_scaler(scaler)
                    .with_ramp(ramp)
                    .into()
            }
            Self::TorsProfile {
                atoms,
                coefficients,
                scale_factor,
                scaler,
                ramp,
            } => {
                let coefficients = TorsProfileCoefficients::from_rows(&coefficients)?;
                TorsProfileRestraint::new(atoms, coefficients, scale_factor)?
                    .with_scaler(scaler)
                    .with_ramp(ramp)
                    .into()
            }
            Self::GmmDistance {
                atom_pairs,
                weights,
                means,
                precisions,
                scaler,
                ramp,
            } => {
                let n_distances = atom_pairs.len();
                let means = matrix_from_rows("means", &means, n_distances)?;
                let precisions = precisions
                    .iter()
                    .map(|rows| {
                        if rows.len() != n_distances {
                            return Err(RestraintError::GmmShape {
                                field: "precisions",
                                expected: format!("{n_distances} rows"),
                                found: format!("{} rows", rows.len()),
                            });
                        }
                        matrix_from_rows("precisions", rows, n_distances)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let pairs = atom_pairs.into_iter().map(|[a, b]| (a, b)).collect();
                GmmDistanceRestraint::new(pairs, weights, means, precisions)?
                    .with_scaler(scaler)
                    .with_ramp(ramp)
                    .into()
            }
            Self::Confinement {
                atom,
                radius,
                force_const,
                scaler,
                ramp,
            } => ConfinementRestraint {
                atom_index: atom,
                radius,
                force_const,
                scaler,
                ramp,
            }
            .into(),
            Self::Cartesian {
                atom,
                position,
                delta,
                force_const,
                scaler,
                ramp,
            } => CartesianRestraint {
                atom_index: atom,
                position,
                delta,
                force_const,
                scaler,
                ramp,
            }
            .into(),
        };
        // Schedules are attached after construction, so check the finished restraint.
        restraint.validate()?;
        Ok(restraint)
    }
}

fn matrix_from_rows(
    field: &'static str,
    rows: &[Vec<f64>],
    ncols: usize,
) -> Result<DMatrix<f64>, RestraintError> {
    if let Some(row) = rows.iter().find(|row| row.len() != ncols) {
        return Err(RestraintError::GmmShape {
            field,
            expected: format!("rows of length {ncols}"),
            found: format!("a row of length {}", row.len()),
        });
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(DMatrix::from_row_slice(rows.len(), ncols, &flat))
}
