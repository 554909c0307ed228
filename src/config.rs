//! Run parameters with per-model defaults, optionally read from TOML.
//!
//! ```toml
//! model = "potts"
//! q = 4
//! temperature = 0.9
//! sweeps = 10000
//! ```

use crate::error::{Result, SimulationError};
use crate::worker::WorkerKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Default seed of the random stream.
pub const DEFAULT_SEED: u64 = 29833;

/// Everything needed to set up and run a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Which simulation to run.
    pub model: WorkerKind,
    /// Seed of the random stream.
    pub seed: u64,
    /// Linear size of the lattice.
    pub length: usize,
    /// Number of sites of the infinite range model.
    pub num_sites: usize,
    /// Temperature of thermal models.
    pub temperature: f64,
    /// Occupation probability of percolation models.
    pub probability: f64,
    /// Number of Potts states.
    pub q: u32,
    /// Measured sweeps.
    pub sweeps: u64,
    /// Thermalization sweeps run before measuring.
    pub therm: u64,
}

/// Optional values replacing the defaults of [`Parameters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    /// See [`Parameters::model`].
    pub model: Option<WorkerKind>,
    /// See [`Parameters::seed`].
    pub seed: Option<u64>,
    /// See [`Parameters::length`].
    pub length: Option<usize>,
    /// See [`Parameters::num_sites`].
    pub num_sites: Option<usize>,
    /// See [`Parameters::temperature`].
    pub temperature: Option<f64>,
    /// See [`Parameters::probability`].
    pub probability: Option<f64>,
    /// See [`Parameters::q`].
    pub q: Option<u32>,
    /// See [`Parameters::sweeps`].
    pub sweeps: Option<u64>,
    /// See [`Parameters::therm`].
    pub therm: Option<u64>,
}

impl ParameterOverrides {
    /// Parse overrides from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Fill every unset field from `other`.
    pub fn or(self, other: ParameterOverrides) -> Self {
        Self {
            model: self.model.or(other.model),
            seed: self.seed.or(other.seed),
            length: self.length.or(other.length),
            num_sites: self.num_sites.or(other.num_sites),
            temperature: self.temperature.or(other.temperature),
            probability: self.probability.or(other.probability),
            q: self.q.or(other.q),
            sweeps: self.sweeps.or(other.sweeps),
            therm: self.therm.or(other.therm),
        }
    }
}

impl Parameters {
    /// Defaults of `model`.
    pub fn defaults_for(model: WorkerKind) -> Self {
        let sweeps = 1 << 16;
        let base = Self {
            model,
            seed: DEFAULT_SEED,
            length: 8,
            num_sites: 0,
            temperature: 1.0,
            probability: 0.0,
            q: 0,
            sweeps,
            therm: sweeps >> 3,
        };
        match model {
            WorkerKind::Ising => Self {
                temperature: 2.27,
                ..base
            },
            WorkerKind::Potts => Self {
                q: 3,
                temperature: 0.994973,
                ..base
            },
            WorkerKind::Infinite => Self {
                num_sites: 128,
                temperature: 1.0,
                ..base
            },
            WorkerKind::BondPercolation => Self {
                length: 256,
                probability: 0.5,
                sweeps: 1 << 8,
                therm: 0,
                ..base
            },
            WorkerKind::SitePercolation => Self {
                length: 256,
                probability: 0.592746,
                sweeps: 1 << 8,
                therm: 0,
                ..base
            },
            WorkerKind::Loop | WorkerKind::LoopPi0 => Self {
                temperature: 0.2,
                ..base
            },
        }
    }

    /// Apply overrides on top of the defaults of the model they name, Ising if none.
    ///
    /// Changing `sweeps` of a thermal model without giving `therm` resets `therm` to an eighth
    /// of `sweeps`.
    pub fn from_overrides(overrides: &ParameterOverrides) -> Self {
        let model = overrides.model.unwrap_or(WorkerKind::Ising);
        let defaults = Self::defaults_for(model);
        let sweeps = overrides.sweeps.unwrap_or(defaults.sweeps);
        let therm = match (overrides.therm, overrides.sweeps) {
            (Some(therm), _) => therm,
            (None, Some(sweeps)) if model.is_thermal() => sweeps >> 3,
            (None, _) => defaults.therm,
        };
        Self {
            model,
            seed: overrides.seed.unwrap_or(defaults.seed),
            length: overrides.length.unwrap_or(defaults.length),
            num_sites: overrides.num_sites.unwrap_or(defaults.num_sites),
            temperature: overrides.temperature.unwrap_or(defaults.temperature),
            probability: overrides.probability.unwrap_or(defaults.probability),
            q: overrides.q.unwrap_or(defaults.q),
            sweeps,
            therm,
        }
    }

    /// Parse TOML, unset fields take the defaults of the named model.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params = Self::from_overrides(&ParameterOverrides::from_toml_str(s)?);
        params.validate()?;
        Ok(params)
    }

    /// Inverse temperature.
    pub fn beta(&self) -> f64 {
        1.0 / self.temperature
    }

    /// Check every parameter the model uses.
    pub fn validate(&self) -> Result<()> {
        if self.sweeps == 0 {
            return Err(SimulationError::invalid("sweeps", "must be positive"));
        }
        match self.model {
            WorkerKind::Infinite => {
                if self.num_sites == 0 {
                    return Err(SimulationError::invalid("num_sites", "must be positive"));
                }
            }
            _ => {
                if self.length == 0 {
                    return Err(SimulationError::invalid("length", "must be positive"));
                }
            }
        }
        if self.model.is_thermal() && (self.temperature.is_nan() || self.temperature <= 0.0) {
            return Err(SimulationError::invalid(
                "temperature",
                format!("must be positive, got {}", self.temperature),
            ));
        }
        if self.model.is_quantum() && !self.beta().is_finite() {
            return Err(SimulationError::invalid(
                "temperature",
                format!("inverse temperature of {} is not finite", self.temperature),
            ));
        }
        if self.model.is_percolation() && !(0.0..=1.0).contains(&self.probability) {
            return Err(SimulationError::invalid(
                "probability",
                format!("must lie in [0, 1], got {}", self.probability),
            ));
        }
        if self.model == WorkerKind::Potts && self.q <= 1 {
            return Err(SimulationError::invalid(
                "q",
                format!("need at least two states, got {}", self.q),
            ));
        }
        Ok(())
    }
}

impl Display for Parameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Model                  = {}", self.model)?;
        writeln!(f, "Seed of RNG            = {}", self.seed)?;
        match self.model {
            WorkerKind::Infinite => writeln!(f, "Number of Sites        = {}", self.num_sites)?,
            _ => writeln!(f, "System Linear Size     = {}", self.length)?,
        }
        if self.model == WorkerKind::Potts {
            writeln!(f, "Number of States       = {}", self.q)?;
        }
        if self.model.is_thermal() {
            writeln!(f, "Temperature            = {}", self.temperature)?;
        } else {
            writeln!(f, "Occupation Probability = {}", self.probability)?;
        }
        writeln!(f, "MCS for Thermalization = {}", self.therm)?;
        write!(f, "MCS for Measurement    = {}", self.sweeps)
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        for kind in WorkerKind::ALL.iter() {
            assert!(Parameters::defaults_for(*kind).validate().is_ok());
        }
    }

    #[test]
    fn test_therm_follows_sweeps() {
        let params = Parameters::from_overrides(&ParameterOverrides {
            sweeps: Some(800),
            ..Default::default()
        });
        assert_eq!(params.therm, 100);

        let params = Parameters::from_overrides(&ParameterOverrides {
            model: Some(WorkerKind::SitePercolation),
            sweeps: Some(800),
            ..Default::default()
        });
        assert_eq!(params.therm, 0);
    }

    #[test]
    fn test_from_toml() {
        let params = Parameters::from_toml_str(
            r#"
            model = "potts"
            q = 4
            temperature = 0.9
            "#,
        )
        .unwrap();
        assert_eq!(params.model, WorkerKind::Potts);
        assert_eq!(params.q, 4);
        assert_eq!(params.length, 8);
        assert_eq!(params.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_toml_errors() {
        assert!(matches!(
            Parameters::from_toml_str("colour = 3"),
            Err(SimulationError::Config(_))
        ));
        assert!(matches!(
            Parameters::from_toml_str("model = \"bond-percolation\"\nprobability = 2.0"),
            Err(SimulationError::InvalidParameter {
                name: "probability",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_each_class() {
        let mut p = Parameters::defaults_for(WorkerKind::Ising);
        p.length = 0;
        assert!(p.validate().is_err());

        let mut p = Parameters::defaults_for(WorkerKind::Ising);
        p.temperature = -1.0;
        assert!(p.validate().is_err());

        let mut p = Parameters::defaults_for(WorkerKind::Ising);
        p.sweeps = 0;
        assert!(p.validate().is_err());

        let mut p = Parameters::defaults_for(WorkerKind::Infinite);
        p.num_sites = 0;
        assert!(p.validate().is_err());

        let mut p = Parameters::defaults_for(WorkerKind::Potts);
        p.q = 1;
        assert!(p.validate().is_err());

        let mut p = Parameters::defaults_for(WorkerKind::BondPercolation);
        p.probability = -0.5;
        assert!(p.validate().is_err());
    }
}
