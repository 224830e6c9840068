//! Hyperparameter search space

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::configuration::Configuration;
use super::parameter::{Parameter, ParameterDomain};
use crate::error::{Result, TuneError};

/// Hyperparameter search space.
///
/// Parameters keep their declaration order; grids vary the first-declared
/// parameter fastest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterSpace {
    params: Vec<Parameter>,
}

impl HyperparameterSpace {
    /// Create an empty search space
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, validating its domain
    pub fn add(&mut self, name: &str, domain: ParameterDomain) -> Result<()> {
        self.add_parameter(Parameter::new(name, domain))
    }

    /// Builder-style [`HyperparameterSpace::add`]
    pub fn with(mut self, name: &str, domain: ParameterDomain) -> Result<Self> {
        self.add(name, domain)?;
        Ok(self)
    }

    /// Add a fully described parameter
    pub fn add_parameter(&mut self, param: Parameter) -> Result<()> {
        if self.get(&param.name).is_some() {
            return Err(TuneError::DuplicateParameter(param.name));
        }
        param.domain.validate(&param.name)?;
        self.params.push(param);
        Ok(())
    }

    /// Get a parameter domain
    pub fn get(&self, name: &str) -> Option<&ParameterDomain> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.domain)
    }

    /// Check if space is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Iterate over parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Total surrogate input dimensionality
    pub fn dims(&self) -> usize {
        self.params.iter().map(|p| p.domain.dims()).sum()
    }

    /// Sample a random configuration
    pub fn sample_random<R: Rng>(&self, rng: &mut R) -> Configuration {
        self.params.iter().map(|p| (p.name.clone(), p.domain.sample(rng))).collect()
    }

    /// Build a configuration from one unit coordinate per parameter.
    pub fn from_unit(&self, point: &[f64]) -> Configuration {
        self.params
            .iter()
            .zip(point)
            .map(|(p, &u)| (p.name.clone(), p.domain.from_unit(u)))
            .collect()
    }

    /// Encode a configuration as surrogate inputs.
    pub fn encode(&self, config: &Configuration) -> Result<Vec<f64>> {
        let mut encoded = Vec::with_capacity(self.dims());
        for param in &self.params {
            let value = config
                .get(&param.name)
                .ok_or_else(|| TuneError::ParameterNotFound(param.name.clone()))?;
            let coords = param
                .domain
                .encode(value)
                .ok_or_else(|| TuneError::InvalidValue(param.name.clone(), value.to_string()))?;
            encoded.extend(coords);
        }
        Ok(encoded)
    }

    /// Copy of `config` with every missing qualitative parameter set to its
    /// default. Missing quantitative parameters stay missing.
    pub fn complete(&self, config: &Configuration) -> Configuration {
        let mut completed = config.clone();
        for param in &self.params {
            if completed.get(&param.name).is_none() {
                if let Some(value) = param.domain.default_value() {
                    completed.insert(param.name.clone(), value);
                }
            }
        }
        completed
    }

    /// Validate a configuration
    pub fn validate(&self, config: &Configuration) -> Result<()> {
        for param in &self.params {
            match config.get(&param.name) {
                Some(value) if param.domain.is_valid(value) => {}
                Some(value) => {
                    return Err(TuneError::InvalidValue(param.name.clone(), format!("{value:?}")))
                }
                None => return Err(TuneError::ParameterNotFound(param.name.clone())),
            }
        }
        if let Some((name, _)) = config.iter().find(|(name, _)| self.get(name).is_none()) {
            return Err(TuneError::InvalidValue(name.clone(), "not part of the search space".into()));
        }
        Ok(())
    }
}
