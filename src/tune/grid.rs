//! Candidate grid construction

use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{Configuration, HyperparameterSpace, ParameterDomain, ParameterValue};
use crate::error::{Result, TuneError};

/// Values one parameter contributes to a regular grid.
fn domain_grid_values(domain: &ParameterDomain, levels: usize) -> Vec<ParameterValue> {
    match domain {
        ParameterDomain::Quantitative { .. } => domain.value_seq(levels),
        ParameterDomain::Qualitative { values, .. } => {
            values.iter().map(|v| ParameterValue::Categorical(v.clone())).collect()
        }
    }
}

/// Full factorial grid: `levels` regularly spaced values (in transformed
/// units) per quantitative parameter, every value of each qualitative one.
/// The first-declared parameter varies fastest.
pub fn grid_regular(space: &HyperparameterSpace, levels: usize) -> Result<Vec<Configuration>> {
    if space.is_empty() {
        return Err(TuneError::EmptySpace);
    }
    let levels = levels.max(2);

    // Each new parameter wraps the existing block, so earlier parameters vary
    // faster than later ones.
    let mut configs = vec![Configuration::new()];
    for param in space.iter() {
        let values = domain_grid_values(&param.domain, levels);
        let expanded: Vec<Configuration> = values
            .iter()
            .flat_map(|v| {
                configs.iter().map(move |config| config.clone().with(param.name.clone(), v.clone()))
            })
            .collect();
        configs = expanded;
    }
    Ok(configs)
}

/// `size` independent uniform draws from the space, duplicates removed.
pub fn grid_random<R: Rng>(space: &HyperparameterSpace, size: usize, rng: &mut R) -> Result<Vec<Configuration>> {
    if space.is_empty() {
        return Err(TuneError::EmptySpace);
    }
    let configs = (0..size).map(|_| space.sample_random(rng)).collect();
    Ok(dedup(configs))
}

/// Latin hypercube design of `size` points: each parameter's unit interval is
/// cut into `size` strata and every stratum is used exactly once.
pub fn grid_latin_hypercube<R: Rng>(
    space: &HyperparameterSpace,
    size: usize,
    rng: &mut R,
) -> Result<Vec<Configuration>> {
    Ok(dedup(latin_hypercube_points(space, size, rng)?.iter().map(|p| space.from_unit(p)).collect()))
}

/// Unit-cube Latin hypercube points, one coordinate per parameter.
pub(crate) fn latin_hypercube_points<R: Rng>(
    space: &HyperparameterSpace,
    size: usize,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    if space.is_empty() {
        return Err(TuneError::EmptySpace);
    }
    let mut points = vec![Vec::with_capacity(space.len()); size];
    for _ in space.iter() {
        let mut strata: Vec<usize> = (0..size).collect();
        strata.shuffle(rng);
        for (point, stratum) in points.iter_mut().zip(strata) {
            point.push((stratum as f64 + rng.random::<f64>()) / size as f64);
        }
    }
    Ok(points)
}

fn dedup(configs: Vec<Configuration>) -> Vec<Configuration> {
    let mut seen = std::collections::HashSet::new();
    configs.into_iter().filter(|c| seen.insert(c.key())).collect()
}
