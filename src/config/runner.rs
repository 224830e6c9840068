//! Running a validated specification end to end

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::schema::{GridDesign, ModelSpec, SearchSpec, TuneSpec};
use super::validate::validate_spec;
use crate::data::Dataset;
use crate::error::Result;
use crate::learners::{NearestNeighbors, RidgeRegression};
use crate::resample::Fold;
use crate::tune::{
    grid_latin_hypercube, grid_random, grid_regular, BayesSearch, CancelToken, GridSearch, HyperparameterSpace,
    Learner, SearchHistory, TuneControl,
};

/// Validate `spec`, split `data` into folds and run the configured search
/// with the configured built-in learner.
pub fn run_spec(spec: &TuneSpec, data: &Dataset, cancel: CancelToken) -> Result<SearchHistory> {
    validate_spec(spec)?;
    let space = spec.hyperparameter_space()?;
    let folds = spec.folds.vfold().split(data)?;
    let control = spec.control.to_control().with_cancel(cancel);
    info!(
        model = spec.model.name(),
        search = spec.search.name(),
        rows = data.n_rows(),
        folds = folds.len(),
        "running tuning spec"
    );

    let features = spec.data.features.clone();
    let outcome = spec.data.outcome.clone();
    match spec.model {
        ModelSpec::NearestNeighbors => {
            run_search(Arc::new(NearestNeighbors::new(features, outcome)), spec, space, data, &folds, control)
        }
        ModelSpec::RidgeRegression => {
            run_search(Arc::new(RidgeRegression::new(features, outcome)), spec, space, data, &folds, control)
        }
    }
}

fn run_search<L: Learner>(
    learner: Arc<L>,
    spec: &TuneSpec,
    space: HyperparameterSpace,
    data: &Dataset,
    folds: &[Fold],
    control: TuneControl,
) -> Result<SearchHistory> {
    let objective = spec.objective.clone();
    match &spec.search {
        SearchSpec::Grid { design, levels, size, configs } => {
            let grid = match (configs, design) {
                (Some(configs), _) => configs.clone(),
                (None, GridDesign::Regular) => grid_regular(&space, *levels)?,
                (None, GridDesign::Random) => {
                    grid_random(&space, *size, &mut StdRng::seed_from_u64(control.seed))?
                }
                (None, GridDesign::LatinHypercube) => {
                    grid_latin_hypercube(&space, *size, &mut StdRng::seed_from_u64(control.seed))?
                }
            };
            GridSearch::new(learner, space, grid, objective)?.with_control(control).run(data, folds)
        }
        SearchSpec::Bayes {
            n_initial,
            iterations,
            no_improve,
            uncertain,
            n_candidates,
            acquisition,
            kernel,
            initial,
        } => {
            let mut search = BayesSearch::new(learner, space, objective)
                .with_control(control)
                .n_initial(*n_initial)
                .iterations(*iterations)
                .no_improve(*no_improve)
                .n_candidates(*n_candidates)
                .acquisition(*acquisition)
                .kernel(*kernel);
            if let Some(n) = uncertain {
                search = search.uncertain(*n);
            }
            if let Some(configs) = initial {
                search = search.with_initial(configs.clone());
            }
            search.run(data, folds)
        }
    }
}
