//! Candidate evaluation
//!
//! A [`Learner`] supplies fitting and scoring; the [`CandidateEvaluator`]
//! runs it on a fold and turns whatever happens into an
//! [`EvaluationResult`](crate::tune::EvaluationResult).

mod candidate;
mod learner;

#[cfg(test)]
mod tests;

pub use candidate::CandidateEvaluator;
pub use learner::{FnLearner, Learner};
