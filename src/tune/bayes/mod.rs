//! Sequential (Bayesian) search
//!
//! A [`GaussianProcess`] models the mean objective over configurations
//! encoded in the unit cube; an [`Acquisition`] function picks the next
//! configuration from a pool of Latin hypercube candidates.

mod acquisition;
mod driver;
mod gp;


pub use acquisition::{Acquisition, TradeOff};
pub use driver::BayesSearch;
pub use gp::{GaussianProcess, Kernel, SurrogateError, LENGTH_SCALES};
