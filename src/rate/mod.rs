pub mod estimator;

pub use estimator::RateEstimator;
