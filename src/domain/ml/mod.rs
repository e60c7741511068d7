pub mod estimator;
pub mod evaluation;
pub mod feature_registry;
pub mod feature_transform;
