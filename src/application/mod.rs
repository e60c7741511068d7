// Training pipeline and prediction serving
pub mod ml;
