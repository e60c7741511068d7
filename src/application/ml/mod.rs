pub mod model_server;
pub mod predictor;
pub mod trainer;

pub use model_server::ModelServer;
pub use predictor::PricePredictor;
pub use trainer::{Trainer, TrainerConfig};
