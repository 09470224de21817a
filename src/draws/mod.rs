pub mod classifier;
pub mod normalizer;
pub mod schema;
pub mod service;

pub use classifier::ProgramClassifier;
pub use service::DrawService;
