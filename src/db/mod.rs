mod repository;
mod schema;

pub use repository::{AnalysisStore, Repository};
