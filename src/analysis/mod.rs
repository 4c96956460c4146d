mod classifier;
mod features;

pub use classifier::HybridClassifier;
pub use features::{extract_features, word_count};
