mod gateway;
mod normalizer;
mod prompt;

pub use gateway::{HttpLlmGateway, LlmGateway, LlmOutcome};
pub use normalizer::normalize;
pub use prompt::build_prompt;
