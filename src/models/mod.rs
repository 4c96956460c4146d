mod article;
mod classification;
mod features;

pub use article::{AnalysisRecord, Article, CategoryCount, NewAnalysis, NewArticle, RecentAnalysis};
pub use classification::{Category, ClassificationResult, Label, Method};
pub use features::FeatureSet;
