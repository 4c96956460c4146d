mod content_fetcher;
mod extractor;

pub use content_fetcher::{validate_http_url, ContentFetcher, HtmlFetcher};
pub use extractor::{extract, ExtractedPage, EXCERPT_CHARS};
