use url::Url;

use crate::models::FeatureSet;

pub const SATIRE_DOMAINS: &[&str] = &["der-postillon.com", "theonion.com", "titanic-magazin.de"];

pub const FAKE_TRIGGERS: &[&str] = &[
    "die wahrheit",
    "keiner sagt",
    "sie verschweigen",
    "100% wahr",
    "niemand berichtet",
    "geheim",
];

pub const UNCERTAINTY_WORDS: &[&str] = &["angeblich", "vermutlich", "soll", "möglicherweise"];

pub const EMOTION_WORDS: &[&str] = &["schockierend", "skandal", "unfassbar", "krass"];

/// Below this many words the model is told there is not enough context.
pub const ENOUGH_TEXT_WORDS: usize = 150;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Host of `url` with a single leading `www.` removed. Empty if unparseable.
pub fn source_domain(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Occurrences of every keyword in `haystack`, summed. Non-overlapping per keyword.
fn count_hits(haystack: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|kw| haystack.matches(kw).count()).sum()
}

pub fn extract_features(text: &str, url: &str) -> FeatureSet {
    let lowered = text.to_lowercase();
    let domain = source_domain(url);
    let words = word_count(text);

    FeatureSet {
        word_count: words,
        is_satire_domain: SATIRE_DOMAINS.contains(&domain.as_str()),
        source_domain: domain,
        fake_trigger_hits: count_hits(&lowered, FAKE_TRIGGERS),
        uncertainty_hits: count_hits(&lowered, UNCERTAINTY_WORDS),
        emotion_hits: count_hits(&lowered, EMOTION_WORDS),
        has_enough_text: words >= ENOUGH_TEXT_WORDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_raw_occurrences_case_insensitive() {
        let text = "Die Wahrheit ist GEHEIM. die wahrheit bleibt geheim.";
        let f = extract_features(text, "https://example.org/a");
        assert_eq!(f.fake_trigger_hits, 4);
        assert_eq!(f.uncertainty_hits, 0);
        assert_eq!(f.word_count, 8);
        assert!(!f.has_enough_text);
    }

    #[test]
    fn emotion_and_uncertainty_words() {
        let text = "Ein Skandal! Schockierend und unfassbar, angeblich vermutlich.";
        let f = extract_features(text, "https://example.org/");
        assert_eq!(f.emotion_hits, 3);
        assert_eq!(f.uncertainty_hits, 2);
    }

    #[test]
    fn satire_domain_strips_www_only() {
        assert!(extract_features("", "https://www.der-postillon.com/2024/x.html").is_satire_domain);
        assert!(extract_features("", "https://theonion.com/story").is_satire_domain);
        assert!(!extract_features("", "https://blog.der-postillon.com/x").is_satire_domain);
        assert_eq!(source_domain("https://www.der-postillon.com/x"), "der-postillon.com");
    }

    #[test]
    fn unparseable_url_yields_empty_domain() {
        let f = extract_features("text", "not a url");
        assert_eq!(f.source_domain, "");
        assert!(!f.is_satire_domain);
    }

    #[test]
    fn word_count_is_whitespace_tokens() {
        assert_eq!(word_count("  a\tb\nc   d "), 4);
        assert_eq!(word_count(""), 0);
        let long = "wort ".repeat(150);
        assert!(extract_features(&long, "https://example.org").has_enough_text);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Sie verschweigen es: ein krasser Skandal, soll es heißen.";
        let url = "https://www.example.com/x";
        assert_eq!(extract_features(text, url), extract_features(text, url));
    }
}
