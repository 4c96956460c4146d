use serde_json::{Map, Value};

use crate::ai::{build_prompt, LlmGateway, LlmOutcome};
use crate::models::{Category, ClassificationResult, FeatureSet, Label, Method};

/// Extracted bodies shorter than this are treated as feed teasers.
pub const MIN_ARTICLE_WORDS: usize = 50;

const SHORT_CIRCUIT_CONFIDENCE: u8 = 40;
const BASE_CONFIDENCE: u8 = 50;
const TRIGGER_CONFIDENCE: u8 = 70;
const EMOTION_CONFIDENCE: u8 = 65;
const HIT_THRESHOLD: usize = 2;

pub const FLAG_SATIRE: &str = "satire_domain";
pub const FLAG_FEED_ONLY: &str = "feed_only";
pub const FLAG_TRIGGERS: &str = "typical fake-news trigger phrases";
pub const FLAG_EMOTION: &str = "strongly emotionalized language";
pub const FLAG_VAGUE: &str = "vague/speculative phrasing";

const LLM_NOT_CALLED: &str = "not_called";

pub const DEFAULT_COUNTER_SOURCES: &[&str] = &[
    "https://www.tagesschau.de/faktenfinder/",
    "https://correctiv.org/faktencheck/",
];

/// Deterministic baseline verdict, computed before any model call.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub label: Label,
    pub confidence: u8,
    pub red_flags: Vec<String>,
    pub reasoning_summary: String,
}

pub fn rule_based(features: &FeatureSet) -> RuleVerdict {
    let mut label = Label::Uncertain;
    let mut confidence = BASE_CONFIDENCE;
    let mut red_flags = Vec::new();

    if features.fake_trigger_hits >= HIT_THRESHOLD {
        label = Label::LikelyFake;
        confidence = TRIGGER_CONFIDENCE;
        red_flags.push(FLAG_TRIGGERS.to_string());
    }
    if features.emotion_hits >= HIT_THRESHOLD {
        confidence = confidence.max(EMOTION_CONFIDENCE);
        red_flags.push(FLAG_EMOTION.to_string());
    }
    if features.uncertainty_hits >= HIT_THRESHOLD {
        label = Label::Uncertain;
        red_flags.push(FLAG_VAGUE.to_string());
    }

    let reasoning_summary = if red_flags.is_empty() {
        "rule-based analysis".to_string()
    } else {
        format!("rule-based analysis: {}", red_flags.join(", "))
    };

    RuleVerdict {
        label,
        confidence,
        red_flags,
        reasoning_summary,
    }
}

/// Hard rules first, then the fixed label table. A model-supplied category
/// is never consulted.
pub fn derive_category(label: Label, features: &FeatureSet) -> Category {
    if features.is_satire_domain {
        return Category::Satire;
    }
    if features.fake_trigger_hits >= HIT_THRESHOLD {
        return Category::Propaganda;
    }
    if features.emotion_hits >= HIT_THRESHOLD {
        return Category::Manipulation;
    }
    Category::from_label(label)
}

fn read_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn read_string_list(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items = map.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Accepts `87`, `87.4` or `"87"`, clamped into 0..=100.
fn read_confidence(map: &Map<String, Value>) -> Option<u8> {
    let value = match map.get("confidence")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, 100.0) as u8)
}

pub struct HybridClassifier<G> {
    gateway: G,
}

impl<G: LlmGateway> HybridClassifier<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub async fn classify(
        &self,
        title: &str,
        url: &str,
        text: &str,
        excerpt: &str,
        features: &FeatureSet,
    ) -> ClassificationResult {
        let short_circuit = |category: Category, flag: &str, reasoning: &str| ClassificationResult {
            label: Label::Uncertain,
            confidence: SHORT_CIRCUIT_CONFIDENCE,
            category,
            red_flags: vec![flag.to_string()],
            reasoning_summary: reasoning.to_string(),
            suggested_counter_sources: Vec::new(),
            method: Method::RuleBased,
            llm_used: false,
            llm_status: LLM_NOT_CALLED.to_string(),
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            word_count: features.word_count,
        };

        if features.is_satire_domain {
            tracing::debug!(domain = %features.source_domain, "Satire domain, skipping analysis");
            return short_circuit(
                Category::Satire,
                FLAG_SATIRE,
                "known satire site; satire is not fake news",
            );
        }

        if features.word_count < MIN_ARTICLE_WORDS {
            tracing::debug!(words = features.word_count, %url, "Too little text, treating as teaser");
            return short_circuit(
                Category::FeedTeaser,
                FLAG_FEED_ONLY,
                "no full article text available",
            );
        }

        let rules = rule_based(features);
        let prompt = build_prompt(title, url, text, features);
        let outcome = self.gateway.classify(&prompt).await;

        let mut result = ClassificationResult {
            label: rules.label,
            confidence: rules.confidence,
            category: Category::Unknown,
            red_flags: rules.red_flags,
            reasoning_summary: rules.reasoning_summary,
            suggested_counter_sources: DEFAULT_COUNTER_SOURCES.iter().map(|s| s.to_string()).collect(),
            method: Method::RuleBased,
            llm_used: false,
            llm_status: outcome.status(),
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            word_count: features.word_count,
        };

        match outcome {
            LlmOutcome::Parsed(answer) => {
                if let Some(label) = read_string(&answer, "label").and_then(|l| Label::parse(&l)) {
                    result.label = label;
                }
                if let Some(confidence) = read_confidence(&answer) {
                    result.confidence = confidence;
                }
                if let Some(flags) = read_string_list(&answer, "red_flags") {
                    result.red_flags = flags;
                }
                if let Some(reasoning) = read_string(&answer, "reasoning_summary") {
                    result.reasoning_summary = reasoning;
                }
                if let Some(sources) = read_string_list(&answer, "suggested_counter_sources") {
                    result.suggested_counter_sources = sources;
                }
                result.method = Method::Hybrid;
                result.llm_used = true;
            }
            _ => {
                tracing::info!(%url, status = %result.llm_status, "Using rule-based verdict only");
            }
        }

        result.category = derive_category(result.label, features);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract_features;
    use serde_json::json;
    use std::cell::Cell;

    struct FakeGateway {
        outcome: LlmOutcome,
        calls: Cell<usize>,
    }

    impl FakeGateway {
        fn new(outcome: LlmOutcome) -> Self {
            Self {
                outcome,
                calls: Cell::new(0),
            }
        }

        fn answering(value: Value) -> Self {
            match value {
                Value::Object(map) => Self::new(LlmOutcome::Parsed(map)),
                _ => panic!("fake answer must be an object"),
            }
        }
    }

    impl LlmGateway for FakeGateway {
        async fn classify(&self, _prompt: &str) -> LlmOutcome {
            self.calls.set(self.calls.get() + 1);
            self.outcome.clone()
        }
    }

    fn filler(words: usize) -> String {
        "Bericht ".repeat(words)
    }

    async fn run(gateway: FakeGateway, url: &str, text: &str) -> (ClassificationResult, usize) {
        let classifier = HybridClassifier::new(gateway);
        let features = extract_features(text, url);
        let result = classifier.classify("Titel", url, text, "Auszug", &features).await;
        (result, classifier.gateway.calls.get())
    }

    #[tokio::test]
    async fn trigger_phrases_without_llm_mean_propaganda() {
        let text = format!(
            "{} die Wahrheit geheim die Wahrheit geheim",
            filler(194)
        );
        let gateway = FakeGateway::new(LlmOutcome::Disabled);
        let (result, calls) = run(gateway, "https://example.org/news", &text).await;
        assert_eq!(calls, 1);

        assert_eq!(result.word_count, 200);
        assert_eq!(result.label, Label::LikelyFake);
        assert_eq!(result.confidence, 70);
        assert_eq!(result.category, Category::Propaganda);
        assert!(result.red_flags.contains(&FLAG_TRIGGERS.to_string()));
        assert_eq!(result.method, Method::RuleBased);
        assert!(!result.llm_used);
        assert_eq!(result.llm_status, "llm_disabled");
        assert_eq!(result.suggested_counter_sources.len(), 2);
    }

    #[tokio::test]
    async fn satire_domain_short_circuits_even_with_llm() {
        let gateway = FakeGateway::answering(json!({"label": "likely_fake", "confidence": 99}));
        let (result, calls) = run(gateway, "https://www.der-postillon.com/2024/01/x.html", &filler(400)).await;

        assert_eq!(result.category, Category::Satire);
        assert_eq!(result.label, Label::Uncertain);
        assert_eq!(result.confidence, 40);
        assert_eq!(result.red_flags, vec!["satire_domain".to_string()]);
        assert!(!result.llm_used);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn short_text_is_a_feed_teaser() {
        let gateway = FakeGateway::answering(json!({"label": "likely_real"}));
        let (result, calls) = run(gateway, "https://example.org/teaser", &filler(10)).await;

        assert_eq!(result.category, Category::FeedTeaser);
        assert_eq!(result.label, Label::Uncertain);
        assert_eq!(result.confidence, 40);
        assert_eq!(result.red_flags, vec!["feed_only".to_string()]);
        assert_eq!(result.reasoning_summary, "no full article text available");
        assert!(!result.llm_used);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn llm_answer_replaces_rule_fields() {
        let gateway = FakeGateway::answering(json!({
            "label": "likely_real",
            "confidence": "88",
            "category": "Seriöse Nachricht",
            "red_flags": [],
            "reasoning_summary": "Quellen sind belegt.",
            "suggested_counter_sources": ["https://example.com/check"]
        }));
        let text = format!("{} angeblich vermutlich", filler(100));
        let (result, calls) = run(gateway, "https://example.org/a", &text).await;

        assert_eq!(result.label, Label::LikelyReal);
        assert_eq!(result.confidence, 88);
        assert_eq!(result.category, Category::Legitimate);
        assert!(result.red_flags.is_empty());
        assert_eq!(result.reasoning_summary, "Quellen sind belegt.");
        assert_eq!(result.suggested_counter_sources, vec!["https://example.com/check".to_string()]);
        assert_eq!(result.method, Method::Hybrid);
        assert!(result.llm_used);
        assert_eq!(result.llm_status, "ok");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn llm_label_wins_but_hard_category_rules_still_apply() {
        let gateway = FakeGateway::answering(json!({"label": "likely_real", "category": "Clickbait"}));
        let text = format!("{} geheim geheim", filler(100));
        let (result, calls) = run(gateway, "https://example.org/a", &text).await;
        assert_eq!(calls, 1);

        assert_eq!(result.label, Label::LikelyReal);
        assert_eq!(result.category, Category::Propaganda);
        assert_eq!(result.confidence, 70);
    }

    #[tokio::test]
    async fn llm_category_is_ignored_in_favour_of_label_table() {
        let gateway = FakeGateway::answering(json!({"label": "likely_fake", "category": "Clickbait"}));
        let (result, calls) = run(gateway, "https://example.org/a", &filler(80)).await;
        assert_eq!(calls, 1);

        assert_eq!(result.label, Label::LikelyFake);
        assert_eq!(result.category, Category::FalseReport);
        assert_eq!(result.category.as_str(), "Falschmeldung");
    }

    #[tokio::test]
    async fn llm_cannot_turn_full_article_into_teaser() {
        let gateway = FakeGateway::answering(json!({"label": "likely_real", "category": "Feed/Teaser"}));
        let (result, _) = run(gateway, "https://example.org/a", &filler(80)).await;

        assert_eq!(result.category, Category::Legitimate);
    }

    #[tokio::test]
    async fn unrecognized_llm_fields_keep_rule_values() {
        let gateway = FakeGateway::answering(json!({"label": "maybe", "confidence": "high"}));
        let (result, calls) = run(gateway, "https://example.org/a", &filler(80)).await;
        assert_eq!(calls, 1);

        assert_eq!(result.label, Label::Uncertain);
        assert_eq!(result.confidence, 50);
        assert_eq!(result.category, Category::Misleading);
        assert_eq!(result.method, Method::Hybrid);
    }

    #[tokio::test]
    async fn unparseable_llm_output_downgrades_with_status() {
        let gateway = FakeGateway::new(LlmOutcome::NoParseableOutput);
        let (result, calls) = run(gateway, "https://example.org/a", &filler(80)).await;
        assert_eq!(calls, 1);

        assert_eq!(result.method, Method::RuleBased);
        assert_eq!(result.llm_status, "llm_no_parseable_output");
        assert_eq!(result.reasoning_summary, "rule-based analysis");
        assert_eq!(result.confidence, 50);
    }

    #[test]
    fn uncertainty_overrides_trigger_label_but_keeps_confidence() {
        let text = "geheim geheim angeblich angeblich skandal skandal";
        let verdict = rule_based(&extract_features(text, "https://example.org"));
        assert_eq!(verdict.label, Label::Uncertain);
        assert_eq!(verdict.confidence, 70);
        assert_eq!(verdict.red_flags, vec![FLAG_TRIGGERS, FLAG_EMOTION, FLAG_VAGUE]);
    }

    #[test]
    fn emotion_raises_confidence_floor() {
        let verdict = rule_based(&extract_features("krass krass", "https://example.org"));
        assert_eq!(verdict.label, Label::Uncertain);
        assert_eq!(verdict.confidence, 65);
    }

    #[test]
    fn confidence_is_clamped() {
        let map = json!({"confidence": 140.2}).as_object().cloned().unwrap();
        assert_eq!(read_confidence(&map), Some(100));
        let map = json!({"confidence": "-3"}).as_object().cloned().unwrap();
        assert_eq!(read_confidence(&map), Some(0));
        let map = json!({"confidence": "75%"}).as_object().cloned().unwrap();
        assert_eq!(read_confidence(&map), Some(75));
    }

    #[test]
    fn category_fallback_table() {
        let plain = extract_features("ruhiger Text", "https://example.org");
        assert_eq!(derive_category(Label::LikelyFake, &plain), Category::FalseReport);
        assert_eq!(derive_category(Label::Uncertain, &plain), Category::Misleading);
        assert_eq!(derive_category(Label::LikelyReal, &plain), Category::Legitimate);
        let emotional = extract_features("unfassbar unfassbar", "https://example.org");
        assert_eq!(derive_category(Label::LikelyReal, &emotional), Category::Manipulation);
    }
}
