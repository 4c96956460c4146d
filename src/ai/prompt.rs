use crate::models::{Category, FeatureSet};

/// Article text beyond this many characters is not sent to the model.
pub const MAX_PROMPT_TEXT_CHARS: usize = 8000;

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(title: &str, url: &str, text: &str, features: &FeatureSet) -> String {
    let categories = Category::ALL
        .iter()
        .filter(|c| !matches!(c, Category::FeedTeaser | Category::Unknown))
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Du bist NewsGuard, ein Werkzeug zur Einschätzung von Desinformation.

KATEGORIEN:
{categories}

REGELN:
- Satire ist keine Fake News
- Propaganda, Falschmeldung, Manipulation -> likely_fake
- Clickbait, Irreführende Inhalte -> uncertain
- Seriöse Nachricht -> likely_real

MESSWERTE:
- word_count: {word_count}
- has_enough_text: {has_enough_text}
- fake_trigger_hits: {fake_trigger_hits}
- uncertainty_hits: {uncertainty_hits}
- emotion_hits: {emotion_hits}
- is_satire_domain: {is_satire_domain}
- source_domain: {source_domain}

META:
- Titel: {title}
- URL: {url}

ANTWORTFORMAT (NUR JSON):
{{
  "label": "likely_fake | uncertain | likely_real",
  "confidence": 0-100,
  "category": "...",
  "red_flags": [string],
  "reasoning_summary": string,
  "suggested_counter_sources": [string]
}}

TEXT:
{text}"#,
        word_count = features.word_count,
        has_enough_text = features.has_enough_text,
        fake_trigger_hits = features.fake_trigger_hits,
        uncertainty_hits = features.uncertainty_hits,
        emotion_hits = features.emotion_hits,
        is_satire_domain = features.is_satire_domain,
        source_domain = features.source_domain,
        text = truncate_chars(text, MAX_PROMPT_TEXT_CHARS),
    )
}
