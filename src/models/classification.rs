use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    LikelyFake,
    Uncertain,
    LikelyReal,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::LikelyFake => "likely_fake",
            Label::Uncertain => "uncertain",
            Label::LikelyReal => "likely_real",
        }
    }

    /// Accepts the wire names case-insensitively, with `-` or space for `_`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "likely_fake" => Some(Label::LikelyFake),
            "uncertain" => Some(Label::Uncertain),
            "likely_real" => Some(Label::LikelyReal),
            _ => None,
        }
    }
}

/// Closed category vocabulary shown to users and sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Satire/Parodie")]
    Satire,
    #[serde(rename = "Propaganda")]
    Propaganda,
    #[serde(rename = "Clickbait")]
    Clickbait,
    #[serde(rename = "Irreführende Inhalte")]
    Misleading,
    #[serde(rename = "Falschmeldung")]
    FalseReport,
    #[serde(rename = "Manipulation")]
    Manipulation,
    #[serde(rename = "Seriöse Nachricht")]
    Legitimate,
    #[serde(rename = "Feed/Teaser")]
    FeedTeaser,
    #[serde(rename = "Unbekannt")]
    Unknown,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Satire,
        Category::Propaganda,
        Category::Clickbait,
        Category::Misleading,
        Category::FalseReport,
        Category::Manipulation,
        Category::Legitimate,
        Category::FeedTeaser,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Satire => "Satire/Parodie",
            Category::Propaganda => "Propaganda",
            Category::Clickbait => "Clickbait",
            Category::Misleading => "Irreführende Inhalte",
            Category::FalseReport => "Falschmeldung",
            Category::Manipulation => "Manipulation",
            Category::Legitimate => "Seriöse Nachricht",
            Category::FeedTeaser => "Feed/Teaser",
            Category::Unknown => "Unbekannt",
        }
    }

    pub fn from_label(label: Label) -> Self {
        match label {
            Label::LikelyReal => Category::Legitimate,
            Label::Uncertain => Category::Misleading,
            Label::LikelyFake => Category::FalseReport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "rule-based")]
    RuleBased,
    #[serde(rename = "hybrid")]
    Hybrid,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::RuleBased => "rule-based",
            Method::Hybrid => "hybrid",
        }
    }
}

/// Verdict of a single pipeline run. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence: u8,
    pub category: Category,
    pub red_flags: Vec<String>,
    pub reasoning_summary: String,
    pub suggested_counter_sources: Vec<String>,
    pub method: Method,
    pub llm_used: bool,
    pub llm_status: String,
    pub title: String,
    pub excerpt: String,
    pub word_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parse_is_lenient() {
        assert_eq!(Label::parse("LIKELY_FAKE"), Some(Label::LikelyFake));
        assert_eq!(Label::parse(" likely-real "), Some(Label::LikelyReal));
        assert_eq!(Label::parse("uncertain"), Some(Label::Uncertain));
        assert_eq!(Label::parse("fake"), None);
    }

    #[test]
    fn category_serializes_to_display_name() {
        let json = serde_json::to_string(&Category::Misleading).unwrap();
        assert_eq!(json, "\"Irreführende Inhalte\"");
        let json = serde_json::to_string(&Method::RuleBased).unwrap();
        assert_eq!(json, "\"rule-based\"");
    }

    #[test]
    fn label_table_covers_every_label() {
        assert_eq!(Category::from_label(Label::LikelyReal), Category::Legitimate);
        assert_eq!(Category::from_label(Label::Uncertain), Category::Misleading);
        assert_eq!(Category::from_label(Label::LikelyFake), Category::FalseReport);
    }
}
