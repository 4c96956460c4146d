//! Recovers a JSON object from free-form model output.
//!
//! Models wrap their answer in code fences, prepend prose, or append
//! commentary. [`normalize`] tries a fixed sequence of recoveries and stops at
//! the first one that parses. It never panics and never returns partial data.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

fn fenced_block_regex() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced block regex is valid")
    })
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Drops the first line if it opens a fence and the last line if it closes one.
fn strip_outer_fences(s: &str) -> String {
    let mut lines: Vec<&str> = s.lines().collect();
    if lines.first().is_some_and(|l| l.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

pub fn normalize(raw: &str) -> Option<Map<String, Value>> {
    let mut s = raw.trim().to_string();
    if s.is_empty() {
        return None;
    }

    if let Some(found) = fenced_block_regex()
        .captures(&s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_object(m.as_str().trim()))
    {
        return Some(found);
    }

    if s.starts_with("```") {
        s = strip_outer_fences(&s);
    }

    if s.starts_with('{') && s.ends_with('}') {
        return parse_object(&s);
    }

    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&s[start..=end])
}
