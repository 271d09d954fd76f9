//! Token Estimation
//!
//! Character-count heuristics for token usage reporting. These numbers are
//! advisory: they are never measured against a real tokenizer and must not
//! be used for billing.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Token usage reported alongside each assistant reply
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl TokenUsage {
    /// Usage for a backend answer: the prompt covers the query plus its context
    pub fn for_exchange(query: &str, context: &[ChatMessage], reply: &str) -> Self {
        let joined = context
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let prompt = estimate_tokens(&format!("{query}{joined}"));
        let completion = estimate_tokens(reply);

        Self {
            prompt,
            completion,
            total: prompt + completion,
        }
    }

    /// Usage for a canned fallback: the total is estimated over both texts together
    pub fn for_fallback(query: &str, reply: &str) -> Self {
        Self {
            prompt: estimate_tokens(query),
            completion: estimate_tokens(reply),
            total: div_ceil_4(char_len(query) + char_len(reply)),
        }
    }
}

/// Estimate token count as `ceil(chars / 4)`
pub fn estimate_tokens(text: &str) -> u32 {
    div_ceil_4(char_len(text))
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn div_ceil_4(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

const FILLER_PHRASES: [&str; 4] = ["please", "thank you", "could you", "would you"];

/// Collapse whitespace and drop filler phrases
pub fn compress_message(content: &str) -> String {
    let mut text = content.split_whitespace().collect::<Vec<_>>().join(" ");

    for phrase in FILLER_PHRASES {
        text = remove_case_insensitive(&text, phrase);
    }

    text.trim().to_string()
}

fn remove_case_insensitive(text: &str, phrase: &str) -> String {
    let lower = text.to_lowercase();
    // Lowercasing may change byte lengths outside ASCII; leave such text alone.
    if lower.len() != text.len() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(pos) = lower[cursor..].find(phrase) {
        let start = cursor + pos;
        out.push_str(&text[cursor..start]);
        cursor = start + phrase.len();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Keep the newest messages whose estimated tokens fit in `max_tokens`
pub fn trim_context(messages: &[ChatMessage], max_tokens: u32) -> Vec<ChatMessage> {
    let mut total = 0u32;
    let mut kept = Vec::new();

    for message in messages.iter().rev() {
        let tokens = estimate_tokens(&message.content);
        if total + tokens > max_tokens {
            break;
        }
        total += tokens;
        kept.push(message.clone());
    }

    kept.reverse();
    kept
}

const QUERY_CONTEXTS: [(&str, &str); 8] = [
    ("safety", "workplace safety OSHA"),
    ("grievance", "union grievance procedure"),
    ("contract", "collective bargaining agreement"),
    ("benefits", "union member benefits"),
    ("training", "union training apprenticeship"),
    ("overtime", "overtime compensation rules"),
    ("discipline", "workplace discipline procedure"),
    ("steward", "union steward representative"),
];

/// Prefix a query with the union topic it mentions, if any
pub fn format_union_query(content: &str) -> String {
    let lower = content.to_lowercase();

    QUERY_CONTEXTS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or_else(|| content.to_string(), |(_, context)| format!("{context}: {content}"))
}
