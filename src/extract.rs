//! Best-effort recovery of a JSON object from free-form text.
//!
//! Model output and pasted snippets often wrap the JSON we want in prose or a
//! fenced code block. [`extract_payload`] strips the first fence, finds the
//! first `{`, and counts braces to the matching `}` before parsing exactly that
//! span.
//!
//! Brace counting does not track string literals, so a `}` inside a string
//! value ends the span early and the parse fails. This is a recovery aid for
//! untrusted input, not a parser; well-formed input should go straight to
//! `serde_json`.

use crate::pipeline::structure::kind_of;
use serde_json::Value;

const FENCE: &str = "```";

/// Recover the first JSON object embedded in `text`.
///
/// Returns `None` (and logs why) when no balanced object is found or the span
/// does not parse.
pub fn extract_payload(text: &str) -> Option<Value> {
    let candidates = fenced_body(text).into_iter().chain(std::iter::once(text));

    for candidate in candidates {
        let Some(span) = balanced_object(candidate) else {
            continue;
        };
        return parse_object(span);
    }

    tracing::warn!(text_len = text.len(), "no balanced JSON object found in text");
    None
}

/// Parse `span` as a JSON object, logging why when it is not one.
fn parse_object(span: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(span) {
        Ok(value) if value.is_object() => Some(value),
        Ok(other) => {
            tracing::warn!(
                span_len = span.len(),
                found = kind_of(&other),
                "embedded JSON is not an object"
            );
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, span_len = span.len(), "embedded JSON did not parse");
            None
        }
    }
}

/// Content between the first fence and the next, without the info string.
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find(FENCE)?;
    let after = text.get(start + FENCE.len()..)?;

    // Drop an info string such as `json` on the opening fence line.
    let after = match after.find('\n') {
        Some(nl) if !after.get(..nl).is_some_and(|line| line.contains('{')) => {
            after.get(nl + 1..).unwrap_or_default()
        }
        _ => after,
    };

    Some(match after.find(FENCE) {
        Some(end) => after.get(..end).unwrap_or(after),
        None => after,
    })
}

/// Slice from the first `{` to its matching `}` by depth counting.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let tail = text.get(start..)?;
    let mut depth = 0_usize;

    for (offset, ch) in tail.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return tail.get(..=offset);
                }
            }
            _ => {}
        }
    }
    None
}
