//! Frame decoding for the chat event stream.
//!
//! Decoding is total: every frame maps to exactly one event, and malformed
//! payloads fall back to a well-defined variant instead of failing the
//! stream.

use chatstream_core::{SseChatEvent, CODE_USAGE_DECODE};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct TokenPayload {
    text: String,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    tokens_in: u32,
    tokens_out: u32,
    cost_usd: f64,
    model: String,
}

#[derive(Debug, Deserialize)]
struct DonePayload {
    #[serde(default = "default_finish_reason")]
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

fn default_finish_reason() -> String {
    "stop".to_string()
}

/// Decode one frame into exactly one event.
///
/// `event_type` is the SSE event label, absent for comment or unnamed
/// frames. Never panics and never drops a frame: recognized types with
/// malformed payloads recover locally, everything else becomes `Unknown`.
pub fn decode_frame(event_type: Option<&str>, data: &str) -> SseChatEvent {
    if event_type.is_none() && data.trim_start().starts_with(':') {
        return SseChatEvent::Heartbeat;
    }

    match event_type {
        Some("token") => decode_token(data),
        Some("usage") => decode_usage(data),
        Some("done") => decode_done(data),
        Some("error") => decode_error(data),
        other => SseChatEvent::Unknown {
            event_type: other.unwrap_or_default().to_string(),
            raw_data: data.to_string(),
        },
    }
}

// A malformed token frame must never terminate the stream; fall back to
// the raw payload with surrounding quotes stripped.
fn decode_token(data: &str) -> SseChatEvent {
    match serde_json::from_str::<TokenPayload>(data) {
        Ok(payload) => SseChatEvent::Token { text: payload.text },
        Err(e) => {
            warn!(error = %e, "Malformed token payload, forwarding raw text");
            SseChatEvent::Token {
                text: strip_quotes(data).to_string(),
            }
        }
    }
}

// Usage data loss is surfaced as a typed error, never silently dropped.
fn decode_usage(data: &str) -> SseChatEvent {
    match serde_json::from_str::<UsagePayload>(data) {
        Ok(payload) => SseChatEvent::Usage {
            tokens_in: payload.tokens_in,
            tokens_out: payload.tokens_out,
            cost_usd: payload.cost_usd,
            model: payload.model,
        },
        Err(e) => {
            warn!(error = %e, raw_len = data.len(), "Malformed usage payload");
            SseChatEvent::Error {
                message: format!("failed to decode usage payload: {e}"),
                code: Some(CODE_USAGE_DECODE.to_string()),
            }
        }
    }
}

fn decode_done(data: &str) -> SseChatEvent {
    let finish_reason = serde_json::from_str::<DonePayload>(data)
        .map(|payload| payload.finish_reason)
        .unwrap_or_else(|_| default_finish_reason());
    SseChatEvent::Done { finish_reason }
}

fn decode_error(data: &str) -> SseChatEvent {
    match serde_json::from_str::<ErrorPayload>(data) {
        Ok(payload) => SseChatEvent::Error {
            message: payload.message,
            code: payload.code,
        },
        Err(_) => SseChatEvent::Error {
            message: data.to_string(),
            code: None,
        },
    }
}

fn strip_quotes(data: &str) -> &str {
    let trimmed = data.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_token() {
        let event = decode_frame(Some("token"), r#"{"text":"Hello"}"#);
        assert_eq!(
            event,
            SseChatEvent::Token {
                text: "Hello".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_token_falls_back_to_raw() {
        for raw in ["not json", "{\"broken\":", "\"just a string\"", ""] {
            let event = decode_frame(Some("token"), raw);
            match event {
                SseChatEvent::Token { .. } => {}
                other => panic!("expected Token for {raw:?}, got {other:?}"),
            }
        }
        assert_eq!(
            decode_frame(Some("token"), r#""quoted text""#),
            SseChatEvent::Token {
                text: "quoted text".to_string()
            }
        );
    }

    #[test]
    fn test_well_formed_usage() {
        let event = decode_frame(
            Some("usage"),
            r#"{"tokens_in":10,"tokens_out":42,"cost_usd":0.003,"model":"sonnet-4"}"#,
        );
        assert_eq!(
            event,
            SseChatEvent::Usage {
                tokens_in: 10,
                tokens_out: 42,
                cost_usd: 0.003,
                model: "sonnet-4".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_usage_yields_coded_error() {
        for raw in ["not json", "{}", r#"{"tokens_in":"ten"}"#] {
            match decode_frame(Some("usage"), raw) {
                SseChatEvent::Error { code, .. } => {
                    assert_eq!(code.as_deref(), Some(CODE_USAGE_DECODE));
                }
                other => panic!("expected Error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_done_defaults_finish_reason() {
        assert_eq!(
            decode_frame(Some("done"), ""),
            SseChatEvent::Done {
                finish_reason: "stop".to_string()
            }
        );
        assert_eq!(
            decode_frame(Some("done"), "{}"),
            SseChatEvent::Done {
                finish_reason: "stop".to_string()
            }
        );
        assert_eq!(
            decode_frame(Some("done"), r#"{"finish_reason":"length"}"#),
            SseChatEvent::Done {
                finish_reason: "length".to_string()
            }
        );
    }

    #[test]
    fn test_error_payload() {
        assert_eq!(
            decode_frame(Some("error"), r#"{"message":"rate limited","code":"429"}"#),
            SseChatEvent::Error {
                message: "rate limited".to_string(),
                code: Some("429".to_string())
            }
        );
        assert_eq!(
            decode_frame(Some("error"), "upstream exploded"),
            SseChatEvent::Error {
                message: "upstream exploded".to_string(),
                code: None
            }
        );
    }

    #[test]
    fn test_comment_frame_is_heartbeat() {
        assert_eq!(decode_frame(None, ": keep-alive"), SseChatEvent::Heartbeat);
    }

    #[test]
    fn test_unrecognized_type_is_unknown() {
        assert_eq!(
            decode_frame(Some("custom_v2"), "{}"),
            SseChatEvent::Unknown {
                event_type: "custom_v2".to_string(),
                raw_data: "{}".to_string()
            }
        );
    }

    #[test]
    fn test_absent_type_without_comment_is_unknown() {
        assert_eq!(
            decode_frame(None, "mystery payload"),
            SseChatEvent::Unknown {
                event_type: String::new(),
                raw_data: "mystery payload".to_string()
            }
        );
    }
}
