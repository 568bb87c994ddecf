//! Share text and `sms:` links for a finished game.
//!
//! Message format:
//! `<status> The hidden state was <secret>. My performance today <trail>. <url>`
//!
//! The SMS body is percent-encoded with `/` left readable.

use serde::Serialize;

use crate::config::ShareConfig;
use crate::constants::{STATUS_GAME_OVER, STATUS_SUCCESS};
use crate::session::GameSession;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Share text plus the link that pre-fills it in an SMS app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareMessage {
    pub text: String,
    pub sms_uri: String,
}

#[must_use]
pub fn status_label(session: &GameSession) -> &'static str {
    if session.is_won() {
        STATUS_SUCCESS
    } else {
        STATUS_GAME_OVER
    }
}

/// Build the share message for `session`, revealing `secret_label`.
#[must_use]
pub fn format_share_message(
    session: &GameSession,
    secret_label: &str,
    share: &ShareConfig,
) -> ShareMessage {
    let text = format!(
        "{} The hidden state was {secret_label}. My performance today {}. {}",
        status_label(session),
        session.trail(),
        share.url
    );
    let sms_uri = sms_uri(&share.recipient, &text);
    ShareMessage { text, sms_uri }
}

#[must_use]
pub fn sms_uri(recipient: &str, body: &str) -> String {
    format!("sms:{recipient}?body={}", percent_encode(body))
}

#[inline]
const fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-' | b'~' | b'/')
}

/// Percent-encode every UTF-8 byte outside `A-Z a-z 0-9 _ . - ~ /`.
#[must_use]
pub fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for &byte in text.as_bytes() {
        if is_unreserved(byte) {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push(char::from(HEX_UPPER[usize::from(byte >> 4)]));
            out.push(char::from(HEX_UPPER[usize::from(byte & 0x0F)]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn won_message_reveals_secret_and_trail() {
        let mut session = GameSession::new("California");
        session.submit_guess("Texas").unwrap();
        session.submit_guess("California").unwrap();

        let share = format_share_message(&session, "California", &ShareConfig::default());
        assert_eq!(
            share.text,
            "Success! 🎉 The hidden state was California. My performance today 🟡🟢. https://croppler.streamlit.app/"
        );
        assert!(share.sms_uri.starts_with("sms:?body=Success%21%20%F0%9F%8E%89%20The"));
        assert!(share.sms_uri.contains("%F0%9F%9F%A1%F0%9F%9F%A2"));
        assert!(share.sms_uri.ends_with("https%3A//croppler.streamlit.app/"));
    }

    #[test]
    fn unfinished_or_lost_games_report_game_over() {
        let session = GameSession::new("Iowa");
        let share = format_share_message(
            &session,
            "Iowa",
            &ShareConfig {
                url: "https://example.test/".to_string(),
                recipient: "5551234".to_string(),
            },
        );
        assert!(share.text.starts_with("Game Over. ❌ "));
        assert!(share.sms_uri.starts_with("sms:5551234?body=Game%20Over.%20%E2%9D%8C"));
    }

    #[test]
    fn encoding_keeps_unreserved_bytes() {
        assert_eq!(percent_encode("a-Z_0.9~/"), "a-Z_0.9~/");
        assert_eq!(percent_encode("a b?c&d"), "a%20b%3Fc%26d");
    }
}
