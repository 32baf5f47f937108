//! TwiML replies for the SMS webhook.

use quick_xml::escape::escape;

pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// A single outbound message.
#[must_use]
pub fn message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape(text)
    )
}

/// Acknowledge the webhook without sending anything back.
#[must_use]
pub fn empty() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response/>".to_string()
}
