#![forbid(unsafe_code)]

//! `mailto:` URI construction for the mail hand-off submission path.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except the unreserved set of `encodeURIComponent`:
/// alphanumerics and `- _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one query component.
#[must_use]
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// The three-line contact body: name, email, message.
#[must_use]
pub fn contact_body(name: &str, email: &str, message: &str) -> String {
    format!("Name: {name}\nEmail: {email}\nMessage: {message}")
}

/// Full `mailto:` URI with encoded subject and body query parameters.
#[must_use]
pub fn mailto_uri(recipient: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{recipient}?subject={}&body={}",
        encode_component(subject),
        encode_component(body)
    )
}
