//! HTTP Basic authentication

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hyper::header::{HeaderMap, AUTHORIZATION};

/// Challenge sent with every 401
pub const CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Extract `(username, password)` from a Basic `Authorization` header.
///
/// Returns `None` when the header is absent, uses another scheme, is not
/// valid base64/UTF-8, or lacks the `:` separator.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    parse_basic(value)
}

fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}
