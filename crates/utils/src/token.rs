//! Opaque identifiers handed out in public URLs.

use rand::{Rng, distributions::Alphanumeric};

pub const EVENT_TOKEN_LEN: usize = 26;

/// Random lowercase alphanumeric string of `len` characters.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}

/// Token embedded in an event's check-in URL. Not signed and never expires.
pub fn event_check_in_token() -> String {
    random_token(EVENT_TOKEN_LEN)
}

/// Join a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Check-in URL for an event token, e.g. `https://host/attend?event=abc`.
pub fn check_in_url(base: &str, token: &str) -> String {
    let mut url = join_url(base, "attend");
    url.push_str("?event=");
    url.extend(url::form_urlencoded::byte_serialize(token.as_bytes()));
    url
}
