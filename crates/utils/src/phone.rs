//! Nigerian phone number helpers used by attendance check-in.

use once_cell::sync::Lazy;
use regex::Regex;

static LOCAL_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+234|0)[789]\d{9}$").expect("valid phone pattern"));

/// Whether `phone` is a Nigerian mobile number in `+234…` or `0…` form.
pub fn is_valid_nigerian_phone(phone: &str) -> bool {
    LOCAL_PHONE.is_match(phone)
}

/// Normalise to international `+234…` form. Numbers that don't look Nigerian
/// are returned untouched.
pub fn format_phone_number(phone: &str) -> String {
    let cleaned: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if cleaned.starts_with("234") {
        format!("+{}", cleaned)
    } else if let Some(rest) = cleaned.strip_prefix('0') {
        format!("+234{}", rest)
    } else if cleaned.len() == 10 {
        format!("+234{}", cleaned)
    } else {
        phone.to_string()
    }
}
