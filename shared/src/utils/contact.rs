//! Contact address utilities (email / phone)

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number regex (E.164 format)
static E164_PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("valid phone regex"));

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Contact channel of a target string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Phone,
}

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Check if a phone number is valid (E.164 format)
pub fn is_valid_phone(phone: &str) -> bool {
    E164_PHONE_REGEX.is_match(&normalize_phone_number(phone))
}

/// Check if an email address is well formed
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Detect whether a target is an email address or a phone number
pub fn classify(target: &str) -> Option<ContactKind> {
    if is_valid_email(target) {
        Some(ContactKind::Email)
    } else if is_valid_phone(target) {
        Some(ContactKind::Phone)
    } else {
        None
    }
}

/// Normalize a contact for lookups: emails lowercased, phones stripped of formatting
pub fn normalize(target: &str) -> String {
    match classify(target) {
        Some(ContactKind::Email) => target.trim().to_lowercase(),
        Some(ContactKind::Phone) => normalize_phone_number(target),
        None => target.trim().to_string(),
    }
}

/// Mask a target for logging (e.g. +1555****567, j***@example.com)
pub fn mask_contact(target: &str) -> String {
    let target = target.trim();
    if let Some((local, domain)) = target.split_once('@') {
        let first: String = local.chars().take(1).collect();
        return format!("{}***@{}", first, domain);
    }

    let chars: Vec<char> = target.chars().collect();
    if chars.len() >= 8 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        format!("{}****{}", head, tail)
    } else if chars.len() > 2 {
        let head: String = chars[..1].iter().collect();
        format!("{}***", head)
    } else {
        "***".to_string()
    }
}
