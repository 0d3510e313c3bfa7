use lazy_static::lazy_static;
use regex::Regex;

pub(crate) const MIN_PASSWORD_LENGTH: usize = 6;

const STRENGTH_LABELS: [&str; 5] = ["Very Weak", "Weak", "Fair", "Good", "Strong"];

lazy_static! {
    static ref LOWER: Regex = Regex::new(r"[a-z]").unwrap();
    static ref UPPER: Regex = Regex::new(r"[A-Z]").unwrap();
    static ref DIGIT: Regex = Regex::new(r"\d").unwrap();
    static ref SYMBOL: Regex = Regex::new(r"[^a-zA-Z\d]").unwrap();
}

/// Score a password from 0 to 4, one point each for minimum length, mixed case, a digit and a symbol
pub(crate) fn password_strength(password: &str) -> usize {
    let mut strength = 0;
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        strength += 1;
    }
    if LOWER.is_match(password) && UPPER.is_match(password) {
        strength += 1;
    }
    if DIGIT.is_match(password) {
        strength += 1;
    }
    if SYMBOL.is_match(password) {
        strength += 1;
    }
    strength
}

pub(crate) fn strength_label(strength: usize) -> &'static str {
    STRENGTH_LABELS[strength.min(STRENGTH_LABELS.len() - 1)]
}
