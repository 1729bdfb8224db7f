//! Quantity extraction from free text.

use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_INTEGER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+").ok());
static ZERO_WORDS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:none|zero|no|nope|nothing|nenhum|nenhuma|nada|não)\b").ok()
});

/// Result of [`extract_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Count(u32),
    /// Nothing that reads as a number; distinct from zero so callers can
    /// re-prompt.
    Unrecognized,
}

impl Quantity {
    /// The count, with unrecognized input read as zero.
    pub fn or_zero(self) -> u32 {
        match self {
            Quantity::Count(n) => n,
            Quantity::Unrecognized => 0,
        }
    }
}

/// First integer in `text`; "none"/"zero" style words map to 0.
pub fn extract_quantity(text: &str) -> Quantity {
    if let Some(m) = FIRST_INTEGER.as_ref().and_then(|re| re.find(text)) {
        if let Ok(n) = m.as_str().parse::<u32>() {
            return Quantity::Count(n);
        }
    }

    if ZERO_WORDS.as_ref().is_some_and(|re| re.is_match(text)) {
        return Quantity::Count(0);
    }

    Quantity::Unrecognized
}
