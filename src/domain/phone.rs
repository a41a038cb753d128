//! Mobile number classification.
//!
//! Pure functions that recognise Zambian mobile-money numbers, tell which
//! carrier owns them and normalize them to the `260XXXXXXXXX` international
//! form the gateway expects.

use crate::domain::provider::Provider;
use crate::error::TipError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Optional trunk `0`, a carrier prefix, then seven subscriber digits.
static MOBILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0?(95|96|76|97|77|75|55|56|57)\d{7}$").expect("mobile pattern is valid")
});

pub const COUNTRY_CODE: &str = "260";
pub const INVALID_NUMBER_MESSAGE: &str = "Invalid mobile number format or prefix";

/// Carrier names reported by [`validate_mobile_number`].
const CARRIER_NAMES: [(&str, &str); 9] = [
    ("095", "ZAMTEL"),
    ("075", "ZAMTEL"),
    ("055", "ZAMTEL"),
    ("096", "MTN"),
    ("076", "MTN"),
    ("056", "MTN"),
    ("097", "Airtel"),
    ("077", "Airtel"),
    ("057", "Airtel"),
];

/// Outcome of [`validate_mobile_number`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileNumberCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl MobileNumberCheck {
    fn invalid() -> Self {
        Self {
            is_valid: false,
            carrier: None,
            formatted: None,
            error: Some(INVALID_NUMBER_MESSAGE),
        }
    }
}

/// Three-digit prefix with the trunk `0` restored when the caller omitted it.
///
/// Only meaningful for input that already matched [`MOBILE_PATTERN`].
fn canonical_prefix(digits: &str) -> String {
    if digits.starts_with('0') {
        digits[..3].to_string()
    } else {
        format!("0{}", &digits[..2])
    }
}

/// Detects the carrier owning `raw`.
///
/// Every non-digit character is discarded first, so `"097 712-3456"` is
/// accepted. Returns `None` for anything that is not a well-formed mobile number.
pub fn detect_provider(raw: &str) -> Option<Provider> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 3 || !MOBILE_PATTERN.is_match(&digits) {
        return None;
    }

    let prefix = canonical_prefix(&digits);
    Provider::ALL.into_iter().find(|p| p.owns_prefix(&prefix))
}

/// Validates and normalizes `raw`.
///
/// Only whitespace is stripped: punctuation such as a leading `+` fails.
pub fn validate_mobile_number(raw: &str) -> MobileNumberCheck {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !MOBILE_PATTERN.is_match(&cleaned) {
        return MobileNumberCheck::invalid();
    }

    let prefix = canonical_prefix(&cleaned);
    let carrier = CARRIER_NAMES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, name)| *name);
    let subscriber = cleaned.strip_prefix('0').unwrap_or(&cleaned);

    MobileNumberCheck {
        is_valid: true,
        carrier,
        formatted: Some(format!("{COUNTRY_CODE}{subscriber}")),
        error: None,
    }
}

/// A validated payer number in international form (`260` + 9 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, TipError> {
        match validate_mobile_number(raw) {
            MobileNumberCheck {
                is_valid: true,
                formatted: Some(formatted),
                ..
            } => Ok(Self(formatted)),
            check => Err(TipError::Validation(
                check.error.unwrap_or(INVALID_NUMBER_MESSAGE).to_string(),
            )),
        }
    }

    /// The normalized `260XXXXXXXXX` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The local `0XXXXXXXXX` form.
    pub fn local(&self) -> String {
        format!("0{}", &self.0[COUNTRY_CODE.len()..])
    }

    pub fn provider(&self) -> Option<Provider> {
        detect_provider(&self.local())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
