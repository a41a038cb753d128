//! The mobile-money account a creator's earnings are paid out to.

use crate::domain::phone::{detect_provider, validate_mobile_number};
use crate::domain::provider::Provider;
use crate::error::TipError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INVALID_PAYOUT_NUMBER_MESSAGE: &str = "Please enter a valid Zambian phone number";
pub const MISSING_ACCOUNT_NAME_MESSAGE: &str = "Account name is required";
pub const MISSING_PROVIDER_MESSAGE: &str = "Please select a mobile money provider";

/// A validated payout account, ready to be saved.
///
/// Serializes to the body of `PUT /wallets/payout-account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAccount {
    phone_number: String,
    account_name: String,
    provider: Provider,
}

impl PayoutAccount {
    /// Validates the payout form.
    ///
    /// When `provider` is `None` the carrier is detected from the number. An
    /// explicit provider wins over detection.
    pub fn new(phone: &str, account_name: &str, provider: Option<Provider>) -> Result<Self, TipError> {
        let digit_count = phone.chars().filter(char::is_ascii_digit).count();
        let check = validate_mobile_number(phone);
        let phone_number = match check.formatted {
            Some(formatted) if check.is_valid && digit_count >= 9 => formatted,
            _ => return Err(TipError::Validation(INVALID_PAYOUT_NUMBER_MESSAGE.to_string())),
        };

        let account_name = account_name.trim();
        if account_name.is_empty() {
            return Err(TipError::Validation(MISSING_ACCOUNT_NAME_MESSAGE.to_string()));
        }

        let provider = provider
            .or_else(|| detect_provider(phone))
            .ok_or_else(|| TipError::Validation(MISSING_PROVIDER_MESSAGE.to_string()))?;

        Ok(Self {
            phone_number,
            account_name: account_name.to_string(),
            provider,
        })
    }

    /// The normalized `260XXXXXXXXX` form.
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

/// A payout account as stored by the wallet service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAccountRecord {
    pub provider: Provider,
    pub phone_number: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&PayoutAccount> for PayoutAccountRecord {
    fn from(account: &PayoutAccount) -> Self {
        Self {
            provider: account.provider,
            phone_number: account.phone_number.clone(),
            account_name: Some(account.account_name.clone()),
            verified: false,
            created_at: Some(Utc::now()),
        }
    }
}

/// `{ "status": ..., "data": { ... } }` envelope of the wallet endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoutAccountResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<PayoutAccountRecord>,
}
