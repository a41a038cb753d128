use crate::domain::phone::PhoneNumber;
use crate::domain::provider::Provider;
use crate::domain::status::GatewayStatus;
use crate::error::TipError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive tip amount in Kwacha.
///
/// Bounds such as the minimum tip are enforced by the gateway, not here.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, TipError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(TipError::Validation(
                "Tip amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = TipError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K{}", self.0.normalize())
    }
}

/// Opaque identifier of the creator wallet receiving a tip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(id: impl Into<String>) -> Result<Self, TipError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TipError::Validation("Wallet id must not be empty".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to ask the gateway for a deposit. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TipRequest {
    pub amount: Amount,
    pub payer_phone: PhoneNumber,
    pub provider: Provider,
    pub payee_wallet_id: WalletId,
    pub payer_email: String,
    pub message: Option<String>,
}

impl TipRequest {
    pub fn to_body(&self) -> DepositBody<'_> {
        DepositBody {
            amount: self.amount.value(),
            provider: self.provider,
            patron_phone: self.payer_phone.as_str(),
            patron_email: &self.payer_email,
            patron_message: self.message.as_deref(),
        }
    }
}

/// JSON body of `POST /payments/deposits/{walletId}/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositBody<'a> {
    pub amount: Decimal,
    pub provider: Provider,
    pub patron_phone: &'a str,
    pub patron_email: &'a str,
    pub patron_message: Option<&'a str>,
}

/// Response of the deposit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<DepositData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositData {
    #[serde(default)]
    pub metadata: Option<DepositMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositMetadata {
    pub status: GatewayStatus,
    #[serde(rename = "depositId", default)]
    pub deposit_id: Option<String>,
}

impl DepositResponse {
    /// The gateway took the request (`accepted` or `success`).
    pub fn is_accepted(&self) -> bool {
        ["accepted", "success"]
            .iter()
            .any(|s| self.status.trim().eq_ignore_ascii_case(s))
    }

    pub fn metadata(&self) -> Option<&DepositMetadata> {
        self.data.as_ref().and_then(|d| d.metadata.as_ref())
    }
}

/// Response of `GET /payments/status/{paymentId}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: GatewayStatus,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// A deposit the gateway knows about.
///
/// Only ever updated from a fresh gateway status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TipTransaction {
    pub id: String,
    pub status: GatewayStatus,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TipTransaction {
    pub fn new(id: String, status: GatewayStatus, amount: Amount) -> Self {
        let now = Utc::now();
        Self {
            id,
            status,
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn refresh(&mut self, status: GatewayStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
