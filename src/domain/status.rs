use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Coarse outcome a gateway status maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBucket {
    Success,
    Processing,
    Error,
}

/// Status codes reported by the payment gateway.
///
/// Parsing is case-insensitive and fail-closed: anything unrecognised is kept
/// as [`GatewayStatus::Unknown`] and classified as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Completed,
    Paid,
    Accepted,
    Pending,
    Processing,
    Captured,
    Submitted,
    RequiresAction,
    RequiresConfirmation,
    PartiallyCaptured,
    InReconciliation,
    Refunded,
    PartiallyRefunded,
    Failed,
    Rejected,
    Disputed,
    Expired,
    Cancelled,
    Unknown(String),
}

impl GatewayStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => Self::Completed,
            "PAID" => Self::Paid,
            "ACCEPTED" => Self::Accepted,
            "PENDING" => Self::Pending,
            "PROCESSING" => Self::Processing,
            "CAPTURED" => Self::Captured,
            "SUBMITTED" => Self::Submitted,
            "REQUIRES_ACTION" => Self::RequiresAction,
            "REQUIRES_CONFIRMATION" => Self::RequiresConfirmation,
            "PARTIALLY_CAPTURED" => Self::PartiallyCaptured,
            "IN_RECONCILIATION" => Self::InReconciliation,
            "REFUNDED" => Self::Refunded,
            "PARTIALLY_REFUNDED" => Self::PartiallyRefunded,
            "FAILED" => Self::Failed,
            "REJECTED" => Self::Rejected,
            "DISPUTED" => Self::Disputed,
            "EXPIRED" => Self::Expired,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Paid => "PAID",
            Self::Accepted => "ACCEPTED",
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Captured => "CAPTURED",
            Self::Submitted => "SUBMITTED",
            Self::RequiresAction => "REQUIRES_ACTION",
            Self::RequiresConfirmation => "REQUIRES_CONFIRMATION",
            Self::PartiallyCaptured => "PARTIALLY_CAPTURED",
            Self::InReconciliation => "IN_RECONCILIATION",
            Self::Refunded => "REFUNDED",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
            Self::Failed => "FAILED",
            Self::Rejected => "REJECTED",
            Self::Disputed => "DISPUTED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn bucket(&self) -> StatusBucket {
        match self {
            Self::Completed | Self::Paid => StatusBucket::Success,
            Self::Accepted
            | Self::Pending
            | Self::Processing
            | Self::Captured
            | Self::Submitted
            | Self::RequiresAction
            | Self::RequiresConfirmation
            | Self::PartiallyCaptured
            | Self::InReconciliation => StatusBucket::Processing,
            Self::Refunded
            | Self::PartiallyRefunded
            | Self::Failed
            | Self::Rejected
            | Self::Disputed
            | Self::Expired
            | Self::Cancelled
            | Self::Unknown(_) => StatusBucket::Error,
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GatewayStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GatewayStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
