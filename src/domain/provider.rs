use crate::error::TipError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A mobile-money carrier able to settle a tip.
///
/// Serialized as the gateway identifier (e.g. `MTN_MOMO_ZMB`), which is the
/// form the deposit endpoint expects in its `provider` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "MTN_MOMO_ZMB")]
    Mtn,
    #[serde(rename = "AIRTEL_OAPI_ZMB")]
    Airtel,
    #[serde(rename = "ZAMTEL_ZMB")]
    Zamtel,
}

impl Provider {
    /// Lookup order used when matching a number against prefix sets.
    pub const ALL: [Provider; 3] = [Provider::Mtn, Provider::Airtel, Provider::Zamtel];

    pub const fn gateway_id(&self) -> &'static str {
        match self {
            Provider::Mtn => "MTN_MOMO_ZMB",
            Provider::Airtel => "AIRTEL_OAPI_ZMB",
            Provider::Zamtel => "ZAMTEL_ZMB",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Provider::Mtn => "MTN Money",
            Provider::Airtel => "Airtel Money",
            Provider::Zamtel => "Zamtel Kwacha",
        }
    }

    pub const fn logo_url(&self) -> &'static str {
        match self {
            Provider::Mtn => "https://static-content.pawapay.io/provider_logos/mtn.png",
            Provider::Airtel => "https://static-content.pawapay.io/provider_logos/airtel.png",
            Provider::Zamtel => "https://static-content.pawapay.io/provider_logos/zamtel.png",
        }
    }

    /// Three-digit subscriber prefixes owned by this carrier. Disjoint across carriers.
    pub const fn prefixes(&self) -> &'static [&'static str] {
        match self {
            Provider::Mtn => &["096", "076", "056"],
            Provider::Airtel => &["097", "077", "057"],
            Provider::Zamtel => &["095", "075", "055"],
        }
    }

    pub fn owns_prefix(&self, prefix: &str) -> bool {
        self.prefixes().iter().any(|p| *p == prefix)
    }

    /// Parses a gateway identifier, ignoring ASCII case.
    pub fn from_gateway_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.gateway_id().eq_ignore_ascii_case(id.trim()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = TipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_gateway_id(s)
            .ok_or_else(|| TipError::Validation(format!("Unknown mobile money provider: {s}")))
    }
}
