use super::payout::{PayoutAccount, PayoutAccountRecord};
use super::tip::{DepositResponse, StatusResponse, TipRequest};
use crate::error::GatewayError;
use async_trait::async_trait;

/// The external service that executes mobile-money deposits.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `POST /payments/deposits/{walletId}/`
    async fn submit_deposit(&self, request: &TipRequest) -> Result<DepositResponse, GatewayError>;
    /// `GET /payments/status/{paymentId}/`
    async fn check_status(&self, payment_id: &str) -> Result<StatusResponse, GatewayError>;
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

/// Where the signed-in creator's payout account is kept.
#[async_trait]
pub trait PayoutAccountStore: Send + Sync {
    /// `GET /wallets/payout-account`. `None` when the creator has not set one up.
    async fn fetch_payout_account(&self) -> Result<Option<PayoutAccountRecord>, GatewayError>;
    /// `PUT /wallets/payout-account`
    async fn update_payout_account(&self, account: &PayoutAccount) -> Result<PayoutAccountRecord, GatewayError>;
}

pub type PayoutAccountStoreBox = Box<dyn PayoutAccountStore>;
