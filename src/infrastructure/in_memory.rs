use crate::domain::payout::{PayoutAccount, PayoutAccountRecord};
use crate::domain::ports::{PaymentGateway, PayoutAccountStore};
use crate::domain::status::GatewayStatus;
use crate::domain::tip::{DepositData, DepositMetadata, DepositResponse, StatusResponse, TipRequest};
use crate::error::GatewayError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A deposit as the in-memory gateway received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDeposit {
    pub wallet_id: String,
    pub body: Value,
}

#[derive(Default)]
struct Script {
    deposits: VecDeque<Result<DepositResponse, GatewayError>>,
    statuses: VecDeque<Result<StatusResponse, GatewayError>>,
    received_deposits: Vec<RecordedDeposit>,
    status_checks: Vec<String>,
    payout_account: Option<PayoutAccountRecord>,
}

/// A scripted payment gateway kept entirely in memory.
///
/// Answers are popped from per-endpoint queues. When a queue runs dry, deposits
/// are accepted as `ACCEPTED` with a generated id and status checks report
/// `PENDING`. Clones share the same script and call log, so a test can hand
/// one clone to a flow and inspect the other.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    script: Arc<RwLock<Script>>,
    latency: Option<Duration>,
}

impl InMemoryGateway {
    /// Creates a gateway with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer, e.g. to exercise timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn push_deposit(&self, response: Result<DepositResponse, GatewayError>) {
        self.script.write().await.deposits.push_back(response);
    }

    pub async fn push_status(&self, response: Result<StatusResponse, GatewayError>) {
        self.script.write().await.statuses.push_back(response);
    }

    pub async fn deposits(&self) -> Vec<RecordedDeposit> {
        self.script.read().await.received_deposits.clone()
    }

    pub async fn deposit_count(&self) -> usize {
        self.script.read().await.received_deposits.len()
    }

    pub async fn status_checks(&self) -> Vec<String> {
        self.script.read().await.status_checks.clone()
    }

    pub async fn status_check_count(&self) -> usize {
        self.script.read().await.status_checks.len()
    }

    pub async fn set_payout_account(&self, record: Option<PayoutAccountRecord>) {
        self.script.write().await.payout_account = record;
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn submit_deposit(&self, request: &TipRequest) -> Result<DepositResponse, GatewayError> {
        let response = {
            let mut script = self.script.write().await;
            let body = serde_json::to_value(request.to_body()).unwrap_or(Value::Null);
            script.received_deposits.push(RecordedDeposit {
                wallet_id: request.payee_wallet_id.to_string(),
                body,
            });
            let generated = format!("dep-{}", script.received_deposits.len());
            script
                .deposits
                .pop_front()
                .unwrap_or_else(|| Ok(accepted_deposit("ACCEPTED", Some(generated.as_str()))))
        };
        self.wait().await;
        response
    }

    async fn check_status(&self, payment_id: &str) -> Result<StatusResponse, GatewayError> {
        let response = {
            let mut script = self.script.write().await;
            script.status_checks.push(payment_id.to_string());
            script
                .statuses
                .pop_front()
                .unwrap_or_else(|| Ok(status_report("PENDING")))
        };
        self.wait().await;
        response
    }
}

/// Updates behave like an upsert: the first save creates the account.
#[async_trait]
impl PayoutAccountStore for InMemoryGateway {
    async fn fetch_payout_account(&self) -> Result<Option<PayoutAccountRecord>, GatewayError> {
        let record = self.script.read().await.payout_account.clone();
        self.wait().await;
        Ok(record)
    }

    async fn update_payout_account(&self, account: &PayoutAccount) -> Result<PayoutAccountRecord, GatewayError> {
        let record = {
            let mut script = self.script.write().await;
            let mut record = PayoutAccountRecord::from(account);
            if let Some(previous) = &script.payout_account {
                record.verified = previous.verified
                    && previous.phone_number == record.phone_number
                    && previous.provider == record.provider;
                record.created_at = previous.created_at;
            }
            script.payout_account = Some(record.clone());
            record
        };
        self.wait().await;
        Ok(record)
    }
}

/// An accepted deposit response carrying `status` in its metadata.
pub fn accepted_deposit(status: &str, deposit_id: Option<&str>) -> DepositResponse {
    DepositResponse {
        status: "accepted".to_string(),
        message: None,
        data: Some(DepositData {
            metadata: Some(DepositMetadata {
                status: GatewayStatus::parse(status),
                deposit_id: deposit_id.map(str::to_string),
            }),
        }),
    }
}

/// A successful status-check response reporting `status`.
pub fn status_report(status: &str) -> StatusResponse {
    StatusResponse {
        status: GatewayStatus::parse(status),
        success: true,
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::phone::PhoneNumber;
    use crate::domain::provider::Provider;
    use crate::domain::tip::{Amount, WalletId};
    use rust_decimal_macros::dec;

    fn request() -> TipRequest {
        TipRequest {
            amount: Amount::new(dec!(25)).unwrap(),
            payer_phone: PhoneNumber::parse("0951234567").unwrap(),
            provider: Provider::Zamtel,
            payee_wallet_id: WalletId::new("wallet-3").unwrap(),
            payer_email: "fan@example.com".to_string(),
            message: Some("thanks".to_string()),
        }
    }

    #[tokio::test]
    async fn test_defaults_when_script_is_empty() {
        let gateway = InMemoryGateway::new();
        let response = gateway.submit_deposit(&request()).await.unwrap();
        assert!(response.is_accepted());
        assert_eq!(
            response.metadata().unwrap().deposit_id.as_deref(),
            Some("dep-1")
        );

        let status = gateway.check_status("dep-1").await.unwrap();
        assert_eq!(status.status, GatewayStatus::Pending);
    }

    #[tokio::test]
    async fn test_scripted_answers_in_order() {
        let gateway = InMemoryGateway::new();
        gateway.push_status(Ok(status_report("COMPLETED"))).await;
        gateway
            .push_status(Err(GatewayError::Transport("down".to_string())))
            .await;

        assert_eq!(
            gateway.check_status("a").await.unwrap().status,
            GatewayStatus::Completed
        );
        assert!(gateway.check_status("b").await.is_err());
        assert_eq!(gateway.status_checks().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_records_deposit_bodies_across_clones() {
        let gateway = InMemoryGateway::new();
        let clone = gateway.clone();
        clone.submit_deposit(&request()).await.unwrap();

        let deposits = gateway.deposits().await;
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].wallet_id, "wallet-3");
        assert_eq!(deposits[0].body["patronPhone"], "260951234567");
        assert_eq!(deposits[0].body["provider"], "ZAMTEL_ZMB");
        assert_eq!(deposits[0].body["patronMessage"], "thanks");
    }

    #[tokio::test]
    async fn test_payout_account_upsert() {
        let gateway = InMemoryGateway::new();
        assert_eq!(gateway.fetch_payout_account().await.unwrap(), None);

        let account = PayoutAccount::new("0971234567", "Chanda", None).unwrap();
        let created = gateway.update_payout_account(&account).await.unwrap();
        assert_eq!(created.provider, Provider::Airtel);
        assert_eq!(created.account_name.as_deref(), Some("Chanda"));

        gateway
            .set_payout_account(Some(PayoutAccountRecord {
                verified: true,
                ..created.clone()
            }))
            .await;
        let renamed = PayoutAccount::new("0971234567", "Chanda M.", None).unwrap();
        let updated = gateway.update_payout_account(&renamed).await.unwrap();
        assert!(updated.verified);
        assert_eq!(updated.created_at, created.created_at);

        let moved = PayoutAccount::new("0961234567", "Chanda M.", None).unwrap();
        assert!(!gateway.update_payout_account(&moved).await.unwrap().verified);
        assert_eq!(
            gateway.fetch_payout_account().await.unwrap().unwrap().phone_number,
            "260961234567"
        );
    }
}
