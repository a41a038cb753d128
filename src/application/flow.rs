use crate::domain::phone::PhoneNumber;
use crate::domain::ports::PaymentGatewayBox;
use crate::domain::provider::Provider;
use crate::domain::status::{GatewayStatus, StatusBucket};
use crate::domain::tip::{Amount, DepositResponse, StatusResponse, TipRequest, TipTransaction, WalletId};
use crate::error::{GatewayError, Result, TipError};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

pub const DECLINED_MESSAGE: &str = "Transaction was declined or failed.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";
pub const NO_TIP_MESSAGE: &str = "No tip detected.";
pub const UNVERIFIED_MESSAGE: &str =
    "We couldn't verify the payment status. It might still be processing.";
pub const TIMED_OUT_MESSAGE: &str =
    "The payment provider did not respond in time. Check your phone before trying again.";

/// Where a tip flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStep {
    Amount,
    Phone,
    /// Deposit requested, waiting for the payer to authorize on their phone.
    Processing,
    /// Still processing after an explicit status check, or the check was inconclusive.
    Pending,
    Success,
    Error,
    /// A gateway call exceeded the configured timeout.
    TimedOut,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStep::Amount => "AMOUNT",
            FlowStep::Phone => "PHONE",
            FlowStep::Processing => "PROCESSING",
            FlowStep::Pending => "PENDING",
            FlowStep::Success => "SUCCESS",
            FlowStep::Error => "ERROR",
            FlowStep::TimedOut => "TIMED_OUT",
        };
        f.write_str(name)
    }
}

/// Read-only view of a flow, published on every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSnapshot {
    pub step: FlowStep,
    pub amount: Option<Amount>,
    pub error_message: Option<String>,
    pub transaction_id: Option<String>,
    pub closed: bool,
}

impl FlowSnapshot {
    fn initial() -> Self {
        Self {
            step: FlowStep::Amount,
            amount: None,
            error_message: None,
            transaction_id: None,
            closed: false,
        }
    }
}

/// Drives one tip from amount selection to a confirmed or failed deposit.
///
/// Each open tip dialog owns its own `TipFlow`. Calls to [`TipFlow::submit_payment`]
/// and [`TipFlow::check_status`] must not overlap on the same instance; callers
/// disable the triggering control while one is in flight.
///
/// Gateway failures never surface as `Err`: they become a step plus a message.
/// `Err` is reserved for invalid input and for transitions the current step
/// does not allow, in which case the flow is left untouched.
pub struct TipFlow {
    gateway: PaymentGatewayBox,
    payee_wallet_id: WalletId,
    payer_email: String,
    message: Option<String>,
    timeout: Duration,
    step: FlowStep,
    amount: Option<Amount>,
    error_message: Option<String>,
    transaction: Option<TipTransaction>,
    closed: bool,
    updates: watch::Sender<FlowSnapshot>,
}

impl TipFlow {
    /// Opens a flow at [`FlowStep::Amount`].
    ///
    /// # Arguments
    ///
    /// * `gateway` - The payment gateway deposits are sent to.
    /// * `payee_wallet_id` - Wallet of the creator receiving the tip.
    /// * `payer_email` - Email forwarded to the gateway with each deposit.
    pub fn new(gateway: PaymentGatewayBox, payee_wallet_id: WalletId, payer_email: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(FlowSnapshot::initial());
        Self {
            gateway,
            payee_wallet_id,
            payer_email: payer_email.into(),
            message: None,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
            step: FlowStep::Amount,
            amount: None,
            error_message: None,
            transaction: None,
            closed: false,
            updates,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the note sent along with the next deposit.
    pub fn set_message(&mut self, message: Option<String>) {
        self.message = message.filter(|m| !m.trim().is_empty());
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn transaction(&self) -> Option<&TipTransaction> {
        self.transaction.as_ref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction.as_ref().map(|tx| tx.id.as_str())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            step: self.step,
            amount: self.amount,
            error_message: self.error_message.clone(),
            transaction_id: self.transaction_id().map(str::to_string),
            closed: self.closed,
        }
    }

    /// Receives a snapshot after every transition, including the optimistic
    /// move to [`FlowStep::Processing`] made before a deposit call resolves.
    pub fn subscribe(&self) -> watch::Receiver<FlowSnapshot> {
        self.updates.subscribe()
    }

    /// `AMOUNT -> PHONE`
    pub fn select_amount(&mut self, value: Decimal) -> Result<()> {
        self.ensure(&[FlowStep::Amount], "select an amount")?;
        let amount = Amount::new(value)?;
        self.amount = Some(amount);
        debug!("Tip amount set to {amount}");
        self.transition(FlowStep::Phone, None);
        Ok(())
    }

    /// First half of a submission: validates the payer details and moves to
    /// [`FlowStep::Processing`] without touching the network.
    ///
    /// Invalid input is returned as [`TipError::Validation`] and the flow stays at `PHONE`.
    pub fn begin_submit(&mut self, phone: &str, provider_id: &str) -> Result<TipRequest> {
        self.ensure(&[FlowStep::Phone], "submit a payment")?;
        let provider: Provider = provider_id.parse()?;
        let payer_phone = PhoneNumber::parse(phone)?;
        let amount = self
            .amount
            .ok_or_else(|| TipError::Validation("No tip amount selected".to_string()))?;

        let request = TipRequest {
            amount,
            payer_phone,
            provider,
            payee_wallet_id: self.payee_wallet_id.clone(),
            payer_email: self.payer_email.clone(),
            message: self.message.clone(),
        };
        info!(
            "Requesting {amount} deposit to wallet {} via {}",
            request.payee_wallet_id,
            provider.gateway_id()
        );
        self.transaction = None;
        self.transition(FlowStep::Processing, None);
        Ok(request)
    }

    /// Second half of a submission: applies the gateway's answer.
    pub fn complete_submit(
        &mut self,
        outcome: std::result::Result<DepositResponse, GatewayError>,
    ) -> Result<FlowStep> {
        self.ensure(&[FlowStep::Processing], "complete a payment")?;
        let amount = self
            .amount
            .ok_or_else(|| TipError::Validation("No tip amount selected".to_string()))?;

        match outcome {
            Err(GatewayError::Timeout(after)) => {
                warn!("Deposit request timed out after {after:?}");
                self.transition(FlowStep::TimedOut, Some(TIMED_OUT_MESSAGE.to_string()));
            }
            Err(e) => {
                warn!("Deposit request failed: {e}");
                self.transition(FlowStep::Error, Some(e.to_string()));
            }
            Ok(response) => match response.metadata().cloned() {
                Some(metadata) if response.is_accepted() => {
                    if let Some(id) = metadata.deposit_id {
                        self.transaction = Some(TipTransaction::new(id, metadata.status.clone(), amount));
                    }
                    self.apply_status(&metadata.status, FlowStep::Processing);
                }
                _ => {
                    let message = response
                        .message
                        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                    warn!("Deposit not accepted ({}): {message}", response.status);
                    self.transition(FlowStep::Error, Some(message));
                }
            },
        }
        Ok(self.step)
    }

    /// `PHONE -> PROCESSING -> {PROCESSING | SUCCESS | ERROR | TIMED_OUT}`
    pub async fn submit_payment(&mut self, phone: &str, provider_id: &str) -> Result<FlowStep> {
        let request = self.begin_submit(phone, provider_id)?;
        let outcome = self.bounded(self.gateway.submit_deposit(&request)).await;
        self.complete_submit(outcome)
    }

    /// Re-queries the gateway for the retained deposit.
    ///
    /// Without a retained deposit id the flow ends in `ERROR` "No tip
    /// detected." from any open step but `SUCCESS`, and the gateway is not
    /// called. A failed query leaves the flow at `PENDING` with a soft
    /// warning: the payment itself may still have gone through.
    pub async fn check_status(&mut self) -> Result<FlowStep> {
        let Some(payment_id) = self.transaction_id().map(str::to_string) else {
            self.ensure(
                &[
                    FlowStep::Amount,
                    FlowStep::Phone,
                    FlowStep::Processing,
                    FlowStep::Pending,
                    FlowStep::Error,
                    FlowStep::TimedOut,
                ],
                "check the payment status",
            )?;
            warn!("Status check requested without a deposit id");
            self.transition(FlowStep::Error, Some(NO_TIP_MESSAGE.to_string()));
            return Ok(self.step);
        };
        self.ensure(
            &[FlowStep::Processing, FlowStep::Pending, FlowStep::TimedOut],
            "check the payment status",
        )?;

        debug!("Checking status of deposit {payment_id}");
        let outcome = self.bounded(self.gateway.check_status(&payment_id)).await;
        self.apply_status_response(outcome);
        Ok(self.step)
    }

    /// `ERROR | TIMED_OUT -> PHONE`, forgetting the previous deposit.
    pub fn retry(&mut self) -> Result<()> {
        self.ensure(&[FlowStep::Error, FlowStep::TimedOut], "retry")?;
        self.transaction = None;
        self.transition(FlowStep::Phone, None);
        Ok(())
    }

    /// Tears the flow down. Any later transition is rejected.
    pub fn close(&mut self) {
        if !self.closed {
            info!("Tip flow closed at step {}", self.step);
            self.closed = true;
            self.publish();
        }
    }

    fn apply_status_response(&mut self, outcome: std::result::Result<StatusResponse, GatewayError>) {
        match outcome {
            Ok(response) if response.success => {
                if let Some(tx) = self.transaction.as_mut() {
                    tx.refresh(response.status.clone());
                }
                self.apply_status(&response.status, FlowStep::Pending);
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                self.transition(FlowStep::Error, Some(message));
            }
            Err(GatewayError::Timeout(after)) => {
                warn!("Status check timed out after {after:?}");
                self.transition(FlowStep::TimedOut, Some(TIMED_OUT_MESSAGE.to_string()));
            }
            Err(e) => {
                warn!("Status check failed: {e}");
                self.transition(FlowStep::Pending, Some(UNVERIFIED_MESSAGE.to_string()));
            }
        }
    }

    /// Moves to the step matching `status`; `still_processing` is used for the processing bucket.
    fn apply_status(&mut self, status: &GatewayStatus, still_processing: FlowStep) {
        match status.bucket() {
            StatusBucket::Success => self.transition(FlowStep::Success, None),
            StatusBucket::Processing => self.transition(still_processing, None),
            StatusBucket::Error => {
                info!("Gateway reported terminal status {status}");
                self.transition(FlowStep::Error, Some(DECLINED_MESSAGE.to_string()));
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> std::result::Result<T, GatewayError>
    where
        F: Future<Output = std::result::Result<T, GatewayError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.timeout)))
    }

    fn ensure(&self, allowed: &[FlowStep], action: &'static str) -> Result<()> {
        if self.closed || !allowed.contains(&self.step) {
            return Err(TipError::InvalidTransition {
                step: self.step.to_string(),
                action,
            });
        }
        Ok(())
    }

    fn transition(&mut self, step: FlowStep, error_message: Option<String>) {
        if self.step != step {
            debug!("Tip flow {} -> {step}", self.step);
        }
        self.step = step;
        self.error_message = error_message;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

impl fmt::Debug for TipFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TipFlow")
            .field("payee_wallet_id", &self.payee_wallet_id)
            .field("step", &self.step)
            .field("amount", &self.amount)
            .field("transaction", &self.transaction)
            .field("closed", &self.closed)
            .finish()
    }
}
