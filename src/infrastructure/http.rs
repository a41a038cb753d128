use crate::config::{ClientConfig, Secret};
use crate::domain::payout::{PayoutAccount, PayoutAccountRecord, PayoutAccountResponse};
use crate::domain::ports::{PaymentGateway, PayoutAccountStore};
use crate::domain::tip::{DepositResponse, StatusResponse, TipRequest};
use crate::error::{GatewayError, Result, TipError};
use async_trait::async_trait;
use log::*;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Credentials of the signed-in user, handed to the gateway explicitly.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<Secret<String>>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: Secret<String>) -> Self {
        Self { token: Some(token) }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        config.token.clone().map(Self::with_token).unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// [`PaymentGateway`] backed by the tipping REST API.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    base_url: String,
    session: Session,
    client: Client,
}

impl HttpPaymentGateway {
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent(concat!("tipzed/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| TipError::Config(format!("Could not initialize HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> std::result::Result<T, GatewayError> {
        let (status, text) = self.send_raw(request).await?;
        decode_body(status, &text)
    }

    async fn send_raw(&self, request: RequestBuilder) -> std::result::Result<(u16, String), GatewayError> {
        let request = match &self.session.token {
            Some(token) => request.bearer_auth(token.reveal()),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        trace!("Gateway answered {status}: {text}");
        Ok((status, text))
    }
}

/// Decodes a gateway body.
///
/// `4xx` statuses whose body still has the expected shape are gateway answers
/// (e.g. a `400` reporting a rejected deposit), so they decode normally. A
/// `5xx` is always a [`GatewayError::Http`], whatever its body says.
pub fn decode_body<T: DeserializeOwned>(status: u16, text: &str) -> std::result::Result<T, GatewayError> {
    if status >= 500 {
        return Err(GatewayError::Http {
            status,
            message: text.to_string(),
        });
    }
    let is_success = (200..300).contains(&status);
    match serde_json::from_str::<T>(text) {
        Ok(value) => {
            if !is_success {
                debug!("Gateway returned {status} with a well-formed body");
            }
            Ok(value)
        }
        Err(e) if is_success => Err(GatewayError::Decode(e.to_string())),
        Err(_) => Err(GatewayError::Http {
            status,
            message: text.to_string(),
        }),
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn submit_deposit(&self, request: &TipRequest) -> std::result::Result<DepositResponse, GatewayError> {
        let url = self.url(&format!("/payments/deposits/{}/", request.payee_wallet_id));
        debug!("Submitting deposit to {url}");
        let response: DepositResponse = self.send(self.client.post(url).json(&request.to_body())).await?;
        info!("Deposit request answered with '{}'", response.status);
        Ok(response)
    }

    async fn check_status(&self, payment_id: &str) -> std::result::Result<StatusResponse, GatewayError> {
        let url = self.url(&format!("/payments/status/{payment_id}/"));
        debug!("Checking payment status at {url}");
        let response: StatusResponse = self.send(self.client.get(url)).await?;
        info!("Payment {payment_id} is {}", response.status);
        Ok(response)
    }
}

fn payout_record(status: u16, text: &str) -> std::result::Result<PayoutAccountRecord, GatewayError> {
    let response: PayoutAccountResponse = decode_body(status, text)?;
    response.data.ok_or_else(|| GatewayError::Http {
        status,
        message: text.to_string(),
    })
}

#[async_trait]
impl PayoutAccountStore for HttpPaymentGateway {
    async fn fetch_payout_account(&self) -> std::result::Result<Option<PayoutAccountRecord>, GatewayError> {
        let url = self.url("/wallets/payout-account");
        debug!("Fetching payout account from {url}");
        let (status, text) = self.send_raw(self.client.get(url)).await?;
        if status == 404 {
            info!("No payout account set up yet");
            return Ok(None);
        }
        payout_record(status, &text).map(Some)
    }

    async fn update_payout_account(
        &self,
        account: &PayoutAccount,
    ) -> std::result::Result<PayoutAccountRecord, GatewayError> {
        let url = self.url("/wallets/payout-account");
        debug!("Updating payout account at {url}");
        let (status, text) = self.send_raw(self.client.put(url).json(account)).await?;
        let record = payout_record(status, &text)?;
        info!("Payout account now points at {} via {}", record.phone_number, record.provider.gateway_id());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::phone::PhoneNumber;
    use crate::domain::provider::Provider;
    use crate::domain::status::GatewayStatus;
    use crate::domain::tip::{Amount, WalletId};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn gateway(api_url: &str) -> HttpPaymentGateway {
        let config = ClientConfig {
            api_url: api_url.to_string(),
            ..ClientConfig::default()
        };
        HttpPaymentGateway::new(&config, Session::anonymous()).unwrap()
    }

    fn signed_in_gateway(api_url: &str) -> HttpPaymentGateway {
        let config = ClientConfig {
            api_url: api_url.to_string(),
            ..ClientConfig::default()
        };
        let session = Session::with_token(Secret::new("tok-123".to_string()));
        HttpPaymentGateway::new(&config, session).unwrap()
    }

    /// A request as it arrived on the wire.
    struct Captured {
        request_line: String,
        /// Header lines, lower-cased.
        headers: Vec<String>,
        body: String,
    }

    /// Serves one HTTP request on loopback, answering with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the request head");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let mut lines = head.lines();
            let request_line = lines.next().unwrap_or_default().to_string();
            let headers: Vec<String> = lines
                .filter(|l| !l.is_empty())
                .map(str::to_ascii_lowercase)
                .collect();
            let length = headers
                .iter()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let received = String::from_utf8_lossy(&buf[head_end..]).to_string();

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            Captured {
                request_line,
                headers,
                body: received,
            }
        });
        (format!("http://{addr}/api/v1"), handle)
    }

    fn request() -> TipRequest {
        TipRequest {
            amount: Amount::new(dec!(50)).unwrap(),
            payer_phone: PhoneNumber::parse("0977123456").unwrap(),
            provider: Provider::Airtel,
            payee_wallet_id: WalletId::new("wallet-9").unwrap(),
            payer_email: "fan@example.com".to_string(),
            message: None,
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let gw = gateway("https://api.example.com/v1/");
        assert_eq!(
            gw.url("/payments/status/dep-1/"),
            "https://api.example.com/v1/payments/status/dep-1/"
        );
    }

    #[test]
    fn test_session_from_config() {
        let config = ClientConfig {
            token: Some(Secret::new("tok".to_string())),
            ..ClientConfig::default()
        };
        assert!(Session::from_config(&config).is_authenticated());
        assert!(!Session::from_config(&ClientConfig::default()).is_authenticated());
        assert!(!Session::anonymous().is_authenticated());
    }

    #[test]
    fn test_decode_success_body() {
        let report: StatusResponse =
            decode_body(200, r#"{"status": "completed", "success": true}"#).unwrap();
        assert_eq!(report.status, GatewayStatus::Completed);
    }

    #[test]
    fn test_decode_error_status_with_shaped_body() {
        let report: StatusResponse =
            decode_body(400, r#"{"status": "rejected", "message": "Not enough funds"}"#).unwrap();
        assert_eq!(report.status, GatewayStatus::Rejected);
        assert_eq!(report.message.as_deref(), Some("Not enough funds"));
    }

    #[test]
    fn test_decode_server_error_ignores_body() {
        let body = r#"{"status": "error", "message": "Service temporarily unavailable"}"#;
        let err = decode_body::<StatusResponse>(503, body).unwrap_err();
        assert_eq!(
            err,
            GatewayError::Http {
                status: 503,
                message: body.to_string()
            }
        );
        assert!(decode_body::<DepositResponse>(500, r#"{"status": "accepted"}"#).is_err());
    }

    #[test]
    fn test_decode_failures() {
        let err = decode_body::<StatusResponse>(200, "<html>").unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));

        let err = decode_body::<StatusResponse>(404, "Not Found").unwrap_err();
        assert_eq!(
            err,
            GatewayError::Http {
                status: 404,
                message: "Not Found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // port 9 (discard) is not served on loopback in test environments
        let gw = gateway("http://127.0.0.1:9");
        let err = gw.check_status("dep-1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_submit_deposit_wire_format() {
        let (api_url, server) = serve_once(
            "200 OK",
            r#"{"status": "accepted", "data": {"metadata": {"status": "ACCEPTED", "depositId": "dep-77"}}}"#,
        )
        .await;
        let gw = signed_in_gateway(&api_url);

        let response = gw.submit_deposit(&request()).await.unwrap();
        assert!(response.is_accepted());
        assert_eq!(
            response.metadata().unwrap().deposit_id.as_deref(),
            Some("dep-77")
        );

        let captured = server.await.unwrap();
        assert_eq!(
            captured.request_line,
            "POST /api/v1/payments/deposits/wallet-9/ HTTP/1.1"
        );
        assert!(captured.headers.contains(&"authorization: bearer tok-123".to_string()));
        assert!(captured.headers.contains(&"content-type: application/json".to_string()));

        let body: Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(body["amount"], "50");
        assert_eq!(body["provider"], "AIRTEL_OAPI_ZMB");
        assert_eq!(body["patronPhone"], "260977123456");
        assert_eq!(body["patronEmail"], "fan@example.com");
        assert_eq!(body["patronMessage"], Value::Null);
    }

    #[tokio::test]
    async fn test_check_status_wire_format() {
        let (api_url, server) =
            serve_once("200 OK", r#"{"status": "COMPLETED", "success": true}"#).await;
        let gw = signed_in_gateway(&api_url);

        let report = gw.check_status("dep-77").await.unwrap();
        assert_eq!(report.status, GatewayStatus::Completed);

        let captured = server.await.unwrap();
        assert_eq!(captured.request_line, "GET /api/v1/payments/status/dep-77/ HTTP/1.1");
        assert!(captured.headers.contains(&"authorization: bearer tok-123".to_string()));
        assert!(captured.body.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_session_sends_no_authorization() {
        let (api_url, server) =
            serve_once("200 OK", r#"{"status": "PENDING", "success": true}"#).await;
        gateway(&api_url).check_status("dep-1").await.unwrap();

        let captured = server.await.unwrap();
        assert!(!captured.headers.iter().any(|h| h.starts_with("authorization:")));
    }

    #[tokio::test]
    async fn test_status_check_server_error() {
        let (api_url, server) = serve_once(
            "503 Service Unavailable",
            r#"{"status": "error", "message": "Service temporarily unavailable"}"#,
        )
        .await;
        let err = gateway(&api_url).check_status("dep-1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Http { status: 503, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_missing_payout_account() {
        let (api_url, server) = serve_once(
            "404 Not Found",
            r#"{"status": "failed", "error": "User does not have a payout account"}"#,
        )
        .await;
        let record = signed_in_gateway(&api_url).fetch_payout_account().await.unwrap();
        assert_eq!(record, None);

        let captured = server.await.unwrap();
        assert_eq!(captured.request_line, "GET /api/v1/wallets/payout-account HTTP/1.1");
    }

    #[tokio::test]
    async fn test_update_payout_account_wire_format() {
        let (api_url, server) = serve_once(
            "200 OK",
            r#"{"status": "success", "data": {"provider": "MTN_MOMO_ZMB", "phoneNumber": "260961234567", "verified": false}}"#,
        )
        .await;
        let account = PayoutAccount::new("0961234567", "Mwila Banda", None).unwrap();
        let record = signed_in_gateway(&api_url)
            .update_payout_account(&account)
            .await
            .unwrap();
        assert_eq!(record.provider, Provider::Mtn);
        assert_eq!(record.phone_number, "260961234567");

        let captured = server.await.unwrap();
        assert_eq!(captured.request_line, "PUT /api/v1/wallets/payout-account HTTP/1.1");
        let body: Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(body["phoneNumber"], "260961234567");
        assert_eq!(body["accountName"], "Mwila Banda");
        assert_eq!(body["provider"], "MTN_MOMO_ZMB");
    }

    #[tokio::test]
    async fn test_update_payout_account_rejected() {
        let (api_url, server) = serve_once(
            "400 Bad Request",
            r#"{"status": "failed", "errors": {"phone_number": ["Phone number must be at least 10 digits"]}}"#,
        )
        .await;
        let account = PayoutAccount::new("0961234567", "Mwila", None).unwrap();
        let err = gateway(&api_url).update_payout_account(&account).await.unwrap_err();
        assert!(matches!(err, GatewayError::Http { status: 400, .. }));
        server.await.unwrap();
    }
}
