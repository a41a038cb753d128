#![allow(dead_code)]

use rust_decimal_macros::dec;
use tipzed::application::flow::TipFlow;
use tipzed::domain::tip::WalletId;
use tipzed::infrastructure::in_memory::InMemoryGateway;

pub const AIRTEL_NUMBER: &str = "0977123456";
pub const AIRTEL_ID: &str = "AIRTEL_OAPI_ZMB";

/// A flow wired to a clone of `gateway`, so the caller can inspect calls afterwards.
pub fn flow_with(gateway: &InMemoryGateway) -> TipFlow {
    TipFlow::new(
        Box::new(gateway.clone()),
        WalletId::new("wallet-42").unwrap(),
        "supporter@example.com",
    )
}

/// A flow already at the PHONE step with a K50 tip selected.
pub fn flow_at_phone(gateway: &InMemoryGateway) -> TipFlow {
    let mut flow = flow_with(gateway);
    flow.select_amount(dec!(50)).unwrap();
    flow
}

/// All nine valid three-digit prefixes (with trunk zero).
pub const VALID_PREFIXES: [&str; 9] = [
    "096", "076", "056", "097", "077", "057", "095", "075", "055",
];
