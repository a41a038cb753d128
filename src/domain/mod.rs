//! Domain types for mobile-money tips: carriers, phone numbers, gateway
//! statuses, payout accounts and the ports to the backend.

pub mod payout;
pub mod phone;
pub mod ports;
pub mod provider;
pub mod status;
pub mod tip;
