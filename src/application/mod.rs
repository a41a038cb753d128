//! Application layer containing the tip payment flow.
//!
//! This module defines `TipFlow`, the state machine that walks a supporter from
//! choosing an amount to a confirmed mobile-money deposit. It talks to the
//! gateway only through the `PaymentGateway` port.

pub mod flow;
