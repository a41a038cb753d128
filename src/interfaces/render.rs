use crate::application::flow::{FlowSnapshot, FlowStep};
use std::fmt;

pub const DEFAULT_FAILURE_TEXT: &str =
    "Something went wrong. Please check your balance or try a different number.";
pub const PROMPT_HINT: &str = "Prompt didn't appear? Dial *115# to check pending transactions.";

/// Controls offered to the supporter at a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Triggers a manual status check.
    Verify,
    Retry,
    Close,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Verify => f.write_str("Done"),
            Action::Retry => f.write_str("Try Again"),
            Action::Close => f.write_str("Close"),
        }
    }
}

/// What the tip dialog shows for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub headline: &'static str,
    pub body: String,
    pub hint: Option<&'static str>,
    pub actions: Vec<Action>,
}

impl fmt::Display for StepView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline)?;
        write!(f, "{}", self.body)?;
        if let Some(hint) = self.hint {
            write!(f, "\n{hint}")?;
        }
        Ok(())
    }
}

pub fn describe(snapshot: &FlowSnapshot) -> StepView {
    let amount = snapshot
        .amount
        .map(|a| a.to_string())
        .unwrap_or_else(|| "your tip".to_string());
    let error = snapshot.error_message.clone();

    match snapshot.step {
        FlowStep::Amount => StepView {
            headline: "Choose an amount",
            body: "Pick how much you would like to tip.".to_string(),
            hint: None,
            actions: vec![Action::Close],
        },
        FlowStep::Phone => StepView {
            headline: "Enter your mobile number",
            body: format!("Sending {amount}"),
            hint: None,
            actions: vec![Action::Close],
        },
        FlowStep::Processing => StepView {
            headline: "Check your phone",
            body: format!(
                "We've sent a prompt to your mobile number. Please enter your PIN to authorize {amount}."
            ),
            hint: Some(PROMPT_HINT),
            actions: vec![Action::Verify],
        },
        FlowStep::Pending => StepView {
            headline: "Still processing",
            body: error.unwrap_or_else(|| {
                "Your payment is still being processed. Approve the prompt on your phone, then check again."
                    .to_string()
            }),
            hint: Some(PROMPT_HINT),
            actions: vec![Action::Verify, Action::Close],
        },
        FlowStep::Success => StepView {
            headline: "Thank You!",
            body: format!("Your tip of {amount} has been confirmed."),
            hint: None,
            actions: vec![Action::Close],
        },
        FlowStep::Error => StepView {
            headline: "Payment Failed",
            body: error.unwrap_or_else(|| DEFAULT_FAILURE_TEXT.to_string()),
            hint: None,
            actions: vec![Action::Close, Action::Retry],
        },
        FlowStep::TimedOut => StepView {
            headline: "No response yet",
            body: error.unwrap_or_else(|| DEFAULT_FAILURE_TEXT.to_string()),
            hint: Some(PROMPT_HINT),
            actions: if snapshot.transaction_id.is_some() {
                vec![Action::Verify, Action::Retry, Action::Close]
            } else {
                vec![Action::Retry, Action::Close]
            },
        },
    }
}
