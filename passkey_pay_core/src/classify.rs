// Classification of wallet/paymaster rejection messages.
// One ordered rule table instead of string checks scattered through control
// flow; first match wins, unknown messages keep their verbatim text.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    InsufficientFunds,
    UserCancelled,
    AmountLimit,
    SimulationFailed,
    PaymasterUnavailable,
    RateLimited,
    Unknown,
}

impl RejectionCategory {
    /// Short user-facing hint for each category.
    pub fn hint(&self) -> &'static str {
        match self {
            RejectionCategory::InsufficientFunds => {
                "The origin account does not hold enough SOL for this transfer"
            }
            RejectionCategory::UserCancelled => "The signing prompt was dismissed",
            RejectionCategory::AmountLimit => {
                "The wallet rejected the per-transaction amount; try a smaller max chunk"
            }
            RejectionCategory::SimulationFailed => {
                "The transaction failed simulation before submission"
            }
            RejectionCategory::PaymasterUnavailable => {
                "The fee sponsor could not be reached or declined to sponsor"
            }
            RejectionCategory::RateLimited => "The RPC endpoint is rate limiting requests",
            RejectionCategory::Unknown => "Transfer failed",
        }
    }
}

struct Rule {
    needles: &'static [&'static str],
    category: RejectionCategory,
}

// Evaluated in order; earlier rules shadow later ones. Matching is
// case-insensitive on known substrings of wallet/paymaster error messages.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule {
            needles: &["insufficient lamports", "insufficient funds", "insufficient balance"],
            category: RejectionCategory::InsufficientFunds,
        },
        Rule {
            needles: &["user rejected", "user cancelled", "user canceled", "user denied", "cancelled by user"],
            category: RejectionCategory::UserCancelled,
        },
        Rule {
            needles: &["amount too large", "exceeds maximum", "amount limit", "above the limit"],
            category: RejectionCategory::AmountLimit,
        },
        Rule {
            needles: &["simulation failed", "transaction simulation"],
            category: RejectionCategory::SimulationFailed,
        },
        Rule {
            needles: &["paymaster", "sponsor", "fee payer unavailable"],
            category: RejectionCategory::PaymasterUnavailable,
        },
        Rule {
            needles: &["too many requests", "429", "rate limit"],
            category: RejectionCategory::RateLimited,
        },
    ]
});

/// Classify an external error message into a rejection category.
pub fn classify_rejection(message: &str) -> RejectionCategory {
    let lowered = message.to_lowercase();
    for rule in RULES.iter() {
        if rule.needles.iter().any(|n| lowered.contains(n)) {
            return rule.category;
        }
    }
    RejectionCategory::Unknown
}

/// Render a user-facing description: the category hint, plus the external
/// message verbatim.
pub fn describe_rejection(message: &str) -> String {
    let category = classify_rejection(message);
    format!("{}: {}", category.hint(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_substrings_map_to_categories() {
        assert_eq!(
            classify_rejection("Transfer: insufficient lamports 100, need 200"),
            RejectionCategory::InsufficientFunds
        );
        assert_eq!(
            classify_rejection("User rejected the request"),
            RejectionCategory::UserCancelled
        );
        assert_eq!(
            classify_rejection("amount too large for sponsored transfer"),
            RejectionCategory::AmountLimit
        );
        assert_eq!(
            classify_rejection("Transaction simulation failed: blockhash not found"),
            RejectionCategory::SimulationFailed
        );
        assert_eq!(
            classify_rejection("paymaster returned 502"),
            RejectionCategory::PaymasterUnavailable
        );
        assert_eq!(
            classify_rejection("HTTP 429 Too Many Requests"),
            RejectionCategory::RateLimited
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            classify_rejection("INSUFFICIENT FUNDS"),
            RejectionCategory::InsufficientFunds
        );
    }

    #[test]
    fn first_rule_wins_when_several_match() {
        // Mentions both a balance problem and simulation; the earlier
        // insufficient-funds rule takes precedence.
        assert_eq!(
            classify_rejection("simulation failed: insufficient funds for transfer"),
            RejectionCategory::InsufficientFunds
        );
    }

    #[test]
    fn unrecognized_messages_default_to_unknown() {
        assert_eq!(
            classify_rejection("something novel went wrong"),
            RejectionCategory::Unknown
        );
        let described = describe_rejection("something novel went wrong");
        assert!(described.starts_with("Transfer failed: "));
        assert!(described.ends_with("something novel went wrong"));
    }
}
