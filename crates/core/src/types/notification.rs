//! Notification event types.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known [`TemplateType`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown email template type: {0}")]
pub struct UnknownTemplateType(pub String);

/// The closed set of transactional emails the shop sends.
///
/// Each type owns exactly one stored template; the wire value doubles as the
/// template's document id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    /// Order placed and paid by credit card.
    OrderCompleteCredit,
    /// Order placed with bank transfer; includes transfer instructions.
    OrderCompleteBank,
    /// Bank transfer received.
    PaymentConfirmed,
    /// Parcel handed to the carrier.
    ShippingComplete,
}

impl TemplateType {
    /// Every known type, in seeding order.
    pub const ALL: [Self; 4] = [
        Self::OrderCompleteCredit,
        Self::OrderCompleteBank,
        Self::PaymentConfirmed,
        Self::ShippingComplete,
    ];

    /// Returns the wire/storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderCompleteCredit => "order_complete_credit",
            Self::OrderCompleteBank => "order_complete_bank",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::ShippingComplete => "shipping_complete",
        }
    }

    /// Human-readable label for the management screen.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OrderCompleteCredit => "Order complete (credit card)",
            Self::OrderCompleteBank => "Order complete (bank transfer)",
            Self::PaymentConfirmed => "Payment confirmed",
            Self::ShippingComplete => "Shipping complete",
        }
    }
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateType {
    type Err = UnknownTemplateType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTemplateType(s.to_owned()))
    }
}
