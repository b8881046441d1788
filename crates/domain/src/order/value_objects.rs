//! Value objects for the order domain.

use std::str::FromStr;

use common::{Money, PartId};
use serde::{Deserialize, Serialize};

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Not paid yet, or not specified by the caller.
    #[default]
    Unknown,
    Card,
    Sbp,
    CreditCard,
    InvestorMoney,
}

impl PaymentMethod {
    /// Returns the wire name of the payment method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Unknown => "UNKNOWN",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Sbp => "SBP",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::InvestorMoney => "INVESTOR_MONEY",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PaymentMethod::Unknown)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a payment method string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(PaymentMethod::Unknown),
            "CARD" => Ok(PaymentMethod::Card),
            "SBP" => Ok(PaymentMethod::Sbp),
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "INVESTOR_MONEY" => Ok(PaymentMethod::InvestorMoney),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// A catalog part as returned by the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub name: String,
    /// Unit price.
    pub price: Money,
}

impl Part {
    pub fn new(id: PartId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}
