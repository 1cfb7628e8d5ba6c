//! Payment Types
//!
//! Wire shapes for TrueLayer's create-payment call and the rules for pulling
//! a redirect URL out of whatever the provider sends back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PaymentError, Result};

/// Donation amount used when neither the request nor the environment gives one
pub const DEFAULT_AMOUNT_MINOR: u64 = 1000;

/// Reference attached to every payment
pub const PAYMENT_REFERENCE: &str = "Donation";

/// Largest integer a JSON number can carry without losing precision
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A positive amount in the currency's smallest unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AmountMinor(u64);

impl AmountMinor {
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(PaymentError::InvalidAmount);
        }
        Ok(Self(value))
    }

    /// Validate a raw JSON value. Only integral, positive numbers pass.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Number(number) = value else {
            return Err(PaymentError::InvalidAmount);
        };

        if let Some(n) = number.as_u64() {
            return Self::new(n);
        }

        match number.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= 1.0 && f <= MAX_SAFE_INTEGER => Self::new(f as u64),
            _ => Err(PaymentError::InvalidAmount),
        }
    }

    /// Requested amount if present, else the fallback. `null` counts as absent.
    pub fn resolve(requested: Option<&Value>, fallback: Self) -> Result<Self> {
        match requested {
            None | Some(Value::Null) => Ok(fallback),
            Some(value) => Self::from_json(value),
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for AmountMinor {
    fn default() -> Self {
        Self(DEFAULT_AMOUNT_MINOR)
    }
}

impl FromStr for AmountMinor {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map_err(|_| PaymentError::InvalidAmount)
            .and_then(Self::new)
    }
}

impl fmt::Display for AmountMinor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /payments`
#[derive(Clone, Debug, Serialize)]
pub struct CreatePaymentRequest {
    pub amount_in_minor: AmountMinor,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub beneficiary: Beneficiary,
    pub user: PaymentUser,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

impl CreatePaymentRequest {
    /// Bank transfer into our merchant account from a fresh anonymous donor
    pub fn donation(
        amount: AmountMinor,
        currency: &str,
        merchant_account_id: &str,
        redirect_uri: Option<&str>,
    ) -> Self {
        Self {
            amount_in_minor: amount,
            currency: currency.to_string(),
            payment_method: PaymentMethod::BankTransfer {
                provider_selection: ProviderSelection::UserSelected,
            },
            beneficiary: Beneficiary::MerchantAccount {
                merchant_account_id: merchant_account_id.to_string(),
            },
            user: PaymentUser::anonymous_donor(),
            reference: PAYMENT_REFERENCE.into(),
            redirect_uri: redirect_uri.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer { provider_selection: ProviderSelection },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderSelection {
    UserSelected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Beneficiary {
    MerchantAccount { merchant_account_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentUser {
    pub id: String,
}

impl PaymentUser {
    pub fn anonymous_donor() -> Self {
        Self {
            id: format!("donor-{}", uuid::Uuid::new_v4()),
        }
    }
}

/// Result of a successful donation setup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Provider payment id, when returned
    pub id: Option<String>,

    /// Where to send the donor
    pub payment_url: String,
}

/// Redirect URL locations in a create-payment response, highest priority first
const URL_POINTERS: [&str; 3] = ["/next_action/uri", "/authorization_flow/redirect/uri", "/payment_url"];

/// Non-empty string at `pointer`; anything else counts as absent
fn string_at<'a>(raw: &'a Value, pointer: &str) -> Option<&'a str> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Identifier at `pointer`, which providers send as a string or a number
fn id_at(raw: &Value, pointer: &str) -> Option<String> {
    match raw.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turn a raw create-payment response into a session.
///
/// URL sources in priority order: `next_action.uri`,
/// `authorization_flow.redirect.uri`, `payment_url`, then a hosted payment
/// page link built from `id` and `resource_token`. A source that is missing
/// or has the wrong shape is skipped.
pub fn session_from_response(raw: Value, hpp_base: Option<&str>) -> Result<PaymentSession> {
    let id = id_at(&raw, "/id");

    let direct = URL_POINTERS
        .iter()
        .find_map(|pointer| string_at(&raw, pointer))
        .map(str::to_string);

    let payment_url = direct.or_else(|| {
        let token = id_at(&raw, "/resource_token")?;
        let base = hpp_base.filter(|b| !b.is_empty())?;
        Some(format!("{base}?payment_id={}&resource_token={token}", id.as_deref()?))
    });

    match payment_url {
        Some(payment_url) => Ok(PaymentSession { id, payment_url }),
        None => Err(PaymentError::MissingPaymentUrl { raw }),
    }
}
