//! Payment Provider Strategy
//!
//! The server only needs one thing from a provider: turn an amount into a
//! hosted payment session. Tests and alternative providers plug in here.

use async_trait::async_trait;

use crate::error::Result;
use crate::payment::{AmountMinor, PaymentSession};

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted payment session for a donation
    async fn create_payment(&self, amount: AmountMinor) -> Result<PaymentSession>;

    /// Provider name, for logs
    fn name(&self) -> &str;
}
