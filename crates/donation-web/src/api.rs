//! API Client

use serde::Deserialize;

/// Body of a successful `POST /api/create-payment`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreatePaymentResponse {
    #[serde(default)]
    pub payment_url: Option<String>,
}

impl CreatePaymentResponse {
    /// The redirect target, if the server sent a usable one
    pub fn into_payment_url(self) -> Result<String, String> {
        self.payment_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| "Missing payment URL".into())
    }
}

/// Ask the server to start a donation. `None` lets the server pick its default amount.
pub async fn create_payment(amount_minor: Option<u64>) -> Result<String, String> {
    let client = reqwest::Client::new();

    let mut body = serde_json::json!({});
    if let Some(amount) = amount_minor {
        body["amount_minor"] = serde_json::json!(amount);
    }

    let response = client
        .post(endpoint("/api/create-payment"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("Failed to create payment: {}", response.status()));
    }

    let data: CreatePaymentResponse = response.json().await.map_err(|e| e.to_string())?;
    data.into_payment_url()
}

fn endpoint(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{origin}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_url_present() {
        let data: CreatePaymentResponse =
            serde_json::from_str(r#"{"payment_url":"https://pay.example/x"}"#).unwrap();
        assert_eq!(data.into_payment_url().unwrap(), "https://pay.example/x");
    }

    #[test]
    fn test_payment_url_missing_or_empty() {
        let missing: CreatePaymentResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.into_payment_url().is_err());

        let empty: CreatePaymentResponse = serde_json::from_str(r#"{"payment_url":""}"#).unwrap();
        assert!(empty.into_payment_url().is_err());
    }
}
