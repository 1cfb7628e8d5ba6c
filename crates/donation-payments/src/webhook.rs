//! Webhook Handling
//!
//! Verifies and parses payment notifications. Events are only logged; no
//! donation state is kept.
//!
//! TrueLayer signs each webhook with a detached JWS in the `Tl-Signature`
//! header. The JWS header names the key set (`jku`) it was signed with; we
//! only fetch key sets from an allow-list, and the signed headers must
//! include a fresh `X-Tl-Webhook-Timestamp`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use truelayer_signing::Method;

use crate::error::{PaymentError, Result};

/// Header carrying the detached JWS
pub const SIGNATURE_HEADER: &str = "tl-signature";

/// Header carrying the RFC 3339 send time, covered by the signature
pub const TIMESTAMP_HEADER: &str = "x-tl-webhook-timestamp";

/// Maximum accepted clock difference for signed timestamps
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// An incoming webhook as it arrived over HTTP
#[derive(Clone, Debug)]
pub struct WebhookRequest<'a> {
    /// Request path the provider signed, e.g. `/api/webhook`
    pub path: &'a str,
    pub headers: Vec<(&'a str, &'a [u8])>,
    pub body: &'a [u8],
}

impl<'a> WebhookRequest<'a> {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&'a [u8]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    fn header_str(&self, name: &str) -> Result<&'a str> {
        let value = self
            .header(name)
            .ok_or_else(|| PaymentError::WebhookSignature(format!("missing {name} header")))?;
        std::str::from_utf8(value)
            .map_err(|_| PaymentError::WebhookSignature(format!("{name} is not valid UTF-8")))
    }
}

/// Checks that a webhook came from the provider
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, request: &WebhookRequest<'_>) -> Result<()>;
}

/// Verifies `Tl-Signature` against the JWKS named by the signature's `jku`
pub struct TlSignatureVerifier {
    http: reqwest::Client,
    allowed_jkus: Vec<String>,
    tolerance_secs: i64,
}

impl TlSignatureVerifier {
    pub fn new(http: reqwest::Client, allowed_jkus: Vec<String>) -> Self {
        Self {
            http,
            allowed_jkus,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    async fn verify_at(&self, request: &WebhookRequest<'_>, now: DateTime<Utc>) -> Result<()> {
        let signature = request.header_str(SIGNATURE_HEADER)?;

        let sent_at = DateTime::parse_from_rfc3339(request.header_str(TIMESTAMP_HEADER)?)
            .map_err(|e| PaymentError::WebhookSignature(format!("malformed timestamp: {e}")))?;
        if (now - sent_at.with_timezone(&Utc)).num_seconds().abs() > self.tolerance_secs {
            return Err(PaymentError::WebhookSignature("timestamp outside tolerance".into()));
        }

        let jws_header = truelayer_signing::extract_jws_header(signature)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
        let jku = jws_header
            .jku
            .as_deref()
            .ok_or_else(|| PaymentError::WebhookSignature("missing jku".into()))?;
        if !self.allowed_jkus.iter().any(|allowed| allowed == jku) {
            tracing::warn!(%jku, "Webhook signed with a key set outside the allow-list");
            return Err(PaymentError::WebhookSignature(format!("jku not allowed: {jku}")));
        }

        let jwks = self
            .http
            .get(jku)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        truelayer_signing::verify_with_jwks(&jwks)
            .method(Method::Post)
            .path(request.path)
            .require_header(TIMESTAMP_HEADER)
            .headers(request.headers.iter().copied())
            .body(request.body)
            .build_verifier()
            .verify(signature)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }
}

#[async_trait]
impl SignatureVerifier for TlSignatureVerifier {
    async fn verify(&self, request: &WebhookRequest<'_>) -> Result<()> {
        self.verify_at(request, Utc::now()).await
    }
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Donor authorised the payment at their bank
    PaymentExecuted {
        event_id: Option<String>,
        payment_id: String,
        executed_at: Option<DateTime<Utc>>,
    },

    /// Funds arrived in the merchant account
    PaymentSettled {
        event_id: Option<String>,
        payment_id: String,
        settled_at: Option<DateTime<Utc>>,
    },

    /// Payment did not go through
    PaymentFailed {
        event_id: Option<String>,
        payment_id: String,
        failure_reason: Option<String>,
    },

    /// Unhandled event type
    Other {
        event_type: String,
        event_id: Option<String>,
    },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    payment_id: Option<String>,
    #[serde(default)]
    executed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    settled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    failure_reason: Option<String>,
}

impl WebhookEvent {
    /// Parse a JSON payload into an event
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

        let payment_id = |raw: &RawEvent| {
            raw.payment_id
                .clone()
                .ok_or_else(|| PaymentError::WebhookParse(format!("{} without payment_id", raw.event_type)))
        };

        Ok(match raw.event_type.as_str() {
            "payment_executed" => WebhookEvent::PaymentExecuted {
                payment_id: payment_id(&raw)?,
                event_id: raw.event_id,
                executed_at: raw.executed_at,
            },
            "payment_settled" => WebhookEvent::PaymentSettled {
                payment_id: payment_id(&raw)?,
                event_id: raw.event_id,
                settled_at: raw.settled_at,
            },
            "payment_failed" => WebhookEvent::PaymentFailed {
                payment_id: payment_id(&raw)?,
                event_id: raw.event_id,
                failure_reason: raw.failure_reason,
            },
            _ => WebhookEvent::Other {
                event_type: raw.event_type,
                event_id: raw.event_id,
            },
        })
    }
}

/// Webhook handler
#[derive(Clone)]
pub struct WebhookHandler {
    verifier: Arc<dyn SignatureVerifier>,
}

impl WebhookHandler {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Handler backed by [`TlSignatureVerifier`]
    pub fn truelayer(http: reqwest::Client, allowed_jkus: Vec<String>) -> Self {
        Self::new(Arc::new(TlSignatureVerifier::new(http, allowed_jkus)))
    }

    /// Verify webhook signature and parse event
    pub async fn parse_event(&self, request: &WebhookRequest<'_>) -> Result<WebhookEvent> {
        self.verifier.verify(request).await?;
        WebhookEvent::from_slice(request.body)
    }

    /// Process a webhook event
    pub fn handle(&self, event: &WebhookEvent) {
        match event {
            WebhookEvent::PaymentExecuted { event_id, payment_id, executed_at } => {
                tracing::info!(?event_id, %payment_id, ?executed_at, "Donation executed");
            }
            WebhookEvent::PaymentSettled { event_id, payment_id, settled_at } => {
                tracing::info!(?event_id, %payment_id, ?settled_at, "Donation settled");
            }
            WebhookEvent::PaymentFailed { event_id, payment_id, failure_reason } => {
                tracing::warn!(?event_id, %payment_id, ?failure_reason, "Donation failed");
            }
            WebhookEvent::Other { event_type, event_id } => {
                tracing::debug!(%event_type, ?event_id, "Unhandled webhook event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{extract::State, routing::get, Router};
    use chrono::TimeZone;

    const BODY: &[u8] = br#"{"type":"payment_executed","event_id":"ev_1","payment_id":"p_1","executed_at":"2026-10-16T09:30:00Z"}"#;
    const PATH: &str = "/api/webhook";
    const KID: &str = "donation-test";
    const PRIVATE_KEY: &str = include_str!("../testdata/webhook-signing-key.pem");
    const JWKS: &str = include_str!("../testdata/webhook-jwks.json");

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    /// Serves the test key set and counts fetches
    async fn spawn_jwks(fetches: Arc<AtomicUsize>) -> String {
        async fn jwks(State(fetches): State<Arc<AtomicUsize>>) -> &'static str {
            fetches.fetch_add(1, Ordering::SeqCst);
            JWKS
        }

        let app = Router::new().route("/.well-known/jwks", get(jwks)).with_state(fetches);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/.well-known/jwks")
    }

    fn sign(jku: &str, timestamp: &str, body: &[u8]) -> String {
        truelayer_signing::sign_with_pem(KID, PRIVATE_KEY.as_bytes())
            .method(Method::Post)
            .path(PATH)
            .header("X-Tl-Webhook-Timestamp", timestamp.as_bytes())
            .jku(jku)
            .body(body)
            .build_signer()
            .sign()
            .unwrap()
    }

    fn request<'a>(signature: &'a str, timestamp: &'a str, body: &'a [u8]) -> WebhookRequest<'a> {
        WebhookRequest {
            path: PATH,
            headers: vec![
                ("Tl-Signature", signature.as_bytes()),
                ("X-Tl-Webhook-Timestamp", timestamp.as_bytes()),
                ("Content-Type", b"application/json"),
            ],
            body,
        }
    }

    fn verifier(jku: &str) -> TlSignatureVerifier {
        TlSignatureVerifier::new(reqwest::Client::new(), vec![jku.to_string()])
    }

    #[tokio::test]
    async fn test_valid_signature() {
        let jku = spawn_jwks(Arc::default()).await;
        let ts = now().to_rfc3339();
        let signature = sign(&jku, &ts, BODY);

        verifier(&jku).verify_at(&request(&signature, &ts, BODY), now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_tampered_body_rejected() {
        let jku = spawn_jwks(Arc::default()).await;
        let ts = now().to_rfc3339();
        let signature = sign(&jku, &ts, BODY);
        let tampered = br#"{"type":"payment_executed","payment_id":"p_2"}"#;

        let result = verifier(&jku).verify_at(&request(&signature, &ts, tampered), now()).await;
        assert!(matches!(result, Err(PaymentError::WebhookSignature(_))));
    }

    #[tokio::test]
    async fn test_other_path_rejected() {
        let jku = spawn_jwks(Arc::default()).await;
        let ts = now().to_rfc3339();
        let signature = sign(&jku, &ts, BODY);
        let mut req = request(&signature, &ts, BODY);
        req.path = "/api/other";

        assert!(verifier(&jku).verify_at(&req, now()).await.is_err());
    }

    #[tokio::test]
    async fn test_unlisted_jku_is_never_fetched() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let jku = spawn_jwks(fetches.clone()).await;
        let ts = now().to_rfc3339();
        let signature = sign(&jku, &ts, BODY);

        let verifier = TlSignatureVerifier::new(
            reqwest::Client::new(),
            vec!["https://webhooks.truelayer.com/.well-known/jwks".into()],
        );
        let err = verifier.verify_at(&request(&signature, &ts, BODY), now()).await.unwrap_err();

        assert!(err.to_string().contains("jku not allowed"), "{err}");
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_timestamp_rejected() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let jku = spawn_jwks(fetches.clone()).await;
        let ts = (now() - chrono::Duration::seconds(61)).to_rfc3339();
        let signature = sign(&jku, &ts, BODY);

        let result = verifier(&jku)
            .with_tolerance(60)
            .verify_at(&request(&signature, &ts, BODY), now())
            .await;

        assert!(matches!(result, Err(PaymentError::WebhookSignature(ref m)) if m.contains("tolerance")));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_headers() {
        let jku = spawn_jwks(Arc::default()).await;
        let ts = now().to_rfc3339();
        let signature = sign(&jku, &ts, BODY);
        let verifier = verifier(&jku);

        let no_signature = WebhookRequest {
            path: PATH,
            headers: vec![("X-Tl-Webhook-Timestamp", ts.as_bytes())],
            body: BODY,
        };
        let no_timestamp = WebhookRequest {
            path: PATH,
            headers: vec![("Tl-Signature", signature.as_bytes())],
            body: BODY,
        };
        let bad_timestamp = request(&signature, "yesterday", BODY);
        let bad_signature = request("not-a-jws", &ts, BODY);

        for req in [no_signature, no_timestamp, bad_timestamp, bad_signature] {
            let result = verifier.verify_at(&req, now()).await;
            assert!(matches!(result, Err(PaymentError::WebhookSignature(_))), "{req:?}");
        }
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let req = request("sig", "ts", BODY);
        assert_eq!(req.header(SIGNATURE_HEADER), Some(&b"sig"[..]));
        assert_eq!(req.header("CONTENT-TYPE"), Some(&b"application/json"[..]));
        assert!(req.header("x-missing").is_none());
    }

    #[test]
    fn test_parse_executed() {
        let event = WebhookEvent::from_slice(BODY).unwrap();
        assert_eq!(
            event,
            WebhookEvent::PaymentExecuted {
                event_id: Some("ev_1".into()),
                payment_id: "p_1".into(),
                executed_at: Some(now()),
            }
        );
    }

    #[test]
    fn test_parse_failed_and_unknown() {
        let failed = br#"{"type":"payment_failed","payment_id":"p_3","failure_reason":"canceled"}"#;
        assert!(matches!(
            WebhookEvent::from_slice(failed).unwrap(),
            WebhookEvent::PaymentFailed { failure_reason: Some(ref r), .. } if r == "canceled"
        ));

        let other = br#"{"type":"refund_executed","event_id":"ev_9"}"#;
        assert!(matches!(
            WebhookEvent::from_slice(other).unwrap(),
            WebhookEvent::Other { ref event_type, .. } if event_type == "refund_executed"
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(WebhookEvent::from_slice(b"not json").is_err());
        assert!(WebhookEvent::from_slice(br#"{"type":"payment_settled"}"#).is_err());
    }

    #[tokio::test]
    async fn test_handler_verifies_then_parses() {
        let jku = spawn_jwks(Arc::default()).await;
        let ts = Utc::now().to_rfc3339();
        let handler = WebhookHandler::truelayer(reqwest::Client::new(), vec![jku.clone()]);

        let signature = sign(&jku, &ts, BODY);
        let event = handler.parse_event(&request(&signature, &ts, BODY)).await.unwrap();
        handler.handle(&event);

        let not_json = b"not json";
        let signature = sign(&jku, &ts, not_json);
        let result = handler.parse_event(&request(&signature, &ts, not_json)).await;
        assert!(matches!(result, Err(PaymentError::WebhookParse(_))));
    }
}
