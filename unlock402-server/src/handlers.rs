//! Axum routes for the content server.
//!
//! Every catalog item gets its own static route wrapped in a
//! [`PaywallLayer`](unlock402_http::server::PaywallLayer) built from the
//! item's price. Static routes win over the `{id}` catch-all, so any id that
//! reaches [`content_not_found`] is unknown.

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use unlock402::{PaymentDescriptor, ProofVerifier};
use unlock402_http::server::Paywall;

use crate::config::ContentItem;
use crate::error::ApiError;

/// Body returned once an item is paid for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedContent {
    /// Always `true`.
    pub success: bool,
    /// The item body.
    pub content: String,
    /// ISO-8601 time of the unlock.
    pub unlocked_at: String,
}

/// One entry of `GET /api/content`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// Item id.
    pub id: String,
    /// Item title.
    pub title: String,
    /// What a `402` for this item would advertise.
    pub price: PaymentDescriptor,
}

/// Builds the application router for `items`, verifying proofs with `verifier`.
pub fn content_router<V>(items: &[ContentItem], verifier: V) -> Router
where
    V: ProofVerifier + 'static,
{
    let paywall = Paywall::new(verifier);
    let catalog: Arc<Vec<CatalogEntry>> = Arc::new(
        items
            .iter()
            .map(|item| CatalogEntry {
                id: item.id.clone(),
                title: item.title.clone(),
                price: item.payment_config().descriptor(),
            })
            .collect(),
    );

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/content", get(move || list_content(Arc::clone(&catalog))))
        .route("/api/content/{id}", get(content_not_found));

    for item in items {
        let body: Arc<str> = Arc::from(item.body.as_str());
        let gate = paywall.with_config(item.payment_config());
        router = router.route(
            &item.path(),
            get(move || unlock(Arc::clone(&body))).layer(gate),
        );
    }
    router
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_content(catalog: Arc<Vec<CatalogEntry>>) -> Json<Vec<CatalogEntry>> {
    Json(catalog.to_vec())
}

async fn unlock(body: Arc<str>) -> Json<UnlockedContent> {
    Json(UnlockedContent {
        success: true,
        content: body.to_string(),
        unlocked_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn content_not_found(Path(id): Path<String>) -> ApiError {
    ApiError::NotFound(id)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use unlock402::{Address, Network, PaymentConfig, PaymentProof, TxHash, U256, VerificationOutcome};

    use super::*;
    use crate::config::TokenConfig;

    /// Accepts exactly one transaction hash.
    struct OneTx(TxHash);

    #[async_trait::async_trait]
    impl ProofVerifier for OneTx {
        async fn verify(&self, proof: &PaymentProof, _: &PaymentConfig) -> VerificationOutcome {
            if proof.transaction_hash == self.0 {
                VerificationOutcome::Verified
            } else {
                VerificationOutcome::TransactionNotFound
            }
        }
    }

    fn item(id: &str, token: Option<TokenConfig>) -> ContentItem {
        ContentItem {
            id: id.into(),
            title: format!("Item {id}"),
            body: format!("body of {id}"),
            network: Network::BaseSepolia,
            pay_to: Address::repeat_byte(0xaa),
            amount: U256::from(1_000u64),
            description: None,
            mime_type: Some("text/plain".into()),
            token,
        }
    }

    fn app() -> Router {
        let usdc = TokenConfig {
            address: Address::repeat_byte(0xcc),
            decimals: 6,
            symbol: "USDC".into(),
            asset: None,
        };
        content_router(
            &[item("1", None), item("2", Some(usdc))],
            OneTx(TxHash::repeat_byte(7)),
        )
    }

    async fn get(app: Router, uri: &str, proof: Option<TxHash>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut request = Request::get(uri);
        if let Some(tx) = proof {
            let proof = serde_json::json!({
                "version": "1",
                "network": "base-sepolia",
                "transactionHash": tx,
                "payer": Address::repeat_byte(0xbb),
            });
            request = request.header("X-Payment", unlock402::encoding::encode_json(&proof).unwrap());
        }
        let response = app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, _, body) = get(app(), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn catalog_lists_prices_without_payment() {
        let (status, _, body) = get(app(), "/api/content", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "1");
        assert_eq!(body[0]["price"]["maxAmountRequired"], "1000");
        assert_eq!(body[0]["price"]["resource"], "/api/content/1");
        assert_eq!(body[1]["price"]["tokenSymbol"], "USDC");
    }

    #[tokio::test]
    async fn unpaid_request_is_challenged() {
        let (status, headers, body) = get(app(), "/api/content/2", None).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(headers["x-payment-required"], "true");
        assert_eq!(headers["x-payment-tokensymbol"], "USDC");
        assert_eq!(headers["x-payment-resource"], "/api/content/2");
        assert_eq!(body["paymentDetails"]["description"], "Item 2");
    }

    #[tokio::test]
    async fn verified_proof_unlocks_content() {
        let (status, _, body) = get(app(), "/api/content/1", Some(TxHash::repeat_byte(7))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "body of 1");
        let unlocked_at = body["unlockedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(unlocked_at).is_ok());
    }

    #[tokio::test]
    async fn rejected_proof_gets_generic_402() {
        let (status, _, body) = get(app(), "/api/content/1", Some(TxHash::repeat_byte(8))).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["message"], "payment verification failed");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (status, _, body) = get(app(), "/api/content/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "content \"42\" not found");
    }
}
