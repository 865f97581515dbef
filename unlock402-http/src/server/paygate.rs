//! Core decision logic of the paywall.
//!
//! [`Paygate`] makes a single pass per request: challenge, verify, then
//! either call through or refuse. Retrying is left to the client.

use std::convert::Infallible;
use std::sync::Arc;

use axum_core::body::Body;
use axum_core::response::{IntoResponse, Response};
use http::header::{ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use tower::Service;
#[cfg(feature = "telemetry")]
use tracing::Instrument;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use unlock402::{PaymentConfig, PaymentProof, ProofVerifier, VerificationOutcome};

use super::error::PaygateError;
use crate::constants::{EXPOSED_DESCRIPTOR_HEADERS, X_PAYMENT};
use crate::headers::{decode_proof_header, encode_descriptor_headers};
use crate::types::PaymentRequiredBody;

/// Payment gate for one protected request.
#[allow(missing_debug_implementations)]
pub struct Paygate<V> {
    /// Verifier consulted for every proof.
    pub verifier: Arc<V>,
    /// What the protected resource costs.
    pub config: Arc<PaymentConfig>,
}

impl<V> Paygate<V>
where
    V: ProofVerifier,
{
    /// Handles an incoming request.
    ///
    /// Returns a `402` challenge if the request carries no usable proof, a
    /// generic `402` if the proof does not verify, and the inner service's
    /// response otherwise.
    ///
    /// # Errors
    ///
    /// This method is infallible (`Infallible` error type).
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "unlock402.handle_request", skip_all, fields(path = %req.uri().path()))
    )]
    pub async fn handle_request<ReqBody, S>(
        self,
        inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<Response, Infallible>
    where
        S: Service<http::Request<ReqBody>>,
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        let path = req.uri().path().to_owned();
        match self.check_payment(req.headers()).await {
            Ok(()) => Ok(call_inner(inner, req).await),
            Err(err) => Ok(self.error_into_response(err, &path)),
        }
    }

    /// Extracts and verifies the proof carried by `headers`.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError`] if there is no usable proof or it does not verify.
    pub async fn check_payment(&self, headers: &HeaderMap) -> Result<(), PaygateError> {
        let proof = extract_proof(headers)?;
        match self.verifier.verify(&proof, &self.config).await {
            VerificationOutcome::Verified => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(tx = %proof.transaction_hash, "proof accepted");
                Ok(())
            }
            outcome => Err(PaygateError::Verification(outcome)),
        }
    }

    /// Builds the challenge for a request to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError::Encode`] if the descriptor cannot be written as headers.
    pub fn challenge(&self, path: &str) -> Result<Response, PaygateError> {
        let config = if self.config.terms().resource.is_empty() {
            (*self.config).clone().with_resource(path)
        } else {
            (*self.config).clone()
        };
        let descriptor = config.descriptor();
        let mut headers = encode_descriptor_headers(&descriptor)?;
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_DESCRIPTOR_HEADERS),
        );
        let mut response = json_response(
            StatusCode::PAYMENT_REQUIRED,
            &PaymentRequiredBody::challenge(descriptor),
        );
        response.headers_mut().extend(headers);
        Ok(response)
    }

    fn error_into_response(&self, err: PaygateError, path: &str) -> Response {
        match err {
            PaygateError::ProofRequired | PaygateError::InvalidProof(_) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(reason = %err, "issuing payment challenge");
                self.challenge(path)
                    .unwrap_or_else(|err| self.error_into_response(err, path))
            }
            PaygateError::Verification(outcome) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(reason = outcome.reason(), %outcome, "payment rejected");
                #[cfg(not(feature = "telemetry"))]
                let _ = outcome;
                json_response(
                    StatusCode::PAYMENT_REQUIRED,
                    &PaymentRequiredBody::verification_failed(),
                )
            }
            PaygateError::Encode(_) => {
                #[cfg(feature = "telemetry")]
                tracing::error!(error = %err, "cannot build payment challenge");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Calls the inner service, turning its error into a response.
async fn call_inner<ReqBody, S>(mut inner: S, req: http::Request<ReqBody>) -> Response
where
    S: Service<http::Request<ReqBody>>,
    S::Response: IntoResponse,
    S::Error: IntoResponse,
    S::Future: Send,
{
    let fut = inner.call(req);
    #[cfg(feature = "telemetry")]
    let fut = fut.instrument(tracing::info_span!("inner"));
    match fut.await {
        Ok(response) => response.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Reads the proof from the `X-Payment` header.
fn extract_proof(headers: &HeaderMap) -> Result<PaymentProof, PaygateError> {
    let header = headers.get(X_PAYMENT).ok_or(PaygateError::ProofRequired)?;
    Ok(decode_proof_header(header)?)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
