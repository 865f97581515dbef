//! Tower layer and service wrapping protected axum routes.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::extract::Request;
use axum_core::response::Response;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};
use unlock402::{PaymentConfig, ProofVerifier};

use super::paygate::Paygate;

/// Entry point for protecting routes.
///
/// Holds the verifier shared by every protected route. Create one per
/// application and derive a [`PaywallLayer`] per route with
/// [`Paywall::with_config`].
pub struct Paywall<V> {
    verifier: Arc<V>,
}

impl<V> Clone for Paywall<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Paywall<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paywall")
            .field("verifier", &self.verifier)
            .finish()
    }
}

impl<V> Paywall<V> {
    /// Creates a paywall verifying proofs with `verifier`.
    pub fn new(verifier: V) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Returns the verifier.
    #[must_use]
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Builds a layer charging according to `config`.
    ///
    /// An empty resource in `config` is filled in with the request path when
    /// a challenge is issued.
    #[must_use]
    pub fn with_config(&self, config: PaymentConfig) -> PaywallLayer<V> {
        PaywallLayer {
            verifier: Arc::clone(&self.verifier),
            config: Arc::new(config),
        }
    }
}

/// Layer applying one [`PaymentConfig`] to the routes it wraps.
pub struct PaywallLayer<V> {
    verifier: Arc<V>,
    config: Arc<PaymentConfig>,
}

impl<V> Clone for PaywallLayer<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            config: Arc::clone(&self.config),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for PaywallLayer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaywallLayer")
            .field("verifier", &self.verifier)
            .field("config", &self.config)
            .finish()
    }
}

impl<V> PaywallLayer<V> {
    /// The payment configuration enforced by this layer.
    #[must_use]
    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }
}

impl<S, V> Layer<S> for PaywallLayer<V>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    V: ProofVerifier + 'static,
{
    type Service = PaywallService<V>;

    fn layer(&self, inner: S) -> Self::Service {
        PaywallService {
            verifier: Arc::clone(&self.verifier),
            config: Arc::clone(&self.config),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Service enforcing payment on every request before calling the inner route.
#[allow(missing_debug_implementations)] // BoxCloneSyncService does not implement Debug
pub struct PaywallService<V> {
    verifier: Arc<V>,
    config: Arc<PaymentConfig>,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<V> Clone for PaywallService<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            config: Arc::clone(&self.config),
            inner: self.inner.clone(),
        }
    }
}

impl<V> Service<Request> for PaywallService<V>
where
    V: ProofVerifier + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let gate = Paygate {
            verifier: Arc::clone(&self.verifier),
            config: Arc::clone(&self.config),
        };
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);
        Box::pin(gate.handle_request(inner, req))
    }
}
