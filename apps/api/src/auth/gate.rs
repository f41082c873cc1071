//! Role gate for protected routes.
//!
//! Each protected route is wrapped with a [`RoleGateLayer`] naming the one
//! role it requires. The gate answers every failure (missing header, bad
//! signature, expiry, wrong role) with the same 401 so callers cannot tell
//! which check failed.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use tower::{Layer, Service};
use tracing::debug;

use super::{Claims, Role, TokenService};
use crate::errors::AppError;

/// Wraps `route` so it only runs for callers holding a valid `role` token.
pub fn require<S>(route: MethodRouter<S>, tokens: Arc<TokenService>, role: Role) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(RoleGateLayer::new(tokens, role))
}

/// Extracts the token from `Authorization: Bearer <token>`.
/// The scheme is matched case-insensitively; anything else yields `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

fn authorize(tokens: &TokenService, headers: &HeaderMap, required: Role) -> Option<Claims> {
    let Some(token) = extract_bearer_token(headers) else {
        debug!(%required, "No bearer token on protected route");
        return None;
    };

    match tokens.verify(token, required) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, %required, "Token rejected");
            None
        }
    }
}

// =============================================================================
// RoleGateLayer
// =============================================================================

#[derive(Clone)]
pub struct RoleGateLayer {
    tokens: Arc<TokenService>,
    required: Role,
}

impl RoleGateLayer {
    pub fn new(tokens: Arc<TokenService>, required: Role) -> Self {
        Self { tokens, required }
    }
}

impl<S> Layer<S> for RoleGateLayer {
    type Service = RoleGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleGate {
            inner,
            tokens: self.tokens.clone(),
            required: self.required,
        }
    }
}

// =============================================================================
// RoleGate
// =============================================================================

#[derive(Clone)]
pub struct RoleGate<S> {
    inner: S,
    tokens: Arc<TokenService>,
    required: Role,
}

impl<S> Service<Request<Body>> for RoleGate<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        // Verification is CPU-only, so it runs before the future is built.
        let claims = authorize(&self.tokens, req.headers(), self.required);

        // Keep the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match claims {
                Some(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                None => Ok(AppError::Unauthorized.into_response()),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
