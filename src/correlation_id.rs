//! Request correlation ID middleware
//!
//! Adopts the correlation id a client supplies in a configurable header, or
//! generates a UUID v4 when the header is absent or blank, then makes the id
//! ambient for the rest of request processing:
//! - [`CorrelationContext`] (readable from any downstream code)
//! - the logging context, under the configured MDC key
//! - request extensions, as [`CorrelationId`]
//!
//! Both contexts are torn down when the request completes, on every exit
//! path: normal return, downstream error, panic unwind, or a dropped
//! (cancelled) request future. Downstream errors propagate unchanged.
//!
//! ## Example
//! ```rust
//! use actix_web::App;
//! use request_correlation::{CorrelationConfig, CorrelationIdMiddleware};
//!
//! let app = App::new().wrap(CorrelationIdMiddleware::new(CorrelationConfig::from_env()));
//! ```

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::CorrelationConfig;
use crate::context::CorrelationContext;
use crate::mdc::{self, LogContext, Mdc};

/// Correlation id resolved for the current request, stored in request extensions
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Middleware that establishes a correlation id per request
#[derive(Clone)]
pub struct CorrelationIdMiddleware {
    config: CorrelationConfig,
    log_context: Arc<dyn LogContext>,
}

impl CorrelationIdMiddleware {
    /// Creates the middleware with the given configuration, publishing ids
    /// to the task-scoped [`Mdc`].
    pub fn new(config: CorrelationConfig) -> Self {
        Self::with_log_context(config, Arc::new(Mdc))
    }

    /// Creates the middleware with an explicit logging-context collaborator.
    pub fn with_log_context(config: CorrelationConfig, log_context: Arc<dyn LogContext>) -> Self {
        Self {
            config,
            log_context,
        }
    }
}

impl Default for CorrelationIdMiddleware {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorrelationIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationIdMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationIdMiddlewareService {
            service: Rc::new(service),
            config: Rc::new(self.config.clone()),
            log_context: self.log_context.clone(),
        }))
    }
}

pub struct CorrelationIdMiddlewareService<S> {
    service: Rc<S>,
    config: Rc<CorrelationConfig>,
    log_context: Arc<dyn LogContext>,
}

impl<S, B> Service<ServiceRequest> for CorrelationIdMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = Rc::clone(&self.config);
        let log_context = Arc::clone(&self.log_context);

        // Fresh task-local scopes per request: reused workers never observe
        // a previous request's id, and the storage drops with the request.
        Box::pin(CorrelationContext::scope(mdc::scope(async move {
            let correlation_id = resolve_correlation_id(&req, &config.header_name);

            req.extensions_mut()
                .insert(CorrelationId(correlation_id.clone()));
            CorrelationContext::current().set_correlation_id(correlation_id.clone());
            log_context.put(&config.mdc_key, &correlation_id);

            tracing::debug!(
                correlation_id = %correlation_id,
                path = %req.path(),
                "Correlation id established"
            );

            let _cleanup = CleanupGuard {
                log_context,
                mdc_key: config.mdc_key.clone(),
            };

            service.call(req).await
        })))
    }
}

/// Header value if present, readable, and non-blank after trimming;
/// otherwise a freshly generated UUID v4. No format validation.
fn resolve_correlation_id(req: &ServiceRequest, header_name: &str) -> String {
    req.headers()
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Removes the MDC key and clears the correlation context when dropped,
/// covering normal completion, error propagation, unwind, and future drop.
struct CleanupGuard {
    log_context: Arc<dyn LogContext>,
    mdc_key: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.log_context.remove(&self.mdc_key);
        CorrelationContext::clear_current();
    }
}

/// Extract the correlation id resolved for `req`, if the middleware ran.
///
/// ## Example
/// ```rust
/// use actix_web::HttpRequest;
/// use request_correlation::correlation_id;
///
/// fn handler(req: HttpRequest) -> String {
///     match correlation_id(&req) {
///         Some(id) => format!("Request ID: {}", id),
///         None => "untracked".to_string(),
///     }
/// }
/// ```
pub fn correlation_id(req: &HttpRequest) -> Option<String> {
    req.extensions()
        .get::<CorrelationId>()
        .map(|id| id.0.clone())
}
