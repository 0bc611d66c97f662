//! Per-call rewrite hooks
//!
//! The request rewriter runs right before serialization, the response
//! rewriter right after a successful decode. Both are pure transforms and
//! default to identity. Their signatures return a value, never an option, so
//! a rewriter cannot drop the message.

use std::sync::Arc;

use crate::codec::HubRequest;

pub trait RequestRewriter<R>: Send + Sync {
    fn rewrite(&self, request: R) -> R;
}

impl<R, F> RequestRewriter<R> for F
where
    F: Fn(R) -> R + Send + Sync,
{
    fn rewrite(&self, request: R) -> R {
        self(request)
    }
}

pub trait ResponseRewriter<T>: Send + Sync {
    fn rewrite(&self, response: T) -> T;
}

impl<T, F> ResponseRewriter<T> for F
where
    F: Fn(T) -> T + Send + Sync,
{
    fn rewrite(&self, response: T) -> T {
        self(response)
    }
}

/// Hooks attached to one operation type.
pub struct Hooks<R: HubRequest> {
    request: Option<Arc<dyn RequestRewriter<R>>>,
    response: Option<Arc<dyn ResponseRewriter<R::Response>>>,
}

impl<R: HubRequest> Hooks<R> {
    pub fn identity() -> Self {
        Self {
            request: None,
            response: None,
        }
    }

    pub fn with_request(mut self, rewriter: impl RequestRewriter<R> + 'static) -> Self {
        self.request = Some(Arc::new(rewriter));
        self
    }

    pub fn with_response(mut self, rewriter: impl ResponseRewriter<R::Response> + 'static) -> Self {
        self.response = Some(Arc::new(rewriter));
        self
    }

    pub(crate) fn rewrite_request(&self, request: R) -> R {
        match &self.request {
            Some(rewriter) => rewriter.rewrite(request),
            None => request,
        }
    }

    pub(crate) fn rewrite_response(&self, response: R::Response) -> R::Response {
        match &self.response {
            Some(rewriter) => rewriter.rewrite(response),
            None => response,
        }
    }
}

impl<R: HubRequest> Default for Hooks<R> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<R: HubRequest> Clone for Hooks<R> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            response: self.response.clone(),
        }
    }
}
