use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::ApiResponse;
use crate::error::ApiError;
use crate::Result;

/// Cancels one request, or every request issued through a scoped client.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A handle cancelled together with this one.
    pub fn child(&self) -> Self {
        Self::from_token(self.token.child_token())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// An in-flight request: the result future plus the handle that cancels it.
///
/// Awaiting a `PendingRequest` awaits its result. Use
/// [`PendingRequest::into_parts`] to move the handle somewhere else.
pub struct PendingRequest {
    handle: CancelHandle,
    future: BoxFuture<'static, Result<ApiResponse>>,
}

impl PendingRequest {
    pub(crate) fn new(handle: CancelHandle, future: BoxFuture<'static, Result<ApiResponse>>) -> Self {
        Self { handle, future }
    }

    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn into_parts(self) -> (CancelHandle, BoxFuture<'static, Result<ApiResponse>>) {
        (self.handle, self.future)
    }
}

impl Future for PendingRequest {
    type Output = Result<ApiResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("cancelled", &self.handle.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Runs `fut` unless `token` fires first. A token that is already cancelled
/// wins without polling `fut`.
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> std::result::Result<T, ApiError>
where
    F: Future<Output = std::result::Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Cancelled),
        result = fut => result,
    }
}
