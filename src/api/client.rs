use std::sync::Arc;

use futures::FutureExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::cancel::{cancellable, CancelHandle, PendingRequest};
use super::navigation::{Navigator, LOGIN_PATH};
use super::request::{ApiResponse, RequestSpec};
use crate::config::ApiConfig;
use crate::error::{ApiError, AppError};
use crate::store::{TokenPair, TokenStore};
use crate::Result;

pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// A request on its way through the client, with its one-shot retry marker.
struct Pending {
    spec: RequestSpec,
    retried: bool,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
}

/// REST client that attaches the stored bearer token and recovers from one
/// expired access token per request by refreshing it.
///
/// Concurrent requests that hit 401 at the same time each run their own
/// refresh; refreshes are not shared between requests.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
    scope: Option<CancelHandle>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid api.base_url '{}': {}", config.base_url, e))
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens,
                navigator,
            }),
            scope: None,
        })
    }

    /// A client whose requests are all cancelled by `handle`.
    pub fn with_cancel(&self, handle: &CancelHandle) -> Self {
        Self {
            inner: self.inner.clone(),
            scope: Some(handle.clone()),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Starts a request. The returned value can be awaited directly, or split
    /// into its cancel handle and result future.
    pub fn send(&self, spec: RequestSpec) -> PendingRequest {
        let handle = match &self.scope {
            Some(scope) => scope.child(),
            None => CancelHandle::new(),
        };
        let token = handle.token().clone();
        let client = self.clone();
        let future = async move {
            client
                .run(Pending { spec, retried: false }, &token)
                .await
        }
        .boxed();

        PendingRequest::new(handle, future)
    }

    pub async fn execute(&self, spec: RequestSpec) -> Result<ApiResponse> {
        self.send(spec).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T> {
        let response = self.execute(spec).await?;
        Ok(response.json()?)
    }

    pub async fn send_json<B, T>(&self, spec: RequestSpec, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(spec.json(body)?).await?;
        Ok(response.json()?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(RequestSpec::delete(path)).await?;
        Ok(())
    }

    async fn run(&self, mut pending: Pending, cancel: &CancellationToken) -> Result<ApiResponse> {
        let mut bearer = self.inner.tokens.access_token()?;

        loop {
            let response =
                cancellable(cancel, self.dispatch(&pending.spec, bearer.as_deref())).await?;

            if response.status != StatusCode::UNAUTHORIZED || pending.retried {
                return Ok(response.error_for_status()?);
            }
            pending.retried = true;

            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled.into());
            }

            let Some(refresh_token) = self.inner.tokens.refresh_token()? else {
                debug!(path = %pending.spec.path, "Got 401 without a refresh token");
                return Ok(response.error_for_status()?);
            };

            match cancellable(cancel, self.refresh(&refresh_token)).await {
                Ok(pair) => {
                    self.inner.tokens.save(&pair)?;
                    info!(path = %pending.spec.path, "Access token refreshed, retrying request");
                    bearer = Some(pair.access_token);
                }
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled.into()),
                Err(e) => {
                    warn!(path = %pending.spec.path, error = %e, "Token refresh failed, ending session");
                    if let Err(store_err) = self.inner.tokens.clear() {
                        error!(error = %store_err, "Failed to clear tokens after refresh failure");
                    }
                    self.inner.navigator.redirect(LOGIN_PATH);
                    return Err(ApiError::Refresh(Box::new(e)).into());
                }
            }
        }
    }

    async fn dispatch(
        &self,
        spec: &RequestSpec,
        bearer: Option<&str>,
    ) -> std::result::Result<ApiResponse, ApiError> {
        let url = self.endpoint(&spec.path)?;
        let mut request = self.inner.http.request(spec.method.clone(), url);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = ApiResponse::read(request.send().await?).await?;
        debug!(
            method = %spec.method,
            path = %spec.path,
            status = response.status.as_u16(),
            "Request completed"
        );
        Ok(response)
    }

    async fn refresh(&self, refresh_token: &str) -> std::result::Result<TokenPair, ApiError> {
        let url = self.endpoint(REFRESH_PATH)?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        ApiResponse::read(response).await?.error_for_status()?.json()
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }
}
