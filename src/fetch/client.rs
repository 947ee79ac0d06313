use async_trait::async_trait;
use reqwest::{Request, Response};
use std::sync::Arc;

/// Executes prepared requests. Wrappers in [`auth`](super::auth) decorate an
/// inner client with credentials before delegating.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
