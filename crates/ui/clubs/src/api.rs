//! HTTP adapter for the clubs backend.
//!
//! Every endpoint answers with `{ ok, data? }`. Non-2xx and `ok: false` are
//! failures; the caller decides what the user sees.

use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use club_core::{
    forms::Credentials,
    gallery::{Album, AlbumId},
    gateway::{interpret, ApiResponse},
    session::LoginData,
    Ack, AuthToken, SubmissionError, SubmissionGateway, SubmissionPayload,
};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .wrap_err("building HTTP client")?;
        Ok(Self {
            http,
            base: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Send and unwrap the `{ ok, data }` envelope.
    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>> {
        let response = builder.send().await.wrap_err("request failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("endpoint answered with status {}", status.as_u16()));
        }
        let body: ApiResponse<T> = response.json().await.wrap_err("unreadable response")?;
        body.into_result().map_err(|e| eyre!(e))
    }

    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<LoginData> {
        let builder = self
            .request(Method::POST, "users/auth/signin", None)
            .json(credentials);
        let data = self
            .call::<LoginData>(builder)
            .await?
            .ok_or_else(|| eyre!("sign-in response carried no data"))?;
        info!("signed in");
        Ok(data)
    }

    pub async fn current_user(&self, token: &AuthToken) -> Result<User> {
        let builder = self.request(Method::GET, "users/me", Some(token));
        self.call::<User>(builder)
            .await?
            .ok_or_else(|| eyre!("user response carried no data"))
    }

    #[instrument(skip(self, token))]
    pub async fn albums(&self, club_id: u64, token: &AuthToken) -> Result<Vec<Album>> {
        let builder = self.request(Method::GET, &format!("clubs/{club_id}/albums"), Some(token));
        let albums = self.call::<Vec<Album>>(builder).await?.unwrap_or_default();
        debug!(count = albums.len(), "albums fetched");
        Ok(albums)
    }

    #[instrument(skip(self, token))]
    pub async fn delete_album(&self, album_id: AlbumId, token: &AuthToken) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("clubs/albums/{album_id}"), Some(token));
        self.call::<serde_json::Value>(builder).await?;
        Ok(())
    }
}

/// `SubmissionGateway` that POSTs the payload as JSON to one endpoint.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    api: ApiClient,
    path: &'static str,
}

impl HttpGateway {
    pub fn new(api: ApiClient, path: &'static str) -> Self {
        Self { api, path }
    }
}

#[async_trait]
impl SubmissionGateway for HttpGateway {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        token: &AuthToken,
    ) -> Result<Ack, SubmissionError> {
        let response = self
            .api
            .request(Method::POST, self.path, Some(token))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(path = self.path, error = %e, "submission request failed");
                SubmissionError::new(e.to_string())
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::new(e.to_string()))?;
        interpret(status, &body)
    }
}
