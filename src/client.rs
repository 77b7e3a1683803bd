//! Contract & transport adapter for the RAG backend.
//!
//! [`ApiClient`] turns typed requests into HTTP calls and typed results back
//! out, with every failure normalized into a [`ClassifiedError`]. The same
//! surface is available as the [`RagApi`] trait so front ends (and tests) can
//! drive a substitute backend.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Result |
//! |--------|------|------|--------|
//! | `POST` | `/documents/add` | `{url, category, tags?}` | [`AddDocumentResult`] |
//! | `POST` | `/search` | `{query, model_type?, k?}` | [`SearchResult`] |
//! | `GET`  | `/stats` | — | [`StatsResult`] |
//! | `GET`  | `/health` | — | [`HealthResult`] |
//! | `POST` | `/model/switch` | `{model_type}` | [`ModelSwitchAck`] |
//!
//! # Transport settings
//!
//! Base endpoint, default headers (including the bearer token) and timeout
//! live in one [`TransportSettings`] value owned by the client. They change
//! only through [`ApiClient::configure`], [`ApiClient::set_auth_token`] and
//! [`ApiClient::clear_auth_token`]. Each call clones the settings when it is
//! dispatched, so a token change never affects a request already in flight.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::config::Config;
use crate::error::{ApiResult, ClassifiedError};
use crate::guards;
use crate::interceptor;
use crate::models::{
    AddDocumentRequest, AddDocumentResult, Category, HealthResult, ModelSwitchAck, SearchRequest,
    SearchResult, StatsResult,
};

/// The backend operations a front end can drive.
#[async_trait]
pub trait RagApi: Send + Sync {
    /// Submit a document URL for ingestion.
    async fn add_document(&self, req: &AddDocumentRequest) -> ApiResult<AddDocumentResult>;

    /// Ask a question against the ingested corpus.
    async fn search(&self, req: &SearchRequest) -> ApiResult<SearchResult>;

    /// Corpus totals and per-source summaries.
    async fn get_stats(&self) -> ApiResult<StatsResult>;

    /// Liveness probe.
    async fn get_health(&self) -> ApiResult<HealthResult>;

    /// Ask the backend to make `model_id` its active model.
    async fn switch_model(&self, model_id: &str) -> ApiResult<ModelSwitchAck>;

    /// Record `model_id` as the default for searches that don't name one.
    fn set_active_model(&self, model_id: &str) -> ApiResult<()>;
}

/// Process-wide transport configuration, copied into each outgoing call.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

impl TransportSettings {
    fn new(base_url: String, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            base_url,
            headers,
            timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn has_auth(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }
}

#[derive(Debug, Clone)]
struct ModelRoster {
    offered: Vec<String>,
    active: Option<String>,
}

impl ModelRoster {
    fn require_offered(&self, model_id: &str) -> ApiResult<()> {
        if self.offered.iter().any(|m| m == model_id) {
            Ok(())
        } else {
            Err(ClassifiedError::validation(format!(
                "unknown model '{}'; offered models: {}",
                model_id,
                self.offered.join(", ")
            )))
        }
    }
}

/// HTTP client for the RAG backend.
pub struct ApiClient {
    http: reqwest::Client,
    settings: RwLock<TransportSettings>,
    models: RwLock<ModelRoster>,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    k: Option<u32>,
}

#[derive(Serialize)]
struct SwitchBody<'a> {
    model_type: &'a str,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// The configuration is expected to have passed
    /// [`crate::config::validate`]; the base URL is checked again here.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        check_base_url(&config.backend.base_url).map_err(|e| anyhow::anyhow!(e.message))?;

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            settings: RwLock::new(TransportSettings::new(
                config.backend.base_url.clone(),
                config.backend.timeout(),
            )),
            models: RwLock::new(ModelRoster {
                offered: config.models.offered.clone(),
                active: config.models.default.clone(),
            }),
        })
    }

    // ============ Settings lifecycle ============

    /// Copy of the current transport settings.
    pub fn settings(&self) -> TransportSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point subsequent calls at a different base endpoint.
    pub fn configure(&self, base_url: &str) -> ApiResult<()> {
        check_base_url(base_url)?;
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.base_url = base_url.to_string();
        tracing::debug!(base_url, "base endpoint changed");
        Ok(())
    }

    /// Send `Authorization: Bearer <token>` on every subsequent call.
    pub fn set_auth_token(&self, token: &str) -> ApiResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClassifiedError::validation("auth token must not be empty"));
        }
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClassifiedError::validation("auth token contains invalid characters"))?;
        value.set_sensitive(true);

        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.headers.insert(AUTHORIZATION, value);
        tracing::debug!("auth token set");
        Ok(())
    }

    /// Stop sending the `Authorization` header.
    pub fn clear_auth_token(&self) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        if settings.headers.remove(AUTHORIZATION).is_some() {
            tracing::debug!("auth token cleared");
        }
    }

    // ============ Models ============

    /// Models the user may pick from.
    pub fn offered_models(&self) -> Vec<String> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .offered
            .clone()
    }

    /// Model used for searches that don't name one.
    pub fn active_model(&self) -> Option<String> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .clone()
    }

    /// Make `model_id` the default for searches that don't name one.
    pub fn set_active_model(&self, model_id: &str) -> ApiResult<()> {
        let model_id = model_id.trim();
        let mut roster = self.models.write().unwrap_or_else(PoisonError::into_inner);
        roster.require_offered(model_id)?;
        roster.active = Some(model_id.to_string());
        tracing::debug!(model = model_id, "active model set");
        Ok(())
    }

    // ============ Operations ============

    pub async fn add_document(&self, req: &AddDocumentRequest) -> ApiResult<AddDocumentResult> {
        let url = validate_document_url(&req.url)?;
        // `Category::Custom` can be built directly, so re-check the token.
        let category: Category = req
            .category
            .as_str()
            .parse()
            .map_err(ClassifiedError::validation)?;
        if req.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(ClassifiedError::validation("tags must not be blank"));
        }

        let body = AddDocumentRequest {
            url: url.to_string(),
            category,
            tags: req.tags.iter().map(|t| t.trim().to_string()).collect(),
        };

        self.dispatch(
            Method::POST,
            "/documents/add",
            Some(encode(&body)?),
            guards::is_add_document_response,
        )
        .await
    }

    pub async fn search(&self, req: &SearchRequest) -> ApiResult<SearchResult> {
        let query = req.query.trim();
        if query.is_empty() {
            return Err(ClassifiedError::validation("query must not be empty"));
        }
        if req.k == Some(0) {
            return Err(ClassifiedError::validation("k must be at least 1"));
        }

        let model = {
            let roster = self.models.read().unwrap_or_else(PoisonError::into_inner);
            match &req.model {
                Some(m) => {
                    roster.require_offered(m)?;
                    Some(m.clone())
                }
                None => roster.active.clone(),
            }
        };

        let body = SearchBody {
            query,
            model_type: model.as_deref(),
            k: req.k,
        };

        self.dispatch(
            Method::POST,
            "/search",
            Some(encode(&body)?),
            guards::is_search_response,
        )
        .await
    }

    pub async fn get_stats(&self) -> ApiResult<StatsResult> {
        let payload: Value = self
            .dispatch(Method::GET, "/stats", None, guards::is_stats_response)
            .await?;

        let entries_ok = payload
            .get("sources")
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().all(guards::is_source_summary));
        if !entries_ok {
            return Err(ClassifiedError::schema(
                "unexpected source entry shape from /stats",
            ));
        }

        interceptor::conform("/stats", payload, guards::is_stats_response)
    }

    pub async fn get_health(&self) -> ApiResult<HealthResult> {
        self.dispatch(Method::GET, "/health", None, guards::is_health_response)
            .await
    }

    /// Request a backend model switch.
    ///
    /// The local default model is left alone; callers apply the switch with
    /// [`ApiClient::set_active_model`] once they accept the acknowledgement.
    pub async fn switch_model(&self, model_id: &str) -> ApiResult<ModelSwitchAck> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(ClassifiedError::validation("model must not be empty"));
        }
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .require_offered(model_id)?;

        let body = SwitchBody {
            model_type: model_id,
        };
        let payload: Value = self
            .dispatch(
                Method::POST,
                "/model/switch",
                Some(encode(&body)?),
                guards::is_model_switch_response,
            )
            .await?;

        Ok(ModelSwitchAck {
            model: payload
                .get("model_type")
                .and_then(Value::as_str)
                .unwrap_or(model_id)
                .to_string(),
            message: payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Send one request and run its outcome through the interceptor pipeline.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &'static str,
        body: Option<Value>,
        guard: fn(&Value) -> bool,
    ) -> ApiResult<T> {
        let snapshot = self.settings();
        let url = snapshot.endpoint(path);
        tracing::debug!(%method, %url, auth = snapshot.has_auth(), "dispatching request");

        let mut request = self
            .http
            .request(method, &url)
            .headers(snapshot.headers)
            .timeout(snapshot.timeout);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let payload = interceptor::intercept(request.send().await, snapshot.timeout).await?;
        interceptor::conform(path, payload, guard)
    }
}

#[async_trait]
impl RagApi for ApiClient {
    async fn add_document(&self, req: &AddDocumentRequest) -> ApiResult<AddDocumentResult> {
        ApiClient::add_document(self, req).await
    }

    async fn search(&self, req: &SearchRequest) -> ApiResult<SearchResult> {
        ApiClient::search(self, req).await
    }

    async fn get_stats(&self) -> ApiResult<StatsResult> {
        ApiClient::get_stats(self).await
    }

    async fn get_health(&self) -> ApiResult<HealthResult> {
        ApiClient::get_health(self).await
    }

    async fn switch_model(&self, model_id: &str) -> ApiResult<ModelSwitchAck> {
        ApiClient::switch_model(self, model_id).await
    }

    fn set_active_model(&self, model_id: &str) -> ApiResult<()> {
        ApiClient::set_active_model(self, model_id)
    }
}

fn encode<T: Serialize>(body: &T) -> ApiResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| ClassifiedError::validation(format!("could not encode request: {}", e)))
}

fn check_base_url(base_url: &str) -> ApiResult<()> {
    let parsed = url::Url::parse(base_url).map_err(|e| {
        ClassifiedError::validation(format!("invalid base URL '{}': {}", base_url, e))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ClassifiedError::validation(format!(
            "base URL must use http or https, got '{}'",
            other
        ))),
    }
}

/// Check a document locator before anything is sent. Returns it trimmed.
pub fn validate_document_url(raw: &str) -> ApiResult<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClassifiedError::validation("document URL must not be empty"));
    }
    let parsed = url::Url::parse(trimmed).map_err(|e| {
        ClassifiedError::validation(format!("invalid document URL '{}': {}", trimmed, e))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ClassifiedError::validation(format!(
            "document URL must be an http(s) address: '{}'",
            trimmed
        )));
    }
    Ok(trimmed)
}
