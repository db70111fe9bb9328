//! REST client for the receipt backend
//!
//! Thin typed wrapper over `reqwest`. Every call attaches the bearer token
//! when one is set and maps failures onto the crate error taxonomy:
//!
//! - connection failures and timeouts become `Error::Network`
//! - 401 becomes `Error::Unauthorized` (the caller owns the logout)
//! - other non-success statuses become `Error::Api` with the server's message
//! - undecodable success bodies become `Error::Parse`

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::admin::AdminAnalytics;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    Attachment, LoginRequest, LoginResponse, MessageResponse, Page, Receipt, ReceiptDraft,
    ReceiptListing, RegisterRequest, Role, SearchQuery, User,
};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url` (including the `/api` prefix)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    // ========== Auth ==========

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest { email, password };
        let response = self.send(self.request_json(Method::POST, "/auth/login", &body)).await?;
        read_json(response).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let body = RegisterRequest {
            name,
            email,
            password,
            role: Role::User,
        };
        let response = self
            .send(self.request_json(Method::POST, "/auth/register", &body))
            .await?;
        read_json(response).await
    }

    pub async fn current_user(&self) -> Result<User> {
        let response = self.send(self.request(Method::GET, "/users/me")).await?;
        read_json(response).await
    }

    // ========== Receipts ==========

    /// Fetch one page of the current user's receipts
    pub async fn list_receipts(&self, page: u32, size: u32) -> Result<Page<Receipt>> {
        let request = self
            .request(Method::GET, "/receipts")
            .query(&[("page", page), ("size", size)]);
        let response = self.send(request).await?;
        let listing: ReceiptListing = read_json(response).await?;
        Ok(listing.into_page())
    }

    pub async fn get_receipt(&self, id: i64) -> Result<Receipt> {
        let response = self
            .send(self.request(Method::GET, &format!("/receipts/{}", id)))
            .await?;
        read_json(response).await
    }

    /// Server-side search (independent of the client-side filter)
    pub async fn search_receipts(&self, query: &SearchQuery) -> Result<Page<Receipt>> {
        let request = self
            .request(Method::GET, "/receipts/search")
            .query(&query.to_pairs());
        let response = self.send(request).await?;
        let listing: ReceiptListing = read_json(response).await?;
        Ok(listing.into_page())
    }

    pub async fn create_receipt(
        &self,
        draft: &ReceiptDraft,
        attachment: Option<&Attachment>,
    ) -> Result<Receipt> {
        let form = receipt_form(draft, attachment)?;
        let request = self.request(Method::POST, "/receipts").multipart(form);
        let response = self.send(request).await?;
        read_json(response).await
    }

    pub async fn update_receipt(
        &self,
        id: i64,
        draft: &ReceiptDraft,
        attachment: Option<&Attachment>,
    ) -> Result<Receipt> {
        let form = receipt_form(draft, attachment)?;
        let request = self
            .request(Method::PUT, &format!("/receipts/{}", id))
            .multipart(form);
        let response = self.send(request).await?;
        read_json(response).await
    }

    pub async fn delete_receipt(&self, id: i64) -> Result<()> {
        let response = self
            .send(self.request(Method::DELETE, &format!("/receipts/{}", id)))
            .await?;
        read_ack(response).await
    }

    // ========== Admin ==========

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let response = self.send(self.request(Method::GET, "/admin/users")).await?;
        read_json(response).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let response = self
            .send(self.request(Method::DELETE, &format!("/admin/users/{}", id)))
            .await?;
        read_ack(response).await
    }

    pub async fn analytics(&self) -> Result<AdminAnalytics> {
        let response = self
            .send(self.request(Method::GET, "/admin/analytics"))
            .await?;
        read_json(response).await
    }

    // ========== Plumbing ==========

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path));
        match self.token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> RequestBuilder {
        self.request(method, path).json(body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "API request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| self.map_send_error(e))?;

        debug!(status = response.status().as_u16(), "API response");

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: error_message(status, &body),
            });
        }

        Ok(response)
    }

    fn map_send_error(&self, error: reqwest::Error) -> Error {
        if error.is_connect() {
            Error::Network(format!(
                "{}. Please make sure the backend is running",
                self.base_url
            ))
        } else if error.is_timeout() {
            Error::Network(format!("request to {} timed out", self.base_url))
        } else {
            Error::Http(error)
        }
    }
}

/// Decode a success body
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| Error::Parse(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| Error::Parse(e.to_string()))
}

/// Drain a success body that carries no data (204 or a message object)
async fn read_ack(response: Response) -> Result<()> {
    let body = response.text().await.unwrap_or_default();
    if let Ok(ack) = serde_json::from_str::<MessageResponse>(&body) {
        if !ack.message.is_empty() {
            debug!(message = %ack.message, "Server acknowledged");
        }
    }
    Ok(())
}

/// Multipart body: a JSON `receipt` part plus an optional `file` part
fn receipt_form(draft: &ReceiptDraft, attachment: Option<&Attachment>) -> Result<Form> {
    let json = serde_json::to_string(draft)?;
    let mut form = Form::new().part("receipt", Part::text(json).mime_str("application/json")?);
    if let Some(file) = attachment {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        form = form.part("file", part);
    }
    Ok(form)
}

/// Build a user-facing message from an error response body
///
/// Preference order: validation `errors` (joined), `error`, `message`,
/// then a generic status line.
pub fn error_message(status: u16, body: &str) -> String {
    let fallback = format!("HTTP error: status {}", status);
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback;
    };

    match value.get("errors") {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => {
            return items.iter().map(value_text).collect::<Vec<_>>().join(", ");
        }
        Some(serde_json::Value::Object(fields)) if !fields.is_empty() => {
            return fields.values().map(value_text).collect::<Vec<_>>().join(", ");
        }
        _ => {}
    }

    for key in ["error", "message"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return text.to_string();
            }
        }
    }

    fallback
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
