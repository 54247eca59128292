//! Backend REST API.
//!
//! [`HelpdeskApi`] is the seam between the page controllers and the backend.
//! [`HttpApi`] implements it over `reqwest`; tests substitute in-memory
//! implementations.
//!
//! # Endpoints
//!
//! | Method | Path | Body → Response |
//! |--------|------|-----------------|
//! | `POST` | `/api/search` | [`SearchRequest`] → [`SearchResponse`] |
//! | `POST` | `/api/tickets` | [`NewTicket`] → [`CreatedTicket`] |
//! | `GET`  | `/api/tickets` | → `Vec<Ticket>` |
//! | `GET`  | `/api/tickets/{id}` | → [`Ticket`] |
//! | `POST` | `/api/tickets/{id}/solution` | [`SolutionAttachment`] → status |
//! | `POST` | `/api/tickets/{id}/comment` | [`CommentRequest`] → status |
//!
//! Failed responses may carry `{"error": "..."}`; that text is surfaced
//! through [`ApiError::detail`].
//!
//! No retries and no timeouts beyond the transport defaults: a failed request
//! is reported once.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::models::{
    CommentRequest, CreatedTicket, ErrorEnvelope, NewTicket, SearchRequest, SearchResponse,
    SolutionAttachment, Ticket,
};

/// Failure of a single backend request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {}", .detail.as_deref().unwrap_or("no details"))]
    Status { status: u16, detail: Option<String> },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The backend's own error message, when the response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HelpdeskApi Trait
// ═══════════════════════════════════════════════════════════════════════

/// Operations the search and service-desk pages need from the backend.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use helpdesk_client::api::{ApiError, HelpdeskApi};
/// use helpdesk_client::models::*;
///
/// struct Offline;
///
/// #[async_trait]
/// impl HelpdeskApi for Offline {
///     async fn search(&self, _r: &SearchRequest) -> Result<SearchResponse, ApiError> {
///         Ok(SearchResponse::default())
///     }
///     async fn create_ticket(&self, _t: &NewTicket) -> Result<CreatedTicket, ApiError> {
///         Err(ApiError::Status { status: 503, detail: None })
///     }
///     async fn attach_solution(&self, _id: u64, _a: &SolutionAttachment) -> Result<(), ApiError> {
///         Ok(())
///     }
///     async fn list_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
///         Ok(vec![])
///     }
///     async fn get_ticket(&self, _id: u64) -> Result<Ticket, ApiError> {
///         Err(ApiError::Status { status: 404, detail: Some("Ticket not found".into()) })
///     }
///     async fn add_comment(&self, _id: u64, _c: &CommentRequest) -> Result<(), ApiError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait HelpdeskApi: Send + Sync {
    /// `POST /api/search`.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;

    /// `POST /api/tickets`. Returns the server-assigned id.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<CreatedTicket, ApiError>;

    /// `POST /api/tickets/{id}/solution`.
    async fn attach_solution(
        &self,
        ticket_id: u64,
        attachment: &SolutionAttachment,
    ) -> Result<(), ApiError>;

    /// `GET /api/tickets`. Always the full collection.
    async fn list_tickets(&self) -> Result<Vec<Ticket>, ApiError>;

    /// `GET /api/tickets/{id}`.
    async fn get_ticket(&self, ticket_id: u64) -> Result<Ticket, ApiError>;

    /// `POST /api/tickets/{id}/comment`.
    async fn add_comment(&self, ticket_id: u64, comment: &CommentRequest)
        -> Result<(), ApiError>;
}

// ═══════════════════════════════════════════════════════════════════════
// HTTP implementation
// ═══════════════════════════════════════════════════════════════════════

pub const SEARCH_PATH: &str = "/api/search";
pub const TICKETS_PATH: &str = "/api/tickets";

pub fn ticket_path(ticket_id: u64) -> String {
    format!("{}/{}", TICKETS_PATH, ticket_id)
}

pub fn ticket_solution_path(ticket_id: u64) -> String {
    format!("{}/{}/solution", TICKETS_PATH, ticket_id)
}

pub fn ticket_comment_path(ticket_id: u64) -> String {
    format!("{}/{}/comment", TICKETS_PATH, ticket_id)
}

/// [`HelpdeskApi`] over HTTP with a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("hdc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.backend.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            return Err(Self::to_status_error(resp).await);
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn expect_success(resp: reqwest::Response) -> Result<(), ApiError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::to_status_error(resp).await)
        }
    }

    async fn to_status_error(resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error)
            .filter(|e| !e.is_empty());
        tracing::debug!(status, detail = ?detail, "backend request failed");
        ApiError::Status { status, detail }
    }
}

#[async_trait]
impl HelpdeskApi for HttpApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        let resp = self
            .http
            .post(self.url(SEARCH_PATH))
            .json(request)
            .send()
            .await?;
        Self::parse_json(resp).await
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<CreatedTicket, ApiError> {
        let resp = self
            .http
            .post(self.url(TICKETS_PATH))
            .json(ticket)
            .send()
            .await?;
        Self::parse_json(resp).await
    }

    async fn attach_solution(
        &self,
        ticket_id: u64,
        attachment: &SolutionAttachment,
    ) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url(&ticket_solution_path(ticket_id)))
            .json(attachment)
            .send()
            .await?;
        Self::expect_success(resp).await
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        let resp = self.http.get(self.url(TICKETS_PATH)).send().await?;
        Self::parse_json(resp).await
    }

    async fn get_ticket(&self, ticket_id: u64) -> Result<Ticket, ApiError> {
        let resp = self
            .http
            .get(self.url(&ticket_path(ticket_id)))
            .send()
            .await?;
        Self::parse_json(resp).await
    }

    async fn add_comment(
        &self,
        ticket_id: u64,
        comment: &CommentRequest,
    ) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url(&ticket_comment_path(ticket_id)))
            .json(comment)
            .send()
            .await?;
        Self::expect_success(resp).await
    }
}
