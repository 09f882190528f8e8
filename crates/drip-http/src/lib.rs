//! REST client for the course backend.
//!
//! Implements [`CourseBackend`] over the section, lesson, and drip services
//! using [`reqwest`]:
//!
//! - `GET {base}/courses/{courseId}/sections`
//! - `GET {base}/sections/{sectionId}/lessons`
//! - `GET {base}/courses/{courseId}/drips`
//! - `PUT {base}/courses/{courseId}/drips`

use std::time::Duration;

use async_trait::async_trait;
use drip_core::{
    BackendErrorKind, Config, CourseBackend, DripEdge, DripError, LessonRef, LessonType, Result,
    Section,
};
use serde::Deserialize;
use tracing::debug;

/// HTTP client for one course backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

// ============================================================================
// Wire records
// ============================================================================

/// Backend ids arrive as JSON numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SectionRecord {
    id: RawId,
    #[serde(default, alias = "name")]
    title: String,
}

impl From<SectionRecord> for Section {
    fn from(record: SectionRecord) -> Self {
        Self::new(String::from(record.id), record.title)
    }
}

#[derive(Debug, Deserialize)]
struct LessonRecord {
    id: RawId,
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default, rename = "type", alias = "lessonType")]
    kind: LessonType,
}

impl From<LessonRecord> for LessonRef {
    fn from(record: LessonRecord) -> Self {
        Self::new(String::from(record.id), record.title, record.kind)
    }
}

// ============================================================================
// Client
// ============================================================================

impl HttpBackend {
    /// Creates a client from the editor configuration.
    ///
    /// # Errors
    ///
    /// Returns `DripError::Backend` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.request_timeout_secs)))
            .build()
            .map_err(|e| DripError::backend(BackendErrorKind::Network, e.to_string()))?;
        Ok(Self::with_client(
            client,
            config.backend_base(),
            config.api_token.clone(),
        ))
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// Base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a request for `{base}/{segments...}`.
    ///
    /// Each segment is percent-encoded, so ids containing `/` or `?` stay
    /// inside their own path segment.
    fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            DripError::backend(
                BackendErrorKind::Network,
                format!("invalid backend URL '{}': {e}", self.base_url),
            )
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                DripError::backend(
                    BackendErrorKind::Network,
                    format!("backend URL '{}' cannot carry a path", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);

        debug!(%method, %url, "Backend request");
        let builder = self.client.request(method, url);
        Ok(match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let response = self
            .request(reqwest::Method::GET, segments)?
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_response(response).await
    }
}

/// Maps a transport error to a backend error.
fn map_reqwest_error(err: reqwest::Error) -> DripError {
    let kind = if err.is_timeout() {
        BackendErrorKind::Timeout
    } else if err.is_decode() {
        BackendErrorKind::Decode
    } else if let Some(status) = err.status() {
        BackendErrorKind::Status(status.as_u16())
    } else {
        BackendErrorKind::Network
    };
    DripError::backend(kind, err.to_string())
}

/// Returns the response unchanged on success, or a `Status` error carrying
/// the code and body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(DripError::backend(
            BackendErrorKind::Status(status.as_u16()),
            body,
        ));
    }
    Ok(response)
}

/// Parses a successful JSON response body into the expected type.
async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| DripError::backend(BackendErrorKind::Decode, e.to_string()))
}

#[async_trait]
impl CourseBackend for HttpBackend {
    async fn fetch_sections(&self, course_id: &str) -> Result<Vec<Section>> {
        let records: Vec<SectionRecord> = self
            .get_json(&["courses", course_id, "sections"])
            .await?;
        Ok(records.into_iter().map(Section::from).collect())
    }

    async fn fetch_lessons(&self, section_id: &str) -> Result<Vec<LessonRef>> {
        let records: Vec<LessonRecord> = self
            .get_json(&["sections", section_id, "lessons"])
            .await?;
        Ok(records.into_iter().map(LessonRef::from).collect())
    }

    async fn fetch_drips(&self, course_id: &str) -> Result<Vec<DripEdge>> {
        self.get_json(&["courses", course_id, "drips"]).await
    }

    async fn update_drips(&self, course_id: &str, edges: &[DripEdge]) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, &["courses", course_id, "drips"])?
            .json(edges)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}
