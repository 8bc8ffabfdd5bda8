use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode, multipart};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("upload response is missing a file id or url")]
    IncompleteResponse,
}

/// Confirmation from the CDN that a file is stored and addressable.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub file_id: String,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponseBody {
    file_id: Option<String>,
    url: Option<String>,
    name: Option<String>,
}

/// Client for an ImageKit-compatible media upload API. Authenticates with the
/// account private key over HTTP basic auth; the base URL is configurable so
/// tests can point it at a local server.
pub struct MediaClient {
    http: Client,
    base_url: String,
    private_key: String,
}

impl MediaClient {
    pub fn new(base_url: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            private_key: private_key.into(),
        }
    }

    /// Uploads a file and returns the stored id, URL, and assigned name.
    ///
    /// A response without both a file id and a URL counts as a failure even if
    /// the CDN answered 200.
    pub async fn upload(&self, data: Bytes, file_name: &str) -> Result<StoredMedia, MediaError> {
        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(data.to_vec()).file_name(file_name.to_string()),
            )
            .text("fileName", file_name.to_string());

        let response = self
            .http
            .post(format!(
                "{}/api/v1/files/upload",
                self.base_url.trim_end_matches('/')
            ))
            .basic_auth(&self.private_key, None::<&str>)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected { status, body });
        }

        let body: UploadResponseBody = response.json().await?;
        match (body.file_id, body.url) {
            (Some(file_id), Some(url)) if !file_id.is_empty() && !url.is_empty() => {
                debug!("Media stored: {} -> {}", file_id, url);
                Ok(StoredMedia {
                    file_id,
                    url,
                    name: body.name.unwrap_or_else(|| file_name.to_string()),
                })
            }
            _ => Err(MediaError::IncompleteResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_returning(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/upload"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn upload_parses_stored_file() {
        let server = server_returning(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({
                "fileId": "abc",
                "url": "https://cdn.example.com/x.jpg",
                "name": "x.jpg",
            }),
        ))
        .await;

        let client = MediaClient::new(server.uri(), "private-key");
        let stored = client
            .upload(Bytes::from_static(b"jpeg bytes"), "cat.jpg")
            .await
            .unwrap();

        assert_eq!(stored.file_id, "abc");
        assert_eq!(stored.url, "https://cdn.example.com/x.jpg");
        assert_eq!(stored.name, "x.jpg");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server =
            server_returning(ResponseTemplate::new(500).set_body_string("storage exploded")).await;

        let client = MediaClient::new(server.uri(), "private-key");
        let err = client
            .upload(Bytes::from_static(b"bytes"), "cat.jpg")
            .await
            .unwrap_err();

        match err {
            MediaError::Rejected { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "storage exploded");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn response_without_file_id_or_url_is_incomplete() {
        let server = server_returning(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "x.jpg" })),
        )
        .await;

        let client = MediaClient::new(server.uri(), "private-key");
        let err = client
            .upload(Bytes::from_static(b"bytes"), "cat.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::IncompleteResponse));
    }

    #[tokio::test]
    async fn empty_url_is_incomplete() {
        let server = server_returning(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "fileId": "abc", "url": "", "name": "x.jpg" }),
        ))
        .await;

        let client = MediaClient::new(server.uri(), "private-key");
        let err = client
            .upload(Bytes::from_static(b"bytes"), "cat.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::IncompleteResponse));
    }
}
