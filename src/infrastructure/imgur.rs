//! Imgur 호환 이미지 업로드 구현.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::application::ports::ImageUploader;
use crate::domain::errors::Cancelled;

pub struct ImgurUploader {
    client: Client,
    api_base: String,
}

impl ImgurUploader {
    pub fn new(api_base: &str) -> Self {
        // TLS 설정 실패 등 예외 상황에서는 기본 클라이언트로 폴백한다.
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn upload_inner(&self, path: &Path, client_id: &str) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "map.png".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = Form::new().part("image", part).text("type", "file");

        let resp = self
            .client
            .post(format!("{}/3/image", self.api_base))
            .header("Authorization", format!("Client-ID {client_id}"))
            .header("User-Agent", "mapdiffbot")
            .multipart(form)
            .send()
            .await
            .context("imgur: failed to upload image")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("imgur: failed to read upload response body")?;
        if !status.is_success() {
            bail!("imgur: upload failed ({status}): {body}");
        }

        let parsed: UploadResponse =
            serde_json::from_str(&body).context("imgur: invalid upload JSON")?;
        Ok(parsed.data.link)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    link: String,
}

/// `"<id>/<secret>"`에서 클라이언트 ID를 꺼낸다. 익명 업로드에는 ID만 필요하다.
fn client_id(credentials: &str) -> Result<&str> {
    match credentials.split_once('/') {
        Some((id, _secret)) if !id.trim().is_empty() => Ok(id.trim()),
        _ => bail!("upload credentials must be formatted as <id>/<secret>"),
    }
}

#[async_trait]
impl ImageUploader for ImgurUploader {
    async fn upload(
        &self,
        path: &Path,
        credentials: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let client_id = client_id(credentials)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled.into()),
            result = self.upload_inner(path, client_id) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_credential_pair() {
        assert_eq!(client_id("abc/def").unwrap(), "abc");
        assert!(client_id("abc").is_err());
        assert!(client_id("/def").is_err());
    }

    #[test]
    fn parses_link_from_response() {
        let parsed: UploadResponse = serde_json::from_str(
            r#"{ "data": { "id": "x", "link": "https://i.imgur.com/x.png" }, "success": true }"#,
        )
        .unwrap();
        assert_eq!(parsed.data.link, "https://i.imgur.com/x.png");
    }

    #[tokio::test]
    async fn cancelled_upload_is_reported_as_cancellation() {
        let uploader = ImgurUploader::new("http://127.0.0.1:9");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"png").unwrap();

        let err = uploader.upload(&path, "id/secret", &cancel).await.unwrap_err();
        assert!(crate::domain::errors::is_cancellation(&err));
    }
}
