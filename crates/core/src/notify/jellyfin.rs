//! Jellyfin library rescan client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::config::MediaCenterConfig;
use super::error::NotifyError;
use super::traits::MediaCenterNotifier;

/// Starts Jellyfin's "scan all libraries" scheduled task.
pub struct JellyfinNotifier {
    client: Client,
    base_url: String,
    api_key: String,
    scan_task_id: String,
}

impl JellyfinNotifier {
    pub fn new(config: &MediaCenterConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Creates a notifier around an existing HTTP client.
    pub fn with_client(client: Client, config: &MediaCenterConfig) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            scan_task_id: config.scan_task_id.clone(),
        }
    }

    /// URL of the scheduled-task trigger (without the API key).
    pub fn scan_url(&self) -> String {
        format!(
            "{}/ScheduledTasks/Running/{}",
            self.base_url,
            urlencoding::encode(&self.scan_task_id)
        )
    }
}

#[async_trait]
impl MediaCenterNotifier for JellyfinNotifier {
    fn name(&self) -> &str {
        "jellyfin"
    }

    async fn rescan_library(&self) -> Result<(), NotifyError> {
        let url = self.scan_url();
        debug!("Triggering Jellyfin library scan at {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one request, answers with `status_line`, and returns the request head.
    async fn one_shot_server(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    fn local_notifier(url: String, api_key: &str) -> JellyfinNotifier {
        let client = Client::builder().no_proxy().build().unwrap();
        JellyfinNotifier::with_client(client, &MediaCenterConfig::new(url, api_key))
    }

    #[test]
    fn test_scan_url() {
        let notifier =
            JellyfinNotifier::new(&MediaCenterConfig::new("http://jellyfin:8096/", "key")).unwrap();
        assert_eq!(
            notifier.scan_url(),
            "http://jellyfin:8096/ScheduledTasks/Running/7738148ffcd07979c7ceb148e06b3aed"
        );
        assert_eq!(notifier.name(), "jellyfin");
    }

    #[tokio::test]
    async fn test_rescan_posts_to_scheduled_task() {
        let (url, server) = one_shot_server("HTTP/1.1 204 No Content").await;
        let notifier = local_notifier(url, "secret");

        notifier.rescan_library().await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "POST /ScheduledTasks/Running/7738148ffcd07979c7ceb148e06b3aed?api_key=secret "
        ));
    }

    #[tokio::test]
    async fn test_rescan_error_status() {
        let (url, server) = one_shot_server("HTTP/1.1 401 Unauthorized").await;
        let notifier = local_notifier(url, "wrong");

        let err = notifier.rescan_library().await.unwrap_err();
        assert!(matches!(err, NotifyError::Status { status: 401, .. }));
        server.await.unwrap();
    }
}
