use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::schema::RemoteSession;

use super::SessionDirectory;

/// Session directory backed by the DevTools HTTP listing (`GET /json`).
pub struct DevToolsDirectory {
    client: reqwest::Client,
    list_url: String,
}

impl DevToolsDirectory {
    /// Creates a directory for the given endpoint base URL
    /// (e.g. `http://127.0.0.1:18800`).
    ///
    /// The endpoint is always local, so proxy settings from the
    /// environment are ignored.
    pub fn new(endpoint: &str, request_timeout: Duration) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(request_timeout)
            .no_proxy()
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                log::warn!("devtools http client setup failed, using defaults: {e}");
                reqwest::Client::new()
            }
        };

        Self {
            client,
            list_url: format!("{}/json", endpoint.trim_end_matches('/')),
        }
    }

    async fn fetch_listing(&self) -> Result<Vec<Value>, reqwest::Error> {
        self.client
            .get(&self.list_url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await
    }
}

#[async_trait]
impl SessionDirectory for DevToolsDirectory {
    async fn list_sessions(&self) -> Vec<RemoteSession> {
        match self.fetch_listing().await {
            Ok(entries) => {
                let sessions = parse_sessions(entries);
                log::debug!("{} lists {} page sessions", self.list_url, sessions.len());
                sessions
            }
            Err(e) => {
                log::warn!("devtools listing at {} unavailable: {e}", self.list_url);
                Vec::new()
            }
        }
    }
}

/// Keeps the listing entries that are attachable pages.
///
/// Service workers, iframes and extension backgrounds are skipped, as
/// are pages that already have a debugger attached (the listing then
/// omits `webSocketDebuggerUrl`).
pub fn parse_sessions(entries: Vec<Value>) -> Vec<RemoteSession> {
    entries
        .into_iter()
        .filter(|e| e.get("type").and_then(Value::as_str).is_none_or(|t| t == "page"))
        .filter_map(|e| serde_json::from_value(e).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one HTTP response and returns the base URL.
    async fn serve_once(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });

        format!("http://{addr}")
    }

    fn listing() -> String {
        json!([
            {
                "id": "SW1",
                "type": "service_worker",
                "url": "https://sell.smartstore.naver.com/sw.js",
                "webSocketDebuggerUrl": "ws://127.0.0.1/devtools/page/SW1"
            },
            {
                "id": "P1",
                "type": "page",
                "title": "카페24 관리자",
                "url": "https://mall.cafe24.com/admin/php/shop1/s_new/shipped_begin_list.php",
                "webSocketDebuggerUrl": "ws://127.0.0.1/devtools/page/P1"
            },
            {
                "id": "P2",
                "type": "page",
                "title": "스마트스토어센터",
                "url": "https://sell.smartstore.naver.com/#/home/dashboard",
                "webSocketDebuggerUrl": "ws://127.0.0.1/devtools/page/P2"
            },
            {
                "id": "P3",
                "type": "page",
                "title": "attached elsewhere",
                "url": "https://wing.coupang.com/"
            }
        ])
        .to_string()
    }

    #[test]
    fn test_parse_sessions_keeps_attachable_pages() {
        let entries: Vec<Value> = serde_json::from_str(&listing()).unwrap();
        let sessions = parse_sessions(entries);
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn test_find_session_by_substring() {
        let base = serve_once("200 OK", listing()).await;
        let directory = DevToolsDirectory::new(&base, Duration::from_secs(2));

        let session = directory
            .find_session("sell.smartstore.naver.com")
            .await
            .unwrap();
        assert_eq!(session.id, "P2");
        assert_eq!(session.title, "스마트스토어센터");
        assert_eq!(session.control_endpoint, "ws://127.0.0.1/devtools/page/P2");
    }

    #[tokio::test]
    async fn test_find_session_no_match() {
        let base = serve_once("200 OK", listing()).await;
        let directory = DevToolsDirectory::new(&base, Duration::from_secs(2));

        assert!(directory.find_session("wing.coupang.com").await.is_none());
    }

    #[tokio::test]
    async fn test_error_status_gives_empty_list() {
        let base = serve_once("500 Internal Server Error", "{}".to_string()).await;
        let directory = DevToolsDirectory::new(&base, Duration::from_secs(2));

        assert!(directory.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_gives_empty_list() {
        let base = serve_once("200 OK", "<html>not json</html>".to_string()).await;
        let directory = DevToolsDirectory::new(&base, Duration::from_secs(2));

        assert!(directory.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_gives_empty_list() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let directory = DevToolsDirectory::new(&format!("http://{addr}/"), Duration::from_secs(2));
        assert!(directory.list_sessions().await.is_empty());
    }
}
