//! Script execution over a page's DevTools WebSocket.
//!
//! One execution is one connection:
//! open → `Runtime.enable` → `Runtime.evaluate` → matching response → close.
//!
//! Requests carry increasing ids. Frames with any other id, and all
//! events, are skipped while waiting. Dropping an in-flight execution
//! drops the socket, which closes the connection.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{error::ExecutionError, schema::RemoteSession};

use super::ScriptExecutor;

type PageSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Script executor speaking the Chrome DevTools Protocol.
pub struct DevToolsChannel {
    /// Bound for a whole execution, connection setup included
    timeout: Duration,
}

impl DevToolsChannel {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ScriptExecutor for DevToolsChannel {
    async fn execute(&self, session: &RemoteSession, script: &str) -> Result<Value, ExecutionError> {
        match tokio::time::timeout(self.timeout, evaluate(&session.control_endpoint, script)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutionError::timeout(format!(
                "no evaluation result from page {} within {:?}",
                session.id, self.timeout
            ))),
        }
    }
}

async fn evaluate(endpoint: &str, script: &str) -> Result<Value, ExecutionError> {
    let (socket, _) = connect_async(endpoint)
        .await
        .map_err(|e| ExecutionError::transport(format!("connect {endpoint}: {e}")))?;

    let mut conn = PageConnection { socket, next_id: 1 };

    let result = conn.evaluate(script).await;
    conn.close().await;

    evaluation_value(result?)
}

/// Build the `Runtime.evaluate` parameters.
///
/// `awaitPromise` lets scripts return a promise; `returnByValue` asks
/// for the JSON value instead of a remote object reference.
pub fn evaluate_params(script: &str) -> Value {
    json!({
        "expression": script,
        "awaitPromise": true,
        "returnByValue": true,
    })
}

/// Extract the script value from a `Runtime.evaluate` result.
///
/// A page-side exception becomes `ScriptException` with the raw
/// `exceptionDetails` as payload. A script that returns `undefined`
/// has no `value` and yields `Null`.
pub fn evaluation_value(result: Value) -> Result<Value, ExecutionError> {
    if let Some(details) = result.get("exceptionDetails") {
        return Err(ExecutionError::script_exception(details.to_string()));
    }

    Ok(result
        .get("result")
        .and_then(|r| r.get("value"))
        .cloned()
        .unwrap_or(Value::Null))
}

struct PageConnection {
    socket: PageSocket,
    next_id: u64,
}

impl PageConnection {
    async fn evaluate(&mut self, script: &str) -> Result<Value, ExecutionError> {
        self.request("Runtime.enable", json!({})).await?;
        self.request("Runtime.evaluate", evaluate_params(script)).await
    }

    /// Send one command and wait for the response carrying its id.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value, ExecutionError> {
        let id = self.next_id;
        self.next_id += 1;

        let frame = json!({ "id": id, "method": method, "params": params });
        log::debug!("cdp -> id={id} method={method}");

        self.socket
            .send(Message::Text(frame.to_string().into()))
            .await
            .map_err(|e| ExecutionError::transport(format!("send {method}: {e}")))?;

        loop {
            let msg = match self.socket.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    return Err(ExecutionError::transport(format!(
                        "read while awaiting {method}: {e}"
                    )));
                }
                None => {
                    return Err(ExecutionError::transport(format!(
                        "connection closed while awaiting {method}"
                    )));
                }
            };

            let text = match msg {
                Message::Text(t) => t.as_str().to_owned(),
                Message::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
                Message::Close(frame) => {
                    return Err(ExecutionError::transport(format!(
                        "page closed the connection while awaiting {method}: {frame:?}"
                    )));
                }
                // ping / pong
                _ => continue,
            };

            let value: Value = serde_json::from_str(&text)
                .map_err(|e| ExecutionError::transport(format!("malformed frame ({e}): {text}")))?;

            match value.get("id").and_then(Value::as_u64) {
                Some(resp_id) if resp_id == id => return command_result(value),
                Some(other) => log::debug!("cdp <- ignoring response for id={other}"),
                None => log::trace!("cdp <- event {}", value["method"]),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            log::debug!("cdp close: {e}");
        }
    }
}

/// Split a correlated response into its result or a protocol error.
fn command_result(mut response: Value) -> Result<Value, ExecutionError> {
    if let Some(err) = response.get("error") {
        return Err(ExecutionError::transport(format!("protocol error: {err}")));
    }
    Ok(response
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionKind;
    use tokio::net::TcpListener;

    /// Reply frames for one request: (id, method, params) -> frames.
    /// A `"CLOSE"` frame closes the socket instead of being sent.
    type Behaviour = fn(u64, &str, &Value) -> Vec<String>;

    /// Accepts one WebSocket client and answers according to `behaviour`.
    async fn fake_page(behaviour: Behaviour) -> RemoteSession {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            while let Some(Ok(msg)) = ws.next().await {
                let Message::Text(text) = msg else { continue };
                let req: Value = serde_json::from_str(&text).unwrap();
                let id = req["id"].as_u64().unwrap();
                let method = req["method"].as_str().unwrap().to_string();

                for reply in behaviour(id, &method, &req["params"]) {
                    if reply == "CLOSE" {
                        let _ = ws.close(None).await;
                        return;
                    }
                    let _ = ws.send(Message::Text(reply.into())).await;
                }
            }
        });

        RemoteSession {
            id: "TEST".into(),
            url: "https://mall.cafe24.com/admin".into(),
            title: "test".into(),
            control_endpoint: format!("ws://{addr}/devtools/page/TEST"),
        }
    }

    fn ack(id: u64) -> String {
        json!({ "id": id, "result": {} }).to_string()
    }

    #[test]
    fn test_evaluate_params() {
        let params = evaluate_params("document.title");
        assert_eq!(params["expression"], "document.title");
        assert_eq!(params["awaitPromise"], true);
        assert_eq!(params["returnByValue"], true);
    }

    #[test]
    fn test_evaluation_value_missing_value_is_null() {
        let result = json!({ "result": { "type": "undefined" } });
        assert_eq!(evaluation_value(result).unwrap(), Value::Null);
    }

    #[test]
    fn test_command_result_protocol_error() {
        let response = json!({ "id": 3, "error": { "code": -32601, "message": "'Runtime.evaluate' wasn't found" } });
        let err = command_result(response).unwrap_err();
        assert_eq!(err.kind, ExecutionKind::Transport);
        assert!(err.payload.contains("-32601"));
    }

    #[tokio::test]
    async fn test_execute_correlates_by_id() {
        let session = fake_page(|id, method, params| match method {
            "Runtime.enable" => vec![ack(id)],
            "Runtime.evaluate" => {
                assert_eq!(params["awaitPromise"], true);
                assert_eq!(params["returnByValue"], true);
                vec![
                    json!({ "method": "Runtime.consoleAPICalled", "params": {} }).to_string(),
                    json!({ "id": id + 100, "result": { "result": { "value": "stale" } } })
                        .to_string(),
                    json!({ "id": id, "result": { "result": { "type": "object", "value": [{ "order_id": "A-1" }] } } })
                        .to_string(),
                ]
            }
            _ => Vec::new(),
        })
        .await;

        let channel = DevToolsChannel::new(Duration::from_secs(5));
        let value = channel.execute(&session, "collect()").await.unwrap();
        assert_eq!(value, json!([{ "order_id": "A-1" }]));
    }

    #[tokio::test]
    async fn test_execute_script_exception() {
        let session = fake_page(|id, method, _| match method {
            "Runtime.enable" => vec![ack(id)],
            _ => vec![json!({
                "id": id,
                "result": {
                    "result": { "type": "object", "subtype": "error" },
                    "exceptionDetails": { "text": "Uncaught TypeError: rows is null" }
                }
            })
            .to_string()],
        })
        .await;

        let channel = DevToolsChannel::new(Duration::from_secs(5));
        let err = channel.execute(&session, "boom()").await.unwrap_err();
        assert_eq!(err.kind, ExecutionKind::ScriptException);
        assert!(err.payload.contains("rows is null"));
    }

    #[tokio::test]
    async fn test_execute_times_out_without_response() {
        let session = fake_page(|id, method, _| match method {
            "Runtime.enable" => vec![ack(id)],
            _ => Vec::new(),
        })
        .await;

        let channel = DevToolsChannel::new(Duration::from_millis(200));
        let err = channel.execute(&session, "never()").await.unwrap_err();
        assert_eq!(err.kind, ExecutionKind::Timeout);
    }

    #[tokio::test]
    async fn test_execute_connection_dropped() {
        let session = fake_page(|_, _, _| vec!["CLOSE".to_string()]).await;

        let channel = DevToolsChannel::new(Duration::from_secs(5));
        let err = channel.execute(&session, "1 + 1").await.unwrap_err();
        assert_eq!(err.kind, ExecutionKind::Transport);
    }

    #[tokio::test]
    async fn test_execute_malformed_frame() {
        let session = fake_page(|_, _, _| vec!["not json at all".to_string()]).await;

        let channel = DevToolsChannel::new(Duration::from_secs(5));
        let err = channel.execute(&session, "1 + 1").await.unwrap_err();
        assert_eq!(err.kind, ExecutionKind::Transport);
        assert!(err.payload.contains("not json at all"));
    }

    #[tokio::test]
    async fn test_execute_unreachable_page() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session = RemoteSession {
            id: "GONE".into(),
            url: "https://wing.coupang.com/".into(),
            title: String::new(),
            control_endpoint: format!("ws://{addr}/devtools/page/GONE"),
        };

        let channel = DevToolsChannel::new(Duration::from_secs(5));
        let err = channel.execute(&session, "1 + 1").await.unwrap_err();
        assert_eq!(err.kind, ExecutionKind::Transport);
    }
}
