//! Browser remote-debugging access.
//!
//! This module provides:
//! - `SessionDirectory`: discovery of open pages on the DevTools endpoint
//! - `ScriptExecutor`: evaluation of an extraction script inside one page
//!
//! Both are constructed fresh for every collection cycle and handed to
//! collectors explicitly. Nothing here keeps process-wide client state.

pub mod channel;
pub mod directory;

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::ExecutionError, schema::RemoteSession};

pub use channel::DevToolsChannel;
pub use directory::DevToolsDirectory;

/// Lists the pages exposed by a remote-debugging endpoint.
///
/// CONTRACT:
/// - Never fails. An unreachable endpoint, an error status or an
///   unreadable body all produce an empty list.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    async fn list_sessions(&self) -> Vec<RemoteSession>;

    /// First session whose URL contains `url_pattern`, in endpoint order.
    async fn find_session(&self, url_pattern: &str) -> Option<RemoteSession> {
        self.list_sessions()
            .await
            .into_iter()
            .find(|s| s.url.contains(url_pattern))
    }
}

/// Runs a script inside a page and returns its value.
///
/// CONTRACT:
/// - The result is requested by value; scripts resolve their own data.
/// - Implementations never retry. Retry policy belongs to collectors.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(&self, session: &RemoteSession, script: &str) -> Result<Value, ExecutionError>;
}
