// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fire-and-forget activity log.
//!
//! `record` never blocks and never fails. Entries are stamped with the
//! acting user at call time and written by a background task; a failed
//! write is reported through tracing and otherwise dropped.

use crate::db::LogSink;
use crate::error::AppError;
use crate::models::log::ANONYMOUS;
use crate::models::{LogEntry, LogKind, SessionState};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

enum LogMessage {
    Entry(LogEntry),
    /// Acknowledged once every earlier entry has been handed to the sink
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct ActivityLogger {
    queue: mpsc::UnboundedSender<LogMessage>,
    session: watch::Receiver<SessionState>,
}

impl ActivityLogger {
    /// Start the writer task. Must be called inside a Tokio runtime.
    pub fn start(sink: Arc<dyn LogSink>, session: watch::Receiver<SessionState>) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(sink, rx));
        Self { queue, session }
    }

    /// Record an action with free-form details.
    pub fn record(&self, action: &str, details: serde_json::Value) {
        tracing::info!(action, %details, "Activity");
        self.enqueue(action, None, details);
    }

    /// Record a failure. Details carry the error message and code.
    pub fn record_error(&self, action: &str, error: &AppError) {
        tracing::warn!(action, error = %error, "Activity failed");
        self.enqueue(
            action,
            Some(LogKind::Error),
            json!({
                "message": error.to_string(),
                "code": error.code(),
            }),
        );
    }

    /// Wait until everything recorded so far has been written (or dropped).
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.queue.send(LogMessage::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    fn enqueue(&self, action: &str, kind: Option<LogKind>, details: serde_json::Value) {
        let user = self
            .session
            .borrow()
            .uid()
            .map(str::to_string)
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let entry = LogEntry {
            action: action.to_string(),
            kind,
            details,
            timestamp: chrono::Utc::now(),
            user,
        };

        if self.queue.send(LogMessage::Entry(entry)).is_err() {
            tracing::warn!(action, "Log writer stopped; entry dropped");
        }
    }
}

async fn run_writer(sink: Arc<dyn LogSink>, mut rx: mpsc::UnboundedReceiver<LogMessage>) {
    while let Some(message) = rx.recv().await {
        match message {
            LogMessage::Entry(entry) => {
                if let Err(e) = sink.append(&entry).await {
                    tracing::warn!(action = %entry.action, error = %e, "Failed to write log entry");
                }
            }
            LogMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}
