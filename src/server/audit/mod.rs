//! Structured audit trail for state-mutating operations.
//!
//! Core services emit one [`AuditEvent`] per mutation through the [`AuditSink`] trait.
//! Delivery is the sink's concern: [`TracingAuditSink`] writes structured log lines and
//! [`discord::DiscordAuditSink`] additionally forwards events to configured log channels.
//! Recording must never fail or block the operation that emitted the event.

pub mod discord;

use chrono::{DateTime, Utc};
use std::fmt;

/// Log channel an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditChannel {
    /// Actions users take on their own resources.
    User,
    /// Moderator and administrator actions.
    Mod,
    /// Balance and treasury movements.
    Audit,
    /// Failures needing operator attention.
    Error,
}

impl fmt::Display for AuditChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Mod => "mod",
            Self::Audit => "audit",
            Self::Error => "error",
        })
    }
}

/// One state-mutating operation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub channel: AuditChannel,
    /// Dotted operation name, e.g. `server.create`.
    pub action: &'static str,
    /// Discord ID of the user who caused the event; `None` for background jobs.
    pub actor: Option<u64>,
    /// What was acted upon, e.g. `server:12` or `guild:my-guild`.
    pub target: String,
    /// Ordered key/value details such as before and after values.
    pub details: Vec<(&'static str, String)>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(channel: AuditChannel, action: &'static str, target: impl Into<String>) -> Self {
        Self {
            channel,
            action,
            actor: None,
            target: target.into(),
            details: Vec::new(),
            at: Utc::now(),
        }
    }

    pub fn actor(mut self, actor: u64) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn detail(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.details.push((key, value.to_string()));
        self
    }

    /// Looks up a detail value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Single-line rendering used for log channels.
    pub fn summary(&self) -> String {
        let actor = self
            .actor
            .map(|id| format!("<@{}>", id))
            .unwrap_or_else(|| "system".to_string());
        let details = self
            .details
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        if details.is_empty() {
            format!("[{}] {} {} {}", self.channel, self.action, actor, self.target)
        } else {
            format!(
                "[{}] {} {} {} {}",
                self.channel, self.action, actor, self.target, details
            )
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes audit events as structured tracing records.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let summary = event.summary();
        match event.channel {
            AuditChannel::Error => tracing::error!(
                channel = %event.channel,
                action = event.action,
                actor = ?event.actor,
                target = %event.target,
                "{}",
                summary
            ),
            _ => tracing::info!(
                channel = %event.channel,
                action = event.action,
                actor = ?event.actor,
                target = %event.target,
                "{}",
                summary
            ),
        }
    }
}

/// Keeps every event in memory for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: std::sync::Mutex<Vec<AuditEvent>>,
}

#[cfg(test)]
impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events with the given action name, in emission order.
    pub fn with_action(&self, action: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.action == action)
            .collect()
    }
}

#[cfg(test)]
impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}
