//! Forwards audit events to Discord log channels.

use serenity::all::{ChannelId, CreateMessage};
use serenity::http::Http;
use std::sync::Arc;

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink, TracingAuditSink},
    config::LogChannels,
};

/// Audit sink posting each event to the Discord channel configured for its
/// [`AuditChannel`].
///
/// Every event is also written to tracing. Channels without a configured ID are
/// tracing-only. Posting happens on a spawned task; a failed post is logged and
/// otherwise ignored.
pub struct DiscordAuditSink {
    http: Arc<Http>,
    channels: LogChannels,
    tracing: TracingAuditSink,
}

impl DiscordAuditSink {
    pub fn new(http: Arc<Http>, channels: LogChannels) -> Self {
        Self {
            http,
            channels,
            tracing: TracingAuditSink,
        }
    }

    fn channel_for(&self, channel: AuditChannel) -> Option<u64> {
        match channel {
            AuditChannel::User => self.channels.user,
            AuditChannel::Mod => self.channels.moderator,
            AuditChannel::Audit => self.channels.audit,
            AuditChannel::Error => self.channels.error,
        }
    }
}

impl AuditSink for DiscordAuditSink {
    fn record(&self, event: AuditEvent) {
        let target = self.channel_for(event.channel);
        let content = event.summary();
        self.tracing.record(event);

        let Some(channel_id) = target else {
            return;
        };

        let http = self.http.clone();
        tokio::spawn(async move {
            let message = CreateMessage::new().content(content);
            if let Err(e) = ChannelId::new(channel_id).send_message(&http, message).await {
                tracing::warn!("Failed to post audit event to channel {}: {}", channel_id, e);
            }
        });
    }
}
