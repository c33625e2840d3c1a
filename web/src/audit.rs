use async_trait::async_trait;
use events::{AuditEvent, EventHandler};
use log::*;

/// Writes every audit event to the application log as one JSON line.
pub struct LoggingAuditHandler;

#[async_trait]
impl EventHandler for LoggingAuditHandler {
    async fn handle(&self, event: &AuditEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(err) => {
                error!("Failed to serialize audit event {}: {err}", event.event_id());
                return;
            }
        };

        if event.is_failure() {
            warn!("audit {line}");
        } else {
            info!("audit {line}");
        }
    }
}
