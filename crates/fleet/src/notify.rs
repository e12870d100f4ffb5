use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::api::PositionReport;
use crate::db::POSITION_CHANNEL;

/// Outbound port for committed position inserts.
///
/// `publish` runs after the insert transaction commits and must not block;
/// delivery is best-effort and never fails the write.
pub trait PositionNotifier: Send + Sync {
    fn channel(&self) -> &str;
    fn publish(&self, report: &PositionReport);
}

/// Payload delivered to subscribers, keyed the way dispatch consumers expect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionNotification {
    pub id: i64,
    #[serde(rename = "creationtime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub bus_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub next_bus_stop_id: String,
    pub is_bus_stop: bool,
}

impl From<&PositionReport> for PositionNotification {
    fn from(report: &PositionReport) -> Self {
        Self {
            id: report.id,
            created_at: report.created_at,
            bus_id: report.bus_id.clone(),
            latitude: report.latitude,
            longitude: report.longitude,
            next_bus_stop_id: report.next_bus_stop_id.clone(),
            is_bus_stop: report.is_bus_stop,
        }
    }
}

/// In-process fan-out over a bounded broadcast channel. Slow subscribers lag
/// and drop the oldest notifications rather than stalling writers.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<PositionNotification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PositionNotification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl PositionNotifier for BroadcastNotifier {
    fn channel(&self) -> &str {
        POSITION_CHANNEL
    }

    fn publish(&self, report: &PositionReport) {
        let notification = PositionNotification::from(report);
        // Send only fails when nobody is subscribed.
        if let Ok(delivered) = self.sender.send(notification) {
            log::debug!(
                "fleet: notified {delivered} subscriber(s) of position {}",
                report.id
            );
        }
    }
}

/// Discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl PositionNotifier for NullNotifier {
    fn channel(&self) -> &str {
        POSITION_CHANNEL
    }

    fn publish(&self, _report: &PositionReport) {}
}
