//! Server metrics for observability
//!
//! Provides runtime counters for connections, inbound frames and room churn.
//! Delivery counters live in the broadcaster and are merged at snapshot time.

use chrono::{DateTime, Utc};
use room_broadcaster::DeliverySnapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Server-wide metrics
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connection metrics
    /// Currently active WebSocket connections
    pub active_connections: AtomicU64,
    /// Total connections since server start
    pub total_connections: AtomicU64,
    /// Connections that ended without a close handshake
    pub abrupt_disconnects: AtomicU64,

    // Message metrics
    /// Frames received from clients
    pub messages_received: AtomicU64,
    /// Frames that failed to decode
    pub messages_rejected: AtomicU64,

    // Room metrics
    pub room_joins: AtomicU64,
    pub room_leaves: AtomicU64,

    /// Server start time (for uptime calculation)
    start_time: Option<Instant>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn room_joined(&self) {
        self.room_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn room_left(&self) {
        self.room_leaves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn abrupt_disconnect(&self) {
        self.abrupt_disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Create a snapshot of all metrics
    pub fn snapshot(&self, delivery: DeliverySnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            connections: ConnectionMetrics {
                active: self.active_connections.load(Ordering::Relaxed),
                total: self.total_connections.load(Ordering::Relaxed),
                abrupt_disconnects: self.abrupt_disconnects.load(Ordering::Relaxed),
            },
            messages: MessageMetrics {
                received: self.messages_received.load(Ordering::Relaxed),
                rejected: self.messages_rejected.load(Ordering::Relaxed),
                delivered: delivery.delivered,
                dropped: delivery.dropped,
            },
            rooms: RoomMetrics {
                joins: self.room_joins.load(Ordering::Relaxed),
                leaves: self.room_leaves.load(Ordering::Relaxed),
            },
        }
    }
}

/// Serializable snapshot of metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub connections: ConnectionMetrics,
    pub messages: MessageMetrics,
    pub rooms: RoomMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    pub active: u64,
    pub total: u64,
    pub abrupt_disconnects: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetrics {
    pub received: u64,
    pub rejected: u64,
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMetrics {
    pub joins: u64,
    pub leaves: u64,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub connections: u64,
    pub rooms: u64,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_tracking() {
        let metrics = ServerMetrics::new();

        metrics.connection_opened();
        metrics.connection_opened();
        assert_eq!(metrics.active_connections.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.total_connections.load(Ordering::Relaxed), 2);

        metrics.connection_closed();
        assert_eq!(metrics.active_connections.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_connections.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_abrupt_disconnects_are_not_errors() {
        let metrics = ServerMetrics::new();
        metrics.connection_opened();
        metrics.abrupt_disconnect();
        metrics.connection_closed();

        let snapshot = metrics.snapshot(DeliverySnapshot::default());
        assert_eq!(snapshot.connections.active, 0);
        assert_eq!(snapshot.connections.abrupt_disconnects, 1);
    }

    #[test]
    fn test_snapshot_merges_delivery() {
        let metrics = ServerMetrics::new();
        metrics.connection_opened();
        metrics.message_received();
        metrics.message_received();
        metrics.message_rejected();
        metrics.room_joined();
        metrics.room_left();

        let snapshot = metrics.snapshot(DeliverySnapshot {
            delivered: 5,
            dropped: 1,
        });
        assert_eq!(snapshot.connections.active, 1);
        assert_eq!(snapshot.messages.received, 2);
        assert_eq!(snapshot.messages.rejected, 1);
        assert_eq!(snapshot.messages.delivered, 5);
        assert_eq!(snapshot.messages.dropped, 1);
        assert_eq!(snapshot.rooms.joins, 1);
        assert_eq!(snapshot.rooms.leaves, 1);
        assert_eq!(snapshot.connections.abrupt_disconnects, 0);
    }
}
