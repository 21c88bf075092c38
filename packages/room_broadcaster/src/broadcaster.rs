//! Room Broadcaster
//!
//! Tracks live connections and room membership, and fans events out to
//! either every connection or one room's members.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

use crate::connection::ConnectionId;
use crate::event::ServerEvent;

/// Default per-connection outbound queue depth
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Capacity of each connection's outbound queue. Events that arrive
    /// while the queue is full are dropped for that connection.
    pub channel_capacity: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Room name and current member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    pub members: usize,
}

/// Snapshot of delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySnapshot {
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct DeliveryStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Connection registry and room membership. Always mutated as a unit.
#[derive(Default)]
struct Registry {
    /// connection_id -> outbound queue
    connections: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
    /// room name -> member connection ids
    rooms: HashMap<String, HashSet<ConnectionId>>,
    /// connection_id -> rooms it belongs to (reverse of `rooms`)
    memberships: HashMap<ConnectionId, HashSet<String>>,
}

impl Registry {
    fn room_recipients(&self, room: &str) -> Vec<(ConnectionId, mpsc::Sender<ServerEvent>)> {
        let Some(members) = self.rooms.get(room) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|id| self.connections.get(id).map(|tx| (*id, tx.clone())))
            .collect()
    }

    fn remove_member(&mut self, connection_id: ConnectionId, room: &str) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&connection_id);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        if removed {
            if let Some(rooms) = self.memberships.get_mut(&connection_id) {
                rooms.remove(room);
                if rooms.is_empty() {
                    self.memberships.remove(&connection_id);
                }
            }
        }
        removed
    }
}

/// Room-scoped publish/subscribe broadcaster.
///
/// One instance is shared (behind an `Arc`) by every connection handler.
/// A single lock guards connections and rooms so that join, leave,
/// disconnect and fan-out observe a consistent view. Enqueueing happens
/// after the lock is released and never waits on a slow connection.
pub struct Broadcaster {
    registry: RwLock<Registry>,
    config: BroadcasterConfig,
    stats: DeliveryStats,
}

impl Broadcaster {
    pub fn new(config: BroadcasterConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            config,
            stats: DeliveryStats::default(),
        }
    }

    /// Record a connection as live and return the receiving end of its
    /// outbound queue. Re-registering a live id replaces its queue.
    pub async fn register(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let mut registry = self.registry.write().await;
        if registry.connections.insert(connection_id, tx).is_some() {
            debug!(conn_id = %connection_id, "Replaced outbound queue for live connection");
        }
        info!(
            conn_id = %connection_id,
            connections = registry.connections.len(),
            "Registered connection"
        );
        rx
    }

    /// Remove a connection from every room and forget it.
    /// Returns the rooms it was removed from.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Vec<String> {
        let mut registry = self.registry.write().await;
        if registry.connections.remove(&connection_id).is_none() {
            return Vec::new();
        }

        let rooms: Vec<String> = registry
            .memberships
            .remove(&connection_id)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();
        for room in &rooms {
            if let Some(members) = registry.rooms.get_mut(room) {
                members.remove(&connection_id);
                if members.is_empty() {
                    registry.rooms.remove(room);
                }
            }
        }

        info!(
            conn_id = %connection_id,
            rooms_left = rooms.len(),
            connections = registry.connections.len(),
            "Unregistered connection"
        );
        rooms
    }

    /// Add a connection to a room and announce it to the room, the new
    /// member included. Returns false if the connection is not registered.
    pub async fn join(&self, connection_id: ConnectionId, room: &str) -> bool {
        let recipients = {
            let mut registry = self.registry.write().await;
            if !registry.connections.contains_key(&connection_id) {
                debug!(conn_id = %connection_id, room, "Ignoring join from unregistered connection");
                return false;
            }
            registry
                .rooms
                .entry(room.to_string())
                .or_default()
                .insert(connection_id);
            registry
                .memberships
                .entry(connection_id)
                .or_default()
                .insert(room.to_string());
            registry.room_recipients(room)
        };

        info!(conn_id = %connection_id, room, members = recipients.len(), "Joined room");
        self.deliver(recipients, ServerEvent::joined(room));
        true
    }

    /// Remove a connection from a room and announce it to the remaining
    /// members. Returns false (and announces nothing) if it was not a member.
    pub async fn leave(&self, connection_id: ConnectionId, room: &str) -> bool {
        let recipients = {
            let mut registry = self.registry.write().await;
            if !registry.remove_member(connection_id, room) {
                return false;
            }
            registry.room_recipients(room)
        };

        info!(conn_id = %connection_id, room, members = recipients.len(), "Left room");
        self.deliver(recipients, ServerEvent::left(room));
        true
    }

    /// Deliver an event to every registered connection.
    /// Returns the number of queues that accepted it.
    pub async fn broadcast_global(&self, event: ServerEvent) -> usize {
        let recipients: Vec<_> = {
            let registry = self.registry.read().await;
            registry
                .connections
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };
        self.deliver(recipients, event)
    }

    /// Deliver an event to the current members of a room.
    /// Unknown or empty rooms are a silent no-op.
    pub async fn broadcast_room(&self, room: &str, event: ServerEvent) -> usize {
        let recipients = self.registry.read().await.room_recipients(room);
        if recipients.is_empty() {
            debug!(room, "Broadcast to room with no members");
            return 0;
        }
        self.deliver(recipients, event)
    }

    /// Drop every queue and room. Returns the number of live connections.
    pub async fn shutdown(&self) -> usize {
        let mut registry = self.registry.write().await;
        let count = registry.connections.len();
        *registry = Registry::default();
        info!(connections = count, "Broadcaster shut down");
        count
    }

    pub async fn is_registered(&self, connection_id: ConnectionId) -> bool {
        self.registry
            .read()
            .await
            .connections
            .contains_key(&connection_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }

    pub async fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.registry
            .read()
            .await
            .rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .registry
            .read()
            .await
            .memberships
            .get(&connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// All non-empty rooms, sorted by name.
    pub async fn rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .registry
            .read()
            .await
            .rooms
            .iter()
            .map(|(name, members)| RoomSummary {
                name: name.clone(),
                members: members.len(),
            })
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    pub fn stats(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }

    /// Best-effort enqueue. A full or closed queue drops the event for that
    /// recipient only.
    fn deliver(
        &self,
        recipients: Vec<(ConnectionId, mpsc::Sender<ServerEvent>)>,
        event: ServerEvent,
    ) -> usize {
        let mut delivered = 0;
        for (connection_id, tx) in recipients {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(conn_id = %connection_id, "Outbound queue full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(conn_id = %connection_id, "Outbound queue closed, dropping event");
                }
            }
        }
        self.stats
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(BroadcasterConfig::default())
    }
}
