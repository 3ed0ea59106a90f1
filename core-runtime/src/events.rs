//! # Event Bus System
//!
//! Provides an event-driven architecture for the music server using
//! `tokio::sync::broadcast`. Controllers announce state changes on the bus;
//! idle clients subscribe and wake up when a subsystem they care about
//! changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐
//! │  Playback   ├──────────────>│           │
//! └─────────────┘               │           │
//!                               │ EventBus  │
//! ┌─────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │  Tracklist  ├──────────────>│  channel) ├─────────────────>│ idle conn. │
//! └─────────────┘               │           │                  └────────────┘
//!                               │           │
//! ┌─────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │  Library    ├──────────────>│           ├─────────────────>│ idle conn. │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Subsystems
//!
//! Every event maps onto one MPD idle subsystem through
//! [`CoreEvent::subsystem`]:
//!
//! | Event                   | Subsystem         |
//! |-------------------------|-------------------|
//! | `Playback`              | `player`          |
//! | `Tracklist`             | `playlist`        |
//! | `StoredPlaylists`       | `stored_playlist` |
//! | `Library`               | `database`        |
//! | `Options`               | `options`         |
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers is not an error worth reporting; controllers
//! ignore the `SendError` in that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
    Tracklist(TracklistEvent),
    StoredPlaylists(StoredPlaylistsEvent),
    Library(LibraryEvent),
    Options(OptionsEvent),
}

impl CoreEvent {
    /// MPD idle subsystem this event belongs to.
    pub fn subsystem(&self) -> &'static str {
        match self {
            CoreEvent::Playback(_) => "player",
            CoreEvent::Tracklist(_) => "playlist",
            CoreEvent::StoredPlaylists(_) => "stored_playlist",
            CoreEvent::Library(_) => "database",
            CoreEvent::Options(_) => "options",
        }
    }
}

/// All idle subsystem names, in the order MPD lists them.
pub const SUBSYSTEMS: &[&str] = &["database", "stored_playlist", "playlist", "player", "options"];

// ============================================================================
// Domain Events
// ============================================================================

/// Events emitted by the playback state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The state machine moved between `stop`, `play` and `pause`.
    StateChanged {
        old_state: String,
        new_state: String,
        /// URI of the current track, if any.
        track_uri: Option<String>,
    },
    /// A seek was accepted by the provider.
    Seeked { position_ms: u64 },
    /// The provider failed and playback was stopped.
    Error { message: String },
}

/// Events emitted by the current playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TracklistEvent {
    /// Any mutation; carries the new version.
    Changed { version: u64 },
}

/// Events emitted by the stored playlists controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum StoredPlaylistsEvent {
    /// A playlist was created, saved, renamed or deleted, or the list was
    /// reloaded (`name` is `None`).
    Changed { name: Option<String> },
}

/// Events emitted by the library controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    Refreshed {
        uri: Option<String>,
        track_count: usize,
    },
}

/// Events emitted when a playback option is toggled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum OptionsEvent {
    Changed { option: String, enabled: bool },
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every clone publishes to the same
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// A subscriber's view of the bus, with blocking and non-blocking receive.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let event_bus = EventBus::new(16);
/// let mut stream = EventStream::new(event_bus.subscribe());
/// assert!(stream.try_recv().is_none());
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self { receiver }
    }

    /// Receives the next event.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        self.receiver.recv().await
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::TryRecvError::Empty) => None,
            Err(broadcast::error::TryRecvError::Lagged(n)) => Some(Err(RecvError::Lagged(n))),
            Err(broadcast::error::TryRecvError::Closed) => Some(Err(RecvError::Closed)),
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tracklist_changed(version: u64) -> CoreEvent {
        CoreEvent::Tracklist(TracklistEvent::Changed { version })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(tracklist_changed(1)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Options(OptionsEvent::Changed {
            option: "random".to_string(),
            enabled: true,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_try_recv_drains_pending() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        bus.emit(tracklist_changed(3)).ok();
        bus.emit(tracklist_changed(4)).ok();

        assert_eq!(stream.try_recv().unwrap().unwrap(), tracklist_changed(3));
        assert_eq!(stream.recv().await.unwrap(), tracklist_changed(4));
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for version in 0..5 {
            bus.emit(tracklist_changed(version)).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_subsystem_mapping() {
        let cases = [
            (
                CoreEvent::Playback(PlaybackEvent::Seeked { position_ms: 10 }),
                "player",
            ),
            (tracklist_changed(1), "playlist"),
            (
                CoreEvent::StoredPlaylists(StoredPlaylistsEvent::Changed { name: None }),
                "stored_playlist",
            ),
            (
                CoreEvent::Library(LibraryEvent::Refreshed {
                    uri: None,
                    track_count: 0,
                }),
                "database",
            ),
            (
                CoreEvent::Options(OptionsEvent::Changed {
                    option: "repeat".to_string(),
                    enabled: false,
                }),
                "options",
            ),
        ];

        for (event, subsystem) in cases {
            assert_eq!(event.subsystem(), subsystem);
            assert!(SUBSYSTEMS.contains(&subsystem));
        }
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for version in 0..10 {
                bus1.emit(tracklist_changed(version)).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for position_ms in 0..10 {
                bus2.emit(CoreEvent::Playback(PlaybackEvent::Seeked { position_ms }))
                    .ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Library(LibraryEvent::Refreshed {
            uri: Some("file:///music".to_string()),
            track_count: 42,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Refreshed"));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
