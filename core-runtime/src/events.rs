//! # Event Bus System
//!
//! Provides the event-driven backbone for the Spotify core using
//! `tokio::sync::broadcast`. This module decouples the session coordinator
//! and the player from UI/view-model consumers through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for auth and player domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events asynchronously with filtering
//! - **Listener Registry**: Synchronous callbacks registered per [`EventKind`],
//!   removable by handle — the substitute for native delegate protocols
//!
//! ## Usage
//!
//! ### Publishing Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, AuthEvent};
//!
//! let event_bus = EventBus::new(100);
//! event_bus.emit(CoreEvent::Auth(AuthEvent::LoginSuccess));
//! ```
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {:?}", event),
//!             Err(RecvError::Lagged(n)) => {
//!                 eprintln!("Missed {} events", n);
//!             }
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ### Delegate-Style Listeners
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, AuthEvent, EventKind};
//!
//! let event_bus = EventBus::new(100);
//! let id = event_bus.on(EventKind::LoginChange, |event| {
//!     println!("Login changed: {:?}", event);
//! });
//!
//! event_bus.emit(CoreEvent::Auth(AuthEvent::LoginChange { logged_in: false }));
//! event_bus.off(id); // callback is never invoked again
//! ```
//!
//! ## Error Handling
//!
//! `emit()` never fails the emitter: a receiver-less broadcast channel is not
//! an error. Async subscribers can observe `RecvError::Lagged(n)` when they
//! fall behind (non-fatal) and `RecvError::Closed` on shutdown.
//!
//! ## Thread Safety
//!
//! The event bus is fully thread-safe (`Send + Sync`) and cheap to clone;
//! clones share the same channel and listener registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// This value balances memory usage with the ability to handle bursts of
/// events. Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Player-related events
    Player(PlayerEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Player(e) => e.description(),
        }
    }

    /// Returns the kind tag used for listener filtering.
    pub fn kind(&self) -> EventKind {
        match self {
            CoreEvent::Auth(AuthEvent::LoginCheck) => EventKind::LoginCheck,
            CoreEvent::Auth(AuthEvent::LoginSuccess) => EventKind::LoginSuccess,
            CoreEvent::Auth(AuthEvent::LoginError { .. }) => EventKind::LoginError,
            CoreEvent::Auth(AuthEvent::LoginChange { .. }) => EventKind::LoginChange,
            CoreEvent::Auth(AuthEvent::PremiumRequired { .. }) => EventKind::PremiumRequired,
            CoreEvent::Player(PlayerEvent::PlayerReady) => EventKind::PlayerReady,
            CoreEvent::Player(PlayerEvent::AlbumArtChange { .. }) => EventKind::AlbumArtChange,
            CoreEvent::Player(PlayerEvent::TrackChange { .. }) => EventKind::TrackChange,
            CoreEvent::Player(PlayerEvent::PlaybackChange { .. }) => EventKind::PlaybackChange,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::LoginError { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::PremiumRequired { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::LoginSuccess) => EventSeverity::Info,
            CoreEvent::Auth(AuthEvent::LoginChange { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Kind tags for every event variant, used by the listener registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    LoginCheck,
    LoginSuccess,
    LoginError,
    LoginChange,
    PremiumRequired,
    PlayerReady,
    AlbumArtChange,
    TrackChange,
    PlaybackChange,
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events emitted by the session coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A login or session verification has started.
    LoginCheck,
    /// A session was acquired and persisted.
    LoginSuccess,
    /// The interactive flow or callback exchange failed.
    LoginError {
        /// Human-readable error message.
        message: String,
    },
    /// The logged-in state changed.
    LoginChange {
        /// Whether a session is now current.
        logged_in: bool,
    },
    /// The account tier does not permit streaming playback.
    PremiumRequired {
        /// Message suitable for a user-facing alert.
        message: String,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::LoginCheck => "Login check started",
            AuthEvent::LoginSuccess => "Login succeeded",
            AuthEvent::LoginError { .. } => "Login failed",
            AuthEvent::LoginChange { .. } => "Login state changed",
            AuthEvent::PremiumRequired { .. } => "Premium account required",
        }
    }
}

// ============================================================================
// Player Events
// ============================================================================

/// Events re-emitted from the native streaming controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// The streaming controller is initialized and ready for commands.
    PlayerReady,
    /// The album artwork for the current track changed.
    AlbumArtChange {
        /// Artwork URL, or `None` when the track carries no artwork.
        url: Option<String>,
    },
    /// A different track was loaded.
    TrackChange {
        /// URI of the newly loaded track.
        track_uri: String,
    },
    /// Playback was paused or resumed.
    PlaybackChange {
        /// Whether audio is currently playing.
        playing: bool,
    },
}

impl PlayerEvent {
    fn description(&self) -> &str {
        match self {
            PlayerEvent::PlayerReady => "Player ready",
            PlayerEvent::AlbumArtChange { .. } => "Album art changed",
            PlayerEvent::TrackChange { .. } => "Track changed",
            PlayerEvent::PlaybackChange { .. } => "Playback state changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Identifier returned by [`EventBus::on`], used to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = Arc<dyn Fn(&CoreEvent) + Send + Sync>;

struct ListenerEntry {
    id: ListenerId,
    kind: EventKind,
    callback: ListenerFn,
}

/// Central event bus for publishing and subscribing to events.
///
/// Combines two delivery paths over one stream of [`CoreEvent`]s:
/// - `tokio::sync::broadcast` receivers for async consumers (multiple
///   independent subscribers, lagging detection);
/// - a synchronous listener registry for delegate-style consumers, invoked
///   in registration order during [`emit`](EventBus::emit).
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, CoreEvent, AuthEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let event_bus = EventBus::new(100);
/// let mut subscriber = event_bus.subscribe();
///
/// event_bus.emit(CoreEvent::Auth(AuthEvent::LoginSuccess));
///
/// let received = subscriber.recv().await.unwrap();
/// assert_eq!(received, CoreEvent::Auth(AuthEvent::LoginSuccess));
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
    next_listener_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` is the maximum number of events buffered per async
    /// subscriber. A subscriber that falls further behind receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers and listeners.
    ///
    /// Returns the number of async subscribers the event was delivered to.
    /// Emitting on a bus with no subscribers is not an error; registered
    /// listeners are still invoked synchronously in registration order.
    pub fn emit(&self, event: CoreEvent) -> usize {
        let delivered = self.sender.send(event.clone()).unwrap_or(0);

        // Snapshot matching callbacks first: dispatching under the lock
        // would deadlock a listener that calls on()/off() on the same bus.
        let kind = event.kind();
        let matching: Vec<ListenerFn> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners
                .iter()
                .filter(|entry| entry.kind == kind)
                .map(|entry| Arc::clone(&entry.callback))
                .collect()
        };
        for callback in matching {
            callback(&event);
        }

        delivered
    }

    /// Creates a new async subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Creates a filtered async subscriber.
    ///
    /// Shorthand for `EventStream::new(bus.subscribe()).filter(predicate)`.
    pub fn subscribe_filtered<F>(&self, predicate: F) -> EventStream
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        EventStream::new(self.subscribe()).filter(predicate)
    }

    /// Registers a synchronous listener for a single event kind.
    ///
    /// Listeners for the same kind are invoked in registration order.
    /// The returned handle removes exactly this registration via
    /// [`off`](EventBus::off); dropping the handle does not unregister.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&CoreEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.push(ListenerEntry {
            id,
            kind,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes a previously registered listener.
    ///
    /// Returns `true` if the listener was present. After removal the
    /// callback is guaranteed to never be invoked by subsequent `emit`
    /// calls.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Returns the number of active async subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns the number of registered synchronous listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering
/// capabilities.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut auth_stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Auth(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events. Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
