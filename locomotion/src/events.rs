//! Tick and transition notifications.
//!
//! Listeners are plain callbacks registered per [`Channel`]. They run synchronously,
//! in registration order, on the thread that ticks the controller.

use std::fmt;

/// Notification channels of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    BeforeTick,
    AfterTick,
    BecameGrounded,
    BecameUngrounded,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::BeforeTick,
        Channel::AfterTick,
        Channel::BecameGrounded,
        Channel::BecameUngrounded,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Edge between two consecutive ground classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Grounded,
    Ungrounded,
}

impl Transition {
    /// The transition, if any, from `was` to `is`.
    #[inline]
    pub fn between(was_grounded: bool, is_grounded: bool) -> Option<Self> {
        match (was_grounded, is_grounded) {
            (false, true) => Some(Transition::Grounded),
            (true, false) => Some(Transition::Ungrounded),
            _ => None,
        }
    }

    #[inline]
    pub fn channel(self) -> Channel {
        match self {
            Transition::Grounded => Channel::BecameGrounded,
            Transition::Ungrounded => Channel::BecameUngrounded,
        }
    }
}

type Listener = Box<dyn FnMut() + Send>;

/// Registered listeners, one list per channel.
#[derive(Default)]
pub struct EventSink {
    listeners: [Vec<Listener>; 4],
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, channel: Channel, listener: impl FnMut() + Send + 'static) {
        self.listeners[channel.index()].push(Box::new(listener));
    }

    pub fn emit(&mut self, channel: Channel) {
        for listener in &mut self.listeners[channel.index()] {
            listener();
        }
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners[channel.index()].len()
    }

    pub fn clear(&mut self, channel: Channel) {
        self.listeners[channel.index()].clear();
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for channel in Channel::ALL {
            map.entry(&channel, &self.listener_count(channel));
        }
        map.finish()
    }
}
