//! TalentLoom Events - Realtime Invalidation
//!
//! Server-push domain events drive cache freshness: an [`EventSource`]
//! yields events, the [`EventMapper`] turns each into key invalidations and
//! an optional user notification, and a [`RealtimeFeed`] runs the loop
//! between them. Events of another tenant, and events of unknown types, are
//! dropped without stalling the source.

pub mod channels;
mod event;
mod feed;
mod mapper;
mod source;

pub use event::EventType;
pub use feed::{FeedHandle, FeedStats, RealtimeFeed};
pub use mapper::{Disposition, EventEffect, EventMapper};
pub use source::{ChannelSource, EventSource, ExhaustionPolicy, ReplaySource, DEFAULT_TICK_INTERVAL};
