//! TalentLoom Core - Entity Types
//!
//! Pure data structures shared by every other crate: typed identifiers,
//! domain entities and enums, the error taxonomy, wire-form domain events
//! and user notifications.

mod entities;
mod enums;
mod error;
mod event;
mod identity;
mod notification;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use event::*;
pub use identity::*;
pub use notification::*;
