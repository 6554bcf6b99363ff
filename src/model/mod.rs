//! Domain model types (pure).
//!
//! Terms, candidate messages, identifiers and the read-only collaborator
//! interfaces the Filter consults.

pub mod directory;
pub mod error;
pub mod identifiers;
pub mod message;
pub mod term;
pub mod topic;

// Re-export for convenience
pub use directory::{
    ChannelDirectory, MessageStore, MuteState, NarrowContext, PeopleDirectory, Person,
    RealmSettings, Subscription, VisibilityPolicy,
};
pub use identifiers::{ChannelId, InvalidId, MessageId, UserId};
pub use message::{Message, Reaction, Recipient};
pub use term::{Operator, Term};
