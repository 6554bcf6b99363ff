//! narrow-filter
//!
//! Search and narrow filters for a team-chat client: parse a query such as
//! `channel:design topic:logo -is:muted`, classify the narrow for the UI,
//! decide which messages match, reconcile `with:` narrows whose target
//! message moved, and describe the narrow for the search bar.
//!
//! The core ([`model`], [`parser`], [`filter`]) is pure. The shell
//! ([`config`], [`logging`], [`snapshot`], [`report`]) feeds it a workspace
//! snapshot and turns results into JSON for the CLI.

pub mod config;
pub mod filter;
pub mod logging;
pub mod model;
pub mod parser;
pub mod report;
pub mod snapshot;

pub use filter::Filter;
pub use model::{NarrowContext, Operator, Term};

#[cfg(test)]
mod test_harness;
