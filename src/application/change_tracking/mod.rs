//! Change interception - deriving room events from entity commits.
//!
//! Feature code mutates room entities through a [`UnitOfWork`] and never
//! talks to the event bus. On commit, the [`ChangePipeline`] compares each
//! added or modified entity with its original and lets registered
//! processors turn relevant differences into room events.
//!
//! - [`PreCommitProcessor`] - runs before the write, may stage extra writes,
//!   errors abort the commit
//! - [`PostCommitProcessor`] - runs after the write, publishes events,
//!   errors are logged and swallowed

mod change;
mod pipeline;
mod processor;
pub mod processors;
mod unit_of_work;

pub use change::Change;
pub use pipeline::{ChangePipeline, CommitSummary};
pub use processor::{PostCommitContext, PostCommitProcessor, PreCommitContext, PreCommitProcessor};
pub use processors::room_pipeline;
pub use unit_of_work::{EntryState, UnitOfWork, UnitOfWorkFactory};
