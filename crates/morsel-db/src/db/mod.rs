//! Database repositories for data access layer
//!
//! `share` and `story` define one repository trait each with its PostgreSQL implementation;
//! `memory` holds the in-process implementations of both traits.

pub mod error;
pub mod memory;
pub mod pool;
pub mod share;
pub mod story;

pub use error::{DbError, DbResult};
pub use memory::{MemoryShareRepository, MemoryStoryRepository};
pub use pool::{connect, run_migrations};
pub use share::{PostgresShareRepository, ShareRepository};
pub use story::{PostgresStoryRepository, StoryRepository};
