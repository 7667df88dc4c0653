//! Morsel DB Library
//!
//! The structured store behind shares and stories: repository traits, the PostgreSQL
//! implementation and an in-memory implementation for tests and development.

pub mod db;

pub use db::{
    connect, run_migrations, DbError, DbResult, MemoryShareRepository, MemoryStoryRepository,
    PostgresShareRepository, PostgresStoryRepository, ShareRepository, StoryRepository,
};
