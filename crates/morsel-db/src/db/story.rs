use super::error::{DbError, DbResult};
use super::share::{duration_from_column, duration_to_column, parse_media_type};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use morsel_core::{Story, StoryId, UserId};
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Persistence for stories. Expiry is applied by every read: rows whose `expires_at` is not
/// after `now` are never returned.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn insert(&self, story: &Story) -> DbResult<()>;

    /// Active stories of one author, newest first.
    async fn list_active_by_author(
        &self,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Story>>;

    /// Active stories of any of `authors` in one query, newest first.
    async fn list_active_by_authors(
        &self,
        authors: &[UserId],
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Story>>;

    /// Delete one story. `NotFound` if no such row exists.
    async fn delete(&self, id: StoryId) -> DbResult<()>;
}

const STORY_COLUMNS: &str =
    "id, author_id, media_url, media_type, duration_seconds, caption, created_at, expires_at";

#[derive(Debug, FromRow)]
struct StoryRow {
    id: Uuid,
    author_id: Uuid,
    media_url: String,
    media_type: String,
    duration_seconds: Option<i32>,
    caption: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<StoryRow> for Story {
    type Error = DbError;

    fn try_from(row: StoryRow) -> Result<Self, Self::Error> {
        Ok(Story {
            id: StoryId::from_uuid(row.id),
            author_id: UserId::from_uuid(row.author_id),
            media_url: row.media_url,
            media_type: parse_media_type(&row.media_type)?,
            duration_seconds: duration_from_column(row.duration_seconds)?,
            caption: row.caption,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresStoryRepository {
    pool: PgPool,
}

impl PostgresStoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryRepository for PostgresStoryRepository {
    #[tracing::instrument(skip(self, story), fields(db.table = "stories", db.operation = "insert", db.record_id = %story.id))]
    async fn insert(&self, story: &Story) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stories (
                id, author_id, media_url, media_type, duration_seconds, caption,
                created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(story.id.as_uuid())
        .bind(story.author_id.as_uuid())
        .bind(&story.media_url)
        .bind(story.media_type.to_string())
        .bind(duration_to_column(story.duration_seconds)?)
        .bind(&story.caption)
        .bind(story.created_at)
        .bind(story.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "stories", db.operation = "select"))]
    async fn list_active_by_author(
        &self,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Story>> {
        let sql = format!(
            "SELECT {} FROM stories WHERE author_id = $1 AND expires_at > $2 ORDER BY created_at DESC",
            STORY_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, StoryRow>(&sql)
            .bind(author.as_uuid())
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Story::try_from).collect()
    }

    #[tracing::instrument(skip(self, authors), fields(db.table = "stories", db.operation = "select", author_count = authors.len()))]
    async fn list_active_by_authors(
        &self,
        authors: &[UserId],
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Story>> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = authors.iter().map(UserId::as_uuid).collect();
        let sql = format!(
            "SELECT {} FROM stories WHERE author_id = ANY($1) AND expires_at > $2 ORDER BY created_at DESC",
            STORY_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, StoryRow>(&sql)
            .bind(ids)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Story::try_from).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "stories", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: StoryId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("story {}", id)));
        }
        Ok(())
    }
}
