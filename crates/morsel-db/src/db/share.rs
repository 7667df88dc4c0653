use super::error::{DbError, DbResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use morsel_core::{MediaKind, Share, ShareId, UserId};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Persistence for direct shares.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Insert every share in one atomic write. Either all rows land or none do.
    async fn insert_many(&self, shares: &[Share]) -> DbResult<()>;

    /// Shares addressed to `receiver`, newest first.
    async fn list_received(&self, receiver: UserId) -> DbResult<Vec<Share>>;

    /// Shares sent by `sender`, newest first.
    async fn list_sent(&self, sender: UserId) -> DbResult<Vec<Share>>;

    /// Set `is_viewed = true` and `updated_at = at` on one share.
    async fn mark_viewed(&self, id: ShareId, at: DateTime<Utc>) -> DbResult<()>;
}

const SHARE_COLUMNS: &str = "id, sender_id, receiver_id, media_url, media_type, duration_seconds, \
                             caption, is_viewed, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ShareRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    media_url: String,
    media_type: String,
    duration_seconds: Option<i32>,
    caption: Option<String>,
    is_viewed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShareRow> for Share {
    type Error = DbError;

    fn try_from(row: ShareRow) -> Result<Self, Self::Error> {
        Ok(Share {
            id: ShareId::from_uuid(row.id),
            sender_id: UserId::from_uuid(row.sender_id),
            receiver_id: UserId::from_uuid(row.receiver_id),
            media_url: row.media_url,
            media_type: parse_media_type(&row.media_type)?,
            duration_seconds: duration_from_column(row.duration_seconds)?,
            caption: row.caption,
            is_viewed: row.is_viewed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn parse_media_type(raw: &str) -> DbResult<MediaKind> {
    raw.parse::<MediaKind>()
        .map_err(|e| DbError::InvalidRow(e.to_string()))
}

pub(crate) fn duration_from_column(raw: Option<i32>) -> DbResult<Option<u32>> {
    raw.map(|d| {
        u32::try_from(d).map_err(|_| DbError::InvalidRow(format!("negative duration: {}", d)))
    })
    .transpose()
}

pub(crate) fn duration_to_column(duration: Option<u32>) -> DbResult<Option<i32>> {
    duration
        .map(|d| {
            i32::try_from(d).map_err(|_| DbError::InvalidRow(format!("duration too large: {}", d)))
        })
        .transpose()
}

#[derive(Clone)]
pub struct PostgresShareRepository {
    pool: PgPool,
}

impl PostgresShareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_by(&self, column: &str, user: UserId) -> DbResult<Vec<Share>> {
        let sql = format!(
            "SELECT {} FROM shared_media WHERE {} = $1 ORDER BY created_at DESC",
            SHARE_COLUMNS, column
        );
        let rows = sqlx::query_as::<Postgres, ShareRow>(&sql)
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Share::try_from).collect()
    }
}

#[async_trait]
impl ShareRepository for PostgresShareRepository {
    #[tracing::instrument(skip(self, shares), fields(
        db.system = "postgresql",
        db.table = "shared_media",
        db.operation = "insert",
        row_count = shares.len()
    ))]
    async fn insert_many(&self, shares: &[Share]) -> DbResult<()> {
        if shares.is_empty() {
            return Ok(());
        }

        let durations = shares
            .iter()
            .map(|s| duration_to_column(s.duration_seconds))
            .collect::<DbResult<Vec<_>>>()?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO shared_media ({}) ",
            SHARE_COLUMNS
        ));
        builder.push_values(shares.iter().zip(durations), |mut b, (share, duration)| {
            b.push_bind(share.id.as_uuid())
                .push_bind(share.sender_id.as_uuid())
                .push_bind(share.receiver_id.as_uuid())
                .push_bind(share.media_url.clone())
                .push_bind(share.media_type.to_string())
                .push_bind(duration)
                .push_bind(share.caption.clone())
                .push_bind(share.is_viewed)
                .push_bind(share.created_at)
                .push_bind(share.updated_at);
        });

        builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!(error = ?e, row_count = shares.len(), "Failed to insert shares");
            DbError::from(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "shared_media", db.operation = "select"))]
    async fn list_received(&self, receiver: UserId) -> DbResult<Vec<Share>> {
        self.list_by("receiver_id", receiver).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "shared_media", db.operation = "select"))]
    async fn list_sent(&self, sender: UserId) -> DbResult<Vec<Share>> {
        self.list_by("sender_id", sender).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "shared_media", db.operation = "update", db.record_id = %id))]
    async fn mark_viewed(&self, id: ShareId, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE shared_media SET is_viewed = TRUE, updated_at = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("share {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_rejects_unknown_media_type() {
        let now = Utc::now();
        let row = ShareRow {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            media_url: "https://x/y.jpg".to_string(),
            media_type: "gif".to_string(),
            duration_seconds: None,
            caption: None,
            is_viewed: false,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Share::try_from(row), Err(DbError::InvalidRow(_))));
    }

    #[test]
    fn test_duration_columns() {
        assert_eq!(duration_to_column(Some(12)).unwrap(), Some(12));
        assert_eq!(duration_from_column(None).unwrap(), None);
        assert!(duration_from_column(Some(-1)).is_err());
        assert!(duration_to_column(Some(u32::MAX)).is_err());
    }
}
