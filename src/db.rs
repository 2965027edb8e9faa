use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::DbConfig;
use crate::message::{Attachment, Message, MessageStatus, NewMessage};
use crate::pipeline::{GroupDirectory, MessageStore};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str, db_config: &DbConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(db_config.idle_timeout_secs)))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    user_id: i64,
    group_id: i64,
    status: String,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: i64,
    message_id: i64,
    object_name: String,
    original_name: String,
    content_type: String,
    size: i64,
    url: String,
}

impl From<FileRow> for Attachment {
    fn from(row: FileRow) -> Self {
        Attachment {
            id: row.id,
            object_name: row.object_name,
            original_name: row.original_name,
            url: row.url,
            content_type: row.content_type,
            size: row.size,
        }
    }
}

const SELECT_MESSAGES: &str = r#"
    SELECT m.id, m.user_id, m.group_id, s.name AS status, m.content, m.created_at
    FROM messages m
    JOIN message_statuses s ON s.id = m.status_id
"#;

/// PostgreSQL implementation of MessageStore
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: DbPool,
}

impl PostgresMessageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Attach files (in insertion order) to message rows
    async fn hydrate(&self, rows: Vec<MessageRow>) -> Result<Vec<Message>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let files = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, message_id, object_name, original_name, content_type, size, url
            FROM files
            WHERE message_id = ANY($1)
            ORDER BY message_id, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load message files")?;

        let mut by_message: HashMap<i64, Vec<Attachment>> = HashMap::new();
        for file in files {
            by_message
                .entry(file.message_id)
                .or_default()
                .push(file.into());
        }

        rows.into_iter()
            .map(|row| {
                let status: MessageStatus = row.status.parse()?;
                Ok(Message {
                    id: row.id,
                    user_id: row.user_id,
                    group_id: row.group_id,
                    status,
                    content: row.content,
                    created_at: row.created_at,
                    files: by_message.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MessageStore for PostgresMessageStore {
    async fn create(&self, message: NewMessage) -> Result<Message> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO messages (user_id, group_id, status_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(message.user_id)
        .bind(message.group_id)
        .bind(MessageStatus::Pending.id())
        .bind(&message.content)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert message")?;

        let mut files = Vec::with_capacity(message.attachments.len());
        for attachment in message.attachments {
            let (file_id,) = sqlx::query_as::<_, (i64,)>(
                r#"
                INSERT INTO files (message_id, object_name, original_name, content_type, size, url)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(&attachment.object_name)
            .bind(&attachment.original_name)
            .bind(&attachment.content_type)
            .bind(attachment.size)
            .bind(&attachment.url)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert message file")?;

            files.push(Attachment {
                id: file_id,
                object_name: attachment.object_name,
                original_name: attachment.original_name,
                url: attachment.url,
                content_type: attachment.content_type,
                size: attachment.size,
            });
        }

        tx.commit().await.context("Failed to commit message")?;

        Ok(Message {
            id,
            user_id: message.user_id,
            group_id: message.group_id,
            status: MessageStatus::Pending,
            content: message.content,
            created_at,
            files,
        })
    }

    async fn list_by_group(&self, group_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "{} WHERE m.group_id = $1 ORDER BY m.created_at ASC, m.id ASC",
            SELECT_MESSAGES
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list group messages")?;

        self.hydrate(rows).await
    }

    async fn update_status(&self, message_id: i64, status: MessageStatus) -> Result<Option<i64>> {
        let group_id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE messages
            SET status_id = $1
            WHERE id = $2 AND status_id = $3
            RETURNING group_id
            "#,
        )
        .bind(status.id())
        .bind(message_id)
        .bind(MessageStatus::Pending.id())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update message status")?;

        Ok(group_id)
    }

    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "{} WHERE m.status_id = $1 AND m.created_at < $2 ORDER BY m.created_at ASC, m.id ASC LIMIT $3",
            SELECT_MESSAGES
        ))
        .bind(MessageStatus::Pending.id())
        .bind(older_than)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pending messages")?;

        self.hydrate(rows).await
    }

    async fn find_attachment(&self, object_name: &str) -> Result<Option<Attachment>> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, message_id, object_name, original_name, content_type, size, url
            FROM files
            WHERE object_name = $1
            "#,
        )
        .bind(object_name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up attachment")?;

        Ok(row.map(Attachment::from))
    }
}

/// Read-only roster backed by `group_members`
#[derive(Clone)]
pub struct PostgresGroupDirectory {
    pool: DbPool,
}

impl PostgresGroupDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GroupDirectory for PostgresGroupDirectory {
    async fn member_ids(&self, group_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id
            FROM group_members
            WHERE group_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load group members")?;
        Ok(ids)
    }
}
