//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use notekeep_core::{new_v7, Error, Note, NoteDraft, NoteRepository, RequestContext, Result};

use crate::escape_like;
use crate::tags::{replace_note_tags_tx, upsert_tags_tx};

/// Columns selected for every note read. Tags are aggregated in name order.
const NOTE_SELECT: &str = r#"
    SELECT
        n.id, n.owner_id, n.title, n.text, n.archived, n.created_at, n.updated_at,
        COALESCE(
            ARRAY_AGG(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS tags
    FROM note n
    LEFT JOIN note_tag nt ON nt.note_id = n.id
    LEFT JOIN tag t ON t.id = nt.tag_id
"#;

const NOTE_GROUP_ORDER: &str = "GROUP BY n.id ORDER BY n.updated_at DESC, n.id DESC";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch an owned note within an existing transaction.
    pub async fn fetch_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<Note> {
        let query = format!(
            "{} WHERE n.id = $1 AND n.owner_id = $2 GROUP BY n.id",
            NOTE_SELECT
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(ctx.user_id())
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NotFoundOrForbidden(id))?;
        Ok(map_row_to_note(row))
    }

    /// Insert a note and its tags within an existing transaction.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ctx: &RequestContext,
        draft: NoteDraft,
    ) -> Result<Note> {
        draft.validate()?;
        let id = new_v7();
        let now = Utc::now();
        let names = draft.tag_names();

        sqlx::query(
            "INSERT INTO note (id, owner_id, title, text, archived, created_at, updated_at)
             VALUES ($1, $2, $3, $4, false, $5, $5)",
        )
        .bind(id)
        .bind(ctx.user_id())
        .bind(&draft.title)
        .bind(&draft.text)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let tag_ids = upsert_tags_tx(tx, ctx.user_id(), &names).await?;
        replace_note_tags_tx(tx, id, &tag_ids).await?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "create",
            user_id = ctx.user_id(),
            note_id = %id,
            tag_count = names.len(),
            "Created note"
        );
        self.fetch_tx(tx, ctx, id).await
    }

    /// Replace a note's content and tag set within an existing transaction.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ctx: &RequestContext,
        id: Uuid,
        draft: NoteDraft,
    ) -> Result<Note> {
        // Ownership first, so foreign notes report not-found before validation.
        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM note WHERE id = $1 AND owner_id = $2 FOR UPDATE")
                .bind(id)
                .bind(ctx.user_id())
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::Database)?;
        if owned.is_none() {
            return Err(Error::NotFoundOrForbidden(id));
        }

        draft.validate()?;
        let names = draft.tag_names();

        sqlx::query("UPDATE note SET title = $1, text = $2, updated_at = $3 WHERE id = $4")
            .bind(&draft.title)
            .bind(&draft.text)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        let tag_ids = upsert_tags_tx(tx, ctx.user_id(), &names).await?;
        replace_note_tags_tx(tx, id, &tag_ids).await?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "update",
            user_id = ctx.user_id(),
            note_id = %id,
            tag_count = names.len(),
            "Updated note"
        );
        self.fetch_tx(tx, ctx, id).await
    }
}

/// Map a row produced by `NOTE_SELECT` to a Note.
fn map_row_to_note(row: sqlx::postgres::PgRow) -> Note {
    Note {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        text: row.get("text"),
        archived: row.get("archived"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        tags: row.get("tags"),
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, ctx: &RequestContext, draft: NoteDraft) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = self.create_tx(&mut tx, ctx, draft).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn update(&self, ctx: &RequestContext, id: Uuid, draft: NoteDraft) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = self.update_tx(&mut tx, ctx, id, draft).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<()> {
        // note_tag rows go with the note via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(ctx.user_id())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFoundOrForbidden(id));
        }

        debug!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            user_id = ctx.user_id(),
            note_id = %id,
            "Deleted note"
        );
        Ok(())
    }

    async fn set_archived(&self, ctx: &RequestContext, id: Uuid, archived: bool) -> Result<()> {
        let result = sqlx::query("UPDATE note SET archived = $1 WHERE id = $2 AND owner_id = $3")
            .bind(archived)
            .bind(id)
            .bind(ctx.user_id())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFoundOrForbidden(id));
        }

        debug!(
            subsystem = "db",
            component = "notes",
            op = "set_archived",
            user_id = ctx.user_id(),
            note_id = %id,
            archived,
            "Set archived flag"
        );
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext, id: Uuid) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let note = self.fetch_tx(&mut tx, ctx, id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        archived: bool,
        tag: Option<&str>,
    ) -> Result<Vec<Note>> {
        let tag = tag.map(notekeep_core::normalize_tag_name);
        if tag.as_deref() == Some("") {
            // A blank name matches no tag.
            return Ok(Vec::new());
        }

        let rows = match &tag {
            Some(name) => {
                let query = format!(
                    "{} WHERE n.owner_id = $1 AND n.archived = $2 AND EXISTS (
                        SELECT 1 FROM note_tag ntf
                        JOIN tag tf ON tf.id = ntf.tag_id
                        WHERE ntf.note_id = n.id AND tf.name = $3
                    ) {}",
                    NOTE_SELECT, NOTE_GROUP_ORDER
                );
                sqlx::query(&query)
                    .bind(ctx.user_id())
                    .bind(archived)
                    .bind(name)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "{} WHERE n.owner_id = $1 AND n.archived = $2 {}",
                    NOTE_SELECT, NOTE_GROUP_ORDER
                );
                sqlx::query(&query)
                    .bind(ctx.user_id())
                    .bind(archived)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(Error::Database)?;

        let notes: Vec<Note> = rows.into_iter().map(map_row_to_note).collect();
        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            user_id = ctx.user_id(),
            archived,
            tag = tag.as_deref().unwrap_or(""),
            result_count = notes.len(),
            "Listed notes"
        );
        Ok(notes)
    }

    async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        archived: bool,
    ) -> Result<Vec<Note>> {
        let needle = query.trim();
        if needle.is_empty() {
            return self.list(ctx, archived, None).await;
        }
        // Title and text go through ILIKE as typed; tag names are stored
        // lowercase, so their pattern is lowercased here.
        let pattern = format!("%{}%", escape_like(needle));
        let tag_pattern = format!("%{}%", escape_like(&needle.to_lowercase()));

        let sql = format!(
            r#"{} WHERE n.owner_id = $1 AND n.archived = $2 AND (
                n.title ILIKE $3 ESCAPE '\'
                OR n.text ILIKE $3 ESCAPE '\'
                OR EXISTS (
                    SELECT 1 FROM note_tag nts
                    JOIN tag ts ON ts.id = nts.tag_id
                    WHERE nts.note_id = n.id AND ts.name LIKE $4 ESCAPE '\'
                )
            ) {}"#,
            NOTE_SELECT, NOTE_GROUP_ORDER
        );
        let rows = sqlx::query(&sql)
            .bind(ctx.user_id())
            .bind(archived)
            .bind(&pattern)
            .bind(&tag_pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let notes: Vec<Note> = rows.into_iter().map(map_row_to_note).collect();
        debug!(
            subsystem = "db",
            component = "notes",
            op = "search",
            user_id = ctx.user_id(),
            query = %needle,
            archived,
            result_count = notes.len(),
            "Searched notes"
        );
        Ok(notes)
    }
}
