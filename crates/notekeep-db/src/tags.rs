//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use notekeep_core::{new_v7, Error, RequestContext, Result, TagRepository, TagWithCount};

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Resolve normalized tag names to tag ids for `owner_id`, creating missing
/// tags.
///
/// Runs inside the caller's transaction so a failed note write does not
/// leave freshly created tags behind. The no-op `DO UPDATE` makes
/// `RETURNING` yield the existing row on conflict.
pub(crate) async fn upsert_tags_tx(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: &str,
    names: &[String],
) -> Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO tag (id, owner_id, name) VALUES ($1, $2, $3)
             ON CONFLICT (owner_id, name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(new_v7())
        .bind(owner_id)
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;
        ids.push(id);
    }
    Ok(ids)
}

/// Replace the full tag set of a note.
pub(crate) async fn replace_note_tags_tx(
    tx: &mut Transaction<'_, Postgres>,
    note_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
        .bind(note_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO note_tag (note_id, tag_id)
         SELECT $1, UNNEST($2::uuid[])
         ON CONFLICT DO NOTHING",
    )
    .bind(note_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;
    Ok(())
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list_with_counts(&self, ctx: &RequestContext) -> Result<Vec<TagWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.id,
                t.name,
                COUNT(n.id) AS note_count
            FROM tag t
            LEFT JOIN note_tag nt ON nt.tag_id = t.id
            LEFT JOIN note n ON n.id = nt.note_id AND n.archived = false
            WHERE t.owner_id = $1
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .bind(ctx.user_id())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tags: Vec<TagWithCount> = rows
            .into_iter()
            .map(|row| TagWithCount {
                id: row.get("id"),
                name: row.get("name"),
                note_count: row.get("note_count"),
            })
            .collect();

        debug!(
            subsystem = "db",
            component = "tags",
            op = "list_with_counts",
            user_id = ctx.user_id(),
            result_count = tags.len(),
            "Listed tags"
        );
        Ok(tags)
    }
}
