use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::tag::{Tag, TagCreateForm, TagUpdateForm};
use crate::utils::time::current_timestamp_seconds;

pub struct TagService<'a> {
    db: &'a Database,
}

impl<'a> TagService<'a> {
    pub fn new(db: &'a Database) -> Self {
        TagService { db }
    }

    /// Creates a new tag definition. The duplicate check and the insert run
    /// in one transaction; the partial unique index on active names catches
    /// any writer that slips past the check.
    pub async fn create_tag(&self, form_data: &TagCreateForm) -> AppResult<Tag> {
        let tag_name = normalized_name(&form_data.tag_name)?;
        let now = current_timestamp_seconds();

        let mut tx = self.db.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM tag WHERE tag_name = $1 AND deleted = 0",
        )
        .bind(&tag_name)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Tag '{}' already exists",
                tag_name
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO tag (tag_name, description, deleted, created_at, updated_at)
            VALUES ($1, $2, 0, $3, $3)
            "#,
        )
        .bind(&tag_name)
        .bind(&form_data.description)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Tag '{}' already exists", tag_name))
            } else {
                AppError::Database(e)
            }
        })?;

        let id = result.last_insert_rowid();

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, tag_name, description, deleted, created_at, updated_at
            FROM tag
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Failed to create tag".to_string()))?;

        tx.commit().await?;

        Ok(tag)
    }

    /// Updates a tag's name and description. The id and deleted flag never
    /// change; a soft-deleted tag is treated as gone and cannot be updated.
    pub async fn update_tag(&self, form_data: &TagUpdateForm) -> AppResult<Tag> {
        let tag_name = normalized_name(&form_data.tag_name)?;
        let now = current_timestamp_seconds();

        let mut tx = self.db.pool.begin().await?;

        let current = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, tag_name, description, deleted, created_at, updated_at
            FROM tag
            WHERE id = $1
            "#,
        )
        .bind(form_data.id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(tag) if !tag.deleted => tag,
            _ => return Err(AppError::NotFound("Tag not found".to_string())),
        };

        if tag_name != current.tag_name {
            let colliding = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM tag WHERE tag_name = $1 AND deleted = 0 AND id != $2",
            )
            .bind(&tag_name)
            .bind(form_data.id)
            .fetch_optional(&mut *tx)
            .await?;

            if colliding.is_some() {
                return Err(AppError::Conflict(format!(
                    "Tag '{}' already exists",
                    tag_name
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE tag
            SET tag_name = $1, description = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&tag_name)
        .bind(&form_data.description)
        .bind(now)
        .bind(form_data.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Tag '{}' already exists", tag_name))
            } else {
                AppError::Database(e)
            }
        })?;

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, tag_name, description, deleted, created_at, updated_at
            FROM tag
            WHERE id = $1
            "#,
        )
        .bind(form_data.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

        tx.commit().await?;

        Ok(tag)
    }

    /// Marks a tag as deleted. Deleting an already-deleted tag is a no-op
    /// success so the operation stays idempotent under retries.
    pub async fn delete_tag_by_id(&self, id: i64) -> AppResult<()> {
        let now = current_timestamp_seconds();

        let deleted = sqlx::query_scalar::<_, bool>("SELECT deleted FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

        if deleted {
            return Ok(());
        }

        sqlx::query("UPDATE tag SET deleted = 1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }

    /// Fetches a tag by id regardless of its deleted state, for audit use.
    pub async fn get_tag_by_id(&self, id: i64) -> AppResult<Tag> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, tag_name, description, deleted, created_at, updated_at
            FROM tag
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
    }

    pub async fn get_active_tags(&self) -> AppResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, tag_name, description, deleted, created_at, updated_at
            FROM tag
            WHERE deleted = 0
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(tags)
    }

    /// Exact-match lookup among active tags only. A deleted tag holding the
    /// name does not match.
    pub async fn get_active_tag_by_name(&self, tag_name: &str) -> AppResult<Tag> {
        let tag_name = normalized_name(tag_name)?;

        sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, tag_name, description, deleted, created_at, updated_at
            FROM tag
            WHERE tag_name = $1 AND deleted = 0
            "#,
        )
        .bind(&tag_name)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
    }
}

/// Name policy: trim surrounding whitespace, compare case-sensitively.
/// An all-whitespace name is empty and rejected.
fn normalized_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "tagName must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation())
}
