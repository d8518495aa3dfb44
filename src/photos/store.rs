use super::types::{NewPhoto, Photo, PhotoUpdate};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// CRUD over the `photos` table.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    pool: SqlitePool,
}

impl PhotoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All photos, lowest `sort_order` first, newest first within a tie.
    pub async fn list(&self) -> Result<Vec<Photo>, sqlx::Error> {
        sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos ORDER BY sort_order ASC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Photo>, sqlx::Error> {
        sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(&self, photo: NewPhoto) -> Result<Photo, sqlx::Error> {
        self.insert_at(photo, Utc::now()).await
    }

    pub(crate) async fn insert_at(
        &self,
        photo: NewPhoto,
        created_at: DateTime<Utc>,
    ) -> Result<Photo, sqlx::Error> {
        let id = generate_photo_id(&photo.title);
        debug!("Inserting photo {}", id);

        sqlx::query_as::<_, Photo>(
            "INSERT INTO photos \
             (id, title, description, url, camera, lens, settings, location, film, tags, sort_order, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(&id)
        .bind(&photo.title)
        .bind(&photo.description)
        .bind(&photo.url)
        .bind(&photo.camera)
        .bind(&photo.lens)
        .bind(&photo.settings)
        .bind(&photo.location)
        .bind(&photo.film)
        .bind(&photo.tags)
        .bind(photo.sort_order)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Writes only the fields present in `update`. Returns `None` without
    /// touching the database when there is nothing to write, and `None` when
    /// the id does not exist.
    pub async fn update(
        &self,
        id: &str,
        update: PhotoUpdate,
    ) -> Result<Option<Photo>, sqlx::Error> {
        if update.is_empty() {
            return Ok(None);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE photos SET ");
        let mut sets = builder.separated(", ");

        if let Some(title) = update.title {
            sets.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = update.description {
            sets.push("description = ").push_bind_unseparated(description);
        }
        if let Some(url) = update.url {
            sets.push("url = ").push_bind_unseparated(url);
        }
        for (column, value) in [
            ("camera", update.camera),
            ("lens", update.lens),
            ("settings", update.settings),
            ("location", update.location),
            ("film", update.film),
            ("tags", update.tags),
        ] {
            if let Some(value) = value {
                sets.push(format!("{} = ", column)).push_bind_unseparated(value);
            }
        }
        if let Some(sort_order) = update.sort_order {
            sets.push("sort_order = ").push_bind_unseparated(sort_order);
        }

        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<Photo>()
            .fetch_optional(&self.pool)
            .await
    }

    /// Deleting an id that does not exist is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!("Deleted {} row(s) for photo {}", result.rows_affected(), id);
        Ok(())
    }
}

/// Lowercase ASCII slug with runs of anything else collapsed to `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

static LAST_ID_MILLIS: AtomicU64 = AtomicU64::new(0);

// Millisecond clock that never repeats within the process.
fn next_id_millis() -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_ID_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ID_MILLIS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `<slug>-<base36 millis>`, unique even for identical titles.
pub fn generate_photo_id(title: &str) -> String {
    let slug = slugify(title);
    let slug = if slug.is_empty() { "photo" } else { slug.as_str() };
    format!("{}-{}", slug, to_base36(next_id_millis()))
}
