//! Villa repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, sqlite::SqliteRow, types::Json};
use tracing::info;
use uuid::Uuid;

use crate::models::{CreateVilla, UpdateVilla, Villa, VillaQuery, VillaSort};

const VILLA_SELECT: &str = r#"
    SELECT v.id, v.name, v.description, v.address, v.price_per_night, v.image_urls,
           v.created_at, v.updated_at,
           COALESCE(AVG(r.score), 0.0) AS average_rating,
           COUNT(r.id) AS total_ratings
    FROM villas v
    LEFT JOIN ratings r ON r.villa_id = v.id
"#;

fn villa_from_row(row: &SqliteRow) -> Result<Villa> {
    let image_urls: Json<Vec<String>> = row.try_get("image_urls")?;

    Ok(Villa {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        address: row.try_get("address")?,
        price_per_night: row.try_get("price_per_night")?,
        image_urls: image_urls.0,
        average_rating: row.try_get("average_rating")?,
        total_ratings: row.try_get("total_ratings")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Villa repository for database operations
#[derive(Clone)]
pub struct VillaRepository {
    pool: SqlitePool,
}

impl VillaRepository {
    /// Create a new villa repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a villa; a name already in use fails with a UNIQUE violation
    pub async fn create(&self, payload: &CreateVilla) -> Result<Villa> {
        info!("Creating villa: {}", payload.name);

        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO villas (id, name, description, address, price_per_night, image_urls, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.address.trim())
        .bind(payload.price_per_night)
        .bind(Json(&payload.image_urls))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Villa {} vanished after insert", id))
    }

    /// Whether another villa already uses `name`
    pub async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM villas WHERE name = ? COLLATE NOCASE")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let id: Uuid = row.try_get("id")?;
                Ok(Some(id) != except)
            }
            None => Ok(false),
        }
    }

    /// Find a villa by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Villa>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(VILLA_SELECT);
        builder.push(" WHERE v.id = ");
        builder.push_bind(id);
        builder.push(" GROUP BY v.id");

        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(villa_from_row).transpose()
    }

    /// List villas matching the keyword and price filters
    pub async fn search(&self, query: &VillaQuery) -> Result<Vec<Villa>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(VILLA_SELECT);
        builder.push(" WHERE 1 = 1");

        if let Some(keyword) = query.q.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            let pattern = format!("%{}%", keyword);
            builder.push(" AND (v.name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR v.address LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR v.description LIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(min_price) = query.min_price {
            builder.push(" AND v.price_per_night >= ");
            builder.push_bind(min_price);
        }

        if let Some(max_price) = query.max_price {
            builder.push(" AND v.price_per_night <= ");
            builder.push_bind(max_price);
        }

        builder.push(" GROUP BY v.id");
        builder.push(match query.sort.unwrap_or_default() {
            VillaSort::Name => " ORDER BY v.name ASC",
            VillaSort::PriceAsc => " ORDER BY v.price_per_night ASC, v.name ASC",
            VillaSort::PriceDesc => " ORDER BY v.price_per_night DESC, v.name ASC",
            VillaSort::Rating => " ORDER BY average_rating DESC, total_ratings DESC, v.name ASC",
        });

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(villa_from_row).collect()
    }

    /// Apply a partial update, returning the new state
    pub async fn update(&self, id: Uuid, update: &UpdateVilla) -> Result<Option<Villa>> {
        let result = sqlx::query(
            r#"
            UPDATE villas
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                address = COALESCE(?, address),
                price_per_night = COALESCE(?, price_per_night),
                image_urls = COALESCE(?, image_urls),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.address.as_deref().map(str::trim))
        .bind(update.price_per_night)
        .bind(update.image_urls.as_ref().map(Json))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    /// Whether any booking, in any status, references the villa
    pub async fn has_bookings(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM bookings WHERE villa_id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Delete a villa; its ratings go with it
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM villas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::init_memory_pool;

    fn villa(name: &str, address: &str, price: f64) -> CreateVilla {
        CreateVilla {
            name: name.to_string(),
            description: format!("{} description", name),
            address: address.to_string(),
            price_per_night: price,
            image_urls: vec![format!("https://img.example.com/{}.jpg", name)],
        }
    }

    async fn seeded() -> VillaRepository {
        let pool = init_memory_pool().await.unwrap();
        let repo = VillaRepository::new(pool);
        repo.create(&villa("Casa Azul", "Goa", 120.0)).await.unwrap();
        repo.create(&villa("Palm Retreat", "Kerala", 80.0)).await.unwrap();
        repo.create(&villa("Hilltop", "Goa Hills", 200.0)).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn create_round_trips_images() {
        let repo = seeded().await;
        let all = repo.search(&VillaQuery::default()).await.unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Casa Azul");
        assert_eq!(all[0].image_urls, vec!["https://img.example.com/Casa Azul.jpg"]);
        assert_eq!(all[0].total_ratings, 0);
        assert_eq!(all[0].average_rating, 0.0);
    }

    #[tokio::test]
    async fn search_filters_and_sorts() {
        let repo = seeded().await;

        let goa = repo
            .search(&VillaQuery {
                q: Some("goa".to_string()),
                sort: Some(VillaSort::PriceDesc),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = goa.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Hilltop", "Casa Azul"]);

        let cheap = repo
            .search(&VillaQuery {
                max_price: Some(150.0),
                sort: Some(VillaSort::PriceAsc),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = cheap.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Palm Retreat", "Casa Azul"]);
    }

    #[tokio::test]
    async fn name_uniqueness_is_case_insensitive() {
        let repo = seeded().await;
        assert!(repo.name_taken("casa azul", None).await.unwrap());

        let existing = repo.search(&VillaQuery::default()).await.unwrap();
        assert!(!repo.name_taken("Casa Azul", Some(existing[0].id)).await.unwrap());
        assert!(!repo.name_taken("Nowhere", None).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_names_hit_the_unique_constraint() {
        let repo = seeded().await;

        let err = repo
            .create(&villa("CASA AZUL", "Elsewhere", 99.0))
            .await
            .unwrap_err();
        assert!(common::database::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let repo = seeded().await;
        let target = repo.search(&VillaQuery::default()).await.unwrap().remove(0);

        let updated = repo
            .update(
                target.id,
                &UpdateVilla {
                    price_per_night: Some(150.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.price_per_night, 150.0);
        assert_eq!(updated.name, target.name);
        assert_eq!(updated.image_urls, target.image_urls);
        assert!(repo.update(Uuid::new_v4(), &UpdateVilla::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let repo = seeded().await;
        let target = repo.search(&VillaQuery::default()).await.unwrap().remove(0);

        assert!(!repo.has_bookings(target.id).await.unwrap());
        assert!(repo.delete(target.id).await.unwrap());
        assert!(!repo.delete(target.id).await.unwrap());
        assert!(repo.find_by_id(target.id).await.unwrap().is_none());
    }
}
