use {
    askgeorge_common::types::Coordinate,
    async_trait::async_trait,
    sqlx::SqlitePool,
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    geo,
};

/// A stored point of interest, as returned by a proximity query.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: i64,
    /// Identifier understood by the place-details provider.
    pub place_ref: String,
    pub name: Option<String>,
    /// Cached opening hours text (weekly lines joined by `\n`).
    pub hours: Option<String>,
    pub category: Option<String>,
    /// Miles from the query origin.
    pub distance: f64,
}

/// Fields for inserting a place.
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub place_ref: String,
    pub name: Option<String>,
    pub hours: Option<String>,
    pub category: Option<String>,
    pub location: Coordinate,
}

impl NewPlace {
    pub fn new(place_ref: impl Into<String>, location: Coordinate) -> Self {
        Self {
            place_ref: place_ref.into(),
            name: None,
            hours: None,
            category: None,
            location,
        }
    }
}

/// Proximity queries plus the two cache-back writes the reply pipeline makes.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Page through places ordered by ascending distance from `origin`.
    async fn nearest(&self, origin: Coordinate, limit: u32, offset: u32) -> Result<Vec<Place>>;
    async fn update_cached_hours(&self, id: i64, hours: &str) -> Result<()>;
    async fn update_cached_name(&self, id: i64, name: &str) -> Result<()>;
}

/// SQLite-backed place store.
pub struct SqlitePlaceStore {
    pool: SqlitePool,
}

impl SqlitePlaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a place, returning its row id.
    pub async fn insert(&self, place: &NewPlace) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO places (place_ref, name, hours, category, lat, lng)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&place.place_ref)
        .bind(&place.name)
        .bind(&place.hours)
        .bind(&place.category)
        .bind(place.location.lat)
        .bind(place.location.lng)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

#[derive(sqlx::FromRow)]
struct NearestRow {
    id: i64,
    place_ref: String,
    name: Option<String>,
    hours: Option<String>,
    category: Option<String>,
    dist2: f64,
}

#[async_trait]
impl PlaceStore for SqlitePlaceStore {
    async fn nearest(&self, origin: Coordinate, limit: u32, offset: u32) -> Result<Vec<Place>> {
        // Order and reported distance both derive from `dist2`; `id` breaks ties.
        let rows = sqlx::query_as::<_, NearestRow>(
            "SELECT id, place_ref, name, hours, category,
                    (lat - ?1) * (lat - ?1) + ((lng - ?2) * ?3) * ((lng - ?2) * ?3) AS dist2
             FROM places
             ORDER BY dist2 ASC, id ASC
             LIMIT ?4 OFFSET ?5",
        )
        .bind(origin.lat)
        .bind(origin.lng)
        .bind(geo::lng_scale(origin.lat))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(%origin, limit, offset, found = rows.len(), "nearest places");

        Ok(rows
            .into_iter()
            .map(|r| Place {
                id: r.id,
                place_ref: r.place_ref,
                name: r.name,
                hours: r.hours,
                category: r.category,
                distance: geo::squared_degrees_to_miles(r.dist2),
            })
            .collect())
    }

    async fn update_cached_hours(&self, id: i64, hours: &str) -> Result<()> {
        let result = sqlx::query("UPDATE places SET hours = ? WHERE id = ?")
            .bind(hours)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound { id });
        }
        Ok(())
    }

    async fn update_cached_name(&self, id: i64, name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE places SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound { id });
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, sqlx::sqlite::SqlitePoolOptions};

    const BRYANT_PARK: Coordinate = Coordinate::new(40.7536, -73.9832);

    async fn test_store() -> SqlitePlaceStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqlitePlaceStore::new(pool)
    }

    /// Seed `n` places marching north from Bryant Park, ~0.07 mi apart.
    async fn seed_line(store: &SqlitePlaceStore, n: usize) {
        // Insert in reverse so row order differs from distance order.
        for i in (0..n).rev() {
            store
                .insert(&NewPlace {
                    name: Some(format!("Place {i}")),
                    ..NewPlace::new(
                        format!("ref-{i}"),
                        Coordinate::new(BRYANT_PARK.lat + 0.001 * i as f64, BRYANT_PARK.lng),
                    )
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn nearest_orders_by_distance() {
        let store = test_store().await;
        seed_line(&store, 4).await;

        let page = store.nearest(BRYANT_PARK, 5, 0).await.unwrap();
        let refs: Vec<_> = page.iter().map(|p| p.place_ref.as_str()).collect();
        assert_eq!(refs, ["ref-0", "ref-1", "ref-2", "ref-3"]);
        assert!(page[0].distance < 0.001);
        assert!(page.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn nearest_pages_with_offset() {
        let store = test_store().await;
        seed_line(&store, 12).await;

        let second = store.nearest(BRYANT_PARK, 5, 5).await.unwrap();
        let refs: Vec<_> = second.iter().map(|p| p.place_ref.as_str()).collect();
        assert_eq!(refs, ["ref-5", "ref-6", "ref-7", "ref-8", "ref-9"]);

        let third = store.nearest(BRYANT_PARK, 5, 10).await.unwrap();
        assert_eq!(third.len(), 2);

        assert!(store.nearest(BRYANT_PARK, 5, 15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn distance_is_in_miles() {
        let store = test_store().await;
        seed_line(&store, 2).await;
        let page = store.nearest(BRYANT_PARK, 5, 0).await.unwrap();
        // 0.001 degrees of latitude is about 0.069 miles.
        assert!((page[1].distance - 0.069).abs() < 0.001, "{}", page[1].distance);
    }

    #[tokio::test]
    async fn cache_writes() {
        let store = test_store().await;
        let id = store
            .insert(&NewPlace::new("ChIJ-bryant", BRYANT_PARK))
            .await
            .unwrap();

        store
            .update_cached_hours(id, "Monday: 7:00 AM – 11:00 PM")
            .await
            .unwrap();
        store
            .update_cached_name(id, "Bryant Park Restroom")
            .await
            .unwrap();

        let place = &store.nearest(BRYANT_PARK, 1, 0).await.unwrap()[0];
        assert_eq!(place.name.as_deref(), Some("Bryant Park Restroom"));
        assert_eq!(place.hours.as_deref(), Some("Monday: 7:00 AM – 11:00 PM"));
        assert!(place.category.is_none());
    }

    #[tokio::test]
    async fn cache_write_for_missing_place_fails() {
        let store = test_store().await;
        assert!(matches!(
            store.update_cached_name(42, "x").await.unwrap_err(),
            Error::NotFound { id: 42 }
        ));
    }
}
