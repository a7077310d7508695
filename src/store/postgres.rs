use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Row};

use crate::model::{Device, Filter, Id, Location, QueryPlan, Sort};
use crate::store::traits::{DeviceStore, LocationStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS devices (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS devices_name_idx ON devices (name, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id UUID PRIMARY KEY,
        device_id UUID NOT NULL,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS locations_device_idx ON locations (device_id, created_at)",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the two collections if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .context("Failed to bootstrap database schema")?;
        }
        Ok(())
    }
}

fn device_sort_column(field: &str) -> Option<&'static str> {
    match field {
        "_id" | "id" => Some("id"),
        "name" => Some("name"),
        "createdAt" => Some("created_at"),
        _ => None,
    }
}

fn location_sort_column(field: &str) -> Option<&'static str> {
    match field {
        "_id" | "id" => Some("id"),
        "device" => Some("device_id"),
        "latitude" => Some("latitude"),
        "longitude" => Some("longitude"),
        "createdAt" => Some("created_at"),
        _ => None,
    }
}

/// Append ORDER BY / LIMIT / OFFSET. Only whitelisted column names reach the SQL text.
fn push_window(
    builder: &mut QueryBuilder<'_, Postgres>,
    sort: &Sort,
    column: Option<&'static str>,
    plan: &QueryPlan,
) {
    match column {
        Some(column) => {
            let direction = sort.direction.as_sql();
            builder
                .push(" ORDER BY ")
                .push(column)
                .push(" ")
                .push(direction)
                .push(", id ")
                .push(direction);
        }
        // Unknown sort keys keep insertion order
        None => {
            builder.push(" ORDER BY created_at ASC, id ASC");
        }
    }

    if let Some(limit) = plan.limit {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(plan.skip).unwrap_or(i64::MAX));
    }
}

fn row_to_device(row: &sqlx::postgres::PgRow) -> Device {
    Device {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn row_to_location(row: &sqlx::postgres::PgRow) -> Location {
    Location {
        id: row.get("id"),
        device: row.get("device_id"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        created_at: row.get("created_at"),
    }
}

#[async_trait::async_trait]
impl DeviceStore for PostgresStore {
    async fn insert_device(&self, device: Device) -> Result<()> {
        sqlx::query("INSERT INTO devices (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(device.id)
            .bind(&device.name)
            .bind(device.created_at)
            .execute(&self.pool)
            .await
            .context("Failed to insert device")?;

        Ok(())
    }

    async fn get_device(&self, id: &Id) -> Result<Option<Device>> {
        let row = sqlx::query("SELECT id, name, created_at FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch device")?;

        Ok(row.as_ref().map(row_to_device))
    }

    async fn find_device_by_name(&self, name: &str) -> Result<Option<Device>> {
        let row = sqlx::query(
            "SELECT id, name, created_at FROM devices WHERE name = $1 ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up device by name")?;

        Ok(row.as_ref().map(row_to_device))
    }

    async fn get_devices(&self, ids: &[Id]) -> Result<Vec<Device>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT id, name, created_at FROM devices WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch referenced devices")?;

        Ok(rows.iter().map(row_to_device).collect())
    }

    async fn find_devices(&self, plan: &QueryPlan) -> Result<Vec<Device>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, name, created_at FROM devices");
        if let Some(device) = plan.filter.device {
            builder.push(" WHERE id = ").push_bind(device);
        }
        push_window(&mut builder, &plan.sort, device_sort_column(&plan.sort.field), plan);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list devices")?;

        Ok(rows.iter().map(row_to_device).collect())
    }

    async fn count_devices(&self, filter: &Filter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM devices");
        if let Some(device) = filter.device {
            builder.push(" WHERE id = ").push_bind(device);
        }

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count devices")?;

        Ok(count.max(0) as u64)
    }
}

#[async_trait::async_trait]
impl LocationStore for PostgresStore {
    async fn insert_location(&self, location: Location) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, device_id, latitude, longitude, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(location.id)
        .bind(location.device)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert location")?;

        Ok(())
    }

    async fn find_locations(&self, plan: &QueryPlan) -> Result<Vec<Location>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, device_id, latitude, longitude, created_at FROM locations",
        );
        if let Some(device) = plan.filter.device {
            builder.push(" WHERE device_id = ").push_bind(device);
        }
        push_window(&mut builder, &plan.sort, location_sort_column(&plan.sort.field), plan);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list locations")?;

        Ok(rows.iter().map(row_to_location).collect())
    }

    async fn count_locations(&self, filter: &Filter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM locations");
        if let Some(device) = filter.device {
            builder.push(" WHERE device_id = ").push_bind(device);
        }

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count locations")?;

        Ok(count.max(0) as u64)
    }
}
