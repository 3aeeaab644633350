use chrono::{Duration, Utc};
use eyre::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::domain::{Category, DeviceCatalog, DeviceSpec, PriceSnapshot};

/// Read-side adapter over the collector's sqlite database. The polling
/// collector owns all writes; this store only supplies the catalog and
/// price history the engine consumes.
#[derive(Clone)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    pub async fn new(db_path: &str) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", db_path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    // A fresh database reads as empty instead of erroring on missing tables.
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pricing (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                energy_price REAL NOT NULL,
                hash_price REAL NOT NULL,
                token_price REAL NOT NULL,
                collected_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS inventory (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                subtype TEXT NOT NULL,
                power INTEGER NOT NULL,
                capability INTEGER NOT NULL,
                collected_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_catalog(&self) -> Result<DeviceCatalog> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT type, subtype, power, capability FROM inventory",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeviceSpec::from).collect())
    }

    pub async fn latest_prices(&self) -> Result<Option<PriceSnapshot>> {
        let row = sqlx::query_as::<_, PricingRow>(
            "SELECT timestamp, energy_price, hash_price, token_price FROM pricing ORDER BY collected_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PriceSnapshot::from))
    }

    pub async fn price_history(&self, hours: i64) -> Result<Vec<PriceSnapshot>> {
        let since = (Utc::now() - Duration::hours(hours)).to_rfc3339();
        let rows = sqlx::query_as::<_, PricingRow>(
            "SELECT timestamp, energy_price, hash_price, token_price FROM pricing WHERE collected_at >= ? ORDER BY collected_at ASC",
        )
        .bind(&since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PriceSnapshot::from).collect())
    }
}

// --- Row types for sqlx ---

#[derive(sqlx::FromRow)]
struct InventoryRow {
    #[sqlx(rename = "type")]
    kind: String,
    subtype: String,
    power: i64,
    capability: i64,
}

impl From<InventoryRow> for DeviceSpec {
    fn from(r: InventoryRow) -> Self {
        DeviceSpec {
            category: if r.kind == "miner" {
                Category::Miner
            } else {
                Category::Inference
            },
            subtype: r.subtype,
            power_watts: r.power,
            capability: r.capability as f64,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PricingRow {
    timestamp: String,
    energy_price: f64,
    hash_price: f64,
    token_price: f64,
}

impl From<PricingRow> for PriceSnapshot {
    fn from(r: PricingRow) -> Self {
        PriceSnapshot {
            energy_price: r.energy_price,
            hash_price: r.hash_price,
            token_price: r.token_price,
            timestamp: chrono::DateTime::parse_from_rfc3339(&r.timestamp)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(name: &str) -> Store {
        let path = std::env::temp_dir().join(format!("watt-arb-{}-{}.db", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        Store::new(path.to_str().unwrap()).await.unwrap()
    }

    async fn seed_device(store: &Store, kind: &str, subtype: &str, power: i64, capability: i64) {
        sqlx::query(
            "INSERT INTO inventory (type, subtype, power, capability, collected_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(kind)
        .bind(subtype)
        .bind(power)
        .bind(capability)
        .bind(Utc::now().to_rfc3339())
        .execute(&store.pool)
        .await
        .unwrap();
    }

    async fn seed_prices(
        store: &Store,
        energy: f64,
        hash: f64,
        token: f64,
        collected_at: chrono::DateTime<Utc>,
    ) {
        sqlx::query(
            "INSERT INTO pricing (timestamp, energy_price, hash_price, token_price, collected_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(collected_at.to_rfc3339())
        .bind(energy)
        .bind(hash)
        .bind(token)
        .bind(collected_at.to_rfc3339())
        .execute(&store.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn fresh_database_reads_as_empty() {
        let store = test_store("empty").await;
        assert!(store.load_catalog().await.unwrap().is_empty());
        assert!(store.latest_prices().await.unwrap().is_none());
        assert!(store.price_history(24).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn catalog_round_trips_inventory_rows() {
        let store = test_store("catalog").await;
        seed_device(&store, "miner", "hydro", 5000, 5000).await;
        seed_device(&store, "inference", "asic", 15000, 50000).await;

        let catalog = store.load_catalog().await.unwrap();
        assert_eq!(catalog.len(), 2);

        let hydro = catalog.get(Category::Miner, "hydro").unwrap();
        assert_eq!(hydro.power_watts, 5000);
        assert_eq!(hydro.capability, 5000.0);

        let asic = catalog.get(Category::Inference, "asic").unwrap();
        assert_eq!(asic.category, Category::Inference);
        assert_eq!(asic.capability, 50000.0);
    }

    #[tokio::test]
    async fn latest_prices_and_windowed_history() {
        let store = test_store("pricing").await;
        let now = Utc::now();
        seed_prices(&store, 0.70, 9.0, 2.5, now - Duration::hours(48)).await;
        seed_prices(&store, 0.65, 8.5, 3.0, now - Duration::minutes(10)).await;
        seed_prices(&store, 0.60, 8.0, 3.5, now - Duration::minutes(5)).await;

        let latest = store.latest_prices().await.unwrap().unwrap();
        assert_eq!(latest.energy_price, 0.60);

        let history = store.price_history(24).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].timestamp < history[1].timestamp);
        assert_eq!(history[0].energy_price, 0.65);
    }
}
