use eyre::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Total site power available for allocation, in watts.
    pub site_power_limit: i64,
    /// How far back the simulator reaches into stored price history.
    pub sim_hours: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "arb_data.db".to_string());
        let site_power_limit = env_i64("SITE_POWER_LIMIT", 1_000_000);
        let sim_hours = env_i64("SIM_HOURS", 24);

        Ok(Config {
            db_path,
            site_power_limit,
            sim_hours,
        })
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
