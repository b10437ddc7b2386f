// File: console/src/constants.rs

/// Defaults applied when config/main.toml is absent or partial.
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8095;
    pub const DATABASE_PATH: &str = "data/console.db";
}

pub mod dashboard {
    /// Window for the "upcoming maintenance" dashboard counter.
    pub const UPCOMING_WINDOW_HOURS: i64 = 24;
}
