use std::path::PathBuf;

pub const ENV_LISTEN_ADDR: &str = "BILLIARDS_LISTEN_ADDR";
pub const ENV_RNG_SEED: &str = "BILLIARDS_RNG_SEED";
pub const ENV_SCORE_FILE: &str = "BILLIARDS_SCORE_FILE";

/// Host configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_rate_hz: u32,
    pub broadcast_rate_hz: u32,
    pub rng_seed: u64,
    /// JSON score document; results are kept in memory only when unset
    pub score_file: Option<PathBuf>,
    /// How long a foul notice stays in the snapshot (seconds of simulation)
    pub foul_notice_secs: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9002".to_string(),
            tick_rate_hz: 60,
            broadcast_rate_hz: 30,
            rng_seed: 42,
            score_file: None,
            foul_notice_secs: 3.0,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `BILLIARDS_*` environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        if let Some(addr) = lookup(ENV_LISTEN_ADDR) {
            config.listen_addr = addr;
        }
        if let Some(seed) = lookup(ENV_RNG_SEED) {
            config.rng_seed = seed
                .trim()
                .parse()
                .map_err(|e| format!("{} is not a valid seed: {}", ENV_RNG_SEED, e))?;
        }
        if let Some(path) = lookup(ENV_SCORE_FILE).filter(|p| !p.is_empty()) {
            config.score_file = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.broadcast_rate_hz == 0 || self.broadcast_rate_hz > self.tick_rate_hz {
            return Err("broadcast_rate_hz must be within 1..=tick_rate_hz".to_string());
        }
        if !self.foul_notice_secs.is_finite() || self.foul_notice_secs < 0.0 {
            return Err("foul_notice_secs must be finite and >= 0".to_string());
        }
        Ok(())
    }
}
