use failure::Error;
use station::{PollerConfig, StationProfile};
use std::fs;
use std::path::Path;
use std::time::Duration;
use toml;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub poll_interval_seconds: u64,
    pub display_refresh_seconds: u64,
    pub aux_feed_max_age_seconds: u64,
    pub first_update_wait_seconds: u64,
    pub stop_timeout_seconds: u64,

    pub log_file: String,
    pub log_level: String,

    pub light: LightConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    pub red_pin: u8,
    pub green_pin: u8,
    pub blue_pin: u8,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            base_url: "http://lwalab.phys.unm.edu".to_string(),
            poll_interval_seconds: 180,
            display_refresh_seconds: 30,
            aux_feed_max_age_seconds: 120,
            first_update_wait_seconds: 5,
            stop_timeout_seconds: 5,
            log_file: "lwa_status_light.log".to_string(),
            log_level: "info".to_string(),
            light: LightConfig::default(),
        }
    }
}

impl Default for LightConfig {
    fn default() -> LightConfig {
        LightConfig {
            red_pin: 17,
            green_pin: 27,
            blue_pin: 22,
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Config, Error> {
        let config: Config = toml::from_str(contents)?;
        if config.poll_interval_seconds == 0 {
            return Err(format_err!("poll_interval_seconds must be at least 1"));
        }
        if config.display_refresh_seconds == 0 {
            return Err(format_err!("display_refresh_seconds must be at least 1"));
        }
        Ok(config)
    }

    /// Reads `path`, or falls back to the defaults when there is no such file.
    pub fn load(path: &Path) -> Result<Config, Error> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format_err!("Unable to read {}: {}", path.display(), e))?;
        Config::from_toml(&contents).map_err(|e| format_err!("Invalid config {}: {}", path.display(), e))
    }

    pub fn poller_config(&self, station: StationProfile) -> PollerConfig {
        let mut config = PollerConfig::new(station, &self.base_url);
        config.poll_interval = Duration::from_secs(self.poll_interval_seconds);
        config.aux_feed_max_age = Duration::from_secs(self.aux_feed_max_age_seconds);
        config.stop_timeout = Duration::from_secs(self.stop_timeout_seconds);
        config
    }

    pub fn display_refresh(&self) -> Duration {
        Duration::from_secs(self.display_refresh_seconds)
    }

    pub fn first_update_wait(&self) -> Duration {
        Duration::from_secs(self.first_update_wait_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_matches_defaults() {
        let config = Config::from_toml(include_str!("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::from_toml(
            "poll_interval_seconds = 60\n[light]\nred_pin = 5\n",
        )
        .unwrap();
        assert_eq!(config.poll_interval_seconds, 60);
        assert_eq!(config.light.red_pin, 5);
        assert_eq!(config.light.green_pin, 27);
        assert_eq!(config.base_url, "http://lwalab.phys.unm.edu");
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Config::from_toml("poll_interval_seconds = 0").is_err());
        assert!(Config::from_toml("display_refresh_seconds = 0").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/lwa_status_light/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn poller_config_carries_timings() {
        let config = Config::from_toml("poll_interval_seconds = 90\nstop_timeout_seconds = 2").unwrap();
        let poller = config.poller_config(StationProfile::lwana());
        assert_eq!(poller.poll_interval, Duration::from_secs(90));
        assert_eq!(poller.stop_timeout, Duration::from_secs(2));
        assert_eq!(poller.station.recorder_count, 4);
        assert_eq!(poller.base_url, "http://lwalab.phys.unm.edu");
    }
}
