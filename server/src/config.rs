use std::time::Duration;

/// Runtime settings for the server, usually filled from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP socket binds to, e.g. `127.0.0.1:8080`
    pub bind_addr: String,
    /// Physics and broadcast ticks per second
    pub tick_rate: u32,
    /// Maximum concurrent connections across all rooms
    pub max_clients: usize,
    /// Silence after which a client counts as disconnected
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            tick_rate: 60,
            max_clients: 256,
            client_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_clients, 256);
        assert_eq!(config.client_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_tick_duration() {
        let config = ServerConfig::default();
        let micros = config.tick_duration().as_micros();
        assert!((16_660..=16_670).contains(&micros));

        let config = ServerConfig {
            tick_rate: 30,
            ..ServerConfig::default()
        };
        assert_eq!(config.tick_duration().as_millis(), 33);
    }

    #[test]
    fn test_zero_tick_rate_is_clamped() {
        let config = ServerConfig {
            tick_rate: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
    }
}
