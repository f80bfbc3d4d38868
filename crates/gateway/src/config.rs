//! Gateway configuration.

use std::env;

use common::{CacheConfig, GrpcClientConfig, JwtConfig, RateLimitConfig};

const DEFAULT_LEDGER_URL: &str = "http://localhost:50061";
const DEFAULT_COURSE_URL: &str = "http://localhost:50062";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Ledger service gRPC client
    pub ledger_service: GrpcClientConfig,
    /// Course service gRPC client
    pub course_service: GrpcClientConfig,
    /// Redis for caching and rate limiting
    pub cache: CacheConfig,
    /// Access token verification
    pub jwt: JwtConfig,
    /// General rate limit
    pub rate_limit: RateLimitConfig,
    /// Stricter limit for maintenance endpoints
    pub rate_limit_admin: RateLimitConfig,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ledger_service: GrpcClientConfig::from_env("LEDGER_SERVICE", DEFAULT_LEDGER_URL),
            course_service: GrpcClientConfig::from_env("COURSE_SERVICE", DEFAULT_COURSE_URL),
            cache: CacheConfig::from_env("GATEWAY"),
            jwt: JwtConfig::from_env("GATEWAY"),
            rate_limit: RateLimitConfig::from_env("", defaults.rate_limit),
            rate_limit_admin: RateLimitConfig::from_env("ADMIN_", defaults.rate_limit_admin),
            host: env::var("GATEWAY_HOST").unwrap_or(defaults.host),
            port: env::var("GATEWAY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// Extract ledger service port from URL.
    pub fn ledger_port(&self) -> u16 {
        self.ledger_service.port(50061)
    }

    /// Extract course service port from URL.
    pub fn course_port(&self) -> u16 {
        self.course_service.port(50062)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ledger_service: GrpcClientConfig {
                endpoint: DEFAULT_LEDGER_URL.to_string(),
                ..GrpcClientConfig::default()
            },
            course_service: GrpcClientConfig {
                endpoint: DEFAULT_COURSE_URL.to_string(),
                ..GrpcClientConfig::default()
            },
            cache: CacheConfig::default(),
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
            rate_limit_admin: RateLimitConfig {
                max_requests: 5,
                window_seconds: 60,
            },
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_follow_urls() {
        let config = GatewayConfig::default();
        assert_eq!(config.ledger_port(), 50061);
        assert_eq!(config.course_port(), 50062);
        assert!(config.rate_limit_admin.max_requests < config.rate_limit.max_requests);
    }
}
