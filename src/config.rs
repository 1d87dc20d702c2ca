use std::env;
use std::str::FromStr;

use crate::matching::ScoreWeights;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub routing_service_url: String,
    pub routing_timeout_secs: u64,
    pub route_snap_radius_km: f64,
    pub match_default_limit: usize,
    pub score_weights: ScoreWeights,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env_or("SERVER_PORT", 3000),
            routing_service_url: env::var("ROUTING_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            routing_timeout_secs: env_or("ROUTING_TIMEOUT_SECS", 10),
            route_snap_radius_km: env_or("ROUTE_SNAP_RADIUS_KM", 3.0),
            match_default_limit: env_or("MATCH_DEFAULT_LIMIT", 10),
            score_weights: score_weights_from_env(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn score_weights_from_env() -> ScoreWeights {
    let defaults = ScoreWeights::default();

    ScoreWeights {
        exact_match: env_or("SCORE_EXACT_MATCH", defaults.exact_match),
        nearby_match: env_or("SCORE_NEARBY_MATCH", defaults.nearby_match),
        in_time: env_or("SCORE_IN_TIME", defaults.in_time),
        late_penalty_per_day: env_or("SCORE_LATE_PENALTY_PER_DAY", defaults.late_penalty_per_day),
        capacity_full_fit: env_or("SCORE_CAPACITY_FULL_FIT", defaults.capacity_full_fit),
        capacity_underload: env_or("SCORE_CAPACITY_UNDERLOAD", defaults.capacity_underload),
        capacity_slight_overload: env_or(
            "SCORE_CAPACITY_SLIGHT_OVERLOAD",
            defaults.capacity_slight_overload,
        ),
        capacity_overload: env_or("SCORE_CAPACITY_OVERLOAD", defaults.capacity_overload),
    }
}

/// Read an optional variable, falling back to `default` when unset.
/// A value that is set but malformed is a startup error.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(name) {
        Ok(raw) => parse_setting(name, &raw),
        Err(_) => default,
    }
}

fn parse_setting<T: FromStr>(name: &str, raw: &str) -> T {
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid number, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setting() {
        let port: u16 = parse_setting("SERVER_PORT", " 8080 ");
        assert_eq!(port, 8080);
        let penalty: i32 = parse_setting("SCORE_CAPACITY_OVERLOAD", "-30");
        assert_eq!(penalty, -30);
    }

    #[test]
    #[should_panic(expected = "ROUTE_SNAP_RADIUS_KM must be a valid number")]
    fn test_malformed_setting_panics() {
        let _: f64 = parse_setting("ROUTE_SNAP_RADIUS_KM", "three");
    }
}
