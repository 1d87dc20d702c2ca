use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Client for an OSRM-compatible routing service.
#[derive(Clone)]
pub struct RoutingClient {
    inner: reqwest::Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    geometry: Geometry,
}

/// GeoJSON line string, `[lng, lat]` pairs.
#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

impl RoutingClient {
    pub fn new(base: &str, timeout: Duration) -> AppResult<Self> {
        let base = base
            .parse()
            .map_err(|e| AppError::Internal(format!("{base} is not a valid url: {e}")))?;
        let inner = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { inner, base })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.routing_service_url,
            Duration::from_secs(config.routing_timeout_secs),
        )
    }

    /// Driving route polyline as `(lat, lng)` vertices, origin first.
    pub async fn driving_route(&self, from: (f64, f64), to: (f64, f64)) -> AppResult<Vec<(f64, f64)>> {
        let path = format!(
            "/route/v1/driving/{},{};{},{}",
            from.1, from.0, to.1, to.0
        );
        let mut url = self
            .base
            .join(&path)
            .map_err(|e| AppError::Internal(format!("error joining url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");

        tracing::debug!(%url, "Requesting driving route");
        let response: RouteResponse = self.inner.get(url).send().await?.json().await?;

        route_vertices(response)
    }
}

fn route_vertices(response: RouteResponse) -> AppResult<Vec<(f64, f64)>> {
    if response.code != "Ok" {
        return Err(AppError::Routing(format!(
            "{}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Routing("no route returned".to_string()))?;

    Ok(route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| (lat, lng))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_are_swapped_to_lat_lng() {
        let body = r#"{
            "code": "Ok",
            "routes": [{"geometry": {"type": "LineString", "coordinates": [[13.40, 52.52], [16.93, 52.41]]}}]
        }"#;
        let response: RouteResponse = serde_json::from_str(body).unwrap();
        let vertices = route_vertices(response).unwrap();
        assert_eq!(vertices, vec![(52.52, 13.40), (52.41, 16.93)]);
    }

    #[test]
    fn test_error_code_is_reported() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route"}"#;
        let response: RouteResponse = serde_json::from_str(body).unwrap();
        let err = route_vertices(response).unwrap_err();
        assert!(matches!(err, AppError::Routing(msg) if msg.contains("NoRoute")));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(RoutingClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
