pub mod auth;
pub mod model;

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

pub use self::{
    auth::{BearerSession, ClientCredentials, TokenProvider},
    model::{ArrivalEstimate, Direction, DisplayStopOfRoute, NearbyBus, RouteInfo},
};

/// Every query asks for at most this many rows.
const MAX_ROWS: &str = "50";

/// Failures of the transit API client.
#[derive(Debug, Error)]
pub enum TransitError {
    /// The query matched no rows.
    #[error("No matching data found")]
    NotFound,
    /// The API still answered 401 after a token refresh.
    #[error("Unauthorized access to the transit API")]
    Unauthorized,
    /// Any other non-success status.
    #[error("Transit API returned unexpected status {0}")]
    UnexpectedStatus(StatusCode),
    /// Transport failure.
    #[error("Request error: {source}")]
    RequestError {
        /// The underlying reqwest error.
        #[from]
        source: reqwest::Error,
    },
    /// The body did not have the expected shape.
    #[error("Failed to decode response: {source}")]
    SerializationError {
        /// The underlying decoding error.
        #[from]
        source: serde_json::Error,
    },
    /// The configured base URL cannot be used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The token endpoint refused to issue a token.
    #[error("Failed to obtain access token: {0}")]
    TokenError(String),
}

/// Result type of the transit client.
pub type Result<T> = std::result::Result<T, TransitError>;

/// Typed queries against the transit data API.
#[automock]
#[async_trait]
pub trait TransitGateway: Send + Sync {
    /// Current arrival estimate for `station` on `route`. The station name must
    /// match the API display name exactly.
    async fn find_arrival_estimate(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
        station: &str,
    ) -> Result<ArrivalEstimate>;

    /// Name of the last stop of `route` when travelling in `direction`.
    async fn find_route_terminus(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
    ) -> Result<String>;

    /// Ordinal position of `station` along `route`.
    async fn find_stop_sequence(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
        station: &str,
    ) -> Result<u32>;

    /// Buses currently running `route` in `direction`.
    async fn find_nearby_buses(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
    ) -> Result<Vec<NearbyBus>>;
}

/// `TransitGateway` backed by the TDX basic v2 API.
pub struct TdxGateway {
    session: Arc<BearerSession>,
    base_url: Url,
}

impl TdxGateway {
    /// Creates a gateway that resolves resources under `base_url`.
    pub fn new(session: Arc<BearerSession>, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| TransitError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransitError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { session, base_url })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        resource: &str,
        city: &str,
        route: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>> {
        let url = build_url(&self.base_url, resource, city, route, filter)?;
        tracing::debug!("GET {url}");
        self.session.get_json(&url).await
    }
}

#[async_trait]
impl TransitGateway for TdxGateway {
    async fn find_arrival_estimate(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
        station: &str,
    ) -> Result<ArrivalEstimate> {
        let filter = station_filter(direction, station);
        let rows: Vec<ArrivalEstimate> =
            self.query("EstimatedTimeOfArrival", city, route, Some(&filter)).await?;
        rows.into_iter().next().ok_or(TransitError::NotFound)
    }

    async fn find_route_terminus(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
    ) -> Result<String> {
        let rows: Vec<RouteInfo> = self.query("Route", city, route, None).await?;
        let info = rows.first().ok_or(TransitError::NotFound)?;
        tracing::debug!(
            "Route {route} in {city}: {:?} -> {:?}",
            info.departure_stop_name_zh,
            info.destination_stop_name_zh
        );
        info.terminus(direction).map(str::to_string).ok_or(TransitError::NotFound)
    }

    async fn find_stop_sequence(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
        station: &str,
    ) -> Result<u32> {
        let filter = direction_filter(direction);
        let rows: Vec<DisplayStopOfRoute> =
            self.query("DisplayStopOfRoute", city, route, Some(&filter)).await?;
        rows.iter().find_map(|row| row.sequence_of(station)).ok_or(TransitError::NotFound)
    }

    async fn find_nearby_buses(
        &self,
        city: &str,
        route: &str,
        direction: Direction,
    ) -> Result<Vec<NearbyBus>> {
        let filter = direction_filter(direction);
        self.query("RealTimeNearStop", city, route, Some(&filter)).await
    }
}

/// `{base}/Bus/{resource}/City/{city}/{route}?$filter=..&$top=50&$format=JSON`
fn build_url(
    base: &Url,
    resource: &str,
    city: &str,
    route: &str,
    filter: Option<&str>,
) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransitError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(["Bus", resource, "City", city, route]);

    {
        let mut query = url.query_pairs_mut();
        if let Some(filter) = filter {
            query.append_pair("$filter", filter);
        }
        query.append_pair("$top", MAX_ROWS).append_pair("$format", "JSON");
    }

    Ok(url)
}

fn direction_filter(direction: Direction) -> String {
    format!("Direction eq {}", direction.code())
}

fn station_filter(direction: Direction, station: &str) -> String {
    format!("{} and StopName/Zh_tw eq '{}'", direction_filter(direction), odata_escape(station))
}

// OData string literals escape a quote by doubling it.
fn odata_escape(value: &str) -> String {
    value.replace('\'', "''")
}
