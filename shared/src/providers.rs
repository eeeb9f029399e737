//! Request builders and response parsers for the remote providers: the
//! geocoder, the weather service and the Overpass places API.
//!
//! Only wire contracts live here. Deciding what a response means for the
//! session is left to the caller.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::capabilities::{HttpError, HttpRequest, HttpResult, ValidatedUrl};
use crate::config::CoreConfig;
use crate::geo::GeoPoint;
use crate::model::Place;
use crate::nearby::{NearbyCategory, SearchRadius};
use crate::weather::CurrentWeather;
use crate::NEARBY_QUERY_TIMEOUT_S;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("no results")]
    NoResults,
}

impl ProviderError {
    /// Unwraps the transport result and parses a 2xx JSON body.
    fn parse<T: serde::de::DeserializeOwned>(result: HttpResult) -> Result<T, Self> {
        Ok(result?.json::<T>()?)
    }
}

// Geocoder

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    hits: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    #[serde(default)]
    name: String,
    point: HitPoint,
    country: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    street: Option<String>,
    housenumber: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HitPoint {
    lat: f64,
    lng: f64,
}

impl GeocodeHit {
    fn into_place(self) -> Option<Place> {
        let point = match GeoPoint::new(self.point.lat, self.point.lng) {
            Ok(point) => point,
            Err(e) => {
                tracing::warn!(name = %self.name, error = %e, "dropping geocoder hit");
                return None;
            }
        };
        let address = join_address(self.street.as_deref(), self.housenumber.as_deref());
        Some(Place {
            name: self.name,
            point,
            country: self.country.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            address,
            postcode: self.postcode.unwrap_or_default(),
        })
    }
}

/// `"Rue de Rivoli 99"`, or whichever half is present.
fn join_address(street: Option<&str>, housenumber: Option<&str>) -> String {
    [street, housenumber]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn with_key<'a>(
    mut params: Vec<(&'a str, String)>,
    config: &CoreConfig,
) -> Vec<(&'a str, String)> {
    if let Some(key) = &config.geocoder_api_key {
        params.push(("key", key.clone()));
    }
    params
}

/// `GET <geocoder>?q=<text>&limit=<n>[&key=..]`
pub fn geocode_request(config: &CoreConfig, query: &str) -> Result<HttpRequest, HttpError> {
    let params = with_key(
        vec![
            ("q", query.to_string()),
            ("limit", config.geocoder_result_limit.to_string()),
        ],
        config,
    );
    let url = ValidatedUrl::with_query(&config.geocoder_url, params)?;
    Ok(HttpRequest::get(url))
}

/// `GET <geocoder>?reverse=true&point=<lat>,<lng>[&key=..]`
pub fn reverse_geocode_request(
    config: &CoreConfig,
    point: GeoPoint,
) -> Result<HttpRequest, HttpError> {
    let params = with_key(
        vec![
            ("reverse", "true".to_string()),
            ("point", format!("{},{}", point.lat(), point.lng())),
        ],
        config,
    );
    let url = ValidatedUrl::with_query(&config.geocoder_url, params)?;
    Ok(HttpRequest::get(url))
}

/// Forward lookup hits in provider order. An empty list means "no results".
pub fn parse_geocode(result: HttpResult) -> Result<Vec<Place>, ProviderError> {
    let response: GeocodeResponse = ProviderError::parse(result)?;
    Ok(response
        .hits
        .into_iter()
        .filter_map(GeocodeHit::into_place)
        .collect())
}

/// The first hit of a reverse lookup.
pub fn parse_reverse_geocode(result: HttpResult) -> Result<Place, ProviderError> {
    parse_geocode(result)?
        .into_iter()
        .next()
        .ok_or(ProviderError::NoResults)
}

// Weather

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

/// `GET <weather>?latitude=..&longitude=..&current_weather=true&temperature_unit=celsius`
pub fn weather_request(config: &CoreConfig, point: GeoPoint) -> Result<HttpRequest, HttpError> {
    let url = ValidatedUrl::with_query(
        &config.weather_url,
        [
            ("latitude", point.lat().to_string()),
            ("longitude", point.lng().to_string()),
            ("current_weather", "true".to_string()),
            ("temperature_unit", "celsius".to_string()),
        ],
    )?;
    Ok(HttpRequest::get(url))
}

pub fn parse_weather(result: HttpResult) -> Result<CurrentWeather, ProviderError> {
    let response: ForecastResponse = ProviderError::parse(result)?;
    response
        .current_weather
        .ok_or(ProviderError::MissingField("current_weather"))
}

// Overpass

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverpassElement {
    #[serde(default)]
    pub id: Option<u64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

/// Overpass QL selecting at most `limit` nodes matching the category tag.
#[must_use]
pub fn overpass_query(
    category: NearbyCategory,
    radius: SearchRadius,
    center: GeoPoint,
    limit: u32,
) -> String {
    let (key, value) = category.tag();
    format!(
        "[out:json][timeout:{NEARBY_QUERY_TIMEOUT_S}];\nnode[\"{key}\"=\"{value}\"](around:{},{},{});\nout body {limit};",
        radius.meters(),
        center.lat(),
        center.lng(),
    )
}

/// `POST <places>` with the Overpass QL text as the body.
pub fn overpass_request(
    config: &CoreConfig,
    category: NearbyCategory,
    radius: SearchRadius,
    center: GeoPoint,
) -> Result<HttpRequest, HttpError> {
    let url = ValidatedUrl::new(&config.places_url)?;
    HttpRequest::post(url).with_text_body(overpass_query(
        category,
        radius,
        center,
        config.nearby_raw_limit,
    ))
}

pub fn parse_overpass(result: HttpResult) -> Result<Vec<OverpassElement>, ProviderError> {
    let response: OverpassResponse = ProviderError::parse(result)?;
    Ok(response.elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HttpMethod, HttpResponse};
    use serde_json::json;

    fn paris() -> GeoPoint {
        GeoPoint::new(48.8566, 2.3522).unwrap()
    }

    mod geocoder_tests {
        use super::*;

        #[test]
        fn test_forward_request_params() {
            let request = geocode_request(&CoreConfig::default(), "rue de rivoli").unwrap();
            assert_eq!(request.method(), HttpMethod::Get);
            let url = request.url();
            assert_eq!(url.query_param("q").as_deref(), Some("rue de rivoli"));
            assert_eq!(url.query_param("limit").as_deref(), Some("6"));
            assert_eq!(url.query_param("key"), None);
        }

        #[test]
        fn test_reverse_request_params_with_key() {
            let config = CoreConfig {
                geocoder_api_key: Some("k-123".into()),
                ..CoreConfig::default()
            };
            let request = reverse_geocode_request(&config, paris()).unwrap();
            let url = request.url();
            assert_eq!(url.query_param("reverse").as_deref(), Some("true"));
            assert_eq!(url.query_param("point").as_deref(), Some("48.8566,2.3522"));
            assert_eq!(url.query_param("key").as_deref(), Some("k-123"));
        }

        #[test]
        fn test_parse_hits() {
            let body = json!({"hits": [
                {"name": "Louvre", "point": {"lat": 48.8606, "lng": 2.3376},
                 "country": "France", "city": "Paris", "street": "Rue de Rivoli", "housenumber": "99",
                 "postcode": "75001"},
                {"name": "Broken", "point": {"lat": 123.0, "lng": 0.0}},
                {"name": "Bare", "point": {"lat": 1.0, "lng": 2.0}}
            ]});
            let places = parse_geocode(Ok(HttpResponse::ok_json(&body, "r"))).unwrap();
            assert_eq!(places.len(), 2);
            assert_eq!(places[0].address, "Rue de Rivoli 99");
            assert_eq!(places[0].postcode, "75001");
            assert_eq!(places[1].name, "Bare");
            assert!(places[1].country.is_empty());
        }

        #[test]
        fn test_parse_missing_hits_is_empty() {
            let places = parse_geocode(Ok(HttpResponse::ok_json(&json!({}), "r"))).unwrap();
            assert!(places.is_empty());
        }

        #[test]
        fn test_reverse_with_no_hits() {
            let result = parse_reverse_geocode(Ok(HttpResponse::ok_json(&json!({"hits": []}), "r")));
            assert_eq!(result, Err(ProviderError::NoResults));
        }

        #[test]
        fn test_transport_error_passes_through() {
            let err = parse_geocode(Err(HttpError::ConnectionError {
                host: "graphhopper.com".into(),
                message: "offline".into(),
            }))
            .unwrap_err();
            assert!(matches!(err, ProviderError::Http(HttpError::ConnectionError { .. })));
        }

        #[test]
        fn test_join_address() {
            assert_eq!(join_address(Some("Main St"), Some("5")), "Main St 5");
            assert_eq!(join_address(None, Some("5")), "5");
            assert_eq!(join_address(Some(" "), None), "");
        }
    }

    mod weather_tests {
        use super::*;

        #[test]
        fn test_weather_request_params() {
            let request = weather_request(&CoreConfig::default(), paris()).unwrap();
            let url = request.url();
            assert_eq!(url.query_param("latitude").as_deref(), Some("48.8566"));
            assert_eq!(url.query_param("longitude").as_deref(), Some("2.3522"));
            assert_eq!(url.query_param("current_weather").as_deref(), Some("true"));
            assert_eq!(url.query_param("temperature_unit").as_deref(), Some("celsius"));
        }

        #[test]
        fn test_parse_current_weather() {
            let body = json!({"current_weather": {"temperature": 12.4, "windspeed": 5.4, "weathercode": 3}});
            let weather = parse_weather(Ok(HttpResponse::ok_json(&body, "r"))).unwrap();
            assert_eq!(weather.weathercode, Some(3));
        }

        #[test]
        fn test_missing_current_weather() {
            let result = parse_weather(Ok(HttpResponse::ok_json(&json!({"latitude": 1.0}), "r")));
            assert_eq!(result, Err(ProviderError::MissingField("current_weather")));
        }
    }

    mod overpass_tests {
        use super::*;

        #[test]
        fn test_query_text() {
            let query = overpass_query(NearbyCategory::Park, SearchRadius::M500, paris(), 20);
            assert_eq!(
                query,
                "[out:json][timeout:10];\nnode[\"leisure\"=\"park\"](around:500,48.8566,2.3522);\nout body 20;"
            );
        }

        #[test]
        fn test_request_is_post_with_body() {
            let request = overpass_request(
                &CoreConfig::default(),
                NearbyCategory::Cafe,
                SearchRadius::default(),
                paris(),
            )
            .unwrap();
            assert_eq!(request.method(), HttpMethod::Post);
            assert!(request.body_text().unwrap().contains("node[\"amenity\"=\"cafe\"](around:1000,"));
        }

        #[test]
        fn test_parse_elements() {
            let body = json!({"elements": [
                {"id": 1, "lat": 48.85, "lon": 2.35, "tags": {"name": "Cafe A"}},
                {"id": 2}
            ]});
            let elements = parse_overpass(Ok(HttpResponse::ok_json(&body, "r"))).unwrap();
            assert_eq!(elements.len(), 2);
            assert_eq!(elements[0].tags.get("name").map(String::as_str), Some("Cafe A"));
            assert!(elements[1].lat.is_none());
        }
    }
}
