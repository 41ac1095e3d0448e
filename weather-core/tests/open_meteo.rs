//! Integration tests for the HTTP clients using wiremock.
//!
//! Every endpoint is pointed at a mock server through `Endpoints`.

use weather_dashboard_core::{
    Endpoints, IpApiLocator, IpLocator, LookupError, OpenMeteoClient, UnitSystem, WeatherService,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoints(server: &MockServer) -> Endpoints {
    let base = server.uri();
    Endpoints {
        geocoding: format!("{base}/v1/search"),
        forecast: format!("{base}/v1/forecast"),
        reverse_geocoding: format!("{base}/data/reverse-geocode-client"),
        ip_geolocation: format!("{base}/json/"),
    }
}

fn client(server: &MockServer) -> OpenMeteoClient {
    OpenMeteoClient::new(endpoints(server))
}

fn current_body(code: i32) -> serde_json::Value {
    serde_json::json!({
        "latitude": 51.5,
        "longitude": -0.13,
        "current": {
            "time": "2024-05-01T14:15",
            "interval": 900,
            "temperature_2m": 14.2,
            "apparent_temperature": 12.9,
            "relative_humidity_2m": 81,
            "weather_code": code,
            "pressure_msl": 1009.4,
            "wind_speed_10m": 4.6
        }
    })
}

fn daily_body(days: usize) -> serde_json::Value {
    let dates: Vec<String> = (1..=days).map(|d| format!("2024-05-{d:02}")).collect();
    serde_json::json!({
        "daily": {
            "time": dates,
            "weather_code": vec![3; days],
            "temperature_2m_max": vec![18.0; days],
            "temperature_2m_min": vec![9.0; days],
            "apparent_temperature_max": vec![17.0; days],
            "apparent_temperature_min": vec![7.5; days],
            "sunrise": vec!["2024-05-01T05:30"; days],
            "sunset": vec!["2024-05-01T20:30"; days],
            "precipitation_probability_max": vec![40; days]
        }
    })
}

async fn mount_geocode(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", name))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{
                "id": 2643743,
                "name": name,
                "latitude": 51.5,
                "longitude": -0.13,
                "country": "United Kingdom"
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_geocode_success() {
    let mock_server = MockServer::start().await;
    mount_geocode(&mock_server, "London").await;

    let location = client(&mock_server).geocode("London").await.unwrap();

    assert_eq!(location.name, "London");
    assert_eq!(location.country, "United Kingdom");
    assert_eq!(location.latitude, 51.5);
    assert_eq!(location.longitude, -0.13);
}

#[tokio::test]
async fn test_geocode_empty_results_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": []
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).geocode("Nonexistentville").await.unwrap_err();

    assert_eq!(err, LookupError::NotFound("Nonexistentville".to_string()));
}

#[tokio::test]
async fn test_current_weather_by_city_maps_weather_code() {
    let mock_server = MockServer::start().await;
    mount_geocode(&mock_server, "London").await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("temperature_unit", "celsius"))
        .and(query_param("wind_speed_unit", "ms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(61)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = client(&mock_server).current_weather("London", UnitSystem::Metric).await.unwrap();

    assert_eq!(report.location.name, "London");
    assert_eq!(report.location.country, "United Kingdom");
    assert_eq!(report.current.temperature, 14.2);
    assert_eq!(report.current.humidity, 81);
    assert_eq!(report.current.weather_code, 61);
    assert_eq!(report.current.weather_description, "Slight rain");
    assert_eq!(report.current.weather_icon, "10d");
}

#[tokio::test]
async fn test_current_weather_imperial_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("wind_speed_unit", "mph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = client(&mock_server)
        .current_weather_by_coords(51.5, -0.13, UnitSystem::Imperial, Some("London"), Some("UK"))
        .await
        .unwrap();

    assert_eq!(report.location.name, "London");
    assert_eq!(report.current.weather_description, "Clear sky");
    assert_eq!(report.current.weather_icon, "01d");
}

#[tokio::test]
async fn test_coordinates_without_name_are_reverse_geocoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(2)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/reverse-geocode-client"))
        .and(query_param("localityLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": "",
            "locality": "Camden Town",
            "countryName": "United Kingdom"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = client(&mock_server)
        .current_weather_by_coords(51.54, -0.14, UnitSystem::Metric, None, None)
        .await
        .unwrap();

    assert_eq!(report.location.name, "Camden Town");
    assert_eq!(report.location.country, "United Kingdom");
    assert_eq!(report.location.latitude, 51.54);
}

#[tokio::test]
async fn test_reverse_geocode_failure_yields_unknown_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/reverse-geocode-client"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let place = client(&mock_server).reverse_geocode(10.0, 20.0).await;

    assert_eq!(place.name, "Unknown location");
    assert_eq!(place.country, "");
}

#[tokio::test]
async fn test_forecast_returns_seven_days() {
    let mock_server = MockServer::start().await;
    mount_geocode(&mock_server, "London").await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("forecast_days", "7"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body(7)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let forecast = client(&mock_server).forecast("London", UnitSystem::Metric).await.unwrap();

    assert_eq!(forecast.location.name, "London");
    assert_eq!(forecast.daily.len(), 7);
    let first = forecast.daily.day(0).unwrap();
    assert_eq!(first.temperature_max, 18.0);
    assert_eq!(first.precipitation_probability_max, Some(40));
    assert_eq!(first.info.description, "Overcast");
}

#[tokio::test]
async fn test_forecast_with_mismatched_arrays_is_invalid() {
    let mock_server = MockServer::start().await;

    let mut body = daily_body(7);
    body["daily"]["temperature_2m_min"] = serde_json::json!([9.0, 9.0]);

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .forecast_by_coords(51.5, -0.13, UnitSystem::Metric, Some("London"), Some("UK"))
        .await
        .unwrap_err();

    assert!(matches!(err, LookupError::InvalidResponse(msg) if msg.contains("temperature_2m_min")));
}

#[tokio::test]
async fn test_forecast_with_null_entries_keeps_complete_days() {
    let mock_server = MockServer::start().await;

    let mut body = daily_body(2);
    body["daily"]["temperature_2m_max"] = serde_json::json!([18.0, null]);

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let forecast = client(&mock_server)
        .forecast_by_coords(51.5, -0.13, UnitSystem::Metric, Some("London"), Some("UK"))
        .await
        .unwrap();

    assert_eq!(forecast.daily.len(), 1);
    assert_eq!(forecast.daily.temperature_max, vec![18.0]);
    assert_eq!(forecast.daily.precipitation_probability_max, vec![Some(40)]);
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).geocode("London").await.unwrap_err();

    assert!(matches!(err, LookupError::Http { status: 429, ref message } if message.contains("rate limited")));
    assert_eq!(err.user_message(), "Failed to fetch weather data. Please try again.");
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).geocode("London").await.unwrap_err();

    assert!(matches!(err, LookupError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_ip_locator_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .and(query_param("fields", "status,city,lat,lon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "city": "Lisbon",
            "lat": 38.72,
            "lon": -9.14
        })))
        .mount(&mock_server)
        .await;

    let locator = IpApiLocator::new(reqwest::Client::new(), endpoints(&mock_server).ip_geolocation);
    let coordinates = locator.locate().await.unwrap();

    assert_eq!(coordinates.latitude, 38.72);
    assert_eq!(coordinates.longitude, -9.14);
}

#[tokio::test]
async fn test_ip_locator_fail_status_is_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "reserved range"
        })))
        .mount(&mock_server)
        .await;

    let locator = IpApiLocator::new(reqwest::Client::new(), endpoints(&mock_server).ip_geolocation);
    let err = locator.locate().await.unwrap_err();

    assert!(matches!(err, LookupError::InvalidResponse(_)));
}
