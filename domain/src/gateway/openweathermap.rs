use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::forecast::{
    DailyWeather, Forecast, ForecastProvider, Moon, Precipitation, Sun, Weather, Wind,
};
use async_trait::async_trait;
use log::*;
use serde::Deserialize;
use service::config::Config;

/// OpenWeatherMap One Call API client. Forecasts are requested in metric units
/// with German condition descriptions.
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMapClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = config.openweathermap_api_key().ok_or_else(|| {
            warn!("Failed to get OpenWeatherMap API key from config");
            Error::config()
        })?;

        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            base_url: config.openweathermap_base_url().to_string(),
            api_key,
        })
    }

    pub async fn fetch_forecast(&self, lat: &str, lon: &str) -> Result<Forecast, Error> {
        debug!("Requesting OpenWeatherMap forecast for {lat};{lon}");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat),
                ("lon", lon),
                ("units", "metric"),
                ("lang", "de"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach OpenWeatherMap: {e:?}");
                Error::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("OpenWeatherMap returned {status}: {error_text}");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            });
        }

        let one_call: OneCallResponse = response.json().await.map_err(|e| {
            warn!("Failed to decode OpenWeatherMap response: {e:?}");
            Error::from(e)
        })?;

        Ok(one_call.into())
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherMapClient {
    async fn fetch_forecast(&self, lat: &str, lon: &str) -> Result<Forecast, Error> {
        OpenWeatherMapClient::fetch_forecast(self, lat, lon).await
    }
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    current: HourlyData,
    #[serde(default)]
    hourly: Vec<HourlyData>,
    #[serde(default)]
    daily: Vec<DailyData>,
}

#[derive(Debug, Default, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct HourlyData {
    dt: i64,
    temp: f64,
    clouds: i64,
    wind_speed: f64,
    wind_deg: i64,
    #[serde(default)]
    weather: Vec<Condition>,
    // Absent on the `current` block
    #[serde(default)]
    pop: f64,
    rain: Option<HourlyVolume>,
    snow: Option<HourlyVolume>,
}

#[derive(Debug, Deserialize)]
struct HourlyVolume {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    dt: i64,
    temp: DailyTemperature,
    clouds: i64,
    wind_speed: f64,
    wind_deg: i64,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    pop: f64,
    rain: Option<f64>,
    snow: Option<f64>,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
    #[serde(default)]
    moonrise: i64,
    #[serde(default)]
    moonset: i64,
    #[serde(default)]
    moon_phase: f64,
}

#[derive(Debug, Deserialize)]
struct DailyTemperature {
    min: f64,
    max: f64,
}

/// Snow takes precedence when both are reported. Without either the
/// probability is reported as zero.
fn precipitation(pop: f64, rain: Option<f64>, snow: Option<f64>) -> Precipitation {
    let (kind, precip) = match (snow, rain) {
        (Some(amount), _) => ("snow", amount),
        (None, Some(amount)) => ("rain", amount),
        (None, None) => return Precipitation::default(),
    };

    Precipitation {
        kind: Some(kind.to_string()),
        precip,
        probability: pop * 100.0,
    }
}

// Daily volumes are bare numbers and a reported `0` means no precipitation.
fn reported(amount: Option<f64>) -> Option<f64> {
    amount.filter(|volume| *volume != 0.0)
}

fn first_condition(conditions: Vec<Condition>) -> Condition {
    conditions.into_iter().next().unwrap_or_default()
}

impl From<HourlyData> for Weather {
    fn from(data: HourlyData) -> Self {
        let condition = first_condition(data.weather);
        Weather {
            epoch_time: data.dt,
            weather_text: condition.description,
            weather_icon: condition.icon,
            wind: Wind {
                direction: data.wind_deg,
                speed: data.wind_speed,
            },
            cloud_cover: data.clouds,
            precipitation: precipitation(
                data.pop,
                data.rain.map(|volume| volume.one_hour),
                data.snow.map(|volume| volume.one_hour),
            ),
            temperature: data.temp,
        }
    }
}

impl From<DailyData> for DailyWeather {
    fn from(data: DailyData) -> Self {
        let condition = first_condition(data.weather);
        DailyWeather {
            epoch_time: data.dt,
            weather_text: condition.description,
            weather_icon: condition.icon,
            wind: Wind {
                direction: data.wind_deg,
                speed: data.wind_speed,
            },
            cloud_cover: data.clouds,
            precipitation: precipitation(data.pop, reported(data.rain), reported(data.snow)),
            min_temperature: data.temp.min,
            max_temperature: data.temp.max,
            sun: Sun {
                sunrise: data.sunrise,
                sunset: data.sunset,
            },
            moon: Moon {
                moonrise: data.moonrise,
                moonset: data.moonset,
                moon_phase: data.moon_phase,
            },
        }
    }
}

impl From<OneCallResponse> for Forecast {
    fn from(response: OneCallResponse) -> Self {
        Forecast {
            current: response.current.into(),
            hourly: response.hourly.into_iter().map(Weather::from).collect(),
            daily: response.daily.into_iter().map(DailyWeather::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InternalErrorKind;
    use mockito::{Matcher, Server};

    const ONE_CALL_BODY: &str = r#"{
        "lat": 52.52,
        "lon": 13.41,
        "current": {
            "dt": 1700000000, "temp": 7.5, "clouds": 75, "wind_speed": 4.1, "wind_deg": 240,
            "weather": [{"id": 803, "main": "Clouds", "description": "Überwiegend bewölkt", "icon": "04d"}]
        },
        "hourly": [
            {
                "dt": 1700000000, "temp": 7.5, "clouds": 75, "wind_speed": 4.1, "wind_deg": 240,
                "weather": [{"description": "Leichter Regen", "icon": "10d"}],
                "pop": 0.62, "rain": {"1h": 0.35}
            },
            {
                "dt": 1700003600, "temp": -1.0, "clouds": 100, "wind_speed": 2.0, "wind_deg": 10,
                "weather": [{"description": "Schnee", "icon": "13d"}],
                "pop": 0.9, "rain": {"1h": 0.1}, "snow": {"1h": 1.2}
            }
        ],
        "daily": [
            {
                "dt": 1699956000, "temp": {"day": 8.0, "min": 3.2, "max": 9.8, "night": 4.0},
                "clouds": 90, "wind_speed": 5.5, "wind_deg": 250,
                "weather": [{"description": "Mäßiger Regen", "icon": "10d"}],
                "pop": 1.0, "rain": 6.4,
                "sunrise": 1699942000, "sunset": 1699975000,
                "moonrise": 1699950000, "moonset": 1699990000, "moon_phase": 0.25
            }
        ]
    }"#;

    fn test_config(base_url: String) -> Config {
        Config::from_args(["weather_station_rs"])
            .set_openweathermap_base_url(base_url)
            .set_openweathermap_api_key("test_api_key_123".to_string())
    }

    #[tokio::test]
    async fn test_fetch_forecast_maps_one_call_response() -> Result<(), Error> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/data/3.0/onecall")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "52.52".into()),
                Matcher::UrlEncoded("lon".into(), "13.41".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
                Matcher::UrlEncoded("lang".into(), "de".into()),
                Matcher::UrlEncoded("appid".into(), "test_api_key_123".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ONE_CALL_BODY)
            .create_async()
            .await;

        let client =
            OpenWeatherMapClient::new(&test_config(format!("{}/data/3.0/onecall", server.url())))?;
        let forecast = client.fetch_forecast("52.52", "13.41").await?;

        mock.assert_async().await;

        assert_eq!(forecast.current.weather_text, "Überwiegend bewölkt");
        assert_eq!(forecast.current.precipitation, Precipitation::default());
        assert_eq!(forecast.current.wind.direction, 240);

        let rainy = &forecast.hourly[0].precipitation;
        assert_eq!(rainy.kind.as_deref(), Some("rain"));
        assert_eq!(rainy.precip, 0.35);
        assert_eq!(rainy.probability, 62.0);

        let snowy = &forecast.hourly[1].precipitation;
        assert_eq!(snowy.kind.as_deref(), Some("snow"));
        assert_eq!(snowy.precip, 1.2);

        let today = &forecast.daily[0];
        assert_eq!(today.min_temperature, 3.2);
        assert_eq!(today.max_temperature, 9.8);
        assert_eq!(today.precipitation.precip, 6.4);
        assert_eq!(today.precipitation.probability, 100.0);
        assert_eq!(today.sun.sunset, 1699975000);
        assert_eq!(today.moon.moon_phase, 0.25);
        Ok(())
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_a_network_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/onecall")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"cod": 401, "message": "Invalid API key"}"#)
            .create_async()
            .await;

        let client = OpenWeatherMapClient::new(&test_config(format!("{}/onecall", server.url())))
            .expect("client builds");
        let result = client.fetch_forecast("52.52", "13.41").await;

        assert!(matches!(
            result,
            Err(Error {
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_network_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/onecall")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"current": "nope"}"#)
            .create_async()
            .await;

        let client = OpenWeatherMapClient::new(&test_config(format!("{}/onecall", server.url())))
            .expect("client builds");

        assert!(matches!(
            client.fetch_forecast("52.52", "13.41").await,
            Err(Error {
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                ..
            })
        ));
    }

    #[test]
    fn test_missing_api_key_is_a_config_error() {
        let config = Config::from_args(["weather_station_rs"]);
        if config.openweathermap_api_key().is_some() {
            // Key provided by the environment running the tests
            return;
        }

        let result = OpenWeatherMapClient::new(&config);

        assert!(matches!(
            result,
            Err(Error {
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
                ..
            })
        ));
    }

    #[test]
    fn test_precipitation_without_rain_or_snow_ignores_probability() {
        assert_eq!(precipitation(0.8, None, None), Precipitation::default());
    }

    #[test]
    fn test_daily_zero_rain_counts_as_no_precipitation() {
        let daily: DailyWeather = serde_json::from_value::<DailyData>(serde_json::json!({
            "dt": 1_700_000_000,
            "weather": [],
            "wind_deg": 180,
            "wind_speed": 2.0,
            "clouds": 10,
            "pop": 0.4,
            "rain": 0,
            "snow": 1.5,
            "temp": {"min": -1.0, "max": 3.0},
            "sunrise": 1_700_000_100,
            "sunset": 1_700_030_000,
            "moonrise": 1_700_010_000,
            "moonset": 1_700_040_000,
            "moon_phase": 0.5
        }))
        .unwrap()
        .into();

        assert_eq!(daily.precipitation.kind.as_deref(), Some("snow"));
        assert_eq!(daily.precipitation.precip, 1.5);

        let dry: DailyWeather = serde_json::from_value::<DailyData>(serde_json::json!({
            "dt": 1_700_000_000,
            "weather": [],
            "wind_deg": 180,
            "wind_speed": 2.0,
            "clouds": 10,
            "pop": 0.4,
            "rain": 0,
            "temp": {"min": -1.0, "max": 3.0},
            "sunrise": 1_700_000_100,
            "sunset": 1_700_030_000,
            "moonrise": 1_700_010_000,
            "moonset": 1_700_040_000,
            "moon_phase": 0.5
        }))
        .unwrap()
        .into();

        assert_eq!(dry.precipitation, Precipitation::default());
    }
}
