use serde::{Deserialize, Serialize};

/// Best geocoding match for a free-text place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResolution {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Open-Meteo forecast payload, kept close to the wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub utc_offset_seconds: Option<i64>,
    #[serde(default)]
    pub current: Option<WeatherCurrent>,
    #[serde(default)]
    pub hourly: Option<WeatherHourly>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherCurrent {
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
}

/// Open-Meteo air-quality payload. Upstream has no "current" block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirQualityPayload {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hourly: Option<AirQualityHourly>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirQualityHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub pm2_5: Vec<Option<f64>>,
    #[serde(default)]
    pub pm10: Vec<Option<f64>>,
    #[serde(default)]
    pub carbon_monoxide: Vec<Option<f64>>,
    #[serde(default)]
    pub ozone: Vec<Option<f64>>,
    #[serde(default)]
    pub nitrogen_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    pub sulphur_dioxide: Vec<Option<f64>>,
}

/// Response document served to the dashboard.
///
/// Every scalar is an `Option` so absent readings serialize as `null`
/// instead of dropping the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub city: String,
    pub coords: Coords,
    pub current: CurrentWeather,
    pub aq_now: AirQualityNow,
    pub series: ChartSeries,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityNow {
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub co: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
}

/// Raw series for charting. Weather and air-quality time axes are not aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub time: Vec<String>,
    pub temp_c: Vec<Option<f64>>,
    pub pm2_5: Vec<Option<f64>>,
    pub pm10: Vec<Option<f64>>,
}

/// Coarse PM2.5 band used by the dashboard to colour the reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiBand {
    Good,
    Moderate,
    Bad,
}

impl AqiBand {
    pub fn from_pm2_5(pm2_5: Option<f64>) -> Option<Self> {
        let value = pm2_5?;
        Some(if value <= 12.0 {
            AqiBand::Good
        } else if value <= 35.4 {
            AqiBand::Moderate
        } else {
            AqiBand::Bad
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiBand::Good => "good",
            AqiBand::Moderate => "moderate",
            AqiBand::Bad => "bad",
        }
    }
}

impl std::fmt::Display for AqiBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
