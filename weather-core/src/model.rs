use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Raw `/data/2.5/weather` response, decoded as-is and consumed once by the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    #[serde(rename = "name")]
    pub city_name: String,
    pub main: Main,
    pub wind: Wind,
    #[serde(rename = "weather")]
    pub weather_type: Vec<WeatherType>,
    #[serde(default)]
    pub sys: Option<Sys>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Main {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherType {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: Option<String>,
}

/// One entry of the `/geo/1.0/direct` geocoding response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl LocationSuggestion {
    /// `lat-lon`, each fixed to two decimals.
    ///
    /// The geocoder can return several places sharing name, state and country,
    /// so the coordinates are the only stable way to tell them apart.
    pub fn id(&self) -> String {
        format!("{:.2}-{:.2}", self.lat, self.lon)
    }

    /// `name[, state][, country]`
    pub fn display_name(&self) -> String {
        let mut display = self.name.clone();
        for part in [&self.state, &self.country].into_iter().flatten() {
            display.push_str(", ");
            display.push_str(part);
        }
        display
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Display-ready weather, every field pre-formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub display_name: String,
    pub description: String,
    pub temperature: String,
    pub feels_like_temperature: String,
    pub min_temperature: String,
    pub max_temperature: String,
    pub icon_url: Option<Url>,
    pub wind: String,
    pub humidity: String,
}
