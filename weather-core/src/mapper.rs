//! Projection of raw API responses into the display model.

use reqwest::Url;

use crate::model::{Weather, WeatherResponse};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Maps a raw response to its display model. Pure and deterministic.
pub fn map_to_weather(response: &WeatherResponse) -> Weather {
    let mut display_name = response.city_name.clone();
    if let Some(country) = response.sys.as_ref().and_then(|sys| sys.country.as_deref()) {
        display_name.push_str(", ");
        display_name.push_str(country);
    }

    let first = response.weather_type.first();

    Weather {
        display_name,
        description: first.map(|w| capitalize_words(&w.description)).unwrap_or_default(),
        temperature: format_temperature(response.main.temp),
        feels_like_temperature: format_temperature(response.main.feels_like),
        min_temperature: format_temperature(response.main.temp_min),
        max_temperature: format_temperature(response.main.temp_max),
        icon_url: first.and_then(|w| icon_url(&w.icon)),
        wind: format_decimal(response.wind.speed),
        humidity: format_decimal(response.main.humidity),
    }
}

/// OpenWeatherMap only serves the `@2x` variant.
pub fn icon_url(icon: &str) -> Option<Url> {
    Url::parse(&format!("{ICON_BASE_URL}/{icon}@2x.png")).ok()
}

/// `70.1` -> `70.1°F`, `70.0` -> `70°F`.
pub fn format_temperature(fahrenheit: f64) -> String {
    format!("{fahrenheit}°F")
}

/// Shortest round-trip form, always keeping a fractional part for finite
/// integral values (`12.0` stays `12.0`).
pub fn format_decimal(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}

/// Uppercases the first letter of every whitespace-separated word and
/// lowercases the rest.
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Main, Sys, WeatherType, Wind};

    fn response(weather_type: Vec<WeatherType>, sys: Option<Sys>) -> WeatherResponse {
        WeatherResponse {
            city_name: "City".to_string(),
            main: Main {
                temp: 70.1,
                feels_like: 72.1,
                temp_min: 65.3,
                temp_max: 80.9,
                humidity: 40.0,
            },
            wind: Wind { speed: 12.0 },
            weather_type,
            sys,
        }
    }

    fn cloudy() -> Vec<WeatherType> {
        vec![WeatherType {
            id: 1,
            main: "Cloudy".to_string(),
            description: "Mostly clouds".to_string(),
            icon: "04n".to_string(),
        }]
    }

    #[test]
    fn maps_all_fields() {
        let weather = map_to_weather(&response(cloudy(), None));

        assert_eq!(weather.display_name, "City");
        assert_eq!(weather.description, "Mostly Clouds");
        assert_eq!(weather.temperature, "70.1°F");
        assert_eq!(weather.feels_like_temperature, "72.1°F");
        assert_eq!(weather.min_temperature, "65.3°F");
        assert_eq!(weather.max_temperature, "80.9°F");
        assert_eq!(
            weather.icon_url.as_ref().map(Url::as_str),
            Some("https://openweathermap.org/img/wn/04n@2x.png")
        );
        assert_eq!(weather.wind, "12.0");
        assert_eq!(weather.humidity, "40.0");
    }

    #[test]
    fn appends_country_when_present() {
        let sys = Some(Sys { country: Some("US".to_string()) });
        assert_eq!(map_to_weather(&response(cloudy(), sys)).display_name, "City, US");
    }

    #[test]
    fn sys_without_country_keeps_city_name() {
        let sys = Some(Sys { country: None });
        assert_eq!(map_to_weather(&response(cloudy(), sys)).display_name, "City");
    }

    #[test]
    fn empty_weather_type_has_no_description_or_icon() {
        let weather = map_to_weather(&response(Vec::new(), None));

        assert_eq!(weather.description, "");
        assert!(weather.icon_url.is_none());
    }

    #[test]
    fn only_first_weather_type_is_used() {
        let mut types = cloudy();
        types.push(WeatherType {
            id: 2,
            main: "Rain".to_string(),
            description: "light rain".to_string(),
            icon: "10d".to_string(),
        });

        let weather = map_to_weather(&response(types, None));
        assert_eq!(weather.description, "Mostly Clouds");
        assert!(weather.icon_url.unwrap().as_str().contains("04n@2x"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let r = response(cloudy(), Some(Sys { country: Some("US".to_string()) }));
        assert_eq!(map_to_weather(&r), map_to_weather(&r));
    }

    #[test]
    fn integral_temperature_has_no_fraction() {
        assert_eq!(format_temperature(70.0), "70°F");
        assert_eq!(format_temperature(-4.5), "-4.5°F");
    }

    #[test]
    fn decimal_keeps_fraction() {
        assert_eq!(format_decimal(12.0), "12.0");
        assert_eq!(format_decimal(9.22), "9.22");
        assert_eq!(format_decimal(0.0), "0.0");
    }

    #[test]
    fn capitalizes_each_word() {
        assert_eq!(capitalize_words("broken clouds"), "Broken Clouds");
        assert_eq!(capitalize_words("LIGHT  rain"), "Light  Rain");
        assert_eq!(capitalize_words(""), "");
    }
}
