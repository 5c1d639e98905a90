use serde_json::{Map, Value, json};

use crate::{
    error::ToolError,
    model::{CatalogEntry, ToolDescriptor, WeatherRecord},
};

/// Name under which the lookup is advertised to the remote model.
pub const GET_WEATHER: &str = "get_weather";

const DEFAULT_TEMPERATURE: i32 = 20;
const DEFAULT_DESCRIPTION: &str = "Pleasant";
const DEFAULT_HUMIDITY: u8 = 60;
const DEFAULT_NOTE: &str = "Using default weather data";

/// Hardcoded weather for the five known cities.
pub const CATALOG: [CatalogEntry; 5] = [
    CatalogEntry { key: "san francisco", temperature: 18, description: "Partly cloudy", humidity: 65 },
    CatalogEntry { key: "new york", temperature: 12, description: "Sunny", humidity: 45 },
    CatalogEntry { key: "london", temperature: 8, description: "Rainy", humidity: 80 },
    CatalogEntry { key: "tokyo", temperature: 22, description: "Clear", humidity: 55 },
    CatalogEntry { key: "paris", temperature: 15, description: "Cloudy", humidity: 70 },
];

// Keys must be lowercase and trimmed, humidity a percentage.
const fn catalog_is_valid(entries: &[CatalogEntry]) -> bool {
    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        if entry.humidity > 100 {
            return false;
        }

        let key = entry.key.as_bytes();
        if key.is_empty() || key[0] == b' ' || key[key.len() - 1] == b' ' {
            return false;
        }

        let mut j = 0;
        while j < key.len() {
            if key[j].is_ascii_uppercase() {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(catalog_is_valid(&CATALOG), "invalid built-in weather catalog");

/// Weather lookup tool backed by [`CATALOG`].
#[derive(Debug, Clone)]
pub struct WeatherTool {
    default_location: String,
}

impl WeatherTool {
    pub fn new(default_location: impl Into<String>) -> Self {
        Self { default_location: default_location.into() }
    }

    pub fn catalog(&self) -> &'static [CatalogEntry] {
        &CATALOG
    }

    /// Look up the weather for `location`. Total: unknown places get default data.
    pub fn get_weather(&self, location: &str) -> WeatherRecord {
        let trimmed = location.trim();
        let key = trimmed.to_lowercase();
        let display = title_case(trimmed);

        match CATALOG.iter().find(|entry| entry.key == key) {
            Some(entry) => entry.to_record(display),
            None => WeatherRecord {
                location: display,
                temperature: DEFAULT_TEMPERATURE,
                description: DEFAULT_DESCRIPTION.to_string(),
                humidity: DEFAULT_HUMIDITY,
                success: true,
                note: Some(DEFAULT_NOTE.to_string()),
            },
        }
    }

    /// Run the tool with arguments supplied by the model.
    pub fn execute(&self, args: &Map<String, Value>) -> Result<WeatherRecord, ToolError> {
        let location = args.get("location").ok_or(ToolError::MissingArgument("location"))?;
        let location = location
            .as_str()
            .ok_or(ToolError::InvalidArgument { name: "location", expected: "string" })?;

        tracing::debug!(%location, "executing {GET_WEATHER}");
        Ok(self.get_weather(location))
    }

    pub fn function_schema(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: GET_WEATHER.to_string(),
            description: "Get current weather information for a specific location".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city name to get weather for (e.g., 'London', 'New York')"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    /// Best-effort guess at the place a question is about.
    ///
    /// Text after the last `"in "` wins, whether or not it names a known city.
    /// Otherwise the first catalog city found in the question, otherwise the
    /// default location.
    pub fn extract_location_fallback(&self, question: &str) -> String {
        let lower = question.to_lowercase();

        if let Some(idx) = lower.rfind("in ") {
            return lower[idx + "in ".len()..]
                .trim()
                .trim_end_matches('?')
                .trim()
                .to_string();
        }

        CATALOG
            .iter()
            .find(|entry| lower.contains(entry.key))
            .map(|entry| entry.key.to_string())
            .unwrap_or_else(|| self.default_location.clone())
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> WeatherTool {
        WeatherTool::new("San Francisco")
    }

    #[test]
    fn known_city_lookup_is_case_and_whitespace_insensitive() {
        let rec = tool().get_weather("LONDON ");

        assert_eq!(rec.location, "London");
        assert_eq!(rec.temperature, 8);
        assert_eq!(rec.description, "Rainy");
        assert_eq!(rec.humidity, 80);
        assert!(rec.success);
        assert_eq!(rec.note, None);
    }

    #[test]
    fn every_catalog_entry_is_reachable() {
        let tool = tool();
        for entry in tool.catalog() {
            let rec = tool.get_weather(&entry.key.to_uppercase());
            assert_eq!(rec.temperature, entry.temperature);
            assert_eq!(rec.description, entry.description);
            assert_eq!(rec.humidity, entry.humidity);
            assert!(rec.note.is_none());
        }
    }

    #[test]
    fn unknown_city_gets_default_data() {
        let rec = tool().get_weather("berlin");

        assert_eq!(rec.location, "Berlin");
        assert_eq!(rec.temperature, 20);
        assert_eq!(rec.description, "Pleasant");
        assert_eq!(rec.humidity, 60);
        assert!(rec.success);
        assert!(rec.note.as_deref().is_some_and(|n| !n.is_empty()));
    }

    #[test]
    fn lookup_is_idempotent() {
        let tool = tool();
        assert_eq!(tool.get_weather("new york"), tool.get_weather("new york"));
        assert_eq!(tool.get_weather("Atlantis"), tool.get_weather("Atlantis"));
    }

    #[test]
    fn location_is_title_cased() {
        assert_eq!(tool().get_weather("  new YORK").location, "New York");
        assert_eq!(title_case("rio de janeiro"), "Rio De Janeiro");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn extract_takes_text_after_last_in() {
        let tool = tool();
        assert_eq!(tool.extract_location_fallback("What's the weather in Tokyo?"), "tokyo");
        assert_eq!(tool.extract_location_fallback("How hot is it in Tokyo"), "tokyo");
        assert_eq!(tool.extract_location_fallback("Is it raining in Oslo ? "), "oslo");
    }

    #[test]
    fn extract_falls_back_to_known_city_then_default() {
        let tool = tool();
        assert_eq!(tool.extract_location_fallback("Paris weather today"), "paris");
        assert_eq!(tool.extract_location_fallback("Describe conditions please"), "San Francisco");
    }

    #[test]
    fn execute_reads_location_argument() {
        let mut args = Map::new();
        args.insert("location".into(), json!("Tokyo"));

        let rec = tool().execute(&args).unwrap();
        assert_eq!(rec.temperature, 22);
    }

    #[test]
    fn execute_rejects_missing_or_non_string_location() {
        let tool = tool();
        assert_eq!(
            tool.execute(&Map::new()).unwrap_err(),
            ToolError::MissingArgument("location")
        );

        let mut args = Map::new();
        args.insert("location".into(), json!(42));
        assert!(matches!(tool.execute(&args), Err(ToolError::InvalidArgument { .. })));
    }

    #[test]
    fn schema_requires_location() {
        let schema = tool().function_schema();
        assert_eq!(schema.name, "get_weather");
        assert_eq!(schema.parameters["required"], json!(["location"]));
        assert_eq!(schema.parameters["properties"]["location"]["type"], "string");
    }

    #[test]
    fn catalog_validation_rejects_bad_rows() {
        let bad_humidity = [CatalogEntry { key: "x", temperature: 0, description: "", humidity: 101 }];
        let bad_key = [CatalogEntry { key: "Rome", temperature: 0, description: "", humidity: 10 }];

        assert!(!catalog_is_valid(&bad_humidity));
        assert!(!catalog_is_valid(&bad_key));
        assert!(catalog_is_valid(&CATALOG));
    }
}
