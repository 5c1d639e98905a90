use serde::{Deserialize, Serialize};

/// Result of a single weather lookup, built fresh for every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub temperature: i32,
    pub description: String,
    pub humidity: u8,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Static catalog row. `location`, `success` and `note` are filled at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Lowercase, trimmed city name.
    pub key: &'static str,
    pub temperature: i32,
    pub description: &'static str,
    pub humidity: u8,
}

impl CatalogEntry {
    pub fn to_record(&self, location: String) -> WeatherRecord {
        WeatherRecord {
            location,
            temperature: self.temperature,
            description: self.description.to_string(),
            humidity: self.humidity,
            success: true,
            note: None,
        }
    }
}

/// Structural description of a callable tool, advertised to the remote model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_is_omitted_from_json_when_absent() {
        let entry = CatalogEntry {
            key: "oslo",
            temperature: -3,
            description: "Snow",
            humidity: 90,
        };
        let json = serde_json::to_value(entry.to_record("Oslo".into())).unwrap();

        assert_eq!(json["location"], "Oslo");
        assert_eq!(json["temperature"], -3);
        assert_eq!(json["success"], true);
        assert!(json.get("note").is_none());
    }
}
