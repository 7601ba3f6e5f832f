//! Exporter configuration as seen by the helper.

use serde::{Deserialize, Serialize};

/// Configuration an exporter is built from.
///
/// Loading and validating configuration files happens elsewhere; the helper
/// only reads the exporter's name.
pub trait ExporterConfig {
    /// Full name of the exporter instance, e.g. `"otlp/backend"`.
    fn name(&self) -> &str;

    /// Exporter type, e.g. `"otlp"`.
    fn exporter_type(&self) -> &str;
}

/// Settings shared by every exporter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterSettings {
    #[serde(rename = "type")]
    pub type_val: String,
    #[serde(default)]
    pub name: String,
}

impl ExporterSettings {
    pub fn new(type_val: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_val: type_val.into(),
            name: name.into(),
        }
    }
}

impl ExporterConfig for ExporterSettings {
    fn name(&self) -> &str {
        &self.name
    }

    fn exporter_type(&self) -> &str {
        &self.type_val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_json() {
        let settings: ExporterSettings =
            serde_json::from_str(r#"{"type": "otlp", "name": "otlp-exporter"}"#).unwrap();
        assert_eq!(settings.exporter_type(), "otlp");
        assert_eq!(settings.name(), "otlp-exporter");
    }

    #[test]
    fn test_missing_name_defaults_to_empty() {
        let settings: ExporterSettings = serde_json::from_str(r#"{"type": "logging"}"#).unwrap();
        assert_eq!(settings.name(), "");
    }
}
