use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;

use crate::request::SourceConfiguration;

pub struct FlowqueryConfig {
    /// Index alias covering auditbeat indices
    pub auditbeat_alias: String,

    /// Index alias covering packetbeat indices
    pub packetbeat_alias: String,

    /// Index alias covering winlogbeat indices
    pub winlogbeat_alias: String,

    /// Timestamp field used for time-range filtering
    pub timestamp_field: String,
}

const EMPTY_CONFIG: &str = r#"### flowquery configuration file

### index aliases to build queries against
# auditbeat_alias = "auditbeat-*"
# packetbeat_alias = "packetbeat-*"
# winlogbeat_alias = "winlogbeat-*"

### timestamp field used for time-range filtering
# timestamp_field = "@timestamp"
"#;

impl Default for FlowqueryConfig {
    fn default() -> Self {
        Self {
            auditbeat_alias: "auditbeat-*".to_string(),
            packetbeat_alias: "packetbeat-*".to_string(),
            winlogbeat_alias: "winlogbeat-*".to_string(),
            timestamp_field: "@timestamp".to_string(),
        }
    }
}

impl FlowqueryConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<FlowqueryConfig> {
        let mut builder = Config::builder();

        // By default use $HOME/.flowquery/flowquery.toml as the configuration file path
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        // Config dir
        let flowquery_dir = format!("{}/.flowquery", home_dir.as_str());

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(flowquery_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create flowquery directory: {}", e))?;
                let p = format!("{}/flowquery.toml", flowquery_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of FLOWQUERY)
        // E.g., `FLOWQUERY_TIMESTAMP_FIELD=event.ingested flowquery ...` would
        // override the timestamp field
        builder = builder.add_source(config::Environment::with_prefix("FLOWQUERY"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let defaults = FlowqueryConfig::default();
        let get =
            |key: &str, default: String| -> String { config.get(key).cloned().unwrap_or(default) };

        Ok(FlowqueryConfig {
            auditbeat_alias: get("auditbeat_alias", defaults.auditbeat_alias),
            packetbeat_alias: get("packetbeat_alias", defaults.packetbeat_alias),
            winlogbeat_alias: get("winlogbeat_alias", defaults.winlogbeat_alias),
            timestamp_field: get("timestamp_field", defaults.timestamp_field),
        })
    }

    /// Convert into the validated source configuration the query builders consume
    pub fn source_configuration(&self) -> Result<SourceConfiguration> {
        let source = SourceConfiguration {
            auditbeat_alias: self.auditbeat_alias.clone(),
            packetbeat_alias: self.packetbeat_alias.clone(),
            winlogbeat_alias: self.winlogbeat_alias.clone(),
            timestamp_field: self.timestamp_field.clone(),
        };
        source.validate()?;
        Ok(source)
    }
}
