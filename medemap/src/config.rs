use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the data API serving the `medemap` and `geocoordinates` endpoints.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:3000/api".into(),
        }
    }
}

impl Config {
    pub fn indicator_data_url(&self) -> String {
        format!("{}/medemap", self.base_url.trim_end_matches('/'))
    }

    pub fn geocoordinates_url(&self) -> String {
        format!("{}/geocoordinates", self.base_url.trim_end_matches('/'))
    }
}
