use serde_json::Value;

/// A single row of `status.json`.
#[derive(Deserialize, Debug, Clone)]
pub struct OpScreenEntry {
    pub subsystem: String,
    pub setting: String,

    // Mostly strings, but some settings report numbers.
    #[serde(default)]
    pub value: Value,
}

impl OpScreenEntry {
    pub fn value_str(&self) -> &str {
        self.value.as_str().unwrap_or("")
    }
}
