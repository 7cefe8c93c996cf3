// Metrics server payloads
use serde::Deserialize;
use std::collections::HashMap;

pub type MachineId = i64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    #[serde(default)]
    pub name: String,
}

impl Machine {
    pub fn new(id: MachineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Response of `GET {server}/info`. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    #[serde(default)]
    pub product_names: Vec<String>,
    #[serde(default)]
    pub product_to_machine: HashMap<String, Vec<Machine>>,
    #[serde(default)]
    pub duration_metrics_names: Vec<String>,
    #[serde(default)]
    pub instant_metrics_names: Vec<String>,
}

impl InfoResponse {
    /// Machines known for a product, empty if the product is unknown
    pub fn machines_of(&self, product: &str) -> &[Machine] {
        self.product_to_machine
            .get(product)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One startup run as returned by `GET {server}/metrics/...`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Generation time, epoch milliseconds
    #[serde(default)]
    pub t: i64,
    #[serde(default)]
    pub duration_metrics: HashMap<String, f64>,
    #[serde(default)]
    pub instant_metrics: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_response_from_server_json() {
        let json = r#"{
            "productNames": ["IU", "PS"],
            "productToMachine": {"IU": [{"id": 1, "name": "mac-mini"}], "PS": [{"id": 2}]},
            "durationMetricsNames": ["bootstrap"],
            "instantMetricsNames": ["splash"]
        }"#;

        let info: InfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(info.product_names, vec!["IU", "PS"]);
        assert_eq!(info.machines_of("IU"), &[Machine::new(1, "mac-mini")]);
        assert_eq!(info.machines_of("PS")[0].name, "");
        assert!(info.machines_of("WS").is_empty());
    }

    #[test]
    fn test_metrics_ignores_unknown_fields() {
        let json = r#"{"t": 1570000000000, "durationMetrics": {"bootstrap": 12.5}, "extra": true}"#;
        let metrics: Metrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.t, 1_570_000_000_000);
        assert_eq!(metrics.duration_metrics.get("bootstrap"), Some(&12.5));
        assert!(metrics.instant_metrics.is_empty());
    }
}
