// Metrics server endpoints and the grouped-metrics query contract
use crate::domain::model::MachineId;
use crate::domain::settings::{AggregationOperator, DEFAULT_AGGREGATION_OPERATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Duration,
    Instant,
}

impl EventType {
    pub fn from_is_instant(is_instant: bool) -> Self {
        if is_instant {
            EventType::Instant
        } else {
            EventType::Duration
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EventType::Duration => "d",
            EventType::Instant => "i",
        }
    }
}

/// One server-side aggregation request. Built per fetch and thrown away.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMetricsQuery {
    pub product: String,
    pub machine: MachineId,
    pub operator: AggregationOperator,
    pub operator_arg: Option<f64>,
    pub event_type: EventType,
}

impl GroupedMetricsQuery {
    /// A missing operator falls back to the median; the quantile is only kept for `quantile`.
    pub fn new(
        product: &str,
        machine: MachineId,
        operator: Option<AggregationOperator>,
        quantile: f64,
        event_type: EventType,
    ) -> Self {
        let operator = operator.unwrap_or(DEFAULT_AGGREGATION_OPERATOR);
        Self {
            product: product.to_string(),
            machine,
            operator,
            operator_arg: operator.takes_argument().then_some(quantile),
            event_type,
        }
    }

    pub fn to_url(&self, server_url: &str) -> String {
        let mut url = format!(
            "{}/groupedMetrics/product={}&machine={}&operator={}",
            server_url,
            urlencoding::encode(&self.product),
            self.machine,
            self.operator
        );
        if let Some(arg) = self.operator_arg {
            url.push_str(&format!("&operatorArg={}", arg));
        }
        url.push_str(&format!("&eventType={}", self.event_type.code()));
        url
    }
}

pub fn grouped_metrics_url(
    server_url: &str,
    product: &str,
    machine: MachineId,
    operator: Option<AggregationOperator>,
    quantile: f64,
    is_instant: bool,
) -> String {
    GroupedMetricsQuery::new(
        product,
        machine,
        operator,
        quantile,
        EventType::from_is_instant(is_instant),
    )
    .to_url(server_url)
}

pub fn info_url(server_url: &str) -> String {
    format!("{}/info", server_url)
}

pub fn line_metrics_url(server_url: &str, product: &str, machine: MachineId) -> String {
    format!(
        "{}/metrics/product={}&machine={}",
        server_url,
        urlencoding::encode(product),
        machine
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "http://localhost:9044";

    #[test]
    fn test_quantile_includes_operator_arg() {
        let url = grouped_metrics_url(
            SERVER,
            "IU",
            3,
            Some(AggregationOperator::Quantile),
            0.9,
            false,
        );
        assert_eq!(
            url,
            "http://localhost:9044/groupedMetrics/product=IU&machine=3&operator=quantile&operatorArg=0.9&eventType=d"
        );
    }

    #[test]
    fn test_median_never_includes_operator_arg() {
        let url = grouped_metrics_url(SERVER, "IU", 3, Some(AggregationOperator::Median), 0.9, true);
        assert!(!url.contains("operatorArg"));
        assert!(url.ends_with("&operator=median&eventType=i"));

        for op in [AggregationOperator::Min, AggregationOperator::Max] {
            let url = grouped_metrics_url(SERVER, "IU", 3, Some(op), 0.9, true);
            assert!(!url.contains("operatorArg"), "{}", url);
        }
    }

    #[test]
    fn test_missing_operator_defaults_to_median() {
        let query = GroupedMetricsQuery::new("IU", 1, None, 0.25, EventType::Duration);
        assert_eq!(query.operator, AggregationOperator::Median);
        assert_eq!(query.operator_arg, None);
    }

    #[test]
    fn test_event_type_suffix() {
        let instant = grouped_metrics_url(SERVER, "IU", 1, None, 0.5, true);
        let duration = grouped_metrics_url(SERVER, "IU", 1, None, 0.5, false);
        assert!(instant.ends_with("eventType=i"));
        assert!(duration.ends_with("eventType=d"));
    }

    #[test]
    fn test_product_is_percent_encoded() {
        let url = line_metrics_url(SERVER, "IntelliJ IDEA/EAP", 42);
        assert_eq!(
            url,
            "http://localhost:9044/metrics/product=IntelliJ%20IDEA%2FEAP&machine=42"
        );
        assert_eq!(info_url(SERVER), "http://localhost:9044/info");
    }
}
