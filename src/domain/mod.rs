// Domain layer - metrics server payloads, chart settings and the query contract
pub mod chart_data;
pub mod model;
pub mod query;
pub mod settings;
