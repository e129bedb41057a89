// Pipeline configuration — tuning values and JSON file loading.

pub mod store;
pub mod types;
