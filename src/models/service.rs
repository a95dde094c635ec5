use serde::Serialize;

/// Catalog entry for a bookable salon service, e.g. "Haircut". Static
/// reference data with no workflow of its own.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}
