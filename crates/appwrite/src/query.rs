//! Appwrite query strings.
//!
//! List endpoints take each query as a JSON object in a repeated `queries[]` parameter.

use registry_core::Query;
use serde_json::json;

pub(crate) const QUERY_PARAM: &str = "queries[]";

pub(crate) fn encode(query: &Query) -> String {
    let value = match query {
        Query::Equal { attribute, values } => json!({
            "method": "equal",
            "attribute": attribute,
            "values": values,
        }),
        Query::Limit(limit) => json!({
            "method": "limit",
            "values": [limit],
        }),
    };
    value.to_string()
}

pub(crate) fn params(queries: &[Query]) -> Vec<(&'static str, String)> {
    queries.iter().map(|q| (QUERY_PARAM, encode(q))).collect()
}
