//! Pagination query parameters.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

fn default_limit() -> i64 {
    50
}

/// `?skip=0&limit=50` style pagination.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of records to skip
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of records to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let p: Pagination = serde_urlencoded::from_str("").unwrap();
        assert_eq!(p.skip, 0);
        assert_eq!(p.limit, 50);
    }

    #[test]
    fn explicit_values_are_kept() {
        let p: Pagination = serde_urlencoded::from_str("skip=10&limit=5").unwrap();
        assert_eq!(p.skip, 10);
        assert_eq!(p.limit, 5);
    }
}
