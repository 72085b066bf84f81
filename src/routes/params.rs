use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

use crate::models::Language;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

/// Flattened query structs hand every value over as a string.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PlantSortBy {
    PriceLow,
    PriceHigh,
    Rating,
    Name,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlantQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    /// Category id; `all` or absent lists every category.
    pub category: Option<String>,
    /// Matched against both names and both descriptions.
    pub q: Option<String>,
    /// Absent keeps newest first.
    pub sort_by: Option<PlantSortBy>,
    /// Which name `sort_by=name` orders by.
    pub lang: Option<Language>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let defaults = Pagination::default();
        assert_eq!(defaults.normalize(), (1, 20, 0));

        let wild = Pagination {
            page: Some(-3),
            per_page: Some(1_000),
        };
        assert_eq!(wild.normalize(), (1, 100, 0));

        let third = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(third.normalize(), (3, 10, 20));
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let far = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(far.normalize(), (i64::MAX, 100, i64::MAX));
    }

    #[test]
    fn plant_query_reads_search_and_sort() {
        let parsed: PlantQuery = serde_json::from_value(serde_json::json!({
            "page": "1",
            "q": "fern",
            "sort_by": "price-high",
            "lang": "ne"
        }))
        .unwrap();
        assert_eq!(parsed.q.as_deref(), Some("fern"));
        assert_eq!(parsed.sort_by, Some(PlantSortBy::PriceHigh));
        assert_eq!(parsed.lang, Some(Language::Nepali));
    }

    #[test]
    fn pagination_accepts_numbers_as_strings() {
        let parsed: Pagination = serde_json::from_value(serde_json::json!({
            "page": "2",
            "per_page": 5
        }))
        .unwrap();
        assert_eq!(parsed.normalize(), (2, 5, 5));
    }
}
