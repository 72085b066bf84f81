use serde::Serialize;
use utoipa::ToSchema;

/// Pagination details attached to list responses.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }

    /// Meta for an unpaginated list that is returned whole.
    pub fn whole(total: usize) -> Self {
        let total = total as i64;
        Self::new(1, total.max(1), total)
    }
}

/// Envelope shared by every JSON response, errors included.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// Slices an in-memory list the way `LIMIT/OFFSET` would.
pub fn paginate<T>(items: Vec<T>, page: i64, per_page: i64, offset: i64) -> (Vec<T>, Meta) {
    let total = items.len() as i64;
    let page_items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(per_page.max(0) as usize)
        .collect();
    (page_items, Meta::new(page, per_page, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_returns_requested_window() {
        let (items, meta) = paginate((1..=25).collect::<Vec<_>>(), 2, 10, 10);
        assert_eq!(items, (11..=20).collect::<Vec<_>>());
        assert_eq!(meta, Meta::new(2, 10, 25));
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let (items, meta) = paginate(vec![1, 2, 3], 5, 20, 80);
        assert!(items.is_empty());
        assert_eq!(meta.total, Some(3));
    }
}
