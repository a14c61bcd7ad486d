use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

#[allow(dead_code)]
impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }

    pub fn err(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            data: None,
        }
    }
}

/// Paginated list envelope: `items` plus the pagination state clients need
/// to render pagers (current page, page count, prev/next availability).
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            pages,
            has_prev: page > 1 && pages > 0,
            has_next: page < pages,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_basic() {
        let resp = PaginatedResponse::<String>::new(vec![], 100, 1, 20);
        assert_eq!(resp.pages, 5);
        assert!(!resp.has_prev);
        assert!(resp.has_next);
    }

    #[test]
    fn page_count_with_remainder() {
        let resp = PaginatedResponse::<String>::new(vec![], 101, 6, 20);
        assert_eq!(resp.pages, 6);
        assert!(resp.has_prev);
        assert!(!resp.has_next);
    }

    #[test]
    fn middle_page_has_both_neighbors() {
        let resp = PaginatedResponse::<String>::new(vec![], 100, 3, 20);
        assert!(resp.has_prev);
        assert!(resp.has_next);
    }

    #[test]
    fn zero_per_page_yields_no_pages() {
        let resp = PaginatedResponse::<String>::new(vec![], 10, 1, 0);
        assert_eq!(resp.pages, 0);
        assert!(!resp.has_next);
    }

    #[test]
    fn empty_result_has_no_neighbors() {
        let resp = PaginatedResponse::<String>::new(vec![], 0, 1, 20);
        assert_eq!(resp.pages, 0);
        assert!(!resp.has_prev);
        assert!(!resp.has_next);
    }

    #[test]
    fn single_item_fits_one_page() {
        let resp = PaginatedResponse::<String>::new(vec![], 1, 1, 20);
        assert_eq!(resp.pages, 1);
        assert!(!resp.has_next);
    }
}
