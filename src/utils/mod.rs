//! Project-specific utilities live here.

use shelf_http::AppError;

/// Parse a path identifier, treating anything that is not a positive
/// integer as an unknown record.
pub fn parse_id(raw: &str, entity: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::not_found(format!("{} not found", entity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids() {
        assert_eq!(parse_id("12", "Author").unwrap(), 12);
    }

    #[test]
    fn garbage_is_not_found() {
        for raw in ["abc", "0", "-3", "1.5", ""] {
            let err = parse_id(raw, "Book").unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        }
    }
}
