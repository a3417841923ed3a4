//! Company identity extractor.
//!
//! Admin requests arrive through the platform's extension proxy, which
//! authenticates the dashboard user and stamps the company on the request.
//! Handlers take [`Company`] as an argument to get it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use velvet_rope_core::CompanyId;

use crate::error::AppError;

/// Header carrying the authenticated company ID.
pub const COMPANY_HEADER: &str = "x-company-id";

/// The company an admin request acts on behalf of.
#[derive(Debug, Clone)]
pub struct Company(pub CompanyId);

impl<S> FromRequestParts<S> for Company
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let company_id = parts
            .headers
            .get(COMPANY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing X-Company-Id header".to_owned()))?;

        Ok(Self(CompanyId::new(company_id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_company_header() {
        let request = Request::builder()
            .header("X-Company-Id", "8774")
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();

        let company = Company::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(company.0, CompanyId::new("8774"));
    }

    #[tokio::test]
    async fn test_rejects_missing_header() {
        let request = Request::builder().body(()).unwrap();
        let (mut parts, ()) = request.into_parts();

        let result = Company::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
