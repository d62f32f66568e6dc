//! Error conversion glue between layers.
//!
//! The domain layer must not depend on service error types, so the
//! conversions live here instead.

use crate::domain::types::TypeConstraintError;
use crate::forms::import_export::UploadParseError;
use crate::keepa::ApiError;
use crate::services::ServiceError;
use crate::services::import_export::ExportError;
use crate::services::products::classify_api_error;

impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        match val {
            TypeConstraintError::InvalidAsin(value) => ServiceError::InvalidFormat(vec![value]),
            other => ServiceError::Form(other.to_string()),
        }
    }
}

impl From<ApiError> for ServiceError {
    fn from(val: ApiError) -> Self {
        classify_api_error(val)
    }
}

impl From<UploadParseError> for ServiceError {
    fn from(val: UploadParseError) -> Self {
        ServiceError::Form(val.to_string())
    }
}

impl From<ExportError> for ServiceError {
    fn from(val: ExportError) -> Self {
        ServiceError::Form(val.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_asin_becomes_invalid_format() {
        let err: ServiceError = TypeConstraintError::InvalidAsin("bad".into()).into();
        assert_eq!(err, ServiceError::InvalidFormat(vec!["bad".into()]));
    }

    #[test]
    fn upload_errors_become_form_errors() {
        let err: ServiceError = UploadParseError::CsvParseFailed.into();
        assert_eq!(err, ServiceError::Form("failed to parse CSV".into()));
    }

    #[test]
    fn api_errors_are_classified() {
        let err: ServiceError = ApiError::Timeout.into();
        assert_eq!(err, ServiceError::Timeout);
    }
}
