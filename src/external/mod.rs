pub mod auth_service;
pub mod inventory_service;
pub mod s3;

use reqwest::{RequestBuilder, Response, header::AUTHORIZATION};
use thiserror::Error;

/// Failure of an outbound call to another service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Connection, timeout or body decoding failure.
    #[error("request to {service} failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error("{service} responded with {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },
}

impl ServiceError {
    pub fn service(&self) -> &'static str {
        match self {
            ServiceError::Request { service, .. } | ServiceError::Status { service, .. } => {
                service
            }
        }
    }
}

impl From<ServiceError> for crate::common::errors::BusinessError {
    fn from(err: ServiceError) -> Self {
        crate::common::errors::BusinessError::ExternalServiceError {
            service: err.service().to_string(),
            message: err.to_string(),
        }
    }
}

/// Attach the caller's `Authorization` header so the callee sees the same identity.
pub(crate) fn with_bearer(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(value) => request.header(AUTHORIZATION, value),
        None => request,
    }
}

/// Send a request and turn transport errors and non-2xx statuses into `ServiceError`.
pub(crate) async fn send(
    service: &'static str,
    request: RequestBuilder,
) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|source| ServiceError::Request { service, source })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        message,
    })
}

/// Decode a successful JSON response body.
pub(crate) async fn json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, ServiceError> {
    response
        .json::<T>()
        .await
        .map_err(|source| ServiceError::Request { service, source })
}
