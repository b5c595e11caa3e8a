//! Presentation adapters: turn an `OrchestrationResult` into an HTTP response.
//!
//! Both responders consume the result value; neither knows how it was produced.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::document::{DocumentParams, OdcTemplate};
use crate::management::types::AutostartError;
use crate::orchestrator::OrchestrationResult;

pub const ODC_CONTENT_TYPE: &str = "text/x-ms-odc";

/// Plain connection string.
pub fn plain(result: OrchestrationResult) -> Response {
    match result {
        OrchestrationResult::Ready { endpoint } => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            endpoint,
        )
            .into_response(),
        other => failure(other),
    }
}

/// ODC document pointing at the endpoint.
pub fn odc(result: OrchestrationResult, template: &OdcTemplate, params: &DocumentParams) -> Response {
    match result {
        OrchestrationResult::Ready { endpoint } => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, ODC_CONTENT_TYPE)],
            template.render(&endpoint, params),
        )
            .into_response(),
        other => failure(other),
    }
}

/// Status code for a result that did not produce an endpoint.
pub fn failure_status(result: &OrchestrationResult) -> StatusCode {
    match result {
        OrchestrationResult::Ready { .. } => StatusCode::OK,
        OrchestrationResult::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        OrchestrationResult::Failed { cause } => match cause {
            AutostartError::Auth(_) | AutostartError::Http { .. } => StatusCode::BAD_GATEWAY,
            AutostartError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AutostartError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AutostartError::MissingEndpoint | AutostartError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}

fn failure(result: OrchestrationResult) -> Response {
    let status = failure_status(&result);
    let message = match status {
        StatusCode::GATEWAY_TIMEOUT => "Server did not become ready in time",
        StatusCode::BAD_GATEWAY => "Management API request failed",
        StatusCode::SERVICE_UNAVAILABLE => "Service is shutting down",
        _ => "Failed to start server",
    };
    (status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::types::RemoteOperation;
    use std::time::Duration;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_plain_ready() {
        let response = plain(OrchestrationResult::Ready {
            endpoint: "asazure://srv".into(),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "asazure://srv");
    }

    #[tokio::test]
    async fn test_odc_ready() {
        let params = DocumentParams::from_segments("cubes", Some("Sales"), None);
        let response = odc(
            OrchestrationResult::Ready {
                endpoint: "asazure://srv".into(),
            },
            &OdcTemplate::new("{serverFullURI}/{database}/{cube}"),
            &params,
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            ODC_CONTENT_TYPE
        );
        assert_eq!(
            body_text(response).await,
            "asazure://srv/Sales/YouDidNotSpecifyCube"
        );
    }

    #[test]
    fn test_failure_statuses() {
        let timed_out = OrchestrationResult::TimedOut {
            deadline: Duration::from_secs(600),
        };
        assert_eq!(failure_status(&timed_out), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(plain(timed_out).status(), StatusCode::GATEWAY_TIMEOUT);

        let http = OrchestrationResult::Failed {
            cause: AutostartError::Http {
                operation: RemoteOperation::Resume,
                status: Some(409),
                message: "Conflict".into(),
            },
        };
        assert_eq!(failure_status(&http), StatusCode::BAD_GATEWAY);

        let cancelled = OrchestrationResult::Failed {
            cause: AutostartError::Cancelled,
        };
        assert_eq!(failure_status(&cancelled), StatusCode::SERVICE_UNAVAILABLE);

        let missing = OrchestrationResult::Failed {
            cause: AutostartError::MissingEndpoint,
        };
        assert_eq!(
            odc(missing, &OdcTemplate::builtin(), &DocumentParams::from_segments("c", None, None))
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
