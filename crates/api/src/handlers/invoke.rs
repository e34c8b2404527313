//! Handler for live script endpoints.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use scriptgate_core::error::CoreError;
use scriptgate_core::scripting::executor::OUTCOME_HEADER;
use scriptgate_core::scripting::{Classification, InvocationRequest, InvocationResult};
use scriptgate_core::types::PrincipalId;

use crate::error::AppResult;
use crate::state::AppState;

/// HTTP status for each terminal classification.
pub fn status_for(classification: Classification) -> StatusCode {
    match classification {
        Classification::Success => StatusCode::OK,
        Classification::ScriptError => StatusCode::INTERNAL_SERVER_ERROR,
        Classification::NotFound => StatusCode::NOT_FOUND,
        Classification::Timeout => StatusCode::GATEWAY_TIMEOUT,
        Classification::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET|POST /run/{principal}/{*file}
///
/// Runs `file` from `principal`'s namespace. The body is forwarded to the
/// script's stdin for POST; the script's output is returned verbatim as
/// plain text.
pub async fn invoke_script(
    State(state): State<AppState>,
    Path((principal, file)): Path<(String, String)>,
    method: Method,
    body: Bytes,
) -> AppResult<Response> {
    let principal: PrincipalId = principal.parse()?;
    if !state.registry.contains(principal).await {
        tracing::info!(%principal, "Invocation rejected for unknown principal");
        return Err(CoreError::Authorization(format!(
            "Principal {principal} is not authorized"
        ))
        .into());
    }

    let result = state
        .gateway
        .invoke(InvocationRequest {
            principal,
            file_name: file,
            method: method.as_str().to_string(),
            body: body.to_vec(),
        })
        .await;

    Ok(render(result))
}

fn render(result: InvocationResult) -> Response {
    let status = status_for(result.classification);
    let mut response = (status, Body::from(result.output)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        OUTCOME_HEADER,
        HeaderValue::from_static(result.classification.as_str()),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_classification_has_a_distinct_meaning() {
        assert_eq!(status_for(Classification::Success), StatusCode::OK);
        assert_eq!(status_for(Classification::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(Classification::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(Classification::ScriptError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(Classification::ServerError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn render_sets_plain_text_and_outcome() {
        let response = render(InvocationResult::new(Classification::Timeout, "slow"));
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[OUTCOME_HEADER], "timeout");
    }
}
