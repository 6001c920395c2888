//! Rendering of failure chains into JSON error bodies

use failure::{Context, Error as FailureError, Fail};
use hyper::header::{ContentLength, ContentType};
use hyper::server::Response;
use hyper::StatusCode;
use serde_json;

/// Error types that know their HTTP representation
pub trait Codeable {
    fn code(&self) -> StatusCode;
    fn payload(&self) -> Option<serde_json::Value>;
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorMessage {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payload: Option<serde_json::Value>,
}

/// Finds the first taxonomy error in the chain, either raised directly or
/// attached as a context.
pub fn find_code<'a, E: Fail + Codeable>(err: &'a FailureError) -> Option<&'a E> {
    err.iter_chain()
        .filter_map(|fail| {
            fail.downcast_ref::<E>()
                .or_else(|| fail.downcast_ref::<Context<E>>().map(|ctx| ctx.get_context()))
        }).next()
}

pub fn error_message<E: Fail + Codeable>(err: &FailureError) -> ErrorMessage {
    match find_code::<E>(err) {
        Some(e) => ErrorMessage {
            code: e.code().as_u16(),
            message: e.to_string(),
            payload: e.payload(),
        },
        None => ErrorMessage {
            code: StatusCode::InternalServerError.as_u16(),
            message: "Internal server error".to_string(),
            payload: None,
        },
    }
}

fn chain_to_string(err: &FailureError) -> String {
    err.iter_chain().map(|fail| fail.to_string()).collect::<Vec<_>>().join(" | ")
}

pub fn render_error<E: Fail + Codeable>(request: &str, err: &FailureError) -> Response {
    let message = error_message::<E>(err);
    let status = find_code::<E>(err).map(|e| e.code()).unwrap_or(StatusCode::InternalServerError);
    if status.is_server_error() {
        error!("{} failed with {}: {}", request, message.code, chain_to_string(err));
    } else {
        warn!("{} failed with {}: {}", request, message.code, chain_to_string(err));
    }

    let body = serde_json::to_string(&message).unwrap_or_else(|_| r#"{"code":500,"message":"Internal server error"}"#.to_string());
    Response::new()
        .with_status(status)
        .with_header(ContentLength(body.len() as u64))
        .with_header(ContentType::json())
        .with_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::Error;

    #[test]
    fn picks_context_error_from_chain() {
        let err: FailureError = format_err!("No category 7")
            .context(Error::NotFound)
            .context("Service categories, get endpoint error occurred.")
            .into();
        let message = error_message::<Error>(&err);
        assert_eq!(message.code, 404);
        assert_eq!(message.message, "Not found");
    }

    #[test]
    fn untagged_error_is_internal() {
        let err = format_err!("boom");
        assert_eq!(error_message::<Error>(&err).code, 500);
    }

    #[test]
    fn validation_payload_is_attached() {
        let err: FailureError = Error::Validate(validation_errors!({"slug": ["slug" => "Slug already exists"]})).into();
        let message = error_message::<Error>(&err);
        assert_eq!(message.code, 400);
        assert!(message.payload.unwrap().get("slug").is_some());
    }
}
