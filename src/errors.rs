use hyper::StatusCode;
use serde_json;
use validator::ValidationErrors;

use http::errors::Codeable;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Not found")]
    NotFound,
    #[fail(display = "Parse error")]
    Parse,
    #[fail(display = "Validation error: {:?}", _0)]
    Validate(ValidationErrors),
    #[fail(display = "Authentication required")]
    Unauthorized,
    #[fail(display = "Server is refusing to fullfil the request")]
    Forbidden,
    #[fail(display = "Payload too large")]
    PayloadTooLarge,
    #[fail(display = "Unsupported media type")]
    UnsupportedMediaType,
    #[fail(display = "R2D2 connection error")]
    Connection,
}

impl Codeable for Error {
    fn code(&self) -> StatusCode {
        match *self {
            Error::NotFound => StatusCode::NotFound,
            Error::Parse | Error::Validate(_) => StatusCode::BadRequest,
            Error::Unauthorized => StatusCode::Unauthorized,
            Error::Forbidden => StatusCode::Forbidden,
            Error::PayloadTooLarge => StatusCode::PayloadTooLarge,
            Error::UnsupportedMediaType => StatusCode::UnsupportedMediaType,
            Error::Connection => StatusCode::InternalServerError,
        }
    }

    fn payload(&self) -> Option<serde_json::Value> {
        match *self {
            Error::Validate(ref errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }
}
