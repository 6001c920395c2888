//! Extraction of the `image` field from `multipart/form-data` bodies
use std::io::{Cursor, Read};

use failure::Error as FailureError;
use hyper::header::{ContentType, Headers};
use hyper::mime;
use multipart::server::Multipart;

use errors::Error;
use services::UploadedImage;

pub const IMAGE_FIELD: &str = "image";

fn boundary(headers: &Headers) -> Option<String> {
    headers.get::<ContentType>().and_then(|content_type| {
        let ContentType(ref mime_type) = *content_type;
        if mime_type.type_() == mime::MULTIPART && mime_type.subtype() == mime::FORM_DATA {
            mime_type.get_param(mime::BOUNDARY).map(|value| value.as_str().to_string())
        } else {
            None
        }
    })
}

fn missing_image() -> FailureError {
    format_err!("Field {} is missing", IMAGE_FIELD)
        .context(Error::Validate(validation_errors!({"image": ["required" => "Image file is required"]})))
        .into()
}

/// Reads the first `image` part of the form
pub fn extract_image(headers: &Headers, body: Vec<u8>) -> Result<UploadedImage, FailureError> {
    let boundary = boundary(headers).ok_or_else(|| format_err!("Expected multipart/form-data body").context(Error::Parse))?;
    let mut multipart = Multipart::with_body(Cursor::new(body), boundary);

    while let Some(mut field) = multipart
        .read_entry()
        .map_err(|e| format_err!("Malformed multipart body: {}", e).context(Error::Parse))?
    {
        if &*field.headers.name != IMAGE_FIELD {
            continue;
        }
        let content_type = field
            .headers
            .content_type
            .as_ref()
            .map(|mime_type| mime_type.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let mut bytes = Vec::new();
        field
            .data
            .read_to_end(&mut bytes)
            .map_err(|e| format_err!("Malformed multipart body: {}", e).context(Error::Parse))?;
        debug!("Received {} upload of {} bytes", content_type, bytes.len());
        return Ok(UploadedImage { content_type, bytes });
    }

    Err(missing_image())
}
