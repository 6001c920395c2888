//! Helpers for reading request bodies, query strings and cookies

use std::collections::HashMap;
use std::str::FromStr;

use failure::Error as FailureError;
use futures::future;
use futures::{Future, Stream};
use hyper::header::{Cookie, Headers};
use hyper::Body;
use serde::de::DeserializeOwned;
use serde_json;
use url::form_urlencoded;

use errors::Error;

/// Collects the body, failing with `PayloadTooLarge` once `limit` bytes are exceeded
pub fn read_body(body: Body, limit: usize) -> Box<Future<Item = Vec<u8>, Error = FailureError>> {
    Box::new(
        body.map_err(|e| FailureError::from(format_err!("Failed to read request body: {}", e).context(Error::Parse)))
            .fold(Vec::new(), move |mut acc, chunk| {
                if acc.len() + chunk.len() > limit {
                    future::err::<Vec<u8>, FailureError>(
                        format_err!("Request body exceeds {} bytes", limit)
                            .context(Error::PayloadTooLarge)
                            .into(),
                    )
                } else {
                    acc.extend_from_slice(&chunk);
                    future::ok(acc)
                }
            }),
    )
}

/// Reads the body and deserializes it from JSON
pub fn parse_body<T: DeserializeOwned + 'static>(body: Body, limit: usize) -> Box<Future<Item = T, Error = FailureError>> {
    Box::new(read_body(body, limit).and_then(|bytes| {
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            format_err!("Failed to parse request body: {}", e)
                .context(Error::Parse)
                .into()
        })
    }))
}

/// Splits an urlencoded query string into a key-value map. Later keys win.
pub fn query_params(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Typed lookup of a query parameter. Empty values count as absent.
pub fn query_param<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Result<Option<T>, FailureError> {
    match params.get(key) {
        Some(value) if !value.is_empty() => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| format_err!("Invalid value {:?} for query parameter {}", value, key).context(Error::Parse).into()),
        _ => Ok(None),
    }
}

pub fn cookie_value(headers: &Headers, name: &str) -> Option<String> {
    headers
        .get::<Cookie>()
        .and_then(|cookie| cookie.get(name))
        .map(|value| value.to_string())
}

/// `Set-Cookie` value for a session token
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}", name, token, max_age_secs);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the cookie on the client
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}
