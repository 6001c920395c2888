//! Thin HTTP plumbing on top of `hyper`: the `Application` service that
//! drives a `Controller`, converts its `Reply` into a response and renders
//! failures from the error chain.

pub mod errors;
pub mod request_util;
pub mod router;

use std::marker::PhantomData;

use failure::{Error as FailureError, Fail};
use futures::future::Future;
use hyper;
use hyper::header::{ContentLength, ContentType, SetCookie};
use hyper::server::{Request, Response, Service};
use hyper::StatusCode;
use serde::Serialize;
use serde_json;

use self::errors::{render_error, Codeable};

/// Controller layer Future
pub type ControllerFuture = Box<Future<Item = Reply, Error = FailureError>>;

/// Anything that can turn a request into a `Reply`
pub trait Controller {
    fn call(&self, request: Request) -> ControllerFuture;
}

/// Successful controller output
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub cookies: Vec<String>,
}

impl Reply {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, FailureError> {
        let body = serde_json::to_string(value)?;
        Ok(Reply {
            status: StatusCode::Ok,
            body,
            cookies: vec![],
        })
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new()
            .with_status(self.status)
            .with_header(ContentLength(self.body.len() as u64))
            .with_header(ContentType::json());
        if !self.cookies.is_empty() {
            response.headers_mut().set(SetCookie(self.cookies));
        }
        response.with_body(self.body)
    }
}

/// Hyper service wrapping a controller. `E` is the error taxonomy looked up
/// in failure chains to derive the response status.
pub struct Application<E> {
    controller: Box<dyn Controller>,
    phantom: PhantomData<E>,
}

impl<E> Application<E> {
    pub fn new<C: Controller + 'static>(controller: C) -> Self {
        Self {
            controller: Box::new(controller),
            phantom: PhantomData,
        }
    }
}

impl<E: Fail + Codeable> Service for Application<E> {
    type Request = Request;
    type Response = Response;
    type Error = hyper::Error;
    type Future = Box<Future<Item = Response, Error = hyper::Error>>;

    fn call(&self, request: Request) -> Self::Future {
        let description = format!("{} {}", request.method(), request.path());
        debug!("Received request {}", description);

        Box::new(self.controller.call(request).then(move |result| match result {
            Ok(reply) => Ok(reply.into_response()),
            Err(err) => Ok(render_error::<E>(&description, &err)),
        }))
    }
}
