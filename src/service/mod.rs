//! Request routing.
//!
//! A [`ServiceRegistry`] holds the services of a server in registration order, each claiming a
//! path prefix. [`dispatch`] resolves the first service whose prefix literally starts the request
//! path and runs the operation for the request method.
//!
//! # Outcomes
//!
//! Every request lands in exactly one [`Dispatch`] outcome:
//!
//! - [`Dispatch::NotFound`]: no prefix matched; status `404`, no service runs.
//! - [`Dispatch::Head`]: the service's [`Service::head`] ran.
//! - [`Dispatch::Get`]: the service's [`Service::get`] ran.
//! - [`Dispatch::MethodNotAllowed`]: a service matched but the method is neither `HEAD` nor
//!   `GET`; status `405`, the service does not run.
//!
//! The registry is built once before the server starts and only read afterwards, so workers share
//! it without locking.
use log::info;

use crate::protocol::{Request, Response};

mod file;

pub use file::FileService;

/// Handler for requests under a path prefix.
///
/// Failures such as a missing file are reported through [`Response::set_status`]; a service
/// never abandons the connection.
pub trait Service: Send + Sync {
    /// Fill in status and headers. Must not set a body.
    fn head(&self, request: &Request, response: &mut Response);

    /// Fill in status, headers and body.
    fn get(&self, request: &Request, response: &mut Response);
}

struct ServiceEntry {
    prefix: String,
    service: Box<dyn Service>,
}

#[derive(Default)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a service. Earlier registrations win over later ones.
    pub fn register<S>(&mut self, prefix: impl Into<String>, service: S) -> &mut Self
    where
        S: Service + 'static,
    {
        self.entries.push(ServiceEntry {
            prefix: prefix.into(),
            service: Box::new(service),
        });
        self
    }

    /// First service whose prefix starts `path`.
    pub fn find(&self, path: &str) -> Option<&dyn Service> {
        self.entries
            .iter()
            .find(|entry| path.starts_with(&entry.prefix))
            .map(|entry| entry.service.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which branch of the routing table a request took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    NotFound,
    Head,
    Get,
    MethodNotAllowed,
}

pub fn dispatch(
    registry: &ServiceRegistry,
    request: &Request,
    response: &mut Response,
) -> Dispatch {
    let Some(service) = registry.find(request.path()) else {
        response.set_status(404);
        return Dispatch::NotFound;
    };

    if request.is_head() {
        info!("HEAD {}", request.path());
        service.head(request, response);
        strip_body(response);
        Dispatch::Head
    } else if request.is_get() {
        info!("GET {}", request.path());
        service.get(request, response);
        Dispatch::Get
    } else {
        response.set_status(405);
        Dispatch::MethodNotAllowed
    }
}

/// HEAD answers carry no body; a body a service set anyway only contributes its length.
fn strip_body(response: &mut Response) {
    let body = response.take_body();
    if !body.is_empty() && response.header("Content-Length").is_none() {
        response.set_header("Content-Length", body.len().to_string());
    }
}
