//! The router capability consumed by route registration.
//!
//! Matching requests against paths is the router's business; registration only
//! needs to hand it `(verb, path, handler)` triples. [`RouteTable`] is a router that
//! records those triples in order, for inspection and for hosts that mount the
//! routes on a framework themselves.

use crate::controller::Verb;
use crate::handler::Handler;
use std::fmt;
use std::sync::Arc;

pub trait Router {
    fn route(&mut self, verb: Verb, path: &str, handler: Arc<dyn Handler>);

    fn head(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Verb::Head, path, handler)
    }

    fn get(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Verb::Get, path, handler)
    }

    fn post(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Verb::Post, path, handler)
    }

    fn put(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Verb::Put, path, handler)
    }

    fn patch(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Verb::Patch, path, handler)
    }

    fn delete(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Verb::Delete, path, handler)
    }
}

/// One `(verb, path, handler)` registration.
#[derive(Clone)]
pub struct RegisteredRoute {
    pub verb: Verb,
    pub path: String,
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for RegisteredRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.path)
    }
}

/// Router that keeps registrations in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RegisteredRoute>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered `(verb, path)` pairs, in registration order.
    pub fn signatures(&self) -> Vec<(Verb, String)> {
        self.routes
            .iter()
            .map(|route| (route.verb, route.path.clone()))
            .collect()
    }

    /// Handler registered for exactly this verb and path string.
    pub fn handler(&self, verb: Verb, path: &str) -> Option<&Arc<dyn Handler>> {
        self.routes
            .iter()
            .find(|route| route.verb == verb && route.path == path)
            .map(|route| &route.handler)
    }
}

impl Router for RouteTable {
    fn route(&mut self, verb: Verb, path: &str, handler: Arc<dyn Handler>) {
        self.routes.push(RegisteredRoute {
            verb,
            path: path.to_string(),
            handler,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerFuture, Request, Response};
    use futures::future::FutureExt;

    struct Noop;

    impl Handler for Noop {
        fn call<'a>(
            &'a self,
            _request: &'a Request,
            _response: &'a mut (dyn Response + Send),
        ) -> HandlerFuture<'a> {
            futures::future::ready(Ok(())).boxed()
        }
    }

    #[test]
    fn test_per_verb_methods_record_in_order() {
        let handler: Arc<dyn Handler> = Arc::new(Noop);
        let mut table = RouteTable::new();

        table.get("/users", handler.clone());
        table.delete("/users/:id", handler.clone());
        table.head("/", handler);

        assert_eq!(
            table.signatures(),
            vec![
                (Verb::Get, "/users".to_string()),
                (Verb::Delete, "/users/:id".to_string()),
                (Verb::Head, "/".to_string()),
            ]
        );
        assert!(table.handler(Verb::Get, "/users").is_some());
        assert!(table.handler(Verb::Post, "/users").is_none());
    }
}
