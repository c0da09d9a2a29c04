//! Adapter between router requests and controller actions.
//!
//! The router only ever sees [`Handler`] trait objects. [`ActionHandler`] turns a
//! request into the `(options, meta)` pair an action expects and turns the
//! [`ActionResult`] back into calls on the router's [`Response`].

use crate::controller::{ActionError, ActionFn, ActionResult, ControllerModule, Meta, Options};
use crate::error::{Error, Result};
use crate::openapi_builder::OpenApiDocument;
use futures::future::{BoxFuture, FutureExt};
use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key under which an uploaded-file payload must carry its content to be forwarded.
const FILES_PAYLOAD_KEY: &str = "data";

/// Request data as provided by the router.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Query string parameters
    pub query: Map<String, Value>,
    /// Parsed request body
    pub body: Value,
    /// Path parameters (e.g. `id` for `/users/:id`)
    pub params: Map<String, Value>,
    /// Uploaded files, if the router's upload middleware produced any
    pub files: Option<Value>,
    /// Context injected by the router or its middleware (authenticated user, trace id...)
    pub properties: Map<String, Value>,
}

/// Response capability of the router.
pub trait Response {
    fn redirect(&mut self, location: &str);
    fn set_header(&mut self, name: &str, value: &str);
    fn send(&mut self, body: &[u8]);
    fn json(&mut self, body: &Value);
}

pub type HandlerFuture<'a> = BoxFuture<'a, std::result::Result<(), ActionError>>;

/// A request handler registered on a router.
///
/// `Err` is the failure continuation: the router hands it to its error handling
/// for that single request.
pub trait Handler: Send + Sync {
    fn call<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut (dyn Response + Send),
    ) -> HandlerFuture<'a>;
}

/// Handler bound to one action of one controller.
pub struct ActionHandler {
    action: String,
    action_fn: ActionFn,
    meta_keys: Arc<[String]>,
}

impl ActionHandler {
    /// Binds `action` of `controller`. `meta_keys` is the allow-list of request
    /// properties forwarded to the action as `meta`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the controller has no such action.
    pub fn new(
        controller: Arc<ControllerModule>,
        action: &str,
        meta_keys: Arc<[String]>,
    ) -> Result<Self> {
        let action_fn = controller
            .get_action(action)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(format!("controller has no action `{}`", action)))?;

        Ok(Self {
            action: action.to_string(),
            action_fn,
            meta_keys,
        })
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Runs the action for one request and writes its result to `response`.
    ///
    /// An action error is returned exactly as the action produced it and nothing
    /// is written to the response.
    pub async fn handle(
        &self,
        request: &Request,
        response: &mut (dyn Response + Send),
    ) -> std::result::Result<(), ActionError> {
        let options = merge_options(request);
        let meta = select_meta(request, &self.meta_keys);

        debug!("Invoking action `{}`", self.action);
        let result = (self.action_fn)(options, meta).await?;

        send_result(result, response);
        Ok(())
    }
}

impl Handler for ActionHandler {
    fn call<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut (dyn Response + Send),
    ) -> HandlerFuture<'a> {
        self.handle(request, response).boxed()
    }
}

/// Serves a sealed OpenAPI document as JSON.
pub struct DocumentHandler {
    body: Value,
}

impl DocumentHandler {
    pub fn new(document: &OpenApiDocument) -> Result<Self> {
        Ok(Self {
            body: serde_json::to_value(document)?,
        })
    }
}

impl Handler for DocumentHandler {
    fn call<'a>(
        &'a self,
        _request: &'a Request,
        response: &'a mut (dyn Response + Send),
    ) -> HandlerFuture<'a> {
        response.json(&self.body);
        futures::future::ready(Ok(())).boxed()
    }
}

/// Merges query, body and path parameters, later sources winning on collisions.
pub fn merge_options(request: &Request) -> Options {
    let mut options = request.query.clone();

    if let Value::Object(body) = &request.body {
        options.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    options.extend(request.params.iter().map(|(k, v)| (k.clone(), v.clone())));

    if let Some(files) = &request.files {
        if files.get(FILES_PAYLOAD_KEY).is_some() {
            options.insert("files".to_string(), files.clone());
        }
    }

    options
}

/// Picks the request properties named in `meta_keys`.
pub fn select_meta(request: &Request, meta_keys: &[String]) -> Meta {
    request
        .properties
        .iter()
        .filter(|(key, _)| meta_keys.contains(key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Writes an action result to the response.
pub fn send_result(result: ActionResult, response: &mut (dyn Response + Send)) {
    match result {
        ActionResult::Redirect(location) => response.redirect(&location),
        ActionResult::Raw { content_type, body } => {
            response.set_header("Content-Type", &content_type);
            response.send(&body);
        }
        ActionResult::Json(value) => response.json(&value),
        ActionResult::Send(Value::String(text)) => response.send(text.as_bytes()),
        ActionResult::Send(value) => response.send(value.to_string().as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Call {
        Redirect(String),
        Header(String, String),
        Send(Vec<u8>),
        Json(Value),
    }

    #[derive(Default)]
    struct RecordingResponse {
        calls: Vec<Call>,
    }

    impl Response for RecordingResponse {
        fn redirect(&mut self, location: &str) {
            self.calls.push(Call::Redirect(location.to_string()));
        }
        fn set_header(&mut self, name: &str, value: &str) {
            self.calls.push(Call::Header(name.to_string(), value.to_string()));
        }
        fn send(&mut self, body: &[u8]) {
            self.calls.push(Call::Send(body.to_vec()));
        }
        fn json(&mut self, body: &Value) {
            self.calls.push(Call::Json(body.clone()));
        }
    }

    fn handler_for(controller: ControllerModule, action: &str, meta_keys: &[&str]) -> ActionHandler {
        let keys: Vec<String> = meta_keys.iter().map(|k| k.to_string()).collect();
        ActionHandler::new(Arc::new(controller), action, keys.into()).unwrap()
    }

    fn run(handler: &ActionHandler, request: &Request) -> (std::result::Result<(), ActionError>, Vec<Call>) {
        let mut response = RecordingResponse::default();
        let outcome = block_on(handler.call(request, &mut response));
        (outcome, response.calls)
    }

    #[test]
    fn test_handler_is_bound_to_action() {
        let controller = ControllerModule::new()
            .sync_action("read", |_, _| Ok(ActionResult::Json(Value::Null)));
        let handler = handler_for(controller, "read", &[]);
        assert_eq!(handler.action(), "read");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = ActionHandler::new(Arc::new(ControllerModule::new()), "create", Arc::from(Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_redirect() {
        let controller = ControllerModule::new().sync_action("create", |_, _| {
            Ok(ActionResult::from_value(json!({ "barabara": { "redirect": "x" } })))
        });
        let handler = handler_for(controller, "create", &[]);

        let (outcome, calls) = run(&handler, &Request::default());

        assert!(outcome.is_ok());
        assert_eq!(calls, vec![Call::Redirect("x".to_string())]);
    }

    #[test]
    fn test_raw_body_with_content_type() {
        let controller = ControllerModule::new().sync_action("read", |_, _| {
            Ok(ActionResult::Raw {
                content_type: "text/html".to_string(),
                body: b"<p>hi</p>".to_vec(),
            })
        });
        let handler = handler_for(controller, "read", &[]);

        let (_, calls) = run(&handler, &Request::default());

        assert_eq!(
            calls,
            vec![
                Call::Header("Content-Type".to_string(), "text/html".to_string()),
                Call::Send(b"<p>hi</p>".to_vec()),
            ]
        );
    }

    #[test]
    fn test_plain_object_sent_as_json() {
        let controller = ControllerModule::new()
            .sync_action("read", |_, _| Ok(ActionResult::from_value(json!({ "a": 1 }))));
        let handler = handler_for(controller, "read", &[]);

        let (_, calls) = run(&handler, &Request::default());

        assert_eq!(calls, vec![Call::Json(json!({ "a": 1 }))]);
    }

    #[test]
    fn test_string_sent_raw() {
        let controller = ControllerModule::new()
            .sync_action("read", |_, _| Ok(ActionResult::from_value(json!("<html></html>"))));
        let handler = handler_for(controller, "read", &[]);

        let (_, calls) = run(&handler, &Request::default());

        assert_eq!(calls, vec![Call::Send(b"<html></html>".to_vec())]);
    }

    #[derive(Debug)]
    struct Denied;

    impl std::fmt::Display for Denied {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("denied")
        }
    }

    impl std::error::Error for Denied {}

    #[test]
    fn test_action_error_is_forwarded_untouched() {
        let controller = ControllerModule::new().action("destroy", |_, _| async {
            Err::<ActionResult, _>(ActionError::new(Denied))
        });
        let handler = handler_for(controller, "destroy", &[]);

        let (outcome, calls) = run(&handler, &Request::default());

        let err = outcome.unwrap_err();
        assert!(err.downcast_ref::<Denied>().is_some());
        assert_eq!(err.to_string(), "denied");
        assert!(calls.is_empty());
    }

    #[test]
    fn test_options_merge_order() {
        let seen = Arc::new(Mutex::new(Options::new()));
        let sink = seen.clone();
        let controller = ControllerModule::new().sync_action("update", move |options, _| {
            *sink.lock().unwrap() = options;
            Ok(ActionResult::Json(Value::Null))
        });
        let handler = handler_for(controller, "update", &[]);

        let request = Request {
            query: json!({ "id": "q", "page": 2, "name": "q" }).as_object().unwrap().clone(),
            body: json!({ "name": "body", "id": "b" }),
            params: json!({ "id": "7" }).as_object().unwrap().clone(),
            ..Request::default()
        };
        let (outcome, _) = run(&handler, &request);

        assert!(outcome.is_ok());
        let options = seen.lock().unwrap().clone();
        assert_eq!(options.get("id"), Some(&json!("7")));
        assert_eq!(options.get("name"), Some(&json!("body")));
        assert_eq!(options.get("page"), Some(&json!(2)));
        assert!(!options.contains_key("files"));
    }

    #[test]
    fn test_files_attached_only_with_payload() {
        let with_data = Request {
            files: Some(json!({ "data": { "name": "a.png" } })),
            ..Request::default()
        };
        let without_data = Request {
            files: Some(json!({ "other": true })),
            ..Request::default()
        };

        assert_eq!(
            merge_options(&with_data).get("files"),
            Some(&json!({ "data": { "name": "a.png" } }))
        );
        assert!(merge_options(&without_data).get("files").is_none());
    }

    #[test]
    fn test_meta_only_contains_allowed_keys() {
        let seen = Arc::new(Mutex::new(Meta::new()));
        let sink = seen.clone();
        let controller = ControllerModule::new().sync_action("read", move |_, meta| {
            *sink.lock().unwrap() = meta;
            Ok(ActionResult::Json(Value::Null))
        });
        let handler = handler_for(controller, "read", &["user"]);

        let request = Request {
            properties: json!({ "user": { "id": 1 }, "token": "secret" })
                .as_object()
                .unwrap()
                .clone(),
            ..Request::default()
        };
        run(&handler, &request);

        let meta = seen.lock().unwrap().clone();
        assert_eq!(meta.get("user"), Some(&json!({ "id": 1 })));
        assert!(!meta.contains_key("token"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_async_action_result_is_awaited() {
        let controller = ControllerModule::new().action("read", |options, _| async move {
            Ok(ActionResult::Json(json!({ "echo": options.get("q").cloned() })))
        });
        let handler = handler_for(controller, "read", &[]);
        let request = Request {
            query: json!({ "q": "hello" }).as_object().unwrap().clone(),
            ..Request::default()
        };

        let (_, calls) = run(&handler, &request);

        assert_eq!(calls, vec![Call::Json(json!({ "echo": "hello" }))]);
    }

    #[test]
    fn test_unexpected_failure_keeps_message() {
        let controller = ControllerModule::new()
            .sync_action("read", |_, _| Err(anyhow!("database unavailable")));
        let handler = handler_for(controller, "read", &[]);

        let (outcome, calls) = run(&handler, &Request::default());

        assert_eq!(outcome.unwrap_err().to_string(), "database unavailable");
        assert!(calls.is_empty());
    }
}
