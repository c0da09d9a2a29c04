//! Controller modules and the action-to-verb convention.
//!
//! A controller is a named set of actions. Which HTTP verb an action answers to is
//! decided by the shared [`ActionVerbMap`], not by the controller itself, so a
//! controller exporting `read` and `create` is served as `GET` and `POST` by any
//! router built with the conventional map.

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Merged query, body and path parameters handed to an action.
pub type Options = Map<String, Value>;

/// Allow-listed request properties handed to an action.
pub type Meta = Map<String, Value>;

/// Error produced by an action. It reaches the router's error continuation unchanged.
pub type ActionError = anyhow::Error;

/// Future returned by an action.
pub type ActionFuture = BoxFuture<'static, Result<ActionResult, ActionError>>;

/// A single controller action.
pub type ActionFn = Arc<dyn Fn(Options, Meta) -> ActionFuture + Send + Sync>;

/// Reserved key of the legacy result protocol (`{ "barabara": { "redirect": ... } }`).
pub const RESERVED_RESULT_KEY: &str = "barabara";

/// HTTP verbs an action can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Verb {
    Head,
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Which paths a verb is registered on relative to the controller's base route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteShape {
    /// Both `base` and `base/:id`
    CollectionAndItem,
    /// Only `base/:id`
    Item,
    /// Only `base`
    Collection,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Head,
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Head => "head",
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
        }
    }

    pub fn route_shape(&self) -> RouteShape {
        match self {
            Verb::Head | Verb::Get => RouteShape::CollectionAndItem,
            Verb::Put | Verb::Patch | Verb::Delete => RouteShape::Item,
            Verb::Post => RouteShape::Collection,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unsupported verb `{}` (expected one of head, get, post, put, patch, delete)",
                    s
                )
            })
    }
}

impl TryFrom<String> for Verb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Mapping from action name to the verb it is served under.
///
/// Shared read-only by every controller of a router. Deserializes from a plain
/// mapping such as `{ read: GET, create: post }`; verbs are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionVerbMap {
    verbs: BTreeMap<String, Verb>,
}

impl ActionVerbMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resource-style convention: `exists`, `read`, `create`, `update`,
    /// `partial` and `destroy`.
    pub fn conventional() -> Self {
        Self::new()
            .with("exists", Verb::Head)
            .with("read", Verb::Get)
            .with("create", Verb::Post)
            .with("update", Verb::Put)
            .with("partial", Verb::Patch)
            .with("destroy", Verb::Delete)
    }

    pub fn with(mut self, action: impl Into<String>, verb: Verb) -> Self {
        self.verbs.insert(action.into(), verb);
        self
    }

    pub fn verb_for(&self, action: &str) -> Option<Verb> {
        self.verbs.get(action).copied()
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

/// What an action asks the router to answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Serialize as a JSON body
    Json(Value),
    /// Redirect to the given location
    Redirect(String),
    /// Send raw bytes with an explicit content type
    Raw { content_type: String, body: Vec<u8> },
    /// Send a scalar as a raw body
    Send(Value),
}

impl ActionResult {
    /// Interprets a loosely shaped return value.
    ///
    /// An object carrying `barabara.redirect` becomes a redirect, one carrying
    /// `barabara.contentType` becomes a raw body taken from its `buffer` field, any
    /// other object (arrays and `null` included) is JSON, and scalars are sent raw.
    /// A `buffer` that is neither a string nor an array of bytes leaves the object
    /// as JSON.
    pub fn from_value(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            Value::Array(_) | Value::Null => return ActionResult::Json(value),
            scalar => return ActionResult::Send(scalar),
        };

        if let Some(reserved) = map.get(RESERVED_RESULT_KEY).and_then(Value::as_object) {
            if let Some(location) = reserved.get("redirect").and_then(Value::as_str) {
                return ActionResult::Redirect(location.to_string());
            }
            if let Some(content_type) = reserved.get("contentType").and_then(Value::as_str) {
                if let Some(body) = map.get("buffer").and_then(buffer_bytes) {
                    return ActionResult::Raw {
                        content_type: content_type.to_string(),
                        body,
                    };
                }
            }
        }

        ActionResult::Json(Value::Object(map))
    }
}

impl From<Value> for ActionResult {
    fn from(value: Value) -> Self {
        ActionResult::from_value(value)
    }
}

fn buffer_bytes(buffer: &Value) -> Option<Vec<u8>> {
    match buffer {
        Value::String(s) => Some(s.as_bytes().to_vec()),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

/// OpenAPI metadata declared by a controller.
///
/// `operations` holds one operation fragment per action name; `components` holds
/// the shared `schemas`/`responses`/`parameters` the controller contributes. The
/// components value is kept as given and validated when the controller is registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerOpenApi {
    pub operations: Map<String, Value>,
    pub components: Option<Value>,
}

impl ControllerOpenApi {
    /// Splits a raw `openApi` object into per-action fragments and components.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let components = map.remove("components");
        Self {
            operations: map,
            components,
        }
    }

    pub fn operation(mut self, action: impl Into<String>, operation: Value) -> Self {
        self.operations.insert(action.into(), operation);
        self
    }

    pub fn with_components(mut self, components: Value) -> Self {
        self.components = Some(components);
        self
    }
}

/// A loaded controller: its actions, in declaration order, and its OpenAPI metadata.
#[derive(Clone, Default)]
pub struct ControllerModule {
    actions: Vec<(String, ActionFn)>,
    open_api: Option<ControllerOpenApi>,
}

impl ControllerModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an asynchronous action.
    pub fn action<F, Fut>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Options, Meta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, ActionError>> + Send + 'static,
    {
        let boxed: ActionFn =
            Arc::new(move |options: Options, meta: Meta| action(options, meta).boxed());
        self.insert(name.into(), boxed)
    }

    /// Adds (or replaces) an action that completes synchronously.
    pub fn sync_action<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Options, Meta) -> Result<ActionResult, ActionError> + Send + Sync + 'static,
    {
        let boxed: ActionFn = Arc::new(move |options: Options, meta: Meta| {
            futures::future::ready(action(options, meta)).boxed()
        });
        self.insert(name.into(), boxed)
    }

    fn insert(mut self, name: String, action: ActionFn) -> Self {
        match self.actions.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = action,
            None => self.actions.push((name, action)),
        }
        self
    }

    pub fn with_open_api(mut self, open_api: ControllerOpenApi) -> Self {
        self.open_api = Some(open_api);
        self
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionFn)> {
        self.actions.iter().map(|(name, action)| (name.as_str(), action))
    }

    pub fn get_action(&self, name: &str) -> Option<&ActionFn> {
        self.actions
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, action)| action)
    }

    pub fn open_api(&self) -> Option<&ControllerOpenApi> {
        self.open_api.as_ref()
    }
}

impl fmt::Debug for ControllerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerModule")
            .field(
                "actions",
                &self.actions.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("open_api", &self.open_api)
            .finish()
    }
}
