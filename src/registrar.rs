//! Registration of one controller's actions on a router.

use crate::assembler::Barabara;
use crate::controller::{ControllerModule, ControllerOpenApi, RouteShape, Verb};
use crate::error::{Error, Result};
use crate::handler::ActionHandler;
use crate::openapi_builder::{document_path, ComponentKind, OpenApiBuilder};
use crate::route_path::to_slug_case;
use crate::router::Router;
use log::debug;
use serde_json::Value;
use std::sync::Arc;

const ID_SEGMENT: &str = "/:id";

/// Paths `verb` is registered on for a controller served at `base_route`.
///
/// The root route never gets an `/:id` sibling.
pub fn route_paths(verb: Verb, base_route: &str) -> Vec<String> {
    let base = base_route.trim_end_matches('/');
    if base.is_empty() {
        return vec!["/".to_string()];
    }

    let item = format!("{}{}", base, ID_SEGMENT);
    match verb.route_shape() {
        RouteShape::CollectionAndItem => vec![base.to_string(), item],
        RouteShape::Item => vec![item],
        RouteShape::Collection => vec![base.to_string()],
    }
}

/// Operation id for `action` on `path`: `<slug of base route>_<action>`, with an
/// `_id` suffix on item paths. The root route has an empty slug (`_read`).
pub fn operation_id(base_route: &str, action: &str, path: &str) -> String {
    let slug = to_slug_case(base_route);
    let suffix = if path.ends_with(ID_SEGMENT) { "_id" } else { "" };
    format!("{}_{}{}", slug, action, suffix)
}

impl Barabara {
    /// Registers every action of `controller` that has a verb in the action map.
    ///
    /// Each action gets one handler, registered on every path of its verb's route
    /// shape. When `openapi` is given and the controller declares OpenAPI metadata,
    /// its operation fragments are documented under those paths and its components
    /// are merged into the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidControllerOpenApi`] when the controller's OpenAPI
    /// metadata is malformed.
    pub fn register_controller<R: Router + ?Sized>(
        &self,
        router: &mut R,
        base_route: &str,
        controller: &Arc<ControllerModule>,
        meta_keys: &Arc<[String]>,
        mut openapi: Option<&mut OpenApiBuilder>,
    ) -> Result<()> {
        let open_api = controller.open_api();
        let mut components_merged = false;

        for (action, _) in controller.actions() {
            let Some(verb) = self.actions().verb_for(action) else {
                continue;
            };

            let paths = route_paths(verb, base_route);
            let action_handler = ActionHandler::new(controller.clone(), action, meta_keys.clone())?;

            if let (Some(builder), Some(open_api)) = (openapi.as_deref_mut(), open_api) {
                if !components_merged {
                    merge_components(builder, open_api, action, base_route)?;
                    components_merged = true;
                }
                for path in &paths {
                    document_operation(builder, open_api, verb, path, action, base_route)?;
                }
            }

            let handler = Arc::new(action_handler);
            for path in &paths {
                debug!("Registering {} {} -> {}", verb, path, handler.action());
                router.route(verb, path, handler.clone());
            }
        }

        Ok(())
    }
}

fn document_operation(
    builder: &mut OpenApiBuilder,
    open_api: &ControllerOpenApi,
    verb: Verb,
    path: &str,
    action: &str,
    base_route: &str,
) -> Result<()> {
    let key = document_path(path);
    builder.ensure_path(&key);

    let Some(fragment) = open_api.operations.get(action) else {
        return Ok(());
    };
    let Value::Object(fragment) = fragment else {
        return Err(invalid(
            &format!("openApi.{}", action),
            action,
            base_route,
        ));
    };

    let mut operation = fragment.clone();
    operation.insert(
        "operationId".to_string(),
        Value::String(operation_id(base_route, action, path)),
    );
    builder.set_operation(&key, verb, Value::Object(operation));
    Ok(())
}

fn merge_components(
    builder: &mut OpenApiBuilder,
    open_api: &ControllerOpenApi,
    action: &str,
    base_route: &str,
) -> Result<()> {
    let Some(components) = &open_api.components else {
        return Ok(());
    };
    let Value::Object(components) = components else {
        return Err(invalid("openApi.components", action, base_route));
    };

    for kind in ComponentKind::MERGEABLE {
        match components.get(kind.as_str()) {
            None => {}
            Some(Value::Object(entries)) => builder.merge_components(kind, entries),
            Some(_) => {
                return Err(invalid(
                    &format!("openApi.components.{}", kind.as_str()),
                    action,
                    base_route,
                ))
            }
        }
    }

    Ok(())
}

fn invalid(field: &str, action: &str, base_route: &str) -> Error {
    Error::InvalidControllerOpenApi {
        field: field.to_string(),
        action: action.to_string(),
        route: base_route.to_string(),
        reason: "must be an object".to_string(),
    }
}
