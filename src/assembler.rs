use crate::controller::{ActionVerbMap, ControllerModule, Verb};
use crate::error::Result;
use crate::handler::DocumentHandler;
use crate::loader::ControllerLoader;
use crate::openapi_builder::{OpenApiBuilder, OpenApiDocument};
use crate::route_path::route_from_path;
use crate::router::Router;
use crate::scanner::find_controllers;
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Route serving the aggregated OpenAPI document.
pub const OPENAPI_ROUTE: &str = "/openapi";

/// A discovered controller together with the route derived from its location.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub path: PathBuf,
    pub controller: Arc<ControllerModule>,
    pub route: String,
}

impl RouteDescriptor {
    /// Number of `/`-delimited parts of the route; deeper routes are more specific.
    pub fn specificity(&self) -> usize {
        self.route.split('/').count()
    }
}

/// A populated router and, when OpenAPI is enabled, the sealed document it serves.
#[derive(Debug)]
pub struct RouterBuild<R> {
    pub router: R,
    pub document: Option<Arc<OpenApiDocument>>,
}

/// Convention-based router factory.
///
/// Holds the action-to-verb map shared by every controller and, optionally, the
/// validated OpenAPI configuration each built router starts its document from.
///
/// # Example
///
/// ```no_run
/// use barabara::assembler::Barabara;
/// use barabara::controller::ActionVerbMap;
/// use barabara::loader::SourceLoader;
/// use barabara::router::RouteTable;
/// use std::path::Path;
///
/// let barabara = Barabara::new(ActionVerbMap::conventional());
/// let build = barabara
///     .create_router::<RouteTable>(Path::new("./controllers"), &[], &SourceLoader)
///     .unwrap();
/// println!("{} routes", build.router.len());
/// ```
#[derive(Debug, Clone)]
pub struct Barabara {
    actions: ActionVerbMap,
    openapi: Option<OpenApiBuilder>,
}

impl Barabara {
    pub fn new(actions: ActionVerbMap) -> Self {
        Self {
            actions,
            openapi: None,
        }
    }

    /// Enables the OpenAPI document, validating its configuration up front.
    pub fn with_openapi(mut self, config: &Value) -> Result<Self> {
        self.openapi = Some(OpenApiBuilder::from_config(config)?);
        Ok(self)
    }

    pub fn actions(&self) -> &ActionVerbMap {
        &self.actions
    }

    /// Discovers, loads and orders the controllers under `base_path`.
    ///
    /// The result is sorted by descending [`RouteDescriptor::specificity`]; equally
    /// specific controllers keep their discovery order.
    pub fn describe_controllers(
        &self,
        base_path: &Path,
        loader: &dyn ControllerLoader,
    ) -> Result<Vec<RouteDescriptor>> {
        let files = find_controllers(base_path)?;
        info!("Found {} controller files", files.len());

        let mut descriptors = files
            .into_iter()
            .map(|path| -> Result<RouteDescriptor> {
                let controller = loader.load(base_path, &path)?;
                let route = route_from_path(base_path, &path);
                debug!("{} -> {}", path.display(), route);
                Ok(RouteDescriptor {
                    path,
                    controller,
                    route,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        descriptors.sort_by(|a, b| b.specificity().cmp(&a.specificity()));
        Ok(descriptors)
    }

    /// Builds a router from the controllers directory.
    ///
    /// Every controller is registered most-specific first. When OpenAPI is enabled
    /// the document is sealed afterwards and served on `GET /openapi`, registered
    /// after all controller routes. Any error aborts construction and no router is
    /// returned.
    pub fn create_router<R: Router + Default>(
        &self,
        base_path: &Path,
        meta_keys: &[String],
        loader: &dyn ControllerLoader,
    ) -> Result<RouterBuild<R>> {
        info!("Building router from {}", base_path.display());

        let descriptors = self.describe_controllers(base_path, loader)?;
        let meta_keys: Arc<[String]> = Arc::from(meta_keys.to_vec());
        let mut router = R::default();
        let mut builder = self.openapi.clone();

        for descriptor in &descriptors {
            self.register_controller(
                &mut router,
                &descriptor.route,
                &descriptor.controller,
                &meta_keys,
                builder.as_mut(),
            )?;
        }

        let document = match builder {
            Some(builder) => {
                let document = Arc::new(builder.build());
                router.route(
                    Verb::Get,
                    OPENAPI_ROUTE,
                    Arc::new(DocumentHandler::new(&document)?),
                );
                Some(document)
            }
            None => None,
        };

        info!("Registered {} controllers", descriptors.len());
        Ok(RouterBuild { router, document })
    }
}
