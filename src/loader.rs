//! Loading controller modules for discovered files.
//!
//! Discovery only yields file paths; a [`ControllerLoader`] turns each path into
//! the [`ControllerModule`] served at that file's route.

use crate::controller::{ActionResult, ControllerModule, ControllerOpenApi};
use crate::error::{Error, Result};
use crate::parser::AstParser;
use anyhow::anyhow;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Sidecar files holding a controller's OpenAPI metadata, tried in order.
const OPENAPI_SIDECAR_EXTENSIONS: [&str; 3] = ["openapi.yaml", "openapi.yml", "openapi.json"];

pub trait ControllerLoader {
    /// Loads the controller for `file_path`, a file discovered under `base_path`.
    fn load(&self, base_path: &Path, file_path: &Path) -> Result<Arc<ControllerModule>>;
}

/// Controllers compiled into the host, bound to the files they are served from.
///
/// Keys are paths relative to the controllers directory, `/`-separated
/// (`users/index.rs`).
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    modules: HashMap<String, Arc<ControllerModule>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, relative_path: &str, module: ControllerModule) -> Self {
        self.insert(relative_path, module);
        self
    }

    pub fn insert(&mut self, relative_path: &str, module: ControllerModule) {
        let key = relative_path.trim_start_matches('/').replace('\\', "/");
        self.modules.insert(key, Arc::new(module));
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ControllerLoader for ControllerRegistry {
    fn load(&self, base_path: &Path, file_path: &Path) -> Result<Arc<ControllerModule>> {
        let relative = file_path.strip_prefix(base_path).unwrap_or(file_path);
        let key = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        self.modules
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::ControllerNotFound(file_path.to_path_buf()))
    }
}

/// Loads controllers straight from their source files, without executing them.
///
/// Every public free function of the file becomes an action whose invocation
/// fails, and OpenAPI metadata is read from a `<stem>.openapi.yaml` (or `.yml`,
/// `.json`) file next to it. Useful to preview the routes and document a
/// controllers directory produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLoader;

impl ControllerLoader for SourceLoader {
    fn load(&self, _base_path: &Path, file_path: &Path) -> Result<Arc<ControllerModule>> {
        let parsed = AstParser::parse_file(file_path)?;
        let mut module = ControllerModule::new();

        for name in parsed.public_functions() {
            let location = format!("{}::{}", file_path.display(), name);
            module = module.sync_action(name, move |_, _| -> anyhow::Result<ActionResult> {
                Err(anyhow!("`{}` is loaded from source and cannot be invoked", location))
            });
        }

        if let Some(open_api) = read_sidecar(file_path)? {
            module = module.with_open_api(open_api);
        }

        debug!("Loaded {:?} from {}", module, file_path.display());
        Ok(Arc::new(module))
    }
}

fn sidecar_paths(file_path: &Path) -> Vec<PathBuf> {
    OPENAPI_SIDECAR_EXTENSIONS
        .iter()
        .map(|ext| file_path.with_extension(ext))
        .collect()
}

fn read_sidecar(file_path: &Path) -> Result<Option<ControllerOpenApi>> {
    let Some(path) = sidecar_paths(file_path).into_iter().find(|p| p.is_file()) else {
        return Ok(None);
    };

    let content = fs::read_to_string(&path)?;
    let value: Value = serde_yaml::from_str(&content).map_err(|e| Error::ParseError {
        file: path.clone(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(Some(ControllerOpenApi::from_map(map))),
        _ => Err(Error::ParseError {
            file: path,
            message: "OpenAPI metadata must be a mapping".to_string(),
        }),
    }
}
