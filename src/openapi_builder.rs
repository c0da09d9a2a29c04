use crate::controller::Verb;
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// OpenAPI version written into every document.
pub const OPENAPI_VERSION: &str = "3.0.1";

/// Operations of one path, keyed by lowercase verb.
pub type PathItem = BTreeMap<String, Value>;

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Value>,
    pub responses: BTreeMap<String, Value>,
    pub parameters: BTreeMap<String, Value>,
    #[serde(rename = "securitySchemes")]
    pub security_schemes: BTreeMap<String, Value>,
}

/// Component maps a controller may contribute to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Schemas,
    Responses,
    Parameters,
}

impl ComponentKind {
    pub const MERGEABLE: [ComponentKind; 3] = [
        ComponentKind::Schemas,
        ComponentKind::Responses,
        ComponentKind::Parameters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Schemas => "schemas",
            ComponentKind::Responses => "responses",
            ComponentKind::Parameters => "parameters",
        }
    }
}

impl Components {
    fn map_mut(&mut self, kind: ComponentKind) -> &mut BTreeMap<String, Value> {
        match kind {
            ComponentKind::Schemas => &mut self.schemas,
            ComponentKind::Responses => &mut self.responses,
            ComponentKind::Parameters => &mut self.parameters,
        }
    }
}

/// Complete OpenAPI document aggregated over every registered controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Value>,
    pub tags: Vec<Value>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
    /// Scheme name to the requirements configured for it
    pub security: BTreeMap<String, Vec<String>>,
}

/// Incrementally assembles an [`OpenApiDocument`].
///
/// Created from the top-level OpenAPI configuration, mutated while controllers
/// register, and sealed with [`OpenApiBuilder::build`].
#[derive(Debug, Clone)]
pub struct OpenApiBuilder {
    document: OpenApiDocument,
}

impl OpenApiBuilder {
    /// Validates the OpenAPI configuration and builds the document skeleton.
    ///
    /// The configuration must be an object with string `title`, `version` and
    /// `description`, and a `servers` array. `termsOfService` (string), `contact`
    /// and `license` (objects), `tags` (array) and `security` (object of schemes)
    /// are optional.
    ///
    /// Each security scheme keeps its `requirements` inside
    /// `components.securitySchemes`; top-level `security` maps every scheme name
    /// to those requirements (empty when absent).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOpenApiConfig`] naming the first offending field.
    pub fn from_config(config: &Value) -> Result<Self> {
        let config = config
            .as_object()
            .ok_or_else(|| invalid("openApi", "must be an object"))?;

        let title = required_string(config, "title")?;
        let version = required_string(config, "version")?;
        let description = required_string(config, "description")?;

        let terms_of_service = match config.get("termsOfService") {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(invalid("termsOfService", "must be a string")),
        };
        let contact = optional_object(config, "contact")?;
        let license = optional_object(config, "license")?;

        let servers = match config.get("servers") {
            Some(Value::Array(servers)) => servers.clone(),
            _ => return Err(invalid("servers", "is required and must be an array")),
        };
        let tags = match config.get("tags") {
            None => Vec::new(),
            Some(Value::Array(tags)) => tags.clone(),
            Some(_) => return Err(invalid("tags", "must be an array")),
        };

        let mut components = Components::default();
        let mut security = BTreeMap::new();
        match config.get("security") {
            None => {}
            Some(Value::Object(schemes)) => {
                for (name, scheme) in schemes {
                    security.insert(name.clone(), scheme_requirements(name, scheme)?);
                    components.security_schemes.insert(name.clone(), scheme.clone());
                }
            }
            Some(_) => return Err(invalid("security", "must be an object")),
        }

        debug!("OpenAPI document initialised for {} {}", title, version);

        Ok(Self {
            document: OpenApiDocument {
                openapi: OPENAPI_VERSION.to_string(),
                info: Info {
                    title,
                    version,
                    description,
                    terms_of_service,
                    contact,
                    license,
                },
                servers,
                tags,
                paths: BTreeMap::new(),
                components,
                security,
            },
        })
    }

    /// Current state of the document.
    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    /// Returns the path item for `path`, creating an empty one if needed.
    pub fn ensure_path(&mut self, path: &str) -> &mut PathItem {
        self.document.paths.entry(path.to_string()).or_default()
    }

    /// Sets the operation of `verb` on `path`, replacing any earlier one.
    pub fn set_operation(&mut self, path: &str, verb: Verb, operation: Value) {
        debug!("Documenting {} {}", verb, path);
        self.ensure_path(path)
            .insert(verb.as_str().to_string(), operation);
    }

    /// Merges component entries, later entries overwriting same-named ones.
    pub fn merge_components(&mut self, kind: ComponentKind, entries: &Map<String, Value>) {
        let target = self.document.components.map_mut(kind);
        for (name, value) in entries {
            target.insert(name.clone(), value.clone());
        }
    }

    /// Seals the document.
    pub fn build(self) -> OpenApiDocument {
        debug!(
            "Building final OpenAPI document with {} paths",
            self.document.paths.len()
        );
        self.document
    }
}

/// Converts router path parameters (`:id`) to OpenAPI templates (`{id}`).
pub fn document_path(route: &str) -> String {
    route
        .split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidOpenApiConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn required_string(config: &Map<String, Value>, field: &str) -> Result<String> {
    config
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(field, "is required and must be a string"))
}

fn optional_object(config: &Map<String, Value>, field: &str) -> Result<Option<Value>> {
    match config.get(field) {
        None => Ok(None),
        Some(value @ Value::Object(_)) => Ok(Some(value.clone())),
        Some(_) => Err(invalid(field, "must be an object")),
    }
}

fn scheme_requirements(name: &str, scheme: &Value) -> Result<Vec<String>> {
    let scheme = scheme
        .as_object()
        .ok_or_else(|| invalid(&format!("security.{}", name), "must be an object"))?;

    let Some(requirements) = scheme.get("requirements") else {
        return Ok(Vec::new());
    };

    requirements
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| {
            invalid(
                &format!("security.{}.requirements", name),
                "must be an array of strings",
            )
        })
}
