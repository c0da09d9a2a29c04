//! Barabara - Convention-based routing from a controllers directory.
//!
//! Every source file under the controllers directory is a controller, and its path is
//! its route: `controllers/SubPath/Users.rs` is served under `/sub-path/users`. Each
//! action the controller exports is registered under the verb the shared action map
//! gives it, on the collection path, the item path (`/:id`) or both. Controllers may
//! describe their actions with OpenAPI fragments, which are merged into one document
//! served on `GET /openapi`.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively discovers controller files
//! 2. [`route_path`] - Derives a route from a controller's location
//! 3. [`loader`] - Binds discovered files to controller modules
//! 4. [`controller`] - Controller modules, actions and the action-to-verb map
//! 5. [`handler`] - Adapts router requests to actions and action results to responses
//! 6. [`openapi_builder`] - Validates OpenAPI configuration and assembles the document
//! 7. [`registrar`] - Registers one controller's actions on a router
//! 8. [`assembler`] - Builds a complete router from a controllers directory
//! 9. [`serializer`] - Writes the document as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use barabara::{
//!     assembler::Barabara,
//!     controller::{ActionResult, ActionVerbMap, ControllerModule},
//!     loader::ControllerRegistry,
//!     router::RouteTable,
//! };
//! use serde_json::json;
//! use std::path::Path;
//!
//! let users = ControllerModule::new()
//!     .sync_action("read", |options, _meta| {
//!         Ok(ActionResult::Json(json!({ "id": options.get("id") })))
//!     });
//! let registry = ControllerRegistry::new().with("users.rs", users);
//!
//! let barabara = Barabara::new(ActionVerbMap::conventional())
//!     .with_openapi(&json!({
//!         "title": "Users",
//!         "version": "1.0.0",
//!         "description": "Users API",
//!         "servers": []
//!     }))
//!     .unwrap();
//!
//! let build = barabara
//!     .create_router::<RouteTable>(Path::new("./controllers"), &["user".to_string()], &registry)
//!     .unwrap();
//! for route in build.router.routes() {
//!     println!("{} {}", route.verb, route.path);
//! }
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod assembler;
pub mod cli;
pub mod controller;
pub mod error;
pub mod handler;
pub mod loader;
pub mod openapi_builder;
pub mod parser;
pub mod registrar;
pub mod route_path;
pub mod router;
pub mod scanner;
pub mod serializer;
