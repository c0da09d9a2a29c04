use crate::assembler::Barabara;
use crate::controller::ActionVerbMap;
use crate::loader::SourceLoader;
use crate::router::RouteTable;
use crate::serializer::{render_routes, serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Barabara - Preview the routes and OpenAPI document of a controllers directory
#[derive(Parser, Debug)]
#[command(name = "barabara")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the controllers directory
    #[arg(value_name = "CONTROLLERS_PATH")]
    pub controllers_path: PathBuf,

    /// Action-to-verb map (YAML or JSON); defaults to exists/read/create/update/partial/destroy
    #[arg(short = 'a', long = "actions", value_name = "FILE")]
    pub actions_path: Option<PathBuf>,

    /// OpenAPI configuration (YAML or JSON); enables the OpenAPI document
    #[arg(short = 'c', long = "openapi", value_name = "FILE")]
    pub openapi_path: Option<PathBuf>,

    /// Request property forwarded to actions as meta (repeatable)
    #[arg(short = 'm', long = "meta", value_name = "KEY")]
    pub meta_keys: Vec<String>,

    /// Output format of the OpenAPI document (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.controllers_path.is_dir() {
        anyhow::bail!(
            "Controllers path is not a directory: {}",
            args.controllers_path.display()
        );
    }

    info!("Controllers path: {}", args.controllers_path.display());
    match &args.openapi_path {
        Some(path) => info!("OpenAPI config: {}", path.display()),
        None => info!("OpenAPI: disabled"),
    }
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Reads a YAML (or JSON) configuration file.
fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let actions = match &args.actions_path {
        Some(path) => read_config::<ActionVerbMap>(path)?,
        None => ActionVerbMap::conventional(),
    };
    info!("Using {} action mappings", actions.len());

    let mut barabara = Barabara::new(actions);
    if let Some(path) = &args.openapi_path {
        let config: serde_json::Value = read_config(path)?;
        barabara = barabara.with_openapi(&config)?;
    }

    let build = barabara.create_router::<RouteTable>(
        &args.controllers_path,
        &args.meta_keys,
        &SourceLoader,
    )?;

    for route in build.router.routes() {
        info!("  {} {}", route.verb, route.path);
    }
    info!("Registered {} routes", build.router.len());

    let content = match &build.document {
        Some(document) => match args.output_format {
            OutputFormat::Yaml => serialize_yaml(document)?,
            OutputFormat::Json => serialize_json(document)?,
        },
        None => render_routes(&build.router),
    };

    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Successfully wrote output to {}", output_path.display());
    } else {
        print!("{}", content);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_for(controllers: &Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["barabara".to_string(), controllers.display().to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_parse_defaults() {
        let args = CliArgs::parse_from(["barabara", "./controllers"]);

        assert_eq!(args.controllers_path, PathBuf::from("./controllers"));
        assert!(args.openapi_path.is_none());
        assert!(args.meta_keys.is_empty());
        assert!(matches!(args.output_format, OutputFormat::Yaml));
    }

    #[test]
    fn test_parse_repeated_meta() {
        let args = CliArgs::parse_from(["barabara", "./c", "-m", "user", "--meta", "traceId", "-f", "json"]);

        assert_eq!(args.meta_keys, vec!["user", "traceId"]);
        assert!(matches!(args.output_format, OutputFormat::Json));
    }

    #[test]
    fn test_rejects_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(&temp_dir.path().join("missing"), &[]);

        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_route_listing() {
        let temp_dir = TempDir::new().unwrap();
        let controllers = temp_dir.path().join("controllers");
        fs::create_dir(&controllers).unwrap();
        fs::write(controllers.join("users.rs"), "pub fn read() {}\npub fn create() {}").unwrap();
        let output = temp_dir.path().join("routes.txt");

        run(args_for(&controllers, &["-o", output.to_str().unwrap()])).unwrap();

        let listing = fs::read_to_string(&output).unwrap();
        assert_eq!(listing, "GET    /users\nGET    /users/:id\nPOST   /users\n");
    }

    #[test]
    fn test_run_writes_openapi_document() {
        let temp_dir = TempDir::new().unwrap();
        let controllers = temp_dir.path().join("controllers");
        fs::create_dir(&controllers).unwrap();
        fs::write(controllers.join("users.rs"), "pub fn fetch() {}").unwrap();
        fs::write(controllers.join("users.openapi.yaml"), "fetch:\n  summary: Fetch users\n").unwrap();

        let actions = temp_dir.path().join("actions.yaml");
        fs::write(&actions, "fetch: GET\n").unwrap();
        let openapi = temp_dir.path().join("openapi.yaml");
        fs::write(
            &openapi,
            "title: Users\nversion: 1.0.0\ndescription: Users API\nservers: []\n",
        )
        .unwrap();
        let output = temp_dir.path().join("openapi.json");

        run(args_for(
            &controllers,
            &[
                "-a",
                actions.to_str().unwrap(),
                "-c",
                openapi.to_str().unwrap(),
                "-f",
                "json",
                "-o",
                output.to_str().unwrap(),
            ],
        ))
        .unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document["info"]["title"], "Users");
        assert_eq!(document["paths"]["/users"]["get"]["operationId"], "users_fetch");
        assert_eq!(document["paths"]["/users/{id}"]["get"]["operationId"], "users_fetch_id");
    }
}
