use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{Item, Visibility};

/// AST (Abstract Syntax Tree) parser for controller source files.
///
/// The `AstParser` uses the `syn` crate to parse a controller file into an abstract
/// syntax tree, from which the actions the file exports can be read without
/// compiling it.
///
/// # Example
///
/// ```no_run
/// use barabara::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("controllers/users.rs")).unwrap();
/// println!("Exports {:?}", parsed.public_functions());
/// ```
pub struct AstParser;

/// A successfully parsed controller file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses a single source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] if the file cannot be read and
    /// [`Error::ParseError`] if it is not valid Rust.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;

        let syntax_tree = syn::parse_file(&content).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }
}

impl ParsedFile {
    /// Names of the public free functions, in source order.
    pub fn public_functions(&self) -> Vec<String> {
        self.syntax_tree
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Fn(func) if matches!(func.vis, Visibility::Public(_)) => {
                    Some(func.sig.ident.to_string())
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_parse_valid_controller() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
            use serde_json::Value;

            pub struct User {
                pub id: u32,
            }

            pub async fn read(id: u32) -> Option<User> {
                None
            }

            pub(crate) fn internal() {}

            fn helper() {}

            pub fn destroy() {}
        "#;

        let file_path = create_temp_file(&temp_dir, "users.rs", code);
        let parsed = AstParser::parse_file(&file_path).unwrap();

        assert_eq!(parsed.path, file_path);
        assert_eq!(parsed.public_functions(), vec!["read", "destroy"]);
    }

    #[test]
    fn test_parse_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(&temp_dir, "invalid.rs", "fn broken( {");

        let result = AstParser::parse_file(&file_path);

        assert!(matches!(result, Err(Error::ParseError { .. })));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = AstParser::parse_file(Path::new("/nonexistent/file.rs"));
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_parse_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(&temp_dir, "empty.rs", "");

        let parsed = AstParser::parse_file(&file_path).unwrap();

        assert!(parsed.syntax_tree.items.is_empty());
        assert!(parsed.public_functions().is_empty());
    }
}
