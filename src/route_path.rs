//! Conversion of controller file paths into URL routes.
//!
//! A controller's location inside the controllers directory is its route:
//! `users/UserProfiles.rs` is served under `/users/user-profiles`, and an
//! `index.rs` file stands for its directory (`users/index.rs` → `/users`).

use std::path::{Component, Path};

/// Extension recognized as a controller module.
pub const MODULE_EXTENSION: &str = "rs";

/// Derives the URL route of a controller file relative to the controllers base path.
///
/// The base path prefix is removed, a trailing `/index` segment and the module
/// extension are stripped, and every segment is converted with [`to_slug_case`].
/// A file that maps to nothing (e.g. `index.rs` at the base) becomes `/`.
///
/// # Example
///
/// ```
/// use barabara::route_path::route_from_path;
/// use std::path::Path;
///
/// let route = route_from_path(Path::new("/srv/controllers"), Path::new("/srv/controllers/SubPath/Test.rs"));
/// assert_eq!(route, "/sub-path/test");
/// ```
pub fn route_from_path(base_path: &Path, file_path: &Path) -> String {
    let relative = file_path.strip_prefix(base_path).unwrap_or(file_path);

    let mut joined = String::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            joined.push('/');
            joined.push_str(&segment.to_string_lossy());
        }
    }

    let stripped = strip_module_suffix(&joined);

    let route = stripped
        .split('/')
        .map(to_slug_case)
        .collect::<Vec<_>>()
        .join("/");

    if route.is_empty() {
        "/".to_string()
    } else {
        route
    }
}

/// Removes `(/index)?.rs` from the end of a path, ignoring case.
fn strip_module_suffix(path: &str) -> &str {
    let extension = format!(".{}", MODULE_EXTENSION);
    let Some(without_ext) = strip_suffix_ignore_case(path, &extension) else {
        return path;
    };
    strip_suffix_ignore_case(without_ext, "/index").unwrap_or(without_ext)
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    if value.len() < suffix.len() || !value.is_char_boundary(value.len() - suffix.len()) {
        return None;
    }
    let (head, tail) = value.split_at(value.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Converts a single path segment to lowercase, hyphen-separated form.
///
/// Word boundaries are runs of non-alphanumeric characters, a lowercase letter or
/// digit followed by an uppercase letter, and the last capital of an acronym run
/// (`XMLHttp` → `xml-http`). A digit directly following a letter is never a
/// boundary, so `v1` stays `v1`.
pub fn to_slug_case(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut slug = String::with_capacity(segment.len());
    let mut boundary = false;

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            boundary = true;
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let acronym_end =
                prev.is_uppercase() && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || acronym_end {
                boundary = true;
            }
        }

        if boundary && !slug.is_empty() {
            slug.push('-');
        }
        boundary = false;
        slug.extend(c.to_lowercase());
    }

    slug
}
