//! Argument building for the OpenAPI to REST client converter.

use std::path::Path;

/// Module name index that strips the route namespace from generated names.
pub const STRIP_NAMESPACE: &str = "-1";

/// Command line converting `spec` into a single client file at `out_file`.
pub fn converter_args(spec: &Path, out_file: &Path, module_name_index: &str) -> Vec<String> {
    let out_dir = out_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = out_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    vec![
        "generate".to_string(),
        "--path".to_string(),
        spec.display().to_string(),
        "--output".to_string(),
        out_dir.display().to_string(),
        "--name".to_string(),
        file_name,
        "--module-name-index".to_string(),
        module_name_index.to_string(),
    ]
}
