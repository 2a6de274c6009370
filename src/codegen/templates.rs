//! Source templates for generated clients. Placeholders are `{{NAME}}`.

use super::loader::LoaderEntry;
use super::GenerateError;
use crate::discovery::Module;
use heck::ToLowerCamelCase;
use std::path::Path;

const MODULE_CLIENT: &str = include_str!("../../templates/module_client.ts");
const STORE_MODULE: &str = include_str!("../../templates/store_module.ts");
const STORE_QUERY_GETTER: &str = include_str!("../../templates/store_query_getter.ts");
const STORE_QUERY_ACTION: &str = include_str!("../../templates/store_query_action.ts");
const STORE_MSG_ACTION: &str = include_str!("../../templates/store_msg_action.ts");
const STORE_ROOT: &str = include_str!("../../templates/store_root.ts");

fn render(
    name: &'static str,
    template: &str,
    values: &[(&str, String)],
) -> Result<String, GenerateError> {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }

    if let Some(start) = out.find("{{") {
        let rest = &out[start..];
        let end = rest.find("}}").map(|i| i + 2).unwrap_or(rest.len());
        return Err(GenerateError::Render {
            template: name,
            message: format!("unresolved placeholder {}", &rest[..end]),
        });
    }
    Ok(out)
}

/// Import specifier of a schema file's generated bindings, relative to the
/// bindings root: `blog/tx.proto` becomes `blog/tx`.
fn bindings_import(
    template: &'static str,
    file: &Path,
    schema_root: &Path,
) -> Result<String, GenerateError> {
    let relative = file
        .strip_prefix(schema_root)
        .map_err(|_| GenerateError::Render {
            template,
            message: format!(
                "{} is outside the schema directory {}",
                file.display(),
                schema_root.display()
            ),
        })?
        .with_extension("");

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// The module wrapper: message registry, transaction client and query client.
pub fn module_client(module: &Module, schema_root: &Path) -> Result<String, GenerateError> {
    let mut imports = Vec::new();
    let mut types = Vec::new();
    let mut encoders = Vec::new();

    for msg in &module.msgs {
        let import = bindings_import("module_client", &msg.file_path, schema_root)?;
        imports.push(format!("import {{ {} }} from \"./types/{}\";", msg.name, import));
        types.push(format!("  [\"/{}\", {}],", msg.uri, msg.name));
        encoders.push(format!(
            "    {}: (data: {}): EncodeObject => ({{ typeUrl: \"/{}\", value: data }}),",
            msg.name.to_lower_camel_case(),
            msg.name,
            msg.uri
        ));
    }

    render(
        "module_client",
        MODULE_CLIENT,
        &[
            ("MSG_IMPORTS", imports.join("\n")),
            ("MSG_TYPES", types.join("\n")),
            ("MSG_ENCODERS", encoders.join("\n")),
        ],
    )
}

/// The state-store wrapper placed next to the module directory. `module_dir`
/// is the module directory's name, used as the wrapper's import target.
pub fn store_module(
    module: &Module,
    schema_root: &Path,
    module_dir: &str,
) -> Result<String, GenerateError> {
    let mut type_imports = Vec::new();
    let mut structures = Vec::new();
    for ty in &module.types {
        let import = bindings_import("store_module", &ty.file_path, schema_root)?;
        type_imports.push(format!(
            "import {{ {} }} from \"./{}/types/{}\";",
            ty.name, module_dir, import
        ));
        structures.push(format!(
            "      {}: getStructure({}.fromPartial({{}})),",
            ty.name, ty.name
        ));
    }
    let type_names: Vec<&str> = module.types.iter().map(|t| t.name.as_str()).collect();

    let mut state = Vec::new();
    let mut getters = Vec::new();
    let mut query_actions = Vec::new();
    for query in &module.queries {
        state.push(format!("    {}: {{}},", query.name));
        getters.push(render(
            "store_query_getter",
            STORE_QUERY_GETTER,
            &[("NAME", query.name.clone())],
        )?);

        let url_args: String = query
            .http_annotations
            .url_params
            .iter()
            .map(|p| format!("key.{}, ", p))
            .collect();
        query_actions.push(render(
            "store_query_action",
            STORE_QUERY_ACTION,
            &[
                ("NAME", query.name.clone()),
                ("CLIENT_METHOD", query.full_name.to_lower_camel_case()),
                ("URL_ARGS", url_args),
            ],
        )?);
    }

    let mut msg_actions = Vec::new();
    for msg in &module.msgs {
        msg_actions.push(render(
            "store_msg_action",
            STORE_MSG_ACTION,
            &[
                ("NAME", msg.name.clone()),
                ("ENCODER", msg.name.to_lower_camel_case()),
            ],
        )?);
    }

    render(
        "store_module",
        STORE_MODULE,
        &[
            ("MODULE_DIR", module_dir.to_string()),
            ("TYPE_IMPORTS", type_imports.join("\n")),
            ("TYPE_NAMES", type_names.join(", ")),
            ("QUERY_STATE", state.join("\n")),
            ("TYPE_STRUCTURES", structures.join("\n")),
            ("QUERY_GETTERS", getters.concat()),
            ("PACKAGE_NAME", module.package_name().to_string()),
            ("QUERY_ACTIONS", query_actions.concat()),
            ("MSG_ACTIONS", msg_actions.concat()),
        ],
    )
}

/// The root loader enumerating every store module.
pub fn store_root(entries: &[LoaderEntry]) -> Result<String, GenerateError> {
    let imports: Vec<String> = entries
        .iter()
        .map(|e| format!("import {} from \"./{}\";", e.full_name, e.full_path))
        .collect();
    let loaders: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "  {}: load({}, \"{}\"),",
                e.full_name,
                e.full_name,
                e.full_path.replace('/', ".")
            )
        })
        .collect();

    render(
        "store_root",
        STORE_ROOT,
        &[
            ("MODULE_IMPORTS", imports.join("\n")),
            ("MODULE_LOADERS", loaders.join("\n")),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Msg, Query, Type};
    use crate::schema::{HttpAnnotations, HttpBinding, SchemaPackage};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn blog_module() -> Module {
        Module {
            name: "blog".to_string(),
            package: Arc::new(SchemaPackage {
                name: "alice.planet.blog".to_string(),
                path: PathBuf::from("/app/proto/blog"),
                import_path: "github.com/alice/planet/x/blog/types".to_string(),
                files: vec![PathBuf::from("/app/proto/blog/tx.proto")],
                messages: vec![],
                services: vec![],
            }),
            msgs: vec![Msg {
                name: "MsgCreatePost".to_string(),
                uri: "alice.planet.blog.MsgCreatePost".to_string(),
                file_path: PathBuf::from("/app/proto/blog/tx.proto"),
            }],
            queries: vec![Query {
                name: "Post".to_string(),
                full_name: "QueryPost".to_string(),
                http_annotations: HttpAnnotations {
                    bindings: vec![HttpBinding {
                        method: "get".to_string(),
                        path: "/alice/planet/blog/post/{id}".to_string(),
                    }],
                    url_params: vec!["id".to_string()],
                },
            }],
            types: vec![Type {
                name: "Post".to_string(),
                file_path: PathBuf::from("/app/proto/blog/post.proto"),
            }],
        }
    }

    #[test]
    fn test_module_client_registers_msgs() {
        let out = module_client(&blog_module(), Path::new("/app/proto")).unwrap();
        assert!(out.contains("import { MsgCreatePost } from \"./types/blog/tx\";"));
        assert!(out.contains("[\"/alice.planet.blog.MsgCreatePost\", MsgCreatePost],"));
        assert!(out.contains("msgCreatePost: (data: MsgCreatePost): EncodeObject"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_store_module_sections() {
        let out = store_module(&blog_module(), Path::new("/app/proto"), "module").unwrap();
        assert!(out.contains("from \"./module\";"));
        assert!(out.contains("import { Post } from \"./module/types/blog/post\";"));
        assert!(out.contains("Post: getStructure(Post.fromPartial({})),"));
        assert!(out.contains("async QueryPost("));
        assert!(out.contains("queryClient.queryPost(key.id, query)"));
        assert!(out.contains("async sendMsgCreatePost("));
        assert!(out.contains("Vuex module: alice.planet.blog initialized!"));
    }

    #[test]
    fn test_file_outside_schema_root_is_render_error() {
        let err = module_client(&blog_module(), Path::new("/elsewhere")).unwrap_err();
        assert!(matches!(err, GenerateError::Render { .. }));
    }

    #[test]
    fn test_unresolved_placeholder_is_rejected() {
        let err = render("t", "a {{MISSING}} b", &[]).unwrap_err();
        assert!(err.to_string().contains("{{MISSING}}"));
    }

    #[test]
    fn test_store_root_lists_entries() {
        let entries = vec![LoaderEntry {
            name: "Blog".to_string(),
            path: "blog".to_string(),
            full_name: "AlicePlanetBlog".to_string(),
            full_path: "alice/planet/blog".to_string(),
        }];
        let out = store_root(&entries).unwrap();
        assert!(out.contains("import AlicePlanetBlog from \"./alice/planet/blog\";"));
        assert!(out.contains("AlicePlanetBlog: load(AlicePlanetBlog, \"alice.planet.blog\"),"));
    }
}
