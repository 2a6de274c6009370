//! A lightweight `.proto` reader covering the declarations discovery needs:
//! package, `go_package`, top-level messages, services and their HTTP rules.

use super::{
    HttpAnnotations, HttpBinding, PackageIndex, RpcMethod, SchemaError, SchemaMessage,
    SchemaPackage, Service,
};
use regex::Regex;
use crate::fs::{FileSystem, RealFileSystem};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

const SCHEMA_EXTENSION: &str = "proto";
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor"];
const HTTP_OPTION: &str = "google.api.http";
const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "patch"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Punct(char),
}

#[derive(Debug, Default)]
struct ProtoFile {
    package: Option<String>,
    go_package: Option<String>,
    messages: Vec<String>,
    services: Vec<Service>,
}

/// Walks a source root for `.proto` files and groups them by package.
#[derive(Clone)]
pub struct ProtoPackageIndex {
    fs: Arc<dyn FileSystem>,
}

impl ProtoPackageIndex {
    pub fn new() -> Self {
        Self::with_fs(Arc::new(RealFileSystem::new()))
    }

    pub fn with_fs(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Schema files below `dir` in file-name order, depth first. Hidden and
    /// vendored directories are not entered.
    fn collect_files(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SchemaError> {
        let entries = self.fs.read_dir(dir).map_err(|e| SchemaError::Walk {
            root: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        for entry in entries {
            if entry.is_dir() {
                if !is_skipped_dir(entry.file_name()) {
                    self.collect_files(entry.path(), out)?;
                }
            } else if entry.is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(SCHEMA_EXTENSION)
            {
                out.push(entry.path().to_path_buf());
            }
        }
        Ok(())
    }
}

impl Default for ProtoPackageIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageIndex for ProtoPackageIndex {
    fn packages(&self, root: &Path) -> Result<Vec<SchemaPackage>, SchemaError> {
        let mut files = Vec::new();
        self.collect_files(root, &mut files)?;

        let mut packages: BTreeMap<String, SchemaPackage> = BTreeMap::new();
        for path in files {
            let content = self.fs.read_to_string(&path).map_err(|source| SchemaError::Io {
                path: path.clone(),
                source,
            })?;
            let file = Parser::new(&lex(&content), &path).parse()?;

            let Some(name) = file.package else {
                debug!(file = %path.display(), "Schema file has no package, skipping");
                continue;
            };

            let pkg = packages
                .entry(name.clone())
                .or_insert_with(|| SchemaPackage {
                    name,
                    path: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    import_path: String::new(),
                    files: Vec::new(),
                    messages: Vec::new(),
                    services: Vec::new(),
                });

            if pkg.import_path.is_empty() {
                if let Some(go_package) = file.go_package {
                    pkg.import_path = go_package;
                }
            }
            pkg.messages
                .extend(file.messages.into_iter().map(|name| SchemaMessage {
                    name,
                    file_path: path.clone(),
                }));
            pkg.services.extend(file.services);
            pkg.files.push(path);
        }

        debug!(root = %root.display(), packages = packages.len(), "Indexed schema packages");
        Ok(packages.into_values().collect())
    }
}

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn lex(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
        } else if c == '"' || c == '\'' {
            i += 1;
            let mut value = String::new();
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 1;
                }
                value.push(chars[i]);
                i += 1;
            }
            i += 1;
            tokens.push(Token::Str(value));
        } else if is_ident_char(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            tokens.push(Token::Punct(c));
            i += 1;
        }
    }

    tokens
}

fn url_params(path: &str) -> Vec<String> {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    let re = PARAM.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_.]+)(?:=[^}]*)?\}").expect("valid regex")
    });
    re.captures_iter(path).map(|c| c[1].to_string()).collect()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    path: &'a Path,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], path: &'a Path) -> Self {
        Self {
            tokens,
            pos: 0,
            path,
        }
    }

    fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::Parse {
            path: self.path.to_path_buf(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn expect_punct(&mut self, c: char) -> Result<(), SchemaError> {
        match self.next() {
            Some(Token::Punct(p)) if *p == c => Ok(()),
            other => Err(self.error(format!("expected '{}', found {:?}", c, other))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SchemaError> {
        match self.next() {
            Some(Token::Ident(ident)) => Ok(ident.clone()),
            other => Err(self.error(format!("expected {}, found {:?}", what, other))),
        }
    }

    /// Consumes a `{ ... }` block starting at the current token.
    fn skip_block(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.next() {
            match token {
                Token::Punct('{') => depth += 1,
                Token::Punct('}') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Consumes up to and including the next `;`, skipping nested blocks.
    /// Stops without consuming at a closing `}`.
    fn skip_statement(&mut self) {
        while let Some(token) = self.peek() {
            match token {
                Token::Punct(';') => {
                    self.pos += 1;
                    return;
                }
                Token::Punct('}') => return,
                Token::Punct('{') => self.skip_block(),
                _ => self.pos += 1,
            }
        }
    }

    fn skip_to_block(&mut self) -> Result<(), SchemaError> {
        while let Some(token) = self.peek() {
            if *token == Token::Punct('{') {
                self.skip_block();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(self.error("unexpected end of file before declaration body"))
    }

    fn parse(mut self) -> Result<ProtoFile, SchemaError> {
        let mut file = ProtoFile::default();

        while let Some(token) = self.next() {
            match token {
                Token::Ident(kw) if kw == "package" => {
                    file.package = Some(self.expect_ident("package name")?);
                    self.skip_statement();
                }
                Token::Ident(kw) if kw == "option" => {
                    if matches!(self.peek(), Some(Token::Ident(name)) if name == "go_package") {
                        self.pos += 1;
                        self.expect_punct('=')?;
                        if let Some(Token::Str(value)) = self.next() {
                            let import_path = value.split(';').next().unwrap_or_default();
                            file.go_package = Some(import_path.trim().to_string());
                        }
                    }
                    self.skip_statement();
                }
                Token::Ident(kw) if kw == "message" => {
                    file.messages.push(self.expect_ident("message name")?);
                    self.skip_to_block()?;
                }
                Token::Ident(kw) if kw == "service" => {
                    let name = self.expect_ident("service name")?;
                    self.expect_punct('{')?;
                    let rpc_methods = self.parse_service_body()?;
                    file.services.push(Service { name, rpc_methods });
                }
                Token::Ident(kw) if kw == "enum" || kw == "extend" => self.skip_to_block()?,
                Token::Punct('{') => {
                    self.pos -= 1;
                    self.skip_block();
                }
                _ => {}
            }
        }

        Ok(file)
    }

    fn parse_service_body(&mut self) -> Result<Vec<RpcMethod>, SchemaError> {
        let mut methods = Vec::new();
        loop {
            match self.next() {
                None => return Err(self.error("unterminated service")),
                Some(Token::Punct('}')) => return Ok(methods),
                Some(Token::Ident(kw)) if kw == "rpc" => methods.push(self.parse_rpc()?),
                Some(Token::Punct('{')) => {
                    self.pos -= 1;
                    self.skip_block();
                }
                _ => {}
            }
        }
    }

    fn type_ref(&mut self) -> Result<String, SchemaError> {
        let mut ident = self.expect_ident("message type")?;
        if ident == "stream" && matches!(self.peek(), Some(Token::Ident(_))) {
            ident = self.expect_ident("message type")?;
        }
        Ok(ident.trim_start_matches('.').to_string())
    }

    fn parse_rpc(&mut self) -> Result<RpcMethod, SchemaError> {
        let name = self.expect_ident("rpc name")?;
        self.expect_punct('(')?;
        let request_type = self.type_ref()?;
        self.expect_punct(')')?;
        match self.next() {
            Some(Token::Ident(kw)) if kw == "returns" => {}
            other => {
                return Err(self.error(format!(
                    "expected 'returns' in rpc {}, found {:?}",
                    name, other
                )))
            }
        }
        self.expect_punct('(')?;
        let return_type = self.type_ref()?;
        self.expect_punct(')')?;

        let mut bindings = Vec::new();
        if self.is_punct('{') {
            self.pos += 1;
            self.parse_rpc_options(&mut bindings)?;
        } else if self.is_punct(';') {
            self.pos += 1;
        }

        let url_params = bindings
            .first()
            .map(|b: &HttpBinding| url_params(&b.path))
            .unwrap_or_default();

        Ok(RpcMethod {
            name,
            request_type,
            return_type,
            http_annotations: HttpAnnotations {
                bindings,
                url_params,
            },
        })
    }

    fn at_http_option(&self) -> bool {
        matches!(
            (
                self.tokens.get(self.pos),
                self.tokens.get(self.pos + 1),
                self.tokens.get(self.pos + 2),
            ),
            (Some(Token::Punct('(')), Some(Token::Ident(name)), Some(Token::Punct(')')))
                if name == HTTP_OPTION
        )
    }

    fn parse_rpc_options(&mut self, bindings: &mut Vec<HttpBinding>) -> Result<(), SchemaError> {
        loop {
            match self.next() {
                None => return Err(self.error("unterminated rpc body")),
                Some(Token::Punct('}')) => return Ok(()),
                Some(Token::Ident(kw)) if kw == "option" => {
                    if !self.at_http_option() {
                        self.skip_statement();
                        continue;
                    }
                    self.pos += 3;
                    match self.next() {
                        // option (google.api.http).get = "/path";
                        Some(Token::Ident(field)) if field.starts_with('.') => {
                            let method = field.trim_start_matches('.').to_string();
                            self.expect_punct('=')?;
                            if let Some(Token::Str(path)) = self.next() {
                                if HTTP_METHODS.contains(&method.as_str()) {
                                    bindings.push(HttpBinding {
                                        method,
                                        path: path.clone(),
                                    });
                                }
                            }
                            self.skip_statement();
                        }
                        // option (google.api.http) = { get: "/path" };
                        Some(Token::Punct('=')) => {
                            self.expect_punct('{')?;
                            self.parse_http_rule(bindings)?;
                            if self.is_punct(';') {
                                self.pos += 1;
                            }
                        }
                        _ => self.skip_statement(),
                    }
                }
                Some(Token::Punct('{')) => {
                    self.pos -= 1;
                    self.skip_block();
                }
                _ => {}
            }
        }
    }

    fn parse_http_rule(&mut self, bindings: &mut Vec<HttpBinding>) -> Result<(), SchemaError> {
        loop {
            match self.next() {
                None => return Err(self.error("unterminated http rule")),
                Some(Token::Punct('}')) => return Ok(()),
                Some(Token::Ident(key)) => {
                    if self.is_punct(':') {
                        self.pos += 1;
                    }
                    if key == "additional_bindings" {
                        self.expect_punct('{')?;
                        self.parse_http_rule(bindings)?;
                    } else if HTTP_METHODS.contains(&key.as_str()) {
                        if let Some(Token::Str(path)) = self.peek() {
                            self.pos += 1;
                            bindings.push(HttpBinding {
                                method: key.clone(),
                                path: path.clone(),
                            });
                        }
                    } else if self.is_punct('{') {
                        self.skip_block();
                    }
                }
                _ => {}
            }
        }
    }
}
