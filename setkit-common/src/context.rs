// setkit-common/src/context.rs
//! Placeholder context threaded through one application or utility run.
//!
//! Keys are the literal tokens as they appear in catalog strings (`{temp_dir}`),
//! so resolution is a plain substring replacement per entry. Entries are applied
//! in insertion order and the result is not re-scanned: if one value contains
//! another token, whether that token is expanded depends on which entry came
//! first.

use indexmap::IndexMap;

pub const TEMP_DIR: &str = "{temp_dir}";
pub const VERSION: &str = "{version}";
pub const INSTALL_DIR: &str = "{install_dir}";
pub const DOWNLOADED_FILE_PATH: &str = "{downloaded_file_path}";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    entries: IndexMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for an application run: `{temp_dir}` and `{version}` are always present.
    pub fn for_application(temp_dir: &str, version: Option<&str>) -> Self {
        let mut ctx = Self::new();
        ctx.set(TEMP_DIR, temp_dir);
        ctx.set(VERSION, version.unwrap_or_default());
        ctx
    }

    /// Adds or overwrites an entry. Entries are never removed.
    pub fn set(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(token.into(), value.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn resolve(&self, input: &str) -> String {
        resolve_placeholders(input, self)
    }

    pub fn resolve_opt(&self, input: Option<&String>) -> Option<String> {
        input.map(|s| self.resolve(s))
    }
}

/// Replaces every literal occurrence of each context token with its value.
pub fn resolve_placeholders(input: &str, ctx: &Context) -> String {
    if input.is_empty() || ctx.is_empty() {
        return input.to_string();
    }
    let mut out = input.to_string();
    for (token, value) in ctx.iter() {
        if !token.is_empty() && out.contains(token) {
            out = out.replace(token, value);
        }
    }
    out
}
