//! Component interface descriptions.
//!
//! Parses the WIT text printed by `wasm-tools component wit` far enough to
//! list what a component imports and exports. Only top-level items of
//! `world` blocks are collected; bodies of inline interfaces are skipped.

use std::fmt;

use serde::Serialize;

/// What kind of item a world imports or exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// `name: func(...)`
    Function,
    /// `name: interface { ... }`
    Interface,
    /// `ns:pkg/iface@version`
    InterfaceRef,
}

/// One import or export of a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldItem {
    pub name: String,
    pub kind: ItemKind,
}

/// Imports and exports of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceDescription {
    /// Name of the first world found.
    pub world: Option<String>,
    pub imports: Vec<WorldItem>,
    pub exports: Vec<WorldItem>,
    /// WIT text as printed by the tool.
    #[serde(skip)]
    pub raw: String,
}

impl InterfaceDescription {
    /// Parse WIT text. Returns `None` if the text contains no world.
    pub fn parse(wit: &str) -> Option<Self> {
        let mut description = Self {
            raw: wit.to_string(),
            ..Default::default()
        };
        let mut found_world = false;
        // Brace depth; 1 means directly inside a world body.
        let mut depth = 0usize;
        let mut in_world = false;

        for line in wit.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            if depth == 0 {
                if let Some(name) = world_header(line) {
                    found_world = true;
                    in_world = true;
                    if description.world.is_none() {
                        description.world = Some(name.to_string());
                    }
                } else {
                    in_world = false;
                }
            } else if depth == 1 && in_world {
                if let Some(rest) = line.strip_prefix("import ") {
                    description.imports.push(parse_item(rest));
                } else if let Some(rest) = line.strip_prefix("export ") {
                    description.exports.push(parse_item(rest));
                }
            }

            depth += line.matches('{').count();
            depth = depth.saturating_sub(line.matches('}').count());
        }

        found_world.then_some(description)
    }

    /// Names of exported items, in declaration order.
    pub fn export_names(&self) -> Vec<&str> {
        self.exports.iter().map(|i| i.name.as_str()).collect()
    }

    /// Names of imported items, in declaration order.
    pub fn import_names(&self) -> Vec<&str> {
        self.imports.iter().map(|i| i.name.as_str()).collect()
    }

    /// Returns true if an item with this name is exported.
    pub fn exports(&self, name: &str) -> bool {
        self.exports.iter().any(|i| i.name == name)
    }
}

impl fmt::Display for InterfaceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "world {}", self.world.as_deref().unwrap_or("<unnamed>"))?;
        for item in &self.imports {
            writeln!(f, "  import {}", item.name)?;
        }
        for item in &self.exports {
            writeln!(f, "  export {}", item.name)?;
        }
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// `world name {` → `name`
fn world_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("world ")?;
    let name = rest.split(|c: char| c == '{' || c.is_whitespace()).next()?;
    (!name.is_empty()).then_some(name)
}

fn parse_item(rest: &str) -> WorldItem {
    let rest = rest.trim().trim_end_matches(';').trim();

    // Named items separate name and type with ": "; interface references
    // only contain a bare ':' between namespace and package.
    if let Some((name, ty)) = rest.split_once(": ") {
        let ty = ty.trim_start();
        let kind = if ty.starts_with("interface") {
            ItemKind::Interface
        } else {
            ItemKind::Function
        };
        return WorldItem {
            name: unescape(name.trim()).to_string(),
            kind,
        };
    }

    WorldItem {
        name: rest.to_string(),
        kind: ItemKind::InterfaceRef,
    }
}

/// WIT allows `%name` to use keywords as identifiers.
fn unescape(name: &str) -> &str {
    name.strip_prefix('%').unwrap_or(name)
}
