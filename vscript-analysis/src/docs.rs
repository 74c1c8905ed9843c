//! Native-API documentation registry.
//!
//! The engine exposes its script API as flat name-to-doc tables: free
//! functions, instance methods, ambient variables and the networked property
//! table. The registry is deserialized from JSON; a snapshot of the stock
//! API ships with the crate and is exposed through [`DocRegistry::builtin`].
//! The checker receives a registry by reference, so tests and embedders can
//! substitute their own tables via [`DocRegistry::from_json`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::SquirrelType;

/// Semantic classification of a string parameter, used for completion and
/// for validating NetProp accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StringKind {
    Input,
    Output,
    Targetname,
    Classname,
    NumberKeyvalue,
    VectorKeyvalue,
    StringKeyvalue,
    Attribute,
    Model,
    RawSound,
    SoundScript,
    Particle,
    Convar,
    ClientConvar,
    IntProperty,
    BoolProperty,
    FloatProperty,
    StringProperty,
    EntityProperty,
    VectorProperty,
    IntArrayProperty,
    BoolArrayProperty,
    FloatArrayProperty,
    StringArrayProperty,
    EntityArrayProperty,
    VectorArrayProperty,
    ArrayProperty,
    Property,
    Sound,
}

/// One documented API entry. `detail` is a rendered signature line, either
/// `name(param: type, ...) -> type` or `name: type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub detail: String,
    #[serde(default)]
    pub desc: Option<String>,
    /// Text a completion should insert after the name, e.g. `()`.
    #[serde(default)]
    pub append: Option<String>,
    /// Snippet form of the insertion, with tab stops.
    #[serde(default)]
    pub snippet: Option<String>,
    /// Name of the entry that supersedes this one, when deprecated.
    #[serde(default)]
    pub successor: Option<String>,
    /// String kinds of selected parameters, by zero-based index.
    #[serde(default)]
    pub params: HashMap<usize, StringKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocRegistry {
    #[serde(default)]
    pub functions: HashMap<String, Doc>,
    #[serde(default)]
    pub methods: HashMap<String, Doc>,
    #[serde(default)]
    pub variables: HashMap<String, Doc>,
    /// Networked property name to its value type name.
    #[serde(default, rename = "netProps")]
    pub net_props: HashMap<String, String>,
}

impl DocRegistry {
    pub fn from_json(json: &str) -> Result<DocRegistry, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The registry for the stock engine API bundled with the crate.
    pub fn builtin() -> &'static DocRegistry {
        static BUILTIN: Lazy<DocRegistry> = Lazy::new(|| {
            DocRegistry::from_json(include_str!("data/docs.json"))
                .expect("bundled docs.json is well-formed")
        });
        &BUILTIN
    }

    /// Value type name of a registered networked property.
    pub fn net_prop_type(&self, name: &str) -> Option<&str> {
        self.net_props.get(name).map(String::as_str)
    }

    /// All function, method and variable docs, for seeding a checker scope.
    pub fn all_docs(&self) -> impl Iterator<Item = (&String, &Doc)> {
        self.functions
            .iter()
            .chain(self.methods.iter())
            .chain(self.variables.iter())
    }
}

static FUNCTION_DETAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s*\((.*)\)\s*(?:->\s*(.+))?$").unwrap());
static VARIABLE_DETAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\w+)\s*:\s*(.+)$").unwrap());

/// Parses a doc `detail` line into a name and type. Function details become
/// function types; an absent return clause means `any`.
pub fn parse_detail(detail: &str) -> Option<(String, SquirrelType)> {
    if let Some(captures) = FUNCTION_DETAIL.captures(detail) {
        let name = captures[1].to_string();
        let parameters = split_parameters(captures.get(2).map_or("", |m| m.as_str()));
        let return_type = captures
            .get(3)
            .map_or(SquirrelType::Any, |m| type_from_name(m.as_str()));
        return Some((name, SquirrelType::function(parameters, return_type)));
    }
    if let Some(captures) = VARIABLE_DETAIL.captures(detail) {
        return Some((captures[1].to_string(), type_from_name(&captures[2])));
    }
    None
}

fn split_parameters(parameters: &str) -> Vec<SquirrelType> {
    if parameters.trim().is_empty() {
        return Vec::new();
    }
    parameters
        .split(',')
        .map(|parameter| {
            let type_name = parameter
                .rsplit_once(':')
                .map_or(parameter, |(_, type_name)| type_name);
            type_from_name(type_name)
        })
        .collect()
}

/// Best-effort type from a rendered name. Unknown names widen to `any`.
pub fn type_from_name(name: &str) -> SquirrelType {
    let name = name.trim();
    if let Some(inner) = name.strip_suffix('?') {
        return SquirrelType::optional(type_from_name(inner));
    }
    if let Some(inner) = name
        .strip_prefix("array<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return SquirrelType::array(type_from_name(inner));
    }
    if let Some(inner) = name
        .strip_prefix("table<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let (key, value) = inner.split_once(',').unwrap_or((inner, "any"));
        return SquirrelType::table(type_from_name(key), type_from_name(value));
    }
    SquirrelType::builtin(name).unwrap_or(SquirrelType::Any)
}
