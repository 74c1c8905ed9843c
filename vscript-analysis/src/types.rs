//! The structural type algebra.
//!
//! A closed, immutable set of type values with a fixed assignability
//! relation. There is no text dependency here: annotation parsing lives in
//! the checker, detail-string parsing in the doc registry. `Display` yields
//! the canonical signature used in diagnostics, and unions are canonically
//! ordered at construction so derived equality is structural equality.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Float,
    String,
    Bool,
    Char,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
        }
    }
}

/// A named class with structural members and a linear base chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassData {
    pub name: String,
    pub members: BTreeMap<String, SquirrelType>,
    pub base: Option<Box<ClassData>>,
}

impl ClassData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
            base: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SquirrelType {
    Primitive(Primitive),
    Null,
    Any,
    Function {
        parameters: Vec<SquirrelType>,
        return_type: Box<SquirrelType>,
    },
    Array(Box<SquirrelType>),
    Table {
        key: Box<SquirrelType>,
        value: Box<SquirrelType>,
    },
    Class(ClassData),
    /// Members are canonically ordered; build through [`SquirrelType::union`].
    Union(Vec<SquirrelType>),
    Optional(Box<SquirrelType>),
}

impl SquirrelType {
    pub fn int() -> Self {
        SquirrelType::Primitive(Primitive::Int)
    }

    pub fn float() -> Self {
        SquirrelType::Primitive(Primitive::Float)
    }

    pub fn string() -> Self {
        SquirrelType::Primitive(Primitive::String)
    }

    pub fn boolean() -> Self {
        SquirrelType::Primitive(Primitive::Bool)
    }

    pub fn character() -> Self {
        SquirrelType::Primitive(Primitive::Char)
    }

    pub fn array(element: SquirrelType) -> Self {
        SquirrelType::Array(Box::new(element))
    }

    pub fn table(key: SquirrelType, value: SquirrelType) -> Self {
        SquirrelType::Table {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn function(parameters: Vec<SquirrelType>, return_type: SquirrelType) -> Self {
        SquirrelType::Function {
            parameters,
            return_type: Box::new(return_type),
        }
    }

    pub fn optional(inner: SquirrelType) -> Self {
        SquirrelType::Optional(Box::new(inner))
    }

    pub fn named_class(name: impl Into<String>) -> Self {
        SquirrelType::Class(ClassData::new(name))
    }

    /// Canonical union: flattened, sorted by display form, deduplicated.
    /// A single surviving member collapses to that member.
    pub fn union(members: Vec<SquirrelType>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                SquirrelType::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort_by_key(|t| t.to_string());
        flat.dedup();
        if flat.len() == 1 {
            return flat.remove(0);
        }
        SquirrelType::Union(flat)
    }

    /// The built-in type for a Squirrel type name, if there is one.
    pub fn builtin(name: &str) -> Option<SquirrelType> {
        Some(match name {
            "int" => SquirrelType::int(),
            "float" => SquirrelType::float(),
            "string" => SquirrelType::string(),
            "bool" => SquirrelType::boolean(),
            "char" => SquirrelType::character(),
            "null" => SquirrelType::Null,
            "any" => SquirrelType::Any,
            "function" => SquirrelType::function(vec![SquirrelType::Any], SquirrelType::Any),
            "array" => SquirrelType::array(SquirrelType::Any),
            "table" => SquirrelType::table(SquirrelType::Any, SquirrelType::Any),
            "class" | "instance" | "blob" | "Vector" => SquirrelType::named_class(name),
            _ => return None,
        })
    }

    pub const BUILTIN_NAMES: &'static [&'static str] = &[
        "int", "float", "string", "bool", "char", "null", "any", "function", "array", "table",
        "class", "instance", "blob", "Vector",
    ];

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            SquirrelType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// The fixed assignability relation. The rules are ordered; unmatched
    /// combinations are not assignable.
    pub fn is_assignable_to(&self, target: &SquirrelType) -> bool {
        if self == target {
            return true;
        }
        if matches!(target, SquirrelType::Any) {
            return true;
        }
        if matches!(self, SquirrelType::Null) {
            return matches!(target, SquirrelType::Null | SquirrelType::Optional(_));
        }
        if let SquirrelType::Optional(inner) = self {
            return match target {
                SquirrelType::Optional(target_inner) => inner.is_assignable_to(target_inner),
                // An optional is compatible with a union containing null
                // when its inner type fits the union with null removed.
                SquirrelType::Union(members) if members.contains(&SquirrelType::Null) => {
                    let mut rest: Vec<SquirrelType> = members
                        .iter()
                        .filter(|m| !matches!(m, SquirrelType::Null))
                        .cloned()
                        .collect();
                    let target = if rest.len() == 1 {
                        rest.remove(0)
                    } else {
                        SquirrelType::Union(rest)
                    };
                    inner.is_assignable_to(&target)
                }
                _ => false,
            };
        }
        if let SquirrelType::Union(members) = self {
            return members.iter().all(|m| m.is_assignable_to(target));
        }
        if let SquirrelType::Optional(inner) = target {
            // `any` widens into optionals even though it does not fit the
            // bare inner type.
            return matches!(self, SquirrelType::Any) || self.is_assignable_to(inner);
        }
        if let SquirrelType::Union(members) = target {
            return members.iter().any(|m| self.is_assignable_to(m));
        }
        match (self, target) {
            (
                SquirrelType::Function {
                    parameters: source_params,
                    return_type: source_return,
                },
                SquirrelType::Function {
                    parameters: target_params,
                    return_type: target_return,
                },
            ) => {
                // Contravariant parameters, covariant return.
                source_params.len() == target_params.len()
                    && target_params
                        .iter()
                        .zip(source_params)
                        .all(|(t, s)| t.is_assignable_to(s))
                    && source_return.is_assignable_to(target_return)
            }
            (SquirrelType::Array(source), SquirrelType::Array(target)) => {
                source.is_assignable_to(target)
            }
            (
                SquirrelType::Table {
                    key: source_key,
                    value: source_value,
                },
                SquirrelType::Table {
                    key: target_key,
                    value: target_value,
                },
            ) => source_key.is_assignable_to(target_key) && source_value.is_assignable_to(target_value),
            (SquirrelType::Class(source), SquirrelType::Class(target)) => {
                let mut current = Some(source);
                while let Some(class) = current {
                    if class.name == target.name {
                        return true;
                    }
                    current = class.base.as_deref();
                }
                false
            }
            _ => false,
        }
    }
}

impl fmt::Display for SquirrelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquirrelType::Primitive(p) => f.write_str(p.name()),
            SquirrelType::Null => f.write_str("null"),
            SquirrelType::Any => f.write_str("any"),
            SquirrelType::Function {
                parameters,
                return_type,
            } => {
                f.write_str("(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                write!(f, ") -> {return_type}")
            }
            SquirrelType::Array(element) => write!(f, "array<{element}>"),
            SquirrelType::Table { key, value } => write!(f, "table<{key}, {value}>"),
            SquirrelType::Class(class) => f.write_str(&class.name),
            SquirrelType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            SquirrelType::Optional(inner) => match inner.as_ref() {
                SquirrelType::Function { .. } | SquirrelType::Union(_) => write!(f, "({inner})?"),
                _ => write!(f, "{inner}?"),
            },
        }
    }
}
