//! Type registry and JSON-schema derivation.
//!
//! A [`Klass`] is a type, reified as data; it is also how the translator
//! expresses a type expression parsed from source (the translator lowers
//! `NodeKind::TypeReference`/`RecordType`/`UnionType`/`TypeConstant`/
//! `GenericType` directly into the matching `Klass` shape, so there is no
//! separate "type expression" IR).

use std::collections::{HashMap, HashSet};

use serde_json::Value as Json;

use crate::cursor::Cursor;
use crate::error::AuraError;
use crate::value::Obj;

/// A type, reified as a runtime-inspectable value (spec's "Klass").
#[derive(Debug, Clone, PartialEq)]
pub enum Klass {
    Int,
    Float,
    Str,
    Bool,
    Nihil,
    /// `(field name, field type, optional)`. An optional field may be
    /// absent from a constructed value, resolving to `Obj::Nihil` instead
    /// of raising a cast error, and is excluded from the derived schema's
    /// `required` array.
    Record(Vec<(String, Klass, bool)>),
    Union(Vec<Klass>),
    Constant(Json),
    Reference(String),
    Generic { base: String, params: Vec<Klass> },
}

impl Klass {
    /// Name used by `typeof`/`inspect`/registry keys; generic types include
    /// their parameters (`List<Int>`).
    pub fn name(&self) -> String {
        match self {
            Klass::Int => "Int".to_string(),
            Klass::Float => "Float".to_string(),
            Klass::Str => "Str".to_string(),
            Klass::Bool => "Bool".to_string(),
            Klass::Nihil => "Nihil".to_string(),
            Klass::Record(_) => "Record".to_string(),
            Klass::Union(_) => "Union".to_string(),
            Klass::Constant(v) => format!("Constant({v})"),
            Klass::Reference(name) => name.clone(),
            Klass::Generic { base, params } => {
                let params = params.iter().map(Klass::name).collect::<Vec<_>>().join(", ");
                format!("{base}<{params}>")
            }
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Klass::Int | Klass::Float | Klass::Str | Klass::Bool | Klass::Nihil)
    }
}

/// Process-scoped mapping from type name to [`Klass`], seeded with
/// primitives so a bare `Int`/`Float`/... reference resolves without a
/// prior `type` declaration, plus the generic bases `List`/`Dict`/`Map` so
/// they resolve by name even before being applied to a type parameter.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Klass>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut types = HashMap::new();
        types.insert("Int".to_string(), Klass::Int);
        types.insert("Float".to_string(), Klass::Float);
        types.insert("Str".to_string(), Klass::Str);
        types.insert("Bool".to_string(), Klass::Bool);
        types.insert("Nihil".to_string(), Klass::Nihil);
        for base in ["List", "Dict", "Map"] {
            types.insert(base.to_string(), Klass::Generic { base: base.to_string(), params: Vec::new() });
        }
        TypeRegistry { types }
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named type.
    pub fn register(&mut self, name: impl Into<String>, klass: Klass) {
        self.types.insert(name.into(), klass);
    }

    pub fn resolve(&self, name: &str, at: Option<Cursor>) -> Result<&Klass, AuraError> {
        self.types.get(name).ok_or_else(|| AuraError::unknown_type(name, at))
    }

    /// Fully resolve a `Klass` tree: `Reference`s are looked up (but kept
    /// as references one level deep for cycle-guarded schema derivation),
    /// unknown names fail fast.
    pub fn check_resolvable(&self, klass: &Klass, at: Option<Cursor>) -> Result<(), AuraError> {
        match klass {
            Klass::Reference(name) => {
                self.resolve(name, at)?;
                Ok(())
            }
            Klass::Record(fields) => {
                for (_, f, _) in fields {
                    self.check_resolvable(f, at)?;
                }
                Ok(())
            }
            Klass::Union(members) | Klass::Generic { params: members, .. } => {
                for m in members {
                    self.check_resolvable(m, at)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Derive a draft-07-ish JSON schema for `klass`, per spec section 4.6.
    pub fn json_schema(&self, klass: &Klass) -> Result<Json, AuraError> {
        self.json_schema_inner(klass, &mut HashSet::new())
    }

    fn json_schema_inner(&self, klass: &Klass, seen: &mut HashSet<String>) -> Result<Json, AuraError> {
        Ok(match klass {
            Klass::Int => serde_json::json!({ "type": "integer" }),
            Klass::Float => serde_json::json!({ "type": "number" }),
            Klass::Str => serde_json::json!({ "type": "string" }),
            Klass::Bool => serde_json::json!({ "type": "boolean" }),
            Klass::Nihil => serde_json::json!({ "type": "null" }),
            Klass::Constant(v) => serde_json::json!({ "const": v }),
            Klass::Record(fields) => {
                let mut properties = serde_json::Map::new();
                let mut required = Vec::new();
                for (name, field_klass, optional) in fields {
                    properties.insert(name.clone(), self.json_schema_inner(field_klass, seen)?);
                    if !optional {
                        required.push(Json::String(name.clone()));
                    }
                }
                serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })
            }
            Klass::Union(members) => {
                let all_string_constants = members.iter().all(|m| {
                    matches!(m, Klass::Constant(Json::String(_)))
                });
                if all_string_constants {
                    let enum_values: Vec<Json> = members
                        .iter()
                        .map(|m| match m {
                            Klass::Constant(v) => v.clone(),
                            _ => unreachable!(),
                        })
                        .collect();
                    serde_json::json!({ "type": "string", "enum": enum_values })
                } else {
                    let any_of = members
                        .iter()
                        .map(|m| self.json_schema_inner(m, seen))
                        .collect::<Result<Vec<_>, _>>()?;
                    serde_json::json!({ "anyOf": any_of })
                }
            }
            Klass::Reference(name) => {
                if !seen.insert(name.clone()) {
                    return Ok(serde_json::json!({ "type": "object" }));
                }
                let target = self.resolve(name, None)?.clone();
                let schema = self.json_schema_inner(&target, seen)?;
                seen.remove(name);
                schema
            }
            Klass::Generic { base, params } => match base.as_str() {
                "List" => {
                    let items = params.first().ok_or_else(|| {
                        AuraError::Type("List requires one type parameter".to_string(), None)
                    })?;
                    serde_json::json!({ "type": "array", "items": self.json_schema_inner(items, seen)? })
                }
                "Dict" | "Map" => {
                    let value = params.get(1).or_else(|| params.first()).ok_or_else(|| {
                        AuraError::Type(format!("{base} requires a value type parameter"), None)
                    })?;
                    serde_json::json!({
                        "type": "object",
                        "additionalProperties": self.json_schema_inner(value, seen)?,
                    })
                }
                other => {
                    return Err(AuraError::unknown_type(other, None));
                }
            },
        })
    }

    /// Construct a typed [`Obj`] from a raw (already-parsed) JSON value,
    /// per spec section 4.5 step 6. Nested field values are recursively
    /// constructed against their declared field type.
    pub fn construct(&self, klass: &Klass, raw: &Json, type_name: Option<&str>) -> Result<Obj, AuraError> {
        match klass {
            Klass::Int => raw
                .as_i64()
                .map(Obj::Int)
                .ok_or_else(|| AuraError::Cast(format!("expected integer, found {raw}"), None)),
            Klass::Float => raw
                .as_f64()
                .map(Obj::Float)
                .ok_or_else(|| AuraError::Cast(format!("expected number, found {raw}"), None)),
            Klass::Str => raw
                .as_str()
                .map(|s| Obj::Str(s.to_string()))
                .ok_or_else(|| AuraError::Cast(format!("expected string, found {raw}"), None)),
            Klass::Bool => raw
                .as_bool()
                .map(Obj::Bool)
                .ok_or_else(|| AuraError::Cast(format!("expected boolean, found {raw}"), None)),
            Klass::Nihil => Ok(Obj::Nihil),
            Klass::Constant(expected) => {
                if raw == expected {
                    Ok(Obj::from_json(raw))
                } else {
                    Err(AuraError::Cast(format!("expected constant {expected}, found {raw}"), None))
                }
            }
            Klass::Record(fields) => {
                let obj = raw.as_object().ok_or_else(|| {
                    AuraError::Cast(format!("expected object, found {raw}"), None)
                })?;
                let mut built = HashMap::new();
                for (name, field_klass, optional) in fields {
                    match obj.get(name) {
                        Some(value) => {
                            built.insert(name.clone(), self.construct(field_klass, value, None)?);
                        }
                        None if *optional => {
                            built.insert(name.clone(), Obj::Nihil);
                        }
                        None => {
                            return Err(AuraError::Cast(format!("missing required field '{name}'"), None));
                        }
                    }
                }
                Ok(Obj::RecordObject {
                    type_name: type_name.unwrap_or("Record").to_string(),
                    fields: built,
                })
            }
            Klass::Union(members) => {
                for member in members {
                    if let Ok(value) = self.construct(member, raw, type_name) {
                        return Ok(value);
                    }
                }
                Err(AuraError::Cast(format!("{raw} matches no union member"), None))
            }
            Klass::Reference(name) => {
                let target = self.resolve(name, None)?.clone();
                self.construct(&target, raw, Some(name))
            }
            Klass::Generic { base, params } => match base.as_str() {
                "List" => {
                    let items = params
                        .first()
                        .ok_or_else(|| AuraError::Type("List requires one type parameter".to_string(), None))?;
                    let arr = raw
                        .as_array()
                        .ok_or_else(|| AuraError::Cast(format!("expected array, found {raw}"), None))?;
                    let values = arr
                        .iter()
                        .map(|v| self.construct(items, v, None))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Obj::List(values))
                }
                "Dict" | "Map" => {
                    let value_klass = params.get(1).or_else(|| params.first()).ok_or_else(|| {
                        AuraError::Type(format!("{base} requires a value type parameter"), None)
                    })?;
                    let obj = raw
                        .as_object()
                        .ok_or_else(|| AuraError::Cast(format!("expected object, found {raw}"), None))?;
                    let mut built = HashMap::new();
                    for (k, v) in obj {
                        built.insert(k.clone(), self.construct(value_klass, v, None)?);
                    }
                    Ok(Obj::ObjectLiteral(built))
                }
                other => Err(AuraError::unknown_type(other, None)),
            },
        }
    }
}
