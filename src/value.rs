//! The runtime value type, `Obj` in spec terms.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value as Json;

use crate::ast::Node;
use crate::types::Klass;
use crate::vm::Environment;

/// A runtime value. Function values capture their defining environment by
/// reference-counted clone rather than copying bindings, per the "cyclic
/// references in ownership" design note — child scopes hold an `Rc` back to
/// their parent, so a closure stays cheap to create.
#[derive(Debug, Clone)]
pub enum Obj {
    Nihil,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// An RFC3339 timestamp string, produced by the `time` builtin.
    Time(String),
    List(Vec<Obj>),
    ObjectLiteral(HashMap<String, Obj>),
    RecordObject {
        type_name: String,
        fields: HashMap<String, Obj>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Rc<Node>,
        captured_env: Environment,
    },
    /// A type, reified as a value (spec: "Klass (type-object, itself a
    /// value)").
    Klass(Klass),
}

impl PartialEq for Obj {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Obj::Nihil, Obj::Nihil) => true,
            (Obj::Int(a), Obj::Int(b)) => a == b,
            (Obj::Float(a), Obj::Float(b)) => a == b,
            (Obj::Int(a), Obj::Float(b)) | (Obj::Float(b), Obj::Int(a)) => *a as f64 == *b,
            (Obj::Bool(a), Obj::Bool(b)) => a == b,
            (Obj::Str(a), Obj::Str(b)) => a == b,
            (Obj::Time(a), Obj::Time(b)) => a == b,
            (Obj::List(a), Obj::List(b)) => a == b,
            (Obj::ObjectLiteral(a), Obj::ObjectLiteral(b)) => a == b,
            (
                Obj::RecordObject { type_name: tn1, fields: f1 },
                Obj::RecordObject { type_name: tn2, fields: f2 },
            ) => tn1 == tn2 && f1 == f2,
            (Obj::Klass(a), Obj::Klass(b)) => a == b,
            _ => false,
        }
    }
}

impl Obj {
    pub fn from_json(value: &Json) -> Obj {
        match value {
            Json::Null => Obj::Nihil,
            Json::Bool(b) => Obj::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Obj::Int(i)
                } else {
                    Obj::Float(n.as_f64().unwrap_or_default())
                }
            }
            Json::String(s) => Obj::Str(s.clone()),
            Json::Array(items) => Obj::List(items.iter().map(Obj::from_json).collect()),
            Json::Object(map) => Obj::ObjectLiteral(
                map.iter().map(|(k, v)| (k.clone(), Obj::from_json(v))).collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Obj::Nihil => Json::Null,
            Obj::Int(i) => Json::Number((*i).into()),
            Obj::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Obj::Bool(b) => Json::Bool(*b),
            Obj::Str(s) | Obj::Time(s) => Json::String(s.clone()),
            Obj::List(items) => Json::Array(items.iter().map(Obj::to_json).collect()),
            Obj::ObjectLiteral(fields) => {
                Json::Object(fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Obj::RecordObject { fields, .. } => {
                Json::Object(fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Obj::Function { name, .. } => Json::String(format!("<function {name}>")),
            Obj::Klass(klass) => Json::String(klass.name()),
        }
    }

    /// The human-facing rendering used by `say`/string concatenation.
    pub fn pretty(&self) -> String {
        match self {
            Obj::Nihil => "nihil".to_string(),
            Obj::Int(i) => i.to_string(),
            Obj::Float(f) => f.to_string(),
            Obj::Bool(b) => b.to_string(),
            Obj::Str(s) => s.clone(),
            Obj::Time(t) => t.clone(),
            Obj::List(items) => {
                format!("[{}]", items.iter().map(Obj::pretty).collect::<Vec<_>>().join(", "))
            }
            Obj::ObjectLiteral(fields) => Self::pretty_fields(fields),
            Obj::RecordObject { fields, .. } => Self::pretty_fields(fields),
            Obj::Function { name, .. } => format!("<function {name}>"),
            Obj::Klass(klass) => klass.name(),
        }
    }

    fn pretty_fields(fields: &HashMap<String, Obj>) -> String {
        let mut entries: Vec<_> = fields.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let body = entries
            .into_iter()
            .map(|(k, v)| format!("{k}: {}", v.pretty()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{body}}}")
    }

    /// Additionally quotes strings and tags `RecordObject`s with their type
    /// name, for `inspect(x)`.
    pub fn introspect(&self) -> String {
        match self {
            Obj::Str(s) => format!("\"{s}\""),
            Obj::RecordObject { type_name, fields } => {
                format!("{type_name} {}", Self::introspect_fields(fields))
            }
            Obj::List(items) => {
                format!("[{}]", items.iter().map(Obj::introspect).collect::<Vec<_>>().join(", "))
            }
            Obj::ObjectLiteral(fields) => Self::introspect_fields(fields),
            other => other.pretty(),
        }
    }

    fn introspect_fields(fields: &HashMap<String, Obj>) -> String {
        let mut entries: Vec<_> = fields.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let body = entries
            .into_iter()
            .map(|(k, v)| format!("{k}: {}", v.introspect()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{body}}}")
    }

    /// The class of this value, as a first-class [`Klass`].
    pub fn klass(&self) -> Klass {
        match self {
            Obj::Nihil => Klass::Nihil,
            Obj::Int(_) => Klass::Int,
            Obj::Float(_) => Klass::Float,
            Obj::Bool(_) => Klass::Bool,
            Obj::Str(_) | Obj::Time(_) => Klass::Str,
            Obj::List(items) => Klass::Generic {
                base: "List".to_string(),
                params: vec![items.first().map(Obj::klass).unwrap_or(Klass::Nihil)],
            },
            Obj::ObjectLiteral(_) => Klass::Generic { base: "Dict".to_string(), params: vec![Klass::Nihil] },
            Obj::RecordObject { type_name, .. } => Klass::Reference(type_name.clone()),
            Obj::Function { name, .. } => Klass::Reference(format!("Function<{name}>")),
            Obj::Klass(_) => Klass::Reference("Klass".to_string()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Obj::Bool(false) | Obj::Nihil)
    }

    pub fn type_name(&self) -> String {
        self.klass().name()
    }
}
