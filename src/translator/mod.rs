//! AST -> linear `Instr` sequence.
//!
//! Binary operations whose operand *shapes* are known at translate time
//! (both sides are literal nodes of a matching kind) lower to type-specific
//! instructions (`IntPlus`, `FloatPlus`, `StrPlus`, `IntSlash`,
//! `FloatSlash`); everything else lowers to a generic `BinOp` the VM
//! dispatches dynamically, since Aura has no static type inference (spec
//! section 1, Non-goals). `binop_dot` (member access) is always generic:
//! the receiver's shape is never known statically.
//!
//! Every `Instr` carries the `Cursor` of the AST node it came from, so VM
//! runtime errors (undefined identifier, arity mismatch, cast failure, ...)
//! can still point back into the source the way lex/parse errors do.

use crate::ast::{BinOp as AstBinOp, Node, NodeKind, StrPart};
use crate::cursor::Cursor;
use crate::error::AuraError;
use crate::types::Klass;

#[derive(Debug, Clone)]
pub struct Instr {
    pub kind: InstrKind,
    pub at: Cursor,
}

impl Instr {
    fn new(kind: InstrKind, at: Cursor) -> Self {
        Instr { kind, at }
    }
}

#[derive(Debug, Clone)]
pub enum InstrKind {
    LitInt(i64),
    LitFloat(f64),
    LitBool(bool),
    LitStr(String),
    Nihil,
    /// `LET(name, val)`.
    Let(String, Box<Instr>),
    /// `RECALL(name)` / `LOCAL_VARIABLE_GET(name)` — a plain identifier
    /// reference; the VM doesn't need to distinguish the two spec
    /// instruction names since both resolve through the same environment
    /// lookup chain.
    Recall(String),
    Negate(Box<Instr>),
    Not(Box<Instr>),
    IntPlus(Box<Instr>, Box<Instr>),
    FloatPlus(Box<Instr>, Box<Instr>),
    StrPlus(Box<Instr>, Box<Instr>),
    IntSlash(Box<Instr>, Box<Instr>),
    FloatSlash(Box<Instr>, Box<Instr>),
    BinopEquals(Box<Instr>, Box<Instr>),
    BinopDot(Box<Instr>, Box<Instr>),
    /// Any binary op the translator couldn't lower to a typed variant;
    /// resolved dynamically at evaluation time.
    BinOp(AstBinOp, Box<Instr>, Box<Instr>),
    /// `CONCATENATE(parts)`.
    Concatenate(Vec<Instr>),
    /// `GEN(text)`.
    Gen(Box<Instr>),
    /// `CAST(value, target_type)`.
    Cast(Box<Instr>, Klass),
    /// `CONS` — object-literal construction with an evaluated field map.
    Cons(Vec<(String, Instr)>),
    Array(Vec<Instr>),
    /// `SEND(receiver, method, args)` for a parens-less/parenthesised call.
    Call { name: String, args: Vec<Instr> },
    If {
        cond: Box<Instr>,
        then: Box<Instr>,
        elifs: Vec<(Instr, Instr)>,
        els: Option<Box<Instr>>,
    },
    While {
        cond: Box<Instr>,
        body: Box<Instr>,
    },
    Seq(Vec<Instr>),
    FunDef {
        name: String,
        params: Vec<String>,
        body: Box<Instr>,
    },
    TypeDeclaration {
        name: String,
        klass: Klass,
    },
    /// A type expression used in value position (e.g. a bare `Status`
    /// reference, yielding the reified `Klass` itself).
    KlassValue(Klass),
}

/// Translate a full AST into the VM's instruction vocabulary.
pub fn translate(node: &Node) -> Result<Instr, AuraError> {
    lower(node)
}

fn lower(node: &Node) -> Result<Instr, AuraError> {
    let at = node.at;
    let kind = match &node.kind {
        NodeKind::Int(n) => InstrKind::LitInt(*n),
        NodeKind::Float(n) => InstrKind::LitFloat(*n),
        NodeKind::Bool(b) => InstrKind::LitBool(*b),
        NodeKind::Nihil => InstrKind::Nihil,
        NodeKind::Str(s) => InstrKind::LitStr(s.clone()),
        NodeKind::Id(name) => InstrKind::Recall(name.clone()),
        NodeKind::GenLit(s) => InstrKind::Gen(Box::new(Instr::new(InstrKind::LitStr(s.clone()), at))),
        NodeKind::StructuredStr(parts) => InstrKind::Concatenate(lower_str_parts(parts)?),
        NodeKind::StructuredGenLit(parts) => {
            InstrKind::Gen(Box::new(Instr::new(InstrKind::Concatenate(lower_str_parts(parts)?), at)))
        }
        NodeKind::Negate(inner) => InstrKind::Negate(Box::new(lower(inner)?)),
        NodeKind::Not(inner) => InstrKind::Not(Box::new(lower(inner)?)),
        NodeKind::BinOp(op, lhs, rhs) => return Ok(Instr::new(lower_binop(*op, lhs, rhs)?, at)),
        NodeKind::Assign(name, value) => InstrKind::Let(name.clone(), Box::new(lower(value)?)),
        NodeKind::If { cond, then, elifs, els } => InstrKind::If {
            cond: Box::new(lower(cond)?),
            then: Box::new(lower(then)?),
            elifs: elifs
                .iter()
                .map(|(c, b)| Ok((lower(c)?, lower(b)?)))
                .collect::<Result<Vec<_>, AuraError>>()?,
            els: els.as_ref().map(|e| lower(e)).transpose()?.map(Box::new),
        },
        NodeKind::While { cond, body } => {
            InstrKind::While { cond: Box::new(lower(cond)?), body: Box::new(lower(body)?) }
        }
        NodeKind::Call { name, args } => {
            InstrKind::Call { name: name.clone(), args: args.iter().map(lower).collect::<Result<Vec<_>, _>>()? }
        }
        NodeKind::Seq(stmts) => InstrKind::Seq(stmts.iter().map(lower).collect::<Result<Vec<_>, _>>()?),
        NodeKind::FunDef { name, params, body } => InstrKind::FunDef {
            name: name.clone(),
            params: params.clone(),
            body: Box::new(lower(body)?),
        },
        NodeKind::TypeDeclaration { name, def } => {
            InstrKind::TypeDeclaration { name: name.clone(), klass: lower_type_expr(def)? }
        }
        NodeKind::TypeReference(_)
        | NodeKind::TypeConstant(_)
        | NodeKind::UnionType(_)
        | NodeKind::RecordType(_)
        | NodeKind::GenericType { .. } => InstrKind::KlassValue(lower_type_expr(node)?),
        NodeKind::ObjectLiteral(fields) => {
            let mut lowered = Vec::with_capacity(fields.len());
            for field in fields {
                let NodeKind::Field { name, value, .. } = &field.kind else {
                    return Err(AuraError::parse("malformed object literal field", Some(field.at)));
                };
                lowered.push((name.clone(), lower(value)?));
            }
            InstrKind::Cons(lowered)
        }
        NodeKind::ArrayLiteral(elems) => {
            InstrKind::Array(elems.iter().map(lower).collect::<Result<Vec<_>, _>>()?)
        }
        NodeKind::Field { .. } => {
            return Err(AuraError::parse("unexpected bare field node", Some(node.at)))
        }
        NodeKind::TypeAnnotation { expr, ty } => {
            InstrKind::Cast(Box::new(lower(expr)?), lower_type_expr(ty)?)
        }
    };
    Ok(Instr::new(kind, at))
}

fn lower_str_parts(parts: &[StrPart]) -> Result<Vec<Instr>, AuraError> {
    parts
        .iter()
        .map(|part| match part {
            StrPart::Literal(s) => Ok(Instr::new(InstrKind::LitStr(s.clone()), Cursor::default())),
            StrPart::Expr(e) => lower(e),
        })
        .collect()
}

fn lower_binop(op: AstBinOp, lhs: &Node, rhs: &Node) -> Result<InstrKind, AuraError> {
    if op == AstBinOp::Dot {
        return Ok(InstrKind::BinopDot(Box::new(lower(lhs)?), Box::new(lower(rhs)?)));
    }
    if op == AstBinOp::Eq {
        return Ok(InstrKind::BinopEquals(Box::new(lower(lhs)?), Box::new(lower(rhs)?)));
    }
    let lhs_i = lower(lhs)?;
    let rhs_i = lower(rhs)?;
    let known = literal_numeric_kind(lhs).zip(literal_numeric_kind(rhs));
    if let Some((lk, rk)) = known {
        let is_float = lk == NumKind::Float || rk == NumKind::Float;
        match op {
            AstBinOp::Plus if lk == NumKind::Str && rk == NumKind::Str => {
                return Ok(InstrKind::StrPlus(Box::new(lhs_i), Box::new(rhs_i)))
            }
            // One side is a raw-string literal, the other isn't: not a
            // same-type fast path, fall through to the dynamic `BinOp` which
            // knows how to pretty-render the mismatched side.
            AstBinOp::Plus if lk == NumKind::Str || rk == NumKind::Str => {}
            AstBinOp::Plus if is_float => return Ok(InstrKind::FloatPlus(Box::new(lhs_i), Box::new(rhs_i))),
            AstBinOp::Plus => return Ok(InstrKind::IntPlus(Box::new(lhs_i), Box::new(rhs_i))),
            AstBinOp::Slash if lk == NumKind::Str || rk == NumKind::Str => {}
            AstBinOp::Slash if is_float => return Ok(InstrKind::FloatSlash(Box::new(lhs_i), Box::new(rhs_i))),
            AstBinOp::Slash => return Ok(InstrKind::IntSlash(Box::new(lhs_i), Box::new(rhs_i))),
            _ => {}
        }
    }
    Ok(InstrKind::BinOp(op, Box::new(lhs_i), Box::new(rhs_i)))
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum NumKind {
    Int,
    Float,
    Str,
}

fn literal_numeric_kind(node: &Node) -> Option<NumKind> {
    match &node.kind {
        NodeKind::Int(_) => Some(NumKind::Int),
        NodeKind::Float(_) => Some(NumKind::Float),
        NodeKind::Str(_) => Some(NumKind::Str),
        _ => None,
    }
}

fn lower_type_expr(node: &Node) -> Result<Klass, AuraError> {
    Ok(match &node.kind {
        NodeKind::TypeReference(name) => Klass::Reference(name.clone()),
        NodeKind::TypeConstant(literal) => Klass::Constant(literal_to_json(literal)?),
        NodeKind::UnionType(members) => {
            Klass::Union(members.iter().map(lower_type_expr).collect::<Result<Vec<_>, _>>()?)
        }
        NodeKind::RecordType(fields) => {
            let mut lowered = Vec::with_capacity(fields.len());
            for field in fields {
                let NodeKind::Field { name, value, optional } = &field.kind else {
                    return Err(AuraError::parse("malformed record type field", Some(field.at)));
                };
                lowered.push((name.clone(), lower_type_expr(value)?, *optional));
            }
            Klass::Record(lowered)
        }
        NodeKind::GenericType { base, params } => Klass::Generic {
            base: base.clone(),
            params: params.iter().map(lower_type_expr).collect::<Result<Vec<_>, _>>()?,
        },
        other => {
            return Err(AuraError::parse(format!("expected a type expression, found {other:?}"), Some(node.at)))
        }
    })
}

fn literal_to_json(node: &Node) -> Result<serde_json::Value, AuraError> {
    Ok(match &node.kind {
        NodeKind::Int(n) => serde_json::json!(n),
        NodeKind::Float(n) => serde_json::json!(n),
        NodeKind::Bool(b) => serde_json::json!(b),
        NodeKind::Str(s) => serde_json::json!(s),
        _ => return Err(AuraError::parse("expected a literal constant", Some(node.at))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser;

    fn translate_src(src: &str) -> Instr {
        let tokens = Lexer::new(src).tokens().unwrap();
        let ast = parser::parse(tokens).unwrap();
        translate(&ast).unwrap()
    }

    #[test]
    fn lowers_int_literal_addition() {
        let instr = translate_src("1 + 2");
        assert!(matches!(instr.kind, InstrKind::IntPlus(..)));
    }

    #[test]
    fn lowers_mixed_numeric_addition_to_float() {
        let instr = translate_src("1 + 2.5");
        assert!(matches!(instr.kind, InstrKind::FloatPlus(..)));
    }

    #[test]
    fn lowers_dynamic_addition_generically() {
        // `x` has no statically known literal shape.
        let instr = translate_src("x + 1");
        assert!(matches!(instr.kind, InstrKind::BinOp(AstBinOp::Plus, ..)));
    }

    #[test]
    fn lowers_dot_access() {
        let instr = translate_src("obj.x");
        assert!(matches!(instr.kind, InstrKind::BinopDot(..)));
    }

    #[test]
    fn lowers_cast_to_type_klass() {
        let instr = translate_src("x as Int");
        let InstrKind::Cast(_, klass) = instr.kind else { panic!("expected cast") };
        assert_eq!(klass, Klass::Int);
    }

    #[test]
    fn lowers_type_declaration() {
        let instr = translate_src("type Point = { x: Int, y: Int }");
        let InstrKind::TypeDeclaration { name, klass } = instr.kind else { panic!("expected decl") };
        assert_eq!(name, "Point");
        assert!(matches!(klass, Klass::Record(fields) if fields.len() == 2));
    }

    #[test]
    fn lowers_optional_record_field_marker() {
        let instr = translate_src("type Point = { x: Int, y?: Int }");
        let InstrKind::TypeDeclaration { klass, .. } = instr.kind else { panic!("expected decl") };
        let Klass::Record(fields) = klass else { panic!("expected record") };
        assert!(!fields[0].2);
        assert!(fields[1].2);
    }

    #[test]
    fn lowers_structured_string_to_concatenate() {
        let instr = translate_src(r#""hi ${x}""#);
        assert!(matches!(instr.kind, InstrKind::Concatenate(_)));
    }

    #[test]
    fn lowers_generative_literal_to_gen() {
        let instr = translate_src(r#""""why is the sky blue?""""#);
        assert!(matches!(instr.kind, InstrKind::Gen(_)));
    }

    #[test]
    fn every_instr_carries_the_source_cursor_of_its_node() {
        let instr = translate_src("1 + 2");
        assert_eq!(instr.at, Cursor { line: 1, column: 1 });
    }
}
