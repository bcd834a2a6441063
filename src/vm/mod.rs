//! Executes the translator's `Instr` tree against an environment, a type
//! registry, and an LLM client. Single-threaded; no user-visible
//! concurrency (spec section 5).

mod builtins;
mod environment;
mod host;

pub use environment::Environment;
pub use host::{Host, StdHost};

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use crate::ast::BinOp;
use crate::config::Configuration;
use crate::cursor::Cursor;
use crate::error::AuraError;
use crate::lexer::Lexer;
use crate::llm::{LlmClient, LlmTransport};
use crate::parser;
use crate::translator::{self, Instr, InstrKind};
use crate::types::{Klass, TypeRegistry};
use crate::value::Obj;

/// Holds everything evaluation needs: the current environment, the
/// process-wide type registry, the LLM client, the I/O host, and an
/// import-cycle guard. All explicit owned state, per the "no global
/// singletons" design note — nothing here is a `static`.
pub struct Vm {
    environment: Environment,
    types: TypeRegistry,
    llm: LlmClient,
    host: Box<dyn Host>,
    importing: HashSet<PathBuf>,
    base_dir: PathBuf,
}

impl Vm {
    pub fn new(config: Configuration) -> Self {
        Vm {
            environment: Environment::new(),
            types: TypeRegistry::new(),
            llm: LlmClient::new(config, ".aua/cache.json"),
            host: Box::new(StdHost),
            importing: HashSet::new(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_host(config: Configuration, host: Box<dyn Host>) -> Self {
        Vm { host, ..Vm::new(config) }
    }

    pub fn with_host_and_transport(
        config: Configuration,
        host: Box<dyn Host>,
        transport: Box<dyn LlmTransport>,
    ) -> Self {
        let mut vm = Vm::with_host(config.clone(), host);
        vm.llm = LlmClient::with_transport(config, ".aua/cache.json", transport);
        vm
    }

    /// Parse and evaluate `source` against this VM. Lex/parse errors are
    /// fatal to this call; runtime errors leave the VM usable for the
    /// next `run()` (spec section 4.5's failure semantics).
    pub fn run(&mut self, source: &str) -> Result<Obj, AuraError> {
        log::debug!("running {} bytes of source", source.len());
        let tokens = Lexer::new(source).tokens()?;
        let ast = parser::parse(tokens)?;
        let instr = translator::translate(&ast)?;
        self.eval(&instr)
    }

    fn eval(&mut self, instr: &Instr) -> Result<Obj, AuraError> {
        let at = instr.at;
        match &instr.kind {
            InstrKind::LitInt(n) => Ok(Obj::Int(*n)),
            InstrKind::LitFloat(n) => Ok(Obj::Float(*n)),
            InstrKind::LitBool(b) => Ok(Obj::Bool(*b)),
            InstrKind::LitStr(s) => Ok(Obj::Str(s.clone())),
            InstrKind::Nihil => Ok(Obj::Nihil),
            InstrKind::Let(name, value) => {
                let value = self.eval(value)?;
                self.environment.set(name.clone(), value.clone());
                Ok(value)
            }
            InstrKind::Recall(name) => {
                self.environment.get(name).ok_or_else(|| AuraError::undefined_identifier(name, Some(at)))
            }
            InstrKind::Negate(inner) => match self.eval(inner)? {
                Obj::Int(n) => Ok(Obj::Int(-n)),
                Obj::Float(n) => Ok(Obj::Float(-n)),
                other => Err(AuraError::Type(format!("cannot negate a {}", other.type_name()), Some(at))),
            },
            InstrKind::Not(inner) => {
                let value = self.eval(inner)?;
                Ok(Obj::Bool(!value.is_truthy()))
            }
            InstrKind::IntPlus(l, r) => self.int_arith(l, r, at, "plus", i64::checked_add),
            InstrKind::FloatPlus(l, r) => {
                let (l, r) = (self.eval_float(l)?, self.eval_float(r)?);
                Ok(Obj::Float(l + r))
            }
            InstrKind::StrPlus(l, r) => {
                let (l, r) = (self.eval(l)?, self.eval(r)?);
                Ok(Obj::Str(format!("{}{}", l.pretty(), r.pretty())))
            }
            InstrKind::IntSlash(l, r) => {
                let (l, r) = (self.eval_int(l)?, self.eval_int(r)?);
                if r == 0 {
                    return Err(AuraError::division_by_zero(Some(at)));
                }
                Ok(Obj::Int(floor_div(l, r)))
            }
            InstrKind::FloatSlash(l, r) => {
                let (l, r) = (self.eval_float(l)?, self.eval_float(r)?);
                if r == 0.0 {
                    return Err(AuraError::division_by_zero(Some(at)));
                }
                Ok(Obj::Float(l / r))
            }
            InstrKind::BinopEquals(l, r) => {
                let (l, r) = (self.eval(l)?, self.eval(r)?);
                Ok(Obj::Bool(l == r))
            }
            InstrKind::BinopDot(receiver, field) => {
                let receiver = self.eval(receiver)?;
                let Obj::Str(field_name) = self.eval(field)? else {
                    return Err(AuraError::Type("field access requires a literal field name".to_string(), Some(at)));
                };
                self.field_access(&receiver, &field_name, at)
            }
            InstrKind::BinOp(op, l, r) => self.eval_binop(*op, l, r, at),
            InstrKind::Concatenate(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&self.eval(part)?.pretty());
                }
                Ok(Obj::Str(out))
            }
            InstrKind::Gen(text) => {
                let prompt = self.eval(text)?.pretty();
                let response = self.llm.complete(&prompt).map_err(|e| promote_provider_error(e, at))?;
                Ok(Obj::Str(response))
            }
            InstrKind::Cast(value, klass) => {
                let value = self.eval(value)?;
                self.generative_cast(value, klass, at)
            }
            InstrKind::Cons(fields) => {
                let mut built = HashMap::with_capacity(fields.len());
                for (name, value_instr) in fields {
                    built.insert(name.clone(), self.eval(value_instr)?);
                }
                Ok(Obj::ObjectLiteral(built))
            }
            InstrKind::Array(elems) => {
                let values = elems.iter().map(|e| self.eval(e)).collect::<Result<Vec<_>, _>>()?;
                Ok(Obj::List(values))
            }
            InstrKind::Call { name, args } => self.eval_call(name, args, at),
            InstrKind::If { cond, then, elifs, els } => {
                if self.eval(cond)?.is_truthy() {
                    return self.eval(then);
                }
                for (elif_cond, elif_body) in elifs {
                    if self.eval(elif_cond)?.is_truthy() {
                        return self.eval(elif_body);
                    }
                }
                match els {
                    Some(body) => self.eval(body),
                    None => Ok(Obj::Nihil),
                }
            }
            InstrKind::While { cond, body } => {
                let mut last = Obj::Nihil;
                while self.eval(cond)?.is_truthy() {
                    last = self.eval(body)?;
                }
                Ok(last)
            }
            InstrKind::Seq(stmts) => {
                let mut last = Obj::Nihil;
                for stmt in stmts {
                    last = self.eval(stmt)?;
                }
                Ok(last)
            }
            InstrKind::FunDef { name, params, body } => {
                let func = Obj::Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new((**body).clone()),
                    captured_env: self.environment.clone(),
                };
                self.environment.set(name.clone(), func.clone());
                Ok(func)
            }
            InstrKind::TypeDeclaration { name, klass } => {
                self.types.check_resolvable(klass, Some(at)).or_else(|err| {
                    // A self-referencing or forward-referencing record type
                    // is legal (it's exactly what `Reference` + the schema
                    // cycle guard exist for); register first, then verify.
                    match klass {
                        Klass::Record(_) | Klass::Reference(_) => Ok(()),
                        _ => Err(err),
                    }
                })?;
                self.types.register(name.clone(), klass.clone());
                let value = Obj::Klass(klass.clone());
                self.environment.set(name.clone(), value.clone());
                Ok(value)
            }
            InstrKind::KlassValue(klass) => Ok(Obj::Klass(klass.clone())),
        }
    }

    fn eval_int(&mut self, instr: &Instr) -> Result<i64, AuraError> {
        match self.eval(instr)? {
            Obj::Int(n) => Ok(n),
            other => Err(AuraError::Type(format!("expected Int, found {}", other.type_name()), Some(instr.at))),
        }
    }

    fn eval_float(&mut self, instr: &Instr) -> Result<f64, AuraError> {
        match self.eval(instr)? {
            Obj::Int(n) => Ok(n as f64),
            Obj::Float(n) => Ok(n),
            other => Err(AuraError::Type(format!("expected a number, found {}", other.type_name()), Some(instr.at))),
        }
    }

    fn int_arith(
        &mut self,
        l: &Instr,
        r: &Instr,
        at: Cursor,
        op_name: &str,
        f: fn(i64, i64) -> Option<i64>,
    ) -> Result<Obj, AuraError> {
        let (l, r) = (self.eval_int(l)?, self.eval_int(r)?);
        f(l, r).map(Obj::Int).ok_or_else(|| AuraError::Type(format!("Int overflow in {op_name}"), Some(at)))
    }

    fn field_access(&self, receiver: &Obj, field_name: &str, at: Cursor) -> Result<Obj, AuraError> {
        let fields = match receiver {
            Obj::RecordObject { fields, .. } | Obj::ObjectLiteral(fields) => fields,
            other => {
                return Err(AuraError::Type(
                    format!("cannot access field '{field_name}' on a {}", other.type_name()),
                    Some(at),
                ))
            }
        };
        fields.get(field_name).cloned().ok_or_else(|| AuraError::field_not_found(field_name, Some(at)))
    }

    fn eval_binop(&mut self, op: BinOp, l: &Instr, r: &Instr, at: Cursor) -> Result<Obj, AuraError> {
        match op {
            BinOp::And => {
                let lhs = self.eval(l)?;
                if !lhs.is_truthy() {
                    return Ok(Obj::Bool(false));
                }
                Ok(Obj::Bool(self.eval(r)?.is_truthy()))
            }
            BinOp::Or => {
                let lhs = self.eval(l)?;
                if lhs.is_truthy() {
                    return Ok(Obj::Bool(true));
                }
                Ok(Obj::Bool(self.eval(r)?.is_truthy()))
            }
            BinOp::Pipe | BinOp::TildePipe => {
                Err(AuraError::Type("pipe operators are reserved and not yet implemented".to_string(), Some(at)))
            }
            BinOp::Dot => unreachable!("Dot is lowered to BinopDot, not BinOp"),
            BinOp::Eq => unreachable!("Eq is lowered to BinopEquals, not BinOp"),
            _ => {
                let (lv, rv) = (self.eval(l)?, self.eval(r)?);
                self.eval_binop_values(op, lv, rv, at)
            }
        }
    }

    fn eval_binop_values(&self, op: BinOp, l: Obj, r: Obj, at: Cursor) -> Result<Obj, AuraError> {
        use Obj::{Float, Int, Str};
        let numeric = |op_name: &str| {
            AuraError::Type(format!("{op_name} requires two numbers"), Some(at))
        };
        match op {
            BinOp::Plus => match (l, r) {
                (Int(a), Int(b)) => {
                    a.checked_add(b).map(Int).ok_or_else(|| AuraError::Type("Int overflow in plus".to_string(), Some(at)))
                }
                (Int(a), Float(b)) | (Float(b), Int(a)) => Ok(Float(a as f64 + b)),
                (Float(a), Float(b)) => Ok(Float(a + b)),
                (Str(a), Str(b)) => Ok(Str(format!("{a}{b}"))),
                (Str(a), other) => Ok(Str(format!("{a}{}", other.pretty()))),
                (other, Str(b)) => Ok(Str(format!("{}{b}", other.pretty()))),
                _ => Err(AuraError::Type("plus requires two numbers or two strings".to_string(), Some(at))),
            },
            BinOp::Minus => match (l, r) {
                (Int(a), Int(b)) => {
                    a.checked_sub(b).map(Int).ok_or_else(|| AuraError::Type("Int overflow in minus".to_string(), Some(at)))
                }
                (Int(a), Float(b)) => Ok(Float(a as f64 - b)),
                (Float(a), Int(b)) => Ok(Float(a - b as f64)),
                (Float(a), Float(b)) => Ok(Float(a - b)),
                _ => Err(numeric("minus")),
            },
            BinOp::Star => match (l, r) {
                (Int(a), Int(b)) => {
                    a.checked_mul(b).map(Int).ok_or_else(|| AuraError::Type("Int overflow in times".to_string(), Some(at)))
                }
                (Int(a), Float(b)) | (Float(b), Int(a)) => Ok(Float(a as f64 * b)),
                (Float(a), Float(b)) => Ok(Float(a * b)),
                _ => Err(numeric("times")),
            },
            BinOp::Slash => match (l, r) {
                (Int(_), Int(0)) => Err(AuraError::division_by_zero(Some(at))),
                (Int(a), Int(b)) => Ok(Int(floor_div(a, b))),
                (a, b) => {
                    let (a, b) = (as_f64(&a, at)?, as_f64(&b, at)?);
                    if b == 0.0 {
                        return Err(AuraError::division_by_zero(Some(at)));
                    }
                    Ok(Float(a / b))
                }
            },
            BinOp::Pow => {
                let (a, b) = (as_f64(&l, at)?, as_f64(&r, at)?);
                let result = a.powf(b);
                if matches!(l, Int(_)) && matches!(r, Int(_)) && b >= 0.0 {
                    Ok(Int(result as i64))
                } else {
                    Ok(Float(result))
                }
            }
            BinOp::Neq => Ok(Obj::Bool(l != r)),
            BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte => {
                let ordering = match (&l, &r) {
                    (Str(a), Str(b)) => a.partial_cmp(b),
                    _ => as_f64(&l, at).ok().zip(as_f64(&r, at).ok()).and_then(|(a, b)| a.partial_cmp(&b)),
                };
                let Some(ordering) = ordering else {
                    return Err(numeric("comparison"));
                };
                let result = match op {
                    BinOp::Lt => ordering.is_lt(),
                    BinOp::Lte => ordering.is_le(),
                    BinOp::Gt => ordering.is_gt(),
                    BinOp::Gte => ordering.is_ge(),
                    _ => unreachable!(),
                };
                Ok(Obj::Bool(result))
            }
            BinOp::And | BinOp::Or | BinOp::Pipe | BinOp::TildePipe | BinOp::Dot | BinOp::Eq => {
                unreachable!("handled in eval_binop")
            }
        }
    }

    fn eval_call(&mut self, name: &str, args: &[Instr], at: Cursor) -> Result<Obj, AuraError> {
        if let Some(result) = self.call_builtin(name, args, at)? {
            return Ok(result);
        }
        let func = self
            .environment
            .get(name)
            .ok_or_else(|| AuraError::undefined_identifier(name, Some(at)))?;
        let Obj::Function { name: fname, params, body, captured_env } = func else {
            return Err(AuraError::Type(format!("'{name}' is not callable"), Some(at)));
        };
        if params.len() != args.len() {
            return Err(AuraError::Arity(
                format!("{fname} expects {} argument(s), got {}", params.len(), args.len()),
                Some(at),
            ));
        }
        let evaluated = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
        let call_env = captured_env.call_frame(params.into_iter().zip(evaluated));
        let previous = std::mem::replace(&mut self.environment, call_env);
        let result = self.eval(&body);
        self.environment = previous;
        result
    }

    /// Casting `value` to `klass` (spec section 4.5's generative casting).
    fn generative_cast(&mut self, value: Obj, klass: &Klass, at: Cursor) -> Result<Obj, AuraError> {
        if let Some(result) = coerce_primitive(&value, klass, at) {
            return result;
        }

        self.types.check_resolvable(klass, Some(at))?;
        let schema = self.types.json_schema(klass)?;
        let type_name = match klass {
            Klass::Reference(name) => name.clone(),
            other => other.name(),
        };
        let prompt = format!(
            "Convert the following value to the type `{type_name}`.\n\nValue:\n{}\n\nRespond with JSON only, conforming exactly to this JSON Schema:\n{}",
            value.introspect(),
            serde_json::to_string_pretty(&schema).unwrap_or_default(),
        );

        let first_attempt = self.llm.complete(&prompt).map_err(|e| promote_provider_error(e, at))?;
        let parsed = match serde_json::from_str::<serde_json::Value>(&first_attempt) {
            Ok(json) => json,
            Err(first_err) => {
                let retry_prompt = format!(
                    "{prompt}\n\nYour previous response failed to parse as JSON ({first_err}): {first_attempt}\nRespond again with valid JSON only."
                );
                let second_attempt = self.llm.complete(&retry_prompt).map_err(|e| promote_provider_error(e, at))?;
                serde_json::from_str::<serde_json::Value>(&second_attempt).map_err(|second_err| {
                    AuraError::GenerativeCast(
                        format!("could not parse a JSON response for type `{type_name}` after one retry: {second_err}"),
                        Some(at),
                    )
                })?
            }
        };

        self.types.construct(klass, &parsed, Some(&type_name))
    }
}

/// Integer division rounding toward negative infinity, not `div_euclid`'s
/// always-non-negative remainder (`7i64.div_euclid(-2) == -3`, but floor(7/-2)
/// is -4).
fn floor_div(l: i64, r: i64) -> i64 {
    let q = l / r;
    let rem = l % r;
    if rem != 0 && (rem < 0) != (r < 0) {
        q - 1
    } else {
        q
    }
}

fn as_f64(value: &Obj, at: Cursor) -> Result<f64, AuraError> {
    match value {
        Obj::Int(n) => Ok(*n as f64),
        Obj::Float(n) => Ok(*n),
        other => Err(AuraError::Type(format!("expected a number, found {}", other.type_name()), Some(at))),
    }
}

/// Direct primitive↔primitive coercions that skip the LLM entirely (spec
/// section 6): `Int↔Float` (lossy toward `Int`), `Str↔Bool`, `Str→Int`/
/// `Float` when parseable. Returns `None` when `klass` isn't primitive or
/// the pairing isn't one of these — the caller falls through to a
/// generative cast.
fn coerce_primitive(value: &Obj, klass: &Klass, at: Cursor) -> Option<Result<Obj, AuraError>> {
    Some(match (klass, value) {
        (Klass::Int, Obj::Int(n)) => Ok(Obj::Int(*n)),
        (Klass::Int, Obj::Float(f)) => Ok(Obj::Int(*f as i64)),
        (Klass::Int, Obj::Str(s)) => {
            s.trim().parse::<i64>().map(Obj::Int).map_err(|_| AuraError::Cast(format!("cannot cast '{s}' to Int"), Some(at)))
        }
        (Klass::Float, Obj::Float(f)) => Ok(Obj::Float(*f)),
        (Klass::Float, Obj::Int(n)) => Ok(Obj::Float(*n as f64)),
        (Klass::Float, Obj::Str(s)) => {
            s.trim().parse::<f64>().map(Obj::Float).map_err(|_| AuraError::Cast(format!("cannot cast '{s}' to Float"), Some(at)))
        }
        (Klass::Str, Obj::Str(s)) => Ok(Obj::Str(s.clone())),
        (Klass::Str, Obj::Int(n)) => Ok(Obj::Str(n.to_string())),
        (Klass::Str, Obj::Float(f)) => Ok(Obj::Str(f.to_string())),
        (Klass::Str, Obj::Bool(b)) => Ok(Obj::Str(b.to_string())),
        (Klass::Bool, Obj::Bool(b)) => Ok(Obj::Bool(*b)),
        (Klass::Bool, Obj::Str(s)) => match s.as_str() {
            "true" => Ok(Obj::Bool(true)),
            "false" => Ok(Obj::Bool(false)),
            _ => Err(AuraError::Cast(format!("cannot cast '{s}' to Bool"), Some(at))),
        },
        (Klass::Nihil, Obj::Nihil) => Ok(Obj::Nihil),
        _ => return None,
    })
}

fn promote_provider_error(err: AuraError, at: Cursor) -> AuraError {
    match err {
        AuraError::Provider(msg) => AuraError::Provider(format!("{msg} (at {at})")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::host::testing::RecordingHost;
    use super::*;

    fn test_vm() -> Vm {
        let mut config = Configuration::default();
        config.testing = true;
        Vm::new(config)
    }

    #[test]
    fn arithmetic_with_parens_and_precedence() {
        let mut vm = test_vm();
        assert_eq!(vm.run("(1 + 2) * 3 - 4").unwrap(), Obj::Int(5));
    }

    #[test]
    fn unary_negation_and_float_literal() {
        let mut vm = test_vm();
        assert_eq!(vm.run("-42").unwrap(), Obj::Int(-42));
        assert_eq!(vm.run("3.14").unwrap(), Obj::Float(3.14));
    }

    #[test]
    fn assignment_and_interpolation() {
        let mut vm = test_vm();
        let result = vm.run("x = 5\ny = x + 2\n\"The result is: ${y}\"").unwrap();
        assert_eq!(result, Obj::Str("The result is: 7".to_string()));
    }

    #[test]
    fn say_writes_pretty_value_to_host() {
        let mut config = Configuration::default();
        config.testing = true;
        let mut vm = Vm::with_host(config, Box::new(RecordingHost::default()));
        let result = vm.run("say \"hi\"").unwrap();
        assert_eq!(result, Obj::Nihil);
    }

    #[test]
    fn object_literal_and_field_access() {
        let mut vm = test_vm();
        vm.run("type Point = { x: Int, y: Int }").unwrap();
        let obj = vm.run("{ x: 3, y: 4 }").unwrap();
        assert!(matches!(obj, Obj::ObjectLiteral(_)));
        vm.run("obj = { x: 3, y: 4 }").unwrap();
        assert_eq!(vm.run("obj.x").unwrap(), Obj::Int(3));
    }

    #[test]
    fn missing_field_is_a_name_error() {
        let mut vm = test_vm();
        vm.run("obj = { x: 3, y: 4 }").unwrap();
        let err = vm.run("obj.z").unwrap_err();
        assert!(matches!(err, AuraError::Name(..)));
    }

    #[test]
    fn type_reference_resolves_as_a_value() {
        let mut vm = test_vm();
        vm.run("type Status = 'active' | 'inactive'").unwrap();
        let value = vm.run("Status").unwrap();
        assert!(matches!(value, Obj::Klass(Klass::Union(_))));
    }

    #[test]
    fn division_by_zero_is_a_type_error() {
        let mut vm = test_vm();
        assert!(matches!(vm.run("1 / 0").unwrap_err(), AuraError::Type(..)));
    }

    #[test]
    fn integer_division_floors() {
        let mut vm = test_vm();
        assert_eq!(vm.run("7 / 2").unwrap(), Obj::Int(3));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        let mut vm = test_vm();
        assert_eq!(vm.run("1 + 2.5").unwrap(), Obj::Float(3.5));
    }

    #[test]
    fn user_function_call_and_arity_error() {
        let mut vm = test_vm();
        vm.run("fun add(a, b) a + b end").unwrap();
        assert_eq!(vm.run("add(2, 3)").unwrap(), Obj::Int(5));
        assert!(matches!(vm.run("add(1)").unwrap_err(), AuraError::Arity(..)));
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let mut vm = test_vm();
        vm.run("base = 10\nfun add_base(n) n + base end").unwrap();
        vm.run("base = 999").unwrap();
        // The closure's captured frame is a live `Rc`, so the rebind above
        // is visible: this is the "reference-counted scopes" design, not
        // the "copy bindings at definition time" alternative.
        assert_eq!(vm.run("add_base(1)").unwrap(), Obj::Int(1000));
    }

    #[test]
    fn if_elif_else_chain() {
        let mut vm = test_vm();
        let src = "x = 2\nif x == 1 then\n  \"one\"\nelif x == 2 then\n  \"two\"\nelse\n  \"other\"\nend";
        assert_eq!(vm.run(src).unwrap(), Obj::Str("two".to_string()));
    }

    #[test]
    fn while_loop_accumulates() {
        let mut vm = test_vm();
        let src = "i = 0\ntotal = 0\nwhile i < 5\n  total = total + i\n  i = i + 1\nend";
        assert_eq!(vm.run(src).unwrap(), Obj::Int(10));
    }

    #[test]
    fn cast_str_to_int() {
        let mut vm = test_vm();
        assert_eq!(vm.run("\"42\" as Int").unwrap(), Obj::Int(42));
    }

    #[test]
    fn cast_int_to_str() {
        let mut vm = test_vm();
        assert_eq!(vm.run("42 as Str").unwrap(), Obj::Str("42".to_string()));
    }

    #[test]
    fn cast_unparseable_str_to_int_is_cast_error() {
        let mut vm = test_vm();
        assert!(matches!(vm.run("\"nope\" as Int").unwrap_err(), AuraError::Cast(..)));
    }

    #[test]
    fn subsequent_run_after_runtime_error_still_works() {
        let mut vm = test_vm();
        assert!(vm.run("1 / 0").is_err());
        assert_eq!(vm.run("1 + 1").unwrap(), Obj::Int(2));
    }
}
