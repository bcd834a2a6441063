//! The builtin surface from spec section 6: `say`, `ask`, `chat`,
//! `inspect`, `typeof`, `rand`, `time`, `see_url`, `import`, `load_yaml`.
//!
//! Builtins are dispatched by name before falling back to a user-defined
//! function (see `Vm::eval_call`); `call_builtin` returns `Ok(None)` for
//! any name it doesn't recognise so the caller can try the environment.

use rand::Rng;

use crate::clock::rfc3339_now;
use crate::cursor::Cursor;
use crate::error::AuraError;
use crate::translator::Instr;
use crate::value::Obj;

use super::{promote_provider_error, Vm};

impl Vm {
    pub(super) fn call_builtin(
        &mut self,
        name: &str,
        args: &[Instr],
        at: Cursor,
    ) -> Result<Option<Obj>, AuraError> {
        match name {
            "say" => {
                self.expect_arity(name, args, 1, at)?;
                let value = self.eval(&args[0])?;
                self.host.write_line(&value.pretty());
                Ok(Some(Obj::Nihil))
            }
            "ask" => {
                self.expect_arity(name, args, 1, at)?;
                let prompt = self.eval(&args[0])?;
                self.host.write_line(&prompt.pretty());
                let line = self
                    .host
                    .read_line()
                    .map_err(|e| AuraError::Type(format!("ask: {e}"), Some(at)))?;
                Ok(Some(Obj::Str(line)))
            }
            "chat" => {
                self.expect_arity(name, args, 1, at)?;
                let prompt = self.eval(&args[0])?.pretty();
                let response = self.llm.complete(&prompt).map_err(|e| promote_provider_error(e, at))?;
                Ok(Some(Obj::Str(response)))
            }
            "inspect" => {
                self.expect_arity(name, args, 1, at)?;
                let value = self.eval(&args[0])?;
                Ok(Some(Obj::Str(value.introspect())))
            }
            "typeof" => {
                self.expect_arity(name, args, 1, at)?;
                let value = self.eval(&args[0])?;
                Ok(Some(Obj::Str(value.klass().name())))
            }
            "rand" => {
                self.expect_arity(name, args, 1, at)?;
                let bound = self.eval_int(&args[0])?;
                if bound <= 0 {
                    return Err(AuraError::Type(
                        format!("rand requires a positive bound, got {bound}"),
                        Some(at),
                    ));
                }
                let value = rand::thread_rng().gen_range(0..bound);
                Ok(Some(Obj::Int(value)))
            }
            "time" => {
                self.expect_arity(name, args, 1, at)?;
                let spec = self.eval_str(&args[0], at)?;
                if spec == "now" {
                    Ok(Some(Obj::Time(rfc3339_now())))
                } else {
                    Ok(Some(Obj::Time(spec)))
                }
            }
            "see_url" => {
                self.expect_arity(name, args, 1, at)?;
                let url = self.eval_str(&args[0], at)?;
                let body = self
                    .host
                    .fetch_url(&url)
                    .map_err(|e| AuraError::Provider(format!("NetworkError: {e}")))?;
                Ok(Some(Obj::Str(body)))
            }
            "import" => {
                self.expect_arity(name, args, 1, at)?;
                let path = self.eval_str(&args[0], at)?;
                Ok(Some(self.import_file(&path)?))
            }
            "load_yaml" => {
                self.expect_arity(name, args, 1, at)?;
                let path = self.eval_str(&args[0], at)?;
                Ok(Some(self.load_yaml_file(&path)?))
            }
            _ => Ok(None),
        }
    }

    fn expect_arity(&self, name: &str, args: &[Instr], expected: usize, at: Cursor) -> Result<(), AuraError> {
        if args.len() != expected {
            return Err(AuraError::Arity(
                format!("{name} expects {expected} argument(s), got {}", args.len()),
                Some(at),
            ));
        }
        Ok(())
    }

    fn eval_str(&mut self, instr: &Instr, at: Cursor) -> Result<String, AuraError> {
        match self.eval(instr)? {
            Obj::Str(s) => Ok(s),
            other => Err(AuraError::Type(format!("expected Str, found {}", other.type_name()), Some(at))),
        }
    }

    /// `import(path)`: read and evaluate a file against this same VM
    /// (shared environment and type registry), returning its final
    /// expression's value. Relative paths resolve against the importing
    /// file's directory, tracked via `base_dir`; `importing` guards
    /// against a file importing itself, directly or transitively.
    fn import_file(&mut self, path: &str) -> Result<Obj, AuraError> {
        let resolved = self.base_dir.join(path);
        if self.importing.contains(&resolved) {
            return Err(AuraError::Import(format!("circular import of '{}'", resolved.display())));
        }
        let contents = std::fs::read_to_string(&resolved)
            .map_err(|e| AuraError::Import(format!("could not import '{}': {e}", resolved.display())))?;

        self.importing.insert(resolved.clone());
        let previous_base_dir = self.base_dir.clone();
        if let Some(parent) = resolved.parent() {
            self.base_dir = parent.to_path_buf();
        }

        let result = self.run(&contents);

        self.base_dir = previous_base_dir;
        self.importing.remove(&resolved);
        result
    }

    /// `load_yaml(path)`: parse a YAML file into a `Dict`-shaped
    /// `ObjectLiteral` (or whatever shape the document's top level is —
    /// `Obj::from_json` handles all of them, YAML's data model being a
    /// superset of JSON's).
    fn load_yaml_file(&self, path: &str) -> Result<Obj, AuraError> {
        let resolved = self.base_dir.join(path);
        let contents = std::fs::read_to_string(&resolved)
            .map_err(|e| AuraError::Import(format!("could not read '{}': {e}", resolved.display())))?;
        let json: serde_json::Value = serde_yaml::from_str(&contents)
            .map_err(|e| AuraError::Import(format!("could not parse YAML '{}': {e}", resolved.display())))?;
        Ok(Obj::from_json(&json))
    }
}
