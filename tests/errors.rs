//! Spot-checks across the eight `AuraError` kinds from spec section 7,
//! plus the `render`/`Display` surface a host would show to a user.

mod support;

use aura::{AuraError, Cursor, TextDocument};
use support::vm;

#[test]
fn lex_error_on_a_malformed_number() {
    assert!(matches!(aura::run("42abc").unwrap_err(), AuraError::Lex(..)));
}

#[test]
fn parse_error_on_an_unclosed_if() {
    assert!(matches!(aura::run("if true then 1").unwrap_err(), AuraError::Parse(..)));
}

#[test]
fn name_error_on_an_undefined_identifier() {
    assert!(matches!(aura::run("does_not_exist").unwrap_err(), AuraError::Name(..)));
}

#[test]
fn arity_error_on_a_wrong_argument_count() {
    let mut vm = vm();
    vm.run("fun one(a) a end").unwrap();
    assert!(matches!(vm.run("one(1, 2)").unwrap_err(), AuraError::Arity(..)));
}

#[test]
fn cast_error_on_an_unparseable_primitive_coercion() {
    assert!(matches!(aura::run("'not a number' as Int").unwrap_err(), AuraError::Cast(..)));
}

#[test]
fn provider_error_when_no_transport_is_configured() {
    let mut vm = vm();
    assert!(matches!(vm.run("chat 'hi'").unwrap_err(), AuraError::Provider(..)));
}

#[test]
fn import_error_on_a_missing_file() {
    let mut vm = vm();
    assert!(matches!(vm.run("import('nope.aura')").unwrap_err(), AuraError::Import(..)));
}

#[test]
fn every_error_carries_a_cursor_and_renders_against_the_source() {
    let source = "x = 1\ny = x +";
    let err = aura::run(source).unwrap_err();
    let cursor = err.cursor().expect("lex/parse errors should carry a cursor");
    assert!(cursor > Cursor { line: 0, column: 0 });
    let doc = TextDocument::new(source);
    let rendered = err.render(&doc);
    assert!(rendered.contains('^'), "rendered error should include a caret: {rendered}");
}
