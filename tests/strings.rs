//! String literals: simple, interpolated and generative forms, and the
//! `+` operator's string-concatenation coercion.

mod support;

use aura::{AuraError, Obj};
use support::{vm, vm_with_transport};

#[test]
fn simple_quoted_literal() {
    assert_eq!(aura::run("'hello world'").unwrap(), Obj::Str("hello world".to_string()));
}

#[test]
fn double_quoted_literal_with_no_interpolation() {
    assert_eq!(aura::run("\"hello\"").unwrap(), Obj::Str("hello".to_string()));
}

#[test]
fn interpolation_embeds_an_expression() {
    let mut vm = vm();
    vm.run("name = \"world\"").unwrap();
    assert_eq!(vm.run("\"Hello ${name}!\"").unwrap(), Obj::Str("Hello world!".to_string()));
}

#[test]
fn interpolation_with_object_literal_brace_disambiguation() {
    let mut vm = vm();
    let value = vm.run(r#""${ { x: 1 }.x }""#).unwrap();
    assert_eq!(value, Obj::Str("1".to_string()));
}

#[test]
fn plus_concatenates_via_pretty_rendering() {
    assert_eq!(aura::run("\"count: \" + 5").unwrap(), Obj::Str("count: 5".to_string()));
}

#[test]
fn plus_concatenates_a_raw_string_literal_with_a_number() {
    assert_eq!(aura::run("'count: ' + 5").unwrap(), Obj::Str("count: 5".to_string()));
    assert_eq!(aura::run("5 + 'th'").unwrap(), Obj::Str("5th".to_string()));
}

#[test]
fn generative_literal_without_a_transport_is_a_provider_error() {
    let mut vm = vm();
    assert!(matches!(vm.run(r#"""""Say hi briefly""""#).unwrap_err(), AuraError::Provider(..)));
}

#[test]
fn generative_literal_with_a_scripted_transport_returns_the_reply() {
    let mut vm = vm_with_transport("hello there");
    assert_eq!(vm.run(r#"""""Say hi briefly""""#).unwrap(), Obj::Str("hello there".to_string()));
}

#[test]
fn unterminated_string_is_a_lex_error() {
    assert!(matches!(aura::run("\"unterminated").unwrap_err(), AuraError::Lex(..)));
}
