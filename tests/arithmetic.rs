//! Arithmetic: integer/float promotion, precedence, division semantics.

mod support;

use aura::{AuraError, Obj};
use support::vm;

#[test]
fn precedence_and_parens() {
    assert_eq!(aura::run("(1 + 2) * 3 - 4").unwrap(), Obj::Int(5));
}

#[test]
fn power_is_right_associative() {
    assert_eq!(aura::run("2 ** 3 ** 2").unwrap(), Obj::Int(512));
}

#[test]
fn integer_division_floors_towards_negative_infinity() {
    assert_eq!(aura::run("7 / 2").unwrap(), Obj::Int(3));
    assert_eq!(aura::run("-7 / 2").unwrap(), Obj::Int(-4));
    assert_eq!(aura::run("7 / -2").unwrap(), Obj::Int(-4));
    assert_eq!(aura::run("-7 / -2").unwrap(), Obj::Int(3));
}

#[test]
fn mixed_int_float_promotes_to_float() {
    assert_eq!(aura::run("1 + 2.5").unwrap(), Obj::Float(3.5));
    assert_eq!(aura::run("5 / 2.0").unwrap(), Obj::Float(2.5));
}

#[test]
fn division_by_zero_is_a_type_error() {
    assert!(matches!(aura::run("1 / 0").unwrap_err(), AuraError::Type(..)));
}

#[test]
fn unary_negation() {
    assert_eq!(aura::run("-42").unwrap(), Obj::Int(-42));
    assert_eq!(aura::run("-(1 + 1)").unwrap(), Obj::Int(-2));
}

#[test]
fn assignment_persists_across_statements_in_one_run() {
    let mut vm = vm();
    let result = vm.run("x = 5\ny = x * x\ny + 1").unwrap();
    assert_eq!(result, Obj::Int(26));
}

#[test]
fn int_overflow_is_a_type_error_not_a_panic() {
    let src = format!("{} + 1", i64::MAX);
    assert!(matches!(aura::run(&src).unwrap_err(), AuraError::Type(..)));
}
