//! Tuple packing and projection, checked by running the emitted code.

mod common;

use common::{eval, Value};
use credo_codegen::{Instr, TupleCache, TupleError, MAX_TUPLE_ARITY};
use pretty_assertions::assert_eq;

#[test]
fn test_projection_after_create_yields_each_element() {
    for arity in 1..=MAX_TUPLE_ARITY {
        for index in 0..arity {
            let mut cache = TupleCache::new();
            let values: Vec<i64> = (0..arity as i64).map(|v| v * 10 + 7).collect();

            let mut code: Vec<Instr> = values.iter().map(|v| Instr::PushInt(*v)).collect();
            cache.emit_create(arity, &mut code).unwrap();
            cache.emit_projection(arity, index, &mut code).unwrap();

            let stack = eval(&code, cache.descriptors()).unwrap();
            assert_eq!(
                stack,
                vec![Value::Int(values[index])],
                "arity {} index {}",
                arity,
                index
            );
        }
    }
}

#[test]
fn test_create_keeps_argument_order() {
    let mut cache = TupleCache::new();
    let mut code = vec![Instr::PushInt(1), Instr::PushInt(2), Instr::PushInt(3)];
    cache.emit_create(3, &mut code).unwrap();

    let stack = eval(&code, cache.descriptors()).unwrap();
    assert_eq!(stack, vec![Value::Tuple(vec![1, 2, 3])]);
}

#[test]
fn test_create_consumes_only_its_arity() {
    let mut cache = TupleCache::new();
    let mut code = vec![Instr::PushInt(9), Instr::PushInt(1), Instr::PushInt(2)];
    cache.emit_create(2, &mut code).unwrap();

    let stack = eval(&code, cache.descriptors()).unwrap();
    assert_eq!(stack, vec![Value::Int(9), Value::Tuple(vec![1, 2])]);
}

#[test]
fn test_arity_limits() {
    let mut cache = TupleCache::new();
    let mut code = Vec::new();

    assert_eq!(
        cache.emit_create(0, &mut code),
        Err(TupleError::UnsupportedArity { arity: 0 })
    );
    assert_eq!(
        cache.emit_create(MAX_TUPLE_ARITY + 1, &mut code),
        Err(TupleError::UnsupportedArity { arity: 9 })
    );
    assert!(code.is_empty());
    assert!(cache.describe(MAX_TUPLE_ARITY).is_ok());
}
