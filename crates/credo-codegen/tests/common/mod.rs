//! A tiny interpreter for emitted code, so tests can check behaviour and
//! not only instruction shapes.

#![allow(dead_code)]

use credo_codegen::{AgentType, Instr, MethodDef, TupleDesc};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unset,
    Receiver,
    Int(i64),
    Tuple(Vec<i64>),
}

/// Run a bare instruction sequence with no receiver, arguments or fields
/// and return whatever is left on the stack.
pub fn eval(code: &[Instr], tuples: &[TupleDesc]) -> Result<Vec<Value>, String> {
    let mut fields = Vec::new();
    let mut frame = Frame::new(vec![Value::Receiver], 0);
    frame.run(code, tuples, &mut fields, &[])?;
    Ok(frame.stack)
}

/// A live agent instance
pub struct Machine<'a> {
    agent: &'a AgentType,
    fields: Vec<Value>,
}

impl<'a> Machine<'a> {
    pub fn construct(agent: &'a AgentType, args: &[i64]) -> Result<Self, String> {
        let mut machine = Machine {
            agent,
            fields: vec![Value::Unset; agent.fields.len()],
        };
        machine.invoke(&agent.constructor, args)?;
        Ok(machine)
    }

    pub fn call(&mut self, name: &str, args: &[i64]) -> Result<(), String> {
        let (_, method) = self
            .agent
            .method(name)
            .ok_or_else(|| format!("no method `{}`", name))?;
        self.invoke(method, args)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        let (id, _) = self.agent.field(name)?;
        self.fields.get(id.0 as usize)
    }

    fn invoke(&mut self, method: &MethodDef, args: &[i64]) -> Result<(), String> {
        let mut slots = vec![Value::Receiver];
        slots.extend(args.iter().map(|v| Value::Int(*v)));
        run_method(self.agent, method, slots, &mut self.fields)
    }
}

fn run_method(
    agent: &AgentType,
    method: &MethodDef,
    args: Vec<Value>,
    fields: &mut Vec<Value>,
) -> Result<(), String> {
    if args.len() != method.argc() {
        return Err(format!(
            "`{}` expects {} argument slots, got {}",
            method.name,
            method.argc(),
            args.len()
        ));
    }
    let mut frame = Frame::new(args, method.locals.len());
    frame.run(&method.code, &agent.tuples, fields, &agent.methods)?;
    if !frame.stack.is_empty() {
        return Err(format!("`{}` left {:?} on the stack", method.name, frame.stack));
    }
    Ok(())
}

struct Frame {
    args: Vec<Value>,
    locals: Vec<Value>,
    stack: Vec<Value>,
}

impl Frame {
    fn new(args: Vec<Value>, locals: usize) -> Self {
        Self {
            args,
            locals: vec![Value::Unset; locals],
            stack: Vec::new(),
        }
    }

    fn pop(&mut self) -> Result<Value, String> {
        self.stack.pop().ok_or_else(|| "stack underflow".to_string())
    }

    fn pop_int(&mut self) -> Result<i64, String> {
        match self.pop()? {
            Value::Int(v) => Ok(v),
            other => Err(format!("expected an integer, found {:?}", other)),
        }
    }

    fn run(
        &mut self,
        code: &[Instr],
        tuples: &[TupleDesc],
        fields: &mut Vec<Value>,
        methods: &[MethodDef],
    ) -> Result<(), String> {
        for instr in code {
            match *instr {
                Instr::LoadArg(n) => {
                    let value = self.args.get(n as usize).cloned().ok_or("bad argument slot")?;
                    self.stack.push(value);
                }
                Instr::StoreArg(n) => {
                    let value = self.pop()?;
                    *self.args.get_mut(n as usize).ok_or("bad argument slot")? = value;
                }
                Instr::LoadLocal(l) => {
                    let value = self.locals.get(l.0 as usize).cloned().ok_or("bad local slot")?;
                    self.stack.push(value);
                }
                Instr::StoreLocal(l) => {
                    let value = self.pop()?;
                    *self.locals.get_mut(l.0 as usize).ok_or("bad local slot")? = value;
                }
                Instr::LoadField(f) => {
                    let value = fields.get(f.0 as usize).cloned().ok_or("bad field")?;
                    self.stack.push(value);
                }
                Instr::StoreField(f) => {
                    let value = self.pop()?;
                    *fields.get_mut(f.0 as usize).ok_or("bad field")? = value;
                }
                Instr::PushInt(v) => self.stack.push(Value::Int(v)),
                Instr::Add | Instr::Sub | Instr::Mul | Instr::Div => {
                    let right = self.pop_int()?;
                    let left = self.pop_int()?;
                    let result = match instr {
                        Instr::Add => left.wrapping_add(right),
                        Instr::Sub => left.wrapping_sub(right),
                        Instr::Mul => left.wrapping_mul(right),
                        _ => left.checked_div(right).ok_or("division by zero")?,
                    };
                    self.stack.push(Value::Int(result));
                }
                Instr::MakeTuple(t) => {
                    let arity = tuples.get(t.0 as usize).ok_or("bad tuple")?.arity as usize;
                    let mut elements = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        elements.push(self.pop_int()?);
                    }
                    elements.reverse();
                    self.stack.push(Value::Tuple(elements));
                }
                Instr::TupleGet(t, i) => {
                    let arity = tuples.get(t.0 as usize).ok_or("bad tuple")?.arity as usize;
                    match self.pop()? {
                        Value::Tuple(elements) if elements.len() == arity => {
                            let value = *elements.get(i as usize).ok_or("bad tuple index")?;
                            self.stack.push(Value::Int(value));
                        }
                        other => return Err(format!("expected a tuple, found {:?}", other)),
                    }
                }
                Instr::Call { method, argc } => {
                    let mut args = Vec::with_capacity(argc as usize);
                    for _ in 0..argc {
                        args.push(self.pop()?);
                    }
                    args.reverse();
                    if args.first() != Some(&Value::Receiver) {
                        return Err("call without receiver".to_string());
                    }
                    let callee = methods.get(method.0 as usize).ok_or("bad method")?;
                    let mut frame = Frame::new(args, callee.locals.len());
                    frame.run(&callee.code, tuples, fields, methods)?;
                }
                Instr::Return => return Ok(()),
            }
        }
        Ok(())
    }
}
