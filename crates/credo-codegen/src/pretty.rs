//! Textual listing of a compiled agent.

use std::fmt::Write;

use crate::instr::*;

/// Pretty print a compiled agent
pub fn pretty_print(agent: &AgentType) -> String {
    let mut out = String::new();
    let mut printer = PrettyPrinter::new(&mut out);
    printer.print_agent(agent);
    out
}

struct PrettyPrinter<'a> {
    out: &'a mut String,
    indent: usize,
}

impl<'a> PrettyPrinter<'a> {
    fn new(out: &'a mut String) -> Self {
        Self { out, indent: 0 }
    }

    fn indent(&mut self) {
        self.indent += 2;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(2);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
    }

    fn writeln(&mut self, s: &str) {
        self.write_indent();
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn print_agent(&mut self, agent: &AgentType) {
        let _ = writeln!(self.out, "agent {}({}) {{", agent.name, params(&agent.params));
        self.indent();

        for tuple in &agent.tuples {
            let elements = vec!["int"; tuple.arity as usize].join(", ");
            self.writeln(&format!("tuple {} = ({})", tuple.id, elements));
        }

        for (i, field) in agent.fields.iter().enumerate() {
            let ty = match field.tuple {
                Some(id) => id.to_string(),
                None => format!("<unsupported arity {}>", field.arity),
            };
            self.writeln(&format!("field {} {}: {}", FieldId(i as u32), field.name, ty));
        }

        self.out.push('\n');
        self.print_method(None, &agent.constructor);

        for (i, method) in agent.methods.iter().enumerate() {
            self.out.push('\n');
            self.print_method(Some(MethodId(i as u32)), method);
        }

        self.dedent();
        self.writeln("}");
    }

    fn print_method(&mut self, id: Option<MethodId>, method: &MethodDef) {
        let header = match id {
            Some(id) => format!(
                "{} {} {}({}) {{",
                method.kind,
                id,
                method.name,
                params(&method.params)
            ),
            None => format!("{}({}) {{", method.kind, params(&method.params)),
        };
        self.writeln(&header);
        self.indent();

        for (i, local) in method.locals.iter().enumerate() {
            self.writeln(&format!("local {} {}", LocalId(i as u32), local));
        }

        for (pc, instr) in method.code.iter().enumerate() {
            self.writeln(&format!("{:04}: {}", pc, instr));
        }

        self.dedent();
        self.writeln("}");
    }
}

fn params(params: &[ParamDef]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smol_str::SmolStr;

    #[test]
    fn test_listing() {
        let int = SmolStr::new("int");
        let agent = AgentType {
            name: "Counter".into(),
            params: vec![ParamDef {
                name: "start".into(),
                ty: int.clone(),
            }],
            fields: vec![FieldDef {
                name: "count".into(),
                arity: 1,
                tuple: Some(TupleId(0)),
            }],
            tuples: vec![TupleDesc {
                id: TupleId(0),
                arity: 1,
            }],
            constructor: MethodDef {
                name: "Counter".into(),
                kind: MethodKind::Constructor,
                params: vec![ParamDef {
                    name: "start".into(),
                    ty: int.clone(),
                }],
                locals: Vec::new(),
                code: vec![
                    Instr::LoadArg(1),
                    Instr::MakeTuple(TupleId(0)),
                    Instr::StoreField(FieldId(0)),
                    Instr::Return,
                ],
            },
            methods: vec![MethodDef {
                name: "reset".into(),
                kind: MethodKind::Handler,
                params: Vec::new(),
                locals: vec!["n".into()],
                code: vec![Instr::PushInt(0), Instr::StoreLocal(LocalId(0)), Instr::Return],
            }],
        };

        let expected = "\
agent Counter(start: int) {
  tuple t0 = (int)
  field f0 count: t0

  constructor(start: int) {
    0000: ldarg 1
    0001: mktuple t0
    0002: stfld f0
    0003: ret
  }

  handler m0 reset() {
    local l0 n
    0000: push 0
    0001: stloc l0
    0002: ret
  }
}
";
        assert_eq!(pretty_print(&agent), expected);
    }
}
