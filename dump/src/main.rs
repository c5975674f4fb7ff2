use graph::{CallGraph, Expr, Registry, Signature, E};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct CliOpt {
    #[structopt(parse(from_os_str))]
    source: PathBuf,

    #[structopt(short = "o", default_value = "-", parse(from_os_str))]
    output: PathBuf,
}

fn main() {
    env_logger::init();

    let opt = CliOpt::from_args();
    log::info!("source: {:?}", opt.source);
    log::info!("output: {:?}", opt.output);

    let source = match std::fs::read_to_string(&opt.source) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("[error] cannot read {:?}: {}", opt.source, err);
            std::process::exit(1);
        }
    };
    let mut registry = Registry::new();
    if let Err(err) = graph::load_program(&mut registry, &source) {
        eprintln!("[error] {}", err);
        std::process::exit(1);
    }

    let text = dump(&registry);
    if opt.output.to_str() == Some("-") {
        print!("{}", text);
    } else if let Err(err) = std::fs::write(&opt.output, text) {
        eprintln!("[error] cannot write {:?}: {}", opt.output, err);
        std::process::exit(1);
    }
}

/// Prints every function of the registry, bodies in pre-order one node per line.
pub fn dump(registry: &Registry) -> String {
    let graph = CallGraph::new(registry);
    let recursive = graph.recursive();

    let mut buf = String::new();
    for (name, entry) in registry.functions() {
        if !buf.is_empty() {
            buf.push('\n');
        }

        let def = match entry.definition() {
            Some(def) => def,
            None => {
                buf.push_str(&format!("decl {}{}\n", name, entry.signature()));
                continue;
            }
        };

        buf.push_str(&format!("fn {}{}", name, def.signature));
        if recursive.contains(&name) {
            buf.push_str(" ; recursive");
        }
        buf.push('\n');

        let mut index = 0;
        def.body.walk(&mut |expr, depth| {
            buf.push_str(&format!(
                "  {:04}: {}{}\n",
                index,
                "  ".repeat(depth),
                node(expr, &def.signature)
            ));
            index += 1;
        });
    }

    let unresolved: Vec<_> = graph.unresolved().into_iter().collect();
    if !unresolved.is_empty() {
        buf.push_str(&format!("\n; unresolved: {}\n", unresolved.join(", ")));
    }
    buf
}

fn node(expr: &Expr, signature: &Signature) -> String {
    let kind = match &expr.e {
        E::Constant(value) => format!("const {}", value),
        E::Parameter(index) => match signature.params().get(*index) {
            Some(param) => format!("param {}", param.name),
            None => format!("param #{}", index),
        },
        E::Call { target, .. } => format!("call {}", target),
        E::Conditional { .. } => "cond".to_owned(),
        E::Primitive { op, .. } => op.to_string(),
    };
    let ty = expr.ty.map_or_else(|| "?".to_owned(), |ty| ty.to_string());

    match &expr.placement {
        Some(tag) => format!("{} : {} @ {}", kind, ty, tag),
        None => format!("{} : {}", kind, ty),
    }
}
