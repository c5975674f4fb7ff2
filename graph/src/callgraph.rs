use crate::expr::{Expr, E};
use crate::placement::PlacementTag;
use crate::registry::{FunctionDefinition, Registry};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct CallSite<'a> {
    pub caller: &'a str,
    pub callee: &'a str,
    pub arity: usize,
    /// The call's own tag, or the nearest tag among its enclosing expressions.
    pub placement: Option<&'a PlacementTag>,
}

/// Collects every call site of a definition, in pre-order.
pub fn call_sites(def: &FunctionDefinition) -> Vec<CallSite<'_>> {
    let mut sites = Vec::new();
    collect(&def.name, &def.body, None, &mut sites);
    sites
}

fn collect<'a>(
    caller: &'a str,
    expr: &'a Expr,
    inherited: Option<&'a PlacementTag>,
    sites: &mut Vec<CallSite<'a>>,
) {
    let placement = expr.placement.as_ref().or(inherited);
    if let E::Call { target, args } = &expr.e {
        sites.push(CallSite {
            caller,
            callee: target,
            arity: args.len(),
            placement,
        });
    }
    for child in expr.children() {
        collect(caller, child, placement, sites);
    }
}

/// Caller → callee edges of every defined function.
#[derive(Debug, Default)]
pub struct CallGraph<'a> {
    graph: DiGraph<&'a str, ()>,
    indices: BTreeMap<&'a str, NodeIndex>,
    defined: BTreeSet<&'a str>,
}

impl<'a> CallGraph<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        let mut call_graph = Self::default();
        for (name, entry) in registry.functions() {
            if let Some(def) = entry.definition() {
                call_graph.defined.insert(name);
                let caller = call_graph.add_node(name);
                for site in call_sites(def) {
                    let callee = call_graph.add_node(site.callee);
                    call_graph.graph.update_edge(caller, callee, ());
                }
            }
        }
        call_graph
    }

    fn add_node(&mut self, name: &'a str) -> NodeIndex {
        if let Some(&index) = self.indices.get(name) {
            return index;
        }
        let index = self.graph.add_node(name);
        self.indices.insert(name, index);
        index
    }

    /// Direct callees of `name`, in name order.
    pub fn callees(&self, name: &str) -> BTreeSet<&'a str> {
        match self.indices.get(name) {
            Some(&index) => self.graph.neighbors(index).map(|n| self.graph[n]).collect(),
            None => BTreeSet::new(),
        }
    }

    /// Callees that have no definition in the graph.
    pub fn unresolved(&self) -> BTreeSet<&'a str> {
        self.indices
            .keys()
            .copied()
            .filter(|name| !self.defined.contains(name))
            .collect()
    }

    /// Functions that can reach themselves, directly or through other functions.
    pub fn recursive(&self) -> BTreeSet<&'a str> {
        let mut found = BTreeSet::new();
        for component in tarjan_scc(&self.graph) {
            let cyclic = match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            };
            if cyclic {
                found.extend(component.iter().map(|&index| self.graph[index]));
            }
        }
        found
    }
}
