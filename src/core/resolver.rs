//! # Dependency resolver.
//!
//! Depth-first traversal of a component's dependencies with three-color marking:
//!
//! ```text
//! visit(n):
//!   Visited   → done
//!   Visiting  → CyclicDependency(path from n back to n)
//!   unknown n → NotRegistered(n)
//!   otherwise → mark Visiting, visit each dependency, mark Visited, emit n
//! ```
//!
//! The emitted post-order is the dependency closure, dependencies first.
//! Resolution never invokes a loader, so nothing inside a cycle ever runs.

use std::collections::HashMap;

use crate::error::LoadError;

/// Read access to dependency edges.
pub(crate) trait DependencyGraph {
    /// Dependencies of `name`, or `None` if `name` is unknown.
    fn dependencies(&self, name: &str) -> Option<&[String]>;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

struct Walk<'g> {
    marks: HashMap<&'g str, Mark>,
    path: Vec<&'g str>,
    order: Vec<String>,
}

/// Returns the transitive dependencies of `target` (excluding `target`),
/// each listed after its own dependencies.
pub(crate) fn resolve<'g, G>(graph: &'g G, target: &'g str) -> Result<Vec<String>, LoadError>
where
    G: DependencyGraph + ?Sized,
{
    let mut walk = Walk {
        marks: HashMap::new(),
        path: Vec::new(),
        order: Vec::new(),
    };
    visit(graph, target, &mut walk)?;
    walk.order.pop();
    Ok(walk.order)
}

fn visit<'g, G>(graph: &'g G, name: &'g str, walk: &mut Walk<'g>) -> Result<(), LoadError>
where
    G: DependencyGraph + ?Sized,
{
    match walk.marks.get(name) {
        Some(Mark::Visited) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = walk.path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<String> = walk.path.iter().skip(start).map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Err(LoadError::CyclicDependency { cycle });
        }
        None => {}
    }

    let deps = graph
        .dependencies(name)
        .ok_or_else(|| LoadError::NotRegistered {
            name: name.to_string(),
        })?;

    walk.marks.insert(name, Mark::Visiting);
    walk.path.push(name);
    for dep in deps {
        visit(graph, dep.as_str(), walk)?;
    }
    walk.path.pop();
    walk.marks.insert(name, Mark::Visited);
    walk.order.push(name.to_string());
    Ok(())
}
