//! Dependency order of code libraries

use std::collections::HashMap;

use crate::error::{CliError, CliResult};
use crate::models::Library;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Order `nodes` so that every node comes after its dependencies.
///
/// Each node is `(name, dependencies)`. Dependencies missing from `nodes`
/// are assumed to exist remotely and are skipped. A cycle is an error.
pub fn postorder<'a>(nodes: &[(&'a str, Vec<&'a str>)]) -> CliResult<Vec<&'a str>> {
    let edges: HashMap<&str, &[&str]> = nodes
        .iter()
        .map(|(name, deps)| (*name, deps.as_slice()))
        .collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(nodes.len());
    let mut path = Vec::new();

    for (name, _) in nodes {
        visit(*name, &edges, &mut marks, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    edges: &HashMap<&'a str, &[&'a str]>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<&'a str>,
) -> CliResult<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<&str> = path[start..].to_vec();
            cycle.push(name);
            return Err(CliError::DataIntegrity(format!(
                "library dependency cycle: {}",
                cycle.join(" -> ")
            )));
        }
        None => {}
    }

    let Some(deps) = edges.get(name) else {
        return Ok(());
    };

    marks.insert(name, Mark::Visiting);
    path.push(name);
    for dep in deps.iter() {
        visit(*dep, edges, marks, path, order)?;
    }
    path.pop();
    marks.insert(name, Mark::Done);
    order.push(name);
    Ok(())
}

/// Libraries in dependency postorder.
pub fn library_order<'a>(libraries: &[&'a Library]) -> CliResult<Vec<&'a Library>> {
    let nodes: Vec<(&str, Vec<&str>)> = libraries
        .iter()
        .map(|lib| (lib.name.as_str(), lib.dependency_names()))
        .collect();
    let by_name: HashMap<&str, &'a Library> =
        libraries.iter().map(|lib| (lib.name.as_str(), *lib)).collect();

    Ok(postorder(&nodes)?
        .into_iter()
        .filter_map(|name| by_name.get(name).copied())
        .collect())
}
