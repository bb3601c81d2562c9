//! Planning gate (§4.13.2): limits are enforced before a DAG runs at all.
//! A DAG that fails the gate never executes a single node.

use std::collections::{HashMap, HashSet};

use conduit_plan::{DagNode, PipelineDag, PipelineLimits};

/// Why a DAG was rejected before execution started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateFailure {
    /// `nodes.len() > limits.max_nodes`.
    TooManyNodes {
        /// The number of nodes in the rejected DAG.
        count: usize,
        /// The configured maximum node count.
        max: u32,
    },
    /// A `depends_on` id does not resolve to a node in the DAG.
    DslValidationFailed {
        /// The id of the node whose DSL failed validation.
        node_id: String,
        /// Why validation failed.
        detail: String,
    },
    /// A `for_each`'s `item_node_ids` references a node outside the DAG.
    DanglingItemNodeId {
        /// The id of the `for_each` node with the dangling reference.
        node_id: String,
        /// The missing node id it referenced.
        missing: String,
    },
    /// The DAG's `depends_on` edges form a cycle.
    Cycle,
}

impl GateFailure {
    /// The canonical pipeline error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            GateFailure::TooManyNodes { .. } => "DSL_VALIDATION_FAILED",
            GateFailure::DslValidationFailed { .. } => "DSL_VALIDATION_FAILED",
            GateFailure::DanglingItemNodeId { .. } => "DSL_REF_NOT_FOUND",
            GateFailure::Cycle => "DSL_VALIDATION_FAILED",
        }
    }
}

/// Check `dag` against `limits` and internal structural consistency.
/// Every check runs (none short-circuit on a DAG-wide basis) so the
/// caller always gets the full set of problems rather than just the
/// first one found — but this function returns the first, in a fixed
/// order, since the executor never attempts a partially-valid DAG.
pub fn check_planning_gate(dag: &PipelineDag, limits: &PipelineLimits) -> Result<(), GateFailure> {
    if dag.nodes.len() as u32 > limits.max_nodes {
        return Err(GateFailure::TooManyNodes { count: dag.nodes.len(), max: limits.max_nodes });
    }

    let ids: HashSet<&str> = dag.nodes.iter().map(DagNode::id).collect();

    for node in &dag.nodes {
        for dep in node.depends_on() {
            if !ids.contains(dep.as_str()) {
                return Err(GateFailure::DslValidationFailed {
                    node_id: node.id().to_string(),
                    detail: format!("depends_on_not_found:{dep}"),
                });
            }
        }
        if let DagNode::ForEach(for_each) = node {
            for child in &for_each.item_node_ids {
                if !ids.contains(child.as_str()) {
                    return Err(GateFailure::DanglingItemNodeId { node_id: node.id().to_string(), missing: child.clone() });
                }
            }
        }
    }

    if has_cycle(dag) {
        return Err(GateFailure::Cycle);
    }

    Ok(())
}

fn has_cycle(dag: &PipelineDag) -> bool {
    let index_of: HashMap<&str, usize> = dag.nodes.iter().enumerate().map(|(i, n)| (n.id(), i)).collect();
    let mut in_degree = vec![0usize; dag.nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); dag.nodes.len()];
    for (i, node) in dag.nodes.iter().enumerate() {
        for dep in node.depends_on() {
            let Some(&dep_idx) = index_of.get(dep.as_str()) else { continue };
            in_degree[i] += 1;
            dependents[dep_idx].push(i);
        }
    }
    let mut queue: Vec<usize> = (0..dag.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut visited = 0;
    let mut cursor = 0;
    while cursor < queue.len() {
        let current = queue[cursor];
        cursor += 1;
        visited += 1;
        for &dependent in &dependents[current] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push(dependent);
            }
        }
    }
    visited != dag.nodes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_plan::{ForEachNode, SkillNode, VerifyNode};
    use serde_json::Value;

    fn skill(id: &str, depends_on: &[&str]) -> DagNode {
        DagNode::Skill(SkillNode { id: id.to_string(), name: "notion.page_create".to_string(), depends_on: depends_on.iter().map(|s| s.to_string()).collect(), input: Value::Null, timeout_sec: None })
    }

    #[test]
    fn rejects_more_nodes_than_the_limit_allows() {
        let dag = PipelineDag { nodes: vec![skill("n1", &[]), skill("n2", &[]), skill("n3", &[])], limits: PipelineLimits::default() };
        let limits = PipelineLimits { max_nodes: 2, ..PipelineLimits::default() };
        assert_eq!(check_planning_gate(&dag, &limits), Err(GateFailure::TooManyNodes { count: 3, max: 2 }));
    }

    #[test]
    fn rejects_depends_on_pointing_nowhere() {
        let dag = PipelineDag { nodes: vec![skill("n1", &["ghost"])], limits: PipelineLimits::default() };
        let err = check_planning_gate(&dag, &PipelineLimits::default()).unwrap_err();
        assert_eq!(err.code(), "DSL_VALIDATION_FAILED");
    }

    #[test]
    fn rejects_for_each_item_node_ids_outside_the_dag() {
        let for_each = DagNode::ForEach(ForEachNode { id: "n1".to_string(), source_ref: "$n0.items".to_string(), depends_on: vec![], item_node_ids: vec!["ghost".to_string()] });
        let dag = PipelineDag { nodes: vec![for_each], limits: PipelineLimits::default() };
        let err = check_planning_gate(&dag, &PipelineLimits::default()).unwrap_err();
        assert_eq!(err.code(), "DSL_REF_NOT_FOUND");
    }

    #[test]
    fn rejects_cyclic_dependencies() {
        let dag = PipelineDag { nodes: vec![skill("n1", &["n2"]), skill("n2", &["n1"])], limits: PipelineLimits::default() };
        assert_eq!(check_planning_gate(&dag, &PipelineLimits::default()), Err(GateFailure::Cycle));
    }

    #[test]
    fn accepts_a_well_formed_dag() {
        let verify = DagNode::Verify(VerifyNode { id: "n2".to_string(), depends_on: vec!["n1".to_string()], rules: vec!["$n1.id != null".to_string()] });
        let dag = PipelineDag { nodes: vec![skill("n1", &[]), verify], limits: PipelineLimits::default() };
        assert!(check_planning_gate(&dag, &PipelineLimits::default()).is_ok());
    }
}
