//! Pipeline DAG types executed by the DAG executor (§4.13.2).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard limits enforced by the planning gate before a DAG is run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineLimits {
    /// Maximum number of nodes in the DAG. Must be `<= 6`.
    pub max_nodes: u32,
    /// Maximum fan-out of a single `for_each` node. Must be `<= 50`.
    pub max_fanout: u32,
    /// Maximum total tool invocations across the run. Must be `<= 200`.
    pub max_tool_calls: u32,
    /// Wall-clock budget for the whole pipeline run, in seconds. Must be `<= 300`.
    pub pipeline_timeout_sec: u32,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            max_nodes: 6,
            max_fanout: 50,
            max_tool_calls: 200,
            pipeline_timeout_sec: 300,
        }
    }
}

/// A `skill` node: delegates to a tool invocation resolved from a skill name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillNode {
    /// Node id, unique within the DAG.
    pub id: String,
    /// Skill name to resolve a runtime tool from (e.g. `notion.page_create`).
    pub name: String,
    /// Ids of nodes that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Input payload, may contain `$node_id.path` references.
    #[serde(default)]
    pub input: Value,
    /// Per-node timeout, in seconds.
    #[serde(default)]
    pub timeout_sec: Option<u32>,
}

/// An `llm_transform` node: a pure deterministic transform from C14.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmTransformNode {
    /// Node id, unique within the DAG.
    pub id: String,
    /// Name of the transform to run (`filter_meeting_events`, etc.).
    pub transform: String,
    /// Ids of nodes that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Input payload, may contain `$node_id.path` references.
    #[serde(default)]
    pub input: Value,
    /// Output schema; the transform's output must satisfy `required` keys.
    pub output_schema: Value,
}

/// A `for_each` node: iterates an array reference, running a child subgraph
/// per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForEachNode {
    /// Node id, unique within the DAG.
    pub id: String,
    /// Reference that must resolve to an array, e.g. `$n1.events`.
    pub source_ref: String,
    /// Ids of nodes that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Ids of the child subgraph's nodes, executed per item in topological order.
    pub item_node_ids: Vec<String>,
}

/// A `verify` node: evaluates boolean rules over already-computed outputs.
/// Never mutates state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyNode {
    /// Node id, unique within the DAG.
    pub id: String,
    /// Ids of nodes that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Boolean-expression rules over already-computed node outputs.
    pub rules: Vec<String>,
}

/// One node of a pipeline DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum DagNode {
    /// Tool invocation delegate.
    Skill(SkillNode),
    /// Pure deterministic transform.
    LlmTransform(LlmTransformNode),
    /// Per-item subgraph iteration.
    ForEach(ForEachNode),
    /// Post-execution rule evaluation.
    Verify(VerifyNode),
}

impl DagNode {
    /// The node's id, regardless of variant.
    pub fn id(&self) -> &str {
        match self {
            DagNode::Skill(n) => &n.id,
            DagNode::LlmTransform(n) => &n.id,
            DagNode::ForEach(n) => &n.id,
            DagNode::Verify(n) => &n.id,
        }
    }

    /// The node's direct dependencies, regardless of variant.
    pub fn depends_on(&self) -> &[String] {
        match self {
            DagNode::Skill(n) => &n.depends_on,
            DagNode::LlmTransform(n) => &n.depends_on,
            DagNode::ForEach(n) => &n.depends_on,
            DagNode::Verify(n) => &n.depends_on,
        }
    }
}

/// A full pipeline DAG: nodes plus the limits the planning gate checked it
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDag {
    /// Nodes of the DAG, not necessarily in topological order.
    pub nodes: Vec<DagNode>,
    /// Limits this DAG was planned under.
    #[serde(default)]
    pub limits: PipelineLimits,
}

impl PipelineDag {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&DagNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_node_id_and_depends_on_cover_every_variant() {
        let nodes = vec![
            DagNode::Skill(SkillNode {
                id: "n1".into(),
                name: "notion.page_create".into(),
                depends_on: vec![],
                input: Value::Null,
                timeout_sec: None,
            }),
            DagNode::Verify(VerifyNode {
                id: "n2".into(),
                depends_on: vec!["n1".into()],
                rules: vec!["$n1.page_id != null".into()],
            }),
        ];
        assert_eq!(nodes[0].id(), "n1");
        assert_eq!(nodes[1].depends_on(), &["n1".to_string()]);
    }

    #[test]
    fn default_limits_match_planning_gate_ceiling() {
        let limits = PipelineLimits::default();
        assert_eq!(limits.max_nodes, 6);
        assert_eq!(limits.max_fanout, 50);
        assert_eq!(limits.max_tool_calls, 200);
        assert_eq!(limits.pipeline_timeout_sec, 300);
    }
}
