//! Scene handed to the external visualization layer.

use crate::detector::Violation;
use crate::layout::{LayoutProjector, Point};
use crate::topology::TopologyModel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const CORE_NODE_SIZE: u32 = 20;
const NODE_SIZE: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    /// `id<br>role`
    pub hover: String,
    pub x: f64,
    pub y: f64,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub source: String,
    pub target: String,
    pub from: Point,
    pub to: Point,
    pub violation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderScene {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderScene {
    pub fn build(model: &TopologyModel, violations: &[Violation], projector: &LayoutProjector) -> Self {
        let positions = projector.layout(model);
        let flagged: HashSet<(&str, &str)> = violations
            .iter()
            .map(|v| (v.source.as_str(), v.target.as_str()))
            .collect();

        let nodes = model
            .nodes()
            .map(|(id, attrs)| {
                let p = positions.get(id).copied().unwrap_or_default();
                RenderNode {
                    id: id.to_string(),
                    label: id.to_string(),
                    hover: format!("{}<br>{}", id, attrs.role),
                    x: p.x,
                    y: p.y,
                    size: if attrs.level == 1 { CORE_NODE_SIZE } else { NODE_SIZE },
                }
            })
            .collect();

        let edges = model
            .edges()
            .map(|e| RenderEdge {
                source: e.source.clone(),
                target: e.target.clone(),
                from: positions.get(e.source.as_str()).copied().unwrap_or_default(),
                to: positions.get(e.target.as_str()).copied().unwrap_or_default(),
                violation: flagged.contains(&(e.source.as_str(), e.target.as_str())),
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::find_violations;
    use crate::properties::Attributes;
    use crate::topology::NodeAttrs;

    #[test]
    fn test_scene_sizes_hover_and_flags() -> crate::Result<()> {
        let mut model = TopologyModel::new();
        model.add_node("plc", NodeAttrs::new(1, "PLC"));
        model.add_node("erp", NodeAttrs::new(4, "ERP"));
        model.add_node("hmi", NodeAttrs::new(2, "HMI"));
        model.add_edge("erp", "plc", Attributes::new());
        model.add_edge("hmi", "plc", Attributes::new());

        let violations = find_violations(&model, 1);
        let scene = RenderScene::build(&model, &violations, &LayoutProjector::default());

        assert_eq!(scene.nodes[0].size, 20);
        assert_eq!(scene.nodes[1].size, 30);
        assert_eq!(scene.nodes[0].hover, "plc<br>PLC");
        assert!(scene.edges[0].violation);
        assert!(!scene.edges[1].violation);
        assert_eq!(scene.edges[1].to, Point::new(scene.nodes[0].x, scene.nodes[0].y));

        let json = scene.to_json()?;
        assert!(json.contains("\"violation\":true"));
        Ok(())
    }
}
