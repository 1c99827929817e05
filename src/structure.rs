//! Tree snapshot of a document, for tests and golden files.
//!
//! The snapshot is plain data built from the current document on every
//! call; taking one never touches the engine's state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::model::{Col, Component, Page, Row};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: None,
            details: BTreeMap::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn to_json_pretty(&self) -> String {
        // A Node holds only JSON-native data, so this cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Snapshot of the whole document.
pub fn document_node(config: &Config, pages: &[Page]) -> Node {
    let mut root = Node::new("document")
        .with_detail("page_size", config.page_size.name())
        .with_detail(
            "dimensions",
            json!({ "width": config.dimensions.width, "height": config.dimensions.height }),
        )
        .with_detail(
            "margins",
            json!({
                "top": config.margins.top,
                "right": config.margins.right,
                "bottom": config.margins.bottom,
                "left": config.margins.left,
            }),
        )
        .with_detail("worker_pool_size", config.worker_pool_size)
        .with_detail("debug", config.debug);
    if let Some(page_number) = &config.page_number {
        root = root.with_detail("page_number", page_number.pattern.as_str());
    }
    root.nodes = pages.iter().map(page_node).collect();
    root
}

fn page_node(page: &Page) -> Node {
    let mut node = Node::new("page").with_value(page.index());
    node.nodes = page.rows.iter().map(row_node).collect();
    node
}

fn row_node(row: &Row) -> Node {
    let mut node = Node::new("row").with_value(row.height);
    node.nodes = row.cols.iter().map(col_node).collect();
    node
}

fn col_node(col: &Col) -> Node {
    let mut node = Node::new("col").with_value(col.span);
    node.nodes = col.components.iter().map(component_node).collect();
    node
}

fn component_node(component: &Component) -> Node {
    let node = Node::new(component.kind_name());
    match component {
        Component::Text { content, props } => node
            .with_value(content.as_str())
            .with_detail("size", props.size)
            .with_detail("align", format!("{:?}", props.align))
            .with_detail("style", format!("{:?}", props.style)),
        Component::Image { src, props } => node
            .with_value(abbreviate(src))
            .with_detail("percent", props.percent),
        Component::Barcode { code, props } | Component::QrCode { code, props } => node
            .with_value(code.as_str())
            .with_detail("percent", props.percent),
        Component::Signature { label, .. } => node.with_value(label.as_str()),
        Component::Line { props } => node
            .with_detail("thickness", props.thickness)
            .with_detail("size_percent", props.size_percent),
        Component::Rows { rows } => {
            let mut node = node;
            node.nodes = rows.iter().map(row_node).collect();
            node
        }
    }
}

/// Image sources can be whole base64 payloads; keep the snapshot readable.
fn abbreviate(src: &str) -> String {
    const MAX: usize = 32;
    if src.chars().count() <= MAX {
        src.to_string()
    } else {
        let head: String = src.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_tree_shape() {
        let config = ConfigBuilder::new().build();
        let mut page = Page::new().add(
            Row::new(10.0)
                .add(Col::new(6).add(Component::text("left")))
                .add(Col::new(6).add(Component::rows(vec![Row::text(5.0, "inner")]))),
        );
        page.index = 1;

        let root = document_node(&config, &[page]);
        assert_eq!(root.kind, "document");
        assert_eq!(root.details["page_size"], json!("A4"));

        let row = &root.nodes[0].nodes[0];
        assert_eq!(row.kind, "row");
        assert_eq!(row.value, Some(json!(10.0)));
        assert_eq!(row.nodes[0].nodes[0].value, Some(json!("left")));
        assert_eq!(row.nodes[1].nodes[0].kind, "rows");
        assert_eq!(row.nodes[1].nodes[0].nodes[0].kind, "row");
    }

    #[test]
    fn test_json_uses_type_key_and_skips_empty() {
        let json = Node::new("line").to_json_pretty();
        assert!(json.contains("\"type\": \"line\""));
        assert!(!json.contains("nodes"));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Node::new("line"));
    }

    #[test]
    fn test_long_image_source_abbreviated() {
        let src = "A".repeat(100);
        assert_eq!(abbreviate(&src).len(), 35);
        assert_eq!(abbreviate("./logo.png"), "./logo.png");
    }
}
