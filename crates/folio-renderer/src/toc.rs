use serde::Serialize;

use crate::node::RenderNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Anchor id of the heading.
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Headings in document order, including those nested inside containers.
pub fn table_of_contents(nodes: &[RenderNode]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    collect(nodes, &mut entries);
    entries
}

fn collect(nodes: &[RenderNode], entries: &mut Vec<TocEntry>) {
    for node in nodes {
        if let RenderNode::Heading {
            level,
            anchor,
            content,
        } = node
        {
            entries.push(TocEntry {
                id: anchor.clone(),
                text: content.iter().map(|n| n.text.as_str()).collect(),
                level: *level,
            });
        }
        collect(node.children(), entries);
    }
}
