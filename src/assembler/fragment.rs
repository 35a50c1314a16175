//! Structured emission tree. Fragments are built as nodes during the walk
//! and rendered to text exactly once, when the finished document is asked
//! for, so ordering never depends on string concatenation order.

use serde::{Deserialize, Serialize};

/// One element of the emitted document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Direct child with the given element name, if any.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first search over the whole subtree.
    pub fn find_deep(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_deep(name))
    }

    pub fn attr_value(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
        match (&self.text, self.children.is_empty()) {
            (None, true) => out.push_str("/>\n"),
            (Some(text), true) => {
                out.push('>');
                out.push_str(&escape(text));
                out.push_str("</");
                out.push_str(&self.name);
                out.push_str(">\n");
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(text) = text {
                    for _ in 0..=depth {
                        out.push_str("  ");
                    }
                    out.push_str(&escape(text));
                    out.push('\n');
                }
                for child in &self.children {
                    child.write(out, depth + 1);
                }
                for _ in 0..depth {
                    out.push_str("  ");
                }
                out.push_str("</");
                out.push_str(&self.name);
                out.push_str(">\n");
            }
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// What one component contributes to the document: its primary definition
/// plus, for leaves usable inside a Cluster, an adapter wrapping zero or
/// more occurrences of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub definition: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<Node>,
}

impl Fragment {
    pub fn new(definition: Node) -> Self {
        Self {
            definition,
            adapter: None,
        }
    }

    pub fn with_adapter(mut self, adapter: Node) -> Self {
        self.adapter = Some(adapter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements_with_escaping() {
        let node = Node::new("xs:element")
            .attr("name", "a<b")
            .child(Node::new("xs:documentation").text("5 > 4 & \"quoted\""));
        let text = node.render();
        assert!(text.contains("name=\"a&lt;b\""));
        assert!(text.contains("5 &gt; 4 &amp; &quot;quoted&quot;"));
        assert!(text.ends_with("</xs:element>\n"));
    }

    #[test]
    fn renders_empty_element_self_closed() {
        assert_eq!(Node::new("value").render(), "<value/>\n");
    }

    #[test]
    fn find_deep_walks_subtree() {
        let node = Node::new("a").child(Node::new("b").child(Node::new("c")));
        assert!(node.find_deep("c").is_some());
        assert!(node.find("c").is_none());
    }
}
