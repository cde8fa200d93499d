use crate::error::{FillError, Result};
use crate::xml::{NodeId, XmlTree};

/// Run element (`<w:r>`).
pub const RUN: &str = "w:r";
/// Visible text leaf inside a run (`<w:t>`).
pub const TEXT: &str = "w:t";
/// Run formatting container (`<w:rPr>`).
pub const RUN_PROPERTIES: &str = "w:rPr";
/// Attribute that keeps leading/trailing whitespace of a text leaf.
pub const SPACE_ATTRIBUTE: &str = "xml:space";

/// One formatting descriptor of a run, e.g. `<w:sz w:val="24"/>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProperty {
    pub name: String,
    pub values: Vec<String>,
}

/// A formatting run: one `<w:r>` node and the text of its `<w:t>` leaves.
///
/// Offsets (`collection_index`, split points) are UTF-8 byte offsets and
/// always fall on character boundaries.
#[derive(Debug, Clone)]
pub struct Run {
    node: NodeId,
    text: String,
    properties: Vec<RunProperty>,
    collection_index: usize,
}

impl Run {
    pub fn from_node(tree: &XmlTree, node: NodeId) -> Self {
        let text = tree
            .child_elements_named(node, TEXT)
            .into_iter()
            .map(|leaf| tree.text_content(leaf))
            .collect();

        let properties = tree
            .child_elements_named(node, RUN_PROPERTIES)
            .into_iter()
            .flat_map(|container| tree.children(container).to_vec())
            .filter_map(|child| tree.element(child))
            .map(|el| RunProperty {
                name: el.name.clone(),
                values: el.attributes.iter().map(|(_, v)| v.clone()).collect(),
            })
            .collect();

        Self {
            node,
            text,
            properties,
            collection_index: 0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn properties(&self) -> &[RunProperty] {
        &self.properties
    }

    pub fn collection_index(&self) -> usize {
        self.collection_index
    }

    /// Offset just past the last character of this run.
    pub fn end(&self) -> usize {
        self.collection_index + self.text.len()
    }

    pub(crate) fn set_collection_index(&mut self, index: usize) {
        self.collection_index = index;
    }

    /// Split this run at run-local `indexes`.
    ///
    /// Each fragment after a cut becomes a new run inserted after this one,
    /// with a copy of the run properties and the slice of text it covers.
    /// Other run content (tabs, breaks, field characters) is moved, never
    /// copied: content sitting exactly on a cut stays with the text before
    /// it. This run keeps the prefix before the leftmost cut. Returns the new
    /// runs left to right.
    pub fn split(&mut self, tree: &mut XmlTree, indexes: &[usize]) -> Result<Vec<Run>> {
        let mut cuts = indexes.to_vec();
        cuts.sort_unstable();
        cuts.dedup();
        if cuts.is_empty() {
            return Ok(Vec::new());
        }

        for &index in &cuts {
            if index == 0 || index >= self.text.len() || !self.text.is_char_boundary(index) {
                return Err(FillError::InvalidSplit {
                    index,
                    len: self.text.len(),
                });
            }
        }

        let mut bounds = Vec::with_capacity(cuts.len() + 2);
        bounds.push(0);
        bounds.extend_from_slice(&cuts);
        bounds.push(self.text.len());
        let fragment_of = |offset: usize| {
            bounds[1..]
                .iter()
                .position(|&end| offset <= end)
                .unwrap_or(bounds.len() - 2)
        };

        let (properties, pieces) = self.layout(tree);
        let mut produced = Vec::with_capacity(cuts.len());
        let mut previous = self.node;
        for (fragment, window) in bounds.windows(2).enumerate().skip(1) {
            let (start, end) = (window[0], window[1]);
            let copy = tree.shallow_clone(self.node);
            for &container in &properties {
                let container_copy = tree.deep_clone(container);
                tree.append_child(copy, container_copy)?;
            }
            for piece in &pieces {
                match *piece {
                    Piece::Text { leaf, start: from, end: to } => {
                        let (from, to) = (from.max(start), to.min(end));
                        if from < to {
                            let leaf_copy = tree.shallow_clone(leaf);
                            write_leaf(tree, leaf_copy, &self.text[from..to])?;
                            tree.append_child(copy, leaf_copy)?;
                        }
                    }
                    Piece::Inline { node, offset } if fragment_of(offset) == fragment => {
                        tree.append_child(copy, node)?;
                    }
                    Piece::Inline { .. } => {}
                }
            }
            tree.insert_after(previous, copy)?;
            previous = copy;

            let mut run = Run::from_node(tree, copy);
            run.collection_index = self.collection_index + start;
            produced.push(run);
        }

        let head = cuts[0];
        for piece in &pieces {
            if let Piece::Text { leaf, start, end } = *piece {
                if start < head {
                    write_leaf(tree, leaf, &self.text[start..end.min(head)])?;
                } else {
                    tree.detach(leaf);
                }
            }
        }
        self.text.truncate(head);
        Ok(produced)
    }

    /// Property containers and the remaining children with their text offsets.
    fn layout(&self, tree: &XmlTree) -> (Vec<NodeId>, Vec<Piece>) {
        let mut properties = Vec::new();
        let mut pieces = Vec::new();
        let mut offset = 0;
        for &child in tree.children(self.node) {
            if tree.is_element_named(child, RUN_PROPERTIES) {
                properties.push(child);
            } else if tree.is_element_named(child, TEXT) {
                let len = tree.text_content(child).len();
                pieces.push(Piece::Text {
                    leaf: child,
                    start: offset,
                    end: offset + len,
                });
                offset += len;
            } else {
                pieces.push(Piece::Inline {
                    node: child,
                    offset,
                });
            }
        }
        (properties, pieces)
    }

    /// Overwrite the visible text of the run.
    ///
    /// The first `<w:t>` receives the whole value and any further `<w:t>`
    /// leaves are removed. A run without a text leaf gets one after its
    /// property container.
    pub fn set_text(&mut self, tree: &mut XmlTree, text: &str) -> Result<()> {
        let leaves = tree.child_elements_named(self.node, TEXT);
        let leaf = match leaves.first() {
            Some(&leaf) => leaf,
            None => {
                let position = tree
                    .children(self.node)
                    .iter()
                    .position(|&child| tree.is_element_named(child, RUN_PROPERTIES))
                    .map(|p| p + 1)
                    .unwrap_or(0);
                let leaf = tree.create_element(TEXT);
                tree.insert_child(self.node, position, leaf)?;
                leaf
            }
        };
        for &extra in leaves.iter().skip(1) {
            tree.detach(extra);
        }

        write_leaf(tree, leaf, text)?;
        self.text = text.to_string();
        Ok(())
    }
}

/// A child of a run placed in the run's text coordinates.
enum Piece {
    Text {
        leaf: NodeId,
        start: usize,
        end: usize,
    },
    Inline { node: NodeId, offset: usize },
}

fn write_leaf(tree: &mut XmlTree, leaf: NodeId, text: &str) -> Result<()> {
    tree.set_text_content(leaf, text)?;
    if needs_space_preserve(text) {
        if let Some(element) = tree.element_mut(leaf) {
            element.set_attribute(SPACE_ATTRIBUTE, "preserve");
        }
    }
    Ok(())
}

/// Word drops leading/trailing whitespace of a text leaf unless marked.
pub fn needs_space_preserve(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_whitespace)
        || text.chars().next_back().is_some_and(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(runs: &str) -> (XmlTree, NodeId) {
        let xml = format!(r#"<w:p xmlns:w="urn:w">{}</w:p>"#, runs);
        let tree = XmlTree::parse(&xml).unwrap();
        let p = tree.document_element().unwrap();
        (tree, p)
    }

    fn leaf_space(tree: &XmlTree, run: NodeId) -> Option<String> {
        let leaf = tree.child_elements_named(run, TEXT)[0];
        tree.element(leaf)
            .and_then(|el| el.attribute(SPACE_ATTRIBUTE))
            .map(str::to_string)
    }

    #[test]
    fn test_from_node_collects_text_and_properties() {
        let (tree, p) = paragraph(
            r#"<w:r><w:rPr><w:b/><w:sz w:val="24"/></w:rPr><w:t>Hel</w:t><w:tab/><w:t>lo</w:t></w:r>"#,
        );
        let run = Run::from_node(&tree, tree.children(p)[0]);
        assert_eq!(run.text(), "Hello");
        assert_eq!(
            run.properties(),
            &[
                RunProperty { name: "w:b".into(), values: vec![] },
                RunProperty { name: "w:sz".into(), values: vec!["24".into()] },
            ]
        );
    }

    #[test]
    fn test_split_produces_siblings_in_order() {
        let (mut tree, p) = paragraph(r#"<w:r><w:rPr><w:i/></w:rPr><w:t>abcdefgh</w:t></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);
        run.set_collection_index(10);

        let produced = run.split(&mut tree, &[5, 2]).unwrap();

        assert_eq!(run.text(), "ab");
        let texts: Vec<&str> = produced.iter().map(Run::text).collect();
        assert_eq!(texts, vec!["cde", "fgh"]);
        assert_eq!(produced[0].collection_index(), 12);
        assert_eq!(produced[1].collection_index(), 15);

        let order: Vec<NodeId> = tree.children(p).to_vec();
        assert_eq!(order, vec![run.node(), produced[0].node(), produced[1].node()]);
        for new_run in &produced {
            assert_eq!(new_run.properties(), run.properties());
        }
        assert_eq!(tree.text_content(p), "abcdefgh");
    }

    #[test]
    fn test_split_moves_inline_content_once() {
        let (mut tree, p) = paragraph(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>Name:</w:t><w:tab/><w:t>{Name}</w:t><w:br/><w:t>x</w:t></w:r>"#,
        );
        let mut run = Run::from_node(&tree, tree.children(p)[0]);

        let produced = run.split(&mut tree, &[5, 11]).unwrap();

        assert_eq!(run.text(), "Name:");
        let texts: Vec<&str> = produced.iter().map(Run::text).collect();
        assert_eq!(texts, vec!["{Name}", "x"]);
        assert_eq!(
            tree.to_xml().unwrap(),
            concat!(
                r#"<w:p xmlns:w="urn:w">"#,
                r#"<w:r><w:rPr><w:b/></w:rPr><w:t>Name:</w:t><w:tab/></w:r>"#,
                r#"<w:r><w:rPr><w:b/></w:rPr><w:t>{Name}</w:t><w:br/></w:r>"#,
                r#"<w:r><w:rPr><w:b/></w:rPr><w:t>x</w:t></w:r>"#,
                "</w:p>"
            )
        );
    }

    #[test]
    fn test_split_slices_a_leaf_spanning_the_cut() {
        let (mut tree, p) = paragraph(r#"<w:r><w:t>ab</w:t><w:t>cd</w:t></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);

        let produced = run.split(&mut tree, &[1, 3]).unwrap();

        let runs = tree.children(p).to_vec();
        assert_eq!(runs.len(), 3);
        assert_eq!(tree.child_elements_named(runs[0], TEXT).len(), 1);
        assert_eq!(tree.child_elements_named(runs[1], TEXT).len(), 2);
        assert_eq!(produced[0].text(), "bc");
        assert_eq!(produced[1].text(), "d");
        assert_eq!(tree.text_content(p), "abcd");
    }

    #[test]
    fn test_split_marks_whitespace_edges() {
        let (mut tree, p) = paragraph(r#"<w:r><w:t>Hello World</w:t></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);

        let produced = run.split(&mut tree, &[6]).unwrap();

        assert_eq!(run.text(), "Hello ");
        assert_eq!(leaf_space(&tree, run.node()).as_deref(), Some("preserve"));
        assert_eq!(produced[0].text(), "World");
        assert_eq!(leaf_space(&tree, produced[0].node()), None);
    }

    #[test]
    fn test_split_rejects_out_of_range_points() {
        let (mut tree, p) = paragraph(r#"<w:r><w:t>abc</w:t></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);
        assert!(matches!(
            run.split(&mut tree, &[3]),
            Err(FillError::InvalidSplit { index: 3, len: 3 })
        ));
        assert!(run.split(&mut tree, &[0]).is_err());
        assert_eq!(tree.children(p).len(), 1);
    }

    #[test]
    fn test_split_rejects_non_char_boundary() {
        let (mut tree, p) = paragraph(r#"<w:r><w:t>héllo</w:t></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);
        assert!(run.split(&mut tree, &[2]).is_err());
        assert!(run.split(&mut tree, &[3]).is_ok());
        assert_eq!(run.text(), "hé");
    }

    #[test]
    fn test_set_text_collapses_multiple_leaves() {
        let (mut tree, p) = paragraph(r#"<w:r><w:t>a</w:t><w:t>b</w:t></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);
        run.set_text(&mut tree, "xyz").unwrap();
        assert_eq!(tree.child_elements_named(run.node(), TEXT).len(), 1);
        assert_eq!(Run::from_node(&tree, run.node()).text(), "xyz");
    }

    #[test]
    fn test_set_text_creates_leaf_after_properties() {
        let (mut tree, p) = paragraph(r#"<w:r><w:rPr><w:b/></w:rPr><w:br/></w:r>"#);
        let mut run = Run::from_node(&tree, tree.children(p)[0]);
        run.set_text(&mut tree, " x").unwrap();
        assert_eq!(
            tree.to_xml().unwrap(),
            r#"<w:p xmlns:w="urn:w"><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve"> x</w:t><w:br/></w:r></w:p>"#
        );
    }

    #[test]
    fn test_needs_space_preserve() {
        assert!(needs_space_preserve(" a"));
        assert!(needs_space_preserve("a\t"));
        assert!(!needs_space_preserve("a b"));
        assert!(!needs_space_preserve(""));
    }
}
