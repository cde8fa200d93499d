use crate::error::{FillError, Result};
use crate::run::{Run, RUN};
use crate::xml::{NodeId, XmlTree};

/// The runs sharing one paragraph-like parent, in document order.
///
/// Invariant: the `collection_index` of run `i` is the summed text length of
/// runs `0..i`. Every mutation re-establishes it.
#[derive(Debug, Clone)]
pub struct RunCollection {
    parent: NodeId,
    runs: Vec<Run>,
}

impl RunCollection {
    /// Build a collection over `run_nodes`, or over every direct `<w:r>`
    /// child of `parent` when no explicit list is given.
    pub fn new(tree: &XmlTree, parent: NodeId, run_nodes: Option<&[NodeId]>) -> Self {
        let nodes = match run_nodes {
            Some(nodes) => nodes.to_vec(),
            None => tree.child_elements_named(parent, RUN),
        };
        let mut collection = Self {
            parent,
            runs: nodes.into_iter().map(|node| Run::from_node(tree, node)).collect(),
        };
        collection.reindex();
        collection
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated text of all runs; the coordinate space for token search.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    pub fn text_len(&self) -> usize {
        self.runs.iter().map(Run::len).sum()
    }

    fn reindex(&mut self) {
        let mut offset = 0;
        for run in &mut self.runs {
            run.set_collection_index(offset);
            offset += run.len();
        }
    }

    fn is_boundary(&self, index: usize) -> bool {
        index == 0
            || index == self.text_len()
            || self
                .runs
                .iter()
                .any(|run| run.collection_index() == index || run.end() == index)
    }

    /// Split runs so that every point in `indexes` lands on a run boundary.
    ///
    /// Points already on a boundary are ignored, so calling this twice with
    /// the same points changes nothing the second time.
    pub fn split(&mut self, tree: &mut XmlTree, indexes: &[usize]) -> Result<()> {
        let text = self.text();
        for &index in indexes {
            if index > text.len() || !text.is_char_boundary(index) {
                return Err(FillError::InvalidSplit {
                    index,
                    len: text.len(),
                });
            }
        }

        let mut runs = Vec::with_capacity(self.runs.len() + indexes.len());
        for mut run in std::mem::take(&mut self.runs) {
            let start = run.collection_index();
            let end = run.end();
            let local: Vec<usize> = indexes
                .iter()
                .filter(|&&index| index > start && index < end)
                .map(|&index| index - start)
                .collect();
            if local.is_empty() {
                runs.push(run);
                continue;
            }
            let produced = run.split(tree, &local)?;
            runs.push(run);
            runs.extend(produced);
        }

        self.runs = runs;
        self.reindex();
        Ok(())
    }

    /// Replace the runs covering `[start, end)` with a single run holding
    /// `value`.
    ///
    /// Both ends must already sit on run boundaries (see [`Self::split`]).
    /// The first covered run keeps its node and formatting; the others are
    /// removed from the tree and from the collection. Empty runs inside the
    /// range, such as breaks or tabs, are left in place.
    pub fn merge_replace(
        &mut self,
        tree: &mut XmlTree,
        start: usize,
        end: usize,
        value: &str,
    ) -> Result<()> {
        if start >= end
            || end > self.text_len()
            || !self.is_boundary(start)
            || !self.is_boundary(end)
        {
            return Err(FillError::MisalignedRange { start, end });
        }

        let covered: Vec<usize> = self
            .runs
            .iter()
            .enumerate()
            .filter(|(_, run)| {
                !run.is_empty() && run.collection_index() >= start && run.end() <= end
            })
            .map(|(position, _)| position)
            .collect();
        let Some((&first, rest)) = covered.split_first() else {
            return Err(FillError::MisalignedRange { start, end });
        };

        self.runs[first].set_text(tree, value)?;
        for &position in rest.iter().rev() {
            let removed = self.runs.remove(position);
            tree.detach(removed.node());
        }

        self.reindex();
        Ok(())
    }
}
