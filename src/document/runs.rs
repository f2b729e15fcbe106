//! Attribute runs over the document text

use crate::document::style::StyleAttributes;
use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A maximal span of text sharing one set of attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledRun {
    /// Character range covered by this run
    pub range: Range<usize>,
    pub attributes: StyleAttributes,
}

impl StyledRun {
    pub fn new(range: Range<usize>, attributes: StyleAttributes) -> Self {
        Self { range, attributes }
    }

    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Sorted, disjoint runs covering `[0, len)` exactly
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunList {
    runs: Vec<StyledRun>,
}

impl RunList {
    /// Runs for text of `len` characters carrying one set of attributes
    pub fn covering(len: usize, attributes: StyleAttributes) -> Self {
        if len == 0 {
            return Self::default();
        }
        Self {
            runs: vec![StyledRun::new(0..len, attributes)],
        }
    }

    /// Build from caller-supplied runs, checking they cover `[0, len)`
    pub fn from_runs(runs: Vec<StyledRun>, len: usize) -> Result<Self, EditError> {
        let mut expected = 0;
        for run in &runs {
            if run.range.start != expected {
                return Err(EditError::InvalidRuns(format!(
                    "run starts at {} but previous run ended at {}",
                    run.range.start, expected
                )));
            }
            if run.range.end < run.range.start {
                return Err(EditError::InvalidRuns(format!(
                    "inverted run {}..{}",
                    run.range.start, run.range.end
                )));
            }
            expected = run.range.end;
        }
        if expected != len {
            return Err(EditError::InvalidRuns(format!(
                "runs cover {} characters, text has {}",
                expected, len
            )));
        }

        let mut list = Self { runs };
        list.normalize();
        Ok(list)
    }

    pub fn as_slice(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Index of the run containing `offset`
    pub fn index_at(&self, offset: usize) -> Option<usize> {
        let idx = self.runs.partition_point(|run| run.range.end <= offset);
        (idx < self.runs.len()).then_some(idx)
    }

    /// Attributes of the character at `offset`
    pub fn attributes_at(&self, offset: usize) -> Option<&StyleAttributes> {
        self.index_at(offset).map(|idx| &self.runs[idx].attributes)
    }

    /// Runs intersecting `range`, in order
    pub fn runs_in(&self, range: Range<usize>) -> impl Iterator<Item = &StyledRun> + '_ {
        let first = self.runs.partition_point(|run| run.range.end <= range.start);
        self.runs[first..]
            .iter()
            .take_while(move |run| run.range.start < range.end)
    }

    /// Make sure a run boundary exists at `offset`, returning the index of the run
    /// starting there
    fn split_at(&mut self, offset: usize) -> usize {
        let idx = self.runs.partition_point(|run| run.range.end <= offset);
        if idx >= self.runs.len() {
            return idx;
        }
        let run = &mut self.runs[idx];
        if run.range.start == offset {
            return idx;
        }
        let tail = StyledRun::new(offset..run.range.end, run.attributes.clone());
        run.range.end = offset;
        self.runs.insert(idx + 1, tail);
        idx + 1
    }

    /// Insert `len` characters at `offset` carrying `attributes`
    pub fn insert(&mut self, offset: usize, len: usize, attributes: StyleAttributes) {
        if len == 0 {
            return;
        }
        let idx = self.split_at(offset);
        for run in &mut self.runs[idx..] {
            run.range.start += len;
            run.range.end += len;
        }
        self.runs
            .insert(idx, StyledRun::new(offset..offset + len, attributes));
        self.normalize();
    }

    /// Remove the characters in `range`
    pub fn delete(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let first = self.split_at(range.start);
        let last = self.split_at(range.end);
        self.runs.drain(first..last);
        let removed = range.end - range.start;
        for run in &mut self.runs[first..] {
            run.range.start -= removed;
            run.range.end -= removed;
        }
        self.normalize();
    }

    /// Apply `change` to the attributes of every character in `range`
    pub fn apply(&mut self, range: Range<usize>, mut change: impl FnMut(&mut StyleAttributes)) {
        if range.is_empty() {
            return;
        }
        let first = self.split_at(range.start);
        let last = self.split_at(range.end);
        for run in &mut self.runs[first..last] {
            change(&mut run.attributes);
        }
        self.normalize();
    }

    /// Runs clipped to `range` and rebased to start at zero
    pub fn slice(&self, range: Range<usize>) -> RunList {
        let runs = self
            .runs_in(range.clone())
            .map(|run| {
                let start = run.range.start.max(range.start) - range.start;
                let end = run.range.end.min(range.end) - range.start;
                StyledRun::new(start..end, run.attributes.clone())
            })
            .collect();
        let mut list = RunList { runs };
        list.normalize();
        list
    }

    /// Drop empty runs and merge equal neighbours
    fn normalize(&mut self) {
        self.runs.retain(|run| !run.is_empty());
        let mut merged: Vec<StyledRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            let continues = merged.last().is_some_and(|prev| {
                prev.attributes == run.attributes && prev.range.end == run.range.start
            });
            if continues {
                if let Some(prev) = merged.last_mut() {
                    prev.range.end = run.range.end;
                }
            } else {
                merged.push(run);
            }
        }
        self.runs = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::style::FontDescriptor;

    fn bold() -> StyleAttributes {
        StyleAttributes {
            font: FontDescriptor::default().bold(),
            ..Default::default()
        }
    }

    fn ranges(list: &RunList) -> Vec<Range<usize>> {
        list.as_slice().iter().map(|r| r.range.clone()).collect()
    }

    #[test]
    fn test_insert_splits_run() {
        let mut list = RunList::covering(10, StyleAttributes::default());
        list.insert(4, 3, bold());
        assert_eq!(ranges(&list), vec![0..4, 4..7, 7..13]);
        assert_eq!(list.as_slice()[0].attributes, list.as_slice()[2].attributes);
    }

    #[test]
    fn test_insert_same_attributes_merges() {
        let mut list = RunList::covering(10, StyleAttributes::default());
        list.insert(4, 3, StyleAttributes::default());
        assert_eq!(ranges(&list), vec![0..13]);
    }

    #[test]
    fn test_delete_across_runs_merges_neighbours() {
        let mut list = RunList::covering(10, StyleAttributes::default());
        list.insert(4, 3, bold());
        list.delete(3..8);
        assert_eq!(ranges(&list), vec![0..8]);
    }

    #[test]
    fn test_apply_and_slice() {
        let mut list = RunList::covering(10, StyleAttributes::default());
        list.apply(2..5, |attrs| attrs.font.italic = true);
        assert_eq!(ranges(&list), vec![0..2, 2..5, 5..10]);

        let slice = list.slice(3..7);
        assert_eq!(ranges(&slice), vec![0..2, 2..4]);
        assert!(slice.as_slice()[0].attributes.font.italic);
    }

    #[test]
    fn test_from_runs_rejects_gaps() {
        let runs = vec![
            StyledRun::new(0..3, StyleAttributes::default()),
            StyledRun::new(4..6, StyleAttributes::default()),
        ];
        assert!(RunList::from_runs(runs, 6).is_err());
    }

    #[test]
    fn test_index_at() {
        let mut list = RunList::covering(6, StyleAttributes::default());
        list.apply(3..6, |attrs| attrs.font.bold = true);
        assert_eq!(list.index_at(0), Some(0));
        assert_eq!(list.index_at(3), Some(1));
        assert_eq!(list.index_at(6), None);
    }
}
