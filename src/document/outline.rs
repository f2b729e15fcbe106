//! Heading classification and document outline

use super::{FontDescriptor, StyledDocument};
use std::ops::Range;

/// Classifies fonts as headings relative to the body size
///
/// A font is a heading when it is at least 4pt larger than the body, or at least 2pt
/// larger and bold. Levels: 12pt or more above body is level 1, 6pt or more is level 2,
/// anything else is level 3. For a 16pt body these are the familiar 28/22/18 cut-offs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingClassifier {
    pub body_size: f32,
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new(super::DEFAULT_FONT_SIZE)
    }
}

impl HeadingClassifier {
    pub fn new(body_size: f32) -> Self {
        Self { body_size }
    }

    pub fn is_heading(&self, font: &FontDescriptor) -> bool {
        let delta = font.size - self.body_size;
        delta >= 4.0 || (delta >= 2.0 && font.bold)
    }

    /// Heading level (1-3), or `None` for body text
    pub fn level(&self, font: &FontDescriptor) -> Option<u8> {
        if !self.is_heading(font) {
            return None;
        }
        let delta = font.size - self.body_size;
        Some(if delta >= 12.0 {
            1
        } else if delta >= 6.0 {
            2
        } else {
            3
        })
    }
}

/// One heading paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub title: String,
    pub level: u8,
    /// Paragraph range in the document
    pub range: Range<usize>,
}

/// A heading with its nested sub-headings
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    pub entry: OutlineEntry,
    pub children: Vec<OutlineNode>,
}

/// Collect heading paragraphs in document order
pub fn extract_outline(doc: &StyledDocument, classifier: &HeadingClassifier) -> Vec<OutlineEntry> {
    doc.paragraph_ranges()
        .into_iter()
        .filter_map(|range| {
            let level = classifier.level(doc.leading_font(range.clone()))?;
            let title = doc.text_range(range.clone()).trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some(OutlineEntry { title, level, range })
        })
        .collect()
}

/// Nest flat entries: each entry becomes a child of the nearest preceding entry with a
/// smaller level
pub fn build_tree(entries: &[OutlineEntry]) -> Vec<OutlineNode> {
    let mut roots: Vec<OutlineNode> = Vec::new();
    // Path of open nodes from a root down to the most recent entry
    let mut stack: Vec<OutlineNode> = Vec::new();

    for entry in entries {
        while stack.last().is_some_and(|open| open.entry.level >= entry.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(OutlineNode {
            entry: entry.clone(),
            children: Vec::new(),
        });
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Last heading starting at or before `cursor`
pub fn current_heading(entries: &[OutlineEntry], cursor: usize) -> Option<&OutlineEntry> {
    entries.iter().rev().find(|entry| entry.range.start <= cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{StyleAttributes, StyleChange};
    use crate::editing::EditOp;

    fn font(size: f32) -> FontDescriptor {
        FontDescriptor::default().with_size(size)
    }

    #[test]
    fn test_classifier_thresholds() {
        let classifier = HeadingClassifier::new(16.0);
        assert_eq!(classifier.level(&font(28.0)), Some(1));
        assert_eq!(classifier.level(&font(22.0)), Some(2));
        assert_eq!(classifier.level(&font(20.0)), Some(3));
        assert_eq!(classifier.level(&font(18.0)), None);
        assert_eq!(classifier.level(&font(18.0).bold()), Some(3));
        assert_eq!(classifier.level(&font(16.0).bold()), None);
    }

    #[test]
    fn test_classifier_is_relative_to_body() {
        let classifier = HeadingClassifier::new(12.0);
        assert_eq!(classifier.level(&font(24.0)), Some(1));
        assert_eq!(classifier.level(&font(16.0)), Some(3));
    }

    fn sample() -> StyledDocument {
        let mut doc = StyledDocument::from_plain_text(
            "Intro\nbody\nDetails\nmore body\n  \nNext\n",
            StyleAttributes::default(),
        );
        let sized = |size: f32| StyleChange {
            size: Some(size),
            ..Default::default()
        };
        doc.apply_edit(EditOp::format(0..6, sized(28.0))).unwrap();
        doc.apply_edit(EditOp::format(11..19, sized(22.0))).unwrap();
        // Whitespace-only paragraph in heading size is skipped
        doc.apply_edit(EditOp::format(29..32, sized(28.0))).unwrap();
        doc.apply_edit(EditOp::format(32..37, sized(28.0))).unwrap();
        doc
    }

    #[test]
    fn test_extract_outline() {
        let entries = extract_outline(&sample(), &HeadingClassifier::default());
        let titles: Vec<_> = entries.iter().map(|e| (e.title.as_str(), e.level)).collect();
        assert_eq!(titles, vec![("Intro", 1), ("Details", 2), ("Next", 1)]);
        assert_eq!(entries[1].range, 11..19);
    }

    #[test]
    fn test_build_tree_and_current_heading() {
        let entries = extract_outline(&sample(), &HeadingClassifier::default());
        let tree = build_tree(&entries);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].entry.title, "Details");

        assert_eq!(current_heading(&entries, 15).map(|e| e.title.as_str()), Some("Details"));
        assert_eq!(current_heading(&entries, 0).map(|e| e.title.as_str()), Some("Intro"));
    }
}
