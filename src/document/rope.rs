//! Rope data structure for efficient text storage and manipulation
//!
//! Indexed by character (Unicode scalar value), not by byte. Every node caches its
//! character and line-break counts, so offset lookups and paragraph boundary searches
//! are O(log n).

use std::fmt;

/// Maximum size of a leaf node in characters
const MAX_LEAF_CHARS: usize = 1024;

/// Rope data structure for efficient text editing
#[derive(Clone)]
pub struct Rope {
    root: RopeNode,
}

#[derive(Clone, Default)]
enum RopeNode {
    /// Internal node with two children
    Branch {
        left: Box<RopeNode>,
        right: Box<RopeNode>,
        /// Total characters in left subtree
        left_chars: usize,
        /// Total line breaks in left subtree
        left_lines: usize,
    },
    /// Leaf node containing actual text
    Leaf {
        text: String,
        char_count: usize,
        line_count: usize,
    },
    #[default]
    Empty,
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

fn leaf(text: String) -> RopeNode {
    if text.is_empty() {
        return RopeNode::Empty;
    }
    let char_count = text.chars().count();
    let line_count = text.chars().filter(|c| *c == '\n').count();
    RopeNode::Leaf {
        text,
        char_count,
        line_count,
    }
}

/// Byte index of the `char_offset`-th character, or the string length
fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

impl Rope {
    /// Create a new empty rope
    pub fn new() -> Self {
        Self {
            root: RopeNode::Empty,
        }
    }

    /// Create a rope from a string
    pub fn from_str(s: &str) -> Self {
        if s.is_empty() {
            return Self::new();
        }

        let mut leaves = Vec::new();
        let mut chunk = String::with_capacity(MAX_LEAF_CHARS);
        let mut chunk_chars = 0;
        for c in s.chars() {
            chunk.push(c);
            chunk_chars += 1;
            if chunk_chars == MAX_LEAF_CHARS {
                leaves.push(leaf(std::mem::take(&mut chunk)));
                chunk_chars = 0;
            }
        }
        if !chunk.is_empty() {
            leaves.push(leaf(chunk));
        }

        Self {
            root: Self::build_tree(leaves),
        }
    }

    /// Build a balanced tree from leaf nodes
    fn build_tree(mut nodes: Vec<RopeNode>) -> RopeNode {
        if nodes.is_empty() {
            return RopeNode::Empty;
        }

        while nodes.len() > 1 {
            let mut paired = Vec::with_capacity((nodes.len() + 1) / 2);
            let mut iter = nodes.into_iter();
            while let Some(left) = iter.next() {
                match iter.next() {
                    Some(right) => paired.push(Self::merge_nodes(left, right)),
                    None => paired.push(left),
                }
            }
            nodes = paired;
        }

        nodes.pop().unwrap_or_default()
    }

    /// Total length in characters
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.len() == 0
    }

    /// Total number of `'\n'` characters
    pub fn line_count(&self) -> usize {
        self.root.line_count()
    }

    /// Insert text at the given character offset
    pub fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }

        let offset = offset.min(self.len());
        let new_node = if text.len() > MAX_LEAF_CHARS {
            Self::from_str(text).root
        } else {
            leaf(text.to_string())
        };
        self.root = Self::insert_node(std::mem::take(&mut self.root), offset, new_node);
        self.rebalance_if_needed();
    }

    fn insert_node(node: RopeNode, offset: usize, new_node: RopeNode) -> RopeNode {
        match node {
            RopeNode::Empty => new_node,
            RopeNode::Leaf {
                text, char_count, ..
            } => {
                if offset == 0 {
                    Self::merge_nodes(new_node, leaf(text))
                } else if offset >= char_count {
                    Self::merge_nodes(leaf(text), new_node)
                } else {
                    let split = byte_index(&text, offset);
                    let (left_text, right_text) = text.split_at(split);
                    let left = Self::merge_nodes(leaf(left_text.to_string()), new_node);
                    Self::merge_nodes(left, leaf(right_text.to_string()))
                }
            }
            RopeNode::Branch {
                left,
                right,
                left_chars,
                ..
            } => {
                if offset <= left_chars {
                    let new_left = Self::insert_node(*left, offset, new_node);
                    Self::merge_nodes(new_left, *right)
                } else {
                    let new_right = Self::insert_node(*right, offset - left_chars, new_node);
                    Self::merge_nodes(*left, new_right)
                }
            }
        }
    }

    /// Delete the characters in `start..end`
    pub fn delete(&mut self, start: usize, end: usize) {
        if start >= end || start >= self.len() {
            return;
        }

        let end = end.min(self.len());
        self.root = Self::delete_range(std::mem::take(&mut self.root), start, end);
        self.rebalance_if_needed();
    }

    fn delete_range(node: RopeNode, start: usize, end: usize) -> RopeNode {
        match node {
            RopeNode::Empty => RopeNode::Empty,
            RopeNode::Leaf { text, .. } => {
                let s = byte_index(&text, start);
                let e = byte_index(&text, end);
                let mut kept = String::with_capacity(text.len() - (e - s));
                kept.push_str(&text[..s]);
                kept.push_str(&text[e..]);
                leaf(kept)
            }
            RopeNode::Branch {
                left,
                right,
                left_chars,
                ..
            } => {
                if end <= left_chars {
                    let new_left = Self::delete_range(*left, start, end);
                    Self::merge_nodes(new_left, *right)
                } else if start >= left_chars {
                    let new_right =
                        Self::delete_range(*right, start - left_chars, end - left_chars);
                    Self::merge_nodes(*left, new_right)
                } else {
                    let new_left = Self::delete_range(*left, start, left_chars);
                    let new_right = Self::delete_range(*right, 0, end - left_chars);
                    Self::merge_nodes(new_left, new_right)
                }
            }
        }
    }

    fn merge_nodes(left: RopeNode, right: RopeNode) -> RopeNode {
        match (&left, &right) {
            (RopeNode::Empty, _) => right,
            (_, RopeNode::Empty) => left,
            _ => {
                let left_chars = left.len();
                let left_lines = left.line_count();
                RopeNode::Branch {
                    left: Box::new(left),
                    right: Box::new(right),
                    left_chars,
                    left_lines,
                }
            }
        }
    }

    /// Text of the characters in `start..end`
    pub fn slice(&self, start: usize, end: usize) -> String {
        let mut result = String::with_capacity(end.saturating_sub(start));
        self.root.collect_range(start, end, &mut result);
        result
    }

    /// Character at `offset`
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.root.char_at(offset)
    }

    /// Number of `'\n'` characters strictly before `offset`
    pub fn lines_before(&self, offset: usize) -> usize {
        self.root.lines_before(offset.min(self.len()))
    }

    /// Character offset of the `n`-th (0-based) `'\n'`
    pub fn nth_newline(&self, n: usize) -> Option<usize> {
        if n >= self.line_count() {
            return None;
        }
        self.root.nth_newline(n)
    }

    fn rebalance_if_needed(&mut self) {
        let height = self.root.height();
        let optimal_height =
            (self.len() as f64 / MAX_LEAF_CHARS as f64).log2().ceil().max(0.0) as usize + 1;

        if height > optimal_height * 2 {
            let mut leaves = Vec::new();
            let root = std::mem::take(&mut self.root);
            root.collect_leaves(&mut leaves);
            self.root = Self::build_tree(leaves);
        }
    }
}

impl RopeNode {
    fn len(&self) -> usize {
        match self {
            RopeNode::Empty => 0,
            RopeNode::Leaf { char_count, .. } => *char_count,
            RopeNode::Branch {
                left_chars, right, ..
            } => left_chars + right.len(),
        }
    }

    fn line_count(&self) -> usize {
        match self {
            RopeNode::Empty => 0,
            RopeNode::Leaf { line_count, .. } => *line_count,
            RopeNode::Branch {
                left_lines, right, ..
            } => left_lines + right.line_count(),
        }
    }

    fn height(&self) -> usize {
        match self {
            RopeNode::Empty | RopeNode::Leaf { .. } => 1,
            RopeNode::Branch { left, right, .. } => 1 + left.height().max(right.height()),
        }
    }

    fn collect_leaves(self, leaves: &mut Vec<RopeNode>) {
        match self {
            RopeNode::Empty => {}
            RopeNode::Leaf { .. } => leaves.push(self),
            RopeNode::Branch { left, right, .. } => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
        }
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        match self {
            RopeNode::Empty => None,
            RopeNode::Leaf { text, .. } => text.chars().nth(offset),
            RopeNode::Branch {
                left,
                right,
                left_chars,
                ..
            } => {
                if offset < *left_chars {
                    left.char_at(offset)
                } else {
                    right.char_at(offset - left_chars)
                }
            }
        }
    }

    fn lines_before(&self, offset: usize) -> usize {
        match self {
            RopeNode::Empty => 0,
            RopeNode::Leaf { text, .. } => text.chars().take(offset).filter(|c| *c == '\n').count(),
            RopeNode::Branch {
                left,
                right,
                left_chars,
                left_lines,
            } => {
                if offset <= *left_chars {
                    left.lines_before(offset)
                } else {
                    left_lines + right.lines_before(offset - left_chars)
                }
            }
        }
    }

    fn nth_newline(&self, n: usize) -> Option<usize> {
        match self {
            RopeNode::Empty => None,
            RopeNode::Leaf { text, .. } => text
                .chars()
                .enumerate()
                .filter(|(_, c)| *c == '\n')
                .nth(n)
                .map(|(i, _)| i),
            RopeNode::Branch {
                left,
                right,
                left_chars,
                left_lines,
            } => {
                if n < *left_lines {
                    left.nth_newline(n)
                } else {
                    right
                        .nth_newline(n - left_lines)
                        .map(|offset| offset + left_chars)
                }
            }
        }
    }

    fn collect_range(&self, start: usize, end: usize, result: &mut String) {
        if start >= end {
            return;
        }

        match self {
            RopeNode::Empty => {}
            RopeNode::Leaf { text, .. } => {
                result.extend(text.chars().skip(start).take(end - start));
            }
            RopeNode::Branch {
                left,
                right,
                left_chars,
                ..
            } => {
                if start < *left_chars {
                    left.collect_range(start, end.min(*left_chars), result);
                }
                if end > *left_chars {
                    right.collect_range(
                        start.saturating_sub(*left_chars),
                        end - *left_chars,
                        result,
                    );
                }
            }
        }
    }

    fn collect_all(&self, result: &mut String) {
        match self {
            RopeNode::Empty => {}
            RopeNode::Leaf { text, .. } => result.push_str(text),
            RopeNode::Branch { left, right, .. } => {
                left.collect_all(result);
                right.collect_all(result);
            }
        }
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = String::new();
        self.root.collect_all(&mut result);
        f.write_str(&result)
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rope({:?})", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rope() {
        let rope = Rope::new();
        assert_eq!(rope.len(), 0);
        assert!(rope.is_empty());
    }

    #[test]
    fn test_char_indexing() {
        let rope = Rope::from_str("héllo wörld");
        assert_eq!(rope.len(), 11);
        assert_eq!(rope.slice(0, 5), "héllo");
        assert_eq!(rope.char_at(7), Some('ö'));
    }

    #[test]
    fn test_insert_and_delete() {
        let mut rope = Rope::from_str("Hello World");
        rope.insert(5, ",");
        assert_eq!(rope.to_string(), "Hello, World");
        rope.delete(5, 6);
        assert_eq!(rope.to_string(), "Hello World");
    }

    #[test]
    fn test_newline_queries() {
        let rope = Rope::from_str("ab\ncd\n\nef");
        assert_eq!(rope.line_count(), 3);
        assert_eq!(rope.lines_before(0), 0);
        assert_eq!(rope.lines_before(3), 1);
        assert_eq!(rope.lines_before(9), 3);
        assert_eq!(rope.nth_newline(0), Some(2));
        assert_eq!(rope.nth_newline(2), Some(6));
        assert_eq!(rope.nth_newline(3), None);
    }

    #[test]
    fn test_queries_across_leaves() {
        let mut text = "x".repeat(MAX_LEAF_CHARS - 1);
        text.push('\n');
        text.push_str(&"y".repeat(MAX_LEAF_CHARS));
        text.push('\n');
        let rope = Rope::from_str(&text);

        assert_eq!(rope.nth_newline(0), Some(MAX_LEAF_CHARS - 1));
        assert_eq!(rope.nth_newline(1), Some(2 * MAX_LEAF_CHARS));
        assert_eq!(rope.lines_before(MAX_LEAF_CHARS + 5), 1);
        assert_eq!(rope.char_at(MAX_LEAF_CHARS), Some('y'));
    }

    #[test]
    fn test_many_small_inserts_stay_consistent() {
        let mut rope = Rope::new();
        for i in 0..500 {
            rope.insert(rope.len(), if i % 10 == 9 { "\n" } else { "a" });
        }
        assert_eq!(rope.len(), 500);
        assert_eq!(rope.line_count(), 50);
        assert_eq!(rope.nth_newline(0), Some(9));
    }
}
