//! Ordered operation container with a bidirectional cursor

use super::operation::{Operation, OperationKind};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationCollection {
    operations: VecDeque<Operation>,
}

impl OperationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection holding a single operation
    pub fn single(kind: OperationKind, position: usize) -> Self {
        let mut collection = Self::new();
        collection.push(kind, position);
        collection
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn last(&self) -> Option<&Operation> {
        self.operations.back()
    }

    pub fn append(&mut self, operation: Operation) {
        self.operations.push_back(operation);
    }

    pub fn prepend(&mut self, operation: Operation) {
        self.operations.push_front(operation);
    }

    /// Shorthand for appending a freshly built operation
    pub fn push(&mut self, kind: OperationKind, position: usize) {
        self.append(Operation::new(kind, position));
    }

    /// Move every operation of `other` to the end of this collection
    pub fn append_all(&mut self, mut other: OperationCollection) {
        if self.operations.is_empty() {
            self.operations = other.operations;
        } else {
            self.operations.append(&mut other.operations);
        }
    }

    /// Move every operation of `other` to the front of this collection, keeping its order
    pub fn prepend_all(&mut self, mut other: OperationCollection) {
        if other.operations.len() > self.operations.len() {
            other.operations.append(&mut self.operations);
            self.operations = other.operations;
        } else {
            while let Some(operation) = other.operations.pop_back() {
                self.operations.push_front(operation);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            collection: self,
            state: CursorState::BeforeStart,
        }
    }

    /// Nesting of `BeginScope`/`EndScope` and `BeginOpBlock`/`EndOpBlock` is balanced
    pub fn is_balanced(&self) -> bool {
        let mut open = Vec::new();
        for operation in &self.operations {
            match operation.kind {
                OperationKind::BeginScope => open.push(OperationKind::EndScope),
                OperationKind::BeginOpBlock => open.push(OperationKind::EndOpBlock),
                OperationKind::EndScope | OperationKind::EndOpBlock => {
                    if open.pop().as_ref() != Some(&operation.kind) {
                        return false;
                    }
                }
                _ => {}
            }
        }
        open.is_empty()
    }
}

impl FromIterator<Operation> for OperationCollection {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    BeforeStart,
    Active(usize),
    AfterEnd,
}

/// Cursor over an [`OperationCollection`]
///
/// Besides pointing at an element the cursor can sit before the first or after
/// the last element; [`current`](Cursor::current) is `None` in both cases.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    collection: &'a OperationCollection,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    /// Step forward. Returns `false` when the cursor leaves (or already left) the end.
    pub fn next(&mut self) -> bool {
        let len = self.collection.len();
        if len == 0 {
            return false;
        }
        match self.state {
            CursorState::BeforeStart => {
                self.state = CursorState::Active(0);
                true
            }
            CursorState::Active(index) if index + 1 < len => {
                self.state = CursorState::Active(index + 1);
                true
            }
            CursorState::Active(_) | CursorState::AfterEnd => {
                self.state = CursorState::AfterEnd;
                false
            }
        }
    }

    /// Step backward. From after the end the cursor re-enters at the last element.
    pub fn back(&mut self) -> bool {
        let len = self.collection.len();
        if len == 0 {
            return false;
        }
        match self.state {
            CursorState::BeforeStart | CursorState::Active(0) => {
                self.state = CursorState::BeforeStart;
                false
            }
            CursorState::Active(index) => {
                self.state = CursorState::Active(index - 1);
                true
            }
            CursorState::AfterEnd => {
                self.state = CursorState::Active(len - 1);
                true
            }
        }
    }

    pub fn current(&self) -> Option<&'a Operation> {
        match self.state {
            CursorState::Active(index) => self.collection.operations.get(index),
            _ => None,
        }
    }

    pub fn is_before_start(&self) -> bool {
        self.state == CursorState::BeforeStart
    }

    pub fn is_after_end(&self) -> bool {
        self.state == CursorState::AfterEnd
    }

    /// Kind of the operation right before the current one, leaving the cursor in place
    pub fn peek_previous(&self) -> Option<&'a OperationKind> {
        let mut probe = self.clone();
        if probe.back() {
            probe.current().map(|op| &op.kind)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(names: &[&str]) -> OperationCollection {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Operation::new(OperationKind::LoadSymbol(name.to_string()), i))
            .collect()
    }

    fn name_of(op: Option<&Operation>) -> Option<String> {
        match op.map(|op| &op.kind) {
            Some(OperationKind::LoadSymbol(name)) => Some(name.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_append_and_prepend_keep_order() {
        let mut ops = symbols(&["c"]);
        ops.prepend(Operation::new(OperationKind::LoadSymbol("b".into()), 0));
        ops.append(Operation::new(OperationKind::LoadSymbol("d".into()), 0));
        ops.prepend_all(symbols(&["x", "a"]));
        ops.append_all(symbols(&["e", "f"]));
        ops.prepend_all(OperationCollection::new());

        let names: Vec<_> = ops.iter().map(|op| name_of(Some(op)).unwrap()).collect();
        assert_eq!(names, ["x", "a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_prepend_all_longer_sequence() {
        let mut ops = symbols(&["z"]);
        ops.prepend_all(symbols(&["a", "b", "c"]));
        let names: Vec<_> = ops.iter().map(|op| name_of(Some(op)).unwrap()).collect();
        assert_eq!(names, ["a", "b", "c", "z"]);
    }

    #[test]
    fn test_cursor_walks_forward_then_back() {
        let ops = symbols(&["a", "b", "c"]);
        let mut cursor = ops.cursor();
        assert!(cursor.current().is_none());

        let mut forward = Vec::new();
        for _ in 0..3 {
            assert!(cursor.next());
            forward.push(name_of(cursor.current()).unwrap());
        }
        let mut backward = vec![name_of(cursor.current()).unwrap()];
        assert!(cursor.back());
        backward.push(name_of(cursor.current()).unwrap());
        assert!(cursor.back());
        backward.push(name_of(cursor.current()).unwrap());
        assert!(!cursor.back());
        assert!(cursor.is_before_start());
        assert!(cursor.current().is_none());

        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_cursor_after_end() {
        let ops = symbols(&["a", "b"]);
        let mut cursor = ops.cursor();
        while cursor.next() {}
        assert!(cursor.is_after_end());
        assert!(cursor.current().is_none());
        assert!(!cursor.next());
        assert!(cursor.is_after_end());

        assert!(cursor.back());
        assert_eq!(name_of(cursor.current()).as_deref(), Some("b"));
    }

    #[test]
    fn test_cursor_on_empty_collection() {
        let ops = OperationCollection::new();
        let mut cursor = ops.cursor();
        assert!(!cursor.next());
        assert!(!cursor.back());
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_peek_previous_leaves_cursor() {
        let ops = symbols(&["a", "b"]);
        let mut cursor = ops.cursor();
        cursor.next();
        assert!(cursor.peek_previous().is_none());
        cursor.next();
        assert_eq!(
            cursor.peek_previous(),
            Some(&OperationKind::LoadSymbol("a".into()))
        );
        assert_eq!(name_of(cursor.current()).as_deref(), Some("b"));
    }

    #[test]
    fn test_balance_check() {
        let balanced: OperationCollection = [
            OperationKind::BeginScope,
            OperationKind::BeginOpBlock,
            OperationKind::EndOpBlock,
            OperationKind::EndScope,
        ]
        .into_iter()
        .map(|kind| Operation::new(kind, 0))
        .collect();
        assert!(balanced.is_balanced());

        let crossed: OperationCollection = [
            OperationKind::BeginScope,
            OperationKind::BeginOpBlock,
            OperationKind::EndScope,
            OperationKind::EndOpBlock,
        ]
        .into_iter()
        .map(|kind| Operation::new(kind, 0))
        .collect();
        assert!(!crossed.is_balanced());
    }
}
