use super::node::{Node, Slot};
use crate::key_value::KeyValue;
use std::{iter::Flatten, slice, sync::Arc};

enum Frame<'a, K, V> {
    Slots(slice::Iter<'a, Slot<K, V>>),
    Children(Flatten<slice::Iter<'a, Option<Arc<Node<K, V>>>>>),
    Entries(slice::Iter<'a, KeyValue<K, V>>),
}

impl<'a, K, V> Frame<'a, K, V> {
    fn new(node: &'a Node<K, V>) -> Self {
        match node {
            Node::Bitmap(node) => Self::Slots(node.slots().iter()),
            Node::Array(node) => Self::Children(node.slots().iter().flatten()),
            Node::Collision(node) => Self::Entries(node.entries().iter()),
        }
    }
}

enum Step<'a, K, V> {
    Yield(&'a KeyValue<K, V>),
    Descend(&'a Node<K, V>),
}

/// Iterator over the entries of a [`PersistentHamt`](crate::PersistentHamt).
///
/// Entries come depth first in ascending slot order, which is deterministic
/// for a given structure but unrelated to key order.
pub struct Iter<'a, K, V> {
    null: Option<(&'a K, &'a V)>,
    stack: Vec<Frame<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(
        null: Option<(&'a K, &'a V)>,
        root: Option<&'a Node<K, V>>,
        remaining: usize,
    ) -> Self {
        Self {
            null,
            stack: root.map(Frame::new).into_iter().collect(),
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.null.take() {
            self.remaining -= 1;
            return Some(entry);
        }

        loop {
            let step = match self.stack.last_mut()? {
                Frame::Slots(slots) => slots.next().map(|slot| match slot {
                    Slot::Leaf(key_value) => Step::Yield(key_value),
                    Slot::Branch(node) => Step::Descend(node),
                }),
                Frame::Children(children) => children.next().map(|node| Step::Descend(node)),
                Frame::Entries(entries) => entries.next().map(Step::Yield),
            };

            match step {
                None => {
                    self.stack.pop();
                }
                Some(Step::Descend(node)) => self.stack.push(Frame::new(node)),
                Some(Step::Yield(key_value)) => {
                    self.remaining -= 1;
                    return Some((key_value.key(), key_value.value()));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the keys of a [`PersistentHamt`](crate::PersistentHamt).
pub struct Keys<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// Iterator over the values of a [`PersistentHamt`](crate::PersistentHamt).
pub struct Values<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
