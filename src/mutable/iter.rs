use super::node::{Node, Slot};
use crate::key_value::KeyValue;
use std::{iter::Flatten, slice};

enum Frame<'a, K, V> {
    Slots(slice::Iter<'a, Slot<K, V>>),
    Children(Flatten<slice::Iter<'a, Option<Box<Node<K, V>>>>>),
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

/// Iterator over the entries of a [`Hamt`](crate::Hamt), depth first in
/// ascending slot order.
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
            let frame = self.stack.last_mut()?;

            let node = match frame {
                Frame::Slots(slots) => match slots.next() {
                    Some(Slot::Leaf(key_value)) => {
                        self.remaining -= 1;
                        return Some((key_value.key(), key_value.value()));
                    }
                    Some(Slot::Branch(node)) => Some(&**node),
                    None => None,
                },
                Frame::Children(children) => children.next().map(|node| &**node),
                Frame::Entries(entries) => {
                    if let Some(key_value) = entries.next() {
                        self.remaining -= 1;
                        return Some((key_value.key(), key_value.value()));
                    }

                    None
                }
            };

            match node {
                Some(node) => self.stack.push(Frame::new(node)),
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the keys of a [`Hamt`](crate::Hamt).
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

/// Iterator over the values of a [`Hamt`](crate::Hamt).
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
