use super::{
    bitmap_node::BitmapNode,
    node::{next_shift, Node, Removal},
};
use crate::{
    bitmap::{fragment, DEMOTION_THRESHOLD, ENTRY_COUNT},
    key_value::KeyValue,
    walk::{NodeInfo, NodeKind},
};
use std::{borrow::Borrow, sync::Arc};
use tracing::trace;

/// Dense node indexed directly by hash fragment.
#[derive(Clone, Debug)]
pub(crate) struct ArrayNode<K, V> {
    count: usize,
    children: [Option<Arc<Node<K, V>>>; ENTRY_COUNT],
}

impl<K, V> ArrayNode<K, V> {
    pub fn from_children(children: impl IntoIterator<Item = (u8, Arc<Node<K, V>>)>) -> Self {
        let mut node = Self {
            count: 0,
            children: Default::default(),
        };

        for (index, child) in children {
            node.children[index as usize] = Some(child);
            node.count += 1;
        }

        node
    }

    pub fn get<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Option<&KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        self.children[fragment(hash, shift) as usize]
            .as_ref()?
            .get(next_shift(shift), hash, key)
    }

    pub fn slots(&self) -> &[Option<Arc<Node<K, V>>>] {
        &self.children
    }

    #[cfg(test)]
    pub fn size(&self) -> usize {
        self.children().map(Node::size).sum()
    }

    pub fn children(&self) -> impl Iterator<Item = &Node<K, V>> {
        self.children.iter().flatten().map(|child| &**child)
    }

    pub fn info(&self, shift: u32) -> NodeInfo {
        NodeInfo {
            kind: NodeKind::Array,
            shift,
            bitmap: None,
            occupancy: self.count,
            leaves: 0,
            branches: self.children().count(),
        }
    }

    #[cfg(test)]
    pub fn validate(&self, shift: u32) -> usize {
        assert_eq!(self.count, self.children().count());
        assert!(self.count > DEMOTION_THRESHOLD);

        self.children()
            .map(|node| node.validate(next_shift(shift)))
            .sum()
    }
}

impl<K: Clone + Eq, V: Clone> ArrayNode<K, V> {
    pub fn insert(&self, shift: u32, key_value: KeyValue<K, V>) -> (Node<K, V>, bool) {
        let index = fragment(key_value.hash(), shift) as usize;
        let mut node = self.clone();

        let added = match &self.children[index] {
            None => {
                node.children[index] = Some(Arc::new(Node::Bitmap(BitmapNode::singleton(
                    next_shift(shift),
                    key_value,
                ))));
                node.count += 1;

                true
            }
            Some(child) => {
                let (child, added) = Node::insert(child, next_shift(shift), key_value);

                node.children[index] = Some(child.into());

                added
            }
        };

        (Node::Array(node), added)
    }

    pub fn remove<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Removal<Node<K, V>>
    where
        K: Borrow<Q>,
    {
        let index = fragment(hash, shift) as usize;

        let Some(child) = &self.children[index] else {
            return Removal::NotFound;
        };

        match child.remove(next_shift(shift), hash, key) {
            Removal::NotFound => Removal::NotFound,
            Removal::Emptied if self.count == 1 => Removal::Emptied,
            Removal::Emptied if self.count - 1 <= DEMOTION_THRESHOLD => {
                trace!(shift, occupancy = self.count - 1, "demoting array node");

                Removal::Updated(Node::Bitmap(self.demote(index)))
            }
            Removal::Emptied => {
                let mut node = self.clone();

                node.children[index] = None;
                node.count -= 1;

                Removal::Updated(Node::Array(node))
            }
            Removal::Updated(child) => {
                let mut node = self.clone();

                node.children[index] = Some(child.into());

                Removal::Updated(Node::Array(node))
            }
        }
    }

    /// Packs every child except the one at `removed` into a bitmap node.
    fn demote(&self, removed: usize) -> BitmapNode<K, V> {
        BitmapNode::from_children(
            self.children
                .iter()
                .enumerate()
                .filter(|&(index, _)| index != removed)
                .filter_map(|(index, child)| Some((index as u8, child.clone()?))),
        )
    }
}
