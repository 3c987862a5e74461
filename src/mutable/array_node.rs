use super::{
    bitmap_node::BitmapNode,
    node::{next_shift, Node},
};
use crate::{
    bitmap::{fragment, DEMOTION_THRESHOLD, ENTRY_COUNT},
    key_value::KeyValue,
    walk::{NodeInfo, NodeKind},
};
use std::{borrow::Borrow, mem};

#[derive(Debug)]
pub(crate) struct ArrayNode<K, V> {
    count: usize,
    children: [Option<Box<Node<K, V>>>; ENTRY_COUNT],
}

impl<K, V> ArrayNode<K, V> {
    pub fn from_children(children: impl IntoIterator<Item = (u8, Box<Node<K, V>>)>) -> Self {
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

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn slots(&self) -> &[Option<Box<Node<K, V>>>] {
        &self.children
    }

    /// Returns true once removals leave few enough children to pack.
    pub fn is_sparse(&self) -> bool {
        self.count <= DEMOTION_THRESHOLD
    }

    pub fn get<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Option<&KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        self.children[fragment(hash, shift) as usize]
            .as_ref()?
            .get(next_shift(shift), hash, key)
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

    /// Packs the children into a bitmap node, leaving this node empty.
    pub fn demote(&mut self) -> BitmapNode<K, V> {
        self.count = 0;

        BitmapNode::from_children(
            mem::take(&mut self.children)
                .into_iter()
                .enumerate()
                .filter_map(|(index, child)| Some((index as u8, child?))),
        )
    }

    #[cfg(test)]
    pub fn validate(&self, shift: u32) -> usize {
        assert_eq!(self.count, self.children().count());
        assert!(self.count > DEMOTION_THRESHOLD);

        self.children()
            .map(|node| {
                assert!(!node.is_empty());
                node.validate(next_shift(shift))
            })
            .sum()
    }
}

impl<K: Eq, V> ArrayNode<K, V> {
    pub fn get_mut<Q: Eq + ?Sized>(
        &mut self,
        shift: u32,
        hash: u64,
        key: &Q,
    ) -> Option<&mut KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        self.children[fragment(hash, shift) as usize]
            .as_mut()?
            .get_mut(next_shift(shift), hash, key)
    }

    pub fn insert(&mut self, shift: u32, key_value: KeyValue<K, V>) -> Option<V> {
        let child = &mut self.children[fragment(key_value.hash(), shift) as usize];

        match child {
            Some(node) => node.insert(next_shift(shift), key_value),
            None => {
                *child = Some(Box::new(Node::Bitmap(BitmapNode::singleton(
                    next_shift(shift),
                    key_value,
                ))));
                self.count += 1;

                None
            }
        }
    }

    /// Removes an entry, dropping the child it leaves empty. The caller
    /// demotes the node once it is sparse.
    pub fn remove<Q: Eq + ?Sized>(
        &mut self,
        shift: u32,
        hash: u64,
        key: &Q,
    ) -> Option<KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        let child = &mut self.children[fragment(hash, shift) as usize];
        let key_value = child.as_mut()?.remove(next_shift(shift), hash, key)?;

        if child.as_ref().is_some_and(|node| node.is_empty()) {
            *child = None;
            self.count -= 1;
        }

        Some(key_value)
    }
}
