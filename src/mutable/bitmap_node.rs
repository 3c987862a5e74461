use super::{
    array_node::ArrayNode,
    node::{next_shift, Node, Slot},
};
use crate::{
    bitmap::{fragment, Bitmap, PROMOTION_THRESHOLD},
    key_value::KeyValue,
    walk::{NodeInfo, NodeKind},
};
use std::{borrow::Borrow, mem};

#[derive(Debug)]
pub(crate) struct BitmapNode<K, V> {
    bitmap: Bitmap,
    slots: Vec<Slot<K, V>>,
}

impl<K, V> BitmapNode<K, V> {
    pub const fn new() -> Self {
        Self {
            bitmap: Bitmap::new(),
            slots: Vec::new(),
        }
    }

    pub fn singleton(shift: u32, key_value: KeyValue<K, V>) -> Self {
        Self {
            bitmap: Bitmap::new().set(fragment(key_value.hash(), shift)),
            slots: vec![Slot::Leaf(key_value)],
        }
    }

    pub fn wrap(shift: u32, hash: u64, node: Box<Node<K, V>>) -> Self {
        Self {
            bitmap: Bitmap::new().set(fragment(hash, shift)),
            slots: vec![Slot::Branch(node)],
        }
    }

    pub fn from_children(children: impl IntoIterator<Item = (u8, Box<Node<K, V>>)>) -> Self {
        let mut node = Self::new();

        for (index, child) in children {
            node.bitmap = node.bitmap.set(index);
            node.slots.push(Slot::Branch(child));
        }

        node
    }

    pub fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    /// Returns true if inserting `hash` needs a new slot but the node is at
    /// the promotion threshold.
    pub fn is_full(&self, shift: u32, hash: u64) -> bool {
        !self.bitmap.get(fragment(hash, shift)) && self.slots.len() >= PROMOTION_THRESHOLD
    }

    pub fn get<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Option<&KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        let bit = fragment(hash, shift);

        if !self.bitmap.get(bit) {
            return None;
        }

        match &self.slots[self.bitmap.index(bit)] {
            Slot::Branch(node) => node.get(next_shift(shift), hash, key),
            Slot::Leaf(key_value) => (key_value.key().borrow() == key).then_some(key_value),
        }
    }

    #[cfg(test)]
    pub fn size(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Leaf(_) => 1,
                Slot::Branch(node) => node.size(),
            })
            .sum()
    }

    pub fn children(&self) -> impl Iterator<Item = &Node<K, V>> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Leaf(_) => None,
            Slot::Branch(node) => Some(node.as_ref()),
        })
    }

    pub fn info(&self, shift: u32) -> NodeInfo {
        let branches = self.children().count();

        NodeInfo {
            kind: NodeKind::Bitmap,
            shift,
            bitmap: Some(self.bitmap.bits()),
            occupancy: self.bitmap.size(),
            leaves: self.slots.len() - branches,
            branches,
        }
    }

    /// Converts into an array node, leaving this node empty.
    pub fn promote(&mut self, shift: u32) -> ArrayNode<K, V> {
        let bitmap = mem::take(&mut self.bitmap);
        let slots = mem::take(&mut self.slots);

        ArrayNode::from_children(bitmap.iter().zip(slots).map(|(bit, slot)| {
            let child = match slot {
                Slot::Leaf(key_value) => {
                    Box::new(Node::Bitmap(Self::singleton(next_shift(shift), key_value)))
                }
                Slot::Branch(node) => node,
            };

            (bit, child)
        }))
    }

    #[cfg(test)]
    pub fn validate(&self, shift: u32) -> usize {
        assert_eq!(self.bitmap.size(), self.slots.len());
        assert!(!self.slots.is_empty());
        assert!(self.slots.len() <= PROMOTION_THRESHOLD);

        self.bitmap
            .iter()
            .zip(&self.slots)
            .map(|(bit, slot)| match slot {
                Slot::Leaf(key_value) => {
                    assert_eq!(fragment(key_value.hash(), shift), bit);
                    1
                }
                Slot::Branch(node) => node.validate(next_shift(shift)),
            })
            .sum()
    }
}

impl<K: Eq, V> BitmapNode<K, V> {
    pub fn get_mut<Q: Eq + ?Sized>(
        &mut self,
        shift: u32,
        hash: u64,
        key: &Q,
    ) -> Option<&mut KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        let bit = fragment(hash, shift);

        if !self.bitmap.get(bit) {
            return None;
        }

        match &mut self.slots[self.bitmap.index(bit)] {
            Slot::Branch(node) => node.get_mut(next_shift(shift), hash, key),
            Slot::Leaf(key_value) => (key_value.key().borrow() == key).then_some(key_value),
        }
    }

    /// Inserts into this node; the caller promotes full nodes beforehand.
    pub fn insert(&mut self, shift: u32, key_value: KeyValue<K, V>) -> Option<V> {
        let bit = fragment(key_value.hash(), shift);
        let index = self.bitmap.index(bit);

        if !self.bitmap.get(bit) {
            self.bitmap = self.bitmap.set(bit);
            self.slots.insert(index, Slot::Leaf(key_value));

            return None;
        }

        match &mut self.slots[index] {
            Slot::Branch(node) => node.insert(next_shift(shift), key_value),
            Slot::Leaf(existing) if existing.key() == key_value.key() => {
                let (_, value) = key_value.into_pair();

                Some(mem::replace(existing.value_mut(), value))
            }
            Slot::Leaf(_) => {
                self.push_down(shift, index, key_value);

                None
            }
        }
    }

    /// Replaces the leaf at `index` with a subtree holding it and `key_value`.
    fn push_down(&mut self, shift: u32, index: usize, key_value: KeyValue<K, V>) {
        let slot = mem::replace(&mut self.slots[index], Slot::Branch(Box::new(Node::new())));

        if let (Slot::Leaf(existing), Slot::Branch(node)) = (slot, &mut self.slots[index]) {
            **node = Node::pair(next_shift(shift), existing, key_value);
        }
    }

    pub fn remove<Q: Eq + ?Sized>(
        &mut self,
        shift: u32,
        hash: u64,
        key: &Q,
    ) -> Option<KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        let bit = fragment(hash, shift);

        if !self.bitmap.get(bit) {
            return None;
        }

        let index = self.bitmap.index(bit);

        match &mut self.slots[index] {
            Slot::Branch(node) => {
                let key_value = node.remove(next_shift(shift), hash, key)?;

                if node.is_empty() {
                    self.remove_slot(bit, index);
                }

                Some(key_value)
            }
            Slot::Leaf(key_value) if key_value.key().borrow() == key => {
                match self.remove_slot(bit, index) {
                    Slot::Leaf(key_value) => Some(key_value),
                    Slot::Branch(_) => None,
                }
            }
            Slot::Leaf(_) => None,
        }
    }

    fn remove_slot(&mut self, bit: u8, index: usize) -> Slot<K, V> {
        self.bitmap = self.bitmap.unset(bit);
        self.slots.remove(index)
    }
}
