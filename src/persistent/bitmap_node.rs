use super::{
    array_node::ArrayNode,
    node::{next_shift, Node, Removal, Slot},
};
use crate::{
    bitmap::{fragment, Bitmap, PROMOTION_THRESHOLD},
    key_value::KeyValue,
    walk::{NodeInfo, NodeKind},
};
use std::{borrow::Borrow, sync::Arc};
use tracing::trace;

/// Sparse node: one compact slot per set bit, in bit order.
#[derive(Clone, Debug)]
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

    /// Places `node` as the only branch, under the fragment of `hash`.
    pub fn wrap(shift: u32, hash: u64, node: Arc<Node<K, V>>) -> Self {
        Self {
            bitmap: Bitmap::new().set(fragment(hash, shift)),
            slots: vec![Slot::Branch(node)],
        }
    }

    /// Packs array children into branch slots. `children` must be in
    /// ascending slot order.
    pub fn from_children(children: impl IntoIterator<Item = (u8, Arc<Node<K, V>>)>) -> Self {
        let mut bitmap = Bitmap::new();
        let mut slots = vec![];

        for (index, child) in children {
            bitmap = bitmap.set(index);
            slots.push(Slot::Branch(child));
        }

        Self { bitmap, slots }
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

    pub fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
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

    #[cfg(test)]
    pub fn validate(&self, shift: u32) -> usize {
        assert_eq!(self.bitmap.size(), self.slots.len());
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

impl<K: Clone + Eq, V: Clone> BitmapNode<K, V> {
    pub fn insert(&self, shift: u32, key_value: KeyValue<K, V>) -> (Node<K, V>, bool) {
        let bit = fragment(key_value.hash(), shift);
        let index = self.bitmap.index(bit);

        if self.bitmap.get(bit) {
            let (slot, added) = match &self.slots[index] {
                Slot::Branch(node) => {
                    let (node, added) = Node::insert(node, next_shift(shift), key_value);

                    (Slot::Branch(node.into()), added)
                }
                Slot::Leaf(existing) if existing.key() == key_value.key() => {
                    (Slot::Leaf(key_value), false)
                }
                Slot::Leaf(existing) => (
                    Slot::Branch(Node::pair(next_shift(shift), existing.clone(), key_value).into()),
                    true,
                ),
            };

            (Node::Bitmap(self.replace_slot(index, slot)), added)
        } else if self.slots.len() < PROMOTION_THRESHOLD {
            let mut slots = Vec::with_capacity(self.slots.len() + 1);

            slots.extend_from_slice(&self.slots[..index]);
            slots.push(Slot::Leaf(key_value));
            slots.extend_from_slice(&self.slots[index..]);

            (
                Node::Bitmap(Self {
                    bitmap: self.bitmap.set(bit),
                    slots,
                }),
                true,
            )
        } else {
            trace!(shift, occupancy = self.slots.len(), "promoting bitmap node");

            self.promote(shift).insert(shift, key_value)
        }
    }

    pub fn remove<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Removal<Node<K, V>>
    where
        K: Borrow<Q>,
    {
        let bit = fragment(hash, shift);

        if !self.bitmap.get(bit) {
            return Removal::NotFound;
        }

        let index = self.bitmap.index(bit);

        match &self.slots[index] {
            Slot::Branch(node) => match node.remove(next_shift(shift), hash, key) {
                Removal::NotFound => Removal::NotFound,
                Removal::Emptied => self.remove_slot(bit, index),
                Removal::Updated(node) => Removal::Updated(Node::Bitmap(
                    self.replace_slot(index, Slot::Branch(node.into())),
                )),
            },
            Slot::Leaf(key_value) if key_value.key().borrow() == key => {
                self.remove_slot(bit, index)
            }
            Slot::Leaf(_) => Removal::NotFound,
        }
    }

    fn replace_slot(&self, index: usize, slot: Slot<K, V>) -> Self {
        let mut slots = self.slots.clone();

        slots[index] = slot;

        Self {
            bitmap: self.bitmap,
            slots,
        }
    }

    fn remove_slot(&self, bit: u8, index: usize) -> Removal<Node<K, V>> {
        if self.slots.len() == 1 {
            return Removal::Emptied;
        }

        let mut slots = self.slots.clone();

        slots.remove(index);

        Removal::Updated(Node::Bitmap(Self {
            bitmap: self.bitmap.unset(bit),
            slots,
        }))
    }

    /// Expands into an array node; leaves become singleton nodes one level
    /// down and existing children are shared as they are.
    fn promote(&self, shift: u32) -> ArrayNode<K, V> {
        ArrayNode::from_children(self.bitmap.iter().zip(&self.slots).map(|(bit, slot)| {
            let child = match slot {
                Slot::Leaf(key_value) => Arc::new(Node::Bitmap(Self::singleton(
                    next_shift(shift),
                    key_value.clone(),
                ))),
                Slot::Branch(node) => node.clone(),
            };

            (bit, child)
        }))
    }
}
