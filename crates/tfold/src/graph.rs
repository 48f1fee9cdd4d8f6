//! # Token Graph
//!
//! The engine's working representation of a sequence: an arena-backed,
//! doubly-linked list of tokens, where every token additionally links to the
//! nearest preceding token of the same symbol class. The same-class links
//! form a DAG (each link points strictly earlier in the sequence), and are
//! what makes copy-pattern matching cheap: the previous occurrence of any
//! token is one hop away.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]; splicing
//! tombstones the removed slots instead of freeing them, so no allocation
//! ever happens after [`TokenGraph::build`]. Spliced-out nodes are never
//! reachable from a live node; any id taken before a splice is invalidated
//! by it unless it refers to a surviving node.

use crate::errors::{TfResult, TfoldError};

/// Arena index of a token node.
pub type NodeId = u32;

/// The null node id.
pub const NIL: NodeId = u32::MAX;

#[derive(Debug, Clone)]
struct Node {
    /// Symbol class. Raw symbols keep their input value; every token
    /// produced by a splice carries a class at or above the initial
    /// class space.
    class: u32,

    /// Input symbols covered by this token.
    span: u32,

    /// Sequence links.
    prev: NodeId,
    next: NodeId,

    /// Same-class chain: nearest preceding / following token with this
    /// node's class. `prev_same` is the published back-link; `next_same`
    /// exists so the chain can be repaired in O(1) when a node leaves it.
    prev_same: NodeId,
    next_same: NodeId,

    live: bool,
}

/// A doubly-linked token list over an arena, with same-class back-links.
#[derive(Debug, Clone)]
pub struct TokenGraph {
    nodes: Vec<Node>,
    head: NodeId,
    tail: NodeId,
    len: usize,
    next_class: u32,
}

impl TokenGraph {
    /// Builds a token list from a symbol sequence.
    ///
    /// Each symbol becomes one token of span 1. The same-class links are
    /// established by a single backward pass over a per-class "last seen"
    /// table, so that every token points at its nearest preceding
    /// same-class token with nothing of that class in between.
    ///
    /// ## Errors
    /// [`TfoldError::InputTooLarge`] if the sequence exceeds the arena's
    /// addressable size, [`TfoldError::Allocation`] if the arena cannot be
    /// reserved.
    pub fn build(symbols: &[u32]) -> TfResult<Self> {
        let count = symbols.len();
        if count >= NIL as usize {
            return Err(TfoldError::InputTooLarge {
                symbols: count as u64,
            });
        }

        let mut nodes = Vec::new();
        nodes.try_reserve_exact(count)?;
        for (i, &class) in symbols.iter().enumerate() {
            nodes.push(Node {
                class,
                span: 1,
                prev: if i == 0 { NIL } else { (i - 1) as NodeId },
                next: if i + 1 == count {
                    NIL
                } else {
                    (i + 1) as NodeId
                },
                prev_same: NIL,
                next_same: NIL,
                live: true,
            });
        }

        let class_space = symbols.iter().max().map_or(0, |&m| m + 1);
        let mut last_seen = vec![NIL; class_space as usize];
        for i in (0..count).rev() {
            let class = symbols[i] as usize;
            let follower = last_seen[class];
            if follower != NIL {
                nodes[follower as usize].prev_same = i as NodeId;
                nodes[i].next_same = follower;
            }
            last_seen[class] = i as NodeId;
        }

        Ok(Self {
            nodes,
            head: if count == 0 { NIL } else { 0 },
            tail: if count == 0 { NIL } else { (count - 1) as NodeId },
            len: count,
            next_class: class_space,
        })
    }

    /// Current list length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First token, or [`NIL`] for an empty list.
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// Last token, or [`NIL`] for an empty list.
    pub fn tail(&self) -> NodeId {
        self.tail
    }

    /// Symbol class of a live token.
    #[inline]
    pub fn class(&self, id: NodeId) -> u32 {
        self.node(id).class
    }

    /// Input symbols covered by a live token.
    #[inline]
    pub fn span(&self, id: NodeId) -> u32 {
        self.node(id).span
    }

    /// Preceding token in sequence order, or [`NIL`].
    #[inline]
    pub fn prev(&self, id: NodeId) -> NodeId {
        self.node(id).prev
    }

    /// Following token in sequence order, or [`NIL`].
    #[inline]
    pub fn next(&self, id: NodeId) -> NodeId {
        self.node(id).next
    }

    /// Nearest preceding token with the same class, or [`NIL`].
    #[inline]
    pub fn prev_same(&self, id: NodeId) -> NodeId {
        self.node(id).prev_same
    }

    /// Reserves a symbol class that no current or past token has carried.
    pub fn fresh_class(&mut self) -> u32 {
        let class = self.next_class;
        self.next_class += 1;
        class
    }

    /// Iterates live tokens in sequence order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            if cur == NIL {
                None
            } else {
                let id = cur;
                cur = self.node(id).next;
                Some(id)
            }
        })
    }

    /// Finds the longest match for the token sequence starting at `anchor`.
    ///
    /// Walks the same-class back-link to the previous occurrence of the
    /// anchor's class, then walks both positions forward while their
    /// classes agree. The forward walk is bounded by the anchor, so the
    /// matched region never overlaps the anchor's own tail.
    ///
    /// ## Returns
    /// The previous occurrence and the matched length (at least 1), or
    /// `None` when the anchor's class has no earlier occurrence.
    pub fn find_match(&self, anchor: NodeId) -> Option<(NodeId, usize)> {
        let start = self.node(anchor).prev_same;
        if start == NIL {
            return None;
        }
        debug_assert_eq!(self.node(start).class, self.node(anchor).class);

        let mut a = start;
        let mut b = anchor;
        let mut length = 0;
        while b != NIL && a != anchor && self.node(a).class == self.node(b).class {
            length += 1;
            a = self.node(a).next;
            b = self.node(b).next;
        }
        Some((start, length))
    }

    /// Replaces the inclusive run `[first..=last]` with a single token.
    ///
    /// The surviving node is `last`, rebranded to `new_class` with the
    /// combined span of the run; every other node of the run is tombstoned
    /// and unlinked, repairing the same-class chains that passed through
    /// it. The new token's back-link is reset to the nearest preceding
    /// token of `new_class` (necessarily none the first time a class
    /// appears), located by scanning outward from the run.
    ///
    /// ## Returns
    /// The id of the new token (aliases `last`).
    pub fn splice(&mut self, first: NodeId, last: NodeId, new_class: u32) -> NodeId {
        let before = self.rfind_class(self.node(first).prev, new_class);
        let after = if before == NIL {
            self.ffind_class(self.node(last).next, new_class)
        } else {
            NIL
        };
        self.splice_linked(first, last, new_class, before, after)
    }

    /// [`TokenGraph::splice`] with the new token's chain position already
    /// resolved by the caller: it is inserted after `before`, or becomes
    /// the chain head with `after` as its follower when `before` is [`NIL`].
    pub(crate) fn splice_linked(
        &mut self,
        first: NodeId,
        last: NodeId,
        new_class: u32,
        before: NodeId,
        after: NodeId,
    ) -> NodeId {
        debug_assert!(self.node(first).live && self.node(last).live);

        let anchor_prev = self.node(first).prev;
        let mut span_total: u32 = 0;
        let mut removed = 0usize;
        let mut cur = first;
        loop {
            let next = self.node(cur).next;
            span_total += self.node(cur).span;
            self.unlink_same(cur);
            if cur == last {
                break;
            }
            let node = self.node_mut(cur);
            node.live = false;
            node.prev = NIL;
            node.next = NIL;
            removed += 1;
            cur = next;
        }

        self.node_mut(last).prev = anchor_prev;
        if anchor_prev != NIL {
            self.node_mut(anchor_prev).next = last;
        } else {
            self.head = last;
        }

        {
            let node = self.node_mut(last);
            node.class = new_class;
            node.span = span_total;
            node.prev_same = before;
            node.next_same = NIL;
        }
        if before != NIL {
            debug_assert_eq!(self.node(before).class, new_class);
            let follower = self.node(before).next_same;
            self.node_mut(last).next_same = follower;
            if follower != NIL {
                self.node_mut(follower).prev_same = last;
            }
            self.node_mut(before).next_same = last;
        } else if after != NIL {
            debug_assert_eq!(self.node(after).class, new_class);
            self.node_mut(last).next_same = after;
            self.node_mut(after).prev_same = last;
        }

        self.len -= removed;
        last
    }

    /// Verifies the structural invariants, returning the first violation.
    ///
    /// Checks that the sequence links mirror each other and account for
    /// every live node, and that every back-link points at the nearest
    /// preceding token of the same class with nothing of that class in
    /// between. Intended for tests and debug diagnostics; linear passes,
    /// but allocates a per-class table.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        use std::collections::HashMap;

        let mut seen = 0usize;
        let mut last_by_class: HashMap<u32, NodeId> = HashMap::new();
        let mut prev = NIL;
        let mut cur = self.head;
        while cur != NIL {
            let node = &self.nodes[cur as usize];
            if !node.live {
                return Err("sequence link reaches a tombstoned node");
            }
            if node.prev != prev {
                return Err("sequence links do not mirror");
            }
            if node.span == 0 {
                return Err("token with zero span");
            }

            let expected = last_by_class.get(&node.class).copied().unwrap_or(NIL);
            if node.prev_same != expected {
                return Err("back-link is not the nearest preceding occurrence");
            }
            if node.prev_same != NIL && self.nodes[node.prev_same as usize].next_same != cur {
                return Err("same-class chain does not mirror");
            }
            last_by_class.insert(node.class, cur);

            seen += 1;
            prev = cur;
            cur = node.next;
        }
        if prev != self.tail {
            return Err("tail link is stale");
        }
        if seen != self.len {
            return Err("length does not match live node count");
        }
        Ok(())
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        let node = &self.nodes[id as usize];
        debug_assert!(node.live, "access to tombstoned node {id}");
        node
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    /// Removes a node from its same-class chain, repairing its neighbours.
    fn unlink_same(&mut self, id: NodeId) {
        let (before, after) = {
            let node = self.node_mut(id);
            let links = (node.prev_same, node.next_same);
            node.prev_same = NIL;
            node.next_same = NIL;
            links
        };
        if before != NIL {
            self.node_mut(before).next_same = after;
        }
        if after != NIL {
            self.node_mut(after).prev_same = before;
        }
    }

    /// Nearest node at or before `from` (sequence order) with `class`.
    fn rfind_class(&self, from: NodeId, class: u32) -> NodeId {
        let mut cur = from;
        while cur != NIL && self.node(cur).class != class {
            cur = self.node(cur).prev;
        }
        cur
    }

    /// Nearest node at or after `from` (sequence order) with `class`.
    fn ffind_class(&self, from: NodeId, class: u32) -> NodeId {
        let mut cur = from;
        while cur != NIL && self.node(cur).class != class {
            cur = self.node(cur).next;
        }
        cur
    }
}
