use std::cmp::Ordering;

use snafu::prelude::*;

use crate::error::{EmptyQueueSnafu, Error, InvalidGroupSizeSnafu};
use crate::list::{self, Links};
use crate::queue::{Element, Queue};

mod sort;

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other)
    }
}

impl Eq for Queue {}

impl Queue {
    /// Delete the middle element.
    ///
    /// The middle of a queue of length *n* is the element at index
    /// ⌊*n* / 2⌋, which is the later of the two central elements when *n*
    /// is even. It is found by a slow/fast walk.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["a", "b", "c", "d"]);
    /// queue.delete_middle().unwrap();
    /// assert_eq!(queue, Queue::from_iter(["a", "b", "d"]));
    ///
    /// assert!(Queue::new().delete_middle().is_err());
    /// ```
    pub fn delete_middle(&mut self) -> Result<(), Error> {
        ensure!(
            !self.is_empty(),
            EmptyQueueSnafu {
                operation: "delete_middle"
            }
        );
        let head = self.ghost_node();
        // SAFETY: the queue is not empty, and `slow` never reaches the ghost node.
        unsafe {
            let (mut slow, mut fast) = (self.front_node(), self.front_node());
            while fast != head && fast.as_ref().next != head {
                slow = slow.as_ref().next;
                fast = fast.as_ref().next.as_ref().next;
            }
            Element::delete(slow);
        }
        Ok(())
    }

    /// Delete every element whose payload equals the payload of a neighbor.
    ///
    /// The queue is expected to be sorted, so that equal payloads are adjacent.
    /// A run of equal payloads is deleted entirely, including its first
    /// occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["a", "a", "b", "c", "c"]);
    /// queue.delete_duplicates().unwrap();
    /// assert_eq!(queue, Queue::from_iter(["b"]));
    /// ```
    pub fn delete_duplicates(&mut self) -> Result<(), Error> {
        ensure!(
            !self.is_empty(),
            EmptyQueueSnafu {
                operation: "delete_duplicates"
            }
        );
        let head = self.ghost_node();
        let mut in_run = false;
        let mut deleted = 0_usize;
        // SAFETY: `Links` reads the successor before yielding a node, so the
        // yielded node can be deleted.
        unsafe {
            for node in Links::ring(head) {
                let next = node.as_ref().next;
                if next != head && Element::value_of(node) == Element::value_of(next) {
                    in_run = true;
                } else if !std::mem::replace(&mut in_run, false) {
                    continue;
                }
                Element::delete(node);
                deleted += 1;
            }
        }
        tracing::trace!(deleted, "delete_duplicates");
        Ok(())
    }

    /// Swap every two adjacent elements by relinking them. A trailing unpaired
    /// element is left in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["1", "2", "3", "4", "5"]);
    /// queue.swap_pairs();
    /// assert_eq!(queue, Queue::from_iter(["2", "1", "4", "3", "5"]));
    /// ```
    pub fn swap_pairs(&mut self) {
        let head = self.ghost_node();
        let mut node = self.front_node();
        // SAFETY: `node` and `node.next` are elements of this queue.
        unsafe {
            while node != head && node.as_ref().next != head {
                list::move_after(node, node.as_ref().next);
                node = node.as_ref().next;
            }
        }
    }

    /// Reverse the queue in place.
    ///
    /// Every element is moved, from head to tail, right after the ghost node.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["a", "b", "c"]);
    /// queue.reverse();
    /// assert_eq!(queue, Queue::from_iter(["c", "b", "a"]));
    /// ```
    pub fn reverse(&mut self) {
        let head = self.ghost_node();
        // SAFETY: `Links` reads the successor before yielding a node, so the
        // yielded node can be moved.
        unsafe {
            for node in Links::ring(head) {
                list::move_after(node, head);
            }
        }
    }

    /// Reverse every group of `k` consecutive elements in place. The elements
    /// after the last complete group keep their order, so a `k` larger than
    /// the queue leaves it unchanged.
    ///
    /// Returns an error if `k` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["1", "2", "3", "4", "5"]);
    /// queue.reverse_k(3).unwrap();
    /// assert_eq!(queue, Queue::from_iter(["3", "2", "1", "4", "5"]));
    ///
    /// assert!(queue.reverse_k(0).is_err());
    /// ```
    pub fn reverse_k(&mut self, k: usize) -> Result<(), Error> {
        ensure!(k > 0, InvalidGroupSizeSnafu { k });
        let mut remaining = self.size();
        let mut groups = 0_usize;
        // `before` is the node before the current group.
        let mut before = self.ghost_node();
        // SAFETY: a group is only walked when at least `k` elements follow
        // `before`, so the walk stays within elements of this queue.
        unsafe {
            while remaining >= k {
                let front = before.as_ref().next;
                let mut node = front;
                for _ in 0..k {
                    let mut current = node;
                    node = current.as_ref().next;
                    let links = current.as_mut();
                    std::mem::swap(&mut links.next, &mut links.prev);
                }
                // `node` is the first node after the group; its `prev` is still
                // the old back of the group.
                let back = node.as_ref().prev;
                list::connect(before, back);
                list::connect(front, node);
                before = front;
                remaining -= k;
                groups += 1;
            }
        }
        tracing::trace!(k, groups, "reverse_k");
        Ok(())
    }

    /// Delete every element that has an element with a strictly smaller payload
    /// anywhere to its right, and return the number of elements left.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["1", "5", "2", "4", "3"]);
    /// assert_eq!(queue.prune_ascending(), 3);
    /// assert_eq!(queue, Queue::from_iter(["1", "2", "3"]));
    /// ```
    pub fn prune_ascending(&mut self) -> usize {
        self.prune(Ordering::Greater)
    }

    /// Delete every element that has an element with a strictly greater payload
    /// anywhere to its right, and return the number of elements left.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["1", "5", "2", "4", "3"]);
    /// assert_eq!(queue.prune_descending(), 3);
    /// assert_eq!(queue, Queue::from_iter(["5", "4", "3"]));
    /// ```
    pub fn prune_descending(&mut self) -> usize {
        self.prune(Ordering::Less)
    }

    /// Scan from the tail, carrying the running extremum, and delete every
    /// element that compares to it as `doomed`.
    fn prune(&mut self, doomed: Ordering) -> usize {
        if self.is_empty() {
            return 0;
        }
        let head = self.ghost_node();
        let mut survivors = 1;
        // SAFETY: the walk visits elements only, and reads `prev` of a node
        // before the node is deleted.
        unsafe {
            let mut extremum = self.back_node();
            let mut node = extremum.as_ref().prev;
            while node != head {
                let prev = node.as_ref().prev;
                if Element::value_of(node).cmp(Element::value_of(extremum)) == doomed {
                    Element::delete(node);
                } else {
                    extremum = node;
                    survivors += 1;
                }
                node = prev;
            }
        }
        tracing::trace!(survivors, "prune");
        survivors
    }
}
