//! This crate provides a queue of strings built on an intrusive, doubly-linked,
//! cyclic list, together with a family of in-place list rewriting algorithms.
//!
//! The [`Queue`] allows inserting and removing elements at both ends in
//! constant time. Its rewriting algorithms (reversal, grouped reversal, stable
//! merge sort, duplicate removal, pairwise swap and monotonic pruning) only
//! relink nodes: no payload is copied and nothing is allocated.
//!
//! Here is a quick example showing how the queue works.
//!
//! ```
//! use ring_queue::Queue;
//! use std::iter::FromIterator;
//!
//! let mut queue = Queue::from_iter(["b", "d", "a", "c", "c"]);
//!
//! queue.insert_head("e").unwrap();
//! assert_eq!(queue.size(), 6);
//!
//! queue.sort(false);
//! assert_eq!(queue, Queue::from_iter(["a", "b", "c", "c", "d", "e"]));
//!
//! queue.delete_duplicates().unwrap(); // removes both "c"s
//! queue.reverse_k(2).unwrap();
//! assert_eq!(queue, Queue::from_iter(["b", "a", "e", "d"]));
//!
//! let element = queue.remove_tail(None).unwrap();
//! assert_eq!(element.value(), "d");
//! ```
//!
//! # Memory Layout
//!
//! The memory layout of the queue is like the following graph:
//! ```text
//!          ┌─────────────────────────────────────────────────────────────────────┐
//!          ↓                                                       (Ghost) Link  │
//!    ╔═══════════╗           ╔═══════════╗                        ┌───────────┐  │
//!    ║   next    ║ ────────→ ║   next    ║ ────────→ ┄┄ ────────→ │   next    │ ─┘
//!    ╟───────────╢           ╟───────────╢    Element 2, 3, ...   ├───────────┤
//! ┌─ ║   prev    ║ ←──────── ║   prev    ║ ←──────── ┄┄ ←──────── │   prev    │
//! │  ╟───────────╢           ╟───────────╢                        └───────────┘
//! │  ║  value    ║           ║  value    ║                            ↑   ↑
//! │  ╚═══════════╝           ╚═══════════╝                            │   │
//! │    Element 0               Element 1                              │   │
//! └───────────────────────────────────────────────────────────────────┘   │
//! ╔═══════════╗                                                           │
//! ║   ghost   ║ ──────────────────────────────────────────────────────────┘
//! ╚═══════════╝
//!     Queue
//! ```
//!
//! Each [`Element`] is a `#[repr(C)]` record whose first field is its
//! [`Link`](list::Link), so a link pointer is also a pointer to its element.
//! The ghost link is a bare `Link` with no payload. In an empty queue, the
//! `next` and `prev` of the ghost link point to itself.
//!
//! # Ownership
//!
//! A queue owns every element linked into it. [`Queue::remove_head`] and
//! [`Queue::remove_tail`] hand the unlinked element out as a `Box<Element>`;
//! dropping the box releases the payload and the node together, while
//! [`Queue::insert_element_tail`] gives it back to a queue.
//!
//! # Merging Queues
//!
//! A [`Chain`] holds several queues. [`Chain::merge`] merges all of them, each
//! sorted in the same direction, into the queue of its first context.
//!
//! # Features
//!
//! - `ring-checks` (default): in debug builds, assert that the neighbors of
//!   every attach point are adjacent before relinking.
//!
//! [`Element`]: crate::Element
//! [`Queue`]: crate::Queue
//! [`Chain`]: crate::Chain

#[doc(inline)]
pub use chain::{Chain, QueueContext};
#[doc(inline)]
pub use error::{Error, ErrorKind};
#[doc(inline)]
pub use queue::iterator::Iter;
#[doc(inline)]
pub use queue::{Element, Queue};

pub mod chain;
pub mod list;
pub mod queue;

mod error;
