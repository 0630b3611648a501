//! A chain of queues, the input of the k-way merge.

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::list::{self, Ghost, Link, Links};
use crate::Queue;

/// An entry of a [`Chain`], owning one queue.
///
/// A context is only ever lent out by shared reference: its link belongs to
/// the ring of the chain. Mutable access goes through [`Chain::first_mut`]
/// and [`Chain::get_mut`], which hand out the queue alone.
#[repr(C)]
pub struct QueueContext {
    // Must stay the first field: a link pointer is cast to its context.
    link: Link,
    queue: Queue,
    id: usize,
}

impl QueueContext {
    fn from_link(link: NonNull<Link>) -> NonNull<QueueContext> {
        link.cast()
    }

    /// The id given by [`Chain::push`], counting from 0 in insertion order.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The queue owned by this context.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// The number of elements of the owned queue.
    pub fn size(&self) -> usize {
        self.queue.size()
    }
}

impl Debug for QueueContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueContext")
            .field("id", &self.id)
            .field("queue", &self.queue)
            .finish()
    }
}

/// A cyclic list of queues.
///
/// # Examples
///
/// ```
/// use ring_queue::{Chain, Queue};
/// use std::iter::FromIterator;
///
/// let mut chain = Chain::new();
/// chain.push(Queue::from_iter(["a", "d"]));
/// chain.push(Queue::from_iter(["b", "e"]));
/// chain.push(Queue::from_iter(["c"]));
///
/// assert_eq!(chain.merge(false), 5);
/// let first = chain.first().unwrap();
/// assert_eq!(first.queue(), &Queue::from_iter(["a", "b", "c", "d", "e"]));
/// assert!(chain.iter().skip(1).all(|context| context.queue().is_empty()));
/// ```
pub struct Chain {
    ghost: Ghost,
    len: usize,
    _marker: PhantomData<Box<QueueContext>>,
}

impl Chain {
    /// Creates an empty `Chain`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Chain;
    ///
    /// let chain = Chain::new();
    /// assert!(chain.is_empty());
    /// assert_eq!(chain.len(), 0);
    /// ```
    pub fn new() -> Self {
        let ghost = Ghost::new();
        let _marker = PhantomData;
        Self {
            ghost,
            len: 0,
            _marker,
        }
    }

    /// Returns the number of contexts, empty queues included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the chain has no context.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `queue` to the chain, and return the id of its context.
    pub fn push(&mut self, queue: Queue) -> usize {
        let id = self.len;
        let context = Box::new(QueueContext {
            link: Link::new(),
            queue,
            id,
        });
        let link = NonNull::from(Box::leak(context)).cast();
        // SAFETY: the context is detached, and the chain takes its ownership.
        unsafe { list::insert_before(link, self.ghost.link()) };
        self.len += 1;
        id
    }

    /// Returns the first context, or `None` if the chain is empty.
    pub fn first(&self) -> Option<&QueueContext> {
        self.iter().next()
    }

    /// Returns the queue of the first context, or `None` if the chain is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::{Chain, Queue};
    ///
    /// let mut chain = Chain::new();
    /// chain.push(Queue::new());
    /// chain.first_mut().unwrap().insert_tail("a").unwrap();
    /// assert_eq!(chain.first().unwrap().size(), 1);
    /// ```
    pub fn first_mut(&mut self) -> Option<&mut Queue> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the chain is not empty, so `ghost.next` is a context owned by us.
        unsafe {
            let front = self.ghost.link().as_ref().next;
            Some(Self::queue_of(front))
        }
    }

    /// Returns the context with the given id.
    pub fn get(&self, id: usize) -> Option<&QueueContext> {
        self.iter().find(|context| context.id == id)
    }

    /// Returns the queue of the context with the given id.
    pub fn get_mut(&mut self, id: usize) -> Option<&mut Queue> {
        // SAFETY: every link of the ring is a context owned by us, and only
        // the queue of the found context is borrowed mutably.
        unsafe {
            let link = Links::ring(self.ghost.link())
                .find(|link| QueueContext::from_link(*link).as_ref().id == id)?;
            Some(Self::queue_of(link))
        }
    }

    /// Borrow the queue of the context embedding `link`, leaving its link
    /// out of reach.
    unsafe fn queue_of<'a>(link: NonNull<Link>) -> &'a mut Queue {
        &mut (*QueueContext::from_link(link).as_ptr()).queue
    }

    /// Returns an iterator over the contexts, in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &QueueContext> + '_ {
        // SAFETY: the ring of the ghost node holds contexts only, which live as
        // long as the chain is borrowed.
        unsafe { Links::ring(self.ghost.link()) }
            .map(|link| unsafe { &*QueueContext::from_link(link).as_ptr() })
    }

    /// Merge every queue of the chain into the queue of the first context,
    /// and return the number of elements merged.
    ///
    /// Every queue must be sorted in the direction given by `descend`. The
    /// queues are merged pairwise in rounds (contexts `i` and `i + step` for
    /// `step` = 1, 2, 4, ...), so every element takes part in *O*(log(*k*))
    /// merges. Among equal payloads, elements of earlier contexts go first.
    ///
    /// Every other queue is left empty, but its context stays in the chain.
    pub fn merge(&mut self, descend: bool) -> usize {
        let head = self.ghost.link();
        let mut step = 1;
        while step < self.len {
            let mut merges = 0_usize;
            // SAFETY: every link reached from `head` is a context owned by us,
            // and `target` and `source` are always different contexts.
            unsafe {
                let mut target = head.as_ref().next;
                while target != head {
                    let source = advance(target, step, head);
                    if source == head {
                        break;
                    }
                    Self::queue_of(target).merge_from(Self::queue_of(source), descend);
                    merges += 1;
                    target = advance(source, step, head);
                }
            }
            tracing::debug!(step, merges, "merge round");
            step *= 2;
        }
        self.first().map_or(0, QueueContext::size)
    }
}

/// Walk `steps` links forward from `link`, stopping at `head`.
unsafe fn advance(mut link: NonNull<Link>, steps: usize, head: NonNull<Link>) -> NonNull<Link> {
    for _ in 0..steps {
        if link == head {
            break;
        }
        link = link.as_ref().next;
    }
    link
}

impl Debug for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        let head = self.ghost.link();
        // SAFETY: every link of the ring is a context allocated by `push`, and
        // `Links` reads the successor before yielding a link.
        unsafe {
            for link in Links::ring(head) {
                list::remove(link);
                drop(Box::from_raw(QueueContext::from_link(link).as_ptr()));
            }
        }
    }
}

unsafe impl Send for Chain {}

unsafe impl Sync for Chain {}
