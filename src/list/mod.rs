//! The intrusive cyclic list primitive.
//!
//! A [`Link`] is embedded as the first field of a `#[repr(C)]` record, so the
//! record is found from its link by a pointer cast. Links form a ring anchored
//! by a ghost link that never belongs to a record.
//!
//! All the functions here work on raw [`NonNull<Link>`] handles and are
//! `unsafe`: the caller guarantees that every handle points to a live link of a
//! well-formed ring, i.e. for every link `l` in the ring,
//! `l.next.prev == l` and `l.prev.next == l`.
//!
//! # Naming Conventions
//!
//! - `head`: the ghost link of a ring;
//! - `front..=back`: a closed range of links, both inclusive;
//! - `start..end`: a half-open range of links, left inclusive and right
//!   exclusive (probably the ghost link).

use std::alloc::{alloc, handle_alloc_error, Layout};
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// A pair of ring pointers, embedded in the record it links.
#[repr(C)]
pub struct Link {
    pub(crate) next: NonNull<Link>,
    pub(crate) prev: NonNull<Link>,
}

impl Link {
    /// Create an unlinked link, whose pointers are dangling until it is
    /// initialized by [`init`] or linked into a ring.
    pub const fn new() -> Self {
        Self {
            next: NonNull::dangling(),
            prev: NonNull::dangling(),
        }
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("next", &self.next)
            .field("prev", &self.prev)
            .finish()
    }
}

/// Make `prev` and `next` adjacent.
#[inline]
pub unsafe fn connect(mut prev: NonNull<Link>, mut next: NonNull<Link>) {
    prev.as_mut().next = next;
    next.as_mut().prev = prev;
}

/// Self-link `node`, making it an empty ring (or a detached singleton).
#[inline]
pub unsafe fn init(node: NonNull<Link>) {
    connect(node, node);
}

/// Link `node` between the adjacent links `prev` and `next`.
unsafe fn insert_between(node: NonNull<Link>, prev: NonNull<Link>, next: NonNull<Link>) {
    #[cfg(all(debug_assertions, feature = "ring-checks"))]
    assert_adjacent(prev, next);
    connect(prev, node);
    connect(node, next);
}

/// Link `node` right after `at`.
#[inline]
pub unsafe fn insert_after(node: NonNull<Link>, at: NonNull<Link>) {
    insert_between(node, at, at.as_ref().next);
}

/// Link `node` right before `at`.
#[inline]
pub unsafe fn insert_before(node: NonNull<Link>, at: NonNull<Link>) {
    insert_between(node, at.as_ref().prev, at);
}

/// Unlink `node` from its ring. The pointers of `node` are left as they are,
/// pointing into the ring it no longer belongs to.
#[inline]
pub unsafe fn remove(node: NonNull<Link>) {
    connect(node.as_ref().prev, node.as_ref().next);
}

/// Unlink `node` from its ring and self-link it.
#[inline]
pub unsafe fn remove_init(node: NonNull<Link>) {
    remove(node);
    init(node);
}

/// Returns `true` if the ring of `head` has no other link.
#[inline]
pub unsafe fn is_empty(head: NonNull<Link>) -> bool {
    head.as_ref().next == head
}

/// Returns `true` if the ring of `head` has exactly one other link.
#[inline]
pub unsafe fn is_singular(head: NonNull<Link>) -> bool {
    !is_empty(head) && head.as_ref().next == head.as_ref().prev
}

/// Unlink `node` and link it again right after `at`. `at` may belong to
/// another ring.
#[inline]
pub unsafe fn move_after(node: NonNull<Link>, at: NonNull<Link>) {
    remove(node);
    insert_after(node, at);
}

/// Unlink `node` and link it again right before `at`. `at` may belong to
/// another ring.
#[inline]
pub unsafe fn move_before(node: NonNull<Link>, at: NonNull<Link>) {
    remove(node);
    insert_before(node, at);
}

/// Move the non-empty range `front..=back` in between the adjacent links
/// `prev` and `next`.
unsafe fn attach_nodes(
    front: NonNull<Link>,
    back: NonNull<Link>,
    prev: NonNull<Link>,
    next: NonNull<Link>,
) {
    #[cfg(all(debug_assertions, feature = "ring-checks"))]
    assert_adjacent(prev, next);
    connect(prev, front);
    connect(back, next);
}

/// Move every link of the ring `list` right after `head`.
///
/// `list` itself keeps stale pointers and must be re-initialized before it
/// is used again; see [`splice_init`].
pub unsafe fn splice(list: NonNull<Link>, head: NonNull<Link>) {
    if !is_empty(list) {
        attach_nodes(
            list.as_ref().next,
            list.as_ref().prev,
            head,
            head.as_ref().next,
        );
    }
}

/// Move every link of the ring `list` right before `head`.
///
/// `list` itself keeps stale pointers and must be re-initialized before it
/// is used again; see [`splice_tail_init`].
pub unsafe fn splice_tail(list: NonNull<Link>, head: NonNull<Link>) {
    if !is_empty(list) {
        attach_nodes(
            list.as_ref().next,
            list.as_ref().prev,
            head.as_ref().prev,
            head,
        );
    }
}

/// Like [`splice`], but leaves `list` empty.
pub unsafe fn splice_init(list: NonNull<Link>, head: NonNull<Link>) {
    splice(list, head);
    init(list);
}

/// Like [`splice_tail`], but leaves `list` empty.
pub unsafe fn splice_tail_init(list: NonNull<Link>, head: NonNull<Link>) {
    splice_tail(list, head);
    init(list);
}

/// Move the front of the ring `head`, up to and including `at`, into the
/// ring `into`, whose previous content is discarded. The remainder stays in
/// `head`.
///
/// If `at` is `head` itself, `into` becomes empty and `head` is unchanged.
pub unsafe fn cut_position(into: NonNull<Link>, head: NonNull<Link>, at: NonNull<Link>) {
    if is_empty(head) {
        return;
    }
    if at == head {
        init(into);
        return;
    }
    let front = head.as_ref().next;
    let rest = at.as_ref().next;
    connect(into, front);
    connect(at, into);
    connect(head, rest);
}

/// Allocate `value` on the heap, or return `None` if the allocator fails.
///
/// The returned pointer is owned by the caller and must be released by
/// `Box::from_raw`.
pub(crate) fn try_leak<T>(value: T) -> Option<NonNull<T>> {
    let layout = Layout::new::<T>();
    debug_assert!(layout.size() > 0);
    // SAFETY: `layout` is non-zero-sized, because every record here embeds a `Link`.
    let ptr = NonNull::new(unsafe { alloc(layout) }.cast::<T>())?;
    // SAFETY: `ptr` is freshly allocated for a `T` and is not yet initialized.
    unsafe { ptr.as_ptr().write(value) };
    Some(ptr)
}

/// An owned ghost link, anchoring a ring on the heap so that it never moves
/// while linked.
pub(crate) struct Ghost {
    link: NonNull<Link>,
}

impl Ghost {
    pub(crate) fn try_new() -> Option<Self> {
        let link = try_leak(Link::new())?;
        // SAFETY: `link` is freshly allocated and owned by us.
        unsafe { init(link) };
        Some(Self { link })
    }

    pub(crate) fn new() -> Self {
        Self::try_new().unwrap_or_else(|| handle_alloc_error(Layout::new::<Link>()))
    }

    pub(crate) fn link(&self) -> NonNull<Link> {
        self.link
    }
}

impl Drop for Ghost {
    fn drop(&mut self) {
        // SAFETY: `link` is allocated by `try_leak`, and the owner of the ring
        // has unlinked everything else before dropping the ghost.
        unsafe {
            debug_assert!(is_empty(self.link), "ghost dropped with linked nodes");
            drop(Box::from_raw(self.link.as_ptr()));
        }
    }
}

/// An iterator over the links of the half-open range `start..end`.
///
/// The iterator reads the successor of a link before yielding it, so the
/// yielded link may be unlinked (or released) during forward iteration. This
/// does not hold for [`DoubleEndedIterator::next_back`].
#[derive(Clone)]
pub struct Links<'a> {
    start: NonNull<Link>,
    end: NonNull<Link>,
    _marker: PhantomData<&'a Link>,
}

impl<'a> Links<'a> {
    /// It is unsafe because `start..end` must be a valid range of a ring,
    /// which must outlive the iterator.
    pub unsafe fn new(start: NonNull<Link>, end: NonNull<Link>) -> Self {
        let _marker = PhantomData;
        Self { start, end, _marker }
    }

    /// Iterate over every link of the ring `head` except `head` itself.
    pub unsafe fn ring(head: NonNull<Link>) -> Self {
        Self::new(head.as_ref().next, head)
    }
}

impl<'a> Iterator for Links<'a> {
    type Item = NonNull<Link>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        let current = self.start;
        // SAFETY: `start..end` is a valid, non-empty range.
        self.start = unsafe { current.as_ref().next };
        Some(current)
    }
}

impl<'a> DoubleEndedIterator for Links<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: `start..end` is a valid, non-empty range.
        self.end = unsafe { self.end.as_ref().prev };
        Some(self.end)
    }
}

impl<'a> FusedIterator for Links<'a> {}

/// Returns `true` if every link of the ring `head` agrees with both of its
/// neighbors.
pub(crate) unsafe fn is_well_formed(head: NonNull<Link>) -> bool {
    let mut node = head;
    loop {
        let next = node.as_ref().next;
        if next.as_ref().prev != node {
            return false;
        }
        node = next;
        if node == head {
            return true;
        }
    }
}

#[cfg(all(debug_assertions, feature = "ring-checks"))]
unsafe fn assert_adjacent(prev: NonNull<Link>, next: NonNull<Link>) {
    assert_eq!(prev.as_ref().next, next);
    assert_eq!(next.as_ref().prev, prev);
}
