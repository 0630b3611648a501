use std::alloc::{handle_alloc_error, Layout};
use std::fmt::{self, Debug, Formatter};
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use snafu::prelude::*;

use crate::error::{AllocElementSnafu, AllocPayloadSnafu, Error};
use crate::list::{self, Ghost, Link};
use crate::Iter;

pub mod iterator;

mod algorithms;

/// An element of a [`Queue`]: an owned text payload with an embedded link.
///
/// An element removed from a queue is handed out as a `Box<Element>`. Dropping
/// the box (or calling [`Element::release`]) frees the payload and the node
/// together; [`Queue::insert_element_head`] and [`Queue::insert_element_tail`]
/// give it back to a queue instead.
#[repr(C)]
pub struct Element {
    // Must stay the first field: a link pointer is cast to its element.
    link: Link,
    value: String,
}

/// The allocations made by `Element::try_new`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AllocStep {
    Payload,
    Element,
}

#[cfg(not(test))]
#[inline]
fn fails(_step: AllocStep) -> bool {
    false
}

#[cfg(test)]
thread_local! {
    /// The allocation step that tests on this thread force to fail.
    static FAILING_STEP: std::cell::Cell<Option<AllocStep>> = std::cell::Cell::new(None);
}

#[cfg(test)]
fn fails(step: AllocStep) -> bool {
    FAILING_STEP.with(|failing| failing.get() == Some(step))
}

/// The `Queue` is a queue of strings on an intrusive cyclic list.
///
/// The `Queue` owns a ghost link (the sentinel) and every [`Element`] linked
/// after it. Inserting or removing at either end takes *O*(1) time; the
/// length is not cached, so [`Queue::size`] takes *O*(*n*) time.
///
/// # Examples
///
/// ```
/// use ring_queue::Queue;
///
/// let mut queue = Queue::new();
/// queue.insert_tail("b").unwrap();
/// queue.insert_head("a").unwrap();
/// queue.insert_tail("c").unwrap();
/// assert_eq!(queue.size(), 3);
///
/// let mut buf = [0xff; 4];
/// let element = queue.remove_head(Some(&mut buf[..])).unwrap();
/// assert_eq!(element.value(), "a");
/// assert_eq!(&buf, b"a\0\0\0");
///
/// assert_eq!(queue.iter().collect::<Vec<_>>(), ["b", "c"]);
/// ```
pub struct Queue {
    ghost: Ghost,
    _marker: PhantomData<Box<Element>>,
}

impl Element {
    /// Allocate a detached element holding a copy of `value`.
    fn try_new(value: &str) -> Result<NonNull<Element>, Error> {
        let len = value.len();
        let mut payload = String::new();
        if fails(AllocStep::Payload) || payload.try_reserve_exact(len).is_err() {
            tracing::debug!(len, "payload allocation failed");
            return AllocPayloadSnafu { len }.fail();
        }
        payload.push_str(value);
        let element = if fails(AllocStep::Element) {
            None
        } else {
            list::try_leak(Element {
                link: Link::new(),
                value: payload,
            })
        };
        if element.is_none() {
            tracing::debug!(len, "element allocation failed");
        }
        element.context(AllocElementSnafu)
    }

    pub(crate) fn from_link(link: NonNull<Link>) -> NonNull<Element> {
        link.cast()
    }

    /// Give up the ownership of `element`, and return its link.
    fn into_link(element: Box<Element>) -> NonNull<Link> {
        NonNull::from(Box::leak(element)).cast()
    }

    /// Read the payload of the element that embeds `link`.
    ///
    /// It is unsafe because `link` must be embedded in a live `Element`
    /// (not a ghost link), which must outlive `'a`.
    pub(crate) unsafe fn value_of<'a>(link: NonNull<Link>) -> &'a str {
        &(*Self::from_link(link).as_ptr()).value
    }

    /// Unlink the element that embeds `link` from its ring and release it.
    pub(crate) unsafe fn delete(link: NonNull<Link>) {
        list::remove(link);
        drop(Box::from_raw(Self::from_link(link).as_ptr()));
    }

    /// Returns the payload.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consume the element and return its payload.
    pub fn into_value(self: Box<Self>) -> String {
        self.value
    }

    /// Release the payload and the node together.
    pub fn release(self: Box<Self>) {
        drop(self)
    }

    /// Copy the payload into `buf` as a NUL-terminated byte string.
    ///
    /// At most `buf.len() - 1` bytes are copied, the rest of `buf` is filled
    /// with zeros. An empty `buf` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["gerbil"]);
    /// let element = queue.remove_head(None).unwrap();
    ///
    /// let mut buf = [0xff; 4];
    /// element.copy_to(&mut buf);
    /// assert_eq!(&buf, b"ger\0");
    /// ```
    pub fn copy_to(&self, buf: &mut [u8]) {
        let last = match buf.len().checked_sub(1) {
            Some(last) => last,
            None => return,
        };
        let bytes = self.value.as_bytes();
        let n = bytes.len().min(last);
        buf[..n].copy_from_slice(&bytes[..n]);
        buf[n..].iter_mut().for_each(|b| *b = 0);
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element").field(&self.value).finish()
    }
}

// private methods
impl Queue {
    pub(crate) fn ghost_node(&self) -> NonNull<Link> {
        self.ghost.link()
    }
    pub(crate) fn front_node(&self) -> NonNull<Link> {
        // SAFETY: `ghost.next` is always valid (either `ghost` itself, or the first element).
        unsafe { self.ghost_node().as_ref().next }
    }
    pub(crate) fn back_node(&self) -> NonNull<Link> {
        // SAFETY: `ghost.prev` is always valid (either `ghost` itself, or the last element).
        unsafe { self.ghost_node().as_ref().prev }
    }

    /// Unlink the element of `link`, and hand it out as a box.
    ///
    /// It is unsafe because `link` must be a non-ghost link of this queue.
    unsafe fn detach(&mut self, link: NonNull<Link>, buf: Option<&mut [u8]>) -> Box<Element> {
        list::remove_init(link);
        let element = Box::from_raw(Element::from_link(link).as_ptr());
        if let Some(buf) = buf {
            element.copy_to(buf);
        }
        element
    }
}

impl Queue {
    /// Create an empty `Queue`.
    ///
    /// Aborts like `Box::new` if the sentinel cannot be allocated; see
    /// [`Queue::try_new`].
    pub fn new() -> Self {
        let ghost = Ghost::new();
        let _marker = PhantomData;
        Self { ghost, _marker }
    }

    /// Create an empty `Queue`, or return an error if the sentinel cannot be
    /// allocated.
    pub fn try_new() -> Result<Self, Error> {
        let ghost = Ghost::try_new().context(AllocElementSnafu)?;
        let _marker = PhantomData;
        Ok(Self { ghost, _marker })
    }

    /// Returns `true` if the `Queue` is empty.
    ///
    /// This operation should compute in *O*(1) time.
    pub fn is_empty(&self) -> bool {
        self.front_node() == self.ghost_node()
    }

    /// Returns the number of elements.
    ///
    /// This operation should compute in *O*(*n*) time.
    pub fn size(&self) -> usize {
        // SAFETY: the ring of the ghost node is well-formed.
        unsafe { list::Links::ring(self.ghost_node()) }.count()
    }

    /// Provides the payload of the front element, or `None` if the queue is
    /// empty.
    pub fn front(&self) -> Option<&str> {
        self.iter().next()
    }

    /// Provides the payload of the back element, or `None` if the queue is
    /// empty.
    pub fn back(&self) -> Option<&str> {
        self.iter().next_back()
    }

    /// Insert a copy of `value` at the head of the queue.
    ///
    /// On allocation failure an error is returned and the queue is unchanged.
    pub fn insert_head(&mut self, value: &str) -> Result<(), Error> {
        let element = Element::try_new(value)?;
        // SAFETY: `element` is a fresh, detached element owned by us.
        unsafe { list::insert_after(element.cast(), self.ghost_node()) };
        Ok(())
    }

    /// Insert a copy of `value` at the tail of the queue.
    ///
    /// On allocation failure an error is returned and the queue is unchanged.
    pub fn insert_tail(&mut self, value: &str) -> Result<(), Error> {
        let element = Element::try_new(value)?;
        // SAFETY: `element` is a fresh, detached element owned by us.
        unsafe { list::insert_before(element.cast(), self.ghost_node()) };
        Ok(())
    }

    /// Give a removed element back to the queue, at its head.
    pub fn insert_element_head(&mut self, element: Box<Element>) {
        let link = Element::into_link(element);
        // SAFETY: the element is detached, and the queue takes its ownership.
        unsafe { list::insert_after(link, self.ghost_node()) };
    }

    /// Give a removed element back to the queue, at its tail.
    pub fn insert_element_tail(&mut self, element: Box<Element>) {
        let link = Element::into_link(element);
        // SAFETY: the element is detached, and the queue takes its ownership.
        unsafe { list::insert_before(link, self.ghost_node()) };
    }

    /// Unlink the head element and return it, or return `None` if the queue is
    /// empty.
    ///
    /// If `buf` is given, the payload is copied into it by
    /// [`Element::copy_to`].
    pub fn remove_head(&mut self, buf: Option<&mut [u8]>) -> Option<Box<Element>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the queue is not empty, so the front node is an element.
        Some(unsafe { self.detach(self.front_node(), buf) })
    }

    /// Unlink the tail element and return it, or return `None` if the queue is
    /// empty.
    ///
    /// If `buf` is given, the payload is copied into it by
    /// [`Element::copy_to`].
    pub fn remove_tail(&mut self, buf: Option<&mut [u8]>) -> Option<Box<Element>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the queue is not empty, so the back node is an element.
        Some(unsafe { self.detach(self.back_node(), buf) })
    }

    /// Release every element.
    pub fn clear(&mut self) {
        while self.remove_head(None).is_some() {}
    }

    /// Returns an iterator over the payloads, from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Returns `true` if every link of the queue agrees with both of its
    /// neighbors.
    pub fn is_well_formed(&self) -> bool {
        // SAFETY: every pointer reachable from the ghost node is live.
        unsafe { list::is_well_formed(self.ghost_node()) }
    }
}

impl Debug for Queue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Queue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

impl<S: AsRef<str>> Extend<S> for Queue {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for value in iter {
            if self.insert_tail(value.as_ref()).is_err() {
                handle_alloc_error(Layout::new::<Element>());
            }
        }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.clear();
    }
}

unsafe impl Send for Queue {}

unsafe impl Sync for Queue {}

unsafe impl Send for Element {}

unsafe impl Sync for Element {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ErrorKind;

    pub(crate) fn values(queue: &Queue) -> Vec<&str> {
        assert!(queue.is_well_formed());
        queue.iter().collect()
    }

    #[test]
    fn queue_create() {
        let queue = Queue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.size(), 0);
        assert!(queue.is_well_formed());
        drop(queue);

        let queue = Queue::try_new().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn queue_insert_and_remove() {
        let mut queue = Queue::new();
        assert!(queue.remove_head(None).is_none());
        assert!(queue.remove_tail(None).is_none());

        queue.insert_head("b").unwrap();
        queue.insert_head("a").unwrap();
        queue.insert_tail("c").unwrap();
        assert_eq!(values(&queue), ["a", "b", "c"]);
        assert_eq!(queue.front(), Some("a"));
        assert_eq!(queue.back(), Some("c"));
        assert_eq!(queue.size(), 3);

        let tail = queue.remove_tail(None).unwrap();
        assert_eq!(tail.value(), "c");
        let head = queue.remove_head(None).unwrap();
        assert_eq!(head.value(), "a");
        assert_eq!(values(&queue), ["b"]);

        queue.insert_element_head(tail);
        queue.insert_element_tail(head);
        assert_eq!(values(&queue), ["c", "b", "a"]);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.front(), None);
        assert_eq!(queue.back(), None);
    }

    #[test]
    fn queue_insert_failure() {
        fn fail_at(step: Option<AllocStep>) {
            FAILING_STEP.with(|failing| failing.set(step));
        }

        let mut queue = Queue::from_iter(["a", "b"]);

        fail_at(Some(AllocStep::Payload));
        let error = queue.insert_head("xyz").unwrap_err();
        assert_eq!(error, Error::AllocPayload { len: 3 });
        assert_eq!(error.kind(), ErrorKind::ResourceExhausted);
        assert_eq!(values(&queue), ["a", "b"]);

        fail_at(Some(AllocStep::Element));
        assert_eq!(queue.insert_tail("xyz"), Err(Error::AllocElement));
        assert_eq!(queue.insert_head(""), Err(Error::AllocElement));
        assert_eq!(values(&queue), ["a", "b"]);
        assert_eq!(queue.size(), 2);

        let mut empty = Queue::new();
        assert!(empty.insert_tail("x").is_err());
        assert!(empty.is_empty());
        assert!(empty.is_well_formed());

        fail_at(None);
        queue.insert_tail("c").unwrap();
        assert_eq!(values(&queue), ["a", "b", "c"]);
    }

    #[test]
    fn queue_insert_copies_value() {
        let mut queue = Queue::new();
        let mut value = String::from("dolphin");
        queue.insert_tail(&value).unwrap();
        value.clear();
        value.push_str("whale");
        queue.insert_tail(&value).unwrap();
        drop(value);
        assert_eq!(values(&queue), ["dolphin", "whale"]);
    }

    #[test]
    fn queue_size() {
        let mut queue = Queue::new();
        let mut expected = 0;
        for i in 0..20 {
            if i % 3 == 2 {
                if queue.remove_tail(None).is_some() {
                    expected -= 1;
                }
            } else {
                queue.insert_head(&i.to_string()).unwrap();
                expected += 1;
            }
            assert_eq!(queue.size(), expected);
        }
    }

    #[test]
    fn element_copy_to() {
        let mut queue = Queue::from_iter(["bear", "", "meerkat"]);

        let mut buf = [0xff_u8; 8];
        let element = queue.remove_head(Some(&mut buf[..])).unwrap();
        assert_eq!(element.value(), "bear");
        assert_eq!(&buf, b"bear\0\0\0\0");
        element.release();

        let mut buf = [0xff_u8; 3];
        let element = queue.remove_tail(Some(&mut buf[..])).unwrap();
        assert_eq!(&buf, b"me\0");
        assert_eq!(element.into_value(), "meerkat");

        let mut buf = [0xff_u8; 2];
        let element = queue.remove_head(Some(&mut buf[..])).unwrap();
        assert_eq!(&buf, b"\0\0");
        assert_eq!(element.value(), "");

        let mut buf = [0xff_u8; 0];
        queue.insert_tail("x").unwrap();
        assert!(queue.remove_head(Some(&mut buf[..])).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn queue_debug_and_eq() {
        let queue = Queue::from_iter(vec![String::from("a"), String::from("b")]);
        assert_eq!(format!("{:?}", queue), r#"["a", "b"]"#);
        assert_eq!(queue, Queue::from_iter(["a", "b"]));
        assert_ne!(queue, Queue::from_iter(["a"]));
        assert_eq!(Queue::new(), Queue::default());
    }
}
