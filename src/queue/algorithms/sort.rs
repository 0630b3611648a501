use crate::list::{self, Link};
use crate::queue::{Element, Queue};
use std::cmp::Ordering;
use std::ptr::NonNull;

impl Queue {
    /// Sort the queue by payload, in ascending order, or in descending order
    /// if `descend` is `true`.
    ///
    /// Payloads compare byte-wise. This sort is stable (i.e., does not reorder
    /// equal elements) in both directions.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(*n* * log(*n*)) time and
    /// *O*(log(*n*)) memory.
    ///
    /// # Current Implementation
    ///
    /// The current algorithm is a top-down merge sort. The ring is cut at its
    /// middle into two rings anchored by ghost links on the stack, which are
    /// sorted recursively and merged back. No element is copied or allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use ring_queue::Queue;
    /// use std::iter::FromIterator;
    ///
    /// let mut queue = Queue::from_iter(["bee", "ant", "cat", "a"]);
    ///
    /// queue.sort(false);
    /// assert_eq!(queue, Queue::from_iter(["a", "ant", "bee", "cat"]));
    ///
    /// queue.sort(true);
    /// assert_eq!(queue, Queue::from_iter(["cat", "bee", "ant", "a"]));
    /// ```
    pub fn sort(&mut self, descend: bool) {
        // SAFETY: the ring of the ghost node is well-formed and holds elements only.
        unsafe { merge_sort(self.ghost_node(), descend) };
    }

    /// Merge the sorted `other` into the sorted `self`, leaving `other` empty.
    ///
    /// Both queues must be sorted in the direction given by `descend`. Among
    /// equal payloads, the elements of `self` come first.
    pub(crate) fn merge_from(&mut self, other: &mut Queue, descend: bool) {
        let mut ghost = Link::new();
        let head = NonNull::from(&mut ghost);
        // SAFETY: `head` lives on the stack until the end of this function,
        // and it is empty again when `merge` has spliced its content back.
        unsafe {
            list::init(head);
            merge(head, self.ghost_node(), other.ghost_node(), descend);
            list::splice_init(head, self.ghost_node());
        }
    }
}

/// Returns `true` if the front of `left` goes first.
///
/// Ties go to `left` in both directions, which keeps the merge stable.
fn take_left(left: &str, right: &str, descend: bool) -> bool {
    match left.cmp(right) {
        Ordering::Equal => true,
        Ordering::Less => !descend,
        Ordering::Greater => descend,
    }
}

/// Sort the ring `head` in place.
///
/// It is unsafe because `head` must anchor a well-formed ring of elements.
unsafe fn merge_sort(head: NonNull<Link>, descend: bool) {
    if list::is_empty(head) || list::is_singular(head) {
        return;
    }

    // `slow` stops at the back of the left half, which is the longer one
    // when the length is odd.
    let mut slow = head.as_ref().next;
    let mut fast = slow.as_ref().next;
    while fast != head && fast.as_ref().next != head {
        slow = slow.as_ref().next;
        fast = fast.as_ref().next.as_ref().next;
    }

    // The ghost links never move while linked: they are only reached through
    // `left` and `right` until both rings are empty again.
    let (mut left_ghost, mut right_ghost) = (Link::new(), Link::new());
    let left = NonNull::from(&mut left_ghost);
    let right = NonNull::from(&mut right_ghost);
    list::init(left);
    list::init(right);

    list::cut_position(left, head, slow);
    list::splice_init(head, right);

    merge_sort(left, descend);
    merge_sort(right, descend);

    merge(head, left, right, descend);
}

/// Merge the sorted rings `left` and `right` into the empty ring `head`,
/// leaving both of them empty.
///
/// It is unsafe because all three must anchor well-formed rings of elements.
unsafe fn merge(
    head: NonNull<Link>,
    left: NonNull<Link>,
    right: NonNull<Link>,
    descend: bool,
) {
    debug_assert!(list::is_empty(head));
    let mut back = head;
    while !list::is_empty(left) && !list::is_empty(right) {
        let (l, r) = (left.as_ref().next, right.as_ref().next);
        let node = if take_left(Element::value_of(l), Element::value_of(r), descend) {
            l
        } else {
            r
        };
        list::move_after(node, back);
        back = node;
    }
    let remaining = if list::is_empty(left) { right } else { left };
    list::splice_tail_init(remaining, head);
}

#[cfg(test)]
mod tests {
    use crate::queue::tests::values;
    use crate::Queue;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::iter::FromIterator;

    fn random_values(rng: &mut StdRng, len: usize) -> Vec<String> {
        (0..len)
            .map(|_| {
                let n = rng.random_range(0..4);
                (0..n)
                    .map(|_| char::from(b'a' + rng.random_range(0..4_u8)))
                    .collect()
            })
            .collect()
    }

    /// The address of every element, from head to tail.
    fn identities(queue: &mut Queue) -> Vec<(String, usize)> {
        let mut removed = Vec::new();
        while let Some(element) = queue.remove_head(None) {
            removed.push(element);
        }
        let identities = removed
            .iter()
            .map(|element| (element.value().to_owned(), &**element as *const _ as usize))
            .collect();
        for element in removed {
            queue.insert_element_tail(element);
        }
        identities
    }

    #[test]
    fn sort() {
        fn test_case(input: &[&str], expected: &[&str]) {
            let mut queue = Queue::from_iter(input);
            queue.sort(false);
            assert_eq!(values(&queue), expected);

            let mut queue = Queue::from_iter(input);
            queue.sort(true);
            let reversed: Vec<&str> = expected.iter().rev().copied().collect();
            assert_eq!(values(&queue), reversed);
        }
        test_case(&[], &[]);
        test_case(&["a"], &["a"]);
        test_case(&["b", "a"], &["a", "b"]);
        test_case(&["b", "c", "a"], &["a", "b", "c"]);
        test_case(&["5", "2", "4", "3", "1"], &["1", "2", "3", "4", "5"]);
        test_case(&["ab", "a", "", "b", "aa"], &["", "a", "aa", "ab", "b"]);
        // byte-wise, so upper case goes first
        test_case(&["b", "B", "a", "A"], &["A", "B", "a", "b"]);

        let mut rng = StdRng::seed_from_u64(0xca7);
        for len in 0..64 {
            let input = random_values(&mut rng, len);
            let mut expected = input.clone();
            expected.sort();

            let mut queue = Queue::from_iter(&input);
            queue.sort(false);
            assert_eq!(values(&queue), expected);

            // idempotent
            queue.sort(false);
            assert_eq!(values(&queue), expected);

            queue.sort(true);
            expected.reverse();
            assert_eq!(values(&queue), expected);
        }
    }

    #[test]
    fn sort_is_stable() {
        let mut rng = StdRng::seed_from_u64(0xd06);
        for len in 0..48 {
            let input = random_values(&mut rng, len);
            let mut queue = Queue::from_iter(&input);
            let before = identities(&mut queue);

            // `slice::sort_by` is stable, so it is the oracle.
            let mut ascending = before.clone();
            ascending.sort_by(|a, b| a.0.cmp(&b.0));
            queue.sort(false);
            assert_eq!(identities(&mut queue), ascending);

            let mut queue = Queue::new();
            for (value, _) in &before {
                queue.insert_tail(value).unwrap();
            }
            let before = identities(&mut queue);
            let mut descending = before.clone();
            descending.sort_by(|a, b| b.0.cmp(&a.0));
            queue.sort(true);
            assert_eq!(identities(&mut queue), descending);
        }
    }

    #[test]
    fn merge_from() {
        let mut left = Queue::from_iter(["a", "c", "c", "e"]);
        let mut right = Queue::from_iter(["b", "c", "d", "f", "g"]);
        let right_c = {
            let ids = identities(&mut right);
            ids[1].1
        };
        left.merge_from(&mut right, false);
        assert!(right.is_empty());
        assert!(right.is_well_formed());
        let merged = identities(&mut left);
        let merged_values: Vec<&str> = merged.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(merged_values, ["a", "b", "c", "c", "c", "d", "e", "f", "g"]);
        // the `c` of `right` comes after both `c`s of `left`
        assert_eq!(merged[4].1, right_c);

        let mut left = Queue::from_iter(["c", "a"]);
        let mut right = Queue::new();
        left.merge_from(&mut right, true);
        assert_eq!(values(&left), ["c", "a"]);
        right.merge_from(&mut left, true);
        assert_eq!(values(&right), ["c", "a"]);
        assert!(left.is_empty());
    }
}
