//! Insertion-ordered doubly linked list.
//!
//! Nodes are appended at the back and the oldest node sits at the front, so
//! "pop the oldest" and "unlink an arbitrary node" are both O(1). The list is
//! the ordering half of [`BoundedOrderedMap`](crate::bounded::BoundedOrderedMap);
//! the map half stores raw pointers to the nodes handed out here.

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

/// A node in the list.
///
/// Head and tail sentinels carry an uninitialized value; every other node
/// carries an initialized one.
pub(crate) struct Entry<T> {
    val: mem::MaybeUninit<T>,
    prev: *mut Entry<T>,
    next: *mut Entry<T>,
}

impl<T> Entry<T> {
    fn new(val: T) -> Self {
        Entry {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    fn new_sigil() -> Self {
        Entry {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// # Safety
    ///
    /// Must not be called on a sentinel node.
    pub(crate) unsafe fn get_value(&self) -> &T {
        // SAFETY: caller guarantees this is a value-carrying node
        unsafe { self.val.assume_init_ref() }
    }

    /// # Safety
    ///
    /// Must not be called on a sentinel node.
    pub(crate) unsafe fn get_value_mut(&mut self) -> &mut T {
        // SAFETY: caller guarantees this is a value-carrying node
        unsafe { self.val.assume_init_mut() }
    }

    /// Consumes a detached node and moves its value out.
    ///
    /// # Safety
    ///
    /// Must not be called on a sentinel node.
    pub(crate) unsafe fn into_value(self: Box<Self>) -> T {
        // SAFETY: caller guarantees this is a value-carrying node; the box is
        // consumed so the value cannot be read twice
        unsafe { self.val.assume_init_read() }
    }
}

/// Doubly linked list ordered by insertion.
pub(crate) struct List<T> {
    len: usize,
    head: *mut Entry<T>,
    tail: *mut Entry<T>,
}

impl<T> List<T> {
    pub(crate) fn new() -> List<T> {
        let head = Box::into_raw(Box::new(Entry::new_sigil()));
        let tail = Box::into_raw(Box::new(Entry::new_sigil()));

        // SAFETY: head and tail were just allocated and are valid
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        List { len: 0, head, tail }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `v` as the newest node and returns a pointer to it.
    ///
    /// The pointer stays valid until the node is unlinked, popped, or the
    /// list is cleared or dropped.
    pub(crate) fn push_back(&mut self, v: T) -> *mut Entry<T> {
        // SAFETY: Box::into_raw never returns null
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(Entry::new(v)))) };
        // SAFETY: node is freshly allocated and not part of any list
        unsafe { self.attach_back(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Detaches and returns the oldest node.
    pub(crate) fn pop_front(&mut self) -> Option<Box<Entry<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is non-empty so head.next is a value node
        unsafe {
            let first = (*self.head).next;
            self.detach(first);
            self.len -= 1;
            Some(Box::from_raw(first))
        }
    }

    /// Returns the oldest value without detaching it.
    pub(crate) fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is non-empty so head.next is a value node
        unsafe { Some((*(*self.head).next).get_value()) }
    }

    /// Unlinks `node` from wherever it sits in the order.
    ///
    /// # Safety
    ///
    /// `node` must be a value node currently linked into this list.
    pub(crate) unsafe fn unlink(&mut self, node: *mut Entry<T>) -> Box<Entry<T>> {
        // SAFETY: caller guarantees node belongs to this list
        unsafe {
            self.detach(node);
            self.len -= 1;
            Box::from_raw(node)
        }
    }

    /// Drops every value node, keeping the sentinels.
    pub(crate) fn clear(&mut self) {
        while let Some(node) = self.pop_front() {
            // SAFETY: pop_front only yields value nodes
            drop(unsafe { node.into_value() });
        }
    }

    /// Iterates values from oldest to newest.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: head is valid for the lifetime of the list
            next: unsafe { (*self.head).next },
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `node` must be linked into this list and must not be a sentinel.
    unsafe fn detach(&mut self, node: *mut Entry<T>) {
        // SAFETY: a linked node always has valid neighbours
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// # Safety
    ///
    /// `node` must be valid and not linked into any list.
    unsafe fn attach_back(&mut self, node: *mut Entry<T>) {
        // SAFETY: tail is valid; caller guarantees node is free-standing
        unsafe {
            (*node).next = self.tail;
            (*node).prev = (*self.tail).prev;
            (*(*self.tail).prev).next = node;
            (*self.tail).prev = node;
        }
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the sentinels were allocated in `new` and are freed only here
        unsafe {
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Oldest-first iterator over a [`List`].
pub(crate) struct Iter<'a, T> {
    next: *const Entry<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: `remaining` counts the value nodes left before the tail, and
        // the list is borrowed for 'a so no node can be freed meanwhile
        unsafe {
            let node = &*self.next;
            self.next = node.next;
            self.remaining -= 1;
            Some(node.get_value())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
