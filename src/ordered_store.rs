//! OrderedStore: persistent positional sequence over the AVL tree layer.

use crate::error::Error;
use crate::tree::{Node, Tree};
use core::fmt;
use core::iter::FusedIterator;

/// Default ceiling on the number of positions a store may hold.
pub const DEFAULT_MAX_LEN: usize = 999_999;

/// A positional sequence with O(log n) indexed access, insertion and removal.
///
/// `OrderedStore` has value semantics: `set`, `insert`, `remove` and
/// `push` take `&self` and return a new store, leaving
/// the receiver (and every clone of it) unchanged. Nodes are shared between
/// versions and copied on write, so each such call allocates O(log n) nodes
/// and `clone` is O(1). The `*_mut` variants apply the same change to
/// `self`; they only copy nodes still shared with another version.
///
/// # Examples
///
/// ```
/// use avl_hashindex::OrderedStore;
///
/// let a = OrderedStore::from_vec(vec!['a', 'c']).unwrap();
/// let b = a.insert(1, 'b').unwrap();
/// assert_eq!(b.to_vec(), vec!['a', 'b', 'c']);
/// assert_eq!(a.to_vec(), vec!['a', 'c']);
/// ```
pub struct OrderedStore<T> {
    root: Tree<T>,
    max_len: usize,
}

impl<T> Clone for OrderedStore<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            max_len: self.max_len,
        }
    }
}

impl<T> Default for OrderedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedStore<T> {
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LEN)
    }

    /// An empty store that refuses to grow past `max_len` positions.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            root: Tree::Empty,
            max_len,
        }
    }

    /// Store of `len` values produced in order by `make`, without the
    /// `max_len` check.
    pub(crate) fn filled_with<F>(len: usize, mut make: F, max_len: usize) -> Self
    where
        F: FnMut() -> T,
    {
        Self {
            root: Tree::build_with(len, &mut make),
            max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.root.size()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&T, Error> {
        self.root.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    pub fn first(&self) -> Option<&T> {
        self.root.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|i| self.root.get(i))
    }

    /// Lazy front-to-back iterator. Traversal keeps its own stack of
    /// pending nodes, so depth is never bounded by the call stack.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.root)
    }

    /// Lazy back-to-front iterator; yields exactly `iter()` reversed.
    pub fn iter_rev(&self) -> RevIter<'_, T> {
        RevIter::new(&self.root)
    }

    /// Audit every node: AVL balance and cached heights/sizes.
    pub fn check_invariants(&self) -> Result<(), Error> {
        self.root.audit()
    }
}

fn check_len(requested: usize, max: usize) -> Result<(), Error> {
    if requested > max {
        return Err(Error::InputTooLarge { requested, max });
    }
    Ok(())
}

impl<T: Clone> OrderedStore<T> {
    /// `times` copies of `value`, under the default maximum length.
    pub fn repeat(value: T, times: usize) -> Result<Self, Error> {
        check_len(times, DEFAULT_MAX_LEN)?;
        Ok(Self::filled_with(times, || value.clone(), DEFAULT_MAX_LEN))
    }

    /// Build a store holding `items` in order, under the default maximum
    /// length.
    ///
    /// At most `DEFAULT_MAX_LEN + 1` items are read, so an oversized (or
    /// endless) input fails with `InputTooLarge` reporting that count.
    pub fn from_vec<I>(items: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().take(DEFAULT_MAX_LEN + 1).collect();
        check_len(items.len(), DEFAULT_MAX_LEN)?;
        Ok(Self {
            root: Tree::from_slice(&items, &T::clone),
            max_len: DEFAULT_MAX_LEN,
        })
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// New store holding only the elements matching `predicate`, in their
    /// original relative order.
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        let kept: Vec<&T> = self.iter().filter(|v| predicate(v)).collect();
        Self {
            root: Tree::from_slice(&kept, &|v: &&T| T::clone(v)),
            max_len: self.max_len,
        }
    }

    pub fn set(&self, index: usize, value: T) -> Result<Self, Error> {
        let mut next = self.clone();
        next.set_mut(index, value)?;
        Ok(next)
    }

    pub fn insert(&self, index: usize, value: T) -> Result<Self, Error> {
        let mut next = self.clone();
        next.insert_mut(index, value)?;
        Ok(next)
    }

    /// Remove the element at `index`; returns it with the shortened store.
    pub fn remove(&self, index: usize) -> Result<(T, Self), Error> {
        let mut next = self.clone();
        let removed = next.remove_mut(index)?;
        Ok((removed, next))
    }

    pub fn push(&self, value: T) -> Result<Self, Error> {
        self.insert(self.len(), value)
    }

    /// In-place `set`; returns the value previously at `index`.
    pub fn set_mut(&mut self, index: usize, value: T) -> Result<T, Error> {
        if index >= self.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        self.root.replace_at(index, value)
    }

    /// In-place `insert`.
    ///
    /// Range and size errors leave `self` unchanged. After an
    /// `InvariantViolation` the contents of `self` are unspecified; the
    /// value-returning methods never hand out such a store.
    pub fn insert_mut(&mut self, index: usize, value: T) -> Result<(), Error> {
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        check_len(len + 1, self.max_len)?;
        self.root.insert_at(index, value)
    }

    /// In-place `remove`; same error contract as [`insert_mut`](Self::insert_mut).
    pub fn remove_mut(&mut self, index: usize) -> Result<T, Error> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        self.root.remove_at(index)
    }
}

impl<T: PartialEq> OrderedStore<T> {
    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|v| v == value)
    }

    /// Position of the last element equal to `value`.
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.iter_rev()
            .position(|v| v == value)
            .map(|from_back| self.len() - 1 - from_back)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

impl<T: PartialEq> PartialEq for OrderedStore<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for OrderedStore<T> {}

impl<T: fmt::Debug> fmt::Debug for OrderedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a OrderedStore<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over an [`OrderedStore`].
pub struct Iter<'a, T> {
    // Nodes whose left subtree is done; the top is yielded next.
    stack: Vec<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn new(root: &'a Tree<T>) -> Self {
        let mut it = Self {
            stack: Vec::with_capacity(root.height()),
            remaining: root.size(),
        };
        it.push_left_spine(root);
        it
    }

    fn push_left_spine(&mut self, mut tree: &'a Tree<T>) {
        while let Tree::Node(node) = tree {
            self.stack.push(node);
            tree = &node.left;
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.remaining -= 1;
        self.push_left_spine(&node.right);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Backward iterator over an [`OrderedStore`].
pub struct RevIter<'a, T> {
    stack: Vec<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> RevIter<'a, T> {
    fn new(root: &'a Tree<T>) -> Self {
        let mut it = Self {
            stack: Vec::with_capacity(root.height()),
            remaining: root.size(),
        };
        it.push_right_spine(root);
        it
    }

    fn push_right_spine(&mut self, mut tree: &'a Tree<T>) {
        while let Tree::Node(node) = tree {
            self.stack.push(node);
            tree = &node.right;
        }
    }
}

impl<T> Clone for RevIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for RevIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.remaining -= 1;
        self.push_right_spine(&node.left);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RevIter<'_, T> {}
impl<T> FusedIterator for RevIter<'_, T> {}
