//! Tree: AVL order-statistics layer with shared, copy-on-write nodes.
//!
//! Positions are in-order ranks. Every node caches its subtree `height` and
//! `size` (node count); rank descent compares the target index against the
//! left subtree's size. Children are `Rc`-shared so cloning a tree is O(1);
//! mutators call `Rc::make_mut` on the nodes they touch, which copies a node
//! only while another tree still points at it.
//!
//! Mutators may leave a tree partially restructured when they return an
//! error. Callers that need the previous state intact mutate a clone.

use crate::error::Error;
use core::cmp::Ordering;
use core::mem;
use std::rc::Rc;

pub(crate) enum Tree<T> {
    Empty,
    Node(Rc<Node<T>>),
}

#[derive(Clone)]
pub(crate) struct Node<T> {
    pub(crate) value: T,
    height: usize,
    size: usize,
    pub(crate) left: Tree<T>,
    pub(crate) right: Tree<T>,
}

impl<T> Clone for Tree<T> {
    fn clone(&self) -> Self {
        match self {
            Tree::Empty => Tree::Empty,
            Tree::Node(node) => Tree::Node(Rc::clone(node)),
        }
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::Empty
    }
}

impl<T> Node<T> {
    fn leaf(value: T) -> Self {
        Self {
            value,
            height: 1,
            size: 1,
            left: Tree::Empty,
            right: Tree::Empty,
        }
    }

    /// Recompute cached height and size from the children.
    fn update(&mut self) {
        self.height = 1 + self.left.height().max(self.right.height());
        self.size = 1 + self.left.size() + self.right.size();
    }

    fn balance(&self) -> isize {
        self.right.height() as isize - self.left.height() as isize
    }
}

impl<T> Tree<T> {
    #[inline]
    pub(crate) fn height(&self) -> usize {
        match self {
            Tree::Empty => 0,
            Tree::Node(node) => node.height,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        match self {
            Tree::Empty => 0,
            Tree::Node(node) => node.size,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Tree::Empty)
    }

    fn balance(&self) -> isize {
        match self {
            Tree::Empty => 0,
            Tree::Node(node) => node.balance(),
        }
    }

    /// Value at in-order rank `index`, or `None` past the end.
    pub(crate) fn get(&self, mut index: usize) -> Option<&T> {
        let mut cur = self;
        while let Tree::Node(node) = cur {
            let left_size = node.left.size();
            match index.cmp(&left_size) {
                Ordering::Less => cur = &node.left,
                Ordering::Equal => return Some(&node.value),
                Ordering::Greater => {
                    index -= left_size + 1;
                    cur = &node.right;
                }
            }
        }
        None
    }

    /// Perfectly balanced tree of `len` values, produced in order by `make`.
    pub(crate) fn build_with<F>(len: usize, make: &mut F) -> Self
    where
        F: FnMut() -> T,
    {
        if len == 0 {
            return Tree::Empty;
        }
        let left_len = len / 2;
        let left = Tree::build_with(left_len, make);
        let value = make();
        let right = Tree::build_with(len - left_len - 1, make);
        Tree::join(left, value, right)
    }

    /// Perfectly balanced tree holding `convert` of each item, in order.
    pub(crate) fn from_slice<U, F>(items: &[U], convert: &F) -> Self
    where
        F: Fn(&U) -> T,
    {
        let (left, rest) = items.split_at(items.len() / 2);
        let Some((middle, right)) = rest.split_first() else {
            return Tree::Empty;
        };
        Tree::join(
            Tree::from_slice(left, convert),
            convert(middle),
            Tree::from_slice(right, convert),
        )
    }

    fn join(left: Self, value: T, right: Self) -> Self {
        let mut node = Node {
            value,
            height: 0,
            size: 0,
            left,
            right,
        };
        node.update();
        Tree::Node(Rc::new(node))
    }

    /// Walk every node with an explicit stack and confirm cached heights,
    /// sizes and AVL balance.
    pub(crate) fn audit(&self) -> Result<(), Error> {
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            let Tree::Node(node) = tree else {
                continue;
            };
            if node.height != 1 + node.left.height().max(node.right.height()) {
                return Err(Error::InvariantViolation(
                    "cached height disagrees with children",
                ));
            }
            if node.size != 1 + node.left.size() + node.right.size() {
                return Err(Error::InvariantViolation(
                    "cached size disagrees with children",
                ));
            }
            if node.balance().abs() > 1 {
                return Err(Error::InvariantViolation(
                    "AVL balance factor outside [-1, 1]",
                ));
            }
            stack.push(&node.left);
            stack.push(&node.right);
        }
        Ok(())
    }
}

impl<T: Clone> Tree<T> {
    fn node_mut(&mut self) -> Result<&mut Node<T>, Error> {
        match self {
            Tree::Node(node) => Ok(Rc::make_mut(node)),
            Tree::Empty => Err(Error::InvariantViolation(
                "rank descent reached an empty subtree",
            )),
        }
    }

    fn take_node(&mut self) -> Result<Rc<Node<T>>, Error> {
        match mem::take(self) {
            Tree::Node(node) => Ok(node),
            Tree::Empty => Err(Error::InvariantViolation(
                "rotation around an empty subtree",
            )),
        }
    }

    /// Overwrite the value at `index`, returning the previous one.
    /// Shape is untouched, so no heights or sizes change.
    pub(crate) fn replace_at(&mut self, mut index: usize, value: T) -> Result<T, Error> {
        let mut cur = self;
        loop {
            let node = cur.node_mut()?;
            let left_size = node.left.size();
            match index.cmp(&left_size) {
                Ordering::Less => cur = &mut node.left,
                Ordering::Equal => return Ok(mem::replace(&mut node.value, value)),
                Ordering::Greater => {
                    index -= left_size + 1;
                    cur = &mut node.right;
                }
            }
        }
    }

    /// Insert so that `value` ends up at rank `index`; `index <= size()`.
    pub(crate) fn insert_at(&mut self, index: usize, value: T) -> Result<(), Error> {
        if self.is_empty() {
            debug_assert_eq!(index, 0);
            *self = Tree::Node(Rc::new(Node::leaf(value)));
            return Ok(());
        }
        let node = self.node_mut()?;
        let left_size = node.left.size();
        if index <= left_size {
            node.left.insert_at(index, value)?;
        } else {
            node.right.insert_at(index - left_size - 1, value)?;
        }
        node.update();
        self.rebalance()
    }

    /// Remove and return the value at rank `index`; `index < size()`.
    pub(crate) fn remove_at(&mut self, index: usize) -> Result<T, Error> {
        let (left_size, unlinkable) = match self {
            Tree::Empty => {
                return Err(Error::InvariantViolation(
                    "rank descent reached an empty subtree",
                ))
            }
            Tree::Node(node) => (
                node.left.size(),
                node.left.is_empty() || node.right.is_empty(),
            ),
        };
        if index == left_size && unlinkable {
            return self.unlink();
        }

        let node = self.node_mut()?;
        let removed = match index.cmp(&left_size) {
            Ordering::Less => node.left.remove_at(index)?,
            Ordering::Greater => node.right.remove_at(index - left_size - 1)?,
            Ordering::Equal => {
                // Two children: pull the in-order successor up into this node.
                let successor = node.right.remove_at(0)?;
                mem::replace(&mut node.value, successor)
            }
        };
        node.update();
        self.rebalance()?;
        Ok(removed)
    }

    /// Replace a node that has at most one child by that child.
    fn unlink(&mut self) -> Result<T, Error> {
        let node = self.take_node()?;
        let Node {
            value, left, right, ..
        } = Rc::try_unwrap(node).unwrap_or_else(|shared| Node::clone(&shared));
        *self = if left.is_empty() { right } else { left };
        Ok(value)
    }

    fn rebalance(&mut self) -> Result<(), Error> {
        match self.balance() {
            -1..=1 => Ok(()),
            -2 => {
                let node = self.node_mut()?;
                if node.left.balance() == 1 {
                    node.left.rotate_left()?;
                }
                self.rotate_right()
            }
            2 => {
                let node = self.node_mut()?;
                if node.right.balance() == -1 {
                    node.right.rotate_right()?;
                }
                self.rotate_left()
            }
            _ => Err(Error::InvariantViolation(
                "balance factor outside [-2, 2] after update",
            )),
        }
    }

    /// The right child becomes the subtree root; the old root keeps the
    /// child's former left subtree as its right.
    fn rotate_left(&mut self) -> Result<(), Error> {
        let mut pivot = self.take_node()?;
        let pivot_node = Rc::make_mut(&mut pivot);
        let mut root = pivot_node.right.take_node()?;
        let root_node = Rc::make_mut(&mut root);
        pivot_node.right = mem::take(&mut root_node.left);
        pivot_node.update();
        root_node.left = Tree::Node(pivot);
        root_node.update();
        *self = Tree::Node(root);
        Ok(())
    }

    fn rotate_right(&mut self) -> Result<(), Error> {
        let mut pivot = self.take_node()?;
        let pivot_node = Rc::make_mut(&mut pivot);
        let mut root = pivot_node.left.take_node()?;
        let root_node = Rc::make_mut(&mut root);
        pivot_node.left = mem::take(&mut root_node.right);
        pivot_node.update();
        root_node.right = Tree::Node(pivot);
        root_node.update();
        *self = Tree::Node(root);
        Ok(())
    }
}
