//! Membership constraints for set views.
//!
//! A view admits `x` when every container bound covers `x` and `x` covers
//! every item bound. Bounds are kept as an antichain per side: adding a bound
//! that an existing one already implies is a no-op, and adding a bound that
//! implies existing ones replaces them. Incomparable bounds stay side by side
//! and act as a plain conjunction.

use crate::relation::ContainmentRelation;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bounds<T> {
    containers: Vec<T>,
    items: Vec<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<T> Bounds<T> {
    /// No constraint at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn containers(&self) -> &[T] {
        &self.containers
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_unbounded(&self) -> bool {
        self.containers.is_empty() && self.items.is_empty()
    }

    pub fn admits<R>(&self, relation: &R, x: &T) -> bool
    where
        R: ContainmentRelation<T> + ?Sized,
    {
        self.containers.iter().all(|c| relation.contains(c, x))
            && self.items.iter().all(|i| relation.contains(x, i))
    }

    /// Require admitted elements to be contained by `container`.
    ///
    /// With `c'` already present and `contains(container, c')`, anything
    /// inside `c'` is inside `container` too, so nothing changes. Existing
    /// bounds that `container` sits inside are superseded by it.
    pub fn within<R>(&mut self, relation: &R, container: T)
    where
        R: ContainmentRelation<T> + ?Sized,
    {
        if self
            .containers
            .iter()
            .any(|c| relation.contains(&container, c))
        {
            return;
        }
        self.containers.retain(|c| !relation.contains(c, &container));
        self.containers.push(container);
    }

    /// Require admitted elements to contain `item`.
    pub fn covering<R>(&mut self, relation: &R, item: T)
    where
        R: ContainmentRelation<T> + ?Sized,
    {
        if self.items.iter().any(|i| relation.contains(i, &item)) {
            return;
        }
        self.items.retain(|i| !relation.contains(&item, i));
        self.items.push(item);
    }
}
