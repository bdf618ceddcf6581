//! ContainmentSet: a flat store of elements with hierarchy-aware views.
//!
//! The backing store is a plain hash set; every hierarchical notion (cover,
//! cascade removal, roots, bounded views) is computed from the relation on
//! demand. Views borrow the set mutably and write straight through to the
//! backing store after checking their membership constraint.

use crate::bounds::Bounds;
use crate::error::ContainmentError;
use crate::relation::ContainmentRelation;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashSet;
use std::collections::hash_map::RandomState;
use tracing::debug;

pub struct ContainmentSet<T, R, S = RandomState> {
    relation: R,
    elements: HashSet<T, S>,
}

impl<T, R> ContainmentSet<T, R>
where
    T: Eq + Hash,
    R: ContainmentRelation<T>,
{
    pub fn new(relation: R) -> Self {
        Self::with_hasher(relation, Default::default())
    }

    /// Build a set over an initial backing store.
    pub fn with_elements<I>(relation: R, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut set = Self::new(relation);
        set.extend(elements);
        set
    }
}

impl<T, R, S> ContainmentSet<T, R, S>
where
    T: Eq + Hash,
    R: ContainmentRelation<T>,
    S: BuildHasher,
{
    pub fn with_hasher(relation: R, hasher: S) -> Self {
        Self {
            relation,
            elements: HashSet::with_hasher(hasher),
        }
    }

    pub fn relation(&self) -> &R {
        &self.relation
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> hashbrown::hash_set::Iter<'_, T> {
        self.elements.iter()
    }

    /// Insert `x` as a literal element. Returns whether the store changed.
    pub fn add(&mut self, x: T) -> bool {
        self.elements.insert(x)
    }

    /// True when some stored element covers `x`.
    pub fn contains(&self, x: &T) -> bool {
        self.elements.iter().any(|e| self.relation.contains(e, x))
    }

    /// Remove every stored element that `x` covers, `x` itself included.
    pub fn remove(&mut self, x: &T) -> bool {
        let relation = &self.relation;
        let before = self.elements.len();
        self.elements.retain(|e| !relation.contains(x, e));
        let removed = before - self.elements.len();
        if removed > 1 {
            debug!(removed, "cascading set removal");
        }
        removed > 0
    }

    /// The raw backing store; no hierarchy checks apply.
    pub fn elements(&self) -> &HashSet<T, S> {
        &self.elements
    }

    /// Mutable access to the raw backing store; no hierarchy checks apply.
    pub fn elements_mut(&mut self) -> &mut HashSet<T, S> {
        &mut self.elements
    }

    /// `x` is a root when every stored element covering `x` is covered by
    /// `x` in turn. Members of a mutual-containment group are joint roots.
    pub fn is_root(&self, x: &T) -> bool {
        self.elements
            .iter()
            .filter(|e| self.relation.contains(e, x))
            .all(|e| self.relation.contains(x, e))
    }

    /// Stored elements not strictly dominated by another stored element.
    pub fn roots(&self) -> impl Iterator<Item = &T> {
        self.elements.iter().filter(move |e| self.is_root(e))
    }

    /// Live view of the root elements.
    pub fn root_elements(&mut self) -> RootView<'_, T, R, S> {
        RootView { set: self }
    }

    /// Unconstrained view over the whole set.
    pub fn view(&mut self) -> View<'_, T, R, S> {
        View {
            set: self,
            bounds: Bounds::unbounded(),
        }
    }

    /// Elements contained by `container`.
    pub fn contained_by(&mut self, container: T) -> View<'_, T, R, S> {
        self.view().contained_by(container)
    }

    /// Elements containing `item`.
    pub fn container_of(&mut self, item: T) -> View<'_, T, R, S> {
        self.view().container_of(item)
    }

    /// Elements contained by `container` and containing `item`.
    pub fn sub_view(&mut self, container: T, item: T) -> View<'_, T, R, S> {
        self.view().sub_view(container, item)
    }
}

impl<T, R, S> Extend<T> for ContainmentSet<T, R, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.elements.extend(iter);
    }
}

/// Bounded, writable projection of a [`ContainmentSet`].
pub struct View<'a, T, R, S = RandomState> {
    set: &'a mut ContainmentSet<T, R, S>,
    bounds: Bounds<T>,
}

impl<'a, T, R, S> View<'a, T, R, S>
where
    T: Eq + Hash,
    R: ContainmentRelation<T>,
    S: BuildHasher,
{
    pub fn bounds(&self) -> &Bounds<T> {
        &self.bounds
    }

    /// Whether `x` satisfies the view's membership constraint.
    pub fn admits(&self, x: &T) -> bool {
        self.bounds.admits(&self.set.relation, x)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let relation = &self.set.relation;
        let bounds = &self.bounds;
        self.set
            .elements
            .iter()
            .filter(move |e| bounds.admits(relation, e))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// `x` is admitted and some element of the view covers it.
    pub fn contains(&self, x: &T) -> bool {
        self.admits(x) && self.iter().any(|e| self.set.relation.contains(e, x))
    }

    /// Add `x` to the backing set; fails if the view does not admit it.
    pub fn add(&mut self, x: T) -> Result<bool, ContainmentError> {
        if !self.admits(&x) {
            return Err(ContainmentError::OutsideView);
        }
        Ok(self.set.add(x))
    }

    /// Remove the elements of this view that `x` covers.
    pub fn remove(&mut self, x: &T) -> bool {
        let ContainmentSet { relation, elements } = &mut *self.set;
        let relation = &*relation;
        let bounds = &self.bounds;
        let before = elements.len();
        elements.retain(|e| !(bounds.admits(relation, e) && relation.contains(x, e)));
        before != elements.len()
    }

    /// Narrow to elements contained by `container`.
    pub fn contained_by(mut self, container: T) -> Self {
        self.bounds.within(&self.set.relation, container);
        self
    }

    /// Narrow to elements containing `item`.
    pub fn container_of(mut self, item: T) -> Self {
        self.bounds.covering(&self.set.relation, item);
        self
    }

    /// Narrow on both sides at once.
    pub fn sub_view(self, container: T, item: T) -> Self {
        self.contained_by(container).container_of(item)
    }
}

/// Writable projection of the root elements of a [`ContainmentSet`].
pub struct RootView<'a, T, R, S = RandomState> {
    set: &'a mut ContainmentSet<T, R, S>,
}

impl<'a, T, R, S> RootView<'a, T, R, S>
where
    T: Eq + Hash,
    R: ContainmentRelation<T>,
    S: BuildHasher,
{
    pub fn admits(&self, x: &T) -> bool {
        self.set.is_root(x)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.set.roots()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn contains(&self, x: &T) -> bool {
        self.admits(x) && self.set.contains(x)
    }

    /// Add `x`, which must not be strictly contained by a stored element.
    pub fn add(&mut self, x: T) -> Result<bool, ContainmentError> {
        if !self.set.is_root(&x) {
            return Err(ContainmentError::NotRoot);
        }
        Ok(self.set.add(x))
    }

    /// Remove a root together with everything it covers.
    pub fn remove(&mut self, x: &T) -> bool {
        self.admits(x) && self.set.remove(x)
    }
}
