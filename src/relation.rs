//! Containment relations supplied by callers.
//!
//! A relation answers "does `container` contain `item`". Every algorithm in
//! this crate assumes the relation is:
//! - reflexive: `contains(x, x)` holds for every `x`;
//! - transitive: `contains(a, b) && contains(b, c)` implies `contains(a, c)`.
//!
//! Antisymmetry is NOT assumed. Two distinct elements may contain each other;
//! such peers are treated as equally specific.
//!
//! Neither property is checked at runtime. A relation that violates them makes
//! resolution results meaningless and may make upward search fail to
//! terminate; keeping the contract is the caller's responsibility.

/// Reflexive, transitive containment predicate over `T`.
///
/// Closures `Fn(&T, &T) -> bool` implement this trait directly.
pub trait ContainmentRelation<T: ?Sized> {
    /// True when `container` covers `item`.
    fn contains(&self, container: &T, item: &T) -> bool;
}

impl<T: ?Sized, F> ContainmentRelation<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn contains(&self, container: &T, item: &T) -> bool {
        self(container, item)
    }
}

/// A relation that can also enumerate the elements directly above an element.
///
/// Contract: following `immediate_containers` repeatedly from `x` reaches
/// every element that contains `x`, mutual-containment peers included, and
/// only finitely many elements are reachable. Elements returned must contain
/// `item`.
pub trait UpwardRelation<T>: ContainmentRelation<T> {
    fn immediate_containers(&self, item: &T) -> Vec<T>;
}

/// Builds an [`UpwardRelation`] from a containment predicate and an
/// enumeration of immediate containers.
pub fn upward_fn<T, C, U>(contains: C, immediate: U) -> FnUpward<C, U>
where
    C: Fn(&T, &T) -> bool,
    U: Fn(&T) -> Vec<T>,
{
    FnUpward {
        contains,
        immediate,
    }
}

/// Closure pair returned by [`upward_fn`].
#[derive(Clone, Copy)]
pub struct FnUpward<C, U> {
    contains: C,
    immediate: U,
}

impl<T, C, U> ContainmentRelation<T> for FnUpward<C, U>
where
    C: Fn(&T, &T) -> bool,
{
    #[inline]
    fn contains(&self, container: &T, item: &T) -> bool {
        (self.contains)(container, item)
    }
}

impl<T, C, U> UpwardRelation<T> for FnUpward<C, U>
where
    C: Fn(&T, &T) -> bool,
    U: Fn(&T) -> Vec<T>,
{
    fn immediate_containers(&self, item: &T) -> Vec<T> {
        (self.immediate)(item)
    }
}

/// Containment of `/`-separated paths: `"a"` contains `"a"`, `"a/b"` and
/// `"a/b/c"` but not `"ab"`. The empty path contains every path.
///
/// The immediate container of a path is its parent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PathPrefix;

impl PathPrefix {
    /// Parent of `path`, or `None` for the empty (root) path.
    pub fn parent(path: &str) -> Option<&str> {
        if path.is_empty() {
            return None;
        }
        Some(path.rsplit_once('/').map_or("", |(parent, _)| parent))
    }
}

impl ContainmentRelation<str> for PathPrefix {
    fn contains(&self, container: &str, item: &str) -> bool {
        if container.is_empty() || container == item {
            return true;
        }
        item.len() > container.len()
            && item.starts_with(container)
            && item.as_bytes()[container.len()] == b'/'
    }
}

impl ContainmentRelation<String> for PathPrefix {
    #[inline]
    fn contains(&self, container: &String, item: &String) -> bool {
        <Self as ContainmentRelation<str>>::contains(self, container, item)
    }
}

impl UpwardRelation<String> for PathPrefix {
    fn immediate_containers(&self, item: &String) -> Vec<String> {
        PathPrefix::parent(item)
            .map(|p| vec![p.to_string()])
            .unwrap_or_default()
    }
}
