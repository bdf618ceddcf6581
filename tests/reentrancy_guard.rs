// A relation that calls back into the map it belongs to.
use containment_map::{CachedContainmentMap, ContainmentMap, ContainmentRelation};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Map = CachedContainmentMap<String, i32, Echo>;

/// Prefix relation that, when armed, resolves a key on its own map while
/// answering.
#[derive(Clone, Default)]
struct Echo {
    target: Rc<RefCell<Weak<Map>>>,
}

impl ContainmentRelation<String> for Echo {
    fn contains(&self, container: &String, item: &String) -> bool {
        if let Some(map) = self.target.borrow().upgrade() {
            let _ = map.get(&"probe".to_string());
        }
        item.starts_with(container.as_str())
    }
}

fn map_with(relation: Echo) -> Rc<Map> {
    let mut m = CachedContainmentMap::new(relation);
    m.put("a".to_string(), 1);
    Rc::new(m)
}

#[test]
fn disarmed_relation_is_fine() {
    let m = map_with(Echo::default());
    assert_eq!(m.get(&"ab".to_string()), Some(&1));
}

#[cfg(debug_assertions)]
#[test]
fn reentrant_resolve_panics_in_debug() {
    let echo = Echo::default();
    let m = map_with(echo.clone());
    *echo.target.borrow_mut() = Rc::downgrade(&m);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        m.get(&"ab".to_string());
    }));
    let payload = res.expect_err("expected reentrancy to panic in debug builds");
    let msg = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(msg.contains("`resolve`"), "message was: {msg}");
}
