//! Composite controls: Group and TabbedPages
//!
//! Composites own keyed collections of child controls and route
//! externally driven updates to them by structured path instead of
//! owning a value themselves.

use super::{Control, Hooks};
use crate::spec::{GroupSpec, SpecBase, TabbedPagesSpec};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Keyed collection of child controls
#[derive(Debug)]
pub struct Group {
    pub base: SpecBase,
    children: HashMap<String, Control>,
    pub hooks: Hooks,
}

impl Group {
    pub fn new(spec: GroupSpec) -> Self {
        let children = spec
            .controls
            .into_iter()
            .map(|(id, child)| (id, Control::from_spec(child)))
            .collect();
        Self {
            base: spec.base,
            children,
            hooks: Hooks::default(),
        }
    }

    pub fn child_mut(&mut self, id: &str) -> Option<&mut Control> {
        self.children.get_mut(id)
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.children.values()
    }

    pub fn controls_mut(&mut self) -> impl Iterator<Item = &mut Control> {
        self.children.values_mut()
    }

    /// Route an update to the child named by the path head
    ///
    /// The empty path targets the group itself, which is a no-op.
    pub fn update(&mut self, payload: &Value, path: &[String]) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        match self.children.get_mut(head) {
            Some(child) => child.update(payload, rest),
            None => warn!("group '{}': no child '{}'", self.base.name, head),
        }
    }
}

/// Named pages of controls with one active page
///
/// Routing consumes two path segments: the page name, then the control
/// key inside that page; any remaining path is forwarded recursively.
#[derive(Debug)]
pub struct TabbedPages {
    pub base: SpecBase,
    pages: Vec<(String, HashMap<String, Control>)>,
    active_page: String,
    pub hooks: Hooks,
}

impl TabbedPages {
    pub fn new(spec: TabbedPagesSpec) -> Self {
        let pages: Vec<(String, HashMap<String, Control>)> = spec
            .pages
            .into_iter()
            .map(|page| {
                let controls = page
                    .controls
                    .into_iter()
                    .map(|(id, child)| (id, Control::from_spec(child)))
                    .collect();
                (page.name, controls)
            })
            .collect();
        let active_page = pages.first().map(|(name, _)| name.clone()).unwrap_or_default();
        Self {
            base: spec.base,
            pages,
            active_page,
            hooks: Hooks::default(),
        }
    }

    pub fn active_page(&self) -> &str {
        &self.active_page
    }

    pub fn page_names(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|(name, _)| name.as_str())
    }

    pub fn select_page(&mut self, name: &str) {
        if self.pages.iter().any(|(n, _)| n == name) {
            self.active_page = name.to_string();
        } else {
            warn!("tabbed pages '{}': no page '{}'", self.base.name, name);
        }
    }

    pub fn page_control_mut(&mut self, page: &str, id: &str) -> Option<&mut Control> {
        self.pages
            .iter_mut()
            .find(|(name, _)| name == page)
            .and_then(|(_, controls)| controls.get_mut(id))
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.pages.iter().flat_map(|(_, controls)| controls.values())
    }

    pub fn controls_mut(&mut self) -> impl Iterator<Item = &mut Control> {
        self.pages
            .iter_mut()
            .flat_map(|(_, controls)| controls.values_mut())
    }

    /// Route an update two segments deep: (page, control)
    ///
    /// A single-segment path addresses the page itself; pages carry no
    /// state, so that is a no-op, as is the empty path.
    pub fn update(&mut self, payload: &Value, path: &[String]) {
        if path.len() < 2 {
            return;
        }
        match self.page_control_mut(&path[0], &path[1]) {
            Some(child) => child.update(payload, &path[2..]),
            None => warn!(
                "tabbed pages '{}': no control '{}/{}'",
                self.base.name, path[0], path[1]
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CakeSpec, ControlSpec, FaderSpec, PageSpec};
    use serde_json::json;

    fn base(name: &str) -> SpecBase {
        SpecBase {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
            color: "#888888".to_string(),
        }
    }

    fn cake_spec(name: &str) -> ControlSpec {
        ControlSpec::Cake(CakeSpec {
            base: base(name),
            min: 0.0,
            max: 1.0,
            initial_value: 0.0,
        })
    }

    fn fader_spec(name: &str) -> ControlSpec {
        ControlSpec::Fader(FaderSpec {
            base: base(name),
            min: 0.0,
            max: 1.0,
            initial_value: 0.0,
            decimal_places: 2,
        })
    }

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_routes_to_named_child_only() {
        let mut controls = HashMap::new();
        controls.insert("left".to_string(), cake_spec("left meter"));
        controls.insert("right".to_string(), cake_spec("right meter"));
        let mut group = Group::new(GroupSpec {
            base: base("meters"),
            controls,
        });

        group.update(&json!(0.8), &path(&["left"]));

        let left = match group.child_mut("left").unwrap() {
            Control::Cake(c) => c.value(),
            _ => unreachable!(),
        };
        let right = match group.child_mut("right").unwrap() {
            Control::Cake(c) => c.value(),
            _ => unreachable!(),
        };
        assert_eq!(left, 0.8);
        assert_eq!(right, 0.0);
    }

    #[test]
    fn test_group_empty_path_is_noop() {
        let mut controls = HashMap::new();
        controls.insert("m".to_string(), cake_spec("m"));
        let mut group = Group::new(GroupSpec {
            base: base("g"),
            controls,
        });
        group.update(&json!(0.5), &[]);
        match group.child_mut("m").unwrap() {
            Control::Cake(c) => assert_eq!(c.value(), 0.0),
            _ => unreachable!(),
        }
    }

    fn tabs() -> TabbedPages {
        let mut main = HashMap::new();
        main.insert("meter".to_string(), cake_spec("meter"));
        let mut fx = HashMap::new();
        fx.insert("wet".to_string(), fader_spec("wet"));
        fx.insert("feedback".to_string(), cake_spec("feedback"));
        TabbedPages::new(TabbedPagesSpec {
            base: base("pages"),
            pages: vec![
                PageSpec {
                    name: "main".to_string(),
                    controls: main,
                },
                PageSpec {
                    name: "fx".to_string(),
                    controls: fx,
                },
            ],
        })
    }

    #[test]
    fn test_first_page_is_initially_active() {
        let mut t = tabs();
        assert_eq!(t.active_page(), "main");
        t.select_page("fx");
        assert_eq!(t.active_page(), "fx");
        t.select_page("nope");
        assert_eq!(t.active_page(), "fx");
    }

    #[test]
    fn test_tabbed_routing_consumes_two_segments() {
        let mut t = tabs();
        t.update(&json!(0.6), &path(&["fx", "feedback"]));
        match t.page_control_mut("fx", "feedback").unwrap() {
            Control::Cake(c) => assert_eq!(c.value(), 0.6),
            _ => unreachable!(),
        }

        // one segment addresses the page: no state, no-op
        t.update(&json!(0.9), &path(&["fx"]));
        match t.page_control_mut("fx", "feedback").unwrap() {
            Control::Cake(c) => assert_eq!(c.value(), 0.6),
            _ => unreachable!(),
        }
    }
}
