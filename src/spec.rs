//! Control spec descriptors
//!
//! Immutable descriptors supplied externally at construction time. The
//! layout config deserializes into these; the runtime control model never
//! mutates them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fields shared by every control spec: display metadata and position
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecBase {
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_size")]
    pub w: f32,
    #[serde(default = "default_size")]
    pub h: f32,
    #[serde(default = "default_color")]
    pub color: String,
}

impl SpecBase {
    /// Stable focus-traversal index derived from the spec position
    pub fn tab_index(&self) -> i32 {
        777 + (self.x * 101.0 + self.y) as i32
    }
}

/// Control spec, tagged by control type
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlSpec {
    Fader(FaderSpec),
    Pad(PadSpec),
    Switch(SwitchSpec),
    Selector(SelectorSpec),
    ConfirmButton(ConfirmButtonSpec),
    ConfirmSwitch(ConfirmSwitchSpec),
    Label(LabelSpec),
    Cake(CakeSpec),
    Group(GroupSpec),
    TabbedPages(TabbedPagesSpec),
    PresetButton(PresetButtonSpec),
    Letterbox(LetterboxSpec),
}

impl ControlSpec {
    pub fn base(&self) -> &SpecBase {
        match self {
            ControlSpec::Fader(s) => &s.base,
            ControlSpec::Pad(s) => &s.base,
            ControlSpec::Switch(s) => &s.base,
            ControlSpec::Selector(s) => &s.base,
            ControlSpec::ConfirmButton(s) => &s.base,
            ControlSpec::ConfirmSwitch(s) => &s.base,
            ControlSpec::Label(s) => &s.base,
            ControlSpec::Cake(s) => &s.base,
            ControlSpec::Group(s) => &s.base,
            ControlSpec::TabbedPages(s) => &s.base,
            ControlSpec::PresetButton(s) => &s.base,
            ControlSpec::Letterbox(s) => &s.base,
        }
    }
}

/// Continuous value in [min, max]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FaderSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default)]
    pub initial_value: f64,
    #[serde(default)]
    pub decimal_places: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PadSpec {
    #[serde(flatten)]
    pub base: SpecBase,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwitchSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(default)]
    pub initially_on: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    pub options: Vec<String>,
    #[serde(default)]
    pub initial_index: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmButtonSpec {
    #[serde(flatten)]
    pub base: SpecBase,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmSwitchSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(default)]
    pub initially_on: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelSpec {
    #[serde(flatten)]
    pub base: SpecBase,
}

/// Display-only meter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CakeSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default)]
    pub initial_value: f64,
}

/// Keyed collection of child controls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    pub controls: HashMap<String, ControlSpec>,
}

/// Named pages, each a keyed collection of controls
///
/// Pages are a list rather than a map so the first page (the initially
/// active one) is well defined.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TabbedPagesSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    pub pages: Vec<PageSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageSpec {
    pub name: String,
    pub controls: HashMap<String, ControlSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresetButtonSpec {
    #[serde(flatten)]
    pub base: SpecBase,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LetterboxSpec {
    #[serde(flatten)]
    pub base: SpecBase,
}

fn default_size() -> f32 {
    10.0
}

fn default_color() -> String {
    "#888888".to_string()
}

fn default_max() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_index_is_position_derived() {
        let base = SpecBase {
            name: "volume".to_string(),
            x: 2.0,
            y: 5.0,
            w: 10.0,
            h: 10.0,
            color: "#888888".to_string(),
        };
        assert_eq!(base.tab_index(), 777 + 2 * 101 + 5);
    }

    #[test]
    fn test_spec_yaml_round_trip() {
        let yaml = r#"
type: fader
name: volume
x: 0
y: 10
min: 0.0
max: 100.0
initial_value: 50.0
"#;
        let spec: ControlSpec = serde_yaml::from_str(yaml).unwrap();
        match &spec {
            ControlSpec::Fader(f) => {
                assert_eq!(f.base.name, "volume");
                assert_eq!(f.max, 100.0);
                assert_eq!(f.initial_value, 50.0);
            }
            other => panic!("expected fader spec, got {:?}", other),
        }
    }

    #[test]
    fn test_tabbed_pages_spec() {
        let yaml = r#"
type: tabbed-pages
name: scenes
pages:
  - name: main
    controls:
      vol:
        type: fader
        name: volume
  - name: fx
    controls:
      wet:
        type: fader
        name: wet
"#;
        let spec: ControlSpec = serde_yaml::from_str(yaml).unwrap();
        match spec {
            ControlSpec::TabbedPages(t) => {
                assert_eq!(t.pages.len(), 2);
                assert_eq!(t.pages[0].name, "main");
                assert!(t.pages[0].controls.contains_key("vol"));
            }
            other => panic!("expected tabbed-pages spec, got {:?}", other),
        }
    }
}
