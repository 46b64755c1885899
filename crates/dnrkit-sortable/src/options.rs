//! Sortable list options.

use crate::error::{SortableError, SortableResult};
use crate::events::{MoveEvent, MoveOutcome};
use crate::group::GroupOptions;
use dnrkit_core::{ConfigError, ConfigResult, Dom, ElementId};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Main axis of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// Drag payload for platform drag and drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    data: BTreeMap<String, String>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, format: &str, data: &str) {
        self.data.insert(format.to_string(), data.to_string());
    }

    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.data.get(format).map(String::as_str)
    }

    pub fn types(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

pub type SetDataFn = Rc<dyn Fn(&mut DataTransfer, ElementId)>;
pub type MoveFn = Rc<dyn Fn(&MoveEvent) -> MoveOutcome>;
/// `(dom, pointer target, list)`; returning true blocks the drag.
pub type FilterFn = Rc<dyn Fn(&dyn Dom, ElementId, ElementId) -> bool>;

/// Options of a sortable list.
///
/// Loaded from camelCase JSON. Callbacks are code-only.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortableOptions {
    /// Selector for items. `None` means `>li` inside `ul`/`ol` and `>*` elsewhere.
    pub draggable: Option<String>,
    /// Selector a drag must start on.
    pub handle: Option<String>,
    /// Selector of elements that never start a drag.
    pub filter: Option<String>,
    pub prevent_on_filter: bool,
    pub group: Option<GroupOptions>,
    /// Allow reordering inside the list.
    pub sort: bool,
    pub disabled: bool,
    /// Milliseconds between pointer down and the item being chosen.
    pub delay: u64,
    pub delay_on_touch_only: bool,
    /// Pointer travel (px) that cancels a pending delay.
    pub touch_start_threshold: f64,
    /// Animation duration in milliseconds; 0 disables animation.
    pub animation: u64,
    pub easing: Option<String>,
    pub ghost_class: String,
    pub chosen_class: String,
    pub drag_class: String,
    pub selected_class: String,
    pub multi_drag: bool,
    pub scroll: bool,
    pub scroll_sensitivity: f64,
    pub scroll_speed: f64,
    pub swap_threshold: f64,
    pub invert_swap: bool,
    /// Defaults to `swap_threshold`.
    pub inverted_swap_threshold: Option<f64>,
    pub direction: Option<Direction>,
    pub force_fallback: bool,
    pub fallback_class: String,
    pub fallback_on_body: bool,
    /// Pointer travel (px) before a fallback drag starts.
    pub fallback_tolerance: f64,
    pub fallback_offset: Vec2,
    pub data_id_attr: String,
    pub remove_on_spill: bool,
    pub revert_on_spill: bool,

    #[serde(skip)]
    pub set_data: Option<SetDataFn>,
    #[serde(skip)]
    pub on_move: Option<MoveFn>,
    #[serde(skip)]
    pub filter_fn: Option<FilterFn>,
}

impl Default for SortableOptions {
    fn default() -> Self {
        Self {
            draggable: None,
            handle: None,
            filter: None,
            prevent_on_filter: true,
            group: None,
            sort: true,
            disabled: false,
            delay: 0,
            delay_on_touch_only: false,
            touch_start_threshold: 1.0,
            animation: 0,
            easing: None,
            ghost_class: "sortable-ghost".to_string(),
            chosen_class: "sortable-chosen".to_string(),
            drag_class: "sortable-drag".to_string(),
            selected_class: "sortable-selected".to_string(),
            multi_drag: false,
            scroll: true,
            scroll_sensitivity: 30.0,
            scroll_speed: 10.0,
            swap_threshold: 1.0,
            invert_swap: false,
            inverted_swap_threshold: None,
            direction: None,
            force_fallback: false,
            fallback_class: "sortable-fallback".to_string(),
            fallback_on_body: false,
            fallback_tolerance: 0.0,
            fallback_offset: Vec2::ZERO,
            data_id_attr: "data-id".to_string(),
            remove_on_spill: false,
            revert_on_spill: false,
            set_data: None,
            on_move: None,
            filter_fn: None,
        }
    }
}

impl fmt::Debug for SortableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableOptions")
            .field("draggable", &self.draggable)
            .field("handle", &self.handle)
            .field("filter", &self.filter)
            .field("group", &self.group)
            .field("sort", &self.sort)
            .field("disabled", &self.disabled)
            .field("animation", &self.animation)
            .field("force_fallback", &self.force_fallback)
            .finish_non_exhaustive()
    }
}

macro_rules! named_options {
    ($($field:ident => $name:literal),* $(,)?) => {
        impl SortableOptions {
            /// Names accepted by [`get`](Self::get) and [`set`](Self::set).
            pub const NAMES: &'static [&'static str] = &[$($name),*];

            /// Current value of a named option as JSON.
            pub fn get(&self, name: &str) -> Option<serde_json::Value> {
                match name {
                    $($name => serde_json::to_value(&self.$field).ok(),)*
                    _ => None,
                }
            }

            /// Replace a named option from JSON.
            pub fn set(&mut self, name: &str, value: serde_json::Value) -> SortableResult<()> {
                match name {
                    $($name => {
                        self.$field = serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
                            option: name.to_string(),
                            reason: e.to_string(),
                        })?;
                    })*
                    _ => return Err(SortableError::UnknownOption(name.to_string())),
                }
                Ok(())
            }
        }
    };
}

named_options! {
    draggable => "draggable",
    handle => "handle",
    filter => "filter",
    prevent_on_filter => "preventOnFilter",
    group => "group",
    sort => "sort",
    disabled => "disabled",
    delay => "delay",
    delay_on_touch_only => "delayOnTouchOnly",
    touch_start_threshold => "touchStartThreshold",
    animation => "animation",
    easing => "easing",
    ghost_class => "ghostClass",
    chosen_class => "chosenClass",
    drag_class => "dragClass",
    selected_class => "selectedClass",
    multi_drag => "multiDrag",
    scroll => "scroll",
    scroll_sensitivity => "scrollSensitivity",
    scroll_speed => "scrollSpeed",
    swap_threshold => "swapThreshold",
    invert_swap => "invertSwap",
    inverted_swap_threshold => "invertedSwapThreshold",
    direction => "direction",
    force_fallback => "forceFallback",
    fallback_class => "fallbackClass",
    fallback_on_body => "fallbackOnBody",
    fallback_tolerance => "fallbackTolerance",
    fallback_offset => "fallbackOffset",
    data_id_attr => "dataIdAttr",
    remove_on_spill => "removeOnSpill",
    revert_on_spill => "revertOnSpill",
}

impl SortableOptions {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        dnrkit_core::options::from_json(json)
    }

    /// Item selector for a list element.
    pub fn item_selector(&self, dom: &dyn Dom, list: ElementId) -> String {
        match &self.draggable {
            Some(selector) => selector.clone(),
            None => match dom.tag_name(list).as_deref() {
                Some("ul" | "ol") => ">li".to_string(),
                _ => ">*".to_string(),
            },
        }
    }

    pub fn inverted_threshold(&self) -> f64 {
        self.inverted_swap_threshold.unwrap_or(self.swap_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Put;
    use dnrkit_core::MemoryDom;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = SortableOptions::default();
        assert!(options.sort);
        assert!(options.scroll);
        assert_eq!(options.swap_threshold, 1.0);
        assert_eq!(options.inverted_threshold(), 1.0);
        assert_eq!(options.ghost_class, "sortable-ghost");
        assert_eq!(options.data_id_attr, "data-id");
    }

    #[test]
    fn test_from_json() {
        let options = SortableOptions::from_json(
            r#"{"group":"shared","animation":150,"forceFallback":true,"fallbackOffset":{"x":4,"y":2},"direction":"horizontal"}"#,
        )
        .unwrap();
        assert_eq!(options.group.as_ref().map(|g| g.name.as_str()), Some("shared"));
        assert_eq!(options.animation, 150);
        assert!(options.force_fallback);
        assert_eq!(options.fallback_offset, Vec2::new(4.0, 2.0));
        assert_eq!(options.direction, Some(Direction::Horizontal));
    }

    #[test]
    fn test_named_access() {
        let mut options = SortableOptions::default();
        assert_eq!(options.get("swapThreshold"), Some(json!(1.0)));
        options.set("swapThreshold", json!(0.5)).unwrap();
        assert_eq!(options.swap_threshold, 0.5);

        options.set("group", json!({"name": "a", "put": ["b"]})).unwrap();
        assert!(matches!(options.group.as_ref().map(|g| &g.put), Some(Put::Groups(_))));

        assert!(matches!(options.set("nope", json!(1)), Err(SortableError::UnknownOption(_))));
        assert!(matches!(
            options.set("animation", json!("slow")),
            Err(SortableError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(SortableOptions::NAMES.iter().all(|n| options.get(n).is_some()));
    }

    #[test]
    fn test_item_selector_by_tag() {
        let mut dom = MemoryDom::new();
        let ul = dom.create_element("ul");
        let div = dom.create_element("div");
        let options = SortableOptions::default();
        assert_eq!(options.item_selector(&dom, ul), ">li");
        assert_eq!(options.item_selector(&dom, div), ">*");
    }

    #[test]
    fn test_data_transfer() {
        let mut transfer = DataTransfer::new();
        transfer.set_data("text/plain", "A");
        assert_eq!(transfer.get_data("text/plain"), Some("A"));
        assert_eq!(transfer.types(), vec!["text/plain"]);
        transfer.clear();
        assert!(transfer.get_data("text/plain").is_none());
    }
}
