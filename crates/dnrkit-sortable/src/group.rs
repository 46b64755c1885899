//! Cross-list pull/put permissions.

use dnrkit_core::{DomEvent, ElementId};
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// How an item leaves its source list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullMode {
    /// The item itself moves.
    Move,
    /// The item moves and a clone stays behind in the source list.
    Clone,
}

/// Arguments handed to pull/put predicates.
#[derive(Debug, Clone, Copy)]
pub struct GroupQuery<'a> {
    pub from: ElementId,
    pub to: ElementId,
    pub dragged: ElementId,
    pub event: Option<&'a DomEvent>,
}

pub type PullFn = Rc<dyn Fn(&GroupQuery<'_>) -> Option<PullMode>>;
pub type PutFn = Rc<dyn Fn(&GroupQuery<'_>) -> bool>;

/// Whether items may leave a list.
#[derive(Clone)]
pub enum Pull {
    Allowed(bool),
    Clone,
    /// `None` denies the pull.
    Predicate(PullFn),
}

impl Default for Pull {
    fn default() -> Self {
        Pull::Allowed(true)
    }
}

impl Pull {
    pub fn resolve(&self, query: &GroupQuery<'_>) -> Option<PullMode> {
        match self {
            Pull::Allowed(true) => Some(PullMode::Move),
            Pull::Allowed(false) => None,
            Pull::Clone => Some(PullMode::Clone),
            Pull::Predicate(f) => f(query),
        }
    }
}

impl fmt::Debug for Pull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pull::Allowed(v) => write!(f, "Allowed({v})"),
            Pull::Clone => f.write_str("Clone"),
            Pull::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Whether items from other lists may enter a list.
#[derive(Clone, Default)]
pub enum Put {
    Allowed(bool),
    /// Only lists with the same group name.
    #[default]
    SameGroup,
    /// Only lists whose group name is listed.
    Groups(Vec<String>),
    Predicate(PutFn),
}

impl Put {
    pub fn allows(&self, source_group: Option<&str>, target_group: Option<&str>, query: &GroupQuery<'_>) -> bool {
        match self {
            Put::Allowed(v) => *v,
            Put::SameGroup => source_group.is_some() && source_group == target_group,
            Put::Groups(names) => source_group.is_some_and(|s| names.iter().any(|n| n == s)),
            Put::Predicate(f) => f(query),
        }
    }
}

impl fmt::Debug for Put {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Put::Allowed(v) => write!(f, "Allowed({v})"),
            Put::SameGroup => f.write_str("SameGroup"),
            Put::Groups(names) => f.debug_tuple("Groups").field(names).finish(),
            Put::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionRepr {
    Bool(bool),
    Name(String),
    Names(Vec<String>),
}

impl<'de> Deserialize<'de> for Pull {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PermissionRepr::deserialize(deserializer)? {
            PermissionRepr::Bool(v) => Ok(Pull::Allowed(v)),
            PermissionRepr::Name(name) if name == "clone" => Ok(Pull::Clone),
            PermissionRepr::Name(name) => Err(de::Error::invalid_value(Unexpected::Str(&name), &"true, false or \"clone\"")),
            PermissionRepr::Names(_) => Err(de::Error::invalid_type(Unexpected::Seq, &"true, false or \"clone\"")),
        }
    }
}

impl Serialize for Pull {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Pull::Allowed(v) => serializer.serialize_bool(*v),
            Pull::Clone => serializer.serialize_str("clone"),
            Pull::Predicate(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Put {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PermissionRepr::deserialize(deserializer)? {
            PermissionRepr::Bool(v) => Ok(Put::Allowed(v)),
            PermissionRepr::Name(name) if name == "same-group" => Ok(Put::SameGroup),
            PermissionRepr::Name(name) => Err(de::Error::invalid_value(
                Unexpected::Str(&name),
                &"true, false, \"same-group\" or a list of group names",
            )),
            PermissionRepr::Names(names) => Ok(Put::Groups(names)),
        }
    }
}

impl Serialize for Put {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Put::Allowed(v) => serializer.serialize_bool(*v),
            Put::SameGroup => serializer.serialize_str("same-group"),
            Put::Groups(names) => names.serialize(serializer),
            Put::Predicate(_) => serializer.serialize_none(),
        }
    }
}

/// Group settings of a list.
///
/// Deserializes from either a bare group name or a full object.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOptions {
    pub name: String,
    pub pull: Pull,
    pub put: Put,
    /// Put the clone back in place when the item returns to its source.
    pub revert_clone: bool,
}

impl GroupOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroupFields {
    name: String,
    pull: Pull,
    put: Put,
    revert_clone: bool,
}

impl Default for GroupFields {
    fn default() -> Self {
        let GroupOptions {
            name,
            pull,
            put,
            revert_clone,
        } = GroupOptions::default();
        Self {
            name,
            pull,
            put,
            revert_clone,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupRepr {
    Name(String),
    Fields(GroupFields),
}

impl<'de> Deserialize<'de> for GroupOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match GroupRepr::deserialize(deserializer)? {
            GroupRepr::Name(name) => GroupOptions::named(name),
            GroupRepr::Fields(fields) => GroupOptions {
                name: fields.name,
                pull: fields.pull,
                put: fields.put,
                revert_clone: fields.revert_clone,
            },
        })
    }
}

/// Result of a drop permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropDecision {
    pub allowed: bool,
    pub pull_mode: Option<PullMode>,
    pub source_group: Option<String>,
    pub target_group: Option<String>,
    pub revert_clone: bool,
}

impl DropDecision {
    fn deny(source_group: Option<String>, target_group: Option<String>) -> Self {
        Self {
            allowed: false,
            pull_mode: None,
            source_group,
            target_group,
            revert_clone: false,
        }
    }
}

/// Registry of list groups.
///
/// Keyed by container, with a secondary index by group name. Lists that
/// never registered take no part in cross-list transfers.
#[derive(Debug, Default)]
pub struct GroupManager {
    groups: HashMap<ElementId, GroupOptions>,
    by_name: HashMap<String, Vec<ElementId>>,
}

impl GroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container, replacing its previous group.
    pub fn register(&mut self, container: ElementId, group: GroupOptions) {
        self.unregister(container);
        self.by_name.entry(group.name.clone()).or_default().push(container);
        log::debug!("List {container} joined group {:?}", group.name);
        self.groups.insert(container, group);
    }

    pub fn unregister(&mut self, container: ElementId) -> Option<GroupOptions> {
        let group = self.groups.remove(&container)?;
        if let Some(members) = self.by_name.get_mut(&group.name) {
            members.retain(|&c| c != container);
            if members.is_empty() {
                self.by_name.remove(&group.name);
            }
        }
        Some(group)
    }

    pub fn is_registered(&self, container: ElementId) -> bool {
        self.groups.contains_key(&container)
    }

    pub fn group_of(&self, container: ElementId) -> Option<&GroupOptions> {
        self.groups.get(&container)
    }

    /// Containers registered under a group name, in registration order.
    pub fn containers_in_group(&self, name: &str) -> Vec<ElementId> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Decide whether `dragged` may be dropped from `source` into `target`.
    pub fn can_accept_drop(
        &self,
        source: ElementId,
        target: ElementId,
        dragged: ElementId,
        event: Option<&DomEvent>,
    ) -> DropDecision {
        let source_group = self.groups.get(&source);
        let target_group = self.groups.get(&target);
        let source_name = source_group.map(|g| g.name.clone());
        let target_name = target_group.map(|g| g.name.clone());

        if source == target {
            return DropDecision {
                allowed: true,
                pull_mode: Some(PullMode::Move),
                source_group: source_name,
                target_group: target_name,
                revert_clone: false,
            };
        }

        let (Some(from), Some(to)) = (source_group, target_group) else {
            return DropDecision::deny(source_name, target_name);
        };
        let query = GroupQuery {
            from: source,
            to: target,
            dragged,
            event,
        };
        let Some(pull_mode) = from.pull.resolve(&query) else {
            return DropDecision::deny(source_name, target_name);
        };
        if !to.put.allows(Some(&from.name), Some(&to.name), &query) {
            return DropDecision::deny(source_name, target_name);
        }

        DropDecision {
            allowed: true,
            pull_mode: Some(pull_mode),
            source_group: source_name,
            target_group: target_name,
            revert_clone: from.revert_clone,
        }
    }
}
