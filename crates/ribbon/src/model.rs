use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::RibbonResult;

/// Normalized ribbon of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibbonDocument {
    /// Tabs in document order, contextual tabs included
    pub tabs: Vec<Tab>,
    /// Command definitions keyed by command id
    pub command_definitions: BTreeMap<String, CommandDefinition>,
    /// The XML this document was parsed from
    pub raw_xml: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    /// Every attribute of the element, verbatim
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Element name, e.g. `Button`, `FlyoutAnchor`, `SplitButton`
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Controls nested under menus and menu sections
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Control>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub id: String,
    pub enable_rules: Vec<RuleRef>,
    pub display_rules: Vec<RuleRef>,
    pub actions: Vec<RuleRef>,
}

/// Opaque reference to a rule or action element, kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub raw: String,
}

impl RibbonDocument {
    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn command(&self, id: &str) -> Option<&CommandDefinition> {
        self.command_definitions.get(id)
    }

    pub fn tab_ids(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn group_count(&self) -> usize {
        self.tabs.iter().map(|t| t.groups.len()).sum()
    }

    /// Number of controls including those nested in menus.
    pub fn control_count(&self) -> usize {
        self.tabs
            .iter()
            .flat_map(|t| t.groups.iter())
            .flat_map(|g| g.controls.iter())
            .map(Control::count)
            .sum()
    }

    /// Command ids referenced anywhere in the tab tree.
    ///
    /// Ids are returned as-is; no check is made that a definition exists.
    pub fn referenced_commands(&self) -> BTreeSet<&str> {
        let mut ids = BTreeSet::new();
        for tab in &self.tabs {
            if let Some(cmd) = &tab.command {
                ids.insert(cmd.as_str());
            }
            for group in &tab.groups {
                if let Some(cmd) = &group.command {
                    ids.insert(cmd.as_str());
                }
                for control in &group.controls {
                    control.collect_commands(&mut ids);
                }
            }
        }
        ids
    }

    pub fn to_json(&self) -> RibbonResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> RibbonResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> RibbonResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Control {
    fn count(&self) -> usize {
        1 + self.children.iter().map(Control::count).sum::<usize>()
    }

    fn collect_commands<'a>(&'a self, ids: &mut BTreeSet<&'a str>) {
        if let Some(cmd) = &self.command {
            ids.insert(cmd.as_str());
        }
        for child in &self.children {
            child.collect_commands(ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(id: &str, command: &str) -> Control {
        Control {
            kind: "Button".to_string(),
            id: id.to_string(),
            command: Some(command.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_counts_include_nested_controls() {
        let mut flyout = button("Flyout", "Cmd.Flyout");
        flyout.kind = "FlyoutAnchor".to_string();
        flyout.children = vec![button("A", "Cmd.A"), button("B", "Cmd.B")];

        let doc = RibbonDocument {
            tabs: vec![Tab {
                id: "Tab1".to_string(),
                groups: vec![Group {
                    id: "Group1".to_string(),
                    controls: vec![button("Save", "Cmd.Save"), flyout],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        assert_eq!(doc.group_count(), 1);
        assert_eq!(doc.control_count(), 4);
        let commands = doc.referenced_commands();
        assert!(commands.contains("Cmd.A"));
        assert!(commands.contains("Cmd.Save"));
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_lookup_by_id() {
        let mut doc = RibbonDocument::default();
        doc.tabs.push(Tab {
            id: "Mscrm.Form.account.MainTab".to_string(),
            ..Default::default()
        });
        doc.command_definitions.insert(
            "Mscrm.SaveForm".to_string(),
            CommandDefinition {
                id: "Mscrm.SaveForm".to_string(),
                ..Default::default()
            },
        );

        assert!(doc.tab("Mscrm.Form.account.MainTab").is_some());
        assert!(doc.tab("missing").is_none());
        assert!(doc.command("Mscrm.SaveForm").is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let doc = RibbonDocument {
            tabs: vec![Tab {
                id: "Tab1".to_string(),
                sequence: Some("010".to_string()),
                ..Default::default()
            }],
            raw_xml: "<Tab Id=\"Tab1\" Sequence=\"010\"/>".to_string(),
            ..Default::default()
        };

        let json = doc.to_json().unwrap();
        let back = RibbonDocument::from_json(&json).unwrap();
        assert_eq!(back, doc);
    }
}
