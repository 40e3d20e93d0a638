//! Ribbon XML parsing.
//!
//! Handles the `RibbonDefinitions` format returned by `RetrieveEntityRibbon`:
//! ```xml
//! <RibbonDefinitions>
//!   <RibbonDefinition>
//!     <UI>
//!       <Ribbon>
//!         <Tabs Id="Mscrm.Tabs">
//!           <Tab Id="Mscrm.HomepageGrid.account.MainTab" Sequence="10">
//!             <Groups Id="Mscrm.HomepageGrid.account.MainTab.Groups">
//!               <Group Id="Mscrm.HomepageGrid.account.MainTab.Management" Sequence="10">
//!                 <Controls Id="Mscrm.HomepageGrid.account.MainTab.Management.Controls">
//!                   <Button Id="Mscrm.HomepageGrid.account.NewRecord" Command="Mscrm.NewRecordFromGrid" Sequence="10" />
//!                 </Controls>
//!               </Group>
//!             </Groups>
//!           </Tab>
//!         </Tabs>
//!       </Ribbon>
//!     </UI>
//!     <CommandDefinitions>
//!       <CommandDefinition Id="Mscrm.NewRecordFromGrid">
//!         <EnableRules />
//!         <DisplayRules><DisplayRule Id="Mscrm.CreateSelectedEntityPermission" /></DisplayRules>
//!         <Actions><JavaScriptFunction FunctionName="XrmCore.Commands.Open.openNewRecord" Library="$webresource:Main_system_library.js" /></Actions>
//!       </CommandDefinition>
//!     </CommandDefinitions>
//!   </RibbonDefinition>
//! </RibbonDefinitions>
//! ```
//!
//! The root element is not checked, so the ribbon sections of a
//! `customizations.xml` parse the same way.

use std::collections::BTreeMap;
use std::path::Path;

use roxmltree::Node;
use tracing::debug;

use crate::error::{RibbonError, RibbonResult};
use crate::model::{CommandDefinition, Control, Group, RibbonDocument, RuleRef, Tab};

/// Parse a ribbon XML file.
pub fn parse_ribbon_file(path: &Path) -> RibbonResult<RibbonDocument> {
    let content = std::fs::read_to_string(path)?;
    parse_ribbon(&content)
}

/// Parse ribbon XML into a [`RibbonDocument`].
pub fn parse_ribbon(xml: &str) -> RibbonResult<RibbonDocument> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| RibbonError::MalformedXml(format!("XML parse error: {}", e)))?;

    let tabs: Vec<Tab> = doc
        .descendants()
        .filter(|n| n.has_tag_name("Tab"))
        .map(|n| parse_tab(&n))
        .collect();

    let mut command_definitions = BTreeMap::new();
    for node in doc
        .descendants()
        .filter(|n| n.has_tag_name("CommandDefinition"))
    {
        let definition = parse_command_definition(&node, xml);
        // First definition wins when an id repeats.
        command_definitions
            .entry(definition.id.clone())
            .or_insert(definition);
    }

    debug!(
        tabs = tabs.len(),
        commands = command_definitions.len(),
        "Ribbon XML parsed"
    );

    Ok(RibbonDocument {
        tabs,
        command_definitions,
        raw_xml: xml.to_string(),
    })
}

fn parse_tab(node: &Node) -> Tab {
    let groups = child_elements(*node, "Groups")
        .flat_map(|groups| child_elements(groups, "Group"))
        .map(|g| parse_group(&g))
        .collect();

    Tab {
        id: attr(node, "Id").unwrap_or_default(),
        command: attr(node, "Command"),
        title: attr(node, "Title"),
        sequence: attr(node, "Sequence"),
        attributes: attributes(node),
        groups,
    }
}

fn parse_group(node: &Node) -> Group {
    let mut controls = Vec::new();
    collect_controls(node, &mut controls);

    Group {
        id: attr(node, "Id").unwrap_or_default(),
        command: attr(node, "Command"),
        title: attr(node, "Title"),
        sequence: attr(node, "Sequence"),
        template: attr(node, "Template"),
        attributes: attributes(node),
        controls,
    }
}

fn parse_control(node: &Node) -> Control {
    let mut children = Vec::new();
    collect_controls(node, &mut children);

    Control {
        kind: node.tag_name().name().to_string(),
        id: attr(node, "Id").unwrap_or_default(),
        command: attr(node, "Command"),
        sequence: attr(node, "Sequence"),
        label: attr(node, "LabelText").or_else(|| attr(node, "Alt")),
        attributes: attributes(node),
        children,
    }
}

/// Walk down to the nearest `<Controls>` containers below `node` and parse
/// their element children. Menus and menu sections are descended through.
fn collect_controls(node: &Node, out: &mut Vec<Control>) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.has_tag_name("Controls") {
            out.extend(
                child
                    .children()
                    .filter(|n| n.is_element())
                    .map(|c| parse_control(&c)),
            );
        } else {
            collect_controls(&child, out);
        }
    }
}

fn parse_command_definition(node: &Node, source: &str) -> CommandDefinition {
    let mut definition = CommandDefinition {
        id: attr(node, "Id").unwrap_or_default(),
        ..Default::default()
    };

    for child in node.children().filter(|n| n.is_element()) {
        let refs = child
            .children()
            .filter(|n| n.is_element())
            .map(|r| rule_ref(&r, source));

        match child.tag_name().name() {
            "EnableRules" => definition.enable_rules.extend(refs),
            "DisplayRules" => definition.display_rules.extend(refs),
            "Actions" => definition.actions.extend(refs),
            _ => {}
        }
    }

    definition
}

fn rule_ref(node: &Node, source: &str) -> RuleRef {
    RuleRef {
        kind: node.tag_name().name().to_string(),
        id: attr(node, "Id"),
        raw: source
            .get(node.range())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

fn attr(node: &Node, name: &str) -> Option<String> {
    node.attribute(name).map(|v| v.to_string())
}

fn attributes(node: &Node) -> BTreeMap<String, String> {
    node.attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect()
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(name))
}
