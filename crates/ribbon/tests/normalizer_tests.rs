use std::path::PathBuf;

use ribbon::{parse_ribbon, parse_ribbon_file, RibbonDocument};
use serde_json::Value;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture() -> String {
    std::fs::read_to_string(fixture_path("account_ribbon.xml")).expect("Failed to read fixture")
}

/// Collect every `<Tab>` id and every `Sequence` value with a plain text scan,
/// independent of the XML parser under test.
fn tab_ids_and_sequences(xml: &str) -> (Vec<String>, Vec<String>) {
    let mut tab_ids = Vec::new();
    let mut sequences = Vec::new();

    for chunk in xml.split('<').skip(1) {
        let tag_end = chunk.find(|c: char| c.is_whitespace() || c == '>' || c == '/');
        let tag = match tag_end {
            Some(end) => &chunk[..end],
            None => chunk,
        };

        if tag == "Tab" {
            if let Some(id) = attribute_value(chunk, "Id") {
                tab_ids.push(id);
            }
        }
        if let Some(seq) = attribute_value(chunk, "Sequence") {
            sequences.push(seq);
        }
    }

    (tab_ids, sequences)
}

fn attribute_value(chunk: &str, name: &str) -> Option<String> {
    let head = &chunk[..chunk.find('>').unwrap_or(chunk.len())];
    let needle = format!(" {}=\"", name);
    let start = head.find(&needle)? + needle.len();
    let len = head[start..].find('"')?;
    Some(head[start..start + len].to_string())
}

fn collect_json_strings(value: &Value, key: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    if let Value::String(s) = v {
                        out.push(s.clone());
                    }
                }
                collect_json_strings(v, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_strings(item, key, out);
            }
        }
        _ => {}
    }
}

#[test]
fn test_fixture_structure() {
    let doc = parse_ribbon_file(&fixture_path("account_ribbon.xml")).unwrap();

    assert_eq!(
        doc.tab_ids(),
        vec![
            "Mscrm.HomepageGrid.account.MainTab",
            "Mscrm.Form.account.MainTab",
            "Mscrm.SubGrid.account.MainTab",
        ]
    );

    let grid = doc.tab("Mscrm.HomepageGrid.account.MainTab").unwrap();
    assert_eq!(grid.groups.len(), 2);
    assert_eq!(grid.attributes.get("Description").map(String::as_str), Some("Accounts"));

    let management = &grid.groups[0];
    assert_eq!(management.controls.len(), 3);
    let split = &management.controls[2];
    assert_eq!(split.kind, "SplitButton");
    assert_eq!(split.sequence.as_deref(), Some("05"));
    assert_eq!(split.children.len(), 2);
    assert_eq!(
        split.children[1].label.as_deref(),
        Some("$Resources:Ribbon.HomepageGrid.MainTab.Management.BulkDelete")
    );

    assert_eq!(doc.group_count(), 4);
    assert_eq!(doc.control_count(), 10);
}

#[test]
fn test_fixture_command_definitions() {
    let doc = parse_ribbon(&load_fixture()).unwrap();

    assert_eq!(doc.command_definitions.len(), 4);

    let new_record = doc.command("Mscrm.NewRecordFromGrid").unwrap();
    assert_eq!(new_record.enable_rules.len(), 1);
    assert_eq!(new_record.display_rules.len(), 2);
    assert_eq!(new_record.actions.len(), 1);
    assert!(new_record.actions[0]
        .raw
        .contains(r#"<CrmParameter Value="SelectedEntityTypeName" />"#));

    let save = doc.command("Mscrm.SaveAndClosePrimary").unwrap();
    assert_eq!(save.actions[0].kind, "Url");
    assert!(save.display_rules.is_empty());
}

#[test]
fn test_dangling_references_are_preserved() {
    let doc = parse_ribbon(&load_fixture()).unwrap();

    let referenced = doc.referenced_commands();
    assert!(referenced.contains("contoso.account.Command.Missing"));
    assert!(doc.command("contoso.account.Command.Missing").is_none());
}

#[test]
fn test_json_preserves_tab_ids_and_sequences() {
    let xml = load_fixture();
    let (expected_tab_ids, expected_sequences) = tab_ids_and_sequences(&xml);
    assert!(!expected_tab_ids.is_empty());
    assert!(expected_sequences.contains(&"0015".to_string()));

    let doc = parse_ribbon(&xml).unwrap();
    let json: Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

    let tab_ids: Vec<String> = json["tabs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tab_ids, expected_tab_ids);

    let mut serialized_sequences = Vec::new();
    collect_json_strings(&json["tabs"], "Sequence", &mut serialized_sequences);
    collect_json_strings(&json["tabs"], "sequence", &mut serialized_sequences);

    // Sequences that live on tab-tree elements must come back verbatim.
    for seq in ["100", "10", "20", "05", "0015", "5"] {
        assert!(
            serialized_sequences.iter().any(|s| s == seq),
            "sequence {} lost in serialization",
            seq
        );
    }

    // The raw XML carries every Sequence, including Scaling and ContextualGroup ones.
    let raw = json["raw_xml"].as_str().unwrap();
    let (_, raw_sequences) = tab_ids_and_sequences(raw);
    assert_eq!(raw_sequences, expected_sequences);
}

#[test]
fn test_json_round_trip_of_fixture() {
    let doc = parse_ribbon(&load_fixture()).unwrap();
    let back = RibbonDocument::from_json(&doc.to_json().unwrap()).unwrap();
    assert_eq!(back, doc);
}
