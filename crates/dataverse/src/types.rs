use ribbon_core::{EntityRef, PublisherRef, SolutionRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OData collection envelope: `{"value": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct ODataCollection<T> {
    pub value: Vec<T>,
}

impl<T> ODataCollection<T> {
    /// Take the first element, if any.
    pub fn into_first(self) -> Option<T> {
        self.value.into_iter().next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherRecord {
    pub publisherid: Uuid,
    pub uniquename: String,
    #[serde(default)]
    pub customizationprefix: Option<String>,
}

impl From<PublisherRecord> for PublisherRef {
    fn from(record: PublisherRecord) -> Self {
        PublisherRef {
            id: record.publisherid,
            unique_name: record.uniquename,
            customization_prefix: record.customizationprefix,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRecord {
    pub entityid: Uuid,
    pub logicalname: String,
}

impl From<EntityRecord> for EntityRef {
    fn from(record: EntityRecord) -> Self {
        EntityRef {
            logical_name: record.logicalname,
            id: record.entityid,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolutionRecord {
    pub solutionid: Uuid,
    pub uniquename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSolutionRequest {
    pub uniquename: String,
    pub friendlyname: String,
    pub version: String,
    #[serde(rename = "publisherid@odata.bind")]
    pub publisher_bind: String,
}

impl From<&SolutionRef> for CreateSolutionRequest {
    fn from(solution: &SolutionRef) -> Self {
        Self {
            uniquename: solution.unique_name.clone(),
            friendlyname: solution.friendly_name.clone(),
            version: solution.version.clone(),
            publisher_bind: format!("/publishers({})", solution.publisher_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddSolutionComponentRequest {
    pub component_id: Uuid,
    pub component_type: i32,
    pub solution_unique_name: String,
    pub add_required_components: bool,
    pub do_not_include_subcomponents: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportSolutionRequest {
    pub solution_name: String,
    pub managed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportSolutionResponse {
    #[serde(rename = "ExportSolutionFile")]
    pub export_solution_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveEntityRibbonResponse {
    #[serde(rename = "CompressedEntityXml")]
    pub compressed_entity_xml: String,
}

/// Error body returned by the Web API on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ODataErrorEnvelope {
    pub error: ODataErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ODataErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Escape a value for use inside an OData string literal.
pub fn odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odata_literal_escapes_quotes() {
        assert_eq!(odata_literal("o'brien"), "o''brien");
        assert_eq!(odata_literal("account"), "account");
    }

    #[test]
    fn test_create_solution_request_binds_publisher() {
        let id = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let solution = SolutionRef::for_entity("Prefix", "account", id);
        let json = serde_json::to_value(CreateSolutionRequest::from(&solution)).unwrap();

        assert_eq!(json["uniquename"], "PrefixAccount");
        assert_eq!(
            json["publisherid@odata.bind"],
            "/publishers(11111111-1111-1111-1111-111111111111)"
        );
    }

    #[test]
    fn test_add_component_request_is_pascal_case() {
        let request = AddSolutionComponentRequest {
            component_id: Uuid::nil(),
            component_type: 1,
            solution_unique_name: "PrefixAccount".to_string(),
            add_required_components: false,
            do_not_include_subcomponents: false,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["ComponentType"], 1);
        assert_eq!(json["SolutionUniqueName"], "PrefixAccount");
        assert!(json.get("AddRequiredComponents").is_some());
    }

    #[test]
    fn test_publisher_record_conversion() {
        let record: PublisherRecord = serde_json::from_str(
            r#"{"publisherid":"11111111-1111-1111-1111-111111111111","uniquename":"contoso","customizationprefix":"con"}"#,
        )
        .unwrap();
        let publisher = PublisherRef::from(record);

        assert_eq!(publisher.unique_name, "contoso");
        assert_eq!(publisher.customization_prefix.as_deref(), Some("con"));
    }

    #[test]
    fn test_empty_collection_has_no_first() {
        let collection: ODataCollection<EntityRecord> =
            serde_json::from_str(r#"{"@odata.context":"x","value":[]}"#).unwrap();
        assert!(collection.into_first().is_none());
    }
}
