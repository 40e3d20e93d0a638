use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use ribbon_core::{
    ComponentType, EntityRef, ExportedPackage, OrgConfig, PublisherRef, SolutionRef,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::Authenticator;
use crate::error::{DataverseError, Result};
use crate::traits::SolutionApi;
use crate::types::{
    odata_literal, AddSolutionComponentRequest, CreateSolutionRequest, EntityRecord,
    ExportSolutionRequest, ExportSolutionResponse, ODataCollection, ODataErrorEnvelope,
    PublisherRecord, RetrieveEntityRibbonResponse, SolutionRecord,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(600);

/// Client for the Dataverse Web API (`{org}/api/data/v{version}`).
#[derive(Clone)]
pub struct DataverseClient {
    client: Client,
    base_url: String,
    authenticator: Arc<dyn Authenticator>,
    request_timeout: Duration,
    export_timeout: Duration,
}

impl DataverseClient {
    pub fn new(base_url: impl Into<String>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self::with_client(base_url, Client::new(), authenticator)
    }

    pub fn with_client(
        base_url: impl Into<String>,
        client: Client,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authenticator,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
        }
    }

    pub fn from_config(config: &OrgConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        Self::new(config.api_base_url(), authenticator)
            .with_timeouts(config.request_timeout(), config.export_timeout())
    }

    pub fn with_timeouts(mut self, request: Duration, export: Duration) -> Self {
        self.request_timeout = request;
        self.export_timeout = export;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send an authorized request, refreshing the token once on `401`.
    ///
    /// `build` is called once per attempt so the request can be replayed.
    async fn send<F>(&self, operation: &str, timeout: Duration, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.authenticator.token().await?;
        let response = self.execute(operation, timeout, build(&self.client), &token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return self.check_status(operation, response).await;
        }

        warn!(operation, "Request unauthorized, refreshing token");
        let token = self.authenticator.refresh().await?;
        let response = self.execute(operation, timeout, build(&self.client), &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(DataverseError::Auth(format!(
                "{} rejected after token refresh",
                operation
            )));
        }

        self.check_status(operation, response).await
    }

    async fn execute(
        &self,
        operation: &str,
        timeout: Duration,
        request: RequestBuilder,
        token: &str,
    ) -> Result<Response> {
        debug!(operation, timeout_secs = timeout.as_secs(), "Sending request");

        request
            .bearer_auth(token)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DataverseError::from_request(operation, e))
    }

    async fn check_status(&self, operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ODataErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => body,
        };

        Err(DataverseError::Http {
            operation: operation.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, operation: &str, response: Response) -> Result<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| DataverseError::from_request(operation, e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn query_first<T: DeserializeOwned>(
        &self,
        operation: &str,
        collection: &str,
        filter: String,
        select: &str,
    ) -> Result<Option<T>> {
        let url = self.url(collection);
        let response = self
            .send(operation, self.request_timeout, |client| {
                client
                    .get(&url)
                    .query(&[("$filter", filter.as_str()), ("$select", select)])
            })
            .await?;

        let collection: ODataCollection<T> = self.read_json(operation, response).await?;
        Ok(collection.into_first())
    }
}

impl DataverseClient {
    pub async fn get_publisher(&self, unique_name: &str) -> Result<PublisherRef> {
        debug!(publisher = %unique_name, "Looking up publisher");

        let record: Option<PublisherRecord> = self
            .query_first(
                "get_publisher",
                "publishers",
                format!("uniquename eq '{}'", odata_literal(unique_name)),
                "publisherid,uniquename,customizationprefix",
            )
            .await?;

        record
            .map(PublisherRef::from)
            .ok_or_else(|| DataverseError::not_found("Publisher", unique_name))
    }

    pub async fn get_entity_id(&self, logical_name: &str) -> Result<EntityRef> {
        debug!(entity = %logical_name, "Looking up entity");

        let record: Option<EntityRecord> = self
            .query_first(
                "get_entity_id",
                "entities",
                format!("logicalname eq '{}'", odata_literal(logical_name)),
                "entityid,logicalname",
            )
            .await?;

        record
            .map(EntityRef::from)
            .ok_or_else(|| DataverseError::not_found("Entity", logical_name))
    }

    pub async fn find_solution(&self, unique_name: &str) -> Result<Option<Uuid>> {
        let record: Option<SolutionRecord> = self
            .query_first(
                "find_solution",
                "solutions",
                format!("uniquename eq '{}'", odata_literal(unique_name)),
                "solutionid,uniquename",
            )
            .await?;

        Ok(record.map(|r| r.solutionid))
    }

    pub async fn create_solution(&self, solution: &SolutionRef) -> Result<()> {
        info!(
            solution = %solution.unique_name,
            publisher = %solution.publisher_id,
            "Creating solution"
        );

        let url = self.url("solutions");
        let request = CreateSolutionRequest::from(solution);
        self.send("create_solution", self.request_timeout, |client| {
            client.post(&url).json(&request)
        })
        .await?;

        Ok(())
    }

    pub async fn add_component_to_solution(
        &self,
        component_id: Uuid,
        solution_unique_name: &str,
        component_type: ComponentType,
    ) -> Result<()> {
        info!(
            component = %component_id,
            component_type = component_type.as_str(),
            solution = %solution_unique_name,
            "Adding component to solution"
        );

        let url = self.url("AddSolutionComponent");
        let request = AddSolutionComponentRequest {
            component_id,
            component_type: component_type.code(),
            solution_unique_name: solution_unique_name.to_string(),
            add_required_components: false,
            do_not_include_subcomponents: false,
        };
        self.send("add_component_to_solution", self.request_timeout, |client| {
            client.post(&url).json(&request)
        })
        .await?;

        Ok(())
    }

    pub async fn export_solution(
        &self,
        solution_unique_name: &str,
        destination_dir: &Path,
    ) -> Result<ExportedPackage> {
        info!(
            solution = %solution_unique_name,
            destination = %destination_dir.display(),
            timeout_secs = self.export_timeout.as_secs(),
            "Exporting solution"
        );

        let url = self.url("ExportSolution");
        let request = ExportSolutionRequest {
            solution_name: solution_unique_name.to_string(),
            managed: false,
        };
        let response = self
            .send("export_solution", self.export_timeout, |client| {
                client.post(&url).json(&request)
            })
            .await?;

        let exported: ExportSolutionResponse = self.read_json("export_solution", response).await?;
        let bytes = STANDARD
            .decode(exported.export_solution_file.trim())
            .map_err(|e| {
                DataverseError::InvalidResponse(format!("ExportSolutionFile is not base64: {}", e))
            })?;

        tokio::fs::create_dir_all(destination_dir).await?;
        let file_path = destination_dir.join(format!("{}.zip", solution_unique_name));
        tokio::fs::write(&file_path, &bytes).await?;

        info!(
            path = %file_path.display(),
            bytes = bytes.len(),
            "Solution package written"
        );
        Ok(ExportedPackage::new(file_path))
    }

    pub async fn get_ribbon_xml(&self, entity_logical_name: &str) -> Result<String> {
        debug!(entity = %entity_logical_name, "Retrieving entity ribbon");

        let url = self.url(&format!(
            "RetrieveEntityRibbon(EntityName='{}',RibbonLocationFilter='All')",
            odata_literal(entity_logical_name)
        ));
        let response = self
            .send("get_ribbon_xml", self.request_timeout, |client| client.get(&url))
            .await?;

        let ribbon: RetrieveEntityRibbonResponse =
            self.read_json("get_ribbon_xml", response).await?;
        if ribbon.compressed_entity_xml.trim().is_empty() {
            return Err(DataverseError::InvalidResponse(format!(
                "empty CompressedEntityXml for {}",
                entity_logical_name
            )));
        }
        Ok(ribbon.compressed_entity_xml)
    }

    pub async fn delete_solution(&self, solution_unique_name: &str) -> Result<()> {
        let id = self
            .find_solution(solution_unique_name)
            .await?
            .ok_or_else(|| DataverseError::not_found("Solution", solution_unique_name))?;

        info!(solution = %solution_unique_name, id = %id, "Deleting solution");

        let url = self.url(&format!("solutions({})", id));
        self.send("delete_solution", self.request_timeout, |client| {
            client.delete(&url)
        })
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SolutionApi for DataverseClient {
    async fn get_publisher(&self, unique_name: &str) -> Result<PublisherRef> {
        DataverseClient::get_publisher(self, unique_name).await
    }

    async fn create_solution(&self, solution: &SolutionRef) -> Result<()> {
        DataverseClient::create_solution(self, solution).await
    }

    async fn get_entity_id(&self, logical_name: &str) -> Result<EntityRef> {
        DataverseClient::get_entity_id(self, logical_name).await
    }

    async fn add_component_to_solution(
        &self,
        component_id: Uuid,
        solution_unique_name: &str,
        component_type: ComponentType,
    ) -> Result<()> {
        DataverseClient::add_component_to_solution(
            self,
            component_id,
            solution_unique_name,
            component_type,
        )
        .await
    }

    async fn export_solution(
        &self,
        solution_unique_name: &str,
        destination_dir: &Path,
    ) -> Result<ExportedPackage> {
        DataverseClient::export_solution(self, solution_unique_name, destination_dir).await
    }

    async fn get_ribbon_xml(&self, entity_logical_name: &str) -> Result<String> {
        DataverseClient::get_ribbon_xml(self, entity_logical_name).await
    }

    async fn delete_solution(&self, solution_unique_name: &str) -> Result<()> {
        DataverseClient::delete_solution(self, solution_unique_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenAuthenticator;

    #[test]
    fn test_client_creation() {
        let client = DataverseClient::new(
            "https://contoso.crm.dynamics.com/api/data/v9.2/",
            Arc::new(StaticTokenAuthenticator::new("t")),
        );
        assert_eq!(client.base_url(), "https://contoso.crm.dynamics.com/api/data/v9.2");
        assert_eq!(
            client.url("/solutions"),
            "https://contoso.crm.dynamics.com/api/data/v9.2/solutions"
        );
    }

    #[test]
    fn test_from_config_uses_config_timeouts() {
        let config = ribbon_core::OrgConfig::new("https://contoso.crm.dynamics.com", "contoso")
            .with_timeouts(Duration::from_secs(5), Duration::from_secs(50));
        let client =
            DataverseClient::from_config(&config, Arc::new(StaticTokenAuthenticator::new("t")));

        assert_eq!(client.request_timeout, Duration::from_secs(5));
        assert_eq!(client.export_timeout, Duration::from_secs(50));
        assert_eq!(client.base_url(), "https://contoso.crm.dynamics.com/api/data/v9.2");
    }
}
