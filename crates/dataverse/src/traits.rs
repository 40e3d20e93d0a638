use async_trait::async_trait;
use ribbon_core::{ComponentType, EntityRef, ExportedPackage, PublisherRef, SolutionRef};
use std::path::Path;
use uuid::Uuid;

use crate::error::Result;

/// Remote operations the export pipeline depends on.
#[async_trait]
pub trait SolutionApi: Send + Sync {
    /// Look up a publisher by unique name. `NotFound` when nothing matches.
    async fn get_publisher(&self, unique_name: &str) -> Result<PublisherRef>;

    /// Create a solution. Any 2xx response is success.
    async fn create_solution(&self, solution: &SolutionRef) -> Result<()>;

    /// Look up an entity by logical name. `NotFound` when nothing matches.
    async fn get_entity_id(&self, logical_name: &str) -> Result<EntityRef>;

    /// Add a component to an existing solution.
    async fn add_component_to_solution(
        &self,
        component_id: Uuid,
        solution_unique_name: &str,
        component_type: ComponentType,
    ) -> Result<()>;

    /// Export an unmanaged solution and write the package under `destination_dir`.
    async fn export_solution(
        &self,
        solution_unique_name: &str,
        destination_dir: &Path,
    ) -> Result<ExportedPackage>;

    /// Fetch the base64 `CompressedEntityXml` ribbon payload of an entity.
    async fn get_ribbon_xml(&self, entity_logical_name: &str) -> Result<String>;

    /// Delete a solution by unique name. Never called by the pipeline itself.
    async fn delete_solution(&self, solution_unique_name: &str) -> Result<()>;
}
