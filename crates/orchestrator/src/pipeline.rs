use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use dataverse::SolutionApi;
use events::{Event, EventBus};
use ribbon::{decode_ribbon_payload, parse_ribbon, RibbonDocument};
use ribbon_core::{ComponentType, ExportedPackage, OrgConfig, SolutionRef};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::error::{PipelineError, Result};
use crate::extractor::{PackageExtractor, ZipExtractor};
use crate::resources::RunGuard;
use crate::step::PipelineStep;

/// Entry read out of the exported package for inspection.
pub const CUSTOMIZATIONS_ENTRY: &str = "customizations.xml";

/// Everything a successful export run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub entity: String,
    pub solution: SolutionRef,
    pub package: ExportedPackage,
    /// Length in characters of the extracted `customizations.xml`
    pub customizations_len: usize,
    /// Decoded ribbon XML as written to disk
    pub ribbon_file: PathBuf,
    pub document: RibbonDocument,
}

/// Runs the export sequence for one entity against one organization.
///
/// Steps run strictly one after another. The first failure ends the run and
/// nothing created remotely is rolled back.
pub struct RibbonPipeline {
    api: Arc<dyn SolutionApi>,
    config: OrgConfig,
    extractor: Arc<dyn PackageExtractor>,
    event_bus: Option<EventBus>,
}

impl RibbonPipeline {
    pub fn new(api: Arc<dyn SolutionApi>, config: OrgConfig) -> Self {
        Self {
            api,
            config,
            extractor: Arc::new(ZipExtractor),
            event_bus: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PackageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Export the entity's solution and return its parsed ribbon.
    pub async fn run(&self, entity_name: &str, cancel: &CancelSignal) -> Result<RibbonDocument> {
        self.run_with_report(entity_name, cancel)
            .await
            .map(|report| report.document)
    }

    pub async fn run_with_report(
        &self,
        entity_name: &str,
        cancel: &CancelSignal,
    ) -> Result<PipelineReport> {
        self.config.validate()?;
        let entity = validate_entity_name(entity_name)?;

        let run_id = Uuid::new_v4();
        let guard = RunGuard::start(run_id, entity, self.event_bus.clone());
        info!(run_id = %run_id, entity = %entity, "Starting ribbon export");

        let started = Instant::now();
        let outcome = self.export(run_id, entity, cancel).await;
        self.conclude(guard, entity, started, outcome, |report| {
            report.document.tabs.len()
        })
    }

    /// Fetch and parse the ribbon without creating or exporting a solution.
    ///
    /// Runs only the last two steps. Nothing is created in the organization.
    pub async fn preview(&self, entity_name: &str, cancel: &CancelSignal) -> Result<RibbonDocument> {
        self.config.validate()?;
        let entity = validate_entity_name(entity_name)?;

        let run_id = Uuid::new_v4();
        let guard = RunGuard::start(run_id, entity, self.event_bus.clone());
        info!(run_id = %run_id, entity = %entity, "Starting ribbon preview");

        let started = Instant::now();
        let outcome = self
            .fetch_ribbon(run_id, entity, cancel)
            .await
            .map(|(_, document)| document);
        self.conclude(guard, entity, started, outcome, |document| document.tabs.len())
    }

    async fn export(
        &self,
        run_id: Uuid,
        entity: &str,
        cancel: &CancelSignal,
    ) -> Result<PipelineReport> {
        let api = &self.api;

        let publisher = self
            .step(run_id, PipelineStep::GetPublisher, cancel, async {
                api.get_publisher(&self.config.publisher_unique_name)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;

        let solution = SolutionRef::for_entity(&self.config.solution_prefix, entity, publisher.id);
        self.step(run_id, PipelineStep::CreateSolution, cancel, async {
            api.create_solution(&solution).await.map_err(PipelineError::from)
        })
        .await?;

        let entity_ref = self
            .step(run_id, PipelineStep::GetEntityId, cancel, async {
                api.get_entity_id(entity).await.map_err(PipelineError::from)
            })
            .await?;

        self.step(run_id, PipelineStep::AddComponent, cancel, async {
            api.add_component_to_solution(entity_ref.id, &solution.unique_name, ComponentType::Entity)
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        let package = self
            .step(run_id, PipelineStep::ExportSolution, cancel, async {
                api.export_solution(&solution.unique_name, &self.config.output_dir)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;

        let customizations = self
            .step(run_id, PipelineStep::ExtractCustomizations, cancel, async {
                self.extractor
                    .extract(&package, CUSTOMIZATIONS_ENTRY)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;
        info!(
            entity = %entity,
            chars = customizations.len(),
            "Extracted {}",
            CUSTOMIZATIONS_ENTRY
        );

        let (ribbon_file, document) = self.fetch_ribbon(run_id, entity, cancel).await?;

        Ok(PipelineReport {
            run_id,
            entity: entity.to_string(),
            solution,
            package,
            customizations_len: customizations.len(),
            ribbon_file,
            document,
        })
    }

    async fn fetch_ribbon(
        &self,
        run_id: Uuid,
        entity: &str,
        cancel: &CancelSignal,
    ) -> Result<(PathBuf, RibbonDocument)> {
        let payload = self
            .step(run_id, PipelineStep::FetchRibbon, cancel, async {
                self.api.get_ribbon_xml(entity).await.map_err(PipelineError::from)
            })
            .await?;

        let output_dir = self.config.output_dir.as_path();
        self.step(run_id, PipelineStep::ParseRibbon, cancel, async {
            let xml = decode_ribbon_payload(&payload)?;
            let ribbon_file = write_ribbon_xml(output_dir, entity, &xml).await?;
            let document = parse_ribbon(&xml)?;
            debug!(
                tabs = document.tabs.len(),
                groups = document.group_count(),
                controls = document.control_count(),
                commands = document.command_definitions.len(),
                "Ribbon parsed"
            );
            Ok::<_, PipelineError>((ribbon_file, document))
        })
        .await
    }

    /// Run one step: check cancellation, then race the work against it.
    async fn step<T, F>(
        &self,
        run_id: Uuid,
        step: PipelineStep,
        cancel: &CancelSignal,
        work: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled { step });
        }

        info!(step = %step, index = step.index(), "Step started");
        self.emit(Event::StepStarted {
            run_id,
            step: step.to_string(),
            index: step.index(),
        });

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled { step }),
            result = work => result,
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => {
                debug!(step = %step, duration_ms, "Step completed");
                self.emit(Event::StepCompleted {
                    run_id,
                    step: step.to_string(),
                    duration_ms,
                });
            }
            Err(PipelineError::Cancelled { .. }) => {}
            Err(e) => {
                error!(step = %step, kind = %e.kind(), error = %e, "Step failed");
                self.emit(Event::StepFailed {
                    run_id,
                    step: step.to_string(),
                    error: e.to_string(),
                });
            }
        }

        outcome
    }

    fn conclude<T>(
        &self,
        mut guard: RunGuard,
        entity: &str,
        started: Instant,
        outcome: Result<T>,
        tab_count: impl FnOnce(&T) -> usize,
    ) -> Result<T> {
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(value) => {
                let tabs = tab_count(value);
                info!(entity = %entity, tabs, duration_ms, "Ribbon export finished");
                guard.mark_completed(tabs, duration_ms);
            }
            Err(PipelineError::Cancelled { step }) => {
                warn!(entity = %entity, step = %step, "Run cancelled");
                guard.mark_cancelled(step.as_str());
            }
            Err(e) => {
                guard.mark_failed(&e.to_string());
            }
        }

        outcome
    }

    fn emit(&self, event: Event) {
        if let Some(ref bus) = self.event_bus {
            bus.emit(event);
        }
    }
}

/// Trim and check an entity logical name.
///
/// Logical names are lower-case identifiers; anything else would also end
/// up in a file name. Callers deriving a solution name must go through here
/// so they agree with what a run created.
pub fn validate_entity_name(entity_name: &str) -> Result<&str> {
    let entity = entity_name.trim();
    if entity.is_empty() {
        return Err(PipelineError::InvalidInput(
            "entity name must not be empty".to_string(),
        ));
    }
    if !entity.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PipelineError::InvalidInput(format!(
            "entity name '{}' contains characters outside [A-Za-z0-9_]",
            entity
        )));
    }
    Ok(entity)
}

async fn write_ribbon_xml(output_dir: &Path, entity: &str, xml: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(format!("{}_RibbonXml.xml", entity));
    tokio::fs::write(&path, xml).await?;
    debug!(path = %path.display(), "Ribbon XML written");
    Ok(path)
}
