use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed sequence a run walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    GetPublisher,
    CreateSolution,
    GetEntityId,
    AddComponent,
    ExportSolution,
    ExtractCustomizations,
    FetchRibbon,
    ParseRibbon,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 8] = [
        PipelineStep::GetPublisher,
        PipelineStep::CreateSolution,
        PipelineStep::GetEntityId,
        PipelineStep::AddComponent,
        PipelineStep::ExportSolution,
        PipelineStep::ExtractCustomizations,
        PipelineStep::FetchRibbon,
        PipelineStep::ParseRibbon,
    ];

    /// 1-based position in the export sequence.
    pub fn index(&self) -> u8 {
        match self {
            Self::GetPublisher => 1,
            Self::CreateSolution => 2,
            Self::GetEntityId => 3,
            Self::AddComponent => 4,
            Self::ExportSolution => 5,
            Self::ExtractCustomizations => 6,
            Self::FetchRibbon => 7,
            Self::ParseRibbon => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetPublisher => "get_publisher",
            Self::CreateSolution => "create_solution",
            Self::GetEntityId => "get_entity_id",
            Self::AddComponent => "add_component",
            Self::ExportSolution => "export_solution",
            Self::ExtractCustomizations => "extract_customizations",
            Self::FetchRibbon => "fetch_ribbon",
            Self::ParseRibbon => "parse_ribbon",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
