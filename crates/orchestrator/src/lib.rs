//! Drives a Dataverse organization through the ribbon export sequence.

pub mod cancel;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod resources;
pub mod step;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use error::{ErrorKind, PipelineError, Result};
pub use extractor::{PackageExtractor, ZipExtractor};
pub use pipeline::{validate_entity_name, PipelineReport, RibbonPipeline, CUSTOMIZATIONS_ENTRY};
pub use step::PipelineStep;
