use archive::{extract_zip, ArchiveError};
use async_trait::async_trait;
use ribbon_core::ExportedPackage;
use tracing::debug;

/// Reads one text entry out of an exported solution package.
#[async_trait]
pub trait PackageExtractor: Send + Sync {
    async fn extract(&self, package: &ExportedPackage, entry_name: &str) -> archive::Result<String>;
}

/// Zip extraction on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

#[async_trait]
impl PackageExtractor for ZipExtractor {
    async fn extract(&self, package: &ExportedPackage, entry_name: &str) -> archive::Result<String> {
        let path = package.file_path.clone();
        let entry = entry_name.to_string();
        let label = path.display().to_string();
        debug!(package = %label, entry = %entry, "Extracting package entry");

        tokio::task::spawn_blocking(move || extract_zip(&path, &entry))
            .await
            .map_err(|e| ArchiveError::corrupt(label, format!("extraction task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[tokio::test]
    async fn test_zip_extractor_reads_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("PrefixAccount.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        writer
            .start_file("customizations.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<ImportExportXml />").unwrap();
        writer.finish().unwrap();

        let text = ZipExtractor
            .extract(&ExportedPackage::new(&path), "customizations.xml")
            .await
            .unwrap();
        assert_eq!(text, "<ImportExportXml />");
    }

    #[tokio::test]
    async fn test_zip_extractor_missing_file_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let package = ExportedPackage::new(temp_dir.path().join("absent.zip"));

        let err = ZipExtractor
            .extract(&package, "customizations.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt { .. }));
    }
}
