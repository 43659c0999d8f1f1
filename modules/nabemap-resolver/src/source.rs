use std::path::PathBuf;

use async_trait::async_trait;

use nabemap_common::DatasetError;

/// Where the neighborhood dataset comes from.
///
/// A source only produces raw GeoJSON text; decoding and validation happen in
/// [`crate::NeighborhoodSet::from_geojson`].
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> Result<String, DatasetError>;

    /// Human-readable label for logs.
    fn describe(&self) -> String;
}

/// Reads the dataset from a file on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    async fn fetch(&self) -> Result<String, DatasetError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DatasetError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Serves GeoJSON text held in memory.
pub struct StaticSource {
    label: String,
    text: String,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl DatasetSource for StaticSource {
    async fn fetch(&self) -> Result<String, DatasetError> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        format!("static:{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let source = FileSource::new("/nonexistent/nta.geojson");
        let err = source.fetch().await.unwrap_err();
        match err {
            DatasetError::Read { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/nta.geojson"));
            }
            other => panic!("expected Read error, got {other:?}"),
        }
        assert_eq!(source.describe(), "file:/nonexistent/nta.geojson");
    }

    #[tokio::test]
    async fn file_source_reads_contents() {
        let path = std::env::temp_dir().join(format!("nabemap-source-{}.geojson", std::process::id()));
        tokio::fs::write(&path, r#"{"type":"FeatureCollection","features":[]}"#)
            .await
            .unwrap();

        let text = FileSource::new(&path).fetch().await.unwrap();
        assert!(text.contains("FeatureCollection"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn static_source_returns_text() {
        let source = StaticSource::new("fixture", "{}");
        assert_eq!(source.fetch().await.unwrap(), "{}");
        assert_eq!(source.describe(), "static:fixture");
    }
}
