use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;

use crate::core::prompts::PromptCatalog;

/// Read-only JSON file holding topics, "would you rather" and truth-or-dare
/// prompts. Loaded once at startup.
pub struct JsonPromptStore {
    path: PathBuf,
}

impl JsonPromptStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub async fn load(&self) -> anyhow::Result<PromptCatalog> {
        let text = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read prompt file {}", self.path.display()))?;

        let catalog: PromptCatalog = serde_json::from_str(&text)
            .with_context(|| format!("Invalid prompt file {}", self.path.display()))?;

        if catalog.topics.is_empty() {
            tracing::warn!(path = %self.path.display(), "Prompt file has no topic categories");
        }
        if catalog.would_you_rather.is_empty() {
            tracing::warn!(path = %self.path.display(), "Prompt file has no 'would you rather' questions");
        }

        tracing::info!(
            categories = catalog.topics.len(),
            would_you_rather = catalog.would_you_rather.len(),
            truths = catalog.truth_or_dare.truth.len(),
            dares = catalog.truth_or_dare.dare.len(),
            "Loaded prompts"
        );

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn loads_all_sections() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{
                "topics": {{ "funny": ["a", "b"], "deep": ["c"] }},
                "would_you_rather": ["d"],
                "truth_or_dare": {{ "truth": ["e"], "dare": ["f", "g"] }}
            }}"#
        )
        .unwrap();

        let catalog = JsonPromptStore::new(tmp.path()).load().await.unwrap();
        assert_eq!(catalog.topics.len(), 2);
        assert_eq!(catalog.topics["funny"], vec!["a", "b"]);
        assert_eq!(catalog.would_you_rather, vec!["d"]);
        assert_eq!(catalog.truth_or_dare.dare.len(), 2);
    }

    #[tokio::test]
    async fn missing_sections_default_to_empty() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"{{ "topics": {{ "funny": ["a"] }} }}"#).unwrap();

        let catalog = JsonPromptStore::new(tmp.path()).load().await.unwrap();
        assert!(catalog.would_you_rather.is_empty());
        assert!(catalog.truth_or_dare.truth.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "not json").unwrap();

        let err = JsonPromptStore::new(tmp.path()).load().await.unwrap_err();
        assert!(err.to_string().contains("Invalid prompt file"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let store = JsonPromptStore::new("/definitely/not/here/topics.json");
        assert!(store.load().await.is_err());
    }
}
