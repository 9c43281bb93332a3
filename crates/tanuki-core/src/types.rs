use serde::{Deserialize, Serialize};

/// A namespace that owns projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    /// Namespace path, e.g. `acme/backend`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
}

impl Group {
    /// Group without a known path.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            full_path: None,
        }
    }
}

/// A searchable repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    /// Browser URL permalinks are built on.
    #[serde(default)]
    pub web_url: String,
}

impl Project {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, web_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            web_url: web_url.into(),
        }
    }
}

/// A single matched code excerpt.
///
/// Field names follow the blob search payload (`project_id`, `startline`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// Owning project.
    #[serde(default)]
    pub project_id: u64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub path: String,
    /// Branch or commit the match was found on.
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    /// First line of `data` in the file.
    #[serde(rename = "startline", default)]
    pub start_line: u64,
    /// Matched snippet, verbatim.
    #[serde(default)]
    pub data: String,
}

impl Blob {
    /// File name used in permalinks; older servers only report `path`.
    #[must_use]
    pub fn display_filename(&self) -> &str {
        if self.filename.is_empty() {
            &self.path
        } else {
            &self.filename
        }
    }
}

/// One fetch batch of blob matches paired with the project they came from.
///
/// Every blob carries `project_id == project.id`; [`ComposedBlob::new`]
/// enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedBlob {
    /// Project the blobs belong to.
    pub project: Project,
    /// One page of matches.
    pub blobs: Vec<Blob>,
}

impl ComposedBlob {
    /// Compose a batch, rewriting each blob's `project_id` to the owner's id.
    #[must_use]
    pub fn new(project: Project, mut blobs: Vec<Blob>) -> Self {
        for blob in &mut blobs {
            blob.project_id = project.id;
        }
        Self { project, blobs }
    }

    /// Permalink for one blob of this batch.
    #[must_use]
    pub fn permalink(&self, blob: &Blob) -> String {
        format!(
            "{}/blob/{}/{}#L{}",
            self.project.web_url.trim_end_matches('/'),
            blob.git_ref,
            blob.display_filename(),
            blob.start_line
        )
    }
}
