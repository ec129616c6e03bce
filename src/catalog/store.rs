//! Persistence boundary: read snapshots of the catalogs, append-only skill writes

use crate::catalog::jobs::JobProfile;
use crate::catalog::reconciliation::MergeProposal;
use crate::catalog::resources::LearningResource;
use crate::catalog::skill::{Skill, SkillId};
use crate::error::{Result, SkillGapError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A stored skill row; the embedding may be absent and computed at load time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl From<&Skill> for SkillRecord {
    fn from(skill: &Skill) -> Self {
        Self {
            id: skill.id,
            name: skill.name.clone(),
            aliases: skill.aliases.clone(),
            embedding: Some(skill.embedding.clone()),
        }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load_skills(&self) -> Result<Vec<SkillRecord>>;

    async fn load_jobs(&self) -> Result<Vec<JobProfile>>;

    async fn load_resources(&self) -> Result<Vec<LearningResource>>;

    async fn load_merges(&self) -> Result<Vec<MergeProposal>>;

    async fn save_merges(&self, merges: &[MergeProposal]) -> Result<()>;

    /// The only write to the skill table: a newly confirmed canonical skill
    async fn append_skill(&self, skill: &Skill) -> Result<()>;
}

/// Catalog kept as JSON files in one directory:
/// `skills.json`, `jobs.json`, `resources.json` and `merges.json`.
/// Missing files read as empty.
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    dir: PathBuf,
}

impl JsonCatalogStore {
    pub const SKILLS_FILE: &'static str = "skills.json";
    pub const JOBS_FILE: &'static str = "jobs.json";
    pub const RESOURCES_FILE: &'static str = "resources.json";
    pub const MERGES_FILE: &'static str = "merges.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if fs::metadata(&path).await.is_err() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).await?;
        serde_json::from_str(&content).map_err(|e| {
            SkillGapError::InvalidInput(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    async fn write_list<T: Serialize + Sync>(&self, file: &str, rows: &[T]) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(rows)?;
        fs::write(self.dir.join(file), content).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn load_skills(&self) -> Result<Vec<SkillRecord>> {
        self.read_list(Self::SKILLS_FILE).await
    }

    async fn load_jobs(&self) -> Result<Vec<JobProfile>> {
        self.read_list(Self::JOBS_FILE).await
    }

    async fn load_resources(&self) -> Result<Vec<LearningResource>> {
        self.read_list(Self::RESOURCES_FILE).await
    }

    async fn load_merges(&self) -> Result<Vec<MergeProposal>> {
        self.read_list(Self::MERGES_FILE).await
    }

    async fn save_merges(&self, merges: &[MergeProposal]) -> Result<()> {
        self.write_list(Self::MERGES_FILE, merges).await
    }

    async fn append_skill(&self, skill: &Skill) -> Result<()> {
        let mut records: Vec<SkillRecord> = self.read_list(Self::SKILLS_FILE).await?;
        if records.iter().any(|r| r.id == skill.id) {
            return Err(SkillGapError::DuplicateSkill(format!(
                "{} ({})",
                skill.name, skill.id
            )));
        }
        records.push(SkillRecord::from(skill));
        self.write_list(Self::SKILLS_FILE, &records).await
    }
}
