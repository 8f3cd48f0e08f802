//! Run report

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::mode::VocalMode;
use crate::vocal::VocalMetadata;

/// File name of the report written next to the mix
pub const REPORT_FILE: &str = "pipeline_report.json";

/// Everything one pipeline run produced
///
/// `story` and `lyrics_path` come from upstream collaborators and are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifacts {
    run_id: Uuid,
    completed_at: DateTime<Utc>,
    vocal_mode: VocalMode,
    story: serde_json::Value,
    lyrics_path: Option<PathBuf>,
    instrumental_path: PathBuf,
    enhanced_vocal_path: Option<PathBuf>,
    final_vocal_path: PathBuf,
    mix_path: PathBuf,
    mix_sha256: String,
    vocal_metadata: Option<VocalMetadata>,
}

pub(crate) struct ArtifactParts {
    pub vocal_mode: VocalMode,
    pub story: serde_json::Value,
    pub lyrics_path: Option<PathBuf>,
    pub instrumental_path: PathBuf,
    pub enhanced_vocal_path: Option<PathBuf>,
    pub final_vocal_path: PathBuf,
    pub mix_path: PathBuf,
    pub vocal_metadata: Option<VocalMetadata>,
}

/// SHA-256 of a file's contents as lowercase hex
pub fn file_sha256(path: &Path) -> Result<String> {
    let content = fs::read(path)?;
    let hash = Sha256::digest(&content);
    Ok(format!("{:x}", hash))
}

impl PipelineArtifacts {
    /// Seal a finished run; hashes the mix already on disk
    pub(crate) fn seal(parts: ArtifactParts) -> Result<Self> {
        let mix_sha256 = file_sha256(&parts.mix_path)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            completed_at: Utc::now(),
            vocal_mode: parts.vocal_mode,
            story: parts.story,
            lyrics_path: parts.lyrics_path,
            instrumental_path: parts.instrumental_path,
            enhanced_vocal_path: parts.enhanced_vocal_path,
            final_vocal_path: parts.final_vocal_path,
            mix_path: parts.mix_path,
            mix_sha256,
            vocal_metadata: parts.vocal_metadata,
        })
    }

    /// Load a report written by a previous run
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn vocal_mode(&self) -> VocalMode {
        self.vocal_mode
    }

    pub fn story(&self) -> &serde_json::Value {
        &self.story
    }

    pub fn lyrics_path(&self) -> Option<&Path> {
        self.lyrics_path.as_deref()
    }

    pub fn instrumental_path(&self) -> &Path {
        &self.instrumental_path
    }

    pub fn enhanced_vocal_path(&self) -> Option<&Path> {
        self.enhanced_vocal_path.as_deref()
    }

    pub fn final_vocal_path(&self) -> &Path {
        &self.final_vocal_path
    }

    pub fn mix_path(&self) -> &Path {
        &self.mix_path
    }

    pub fn mix_sha256(&self) -> &str {
        &self.mix_sha256
    }

    pub fn vocal_metadata(&self) -> Option<&VocalMetadata> {
        self.vocal_metadata.as_ref()
    }

    /// Human-readable run summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Run:           {}", self.run_id),
            format!("Vocal mode:    {}", self.vocal_mode),
            format!("Instrumental:  {}", self.instrumental_path.display()),
            format!("Final vocal:   {}", self.final_vocal_path.display()),
            format!("Mix:           {}", self.mix_path.display()),
            format!("Mix SHA-256:   {}", self.mix_sha256),
        ];
        if let Some(path) = &self.enhanced_vocal_path {
            lines.insert(3, format!("Enhanced:      {}", path.display()));
        }
        if let Some(meta) = &self.vocal_metadata {
            lines.push(format!(
                "Detected key:  {}",
                meta.detected_key.as_deref().unwrap_or("unknown")
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_of_known_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_report_round_trip() {
        let dir = tempdir().unwrap();
        let mix = dir.path().join("final_mix.wav");
        fs::write(&mix, b"mix").unwrap();

        let artifacts = PipelineArtifacts::seal(ArtifactParts {
            vocal_mode: VocalMode::Raw,
            story: serde_json::json!({ "title": "demo" }),
            lyrics_path: None,
            instrumental_path: dir.path().join("instrumental.wav"),
            enhanced_vocal_path: None,
            final_vocal_path: dir.path().join("dry_vocals.wav"),
            mix_path: mix,
            vocal_metadata: None,
        })
        .unwrap();

        let report = dir.path().join(REPORT_FILE);
        crate::engine::write_json(&artifacts, &report).unwrap();
        let loaded = PipelineArtifacts::load(&report).unwrap();
        assert_eq!(loaded, artifacts);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(raw["vocal_mode"], "raw");
        assert_eq!(raw["story"]["title"], "demo");
    }
}
