use crate::judge::{Judge, SchemePreset};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which scheme scores each side of a forced choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSettings {
    pub chosen: SchemePreset,
    pub other: SchemePreset,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            chosen: SchemePreset::Primary,
            other: SchemePreset::Primary,
        }
    }
}

impl JudgeSettings {
    pub fn build(&self) -> Judge {
        if self.chosen == self.other {
            Judge::new(self.chosen.into())
        } else {
            Judge::asymmetric(self.chosen.into(), self.other.into())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudySettings {
    /// Category directories, each holding a groundtruth image and its candidates
    pub directories: Vec<PathBuf>,
    /// Candidates shown per parameter-selection trial
    pub selection_candidates: usize,
    /// Integers encoded in each candidate name for parameter selection
    pub parameter_arity: usize,
    pub judge: JudgeSettings,
    /// Fixed RNG seed; a fresh entropy seed is used when absent
    pub seed: Option<u64>,
    /// Where plots and reports are written
    pub output_dir: PathBuf,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            directories: vec![
                PathBuf::from("./Dataset/bigben"),
                PathBuf::from("./Dataset/Einstein"),
            ],
            selection_candidates: 4,
            parameter_arity: 3,
            judge: JudgeSettings::default(),
            seed: None,
            output_dir: PathBuf::from("./results"),
        }
    }
}

impl StudySettings {
    /// Get the default settings file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("metamer-study").join("settings.json"))
    }

    /// Load settings from `path`, writing defaults there on first use
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "creating default settings");
            let settings = Self::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings from {}", path.display()))?;
        Ok(settings)
    }

    /// Load settings from the user config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::DistanceScheme;
    use tempfile::TempDir;

    #[test]
    fn test_settings_serialization() {
        let settings = StudySettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: StudySettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, parsed);
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");

        let settings = StudySettings::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings.parameter_arity, 3);
        assert_eq!(settings.selection_candidates, 4);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{ "seed": 9, "parameter_arity": 4 }"#).unwrap();

        let settings = StudySettings::load_from(&path).unwrap();
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.parameter_arity, 4);
        assert_eq!(settings.selection_candidates, 4);
    }

    #[test]
    fn test_judge_settings_build() {
        let symmetric = JudgeSettings::default().build();
        assert_eq!(symmetric, Judge::new(DistanceScheme::primary()));

        let mixed = JudgeSettings {
            chosen: SchemePreset::Primary,
            other: SchemePreset::Alternate,
        }
        .build();
        assert_eq!(
            mixed,
            Judge::asymmetric(DistanceScheme::primary(), DistanceScheme::alternate())
        );
    }
}
