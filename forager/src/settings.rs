//! Persisted tool settings.
//!
//! A typed TOML file replaces the original flat string key/value store:
//! named fields and a dedicated mapping layer ([`ToolSettings::to_routine_config`])
//! instead of ad hoc string-key parsing. The file is meant to be edited by
//! humans; missing fields fall back to defaults, and loading a missing file
//! writes the defaults first and re-reads them, so a fresh install always
//! leaves an editable file behind.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::config::{Credentials, MoveType, ResourceTask, RoutineConfig, World};
use crate::session::BrowserSettings;

/// Header comment written at the top of the settings file.
const FILE_HEADER: &str = "# Forager tool settings.\n";

/// Tool settings (TOML).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolSettings {
    pub account: AccountSettings,
    pub browser: BrowserSettings,
    pub routine: RoutineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccountSettings {
    pub username: String,
    pub password: String,
    /// Game world to log in to.
    pub world: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoutineSettings {
    /// Movement modes the routine may use.
    pub movement: Vec<MoveType>,
    /// Protection item to activate before movement, when set.
    pub protection_item: Option<String>,
    /// Whether to activate the special skill before movement.
    pub use_special_skill: bool,
    /// Resources to collect. Execution order is fixed by the engine;
    /// this list only selects.
    pub resources: Vec<ResourceTask>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            account: AccountSettings::default(),
            browser: BrowserSettings::default(),
            routine: RoutineSettings::default(),
        }
    }
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            world: 1,
        }
    }
}

impl Default for RoutineSettings {
    fn default() -> Self {
        Self {
            movement: vec![MoveType::Walk],
            protection_item: None,
            use_special_skill: false,
            resources: ResourceTask::ALL.to_vec(),
        }
    }
}

impl ToolSettings {
    pub fn validate(&self) -> Result<()> {
        if self.account.world == 0 {
            return Err(anyhow!("account.world must be >= 1"));
        }
        if self.routine.movement.is_empty() {
            return Err(anyhow!("routine.movement must list at least one mode"));
        }
        if let Some(item) = &self.routine.protection_item
            && item.trim().is_empty()
        {
            return Err(anyhow!("routine.protection_item must not be blank"));
        }
        Ok(())
    }

    /// Map the settings to the immutable per-run configuration.
    ///
    /// Duplicate resource entries collapse; blank credentials pass through
    /// here and are rejected by the orchestrator at run start.
    pub fn to_routine_config(&self) -> RoutineConfig {
        let resources: BTreeSet<ResourceTask> = self.routine.resources.iter().copied().collect();
        RoutineConfig {
            credentials: Credentials {
                username: self.account.username.clone(),
                password: self.account.password.clone(),
            },
            world: World(self.account.world),
            browser: self.browser.clone(),
            movement: self.routine.movement.clone(),
            protection_item: self.routine.protection_item.clone(),
            use_special_skill: self.routine.use_special_skill,
            resources,
        }
    }
}

/// Load settings from a TOML file.
///
/// A missing file is created with defaults first, then re-read.
pub fn load_settings(path: &Path) -> Result<ToolSettings> {
    if !path.exists() {
        save_settings(path, &ToolSettings::default())?;
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: ToolSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// Atomically write settings to disk (temp file + rename).
pub fn save_settings(path: &Path, settings: &ToolSettings) -> Result<()> {
    settings.validate()?;
    let body = toml::to_string_pretty(settings).context("serialize settings toml")?;
    let mut buf = String::with_capacity(FILE_HEADER.len() + body.len());
    buf.push_str(FILE_HEADER);
    buf.push_str(&body);
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp settings {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace settings {}", path.display()))?;
    Ok(())
}
