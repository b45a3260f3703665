//! Configuration rules.
//!
//! Settings are flat `name = value` pairs, persisted as a JSON object in
//! `config.json` at the storage root. The storage engine only ever reads them
//! through [`RulesProvider`], so tests can hand it any map.
//!
//! ## Known settings
//!
//! | name                         | default | meaning                                  |
//! |------------------------------|---------|------------------------------------------|
//! | `verbose`                    | `on`    | report new tags and other feedback       |
//! | `confirmation`               | `off`   | ask before destructive commands          |
//! | `journal.size`               | `-1`    | kept transactions; `0` disables undo     |
//! | `exclusions.<weekday>`       |         | time blocks such as `<9:00 12:00-13:00`  |
//! | `exclusions.days.<date>`     |         | `off` excludes the whole day             |
//!
//! Changes made through [`Rules::set`] and [`Rules::unset`] are recorded in
//! the open journal transaction as `config` actions whose before and after
//! states are `name=value` strings, empty when the setting was absent.

use crate::db::journal::Journal;
use crate::libs::atomic_file::{AtomicFile, AtomicWriteRegistry};
use crate::libs::error::{AppError, AppResult};
use crate::libs::exclusion::Exclusion;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULTS: &[(&str, &str)] = &[("verbose", "on"), ("confirmation", "off"), ("journal.size", "-1")];

/// Read access to configuration values.
pub trait RulesProvider {
    /// The explicit value of `name`, or its built-in default.
    fn get(&self, name: &str) -> Option<&str>;

    /// Every configured name starting with `stem`, sorted.
    fn all(&self, stem: &str) -> Vec<String>;

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn get_integer(&self, name: &str, default: i64) -> i64 {
        self.get(name).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    fn get_real(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    fn get_boolean(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(parse_boolean).unwrap_or(default)
    }
}

/// `on/yes/y/true/1` and `off/no/n/false/0`, case-insensitive.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "yes" | "y" | "true" | "1" => Some(true),
        "off" | "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct Rules {
    settings: BTreeMap<String, String>,
    /// `None` for rules that live only in memory.
    file: Option<AtomicFile>,
}

impl Rules {
    /// Loads `config.json` from `path`; a missing file yields the defaults.
    pub fn load(registry: &AtomicWriteRegistry, path: impl AsRef<Path>) -> AppResult<Self> {
        let file = AtomicFile::new(registry, path.as_ref());
        let content = file.read_string()?;
        let settings: BTreeMap<String, String> = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&content)?
        };
        debug!("Loaded {} settings from {}", settings.len(), file.path().display());
        Ok(Self { settings, file: Some(file) })
    }

    pub fn from_settings<I, K, V>(settings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            settings: settings.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            file: None,
        }
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.file.as_ref().map(|f| f.path().to_path_buf())
    }

    /// Explicitly configured settings, without defaults.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Sets `name` to `value`, returning whether anything changed.
    pub fn set(&mut self, name: &str, value: &str, journal: &mut Journal) -> AppResult<bool> {
        validate(name, value)?;

        let before = self.settings.get(name).map(|old| format!("{}={}", name, old)).unwrap_or_default();
        if self.settings.get(name).map(String::as_str) == Some(value) {
            return Ok(false);
        }

        self.settings.insert(name.to_string(), value.to_string());
        journal.record_config_action(&before, &format!("{}={}", name, value));
        Ok(true)
    }

    /// Removes `name`, returning whether it was set.
    pub fn unset(&mut self, name: &str, journal: &mut Journal) -> AppResult<bool> {
        match self.settings.remove(name) {
            Some(old) => {
                journal.record_config_action(&format!("{}={}", name, old), "");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Applies a recorded `name=value` state; empty `state` removes `name`.
    pub fn restore(&mut self, name: &str, state: &str) -> AppResult<()> {
        if state.is_empty() {
            self.settings.remove(name);
            return Ok(());
        }
        let (_, value) = split_setting(state)?;
        self.settings.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Stages `config.json`; finalized with the rest of the transaction.
    pub fn save(&self) -> AppResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let mut json = serde_json::to_string_pretty(&self.settings)?;
        json.push('\n');
        file.truncate()?;
        file.write_raw(&json)
    }
}

impl RulesProvider for Rules {
    fn get(&self, name: &str) -> Option<&str> {
        self.settings
            .get(name)
            .map(String::as_str)
            .or_else(|| DEFAULTS.iter().find(|(key, _)| *key == name).map(|(_, value)| *value))
    }

    fn all(&self, stem: &str) -> Vec<String> {
        let mut names: Vec<String> = self.settings.keys().filter(|k| k.starts_with(stem)).cloned().collect();
        for (key, _) in DEFAULTS {
            if key.starts_with(stem) && !self.settings.contains_key(*key) {
                names.push(key.to_string());
            }
        }
        names.sort();
        names
    }
}

/// Splits a recorded `name=value` state.
pub fn split_setting(state: &str) -> AppResult<(&str, &str)> {
    state
        .split_once('=')
        .ok_or_else(|| AppError::Journal(format!("Malformed config state '{}'", state)))
}

fn validate(name: &str, value: &str) -> AppResult<()> {
    if name.is_empty() || name.contains('=') || name.contains(char::is_whitespace) {
        return Err(AppError::validation(format!("'{}' is not a valid setting name", name)));
    }
    if value.contains('\n') {
        return Err(AppError::validation("Setting values must fit on one line"));
    }

    match name {
        "verbose" | "confirmation" if parse_boolean(value).is_none() => {
            Err(AppError::validation(format!("'{}' expects on or off, not '{}'", name, value)))
        }
        "journal.size" if value.trim().parse::<i64>().is_err() => {
            Err(AppError::validation(format!("'{}' expects a number, not '{}'", name, value)))
        }
        _ if name.starts_with("exclusions.") => Exclusion::from_rule(name, value).map(|_| ()),
        _ => Ok(()),
    }
}
