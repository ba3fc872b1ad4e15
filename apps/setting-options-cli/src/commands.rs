//! Subcommand implementations. Output goes to the given writer.

use std::io::Write;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use setting_options::{
    ReadOptions, SettingOptionsStore, SettingUpdate, SettingValue, SettingsError,
};

pub async fn groups(store: &SettingOptionsStore, out: &mut impl Write) -> Result<()> {
    for group in store.resolve_groups().await?.iter() {
        let parent = group.parent_id.as_deref().filter(|parent| !parent.is_empty());
        match parent {
            Some(parent) => writeln!(out, "{}\t{}\t(parent: {parent})", group.id, group.label)?,
            None => writeln!(out, "{}\t{}", group.id, group.label)?,
        }
    }
    Ok(())
}

pub async fn list(store: &SettingOptionsStore, group_id: &str, out: &mut impl Write) -> Result<()> {
    let settings = store
        .resolve_settings(group_id, ReadOptions::default())
        .await?;
    for setting in settings.values() {
        writeln!(
            out,
            "{}\t{}\t{}",
            setting.id,
            setting.kind.as_str(),
            setting.value.to_json()
        )?;
    }
    Ok(())
}

pub async fn get(
    store: &SettingOptionsStore,
    group_id: &str,
    setting_id: &str,
    out: &mut impl Write,
) -> Result<()> {
    let value = store
        .resolve_setting_value(group_id, setting_id, ReadOptions::default())
        .await?
        .with_context(|| format!("setting '{setting_id}' not found in group '{group_id}'"))?;
    writeln!(out, "{}", value.to_json())?;
    Ok(())
}

pub async fn set(
    store: &SettingOptionsStore,
    group_id: &str,
    setting_id: &str,
    raw: &str,
    out: &mut impl Write,
) -> Result<()> {
    store
        .edit_setting(group_id, setting_id, parse_value(raw))
        .await?;
    match store.save_edited_setting(group_id, setting_id).await? {
        Some(saved) => writeln!(out, "{}\t{}", saved.id, saved.value.to_json())?,
        None => writeln!(out, "{setting_id}\tunchanged")?,
    }
    Ok(())
}

pub async fn batch(
    store: &SettingOptionsStore,
    group_id: &str,
    assignments: &[String],
    out: &mut impl Write,
) -> Result<()> {
    let updates = assignments
        .iter()
        .map(|assignment| parse_assignment(assignment))
        .collect::<Result<Vec<_>>>()?;
    store.edit_settings(group_id, updates).await?;

    match store.save_edited_settings_group(group_id).await {
        Ok(saved) => {
            for setting in &saved {
                writeln!(out, "{}\t{}", setting.id, setting.value.to_json())?;
            }
            Ok(())
        }
        Err(SettingsError::PartialBatch { setting_errors }) => {
            for failure in &setting_errors {
                writeln!(out, "{}\tfailed: {}", failure.id, failure.error)?;
            }
            bail!(
                "{} of {} settings were rejected",
                setting_errors.len(),
                assignments.len()
            )
        }
        Err(error) => Err(error.into()),
    }
}

/// JSON when it parses, otherwise the raw text.
pub fn parse_value(raw: &str) -> SettingValue {
    serde_json::from_str::<Value>(raw)
        .map_or_else(|_| SettingValue::from(raw), SettingValue::from)
}

/// Parses `id=value`.
///
/// # Errors
/// Fails when the `=` is missing or the id is empty.
pub fn parse_assignment(assignment: &str) -> Result<SettingUpdate> {
    match assignment.split_once('=') {
        Some((id, raw)) if !id.is_empty() => Ok(SettingUpdate::new(id, parse_value(raw))),
        _ => bail!("expected <id>=<value>, got '{assignment}'"),
    }
}
