//! Discovery: turn a [`Layout`] into generation units and prune scopes.
//!
//! Planning touches nothing on disk except to list template directories, so
//! configuration problems (two templates claiming one output, two scopes
//! sharing a directory) surface before any file is modified.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use regen_core::types::{is_hidden, strip_template_suffix};
use regen_core::{ConfigError, Flag, GenerationUnit, Group, Layout, TemplateSource};

use crate::error::{io_err, SyncError};
use crate::pruner::PruneTarget;

/// Everything one run will do, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub units: Vec<GenerationUnit>,
    pub prune_targets: Vec<PruneTarget>,
}

/// Build the plan for `layout`.
pub fn plan(layout: &Layout) -> Result<Plan, SyncError> {
    let mut units = Vec::new();
    let mut prune_targets = Vec::new();

    for group in &layout.groups {
        let templates = discover_templates(group, &layout.template_suffix)?;
        let base: Vec<GenerationUnit> = templates
            .iter()
            .filter_map(|path| TemplateSource::from_template_path(path, &layout.template_suffix))
            .map(|source| GenerationUnit {
                group: group.name.clone(),
                source,
                destination_dir: group.destination_dir.clone(),
            })
            .collect();

        prune_targets.push(PruneTarget {
            dir: group.destination_dir.clone(),
            known: base.iter().map(|u| u.source.output_name.0.clone()).collect(),
            allow: group.keep.clone(),
            managed_suffix: group.managed_suffix.clone(),
            owner: group.name.0.clone(),
        });
        units.extend(base);

        for expansion in &group.expansions {
            let dir = group.expansion_dir(expansion);
            for (kind, output) in &expansion.outputs {
                units.push(GenerationUnit {
                    group: group.name.clone(),
                    source: TemplateSource::expanded(
                        &expansion.template,
                        output.clone(),
                        vec![Flag::new(&expansion.flag, kind)],
                    ),
                    destination_dir: dir.clone(),
                });
            }
            let allow = expansion.allow_list();
            prune_targets.push(PruneTarget {
                dir,
                known: allow.clone(),
                allow,
                managed_suffix: group.managed_suffix.clone(),
                owner: format!("{}/{}", group.name, expansion.subdir.display()),
            });
        }
    }

    check_unique_outputs(&units)?;
    check_unique_scopes(&prune_targets)?;
    Ok(Plan {
        units,
        prune_targets,
    })
}

/// Templates directly inside `group.source_dir`, sorted by path.
///
/// Hidden files and the group's expansion templates are skipped; a template
/// that only has the suffix (`.gyb`) produces no output name and is skipped
/// too.
pub fn discover_templates(group: &Group, suffix: &str) -> Result<Vec<PathBuf>, SyncError> {
    let expansion_templates: BTreeSet<&Path> =
        group.expansions.iter().map(|e| e.template.as_path()).collect();

    let entries = match std::fs::read_dir(&group.source_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::SourceDirMissing {
                group: group.name.0.clone(),
                path: group.source_dir.clone(),
            }
            .into())
        }
        Err(err) => return Err(io_err(&group.source_dir, err)),
    };

    let mut templates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&group.source_dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() || expansion_templates.contains(path.as_path()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) || strip_template_suffix(&name, suffix).is_none() {
            continue;
        }
        templates.push(path);
    }
    templates.sort();
    Ok(templates)
}

fn check_unique_outputs(units: &[GenerationUnit]) -> Result<(), ConfigError> {
    let mut seen: BTreeMap<PathBuf, &GenerationUnit> = BTreeMap::new();
    for unit in units {
        let path = unit.destination_path();
        if let Some(first) = seen.get(&path) {
            return Err(ConfigError::DuplicateOutput {
                path,
                first: first.source.label(),
                second: unit.source.label(),
            });
        }
        seen.insert(path, unit);
    }
    Ok(())
}

fn check_unique_scopes(targets: &[PruneTarget]) -> Result<(), ConfigError> {
    let mut seen: BTreeMap<&Path, &str> = BTreeMap::new();
    for target in targets {
        if let Some(first) = seen.insert(target.dir.as_path(), target.owner.as_str()) {
            return Err(ConfigError::SharedDestination {
                path: target.dir.clone(),
                first: first.to_string(),
                second: target.owner.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
