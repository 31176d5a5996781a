use super::{
    log_workspace, require_depot_path, resolve_locals, run_reported, Role, TuningTargets,
    UpdatedFile, WorkflowError, WorkflowSummary,
};
use crate::editor::{apply_section_updates, read_lines, SectionChange, SectionUpdate};
use crate::props::{Category, PropertyTable, TableEdit};
use crate::report::{Reporter, Stage, Tracker};
use crate::vcs::VersionControl;

const LOAD_ERROR: &str = "Load Properties Error";
const TUNING_ERROR: &str = "Tuning Process Error";

/// Sync the targets and read their properties into an editable table.
///
/// BENI's table wins when both files are loaded; any difference between the
/// two is sent as an info notification.
pub fn load_properties(
    vcs: &mut dyn VersionControl,
    reporter: &mut dyn Reporter,
    targets: &TuningTargets,
) -> Option<PropertyTable> {
    run_reported(reporter, LOAD_ERROR, |tracker| {
        log_workspace(&*vcs, tracker);
        load(vcs, tracker, targets)
    })
}

fn load(
    vcs: &mut dyn VersionControl,
    tracker: &mut Tracker<'_>,
    targets: &TuningTargets,
) -> Result<PropertyTable, WorkflowError> {
    let paths = targets.provided();
    for (role, path) in &paths {
        require_depot_path(*role, path)?;
        tracker.log(Stage::Validation, format!("Checking if {role} depot path exists..."));
        if !vcs.path_exists(path) {
            return Err(WorkflowError::PathNotFound {
                role: *role,
                path: path.to_string(),
            });
        }
    }
    if paths.is_empty() {
        return Err(WorkflowError::NoValidPaths);
    }
    let locals = resolve_locals(&*vcs, &paths)?;
    tracker.progress(20);

    let depot_paths: Vec<&str> = paths.iter().map(|(_, p)| *p).collect();
    tracker.log(Stage::Mapping, "Mapping depot paths to client spec...");
    vcs.map_workspace_paths(&depot_paths)?;
    for (role, path) in &paths {
        tracker.log(Stage::Sync, format!("Syncing {role} file: {path}"));
        vcs.sync(path)?;
    }
    tracker.progress(60);

    let mut tables = Vec::with_capacity(paths.len());
    for ((role, _), local) in paths.iter().zip(&locals) {
        let lines = read_lines(local)?;
        let table = PropertyTable::from_lines(&lines)
            .ok_or(WorkflowError::PropertiesNotFound { role: *role })?;
        tracker.log(
            Stage::Ok,
            format!(
                "Loaded {} LMKD and {} Chimera properties from {role}.",
                table.lmkd.len(),
                table.chimera.len()
            ),
        );
        tables.push((*role, table));
    }
    tracker.progress(80);

    if let [(left, a), (right, b)] = tables.as_slice() {
        let diffs = a.differences(b, left.name(), right.name());
        if !diffs.is_empty() {
            tracker.log(
                Stage::Warning,
                format!("{} properties differ between {left} and {right}.", diffs.len()),
            );
            tracker.info(
                "Properties Comparison",
                &format!(
                    "Properties differ between {left} and {right}:\n\n{}",
                    diffs.join("\n")
                ),
            );
        }
    }

    // provided() yields BENI before FLUMEN
    let (_, table) = tables
        .into_iter()
        .next()
        .ok_or(WorkflowError::NoValidPaths)?;
    tracker.progress(100);
    Ok(table)
}

/// Write an edited table back into the targets inside a new changelist.
///
/// Categories with no properties are left alone so a half-loaded table can
/// never wipe a section.
pub fn apply_tuning(
    vcs: &mut dyn VersionControl,
    reporter: &mut dyn Reporter,
    targets: &TuningTargets,
    table: &PropertyTable,
    description: &str,
) -> Option<WorkflowSummary> {
    run_reported(reporter, TUNING_ERROR, |tracker| {
        log_workspace(&*vcs, tracker);
        apply(vcs, tracker, targets, table, description)
    })
}

/// Load, edit and write back in one go. `base` replaces the load step when
/// given; `edits` are applied on top of whichever table results.
pub fn run_tuning(
    vcs: &mut dyn VersionControl,
    reporter: &mut dyn Reporter,
    targets: &TuningTargets,
    base: Option<PropertyTable>,
    edits: &[TableEdit],
    description: &str,
) -> Option<WorkflowSummary> {
    run_reported(reporter, TUNING_ERROR, |tracker| {
        log_workspace(&*vcs, tracker);
        let mut table = match base {
            Some(table) => table,
            None => {
                tracker.set_window(0, 40);
                let table = load(vcs, tracker, targets)?;
                tracker.set_window(40, 100);
                table
            }
        };
        for edit in edits {
            table.apply(edit)?;
        }
        tracker.log(Stage::Ok, format!("Applied {} property edits.", edits.len()));
        apply(vcs, tracker, targets, &table, description)
    })
}

fn apply(
    vcs: &mut dyn VersionControl,
    tracker: &mut Tracker<'_>,
    targets: &TuningTargets,
    table: &PropertyTable,
    description: &str,
) -> Result<WorkflowSummary, WorkflowError> {
    table.validate()?;
    let paths = targets.provided();
    for (role, path) in &paths {
        require_depot_path(*role, path)?;
    }
    if paths.is_empty() {
        return Err(WorkflowError::NoValidPaths);
    }

    let updates: Vec<SectionUpdate> = Category::ALL
        .into_iter()
        .filter(|c| !table.category(*c).is_empty())
        .map(|c| SectionUpdate::for_category(c, SectionChange::Merge(table.category(c).clone())))
        .collect();
    if updates.is_empty() {
        return Err(WorkflowError::UpdateFailed);
    }
    let locals = resolve_locals(&*vcs, &paths)?;
    tracker.progress(10);

    tracker.log(Stage::Step(1), "Creating pending changelist...");
    let changelist = vcs.create_changelist(description)?;
    tracker.log(Stage::Ok, format!("Created changelist {changelist}"));
    tracker.progress(30);

    for (role, path) in &paths {
        tracker.log(Stage::Checkout, format!("Checking out {role} file: {path}"));
        vcs.checkout_for_edit(path, &changelist)?;
    }
    tracker.progress(50);

    let mut updated = Vec::with_capacity(paths.len());
    for ((role, depot), local) in paths.iter().zip(locals) {
        tracker.log(Stage::Step(2), format!("Applying tuning to {role}..."));
        let report = apply_section_updates(&local, &updates)?;
        if !report.changed_anything() {
            tracker.log(
                Stage::Warning,
                format!(
                    "{role} file has no LMKD or Chimera section. Left unchanged, backup at {}",
                    report.backup.display()
                ),
            );
            continue;
        }
        for header in &report.skipped {
            tracker.log(
                Stage::Warning,
                format!("{role} file has no '{header}' section."),
            );
        }
        tracker.log(
            Stage::Ok,
            format!("Updated {role} file. Backup saved at: {}", report.backup.display()),
        );
        updated.push(UpdatedFile {
            role: *role,
            depot_path: depot.to_string(),
            local_path: local,
            backup: report.backup,
        });
    }
    tracker.progress(80);

    if updated.is_empty() {
        return Err(WorkflowError::UpdateFailed);
    }
    let summary = WorkflowSummary {
        changelist,
        updated,
    };
    tracker.info(
        "Tuning Complete",
        &format!(
            "Properties successfully updated in: {}\n\nChangelist {} is ready for submission.",
            summary.role_names(),
            summary.changelist
        ),
    );
    tracker.progress(100);
    Ok(summary)
}
