use super::{
    is_depot_path, join_roles, log_workspace, require_depot_path, resolve_locals, run_reported,
    BringupRequest, Role, UpdatedFile, WorkflowError, WorkflowSummary,
};
use crate::editor::{apply_section_updates, read_lines, SectionChange, SectionUpdate};
use crate::props::Category;
use crate::report::{Reporter, Stage, Tracker};
use crate::vcs::VersionControl;

const PROCESS_ERROR: &str = "Process Error";

/// Copy VINCE's LMKD and Chimera blocks into BENI and/or FLUMEN inside a
/// fresh changelist. Failures are reported, never returned.
pub fn run_bringup(
    vcs: &mut dyn VersionControl,
    reporter: &mut dyn Reporter,
    request: &BringupRequest,
) -> Option<WorkflowSummary> {
    run_reported(reporter, PROCESS_ERROR, |tracker| bringup(vcs, tracker, request))
}

fn bringup(
    vcs: &mut dyn VersionControl,
    tracker: &mut Tracker<'_>,
    request: &BringupRequest,
) -> Result<WorkflowSummary, WorkflowError> {
    log_workspace(&*vcs, tracker);
    let vince = request.vince.trim();
    tracker.log(Stage::Validation, "Checking if VINCE depot path exists...");
    if vince.is_empty() {
        return Err(WorkflowError::MissingPath { role: Role::Vince });
    }
    require_depot_path(Role::Vince, vince)?;
    if !vcs.path_exists(vince) {
        return Err(WorkflowError::MandatoryPathNotFound {
            role: Role::Vince,
            path: vince.to_string(),
        });
    }
    tracker.log(Stage::Ok, "VINCE depot path validated successfully.");

    let mut targets: Vec<(Role, &str)> = Vec::new();
    let optional = [
        (Role::Beni, request.beni.as_deref()),
        (Role::Flumen, request.flumen.as_deref()),
    ];
    for (role, given) in optional {
        match given.map(str::trim).filter(|p| !p.is_empty()) {
            None => tracker.log(
                Stage::Info,
                format!("{role} depot path not provided. Skipping {role} processing."),
            ),
            Some(path) if !is_depot_path(path) => tracker.log(
                Stage::Warning,
                format!("{role} depot path must start with //: {path}. Skipping {role} processing."),
            ),
            Some(path) if vcs.path_exists(path) => {
                tracker.log(Stage::Ok, format!("{role} depot path validated successfully."));
                targets.push((role, path));
            }
            Some(path) => tracker.log(
                Stage::Warning,
                format!("{role} depot path does not exist: {path}. Skipping {role} processing."),
            ),
        }
    }
    if targets.is_empty() {
        return Err(WorkflowError::NoValidTargets);
    }

    let vince_local = vcs.local_path(vince)?;
    let target_locals = resolve_locals(&*vcs, &targets)?;
    tracker.progress(10);

    tracker.log(Stage::Step(1), "Creating pending changelist...");
    let changelist = vcs.create_changelist(&request.description)?;
    tracker.log(Stage::Ok, format!("Created changelist {changelist}"));
    tracker.progress(20);

    let mut depot_paths: Vec<&str> = targets.iter().map(|(_, p)| *p).collect();
    depot_paths.push(vince);
    tracker.log(
        Stage::Step(2),
        format!(
            "Mapping {} and VINCE to client spec...",
            join_roles(targets.iter().map(|(r, _)| *r))
        ),
    );
    vcs.map_workspace_paths(&depot_paths)?;
    tracker.log(Stage::Ok, "Mapping completed.");
    tracker.progress(35);

    for (role, path) in std::iter::once((Role::Vince, vince)).chain(targets.iter().copied()) {
        tracker.log(Stage::Sync, format!("Syncing {role} file: {path}"));
        vcs.sync(path)?;
    }
    tracker.log(Stage::Ok, "Sync completed.");

    tracker.log(
        Stage::Validation,
        "Checking if LMKD and Chimera properties exist in VINCE...",
    );
    let vince_lines = read_lines(&vince_local)?;
    let blocks: Vec<(Category, Vec<String>)> = Category::ALL
        .into_iter()
        .map(|category| (category, category.extract_block(&vince_lines)))
        .filter(|(_, block)| !block.is_empty())
        .collect();
    match blocks.as_slice() {
        [] => return Err(WorkflowError::PropertiesNotFound { role: Role::Vince }),
        [(found, _)] => {
            let missing = Category::ALL
                .into_iter()
                .find(|c| c != found)
                .unwrap_or(*found);
            tracker.log(
                Stage::Warning,
                format!("VINCE file does not contain {missing} properties. Only {found} will be updated."),
            );
        }
        _ => tracker.log(Stage::Ok, "LMKD and Chimera properties found in VINCE file."),
    }
    tracker.progress(60);

    for (role, path) in &targets {
        tracker.log(Stage::Checkout, format!("Checking out {role} file: {path}"));
        vcs.checkout_for_edit(path, &changelist)?;
    }
    tracker.log(Stage::Ok, "Checkout completed.");
    tracker.progress(80);

    let updates: Vec<SectionUpdate> = blocks
        .into_iter()
        .map(|(category, block)| SectionUpdate::for_category(category, SectionChange::Replace(block)))
        .collect();

    let mut updated = Vec::with_capacity(targets.len());
    for ((role, depot), local) in targets.iter().zip(target_locals) {
        tracker.log(
            Stage::Step(3),
            format!("Updating LMKD and Chimera properties in {role}..."),
        );
        let report = apply_section_updates(&local, &updates)?;
        for header in &report.skipped {
            tracker.log(
                Stage::Warning,
                format!("{role} file has no '{header}' section. It was left unchanged."),
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
    tracker.progress(100);

    let summary = WorkflowSummary {
        changelist,
        updated,
    };
    let processed = summary.role_names();
    tracker.log(
        Stage::Info,
        format!("All steps completed successfully. Processed targets: {processed}"),
    );
    tracker.info(
        "Bringup Complete",
        &format!(
            "Processed targets: {processed}\n\nChangelist {} is ready for submission.",
            summary.changelist
        ),
    );
    Ok(summary)
}
