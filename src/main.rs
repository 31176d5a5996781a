use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};

use prop_tuner::config::AppConfig;
use prop_tuner::editor::{apply_section_updates, read_lines, SectionChange, SectionUpdate};
use prop_tuner::props::{Category, PropertyTable, TableEdit};
use prop_tuner::report::{ChannelReporter, ReportEvent, Reporter};
use prop_tuner::vcs::P4Client;
use prop_tuner::workflow::{load_properties, run_bringup, run_tuning, BringupRequest, TuningTargets};

#[derive(Parser, Debug)]
#[command(name = "prop-tuner", version, about = "Sync and tune LMKD/Chimera properties in Perforce-tracked .mk files")]
struct Cli {
    /// Configuration file (defaults to prop-tuner.json next to the binary or in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print every report event as a JSON line
    #[arg(long, global = true)]
    json: bool,

    /// More diagnostics (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy VINCE's property blocks into BENI and/or FLUMEN in a new changelist
    Bringup {
        #[arg(long)]
        vince: String,
        #[arg(long)]
        beni: Option<String>,
        #[arg(long)]
        flumen: Option<String>,
        /// Changelist description
        #[arg(long)]
        description: Option<String>,
    },
    /// Sync BENI and/or FLUMEN and print their property table as JSON
    Load {
        #[command(flatten)]
        targets: TargetArgs,
        /// Write the table here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Apply property edits to BENI and/or FLUMEN in a new changelist
    Tune {
        #[command(flatten)]
        targets: TargetArgs,
        #[command(flatten)]
        edits: EditArgs,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print the LMKD and Chimera properties of a local file
    Show {
        file: PathBuf,
        /// Only this category (LMKD or Chimera)
        #[arg(long)]
        category: Option<Category>,
    },
    /// Apply property edits to a local file without Perforce
    Edit {
        file: PathBuf,
        #[command(flatten)]
        edits: EditArgs,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    #[arg(long)]
    beni: Option<String>,
    #[arg(long)]
    flumen: Option<String>,
}

impl TargetArgs {
    fn to_targets(&self) -> TuningTargets {
        TuningTargets::new(self.beni.as_deref(), self.flumen.as_deref())
    }
}

#[derive(Args, Debug)]
struct EditArgs {
    /// JSON table ({"LMKD": {...}, "Chimera": {...}}) used as the starting point
    #[arg(long)]
    props: Option<PathBuf>,
    /// Add or change a property: CATEGORY:key=value
    #[arg(long = "set", value_name = "CATEGORY:KEY=VALUE")]
    set: Vec<String>,
    /// Remove a property: CATEGORY:key
    #[arg(long = "unset", value_name = "CATEGORY:KEY")]
    unset: Vec<String>,
    /// Rename a property, keeping its value: CATEGORY:old=new
    #[arg(long = "rename", value_name = "CATEGORY:OLD=NEW")]
    rename: Vec<String>,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.props.is_none() && self.set.is_empty() && self.unset.is_empty() && self.rename.is_empty()
    }

    /// Renames first, then sets, then removals.
    fn parse(&self) -> Result<Vec<TableEdit>> {
        let renames = self.rename.iter().map(|s| TableEdit::parse_rename(s));
        let sets = self.set.iter().map(|s| TableEdit::parse_set(s));
        let unsets = self.unset.iter().map(|s| TableEdit::parse_unset(s));
        renames
            .chain(sets)
            .chain(unsets)
            .collect::<Result<Vec<_>, _>>()
            .context("Parsing property edits")
    }

    /// The `--props` table, when given.
    fn base_table(&self) -> Result<Option<PropertyTable>> {
        self.props.as_deref().map(read_table).transpose()
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (config, config_path) = AppConfig::load(cli.config.as_deref())?;
    prop_tuner::logging::init(cli.verbose, config.log_file.as_deref())
        .context("Opening log file")?;
    if let Some(path) = &config_path {
        tracing::info!("using configuration {}", path.display());
    }
    run(cli, config)
}

fn run(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    let json = cli.json;
    match cli.command {
        Command::Bringup {
            vince,
            beni,
            flumen,
            description,
        } => {
            let mut request = BringupRequest::new(&vince);
            request.beni = beni;
            request.flumen = flumen;
            request.description =
                description.unwrap_or_else(|| config.bringup_description().to_string());
            let client = config.build_client().context("Connecting to Perforce")?;
            let summary = run_in_background(client, Render::stdout(json), move |vcs, reporter| {
                run_bringup(vcs, reporter, &request)
            })?;
            Ok(exit_code(summary.is_some()))
        }
        Command::Load { targets, out } => {
            let targets = targets.to_targets();
            let client = config.build_client().context("Connecting to Perforce")?;
            // the table itself goes to stdout unless --out is given
            let render = if out.is_some() {
                Render::stdout(json)
            } else {
                Render::stderr(json)
            };
            let table = run_in_background(client, render, move |vcs, reporter| {
                load_properties(vcs, reporter, &targets)
            })?;
            let Some(table) = table else {
                return Ok(ExitCode::FAILURE);
            };
            let text = serde_json::to_string_pretty(&table)?;
            match out {
                Some(path) => fs::write(&path, text + "\n")
                    .with_context(|| format!("Writing {}", path.display()))?,
                None => println!("{}", text),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Tune {
            targets,
            edits,
            description,
        } => {
            if edits.is_empty() {
                return Err(anyhow!("Nothing to apply: give --props, --set, --unset or --rename"));
            }
            let targets = targets.to_targets();
            let description =
                description.unwrap_or_else(|| config.tuning_description().to_string());
            let parsed = edits.parse()?;
            let base = edits.base_table()?;
            let client = config.build_client().context("Connecting to Perforce")?;
            let summary = run_in_background(client, Render::stdout(json), move |vcs, reporter| {
                run_tuning(vcs, reporter, &targets, base, &parsed, &description)
            })?;
            Ok(exit_code(summary.is_some()))
        }
        Command::Show { file, category } => {
            let lines = read_lines(&file)?;
            let table = PropertyTable::from_lines(&lines).unwrap_or_default();
            let categories = match category {
                Some(c) => vec![c],
                None => Category::ALL.to_vec(),
            };
            if json {
                println!("{}", select_categories(&table, &categories)?);
                return Ok(ExitCode::SUCCESS);
            }
            for category in categories {
                let header = category
                    .locate(&lines)
                    .map(|(spec, _)| spec.header)
                    .unwrap_or("(absent)");
                println!("[{}] {}", category, header);
                for (key, value) in table.category(category) {
                    println!("  {}={}", key, value);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Edit { file, edits } => {
            if edits.is_empty() {
                return Err(anyhow!("Nothing to apply: give --props, --set, --unset or --rename"));
            }
            edit_local(&file, &edits)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn edit_local(file: &Path, edits: &EditArgs) -> Result<()> {
    let parsed = edits.parse()?;
    let mut table = match edits.base_table()? {
        Some(table) => table,
        None => PropertyTable::from_lines(&read_lines(file)?).unwrap_or_default(),
    };
    for edit in &parsed {
        table.apply(edit)?;
    }
    let updates: Vec<SectionUpdate> = Category::ALL
        .into_iter()
        .filter(|c| !table.category(*c).is_empty())
        .map(|c| SectionUpdate::for_category(c, SectionChange::Merge(table.category(c).clone())))
        .collect();
    let report = apply_section_updates(file, &updates)?;
    for header in &report.skipped {
        eprintln!("[WARNING] no '{}' section in {}", header, file.display());
    }
    println!(
        "[OK] Updated {}. Backup saved at: {}",
        file.display(),
        report.backup.display()
    );
    Ok(())
}

/// `{"LMKD": {...}, "Chimera": {...}}` restricted to `categories`.
fn select_categories(
    table: &PropertyTable,
    categories: &[Category],
) -> serde_json::Result<serde_json::Value> {
    let selected = categories
        .iter()
        .map(|c| serde_json::to_value(table.category(*c)).map(|v| (c.to_string(), v)))
        .collect::<serde_json::Result<serde_json::Map<String, serde_json::Value>>>()?;
    Ok(serde_json::Value::Object(selected))
}

fn read_table(path: &Path) -> Result<PropertyTable> {
    let bytes = fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let table: PropertyTable =
        serde_json::from_slice(&bytes).with_context(|| format!("Parsing {}", path.display()))?;
    table
        .validate()
        .with_context(|| format!("Invalid property table {}", path.display()))?;
    Ok(table)
}

/// Where and how workflow events are printed.
#[derive(Debug, Clone, Copy)]
struct Render {
    json: bool,
    /// Log and info lines go to stdout; otherwise everything goes to stderr.
    stdout: bool,
}

impl Render {
    fn stdout(json: bool) -> Self {
        Self { json, stdout: true }
    }

    fn stderr(json: bool) -> Self {
        Self { json, stdout: false }
    }

    fn event(self, event: &ReportEvent) {
        let text = self.text(event);
        if self.to_stdout(event) {
            println!("{}", text);
        } else {
            eprintln!("{}", text);
        }
    }

    fn text(self, event: &ReportEvent) -> String {
        if self.json {
            return event.to_json_line();
        }
        match event {
            ReportEvent::Error { .. } => format!("error: {}", event.to_text()),
            _ => event.to_text(),
        }
    }

    fn to_stdout(self, event: &ReportEvent) -> bool {
        self.stdout && (self.json || matches!(event, ReportEvent::Log { .. } | ReportEvent::Info { .. }))
    }
}

/// Run a workflow on a worker thread and render its events here as they
/// arrive.
fn run_in_background<T, F>(mut client: P4Client, render: Render, work: F) -> Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce(&mut P4Client, &mut dyn Reporter) -> Option<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let mut reporter = ChannelReporter::new(tx);
        work(&mut client, &mut reporter)
    });

    for event in rx {
        render.event(&event);
    }
    worker
        .join()
        .map_err(|_| anyhow!("workflow thread panicked"))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
