//! CLI command implementations.

use async_trait::async_trait;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scribe_extract::{Extractor, ScanEvent};
use scribe_gen::{
    document_project_with, GenEvent, GenerationError, GenerationRequest, Generator, RunnerOptions,
};
use scribe_graph::{DocScheduler, GeneratedDoc, GraphStore};
use scribe_lsp::ServerRegistry;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn scribe_dir(root: &Path) -> PathBuf {
    root.join(".scribe")
}

fn db_path(root: &Path) -> PathBuf {
    scribe_dir(root).join("scribe.db")
}

fn open_store(root: &Path) -> Result<GraphStore> {
    fs::create_dir_all(scribe_dir(root))?;
    Ok(GraphStore::open(&db_path(root))?)
}

fn load_registry(root: &Path) -> Result<ServerRegistry> {
    let mut registry = ServerRegistry::builtin();
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("scribe").join("servers.json");
        if global.exists() {
            registry.load_overrides(&global)?;
        }
    }
    let local = scribe_dir(root).join("servers.json");
    if local.exists() {
        registry.load_overrides(&local)?;
    }
    Ok(registry)
}

/// The stored project for a path, without creating one.
fn project_id(store: &GraphStore, root: &Path) -> Result<Option<i64>> {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    Ok(store.project_by_root(&root.to_string_lossy())?)
}

/// Initialize Scribe in a directory.
pub fn init(path: &Path) -> Result<()> {
    let dir = scribe_dir(path);
    if dir.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }
    fs::create_dir_all(&dir)?;
    // Empty override file; keys are languages, values server configs.
    fs::write(dir.join("servers.json"), "{}\n")?;

    println!("{} Initialized Scribe in {}", "✓".green(), path.display());
    println!(
        "  Edit {} to override language servers",
        ".scribe/servers.json".cyan()
    );
    println!("  Run {} to build the symbol graph", "scribe scan".cyan());
    Ok(())
}

/// Scan a project and refresh the symbol graph.
pub async fn scan(path: &Path) -> Result<()> {
    println!("{}", "Scanning project...".cyan());

    let mut store = open_store(path)?;
    let extractor = Extractor::new(load_registry(path)?);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Planning...");

    let report = extractor
        .scan_with(&mut store, path, |event| match event {
            ScanEvent::Planned { extract, .. } => {
                spinner.set_message(format!("Extracting {} files...", extract));
            }
            ScanEvent::FileStart(file) => spinner.set_message(format!("Extracting {}", file)),
            ScanEvent::ReferencePass { symbols } => {
                spinner.set_message(format!("Resolving references for {} symbols...", symbols));
            }
            _ => {}
        })
        .await?;

    spinner.finish_and_clear();

    if report.up_to_date {
        println!("{} Graph is already current", "✓".green());
        return Ok(());
    }

    println!(
        "{} Scanned {} files ({} symbols, {} relations)",
        "✓".green(),
        report.files_extracted.to_string().cyan(),
        report.symbols.to_string().cyan(),
        report.relations.to_string().cyan(),
    );
    if report.files_unchanged > 0 || report.files_removed > 0 {
        println!(
            "  {}",
            format!(
                "{} unchanged, {} removed",
                report.files_unchanged, report.files_removed
            )
            .dimmed()
        );
    }

    if !report.files_failed.is_empty() {
        println!("\n{} files failed to extract:", "⚠".yellow());
        for file in report.files_failed.iter().take(5) {
            println!("  {}", file.red());
        }
        if report.files_failed.len() > 5 {
            println!("  ... and {} more", report.files_failed.len() - 5);
        }
    }

    Ok(())
}

/// Show graph statistics and scan state.
pub fn status(path: &Path) -> Result<()> {
    if !db_path(path).exists() {
        println!("Not scanned yet. Run {} first.", "scribe scan".cyan());
        return Ok(());
    }
    let store = open_store(path)?;
    let Some(project) = project_id(&store, path)? else {
        println!("Not scanned yet. Run {} first.", "scribe scan".cyan());
        return Ok(());
    };

    let counts = store.counts(project)?;
    let state = store.scan_state(project)?;
    let scheduler = DocScheduler::new(&store);
    let remaining = scheduler.remaining()?;

    println!("{}", "Scribe status".cyan().bold());
    println!("  Files:         {}", counts.files);
    println!("  Symbols:       {}", counts.symbols);
    println!("  Relations:     {}", counts.relationships);
    println!(
        "  Documented:    {} / {}",
        counts.documented.to_string().green(),
        counts.symbols
    );
    println!("  Undocumented:  {}", remaining);
    if state.scan_complete {
        println!("  Last scan:     {}", "complete".green());
    } else {
        println!("  Last scan:     {}", "incomplete".yellow());
    }
    let failed = store.failed_files(project)?;
    if !failed.is_empty() {
        println!("  Failed files:  {}", failed.len().to_string().red());
    }

    Ok(())
}

/// Show the order symbols will be documented in.
pub fn plan(path: &Path, limit: usize) -> Result<()> {
    let store = open_store(path)?;
    let Some(_) = project_id(&store, path)? else {
        println!("Not scanned yet. Run {} first.", "scribe scan".cyan());
        return Ok(());
    };

    let scheduler = DocScheduler::new(&store);
    let order = scheduler.generation_order()?;
    if order.is_empty() {
        println!("{} Everything is documented", "✓".green());
        return Ok(());
    }

    println!("Next {} of {} symbols:\n", limit.min(order.len()), order.len());
    for candidate in order.iter().take(limit) {
        let context = scheduler.context(candidate.symbol_id)?;
        println!(
            "  {:>4}  {} {} {}",
            candidate.calls,
            context.symbol.kind.as_str().yellow(),
            context.symbol.name.cyan(),
            format!(
                "({}:{})",
                context.file_path,
                context.symbol.range.start.line + 1
            )
            .dimmed()
        );
    }

    Ok(())
}

/// Show what a generator would see for one symbol.
pub fn context(path: &Path, symbol: Option<i64>) -> Result<()> {
    let store = open_store(path)?;
    let scheduler = DocScheduler::new(&store);

    let symbol_id = match symbol {
        Some(id) => id,
        None => match scheduler.next_candidate()? {
            Some(candidate) => candidate.symbol_id,
            None => {
                println!("{} Everything is documented", "✓".green());
                return Ok(());
            }
        },
    };

    let context = scheduler.context(symbol_id)?;
    println!(
        "{} {} {}",
        context.symbol.kind.as_str().yellow(),
        context.symbol.name.cyan().bold(),
        format!(
            "({}:{}-{})",
            context.file_path,
            context.symbol.range.start.line + 1,
            context.symbol.range.end.line + 1
        )
        .dimmed()
    );
    if let Some(detail) = &context.symbol.detail {
        println!("  {}", detail.dimmed());
    }
    if let Some(parent) = &context.parent_name {
        println!("  in {}", parent.cyan());
    }
    if context.callees.is_empty() {
        println!("\nCalls nothing.");
    } else {
        println!("\nCalls:");
        for callee in &context.callees {
            match &callee.summary {
                Some(summary) => println!("  {} - {}", callee.name.cyan(), summary),
                None => println!("  {} - {}", callee.name.cyan(), "undocumented".dimmed()),
            }
        }
    }

    Ok(())
}

/// Run a documentation pass with the built-in outline generator.
pub async fn document(path: &Path, attempts: u32) -> Result<()> {
    let store = open_store(path)?;
    if project_id(&store, path)?.is_none() {
        println!("Not scanned yet. Run {} first.", "scribe scan".cyan());
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::default_bar().template("{bar:30.cyan} {pos}/{len} {msg}")?);

    let options = RunnerOptions {
        max_attempts: attempts.max(1),
    };
    let report = document_project_with(&store, path, &OutlineGenerator, options, |event| {
        match event {
            GenEvent::Planned { symbols } => bar.set_length(symbols as u64),
            GenEvent::SymbolDone(name) => {
                bar.set_message(name.to_string());
                bar.inc(1);
            }
            GenEvent::SymbolFailed(_) => bar.inc(1),
        }
    })
    .await?;
    bar.finish_and_clear();

    println!(
        "{} Documented {} symbols ({} files fully covered)",
        "✓".green(),
        report.documented.to_string().cyan(),
        report.files_completed
    );
    if !report.failed.is_empty() {
        println!("\n{} symbols failed:", "⚠".yellow());
        for (_, name, error) in report.failed.iter().take(5) {
            println!("  {} - {}", name.red(), error);
        }
        if report.failed.len() > 5 {
            println!("  ... and {} more", report.failed.len() - 5);
        }
    }

    Ok(())
}

/// List the configured language servers.
pub fn servers(path: &Path) -> Result<()> {
    let registry = load_registry(path)?;
    let mut languages: Vec<&str> = registry.languages().collect();
    languages.sort();

    println!("{}", "Configured language servers".cyan().bold());
    for language in languages {
        let Some(config) = registry.config_for(language) else {
            continue;
        };
        println!(
            "  {:<12} {}",
            language.yellow(),
            config.command.join(" ").dimmed()
        );
    }
    Ok(())
}

/// Offline generator: summarizes a symbol from its signature and
/// callee list. Stands in wherever no model-backed generator is
/// wired up.
struct OutlineGenerator;

#[async_trait]
impl Generator for OutlineGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<GeneratedDoc, GenerationError> {
        let symbol = &request.context.symbol;
        let signature = request
            .source
            .lines()
            .next()
            .unwrap_or(&symbol.name)
            .trim()
            .to_string();

        let mut doc = GeneratedDoc {
            summary: format!("{} `{}`.", capitalized_kind(symbol), symbol.name),
            ..Default::default()
        };
        let mut description = format!("Defined as `{}`", signature);
        if !request.context.callees.is_empty() {
            let names: Vec<&str> = request
                .context
                .callees
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            description.push_str(&format!("; calls {}", names.join(", ")));
        }
        description.push('.');
        doc.description = Some(description);
        Ok(doc)
    }
}

fn capitalized_kind(symbol: &scribe_graph::SymbolRow) -> String {
    let kind = symbol.kind.as_str();
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
