use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tree_patcher::config::{apply_plan, load_from_path};
use tree_patcher::ts::{language_for_glob, language_named};
use tree_patcher::{
    find_hits, logging, FileParser, LocalProject, PathEngine, PathEvaluator, PatternEvaluator, Project,
    StagedChange, StagedProject, TreeSitterParser,
};

#[derive(Parser)]
#[command(name = "tree-patcher")]
#[command(about = "Structural, offset-exact source edits", long_about = None)]
#[command(version)]
struct Cli {
    /// Log engine diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a TOML edit plan against a project
    Apply {
        /// Edit plan to run
        #[arg(short, long)]
        plan: PathBuf,

        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Show what would change without writing any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a unified diff of every changed file
        #[arg(short, long)]
        diff: bool,
    },

    /// Print every node a query selects
    Query {
        /// Query to evaluate
        query: String,

        /// Files to search
        #[arg(short, long)]
        glob: String,

        /// Grammar name or extension (inferred from the glob if omitted)
        #[arg(short, long)]
        lang: Option<String>,

        /// Treat the query as an ast-grep pattern instead of a path expression
        #[arg(long)]
        pattern: bool,

        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Apply {
            plan,
            root,
            dry_run,
            diff,
        } => cmd_apply(&plan, root, dry_run, diff),

        Commands::Query {
            query,
            glob,
            lang,
            pattern,
            root,
        } => cmd_query(&query, &glob, lang.as_deref(), pattern, root),
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => env::current_dir().context("cannot determine current directory"),
    }
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{line}");
    }
}

fn cmd_apply(plan_path: &Path, root: Option<PathBuf>, dry_run: bool, show_diff: bool) -> Result<()> {
    let root = resolve_root(root)?;
    let plan = load_from_path(plan_path)?;
    let mut project = LocalProject::open(&root)
        .with_context(|| format!("cannot open project at {}", root.display()))?;

    println!("Root: {}", project.root().display());
    if !plan.meta.name.is_empty() {
        println!("Plan: {}", plan.meta.name);
    }
    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }
    println!();

    // Every edit runs against an in-memory overlay; changed files are
    // written back once the whole plan has run.
    let mut failed_edits = 0;
    let mut failed_files = 0;
    let changes: Vec<StagedChange> = {
        let mut staged = StagedProject::new(&project);
        for (id, result) in apply_plan(&plan, &mut staged, None) {
            match result {
                Ok(report) => {
                    println!(
                        "{} {}: {} matched, {} edited",
                        "✓".green(),
                        id,
                        report.matched.len(),
                        report.modified.len()
                    );
                    for failure in &report.failures {
                        eprintln!(
                            "  {} {}: {}",
                            "✗".red(),
                            failure.path.display(),
                            failure.error
                        );
                    }
                    failed_files += report.failures.len();
                }
                Err(e) => {
                    eprintln!("{} {}: Error - {}", "✗".red(), id, e);
                    failed_edits += 1;
                }
            }
        }
        staged.changes()?
    };

    for change in &changes {
        if show_diff {
            display_diff(&change.path, &change.original, &change.updated);
        }
        if !dry_run {
            project
                .write(&change.path, &change.updated)
                .with_context(|| format!("failed to write {}", change.path.display()))?;
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    let verb = if dry_run { "would change" } else { "changed" };
    println!("  {} files {verb}", changes.len().to_string().green());
    println!("  {} files skipped", failed_files.to_string().yellow());
    println!("  {} edits failed", failed_edits.to_string().red());

    if failed_edits > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_query(
    query: &str,
    glob: &str,
    lang: Option<&str>,
    use_pattern: bool,
    root: Option<PathBuf>,
) -> Result<()> {
    let root = resolve_root(root)?;
    let lang = match lang {
        Some(name) => language_named(name).with_context(|| format!("unknown language '{name}'"))?,
        None => language_for_glob(glob)
            .with_context(|| format!("cannot infer a language from '{glob}'; pass --lang"))?,
    };
    let parser = TreeSitterParser::for_language(lang)?;
    let pattern_engine = PatternEvaluator::new(lang);
    let evaluator: &dyn PathEvaluator = if use_pattern {
        &pattern_engine
    } else {
        &PathEngine
    };

    if let Some(expression) = evaluator.path_expression(query) {
        parser.validate(&expression?)?;
    }

    let project = LocalProject::open(&root)?;
    let mut total = 0;
    for path in project.list(glob)? {
        match find_hits(&project, &parser, evaluator, &path, query) {
            Ok(Some(hit)) => {
                for m in hit.matches() {
                    let offset = m.offset().map_or_else(|| "-".to_string(), |o| o.to_string());
                    println!("{}:{} {} {:?}", path.display(), offset, m.name().cyan(), m.value());
                    total += 1;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{} {}: {}", "✗".red(), path.display(), e),
        }
    }

    eprintln!("{total} matches");
    Ok(())
}
