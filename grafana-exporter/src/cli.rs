///
/// This module implements the CLI interface for grafana-exporter: command parsing,
/// argument validation and the async entrypoint.
///
/// All export logic (configuration state, catalog merge, bundling) lives in the
/// [`grafana-exporter-core`] crate. This module only drives an
/// [`ExportSession`] from command line arguments and prints results.
///
/// ## How To Use
/// - For command-line users: use the installed `grafana-exporter` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// Human-readable results go to stdout; logs go to stderr.
///
/// [`grafana-exporter-core`]: ../../grafana-exporter-core/
use crate::client::PluginClient;
use crate::load_config::load_config;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use grafana_exporter_core::options::{OutputFormat, Target};
use grafana_exporter_core::session::{ExportSession, Notice, NoticeKind, PageState};
use grafana_exporter_core::state::CatalogUpdate;
use std::path::{Path, PathBuf};

/// CLI for grafana-exporter: export Grafana resources as Terraform, Crossplane or Grizzly files.
#[derive(Parser)]
#[clap(
    name = "grafana-exporter",
    version,
    about = "Generate and download declarative exports of Grafana resources"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the resource kinds available for a target and output format
    Kinds {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Where resources are read from: grafana or cloud
        #[clap(long)]
        target: Option<Target>,
        /// Output format, e.g. terraform-hcl or grizzly-yaml
        #[clap(long)]
        format: Option<OutputFormat>,
    },
    /// Generate files for the selected resource kinds and save them as a ZIP archive
    Export {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        target: Option<Target>,
        #[clap(long)]
        format: Option<OutputFormat>,
        /// Export only these kinds (repeatable)
        #[clap(long = "only", value_name = "KIND")]
        only: Vec<String>,
        /// Leave these kinds out (repeatable)
        #[clap(long = "exclude", value_name = "KIND")]
        exclude: Vec<String>,
        /// Export every kind of this category (repeatable)
        #[clap(long = "category", value_name = "CATEGORY")]
        category: Vec<String>,
        /// Directory for the archive, or a path ending in .zip
        #[clap(long, default_value = ".")]
        output: PathBuf,
        /// Also print every generated file
        #[clap(long)]
        print: bool,
    },
    /// List the output formats available for a target
    Formats {
        #[clap(long, default_value = "grafana")]
        target: Target,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Formats { target } => {
            tracing::info!(command = "formats", %target, "Listing output formats");
            for format in OutputFormat::options_for(target) {
                println!("{}\t{}", format, format.label());
            }
            Ok(())
        }
        Commands::Kinds {
            config,
            target,
            format,
        } => {
            tracing::info!(command = "kinds", "Listing resource kinds");
            let (session, _client) = prepare_session(&config, target, format).await?;
            print_catalog(&session);
            Ok(())
        }
        Commands::Export {
            config,
            target,
            format,
            only,
            exclude,
            category,
            output,
            print,
        } => {
            tracing::info!(command = "export", "Starting export");
            let (mut session, client) = prepare_session(&config, target, format).await?;
            apply_selection(&mut session, &only, &exclude, &category)?;

            match session.generate(&client).await? {
                PageState::Ready => {}
                PageState::Failed(e) => {
                    tracing::error!(command = "export", error = %e, "Export failed");
                    return Err(anyhow!(e.clone()));
                }
                other => bail!("unexpected page state after generation: {other:?}"),
            }

            if let Some(Notice::PartialSuccess(warnings)) = session.notice(NoticeKind::PartialSuccess) {
                for warning in warnings {
                    eprintln!("warning: {warning}");
                }
            }
            if print {
                for tab in session.bundler().tabs() {
                    println!("==> {} ({}) <==", tab.name, tab.language);
                    println!("{}", tab.content);
                }
            }

            let path = save_archive(&session, &output)?;
            println!(
                "Wrote {} file(s) to {}",
                session.bundler().files().len(),
                path.display()
            );
            tracing::info!(command = "export", path = %path.display(), "Export complete");
            Ok(())
        }
    }
}

/// Loads config, applies the axes and runs the single coalesced catalog refresh.
async fn prepare_session(
    config: &Path,
    target: Option<Target>,
    format: Option<OutputFormat>,
) -> Result<(ExportSession, PluginClient)> {
    let config = load_config(config)?;
    let client = PluginClient::from_config(&config).context("Failed to build HTTP client")?;
    let mut session = ExportSession::new(config.settings);

    if let Some(target) = target {
        session.set_target(target)?;
    }
    if let Some(format) = format {
        session.set_format(format)?;
    }

    match session.refresh_catalog(&client).await {
        Some(CatalogUpdate::Failed(e)) => Err(anyhow!(e)),
        Some(update) => {
            tracing::debug!(?update, "Catalog refreshed");
            Ok((session, client))
        }
        None => Ok((session, client)),
    }
}

/// Narrows the default (everything selected) down to what the flags ask for.
fn apply_selection(
    session: &mut ExportSession,
    only: &[String],
    exclude: &[String],
    category: &[String],
) -> Result<()> {
    if !only.is_empty() || !category.is_empty() {
        session.set_all(false, None)?;
    }
    for name in category {
        if session.set_all(true, Some(name))? == 0 {
            bail!("unknown category: {name}");
        }
    }
    for name in only {
        if !session.set_kind(name, true)? {
            bail!("unknown resource kind: {name}");
        }
    }
    for name in exclude {
        if !session.set_kind(name, false)? {
            bail!("unknown resource kind: {name}");
        }
    }
    tracing::info!(
        selected = session.config().selected_count(),
        total = session.config().catalog().len(),
        "Selection applied"
    );
    Ok(())
}

fn save_archive(session: &ExportSession, output: &Path) -> Result<PathBuf> {
    let is_zip = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    let saved = if is_zip {
        session.download_to(output)
    } else {
        session.download(output)
    };
    saved.with_context(|| format!("Failed to save archive to {}", output.display()))
}

fn print_catalog(session: &ExportSession) {
    let config = session.config();
    println!("target: {}  format: {}", config.target(), config.format());
    for summary in config.categories() {
        let heading = if summary.category.is_empty() {
            "(uncategorised)"
        } else {
            summary.category.as_str()
        };
        println!("{heading} ({}/{})", summary.selected, summary.total);
        for kind in config.catalog().iter().filter(|k| k.category == summary.category) {
            let mark = if kind.selected { "x" } else { " " };
            println!("  [{mark}] {}", kind.name);
        }
    }
    if config.catalog().is_empty() {
        println!("No resource types available");
    }
}
