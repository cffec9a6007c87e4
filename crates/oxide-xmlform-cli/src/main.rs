//! oxide-xmlform CLI
//!
//! Command-line tool for inspecting XML form definitions and checking data
//! against them.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_xmlform::{Form, FormContext, FormOptions, GroupScope};

/// Inspect and check XML form definitions.
#[derive(Parser)]
#[command(name = "oxide-xmlform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directories searched for form files, highest priority first.
    #[arg(short, long = "path", env = "XMLFORM_PATH", value_delimiter = ',')]
    paths: Vec<PathBuf>,

    /// Control name wrapping input names (e.g. `jform`).
    #[arg(short, long, env = "XMLFORM_CONTROL")]
    control: Option<String>,

    /// Site root URL used by the URL filter.
    #[arg(long, default_value = "/")]
    root_url: String,

    /// Site host used by the URL filter.
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fields of a form.
    Fields {
        /// Schema files or names, merged in order.
        #[arg(required = true)]
        schemas: Vec<String>,
    },

    /// List the fieldsets of a form.
    Fieldsets {
        /// Schema files or names, merged in order.
        #[arg(required = true)]
        schemas: Vec<String>,

        /// Only fieldsets used by fields of this group.
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Filter and validate a JSON document against a form.
    Check {
        /// Schema files or names, merged in order.
        #[arg(required = true)]
        schemas: Vec<String>,

        /// JSON file holding the submitted data.
        #[arg(short, long)]
        data: PathBuf,

        /// Restrict filtering and validation to this group.
        #[arg(short, long)]
        group: Option<String>,

        /// Keep existing fields when later schemas declare them again.
        #[arg(long)]
        keep: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut builder = FormContext::builder().root_url(&cli.root_url);
    if let Some(host) = &cli.host {
        builder = builder.host(host);
    }
    // The context prepends each path; reversing keeps the first flag first.
    for path in cli.paths.iter().rev() {
        builder = builder.form_path(path);
    }
    let context = builder.build().shared();

    let mut options = FormOptions::new();
    if let Some(control) = &cli.control {
        options = options.control(control);
    }

    match cli.command {
        Commands::Fields { schemas } => {
            let form = load_form(&context, options, &schemas, true)?;
            let Some(tree) = form.tree() else {
                return Ok(ExitCode::SUCCESS);
            };

            for id in tree.find_fields_by_group(GroupScope::All, false) {
                let element = tree.element(id);
                let field_type = element.non_empty_attr("type").unwrap_or("text");
                println!("{} ({field_type})", element.key());
            }
        }

        Commands::Fieldsets { schemas, group } => {
            let form = load_form(&context, options, &schemas, true)?;
            let fieldsets = form.get_fieldsets(group.as_deref());
            if fieldsets.is_empty() {
                info!("No fieldsets declared.");
            }
            for fieldset in fieldsets {
                if fieldset.label.is_empty() {
                    println!("{}", fieldset.name);
                } else {
                    println!("{} ({})", fieldset.name, fieldset.label);
                }
            }
        }

        Commands::Check {
            schemas,
            data,
            group,
            keep,
        } => {
            let mut form = load_form(&context, options, &schemas, !keep)?;
            let raw = std::fs::read_to_string(&data)
                .with_context(|| format!("failed to read {}", data.display()))?;
            let input: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", data.display()))?;

            let filtered = form.filter(&input, group.as_deref())?;
            form.bind(&filtered)?;
            let valid = form.validate(&filtered, group.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&filtered)?);

            if !valid {
                for error in form.errors() {
                    eprintln!(" [!] {}: {error}", error.field);
                }
                return Ok(ExitCode::FAILURE);
            }
            info!("{} field value(s) accepted.", form.data().len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Builds a form from every schema in turn.
///
/// A schema that exists on disk is read directly, anything else is looked
/// up in the form search paths.
fn load_form(
    context: &Arc<FormContext>,
    options: FormOptions,
    schemas: &[String],
    replace: bool,
) -> anyhow::Result<Form> {
    let name = schemas.first().map_or("form", String::as_str);
    let mut form = Form::new(name, options, Arc::clone(context));

    for schema in schemas {
        debug!(schema = %schema, "loading schema");
        form.load_file(schema, replace, None)
            .with_context(|| format!("failed to load {schema}"))?;
    }
    Ok(form)
}
