//! qmljs-inspect: Look at C++ type libraries the way QML code sees them.
//!
//! Usage:
//!   qmljs-inspect types <FILE>...
//!   qmljs-inspect members <TYPE> --module <URI> [--version <M.m>] [--types <FILE>]... [-p qmljs.json]
//!
//! `types` lists the components of type-description files with their
//! exports. `members` imports a module into a probe document, resolves a
//! type through it and prints the prototype chain with the members each
//! prototype contributes.

use std::process;
use std::sync::Arc;

use clap::{Parser as ClapParser, Subcommand};
use miette::{miette, IntoDiagnostic, WrapErr};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use qmljs_ast::{AstBuilder, Dialect};
use qmljs_core::ComponentVersion;
use qmljs_diagnostics::{messages, Diagnostic};
use qmljs_interpret::{
    CollectMembers, ContextPtr, Document, LibraryInfo, Link, PrototypeError, PrototypeIterator, Snapshot,
    ValueRef, ViewerContext,
};
use qmljs_metatypes::{TypeDescription, CPP_PACKAGE};

const PROBE_FILE: &str = "/qmljs-inspect/Probe.qml";

#[derive(ClapParser, Debug)]
#[command(name = "qmljs-inspect", about = "Inspect QML type libraries", version)]
struct Cli {
    /// Log what the linker does (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the components of type-description files.
    Types {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
    /// Show the prototype chain and members of a type.
    Members {
        /// Type name as written in QML, e.g. `Rectangle`.
        type_name: String,
        /// Module to import, e.g. `QtQuick`.
        #[arg(short, long)]
        module: String,
        /// Version of the import.
        #[arg(long, default_value = "2.0")]
        version: String,
        /// Type-description files.
        #[arg(short, long = "types", value_name = "FILE")]
        types: Vec<String>,
        /// Project configuration (`qmljs.json`).
        #[arg(short, long)]
        project: Option<String>,
        /// Also list generated `on<Signal>` handlers.
        #[arg(long)]
        handlers: bool,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Types { files } => run_types(&files),
        Command::Members {
            type_name,
            module,
            version,
            types,
            project,
            handlers,
        } => {
            let clean = run_members(&type_name, &module, &version, &types, project.as_deref(), handlers)?;
            if !clean {
                process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// types
// ============================================================================

fn run_types(files: &[String]) -> miette::Result<()> {
    for file in files {
        let description = qmljs_metatypes::load_type_description_file(file)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot load {}", file))?;
        println!("{}:", file);
        for object in &description.objects {
            match &object.superclass_name {
                Some(superclass) => println!("  {} : {}", object.class_name, superclass),
                None => println!("  {}", object.class_name),
            }
            for export in object.exports.iter().filter(|e| e.package != CPP_PACKAGE) {
                println!("    {}/{} {}", export.package, export.type_name, export.version);
            }
        }
        if !description.dependencies.is_empty() {
            println!("  depends: {}", description.dependencies.join(", "));
        }
    }
    Ok(())
}

// ============================================================================
// members
// ============================================================================

/// Returns whether the chain resolved without problems.
fn run_members(
    type_name: &str,
    module: &str,
    version: &str,
    type_files: &[String],
    project: Option<&str>,
    handlers: bool,
) -> miette::Result<bool> {
    let version: ComponentVersion = version
        .parse()
        .into_diagnostic()
        .wrap_err("invalid --version")?;

    let (viewer_context, mut files) = match project {
        Some(path) => {
            let config = qmljs_options::parse_project_config_file(path).into_diagnostic()?;
            (ViewerContext::from_config(&config), config.type_descriptions().to_vec())
        }
        None => (ViewerContext::default(), Vec::new()),
    };
    files.extend(type_files.iter().cloned());
    if files.is_empty() {
        return Err(miette!("no type descriptions given; use --types or --project"));
    }
    let description: TypeDescription = qmljs_metatypes::load_type_description_files(&files).into_diagnostic()?;
    debug!(components = description.objects.len(), "loaded type descriptions");

    let probe = probe_document(module, version, type_name);
    let mut snapshot = Snapshot::new();
    snapshot.insert(probe.clone());
    let builtins = LibraryInfo::default().with_meta_objects(description.objects);
    let (context, link_diagnostics) = Link::new(snapshot, viewer_context, builtins).link_with_diagnostics();

    let mut problems: Vec<Diagnostic> = link_diagnostics.into_values().flatten().collect();
    let segments: Vec<String> = type_name.split('.').map(str::to_string).collect();
    match context.lookup_type(&probe, &segments) {
        Some(found) => problems.extend(print_chain(&context, found, handlers)),
        None => problems.push(Diagnostic::new(&messages::UNKNOWN_COMPONENT_0, &[type_name])),
    }

    for problem in &problems {
        eprintln!("{}", problem);
    }
    Ok(problems.is_empty())
}

/// `import <module> <version>` followed by an empty `<type_name> {}`.
fn probe_document(module: &str, version: ComponentVersion, type_name: &str) -> Arc<Document> {
    let mut b = AstBuilder::new();
    let version = version.to_string();
    let import = b.import_module(module, Some(&version), None);
    let root = b.object_definition(type_name, vec![]);
    Document::new(PROBE_FILE, Dialect::Qml, b.finish_qml(vec![import], root))
}

fn print_chain(context: &ContextPtr, start: ValueRef, handlers: bool) -> Option<Diagnostic> {
    let owner = context.value_owner();
    let mut prototypes = PrototypeIterator::new(Some(start), Some(context));
    let mut last: Option<ValueRef> = None;
    for prototype in prototypes.by_ref() {
        let Some(object) = prototype.as_object() else {
            continue;
        };
        match prototype.as_cpp_component() {
            Some(component) => println!(
                "{} ({} {}, C++ {})",
                object.class_name(),
                component.module_name(),
                component.component_version(),
                component.meta_object().class_name
            ),
            None => println!("{}", object.class_name()),
        }

        let mut collect = CollectMembers::new();
        collect.skip_generated_slots = !handlers;
        object.process_members(&mut collect);
        for member in &collect.members {
            println!("  {:<9} {}: {}", member.kind.as_str(), member.name, owner.type_id(&member.value));
        }
        last = Some(prototype);
    }

    let last_name = last
        .as_ref()
        .and_then(|value| value.as_object().map(|o| o.class_name().to_string()))
        .unwrap_or_default();
    match prototypes.error() {
        PrototypeError::NoError => None,
        PrototypeError::ReferenceResolutionError => {
            let missing = last.as_ref().map(unresolved_prototype_name).unwrap_or_default();
            Some(Diagnostic::new(
                &messages::COULD_NOT_RESOLVE_THE_PROTOTYPE_0_OF_1,
                &[&missing, &last_name],
            ))
        }
        PrototypeError::CycleError => Some(Diagnostic::new(
            &messages::PROTOTYPE_CYCLE_THE_LAST_NON_REPEATED_COMPONENT_IS_0,
            &[&last_name],
        )),
    }
}

/// The name of the prototype `value` asks for but that did not resolve.
fn unresolved_prototype_name(value: &ValueRef) -> String {
    if let Some(component) = value.as_cpp_component() {
        return component.meta_object().superclass_name.clone().unwrap_or_default();
    }
    value
        .as_object()
        .and_then(|object| object.raw_prototype())
        .and_then(|prototype| {
            prototype
                .as_reference()
                .and_then(|reference| reference.as_qml_prototype())
                .map(|reference| reference.type_name().join("."))
        })
        .unwrap_or_default()
}
