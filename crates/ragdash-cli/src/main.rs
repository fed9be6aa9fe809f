//! `ragdash` - terminal front end for the RAG admin console

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ragdash_client::HttpClient;
use ragdash_core::{
    kb_id, render_cell, ConsoleState, ExportFile, Facet, FilterState, FormField, Location,
    MemoryForm,
};
use ragdash_engine::{ConfigStore, ConsoleSession};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "RAGDASH_LOG";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn app_arg() -> Arg {
    Arg::new("app")
        .long("app")
        .help("Application id; defaults to the first registered one")
}

fn kb_arg() -> Arg {
    Arg::new("kb")
        .long("kb")
        .help("Knowledge-base key; defaults to the first one of the application")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .default_value(".")
        .value_parser(value_parser!(PathBuf))
        .help("Directory to write the export into")
}

fn cli() -> Command {
    Command::new("ragdash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Admin console for a retrieval-augmented-generation platform")
        .arg_required_else_help(true)
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .help("Backend address for this run (not persisted)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file; defaults to $RAGDASH_CONFIG or ./ragdash.toml"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("status")
                .about("Reachability, knowledge bases and recent ingestion of one application")
                .arg(app_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("overview")
                .about("Dashboard totals across every application")
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("kbs")
                .about("List knowledge bases, optionally filtered")
                .arg(app_arg())
                .arg(Arg::new("query").long("query").help("Match name, collection or owner"))
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .action(ArgAction::Append)
                        .help("Facet selection as facet=value (owner, type, access)"),
                ),
        )
        .subcommand(
            Command::new("docs")
                .about("Show the first batch of documents")
                .arg(app_arg())
                .arg(kb_arg())
                .arg(Arg::new("doc").long("doc").help("Show one document in detail")),
        )
        .subcommand(
            Command::new("schema")
                .about("Infer the property schema of a knowledge base")
                .arg(app_arg())
                .arg(kb_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("save-doc")
                .about("Create a document, or update it when --id names an existing one")
                .arg(app_arg())
                .arg(kb_arg())
                .arg(Arg::new("id").long("id").help("Document id"))
                .arg(Arg::new("text").long("text").help("Primary text"))
                .arg(
                    Arg::new("properties")
                        .long("properties")
                        .help("Properties as a JSON object"),
                ),
        )
        .subcommand(
            Command::new("delete-doc")
                .about("Delete a document")
                .arg(app_arg())
                .arg(kb_arg())
                .arg(Arg::new("id").long("id").required(true).help("Document id")),
        )
        .subcommand(
            Command::new("stores")
                .about("Health of the backing stores")
                .arg(
                    Arg::new("export")
                        .long("export")
                        .action(ArgAction::SetTrue)
                        .help("Also write the cards as JSON"),
                )
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("export-ingestion")
                .about("Write the ingestion logs of an application as JSON")
                .arg(app_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("push-memory")
                .about("Push a session history into memory")
                .arg(app_arg())
                .arg(Arg::new("wallet").long("wallet").default_value(""))
                .arg(Arg::new("session").long("session").default_value(""))
                .arg(Arg::new("file").long("file").default_value(""))
                .arg(Arg::new("description").long("description").default_value(""))
                .arg(Arg::new("threshold").long("threshold").default_value("")),
        )
        .subcommand(
            Command::new("set-base")
                .about("Persist a new backend address and reload")
                .arg(Arg::new("url").required(true)),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let store = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::from_env(),
    };
    let mut config = store.load()?.with_env_overrides();
    if let Some(url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(url.clone());
    }
    let api = Arc::new(HttpClient::with_timeout(&config.base_url, config.timeout())?);
    let session = ConsoleSession::new(api, config).with_store(store);

    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };
    let session = match args.try_get_one::<String>("app") {
        Ok(app) => session.with_location(Location {
            app_id: app.cloned(),
        }),
        Err(_) => session,
    };

    match name {
        "status" => status(&session, args).await,
        "overview" => overview(&session, args).await,
        "kbs" => kbs(&session, args).await,
        "docs" => docs(&session, args).await,
        "schema" => schema(&session, args).await,
        "save-doc" => save_doc(&session, args).await,
        "delete-doc" => delete_doc(&session, args).await,
        "stores" => stores(&session, args).await,
        "export-ingestion" => export_ingestion(&session, args).await,
        "push-memory" => push_memory(&session, args).await,
        "set-base" => {
            let url = args.get_one::<String>("url").context("url is required")?;
            session.set_base_url(url).await?;
            println!("base address saved: {}", url.trim());
            println!("source: {:?}", session.state().source());
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn status(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    session.refresh().await;
    let state = session.state();
    let snapshot = state.snapshot();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!("source: {:?}", snapshot.source);
    match &snapshot.app {
        Some(app) => println!(
            "app: {} ({}{})",
            app.app_id,
            app.status_label(),
            if app.has_plugin { ", plugin" } else { "" }
        ),
        None => println!("app: -"),
    }
    println!("vectors: {}", snapshot.total_vectors);
    println!();
    print_kbs(snapshot.knowledge_bases.iter());
    println!();
    println!("recent ingestion:");
    for entry in &snapshot.ingestion {
        println!("  {:<24} {:<20} {}", entry.title, entry.time, entry.meta);
    }
    Ok(())
}

async fn overview(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    let overview = session.overview().await;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }
    println!("source: {:?}", overview.source);
    println!(
        "applications: {} ({} active)",
        overview.apps.len(),
        overview.active_apps()
    );
    println!("knowledge bases: {}", overview.knowledge_bases.len());
    println!("vectors: {}", overview.total_vectors);
    for entry in &overview.ingestion {
        println!("  {:<24} {:<20} {}", entry.title, entry.time, entry.meta);
    }
    Ok(())
}

async fn kbs(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    session.refresh().await;
    if let Some(query) = args.get_one::<String>("query") {
        session.set_query(query.clone()).await;
    }
    let mut filters = FilterState::new();
    for pair in args.get_many::<String>("filter").into_iter().flatten() {
        let Some((facet, value)) = pair.split_once('=') else {
            bail!("filter `{pair}` is not facet=value");
        };
        let facet: Facet = facet.parse().map_err(anyhow::Error::msg)?;
        filters = filters.with(facet, value);
    }
    session.set_filters(filters).await;
    print_kbs(session.visible_kbs().iter());
    Ok(())
}

fn print_kbs<'a>(kbs: impl Iterator<Item = &'a ragdash_core::KnowledgeBaseView>) {
    println!(
        "{:<28} {:>8} {:>8} {:<12} {:<10} {}",
        "knowledge base", "docs", "chunks", "type", "access", "collection"
    );
    for kb in kbs {
        println!(
            "{:<28} {:>8} {:>8} {:<12} {:<10} {}",
            kb.id,
            kb.docs.to_string(),
            kb.chunks.to_string(),
            kb.kb_type,
            kb.access.as_str(),
            kb.collection
        );
    }
}

/// Reload, then switch to the requested knowledge base when one is named
async fn open_kb(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<ConsoleState> {
    session.refresh().await;
    if let Some(key) = args.get_one::<String>("kb") {
        let state = session.state();
        let app_id = state.snapshot().app_id().context("no application selected")?;
        let id = kb_id(app_id, key);
        if state.snapshot().knowledge_base(&id).is_none() {
            bail!("knowledge base {id} not found");
        }
        session.select_kb(&id).await;
    }
    let state = session.state();
    if state.docs().kb().is_none() {
        bail!("no knowledge base to open");
    }
    Ok(state)
}

async fn docs(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    let state = open_kb(session, args).await?;
    if let Some(hint) = state.docs().hint() {
        eprintln!("{hint}");
    }

    if let Some(doc_id) = args.get_one::<String>("doc") {
        session.select_doc(doc_id).await;
        let state = session.state();
        if state.docs().selected().is_none() {
            bail!("document {doc_id} is not in the loaded batch");
        }
        let drawer = state.docs().drawer();
        println!("{}: {}", drawer.title, drawer.doc_id);
        println!("created: {}  updated: {}", drawer.created_at, drawer.updated_at);
        for field in drawer.fields {
            let marker = if field.primary { "*" } else { " " };
            println!("{marker} {:<20} {:<8} {}", field.name, field.kind.as_str(), field.example);
        }
        return Ok(());
    }

    let batch = state.docs().batch();
    println!("{} of {} documents", batch.items.len(), batch.total);
    println!("{}", batch.columns.join(" | "));
    for doc in &batch.items {
        let row: Vec<String> = batch
            .columns
            .iter()
            .map(|column| match column.as_str() {
                "id" => doc.id.clone(),
                key => render_cell(doc.properties.get(key)),
            })
            .collect();
        println!("{}", row.join(" | "));
    }
    Ok(())
}

async fn schema(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    open_kb(session, args).await?;
    let fields = session.schema().await?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }
    if fields.is_empty() {
        println!("no properties found");
    }
    for field in fields {
        println!("{:<24} {:<24} {}", field.name, field.kinds_label(), field.example);
    }
    Ok(())
}

async fn save_doc(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    let state = open_kb(session, args).await?;
    let id = args.get_one::<String>("id");

    match id.filter(|id| state.docs().batch().get(id).is_some()) {
        Some(id) => session.select_doc(id).await,
        None => {
            session.open_new_doc().await;
            if let Some(id) = id {
                session.edit_form(FormField::Id, id.clone()).await;
            }
        }
    }
    if let Some(text) = args.get_one::<String>("text") {
        session.edit_form(FormField::Text, text.clone()).await;
    }
    if let Some(properties) = args.get_one::<String>("properties") {
        session.edit_form(FormField::Properties, properties.clone()).await;
    }
    session.submit_document().await;
    mutation_outcome(session)
}

async fn delete_doc(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    open_kb(session, args).await?;
    let id = args.get_one::<String>("id").context("id is required")?;
    session.select_doc(id).await;
    session.delete_document().await;
    mutation_outcome(session)
}

fn mutation_outcome(session: &ConsoleSession) -> anyhow::Result<()> {
    let state = session.state();
    match state.docs().hint() {
        Some(hint) if hint.starts_with("document ") => {
            println!("{hint}");
            Ok(())
        }
        Some(hint) => bail!("{hint}"),
        None => bail!("no outcome recorded"),
    }
}

async fn stores(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    let view = session.load_stores().await;
    if let Some(hint) = &view.hint {
        eprintln!("{hint}");
    }
    println!("{}", view.summary());
    for card in &view.cards {
        println!(
            "{:<16} {:<12} {:<8} {}",
            card.name,
            card.status_label(),
            card.latency,
            card.description
        );
    }
    if args.get_flag("export") {
        write_export(&session.export_stores().await?, args)?;
    }
    Ok(())
}

async fn export_ingestion(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    session.refresh().await;
    let file = session.export_ingestion().await?;
    write_export(&file, args)
}

fn write_export(file: &ExportFile, args: &ArgMatches) -> anyhow::Result<()> {
    let dir = args
        .get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(&file.file_name);
    std::fs::write(&path, &file.contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "export written");
    println!("{}", path.display());
    Ok(())
}

async fn push_memory(session: &ConsoleSession, args: &ArgMatches) -> anyhow::Result<()> {
    session.refresh().await;
    let field = |name: &str| args.get_one::<String>(name).cloned().unwrap_or_default();
    let app_id = session
        .state()
        .snapshot()
        .app_id()
        .map(str::to_string)
        .unwrap_or_default();

    let form = MemoryForm {
        wallet_id: field("wallet"),
        session_id: field("session"),
        filename: field("file"),
        description: field("description"),
        summary_threshold: field("threshold"),
        ..MemoryForm::for_app(app_id)
    };
    let response = session.push_memory(&form).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
