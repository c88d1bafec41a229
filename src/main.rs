//! `folio` - portfolio chat assistant
//!
//! Serves the `/api/chat` endpoint for the portfolio site and offers a
//! terminal rendering of the chat widget for trying the assistant locally.

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::Style;
use std::path::PathBuf;
use folio_core::config::Config;
use folio_core::llm::build_system_prompt;
use folio_core::template::TemplateResponder;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::{BackendArgs, Cli, Commands};
use crate::output::OutputFormatter;

mod app;
mod cli;
mod connectivity;
mod output;
mod server;
mod terminal;

/// Install the tracing subscriber. `RUST_LOG` wins over the config level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("folio={0},tower_http={0}", default_level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.version {
        let blue = Style::new().blue();
        println!(
            "{} v{} ({} {})",
            blue.apply_to("folio"),
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH"),
            env!("GIT_COMMIT_DATE")
        );
        return Ok(());
    }

    if let Some(Commands::Init { path, force }) = &cli.command {
        return write_default_config(path.clone(), *force);
    }

    let app = App::load(cli.config.as_deref(), cli.profile.as_deref())?;
    folio_core::logger::init(app.config.logging.level, app.config.logging.file.clone());

    // keep the interactive chat readable unless asked otherwise
    let console_level = match &cli.command {
        Some(Commands::Serve { .. }) => app.config.logging.level.as_str(),
        _ => "warn",
    };
    init_tracing(console_level);

    let formatter = OutputFormatter::new();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            let mut config = app.config.clone();
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::run(&config, &app.profile).await?;
        }

        Some(Commands::Chat { backend, collapsed }) => {
            run_chat(&app, &backend, collapsed).await?;
        }

        None => {
            run_chat(&app, &BackendArgs::default(), false).await?;
        }

        Some(Commands::Ask { question, backend }) => {
            let question = question.join(" ");
            let service = app.service(app.backend(&backend)?)?;
            service.network().probe().await;

            let response = service.generate_response(&question, 0).await;
            formatter.print_response(&app.profile.name, &response);
            if !response.is_success() {
                std::process::exit(1);
            }
        }

        Some(Commands::Template { question }) => {
            let responder = TemplateResponder::new(app.profile.clone());
            let (rule, reply) = responder.respond_with_rule(&question.join(" "));
            println!("{}", reply);
            println!("{}", Style::new().dim().apply_to(format!("rule: {}", rule)));
        }

        Some(Commands::Profile { prompt }) => {
            let context = app.profile.context();
            if prompt {
                println!("{}", build_system_prompt(&context));
            } else {
                formatter.print_profile(&context);
            }
        }

        // written before the config was loaded
        Some(Commands::Init { .. }) => {}
    }

    Ok(())
}

fn write_default_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(Config::default_path) {
        Some(path) => path,
        None => bail!("Could not determine the config directory; pass a path"),
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    OutputFormatter::new().print_success(&format!("Wrote {}", path.display()));
    Ok(())
}

async fn run_chat(app: &App, backend: &BackendArgs, collapsed: bool) -> Result<()> {
    let service = app.service(app.backend(backend)?)?;
    terminal::run(service, app.profile.name.clone(), collapsed).await
}
