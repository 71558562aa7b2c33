use std::{env, path::PathBuf, sync::Arc};

use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use pagenote_config::config::{self, generate_default_config, get_config, Config, CONFIG_PATH};
use pagenote_core::{
    error::{ErrorContext, PagenoteError},
    identity::AnonymousId,
    router::Router,
    service::FeedbackService,
    summary::{Summarizer, SummarizerConfig},
    PagenoteResult,
};
use pagenote_rest::{Client, ClientConfig, Transport, UreqTransport};
use tracing::{debug, info};
use ureq::Proxy;
use utils::COLOR;

mod cli;
mod commands;
mod logging;
mod utils;

/// Wires the backend client, identity and summarizer into a [`Router`].
fn create_router(
    config: &Config,
    proxy: Option<String>,
    user_agent: Option<String>,
) -> PagenoteResult<Router> {
    let backend = config.backend()?;

    let mut http = ClientConfig {
        user_agent: Some(user_agent.unwrap_or_else(|| config.user_agent().to_string())),
        timeout: config.http_timeout()?,
        ..Default::default()
    };

    if let Some(proxy) = proxy.or_else(|| config.http.proxy.clone()) {
        let parsed = Proxy::new(&proxy)
            .map_err(|err| PagenoteError::Custom(format!("Invalid proxy {proxy}: {err}")))?;
        http.proxy = Some(parsed);
    }

    let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new(&http));
    let client = Client::with_transport(&backend.url, &backend.api_key, Arc::clone(&transport));

    let user_id = AnonymousId::load_or_create(&config.get_state_path())?;
    debug!("Acting as {}", user_id);

    let service = FeedbackService::new(client, backend.table, user_id);
    let summarizer = Summarizer::new(transport, SummarizerConfig::from_config(config));

    Ok(Router::new(service, summarizer))
}

fn set_config_path(path: &str) -> PagenoteResult<()> {
    let path = PathBuf::from(path);
    let path = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .with_context(|| "retrieving current directory".into())?
            .join(path)
    };

    let mut config_path = CONFIG_PATH.write().unwrap();
    *config_path = path;
    Ok(())
}

async fn handle_cli() -> PagenoteResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    if let Some(ref c) = args.config {
        set_config_path(c)?;
    }

    let Args {
        command,
        json,
        proxy,
        user_agent,
        ..
    } = args;

    let router = || -> PagenoteResult<Router> {
        config::init()?;
        create_router(&get_config(), proxy.clone(), user_agent.clone())
    };

    match command {
        Commands::DefConfig => {
            generate_default_config()?;
            info!(
                "Default config written to {}",
                CONFIG_PATH.read().unwrap().display()
            );
        }
        Commands::Config => {
            config::init()?;
            print!("{}", get_config().to_toml()?);
        }
        Commands::Ping => commands::ping(json)?,
        Commands::TestConnection => commands::test_connection(&router()?, json).await?,
        Commands::Save {
            url,
            text,
        } => commands::save(&router()?, url, text, json).await?,
        Commands::List {
            url,
            search,
        } => commands::list(&router()?, url, search, json).await?,
        Commands::Summarize {
            url,
        } => commands::summarize(&router()?, url, json).await?,
        Commands::Route => commands::route(&router()?).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
