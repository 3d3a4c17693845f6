mod action;
mod api;
mod app;
pub mod cli;
mod components;
mod config;
mod errors;
mod logging;
mod pages;
mod tui;

use std::sync::Arc;

use color_eyre::{eyre::WrapErr, Result};
use tracing::{info, warn};

use club_core::{
    session::LoginData,
    store::{load_json, JsonFileStore, KeyValueStore, RecentClubs},
    InterestCatalog, Session,
};

use crate::{
    app::{App, SESSION_KEY},
    cli::{Cli, Cmd},
    config::Config,
    pages::Context,
};

pub async fn run(cli: Cli) -> Result<()> {
    crate::errors::init()?;
    let config = Config::new().wrap_err("loading configuration")?;
    let _guard = crate::logging::init(&config.config.data_dir)?;
    info!(endpoint = %config.api_endpoint, "starting");

    let store: Arc<dyn KeyValueStore> =
        Arc::new(JsonFileStore::new(config.config.data_dir.join("store")));

    match cli.cmd {
        Cmd::Run { screen } => {
            let session = Session::new();
            if let Some(data) = load_json::<LoginData>(store.as_ref(), SESSION_KEY) {
                session.login_with(&data);
                if !session.is_authenticated() {
                    warn!("stored session has expired");
                }
            }
            let catalog = InterestCatalog::embedded().wrap_err("reading the interest catalog")?;
            let ctx = Context {
                config,
                session,
                store,
                catalog: Arc::new(catalog),
            };
            let mut app = App::new(ctx, screen.route())?;
            app.run().await?;
        }
        Cmd::Recent => {
            let clubs = RecentClubs::new(store.as_ref()).load();
            println!("{}", serde_json::to_string_pretty(&clubs)?);
        }
        Cmd::Logout => {
            store.remove(SESSION_KEY)?;
            println!("Signed out.");
        }
    }
    Ok(())
}
