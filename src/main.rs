use crate::{api::ApiClient, api::AuthSession, app::App, config::Config, live_query::LiveQueryClient};
use anyhow::Context;
use egui::{FontDefinitions, ViewportBuilder};
use std::sync::Arc;

mod actions;
mod api;
mod app;
mod chat;
mod components;
mod config;
mod live_query;
mod pages;
mod theme;
mod trace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env().context("failed to read configuration")?;
    log::info!(
        "starting agentdash against {} (streaming: {})",
        config.api_url,
        config.streaming
    );

    let auth = Arc::new(AuthSession::new(config.token.clone()));
    let api_client = ApiClient::new(&config.api_url, Arc::clone(&auth));

    let opts = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_app_id("agentdash"),
        ..Default::default()
    };

    eframe::run_native(
        "agentdash",
        opts,
        Box::new(move |cc| {
            let mut fonts = FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            theme::apply(&cc.egui_ctx);

            let live_query = LiveQueryClient::new(api_client);
            Ok(Box::new(App::new(config, auth, live_query)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("eframe exited with an error: {err}"))
}
