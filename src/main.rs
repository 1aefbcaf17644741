#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::str::FromStr;

use anyhow::Error;
use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;

use crate::application::chat;
use crate::application::cli;
use crate::application::cli::Launch;
use crate::application::tool;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ConversationSession;
use crate::domain::models::GatewayName;
use crate::domain::models::Locale;
use crate::domain::models::SharedGateway;
use crate::domain::services::ConversationController;
use crate::domain::services::TaskController;
use crate::infrastructure::gateways::GatewayManager;

fn handle_error(err: Error) -> ! {
    let text = format!(
        "Oh no! seo-consultant has failed with the following app version and error.\n\nVersion: {}\nError: {}",
        env!("CARGO_PKG_VERSION"),
        err
    );
    eprintln!(
        "{}",
        text.if_supports_color(Stream::Stderr, |e| return e.red())
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if !env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("seo_consultant")
    {
        return None;
    }

    let log_path = cli::log_path();
    let log_dir = log_path
        .parent()
        .map(|e| return e.to_path_buf())
        .unwrap_or_else(|| return env::temp_dir());

    let file_appender = tracing_appender::rolling::never(log_dir, "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(writer)
        .init();

    return Some(guard);
}

async fn gateway() -> Result<SharedGateway> {
    let name = GatewayName::from_str(&Config::get(ConfigKey::Gateway))?;
    let gateway = GatewayManager::get(name)?;

    if let Err(err) = gateway.health_check().await {
        tracing::warn!(gateway = %gateway.name(), err = ?err, "Gateway health check failed");
        eprintln!(
            "{}",
            format!("Warning: {err}. Replies may fall back to an error message.")
                .if_supports_color(Stream::Stderr, |e| return e.yellow())
        );
    }

    return Ok(gateway);
}

async fn launch(target: Launch) -> Result<()> {
    let locale = Locale::from_str(&Config::get(ConfigKey::Locale))?;

    match target {
        Launch::Chat => {
            let controller = ConversationController::with_session(
                gateway().await?,
                locale,
                ConversationSession::with_greeting(locale),
            );
            return chat::start(controller).await;
        }
        Launch::Tool(options) => {
            let controller = TaskController::new(gateway().await?, locale);
            return tool::run(controller, options).await;
        }
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let log_guard = init_logging();

    let ready = match cli::parse().await {
        Ok(ready) => ready,
        Err(err) => handle_error(err),
    };

    if let Some(ready) = ready {
        if let Err(err) = launch(ready).await {
            handle_error(err);
        }
    }

    drop(log_guard);
    process::exit(0);
}
