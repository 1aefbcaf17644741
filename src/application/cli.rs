use std::io;
use std::path;
use std::str::FromStr;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::tool::ToolOptions;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::GatewayName;
use crate::domain::models::Locale;
use crate::domain::models::TaskType;

/// What `main` should run once arguments and configuration are loaded.
pub enum Launch {
    Chat,
    Tool(ToolOptions),
}

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /quit /exit (/q) - Leave the chat.

TASKS:
- analyze - SEO diagnosis: keywords, sentiment, readability and three indexing improvements.
- title - Five high-CTR, SEO friendly titles for an article or keyword list.
- rewrite - A unique, crawler friendly rewrite of a passage.
        "#;

    return text.trim().to_string();
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

pub fn log_path() -> path::PathBuf {
    if let Ok(dir) = std::env::var("SEO_CONSULTANT_LOG_DIR") {
        return path::PathBuf::from(dir).join("debug.log");
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("seo-consultant/debug.log");
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for seo-consultant")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running with environment variable RUST_LOG=seo_consultant")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start a new chat with the consultant.");
}

fn subcommand_tool() -> Command {
    return Command::new("tool")
        .about("Run a one-shot SEO task and print the result.")
        .arg(
            Arg::new("task")
                .short('t')
                .long("task")
                .help("Which task to run.")
                .num_args(1)
                .required(true)
                .value_parser(PossibleValuesParser::new(TaskType::VARIANTS)),
        )
        .arg(
            Arg::new("content")
                .long("content")
                .help("Article, keywords or passage to work on. Read from stdin when omitted.")
                .num_args(1),
        )
        .arg(
            Arg::new("copy")
                .long("copy")
                .help("Also copy the result to the clipboard.")
                .action(ArgAction::SetTrue),
        );
}

fn tool_options(matches: &clap::ArgMatches) -> Result<ToolOptions> {
    let task = match matches.get_one::<String>("task") {
        Some(task) => TaskType::from_str(task)?,
        None => bail!("A task is required"),
    };

    return Ok(ToolOptions {
        task_type: task,
        content: matches.get_one::<String>("content").cloned(),
        copy: matches.get_flag("copy"),
    });
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("seo-consultant")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(help_text())
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_tool())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("SEO_CONSULTANT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Gateway.to_string())
                .short('g')
                .long(ConfigKey::Gateway.to_string())
                .env("SEO_CONSULTANT_GATEWAY")
                .num_args(1)
                .help(format!("Gateway used to reach the language model. [default: {}]", Config::default(ConfigKey::Gateway)))
                .value_parser(PossibleValuesParser::new(GatewayName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GatewayHealthCheckTimeout.to_string())
                .long(ConfigKey::GatewayHealthCheckTimeout.to_string())
                .env("SEO_CONSULTANT_GATEWAY_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when doing a healthcheck for a gateway. [default: {}]", Config::default(ConfigKey::GatewayHealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiToken.to_string())
                .long(ConfigKey::GeminiToken.to_string())
                .env("SEO_CONSULTANT_GEMINI_TOKEN")
                .num_args(1)
                .help("Gemini API token.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiURL.to_string())
                .long(ConfigKey::GeminiURL.to_string())
                .env("SEO_CONSULTANT_GEMINI_URL")
                .num_args(1)
                .help(format!("Gemini API URL. [default: {}]", Config::default(ConfigKey::GeminiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Locale.to_string())
                .short('l')
                .long(ConfigKey::Locale.to_string())
                .env("SEO_CONSULTANT_LOCALE")
                .num_args(1)
                .help(format!("Language used for greetings and error messages. [default: {}]", Config::default(ConfigKey::Locale)))
                .value_parser(PossibleValuesParser::new(Locale::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("SEO_CONSULTANT_MODEL")
                .num_args(1)
                .help(format!("Model identifier sent to the gateway. [default: {}]", Config::default(ConfigKey::Model)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("SEO_CONSULTANT_REQUEST_TIMEOUT")
                .num_args(1)
                .help("Time to wait in milliseconds for a single gateway request. No timeout when empty. Also bounds reading a streamed reply, so a slow reply past this limit is cut off.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SystemInstruction.to_string())
                .long(ConfigKey::SystemInstruction.to_string())
                .env("SEO_CONSULTANT_SYSTEM_INSTRUCTION")
                .num_args(1)
                .help("Behavioural instruction sent with every chat turn. Defaults to the Spider-Pool sales consultant.")
                .global(true),
        );
}

pub async fn parse() -> Result<Option<Launch>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("tool", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Launch::Tool(tool_options(subcmd_matches)?)));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(Launch::Chat));
}
