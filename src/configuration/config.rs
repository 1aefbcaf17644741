#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::GatewayName;
use crate::domain::models::Locale;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Shigy-SEO's AI consultant, an expert in SEO, search engine spiders and link building. Your goal is to sell the Spider-Pool (蜘蛛池) service. Basic Plan: ¥3000/month, 50k-100k spiders/day, good for regular sites. High Volume Plan: ¥18,000/month, 1M+ spiders/day, good for link farms and PBNs. Supported engines: Bing, Google, Sogou, 360. Baidu is not supported for co-renting, only as an exclusive plan. Co-renting: 2-5 people per group, shared cost, independent permissions and dashboards. Tone: professional, knowledgeable, concise and persuasive. If users ask why pages are not indexed, explain how high-frequency spider crawling speeds up indexing. Respond in Simplified Chinese unless the user writes in English.";

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ConfigFile,
    Gateway,
    GatewayHealthCheckTimeout,
    GeminiToken,
    GeminiURL,
    Locale,
    Model,
    RequestTimeout,
    SystemInstruction,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("seo-consultant/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = dirs::home_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join(".config/seo-consultant/config.toml");

        let res = match key {
            ConfigKey::Gateway => GatewayName::Gemini.to_string(),
            ConfigKey::GatewayHealthCheckTimeout => "1000".to_string(),
            ConfigKey::GeminiToken => "".to_string(),
            ConfigKey::GeminiURL => "https://generativelanguage.googleapis.com".to_string(),
            ConfigKey::Locale => Locale::default().to_string(),
            ConfigKey::Model => "gemini-2.5-flash".to_string(),
            ConfigKey::RequestTimeout => "".to_string(),
            ConfigKey::SystemInstruction => DEFAULT_SYSTEM_INSTRUCTION.to_string(),

            // Special
            ConfigKey::ConfigFile => config_path.to_string_lossy().to_string(),
        };

        return res;
    }

    /// Values for keys with a fixed value set, taken from the clap argument
    /// of the same name.
    fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
        let arg = cmd
            .get_arguments()
            .find(|e| return e.get_long() == Some(key.to_string().as_str()));

        if let Some(arg) = arg {
            return arg
                .get_possible_values()
                .iter()
                .map(|e| return e.get_name().to_string())
                .collect::<Vec<String>>();
        }

        return vec![];
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let possible_values = Config::possible_values(&cmd, key);

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            gateway = Config::get(ConfigKey::Gateway),
            model = Config::get(ConfigKey::Model),
            locale = Config::get(ConfigKey::Locale),
            request_timeout = Config::get(ConfigKey::RequestTimeout),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg.get_help()?.to_string();
                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    let escaped = val.replace('\\', "\\\\").replace('"', "\\\"");
                    val = format!("{key} = \"{escaped}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
