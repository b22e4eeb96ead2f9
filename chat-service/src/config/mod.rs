use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

const DEFAULT_BAIDU_OAUTH_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";
const DEFAULT_BAIDU_CHAT_URL: &str =
    "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/yi_34b_chat";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub baidu: BaiduConfig,
    pub llama: LlamaConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    /// Holds the `sessions` and `messages` collections.
    pub chat_database: String,
    /// Holds the imported `products` collection.
    pub product_database: String,
}

/// Credentials and endpoints for the hosted chat completion API.
#[derive(Debug, Clone)]
pub struct BaiduConfig {
    pub api_key: String,
    pub secret_key: Secret<String>,
    pub oauth_url: String,
    pub chat_url: String,
}

#[derive(Debug, Clone)]
pub struct LlamaConfig {
    /// Base URL of a llama.cpp server exposing `/completion`.
    pub server_url: String,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub static_dir: PathBuf,
}

impl ChatConfig {
    /// Load configuration. Missing Baidu credentials are always fatal.
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ChatConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                chat_database: get_env("MONGODB_CHAT_DATABASE", Some("chat_db"), is_prod)?,
                product_database: get_env(
                    "MONGODB_PRODUCT_DATABASE",
                    Some("product_db"),
                    is_prod,
                )?,
            },
            baidu: BaiduConfig {
                api_key: get_env("BAIDU_API_KEY", None, is_prod)?,
                secret_key: Secret::new(get_env("BAIDU_SECRET_KEY", None, is_prod)?),
                oauth_url: get_env("BAIDU_OAUTH_URL", Some(DEFAULT_BAIDU_OAUTH_URL), is_prod)?,
                chat_url: get_env("BAIDU_CHAT_URL", Some(DEFAULT_BAIDU_CHAT_URL), is_prod)?,
            },
            llama: LlamaConfig {
                server_url: get_env("LLAMA_SERVER_URL", Some("http://localhost:8081"), is_prod)?,
            },
            web: WebConfig {
                static_dir: PathBuf::from(get_env(
                    "STATIC_DIR",
                    Some("chat-service/static"),
                    is_prod,
                )?),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
