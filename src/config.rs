use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout: Duration,
    pub data_file: PathBuf,
    pub cache_ttl: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or("GROQ_API_KEY not found. Set it in the environment or in .env")?;

        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let llm_model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let llm_temperature: f32 = std::env::var("LLM_TEMPERATURE")
            .unwrap_or_else(|_| "0.7".to_string())
            .parse()
            .unwrap_or(0.7);
        let llm_timeout = Duration::from_secs(
            std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
        );

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let data_file = base_dir.join(
            std::env::var("DATA_FILE").unwrap_or_else(|_| "data/reviews.csv".to_string()),
        );
        let cache_ttl = Duration::from_secs(
            std::env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        );

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8501".to_string())
            .parse()
            .unwrap_or(8501);

        Ok(Self {
            api_key,
            llm_base_url,
            llm_model,
            llm_temperature,
            llm_timeout,
            data_file,
            cache_ttl,
            host,
            port,
        })
    }

    /// Configuration for a store at `data_file` with every other value at its default.
    pub fn with_data_file(data_file: impl Into<PathBuf>) -> Self {
        Self {
            api_key: String::new(),
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            llm_temperature: 0.7,
            llm_timeout: Duration::from_secs(120),
            data_file: data_file.into(),
            cache_ttl: Duration::from_secs(30),
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}
