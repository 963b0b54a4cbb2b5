use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::ContentKind;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 服务端配置 ---
    /// API 根地址
    pub api_base_url: String,
    /// 目标职位 ID（所有文件都提交到这里）
    pub job_id: String,
    /// 会话 Cookie，原样放入请求头
    pub session_cookie: Option<String>,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 校验策略 ---
    /// 允许的文件类型
    pub allowed_kinds: Vec<String>,
    /// 单个文件大小上限（字节）
    pub max_bytes: u64,
    // --- 本地文件 ---
    /// 待上传文件所在目录
    pub upload_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败记录文件
    pub failure_log_file: String,
    /// 报告 JSON 文件（可选）
    pub report_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001/api".to_string(),
            job_id: String::new(),
            session_cookie: None,
            request_timeout_secs: 60,
            allowed_kinds: vec![ContentKind::PDF.to_string()],
            max_bytes: 10 * 1024 * 1024,
            upload_folder: "resumes".to_string(),
            output_log_file: "output.txt".to_string(),
            failure_log_file: "failed.txt".to_string(),
            report_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，缺失或无法解析的值使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，文件中缺失的字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::ParseFailed {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 读取 `CONFIG_FILE` 指定的文件（如果有），再叠加环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            job_id: std::env::var("JOB_ID").unwrap_or(self.job_id),
            session_cookie: std::env::var("SESSION_COOKIE").ok().or(self.session_cookie),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            allowed_kinds: std::env::var("ALLOWED_KINDS").ok().map(|v| split_list(&v)).unwrap_or(self.allowed_kinds),
            max_bytes: std::env::var("MAX_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_bytes),
            upload_folder: std::env::var("UPLOAD_FOLDER").unwrap_or(self.upload_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            failure_log_file: std::env::var("FAILURE_LOG_FILE").unwrap_or(self.failure_log_file),
            report_file: std::env::var("REPORT_FILE").ok().or(self.report_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.allowed_kinds.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "allowed_kinds".to_string(),
                reason: "至少需要一个允许的文件类型".to_string(),
            }
            .into());
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                reason: "必须大于 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
