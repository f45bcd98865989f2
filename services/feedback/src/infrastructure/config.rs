/// フィードバック受付Lambdaの設定
///
/// コールドスタート時に環境変数から一度だけ読み込む。
use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;

/// 添付ファイルURLの既定有効期限（24時間）
pub const DEFAULT_ATTACHMENT_URL_TTL_SECS: u64 = 24 * 60 * 60;

/// 添付ファイルの既定サイズ上限（5 MiB）
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// 署名付きURLの有効期限上限（S3の仕様で7日）
const MAX_ATTACHMENT_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// 設定読み込みのエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// フィードバック受付Lambdaの設定
///
/// 環境変数:
/// - TABLE_NAME: フィードバック保存用DynamoDBテーブル名（必須）
/// - BUCKET_NAME: 添付ファイル保存用S3バケット名（必須）
/// - ADMIN_EMAIL: 通知先の管理者アドレス（必須）
/// - SENDER_EMAIL: 送信元アドレス（デフォルト: ADMIN_EMAIL）
/// - REGION: AWSリージョン（デフォルト: SDKの既定チェーン）
/// - ALLOWED_ORIGIN: CORSで許可するオリジン（デフォルト: *）
/// - ATTACHMENT_URL_TTL_SECS: 添付ファイルURLの有効期限秒数（デフォルト: 86400）
/// - MAX_ATTACHMENT_BYTES: 添付ファイルのサイズ上限（デフォルト: 5242880）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackConfig {
    table_name: String,
    bucket_name: String,
    admin_email: String,
    sender_email: String,
    region: Option<String>,
    allowed_origin: String,
    attachment_url_ttl: Duration,
    max_attachment_bytes: usize,
}

impl FeedbackConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を読み込む
    ///
    /// 空文字（空白のみ）の値は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let table_name = require("TABLE_NAME")?;
        let bucket_name = require("BUCKET_NAME")?;
        let admin_email = require("ADMIN_EMAIL")?;
        let sender_email = get("SENDER_EMAIL").unwrap_or_else(|| admin_email.clone());
        let region = get("REGION");
        let allowed_origin = get("ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string());

        let ttl_secs = parse_number(
            "ATTACHMENT_URL_TTL_SECS",
            get("ATTACHMENT_URL_TTL_SECS"),
            DEFAULT_ATTACHMENT_URL_TTL_SECS,
        )?;
        if ttl_secs == 0 || ttl_secs > MAX_ATTACHMENT_URL_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "ATTACHMENT_URL_TTL_SECS".to_string(),
                value: ttl_secs.to_string(),
            });
        }

        let max_attachment_bytes = parse_number(
            "MAX_ATTACHMENT_BYTES",
            get("MAX_ATTACHMENT_BYTES"),
            DEFAULT_MAX_ATTACHMENT_BYTES,
        )?;

        Ok(Self {
            table_name,
            bucket_name,
            admin_email,
            sender_email,
            region,
            allowed_origin,
            attachment_url_ttl: Duration::from_secs(ttl_secs),
            max_attachment_bytes,
        })
    }

    /// 設定されたリージョンでAWS SDK設定を読み込む
    pub async fn load_aws_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        loader.load().await
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    pub fn attachment_url_ttl(&self) -> Duration {
        self.attachment_url_ttl
    }

    pub fn max_attachment_bytes(&self) -> usize {
        self.max_attachment_bytes
    }
}

fn parse_number<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
