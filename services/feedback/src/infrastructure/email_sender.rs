//! メール送信モジュール
//!
//! SES v2を使用して管理者宛ての通知メールを送信する。
//! 送信元アドレスはSESで検証済みのIDである必要がある。

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::NotificationEmail;

const CHARSET: &str = "UTF-8";

/// メール送信のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmailSenderError {
    /// メッセージの組み立てに失敗
    #[error("メッセージ構築エラー: {0}")]
    BuildError(String),
    /// SES APIエラー
    #[error("AWS SES APIエラー: {0}")]
    SendError(String),
}

/// メール送信トレイト（テスト用の抽象化）
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// 通知メールを送信する
    ///
    /// # 戻り値
    /// * `Ok(String)` - SESが払い出したメッセージID
    /// * `Err(EmailSenderError)` - エラー
    async fn send(&self, email: &NotificationEmail) -> Result<String, EmailSenderError>;
}

/// SES v2を使用したメール送信実装
#[derive(Debug, Clone)]
pub struct SesEmailSender {
    client: SesClient,
}

impl SesEmailSender {
    pub fn new(client: SesClient) -> Self {
        Self { client }
    }

    fn content(data: &str) -> Result<Content, EmailSenderError> {
        Content::builder()
            .data(data)
            .charset(CHARSET)
            .build()
            .map_err(|e| EmailSenderError::BuildError(e.to_string()))
    }

    /// NotificationEmailをSESのシンプルメッセージに変換する
    fn build_content(email: &NotificationEmail) -> Result<EmailContent, EmailSenderError> {
        let body = Body::builder()
            .html(Self::content(&email.html_body)?)
            .text(Self::content(&email.text_body)?)
            .build();

        let message = Message::builder()
            .subject(Self::content(&email.subject)?)
            .body(body)
            .build();

        Ok(EmailContent::builder().simple(message).build())
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send(&self, email: &NotificationEmail) -> Result<String, EmailSenderError> {
        let content = Self::build_content(email)?;
        let destination = Destination::builder()
            .set_to_addresses(Some(email.to.clone()))
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&email.from)
            .destination(destination)
            .content(content)
            .send()
            .await;

        match result {
            Ok(output) => {
                let message_id = output.message_id().unwrap_or("unknown").to_string();
                info!(message_id = %message_id, recipients = email.to.len(), "SES SendEmail成功");
                Ok(message_id)
            }
            Err(err) => {
                let detail = DisplayErrorContext(&err).to_string();
                warn!(error = %detail, "SES SendEmailエラー");
                Err(EmailSenderError::SendError(detail))
            }
        }
    }
}
