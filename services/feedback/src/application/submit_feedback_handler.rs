/// フィードバック送信ハンドラー
///
/// フォームを検証し、添付ファイル保存・レコード保存・通知メール送信を
/// この順に1回ずつ実行する。途中で失敗した場合はそれ以降を実行せず、
/// 既に完了した処理の取り消しも行わない。
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::{
    Attachment, AttachmentError, FeedbackForm, FeedbackId, FeedbackRecord, FormValidationError,
    NotificationEmail, ValidatedFeedback,
};
use crate::infrastructure::config::{DEFAULT_ATTACHMENT_URL_TTL_SECS, DEFAULT_MAX_ATTACHMENT_BYTES};
use crate::infrastructure::{
    AttachmentStore, AttachmentStoreError, EmailSender, EmailSenderError, FeedbackConfig,
    FeedbackRepository, FeedbackRepositoryError,
};

/// フィードバック送信のエラー型
#[derive(Debug, Error)]
pub enum SubmitFeedbackError {
    /// フォームの検証エラー
    #[error(transparent)]
    Validation(#[from] FormValidationError),
    /// 添付ファイルのデコードエラー
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    /// 添付ファイルの保存エラー
    #[error("attachment storage failed: {0}")]
    Storage(#[from] AttachmentStoreError),
    /// レコード保存エラー
    #[error("feedback persistence failed: {0}")]
    Repository(#[from] FeedbackRepositoryError),
    /// 通知メール送信エラー
    #[error("notification email failed: {0}")]
    Email(#[from] EmailSenderError),
}

impl SubmitFeedbackError {
    /// 送信者側の入力に起因するエラーかどうか（HTTP 400相当）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SubmitFeedbackError::Validation(_) | SubmitFeedbackError::Attachment(_)
        )
    }
}

/// 送信処理の設定値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    /// 通知メールの送信元
    pub sender_email: String,
    /// 通知メールの宛先
    pub admin_email: String,
    /// 添付ファイルURLの有効期限
    pub attachment_url_ttl: Duration,
    /// 添付ファイルのサイズ上限
    pub max_attachment_bytes: usize,
}

impl SubmissionSettings {
    /// 管理者アドレスのみ指定し、その他は既定値で作成
    pub fn new(admin_email: impl Into<String>) -> Self {
        let admin_email = admin_email.into();
        Self {
            sender_email: admin_email.clone(),
            admin_email,
            attachment_url_ttl: Duration::from_secs(DEFAULT_ATTACHMENT_URL_TTL_SECS),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self {
            sender_email: config.sender_email().to_string(),
            admin_email: config.admin_email().to_string(),
            attachment_url_ttl: config.attachment_url_ttl(),
            max_attachment_bytes: config.max_attachment_bytes(),
        }
    }
}

/// 送信完了時の受領情報
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub feedback_id: FeedbackId,
    pub attachment_key: Option<String>,
    /// SESのメッセージID
    pub email_message_id: String,
}

/// フィードバック送信ハンドラー
pub struct SubmitFeedbackHandler<R, S, M>
where
    R: FeedbackRepository,
    S: AttachmentStore,
    M: EmailSender,
{
    repository: R,
    attachment_store: S,
    email_sender: M,
    settings: SubmissionSettings,
}

impl<R, S, M> SubmitFeedbackHandler<R, S, M>
where
    R: FeedbackRepository,
    S: AttachmentStore,
    M: EmailSender,
{
    pub fn new(
        repository: R,
        attachment_store: S,
        email_sender: M,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            repository,
            attachment_store,
            email_sender,
            settings,
        }
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// フォーム送信を処理する
    ///
    /// # 処理フロー
    /// 1. フォームを検証し、添付ファイルをデコード（ここまでは副作用なし）
    /// 2. 添付ファイルをアップロードして期限付きURLを発行
    /// 3. フィードバックレコードを保存
    /// 4. 管理者へ通知メールを送信
    pub async fn handle(
        &self,
        form: FeedbackForm,
    ) -> Result<SubmissionReceipt, SubmitFeedbackError> {
        let feedback = form.validate()?;
        let attachment = feedback
            .file_base64
            .as_deref()
            .map(|data| Attachment::from_base64(data, self.settings.max_attachment_bytes))
            .transpose()?;

        self.submit(feedback, attachment, FeedbackId::generate(), Utc::now())
            .await
    }

    /// 検証済みの入力を保存・通知する
    pub async fn submit(
        &self,
        feedback: ValidatedFeedback,
        attachment: Option<Attachment>,
        feedback_id: FeedbackId,
        submitted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, SubmitFeedbackError> {
        let (attachment_key, attachment_url) = match attachment {
            Some(attachment) => {
                let key = attachment.object_key(&feedback_id);
                let size = attachment.len();
                let (bytes, media_type) = attachment.into_parts();

                self.attachment_store.put(&key, bytes, &media_type).await?;
                let url = self
                    .attachment_store
                    .presigned_url(&key, self.settings.attachment_url_ttl)
                    .await?;

                info!(
                    feedback_id = %feedback_id,
                    attachment_key = %key,
                    media_type = %media_type,
                    size = size,
                    "添付ファイルを保存"
                );
                (Some(key), Some(url))
            }
            None => (None, None),
        };

        let record =
            FeedbackRecord::from_submission(feedback_id, &feedback, attachment_key, submitted_at);
        self.repository.save(&record).await?;
        info!(feedback_id = %record.feedback_id, "フィードバックレコードを保存");

        let email = NotificationEmail::for_feedback(
            &record,
            attachment_url.as_deref(),
            &self.settings.sender_email,
            &self.settings.admin_email,
        );
        let email_message_id = match self.email_sender.send(&email).await {
            Ok(message_id) => message_id,
            Err(err) => {
                // レコードは保存済みのまま残る
                error!(
                    feedback_id = %record.feedback_id,
                    error = %err,
                    "通知メール送信に失敗（レコードは保存済み）"
                );
                return Err(err.into());
            }
        };
        info!(
            feedback_id = %record.feedback_id,
            message_id = %email_message_id,
            "通知メールを送信"
        );

        Ok(SubmissionReceipt {
            feedback_id: record.feedback_id,
            attachment_key: record.attachment_key,
            email_message_id,
        })
    }
}
