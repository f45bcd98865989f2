/// フィードバックレコード
///
/// フォーム送信1件につき1つ作成される永続化単位。
/// 作成後に更新・削除されることはない。
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use uuid::Uuid;

use super::feedback_form::ValidatedFeedback;

/// フィードバックID（テーブルのパーティションキー）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedbackId(String);

impl FeedbackId {
    /// 送信ごとに新しいID（UUID v4）を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 既存の値からIDを作成
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 永続化されるフィードバック1件分
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    /// フィードバックID
    pub feedback_id: FeedbackId,
    /// 送信者名
    pub name: String,
    /// 送信者メールアドレス（形式は検証しない）
    pub email: String,
    /// 本文
    pub message: String,
    /// 添付ファイルのオブジェクトキー（添付なしの場合はNone）
    pub attachment_key: Option<String>,
    /// 送信日時（UTC）
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// 検証済みフォームからレコードを組み立てる
    pub fn from_submission(
        feedback_id: FeedbackId,
        feedback: &ValidatedFeedback,
        attachment_key: Option<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            feedback_id,
            name: feedback.name.clone(),
            email: feedback.email.clone(),
            message: feedback.message.clone(),
            attachment_key,
            submitted_at,
        }
    }

    /// 送信日時をRFC 3339（ミリ秒、Z表記）で返す
    pub fn submitted_at_rfc3339(&self) -> String {
        self.submitted_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
