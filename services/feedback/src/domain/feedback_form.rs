/// フィードバックフォームの入力値と検証
///
/// API Gatewayから受け取ったフォーム（JSONまたはURLエンコード）を表し、
/// 必須項目の有無と文字数上限を検証する。
use serde::Deserialize;
use thiserror::Error;

/// 名前の最大文字数
pub const MAX_NAME_CHARS: usize = 200;
/// メールアドレスの最大文字数（RFC 5321のパス長上限に合わせる）
pub const MAX_EMAIL_CHARS: usize = 320;
/// 本文の最大文字数
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// フォーム検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormValidationError {
    /// 必須項目が欠落、または空白のみ
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// 文字数上限を超過
    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
}

/// 受信したままのフォーム
///
/// すべての項目は省略可能として受け取り、`validate`で必須チェックを行う。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    /// base64文字列またはdata URL
    pub file_base64: Option<String>,
}

/// 検証済みのフォーム
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFeedback {
    pub name: String,
    pub email: String,
    pub message: String,
    pub file_base64: Option<String>,
}

impl FeedbackForm {
    /// 必須項目と文字数上限を検証する
    ///
    /// - name / email は前後の空白を除去して保存する
    /// - message は改行などの書式を保持し、空白のみの場合は欠落扱い
    /// - 空のfile_base64は添付なしとして扱う
    pub fn validate(self) -> Result<ValidatedFeedback, FormValidationError> {
        let name = required_field("name", self.name, MAX_NAME_CHARS, true)?;
        let email = required_field("email", self.email, MAX_EMAIL_CHARS, true)?;
        let message = required_field("message", self.message, MAX_MESSAGE_CHARS, false)?;

        let file_base64 = self.file_base64.filter(|data| !data.trim().is_empty());

        Ok(ValidatedFeedback {
            name,
            email,
            message,
            file_base64,
        })
    }
}

fn required_field(
    field: &'static str,
    value: Option<String>,
    max: usize,
    trim: bool,
) -> Result<String, FormValidationError> {
    let value = value.ok_or(FormValidationError::MissingField(field))?;
    if value.trim().is_empty() {
        return Err(FormValidationError::MissingField(field));
    }

    let value = if trim {
        value.trim().to_string()
    } else {
        value
    };

    if value.chars().count() > max {
        return Err(FormValidationError::FieldTooLong { field, max });
    }

    Ok(value)
}
