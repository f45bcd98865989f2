/// フォームに添付されたファイル
///
/// ブラウザの`FileReader.readAsDataURL`が生成するdata URL、
/// または素のbase64文字列を受け付けてバイト列にデコードする。
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use thiserror::Error;

use super::feedback_record::FeedbackId;

/// メディアタイプが指定されていない場合の既定値
pub const DEFAULT_MEDIA_TYPE: &str = "application/pdf";

/// 添付ファイルのデコードエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("attachment is not valid base64")]
    InvalidEncoding,
    #[error("attachment is empty")]
    Empty,
    #[error("attachment is {size} bytes, exceeding the limit of {max} bytes")]
    TooLarge { size: usize, max: usize },
}

/// デコード済みの添付ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    bytes: Vec<u8>,
    media_type: String,
}

impl Attachment {
    /// base64文字列またはdata URLから添付ファイルを作成する
    ///
    /// 最後の`,`より前をヘッダーとみなし、`data:<mime>;base64`形式であれば
    /// メディアタイプを取り出す。パディングの有無は問わない。
    ///
    /// # 引数
    /// * `input` - base64文字列またはdata URL
    /// * `max_bytes` - デコード後サイズの上限
    pub fn from_base64(input: &str, max_bytes: usize) -> Result<Self, AttachmentError> {
        let (header, payload) = match input.rsplit_once(',') {
            Some((header, payload)) => (Some(header), payload),
            None => (None, input),
        };

        let media_type = header
            .and_then(parse_data_url_media_type)
            .unwrap_or(DEFAULT_MEDIA_TYPE)
            .to_ascii_lowercase();

        // 改行入りのbase64（MIME形式）も受け付ける
        let payload: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let payload = payload.trim_end_matches('=');
        if payload.is_empty() {
            return Err(AttachmentError::Empty);
        }

        // デコード前に巨大な入力を弾く（パディングなしなら正確なサイズになる）
        let size = payload.len() * 3 / 4;
        if size > max_bytes {
            return Err(AttachmentError::TooLarge {
                size,
                max: max_bytes,
            });
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload)
            .map_err(|_| AttachmentError::InvalidEncoding)?;
        if bytes.is_empty() {
            return Err(AttachmentError::Empty);
        }

        Ok(Self { bytes, media_type })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// オブジェクトストレージ上のキー（`<feedback_id>.<拡張子>`）
    pub fn object_key(&self, feedback_id: &FeedbackId) -> String {
        format!("{}.{}", feedback_id, extension_for(&self.media_type))
    }

    /// バイト列とメディアタイプに分解する
    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.bytes, self.media_type)
    }
}

/// `data:<mime>;base64`形式のヘッダーからメディアタイプを取り出す
fn parse_data_url_media_type(header: &str) -> Option<&str> {
    let rest = header.trim().strip_prefix("data:")?;
    let media_type = rest.split(';').next()?.trim();
    if media_type.is_empty() || !media_type.contains('/') {
        return None;
    }
    Some(media_type)
}

/// メディアタイプに対応するファイル拡張子
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "text/plain" => "txt",
        "text/csv" => "csv",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        _ => "bin",
    }
}
