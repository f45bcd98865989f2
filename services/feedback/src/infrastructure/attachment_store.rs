//! 添付ファイル保存モジュール
//!
//! 非公開S3バケットへの添付ファイルのアップロードと、
//! 管理者が閲覧するための期限付きダウンロードURLの発行を行う。

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// 添付ファイル保存のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttachmentStoreError {
    /// アップロード失敗
    #[error("S3アップロードエラー: {0}")]
    UploadError(String),
    /// 署名付きURLの発行失敗
    #[error("署名付きURL発行エラー: {0}")]
    PresignError(String),
}

/// 添付ファイル保存トレイト（テスト用の抽象化）
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// 添付ファイルをアップロードする
    ///
    /// # 引数
    /// * `key` - オブジェクトキー
    /// * `body` - ファイル内容
    /// * `content_type` - メディアタイプ
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AttachmentStoreError>;

    /// 期限付きダウンロードURLを発行する
    ///
    /// # 引数
    /// * `key` - オブジェクトキー
    /// * `ttl` - URLの有効期限（最大7日）
    async fn presigned_url(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<String, AttachmentStoreError>;
}

/// S3を使用した添付ファイル保存実装
#[derive(Debug, Clone)]
pub struct S3AttachmentStore {
    client: S3Client,
    bucket: String,
}

impl S3AttachmentStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AttachmentStoreError> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                // SdkErrorのDisplayはエラーコードを含まないため原因まで展開する
                let detail = DisplayErrorContext(&e).to_string();
                warn!(bucket = %self.bucket, key = %key, error = %detail, "PutObjectエラー");
                AttachmentStoreError::UploadError(detail)
            })?;

        info!(bucket = %self.bucket, key = %key, size = size, "添付ファイルをアップロード");
        Ok(())
    }

    async fn presigned_url(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<String, AttachmentStoreError> {
        let presigning_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| AttachmentStoreError::PresignError(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                AttachmentStoreError::PresignError(DisplayErrorContext(&e).to_string())
            })?;

        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::stub_http::{self, StubResponse};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// アップロードされたオブジェクト
    #[derive(Debug, Clone, PartialEq)]
    pub struct StoredObject {
        pub body: Vec<u8>,
        pub content_type: String,
    }

    // ユニットテスト用のモックAttachmentStore
    #[derive(Debug, Clone, Default)]
    pub struct MockAttachmentStore {
        objects: Arc<Mutex<HashMap<String, StoredObject>>>,
        next_put_error: Arc<Mutex<Option<AttachmentStoreError>>>,
        next_presign_error: Arc<Mutex<Option<AttachmentStoreError>>>,
    }

    impl MockAttachmentStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_next_put_error(&self, error: AttachmentStoreError) {
            *self.next_put_error.lock().unwrap() = Some(error);
        }

        pub fn set_next_presign_error(&self, error: AttachmentStoreError) {
            *self.next_presign_error.lock().unwrap() = Some(error);
        }

        pub fn get_object(&self, key: &str) -> Option<StoredObject> {
            self.objects.lock().unwrap().get(key).cloned()
        }

        pub fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AttachmentStore for MockAttachmentStore {
        async fn put(
            &self,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), AttachmentStoreError> {
            if let Some(error) = self.next_put_error.lock().unwrap().take() {
                return Err(error);
            }
            self.objects.lock().unwrap().insert(
                key.to_string(),
                StoredObject {
                    body,
                    content_type: content_type.to_string(),
                },
            );
            Ok(())
        }

        async fn presigned_url(
            &self,
            key: &str,
            ttl: Duration,
        ) -> Result<String, AttachmentStoreError> {
            if let Some(error) = self.next_presign_error.lock().unwrap().take() {
                return Err(error);
            }
            Ok(format!(
                "https://attachments.example.com/{}?expires={}",
                key,
                ttl.as_secs()
            ))
        }
    }

    #[test]
    fn test_attachment_store_error_display() {
        assert_eq!(
            AttachmentStoreError::UploadError("AccessDenied".to_string()).to_string(),
            "S3アップロードエラー: AccessDenied"
        );
        assert_eq!(
            AttachmentStoreError::PresignError("expired".to_string()).to_string(),
            "署名付きURL発行エラー: expired"
        );
    }

    #[tokio::test]
    async fn test_presigned_url_is_generated_offline() {
        // 署名付きURLはローカルで計算されるため、固定の認証情報だけで検証できる
        let credentials = aws_sdk_s3::config::Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "test",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .build();
        let store = S3AttachmentStore::new(
            S3Client::from_conf(config),
            "feedback-attachments".to_string(),
        );

        let url = store
            .presigned_url("fb-1.pdf", Duration::from_secs(86400))
            .await
            .unwrap();

        assert!(url.contains("feedback-attachments"));
        assert!(url.contains("fb-1.pdf"));
        assert!(url.contains("X-Amz-Expires=86400"));
        assert!(url.contains("X-Amz-Signature="));
        assert_eq!(store.bucket(), "feedback-attachments");
    }

    #[tokio::test]
    async fn test_presigned_url_rejects_too_long_ttl() {
        let credentials =
            aws_sdk_s3::config::Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .build();
        let store = S3AttachmentStore::new(S3Client::from_conf(config), "bucket".to_string());

        let result = store
            .presigned_url("fb-1.pdf", Duration::from_secs(8 * 24 * 60 * 60))
            .await;

        assert!(matches!(
            result,
            Err(AttachmentStoreError::PresignError(_))
        ));
    }

    #[tokio::test]
    async fn test_put_error_includes_service_error_code() {
        let endpoint = stub_http::spawn(StubResponse {
            status: 403,
            reason: "Forbidden",
            headers: vec![("Content-Type", "application/xml")],
            body: "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <Error><Code>AccessDenied</Code><Message>Access Denied</Message>\
                   <RequestId>R1</RequestId></Error>",
        })
        .await;
        let credentials =
            aws_sdk_s3::config::Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();
        let store = S3AttachmentStore::new(S3Client::from_conf(config), "bucket".to_string());

        let err = store
            .put("fb-1.pdf", b"%PDF-".to_vec(), "application/pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, AttachmentStoreError::UploadError(_)));
        let message = err.to_string();
        assert!(message.contains("AccessDenied"), "{}", message);
    }

    #[tokio::test]
    async fn test_mock_store_put_and_presign() {
        let store = MockAttachmentStore::new();

        store
            .put("fb-1.pdf", b"%PDF-".to_vec(), "application/pdf")
            .await
            .unwrap();
        let url = store
            .presigned_url("fb-1.pdf", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.object_count(), 1);
        assert_eq!(
            store.get_object("fb-1.pdf").unwrap().content_type,
            "application/pdf"
        );
        assert_eq!(url, "https://attachments.example.com/fb-1.pdf?expires=60");
    }
}
