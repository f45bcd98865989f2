//! 静的サイト用S3バケット操作モジュール
//!
//! deploy_siteで使用するバケットの一覧取得・アップロード・削除を提供する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::RemoteObject;

/// S3バケット操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SiteBucketOpsError {
    #[error("オブジェクト一覧の取得に失敗: {0}")]
    ListError(String),
    #[error("アップロードに失敗 ({key}): {message}")]
    UploadError { key: String, message: String },
    #[error("削除に失敗 ({key}): {message}")]
    DeleteError { key: String, message: String },
}

/// 静的サイト用バケット操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait SiteBucketOps: Send + Sync {
    /// バケット内の全オブジェクトを取得する
    async fn list_objects(&self) -> Result<Vec<RemoteObject>, SiteBucketOpsError>;

    /// オブジェクトをアップロードする
    async fn upload(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), SiteBucketOpsError>;

    /// オブジェクトを削除する
    async fn delete(&self, key: &str) -> Result<(), SiteBucketOpsError>;
}

/// 実際のAWS S3 SDKを使用したバケット操作実装
#[derive(Debug, Clone)]
pub struct AwsSiteBucketOps {
    client: S3Client,
    bucket: String,
}

impl AwsSiteBucketOps {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl SiteBucketOps for AwsSiteBucketOps {
    async fn list_objects(&self) -> Result<Vec<RemoteObject>, SiteBucketOpsError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        // ListObjectsV2は1回あたり最大1000件のためページングする
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    let detail = DisplayErrorContext(&e).to_string();
                    warn!(bucket = %self.bucket, error = %detail, "ListObjectsV2エラー");
                    SiteBucketOpsError::ListError(detail)
                })?;

            for object in output.contents() {
                if let Some(key) = object.key() {
                    objects.push(RemoteObject {
                        key: key.to_string(),
                        size: object.size().unwrap_or_default().max(0) as u64,
                        last_modified: object.last_modified().and_then(to_utc),
                    });
                }
            }

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!(bucket = %self.bucket, count = objects.len(), "オブジェクト一覧を取得");
        Ok(objects)
    }

    async fn upload(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), SiteBucketOpsError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| SiteBucketOpsError::UploadError {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SiteBucketOpsError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| SiteBucketOpsError::DeleteError {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

fn to_utc(time: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// アップロードされたオブジェクト
    #[derive(Debug, Clone, PartialEq)]
    pub struct UploadedObject {
        pub body: Vec<u8>,
        pub content_type: String,
        pub cache_control: String,
        pub last_modified: DateTime<Utc>,
    }

    // ユニットテスト用のモックバケット
    #[derive(Debug, Clone, Default)]
    pub struct MockSiteBucketOps {
        objects: Arc<Mutex<BTreeMap<String, UploadedObject>>>,
        /// アップロードに失敗させるキー
        failing_keys: Arc<Mutex<Vec<String>>>,
    }

    impl MockSiteBucketOps {
        pub fn new() -> Self {
            Self::default()
        }

        /// 現在時刻にアップロード済みのオブジェクトを追加する
        pub fn with_object(self, key: &str, body: &[u8]) -> Self {
            self.with_object_at(key, body, Utc::now())
        }

        pub fn with_object_at(
            self,
            key: &str,
            body: &[u8],
            last_modified: DateTime<Utc>,
        ) -> Self {
            self.objects.lock().unwrap().insert(
                key.to_string(),
                UploadedObject {
                    body: body.to_vec(),
                    content_type: "application/octet-stream".to_string(),
                    cache_control: String::new(),
                    last_modified,
                },
            );
            self
        }

        pub fn fail_upload_for(&self, key: &str) {
            self.failing_keys.lock().unwrap().push(key.to_string());
        }

        pub fn get_object(&self, key: &str) -> Option<UploadedObject> {
            self.objects.lock().unwrap().get(key).cloned()
        }

        pub fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl SiteBucketOps for MockSiteBucketOps {
        async fn list_objects(&self) -> Result<Vec<RemoteObject>, SiteBucketOpsError> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .map(|(key, object)| RemoteObject {
                    key: key.clone(),
                    size: object.body.len() as u64,
                    last_modified: Some(object.last_modified),
                })
                .collect())
        }

        async fn upload(
            &self,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
            cache_control: &str,
        ) -> Result<(), SiteBucketOpsError> {
            if self.failing_keys.lock().unwrap().iter().any(|k| k == key) {
                return Err(SiteBucketOpsError::UploadError {
                    key: key.to_string(),
                    message: "mock error".to_string(),
                });
            }
            self.objects.lock().unwrap().insert(
                key.to_string(),
                UploadedObject {
                    body,
                    content_type: content_type.to_string(),
                    cache_control: cache_control.to_string(),
                    last_modified: Utc::now(),
                },
            );
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), SiteBucketOpsError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn test_site_bucket_ops_error_display() {
        let error = SiteBucketOpsError::UploadError {
            key: "index.html".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert_eq!(error.to_string(), "アップロードに失敗 (index.html): AccessDenied");

        let error = SiteBucketOpsError::ListError("NoSuchBucket".to_string());
        assert_eq!(error.to_string(), "オブジェクト一覧の取得に失敗: NoSuchBucket");
    }

    #[test]
    fn test_to_utc() {
        let time = aws_sdk_s3::primitives::DateTime::from_secs(1_714_564_800);
        assert_eq!(
            to_utc(&time).unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_mock_bucket_roundtrip() {
        let bucket = MockSiteBucketOps::new().with_object("old.css", b"body{}");

        bucket
            .upload("index.html", b"<html>".to_vec(), "text/html", "no-cache")
            .await
            .unwrap();
        bucket.delete("old.css").await.unwrap();

        let listed = bucket.list_objects().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "index.html");
        assert_eq!(listed[0].size, 6);
        assert!(listed[0].last_modified.is_some());
    }
}
