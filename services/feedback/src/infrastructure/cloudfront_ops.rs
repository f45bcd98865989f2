//! CloudFront操作モジュール
//!
//! 静的サイト更新後のキャッシュ無効化（Invalidation）を提供する。

use async_trait::async_trait;
use aws_sdk_cloudfront::Client as CloudFrontClient;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use thiserror::Error;
use tracing::{info, warn};

/// CloudFront操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CloudFrontOpsError {
    /// AWS SDK エラー
    #[error("AWS CloudFront APIエラー: {0}")]
    AwsSdkError(String),
    /// リクエストの組み立てに失敗
    #[error("無効化リクエストの構築に失敗: {0}")]
    BuildError(String),
}

/// キャッシュ無効化の結果
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationResult {
    /// ディストリビューションID
    pub distribution_id: String,
    /// 作成された無効化ID
    pub invalidation_id: String,
    /// 無効化対象のパス
    pub paths: Vec<String>,
}

impl InvalidationResult {
    pub fn new(
        distribution_id: impl Into<String>,
        invalidation_id: impl Into<String>,
        paths: Vec<String>,
    ) -> Self {
        Self {
            distribution_id: distribution_id.into(),
            invalidation_id: invalidation_id.into(),
            paths,
        }
    }
}

/// CloudFront操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait CloudFrontOps: Send + Sync {
    /// 指定パスのキャッシュ無効化を作成する
    ///
    /// # 引数
    /// * `distribution_id` - CloudFrontディストリビューションID
    /// * `paths` - 無効化するパス（例: `/*`）
    /// * `caller_reference` - リクエストの一意な識別子
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        caller_reference: &str,
    ) -> Result<InvalidationResult, CloudFrontOpsError>;
}

/// 実際のAWS CloudFront SDKを使用したCloudFront操作実装
pub struct AwsCloudFrontOps {
    client: CloudFrontClient,
}

impl AwsCloudFrontOps {
    pub fn new(client: CloudFrontClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CloudFrontOps for AwsCloudFrontOps {
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        caller_reference: &str,
    ) -> Result<InvalidationResult, CloudFrontOpsError> {
        info!(
            distribution_id = %distribution_id,
            paths = ?paths,
            "CloudFrontキャッシュ無効化開始"
        );

        let invalidation_paths = Paths::builder()
            .quantity(paths.len() as i32)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|e| CloudFrontOpsError::BuildError(e.to_string()))?;

        let batch = InvalidationBatch::builder()
            .paths(invalidation_paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|e| CloudFrontOpsError::BuildError(e.to_string()))?;

        let result = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await;

        match result {
            Ok(output) => {
                let invalidation_id = output
                    .invalidation()
                    .map(|invalidation| invalidation.id().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                info!(
                    distribution_id = %distribution_id,
                    invalidation_id = %invalidation_id,
                    "CreateInvalidation成功"
                );
                Ok(InvalidationResult::new(
                    distribution_id,
                    invalidation_id,
                    paths.to_vec(),
                ))
            }
            Err(err) => {
                let detail = DisplayErrorContext(&err).to_string();
                warn!(
                    distribution_id = %distribution_id,
                    error = %detail,
                    "CreateInvalidationエラー"
                );
                Err(CloudFrontOpsError::AwsSdkError(detail))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// テスト用のモックCloudFront操作
    #[derive(Debug, Clone, Default)]
    pub struct MockCloudFrontOps {
        /// (distribution_id, paths, caller_reference) の呼び出し記録
        calls: Arc<Mutex<Vec<(String, Vec<String>, String)>>>,
        fail: bool,
    }

    impl MockCloudFrontOps {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<(String, Vec<String>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CloudFrontOps for MockCloudFrontOps {
        async fn create_invalidation(
            &self,
            distribution_id: &str,
            paths: &[String],
            caller_reference: &str,
        ) -> Result<InvalidationResult, CloudFrontOpsError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((
                distribution_id.to_string(),
                paths.to_vec(),
                caller_reference.to_string(),
            ));

            if self.fail {
                return Err(CloudFrontOpsError::AwsSdkError("mock error".to_string()));
            }
            Ok(InvalidationResult::new(
                distribution_id,
                format!("I{}", calls.len()),
                paths.to_vec(),
            ))
        }
    }

    #[test]
    fn test_cloudfront_ops_error_display() {
        assert_eq!(
            CloudFrontOpsError::AwsSdkError("AccessDenied".to_string()).to_string(),
            "AWS CloudFront APIエラー: AccessDenied"
        );
        assert_eq!(
            CloudFrontOpsError::BuildError("missing paths".to_string()).to_string(),
            "無効化リクエストの構築に失敗: missing paths"
        );
    }

    #[test]
    fn test_invalidation_result_new() {
        let result = InvalidationResult::new("E123", "I456", vec!["/*".to_string()]);

        assert_eq!(result.distribution_id, "E123");
        assert_eq!(result.invalidation_id, "I456");
        assert_eq!(result.paths, vec!["/*"]);
    }

    #[tokio::test]
    async fn test_mock_cloudfront_ops_records_calls() {
        let mock = MockCloudFrontOps::new();

        let result = mock
            .create_invalidation("E123", &["/*".to_string()], "deploy-1")
            .await
            .unwrap();

        assert_eq!(result.invalidation_id, "I1");
        assert_eq!(
            mock.calls(),
            vec![(
                "E123".to_string(),
                vec!["/*".to_string()],
                "deploy-1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_mock_cloudfront_ops_failure() {
        let mock = MockCloudFrontOps::failing();

        let result = mock
            .create_invalidation("E123", &["/*".to_string()], "deploy-1")
            .await;

        assert!(result.is_err());
        assert_eq!(mock.calls().len(), 1);
    }
}
