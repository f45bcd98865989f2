/// 静的サイトのデプロイ
///
/// ローカルのアセットをバケットと同期し、必要に応じてCloudFrontの
/// キャッシュを無効化する。
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::site_sync::{cache_control_for, content_type_for};
use crate::domain::{LocalAsset, SyncOptions, SyncPlan};
use crate::infrastructure::{
    CloudFrontOps, CloudFrontOpsError, InvalidationResult, SiteBucketOps, SiteBucketOpsError,
};

/// 無効化対象のパス
pub const INVALIDATION_PATH: &str = "/*";

/// デプロイのエラー型
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Bucket(#[from] SiteBucketOpsError),
    #[error("ファイル読み込みエラー ({path}): {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Invalidation(#[from] CloudFrontOpsError),
}

/// デプロイオプション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    pub sync: SyncOptions,
    /// 計画の表示のみ行い、バケットを変更しない
    pub dry_run: bool,
    /// 指定時は同期後にキャッシュを無効化する
    pub distribution_id: Option<String>,
}

/// デプロイ結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployReport {
    pub uploaded: Vec<String>,
    pub deleted: Vec<String>,
    pub unchanged: usize,
    pub invalidation: Option<InvalidationResult>,
    pub dry_run: bool,
}

pub struct SiteDeployer<B, C>
where
    B: SiteBucketOps,
    C: CloudFrontOps,
{
    bucket: B,
    cloudfront: C,
}

impl<B, C> SiteDeployer<B, C>
where
    B: SiteBucketOps,
    C: CloudFrontOps,
{
    pub fn new(bucket: B, cloudfront: C) -> Self {
        Self { bucket, cloudfront }
    }

    /// アセットをバケットへ同期する
    ///
    /// アップロード、削除、キャッシュ無効化の順に実行し、最初のエラーで中断する。
    /// 変更が無い場合はキャッシュ無効化も行わない。
    pub async fn deploy(
        &self,
        assets: &[LocalAsset],
        options: &DeployOptions,
    ) -> Result<DeployReport, DeployError> {
        let remote = self.bucket.list_objects().await?;
        let plan = SyncPlan::build(assets, &remote, options.sync);

        info!(
            local = assets.len(),
            remote = remote.len(),
            uploads = plan.uploads.len(),
            deletes = plan.deletes.len(),
            unchanged = plan.unchanged,
            dry_run = options.dry_run,
            "同期計画を作成"
        );

        let mut report = DeployReport {
            uploaded: plan.uploads.iter().map(|asset| asset.key.clone()).collect(),
            deleted: plan.deletes.clone(),
            unchanged: plan.unchanged,
            invalidation: None,
            dry_run: options.dry_run,
        };

        if options.dry_run {
            for key in &report.uploaded {
                info!(key = %key, "[dry-run] アップロード");
            }
            for key in &report.deleted {
                info!(key = %key, "[dry-run] 削除");
            }
            return Ok(report);
        }

        for asset in &plan.uploads {
            let body = tokio::fs::read(&asset.path)
                .await
                .map_err(|source| DeployError::ReadFile {
                    path: asset.path.clone(),
                    source,
                })?;
            self.bucket
                .upload(
                    &asset.key,
                    body,
                    content_type_for(&asset.key),
                    cache_control_for(&asset.key),
                )
                .await?;
            debug!(key = %asset.key, size = asset.size, "アップロード完了");
        }

        for key in &plan.deletes {
            self.bucket.delete(key).await?;
            debug!(key = %key, "削除完了");
        }

        if let Some(distribution_id) = &options.distribution_id {
            if plan.is_empty() {
                info!("変更なしのためキャッシュ無効化をスキップ");
            } else {
                let caller_reference = format!("deploy-{}", Uuid::new_v4());
                let invalidation = self
                    .cloudfront
                    .create_invalidation(
                        distribution_id,
                        &[INVALIDATION_PATH.to_string()],
                        &caller_reference,
                    )
                    .await?;
                report.invalidation = Some(invalidation);
            }
        }

        info!(
            uploaded = report.uploaded.len(),
            deleted = report.deleted.len(),
            "デプロイ完了"
        );
        Ok(report)
    }
}
