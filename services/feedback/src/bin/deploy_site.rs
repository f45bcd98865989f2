/// 静的サイトデプロイツール
///
/// フロントエンドのディレクトリをS3バケットへ同期し、
/// 指定があればCloudFrontのキャッシュを無効化する。
///
/// # 環境変数
/// - AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY / AWS_REGION: AWS SDKの標準設定
/// - AWS_S3_BUCKET: 配信用バケット名（`--bucket`の既定値）
/// - CLOUDFRONT_DISTRIBUTION_ID: ディストリビューションID（`--distribution-id`の既定値）
///
/// # 実行例
/// ```bash
/// # 変更内容の確認のみ
/// cargo run --bin deploy_site -- --source frontend --bucket my-site --dry-run
///
/// # 削除を含めて同期し、キャッシュを無効化
/// cargo run --bin deploy_site -- --delete --distribution-id E2ABCDEF
/// ```
use std::path::PathBuf;
use std::process::ExitCode;

use aws_config::BehaviorVersion;
use clap::Parser;
use feedback::application::{DeployOptions, DeployReport, SiteDeployer};
use feedback::domain::SyncOptions;
use feedback::infrastructure::{init_cli_logging, local_site, AwsCloudFrontOps, AwsSiteBucketOps};
use tracing::{error, info};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "deploy_site")]
#[command(about = "静的サイトをS3へ同期し、CloudFrontキャッシュを無効化")]
struct CliArgs {
    /// 同期元ディレクトリ
    #[arg(long, default_value = "frontend")]
    source: PathBuf,

    /// 同期先バケット名
    #[arg(long, env = "AWS_S3_BUCKET")]
    bucket: String,

    /// キャッシュを無効化するディストリビューションID
    #[arg(long, env = "CLOUDFRONT_DISTRIBUTION_ID")]
    distribution_id: Option<String>,

    /// ローカルに存在しないオブジェクトを削除する
    #[arg(long)]
    delete: bool,

    /// サイズが同じファイルも再アップロードする
    #[arg(long)]
    force: bool,

    /// 計画の表示のみ行う
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_cli_logging();
    let args = CliArgs::parse();

    match run(args).await {
        Ok(report) => {
            info!(
                uploaded = report.uploaded.len(),
                deleted = report.deleted.len(),
                unchanged = report.unchanged,
                invalidation_id = report
                    .invalidation
                    .as_ref()
                    .map(|i| i.invalidation_id.as_str())
                    .unwrap_or("-"),
                dry_run = report.dry_run,
                "同期完了"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "デプロイに失敗");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<DeployReport, Box<dyn std::error::Error>> {
    let assets = local_site::scan(&args.source)?;
    info!(
        source = %args.source.display(),
        bucket = %args.bucket,
        files = assets.len(),
        "デプロイ開始"
    );

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let deployer = SiteDeployer::new(
        AwsSiteBucketOps::new(aws_sdk_s3::Client::new(&sdk_config), args.bucket),
        AwsCloudFrontOps::new(aws_sdk_cloudfront::Client::new(&sdk_config)),
    );

    let options = DeployOptions {
        sync: SyncOptions {
            delete: args.delete,
            force: args.force,
        },
        dry_run: args.dry_run,
        distribution_id: args.distribution_id.filter(|id| !id.trim().is_empty()),
    };

    Ok(deployer.deploy(&assets, &options).await?)
}
