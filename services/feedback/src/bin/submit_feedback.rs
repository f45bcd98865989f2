/// フィードバック送信 HTTP Lambdaエントリポイント
///
/// API Gateway経由のPOSTリクエストでフォームを受け取り、
/// 添付ファイル保存・DynamoDB保存・管理者への通知メール送信を行う。
///
/// # 環境変数
/// - TABLE_NAME / BUCKET_NAME / ADMIN_EMAIL（必須）
/// - SENDER_EMAIL / REGION / ALLOWED_ORIGIN / ATTACHMENT_URL_TTL_SECS / MAX_ATTACHMENT_BYTES
use feedback::application::{
    CorsPolicy, FeedbackEndpoint, SubmissionSettings, SubmitFeedbackHandler,
};
use feedback::infrastructure::{
    init_logging, DynamoFeedbackRepository, FeedbackConfig, S3AttachmentStore, SesEmailSender,
};
use lambda_http::{run, service_fn, Error, Request};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 設定はコールドスタート時に一度だけ読み込む
    let config = FeedbackConfig::from_env().inspect_err(|err| {
        error!(error = %err, "設定の読み込みに失敗");
    })?;
    let cors = CorsPolicy::new(config.allowed_origin()).inspect_err(|err| {
        error!(error = %err, "ALLOWED_ORIGINがヘッダー値として不正");
    })?;

    // AWSクライアントは呼び出し間で再利用する
    let sdk_config = config.load_aws_config().await;
    let repository = DynamoFeedbackRepository::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config.table_name().to_string(),
    );
    let attachment_store = S3AttachmentStore::new(
        aws_sdk_s3::Client::new(&sdk_config),
        config.bucket_name().to_string(),
    );
    let email_sender = SesEmailSender::new(aws_sdk_sesv2::Client::new(&sdk_config));

    let handler = SubmitFeedbackHandler::new(
        repository,
        attachment_store,
        email_sender,
        SubmissionSettings::from_config(&config),
    );
    let endpoint = FeedbackEndpoint::new(handler, cors);

    info!(
        table_name = %config.table_name(),
        bucket_name = %config.bucket_name(),
        "フィードバックLambda関数を初期化"
    );

    let endpoint = &endpoint;
    run(service_fn(move |request: Request| async move {
        Ok::<_, Error>(endpoint.handle(&request).await)
    }))
    .await
}
