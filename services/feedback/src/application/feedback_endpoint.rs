/// フィードバックAPIのHTTPエンドポイント
///
/// メソッドで振り分け、本文をフォームとして解釈して送信ハンドラーに渡す。
/// 処理結果とエラーはすべてHTTPレスポンスに変換し、Lambdaには返さない。
///
/// API Gateway（プロキシ統合）経由のリクエストのみを扱う。
/// `name`や`email`をトップレベルに持つ直接呼び出しのイベントは受け付けない
/// （`lambda_http`がリクエストとして解釈できず、ランタイムのエラーになる）。
use lambda_http::http::Method;
use lambda_http::{Body, Request, RequestPayloadExt, Response};
use tracing::{error, info, warn};

use super::http_response::{self, CorsPolicy};
use super::submit_feedback_handler::SubmitFeedbackHandler;
use crate::domain::FeedbackForm;
use crate::infrastructure::{AttachmentStore, EmailSender, FeedbackRepository};

pub struct FeedbackEndpoint<R, S, M>
where
    R: FeedbackRepository,
    S: AttachmentStore,
    M: EmailSender,
{
    handler: SubmitFeedbackHandler<R, S, M>,
    cors: CorsPolicy,
}

impl<R, S, M> FeedbackEndpoint<R, S, M>
where
    R: FeedbackRepository,
    S: AttachmentStore,
    M: EmailSender,
{
    pub fn new(handler: SubmitFeedbackHandler<R, S, M>, cors: CorsPolicy) -> Self {
        Self { handler, cors }
    }

    /// HTTPリクエストを処理してレスポンスを返す
    pub async fn handle(&self, request: &Request) -> Response<Body> {
        let method = request.method();
        info!(method = %method, path = %request.uri().path(), "リクエスト受信");

        if method == Method::OPTIONS {
            return http_response::preflight(&self.cors);
        }
        if method != Method::POST {
            warn!(method = %method, "未対応のメソッド");
            return http_response::method_not_allowed(&self.cors);
        }

        let Some(form) = parse_form(request) else {
            warn!("リクエスト本文を解釈できない");
            return http_response::invalid_request_format(&self.cors);
        };

        match self.handler.handle(form).await {
            Ok(receipt) => {
                info!(
                    feedback_id = %receipt.feedback_id,
                    has_attachment = receipt.attachment_key.is_some(),
                    "フィードバック受付完了"
                );
                http_response::submitted(&self.cors, receipt.feedback_id.as_str())
            }
            Err(err) if err.is_client_error() => {
                warn!(error = %err, "入力エラー");
                http_response::bad_request(&self.cors, &err.to_string())
            }
            Err(err) => {
                error!(error = %err, "フィードバック送信処理に失敗");
                http_response::internal_error(&self.cors, &err)
            }
        }
    }
}

/// 本文をフォームとして解釈する
///
/// Content-Typeが`application/json`またはURLエンコード形式ならそれに従い、
/// 指定が無い場合はJSONとして解釈する。空の本文は解釈不能として扱う。
fn parse_form(request: &Request) -> Option<FeedbackForm> {
    match request.payload::<FeedbackForm>() {
        Ok(Some(form)) => Some(form),
        Ok(None) => {
            let body: &[u8] = request.body().as_ref();
            if body.is_empty() {
                return None;
            }
            serde_json::from_slice(body).ok()
        }
        Err(_) => None,
    }
}
