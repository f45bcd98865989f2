// フィードバックAPIのHTTPレスポンス生成
//
// すべてのレスポンスにCORSヘッダーを付与し、本文はJSONで返す。

use lambda_http::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ALLOW, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue,
};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde_json::json;

/// 受け付けるHTTPメソッド
pub const ALLOWED_METHODS: &str = "POST,OPTIONS";

/// CORSポリシー
#[derive(Debug, Clone, PartialEq)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
}

impl CorsPolicy {
    /// 許可するオリジンを指定して作成
    ///
    /// ヘッダー値として不正な文字列の場合はエラー
    pub fn new(allow_origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(allow_origin)?,
        })
    }

    /// すべてのオリジンを許可（`*`）
    pub fn allow_any() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
        }
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    /// 通常レスポンス用のヘッダー
    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
    }

    /// プリフライト・成功レスポンス用のヘッダー
    fn apply_full(&self, headers: &mut HeaderMap) {
        self.apply(headers);
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::allow_any()
    }
}

/// OPTIONSプリフライトへの応答（200、本文なし）
pub fn preflight(cors: &CorsPolicy) -> Response<Body> {
    let mut response = Response::new(Body::Empty);
    *response.status_mut() = StatusCode::OK;
    cors.apply_full(response.headers_mut());
    response
}

/// 送信成功（200）
pub fn submitted(cors: &CorsPolicy, feedback_id: &str) -> Response<Body> {
    let body = json!({
        "message": "Feedback submitted successfully",
        "feedback_id": feedback_id,
    });
    let mut response = json_response(StatusCode::OK, body);
    cors.apply_full(response.headers_mut());
    response
}

/// 本文が無い・解釈できない（400）
pub fn invalid_request_format(cors: &CorsPolicy) -> Response<Body> {
    bad_request(cors, "Invalid request format.")
}

/// 入力エラー（400）
pub fn bad_request(cors: &CorsPolicy, message: &str) -> Response<Body> {
    let mut response = json_response(StatusCode::BAD_REQUEST, json!({ "message": message }));
    cors.apply(response.headers_mut());
    response
}

/// 未対応メソッド（405）
pub fn method_not_allowed(cors: &CorsPolicy) -> Response<Body> {
    let mut response = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({ "message": "Method not allowed" }),
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    cors.apply(response.headers_mut());
    response
}

/// サーバー側エラー（500）
pub fn internal_error(cors: &CorsPolicy, error: &dyn std::error::Error) -> Response<Body> {
    let body = json!({
        "message": "Internal server error",
        "error": error.to_string(),
    });
    let mut response = json_response(StatusCode::INTERNAL_SERVER_ERROR, body);
    cors.apply(response.headers_mut());
    response
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::Text(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
