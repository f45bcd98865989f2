// アプリケーション層モジュール
pub mod feedback_endpoint;
pub mod http_response;
pub mod site_deployer;
pub mod submit_feedback_handler;

// 再エクスポート
pub use feedback_endpoint::FeedbackEndpoint;
pub use http_response::CorsPolicy;
pub use site_deployer::{DeployError, DeployOptions, DeployReport, SiteDeployer};
pub use submit_feedback_handler::{
    SubmissionReceipt, SubmissionSettings, SubmitFeedbackError, SubmitFeedbackHandler,
};
