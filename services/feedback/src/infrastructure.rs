// Infrastructure layer modules
pub mod attachment_store;
pub mod cloudfront_ops;
pub mod config;
pub mod email_sender;
pub mod feedback_repository;
pub mod local_site;
pub mod logging;
pub mod site_bucket_ops;
#[cfg(test)]
pub(crate) mod stub_http;

// Re-exports
pub use attachment_store::{AttachmentStore, AttachmentStoreError, S3AttachmentStore};
pub use cloudfront_ops::{AwsCloudFrontOps, CloudFrontOps, CloudFrontOpsError, InvalidationResult};
pub use config::{ConfigError, FeedbackConfig};
pub use email_sender::{EmailSender, EmailSenderError, SesEmailSender};
pub use feedback_repository::{
    DynamoFeedbackRepository, FeedbackRepository, FeedbackRepositoryError,
};
pub use local_site::LocalSiteError;
pub use logging::{LogFormat, init_cli_logging, init_logging};
pub use site_bucket_ops::{AwsSiteBucketOps, SiteBucketOps, SiteBucketOpsError};
