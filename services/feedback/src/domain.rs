// Domain layer modules
pub mod attachment;
pub mod feedback_form;
pub mod feedback_record;
pub mod notification_email;
pub mod site_sync;

// Re-exports
pub use attachment::{Attachment, AttachmentError, DEFAULT_MEDIA_TYPE};
pub use feedback_form::{FeedbackForm, FormValidationError, ValidatedFeedback};
pub use feedback_record::{FeedbackId, FeedbackRecord};
pub use notification_email::{NotificationEmail, NOTIFICATION_SUBJECT};
pub use site_sync::{LocalAsset, RemoteObject, SyncOptions, SyncPlan};
