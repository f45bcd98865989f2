/// DynamoDBでフィードバックレコードを永続化するリポジトリ
use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::FeedbackRecord;

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedbackRepositoryError {
    /// 同じフィードバックIDのレコードが既に存在
    #[error("Feedback already exists: {0}")]
    AlreadyExists(String),

    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),
}

/// フィードバック永続化用トレイト
///
/// 実際のDynamoDBとテスト用モックを差し替えられるように抽象化する。
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// フィードバックレコードを新規保存する
    ///
    /// 同じIDのレコードが既に存在する場合は上書きせず
    /// `FeedbackRepositoryError::AlreadyExists`を返す。
    async fn save(&self, record: &FeedbackRecord) -> Result<(), FeedbackRepositoryError>;
}

/// FeedbackRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoFeedbackRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoFeedbackRepository {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// レコードをDynamoDBの属性マップに変換する
    ///
    /// 添付ファイルがない場合は`attachment_key`属性自体を含めない。
    fn build_item(record: &FeedbackRecord) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "feedback_id".to_string(),
            AttributeValue::S(record.feedback_id.to_string()),
        );
        item.insert("name".to_string(), AttributeValue::S(record.name.clone()));
        item.insert("email".to_string(), AttributeValue::S(record.email.clone()));
        item.insert(
            "message".to_string(),
            AttributeValue::S(record.message.clone()),
        );
        item.insert(
            "submitted_at".to_string(),
            AttributeValue::S(record.submitted_at_rfc3339()),
        );
        if let Some(key) = &record.attachment_key {
            item.insert("attachment_key".to_string(), AttributeValue::S(key.clone()));
        }
        item
    }
}

#[async_trait]
impl FeedbackRepository for DynamoFeedbackRepository {
    async fn save(&self, record: &FeedbackRecord) -> Result<(), FeedbackRepositoryError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::build_item(record)))
            .condition_expression("attribute_not_exists(feedback_id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    return Err(FeedbackRepositoryError::AlreadyExists(
                        record.feedback_id.to_string(),
                    ));
                }
                Err(FeedbackRepositoryError::WriteError(service_error.to_string()))
            }
        }
    }
}
