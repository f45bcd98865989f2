// 管理者宛て通知メール
//
// フィードバックレコードからHTML本文とテキスト本文を生成する。
// 利用者の入力はすべてHTMLエスケープしてから埋め込む。

use super::feedback_record::FeedbackRecord;

/// 通知メールの件名
pub const NOTIFICATION_SUBJECT: &str = "New Feedback Received";

const EMAIL_STYLE: &str = r#"
body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; background-color: #f1f5f9; padding: 40px 0; }
.container { max-width: 600px; margin: auto; background-color: #ffffff; border-radius: 10px; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.1); padding: 30px; }
h2 { color: #1d4ed8; border-bottom: 2px solid #e2e8f0; padding-bottom: 10px; margin-bottom: 20px; }
table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
td { padding: 12px 10px; vertical-align: top; border-bottom: 1px solid #e2e8f0; }
td.label { font-weight: bold; background-color: #f8fafc; width: 30%; color: #475569; }
.message { white-space: pre-wrap; }
.attachment-link { color: #2563eb; font-weight: bold; text-decoration: none; }
.footer { margin-top: 30px; font-size: 12px; color: #94a3b8; text-align: center; }
"#;

/// 送信可能な通知メール
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEmail {
    /// 送信元（SESで検証済みのアドレス）
    pub from: String,
    /// 宛先
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl NotificationEmail {
    /// フィードバック1件分の通知メールを組み立てる
    ///
    /// # 引数
    /// * `record` - 保存したフィードバックレコード
    /// * `attachment_url` - 添付ファイルの期限付きダウンロードURL
    /// * `sender` - 送信元アドレス
    /// * `recipient` - 宛先（管理者）アドレス
    pub fn for_feedback(
        record: &FeedbackRecord,
        attachment_url: Option<&str>,
        sender: &str,
        recipient: &str,
    ) -> Self {
        Self {
            from: sender.to_string(),
            to: vec![recipient.to_string()],
            subject: NOTIFICATION_SUBJECT.to_string(),
            html_body: render_html(record, attachment_url),
            text_body: render_text(record, attachment_url),
        }
    }
}

fn render_html(record: &FeedbackRecord, attachment_url: Option<&str>) -> String {
    let message = escape_html(&record.message).replace('\n', "<br>");

    let attachment_row = attachment_url
        .map(|url| {
            format!(
                r#"<tr><td class="label">Attachment</td><td><a href="{}" target="_blank" class="attachment-link">📎 View Attachment</a></td></tr>"#,
                escape_html(url)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>{style}</style>
</head>
<body>
<div class="container">
<h2>📩 New Feedback Received</h2>
<table>
<tr><td class="label">Name</td><td>{name}</td></tr>
<tr><td class="label">Email</td><td>{email}</td></tr>
<tr><td class="label">Message</td><td class="message">{message}</td></tr>
{attachment_row}
</table>
<div class="footer">Feedback ID: {feedback_id} / Submitted at {submitted_at}<br>This email was automatically sent from your feedback form.</div>
</div>
</body>
</html>
"#,
        style = EMAIL_STYLE,
        name = escape_html(&record.name),
        email = escape_html(&record.email),
        message = message,
        attachment_row = attachment_row,
        feedback_id = escape_html(record.feedback_id.as_str()),
        submitted_at = record.submitted_at_rfc3339(),
    )
}

fn render_text(record: &FeedbackRecord, attachment_url: Option<&str>) -> String {
    let mut text = format!(
        "New Feedback Received\n\nName: {}\nEmail: {}\nMessage:\n{}\n",
        record.name, record.email, record.message
    );
    if let Some(url) = attachment_url {
        text.push_str(&format!("\nAttachment: {}\n", url));
    }
    text.push_str(&format!(
        "\nFeedback ID: {}\nSubmitted at: {}\n",
        record.feedback_id,
        record.submitted_at_rfc3339()
    ));
    text
}

/// HTMLの特殊文字をエスケープする
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
