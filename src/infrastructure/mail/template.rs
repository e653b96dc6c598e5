use html_escape::encode_quoted_attribute as escape;
use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    entities::{contact::ContactRequest, email::OutgoingEmail},
    settings::AppConfig,
};

/// Renders contact submissions into the notification mail sent to the site owner.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    from: String,
    to: String,
    subject_tag: String,
    site_name: String,
    offset: FixedOffset,
}

impl EmailTemplate {
    pub fn new(config: &AppConfig) -> Self {
        let offset = FixedOffset::east_opt(config.display_utc_offset_minutes * 60)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid display offset {} minutes, falling back to UTC",
                    config.display_utc_offset_minutes
                );
                FixedOffset::east_opt(0).expect("zero offset is valid")
            });

        EmailTemplate {
            from: config.email_from.clone(),
            to: config.email_to.clone(),
            subject_tag: config.email_subject_tag.clone(),
            site_name: config.site_name.clone(),
            offset,
        }
    }

    pub fn compose(&self, request: &ContactRequest, submitted_at: DateTime<Utc>) -> OutgoingEmail {
        OutgoingEmail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject(&request.subject),
            html: self.render_html(request, submitted_at),
            reply_to: request.sender.clone(),
        }
    }

    fn subject(&self, subject: &str) -> String {
        // keep the header on a single line
        let subject: String = subject
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();
        format!("{} {}", self.subject_tag, subject)
    }

    /// Submission time as shown in the site's region, e.g. `2024. 5. 1. 18:00:00`.
    pub fn local_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format("%Y. %-m. %-d. %H:%M:%S")
            .to_string()
    }

    fn render_html(&self, request: &ContactRequest, submitted_at: DateTime<Utc>) -> String {
        format!(
            r#"<div style="font-family: monospace; background-color: #000; color: #00ff00; padding: 20px;">
  <h2 style="color: #00ff00; border-bottom: 1px solid #00ff00; padding-bottom: 10px;">
    {site} 연락하기 - 새로운 문의
  </h2>
  <div style="margin: 20px 0;">
    <strong>보내는 사람:</strong> {sender}<br>
    <strong>제목:</strong> {subject}<br>
    <strong>전송 시간:</strong> {submitted}
  </div>
  <div style="border: 1px solid #00ff00; padding: 15px; margin: 20px 0;">
    <strong>문의 내용:</strong><br><br>
    {content}
  </div>
  <div style="margin-top: 20px; padding-top: 20px; border-top: 1px solid #00ff00; font-size: 12px; color: #00aa00;">
    {site} 웹사이트의 연락하기 폼을 통해 전송된 메일입니다.<br>
    회신은 보내는 사람 주소로 바로 보내주세요.
  </div>
</div>"#,
            site = escape(&self.site_name),
            sender = escape(&request.sender),
            subject = escape(&request.subject),
            submitted = escape(&self.local_timestamp(submitted_at)),
            content = content_to_html(&request.content),
        )
    }
}

/// Escapes each line and joins them with `<br>`.
fn content_to_html(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .split('\n')
        .map(|line| escape(line).into_owned())
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn template() -> EmailTemplate {
        EmailTemplate {
            from: "contact@kwt.co.kr".into(),
            to: "kwt@kwt.co.kr".into(),
            subject_tag: "[KWT 문의]".into(),
            site_name: "KWT.CO.KR".into(),
            offset: FixedOffset::east_opt(9 * 3600).unwrap(),
        }
    }

    fn request(subject: &str, content: &str) -> ContactRequest {
        ContactRequest {
            sender: "a@b.com".into(),
            subject: subject.into(),
            content: content.into(),
            fingerprint: "f1".into(),
        }
    }

    fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn composes_envelope_from_request() {
        let email = template().compose(&request("Hi", "Hello\nWorld"), submitted_at());

        assert_eq!(email.from, "contact@kwt.co.kr");
        assert_eq!(email.to, "kwt@kwt.co.kr");
        assert_eq!(email.reply_to, "a@b.com");
        assert_eq!(email.subject, "[KWT 문의] Hi");
        assert!(email.subject.contains("Hi"));
    }

    #[test]
    fn newlines_become_line_breaks() {
        let email = template().compose(&request("Hi", "Hello\nWorld\r\nAgain"), submitted_at());

        assert!(email.html.contains("Hello<br>World<br>Again"));
    }

    #[test]
    fn spaces_survive_and_only_markup_is_escaped() {
        let mut req = request("Hello there", "Hello World\nBye");
        req.sender = "o'brien@b.com".into();

        let email = template().compose(&req, submitted_at());

        assert!(email.html.contains("Hello World<br>Bye"));
        assert!(email.html.contains("<strong>제목:</strong> Hello there<br>"));
        assert!(!email.html.contains("o'brien"));
        assert!(!email.html.contains("&#32;"));
    }

    #[test]
    fn interpolated_fields_are_escaped() {
        let mut req = request("<b>urgent</b>", "<script>alert(1)</script>\n&copy;");
        req.sender = "x\"onmouseover=\"@evil.com".into();

        let email = template().compose(&req, submitted_at());

        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("<b>urgent</b>"));
        assert!(!email.html.contains("\"onmouseover"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(email.html.contains("&amp;copy;"));
        // the subject header is plain text, not HTML
        assert_eq!(email.subject, "[KWT 문의] <b>urgent</b>");
    }

    #[test]
    fn subject_header_stays_on_one_line() {
        let email = template().compose(&request("line one\r\nBcc: x@y.z", "body"), submitted_at());
        assert!(!email.subject.contains('\n'));
        assert!(!email.subject.contains('\r'));
    }

    #[test]
    fn timestamp_uses_regional_offset() {
        let email = template().compose(&request("Hi", "body"), submitted_at());

        assert_eq!(template().local_timestamp(submitted_at()), "2024. 5. 1. 18:00:00");
        assert!(email.html.contains("<strong>전송 시간:</strong> 2024. 5. 1. 18:00:00"));
    }
}
