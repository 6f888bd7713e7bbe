use axum::extract::Multipart;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// A file field read out of a multipart submission
#[derive(Debug)]
pub struct SubmittedFile {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Fields common to thread and reply submissions
#[derive(Debug, Default)]
pub struct BoardSubmission {
    pub subject: Option<String>,
    pub comment: String,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_nsfw: bool,
    pub reply_to: Option<Uuid>,
    pub file: Option<SubmittedFile>,
}

impl BoardSubmission {
    /// A submission must carry a comment, a file, or both
    pub fn require_content(&self) -> Result<()> {
        if self.comment.is_empty() && self.file.is_none() {
            return Err(AppError::Validation(
                "Comment is required when no file is attached".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a board submission from multipart/form-data.
///
/// Known fields: `file`, `subject`, `comment`, `name`, `password`, `nsfw`,
/// `reply_to`. Unknown fields are ignored. Exactly one `file` field is
/// accepted; a second one is rejected.
pub async fn parse_submission(multipart: &mut Multipart) -> Result<BoardSubmission> {
    let mut submission = BoardSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                if submission.file.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one file per submission is allowed".to_string(),
                    ));
                }

                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                // An empty file field means "no attachment"
                if data.is_empty() {
                    continue;
                }

                submission.file = Some(SubmittedFile {
                    data: data.to_vec(),
                    file_name,
                    content_type,
                });
            }
            "subject" => {
                let text = read_text(field, "subject").await?;
                if !text.is_empty() {
                    submission.subject = Some(text);
                }
            }
            "comment" => {
                submission.comment = read_text(field, "comment").await?;
            }
            "name" => {
                let text = read_text(field, "name").await?;
                if !text.is_empty() {
                    submission.name = Some(text);
                }
            }
            "password" => {
                let text = read_text(field, "password").await?;
                if !text.is_empty() {
                    submission.password = Some(text);
                }
            }
            "nsfw" => {
                let text = read_text(field, "nsfw").await?;
                submission.is_nsfw =
                    matches!(text.to_lowercase().as_str(), "true" | "1" | "on" | "yes");
            }
            "reply_to" => {
                let text = read_text(field, "reply_to").await?;
                if !text.is_empty() {
                    let id = text.parse::<Uuid>().map_err(|_| {
                        AppError::Validation("reply_to must be a valid post id".to_string())
                    })?;
                    submission.reply_to = Some(id);
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Ok(submission)
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(file_name, content_type, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                             Content-Type: {}\r\n\r\n",
                            file_name, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn parse(parts: &[Part<'_>]) -> Result<BoardSubmission> {
        let mut multipart = Multipart::from_request(multipart_request(parts), &())
            .await
            .unwrap();
        parse_submission(&mut multipart).await
    }

    #[tokio::test]
    async fn test_parses_text_fields_and_file() {
        let submission = parse(&[
            Part::Text("subject", "hello"),
            Part::Text("comment", "  first post  "),
            Part::Text("name", "poster"),
            Part::Text("password", "hunter2"),
            Part::Text("nsfw", "true"),
            Part::File("cat.png", "image/png", b"png bytes"),
        ])
        .await
        .unwrap();

        assert_eq!(submission.subject.as_deref(), Some("hello"));
        assert_eq!(submission.comment, "first post");
        assert_eq!(submission.name.as_deref(), Some("poster"));
        assert_eq!(submission.password.as_deref(), Some("hunter2"));
        assert!(submission.is_nsfw);
        let file = submission.file.unwrap();
        assert_eq!(file.file_name, "cat.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.data, b"png bytes");
    }

    #[tokio::test]
    async fn test_empty_optional_fields_become_none() {
        let submission = parse(&[Part::Text("comment", "text only"), Part::Text("name", "")])
            .await
            .unwrap();

        assert_eq!(submission.subject, None);
        assert_eq!(submission.name, None);
        assert_eq!(submission.password, None);
        assert!(!submission.is_nsfw);
        assert!(submission.file.is_none());
    }

    #[tokio::test]
    async fn test_empty_file_field_means_no_attachment() {
        let submission = parse(&[
            Part::Text("comment", "no image"),
            Part::File("", "application/octet-stream", b""),
        ])
        .await
        .unwrap();

        assert!(submission.file.is_none());
    }

    #[tokio::test]
    async fn test_second_file_is_rejected() {
        let result = parse(&[
            Part::File("a.png", "image/png", b"a"),
            Part::File("b.png", "image/png", b"b"),
        ])
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_invalid_reply_to_is_a_validation_error() {
        let result = parse(&[Part::Text("reply_to", "not-a-uuid")]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_empty_submission_is_rejected() {
        let submission = BoardSubmission::default();
        assert!(matches!(
            submission.require_content(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_comment_alone_is_enough() {
        let submission = BoardSubmission {
            comment: "text only".to_string(),
            ..Default::default()
        };
        assert!(submission.require_content().is_ok());
    }

    #[test]
    fn test_file_alone_is_enough() {
        let submission = BoardSubmission {
            file: Some(SubmittedFile {
                data: b"png bytes".to_vec(),
                file_name: "cat.png".to_string(),
                content_type: "image/png".to_string(),
            }),
            ..Default::default()
        };
        assert!(submission.require_content().is_ok());
    }

    #[tokio::test]
    async fn test_reply_to_parses_to_uuid() {
        let id = Uuid::new_v4();
        let submission = parse(&[Part::Text("reply_to", &id.to_string())])
            .await
            .unwrap();
        assert_eq!(submission.reply_to, Some(id));
    }
}
