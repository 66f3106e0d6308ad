//! Administrative write path: record forms, image upload and CSV import
//!
//! Every write here is rejected by the backend unless the signed-in identity
//! carries the admin role.

pub mod forms;
pub mod import;

use std::path::Path;

use chrono::Utc;

pub use forms::{FormError, FormFields, exam_from_fields, parse_fields, question_from_fields};
pub use import::{ImportError, parse_questions, read_questions};

use crate::backend::{BackendError, ContentStore};
use crate::model::NewQuestion;

/// MIME type for an image file, by extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Storage object name: a millisecond timestamp prefix keeps uploads unique
pub fn object_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .replace(char::is_whitespace, "_");
    format!("{}-{}", Utc::now().timestamp_millis(), file_name)
}

/// Upload a local image and return its public URL
pub async fn upload_image(content: &dyn ContentStore, path: &Path) -> Result<String, BackendError> {
    let bytes = tokio::fs::read(path).await?;
    let name = object_name(path);
    tracing::info!("Uploading {} ({} bytes) as {}", path.display(), bytes.len(), name);
    content.upload_file(&name, bytes, content_type_for(path)).await
}

/// Insert an already validated batch in one call
pub async fn import_batch(
    content: &dyn ContentStore,
    questions: &[NewQuestion],
) -> Result<usize, BackendError> {
    let inserted = content.bulk_insert_questions(questions).await?;
    tracing::info!("Imported {} questions", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{IdentityProvider, MemoryBackend};
    use crate::model::Role;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("icon.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a/b/diagram.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn object_names_keep_file_name() {
        let name = object_name(Path::new("/tmp/my icon.png"));
        assert!(name.ends_with("-my_icon.png"));
    }

    #[tokio::test]
    async fn upload_requires_admin_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jee.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let backend = MemoryBackend::new()
            .with_account("s@t.in", "pw", Role::Student)
            .with_account("admin@t.in", "pw", Role::Admin);

        backend.sign_in("s@t.in", "pw").await.unwrap();
        assert!(matches!(upload_image(&backend, &path).await, Err(BackendError::Forbidden)));

        backend.sign_in("admin@t.in", "pw").await.unwrap();
        let url = upload_image(&backend, &path).await.unwrap();
        assert!(url.starts_with("memory://images/") && url.ends_with("jee.png"));
    }

    #[tokio::test]
    async fn validated_batch_is_inserted_whole() {
        let backend = MemoryBackend::new().with_account("admin@t.in", "pw", Role::Admin);
        backend.sign_in("admin@t.in", "pw").await.unwrap();

        let csv = "exam_id,question_text,option_a,option_b,option_c,option_d,correct_option\n\
                   SSC,Q1,a,b,c,d,A\nSSC,Q2,a,b,c,d,B\n";
        let questions = parse_questions(csv.as_bytes()).unwrap();
        assert_eq!(import_batch(&backend, &questions).await.unwrap(), 2);
        assert_eq!(backend.question_count(), 2);
    }
}
