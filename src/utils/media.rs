use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::MediaError;
use crate::models::media::{Media, NewMedia};

/// Largest accepted logo, in bytes (2048 KiB).
pub const MAX_LOGO_BYTES: usize = 2048 * 1024;

/// Named variants produced for every logo by the image conversion service.
pub const LOGO_CONVERSIONS: [&str; 2] = ["50x50", "autox140"];

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/bmp", "image/webp"];

/// Object storage for uploaded files.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), MediaError>;

    /// Removes every object under `prefix`, conversions included.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), MediaError>;

    fn url(&self, key: &str) -> String;
}

/// An uploaded image that passed the logo rules.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl ImageUpload {
    /// Record describing where this upload will live once stored.
    pub fn to_new_media(&self, collection: &str) -> NewMedia {
        NewMedia {
            id: Uuid::new_v4(),
            collection: collection.to_string(),
            file_name: format!("{}.{}", collection, self.extension),
            mime_type: self.mime_type.to_string(),
            size: self.bytes.len() as i64,
        }
    }
}

/// Checks the logo rules, returning every failed message.
pub fn inspect_image(bytes: Vec<u8>) -> Result<ImageUpload, Vec<&'static str>> {
    let mut failures = Vec::new();

    let kind = infer::get(&bytes).filter(|kind| IMAGE_MIME_TYPES.contains(&kind.mime_type()));
    if kind.is_none() {
        failures.push("The logo must be an image.");
    }
    if bytes.len() > MAX_LOGO_BYTES {
        failures.push("The logo may not be greater than 2MB.");
    }

    match kind {
        Some(kind) if failures.is_empty() => Ok(ImageUpload {
            bytes,
            mime_type: kind.mime_type(),
            extension: kind.extension(),
        }),
        _ => Err(failures),
    }
}

pub fn directory(id: Uuid) -> String {
    id.to_string()
}

pub fn object_key(id: Uuid, file_name: &str) -> String {
    format!("{}/{}", directory(id), file_name)
}

/// Key of a generated variant: `{id}/conversions/{stem}-{conversion}.{ext}`.
pub fn conversion_key(media: &Media, conversion: &str) -> String {
    let (stem, extension) = media
        .file_name
        .rsplit_once('.')
        .unwrap_or((media.file_name.as_str(), ""));
    if extension.is_empty() {
        format!("{}/conversions/{}-{}", directory(media.id), stem, conversion)
    } else {
        format!("{}/conversions/{}-{}.{}", directory(media.id), stem, conversion, extension)
    }
}

/// Deletes the stored files of detached media. Failures are logged, never raised:
/// the database no longer references these objects.
pub async fn discard(store: &dyn MediaStore, media: &[Media]) {
    for m in media {
        if let Err(err) = store.delete_prefix(&directory(m.id)).await {
            log::warn!("Failed to delete stored files of media {}: {}", m.id, err);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PNG;
    use chrono::Utc;

    #[test]
    fn accepts_png() {
        let upload = inspect_image(PNG.to_vec()).unwrap();
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.extension, "png");
    }

    #[test]
    fn rejects_non_images() {
        let failures = inspect_image(b"%PDF-1.7 not an image".to_vec()).unwrap_err();
        assert_eq!(failures, vec!["The logo must be an image."]);
    }

    #[test]
    fn rejects_oversized_images() {
        let mut bytes = PNG.to_vec();
        bytes.resize(MAX_LOGO_BYTES + 1, 0);
        let failures = inspect_image(bytes).unwrap_err();
        assert_eq!(failures, vec!["The logo may not be greater than 2MB."]);
    }

    #[test]
    fn conversion_keys_sit_next_to_the_original() {
        let id = Uuid::new_v4();
        let media = Media {
            id,
            company_id: 1,
            collection: "logo".into(),
            file_name: "logo.png".into(),
            mime_type: "image/png".into(),
            size: 16,
            created_at: Utc::now(),
        };
        assert_eq!(object_key(id, &media.file_name), format!("{}/logo.png", id));
        assert_eq!(conversion_key(&media, "50x50"), format!("{}/conversions/logo-50x50.png", id));
    }
}
