use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::FileMetadata,
    storage::Storage,
    utils::file::user_thumbnail_key,
};

pub const THUMBNAIL_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const THUMBNAIL_SIZES: [ThumbnailSize; 2] = [
    ThumbnailSize { name: "small", width: 150, height: 150 },
    ThumbnailSize { name: "medium", width: 300, height: 300 },
];

/// Name of a stored thumbnail: `<file id>-<size>.jpg`.
pub fn thumbnail_name(file_id: Uuid, size: &ThumbnailSize) -> String {
    format!("{}-{}.jpg", file_id, size.name)
}

/// Storage keys of every thumbnail a file may have.
pub fn thumbnail_keys(user_id: Uuid, file_id: Uuid) -> Vec<String> {
    THUMBNAIL_SIZES
        .iter()
        .map(|size| user_thumbnail_key(user_id, &thumbnail_name(file_id, size)))
        .collect()
}

pub struct ImageProcessor;

impl ImageProcessor {
    /// Dimensions and container format of an image upload, without decoding
    /// the pixel data. Unreadable images yield `None`.
    pub fn extract_metadata(data: &[u8], mime_type: &str) -> Option<FileMetadata> {
        if !mime_type.starts_with("image/") {
            return None;
        }

        let reader = match image::io::Reader::new(Cursor::new(data)).with_guessed_format() {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!("Failed to read image header: {}", e);
                return None;
            }
        };
        let format = reader.format().map(format_name);

        match reader.into_dimensions() {
            Ok((width, height)) => Some(FileMetadata {
                width: i32::try_from(width).ok(),
                height: i32::try_from(height).ok(),
                duration: None,
                bitrate: None,
                format,
            }),
            Err(e) => {
                tracing::warn!("Failed to extract image metadata: {}", e);
                None
            }
        }
    }

    /// Cover-crops the image to `size` and encodes it as JPEG.
    pub fn render_thumbnail(image: &DynamicImage, size: &ThumbnailSize) -> Result<Vec<u8>> {
        let thumbnail = image
            .resize_to_fill(size.width, size.height, FilterType::Lanczos3)
            .to_rgb8();

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, THUMBNAIL_QUALITY)
            .encode(
                thumbnail.as_raw(),
                thumbnail.width(),
                thumbnail.height(),
                image::ColorType::Rgb8,
            )
            .map_err(|e| AppError::Storage(format!("Failed to encode thumbnail: {}", e)))?;

        Ok(buffer)
    }

    /// Decodes once and renders every configured size.
    pub fn render_thumbnails(data: &[u8]) -> Result<Vec<(ThumbnailSize, Vec<u8>)>> {
        let image = image::load_from_memory(data)
            .map_err(|e| AppError::Validation(format!("Failed to decode image: {}", e)))?;

        THUMBNAIL_SIZES
            .iter()
            .map(|size| Ok((*size, Self::render_thumbnail(&image, size)?)))
            .collect()
    }

    /// Renders the thumbnails on the blocking pool and writes them under the
    /// owner's `thumbs/` directory. Returns the stored keys.
    pub async fn generate_thumbnails(
        storage: &dyn Storage,
        user_id: Uuid,
        file_id: Uuid,
        data: Vec<u8>,
    ) -> Result<Vec<String>> {
        let rendered = tokio::task::spawn_blocking(move || Self::render_thumbnails(&data))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Thumbnail task failed: {}", e)))??;

        let mut keys = Vec::with_capacity(rendered.len());
        for (size, bytes) in rendered {
            let key = user_thumbnail_key(user_id, &thumbnail_name(file_id, &size));
            storage.store(&key, &bytes).await?;
            keys.push(key);
        }

        tracing::debug!("Generated {} thumbnails for file {}", keys.len(), file_id);
        Ok(keys)
    }
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 128]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_extract_metadata() {
        let metadata = ImageProcessor::extract_metadata(&png(640, 480), "image/png").unwrap();
        assert_eq!(metadata.width, Some(640));
        assert_eq!(metadata.height, Some(480));
        assert_eq!(metadata.format.as_deref(), Some("png"));

        assert!(ImageProcessor::extract_metadata(b"not an image", "image/png").is_none());
        assert!(ImageProcessor::extract_metadata(&png(1, 1), "text/plain").is_none());
    }

    #[test]
    fn test_thumbnails_are_cover_cropped_jpegs() {
        let rendered = ImageProcessor::render_thumbnails(&png(800, 200)).unwrap();
        assert_eq!(rendered.len(), 2);

        for (size, bytes) in rendered {
            let thumb = image::load_from_memory(&bytes).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
            assert_eq!((thumb.width(), thumb.height()), (size.width, size.height));
        }
    }

    #[tokio::test]
    async fn test_generate_thumbnails_writes_under_thumbs() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();
        let (user_id, file_id) = (Uuid::new_v4(), Uuid::new_v4());

        let keys = ImageProcessor::generate_thumbnails(&storage, user_id, file_id, png(64, 64))
            .await
            .unwrap();

        assert_eq!(keys, thumbnail_keys(user_id, file_id));
        assert!(keys[0].ends_with(&format!("thumbs/{}-small.jpg", file_id)));
        for key in keys {
            assert!(storage.exists(&key).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_generate_thumbnails_rejects_garbage() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        let result =
            ImageProcessor::generate_thumbnails(&storage, Uuid::new_v4(), Uuid::new_v4(), b"nope".to_vec()).await;
        assert!(result.is_err());
    }
}
