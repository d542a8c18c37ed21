//! Texture image decoding.

use std::path::Path;
use std::sync::Arc;

use diorama_scene::ImageData;
use image::ImageReader;

use crate::error::AssetError;

/// Decode an image file into RGBA8.
///
/// The format is sniffed from the file contents, so extensions such as
/// `.JPG` work regardless of case.
pub fn load_image(path: &Path) -> Result<Arc<ImageData>, AssetError> {
    let reader = ImageReader::open(path)
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let decoded = reader.decode().map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    tracing::debug!(texture = %name, width, height, "decoded texture");
    Ok(Arc::new(ImageData::new(name, width, height, rgba.into_raw())))
}

/// A 1×1 image of a single RGBA color.
pub fn solid_image(name: &str, rgba: [u8; 4]) -> Arc<ImageData> {
    Arc::new(ImageData::new(name, 1, 1, rgba.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png_as_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.png");
        let mut img = image::RgbaImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 0]));
        img.save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (2, 3));
        assert_eq!(loaded.rgba.len(), 2 * 3 * 4);
        assert_eq!(&loaded.rgba[20..24], &[10, 20, 30, 0]);
        assert_eq!(loaded.name, "tree.png");
    }

    #[test]
    fn test_uppercase_extension_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let png_path = dir.path().join("ground.png");
        image::RgbaImage::new(1, 1).save(&png_path).unwrap();
        let odd_path = dir.path().join("ground.JPG");
        std::fs::rename(&png_path, &odd_path).unwrap();

        assert!(load_image(&odd_path).is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_image(Path::new("/nonexistent/summer_tree.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(load_image(&path).is_err());
    }

    #[test]
    fn test_solid_image() {
        let img = solid_image("white", [255; 4]);
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.rgba, vec![255; 4]);
    }
}
