use std::path::Path;

use base64::Engine;

use crate::imaging::domain::image_loader::{ImageLoader, LoadError};
use crate::imaging::domain::image_source::ImageSource;
use crate::shared::face_image::FaceImage;

/// Decodes images with the `image` crate into 3-channel RGB buffers.
///
/// Handles filesystem paths, in-memory bytes, `data:image/...;base64,` URIs
/// and, when `allow_network` is set, `http(s)://` URLs.
pub struct ImageFileLoader {
    allow_network: bool,
}

impl ImageFileLoader {
    pub fn new() -> Self {
        Self {
            allow_network: true,
        }
    }

    pub fn with_network(mut self, allow: bool) -> Self {
        self.allow_network = allow;
        self
    }

    fn load_path(&self, path: &Path) -> Result<FaceImage, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| LoadError::Unreadable {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        decode(&bytes, &path.display().to_string())
    }

    fn load_uri(&self, uri: &str) -> Result<FaceImage, LoadError> {
        if has_scheme(uri, "data") {
            let bytes = decode_data_uri(uri)?;
            return decode(&bytes, "data uri");
        }
        if !self.allow_network {
            return Err(LoadError::InvalidReference(format!(
                "network sources are disabled: {uri}"
            )));
        }
        let bytes = fetch(uri)?;
        decode(&bytes, uri)
    }
}

impl Default for ImageFileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader for ImageFileLoader {
    fn load(&self, source: &ImageSource) -> Result<FaceImage, LoadError> {
        log::debug!("Loading image {source}");
        match source {
            ImageSource::Path(path) => self.load_path(path),
            ImageSource::Bytes(bytes) => decode(bytes, "in-memory image"),
            ImageSource::Uri(uri) => self.load_uri(uri),
        }
    }
}

fn decode(bytes: &[u8], source_name: &str) -> Result<FaceImage, LoadError> {
    let rgb = image::load_from_memory(bytes)
        .map_err(|e| LoadError::Undecodable {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(LoadError::Undecodable {
            source_name: source_name.to_string(),
            reason: "image has zero dimensions".to_string(),
        });
    }
    Ok(FaceImage::new(rgb.into_raw(), width, height, 3))
}

/// Schemes are case-insensitive.
fn has_scheme(uri: &str, scheme: &str) -> bool {
    uri.split_once(':')
        .is_some_and(|(s, _)| s.eq_ignore_ascii_case(scheme))
}

/// Extracts the payload of a `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, LoadError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidReference("data uri has no payload".to_string()))?;
    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err(LoadError::InvalidReference(
            "only base64 data uris are supported".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| LoadError::Undecodable {
            source_name: "data uri".to_string(),
            reason: e.to_string(),
        })
}

fn fetch(url: &str) -> Result<Vec<u8>, LoadError> {
    let unreadable = |e: reqwest::Error| LoadError::Unreadable {
        source_name: url.to_string(),
        reason: e.to_string(),
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(unreadable)?;
    Ok(response.bytes().map_err(unreadable)?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_loads_png_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("face.png");
        std::fs::write(&path, png_bytes(8, 6, [10, 20, 30])).unwrap();

        let image = ImageFileLoader::new()
            .load(&ImageSource::Path(path))
            .unwrap();

        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 6);
        assert_eq!(image.channels(), 3);
        assert_eq!(&image.data()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_loads_in_memory_bytes() {
        let image = ImageFileLoader::new()
            .load(&ImageSource::Bytes(png_bytes(4, 4, [255, 0, 0])))
            .unwrap();
        assert_eq!(image.width(), 4);
        assert_eq!(image.data()[0], 255);
    }

    #[test]
    fn test_loads_base64_data_uri() {
        let payload = base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 2, [1, 2, 3]));
        let uri = format!("data:image/png;base64,{payload}");

        let image = ImageFileLoader::new()
            .load(&ImageSource::parse(&uri))
            .unwrap();

        assert_eq!((image.width(), image.height()), (3, 2));
    }

    #[rstest]
    #[case::upper("DATA:image/png;BASE64,")]
    #[case::mixed("Data:image/png;base64,")]
    fn test_data_uri_scheme_is_case_insensitive(#[case] prefix: &str) {
        let payload = base64::engine::general_purpose::STANDARD.encode(png_bytes(2, 2, [9, 9, 9]));
        let uri = format!("{prefix}{payload}");

        let image = ImageFileLoader::new()
            .with_network(false)
            .load(&ImageSource::parse(&uri))
            .unwrap();

        assert_eq!((image.width(), image.height()), (2, 2));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let result = ImageFileLoader::new().load(&ImageSource::parse("/definitely/not/here.png"));
        assert!(matches!(result, Err(LoadError::Unreadable { .. })));
    }

    #[test]
    fn test_garbage_bytes_are_undecodable() {
        let result = ImageFileLoader::new().load(&ImageSource::Bytes(vec![1, 2, 3, 4]));
        assert!(matches!(result, Err(LoadError::Undecodable { .. })));
    }

    #[test]
    fn test_non_base64_data_uri_is_rejected() {
        let result = ImageFileLoader::new().load(&ImageSource::parse("data:image/png,rawbytes"));
        assert!(matches!(result, Err(LoadError::InvalidReference(_))));
    }

    #[test]
    fn test_network_can_be_disabled() {
        let loader = ImageFileLoader::new().with_network(false);
        let result = loader.load(&ImageSource::parse("https://example.com/a.jpg"));
        assert!(matches!(result, Err(LoadError::InvalidReference(_))));
    }
}
