use std::fmt;
use std::path::PathBuf;

/// Where an image comes from.
///
/// Callers usually build this with [`ImageSource::parse`], which accepts
/// plain filesystem paths as well as `file://`, `data:` and `http(s)://`
/// references.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    /// Encoded image bytes already in memory (bundled assets, decoded data URIs).
    Bytes(Vec<u8>),
    /// A URI the loader resolves itself (currently `http` and `https`).
    Uri(String),
}

impl ImageSource {
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        if let Some(path) = trimmed.strip_prefix("file://") {
            return ImageSource::Path(PathBuf::from(path));
        }
        let scheme = trimmed
            .split_once(':')
            .map(|(s, _)| s.to_ascii_lowercase())
            .unwrap_or_default();
        match scheme.as_str() {
            "http" | "https" | "data" => ImageSource::Uri(trimmed.to_string()),
            _ => ImageSource::Path(PathBuf::from(trimmed)),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(p) => write!(f, "Path({})", p.display()),
            ImageSource::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            ImageSource::Uri(u) if u.chars().count() > 64 => {
                write!(f, "Uri({}...)", u.chars().take(64).collect::<String>())
            }
            ImageSource::Uri(u) => write!(f, "Uri({u})"),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(p) => write!(f, "{}", p.display()),
            ImageSource::Bytes(b) => write!(f, "<{} bytes in memory>", b.len()),
            ImageSource::Uri(u) if u.starts_with("data:") => write!(f, "<data uri>"),
            ImageSource::Uri(u) => write!(f, "{u}"),
        }
    }
}
