//! Resolver response shapes.
//!
//! Each strategy recognizes one JSON layout and returns a typed extraction or
//! `None`. Strategies are tried in a fixed priority order; the first hit wins.

use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// A direct link recovered from a resolver response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub direct_link: Url,
    pub file_name: Option<String>,
    /// Number of file entries the response listed.
    pub file_count: usize,
}

/// One known resolver response layout.
pub trait ExtractionStrategy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the extraction if `body` has this layout and carries a usable link.
    fn extract(&self, body: &Value) -> Option<Extraction>;
}

/// `{"isFolder": false, "files": [{"direct_link": "..."}]}`
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesArray;

// Entries stay untyped so a malformed entry after the first cannot hide it.
#[derive(Deserialize)]
struct FilesShape {
    files: Vec<Value>,
}

impl ExtractionStrategy for FilesArray {
    fn name(&self) -> &'static str {
        "files_array"
    }

    fn extract(&self, body: &Value) -> Option<Extraction> {
        let shape = FilesShape::deserialize(body).ok()?;
        let first = shape.files.first()?;
        let direct_link = parse_link(string_field(first, &["direct_link"])?)?;

        Some(Extraction {
            direct_link,
            file_name: non_empty(string_field(first, &["file_name", "filename"])),
            file_count: shape.files.len(),
        })
    }
}

/// `{"status": "success", "Extracted Info": [{"Direct Download Link": "...", "Title": "..."}]}`
///
/// Some deployments prefix the keys with emoji (`📜 Extracted Info`, `✅ Status`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractedInfo;

#[derive(Deserialize)]
struct ExtractedShape {
    #[serde(rename = "Extracted Info", alias = "📜 Extracted Info")]
    info: Vec<Value>,
    #[serde(rename = "status", alias = "✅ Status")]
    status: Option<String>,
}

impl ExtractionStrategy for ExtractedInfo {
    fn name(&self) -> &'static str {
        "extracted_info"
    }

    fn extract(&self, body: &Value) -> Option<Extraction> {
        let shape = ExtractedShape::deserialize(body).ok()?;
        if let Some(status) = &shape.status {
            if !status.trim().eq_ignore_ascii_case("success") {
                return None;
            }
        }
        let first = shape.info.first()?;
        let direct_link = parse_link(string_field(first, &["Direct Download Link"])?)?;

        Some(Extraction {
            direct_link,
            file_name: non_empty(string_field(first, &["Title"])),
            file_count: shape.info.len(),
        })
    }
}

/// Strategies in the order they are tried.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![Box::new(FilesArray), Box::new(ExtractedInfo)]
}

/// Reads the top-level folder flag (`isFolder`, or `is_folder`).
pub fn folder_flag(body: &Value) -> bool {
    #[derive(Deserialize)]
    struct Flag {
        #[serde(rename = "isFolder", alias = "is_folder", default)]
        is_folder: bool,
    }

    Flag::deserialize(body).map(|f| f.is_folder).unwrap_or(false)
}

/// First of `keys` holding a string in the `entry` object.
fn string_field<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| entry.get(*key)?.as_str())
}

/// Accepts only absolute http(s) URLs with a host.
fn parse_link(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
