use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use deunicode::deunicode_char;
use mockall::automock;
use photosync_core::photo::RemotePhoto;

pub const EXIFTOOL_PROGRAM: &str = "exiftool";

/// Descriptive fields written into the image IPTC block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFields {
    pub headline: String,
    pub caption: String,
    pub keywords: Vec<String>,
}

impl TextFields {
    pub fn from_photo(photo: &RemotePhoto) -> Self {
        let mut keywords: Vec<String> = vec![];
        for tag in &photo.tags {
            let keyword = quote_keyword(&to_latin1(&tag.raw));
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword)
            }
        }

        Self {
            headline: to_latin1(&photo.title),
            caption: to_latin1(&photo.description),
            keywords,
        }
    }
}

/// Keep characters representable in ISO-8859-1, transliterate the others or
/// drop them when no ASCII approximation exists
pub fn to_latin1(text: &str) -> String {
    let mut converted = String::with_capacity(text.len());
    for character in text.chars() {
        if (character as u32) < 0x100 {
            converted.push(character)
        } else if let Some(approximation) = deunicode_char(character) {
            converted.push_str(approximation)
        }
    }
    converted
}

fn quote_keyword(keyword: &str) -> String {
    let keyword = keyword.trim();
    if keyword.contains(char::is_whitespace) {
        format!("\"{}\"", keyword)
    } else {
        keyword.to_string()
    }
}

#[automock]
pub trait MetadataEmbedder {
    fn embed_text_fields(&self, image_path: &Path, fields: &TextFields) -> Result<()>;
}

/// Embed with the `exiftool` program, text stored with Latin-1 charset
pub struct ExifTool {
    program: PathBuf,
}

impl ExifTool {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(EXIFTOOL_PROGRAM),
        }
    }

    pub fn with_program(program: PathBuf) -> Self {
        Self { program }
    }

    fn arguments(image_path: &Path, fields: &TextFields) -> Vec<String> {
        let mut arguments = vec![
            "-q".to_string(),
            "-overwrite_original".to_string(),
            "-charset".to_string(),
            "iptc=Latin".to_string(),
            format!("-IPTC:Headline={}", fields.headline),
            format!("-IPTC:Caption-Abstract={}", fields.caption),
        ];
        if fields.keywords.is_empty() {
            arguments.push("-IPTC:Keywords=".to_string())
        }
        for keyword in &fields.keywords {
            arguments.push(format!("-IPTC:Keywords={}", keyword))
        }
        arguments.push(image_path.display().to_string());
        arguments
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataEmbedder for ExifTool {
    fn embed_text_fields(&self, image_path: &Path, fields: &TextFields) -> Result<()> {
        log::debug!("Embed text fields into {}", image_path.display());
        let output = Command::new(&self.program)
            .args(Self::arguments(image_path, fields))
            .output()
            .context(format!("Unable to run {}", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "{} failed on {}: {}",
                self.program.display(),
                image_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )
        }

        Ok(())
    }
}
