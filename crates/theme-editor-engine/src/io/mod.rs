use crate::editing::Document;
use crate::markup::{self, MarkupError, MarkupOptions};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid theme source in {path}: {source}")]
    Markup {
        path: PathBuf,
        #[source]
        source: MarkupError,
    },
    #[error("Invalid themes directory: {0}")]
    InvalidThemesDir(String),
}

/// Read and parse a theme file
pub fn read_theme(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let source = fs::read_to_string(path).map_err(IoError::Io)?;
    markup::parse(&source).map_err(|source| IoError::Markup {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a document to a theme file
pub fn write_theme(path: &Path, doc: &Document, options: &MarkupOptions) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, markup::serialize(doc, options)).map_err(IoError::Io)
}

/// Save for good: display-only titles are dropped when `strip_titles` is set
pub fn save_theme(path: &Path, doc: &Document, strip_titles: bool) -> anyhow::Result<()> {
    let options = MarkupOptions {
        include_titles: !strip_titles,
    };
    write_theme(path, doc, &options)
        .with_context(|| format!("Failed to save theme to {}", path.display()))?;
    log::info!("saved theme to {}", path.display());
    Ok(())
}

/// Scan for theme files (`*.html`) in the themes directory
pub fn scan_theme_files(themes_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    validate_themes_dir(themes_root)?;

    let mut files = Vec::new();
    scan_directory_recursive(themes_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "html"
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_themes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidThemesDir(
            "themes directory not found".to_string(),
        ));
    }

    Ok(())
}
