//! Minimal plain-text document loader
//!
//! Reads `.txt`/`.md` files into `Document`s with the file stem as title.
//! Form feeds (`\f`) act as page separators; paginated files produce one
//! document per page carrying a `page` metadata entry so answers can cite
//! page numbers.

use anyhow::{bail, Context};
use docucite_core::Document;
use std::path::Path;

pub fn load_documents(paths: &[std::path::PathBuf]) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        documents.extend(load_file(path)?);
    }
    Ok(documents)
}

fn load_file(path: &Path) -> anyhow::Result<Vec<Document>> {
    let title = match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem.to_string(),
        None => bail!("Cannot derive a title from path `{}`", path.display()),
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read `{}`", path.display()))?;

    if !content.contains('\u{c}') {
        return Ok(vec![Document::new(content).with_title(title)]);
    }

    Ok(content
        .split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| {
            Document::new(page)
                .with_title(title.clone())
                .with_metadata("page", (i + 1).to_string())
        })
        .collect())
}
