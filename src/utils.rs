use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create `dir` and its parents if missing
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// File name used for the rendered source of page `page_number`
pub fn page_file_name(page_number: usize) -> String {
    format!("page-{page_number}.html")
}

/// Save the rendered source of a page, returning the written path
pub fn save_page(dir: &Path, page_number: usize, html: &str) -> io::Result<PathBuf> {
    ensure_directory(dir)?;
    let path = dir.join(page_file_name(page_number));
    fs::write(&path, html)?;
    ::log::debug!("Saved page {} to {}", page_number, path.display());
    Ok(path)
}

/// Read all saved pages in `dir`, sorted by page number
pub fn read_page_files(dir: &Path) -> io::Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number(&path) {
            let content = fs::read_to_string(&path)?;
            files.push((number, path, content));
        }
    }

    files.sort_by_key(|(number, _, _)| *number);
    Ok(files
        .into_iter()
        .map(|(_, path, content)| (path, content))
        .collect())
}

/// Page number of a `page-<n>.html` path
fn page_number(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix("page-")?
        .strip_suffix(".html")?
        .parse()
        .ok()
}
