// WHY: output naming and skip checks for batch cleaning
// A cleaned copy sits next to its source as <stem>_clean.txt so reruns can skip finished work

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the source stem for cleaned output
pub const CLEAN_SUFFIX: &str = "_clean";

/// Generate output path from source file path
pub fn generate_clean_file_path(source_path: &Path) -> PathBuf {
    let mut clean_path = source_path.to_path_buf();
    let file_stem = clean_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    clean_path.set_file_name(format!("{file_stem}{CLEAN_SUFFIX}.txt"));
    clean_path
}

/// True for files this tool wrote itself
/// WHY: batch runs over a directory listing must not clean their own output again
pub fn is_clean_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(CLEAN_SUFFIX))
}

/// Check if cleaned output exists for given source file
pub fn clean_file_exists<P: AsRef<Path>>(source_path: P) -> bool {
    generate_clean_file_path(source_path.as_ref()).exists()
}

/// Read cleaned output for given source file
///
/// # Example
/// ```no_run
/// use mistype::incremental::read_clean_file;
/// let content = read_clean_file("worksheets/week-3.txt").expect("Failed to read cleaned file");
/// ```
pub fn read_clean_file<P: AsRef<Path>>(source_path: P) -> Result<String, io::Error> {
    fs::read_to_string(generate_clean_file_path(source_path.as_ref()))
}

/// Write cleaned output (async), returning the path written
/// Content is written exactly as given; no trailing newline is added
pub async fn write_clean_file_async<P: AsRef<Path>>(source_path: P, content: &str) -> Result<PathBuf, io::Error> {
    let clean_path = generate_clean_file_path(source_path.as_ref());
    tokio::fs::write(&clean_path, content).await?;
    Ok(clean_path)
}
