use anyhow::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Check that `path` names an existing regular file
pub fn validate_input_file(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }
    if !path.exists() {
        anyhow::bail!("File {} doesn't exist", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }
    Ok(())
}

/// Open an input file for buffered line reading
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
    Ok(BufReader::new(file))
}

/// Display version information
pub fn display_version() {
    println!("LSM Lineage v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Compaction lineage and tree height analysis for LSM trace logs.");
}
