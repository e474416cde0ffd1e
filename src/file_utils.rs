use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path keeping the input's file name and extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
    ) -> PathBuf {
        let file_name = input_file.as_ref().file_name().unwrap_or_default();
        output_dir.as_ref().join(file_name)
    }

    /// Whether two existing paths resolve to the same file or directory
    pub fn same_location<P1: AsRef<Path>, P2: AsRef<Path>>(a: P1, b: P2) -> bool {
        match (fs::canonicalize(a.as_ref()), fs::canonicalize(b.as_ref())) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Normalize a comma separated extension list: lowercase, no dots, no blanks
    pub fn parse_extensions(list: &str) -> Vec<String> {
        let mut extensions: Vec<String> = Vec::new();
        for ext in list.split(',') {
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
        extensions
    }

    /// Files directly inside `dir` whose extension is in `extensions`, sorted by path
    pub fn find_files_with_extensions<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if extensions.iter().any(|e| *e == ext) {
                    result.push(path.to_path_buf());
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Read and deserialize a JSON file
    pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
        let content = Self::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON file: {:?}", path.as_ref()))
    }

    /// Serialize to pretty JSON and overwrite the file
    pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize JSON for: {:?}", path.as_ref()))?;
        Self::write_to_file(path, &json)
    }

    /// Read a text file and keep its non-blank lines
    pub fn read_story_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let content = Self::read_to_string(path)?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}
