/*!
 * Tests for file utility functions
 */

use std::fs;
use anyhow::Result;
use storycast::file_utils::FileManager;
use crate::common;

/// Test file existence checking
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file_path = common::create_test_file(temp_dir.path(), "story.txt", "Once upon a time")?;

    assert!(FileManager::file_exists(&file_path));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.txt")));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test directory creation
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAllLevels() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("c");

    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));

    // Second call is a no-op
    FileManager::ensure_dir(&nested)?;
    Ok(())
}

/// Test output path generation keeps the file name
#[test]
fn test_generate_output_path_withInputFile_shouldKeepFileName() {
    let output = FileManager::generate_output_path("/recordings/take1.wav", "/recordings/trimmed");
    assert_eq!(output, std::path::PathBuf::from("/recordings/trimmed/take1.wav"));
}

/// Test extension list parsing
#[test]
fn test_parse_extensions_withMixedFormatting_shouldNormalize() {
    let extensions = FileManager::parse_extensions(".MP3, wav,,.flac ,mp3");
    assert_eq!(extensions, vec!["mp3", "wav", "flac"]);
}

/// Test file discovery is flat, filtered and sorted
#[test]
fn test_find_files_with_extensions_shouldMatchCaseInsensitivelyAndSkipSubdirs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.wav", "")?;
    common::create_test_file(temp_dir.path(), "a.MP3", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    fs::create_dir(temp_dir.path().join("nested"))?;
    common::create_test_file(&temp_dir.path().join("nested"), "c.wav", "")?;

    let extensions = FileManager::parse_extensions(".mp3,.wav");
    let files = FileManager::find_files_with_extensions(temp_dir.path(), &extensions)?;
    let names: Vec<String> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.MP3", "b.wav"]);
    Ok(())
}

/// Test reading story lines drops blank lines
#[test]
fn test_read_story_lines_withBlankLines_shouldKeepOnlyText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_story_file(temp_dir.path(), "story.txt")?;

    let lines = FileManager::read_story_lines(&path)?;
    assert_eq!(lines, common::sample_story());
    Ok(())
}

/// Indentation and trailing spaces of kept lines are preserved
#[test]
fn test_read_story_lines_withIndentedLines_shouldKeepThemAsWritten() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "story.txt", "  Mara: Wait. \n\t\n\tTom: Why?\n")?;

    let lines = FileManager::read_story_lines(&path)?;
    assert_eq!(lines, vec!["  Mara: Wait. ".to_string(), "\tTom: Why?".to_string()]);
    Ok(())
}

/// Test writing creates the parent directory
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("script.txt");

    FileManager::write_to_file(&path, "hello")?;
    assert_eq!(FileManager::read_to_string(&path)?, "hello");
    Ok(())
}

/// Different spellings of one directory resolve to the same location
#[test]
fn test_sameLocation_shouldCompareResolvedPaths() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("takes");
    fs::create_dir_all(&nested)?;

    assert!(FileManager::same_location(temp_dir.path(), nested.join("..")));
    assert!(FileManager::same_location(&nested, nested.join(".")));
    assert!(!FileManager::same_location(temp_dir.path(), &nested));
    assert!(!FileManager::same_location(&nested, nested.join("missing")));
    Ok(())
}
