//! Main entry point for the rezip CLI application.
//!
//! Lists and extracts archives like `unzip`, and rewrites them in place
//! when entries are added or deleted or the comment changes.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use rezip::codec::Deflater;
use rezip::zip::{Extracted, Progress};
use rezip::{ArchiveStore, Cli, LocalFile, ReadOptions, ZipArchive, ZipEntry, ZipExtractor};

/// Application entry point.
///
/// Parses command-line arguments, applies any edits and then lists or
/// extracts the archive.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let store = LocalFile::new(&cli.file);
    let options = ReadOptions {
        deep_search: cli.deep_search,
        read_entries: false,
        no_sort: cli.no_sort,
    };

    if cli.is_mutating() {
        let mut archive = open_archive(&store, options, !cli.add.is_empty()).await?;
        edit_archive(&mut archive, &store, &cli).await?;
        if cli.list || cli.verbose {
            list_files(&mut archive, cli.verbose)?;
        }
        return Ok(());
    }

    let mut archive = open_archive(&store, options, false).await?;
    process_zip(&mut archive, &cli).await
}

/// Open the archive at `store`, or start an empty one when `create` is set
/// and nothing exists yet.
async fn open_archive(store: &LocalFile, options: ReadOptions, create: bool) -> Result<ZipArchive> {
    if create && !store.exists().await? {
        log::info!("Creating new archive {}", store.path().display());
        return Ok(ZipArchive::new(options));
    }
    let data = store
        .load()
        .await
        .with_context(|| format!("cannot read {}", store.path().display()))?;
    ZipArchive::from_buffer(data, options).with_context(|| format!("{} is not a valid archive", store.path().display()))
}

/// Prints one line per entry while the archive is being written.
struct Reporter {
    quiet: bool,
}

impl Progress for Reporter {
    fn item_end(&mut self, name: &str) {
        if !self.quiet {
            println!("  writing: {name}");
        }
    }
}

/// Apply `--add`, `--delete` and `--comment`, then save the archive.
async fn edit_archive(archive: &mut ZipArchive, store: &LocalFile, cli: &Cli) -> Result<()> {
    for path in &cli.add {
        add_path(archive, Path::new(path), cli.is_quiet()).await?;
    }

    for name in &cli.delete {
        if !archive.delete_entry(name)? && !cli.is_very_quiet() {
            eprintln!("Not found: {name}");
        }
    }

    if let Some(comment) = &cli.comment {
        archive.set_comment(comment);
    }

    let mut reporter = Reporter { quiet: cli.is_quiet() };
    let bytes = archive
        .compress_to_buffer_async(&Deflater::default(), &mut reporter)
        .await?;
    store
        .save(&bytes)
        .await
        .with_context(|| format!("cannot write {}", store.path().display()))?;

    if !cli.is_quiet() {
        println!(
            "Wrote {} ({} entries, {})",
            cli.file,
            archive.entry_count(),
            format_size(bytes.len() as u64)
        );
    }
    Ok(())
}

/// Add a file, or a directory and everything below it.
///
/// An existing entry with the same name is replaced.
async fn add_path(archive: &mut ZipArchive, root: &Path, quiet: bool) -> Result<()> {
    let mut pending = vec![root.to_path_buf()];

    while let Some(path) = pending.pop() {
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("cannot add {}", path.display()))?;
        let name = path.to_string_lossy().replace('\\', "/");

        let mut entry = if metadata.is_dir() {
            let mut children = Vec::new();
            let mut dir = tokio::fs::read_dir(&path).await?;
            while let Some(child) = dir.next_entry().await? {
                children.push(child.path());
            }
            // Popped from the end, so reverse order keeps the walk alphabetical
            children.sort_by(|a, b| b.cmp(a));
            pending.extend(children);
            ZipEntry::new(&format!("{}/", name.trim_end_matches('/')))
        } else {
            let data = tokio::fs::read(&path).await?;
            ZipEntry::with_data(&name, data)
        };

        if let Ok(modified) = metadata.modified() {
            if let Ok(timestamp) = jiff::Timestamp::try_from(modified) {
                entry.set_time(timestamp.to_zoned(jiff::tz::TimeZone::system()).datetime());
            }
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            entry.set_unix_mode(metadata.permissions().mode());
        }

        if entry.name().is_empty() {
            continue;
        }
        if !quiet {
            println!("  adding: {}", entry.name());
        }
        stage_entry(archive, entry)?;
    }

    Ok(())
}

/// Put `entry` into the archive, replacing a file of the same name. An
/// existing directory marker is kept, since deleting it would also drop
/// everything archived beneath it.
fn stage_entry(archive: &mut ZipArchive, entry: ZipEntry) -> Result<()> {
    match archive.entry(entry.name())?.map(ZipEntry::is_directory) {
        Some(true) => {
            log::debug!("Keeping existing directory {}", entry.name());
            return Ok(());
        }
        Some(false) => {
            log::debug!("Replacing {}", entry.name());
            archive.delete_entry(entry.name())?;
        }
        None => {}
    }
    archive.set_entry(entry)?;
    Ok(())
}

/// Process a ZIP archive based on CLI options.
///
/// This function handles the read-only modes:
/// - Comment mode (`-z`): Display the archive comment
/// - List mode (`-l` or `-v`): Display archive contents
/// - Extract mode: Extract files matching the specified filters
async fn process_zip(archive: &mut ZipArchive, cli: &Cli) -> Result<()> {
    if cli.show_comment {
        println!("{}", archive.comment());
        if !(cli.list || cli.verbose) {
            return Ok(());
        }
    }

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        return list_files(archive, cli.verbose);
    }

    let base = cli.extract_dir.as_deref().map(PathBuf::from).unwrap_or_default();
    let extractor = ZipExtractor::new(base, Deflater::default()).overwrite(cli.overwrite && !cli.never_overwrite);

    // Directories are created on demand unless everything is extracted
    let entries = archive.entries()?;
    let files_to_extract: Vec<&ZipEntry> = entries
        .iter()
        .filter(|e| !e.is_directory() || (cli.files.is_empty() && !cli.pipe))
        .filter(|e| cli.files.is_empty() || cli.files.iter().any(|f| matches_request(f, e.name())))
        .filter(|e| !cli.exclude.iter().any(|x| e.name().contains(x.as_str()) || glob_match(x, e.name())))
        .collect();

    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    for entry in files_to_extract {
        extract_file(&extractor, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// Whether a positional argument selects the entry `name`.
///
/// Patterns with wildcards are globbed against the full name; plain
/// arguments match the full name or its last component.
fn matches_request(request: &str, name: &str) -> bool {
    if has_glob_chars(request) {
        return glob_match(request, name);
    }
    let basename = name.trim_end_matches('/').rsplit('/').next().unwrap_or(name);
    name == request || basename == request
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Detailed table with size, compression ratio, and timestamps
fn list_files(archive: &mut ZipArchive, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in archive.entries()? {
        let header = entry.header();
        if !verbose {
            println!("{}", entry.name());
            continue;
        }

        let when = entry
            .time()
            .map(|dt| dt.strftime("%Y-%m-%d  %H:%M").to_string())
            .unwrap_or_else(|| format!("{:>17}", "-"));
        println!(
            "{:>10}  {:>10}  {}  {}  {}",
            header.size(),
            header.compressed_size(),
            ratio(header.compressed_size(), header.size()),
            when,
            entry.name()
        );

        if !entry.is_directory() {
            total_uncompressed += header.size();
            total_compressed += header.compressed_size();
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>17}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
        let comment = archive.comment();
        if !comment.is_empty() {
            println!("{comment}");
        }
    }

    Ok(())
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 || compressed >= uncompressed {
        return "  0%".to_string();
    }
    format!("{:>4}%", 100 - compressed * 100 / uncompressed)
}

/// Extract a single entry from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Overwrite control (`-n`, `-o`): Handle existing files
async fn extract_file(
    extractor: &ZipExtractor<Deflater>,
    entry: &ZipEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    // Pipe mode: write file contents directly to stdout
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.name()).as_bytes())
                .await?;
        }
        extractor.extract_to_stdout(entry).await?;
        return Ok(());
    }

    let result = extractor
        .extract_entry(entry)
        .await
        .with_context(|| format!("cannot extract {}", entry.name()))?;

    if cli.is_quiet() {
        return Ok(());
    }
    match result {
        Extracted::Written(_) => println!("  inflating: {}", entry.name()),
        Extracted::Directory(_) => println!("   creating: {}", entry.name()),
        Extracted::Skipped(_) if cli.never_overwrite => {
            eprintln!("Skipping: {} (file exists)", entry.name())
        }
        Extracted::Skipped(_) => eprintln!("Skipping: {} (use -o to overwrite)", entry.name()),
    }

    Ok(())
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Skip the star, or let it swallow one more character
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
