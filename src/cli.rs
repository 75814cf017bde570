use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rezip")]
#[command(version)]
#[command(about = "List, extract and edit ZIP archives, including ZIP64", long_about = None)]
#[command(after_help = "Examples:\n  \
  rezip data1.zip -x joe             extract all files except joe from data1.zip\n  \
  rezip -p foo.zip | more            send contents of foo.zip via pipe into more\n  \
  rezip new.zip --add src README.md  create new.zip from a directory and a file\n  \
  rezip old.zip --delete build/      remove build/ and everything below it")]
pub struct Cli {
    /// ZIP file path
    #[arg(value_name = "ARCHIVE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "PATTERN", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Display archive comment
    #[arg(short = 'z')]
    pub show_comment: bool,

    /// Add files or directories; the archive is created if missing
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub add: Vec<String>,

    /// Delete entries; deleting a directory deletes its contents
    #[arg(long, value_name = "NAME", num_args = 1..)]
    pub delete: Vec<String>,

    /// Set the archive comment
    #[arg(long, value_name = "TEXT")]
    pub comment: Option<String>,

    /// Keep entry order instead of sorting by name when rewriting
    #[arg(long)]
    pub no_sort: bool,

    /// Scan the whole file for the end of central directory record
    #[arg(long)]
    pub deep_search: bool,
}

impl Cli {
    /// Whether any flag asks for the archive to be rewritten.
    pub fn is_mutating(&self) -> bool {
        !self.add.is_empty() || !self.delete.is_empty() || self.comment.is_some()
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
