//! Apply one command to every Office file a glob pattern matches

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::facade::{Editor, FileKind};
use globset::GlobBuilder;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// A command the batch can run on each file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchCommand {
    /// Succeeds when at least one replacement was made
    Replace { old: String, new: String },
    /// Word only; succeeds when a paragraph was removed
    Delete { search: String },
}

impl BatchCommand {
    /// Build a command from its name and positional arguments. Fails before
    /// any file is touched.
    pub fn parse(name: &str, args: &[String]) -> Result<Self> {
        match name {
            "replace" => match args {
                [old, new, ..] => {
                    if old.is_empty() {
                        return Err(Error::InvalidArgument("replace needs a non-empty search text".into()));
                    }
                    Ok(BatchCommand::Replace {
                        old: old.clone(),
                        new: new.clone(),
                    })
                }
                _ => Err(Error::InvalidArgument(
                    "replace needs 2 arguments: OLD NEW".into(),
                )),
            },
            "delete" => match args {
                [search, ..] if !search.is_empty() => Ok(BatchCommand::Delete {
                    search: search.clone(),
                }),
                _ => Err(Error::InvalidArgument(
                    "delete needs 1 argument: SEARCH".into(),
                )),
            },
            other => Err(Error::UnsupportedCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchCommand::Replace { .. } => "replace",
            BatchCommand::Delete { .. } => "delete",
        }
    }

    fn apply(&self, editor: &mut Editor) -> Result<bool> {
        match self {
            BatchCommand::Replace { old, new } => Ok(editor.replace_text(old, new) > 0),
            BatchCommand::Delete { search } => editor.delete_paragraph(search),
        }
    }
}

/// Result for one file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub success: bool,
    /// Where the edited file was written
    pub saved_to: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// 0 when every file succeeded (or nothing matched), 1 when some did,
    /// 2 when none did
    pub fn exit_code(&self) -> i32 {
        let ok = self.succeeded();
        if ok == self.total() {
            0
        } else if ok > 0 {
            1
        } else {
            2
        }
    }
}

/// Where and how a batch runs
#[derive(Clone, Debug, Default)]
pub struct BatchJob {
    pub pattern: String,
    pub recursive: bool,
    /// Write edited files here instead of over the originals
    pub output_dir: Option<PathBuf>,
    /// Copy each file to `<file>.bak` before editing it
    pub backup: bool,
    pub config: EditorConfig,
}

impl BatchJob {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Run `command` over every matching file, one at a time. A failing
    /// file is recorded and the batch moves on.
    pub fn run(&self, command: &BatchCommand) -> Result<BatchReport> {
        let files = find_files(&self.pattern, self.recursive)?;
        if files.is_empty() {
            log::warn!("no supported files match {:?}", self.pattern);
        } else {
            log::info!("{} file(s) match {:?}, running {}", files.len(), self.pattern, command.name());
        }

        let mut report = BatchReport::default();
        for path in files {
            let outcome = match self.process_file(&path, command) {
                Ok(saved_to) => {
                    let success = saved_to.is_some();
                    if !success {
                        log::warn!("{}: nothing changed", path.display());
                    }
                    FileOutcome {
                        path,
                        success,
                        saved_to,
                        error: None,
                    }
                }
                Err(err) => {
                    log::error!("{}: {err}", path.display());
                    FileOutcome {
                        path,
                        success: false,
                        saved_to: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        log::info!(
            "batch done: {} total, {} succeeded, {} failed",
            report.total(),
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Edit one file; `Some(path written)` when the command succeeded
    fn process_file(&self, path: &Path, command: &BatchCommand) -> Result<Option<PathBuf>> {
        if self.backup {
            let backup = backup_path(path);
            fs::copy(path, &backup)?;
            log::debug!("backed up {} to {}", path.display(), backup.display());
        }

        let mut editor = Editor::open(path, self.config.clone())?;
        if !command.apply(&mut editor)? {
            return Ok(None);
        }

        let target = match &self.output_dir {
            Some(dir) => output_path(dir, path)?,
            None => path.to_path_buf(),
        };
        editor.save_to(&target)?;
        log::info!("saved {}", target.display());
        Ok(Some(target))
    }
}

/// `report.docx` -> `report.docx.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Target inside `dir` for `source`, renamed `name_1.ext`, `name_2.ext`, ...
/// when another file already sits there
fn output_path(dir: &Path, source: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("not a file: {}", source.display())))?;
    let target = dir.join(file_name);
    if !target.exists() || same_file(&target, source) {
        return Ok(target);
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{n}{ext}"));
        if !candidate.exists() {
            log::warn!("{} exists, writing {}", target.display(), candidate.display());
            return Ok(candidate);
        }
        n += 1;
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Files matching `pattern`, sorted, supported extensions only.
///
/// Leading components without glob characters form the directory that is
/// walked; the rest is matched against paths relative to it. `recursive`
/// lets the pattern match at any depth.
pub fn find_files(pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let (root, rest) = split_pattern(pattern);
    let rest = if recursive && !rest.starts_with("**/") {
        format!("**/{rest}")
    } else {
        rest
    };
    let matcher = GlobBuilder::new(&rest)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let mut walker = WalkDir::new(&root).min_depth(1).follow_links(true);
    if !rest.contains("**") {
        walker = walker.max_depth(rest.split('/').count());
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || FileKind::from_path(entry.path()).is_none() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        if matcher.is_match(relative) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Split `reports/2024/*.docx` into (`reports/2024`, `*.docx`)
fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let path = Path::new(pattern);
    let mut root = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();

    let components: Vec<Component> = path.components().collect();
    let last = components.len().saturating_sub(1);
    for (i, component) in components.iter().enumerate() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && i < last && !text.contains(GLOB_META) {
            root.push(component);
        } else {
            rest.push(text.into_owned());
        }
    }

    if root.as_os_str().is_empty() {
        root = PathBuf::from(".");
    }
    (root, rest.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            BatchCommand::parse("replace", &args(&["2024", "2025"])).unwrap(),
            BatchCommand::Replace {
                old: "2024".into(),
                new: "2025".into()
            }
        );
        assert_eq!(
            BatchCommand::parse("delete", &args(&["Draft"])).unwrap(),
            BatchCommand::Delete { search: "Draft".into() }
        );
        assert!(matches!(
            BatchCommand::parse("replace", &args(&["only-one"])),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            BatchCommand::parse("rename", &args(&["a"])),
            Err(Error::UnsupportedCommand(_))
        ));
    }

    #[test]
    fn test_exit_codes() {
        let outcome = |success| FileOutcome {
            path: PathBuf::from("f.docx"),
            success,
            saved_to: None,
            error: None,
        };
        let report = |flags: &[bool]| BatchReport {
            outcomes: flags.iter().map(|f| outcome(*f)).collect(),
        };

        assert_eq!(report(&[]).exit_code(), 0);
        assert_eq!(report(&[true, true]).exit_code(), 0);
        assert_eq!(report(&[true, false]).exit_code(), 1);
        assert_eq!(report(&[false, false]).exit_code(), 2);
    }

    #[test]
    fn test_split_pattern() {
        assert_eq!(split_pattern("*.docx"), (PathBuf::from("."), "*.docx".to_string()));
        assert_eq!(
            split_pattern("reports/2024/*.xlsx"),
            (PathBuf::from("reports/2024"), "*.xlsx".to_string())
        );
        assert_eq!(
            split_pattern("data/*/q?.pptx"),
            (PathBuf::from("data"), "*/q?.pptx".to_string())
        );
        assert_eq!(split_pattern("one.docx"), (PathBuf::from("."), "one.docx".to_string()));
    }

    #[test]
    fn test_find_files_filters_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        for name in ["b.docx", "a.xlsx", "notes.txt", "old.docx.bak", "sub/c.docx"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*.docx", root.display());
        assert_eq!(find_files(&pattern, false).unwrap(), vec![root.join("b.docx")]);
        assert_eq!(
            find_files(&pattern, true).unwrap(),
            vec![root.join("b.docx"), root.join("sub/c.docx")]
        );

        let all = format!("{}/*", root.display());
        assert_eq!(
            find_files(&all, false).unwrap(),
            vec![root.join("a.xlsx"), root.join("b.docx")]
        );
    }

    #[test]
    fn test_output_path_renames_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(&src_dir).unwrap();
        let source = src_dir.join("r.docx");
        fs::write(&source, b"x").unwrap();

        assert_eq!(output_path(&out, &source).unwrap(), out.join("r.docx"));
        fs::write(out.join("r.docx"), b"y").unwrap();
        assert_eq!(output_path(&out, &source).unwrap(), out.join("r_1.docx"));
        fs::write(out.join("r_1.docx"), b"y").unwrap();
        assert_eq!(output_path(&out, &source).unwrap(), out.join("r_2.docx"));
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(backup_path(Path::new("a/r.docx")), PathBuf::from("a/r.docx.bak"));
    }
}
