//! JSON request/response surface for scripted callers
//!
//! A request names a command and carries its parameters:
//!
//! ```json
//! {"command": "replace_text",
//!  "params": {"file_path": "report.docx", "old_text": "2024", "new_text": "2025"}}
//! ```
//!
//! Every request gets a [`Response`]; failures never escape as errors.

use crate::batch::{BatchCommand, BatchJob};
use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::facade::{Editor, OfficeFile};
use crate::sheet::{CellValue, Workbook};
use crate::word::{Document, Table};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Commands [`execute`] understands
pub const COMMANDS: &[&str] = &[
    "replace_text",
    "insert_after",
    "delete_paragraph",
    "insert_table",
    "add_image",
    "update_cell",
    "batch_replace",
];

#[derive(Clone, Debug, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub operation: String,
    /// `word`, `ppt`, `excel`, `mixed` (batch) or `unknown`
    pub file_type: String,
    /// `null` whenever `success` is false
    pub result: Value,
    pub message: String,
    pub error: Option<String>,
}

impl Response {
    fn ok(operation: &str, file_type: &str, result: Value, message: String) -> Self {
        Self {
            success: true,
            operation: operation.to_string(),
            file_type: file_type.to_string(),
            result,
            message,
            error: None,
        }
    }

    fn failure(operation: &str, file_type: &str, error: impl ToString) -> Self {
        Self {
            success: false,
            operation: operation.to_string(),
            file_type: file_type.to_string(),
            result: Value::Null,
            message: String::new(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ReplaceTextParams {
    file_path: PathBuf,
    old_text: String,
    new_text: String,
    output_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct InsertAfterParams {
    file_path: PathBuf,
    anchor: String,
    content: String,
    heading_level: Option<u8>,
    output_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct DeleteParagraphParams {
    file_path: PathBuf,
    search_text: String,
    output_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct InsertTableParams {
    file_path: PathBuf,
    rows: usize,
    cols: usize,
    #[serde(default)]
    data: Vec<Vec<String>>,
    position: Option<String>,
    output_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct AddImageParams {
    file_path: PathBuf,
    image_path: PathBuf,
    #[serde(default = "default_image_width")]
    width_cm: f64,
    position: Option<String>,
    output_path: Option<PathBuf>,
}

fn default_image_width() -> f64 {
    10.0
}

#[derive(Deserialize)]
struct UpdateCellParams {
    file_path: PathBuf,
    sheet: String,
    cell: String,
    value: Value,
    output_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct BatchReplaceParams {
    pattern: String,
    old_text: String,
    new_text: String,
    #[serde(default)]
    recursive: bool,
    output_dir: Option<PathBuf>,
    #[serde(default)]
    backup: bool,
}

/// Run one request
pub fn execute(request: &Request, config: &EditorConfig) -> Response {
    let command = request.command.as_str();
    let params = &request.params;
    let outcome = match command {
        "replace_text" => parse(params).and_then(|p| replace_text(p, config)),
        "insert_after" => parse(params).and_then(|p| insert_after(p, config)),
        "delete_paragraph" => parse(params).and_then(|p| delete_paragraph(p, config)),
        "insert_table" => parse(params).and_then(|p| insert_table(p, config)),
        "add_image" => parse(params).and_then(|p| add_image(p, config)),
        "update_cell" => parse(params).and_then(|p| update_cell(p, config)),
        "batch_replace" => parse(params).and_then(|p| batch_replace(p, config)),
        other => Err(Error::UnsupportedCommand(other.to_string())),
    };

    outcome.unwrap_or_else(|err| {
        log::warn!("{command} failed: {err}");
        let file_type = if command == "batch_replace" { "mixed" } else { "unknown" };
        Response::failure(command, file_type, err)
    })
}

/// Parse a JSON request, run it and render the response as pretty JSON
pub fn execute_json(input: &str, config: &EditorConfig) -> String {
    let response = match serde_json::from_str::<Request>(input) {
        Ok(request) => execute(&request, config),
        Err(err) => Response::failure("execute_json", "unknown", format!("invalid JSON request: {err}")),
    };
    render(&response)
}

pub fn render(response: &Response) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|err| {
        format!(r#"{{"success": false, "operation": "execute_json", "file_type": "unknown", "result": null, "message": "", "error": "{err}"}}"#)
    })
}

fn parse<T: DeserializeOwned>(params: &Value) -> Result<T> {
    serde_json::from_value(params.clone())
        .map_err(|err| Error::InvalidArgument(format!("invalid params: {err}")))
}

fn word<'a>(file: &'a mut OfficeFile, operation: &str) -> Result<&'a mut Document> {
    match file.editor_mut() {
        Editor::Word(doc) => Ok(doc),
        other => Err(other.unsupported(operation)),
    }
}

fn workbook<'a>(file: &'a mut OfficeFile, operation: &str) -> Result<&'a mut Workbook> {
    match file.editor_mut() {
        Editor::Spreadsheet(book) => Ok(book),
        other => Err(other.unsupported(operation)),
    }
}

fn replace_text(p: ReplaceTextParams, config: &EditorConfig) -> Result<Response> {
    let mut file = OfficeFile::open(&p.file_path, config.clone())?;
    let count = file.replace_text(&p.old_text, &p.new_text);
    file.save(p.output_path.as_deref())?;
    Ok(Response::ok(
        "replace_text",
        file.file_kind().as_str(),
        json!({ "count": count }),
        format!("replaced {count} occurrence(s)"),
    ))
}

fn insert_after(p: InsertAfterParams, config: &EditorConfig) -> Result<Response> {
    let mut file = OfficeFile::open(&p.file_path, config.clone())?;
    let inserted = word(&mut file, "insert_after")?.insert_after(&p.anchor, &p.content, p.heading_level)?;
    let Some(index) = inserted else {
        return Ok(Response::failure("insert_after", "word", format!("anchor not found: {}", p.anchor)));
    };
    file.save(p.output_path.as_deref())?;
    Ok(Response::ok(
        "insert_after",
        "word",
        json!({ "index": index }),
        format!("inserted content after {:?}", p.anchor),
    ))
}

fn delete_paragraph(p: DeleteParagraphParams, config: &EditorConfig) -> Result<Response> {
    let mut file = OfficeFile::open(&p.file_path, config.clone())?;
    if !word(&mut file, "delete_paragraph")?.delete_paragraph(&p.search_text)? {
        return Ok(Response::failure(
            "delete_paragraph",
            "word",
            format!("no paragraph contains {:?}", p.search_text),
        ));
    }
    file.save(p.output_path.as_deref())?;
    Ok(Response::ok(
        "delete_paragraph",
        "word",
        json!({ "deleted": true }),
        format!("deleted the paragraph containing {:?}", p.search_text),
    ))
}

fn insert_table(p: InsertTableParams, config: &EditorConfig) -> Result<Response> {
    Table::check_dimensions(p.rows, p.cols)?;
    let mut file = OfficeFile::open(&p.file_path, config.clone())?;
    let cells: Vec<String> = (0..p.rows)
        .flat_map(|r| (0..p.cols).map(move |c| (r, c)))
        .map(|(r, c)| {
            p.data
                .get(r)
                .and_then(|row| row.get(c))
                .cloned()
                .unwrap_or_default()
        })
        .collect();
    let inserted = word(&mut file, "insert_table")?.insert_table(p.rows, p.cols, &cells, p.position.as_deref())?;
    if inserted.is_none() {
        return Ok(Response::failure("insert_table", "word", "table insertion failed: anchor not found"));
    }
    file.save(p.output_path.as_deref())?;
    Ok(Response::ok(
        "insert_table",
        "word",
        json!({ "rows": p.rows, "cols": p.cols }),
        format!("inserted a {}x{} table", p.rows, p.cols),
    ))
}

fn add_image(p: AddImageParams, config: &EditorConfig) -> Result<Response> {
    let mut file = OfficeFile::open(&p.file_path, config.clone())?;
    let inserted = word(&mut file, "add_image")?.insert_image(&p.image_path, p.width_cm, p.position.as_deref())?;
    if inserted.is_none() {
        return Ok(Response::failure("add_image", "word", "image insertion failed: anchor not found"));
    }
    file.save(p.output_path.as_deref())?;
    Ok(Response::ok(
        "add_image",
        "word",
        json!({ "image_added": true }),
        format!("inserted {}", p.image_path.display()),
    ))
}

fn cell_value(value: &Value) -> Result<CellValue> {
    match value {
        Value::Null => Ok(CellValue::Empty),
        Value::Bool(b) => Ok(CellValue::Bool(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .ok_or_else(|| Error::InvalidArgument(format!("unsupported number: {n}"))),
        Value::String(s) => Ok(CellValue::Text(s.clone())),
        other => Err(Error::InvalidArgument(format!("cell values must be scalars, got {other}"))),
    }
}

fn update_cell(p: UpdateCellParams, config: &EditorConfig) -> Result<Response> {
    let value = cell_value(&p.value)?;
    let mut file = OfficeFile::open(&p.file_path, config.clone())?;
    if !workbook(&mut file, "update_cell")?.update_cell(&p.sheet, &p.cell, &value)? {
        return Ok(Response::failure("update_cell", "excel", format!("sheet not found: {}", p.sheet)));
    }
    file.save(p.output_path.as_deref())?;
    Ok(Response::ok(
        "update_cell",
        "excel",
        json!({ "sheet": p.sheet, "cell": p.cell, "value": value.to_string() }),
        format!("updated {}!{}", p.sheet, p.cell),
    ))
}

fn batch_replace(p: BatchReplaceParams, config: &EditorConfig) -> Result<Response> {
    let command = BatchCommand::parse("replace", &[p.old_text, p.new_text])?;
    let job = BatchJob {
        pattern: p.pattern,
        recursive: p.recursive,
        output_dir: p.output_dir,
        backup: p.backup,
        config: config.clone(),
    };
    let report = job.run(&command)?;

    let files: Vec<String> = report
        .outcomes
        .iter()
        .map(|o| o.path.display().to_string())
        .collect();
    Ok(Response::ok(
        "batch_replace",
        "mixed",
        json!({
            "total": report.total(),
            "success": report.succeeded(),
            "failed": report.failed(),
            "files": files,
        }),
        format!("processed {} file(s), {} succeeded", report.total(), report.succeeded()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(input: &str) -> Response {
        serde_json::from_str(&execute_json(input, &EditorConfig::default())).unwrap()
    }

    #[test]
    fn test_unknown_command() {
        let response = run(r#"{"command": "format_disk", "params": {}}"#);
        assert!(!response.success);
        assert_eq!(response.operation, "format_disk");
        assert_eq!(response.file_type, "unknown");
        assert_eq!(response.result, Value::Null);
        assert!(response.error.unwrap().contains("format_disk"));
    }

    #[test]
    fn test_malformed_json_and_params() {
        let response = run("{not json");
        assert!(!response.success);
        assert_eq!(response.operation, "execute_json");

        let response = run(r#"{"command": "replace_text", "params": {"file_path": "a.docx"}}"#);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("invalid params"));

        let response = run(r#"{"command": "replace_text"}"#);
        assert!(!response.success);
    }

    #[test]
    fn test_table_dimensions_checked_before_opening() {
        for (rows, cols) in [(0u64, 3u64), (1, 1 << 32)] {
            let request = json!({
                "command": "insert_table",
                "params": { "file_path": "/nonexistent/x.docx", "rows": rows, "cols": cols }
            });
            let response = run(&request.to_string());
            assert!(!response.success);
            assert!(response.error.unwrap().contains("table must be"));
        }
    }

    #[test]
    fn test_missing_file_is_reported() {
        let response = run(
            r#"{"command": "replace_text", "params": {"file_path": "/nonexistent/x.docx", "old_text": "a", "new_text": "b"}}"#,
        );
        assert!(!response.success);
        assert_eq!(response.file_type, "unknown");
        assert!(response.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_batch_with_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let request = json!({
            "command": "batch_replace",
            "params": {
                "pattern": format!("{}/*.docx", dir.path().display()),
                "old_text": "a",
                "new_text": "b",
            }
        });
        let response = run(&request.to_string());
        assert!(response.success);
        assert_eq!(response.file_type, "mixed");
        assert_eq!(response.result["total"], 0);
    }

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&json!(3)).unwrap(), CellValue::Number(3.0));
        assert_eq!(cell_value(&json!("x")).unwrap(), CellValue::Text("x".into()));
        assert_eq!(cell_value(&json!(true)).unwrap(), CellValue::Bool(true));
        assert!(cell_value(&json!([1])).is_err());
    }
}
