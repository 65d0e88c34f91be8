//! `office-edit`: edit DOCX, PPTX and XLSX files from the command line
//!
//! Usage:
//!   office-edit word report.docx replace 2024 2025
//!   office-edit excel data.xlsx -o out.xlsx update Sheet1 B2 42
//!   office-edit ppt deck.pptx add-slide "Roadmap" --layout 1
//!   office-edit batch "reports/*.docx" replace Draft Final -r -o out/ -b
//!   office-edit json '{"command": "replace_text", "params": {...}}'

use clap::{Args, Parser, Subcommand};
use linch_office_edit::api;
use linch_office_edit::sheet::MAX_ROWS_DISPLAY;
use linch_office_edit::slides::DEFAULT_LAYOUT_INDEX;
use linch_office_edit::word::{Alignment, BlockKind, ParagraphFormat};
use linch_office_edit::{
    BatchCommand, BatchJob, CellFormat, CellValue, Document, EditorConfig, Error, Presentation,
    Result, Workbook,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "office-edit", version, about = "Edit Word, PowerPoint and Excel files")]
struct Cli {
    /// TOML file with editor settings (fonts, bullet prefix, heading level)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit a .docx document
    Word {
        #[command(flatten)]
        target: Target,
        #[command(subcommand)]
        action: WordAction,
    },
    /// Edit a .pptx presentation
    Ppt {
        #[command(flatten)]
        target: Target,
        #[command(subcommand)]
        action: PptAction,
    },
    /// Edit a .xlsx workbook
    Excel {
        #[command(flatten)]
        target: Target,
        #[command(subcommand)]
        action: ExcelAction,
    },
    /// Run one command over every file a glob pattern matches
    Batch {
        /// File pattern, e.g. "*.docx" or "reports/*.xlsx"
        pattern: String,
        /// replace OLD NEW | delete SEARCH
        name: String,
        #[arg(required = true)]
        args: Vec<String>,
        /// Search subdirectories too
        #[arg(short, long)]
        recursive: bool,
        /// Write edited files to this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Copy each file to <file>.bak first
        #[arg(short, long)]
        backup: bool,
    },
    /// Run a JSON request (or read it from stdin with "-")
    Json { request: String },
}

#[derive(Args)]
struct Target {
    /// File to edit
    file: PathBuf,
    /// Save here instead of over the input file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Target {
    fn save_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.file)
    }
}

#[derive(Subcommand)]
enum WordAction {
    /// Show headings and paragraphs with their indices
    List,
    /// Replace text everywhere
    Replace { old: String, new: String },
    /// Insert a paragraph after the first one containing ANCHOR
    InsertAfter {
        anchor: String,
        text: String,
        /// Insert a heading of this level instead
        #[arg(long)]
        heading: Option<u8>,
    },
    /// Insert content after the first heading containing HEADING
    InsertAfterHeading {
        heading: String,
        text: String,
        /// Insert the content as a heading
        #[arg(long)]
        as_heading: bool,
        #[arg(long)]
        level: Option<u8>,
    },
    /// Insert bullet items after a heading
    Bullets {
        heading: String,
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Delete the first paragraph containing SEARCH
    Delete { search: String },
    /// Insert a table; DATA cells fill it row by row
    Table {
        rows: usize,
        cols: usize,
        data: Vec<String>,
        #[arg(long)]
        after: Option<String>,
    },
    /// Insert an image
    Image {
        path: PathBuf,
        /// Width in centimetres
        #[arg(long, default_value_t = 10.0)]
        width: f64,
        #[arg(long)]
        after: Option<String>,
    },
    /// Insert a page break
    PageBreak {
        #[arg(long)]
        after: Option<String>,
    },
    /// Set the text of a table cell (0-based indices)
    Cell {
        table: usize,
        row: usize,
        col: usize,
        text: String,
    },
    /// Format the first paragraph containing SEARCH
    Format {
        search: String,
        #[arg(long)]
        size: Option<f32>,
        #[arg(long)]
        bold: Option<bool>,
        #[arg(long)]
        italic: Option<bool>,
        /// left, center, right or justify
        #[arg(long)]
        align: Option<String>,
    },
}

#[derive(Subcommand)]
enum PptAction {
    /// Show slide titles with a short preview
    List,
    /// Replace text on all slides, or one
    Replace {
        old: String,
        new: String,
        #[arg(long)]
        slide: Option<usize>,
    },
    UpdateTitle { slide: usize, title: String },
    /// Append a paragraph to the slide's first text shape
    AddText { slide: usize, text: String },
    AddSlide {
        title: String,
        #[arg(long, default_value_t = DEFAULT_LAYOUT_INDEX)]
        layout: usize,
    },
    DeleteSlide { slide: usize },
    /// Show the shapes and text of one slide
    Info { slide: usize },
    SetFont {
        slide: usize,
        font: String,
        /// Size in points
        #[arg(long)]
        size: Option<f32>,
    },
}

#[derive(Subcommand)]
enum ExcelAction {
    /// List sheets with their used range
    List,
    /// Show the top-left corner of a sheet
    View {
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long, default_value_t = MAX_ROWS_DISPLAY)]
        rows: u32,
    },
    /// Find cells containing TEXT
    Find {
        text: String,
        #[arg(long)]
        sheet: Option<String>,
    },
    Replace {
        old: String,
        new: String,
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Set a cell; numbers and TRUE/FALSE are stored typed
    Update { sheet: String, cell: String, value: String },
    Format {
        sheet: String,
        cell: String,
        #[arg(long)]
        bold: bool,
        #[arg(long)]
        italic: bool,
        #[arg(long, default_value_t = 11.0)]
        size: f32,
        /// Background colour as RRGGBB
        #[arg(long)]
        bg: Option<String>,
        #[arg(long)]
        align: Option<String>,
    },
    Formula { sheet: String, cell: String, formula: String },
    AddRow {
        sheet: String,
        values: Vec<String>,
        /// Insert at this row instead of appending
        #[arg(long)]
        position: Option<u32>,
    },
    DeleteRow { sheet: String, row: u32 },
    AddSheet {
        name: String,
        #[arg(long)]
        position: Option<usize>,
    },
    DeleteSheet { name: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::Word { target, action } => {
            let mut doc = Document::open_with(&target.file, config)?;
            if word(&mut doc, action)? {
                doc.save(target.save_path())?;
                println!("saved {}", target.save_path().display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ppt { target, action } => {
            let mut pres = Presentation::open_with(&target.file, config)?;
            if ppt(&mut pres, action)? {
                pres.save(target.save_path())?;
                println!("saved {}", target.save_path().display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Excel { target, action } => {
            let mut book = Workbook::open_with(&target.file, config)?;
            if excel(&mut book, action)? {
                book.save(target.save_path())?;
                println!("saved {}", target.save_path().display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Batch {
            pattern,
            name,
            args,
            recursive,
            output,
            backup,
        } => {
            let command = BatchCommand::parse(&name, &args)?;
            let job = BatchJob {
                pattern,
                recursive,
                output_dir: output,
                backup,
                config,
            };
            let report = job.run(&command)?;
            for outcome in &report.outcomes {
                let mark = if outcome.success { "ok  " } else { "FAIL" };
                match &outcome.error {
                    Some(error) => println!("{mark} {} ({error})", outcome.path.display()),
                    None => println!("{mark} {}", outcome.path.display()),
                }
            }
            println!(
                "{} file(s): {} succeeded, {} failed",
                report.total(),
                report.succeeded(),
                report.failed()
            );
            Ok(ExitCode::from(report.exit_code() as u8))
        }
        Command::Json { request } => {
            let input = if request == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                request
            };
            println!("{}", api::execute_json(&input, &config));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run a Word action; `true` when the document changed and must be saved
fn word(doc: &mut Document, action: WordAction) -> Result<bool> {
    let changed = match action {
        WordAction::List => {
            for entry in doc.outline() {
                let tag = match entry.kind {
                    BlockKind::Heading(level) => format!("H{level}"),
                    BlockKind::PageBreak => "--".to_string(),
                    BlockKind::Paragraph => "P ".to_string(),
                };
                println!("[{:>3}] {tag} {}", entry.index, entry.preview);
            }
            println!("{} table(s)", doc.table_count());
            false
        }
        WordAction::Replace { old, new } => {
            let count = doc.replace_text(&old, &new);
            println!("replaced {count} occurrence(s)");
            count > 0
        }
        WordAction::InsertAfter { anchor, text, heading } => {
            doc.insert_after(&anchor, &text, heading)?.is_some()
        }
        WordAction::InsertAfterHeading {
            heading,
            text,
            as_heading,
            level,
        } => doc.insert_after_heading(&heading, &text, as_heading, level)?.is_some(),
        WordAction::Bullets { heading, items } => doc.insert_bullets(&heading, &items)?.is_some(),
        WordAction::Delete { search } => doc.delete_paragraph(&search)?,
        WordAction::Table {
            rows,
            cols,
            data,
            after,
        } => doc.insert_table(rows, cols, &data, after.as_deref())?.is_some(),
        WordAction::Image { path, width, after } => {
            doc.insert_image(&path, width, after.as_deref())?.is_some()
        }
        WordAction::PageBreak { after } => doc.insert_page_break(after.as_deref())?.is_some(),
        WordAction::Cell {
            table,
            row,
            col,
            text,
        } => doc.update_table_cell(table, row, col, &text),
        WordAction::Format {
            search,
            size,
            bold,
            italic,
            align,
        } => {
            let alignment = align
                .map(|a| {
                    Alignment::parse(&a)
                        .ok_or_else(|| Error::InvalidArgument(format!("unknown alignment: {a}")))
                })
                .transpose()?;
            let format = ParagraphFormat {
                font_size: size,
                bold,
                italic,
                alignment,
            };
            doc.set_paragraph_format(&search, &format)?
        }
    };
    Ok(changed)
}

fn ppt(pres: &mut Presentation, action: PptAction) -> Result<bool> {
    let changed = match action {
        PptAction::List => {
            for slide in pres.list_slides() {
                println!("[{}] {}", slide.number, slide.title.as_deref().unwrap_or("(untitled)"));
                for line in slide.preview {
                    println!("    {line}");
                }
            }
            false
        }
        PptAction::Replace { old, new, slide } => {
            let count = pres.replace_text(&old, &new, slide);
            println!("replaced text in {count} run(s)");
            count > 0
        }
        PptAction::UpdateTitle { slide, title } => pres.update_slide_title(slide, &title)?,
        PptAction::AddText { slide, text } => pres.add_text_to_slide(slide, &text)?,
        PptAction::AddSlide { title, layout } => {
            let number = pres.add_slide(&title, layout)?;
            println!("added slide {number}");
            true
        }
        PptAction::DeleteSlide { slide } => pres.delete_slide(slide)?,
        PptAction::Info { slide } => {
            match pres.slide_info(slide) {
                Some(info) => {
                    println!("slide {}: {}", info.number, info.title.as_deref().unwrap_or("(untitled)"));
                    println!("{} shape(s)", info.shape_count);
                    for shape in info.shapes {
                        println!("[{}] {} {}", shape.index, shape.kind, shape.name.unwrap_or_default());
                        println!("{}", shape.text);
                    }
                }
                None => println!("slide {slide} does not exist"),
            }
            false
        }
        PptAction::SetFont { slide, font, size } => pres.set_font(slide, &font, size)?,
    };
    Ok(changed)
}

fn excel(book: &mut Workbook, action: ExcelAction) -> Result<bool> {
    let changed = match action {
        ExcelAction::List => {
            for sheet in book.list_sheets() {
                let active = if sheet.active { " (active)" } else { "" };
                println!(
                    "[{}] {}{active}: {} row(s) x {} column(s)",
                    sheet.index, sheet.name, sheet.max_row, sheet.max_col
                );
            }
            false
        }
        ExcelAction::View { sheet, rows } => {
            match book.view_sheet(sheet.as_deref(), rows) {
                Some(view) => {
                    println!("{} ({} x {})", view.name, view.total_rows, view.total_cols);
                    for row in view.rows {
                        let cells: Vec<String> = row
                            .iter()
                            .map(|v| format!("{:<8}", v.chars().take(8).collect::<String>()))
                            .collect();
                        println!("{}", cells.join(" | "));
                    }
                }
                None => println!("sheet not found"),
            }
            false
        }
        ExcelAction::Find { text, sheet } => {
            let hits = book.find_cells(&text, sheet.as_deref());
            for hit in &hits {
                println!("{}!{}: {}", hit.sheet, hit.cell, hit.value);
            }
            println!("{} match(es)", hits.len());
            false
        }
        ExcelAction::Replace { old, new, sheet } => {
            let count = book.replace_text(&old, &new, sheet.as_deref());
            println!("changed {count} cell(s)");
            count > 0
        }
        ExcelAction::Update { sheet, cell, value } => {
            book.update_cell(&sheet, &cell, &CellValue::infer(&value))?
        }
        ExcelAction::Format {
            sheet,
            cell,
            bold,
            italic,
            size,
            bg,
            align,
        } => {
            let format = CellFormat {
                bold,
                italic,
                font_size: size,
                bg_color: bg,
                alignment: align,
            };
            book.set_format(&sheet, &cell, &format)?
        }
        ExcelAction::Formula {
            sheet,
            cell,
            formula,
        } => book.set_formula(&sheet, &cell, &formula)?,
        ExcelAction::AddRow {
            sheet,
            values,
            position,
        } => {
            let values: Vec<CellValue> = values.iter().map(|v| CellValue::infer(v)).collect();
            book.add_row(&sheet, &values, position)?
        }
        ExcelAction::DeleteRow { sheet, row } => book.delete_row(&sheet, row)?,
        ExcelAction::AddSheet { name, position } => {
            book.add_sheet(&name, position)?;
            true
        }
        ExcelAction::DeleteSheet { name } => book.delete_sheet(&name)?,
    };
    Ok(changed)
}
