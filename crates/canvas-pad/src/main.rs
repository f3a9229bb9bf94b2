use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use canvas_pad_config::{AppConfig, HexColor};
use canvas_pad_core::{Canvas, ShapeKind, TextStyleFlag, TextStyleUpdate};
use canvas_pad_mod_history::config::doc_id_for_name;
use canvas_pad_mod_history::persistence::list_documents;
use canvas_pad_mod_history::{HistoryConfig, HistoryManager, HistoryStep, KeyValueStore, RedbStore};
use clap::{Parser, Subcommand};
use uuid::Uuid;

/// A canvas design editor with persistent undo/redo history.
#[derive(Parser, Debug)]
#[command(name = "canvas-pad", version, about)]
struct Cli {
    /// Config file (defaults to canvas-pad.json next to the executable).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the history database.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Document to edit.
    #[arg(long, short, global = true)]
    doc: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a text box.
    Text { text: String },
    /// Add a shape: rect, circle or triangle.
    Shape { kind: ShapeKind },
    /// Add an image scaled to the standard placement size.
    Image {
        src: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Remove an object.
    Remove { id: Uuid },
    /// Move an object.
    Move {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        left: f64,
        #[arg(allow_negative_numbers = true)]
        top: f64,
    },
    /// Set the canvas background color (#RGB or #RRGGBB).
    Background { color: HexColor },
    /// Set the opacity of an image (0.0 to 1.0).
    Opacity { id: Uuid, value: f64 },
    /// Set the font size of a text box (clamped to 8..=100).
    FontSize { id: Uuid, size: f64 },
    /// Set the fill color of a text box.
    Fill { id: Uuid, color: HexColor },
    /// Toggle bold, italic or underline on a character range of a text box.
    Toggle {
        id: Uuid,
        style: TextStyleFlag,
        start: usize,
        end: usize,
    },
    /// Step back one snapshot.
    Undo,
    /// Step forward one snapshot.
    Redo,
    /// Print the current document.
    Show,
    /// Print the history log and cursor.
    History,
    /// Delete the stored history of the document.
    Clear,
    /// List documents with stored history.
    Docs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let app = AppConfig::load_or_create(&config_path);

    let mut history_config = HistoryConfig::from_app_config(&app);
    if let Some(dir) = &cli.data_dir {
        history_config.data_dir = dir.clone();
    }
    tracing::debug!("Using data directory {}", history_config.data_dir.display());

    let store: Arc<dyn KeyValueStore> = RedbStore::open(&history_config.data_dir)?;
    let doc_id = doc_id_for_name(cli.doc.as_deref().unwrap_or(&app.default_document));
    let mut manager = HistoryManager::hydrate(
        doc_id,
        history_config,
        Canvas::from_config(&app),
        Some(Arc::clone(&store)),
    );

    run(&mut manager, store.as_ref(), cli.command)?;

    // One-shot invocations never outlive the debounce window.
    manager.settle()?;
    manager.teardown();
    Ok(())
}

fn run(
    manager: &mut HistoryManager<Canvas>,
    store: &dyn KeyValueStore,
    command: Command,
) -> Result<()> {
    match command {
        Command::Text { text } => {
            let id = manager.surface_mut().add_text(&text);
            println!("{id}");
        }
        Command::Shape { kind } => {
            let id = manager.surface_mut().add_shape(kind);
            println!("{id}");
        }
        Command::Image { src, width, height } => {
            let id = manager.surface_mut().add_image(&src, width, height)?;
            println!("{id}");
        }
        Command::Remove { id } => {
            if !manager.surface_mut().remove(id) {
                anyhow::bail!("no object with id {id}");
            }
        }
        Command::Move { id, left, top } => {
            manager.surface_mut().move_to(id, left, top)?;
        }
        Command::Background { color } => {
            manager.surface_mut().set_background(color);
        }
        Command::Opacity { id, value } => {
            manager.surface_mut().set_opacity(id, value)?;
        }
        Command::FontSize { id, size } => {
            let update = TextStyleUpdate {
                font_size: Some(size),
                ..Default::default()
            };
            manager.surface_mut().update_text_style(id, &update)?;
        }
        Command::Fill { id, color } => {
            let update = TextStyleUpdate {
                fill: Some(color),
                ..Default::default()
            };
            manager.surface_mut().update_text_style(id, &update)?;
        }
        Command::Toggle {
            id,
            style,
            start,
            end,
        } => {
            let changed = manager
                .surface_mut()
                .toggle_text_style(id, style, start, end)?;
            if !changed {
                tracing::warn!("Empty or out-of-range selection {start}..{end}, nothing toggled");
            }
        }
        Command::Undo => report_step("undo", manager.undo()?),
        Command::Redo => report_step("redo", manager.redo()?),
        Command::Show => println!("{}", manager.surface().to_pretty_json()?),
        Command::History => {
            let cursor = manager.log().cursor_value();
            for (i, snapshot) in manager.log().entries().iter().enumerate() {
                let marker = if i as i64 == cursor { ">" } else { " " };
                println!("{marker} {i:>4}  {} bytes", snapshot.len());
            }
            println!(
                "cursor {cursor} of {} (undo: {}, redo: {})",
                manager.len(),
                manager.can_undo(),
                manager.can_redo()
            );
        }
        Command::Clear => {
            manager
                .clear()
                .with_context(|| format!("Failed to clear {}", manager.doc_id()))?;
            println!("history cleared");
        }
        Command::Docs => {
            for doc in list_documents(store)? {
                println!("{doc}");
            }
        }
    }
    Ok(())
}

fn report_step(action: &str, step: HistoryStep) {
    match step {
        HistoryStep::Moved { cursor } => println!("{action}: now at snapshot {cursor}"),
        HistoryStep::NothingToDo => println!("{action}: nothing to do"),
    }
}
