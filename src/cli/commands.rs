use std::fmt::Write as _;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::app::Workspace;
use crate::config::AppConfig;
use crate::editor::SaveOutcome;
use crate::storage::{FolderRecord, NewNote, NoteRecord, StorageHandle};

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on (overrides [server] bind)
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FolderCommand {
    /// List folders in creation order
    List,
    /// Create a folder
    Create(FolderCreateArgs),
    /// Rename a folder
    Rename(FolderRenameArgs),
    /// Delete a folder together with its notes
    Delete(FolderDeleteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FolderCreateArgs {
    /// Folder name (whitespace trimmed)
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct FolderRenameArgs {
    /// Folder identifier
    pub folder_id: i64,
    /// New folder name
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct FolderDeleteArgs {
    /// Folder identifier
    pub folder_id: i64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NoteCommand {
    /// List the notes of a folder, newest first
    List(NoteListArgs),
    /// Create a note inside a folder
    New(NoteNewArgs),
    /// Print a note with its content
    Show(NoteIdArgs),
    /// Edit a note through the autosave editor and flush it
    Edit(NoteEditArgs),
    /// Delete a note
    Delete(NoteIdArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NoteListArgs {
    /// Folder identifier
    pub folder_id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct NoteNewArgs {
    /// Folder that receives the note
    pub folder_id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NoteIdArgs {
    /// Note identifier
    pub note_id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct NoteEditArgs {
    /// Note identifier
    pub note_id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
}

pub fn handle_folder_command(storage: &StorageHandle, command: FolderCommand) -> Result<()> {
    let output = run_folder_command(storage, command)?;
    print!("{output}");
    Ok(())
}

pub fn handle_note_command(
    config: &AppConfig,
    storage: &StorageHandle,
    command: NoteCommand,
) -> Result<()> {
    let output = run_note_command(config, storage, command)?;
    print!("{output}");
    Ok(())
}

fn run_folder_command(storage: &StorageHandle, command: FolderCommand) -> Result<String> {
    match command {
        FolderCommand::List => {
            let folders = storage.list_folders().context("listing folders")?;
            Ok(format_folders(&folders))
        }
        FolderCommand::Create(args) => {
            let folder = storage
                .create_folder(&args.name)
                .context("creating folder")?;
            Ok(format!("Created folder #{} '{}'\n", folder.id, folder.name))
        }
        FolderCommand::Rename(args) => {
            let folder = storage
                .rename_folder(args.folder_id, &args.name)
                .context("renaming folder")?;
            Ok(format!("Renamed folder #{} to '{}'\n", folder.id, folder.name))
        }
        FolderCommand::Delete(args) => {
            storage
                .delete_folder(args.folder_id)
                .context("deleting folder")?;
            Ok(format!("Deleted folder #{}\n", args.folder_id))
        }
    }
}

fn run_note_command(
    config: &AppConfig,
    storage: &StorageHandle,
    command: NoteCommand,
) -> Result<String> {
    match command {
        NoteCommand::List(args) => {
            storage
                .fetch_folder(args.folder_id)
                .context("looking up folder")?;
            let notes = storage.list_notes(args.folder_id).context("listing notes")?;
            Ok(format_notes(&notes))
        }
        NoteCommand::New(args) => {
            let note = storage
                .create_note(&NewNote {
                    folder_id: args.folder_id,
                    title: args.title,
                    content: args.content,
                })
                .context("creating note")?;
            Ok(format!(
                "Created note #{} in folder #{}\n",
                note.id, note.folder_id
            ))
        }
        NoteCommand::Show(args) => {
            let note = storage.fetch_note(args.note_id).context("loading note")?;
            Ok(format_note(&note))
        }
        NoteCommand::Edit(args) => edit_note(config, storage, args),
        NoteCommand::Delete(args) => {
            storage.delete_note(args.note_id).context("deleting note")?;
            Ok(format!("Deleted note #{}\n", args.note_id))
        }
    }
}

fn edit_note(config: &AppConfig, storage: &StorageHandle, args: NoteEditArgs) -> Result<String> {
    if args.title.is_none() && args.content.is_none() {
        bail!("nothing to edit: pass --title and/or --content");
    }
    let mut workspace = Workspace::new(storage.clone(), &config.auto_save);
    let now = Instant::now();
    workspace.load(now).context("loading workspace")?;
    workspace
        .select_note(Some(args.note_id), now)
        .context("opening note")?;
    if let Some(title) = &args.title {
        workspace.edit_title(title, now);
    }
    if let Some(content) = &args.content {
        workspace.edit_content(content, now);
    }

    match workspace.close(now) {
        None => Ok(format!("Note #{} unchanged\n", args.note_id)),
        Some(SaveOutcome::Saved { note_id }) => Ok(format!("Saved note #{note_id}\n")),
        Some(SaveOutcome::Failed { note_id, message }) => {
            bail!("saving note #{note_id} failed: {message}")
        }
        Some(SaveOutcome::Stale { note_id } | SaveOutcome::Orphaned { note_id, .. }) => {
            bail!("note #{note_id} was closed before its save completed")
        }
    }
}

fn format_folders(folders: &[FolderRecord]) -> String {
    if folders.is_empty() {
        return String::from("(no folders)\n");
    }
    let mut output = String::new();
    for folder in folders {
        let _ = writeln!(
            output,
            "#{:<4} {}  (created {})",
            folder.id,
            folder.name,
            format_timestamp(folder.created_at)
        );
    }
    output
}

fn format_notes(notes: &[NoteRecord]) -> String {
    if notes.is_empty() {
        return String::from("(no notes)\n");
    }
    let mut output = String::new();
    for note in notes {
        let _ = writeln!(
            output,
            "#{:<4} {}  (updated {})",
            note.id,
            note.display_title(),
            format_timestamp(note.updated_at)
        );
    }
    output
}

fn format_note(note: &NoteRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "#{} {}", note.id, note.display_title());
    let _ = writeln!(
        output,
        "folder #{} | created {} | updated {}",
        note.folder_id,
        format_timestamp(note.created_at),
        format_timestamp(note.updated_at)
    );
    if let Some(content) = note.content.as_deref().filter(|c| !c.is_empty()) {
        output.push('\n');
        output.push_str(content);
        if !content.ends_with('\n') {
            output.push('\n');
        }
    }
    output
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
