//! Autosave state machine for the note that is currently open.
//!
//! The editor never performs I/O. Edits and the passage of time go in, and
//! [`SaveRequest`]s come out; whoever owns the editor executes them and reports
//! back through [`NoteEditor::complete_save`]. Everything the editor knows
//! about the open note lives in one session value tagged with a generation
//! number, and every request carries that tag in its [`SaveTicket`], so a
//! completion that outlives its session is recognised and dropped.

use std::fmt;
use std::time::{Duration, Instant};

use strum::{AsRefStr, Display};
use time::OffsetDateTime;

use crate::config::AutoSaveConfig;
use crate::storage::NoteRecord;

mod timer;

pub use timer::DebounceTimer;

/// The editable pair of a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditFields {
    pub title: String,
    pub content: String,
}

impl EditFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn from_note(note: &NoteRecord) -> Self {
        Self {
            title: note.title.clone().unwrap_or_default(),
            content: note.content.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveTicket {
    generation: u64,
    sequence: u64,
    note_id: i64,
}

impl SaveTicket {
    pub fn note_id(&self) -> i64 {
        self.note_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub ticket: SaveTicket,
    pub note_id: i64,
    pub fields: EditFields,
}

impl SaveRequest {
    pub fn title(&self) -> &str {
        &self.fields.title
    }

    pub fn content(&self) -> &str {
        &self.fields.content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum EditorPhase {
    Empty,
    Loaded,
    Dirty,
    Scheduled,
    Saving,
    Saved,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorStatus {
    Empty,
    Loaded {
        note_id: i64,
        last_saved_at: Option<OffsetDateTime>,
    },
    Dirty {
        note_id: i64,
    },
    Scheduled {
        note_id: i64,
        due: Instant,
    },
    Saving {
        note_id: i64,
    },
    Saved {
        note_id: i64,
        saved_at: OffsetDateTime,
    },
    Error {
        note_id: i64,
        message: String,
        occurred_at: OffsetDateTime,
    },
}

impl EditorStatus {
    pub fn phase(&self) -> EditorPhase {
        match self {
            EditorStatus::Empty => EditorPhase::Empty,
            EditorStatus::Loaded { .. } => EditorPhase::Loaded,
            EditorStatus::Dirty { .. } => EditorPhase::Dirty,
            EditorStatus::Scheduled { .. } => EditorPhase::Scheduled,
            EditorStatus::Saving { .. } => EditorPhase::Saving,
            EditorStatus::Saved { .. } => EditorPhase::Saved,
            EditorStatus::Error { .. } => EditorPhase::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { note_id: i64 },
    Failed { note_id: i64, message: String },
    /// The request belonged to a session that has since been replaced or finished.
    Stale { note_id: i64 },
    /// The last save of a closed session failed. `fields` are the newest edits
    /// that session made; the owner has to persist them itself.
    Orphaned {
        note_id: i64,
        fields: EditFields,
        message: String,
    },
}

#[derive(Debug)]
struct EditSession {
    generation: u64,
    note_id: i64,
    snapshot: EditFields,
    fields: EditFields,
    debounce: DebounceTimer,
    saved_banner: DebounceTimer,
    in_flight: Option<InFlight>,
    last_saved_at: Option<OffsetDateTime>,
    last_error: Option<SaveFailure>,
}

#[derive(Debug)]
struct InFlight {
    ticket: SaveTicket,
    fields: EditFields,
}

#[derive(Debug, Clone)]
struct SaveFailure {
    message: String,
    occurred_at: OffsetDateTime,
}

impl EditSession {
    fn is_dirty(&self) -> bool {
        self.fields != self.snapshot
    }

    /// Dirty and not already covered by the save that is in flight.
    fn needs_flush(&self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        match &self.in_flight {
            Some(flight) => flight.fields != self.fields,
            None => true,
        }
    }

    fn status(&self) -> EditorStatus {
        let note_id = self.note_id;
        if self.in_flight.is_some() {
            return EditorStatus::Saving { note_id };
        }
        if self.is_dirty() {
            if let Some(failure) = &self.last_error {
                return EditorStatus::Error {
                    note_id,
                    message: failure.message.clone(),
                    occurred_at: failure.occurred_at,
                };
            }
            return match self.debounce.deadline() {
                Some(due) => EditorStatus::Scheduled { note_id, due },
                None => EditorStatus::Dirty { note_id },
            };
        }
        match (self.saved_banner.is_armed(), self.last_saved_at) {
            (true, Some(saved_at)) => EditorStatus::Saved { note_id, saved_at },
            _ => EditorStatus::Loaded {
                note_id,
                last_saved_at: self.last_saved_at,
            },
        }
    }
}

#[derive(Debug)]
pub struct NoteEditor {
    debounce: Duration,
    saved_display: Duration,
    retry_failed_saves: bool,
    next_generation: u64,
    next_sequence: u64,
    session: Option<EditSession>,
    /// Saves that carry the final edits of sessions that have since closed.
    detached: Vec<InFlight>,
}

impl NoteEditor {
    pub fn new(config: &AutoSaveConfig) -> Self {
        Self {
            debounce: config.debounce(),
            saved_display: config.saved_display(),
            retry_failed_saves: config.retry_failed_saves,
            next_generation: 1,
            next_sequence: 1,
            session: None,
            detached: Vec::new(),
        }
    }

    pub fn note_id(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.note_id)
    }

    pub fn fields(&self) -> Option<&EditFields> {
        self.session.as_ref().map(|s| &s.fields)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.session.as_ref().map(EditSession::is_dirty).unwrap_or(false)
    }

    pub fn status(&self) -> EditorStatus {
        self.session
            .as_ref()
            .map(EditSession::status)
            .unwrap_or(EditorStatus::Empty)
    }

    pub fn phase(&self) -> EditorPhase {
        self.status().phase()
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let session = self.session.as_ref()?;
        [session.debounce.deadline(), session.saved_banner.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Makes `note` the open note, or closes the editor when `None`.
    ///
    /// When a different note was open with unsaved edits, the returned request
    /// saves them and must be executed before the new note is shown. Handing
    /// in the note that is already open refreshes the snapshot from the
    /// server values instead.
    pub fn open(&mut self, note: Option<&NoteRecord>, now: Instant) -> Option<SaveRequest> {
        if let (Some(note), Some(session)) = (note, self.session.as_mut()) {
            if session.note_id == note.id {
                Self::refresh_session(session, note, now);
                return None;
            }
        }

        let flush = self.session.take().and_then(|session| self.flush_session(session));
        if let Some(note) = note {
            let fields = EditFields::from_note(note);
            let generation = bump(&mut self.next_generation);
            tracing::debug!(note_id = note.id, generation, "opening note for editing");
            self.session = Some(EditSession {
                generation,
                note_id: note.id,
                snapshot: fields.clone(),
                fields,
                debounce: DebounceTimer::new(self.debounce),
                saved_banner: DebounceTimer::new(self.saved_display),
                in_flight: None,
                last_saved_at: None,
                last_error: None,
            });
        }
        flush
    }

    /// Ends the session, returning a save for any edits that are still pending.
    pub fn close(&mut self) -> Option<SaveRequest> {
        self.open(None, Instant::now())
    }

    /// Drops the session without saving; used when the open note itself is being deleted.
    pub fn discard(&mut self) -> Option<i64> {
        let session = self.session.take()?;
        if session.is_dirty() {
            tracing::debug!(note_id = session.note_id, "discarding unsaved edits of a deleted note");
        }
        Some(session.note_id)
    }

    pub fn edit_title(&mut self, title: &str, now: Instant) {
        self.apply_edit(now, |fields| {
            if fields.title == title {
                return false;
            }
            fields.title.clear();
            fields.title.push_str(title);
            true
        });
    }

    pub fn edit_content(&mut self, content: &str, now: Instant) {
        self.apply_edit(now, |fields| {
            if fields.content == content {
                return false;
            }
            fields.content.clear();
            fields.content.push_str(content);
            true
        });
    }

    /// Advances timers; returns a save request once the debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest> {
        let session = self.session.as_mut()?;
        session.saved_banner.take_if_due(now);
        if session.in_flight.is_some() || !session.debounce.is_due(now) {
            return None;
        }
        session.debounce.cancel();
        if !session.is_dirty() {
            return None;
        }
        let sequence = bump(&mut self.next_sequence);
        Some(issue_save(session, sequence))
    }

    /// Saves pending edits right away, bypassing the debounce window.
    pub fn flush(&mut self) -> Option<SaveRequest> {
        let session = self.session.as_mut()?;
        if session.in_flight.is_some() || !session.is_dirty() {
            return None;
        }
        session.debounce.cancel();
        let sequence = bump(&mut self.next_sequence);
        Some(issue_save(session, sequence))
    }

    pub fn complete_save<E: fmt::Display>(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), E>,
        now: Instant,
    ) -> SaveOutcome {
        let note_id = ticket.note_id;
        let retry = self.retry_failed_saves;
        let live = self
            .session
            .as_ref()
            .is_some_and(|s| s.generation == ticket.generation);
        if !live {
            return self.complete_detached(ticket, result);
        }
        let Some(session) = self.session.as_mut() else {
            return SaveOutcome::Stale { note_id };
        };
        let flight = match session.in_flight.take() {
            Some(flight) if flight.ticket == ticket => flight,
            other => {
                session.in_flight = other;
                tracing::debug!(note_id, "ignoring save completion that is no longer in flight");
                return SaveOutcome::Stale { note_id };
            }
        };

        match result {
            Ok(()) => {
                session.snapshot = flight.fields;
                session.last_saved_at = Some(OffsetDateTime::now_utc());
                session.last_error = None;
                if session.is_dirty() {
                    if !session.debounce.is_armed() {
                        session.debounce.reschedule(now);
                    }
                } else {
                    session.debounce.cancel();
                    session.saved_banner.reschedule(now);
                }
                SaveOutcome::Saved { note_id }
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(note_id, error = %message, "autosave failed");
                session.last_error = Some(SaveFailure {
                    message: message.clone(),
                    occurred_at: OffsetDateTime::now_utc(),
                });
                if retry && session.is_dirty() && !session.debounce.is_armed() {
                    session.debounce.reschedule(now);
                }
                SaveOutcome::Failed { note_id, message }
            }
        }
    }

    fn apply_edit<F>(&mut self, now: Instant, f: F)
    where
        F: FnOnce(&mut EditFields) -> bool,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !f(&mut session.fields) {
            return;
        }
        session.last_error = None;
        if session.is_dirty() {
            session.saved_banner.cancel();
            session.debounce.reschedule(now);
        } else {
            session.debounce.cancel();
        }
    }

    fn flush_session(&mut self, mut session: EditSession) -> Option<SaveRequest> {
        session.debounce.cancel();
        session.saved_banner.cancel();
        if !session.needs_flush() {
            // The save in flight already carries the latest edits; keep track of it.
            if session.is_dirty() {
                self.detached.extend(session.in_flight.take());
            }
            return None;
        }
        let sequence = bump(&mut self.next_sequence);
        tracing::debug!(note_id = session.note_id, "flushing edits of the note being closed");
        let request = SaveRequest {
            ticket: SaveTicket {
                generation: session.generation,
                sequence,
                note_id: session.note_id,
            },
            note_id: session.note_id,
            fields: session.fields,
        };
        self.detached.push(InFlight {
            ticket: request.ticket,
            fields: request.fields.clone(),
        });
        Some(request)
    }

    fn complete_detached<E: fmt::Display>(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), E>,
    ) -> SaveOutcome {
        let note_id = ticket.note_id;
        let position = self.detached.iter().position(|flight| flight.ticket == ticket);
        let Some(flight) = position.map(|idx| self.detached.swap_remove(idx)) else {
            tracing::debug!(note_id, "ignoring save completion for a closed session");
            return SaveOutcome::Stale { note_id };
        };
        match result {
            Ok(()) => SaveOutcome::Stale { note_id },
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(note_id, error = %message, "saving edits of a closed note failed");
                SaveOutcome::Orphaned {
                    note_id,
                    fields: flight.fields,
                    message,
                }
            }
        }
    }

    fn refresh_session(session: &mut EditSession, note: &NoteRecord, now: Instant) {
        let server = EditFields::from_note(note);
        if session.snapshot == server {
            return;
        }
        if session.fields.title == session.snapshot.title {
            session.fields.title.clone_from(&server.title);
        }
        if session.fields.content == session.snapshot.content {
            session.fields.content.clone_from(&server.content);
        }
        session.snapshot = server;
        if session.is_dirty() {
            if !session.debounce.is_armed() && session.in_flight.is_none() {
                session.debounce.reschedule(now);
            }
        } else {
            session.debounce.cancel();
            session.last_error = None;
        }
    }
}

fn bump(counter: &mut u64) -> u64 {
    let value = *counter;
    *counter += 1;
    value
}

fn issue_save(session: &mut EditSession, sequence: u64) -> SaveRequest {
    let request = SaveRequest {
        ticket: SaveTicket {
            generation: session.generation,
            sequence,
            note_id: session.note_id,
        },
        note_id: session.note_id,
        fields: session.fields.clone(),
    };
    tracing::debug!(note_id = session.note_id, sequence, "issuing autosave");
    session.in_flight = Some(InFlight {
        ticket: request.ticket,
        fields: request.fields.clone(),
    });
    request
}
