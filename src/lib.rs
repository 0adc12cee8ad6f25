//! Practice Companion - a practice tracker for bass players
//!
//! Log short timed practice sessions ("bursts") against practice items,
//! earn notes for every session, and review the week.
//!
//! # Overview
//!
//! Practice items come in seven kinds (riff, BassBuzz lesson, exercise,
//! warm-up, theory, resource, stamina). The [`kinds`] registry decides which
//! fields each kind carries and how many notes a logged session is worth.
//!
//! Everything goes through [`PracticeApp`], which sits on top of a
//! [`PracticeStore`] backend (JSON slot files or SQLite).
//!
//! # Quick Start
//!
//! ```no_run
//! use practice_companion::{Config, ItemForm, LocalStore, MemorySlots, PracticeApp};
//!
//! let mut app = PracticeApp::new(LocalStore::new(MemorySlots::new()), Config::default());
//! app.init().unwrap();
//!
//! let drill = app
//!     .save_item(ItemForm {
//!         title: "Scale Drill".to_string(),
//!         kind: "exercise".to_string(),
//!         allow_burst: true,
//!         ..ItemForm::default()
//!     })
//!     .unwrap();
//!
//! app.start_burst_on_item(&drill.id).unwrap();
//! app.start_timer().unwrap();
//! let log = app.complete_burst().unwrap();
//! println!("{} minute(s), {} note(s)", log.minutes, log.notes_awarded);
//! ```

pub mod app;
pub mod burst;
pub mod config;
pub mod error;
pub mod export;
pub mod kinds;
pub mod model;
pub mod render;
pub mod schema;
pub mod serve;
pub mod store;
pub mod tui;

pub use app::{DayLogEntry, DaySummary, HomeView, ItemDetail, ItemForm, PracticeApp, View};
pub use burst::{Burst, BurstPhase, Clock, Cue, ManualClock, SystemClock};
pub use config::{Backend, Config};
pub use error::{Error, Result};
pub use export::{ExportDocument, ImportSummary, EXPORT_VERSION};
pub use kinds::{Kind, KindDefinition, ALL_KINDS};
pub use model::{ItemValues, LogFilter, LogValues, PracticeItem, PracticeLog, Workout};
pub use store::{data_dir, open_store, FileSlots, LocalStore, MemorySlots, PracticeStore, SlotStorage, SqliteStore};
