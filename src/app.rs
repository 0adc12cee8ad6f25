//! Application controller
//!
//! [`PracticeApp`] owns the store, the clock, the config and all UI state
//! (current view, last item, the open burst). Front ends (CLI, web server,
//! burst TUI) call its operations and render the view models it returns.

use crate::burst::{Burst, Clock, Cue, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{ExportDocument, ImportSummary};
use crate::kinds::Kind;
use crate::model::{
    new_id, BassbuzzValues, DetailField, ItemValues, LogFilter, PracticeItem, PracticeLog, ResourceValues,
    RiffValues, StaminaValues, Workout,
};
use crate::store::PracticeStore;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Seeded resource item other tools link to by id
pub const NOTE_TRAINER_ID: &str = "note-trainer-fixed-id";

/// Days shown in the week view
pub const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Home,
    Week,
    Items,
    Bassbuzz,
}

pub const ALL_VIEWS: [View; 4] = [View::Home, View::Week, View::Items, View::Bassbuzz];

impl View {
    pub fn label(&self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Week => "Week",
            View::Items => "Items",
            View::Bassbuzz => "BassBuzz",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            View::Home => "/",
            View::Week => "/week",
            View::Items => "/items",
            View::Bassbuzz => "/bassbuzz",
        }
    }
}

// ============================================================================
// View models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub last_item: Option<PracticeItem>,
    pub pinned: Vec<PracticeItem>,
    pub recent: Vec<PracticeItem>,
    pub total_notes: u32,
}

/// One cell of the week grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub notes: u32,
    pub log_count: usize,
}

impl DaySummary {
    /// Short weekday name, e.g. "Tue"
    pub fn weekday(&self) -> String {
        self.date.format("%a").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLogEntry {
    pub log: PracticeLog,
    /// `Unknown` when the item no longer exists
    pub item_title: String,
    /// Local wall-clock time, `HH:MM`
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub item: PracticeItem,
    pub kind_label: &'static str,
    pub fields: Vec<DetailField>,
    /// Logs recorded against this item, most recent first
    pub logs: Vec<PracticeLog>,
}

/// Raw item form input. `fields` holds the kind-specific values as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    /// Set when editing an existing item
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub allow_burst: bool,
    #[serde(default)]
    pub completed: bool,
}

impl ItemForm {
    /// Form prefilled from a stored item
    pub fn from_item(item: &PracticeItem) -> Self {
        let fields = item
            .kind()
            .definition()
            .fields
            .iter()
            .filter_map(|f| item.values.form_value(f.name).map(|v| (f.name.to_string(), v)))
            .collect();
        Self {
            id: Some(item.id.clone()),
            title: item.title.clone(),
            kind: item.kind().as_str().to_string(),
            fields,
            pinned: item.pinned,
            allow_burst: item.allow_burst,
            completed: item.completed,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct PracticeApp<S: PracticeStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    config: Config,
    view: View,
    last_item_id: Option<String>,
    burst: Option<Burst>,
}

impl<S: PracticeStore> PracticeApp<S, SystemClock> {
    pub fn new(store: S, config: Config) -> Self {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: PracticeStore, C: Clock> PracticeApp<S, C> {
    pub fn with_clock(store: S, clock: C, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
            view: View::Home,
            last_item_id: None,
            burst: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Prepare storage, seed sample items into an empty collection and load
    /// the last practiced item
    pub fn init(&mut self) -> Result<()> {
        self.store.init()?;

        if self.config.storage.seed_on_empty && self.store.list_items()?.is_empty() {
            log::info!("Seeding sample items");
            for item in seed_items() {
                self.store.upsert_item(item)?;
            }
        }

        self.last_item_id = self.store.last_item_id()?;
        Ok(())
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn switch_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn last_item_id(&self) -> Option<&str> {
        self.last_item_id.as_deref()
    }

    /// The last practiced item, if it still exists
    pub fn last_item(&self) -> Result<Option<PracticeItem>> {
        match &self.last_item_id {
            Some(id) => self.store.get_item(id),
            None => Ok(None),
        }
    }

    pub fn home(&self) -> Result<HomeView> {
        let items = self.store.list_items()?;
        let recent = self.recent_items(&items, self.config.home.recent_limit)?;
        let pinned = items.into_iter().filter(|i| i.pinned).collect();
        Ok(HomeView {
            last_item: self.last_item()?,
            pinned,
            recent,
            total_notes: self.total_notes()?,
        })
    }

    /// Distinct items of the most recent logs, most recent first
    fn recent_items(&self, items: &[PracticeItem], limit: usize) -> Result<Vec<PracticeItem>> {
        let by_id: HashMap<&str, &PracticeItem> = items.iter().map(|i| (i.id.as_str(), i)).collect();
        let mut seen = HashSet::new();
        let mut recent = Vec::new();

        for log in self.store.list_logs(&LogFilter::all())? {
            if recent.len() >= limit {
                break;
            }
            if !seen.insert(log.item_id.clone()) {
                continue;
            }
            if let Some(item) = by_id.get(log.item_id.as_str()) {
                recent.push((*item).clone());
            }
        }
        Ok(recent)
    }

    pub fn items(&self) -> Result<Vec<PracticeItem>> {
        self.store.list_items()
    }

    pub fn logs(&self, filter: &LogFilter) -> Result<Vec<PracticeLog>> {
        self.store.list_logs(filter)
    }

    /// Items offered in the burst item selector
    pub fn burstable_items(&self) -> Result<Vec<PracticeItem>> {
        Ok(self.store.list_items()?.into_iter().filter(|i| i.allow_burst).collect())
    }

    fn require_item(&self, id: &str) -> Result<PracticeItem> {
        self.store.get_item(id)?.ok_or_else(|| Error::not_found("item", id))
    }

    // ------------------------------------------------------------------
    // Burst flow
    // ------------------------------------------------------------------

    pub fn burst(&self) -> Option<&Burst> {
        self.burst.as_ref()
    }

    pub fn start_burst_on_last_item(&mut self) -> Result<&Burst> {
        let id = self
            .last_item_id
            .clone()
            .ok_or_else(|| Error::NotFound("No recent item. Pick one to burst on.".to_string()))?;
        self.start_burst_on_item(&id)
    }

    /// Open the burst for an item. Any burst already open is discarded.
    pub fn start_burst_on_item(&mut self, id: &str) -> Result<&Burst> {
        let item = self.require_item(id)?;
        if !item.allow_burst {
            return Err(Error::Validation(format!("'{}' does not allow bursts", item.title)));
        }
        if let Some(previous) = self.burst.take() {
            log::debug!("Discarding open burst on {}", previous.item().id);
        }
        Ok(self.burst.insert(Burst::open(item, self.config.burst.duration_secs)))
    }

    fn open_burst(&mut self) -> Result<&mut Burst> {
        self.burst
            .as_mut()
            .ok_or_else(|| Error::Validation("No burst is open".to_string()))
    }

    pub fn start_timer(&mut self) -> Result<()> {
        let now = self.clock.now();
        self.open_burst()?.start(now)
    }

    /// Advance the countdown. No burst, no cues.
    pub fn tick(&mut self) -> Vec<Cue> {
        let now = self.clock.now();
        match self.burst.as_mut() {
            Some(burst) => burst.tick(now),
            None => Vec::new(),
        }
    }

    pub fn stop_timer(&mut self) -> Result<()> {
        let now = self.clock.now();
        self.open_burst()?.stop(now)
    }

    pub fn set_runtime_bpm(&mut self, bpm: u32) -> Result<()> {
        self.open_burst()?.set_runtime_bpm(bpm)
    }

    pub fn adjust_runtime_bpm(&mut self, delta: i32) -> Result<()> {
        self.open_burst()?.adjust_runtime_bpm(delta);
        Ok(())
    }

    /// Record the open burst as a log and remember its item as the last one.
    /// The burst stays open if the log cannot be written.
    pub fn complete_burst(&mut self) -> Result<PracticeLog> {
        let now = self.clock.now();
        let burst = self
            .burst
            .as_ref()
            .ok_or_else(|| Error::Validation("No burst is open".to_string()))?;
        let log = burst.clone().into_log(now, self.config.burst.fallback_minutes);

        let log = self.store.add_log(log)?;
        self.store.set_last_item_id(&log.item_id)?;
        self.last_item_id = Some(log.item_id.clone());
        self.burst = None;

        log::info!("Burst logged: {} min, +{} notes", log.minutes, log.notes_awarded);
        Ok(log)
    }

    /// Discard the open burst without logging. Returns whether one was open.
    pub fn close_burst(&mut self) -> bool {
        self.burst.take().is_some()
    }

    // ------------------------------------------------------------------
    // Week
    // ------------------------------------------------------------------

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&Local).date_naive()
    }

    /// The last seven local days, oldest first
    pub fn week(&self) -> Result<Vec<DaySummary>> {
        let today = self.today();
        let first = today - Duration::days(WEEK_DAYS - 1);
        let (from, _) = local_day_bounds(first)?;
        let (_, to) = local_day_bounds(today)?;

        let mut days: Vec<DaySummary> = (0..WEEK_DAYS)
            .map(|offset| DaySummary {
                date: first + Duration::days(offset),
                notes: 0,
                log_count: 0,
            })
            .collect();

        for log in self.store.list_logs(&LogFilter::between(from, to))? {
            let date = log.date_time.with_timezone(&Local).date_naive();
            if let Some(day) = days.iter_mut().find(|d| d.date == date) {
                day.notes += log.notes_awarded;
                day.log_count += 1;
            }
        }
        Ok(days)
    }

    /// Logs of one local day, most recent first
    pub fn day_detail(&self, date: NaiveDate) -> Result<Vec<DayLogEntry>> {
        let (from, to) = local_day_bounds(date)?;
        let logs = self.store.list_logs(&LogFilter::between(from, to))?;
        let titles: HashMap<String, String> = self
            .store
            .list_items()?
            .into_iter()
            .map(|i| (i.id, i.title))
            .collect();

        Ok(logs
            .into_iter()
            .map(|log| DayLogEntry {
                item_title: titles
                    .get(&log.item_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                time: log.date_time.with_timezone(&Local).format("%H:%M").to_string(),
                log,
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    pub fn item_detail(&self, id: &str) -> Result<ItemDetail> {
        let item = self.require_item(id)?;
        Ok(ItemDetail {
            kind_label: item.kind_label(),
            fields: item.values.detail_fields(),
            logs: self.store.list_logs(&LogFilter::for_item(id))?,
            item,
        })
    }

    /// Form for a new item, or prefilled from an existing one
    pub fn item_form(&self, id: Option<&str>) -> Result<ItemForm> {
        match id {
            Some(id) => Ok(ItemForm::from_item(&self.require_item(id)?)),
            None => Ok(ItemForm::default()),
        }
    }

    /// Validate the form and create or replace the item
    pub fn save_item(&mut self, form: ItemForm) -> Result<PracticeItem> {
        let title = form.title.trim();
        let kind_key = form.kind.trim();
        if title.is_empty() || kind_key.is_empty() {
            return Err(Error::Validation("Title and kind are required".to_string()));
        }
        let kind: Kind = kind_key.parse().map_err(Error::Validation)?;
        let values = ItemValues::from_form(kind, &form.fields)?;

        let id = match form.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.require_item(id)?.id,
            None => new_id(),
        };

        let item = PracticeItem {
            id,
            title: title.to_string(),
            values,
            pinned: form.pinned,
            allow_burst: form.allow_burst,
            completed: kind == Kind::Bassbuzz && form.completed,
        };
        log::debug!("Saving {} item {}", kind, item.id);
        self.store.upsert_item(item)
    }

    /// Delete an item and its logs
    pub fn delete_item(&mut self, id: &str) -> Result<PracticeItem> {
        let item = self.require_item(id)?;
        self.store.delete_item(id)?;
        if self.burst.as_ref().map(|b| b.item().id == id).unwrap_or(false) {
            self.burst = None;
        }
        Ok(item)
    }

    // ------------------------------------------------------------------
    // BassBuzz
    // ------------------------------------------------------------------

    /// BassBuzz lessons ordered by module, then lesson
    pub fn bassbuzz_lessons(&self) -> Result<Vec<PracticeItem>> {
        let mut lessons: Vec<PracticeItem> = self
            .store
            .list_items()?
            .into_iter()
            .filter(|i| i.kind() == Kind::Bassbuzz)
            .collect();
        lessons.sort_by_key(|i| match &i.values {
            ItemValues::Bassbuzz(v) => (v.module.unwrap_or(0), v.lesson.unwrap_or(0)),
            _ => (0, 0),
        });
        Ok(lessons)
    }

    fn require_lesson(&self, id: &str) -> Result<PracticeItem> {
        let item = self.require_item(id)?;
        if item.kind() != Kind::Bassbuzz {
            return Err(Error::Validation(format!("'{}' is not a BassBuzz lesson", item.title)));
        }
        Ok(item)
    }

    pub fn toggle_lesson_completed(&mut self, id: &str) -> Result<PracticeItem> {
        let mut item = self.require_lesson(id)?;
        item.completed = !item.completed;
        self.store.upsert_item(item)
    }

    /// Log a BassBuzz workout. Workouts are not timed.
    pub fn log_bassbuzz_workout(&mut self, id: &str, workout: Workout) -> Result<PracticeLog> {
        let item = self.require_lesson(id)?;
        let mut log = PracticeLog::new(&item, self.clock.now(), &workout.mode(), 0);
        log.values.workout_type = Some(workout);
        self.store.add_log(log)
    }

    pub fn total_notes(&self) -> Result<u32> {
        Ok(self
            .store
            .list_logs(&LogFilter::all())?
            .iter()
            .map(|l| l.notes_awarded)
            .sum())
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    pub fn export(&self) -> Result<ExportDocument> {
        Ok(ExportDocument::new(
            self.store.list_items()?,
            self.store.list_logs(&LogFilter::all())?,
            self.clock.now(),
        ))
    }

    /// Upsert every item and add logs not already present. Nothing is
    /// written when any item fails the checks `save_item` applies.
    pub fn import(&mut self, doc: ExportDocument) -> Result<ImportSummary> {
        doc.check_version()?;
        for item in &doc.items {
            check_imported_item(item)?;
        }
        let mut summary = ImportSummary::default();

        for item in doc.items {
            self.store.upsert_item(item)?;
            summary.items_upserted += 1;
        }

        let mut known: HashSet<String> = self
            .store
            .list_logs(&LogFilter::all())?
            .into_iter()
            .map(|l| l.id)
            .collect();
        for log in doc.logs {
            if known.insert(log.id.clone()) {
                self.store.add_log(log)?;
                summary.logs_added += 1;
            } else {
                summary.logs_skipped += 1;
            }
        }

        log::info!(
            "Imported {} item(s), {} log(s) ({} skipped)",
            summary.items_upserted,
            summary.logs_added,
            summary.logs_skipped
        );
        Ok(summary)
    }
}

fn check_imported_item(item: &PracticeItem) -> Result<()> {
    if item.id.trim().is_empty() || item.title.trim().is_empty() {
        return Err(Error::Validation(format!(
            "Imported item '{}' needs an id and a title",
            item.id
        )));
    }
    ItemValues::from_form(item.kind(), &ItemForm::from_item(item).fields)
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("Imported item '{}': {}", item.title, e)))
}

fn to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    // A wall-clock time skipped by a DST change falls back to UTC
    Local
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// First and last millisecond of a local calendar day, in UTC
pub fn local_day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| Error::Validation(format!("Date {} is out of range", date)))?;
    let start = to_utc(date.and_time(NaiveTime::MIN));
    let next = to_utc(next.and_time(NaiveTime::MIN));
    Ok((start, next - Duration::milliseconds(1)))
}

/// Sample items written into an empty collection
fn seed_items() -> Vec<PracticeItem> {
    vec![
        PracticeItem::new(
            "Ladies Night",
            ItemValues::Riff(RiffValues {
                target_bpm: 110,
                notes: "a3 . a6 . d3 . d5 . ¦ a3 a3 a6 a6 d3 . . .".to_string(),
            }),
        )
        .with_pinned(true)
        .with_allow_burst(true),
        PracticeItem::new(
            "Another One Bites the Dust",
            ItemValues::Riff(RiffValues {
                target_bpm: 110,
                notes: "e0 e0 e0 . e0 ¦ e0 e0 e3 e0 e5".to_string(),
            }),
        )
        .with_pinned(true)
        .with_allow_burst(true),
        PracticeItem::new(
            "Stamina 60s @ 120 BPM",
            ItemValues::Stamina(StaminaValues {
                duration: 60,
                bpm: 120,
                description: "Continuous eighth notes for 60 seconds".to_string(),
            }),
        )
        .with_allow_burst(true),
        PracticeItem::new(
            "Note Trainer",
            ItemValues::Resource(ResourceValues {
                link: "./bass-notes.html".to_string(),
                description: "Bass notes learning tool".to_string(),
            }),
        )
        .with_id(NOTE_TRAINER_ID)
        .with_pinned(true),
        PracticeItem::new(
            "BassBuzz M1 L1",
            ItemValues::Bassbuzz(BassbuzzValues {
                module: Some(1),
                lesson: Some(1),
                link: String::new(),
            }),
        )
        .with_allow_burst(true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burst::{BurstPhase, ManualClock};
    use crate::config::StorageConfig;
    use crate::model::MODE_BURST;
    use crate::store::{LocalStore, MemorySlots};

    type TestApp = PracticeApp<LocalStore<MemorySlots>, ManualClock>;

    fn start_time() -> DateTime<Utc> {
        // Local noon keeps the week tests away from midnight in any time zone
        let today = Local::now().date_naive();
        to_utc(today.and_hms_opt(12, 0, 0).unwrap())
    }

    fn empty_app() -> (TestApp, ManualClock) {
        let clock = ManualClock::new(start_time());
        let config = Config {
            storage: StorageConfig {
                seed_on_empty: false,
                ..StorageConfig::default()
            },
            ..Config::default()
        };
        let mut app = PracticeApp::with_clock(LocalStore::new(MemorySlots::new()), clock.clone(), config);
        app.init().unwrap();
        (app, clock)
    }

    fn form(title: &str, kind: &str, fields: &[(&str, &str)]) -> ItemForm {
        ItemForm {
            title: title.to_string(),
            kind: kind.to_string(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            allow_burst: true,
            ..ItemForm::default()
        }
    }

    #[test]
    fn test_init_seeds_once() {
        let clock = ManualClock::new(start_time());
        let mut app = PracticeApp::with_clock(LocalStore::new(MemorySlots::new()), clock, Config::default());
        app.init().unwrap();
        app.init().unwrap();

        let items = app.items().unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().any(|i| i.id == NOTE_TRAINER_ID && i.pinned && !i.allow_burst));
        assert_eq!(app.home().unwrap().pinned.len(), 3);
    }

    #[test]
    fn test_scale_drill_burst_scenario() {
        let (mut app, clock) = empty_app();
        let drill = app.save_item(form("Scale Drill", "exercise", &[])).unwrap();

        app.start_burst_on_item(&drill.id).unwrap();
        app.start_timer().unwrap();
        clock.advance_secs(65);
        assert!(app.tick().is_empty());
        let log = app.complete_burst().unwrap();

        assert_eq!(log.minutes, 1);
        assert_eq!(log.notes_awarded, 1);
        assert_eq!(log.mode, MODE_BURST);
        assert_eq!(app.logs(&LogFilter::all()).unwrap(), vec![log]);
        assert_eq!(app.last_item_id(), Some(drill.id.as_str()));
        assert_eq!(app.store().last_item_id().unwrap(), Some(drill.id.clone()));
        assert!(app.burst().is_none());
    }

    #[test]
    fn test_burst_auto_finishes() {
        let (mut app, clock) = empty_app();
        let riff = app.save_item(form("Riff", "riff", &[("targetBpm", "90")])).unwrap();
        app.start_burst_on_item(&riff.id).unwrap();
        app.set_runtime_bpm(95).unwrap();
        app.start_timer().unwrap();
        clock.advance_secs(301);
        assert_eq!(app.tick(), vec![Cue::Tone, Cue::Haptic]);
        assert_eq!(app.burst().map(|b| b.phase()), Some(BurstPhase::Finished));

        let log = app.complete_burst().unwrap();
        assert_eq!(log.minutes, 5);
        assert_eq!(log.values.bpm, Some(95));
        assert_eq!(log.notes_awarded, 1);
    }

    #[test]
    fn test_done_after_finish_logs_time_until_done() {
        let (mut app, clock) = empty_app();
        let drill = app.save_item(form("Scale Drill", "exercise", &[])).unwrap();
        app.start_burst_on_item(&drill.id).unwrap();
        app.start_timer().unwrap();
        clock.advance_secs(300);
        assert_eq!(app.tick(), vec![Cue::Tone, Cue::Haptic]);
        clock.advance_secs(120);
        assert_eq!(app.complete_burst().unwrap().minutes, 7);

        app.start_burst_on_item(&drill.id).unwrap();
        app.start_timer().unwrap();
        clock.advance_secs(65);
        app.stop_timer().unwrap();
        clock.advance_secs(535);
        assert_eq!(app.complete_burst().unwrap().minutes, 10);
    }

    #[test]
    fn test_unstarted_burst_uses_fallback_minutes() {
        let (mut app, _clock) = empty_app();
        let item = app.save_item(form("Warm-up", "warmup", &[])).unwrap();
        app.start_burst_on_item(&item.id).unwrap();
        assert_eq!(app.complete_burst().unwrap().minutes, 5);
    }

    #[test]
    fn test_close_burst_discards() {
        let (mut app, clock) = empty_app();
        let item = app.save_item(form("Warm-up", "warmup", &[])).unwrap();
        app.start_burst_on_item(&item.id).unwrap();
        app.start_timer().unwrap();
        assert!(app.close_burst());
        clock.advance_secs(400);
        assert!(app.tick().is_empty());
        assert!(!app.close_burst());
        assert!(app.logs(&LogFilter::all()).unwrap().is_empty());
        assert!(matches!(app.complete_burst(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_start_burst_errors() {
        let (mut app, _clock) = empty_app();
        assert!(matches!(app.start_burst_on_last_item(), Err(Error::NotFound(_))));
        assert!(matches!(app.start_burst_on_item("missing"), Err(Error::NotFound(_))));

        let mut no_burst = form("Reading", "theory", &[]);
        no_burst.allow_burst = false;
        let item = app.save_item(no_burst).unwrap();
        assert!(matches!(app.start_burst_on_item(&item.id), Err(Error::Validation(_))));
    }

    #[test]
    fn test_last_item_gone() {
        let (mut app, _clock) = empty_app();
        let item = app.save_item(form("Warm-up", "warmup", &[])).unwrap();
        app.start_burst_on_item(&item.id).unwrap();
        app.complete_burst().unwrap();
        app.start_burst_on_last_item().unwrap();

        app.delete_item(&item.id).unwrap();
        assert!(app.burst().is_none());
        assert!(matches!(app.start_burst_on_last_item(), Err(Error::NotFound(_))));
        assert_eq!(app.home().unwrap().last_item, None);
    }

    #[test]
    fn test_recent_items_unique_in_recency_order() {
        let (mut app, clock) = empty_app();
        let a = app.save_item(form("A", "warmup", &[])).unwrap();
        let b = app.save_item(form("B", "warmup", &[])).unwrap();
        let c = app.save_item(form("C", "warmup", &[])).unwrap();
        for id in [&a.id, &b.id, &a.id, &c.id] {
            app.start_burst_on_item(id).unwrap();
            app.complete_burst().unwrap();
            clock.advance_secs(60);
        }
        app.delete_item(&c.id).unwrap();

        let home = app.home().unwrap();
        let titles: Vec<&str> = home.recent.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(home.total_notes, 3);
    }

    #[test]
    fn test_week_and_day_detail() {
        let (mut app, clock) = empty_app();
        let bb = app.save_item(form("BassBuzz M1 L1", "bassbuzz", &[("module", "1"), ("lesson", "1")])).unwrap();
        let riff = app.save_item(form("Riff", "riff", &[])).unwrap();

        // Two days ago
        clock.advance_secs(-2 * 86_400);
        app.log_bassbuzz_workout(&bb.id, Workout::Slow).unwrap();
        clock.set(start_time());
        app.log_bassbuzz_workout(&bb.id, Workout::Fast).unwrap();
        app.start_burst_on_item(&riff.id).unwrap();
        app.complete_burst().unwrap();

        let week = app.week().unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week[6].date, app.today());
        assert_eq!((week[6].notes, week[6].log_count), (3, 2));
        assert_eq!((week[4].notes, week[4].log_count), (2, 1));
        assert_eq!(week.iter().map(|d| d.log_count).sum::<usize>(), 3);

        app.delete_item(&riff.id).unwrap();
        let entries = app.day_detail(app.today()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_title, "BassBuzz M1 L1");
        assert_eq!(entries[0].log.mode, "bassbuzz-fast");
    }

    #[test]
    fn test_day_bounds_at_calendar_end() {
        let (from, to) = local_day_bounds(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).unwrap();
        assert_eq!(to - from, Duration::days(1) - Duration::milliseconds(1));

        assert!(matches!(local_day_bounds(NaiveDate::MAX), Err(Error::Validation(_))));
        let (app, _clock) = empty_app();
        assert!(matches!(app.day_detail(NaiveDate::MAX), Err(Error::Validation(_))));
    }

    #[test]
    fn test_day_detail_unknown_item() {
        let (mut app, _clock) = empty_app();
        let item = PracticeItem::new("Ghost", ItemValues::defaults(Kind::Warmup));
        app.store.add_log(PracticeLog::new(&item, app.now(), MODE_BURST, 3)).unwrap();
        let entries = app.day_detail(app.today()).unwrap();
        assert_eq!(entries[0].item_title, "Unknown");
    }

    #[test]
    fn test_save_item_validation() {
        let (mut app, _clock) = empty_app();
        let err = app.save_item(form("  ", "riff", &[])).unwrap_err();
        assert_eq!(err.to_string(), "Title and kind are required");
        assert!(matches!(app.save_item(form("Drums", "drums", &[])), Err(Error::Validation(_))));
        assert!(matches!(
            app.save_item(form("Lesson", "bassbuzz", &[("lesson", "1")])),
            Err(Error::Validation(_))
        ));

        let mut edit = form("Ghost", "warmup", &[]);
        edit.id = Some("missing".to_string());
        assert!(matches!(app.save_item(edit), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_save_item_edit_round_trip() {
        let (mut app, _clock) = empty_app();
        let mut new = form("Stamina", "stamina", &[("bpm", "100")]);
        new.completed = true;
        let item = app.save_item(new).unwrap();
        assert!(!item.completed);

        let mut edit = app.item_form(Some(&item.id)).unwrap();
        assert_eq!(edit.fields.get("duration").map(String::as_str), Some("60"));
        assert_eq!(edit.fields.get("bpm").map(String::as_str), Some("100"));
        edit.title = "Stamina long".to_string();
        edit.fields.insert("duration".to_string(), "120".to_string());
        let edited = app.save_item(edit).unwrap();

        assert_eq!(edited.id, item.id);
        assert_eq!(app.items().unwrap(), vec![edited.clone()]);
        assert_eq!(app.item_detail(&item.id).unwrap().fields[0].label, "Duration");
    }

    #[test]
    fn test_bassbuzz_lessons_and_toggle() {
        let (mut app, _clock) = empty_app();
        let l2 = app.save_item(form("M2 L1", "bassbuzz", &[("module", "2"), ("lesson", "1")])).unwrap();
        let l1 = app.save_item(form("M1 L3", "bassbuzz", &[("module", "1"), ("lesson", "3")])).unwrap();
        let riff = app.save_item(form("Riff", "riff", &[])).unwrap();

        let ids: Vec<String> = app.bassbuzz_lessons().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![l1.id.clone(), l2.id.clone()]);

        assert!(app.toggle_lesson_completed(&l1.id).unwrap().completed);
        assert!(!app.toggle_lesson_completed(&l1.id).unwrap().completed);
        assert!(matches!(app.toggle_lesson_completed(&riff.id), Err(Error::Validation(_))));
        assert!(matches!(app.toggle_lesson_completed("missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_bassbuzz_workout_log() {
        let (mut app, _clock) = empty_app();
        let lesson = app.save_item(form("M1 L1", "bassbuzz", &[("module", "1"), ("lesson", "1")])).unwrap();
        let log = app.log_bassbuzz_workout(&lesson.id, Workout::Middle).unwrap();
        assert_eq!(log.mode, "bassbuzz-middle");
        assert_eq!(log.minutes, 0);
        assert_eq!(log.notes_awarded, 2);
        assert_eq!(log.values.workout_type, Some(Workout::Middle));
        assert_eq!(app.total_notes().unwrap(), 2);
        // Workouts do not move the last item
        assert_eq!(app.last_item_id(), None);
    }

    #[test]
    fn test_resource_awards_no_notes() {
        let (mut app, _clock) = empty_app();
        let res = app.save_item(form("Note Trainer", "resource", &[("link", "./bass-notes.html")])).unwrap();
        app.start_burst_on_item(&res.id).unwrap();
        assert_eq!(app.complete_burst().unwrap().notes_awarded, 0);
    }

    #[test]
    fn test_delete_item_cascades_logs() {
        let (mut app, _clock) = empty_app();
        let a = app.save_item(form("A", "warmup", &[])).unwrap();
        for _ in 0..2 {
            app.start_burst_on_item(&a.id).unwrap();
            app.complete_burst().unwrap();
        }
        assert_eq!(app.item_detail(&a.id).unwrap().logs.len(), 2);
        app.delete_item(&a.id).unwrap();
        assert!(app.logs(&LogFilter::all()).unwrap().is_empty());
        assert!(matches!(app.delete_item(&a.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (mut app, _clock) = empty_app();
        let a = app.save_item(form("A", "riff", &[("notes", "e0 e3")])).unwrap();
        app.start_burst_on_item(&a.id).unwrap();
        app.complete_burst().unwrap();

        let doc = app.export().unwrap();
        let parsed = ExportDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed.items, app.items().unwrap());
        assert_eq!(parsed.logs, app.logs(&LogFilter::all()).unwrap());

        let (mut other, _clock) = empty_app();
        let summary = other.import(parsed.clone()).unwrap();
        assert_eq!((summary.items_upserted, summary.logs_added, summary.logs_skipped), (1, 1, 0));
        let again = other.import(parsed).unwrap();
        assert_eq!((again.logs_added, again.logs_skipped), (0, 1));
        assert_eq!(other.items().unwrap(), app.items().unwrap());
    }

    #[test]
    fn test_import_rejects_items_save_would_reject() {
        let (mut app, _clock) = empty_app();
        let good = PracticeItem::new("Good", ItemValues::defaults(Kind::Warmup));

        let untitled = PracticeItem::new("  ", ItemValues::defaults(Kind::Warmup));
        let doc = ExportDocument::new(vec![good.clone(), untitled], Vec::new(), app.now());
        assert!(matches!(app.import(doc), Err(Error::Validation(_))));

        let script = PracticeItem::new(
            "Sneaky",
            ItemValues::Resource(ResourceValues {
                link: "javascript:alert(1)".to_string(),
                description: String::new(),
            }),
        );
        let doc = ExportDocument::new(vec![good, script], Vec::new(), app.now());
        let err = app.import(doc).unwrap_err();
        assert!(err.to_string().contains("not a valid link"));

        // Nothing from a rejected document is kept
        assert!(app.items().unwrap().is_empty());
    }

    #[test]
    fn test_switch_view() {
        let (mut app, _clock) = empty_app();
        assert_eq!(app.view(), View::Home);
        app.switch_view(View::Bassbuzz);
        assert_eq!(app.view(), View::Bassbuzz);
        assert_eq!(View::Week.path(), "/week");
    }
}
