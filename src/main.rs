use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use practice_companion::app::local_day_bounds;
use practice_companion::export::default_file_name;
use practice_companion::model::DetailValue;
use practice_companion::{
    data_dir, open_store, tui, Config, Error, ExportDocument, ItemForm, ItemValues, Kind, LogFilter, PracticeApp,
    PracticeItem, PracticeLog, PracticeStore, Result, Workout,
};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

type App = PracticeApp<Box<dyn PracticeStore>>;

#[derive(Parser, Debug)]
#[command(name = "practice")]
#[command(author, version, about = "Practice tracker for bass players", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the data directory and a default config.toml
    Init,

    /// List practice items
    Items {
        /// Only items of this kind (riff, bassbuzz, exercise, warmup, theory, resource, stamina)
        #[arg(short, long)]
        kind: Option<Kind>,
    },

    /// Add a practice item
    Add {
        /// Item title
        title: String,

        /// Item kind
        #[arg(short, long)]
        kind: Kind,

        /// Kind-specific field, e.g. -f targetBpm=120 (repeatable)
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Show the item on the home screen
        #[arg(long)]
        pinned: bool,

        /// Allow timed bursts on this item
        #[arg(short, long)]
        burst: bool,
    },

    /// Edit a practice item
    Edit {
        /// Item id or title
        item: String,

        #[arg(short, long)]
        title: Option<String>,

        /// Kind-specific field, e.g. -f targetBpm=120 (repeatable)
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        #[arg(long)]
        pinned: Option<bool>,

        /// Allow timed bursts on this item
        #[arg(long)]
        burst: Option<bool>,

        /// Lesson completed (BassBuzz only)
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Show an item with its fields and practice history
    Show {
        /// Item id or title
        item: String,
    },

    /// Delete an item and all of its logs
    Delete {
        /// Item id or title
        item: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Run a timed burst (defaults to the last practiced item)
    Burst {
        /// Item id or title
        item: Option<String>,
    },

    /// Log a BassBuzz workout
    Workout {
        /// Lesson id or title
        item: String,

        /// lesson, slow, middle or fast
        workout: Workout,
    },

    /// Flip a BassBuzz lesson between done and not done
    ToggleCompleted {
        /// Lesson id or title
        item: String,
    },

    /// List practice logs, most recent first
    Logs {
        /// First local day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last local day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long)]
        kind: Option<Kind>,

        /// Item id or title
        #[arg(short, long)]
        item: Option<String>,
    },

    /// Notes earned over the last seven days
    Week {
        /// Show the logs of one day instead (YYYY-MM-DD)
        #[arg(short, long)]
        day: Option<NaiveDate>,
    },

    /// BassBuzz lessons in course order
    Bassbuzz,

    /// Total notes earned
    Notes,

    /// Export items and logs to a JSON file
    Export {
        /// Output file, or - for stdout (default: practice-companion-export-DATE.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import items and logs from an export file
    Import {
        file: PathBuf,
    },

    /// Start the web UI
    Serve {
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_field(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("PRACTICE_LOG", "warn")).init();

    let cli = Cli::parse();

    if let Some(Command::Completion { shell }) = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "practice", &mut io::stdout());
        return;
    }

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn open_app() -> Result<App> {
    let config = Config::load();
    let store = open_store(&config, &data_dir())?;
    let mut app = PracticeApp::new(store, config);
    app.init()?;
    Ok(app)
}

fn run(command: Option<Command>) -> Result<()> {
    let command = match command {
        Some(Command::Init) => return init(),
        Some(command) => command,
        None => return show_home(&open_app()?),
    };

    let mut app = open_app()?;

    match command {
        Command::Items { kind } => {
            let items: Vec<PracticeItem> = app
                .items()?
                .into_iter()
                .filter(|i| kind.map(|k| i.kind() == k).unwrap_or(true))
                .collect();
            if items.is_empty() {
                println!("No items.");
            }
            for item in &items {
                print_item_line(item);
            }
        }

        Command::Add {
            title,
            kind,
            fields,
            pinned,
            burst,
        } => {
            let item = app.save_item(ItemForm {
                id: None,
                title,
                kind: kind.as_str().to_string(),
                fields: fields.into_iter().collect(),
                pinned,
                allow_burst: burst,
                completed: false,
            })?;
            println!("{} {} {}", "Added".green(), item.title.bold(), item.id);
        }

        Command::Edit {
            item,
            title,
            fields,
            pinned,
            burst,
            completed,
        } => {
            let existing = resolve_item(&app, &item)?;
            let mut form = app.item_form(Some(&existing.id))?;
            if let Some(title) = title {
                form.title = title;
            }
            form.fields.extend(fields);
            if let Some(pinned) = pinned {
                form.pinned = pinned;
            }
            if let Some(burst) = burst {
                form.allow_burst = burst;
            }
            if let Some(completed) = completed {
                form.completed = completed;
            }
            let saved = app.save_item(form)?;
            println!("{} {}", "Saved".green(), saved.title.bold());
        }

        Command::Show { item } => {
            let item = resolve_item(&app, &item)?;
            show_item(&app, &item.id)?;
        }

        Command::Delete { item, yes } => {
            let item = resolve_item(&app, &item)?;
            if !yes && !confirm(&format!("Delete '{}' and all of its logs?", item.title))? {
                println!("Cancelled.");
                return Ok(());
            }
            let deleted = app.delete_item(&item.id)?;
            println!("{} {}", "Deleted".red(), deleted.title);
        }

        Command::Burst { item } => {
            match item {
                Some(query) => {
                    let item = resolve_item(&app, &query)?;
                    app.start_burst_on_item(&item.id)?;
                }
                None => {
                    app.start_burst_on_last_item()?;
                }
            }
            match tui::run_burst(&mut app)? {
                Some(log) => println!(
                    "{} {} minute(s), +{} note(s)",
                    "Logged".green(),
                    log.minutes,
                    log.notes_awarded
                ),
                None => println!("Burst closed without logging."),
            }
        }

        Command::Workout { item, workout } => {
            let item = resolve_item(&app, &item)?;
            let log = app.log_bassbuzz_workout(&item.id, workout)?;
            println!(
                "{} {} for {}, +{} note(s)",
                "Logged".green(),
                workout.label(),
                item.title.bold(),
                log.notes_awarded
            );
        }

        Command::ToggleCompleted { item } => {
            let item = resolve_item(&app, &item)?;
            let toggled = app.toggle_lesson_completed(&item.id)?;
            let state = if toggled.completed { "done".green() } else { "not done".yellow() };
            println!("{} is now {}", toggled.title.bold(), state);
        }

        Command::Logs { from, to, kind, item } => {
            let item_id = match item {
                Some(query) => Some(resolve_item(&app, &query)?.id),
                None => None,
            };
            let filter = LogFilter {
                from: from.map(|d| local_day_bounds(d).map(|(start, _)| start)).transpose()?,
                to: to.map(|d| local_day_bounds(d).map(|(_, end)| end)).transpose()?,
                kind,
                item_id,
            };
            let titles = item_titles(&app)?;
            let logs = app.logs(&filter)?;
            if logs.is_empty() {
                println!("No logs.");
            }
            for log in &logs {
                print_log_line(log, titles.get(&log.item_id).map(String::as_str));
            }
        }

        Command::Week { day: Some(day) } => {
            let entries = app.day_detail(day)?;
            println!("{}", day.format("%A %Y-%m-%d").to_string().bold());
            if entries.is_empty() {
                println!("  Nothing logged.");
            }
            for entry in &entries {
                println!(
                    "  {}  {:<30} {:<18} {:>3} min  +{}",
                    entry.time.dimmed(),
                    entry.item_title,
                    entry.log.mode,
                    entry.log.minutes,
                    entry.log.notes_awarded
                );
            }
        }

        Command::Week { day: None } => {
            let today = app.today();
            for day in app.week()? {
                let line = format!(
                    "{} {}  {:>3} note(s)  {} log(s)",
                    day.weekday(),
                    day.date,
                    day.notes,
                    day.log_count
                );
                if day.date == today {
                    println!("{}", line.bold());
                } else {
                    println!("{}", line);
                }
            }
        }

        Command::Bassbuzz => {
            let lessons = app.bassbuzz_lessons()?;
            if lessons.is_empty() {
                println!("No BassBuzz lessons yet.");
            }
            for lesson in &lessons {
                let mark = if lesson.completed { "[x]".green() } else { "[ ]".normal() };
                let position = match &lesson.values {
                    ItemValues::Bassbuzz(v) => format!(
                        "M{} L{}",
                        v.module.map(|m| m.to_string()).unwrap_or_else(|| "?".to_string()),
                        v.lesson.map(|l| l.to_string()).unwrap_or_else(|| "?".to_string())
                    ),
                    _ => String::new(),
                };
                println!("{} {:<8} {}  {}", mark, position, lesson.title.bold(), lesson.id.dimmed());
            }
        }

        Command::Notes => {
            println!("{} note(s)", app.total_notes()?.to_string().bold());
        }

        Command::Export { output } => {
            let doc = app.export()?;
            let path = output.unwrap_or_else(|| PathBuf::from(default_file_name(app.today())));
            if path.as_os_str() == "-" {
                println!("{}", doc.to_json()?);
            } else {
                doc.save(&path)?;
                println!(
                    "{} {} item(s), {} log(s) to {}",
                    "Exported".green(),
                    doc.items.len(),
                    doc.logs.len(),
                    path.display()
                );
            }
        }

        Command::Import { file } => {
            let doc = ExportDocument::load(&file)?;
            let summary = app.import(doc)?;
            println!(
                "{} {} item(s), {} log(s) ({} already present)",
                "Imported".green(),
                summary.items_upserted,
                summary.logs_added,
                summary.logs_skipped
            );
        }

        Command::Serve { port } => {
            let port = port.unwrap_or(app.config().serve.port);
            practice_companion::serve::start_server(&mut app, port)?;
        }

        Command::Init | Command::Completion { .. } => {}
    }

    Ok(())
}

fn init() -> Result<()> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    let config_path = dir.join("config.toml");
    if config_path.exists() {
        println!("   {} {}", "Exists".yellow(), config_path.display());
    } else {
        std::fs::write(&config_path, Config::template())?;
        println!("   {} {}", "Created".green(), config_path.display());
    }

    let app = open_app()?;
    println!(
        "\n{} Practice data in {} ({} item(s))",
        "✓".green().bold(),
        dir.display(),
        app.items()?.len()
    );
    Ok(())
}

/// Find an item by id, or by a case-insensitive title when exactly one matches
fn resolve_item(app: &App, query: &str) -> Result<PracticeItem> {
    let items = app.items()?;
    if let Some(item) = items.iter().find(|i| i.id == query) {
        return Ok(item.clone());
    }

    let mut matches: Vec<PracticeItem> = items
        .into_iter()
        .filter(|i| i.title.eq_ignore_ascii_case(query.trim()))
        .collect();
    match matches.len() {
        0 => Err(Error::not_found("item", query)),
        1 => Ok(matches.remove(0)),
        n => Err(Error::Validation(format!(
            "{} items are titled '{}'; use the id instead",
            n, query
        ))),
    }
}

fn item_titles(app: &App) -> Result<HashMap<String, String>> {
    Ok(app.items()?.into_iter().map(|i| (i.id, i.title)).collect())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_item_line(item: &PracticeItem) {
    let mut flags = Vec::new();
    if item.pinned {
        flags.push("pinned");
    }
    if item.allow_burst {
        flags.push("burst");
    }
    if item.completed {
        flags.push("done");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    println!(
        "{} {:<10} {}{}",
        item.id.dimmed(),
        item.kind_label().cyan(),
        item.title.bold(),
        flags
    );
    if let Some(preview) = item.preview() {
        println!("     {}", preview.dimmed());
    }
}

fn print_log_line(log: &PracticeLog, title: Option<&str>) {
    let when = log.date_time.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let bpm = log.values.bpm.map(|b| format!(" @ {} BPM", b)).unwrap_or_default();
    println!(
        "{}  {:<30} {:<18} {:>3} min  +{}{}",
        when.to_string().dimmed(),
        title.unwrap_or("Unknown"),
        log.mode,
        log.minutes,
        log.notes_awarded,
        bpm
    );
}

fn show_item(app: &App, id: &str) -> Result<()> {
    let detail = app.item_detail(id)?;
    let item = &detail.item;

    println!("{} {}", item.title.bold(), format!("({})", detail.kind_label).cyan());
    println!("  {:<20} {}", "Id", item.id.dimmed());
    for field in &detail.fields {
        match &field.value {
            DetailValue::Text(text) | DetailValue::Link(text) => println!("  {:<20} {}", field.label, text),
            DetailValue::Notes(notes) => {
                println!("  {}", field.label);
                for line in notes.lines() {
                    println!("    {}", line);
                }
            }
        }
    }
    println!("  {:<20} {}", "Pinned", item.pinned);
    println!("  {:<20} {}", "Bursts", item.allow_burst);
    if item.kind() == Kind::Bassbuzz {
        println!("  {:<20} {}", "Completed", item.completed);
    }

    println!("\n{} ({})", "History".bold(), detail.logs.len());
    for log in &detail.logs {
        print_log_line(log, Some(&item.title));
    }
    Ok(())
}

fn show_home(app: &App) -> Result<()> {
    let home = app.home()?;

    println!("{} {} note(s)\n", "♪ Practice Companion".green().bold(), home.total_notes);

    match &home.last_item {
        Some(item) => {
            println!("{}", "Last practiced".bold());
            print_item_line(item);
            if item.allow_burst {
                println!("     {}", "practice burst".dimmed());
            }
        }
        None => println!("Nothing practiced yet. Start with `practice burst <ITEM>`."),
    }

    if !home.pinned.is_empty() {
        println!("\n{}", "Pinned".bold());
        for item in &home.pinned {
            print_item_line(item);
        }
    }

    if !home.recent.is_empty() {
        println!("\n{}", "Recent".bold());
        for item in &home.recent {
            print_item_line(item);
        }
    }
    Ok(())
}
