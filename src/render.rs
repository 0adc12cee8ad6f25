//! HTML views for the web UI
//!
//! Pure functions from view models to HTML strings. Every piece of user text
//! goes through [`escape_html`].

use crate::app::{DayLogEntry, DaySummary, HomeView, ItemDetail, ItemForm, View, ALL_VIEWS};
use crate::kinds::{all_definitions, FieldDef, FieldType, Kind};
use crate::model::{is_link, DetailValue, ItemValues, PracticeItem, ALL_WORKOUTS};
use chrono::NaiveDate;

const STYLE: &str = r#"
:root {
    --bg: #f5f5f7;
    --card: #ffffff;
    --border: #d2d2d7;
    --text: #1d1d1f;
    --text-light: #86868b;
    --accent: #007aff;
    --ok: #34c759;
    --shadow: 0 2px 8px rgba(0,0,0,0.08);
}
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Helvetica Neue', Helvetica, Arial, sans-serif;
    background: var(--bg);
    color: var(--text);
    line-height: 1.5;
}
.container { max-width: 720px; margin: 0 auto; padding: 1.5rem 1rem; }
header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 1rem; }
.logo { font-size: 1.5rem; font-weight: 700; }
.notes-count { font-weight: 600; color: var(--accent); }
nav { display: flex; gap: 0.5rem; margin-bottom: 1.5rem; }
nav a { padding: 0.4rem 0.9rem; border-radius: 999px; text-decoration: none; color: var(--text); background: var(--card); box-shadow: var(--shadow); }
nav a.active { background: var(--accent); color: #fff; }
h2 { font-size: 1.1rem; margin: 1.25rem 0 0.5rem; }
.card { background: var(--card); border-radius: 12px; padding: 0.75rem 1rem; margin-bottom: 0.5rem; box-shadow: var(--shadow); display: flex; justify-content: space-between; align-items: center; gap: 1rem; }
.card a { color: inherit; text-decoration: none; }
.card-title { font-weight: 600; }
.card-kind, .muted { color: var(--text-light); font-size: 0.85em; }
.card-preview { font-family: ui-monospace, monospace; font-size: 0.85em; }
.empty { color: var(--text-light); padding: 20px; text-align: center; }
.week-grid { display: grid; grid-template-columns: repeat(7, 1fr); gap: 0.5rem; }
.day-card { background: var(--card); border-radius: 12px; padding: 0.75rem 0.25rem; text-align: center; box-shadow: var(--shadow); text-decoration: none; color: inherit; }
.day-notes { font-weight: 600; color: var(--accent); }
.field { margin-bottom: 0.75rem; }
.field label { display: block; font-weight: 600; margin-bottom: 0.25rem; }
.field input[type=text], .field input[type=number], .field input[type=url], .field textarea, .field select { width: 100%; padding: 0.5rem; border: 1px solid var(--border); border-radius: 8px; font: inherit; }
.field textarea { font-family: ui-monospace, monospace; min-height: 6rem; }
.notes { font-family: ui-monospace, monospace; white-space: pre-wrap; }
.btn { padding: 0.4rem 0.9rem; border: none; border-radius: 8px; background: var(--accent); color: #fff; font: inherit; cursor: pointer; text-decoration: none; display: inline-block; }
.btn-secondary { background: var(--border); color: var(--text); }
.completed .card-title { text-decoration: line-through; color: var(--ok); }
.notice { background: #fff3cd; border-radius: 12px; padding: 1rem; margin-bottom: 1rem; }
.actions { display: flex; gap: 0.5rem; align-items: center; flex-wrap: wrap; }
code { background: var(--bg); padding: 0.1rem 0.3rem; border-radius: 4px; }
"#;

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode one URL path segment, e.g. an item id inside `/items/{id}`
pub fn path_segment(raw: &str) -> String {
    serde_urlencoded::to_string([("", raw)])
        .map(|pair| pair.trim_start_matches('=').to_string())
        .unwrap_or_default()
}

/// Full page: header with the notes counter, nav tabs, then `body`
pub fn layout(title: &str, active: Option<View>, total_notes: u32, body: &str) -> String {
    let tabs: String = ALL_VIEWS
        .iter()
        .map(|v| {
            let class = if Some(*v) == active { " class=\"active\"" } else { "" };
            format!("<a href=\"{}\"{}>{}</a>", v.path(), class, v.label())
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · Practice Companion</title>
    <style>{style}</style>
</head>
<body>
<div class="container">
    <header>
        <div class="logo">Practice Companion</div>
        <div class="notes-count">{notes} ♪</div>
    </header>
    <nav>{tabs}</nav>
    <main>
{body}
    </main>
</div>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        notes = total_notes,
        tabs = tabs,
        body = body,
    )
}

fn empty(message: &str) -> String {
    format!("<p class=\"empty\">{}</p>", escape_html(message))
}

fn burst_hint(item: &PracticeItem) -> String {
    if item.allow_burst {
        format!(
            "<span class=\"muted\">burst: <code>practice burst {}</code></span>",
            escape_html(&item.id)
        )
    } else {
        String::new()
    }
}

fn item_card(item: &PracticeItem) -> String {
    let preview = item
        .preview()
        .map(|p| format!("<div class=\"card-preview\">{}</div>", escape_html(&p)))
        .unwrap_or_default();
    format!(
        r#"<div class="card">
    <a href="/items/{id}">
        <div class="card-title">{title}</div>
        <div class="card-kind">{kind}</div>
        {preview}
    </a>
    {burst}
</div>
"#,
        id = escape_html(&path_segment(&item.id)),
        title = escape_html(&item.title),
        kind = item.kind_label(),
        preview = preview,
        burst = burst_hint(item),
    )
}

fn item_list(items: &[PracticeItem], empty_message: &str) -> String {
    if items.is_empty() {
        return empty(empty_message);
    }
    items.iter().map(item_card).collect()
}

pub fn home(view: &HomeView) -> String {
    let last = match &view.last_item {
        Some(item) => item_card(item),
        None => empty("No recent item"),
    };
    format!(
        "<h2>Last item</h2>\n{}\n<h2>Pinned</h2>\n{}\n<h2>Recent</h2>\n{}",
        last,
        item_list(&view.pinned, "No items"),
        item_list(&view.recent, "No items"),
    )
}

pub fn week(days: &[DaySummary]) -> String {
    let cells: String = days
        .iter()
        .map(|day| {
            let notes = if day.notes > 0 {
                format!("{} ♪", day.notes)
            } else {
                "-".to_string()
            };
            format!(
                r#"<a class="day-card" href="/week/{date}">
    <div class="muted">{weekday}</div>
    <div>{day}</div>
    <div class="day-notes">{notes}</div>
</a>
"#,
                date = day.date.format("%Y-%m-%d"),
                weekday = day.weekday(),
                day = day.date.format("%-d"),
                notes = notes,
            )
        })
        .collect();
    format!("<h2>Last 7 days</h2>\n<div class=\"week-grid\">\n{}</div>", cells)
}

pub fn day_detail(date: NaiveDate, entries: &[DayLogEntry]) -> String {
    let title = date.format("%A %-d/%-m").to_string();
    let body = if entries.is_empty() {
        empty("No practice recorded")
    } else {
        entries
            .iter()
            .map(|e| {
                let bpm = e
                    .log
                    .values
                    .bpm
                    .map(|b| format!(" • {} BPM", b))
                    .unwrap_or_default();
                format!(
                    r#"<div class="card">
    <div>
        <div class="card-title">{title}</div>
        <div class="muted">{time} • {minutes} min • {mode}{bpm}</div>
    </div>
    <div class="day-notes">{notes} ♪</div>
</div>
"#,
                    title = escape_html(&e.item_title),
                    time = e.time,
                    minutes = e.log.minutes,
                    mode = escape_html(&e.log.mode),
                    bpm = bpm,
                    notes = e.log.notes_awarded,
                )
            })
            .collect()
    };
    format!(
        "<p><a href=\"/week\">&larr; Week</a></p>\n<h2>{}</h2>\n{}",
        escape_html(&title),
        body
    )
}

pub fn items(items: &[PracticeItem]) -> String {
    let list = if items.is_empty() {
        empty("No items yet. Create your first one!")
    } else {
        items
            .iter()
            .map(|item| {
                format!(
                    r#"<div class="card">
    <a href="/items/{id}">
        <div class="card-title">{title}</div>
        <div class="card-kind">{kind}</div>
    </a>
    <div class="actions">
        <a class="btn btn-secondary" href="/items/{id}/edit">Edit</a>
        <form method="post" action="/items/{id}/delete" onsubmit="return confirm('Delete this item and its logs?')">
            <button class="btn btn-secondary" type="submit">Delete</button>
        </form>
    </div>
</div>
"#,
                    id = escape_html(&path_segment(&item.id)),
                    title = escape_html(&item.title),
                    kind = item.kind_label(),
                )
            })
            .collect()
    };
    format!(
        "<div class=\"actions\"><a class=\"btn\" href=\"/items/new\">New item</a></div>\n<h2>Items</h2>\n{}",
        list
    )
}

pub fn item_detail(detail: &ItemDetail) -> String {
    let fields = if detail.fields.is_empty() {
        empty("No details")
    } else {
        detail
            .fields
            .iter()
            .map(|f| {
                let value = match &f.value {
                    DetailValue::Text(s) => escape_html(s),
                    DetailValue::Notes(s) => format!("<div class=\"notes\">{}</div>", escape_html(s)),
                    DetailValue::Link(url) => {
                        let url = escape_html(url);
                        format!("<a href=\"{url}\" target=\"_blank\">{url}</a>", url = url)
                    }
                };
                format!(
                    "<div class=\"field\"><label>{}</label>{}</div>\n",
                    f.label, value
                )
            })
            .collect()
    };
    let logs = if detail.logs.is_empty() {
        empty("Not practiced yet")
    } else {
        detail
            .logs
            .iter()
            .map(|l| {
                format!(
                    "<div class=\"card\"><div class=\"muted\">{} • {} min • {}</div><div class=\"day-notes\">{} ♪</div></div>\n",
                    l.date_time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                    l.minutes,
                    escape_html(&l.mode),
                    l.notes_awarded
                )
            })
            .collect()
    };
    format!(
        r#"<h2>{title}</h2>
<p class="card-kind">{kind}</p>
{fields}
<div class="actions">{burst}<a class="btn btn-secondary" href="/items/{id}/edit">Edit</a></div>
<h2>History</h2>
{logs}"#,
        title = escape_html(&detail.item.title),
        kind = detail.kind_label,
        fields = fields,
        burst = burst_hint(&detail.item),
        id = escape_html(&path_segment(&detail.item.id)),
        logs = logs,
    )
}

fn field_input(field: &FieldDef, value: &str) -> String {
    let name = format!("field.{}", field.name);
    let required = if field.required { " required" } else { "" };
    match field.field_type {
        FieldType::Number => {
            let min = field.min.map(|m| format!(" min=\"{}\"", m)).unwrap_or_default();
            let max = field.max.map(|m| format!(" max=\"{}\"", m)).unwrap_or_default();
            format!(
                "<input type=\"number\" id=\"{name}\" name=\"{name}\" value=\"{value}\"{required}{min}{max} />",
                name = name,
                value = escape_html(value),
                required = required,
                min = min,
                max = max,
            )
        }
        FieldType::Url => format!(
            "<input type=\"url\" id=\"{name}\" name=\"{name}\" value=\"{value}\"{required} />",
            name = name,
            value = escape_html(value),
            required = required,
        ),
        // Tabs get a monospaced text area
        FieldType::Text if field.name == "notes" => format!(
            "<textarea id=\"{name}\" name=\"{name}\"{required}>{value}</textarea>",
            name = name,
            value = escape_html(value),
            required = required,
        ),
        FieldType::Text => format!(
            "<input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{value}\"{required} />",
            name = name,
            value = escape_html(value),
            required = required,
        ),
    }
}

fn checkbox(name: &str, label: &str, checked: bool) -> String {
    format!(
        "<div class=\"field\"><label><input type=\"checkbox\" name=\"{name}\" value=\"true\"{checked} /> {label}</label></div>\n",
        name = name,
        label = label,
        checked = if checked { " checked" } else { "" },
    )
}

/// Kind picker shown before the form of a new item
pub fn kind_picker() -> String {
    let links: String = all_definitions()
        .iter()
        .map(|d| {
            format!(
                "<a class=\"btn btn-secondary\" href=\"/items/new?kind={}\">{}</a>\n",
                d.kind, d.label
            )
        })
        .collect();
    format!("<h2>New item</h2>\n<p class=\"muted\">Pick a kind</p>\n<div class=\"actions\">{}</div>", links)
}

/// Create or edit form; fields are generated from the kind schema
pub fn item_form(form: &ItemForm, kind: Kind, error: Option<&str>) -> String {
    let definition = kind.definition();
    let heading = if form.id.is_some() { "Edit item" } else { "New item" };
    let id_input = form
        .id
        .as_ref()
        .map(|id| format!("    <input type=\"hidden\" name=\"id\" value=\"{}\" />\n", escape_html(id)))
        .unwrap_or_default();
    let notice = error
        .map(|e| format!("<div class=\"notice\">{}</div>\n", escape_html(e)))
        .unwrap_or_default();

    // Schema defaults fill empty fields of a new item
    let defaults = ItemValues::defaults(kind);
    let fields: String = definition
        .fields
        .iter()
        .map(|field| {
            let value = form
                .fields
                .get(field.name)
                .cloned()
                .or_else(|| form.id.is_none().then(|| defaults.form_value(field.name)).flatten())
                .unwrap_or_default();
            format!(
                "<div class=\"field\"><label for=\"field.{name}\">{label}{star}</label>{input}</div>\n",
                name = field.name,
                label = field.label,
                star = if field.required { " *" } else { "" },
                input = field_input(field, &value),
            )
        })
        .collect();

    let completed = if kind == Kind::Bassbuzz {
        checkbox("completed", "Completed", form.completed)
    } else {
        String::new()
    };

    format!(
        r#"<h2>{heading}: {label}</h2>
{notice}<form method="post" action="/items">
{id_input}    <input type="hidden" name="kind" value="{kind}" />
    <div class="field"><label for="title">Title *</label><input type="text" id="title" name="title" value="{title}" required /></div>
{fields}{pinned}{allow_burst}{completed}    <div class="actions">
        <button class="btn" type="submit">Save</button>
        <a class="btn btn-secondary" href="/items">Cancel</a>
    </div>
</form>"#,
        heading = heading,
        label = definition.label,
        notice = notice,
        id_input = id_input,
        kind = kind,
        title = escape_html(&form.title),
        fields = fields,
        pinned = checkbox("pinned", "Pinned", form.pinned),
        allow_burst = checkbox("allowBurst", "Allow burst", form.allow_burst),
        completed = completed,
    )
}

pub fn bassbuzz(lessons: &[PracticeItem]) -> String {
    if lessons.is_empty() {
        return empty("No BassBuzz lessons. Add them from the Items tab!");
    }

    let options: String = ALL_WORKOUTS
        .iter()
        .map(|w| format!("<option value=\"{}\">{}</option>", w.as_str(), w.label()))
        .collect();

    lessons
        .iter()
        .map(|item| {
            let (module, lesson, link) = match &item.values {
                ItemValues::Bassbuzz(v) => (
                    v.module.map(|m| m.to_string()).unwrap_or_else(|| "?".to_string()),
                    v.lesson.map(|l| l.to_string()).unwrap_or_else(|| "?".to_string()),
                    v.link.clone(),
                ),
                _ => ("?".to_string(), "?".to_string(), String::new()),
            };
            let link = if !is_link(&link) {
                String::new()
            } else {
                format!(
                    "<a href=\"{}\" target=\"_blank\">Open lesson</a>",
                    escape_html(&link)
                )
            };
            let id = escape_html(&path_segment(&item.id));
            format!(
                r#"<div class="card{completed_class}">
    <div>
        <div class="card-title">M{module} L{lesson}</div>
        <div class="muted">{title} {link}</div>
    </div>
    <div class="actions">
        <form method="post" action="/bassbuzz/{id}/log" class="actions">
            <select name="workout">{options}</select>
            <button class="btn" type="submit">Log</button>
        </form>
        <form method="post" action="/bassbuzz/{id}/toggle">
            <button class="btn btn-secondary" type="submit">{toggle}</button>
        </form>
    </div>
</div>
"#,
                completed_class = if item.completed { " completed" } else { "" },
                module = module,
                lesson = lesson,
                title = escape_html(&item.title),
                link = link,
                id = id,
                options = options,
                toggle = if item.completed { "Completed ✓" } else { "Mark completed" },
            )
        })
        .collect()
}

/// Body of an error page
pub fn notice(message: &str) -> String {
    format!(
        "<div class=\"notice\">{}</div>\n<p><a href=\"/\">&larr; Home</a></p>",
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BassbuzzValues, PracticeLog, MODE_BURST};
    use chrono::{TimeZone, Utc};

    fn riff(title: &str) -> PracticeItem {
        PracticeItem::new(title, ItemValues::defaults(Kind::Riff)).with_allow_burst(true)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_path_segment_encodes_reserved_characters() {
        assert_eq!(path_segment("note-trainer-fixed-id"), "note-trainer-fixed-id");
        assert_eq!(path_segment("riffs/slow one?"), "riffs%2Fslow+one%3F");
        assert_eq!(path_segment("a&b=c"), "a%26b%3Dc");
    }

    #[test]
    fn test_items_link_with_encoded_id() {
        let mut item = riff("Odd");
        item.id = "riffs/slow one?".to_string();
        let html = items(&[item]);
        assert!(html.contains("href=\"/items/riffs%2Fslow+one%3F\""));
        assert!(html.contains("action=\"/items/riffs%2Fslow+one%3F/delete\""));
    }

    #[test]
    fn test_layout_marks_active_tab() {
        let page = layout("Week", Some(View::Week), 12, "<p>x</p>");
        assert!(page.contains("<a href=\"/week\" class=\"active\">Week</a>"));
        assert!(page.contains("12 ♪"));
        assert!(page.contains("<p>x</p>"));
    }

    #[test]
    fn test_home_escapes_titles_and_shows_empty_states() {
        let view = HomeView {
            last_item: None,
            pinned: vec![riff("<script>alert(1)</script>")],
            recent: vec![],
            total_notes: 0,
        };
        let html = home(&view);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("No recent item"));
        assert!(html.contains("Target: 100 BPM"));
    }

    #[test]
    fn test_week_grid() {
        let days = vec![DaySummary {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            notes: 3,
            log_count: 2,
        }];
        let html = week(&days);
        assert!(html.contains("href=\"/week/2024-03-05\""));
        assert!(html.contains("3 ♪"));
        assert!(html.contains("Tue"));
    }

    #[test]
    fn test_day_detail_entries() {
        let item = riff("Riff");
        let mut log = PracticeLog::new(&item, Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(), MODE_BURST, 5);
        log.values.bpm = Some(104);
        let entries = vec![DayLogEntry {
            log,
            item_title: "Unknown".to_string(),
            time: "10:00".to_string(),
        }];
        let html = day_detail(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), &entries);
        assert!(html.contains("Tuesday 5/3"));
        assert!(html.contains("10:00 • 5 min • burst • 104 BPM"));

        let html = day_detail(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), &[]);
        assert!(html.contains("No practice recorded"));
    }

    #[test]
    fn test_item_form_from_schema() {
        let form = ItemForm::default();
        let html = item_form(&form, Kind::Riff, None);
        assert!(html.contains("name=\"field.targetBpm\" value=\"100\" min=\"40\" max=\"300\""));
        assert!(html.contains("<textarea id=\"field.notes\""));
        assert!(html.contains("action=\"/items\""));
        assert!(!html.contains("name=\"completed\""));

        let html = item_form(&form, Kind::Bassbuzz, Some("Module is required"));
        assert!(html.contains("name=\"completed\""));
        assert!(html.contains("Module is required"));
        assert!(html.contains("type=\"url\""));
    }

    #[test]
    fn test_bassbuzz_lessons() {
        let mut lesson = PracticeItem::new(
            "BassBuzz M1 L2",
            ItemValues::Bassbuzz(BassbuzzValues {
                module: Some(1),
                lesson: Some(2),
                link: "https://bassbuzz.com".to_string(),
            }),
        );
        lesson.completed = true;
        let html = bassbuzz(&[lesson]);
        assert!(html.contains("M1 L2"));
        assert!(html.contains("card completed"));
        assert!(html.contains("<option value=\"slow\">Slow workout</option>"));
        assert!(bassbuzz(&[]).contains("No BassBuzz lessons"));
    }
}
