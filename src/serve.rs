//! HTTP server for the practice web UI
//!
//! `practice serve` → single-threaded loop owning one controller. HTML pages
//! for the four views plus a small JSON API under `/api`.

use crate::app::{ItemForm, PracticeApp, View};
use crate::burst::Clock;
use crate::error::{Error, Result};
use crate::kinds::Kind;
use crate::model::{LogFilter, Workout};
use crate::render;
use crate::store::PracticeStore;
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use std::io::{Cursor, Read};
use tiny_http::{Header, Method, Response, Server};

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(error: &Error) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// What a request resolves to, before it becomes an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Html { status: u16, body: String },
    Json { status: u16, body: String },
    /// 303 See Other
    Redirect(String),
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Reply::Html { status, .. } | Reply::Json { status, .. } => *status,
            Reply::Redirect(_) => 303,
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        match self {
            Reply::Html { status, body } => with_header(
                Response::from_string(body).with_status_code(status),
                "Content-Type",
                "text/html; charset=utf-8",
            ),
            Reply::Json { status, body } => with_header(
                Response::from_string(body).with_status_code(status),
                "Content-Type",
                "application/json",
            ),
            Reply::Redirect(location) => {
                with_header(Response::from_string("").with_status_code(303), "Location", &location)
            }
        }
    }
}

fn with_header<R: Read>(response: Response<R>, name: &str, value: &str) -> Response<R> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn status_for(error: &Error) -> u16 {
    match error {
        Error::NotFound(_) => 404,
        Error::Validation(_) => 400,
        _ => 500,
    }
}

/// Start the web UI
pub fn start_server<S: PracticeStore, C: Clock>(app: &mut PracticeApp<S, C>, port: u16) -> Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    eprintln!("\n{}", "♪ Practice Companion".green().bold());
    eprintln!("   Web UI: http://localhost:{}", port);
    eprintln!("   Press Ctrl+C to stop\n");

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            log::warn!("Failed to read request body: {}", e);
        }

        let method = request.method().clone();
        let url = request.url().to_string();
        let reply = handle(app, &method, &url, &body);
        log::info!("{} {} -> {}", method, url, reply.status());

        if let Err(e) = request.respond(reply.into_response()) {
            log::warn!("Failed to send response: {}", e);
        }
    }

    Ok(())
}

/// Route one request
pub fn handle<S: PracticeStore, C: Clock>(app: &mut PracticeApp<S, C>, method: &Method, url: &str, body: &str) -> Reply {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };
    let decoded: Vec<String> = path.trim_matches('/').split('/').map(decode_segment).collect();
    let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();

    if segments.first() == Some(&"api") {
        return match api(app, method, &segments[1..], query) {
            Ok(reply) => reply,
            Err(e) => json(status_for(&e), &ApiResponse::failure(&e)),
        };
    }

    match page(app, method, &segments, query, body) {
        Ok(reply) => reply,
        Err(e) => {
            if !e.is_user_error() {
                log::error!("{} {}: {}", method, url, e);
            }
            let total = app.total_notes().unwrap_or(0);
            Reply::Html {
                status: status_for(&e),
                body: render::layout("Error", None, total, &render::notice(&e.to_string())),
            }
        }
    }
}

/// Inverse of [`render::path_segment`]
fn decode_segment(raw: &str) -> String {
    serde_urlencoded::from_str::<Vec<(String, String)>>(&format!("s={}", raw.replace('&', "%26")))
        .ok()
        .and_then(|pairs| pairs.into_iter().next())
        .map(|(_, value)| value)
        .unwrap_or_else(|| raw.to_string())
}

fn json<T: Serialize>(status: u16, value: &T) -> Reply {
    match serde_json::to_string(value) {
        Ok(body) => Reply::Json { status, body },
        Err(e) => Reply::Json {
            status: 500,
            body: format!("{{\"ok\":false,\"data\":null,\"error\":{:?}}}", e.to_string()),
        },
    }
}

fn html<S: PracticeStore, C: Clock>(app: &PracticeApp<S, C>, status: u16, title: &str, body: &str) -> Result<Reply> {
    Ok(Reply::Html {
        status,
        body: render::layout(title, Some(app.view()), app.total_notes()?, body),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

fn parse_pairs(raw: &str) -> Result<Vec<(String, String)>> {
    serde_urlencoded::from_str(raw).map_err(|e| Error::Validation(format!("Invalid form data: {}", e)))
}

/// Item form fields arrive as `title`, `kind`, `field.<name>` and checkboxes
fn parse_item_form(body: &str) -> Result<ItemForm> {
    let mut form = ItemForm::default();
    for (key, value) in parse_pairs(body)? {
        match key.as_str() {
            "id" => form.id = Some(value).filter(|v| !v.is_empty()),
            "title" => form.title = value,
            "kind" => form.kind = value,
            "pinned" => form.pinned = true,
            "allowBurst" => form.allow_burst = true,
            "completed" => form.completed = true,
            other => {
                if let Some(name) = other.strip_prefix("field.") {
                    form.fields.insert(name.to_string(), value);
                }
            }
        }
    }
    Ok(form)
}

fn page<S: PracticeStore, C: Clock>(
    app: &mut PracticeApp<S, C>,
    method: &Method,
    segments: &[&str],
    query: &str,
    body: &str,
) -> Result<Reply> {
    match (method, segments) {
        (Method::Get, [""]) => {
            app.switch_view(View::Home);
            let home = app.home()?;
            html(app, 200, "Home", &render::home(&home))
        }
        (Method::Get, ["week"]) => {
            app.switch_view(View::Week);
            let days = app.week()?;
            html(app, 200, "Week", &render::week(&days))
        }
        (Method::Get, ["week", date]) => {
            app.switch_view(View::Week);
            let date = parse_date(date)?;
            let entries = app.day_detail(date)?;
            html(app, 200, "Day", &render::day_detail(date, &entries))
        }
        (Method::Get, ["items"]) => {
            app.switch_view(View::Items);
            let items = app.items()?;
            html(app, 200, "Items", &render::items(&items))
        }
        (Method::Get, ["items", "new"]) => {
            app.switch_view(View::Items);
            let kind = parse_pairs(query)?
                .into_iter()
                .find(|(k, _)| k == "kind")
                .map(|(_, v)| v);
            match kind {
                Some(kind) => {
                    let kind: Kind = kind.parse().map_err(Error::Validation)?;
                    html(app, 200, "New item", &render::item_form(&ItemForm::default(), kind, None))
                }
                None => html(app, 200, "New item", &render::kind_picker()),
            }
        }
        (Method::Get, ["items", id]) => {
            let detail = app.item_detail(id)?;
            html(app, 200, &detail.item.title, &render::item_detail(&detail))
        }
        (Method::Get, ["items", id, "edit"]) => {
            app.switch_view(View::Items);
            let form = app.item_form(Some(*id))?;
            let kind: Kind = form.kind.parse().map_err(Error::Validation)?;
            html(app, 200, "Edit item", &render::item_form(&form, kind, None))
        }
        (Method::Get, ["bassbuzz"]) => {
            app.switch_view(View::Bassbuzz);
            let lessons = app.bassbuzz_lessons()?;
            html(app, 200, "BassBuzz", &render::bassbuzz(&lessons))
        }
        (Method::Post, ["items"]) => {
            let form = parse_item_form(body)?;
            match app.save_item(form.clone()) {
                Ok(item) => Ok(Reply::Redirect(format!("/items/{}", render::path_segment(&item.id)))),
                // Show the form again with what was typed
                Err(Error::Validation(message)) => match form.kind.parse::<Kind>() {
                    Ok(kind) => html(app, 400, "Item", &render::item_form(&form, kind, Some(&message))),
                    Err(_) => Err(Error::Validation(message)),
                },
                Err(e) => Err(e),
            }
        }
        (Method::Post, ["items", id, "delete"]) => {
            app.delete_item(id)?;
            Ok(Reply::Redirect("/items".to_string()))
        }
        (Method::Post, ["bassbuzz", id, "toggle"]) => {
            app.toggle_lesson_completed(id)?;
            Ok(Reply::Redirect("/bassbuzz".to_string()))
        }
        (Method::Post, ["bassbuzz", id, "log"]) => {
            let workout = parse_pairs(body)?
                .into_iter()
                .find(|(k, _)| k == "workout")
                .map(|(_, v)| v)
                .unwrap_or_else(|| Workout::Lesson.as_str().to_string());
            let workout: Workout = workout.parse().map_err(Error::Validation)?;
            app.log_bassbuzz_workout(id, workout)?;
            Ok(Reply::Redirect("/bassbuzz".to_string()))
        }
        _ => Err(Error::NotFound("Page not found".to_string())),
    }
}

fn api<S: PracticeStore, C: Clock>(
    app: &mut PracticeApp<S, C>,
    method: &Method,
    segments: &[&str],
    query: &str,
) -> Result<Reply> {
    match (method, segments) {
        (Method::Get, ["items"]) => Ok(json(200, &ApiResponse::success(app.items()?))),
        (Method::Get, ["logs"]) => {
            let filter: LogFilter = serde_urlencoded::from_str(query)
                .map_err(|e| Error::Validation(format!("Invalid log filter: {}", e)))?;
            Ok(json(200, &ApiResponse::success(app.logs(&filter)?)))
        }
        (Method::Get, ["notes"]) => Ok(json(200, &ApiResponse::success(app.total_notes()?))),
        (Method::Get, ["export"]) => Ok(json(200, &ApiResponse::success(app.export()?))),
        _ => Err(Error::NotFound("Unknown API endpoint".to_string())),
    }
}
