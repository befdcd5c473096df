//! Server-rendered HTML pages.
//!
//! Plain HTML with forms, no scripts: the pages must work from any phone
//! browser on the layout room Wi-Fi. Failed operations are shown on the
//! re-rendered page rather than as an error status.

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::Form;
use axum::Json;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::response::Html;
use serde::Serialize;

use crate::adapters::log_file;
use crate::app::commands::{Direction, YardCommand};
use crate::app::events::DeviceView;
use crate::app::layout::DEFAULT_LAYOUT;
use crate::app::service::SwitchYard;
use crate::drivers::{DeviceKind, SwitchAction};
use crate::error::{PinError, YardError};
use crate::pins::{self, PinSet, PinoutRow, SlotStatus};

use super::{ApiError, AppState};

type Page = Result<Html<String>, ApiError>;

/// Outcome line shown above the page body.
#[derive(Debug, Default)]
struct Notice {
    message: Option<String>,
    error: Option<String>,
}

impl Notice {
    fn error(e: impl ToString) -> Self {
        Self {
            message: None,
            error: Some(e.to_string()),
        }
    }

    fn message(m: impl Into<String>) -> Self {
        Self {
            message: Some(m.into()),
            error: None,
        }
    }

    fn from_result(result: Result<impl Into<String>, YardError>) -> Self {
        match result {
            Ok(m) => Self::message(m),
            Err(e) => Self::error(e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Handlers
// ───────────────────────────────────────────────────────────────

pub async fn index(State(state): State<AppState>) -> Page {
    let views = state.run(|yard| yard.snapshot()).await?;
    Ok(Html(render_index(&views, &Notice::default())))
}

/// Each form field is `pins=action`; fields are applied in order.
pub async fn index_submit(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Page {
    let (views, errors) = state
        .run(move |yard| {
            let mut errors = Vec::new();
            for (pins, action) in fields {
                let result = PinSet::parse(&pins)
                    .map_err(YardError::from)
                    .and_then(|pins| {
                        let action = SwitchAction::parse(&action)?;
                        yard.act(&pins, action)
                    });
                if let Err(e) = result {
                    errors.push(e.to_string());
                }
            }
            (yard.snapshot(), errors)
        })
        .await?;

    let notice = if errors.is_empty() {
        Notice::default()
    } else {
        Notice::error(errors.join("; "))
    };
    Ok(Html(render_index(&views, &notice)))
}

pub async fn log(State(state): State<AppState>) -> Page {
    let path = state.log_path().clone();
    let text = tokio::task::spawn_blocking(move || log_file::read_tail(&path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .unwrap_or_else(|e| format!("log unavailable: {e}"));
    let body = format!("<pre class=\"log\">\n {}</pre>", escape(text.trim()));
    Ok(Html(layout("Log", &body)))
}

#[derive(Debug, Serialize)]
pub struct IpInfo {
    pub client_ip: Option<String>,
    pub host_ip: String,
    pub host_port: u16,
}

fn ip_info(state: &AppState, headers: &HeaderMap, peer: Option<ConnectInfo<SocketAddr>>) -> IpInfo {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let (host_ip, port) = split_host(host);
    IpInfo {
        client_ip: peer.map(|ConnectInfo(addr)| addr.ip().to_string()),
        host_ip: host_ip.to_string(),
        host_port: port.unwrap_or(state.port()),
    }
}

/// Split a `Host` header into address and port. Bracketed IPv6 literals
/// (`[::1]`, `[::1]:5000`) keep their colons.
fn split_host(host: &str) -> (&str, Option<u16>) {
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((ip, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (ip, port);
        }
    }
    match host.rsplit_once(':') {
        Some((ip, port)) if !ip.contains(':') => match port.parse() {
            Ok(port) => (ip, Some(port)),
            Err(_) => (host, None),
        },
        _ => (host, None),
    }
}

pub async fn ip(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Html<String> {
    let info = ip_info(&state, &headers, peer);
    let body = format!(
        "<table>\
         <tr><th>Host IP</th><td>{}</td></tr>\
         <tr><th>Host port</th><td>{}</td></tr>\
         <tr><th>Client IP</th><td>{}</td></tr>\
         </table>",
        escape(&info.host_ip),
        info.host_port,
        escape(info.client_ip.as_deref().unwrap_or("unknown")),
    );
    Html(layout("Connection", &body))
}

pub async fn ip_json(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Json<IpInfo> {
    Json(ip_info(&state, &headers, peer))
}

pub async fn pinout(State(state): State<AppState>) -> Page {
    let pool = state.run(|yard| yard.pool()).await?;
    Ok(Html(render_pinout(&pins::pinout(&pool))))
}

pub async fn config(State(state): State<AppState>) -> Page {
    config_page(&state, |_| Notice::default()).await
}

/// `type` names the device kind; every non-empty `pin*` field is a pin.
pub async fn config_add(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Page {
    let kind = fields
        .iter()
        .find(|(k, _)| k == "type")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    let pin_fields: Vec<String> = fields
        .into_iter()
        .filter(|(k, v)| k.starts_with("pin") && !v.trim().is_empty())
        .map(|(_, v)| v)
        .collect();

    config_page(&state, move |yard| {
        let result = parse_add(&kind, &pin_fields, &yard.pool()).and_then(|(pins, kind)| {
            let key = pins.key();
            yard.add(pins, kind)?;
            Ok(format!("added {kind} on pins {key}"))
        });
        Notice::from_result(result)
    })
    .await
}

/// Availability is reported before duplicates, so a taken pin listed twice
/// reads "pin N is not available".
fn parse_add(
    kind: &str,
    pin_fields: &[String],
    pool: &[u8],
) -> Result<(PinSet, DeviceKind), YardError> {
    let kind = DeviceKind::parse(kind)?;
    let mut pins = Vec::with_capacity(pin_fields.len());
    for field in pin_fields {
        let pin = field
            .trim()
            .parse::<u8>()
            .map_err(|_| PinError::Malformed(field.clone()))?;
        if !pool.contains(&pin) {
            return Err(YardError::PinUnavailable(pin));
        }
        pins.push(pin);
    }
    Ok((PinSet::new(&pins)?, kind))
}

pub async fn config_delete(State(state): State<AppState>, Path(pins): Path<String>) -> Page {
    config_page(&state, move |yard| {
        let result = PinSet::parse(&pins)
            .map_err(YardError::from)
            .and_then(|pins| {
                let key = pins.key();
                yard.handle_command(YardCommand::Remove(pins))?;
                Ok(format!("removed device on pins {key}"))
            });
        Notice::from_result(result)
    })
    .await
}

pub async fn config_shuffle(
    State(state): State<AppState>,
    Path((pins, direction)): Path<(String, String)>,
) -> Page {
    config_page(&state, move |yard| {
        let Some(direction) = Direction::parse(&direction) else {
            return Notice::error(format!("unknown direction '{direction}'"));
        };
        let result = PinSet::parse(&pins)
            .map_err(YardError::from)
            .and_then(|pins| yard.handle_command(YardCommand::Nudge { pins, direction }));
        match result {
            Ok(()) => Notice::default(),
            Err(e) => Notice::error(e),
        }
    })
    .await
}

pub async fn save_default(State(state): State<AppState>) -> Page {
    config_page(&state, |yard| {
        Notice::from_result(
            yard.save_layout(DEFAULT_LAYOUT)
                .map(|n| format!("saved {n} device(s)")),
        )
    })
    .await
}

pub async fn load_default(State(state): State<AppState>) -> Page {
    config_page(&state, |yard| {
        Notice::from_result(
            yard.load_layout(DEFAULT_LAYOUT)
                .map(|n| format!("loaded {n} device(s)")),
        )
    })
    .await
}

/// Run `op`, then render the config page with its notice.
async fn config_page<F>(state: &AppState, op: F) -> Page
where
    F: FnOnce(&mut SwitchYard) -> Notice + Send + 'static,
{
    let html = state
        .run(move |yard| {
            let notice = op(yard);
            render_config(&yard.snapshot(), &yard.pool(), &notice)
        })
        .await?;
    Ok(Html(html))
}

// ───────────────────────────────────────────────────────────────
// Rendering
// ───────────────────────────────────────────────────────────────

const STYLE: &str = "body{font-family:sans-serif;margin:1em}\
table{border-collapse:collapse}td,th{border:1px solid #999;padding:.3em .6em}\
.error{color:#b00}.message{color:#060}.free{background:#cfc}.used{background:#fcc}\
.fixed{background:#eee}nav a{margin-right:1em}button{margin:.1em}";

/// Escape text for element content and quoted attributes.
pub fn escape(text: &str) -> String {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title} · Rail Yard</title><style>{STYLE}</style></head><body>\
         <nav><a href=\"/\">Switches</a><a href=\"/config/\">Configure</a>\
         <a href=\"/pinout/\">Pinout</a><a href=\"/log/\">Log</a><a href=\"/ip/\">Connection</a></nav>\
         <h1>{title}</h1>{body}</body></html>",
        title = escape(title),
    )
}

fn render_notice(notice: &Notice) -> String {
    let mut out = String::new();
    if let Some(m) = &notice.message {
        let _ = write!(out, "<p class=\"message\">{}</p>", escape(m));
    }
    if let Some(e) = &notice.error {
        let _ = write!(out, "<p class=\"error\">Error: {}</p>", escape(e));
    }
    out
}

fn state_text(view: &DeviceView) -> &'static str {
    view.state.map_or("unknown", SwitchAction::as_str)
}

fn render_index(views: &[DeviceView], notice: &Notice) -> String {
    let mut body = render_notice(notice);
    if views.is_empty() {
        body.push_str("<p>No switches configured. <a href=\"/config/\">Add one</a>.</p>");
    } else {
        body.push_str("<table><tr><th>#</th><th>Switch</th><th>Pins</th><th>State</th><th></th></tr>");
        for (i, v) in views.iter().enumerate() {
            let key = escape(&v.key);
            let _ = write!(
                body,
                "<tr><td>{n}</td><td>{name}</td><td>{key}</td><td>{state}</td><td>\
                 <form method=\"post\" action=\"/\">\
                 <button name=\"{key}\" value=\"Straight\">Straight</button>\
                 <button name=\"{key}\" value=\"Turn\">Turn</button>\
                 </form></td></tr>",
                n = i + 1,
                name = escape(v.name),
                state = state_text(v),
            );
        }
        body.push_str("</table>");
    }
    layout("Switches", &body)
}

fn render_config(views: &[DeviceView], pool: &[u8], notice: &Notice) -> String {
    let mut body = render_notice(notice);

    body.push_str("<h2>Devices</h2>");
    if views.is_empty() {
        body.push_str("<p>None.</p>");
    } else {
        body.push_str("<table><tr><th>#</th><th>Switch</th><th>Pins</th><th>State</th><th></th></tr>");
        for (i, v) in views.iter().enumerate() {
            let key = escape(&v.key);
            let _ = write!(
                body,
                "<tr><td>{n}</td><td>{name}</td><td>{key}</td><td>{state}</td><td>\
                 <form method=\"post\" action=\"/config/shuffle/{key}/up\"><button>Up</button></form>\
                 <form method=\"post\" action=\"/config/shuffle/{key}/down\"><button>Down</button></form>\
                 <form method=\"post\" action=\"/config/delete/{key}\"><button>Delete</button></form>\
                 </td></tr>",
                n = i + 1,
                name = escape(v.name),
                state = state_text(v),
            );
        }
        body.push_str("</table>");
    }

    let mut options = String::from("<option value=\"\">-</option>");
    for pin in pool {
        let _ = write!(options, "<option value=\"{pin}\">{pin}</option>");
    }
    let _ = write!(
        body,
        "<h2>Add a switch</h2>\
         <form method=\"post\" action=\"/config/load\">\
         <select name=\"type\"><option value=\"servo\">{servo} (1 pin)</option>\
         <option value=\"relay\">{relay} (2 pins)</option></select>\
         <select name=\"pin1\">{options}</select>\
         <select name=\"pin2\">{options}</select>\
         <button>Add</button></form>\
         <p>Free pins: {free}</p>\
         <p><a href=\"/save/\">Save layout</a> · <a href=\"/load/\">Load saved layout</a></p>",
        servo = DeviceKind::Servo.display_name(),
        relay = DeviceKind::Relay.display_name(),
        free = pool
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    );

    layout("Configure", &body)
}

fn render_pinout(rows: &[PinoutRow]) -> String {
    let class = |s: SlotStatus| match s {
        SlotStatus::Fixed => "fixed",
        SlotStatus::Free => "free",
        SlotStatus::Used => "used",
    };
    let mut body = String::from(
        "<table><tr><th>Function</th><th>Pin</th><th>Pin</th><th>Function</th></tr>",
    );
    for row in rows {
        let _ = write!(
            body,
            "<tr><td class=\"{lc}\">{lf}</td><td>{lb}</td><td>{rb}</td><td class=\"{rc}\">{rf}</td></tr>",
            lc = class(row.left.status),
            lf = escape(&row.left.function.to_string()),
            lb = row.left.board,
            rb = row.right.board,
            rc = class(row.right.status),
            rf = escape(&row.right.function.to_string()),
        );
    }
    body.push_str("</table><p><span class=\"free\">free</span> <span class=\"used\">in use</span></p>");
    layout("Pinout", &body)
}
