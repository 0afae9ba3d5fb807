//! Interactive harness for the push pipeline.
//!
//! Each stdin line is one of:
//! - a relay message: `{"type":"FCM_PUSH",...}` or `{"type":"FCM_NOTIFICATION_CLICK","url":...}`
//! - a foreground push: `{"title":...,"body":...,"data":{...}}`
//! - `view <id-prefix>` / `dismiss <id-prefix>` / `list`
//!
//! EOF signs out.

use std::sync::Arc;

use anyhow::{Context, Result};
use opsdesk_notifications::{
    ForegroundChannel, HttpPushBackend, NavigationIntent, NotificationEvent, RelayChannel,
    Session, SessionLifecycle, StaticTokenPlatform, ToastItem,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::ListenArgs;
use crate::config::AppConfig;
use crate::output::{print_navigation, print_success, print_toasts, print_warning};

pub async fn listen(cfg: &AppConfig, args: &ListenArgs) -> Result<()> {
    let backend = HttpPushBackend::new(&cfg.backend.url, cfg.backend.token.clone())
        .context("Failed to set up the backend client")?;
    let token = args
        .token
        .clone()
        .or_else(|| cfg.platform.registration_token.clone());
    let platform = StaticTokenPlatform::new(token);

    let foreground = ForegroundChannel::new();
    let relay = RelayChannel::new();
    let navigator = |intent: &NavigationIntent| print_navigation(intent);

    let lifecycle = SessionLifecycle::new(
        &cfg.push,
        Arc::new(platform),
        Arc::new(backend),
        foreground.clone(),
        relay.clone(),
        Arc::new(navigator),
    );

    if let Some(location) = &args.location {
        lifecycle.apply_cold_open(location);
    }

    let session = Session::new(args.account.clone(), args.roles.clone());
    if lifecycle.sign_in(session).await.is_none() {
        print_warning("Push notifications unavailable for this session (no permission or registration)");
        return Ok(());
    }
    print_success(&format!("Listening as {}", args.account));

    let mut live = lifecycle.toasts().watch();
    let render = tokio::spawn(async move {
        while live.changed().await.is_ok() {
            let items = live.borrow_and_update().clone();
            print_toasts(&items);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(e) = handle_line(line, &lifecycle, &foreground, &relay) {
            print_warning(&format!("{e:#}"));
        }
    }

    lifecycle.sign_out().finished().await;
    render.abort();
    print_success("Signed out");
    Ok(())
}

fn handle_line(
    line: &str,
    lifecycle: &SessionLifecycle,
    foreground: &ForegroundChannel,
    relay: &RelayChannel,
) -> Result<()> {
    if line.starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(line).context("Line is not valid JSON")?;
        if value.get("type").is_some() {
            relay.post_json(line)?;
        } else {
            let event: NotificationEvent =
                serde_json::from_value(value).context("Line is not a notification")?;
            foreground.deliver(event);
        }
        return Ok(());
    }

    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "list" => print_toasts(&lifecycle.toasts().items()),
        "view" => {
            let id = resolve_toast(&lifecycle.toasts().items(), arg)?;
            if lifecycle.view_toast(&id).is_none() {
                print_warning("This notification has nothing to view");
            }
        }
        "dismiss" => {
            let id = resolve_toast(&lifecycle.toasts().items(), arg)?;
            lifecycle.dismiss_toast(&id);
        }
        other => anyhow::bail!("Unknown command: {other}. Valid commands: list, view, dismiss"),
    }
    Ok(())
}

fn resolve_toast(items: &[ToastItem], prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    anyhow::ensure!(!prefix.is_empty(), "Expected a notification id");
    let mut matches = items.iter().filter(|t| t.id.starts_with(prefix));
    let first = matches
        .next()
        .with_context(|| format!("No visible notification matches {prefix}"))?;
    anyhow::ensure!(matches.next().is_none(), "Ambiguous notification id {prefix}");
    Ok(first.id.clone())
}
