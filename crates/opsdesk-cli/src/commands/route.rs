use anyhow::{Context, Result};
use opsdesk_notifications::{NotificationEvent, decode_click_url, decode_cold_open, route};

use crate::cli::{DecodeUrlArgs, OutputFormat, RouteArgs};
use crate::output::{print_intent, print_warning};

pub fn route_payload(args: &RouteArgs, format: OutputFormat) -> Result<()> {
    let event = match &args.json {
        Some(raw) => serde_json::from_str::<NotificationEvent>(raw)
            .context("Failed to parse --json as a notification")?,
        None => parse_pairs(&args.pairs)?,
    };
    print_intent(&route(&event), format);
    Ok(())
}

pub fn decode_url(args: &DecodeUrlArgs, format: OutputFormat) -> Result<()> {
    if args.cold_open {
        match decode_cold_open(&args.url) {
            Some(intent) => print_intent(&intent, format),
            None => print_warning("URL carries no highlight parameters; nothing to route"),
        }
    } else {
        print_intent(&decode_click_url(&args.url), format);
    }
    Ok(())
}

fn parse_pairs(pairs: &[String]) -> Result<NotificationEvent> {
    pairs
        .iter()
        .try_fold(NotificationEvent::default(), |event, pair| -> Result<_> {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected key=value, got: {pair}"))?;
            Ok(event.with_data(key.trim(), value.trim()))
        })
}
