use anyhow::Result;
use std::process;

use nutrilog_core::models::LogItemChanges;

use super::App;
use super::helpers::{format_item, json_error, parse_date};

fn not_found(item_id: i64, date: chrono::NaiveDate, json: bool) -> ! {
    let msg = format!("Item {item_id} not found on {date}");
    if json {
        println!("{}", json_error(&msg));
    } else {
        eprintln!("{msg}");
    }
    process::exit(2);
}

pub(crate) async fn cmd_delete(
    app: &App,
    item_id: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let date = parse_date(date)?;
    let dispatcher = app.dispatcher(date);
    let log = app.load_log(&dispatcher, date).await?;
    if log.item(item_id).is_none() {
        not_found(item_id, date, json);
    }

    let updated = dispatcher
        .delete_item(date, item_id)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        let total = updated.total_macros.calories;
        println!("Deleted item {item_id} (day total {total:.0} kcal)");
    }
    Ok(())
}

pub(crate) async fn cmd_update(
    app: &App,
    item_id: i64,
    changes: LogItemChanges,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let date = parse_date(date)?;
    let dispatcher = app.dispatcher(date);
    let log = app.load_log(&dispatcher, date).await?;
    let Some(current) = log.item(item_id) else {
        not_found(item_id, date, json);
    };

    // The service replaces the whole record, so unchanged fields are resent
    let fields = changes.apply_to(current).to_new();
    let updated = dispatcher
        .update_item(date, item_id, fields)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else if let Some(item) = updated.item(item_id) {
        println!("Updated {}", format_item(item));
    } else {
        println!("Updated item {item_id}");
    }
    Ok(())
}
