use anyhow::Result;
use std::process;

use super::App;
use super::helpers::{parse_date, print_log};

pub(crate) async fn cmd_summary(app: &App, date: Option<String>, json: bool) -> Result<()> {
    app.require_login()?;
    let date = parse_date(date)?;
    let dispatcher = app.dispatcher(date);
    let log = app.load_log(&dispatcher, date).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }

    if log.food_items.is_empty() {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    print_log(&log);
    Ok(())
}
