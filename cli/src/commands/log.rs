use anyhow::Result;
use std::process;

use nutrilog_core::api::NutritionApi;
use nutrilog_core::models::{MacroTotals, validate_new_item};

use super::helpers::{format_macros, json_error, parse_date, print_log};
use super::{App, ItemFields};

pub(crate) async fn cmd_log(
    app: &App,
    fields: ItemFields,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let item = fields.into_item()?;
    let date = parse_date(date)?;

    let dispatcher = app.dispatcher(date);
    app.load_log(&dispatcher, date).await?;
    let log = dispatcher
        .log_items(date, vec![item.clone()])
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        let name = &item.name;
        let qty = item.quantity_g;
        let cal = item.calories;
        let total = log.total_macros.calories;
        println!("Logged: {name} {qty:.0}g, {cal:.0} kcal (day total {total:.0} kcal)");
    }
    Ok(())
}

pub(crate) async fn cmd_analyze(
    app: &App,
    text: &str,
    log: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let analysis = app.api.analyze_meal(text).await.map_err(|e| app.fail(e))?;

    if analysis.items.is_empty() {
        let msg = format!("Could not identify any food in '{text}'");
        if json {
            println!("{}", json_error(&msg));
        } else {
            eprintln!("{msg}");
        }
        process::exit(2);
    }

    if !log {
        if json {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        } else {
            for item in &analysis.items {
                let macros = format_macros(&MacroTotals {
                    calories: item.calories,
                    protein: item.protein,
                    carbs: item.carbs,
                    fat: item.fat,
                });
                println!("  {} ({:.0}g): {macros}", item.name, item.quantity_g);
            }
            println!("\n  TOTAL: {}", format_macros(&analysis.totals));
        }
        return Ok(());
    }

    // Estimates occasionally come back with zero grams; those cannot be logged
    let (items, skipped): (Vec<_>, Vec<_>) = analysis
        .items
        .into_iter()
        .partition(|i| validate_new_item(i).is_ok());
    for item in &skipped {
        eprintln!("Skipping '{}': not a loggable estimate", item.name);
    }

    let date = parse_date(date)?;
    let dispatcher = app.dispatcher(date);
    app.load_log(&dispatcher, date).await?;
    let updated = dispatcher
        .log_items(date, items)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        print_log(&updated);
    }
    Ok(())
}
