use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::api::NutritionApi;
use nutrilog_core::models::{LogItem, NewMealPlan, validate_plan};

use super::App;
use super::helpers::{json_error, no_neg_zero, parse_date, print_log, truncate};

pub(crate) async fn cmd_plan_list(app: &App, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Items")]
        items: usize,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    app.require_login()?;
    let plans = app.api.list_meal_plans().await.map_err(|e| app.fail(e))?;

    if plans.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No saved meal plans");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    let rows: Vec<PlanRow> = plans
        .iter()
        .map(|p| {
            let cal = no_neg_zero(p.items.iter().map(|i| i.calories).sum());
            PlanRow {
                id: p.id,
                name: truncate(&p.name, 35),
                items: p.items.len(),
                calories: format!("{cal:.0}"),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) async fn cmd_plan_save(
    app: &App,
    name: &str,
    from: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let date = parse_date(from)?;
    let dispatcher = app.dispatcher(date);
    let log = app.load_log(&dispatcher, date).await?;

    if log.food_items.is_empty() {
        let msg = format!("No entries on {date} to save");
        if json {
            println!("{}", json_error(&msg));
        } else {
            eprintln!("{msg}");
        }
        process::exit(2);
    }

    let plan = NewMealPlan {
        name: name.trim().to_string(),
        items: log.food_items.iter().map(LogItem::to_new).collect(),
    };
    validate_plan(&plan)?;
    let saved = app.api.save_meal_plan(&plan).await.map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        let count = saved.items.len();
        println!("Saved plan '{}' (id: {}) with {count} items", saved.name, saved.id);
    }
    Ok(())
}

pub(crate) async fn cmd_plan_log(
    app: &App,
    plan_id: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let date = parse_date(date)?;
    let dispatcher = app.dispatcher(date);
    app.load_log(&dispatcher, date).await?;

    let log = dispatcher
        .replay_plan(date, plan_id)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        print_log(&log);
    }
    Ok(())
}
