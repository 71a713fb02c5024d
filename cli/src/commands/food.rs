use anyhow::Result;
use std::process;

use nutrilog_core::api::NutritionApi;
use nutrilog_core::models::{Food, NewFood, validate_food_data};

use super::App;
use super::helpers::{
    json_error, parse_date, parse_quantity, print_food_table, prompt_choice,
};

pub(crate) async fn cmd_food_add(
    app: &App,
    name: &str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let food = NewFood {
        name: name.trim().to_string(),
        calories_per_100g: calories,
        protein_per_100g: protein,
        carbs_per_100g: carbs,
        fat_per_100g: fat,
    };
    validate_food_data(&food)?;

    let food = app.api.create_food(&food).await.map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = food.id;
        println!("Added food: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) async fn cmd_food_search(app: &App, query: &str, json: bool) -> Result<()> {
    app.require_login()?;
    let foods = app.api.search_foods(query).await.map_err(|e| app.fail(e))?;

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        let refs: Vec<&Food> = foods.iter().collect();
        print_food_table(&refs);
    }
    Ok(())
}

/// Search the library for `query`, price `quantity` grams of the chosen food and log it.
pub(crate) async fn cmd_food_log(
    app: &App,
    query: &str,
    quantity: &str,
    food_id: Option<i64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let quantity_g = parse_quantity(quantity)?;
    let date = parse_date(date)?;

    let mut foods = app.api.search_foods(query).await.map_err(|e| app.fail(e))?;
    if let Some(id) = food_id {
        foods.retain(|f| f.id == id);
    }

    if foods.is_empty() {
        let msg = match food_id {
            Some(id) => format!("Food {id} not found for '{query}'"),
            None => format!("No food found for '{query}'"),
        };
        if json {
            println!("{}", json_error(&msg));
        } else {
            eprintln!("{msg}");
        }
        process::exit(2);
    }

    let idx = if foods.len() == 1 {
        0
    } else {
        let refs: Vec<&Food> = foods.iter().collect();
        print_food_table(&refs);
        prompt_choice(foods.len())?
    };
    let food = foods.swap_remove(idx);
    let item = food.item_for(quantity_g);

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
        let cal = item.calories;
        let total = log.total_macros.calories;
        println!("Logged: {name} {quantity_g:.0}g, {cal:.0} kcal (day total {total:.0} kcal)");
    }
    Ok(())
}
