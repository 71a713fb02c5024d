use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::models::{DailyLog, Exercise, Food, LogItem, MacroTotals};

/// Parse a gram quantity: "150" or "150g".
pub(crate) fn parse_quantity(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: f64 = trimmed.parse().with_context(|| {
        format!("Invalid quantity: '{s}'. Use a number of grams like '150' or '150g'")
    })?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Quantity must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// First and last day of a `YYYY-MM` month (default: the current month).
pub(crate) fn parse_month(month: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
    let first = match month {
        None => Local::now().date_naive().with_day(1),
        Some(m) => NaiveDate::parse_from_str(&format!("{}-01", m.trim()), "%Y-%m-%d").ok(),
    }
    .with_context(|| format!("Invalid month '{}'. Use YYYY-MM", month.unwrap_or_default()))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .context("Month out of range")?;
    Ok((first, last))
}

pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    Ok(line.trim().to_string())
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    let line = prompt_line(&format!("\nSelect a food (1-{count}): "))?;
    let n: usize = line.parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn format_macros(m: &MacroTotals) -> String {
    let cal = no_neg_zero(m.calories);
    let p = no_neg_zero(m.protein);
    let c = no_neg_zero(m.carbs);
    let f = no_neg_zero(m.fat);
    format!("{cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g")
}

pub(crate) fn format_item(item: &LogItem) -> String {
    let id = item.log_item_id;
    let name = &item.name;
    let qty = item.quantity_g;
    let macros = format_macros(&MacroTotals {
        calories: item.calories,
        protein: item.protein,
        carbs: item.carbs,
        fat: item.fat,
    });
    format!("[{id}] {name} ({qty:.0}g): {macros}")
}

pub(crate) fn print_log(log: &DailyLog) {
    let date = log.date;
    println!("=== {date} ===\n");
    for item in &log.food_items {
        println!("    {}", format_item(item));
    }
    if !log.food_items.is_empty() {
        println!();
    }
    println!("  TOTAL: {}", format_macros(&log.total_macros));
}

pub(crate) fn print_food_table(foods: &[&Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "C/100g")]
        carbs: String,
        #[tabled(rename = "F/100g")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id,
            name: truncate(&f.name, 35),
            calories: format!("{:.0}", f.calories_per_100g),
            protein: format!("{:.1}", f.protein_per_100g),
            carbs: format!("{:.1}", f.carbs_per_100g),
            fat: format!("{:.1}", f.fat_per_100g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_exercise_table(exercises: &[&Exercise]) {
    #[derive(Tabled)]
    struct ExerciseRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Muscle group")]
        muscle_group: String,
        #[tabled(rename = "Equipment")]
        equipment: String,
        #[tabled(rename = "Difficulty")]
        difficulty: String,
    }

    let rows: Vec<ExerciseRow> = exercises
        .iter()
        .map(|e| ExerciseRow {
            id: e.id,
            name: truncate(&e.name, 35),
            muscle_group: e.muscle_group.clone(),
            equipment: e.equipment.as_deref().map(|s| truncate(s, 20)).unwrap_or_default(),
            difficulty: e.difficulty.clone(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
