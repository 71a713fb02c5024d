use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::api::NutritionApi;
use nutrilog_core::models::{
    Exercise, LoggedExercise, LoggedSet, NewWorkoutLog, NewWorkoutPlan, PlanExercise, WorkoutPlan,
    validate_workout_log, validate_workout_plan,
};

use super::App;
use super::helpers::{json_error, parse_date, parse_month, truncate};

/// Parse an `ID:SETS:REPS` plan entry, e.g. `12:3:8-10`.
fn parse_plan_exercise(s: &str) -> Result<(i64, i64, String)> {
    let mut parts = s.splitn(3, ':');
    let (Some(id), Some(sets), Some(reps)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("Invalid exercise '{s}'. Use ID:SETS:REPS, e.g. 12:3:8-10");
    };
    let id = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid exercise ID in '{s}'"))?;
    let sets = sets
        .trim()
        .parse()
        .with_context(|| format!("Invalid set count in '{s}'"))?;
    Ok((id, sets, reps.trim().to_string()))
}

/// Parse an `ID:REPSxWEIGHT` set, e.g. `12:10x50` or `12:8x22.5kg`.
fn parse_set(s: &str) -> Result<(i64, LoggedSet)> {
    let Some((id, set)) = s.split_once(':') else {
        bail!("Invalid set '{s}'. Use ID:REPSxWEIGHT, e.g. 12:10x50");
    };
    let Some((reps, weight)) = set.split_once('x') else {
        bail!("Invalid set '{s}'. Use ID:REPSxWEIGHT, e.g. 12:10x50");
    };
    let id = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid exercise ID in '{s}'"))?;
    let reps = reps
        .trim()
        .parse()
        .with_context(|| format!("Invalid reps in '{s}'"))?;
    let weight = weight
        .trim()
        .trim_end_matches("kg")
        .trim()
        .parse()
        .with_context(|| format!("Invalid weight in '{s}'"))?;
    Ok((id, LoggedSet { reps, weight }))
}

fn exercise_name(catalogue: &[Exercise], id: i64) -> Result<String> {
    catalogue
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.name.clone())
        .with_context(|| format!("Exercise {id} not found in the catalogue"))
}

/// Add each set to its exercise, in order. Exercises not yet in `exercises`
/// are appended, named from `catalogue`.
fn attach_sets(
    exercises: &mut Vec<LoggedExercise>,
    sets: Vec<(i64, LoggedSet)>,
    catalogue: &[Exercise],
) -> Result<()> {
    for (id, set) in sets {
        if let Some(entry) = exercises.iter_mut().find(|e| e.exercise_id == id) {
            entry.sets.push(set);
            continue;
        }
        exercises.push(LoggedExercise {
            log_exercise_id: None,
            exercise_id: id,
            exercise_name: exercise_name(catalogue, id)?,
            sets: vec![set],
        });
    }
    Ok(())
}

fn print_plan(plan: &WorkoutPlan) {
    println!("[{}] {} ({})", plan.id, plan.name, plan.goal_type);
    for e in &plan.exercises {
        println!("    {} x{}  {} (exercise {})", e.sets, e.reps, e.name, e.exercise_id);
    }
}

pub(crate) async fn cmd_workout_plans(app: &App, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct WorkoutRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "Exercises")]
        exercises: String,
    }

    app.require_login()?;
    let plans = app.api.list_workout_plans().await.map_err(|e| app.fail(e))?;

    if plans.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No workout plans");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    let rows: Vec<WorkoutRow> = plans
        .iter()
        .map(|p| {
            let exercises = p
                .exercises
                .iter()
                .map(|e| format!("{} {}x{}", e.name, e.sets, e.reps))
                .collect::<Vec<_>>()
                .join(", ");
            WorkoutRow {
                id: p.id,
                name: truncate(&p.name, 30),
                goal: p.goal_type.clone(),
                exercises: truncate(&exercises, 60),
            }
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) async fn cmd_workout_show(app: &App, plan_id: i64, json: bool) -> Result<()> {
    app.require_login()?;
    let plan = app
        .api
        .fetch_workout_plan(plan_id)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

pub(crate) async fn cmd_workout_create(
    app: &App,
    name: &str,
    goal: &str,
    entries: &[String],
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let parsed = entries
        .iter()
        .map(|s| parse_plan_exercise(s))
        .collect::<Result<Vec<_>>>()?;

    let catalogue = app.api.list_exercises().await.map_err(|e| app.fail(e))?;
    let exercises = parsed
        .into_iter()
        .map(|(exercise_id, sets, reps)| {
            Ok(PlanExercise {
                exercise_id,
                name: exercise_name(&catalogue, exercise_id)?,
                sets,
                reps,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let plan = NewWorkoutPlan {
        name: name.trim().to_string(),
        goal_type: goal.trim().to_lowercase(),
        exercises,
    };
    validate_workout_plan(&plan)?;
    let created = app
        .api
        .create_workout_plan(&plan)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        println!("Created workout plan:");
        print_plan(&created);
    }
    Ok(())
}

pub(crate) async fn cmd_workout_log(
    app: &App,
    plan_id: Option<i64>,
    sets: &[String],
    notes: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    let date = parse_date(date)?;
    let sets = sets
        .iter()
        .map(|s| parse_set(s))
        .collect::<Result<Vec<_>>>()?;

    let mut exercises = match plan_id {
        Some(id) => app
            .api
            .fetch_workout_plan(id)
            .await
            .map_err(|e| app.fail(e))?
            .to_log_exercises(),
        None => Vec::new(),
    };

    let needs_catalogue = sets
        .iter()
        .any(|(id, _)| !exercises.iter().any(|e| e.exercise_id == *id));
    let catalogue = if needs_catalogue {
        app.api.list_exercises().await.map_err(|e| app.fail(e))?
    } else {
        Vec::new()
    };
    attach_sets(&mut exercises, sets, &catalogue)?;

    let log = NewWorkoutLog {
        date,
        notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        exercises,
    };
    validate_workout_log(&log)?;
    let saved = app.api.log_workout(&log).await.map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        let count = saved.exercises.len();
        println!("Logged workout {} on {} with {count} exercises", saved.id, saved.date);
        for e in &saved.exercises {
            println!(
                "    {}: {} sets, {:.0} kg volume",
                e.exercise_name,
                e.sets.len(),
                e.volume()
            );
        }
    }
    Ok(())
}

pub(crate) async fn cmd_workout_logs(
    app: &App,
    month: Option<&str>,
    from: Option<String>,
    to: Option<String>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct LogRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: NaiveDate,
        #[tabled(rename = "Exercises")]
        exercises: String,
        #[tabled(rename = "Sets")]
        sets: usize,
        #[tabled(rename = "Volume (kg)")]
        volume: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    app.require_login()?;
    let (start, end) = match (from, to) {
        (None, None) => parse_month(month)?,
        (from, to) => {
            let start = parse_date(from)?;
            let end = match to {
                Some(s) => parse_date(Some(s))?,
                None => start,
            };
            (start, end)
        }
    };
    if end < start {
        bail!("End date {end} is before start date {start}");
    }

    let mut logs = app
        .api
        .list_workout_logs(start, end)
        .await
        .map_err(|e| app.fail(e))?;
    logs.sort_by_key(|l| (l.date, l.id));

    if logs.is_empty() {
        let msg = format!("No workouts logged between {start} and {end}");
        if json {
            println!("{}", json_error(&msg));
        } else {
            eprintln!("{msg}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }

    let rows: Vec<LogRow> = logs
        .iter()
        .map(|l| {
            let names = l
                .exercises
                .iter()
                .map(|e| e.exercise_name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            LogRow {
                id: l.id,
                date: l.date,
                exercises: truncate(&names, 40),
                sets: l.exercises.iter().map(|e| e.sets.len()).sum(),
                volume: format!("{:.0}", l.exercises.iter().map(LoggedExercise::volume).sum::<f64>()),
                notes: truncate(l.notes.as_deref().unwrap_or(""), 30),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) async fn cmd_workout_delete_plan(app: &App, plan_id: i64, json: bool) -> Result<()> {
    app.require_login()?;
    app.api
        .delete_workout_plan(plan_id)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::json!({ "deleted": plan_id }));
    } else {
        println!("Deleted workout plan {plan_id}");
    }
    Ok(())
}

pub(crate) async fn cmd_workout_delete_log(app: &App, log_id: i64, json: bool) -> Result<()> {
    app.require_login()?;
    app.api
        .delete_workout_log(log_id)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::json!({ "deleted": log_id }));
    } else {
        println!("Deleted workout log {log_id}");
    }
    Ok(())
}
