use anyhow::Result;

use nutrilog_core::api::NutritionApi;
use nutrilog_core::models::{UserProfile, validate_profile};

use super::App;

/// Overlay the values given in `changes` on `base`.
fn merge(base: UserProfile, changes: UserProfile) -> UserProfile {
    UserProfile {
        age: changes.age.or(base.age),
        height: changes.height.or(base.height),
        weight: changes.weight.or(base.weight),
        goal: changes.goal.or(base.goal),
        activity_level: changes.activity_level.or(base.activity_level),
    }
}

fn print_profile(profile: &UserProfile) {
    fn show<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
        value.map_or_else(|| "-".to_string(), |v| format!("{v}{unit}"))
    }

    println!("Age:            {}", show(profile.age, ""));
    println!("Height:         {}", show(profile.height, " cm"));
    println!("Weight:         {}", show(profile.weight, " kg"));
    println!("Goal:           {}", show(profile.goal.as_deref(), ""));
    println!("Activity level: {}", show(profile.activity_level.as_deref(), ""));
}

pub(crate) async fn cmd_profile_show(app: &App, json: bool) -> Result<()> {
    app.require_login()?;
    let profile = app.api.fetch_profile().await.map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

/// Create the profile. The refreshed user is printed with it.
pub(crate) async fn cmd_profile_setup(app: &App, profile: UserProfile, json: bool) -> Result<()> {
    app.require_login()?;
    let user = app
        .session
        .setup_profile(&profile)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Profile created for {}", user.email);
        print_profile(user.profile.as_ref().unwrap_or(&profile));
    }
    Ok(())
}

pub(crate) async fn cmd_profile_update(app: &App, changes: UserProfile, json: bool) -> Result<()> {
    app.require_login()?;
    let current = app.api.fetch_profile().await.map_err(|e| app.fail(e))?;
    let profile = merge(current, changes);
    validate_profile(&profile)?;
    let saved = app
        .api
        .update_profile(&profile)
        .await
        .map_err(|e| app.fail(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Profile updated");
        print_profile(&saved);
    }
    Ok(())
}
