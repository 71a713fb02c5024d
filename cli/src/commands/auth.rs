use anyhow::Result;
use std::process;

use super::App;
use super::helpers::{json_error, prompt_line};

pub(crate) async fn cmd_login(app: &App, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ")?,
    };

    let user = app
        .session
        .login(email, &password)
        .await
        .map_err(anyhow::Error::new)?;
    if let Some(token) = app.session.credential() {
        app.config.save_token(&token)?;
    }

    let who = user.full_name.as_deref().unwrap_or(&user.email);
    println!("Logged in as {who}");
    Ok(())
}

pub(crate) fn cmd_logout(app: &App) -> Result<()> {
    app.session.logout();
    app.config.clear_token()?;
    println!("Logged out");
    Ok(())
}

pub(crate) async fn cmd_whoami(app: &App, json: bool) -> Result<()> {
    if !app.session.is_authenticated() {
        if json {
            println!("{}", json_error("Not logged in"));
        } else {
            eprintln!("Not logged in");
        }
        process::exit(2);
    }

    let user = match app.session.fetch_identity().await {
        Ok(user) => user,
        Err(err) => {
            // A rejected identity has already ended the session
            app.config.clear_token()?;
            return Err(anyhow::Error::new(err).context("Stored session is no longer valid"));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        let id = user.id;
        let email = &user.email;
        match &user.full_name {
            Some(name) => println!("{name} <{email}> (id: {id})"),
            None => println!("{email} (id: {id})"),
        }
        if !user.is_active {
            println!("  account inactive");
        }
    }
    Ok(())
}
