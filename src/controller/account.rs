use log::info;

use crate::auth::{password_strength, strength_label};
use crate::controller::{new_table, App};
use crate::user::{LoginCredentials, SignupData};

pub(crate) fn login(app: &mut App, credentials: &LoginCredentials) -> anyhow::Result<()> {
    if let Some(current) = app.auth.current_user() {
        info!("Switching from user {}", current.username);
    }
    let user = app.auth.login(&mut app.db, credentials)?;
    println!("Welcome back, {}!", user.username);
    Ok(())
}

pub(crate) fn signup(app: &mut App, data: &SignupData) -> anyhow::Result<()> {
    let user = app.auth.signup(&mut app.db, data)?;
    println!("Account {} created. You are now logged in.", user.username);

    let strength = password_strength(&data.password);
    println!("Password strength: {}", strength_label(strength));
    Ok(())
}

pub(crate) fn logout(app: &mut App) -> anyhow::Result<()> {
    app.auth.require_user()?;
    app.auth.logout(&mut app.db);
    println!("Logged out.");
    Ok(())
}

pub(crate) fn whoami(app: &mut App) -> anyhow::Result<()> {
    let user = app.auth.require_user()?;

    let mut table = new_table();
    table.set_header(vec!["ID", "Username", "Role", "Member since"]);
    table.add_row(vec![
        user.id.clone(),
        user.username.clone(),
        user.role.to_string(),
        user.created_at.format("%Y-%m-%d").to_string(),
    ]);
    println!("{table}");
    Ok(())
}
