use std::fs;
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::controller::App;

/// Export the logged in user's transactions to a csv file
pub(crate) fn execute_export(app: &mut App, file_path: &str) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let csv = app.db.export_user_transactions_csv(&user_id)?;
    write_file(file_path, &csv)?;

    let count = app.db.load_user_transactions(&user_id).len();
    println!("Exported {count} transactions to {file_path}");
    Ok(())
}

/// Export all users to a csv file. Admin only.
pub(crate) fn execute_export_users(app: &mut App, file_path: &str) -> anyhow::Result<()> {
    app.auth.require_admin()?;
    let csv = app.db.export_users_csv()?;
    write_file(file_path, &csv)?;
    println!("Exported users to {file_path}");
    Ok(())
}

fn write_file(file_path: &str, content: &str) -> anyhow::Result<()> {
    let path = Path::new(file_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Unable to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Unable to write {file_path}"))?;
    info!("Wrote {} bytes to {file_path}", content.len());
    Ok(())
}
