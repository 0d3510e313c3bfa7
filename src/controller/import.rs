use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use comfy_table::{Cell, CellAlignment};
use log::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::controller::{new_table, App};
use crate::csv_reader;
use crate::parser::ImportOptions;
use crate::util::format_amount;

/// Import transactions for the logged in user from a csv file, or from every csv file under a
/// directory. Files imported before are skipped unless `force` is set.
pub(crate) fn execute_import(app: &mut App, path: &str, options: ImportOptions) -> anyhow::Result<()> {
    let user_id = app.auth.require_user()?.id.clone();
    let root = PathBuf::from(path);
    if !root.exists() {
        bail!("{} not found", root.display());
    }

    let is_dir = root.is_dir();
    let files: Vec<PathBuf> = if is_dir {
        scan_files(&root)?.into_iter().map(|f| root.join(f)).collect()
    } else {
        vec![root]
    };
    if files.is_empty() {
        info!("No statement files found in {path}.");
        return Ok(());
    }

    for file in files {
        let result = if options.dry_run {
            print_dry_run(app, &file)
        } else {
            import_file(app, &user_id, &file, options.force)
        };
        match result {
            // One bad file does not stop a directory import
            Err(e) if is_dir => warn!("{}: {:#}", file.display(), e),
            Err(e) => return Err(e.context(format!("Unable to import {}", file.display()))),
            Ok(()) => {}
        }
    }
    Ok(())
}

fn import_file(app: &mut App, user_id: &str, path: &Path, force: bool) -> anyhow::Result<()> {
    let content = fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    let digest = format!("{:x}", md5::compute(&content));
    if !force && app.db.file_imported(user_id, &digest) {
        info!("{} was imported before, skipping. Use (force) to import it again.", path.display());
        return Ok(());
    }

    info!("Importing transactions from {}", path.display());
    let text = String::from_utf8(content).map_err(|_| anyhow!("{} is not valid UTF-8", path.display()))?;
    let report = app.db.import_user_transactions_csv(user_id, &text, &app.labeller)?;
    app.db.record_file_import(user_id, &digest)?;

    println!("Imported {} transactions from {}, skipped {} invalid rows.", report.imported, path.display(), report.skipped);
    if report.reassigned_ids > 0 {
        println!("{} transactions were given new ids.", report.reassigned_ids);
    }
    Ok(())
}

fn print_dry_run(app: &App, path: &Path) -> anyhow::Result<()> {
    info!("Dry run. Printing transactions from {}", path.display());
    let rows = csv_reader::read_transactions_file(path, &app.labeller)?;

    let mut table = new_table();
    table.set_header(vec!["Date", "Type", "Category", "Description", "Amount"]);
    for r in &rows.records {
        let t = &r.transaction;
        table.add_row(vec![
            Cell::new(t.date.format("%Y-%m-%d").to_string()),
            Cell::new(t.kind.to_string()),
            Cell::new(t.category.as_str()),
            Cell::new(t.description.as_str()),
            Cell::new(format_amount(t.amount)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!("{} rows would be imported, {} skipped.", rows.records.len(), rows.skipped);
    info!("This is a dry-run. Transactions are not imported");
    Ok(())
}

/// Add users from a csv file. Admin only.
pub(crate) fn execute_import_users(app: &mut App, path: &str) -> anyhow::Result<()> {
    app.auth.require_admin()?;
    let content = fs::read_to_string(path).with_context(|| format!("Unable to read {path}"))?;
    let report = app.db.import_users_csv(&content)?;
    println!("Imported {} users, skipped {}.", report.imported, report.skipped);
    Ok(())
}

/// Scan a dir recursively and list all csv files, as paths relative to the dir
pub(crate) fn scan_files(root_path: &Path) -> anyhow::Result<BTreeSet<PathBuf>> {
    info!("Scanning files in {}", root_path.display());
    let root = root_path.canonicalize()?;

    let mut files = BTreeSet::new();
    let walker = WalkDir::new(&root).into_iter();
    for dir_entry in walker.filter_entry(|e| !is_hidden(e)).flatten() {
        // Ignore symlinks
        if dir_entry.path_is_symlink() {
            continue;
        }

        let path = dir_entry.path();
        if path.is_dir() {
            continue;
        }

        let is_csv = path.extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            files.insert(path.strip_prefix(&root)?.to_path_buf());
        }
    }

    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::scan_files;
    use crate::controller::parse_and_run_command;
    use crate::controller::tests::logged_in_app;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixture").join(name)
    }

    fn statements_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bank")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::copy(fixture("transactions.csv"), dir.path().join("bank").join("2024-01.csv")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a statement").unwrap();
        fs::write(dir.path().join(".git").join("hidden.csv"), "date,amount\n2024-01-01,1\n").unwrap();
        dir
    }

    #[test]
    fn test_scan_files() {
        let dir = statements_dir();
        let files = scan_files(dir.path()).unwrap();
        assert_eq!(files.into_iter().collect::<Vec<_>>(), vec![PathBuf::from("bank").join("2024-01.csv")]);
    }

    #[test]
    fn test_import_directory_once() {
        let dir = statements_dir();
        let mut app = logged_in_app();
        let user_id = app.auth.current_user().unwrap().id.clone();

        let statement = format!("import '{}';", dir.path().display());
        parse_and_run_command(&mut app, &statement).unwrap();
        assert_eq!(app.db.load_user_transactions(&user_id).len(), 4);

        // Same file again is skipped
        parse_and_run_command(&mut app, &statement).unwrap();
        assert_eq!(app.db.load_user_transactions(&user_id).len(), 4);

        // Unless forced, in which case the colliding ids are reassigned
        parse_and_run_command(&mut app, &format!("import '{}' (force);", dir.path().display())).unwrap();
        let transactions = app.db.load_user_transactions(&user_id);
        assert_eq!(transactions.len(), 8);
        let mut ids: Vec<&str> = transactions.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_dry_run_imports_nothing() {
        let mut app = logged_in_app();
        let user_id = app.auth.current_user().unwrap().id.clone();

        let statement = format!("import '{}' (dryrun);", fixture("transactions.csv").display());
        parse_and_run_command(&mut app, &statement).unwrap();
        assert!(app.db.load_user_transactions(&user_id).is_empty());
    }

    #[test]
    fn test_import_missing_path() {
        let mut app = logged_in_app();
        assert!(parse_and_run_command(&mut app, "import '/definitely/not/here.csv';").is_err());
    }

    #[test]
    fn test_import_bad_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "date,description\n2024-01-01,No amount column\n").unwrap();
        let mut app = logged_in_app();
        let user_id = app.auth.current_user().unwrap().id.clone();

        let err = parse_and_run_command(&mut app, &format!("import '{}';", bad.display())).unwrap_err();
        assert!(err.starts_with(&format!("Unable to import {}", bad.display())));

        // Inside a directory the bad file is skipped and the rest still imports
        fs::copy(fixture("transactions.csv"), dir.path().join("good.csv")).unwrap();
        parse_and_run_command(&mut app, &format!("import '{}';", dir.path().display())).unwrap();
        assert_eq!(app.db.load_user_transactions(&user_id).len(), 4);
    }

    #[test]
    fn test_import_users_admin_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        fs::write(&path, "username,password,role\nada,secret1,user\ndemo,other1,user\n,nopass,user\n").unwrap();
        let statement = format!("import users '{}';", path.display());

        let mut app = logged_in_app();
        assert_eq!(parse_and_run_command(&mut app, &statement), Err("Only admins can do this".to_string()));

        parse_and_run_command(&mut app, "logout;").unwrap();
        parse_and_run_command(&mut app, "login admin changeme;").unwrap();
        parse_and_run_command(&mut app, &statement).unwrap();

        let usernames: Vec<String> = app.db.load_users().into_iter().map(|u| u.username).collect();
        assert_eq!(usernames, vec!["admin", "demo", "ada"]);
    }
}
