use nom::bytes::complete::{is_not, tag_no_case};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::opt;
use nom::sequence::{delimited, preceded};
use nom::IResult;

use crate::parser::{file_path, ImportOptions, Statement};

/// Parse `IMPORT USERS file_path`
pub(crate) fn import_users(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("IMPORT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("USERS")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, path) = file_path(input)?;
    Ok((input, Statement::ImportUsers(path)))
}

/// Parse `IMPORT file_path (dryrun, force)`. The path may be a CSV file or a directory of them.
pub(crate) fn import(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("IMPORT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, path) = file_path(input)?;
    let (input, import_options) = opt(preceded(multispace0, parentheses))(input)?;

    let mut options = ImportOptions::default();
    if let Some(import_options) = import_options {
        for import_option in import_options.split(&[' ', ',']) {
            match import_option.trim().to_lowercase().as_str() {
                "dryrun" | "dry-run" => options.dry_run = true,
                "f" | "force" => options.force = true,
                _ => {}
            }
        }
    }

    Ok((input, Statement::Import(path, options)))
}

fn parentheses(input: &str) -> IResult<&str, &str> {
    delimited(char('('), is_not(")"), char(')'))(input)
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, ImportOptions, Statement};

    #[test]
    fn test_import() {
        assert_eq!(parse("import bank.csv;"), Ok(Statement::Import("bank.csv".to_string(), ImportOptions::default())));
        assert_eq!(
            parse("IMPORT '/tmp/my statements' (dryrun, force)"),
            Ok(Statement::Import("/tmp/my statements".to_string(), ImportOptions { dry_run: true, force: true }))
        );
        assert_eq!(
            parse("import 'bank.csv'(force)"),
            Ok(Statement::Import("bank.csv".to_string(), ImportOptions { dry_run: false, force: true }))
        );
    }

    #[test]
    fn test_import_users() {
        assert_eq!(parse("import users team.csv"), Ok(Statement::ImportUsers("team.csv".to_string())));
        // A file merely named users is still a transaction import
        assert_eq!(parse("import users.csv"), Ok(Statement::Import("users.csv".to_string(), ImportOptions::default())));
        assert!(parse("import").is_err());
    }
}
