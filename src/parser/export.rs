use nom::bytes::complete::tag_no_case;
use nom::character::complete::multispace1;
use nom::IResult;

use crate::parser::{file_path, Statement};

/// Parse `EXPORT TO file_path` pattern.
pub(crate) fn export(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("EXPORT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, path) = to_file_path(input)?;
    Ok((input, Statement::Export(path)))
}

/// Parse `EXPORT USERS TO file_path` pattern.
pub(crate) fn export_users(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("EXPORT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("USERS")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, path) = to_file_path(input)?;
    Ok((input, Statement::ExportUsers(path)))
}

fn to_file_path(input: &str) -> IResult<&str, String> {
    let (input, _) = tag_no_case("TO")(input)?;
    let (input, _) = multispace1(input)?;
    file_path(input)
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, Statement};

    #[test]
    fn test_export() {
        assert_eq!(parse("export to out.csv;"), Ok(Statement::Export("out.csv".to_string())));
        assert_eq!(parse("EXPORT TO \"/tmp/my export.csv\""), Ok(Statement::Export("/tmp/my export.csv".to_string())));
        assert!(parse("export out.csv").is_err());
    }

    #[test]
    fn test_export_users() {
        assert_eq!(parse("export users to users.csv"), Ok(Statement::ExportUsers("users.csv".to_string())));
    }
}
