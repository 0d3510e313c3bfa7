use chrono::Local;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::multispace1;
use nom::combinator::opt;
use nom::number::complete::double;
use nom::sequence::preceded;
use nom::IResult;

use crate::parser::{date, kind, text, Statement};
use crate::transaction::NewTransaction;

/// Parse `INSERT income|expense category amount 'description' [ON date] [PROJECT 'name']`.
/// Without `ON` the transaction is dated today.
pub(crate) fn insert(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("INSERT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, kind) = kind(input)?;
    let (input, _) = multispace1(input)?;
    let (input, category) = text(input)?;
    let (input, _) = multispace1(input)?;
    let (input, amount) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, description) = text(input)?;
    let (input, date) = opt(preceded(on_keyword, date))(input)?;
    let (input, project) = opt(preceded(project_keyword, text))(input)?;

    Ok((input, Statement::Insert(NewTransaction {
        date: date.unwrap_or_else(|| Local::now().date_naive()),
        kind,
        category: category.to_string(),
        amount,
        description: description.to_string(),
        project: project.map(str::to_string),
    })))
}

fn on_keyword(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("ON")(input)?;
    let (input, _) = multispace1(input)?;
    Ok((input, ()))
}

fn project_keyword(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("PROJECT")(input)?;
    let (input, _) = multispace1(input)?;
    Ok((input, ()))
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate};

    use crate::parser::{parse, Statement};
    use crate::transaction::{NewTransaction, TransactionKind};

    #[test]
    fn test_insert_full() {
        let statement = parse("INSERT expense tools 49.99 'JetBrains licence' ON 2024-03-01 PROJECT 'website'");
        assert_eq!(statement, Ok(Statement::Insert(NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: TransactionKind::Expense,
            category: "tools".to_string(),
            amount: 49.99,
            description: "JetBrains licence".to_string(),
            project: Some("website".to_string()),
        })));
    }

    #[test]
    fn test_insert_defaults_to_today() {
        match parse("insert income project-income 5000 Deposit;") {
            Ok(Statement::Insert(t)) => {
                assert_eq!(t.date, Local::now().date_naive());
                assert_eq!(t.kind, TransactionKind::Income);
                assert_eq!(t.amount, 5000.0);
                assert_eq!(t.description, "Deposit");
                assert_eq!(t.project, None);
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_insert_invalid() {
        assert!(parse("insert transfer tools 5 'x'").is_err());
        assert!(parse("insert expense tools abc 'x'").is_err());
        assert!(parse("insert expense tools 5 'x' ON someday").is_err());
    }
}
