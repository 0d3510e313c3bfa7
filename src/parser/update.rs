use chrono::NaiveDate;
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_till1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::map;
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded};
use nom::IResult;

use crate::parser::{date, kind, quoted, transaction_id, Statement};
use crate::transaction::{TransactionKind, TransactionPatch};

enum Assignment {
    Date(NaiveDate),
    Kind(TransactionKind),
    Category(String),
    Amount(f64),
    Description(String),
    Project(String),
}

/// Parse `UPDATE id SET field = value, field = value` pattern.
pub(crate) fn update(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("UPDATE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, id) = transaction_id(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("SET")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, assignments) = separated_list1(delimited(multispace0, char(','), multispace0), assignment)(input)?;

    let mut patch = TransactionPatch::default();
    for assignment in assignments {
        match assignment {
            Assignment::Date(d) => patch.date = Some(d),
            Assignment::Kind(k) => patch.kind = Some(k),
            Assignment::Category(c) => patch.category = Some(c),
            Assignment::Amount(a) => patch.amount = Some(a),
            Assignment::Description(d) => patch.description = Some(d),
            Assignment::Project(p) => patch.project = Some(p),
        }
    }

    Ok((input, Statement::Update(id, patch)))
}

fn assignment(input: &str) -> IResult<&str, Assignment> {
    alt((
        map(preceded(field("date"), date), Assignment::Date),
        map(preceded(field("type"), kind), Assignment::Kind),
        map(preceded(field("category"), value_text), |s| Assignment::Category(s.to_string())),
        map(preceded(field("amount"), double), Assignment::Amount),
        map(preceded(alt((field("description"), field("desc"))), value_text), |s| Assignment::Description(s.to_string())),
        map(preceded(field("project"), value_text), |s| Assignment::Project(s.to_string())),
    ))(input)
}

/// Quoted, or a bare word ending at whitespace or the next comma
fn value_text(input: &str) -> IResult<&str, &str> {
    alt((quoted, take_till1(|c: char| c.is_whitespace() || c == ',')))(input)
}

/// `name =`
fn field<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, ()> {
    move |input: &'a str| {
        let (input, _) = tag_no_case(name)(input)?;
        let (input, _) = multispace0(input)?;
        let (input, _) = tag("=")(input)?;
        let (input, _) = multispace0(input)?;
        Ok((input, ()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::parser::{parse, Statement};
    use crate::transaction::{TransactionKind, TransactionPatch};

    #[test]
    fn test_update_single_field() {
        assert_eq!(parse("update 1700000000000 set amount = 12.5;"), Ok(Statement::Update(
            "1700000000000".to_string(),
            TransactionPatch { amount: Some(12.5), ..TransactionPatch::default() },
        )));
    }

    #[test]
    fn test_update_many_fields() {
        let statement = parse("UPDATE 42 SET type = income, category=consulting, desc = 'Advisory retainer', date = 2024-02-29, project = ''");
        assert_eq!(statement, Ok(Statement::Update("42".to_string(), TransactionPatch {
            date: NaiveDate::from_ymd_opt(2024, 2, 29),
            kind: Some(TransactionKind::Income),
            category: Some("consulting".to_string()),
            amount: None,
            description: Some("Advisory retainer".to_string()),
            project: Some(String::new()),
        })));
    }

    #[test]
    fn test_update_invalid() {
        assert!(parse("update 42 set").is_err());
        assert!(parse("update 42 set colour = red").is_err());
        assert!(parse("update set amount = 1").is_err());
    }
}
