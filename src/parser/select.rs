use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::character::complete::{multispace0, multispace1};
use nom::combinator::{map, opt, value};
use nom::sequence::preceded;
use nom::IResult;

use crate::parser::{kind, Projection, Statement};
use crate::report::{KindFilter, SortBy};

/// Parse `SELECT *|COUNT(*)|SUM(*) [WHERE type = kind] [ORDER BY date|amount] [LIMIT n]`.
pub(crate) fn select(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("SELECT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, projection) = alt((
        value(Projection::Star, tag("*")),
        value(Projection::Count, tag_no_case("COUNT(*)")),
        value(Projection::Sum, tag_no_case("SUM(*)")),
    ))(input)?;
    let (input, filter) = opt(preceded(multispace1, where_type))(input)?;
    let (input, sort) = opt(preceded(multispace1, order_by))(input)?;
    let (input, limit) = opt(preceded(multispace1, limit))(input)?;

    Ok((input, Statement::Select(projection, filter.unwrap_or_default(), sort.unwrap_or_default(), limit)))
}

/// WHERE type = income
fn where_type(input: &str) -> IResult<&str, KindFilter> {
    let (input, _) = tag_no_case("WHERE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("type")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = tag("=")(input)?;
    let (input, _) = multispace0(input)?;
    map(kind, KindFilter::Only)(input)
}

/// ORDER BY date|amount
fn order_by(input: &str) -> IResult<&str, SortBy> {
    let (input, _) = tag_no_case("ORDER")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("BY")(input)?;
    let (input, _) = multispace1(input)?;
    alt((
        value(SortBy::Date, tag_no_case("date")),
        value(SortBy::Amount, tag_no_case("amount")),
    ))(input)
}

/// LIMIT 10
fn limit(input: &str) -> IResult<&str, usize> {
    let (input, _) = tag_no_case("LIMIT")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, n) = nom::character::complete::u32(input)?;
    Ok((input, n as usize))
}
