mod auth;
mod delete;
mod export;
mod import;
mod insert;
mod select;
mod update;

use chrono::NaiveDate;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag_no_case, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{map, map_opt, opt, value};
use nom::sequence::{delimited, tuple};
use nom::{IResult, InputTakeAtPosition};

use crate::report::{KindFilter, SortBy};
use crate::transaction::{NewTransaction, TransactionKind, TransactionPatch};
use crate::user::{LoginCredentials, SignupData};
use crate::util::parse_date;

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Statement {
    /// LOGIN username password
    Login(LoginCredentials),
    /// SIGNUP username password confirm_password
    Signup(SignupData),
    Logout,
    WhoAmI,
    /// INSERT income|expense category amount 'description' [ON date] [PROJECT 'name']
    Insert(NewTransaction),
    /// UPDATE id SET field = value, ...
    Update(String, TransactionPatch),
    /// DELETE id, id. `None` when the ids could not be parsed.
    Delete(Option<Vec<String>>),
    /// SELECT projection [WHERE type = ...] [ORDER BY ...] [LIMIT n]
    Select(Projection, KindFilter, SortBy, Option<usize>),
    Dashboard,
    Charts,
    Categories,
    Insights,
    Tips,
    Help,
    /// IMPORT 'path' [(dryrun, force)]
    Import(String, ImportOptions),
    /// EXPORT TO 'path'
    Export(String),
    /// IMPORT USERS 'path'
    ImportUsers(String),
    /// EXPORT USERS TO 'path'
    ExportUsers(String),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Projection {
    Star,
    Count,
    Sum,
}

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub(crate) struct ImportOptions {
    /// Print what would be imported without saving
    pub(crate) dry_run: bool,
    /// Import even if the same file was imported before
    pub(crate) force: bool,
}

pub(crate) fn parse(input: &str) -> Result<Statement, String> {
    let input = input.trim().trim_end_matches(';').trim_end();
    let result = alt((
        auth::auth_statement,
        insert::insert,
        update::update,
        delete::delete,
        select::select,
        import::import_users,
        import::import,
        export::export_users,
        export::export,
        view_statement,
    ))(input);

    match result {
        Ok(("", statement)) => Ok(statement),
        Ok((rest, _)) => Err(format!("Unexpected input near '{}'", rest.trim())),
        Err(e) => Err(format!("Unable to parse statement: {e}")),
    }
}

/// Statements made of a single keyword
fn view_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        value(Statement::Dashboard, tag_no_case("DASHBOARD")),
        value(Statement::Charts, tag_no_case("CHARTS")),
        value(Statement::Categories, tag_no_case("CATEGORIES")),
        value(Statement::Insights, tag_no_case("INSIGHTS")),
        value(Statement::Tips, tag_no_case("TIPS")),
        value(Statement::Help, tag_no_case("HELP")),
    ))(input)
}

pub(crate) fn non_space1(input: &str) -> IResult<&str, &str> {
    input.split_at_position1_complete(char::is_whitespace, nom::error::ErrorKind::Space)
}

/// A value in single or double quotes. The quotes may be empty.
pub(crate) fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        map(delimited(char('\''), opt(is_not("'")), char('\'')), |s: Option<&str>| s.unwrap_or("")),
        map(delimited(char('"'), opt(is_not("\"")), char('"')), |s: Option<&str>| s.unwrap_or("")),
    ))(input)
}

/// A quoted value, or a bare word up to the next whitespace
pub(crate) fn text(input: &str) -> IResult<&str, &str> {
    alt((quoted, non_space1))(input)
}

/// A file path, quoted if it contains whitespace
pub(crate) fn file_path(input: &str) -> IResult<&str, String> {
    map(text, |s: &str| s.to_string())(input)
}

/// Transaction id, quoted or a bare run of letters, digits, `-` and `_`
pub(crate) fn transaction_id(input: &str) -> IResult<&str, String> {
    map(
        alt((quoted, take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'))),
        |s: &str| s.to_string(),
    )(input)
}

pub(crate) fn kind(input: &str) -> IResult<&str, TransactionKind> {
    alt((
        value(TransactionKind::Income, tag_no_case("income")),
        value(TransactionKind::Expense, tag_no_case("expense")),
    ))(input)
}

pub(crate) fn date(input: &str) -> IResult<&str, NaiveDate> {
    map_opt(
        alt((quoted, take_while1(|c: char| c.is_ascii_digit() || c == '-' || c == '/'))),
        parse_date,
    )(input)
}

/// Whitespace and/or a comma between list items
pub(crate) fn space_comma1(input: &str) -> IResult<&str, ()> {
    alt((
        value((), tuple((multispace0, char(','), multispace0))),
        value((), multispace1),
    ))(input)
}
