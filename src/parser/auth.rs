use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::multispace1;
use nom::combinator::value;
use nom::IResult;

use crate::parser::{text, Statement};
use crate::user::{LoginCredentials, SignupData};

pub(crate) fn auth_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        login,
        signup,
        value(Statement::Logout, tag_no_case("LOGOUT")),
        value(Statement::WhoAmI, tag_no_case("WHOAMI")),
    ))(input)
}

/// Parse `LOGIN username password`
fn login(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("LOGIN")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, username) = text(input)?;
    let (input, _) = multispace1(input)?;
    let (input, password) = text(input)?;

    Ok((input, Statement::Login(LoginCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })))
}

/// Parse `SIGNUP username password confirm_password`
fn signup(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("SIGNUP")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, username) = text(input)?;
    let (input, _) = multispace1(input)?;
    let (input, password) = text(input)?;
    let (input, _) = multispace1(input)?;
    let (input, confirm_password) = text(input)?;

    Ok((input, Statement::Signup(SignupData {
        username: username.to_string(),
        password: password.to_string(),
        confirm_password: confirm_password.to_string(),
    })))
}
