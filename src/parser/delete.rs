use log::warn;
use nom::bytes::complete::tag_no_case;
use nom::multi::many1;
use nom::sequence::preceded;
use nom::IResult;

use crate::parser::{space_comma1, transaction_id, Statement};

/// Parse `DELETE id, id ...`. Yields `Delete(None)` when no id follows so the caller can
/// report the usage.
pub(crate) fn delete(input: &str) -> IResult<&str, Statement> {
    let (input, _) = tag_no_case("DELETE")(input)?;
    let parse_result = many1(preceded(space_comma1, transaction_id))(input);
    match parse_result {
        Ok((input, ids)) => Ok((input, Statement::Delete(Some(ids)))),
        Err(e) => {
            warn!("{e:?}");
            Ok((input, Statement::Delete(None)))
        }
    }
}
