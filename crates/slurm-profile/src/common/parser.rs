use nom::IResult;
use nom::character::complete::digit1;
use nom::combinator::map_res;
use nom_supreme::error::ErrorTree;
use nom_supreme::final_parser::{Location, final_parser};

pub type NomResult<'a, Ret> = IResult<&'a str, Ret, ErrorTree<&'a str>>;

pub fn p_u32(input: &str) -> NomResult<u32> {
    map_res(digit1, |number: &str| number.parse::<u32>())(input)
}

pub fn p_u64(input: &str) -> NomResult<u64> {
    map_res(digit1, |number: &str| number.parse::<u64>())(input)
}

/// Runs `parser` and fails unless it consumes the whole input.
pub fn consume_all<'a, O>(
    parser: impl FnMut(&'a str) -> NomResult<'a, O>,
    input: &'a str,
) -> anyhow::Result<O> {
    let result: Result<O, ErrorTree<Location>> = final_parser(parser)(input);
    result.map_err(|error| anyhow::anyhow!("Parse error\n{error}"))
}
