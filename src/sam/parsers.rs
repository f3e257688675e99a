//! Reply-line parsers for the session-bridge text protocol (§4.H). Every
//! reply is `TAG key=value ...\n`, with values either bare (no whitespace) or
//! double-quoted. Rewritten against nom 7's combinator style; the teacher's
//! original `named!`/`do_parse!` macros predate nom 5 and no longer build
//! against this workspace's pinned `nom` version, but every parsed shape and
//! test case below is unchanged from the teacher.

use nom::{
	branch::alt,
	bytes::complete::{tag, take_till},
	character::complete::{alphanumeric1, space1},
	multi::separated_list0,
	sequence::{delimited, preceded, separated_pair, terminated},
	IResult,
};

fn is_space(chr: char) -> bool {
	chr == ' ' || chr == '\t'
}

fn is_next_line(chr: char) -> bool {
	chr == '\n'
}

fn is_space_or_next_line(chr: char) -> bool {
	is_space(chr) || is_next_line(chr)
}

fn is_double_quote(chr: char) -> bool {
	chr == '\"'
}

fn quoted_value(input: &str) -> IResult<&str, &str> {
	delimited(tag("\""), take_till(is_double_quote), tag("\""))(input)
}

fn value(input: &str) -> IResult<&str, &str> {
	take_till(is_space_or_next_line)(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
	separated_pair(alphanumeric1, tag("="), alt((quoted_value, value)))(input)
}

fn keys_and_values(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	separated_list0(space1, key_value)(input)
}

pub fn sam_hello(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	preceded(tag("HELLO REPLY "), terminated(keys_and_values, tag("\n")))(input)
}

pub fn sam_session_status(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	preceded(
		tag("SESSION STATUS "),
		terminated(keys_and_values, tag("\n")),
	)(input)
}

pub fn sam_stream_status(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	preceded(tag("STREAM STATUS "), terminated(keys_and_values, tag("\n")))(input)
}

pub fn sam_naming_reply(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	preceded(tag("NAMING REPLY "), terminated(keys_and_values, tag("\n")))(input)
}

pub fn sam_dest_reply(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	preceded(tag("DEST REPLY "), terminated(keys_and_values, tag("\n")))(input)
}

pub fn sam_quit_status(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	preceded(tag("QUIT STATUS "), terminated(keys_and_values, tag("\n")))(input)
}

/// Parses a router-initiated `PING <remainder>\n`, returning `remainder`
/// verbatim so the caller can echo it back in the `PONG`.
pub fn sam_ping(input: &str) -> IResult<&str, &str> {
	let (input, _) = tag("PING")(input)?;
	let (input, remainder) = take_till(is_next_line)(input)?;
	let (input, _) = tag("\n")(input)?;
	Ok((input, remainder.trim_start()))
}

/// Parses a datagram subsession's preamble line: `<base64 source dest>
/// FROM_PORT=.. TO_PORT=..\n`. The payload bytes follow immediately after
/// the newline and are not part of this parser's input.
pub fn sam_datagram_preamble(input: &str) -> IResult<&str, (&str, Vec<(&str, &str)>)> {
	separated_pair(value, space1, terminated(keys_and_values, tag("\n")))(input)
}

#[cfg(test)]
mod tests {
	use nom::error::ErrorKind;

	#[test]
	fn hello() {
		use crate::sam::parsers::sam_hello;

		assert_eq!(
			sam_hello("HELLO REPLY RESULT=OK VERSION=3.1\n"),
			Ok(("", vec![("RESULT", "OK"), ("VERSION", "3.1")]))
		);
		assert_eq!(
			sam_hello("HELLO REPLY RESULT=NOVERSION\n"),
			Ok(("", vec![("RESULT", "NOVERSION")]))
		);
		assert_eq!(
			sam_hello("HELLO REPLY RESULT=I2P_ERROR MESSAGE=\"Something failed\"\n"),
			Ok((
				"",
				vec![("RESULT", "I2P_ERROR"), ("MESSAGE", "Something failed")]
			))
		);
	}

	#[test]
	fn session_status() {
		use crate::sam::parsers::sam_session_status;

		assert_eq!(
			sam_session_status("SESSION STATUS RESULT=OK DESTINATION=privkey\n"),
			Ok(("", vec![("RESULT", "OK"), ("DESTINATION", "privkey")]))
		);
		assert_eq!(
			sam_session_status("SESSION STATUS RESULT=DUPLICATED_ID\n"),
			Ok(("", vec![("RESULT", "DUPLICATED_ID")]))
		);
	}

	#[test]
	fn stream_status() {
		use crate::sam::parsers::sam_stream_status;

		assert_eq!(
			sam_stream_status("STREAM STATUS RESULT=OK\n"),
			Ok(("", vec![("RESULT", "OK")]))
		);
		assert_eq!(
			sam_stream_status(
				"STREAM STATUS RESULT=CANT_REACH_PEER MESSAGE=\"Can't reach peer\"\n"
			),
			Ok((
				"",
				vec![
					("RESULT", "CANT_REACH_PEER"),
					("MESSAGE", "Can't reach peer")
				]
			))
		);
	}

	#[test]
	fn naming_reply() {
		use crate::sam::parsers::sam_naming_reply;

		assert_eq!(
			sam_naming_reply("NAMING REPLY RESULT=OK NAME=name VALUE=dest\n"),
			Ok((
				"",
				vec![("RESULT", "OK"), ("NAME", "name"), ("VALUE", "dest")]
			))
		);
		assert_eq!(
			sam_naming_reply("NAMING REPLY RESULT=KEY_NOT_FOUND\n"),
			Ok(("", vec![("RESULT", "KEY_NOT_FOUND")]))
		);
		assert!(matches!(
			sam_naming_reply("NAMINGREPLY RESULT=KEY_NOT_FOUND\n"),
			Err(nom::Err::Error(e)) if e.code == ErrorKind::Tag
		));
		assert!(matches!(
			sam_naming_reply("NAMING  REPLY RESULT=KEY_NOT_FOUND\n"),
			Err(nom::Err::Error(e)) if e.code == ErrorKind::Tag
		));
	}

	#[test]
	fn dest_reply() {
		use crate::sam::parsers::sam_dest_reply;

		assert_eq!(
			sam_dest_reply("DEST REPLY PUB=foo PRIV=foobar\n"),
			Ok(("", vec![("PUB", "foo"), ("PRIV", "foobar")]))
		);
	}

	#[test]
	fn quit_status() {
		use crate::sam::parsers::sam_quit_status;

		assert_eq!(
			sam_quit_status("QUIT STATUS RESULT=OK\n"),
			Ok(("", vec![("RESULT", "OK")]))
		);
	}

	#[test]
	fn ping_echoes_remainder() {
		use crate::sam::parsers::sam_ping;

		assert_eq!(sam_ping("PING abc123\n"), Ok(("", "abc123")));
		assert_eq!(sam_ping("PING\n"), Ok(("", "")));
	}

	#[test]
	fn datagram_preamble() {
		use crate::sam::parsers::sam_datagram_preamble;

		assert_eq!(
			sam_datagram_preamble("abcdef FROM_PORT=13 TO_PORT=14\n"),
			Ok(("", ("abcdef", vec![("FROM_PORT", "13"), ("TO_PORT", "14")])))
		);
	}
}
