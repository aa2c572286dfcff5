//! Inbound control command shape and text parsing.
//!
//! The wire protocol is UTF-8 text, one command per message, fire-and-forget:
//! `STOP` or `CONST <integer>`, case-insensitive. Parsing happens at the
//! channel boundary; the controller only ever sees the closed variant.

/// A parsed force request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceCommand {
    /// Drop the desired force to zero.
    Stop,
    /// Hold a constant force of the given signed magnitude (clamped by the
    /// controller to its configured bound).
    SetConstant(i32),
}

/// Parse one channel message. Anything unrecognized yields `None` and is
/// ignored by the caller; the protocol sends no acknowledgments.
pub fn parse_command(text: &str) -> Option<ForceCommand> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("stop") {
        return Some(ForceCommand::Stop);
    }

    let mut tokens = trimmed.split_whitespace();
    let verb = tokens.next()?;
    if verb.eq_ignore_ascii_case("const") {
        let value: i32 = tokens.next()?.parse().ok()?;
        return Some(ForceCommand::SetConstant(value));
    }
    None
}
