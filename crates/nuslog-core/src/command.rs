//! Console control protocol

/// One line of operator input, interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `tt`: send the current local time to every device
    TimeSync,
    /// `rr`: start logging into a fresh capture file
    StartLogging,
    /// `ss`: stop logging and split the capture file
    StopLogging,
    /// `dd`: stop logging if needed, disconnect every device and exit
    Disconnect,
    /// Blank line: exit without splitting
    Quit,
}

impl Command {
    /// Parse one console line
    ///
    /// Matching is case-insensitive and ignores the line terminator. Lines that
    /// are not commands yield `None` and must be ignored by the caller.
    pub fn parse(line: &str) -> Option<Command> {
        let token = line.trim_end_matches(['\r', '\n']);
        if token.is_empty() {
            return Some(Command::Quit);
        }
        match token.to_ascii_lowercase().as_str() {
            "tt" => Some(Command::TimeSync),
            "rr" => Some(Command::StartLogging),
            "ss" => Some(Command::StopLogging),
            "dd" => Some(Command::Disconnect),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Command::TimeSync => "tt",
            Command::StartLogging => "rr",
            Command::StopLogging => "ss",
            Command::Disconnect => "dd",
            Command::Quit => "",
        }
    }
}

/// Operator help printed at startup
pub const COMMAND_HELP: &[(Command, &str)] = &[
    (Command::TimeSync, "set the time of the BLE devices"),
    (Command::StartLogging, "start logging data"),
    (Command::StopLogging, "stop logging data and split the capture"),
    (Command::Disconnect, "disconnect the BLE devices and exit"),
];
