//! SMTP line classification

/// What one input line asks the SMTP state machine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpAction {
    Helo(String),
    Ehlo(String),
    /// `MAIL FROM:` with the reverse path.
    Mail(String),
    /// `RCPT TO:` with the forward path.
    Rcpt(String),
    Data,
    Quit,
    Rset,
    Noop,
    Expn(String),
    Vrfy(String),
    Help,
    /// Non-standard `XLIST [index]`: dump stored messages.
    XList(String),
    /// Empty line while capturing message data.
    BlankLine,
    /// A lone `.` while capturing message data.
    DataEnd,
    /// Anything else. Inside message data this carries the line itself.
    Unknown(String),
}

/// Classify a command line received outside of message data.
///
/// The keyword is matched ignoring case. `MAIL` and `RCPT` are only
/// recognized together with their `FROM:` and `TO:` prefixes.
#[must_use]
pub fn parse_command(line: &str) -> SmtpAction {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

    match verb.to_ascii_uppercase().as_str() {
        "HELO" => SmtpAction::Helo(rest.to_string()),
        "EHLO" => SmtpAction::Ehlo(rest.to_string()),
        "MAIL" => strip_keyword(rest, "FROM:")
            .map_or_else(|| SmtpAction::Unknown(line.to_string()), SmtpAction::Mail),
        "RCPT" => strip_keyword(rest, "TO:")
            .map_or_else(|| SmtpAction::Unknown(line.to_string()), SmtpAction::Rcpt),
        "DATA" => SmtpAction::Data,
        "QUIT" => SmtpAction::Quit,
        "RSET" => SmtpAction::Rset,
        "NOOP" => SmtpAction::Noop,
        "EXPN" => SmtpAction::Expn(rest.to_string()),
        "VRFY" => SmtpAction::Vrfy(rest.to_string()),
        "HELP" => SmtpAction::Help,
        "XLIST" => SmtpAction::XList(rest.to_string()),
        _ => SmtpAction::Unknown(line.to_string()),
    }
}

/// Classify a line received while capturing message data.
///
/// In the header section lines are trimmed and an empty one ends the
/// headers. In the body lines are kept verbatim and an empty one becomes
/// a paragraph break.
#[must_use]
pub fn parse_data_line(line: &str, in_body: bool) -> SmtpAction {
    let trimmed = line.trim();
    if trimmed == "." {
        SmtpAction::DataEnd
    } else if trimmed.is_empty() {
        if in_body {
            SmtpAction::Unknown("\n".to_string())
        } else {
            SmtpAction::BlankLine
        }
    } else if in_body {
        SmtpAction::Unknown(line.to_string())
    } else {
        SmtpAction::Unknown(trimmed.to_string())
    }
}

fn strip_keyword(rest: &str, keyword: &str) -> Option<String> {
    let prefix = rest.get(..keyword.len())?;
    prefix
        .eq_ignore_ascii_case(keyword)
        .then(|| rest[keyword.len()..].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(parse_command("helo x"), SmtpAction::Helo("x".into()));
        assert_eq!(parse_command("EhLo client.example"), SmtpAction::Ehlo("client.example".into()));
        assert_eq!(parse_command("data"), SmtpAction::Data);
        assert_eq!(parse_command("  QUIT  "), SmtpAction::Quit);
    }

    #[test]
    fn mail_and_rcpt_need_their_prefix() {
        assert_eq!(parse_command("MAIL FROM:<a@x>"), SmtpAction::Mail("<a@x>".into()));
        assert_eq!(parse_command("mail from: <a@x>"), SmtpAction::Mail("<a@x>".into()));
        assert_eq!(parse_command("RCPT TO:<b@x>"), SmtpAction::Rcpt("<b@x>".into()));
        assert_eq!(parse_command("MAIL <a@x>"), SmtpAction::Unknown("MAIL <a@x>".into()));
        assert_eq!(parse_command("RCPT"), SmtpAction::Unknown("RCPT".into()));
    }

    #[test]
    fn xlist_keeps_its_argument() {
        assert_eq!(parse_command("XLIST"), SmtpAction::XList(String::new()));
        assert_eq!(parse_command("xlist 2"), SmtpAction::XList("2".into()));
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(parse_command("BDAT 12"), SmtpAction::Unknown("BDAT 12".into()));
        assert_eq!(parse_command(""), SmtpAction::Unknown(String::new()));
    }

    #[test]
    fn data_lines_in_headers() {
        assert_eq!(parse_data_line(" . ", false), SmtpAction::DataEnd);
        assert_eq!(parse_data_line("", false), SmtpAction::BlankLine);
        assert_eq!(
            parse_data_line("  Subject: hi ", false),
            SmtpAction::Unknown("Subject: hi".into())
        );
        // commands are plain data here
        assert_eq!(parse_data_line("QUIT", false), SmtpAction::Unknown("QUIT".into()));
    }

    #[test]
    fn data_lines_in_body() {
        assert_eq!(parse_data_line(".", true), SmtpAction::DataEnd);
        assert_eq!(parse_data_line("   ", true), SmtpAction::Unknown("\n".into()));
        assert_eq!(parse_data_line("  indented", true), SmtpAction::Unknown("  indented".into()));
    }
}
