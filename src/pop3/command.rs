//! POP3 command parsing

use super::session::Pop3State;

/// A POP3 command keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pop3Action {
    User,
    Pass,
    Apop,
    Quit,
    Capa,
    Stat,
    List,
    Retr,
    Dele,
    Noop,
    Rset,
    Top,
    Uidl,
    /// Unrecognized keyword.
    Invalid,
}

impl Pop3Action {
    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "USER" => Self::User,
            "PASS" => Self::Pass,
            "APOP" => Self::Apop,
            "QUIT" => Self::Quit,
            "CAPA" => Self::Capa,
            "STAT" => Self::Stat,
            "LIST" => Self::List,
            "RETR" => Self::Retr,
            "DELE" => Self::Dele,
            "NOOP" => Self::Noop,
            "RSET" => Self::Rset,
            "TOP" => Self::Top,
            "UIDL" => Self::Uidl,
            _ => Self::Invalid,
        }
    }
}

/// A parsed command line: the keyword and whatever followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pop3Command {
    pub action: Pop3Action,
    pub params: String,
}

impl Pop3Command {
    /// Parse `line` as received in `state`.
    ///
    /// Once the session has quit, every line is read as `QUIT`.
    #[must_use]
    pub fn parse(line: &str, state: Pop3State) -> Self {
        if state == Pop3State::Quit {
            return Self {
                action: Pop3Action::Quit,
                params: String::new(),
            };
        }

        let line = line.trim();
        let (keyword, params) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(keyword, params)| (keyword, params.trim()));

        match Pop3Action::from_keyword(keyword) {
            Pop3Action::Invalid => Self {
                action: Pop3Action::Invalid,
                params: String::new(),
            },
            action => Self {
                action,
                params: params.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Pop3Command {
        Pop3Command::parse(line, Pop3State::Transaction)
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(parse("stat").action, Pop3Action::Stat);
        assert_eq!(parse("Uidl").action, Pop3Action::Uidl);
        assert_eq!(parse("TOP 1 10").action, Pop3Action::Top);
    }

    #[test]
    fn params_are_trimmed() {
        let command = parse("RETR   2  ");
        assert_eq!(command.action, Pop3Action::Retr);
        assert_eq!(command.params, "2");

        let command = parse("USER bob smith");
        assert_eq!(command.params, "bob smith");
    }

    #[test]
    fn missing_params_are_empty() {
        assert_eq!(parse("LIST").params, "");
    }

    #[test]
    fn unknown_keyword_is_invalid() {
        let command = parse("XYZZY 1");
        assert_eq!(command.action, Pop3Action::Invalid);
        assert!(command.params.is_empty());
        assert_eq!(parse("").action, Pop3Action::Invalid);
    }

    #[test]
    fn everything_is_quit_after_quit() {
        let command = Pop3Command::parse("STAT", Pop3State::Quit);
        assert_eq!(command.action, Pop3Action::Quit);
    }
}
