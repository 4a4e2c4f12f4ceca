use std::sync::LazyLock;

use regex::Regex;

const REPLY_PREFIX: &str = "Re: ";

static ANGLE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| super::pattern(r"<(.+?)>"));

/// The bare address out of `Display Name <address>`, or the whole sender.
pub fn reply_address(sender: &str) -> String {
    ANGLE_ADDRESS
        .captures(sender)
        .and_then(|captures| captures.get(1))
        .map(|address| address.as_str().to_string())
        .unwrap_or_else(|| sender.to_string())
}

pub fn reply_subject(subject: &str) -> String {
    if subject.starts_with(REPLY_PREFIX) {
        subject.to_string()
    } else {
        format!("{REPLY_PREFIX}{subject}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bracketed_address() {
        assert_eq!(reply_address("Jane Doe <jane@x.com>"), "jane@x.com");
        assert_eq!(reply_address("\"Doe, Jane\" <jane@x.com>"), "jane@x.com");
    }

    #[test]
    fn bare_sender_is_used_whole() {
        assert_eq!(reply_address("jane@x.com"), "jane@x.com");
    }

    #[test]
    fn prefixes_subject_once() {
        assert_eq!(reply_subject("Budget"), "Re: Budget");
        assert_eq!(reply_subject("Re: Budget"), "Re: Budget");
    }

    #[test]
    fn prefix_match_is_exact() {
        assert_eq!(reply_subject("RE: Budget"), "Re: RE: Budget");
        assert_eq!(reply_subject("Re:Budget"), "Re: Re:Budget");
    }
}
