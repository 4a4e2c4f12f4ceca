use clap::Parser;
use mailpilot::cli::{Cli, Command};
use mailpilot::state::View;

#[test]
fn parses_chat_with_global_flags() {
    let cli = Cli::try_parse_from(["mailpilot", "chat", "--profile", "work", "--json", "-vv"])
        .expect("cli parse should work");
    assert!(matches!(cli.command, Command::Chat));
    assert_eq!(cli.profile, "work");
    assert!(cli.json);
    assert_eq!(cli.verbose, 2);
}

#[test]
fn parses_ask_as_joined_words() {
    let cli = Cli::try_parse_from(["mailpilot", "ask", "find", "mail", "from", "jane"])
        .expect("cli parse should work");
    match cli.command {
        Command::Ask(ask) => assert_eq!(ask.text(), "find mail from jane"),
        _ => panic!("expected ask command"),
    }
}

#[test]
fn ask_requires_a_message() {
    assert!(Cli::try_parse_from(["mailpilot", "ask"]).is_err());
}

#[test]
fn parses_exec() {
    let cli = Cli::try_parse_from(["mailpilot", "exec", r#"{"type":"navigate","view":"sent"}"#])
        .expect("cli parse should work");
    match cli.command {
        Command::Exec(exec) => assert!(exec.action.contains("navigate")),
        _ => panic!("expected exec command"),
    }
}

#[test]
fn parses_list() {
    let cli = Cli::try_parse_from([
        "mailpilot", "list", "--view", "archive", "--page", "3", "--q", "from:foo",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::List(list) => {
            assert_eq!(list.view, View::Archive);
            assert_eq!(list.page, 3);
            assert_eq!(list.q.as_deref(), Some("from:foo"));
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn list_defaults_to_first_inbox_page() {
    let cli = Cli::try_parse_from(["mailpilot", "list"]).expect("cli parse should work");
    match cli.command {
        Command::List(list) => {
            assert_eq!(list.view, View::Inbox);
            assert_eq!(list.page, 1);
            assert!(list.q.is_none());
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn rejects_unknown_view() {
    assert!(Cli::try_parse_from(["mailpilot", "list", "--view", "spam"]).is_err());
}

#[test]
fn parses_token() {
    let cli = Cli::try_parse_from([
        "mailpilot",
        "token",
        "ya29.token",
        "--refresh-token",
        "1//refresh",
        "--expires-in",
        "3599",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::Token(token) => {
            assert_eq!(token.access_token, "ya29.token");
            assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
            assert_eq!(token.expires_in, Some(3599));
        }
        _ => panic!("expected token command"),
    }
}
