//! Command parsing for the command line

use std::path::PathBuf;

use crate::model::QuestionId;
use crate::theme::ThemeMode;

/// Parsed command from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in: :login <email> <password>
    Login { email: String, password: String },
    /// Create an account: :signup <email> <password>
    SignUp { email: String, password: String },
    /// Print the OAuth URL for a provider: :oauth <provider>
    OAuth(String),
    /// Finish OAuth with the token from the redirect: :token <access-token>
    Token(String),
    /// Sign out: :logout
    Logout,
    /// Open test setup with a question count: :test [count]
    Test(Option<usize>),
    /// Re-send failed progress writes: :retry
    Retry,
    /// Re-fetch exams and questions: :refresh
    Refresh,
    /// Set or clear the access code for private exams: :code [code]
    Code(Option<String>),
    /// Switch palette: :theme [dark|light]
    Theme(Option<ThemeMode>),
    /// Admin: :exam-add key=value...
    ExamAdd(String),
    /// Admin: :exam-edit <id> key=value...
    ExamEdit { id: String, form: String },
    /// Admin: :exam-delete <id>
    ExamDelete(String),
    /// Admin: :question-add key=value...
    QuestionAdd(String),
    /// Admin: :question-edit <id> key=value...
    QuestionEdit { id: QuestionId, form: String },
    /// Admin: :question-delete <id>
    QuestionDelete(QuestionId),
    /// Admin: :import <csv-path>
    Import(PathBuf),
    /// Admin: :upload <image-path>
    Upload(PathBuf),
    /// Return to the home screen: :home
    Home,
    /// Quit the application: :q or :quit
    Quit,
    /// Show help: :help or :h
    Help,
    /// Clear message: (empty command)
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument present but unusable
    InvalidArgument(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    // Split into command and arguments
    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");
    let name = cmd.to_lowercase();

    let require = |value: &str| -> Result<String, ParseResult> {
        if value.is_empty() {
            Err(ParseResult::MissingArgument(name.clone()))
        } else {
            Ok(value.to_string())
        }
    };

    let result = match name.as_str() {
        "login" | "signin" => credentials(args, &name)
            .map(|(email, password)| Command::Login { email, password }),
        "signup" | "register" => credentials(args, &name)
            .map(|(email, password)| Command::SignUp { email, password }),
        "oauth" => require(args).map(|p| Command::OAuth(p.to_lowercase())),
        "token" => require(args).map(Command::Token),
        "logout" | "signout" => Ok(Command::Logout),
        "test" => {
            if args.is_empty() {
                Ok(Command::Test(None))
            } else {
                args.parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(|n| Command::Test(Some(n)))
                    .ok_or_else(|| ParseResult::InvalidArgument(format!("test count '{}'", args)))
            }
        }
        "retry" => Ok(Command::Retry),
        "refresh" | "r" => Ok(Command::Refresh),
        "code" => Ok(Command::Code((!args.is_empty()).then(|| args.to_string()))),
        "theme" => match args.to_lowercase().as_str() {
            "" => Ok(Command::Theme(None)),
            "dark" => Ok(Command::Theme(Some(ThemeMode::Dark))),
            "light" => Ok(Command::Theme(Some(ThemeMode::Light))),
            other => Err(ParseResult::InvalidArgument(format!("theme '{}'", other))),
        },
        "exam-add" => require(args).map(Command::ExamAdd),
        "exam-edit" => {
            let (id, form) = split_first(args);
            require(id).map(|id| Command::ExamEdit { id, form: form.to_string() })
        }
        "exam-delete" => require(args).map(Command::ExamDelete),
        "question-add" => require(args).map(Command::QuestionAdd),
        "question-edit" => {
            let (id, form) = split_first(args);
            question_id(id, &name).map(|id| Command::QuestionEdit { id, form: form.to_string() })
        }
        "question-delete" => question_id(args, &name).map(Command::QuestionDelete),
        "import" => require(args).map(|p| Command::Import(PathBuf::from(p))),
        "upload" => require(args).map(|p| Command::Upload(PathBuf::from(p))),
        "home" => Ok(Command::Home),
        "quit" | "q" => Ok(Command::Quit),
        "help" | "h" | "?" => Ok(Command::Help),
        _ => Err(ParseResult::UnknownCommand(cmd.to_string())),
    };

    match result {
        Ok(command) => ParseResult::Ok(command),
        Err(err) => err,
    }
}

fn split_first(args: &str) -> (&str, &str) {
    let mut parts = args.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    (first, parts.next().map(str::trim).unwrap_or(""))
}

fn credentials(args: &str, name: &str) -> Result<(String, String), ParseResult> {
    let (email, password) = split_first(args);
    if email.is_empty() || password.is_empty() {
        return Err(ParseResult::MissingArgument(name.to_string()));
    }
    Ok((email.to_string(), password.to_string()))
}

fn question_id(arg: &str, name: &str) -> Result<QuestionId, ParseResult> {
    if arg.is_empty() {
        return Err(ParseResult::MissingArgument(name.to_string()));
    }
    arg.parse()
        .map_err(|_| ParseResult::InvalidArgument(format!("question id '{}'", arg)))
}

/// One-line summary of the commands, shown by :help
pub const HELP_TEXT: &str = "\
Keys: j/k move  Enter select  Esc back  H home  a-d answer  r reset  m bookmark
      s saved  t test  p profile  , settings  x admin  L sign in  T theme  R retry
Commands: :login <email> <pw>  :signup <email> <pw>  :oauth <provider>  :token <t>
          :logout  :test [n]  :retry  :refresh  :code [code]  :theme [dark|light]
Admin:    :exam-add|:exam-edit <id>|:exam-delete <id>  :question-add|:question-edit <id>
          :question-delete <id>  :import <csv>  :upload <image>     :q quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_command() {
        assert_eq!(parse_command("q"), ParseResult::Ok(Command::Quit));
        assert_eq!(parse_command("Quit"), ParseResult::Ok(Command::Quit));
    }

    #[test]
    fn parse_login_needs_both_parts() {
        assert_eq!(
            parse_command("login a@b.in secret"),
            ParseResult::Ok(Command::Login { email: "a@b.in".into(), password: "secret".into() })
        );
        assert_eq!(parse_command("login a@b.in"), ParseResult::MissingArgument("login".into()));
    }

    #[test]
    fn parse_test_count() {
        assert_eq!(parse_command("test"), ParseResult::Ok(Command::Test(None)));
        assert_eq!(parse_command("test 25"), ParseResult::Ok(Command::Test(Some(25))));
        assert!(matches!(parse_command("test zero"), ParseResult::InvalidArgument(_)));
        assert!(matches!(parse_command("test 0"), ParseResult::InvalidArgument(_)));
    }

    #[test]
    fn parse_question_edit_keeps_form() {
        match parse_command(r#"question-edit 42 text="New text" correct=C"#) {
            ParseResult::Ok(Command::QuestionEdit { id, form }) => {
                assert_eq!(id, 42);
                assert_eq!(form, r#"text="New text" correct=C"#);
            }
            other => panic!("Expected QuestionEdit, got {:?}", other),
        }
        assert!(matches!(parse_command("question-delete abc"), ParseResult::InvalidArgument(_)));
    }

    #[test]
    fn parse_code_and_theme() {
        assert_eq!(parse_command("code"), ParseResult::Ok(Command::Code(None)));
        assert_eq!(parse_command("code B7"), ParseResult::Ok(Command::Code(Some("B7".into()))));
        assert_eq!(parse_command("theme light"), ParseResult::Ok(Command::Theme(Some(ThemeMode::Light))));
        assert!(matches!(parse_command("theme solarized"), ParseResult::InvalidArgument(_)));
    }

    #[test]
    fn parse_import_path() {
        assert_eq!(
            parse_command("import /tmp/q.csv"),
            ParseResult::Ok(Command::Import(PathBuf::from("/tmp/q.csv")))
        );
        assert_eq!(parse_command("upload"), ParseResult::MissingArgument("upload".into()));
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse_command("unknown"), ParseResult::UnknownCommand(_)));
    }

    #[test]
    fn parse_empty_is_nop() {
        assert_eq!(parse_command("   "), ParseResult::Ok(Command::Nop));
    }
}
