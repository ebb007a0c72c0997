use itertools::Itertools;
use std::fmt;
use std::path::Path;

/// A single external program invocation, optionally with a line explaining
/// to the operator what it is about to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub explanation: Option<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            explanation: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let rendered = path.as_ref().display().to_string();
        self.arg(rendered)
    }

    pub fn explain(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// `sh -c 'command -v <program>'`, which fails when `program` is not on the path.
    pub fn tool_check(program: &str, explanation: impl Into<String>) -> Self {
        Self::new("sh")
            .args(["-c".to_string(), format!("command -v {}", quote(program))])
            .explain(explanation)
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            std::iter::once(&self.program)
                .chain(self.args.iter())
                .map(|word| quote(word))
                .join(" ")
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_leaves_plain_words_unquoted() {
        let command = ShellCommand::new("parted")
            .args(["--script", "/dev/sdb", "mklabel", "gpt"]);
        assert_eq!(command.to_string(), "parted --script /dev/sdb mklabel gpt");
    }

    #[test]
    fn test_display_quotes_words_with_spaces_and_quotes() {
        let command = ShellCommand::new("parted").args(["mkpart", "EFI System partition", "it's"]);
        assert_eq!(
            command.to_string(),
            r"parted mkpart 'EFI System partition' 'it'\''s'"
        );
    }

    #[test]
    fn test_display_quotes_empty_argument() {
        let command = ShellCommand::new("echo").arg("");
        assert_eq!(command.to_string(), "echo ''");
    }

    #[test]
    fn test_tool_check_quotes_program_name() {
        let plain = ShellCommand::tool_check("mkfs.vfat", "Checking mkfs.vfat");
        assert_eq!(plain.args, vec!["-c", "command -v mkfs.vfat"]);

        let hostile = ShellCommand::tool_check("x; rm -rf /", "Checking x");
        assert_eq!(hostile.args, vec!["-c", "command -v 'x; rm -rf /'"]);
    }

    #[test]
    fn test_explanation_does_not_affect_rendering() {
        let command = ShellCommand::new("mkswap")
            .arg("/dev/sdb3")
            .explain("Setting up swap");
        assert_eq!(command.to_string(), "mkswap /dev/sdb3");
        assert_eq!(command.explanation.as_deref(), Some("Setting up swap"));
    }
}
