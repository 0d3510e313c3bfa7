use std::borrow::Cow::{self, Borrowed, Owned};

use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::HistoryHinter;
use rustyline::validate::MatchingBracketValidator;
use rustyline::{Context, Helper, Hinter, Validator};

/// Statement keywords offered by tab completion
const KEYWORDS: [&str; 31] = [
    "AMOUNT", "BY", "CATEGORIES", "CHARTS", "COUNT(*)", "DASHBOARD", "DELETE", "EXPENSE", "EXPORT", "HELP",
    "IMPORT", "INCOME", "INSERT", "INSIGHTS", "LIMIT", "LOGIN", "LOGOUT", "ON", "ORDER", "PROJECT",
    "SELECT", "SET", "SIGNUP", "SUM(*)", "TIPS", "TO", "TYPE", "UPDATE", "USERS", "WHERE", "WHOAMI",
];

#[derive(Helper, Hinter, Validator)]
pub(crate) struct ReplHelper {
    completer: FilenameCompleter,
    highlighter: MatchingBracketHighlighter,
    #[rustyline(Validator)]
    validator: MatchingBracketValidator,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl ReplHelper {
    pub(crate) fn new() -> ReplHelper {
        ReplHelper {
            completer: FilenameCompleter::new(),
            highlighter: MatchingBracketHighlighter::new(),
            validator: MatchingBracketValidator::new(),
            hinter: HistoryHinter::new(),
            colored_prompt: String::new(),
        }
    }

    /// Show `prompt` in bold green
    pub(crate) fn set_prompt(&mut self, prompt: &str) {
        self.colored_prompt = format!("\x1b[1;32m{prompt}\x1b[0m");
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    /// Paths inside quotes or containing a separator complete as files, everything else as keywords
    fn complete(&self, line: &str, pos: usize, ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
        let word = &line[start..pos];
        if word.starts_with(['\'', '"', '/', '.', '~']) || word.contains(std::path::MAIN_SEPARATOR) {
            return self.completer.complete(line, pos, ctx);
        }

        let upper = word.to_uppercase();
        let candidates = KEYWORDS.iter()
            .filter(|k| !word.is_empty() && k.starts_with(&upper))
            .map(|k| {
                // Keep the case the user started typing in
                let replacement = if word.chars().any(|c| c.is_ascii_lowercase()) { k.to_lowercase() } else { k.to_string() };
                Pair { display: k.to_string(), replacement }
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Highlighter for ReplHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default && !self.colored_prompt.is_empty() {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned("\x1b[2m".to_owned() + hint + "\x1b[m")
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

#[cfg(test)]
mod tests {
    use rustyline::history::DefaultHistory;

    use super::*;

    fn complete(line: &str) -> (usize, Vec<String>) {
        let helper = ReplHelper::new();
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|p| p.replacement).collect())
    }

    #[test]
    fn test_keyword_completion() {
        assert_eq!(complete("dash"), (0, vec!["dashboard".to_string()]));
        assert_eq!(complete("SELECT * WHE"), (9, vec!["WHERE".to_string()]));
        assert_eq!(complete("LOG"), (0, vec!["LOGIN".to_string(), "LOGOUT".to_string()]));
        assert_eq!(complete("select "), (7, vec![]));
    }
}
