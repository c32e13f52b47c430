use regex::Regex;

/// Where a word sits relative to the `{{ ... }}` actions on its line.
///
/// The checks are independent pattern tests over the raw line, so one word can
/// satisfy more than one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Right after a field-access `.` inside an action, e.g. `{{ .Release }}`.
    Value,
    /// A standalone token inside an action, e.g. `{{ quote .x }}`.
    Function,
    /// Between the previous `}}` (or line start) and the next `{{`.
    OutsideAction,
}

impl Context {
    /// Order in which a hover request tries each context.
    pub const ORDER: [Self; 3] = [Self::Value, Self::Function, Self::OutsideAction];

    // Patterns embed the word, so each check compiles its own regex; at most three
    // compiles per hover request.
    fn pattern(self, word: &str) -> String {
        let word = regex::escape(word);
        match self {
            Self::Value => format!(r"\{{\{{[^}}]*\.({word})[.\s]?[^{{]*\}}\}}"),
            Self::Function => format!(r"\{{\{{[^}}]*[\s(|]?({word})\s[^{{]*\}}\}}"),
            // Plain containment, so `app` also matches inside `apply`.
            Self::OutsideAction => format!(r"(^|\}})[^{{]*({word})"),
        }
    }

    pub fn holds(self, line: &str, word: &str) -> Result<bool, regex::Error> {
        Ok(Regex::new(&self.pattern(word))?.is_match(line))
    }
}
