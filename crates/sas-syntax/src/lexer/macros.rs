//! Macro language word tables and quoting state.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Macro statement and function names (without the leading `%`).
static MACRO_KEYWORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "ABORT", "BQUOTE", "BY", "CMS", "COPY", "DISPLAY", "DO", "ELSE", "END", "EVAL",
        "GLOBAL", "GOTO", "IF", "INCLUDE", "INDEX", "INPUT", "KEYDEF", "LEFT", "LENGTH",
        "LET", "LOCAL", "LOWCASE", "NRBQUOTE", "NRQUOTE", "NRSTR", "PUT", "QLEFT",
        "QLOWCASE", "QSCAN", "QSUBSTR", "QSYSFUNC", "QTRIM", "QUOTE", "QUPCASE", "RETURN",
        "SCAN", "SUBSTR", "SUPERQ", "SYMDEL", "SYMEXIST", "SYMGLOBL", "SYMLOCAL",
        "SYSCALL", "SYSEVALF", "SYSEXEC", "SYSFUNC", "SYSGET", "SYSLPUT", "SYSMACDELETE",
        "SYSMACEXEC", "SYSMACEXIST", "SYSMEXECDEPTH", "SYSMEXECNAME", "SYSPROD",
        "SYSRPUT", "STR", "THEN", "TO", "TRIM", "TSO", "UNQUOTE", "UNTIL", "UPCASE",
        "VERIFY", "WHILE", "WINDOW",
    ]
    .into_iter()
    .collect()
});

/// Macro statements whose text runs to the next `;` and which may appear in
/// the middle of an ordinary statement.
static MACRO_STATEMENTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "%ABORT", "%COPY", "%DISPLAY", "%GLOBAL", "%GOTO", "%INCLUDE", "%INPUT", "%KEYDEF",
        "%LET", "%LOCAL", "%PUT", "%RETURN", "%SYMDEL", "%SYSCALL", "%SYSEXEC", "%SYSLPUT",
        "%SYSMACDELETE", "%SYSRPUT", "%WINDOW",
    ]
    .into_iter()
    .collect()
});

/// Returns `true` if `name` (upper case, without `%`) is a macro keyword.
#[must_use]
pub fn is_macro_keyword(name: &str) -> bool {
    MACRO_KEYWORDS.contains(name)
}

/// Returns `true` if `word` (upper case, with `%`) starts a self-terminated
/// macro statement.
#[must_use]
pub fn is_macro_statement(word: &str) -> bool {
    MACRO_STATEMENTS.contains(word)
}

/// Returns `true` if `name` (upper case, without `%`) opens or closes a macro
/// definition.
#[must_use]
pub fn is_macro_section_keyword(name: &str) -> bool {
    matches!(name, "MACRO" | "MEND")
}

/// Which quoting counter a macro quoting function feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuoteClass {
    /// `%STR`, `%NRSTR`, `%QUOTE`, `%NRQUOTE`.
    Macro,
    /// `%BQUOTE`, `%NRBQUOTE`, `%SUPERQ`.
    Byte,
}

pub(crate) fn quote_class(name: &str) -> Option<QuoteClass> {
    match name {
        "STR" | "NRSTR" | "QUOTE" | "NRQUOTE" => Some(QuoteClass::Macro),
        "BQUOTE" | "NRBQUOTE" | "SUPERQ" => Some(QuoteClass::Byte),
        _ => None,
    }
}

/// Scanner-local quoting context.
///
/// Reset whenever scanning restarts at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotingState {
    /// Open `%STR`-class quoting contexts.
    pub macro_quote_depth: u32,
    /// Open `%BQUOTE`-class quoting contexts.
    pub macro_byte_quote_depth: u32,
    /// Set after `%PUT` until the next `;`: trailing dots do not make formats.
    pub format_suppressed: bool,
}

impl QuotingState {
    /// Returns `true` while inside any macro quoting function.
    #[must_use]
    pub fn is_quoting(&self) -> bool {
        self.macro_quote_depth > 0 || self.macro_byte_quote_depth > 0
    }
}

/// An open quoting function call and its parenthesis nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuoteFrame {
    pub(crate) class: QuoteClass,
    pub(crate) parens: u32,
}

/// Tracks quoting frames and keeps the public depth counters in sync.
#[derive(Debug, Clone, Default)]
pub(crate) struct Quoting {
    pub(crate) state: QuotingState,
    frames: Vec<QuoteFrame>,
    pending: Option<QuoteClass>,
}

impl Quoting {
    pub(crate) fn arm(&mut self, class: QuoteClass) {
        self.pending = Some(class);
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.frames.is_empty() && self.pending.is_none() && !self.state.format_suppressed
    }

    /// Records an opening parenthesis.
    pub(crate) fn open_paren(&mut self) {
        if let Some(class) = self.pending.take() {
            self.frames.push(QuoteFrame { class, parens: 1 });
            match class {
                QuoteClass::Macro => self.state.macro_quote_depth += 1,
                QuoteClass::Byte => self.state.macro_byte_quote_depth += 1,
            }
        } else if let Some(frame) = self.frames.last_mut() {
            frame.parens += 1;
        }
    }

    /// Records a closing parenthesis.
    pub(crate) fn close_paren(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        frame.parens = frame.parens.saturating_sub(1);
        if frame.parens == 0 {
            let class = frame.class;
            self.frames.pop();
            match class {
                QuoteClass::Macro => {
                    self.state.macro_quote_depth = self.state.macro_quote_depth.saturating_sub(1);
                }
                QuoteClass::Byte => {
                    self.state.macro_byte_quote_depth =
                        self.state.macro_byte_quote_depth.saturating_sub(1);
                }
            }
        }
    }

    /// Drops an armed quoting function that was not followed by `(`.
    pub(crate) fn disarm(&mut self) {
        self.pending = None;
    }

    pub(crate) fn in_byte_quote(&self) -> bool {
        self.state.macro_byte_quote_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_depth_follows_parens() {
        let mut quoting = Quoting::default();
        quoting.arm(QuoteClass::Macro);
        quoting.open_paren();
        assert_eq!(quoting.state.macro_quote_depth, 1);
        quoting.open_paren();
        quoting.close_paren();
        assert!(quoting.state.is_quoting());
        quoting.close_paren();
        assert!(!quoting.state.is_quoting());
        assert!(quoting.is_clean());
    }

    #[test]
    fn keyword_tables() {
        assert!(is_macro_keyword("LET"));
        assert!(is_macro_keyword("SYSFUNC"));
        assert!(!is_macro_keyword("MYMACRO"));
        assert!(is_macro_statement("%PUT"));
        assert!(!is_macro_statement("%IF"));
        assert_eq!(quote_class("BQUOTE"), Some(QuoteClass::Byte));
    }
}
