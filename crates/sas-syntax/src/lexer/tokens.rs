//! Token definitions for SAS source.
//!
//! The scanner only distinguishes lexical categories. Whether a word is a
//! keyword depends on the surrounding statement and is decided later by the
//! block parser, which rewrites `Text` tokens to `Keyword`, `SectionKeyword`
//! or `ProcName`.

use serde::Serialize;

/// All token kinds produced by the scanner and the block parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    /// Run of spaces, tabs and line breaks.
    #[default]
    Blank,

    /// `/* ... */` or a `* ... ;` statement comment.
    Comment,

    /// `%* ... ;` macro comment.
    MacroComment,

    // =========================================================================
    // PUNCTUATION AND OPERATORS
    // =========================================================================
    /// Any operator or punctuation: `;`, `(`, `=`, `**`, `^=:` ...
    Separator,

    // =========================================================================
    // WORDS
    // =========================================================================
    /// A word not (yet) known to be a keyword.
    Text,

    /// A statement, option or sub-option keyword.
    Keyword,

    /// `DATA`, `PROC`, `PROCEDURE`, `RUN`, `QUIT` opening or closing a block.
    SectionKeyword,

    /// The procedure name following `PROC`.
    ProcName,

    /// `%LET`, `%PUT`, `%IF`, `%STR` and the other macro statement/function words.
    MacroKeyword,

    /// `%MACRO` and `%MEND`.
    MacroSectionKeyword,

    /// `&var`, `&&var.` or a `%name` macro invocation.
    MacroRef,

    /// `date9.`, `$char10.`, `best12.2`.
    Format,

    // =========================================================================
    // LITERALS
    // =========================================================================
    /// `'text'` or `"text"`.
    String,

    /// `'01jan2024'd`.
    Date,

    /// `'10:30't`.
    Time,

    /// `'01jan2024:10:30'dt`.
    DateTime,

    /// `'1010'b`.
    BitMask,

    /// `'my name'n`.
    NameLiteral,

    /// `'0a0d'x`.
    Hex,

    /// Numeric literal, including hex numerics such as `0FFx`.
    Numeric,

    /// Raw lines following `DATALINES;` / `CARDS;`.
    CardsData,

    /// Raw text of an embedded language block (`SUBMIT; ... ENDSUBMIT;`).
    EmbeddedCode,
}

impl TokenKind {
    /// Returns `true` for blanks and comments.
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Blank | Self::Comment | Self::MacroComment)
    }

    /// Returns `true` for comment kinds.
    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::MacroComment)
    }

    /// Returns `true` for quoted literal kinds.
    #[must_use]
    pub fn is_quoted_literal(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Date
                | Self::Time
                | Self::DateTime
                | Self::BitMask
                | Self::NameLiteral
                | Self::Hex
        )
    }

    /// Returns `true` for kinds whose content is never code: comments, quoted
    /// literals, cards data and embedded code.
    #[must_use]
    pub fn is_opaque(self) -> bool {
        self.is_comment()
            || self.is_quoted_literal()
            || matches!(self, Self::CardsData | Self::EmbeddedCode)
    }

    /// Returns `true` for word-like kinds (anything a keyword lookup may apply to).
    #[must_use]
    pub fn is_word(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Keyword | Self::SectionKeyword | Self::ProcName
        )
    }

    /// Returns `true` for macro-language kinds.
    #[must_use]
    pub fn is_macro(self) -> bool {
        matches!(
            self,
            Self::MacroKeyword | Self::MacroSectionKeyword | Self::MacroRef | Self::MacroComment
        )
    }
}
