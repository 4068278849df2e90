#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

peg::parser! {
    /// grammars for roster CSV files and diff file names.
    pub grammar parser() for str {
        /// matches any sequence of 1 or more numbers
        rule number() -> u32
            = n:$(['0'..='9']+) {? n.parse().or(Err("u32")) }

        /// matches a line break, CRLF or LF
        rule newline() = "\r\n" / "\n"

        /// matches a quoted field, `""` inside quotes is a literal quote
        rule quoted_field() -> String
            = "\"" parts:(quoted_char()*) "\"" { parts.into_iter().collect() }

        /// matches one character inside a quoted field
        rule quoted_char() -> char
            = "\"\"" { '"' }
            / c:[^'"'] { c }

        /// matches an unquoted field, possibly empty
        rule bare_field() -> String
            = s:$([^',' | '"' | '\r' | '\n']*) { s.to_string() }

        /// matches a single field
        rule field() -> String
            = quoted_field() / bare_field()

        /// matches one record, fields separated by commas
        rule record() -> Vec<String>
            = fields:(field() ++ ",") { fields }

        /// parses a whole CSV document into records. Blank lines are kept as a
        /// single empty field so callers can drop them.
        pub rule csv_document() -> Vec<Vec<String>>
            = records:(record() ** newline()) newline()? { records }

        /// matches anything that is not a digit
        rule non_digit() = [^'0'..='9']

        /// parses the first run of digits in a diff file stem, eg. `group12` or `12-final`
        pub rule leading_group_number() -> u32
            = non_digit()* n:number() [_]* { n }
    }
}

/// Returns the last run of ASCII digits in `code` as a number, eg. `T2-G07` is 7.
pub fn trailing_number(code: &str) -> Option<u32> {
    let digits: String = code
        .chars()
        .rev()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    digits.parse().ok()
}
