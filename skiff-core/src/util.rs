/// Writes every item through `f`, putting `separator` between items that produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Copies `value` into `out` replacing every `search` with `replace`.
pub fn write_escaped(out: &mut String, value: &str, search: char, replace: &str) {
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if c == search {
            out.push_str(&value[position..i]);
            out.push_str(replace);
            position = i + c.len_utf8();
        }
    }
    out.push_str(&value[position..]);
}

/// Drops a trailing `separator` left by fragment writers that terminate their output.
pub fn trim_separator(out: &mut String, separator: char) {
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    if out.ends_with(separator) {
        out.pop();
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$query
                .char_indices()
                .map(|(i, _)| i)
                .nth(497)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().nth(497).is_some() {
                "..."
            } else {
                ""
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated() {
        let mut out = String::new();
        separated_by(&mut out, ["a", "", "b"], |out, v| out.push_str(v), ", ");
        assert_eq!(out, "a, b");
    }

    #[test]
    fn escaped() {
        let mut out = String::new();
        write_escaped(&mut out, r#"say "hi""#, '"', r#""""#);
        assert_eq!(out, r#"say ""hi"""#);
    }

    #[test]
    fn trimmed() {
        let mut out = String::from("a INTEGER,\n");
        trim_separator(&mut out, ',');
        assert_eq!(out, "a INTEGER");
        let mut out = String::from("a");
        trim_separator(&mut out, ',');
        assert_eq!(out, "a");
    }

    #[test]
    fn truncate() {
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
        let long = "x".repeat(600);
        let result = format!("{}", truncate_long!(long));
        assert_eq!(result.len(), 500);
        assert!(result.ends_with("..."));
    }
}
